use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::bundle::{BundleScope, ModelBundle, load_bundle_or_generic};
use crate::classifier::SoftmaxModel;
use crate::contract::Situation;
use crate::features::TeamStat;

/// Used when the offense is absent from the team-stat table, leaning the
/// model on neither tendency.
pub const DEFAULT_PASS_RATE: f64 = 0.5;

/// Quarter length the models were trained against.
pub const MODEL_QUARTER_MINUTES: f64 = 15.0;

/// One scored call for a situation. Play type and direction carry the full
/// class distribution in model class order; direction fields are absent when
/// the serving bundle skipped that task for lack of labeled plays.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub play_type: String,
    pub play_type_probabilities: Vec<(String, f64)>,
    pub coverage: String,
    pub direction: Option<String>,
    pub direction_probabilities: Option<Vec<(String, f64)>>,
}

impl Prediction {
    /// Probability the bundle put on the chosen play type.
    pub fn play_type_confidence(&self) -> f64 {
        confidence_in(&self.play_type_probabilities, &self.play_type)
    }

    /// Probability behind the direction call, when that task was trained.
    pub fn direction_confidence(&self) -> Option<f64> {
        match (&self.direction, &self.direction_probabilities) {
            (Some(label), Some(dist)) => Some(confidence_in(dist, label)),
            _ => None,
        }
    }
}

fn confidence_in(distribution: &[(String, f64)], label: &str) -> f64 {
    distribution
        .iter()
        .find(|(class, _)| class == label)
        .map(|(_, p)| *p)
        .unwrap_or(0.0)
}

/// Serves predictions from one resolved bundle. Opening resolves a
/// specialized bundle when one exists for the team and remembers whether
/// it had to fall back to the generic one.
pub struct PredictionService {
    bundle: Arc<ModelBundle>,
    fell_back: bool,
}

impl PredictionService {
    pub fn open(models_dir: &Path, team: Option<&str>) -> Result<PredictionService> {
        let (bundle, fell_back) = load_bundle_or_generic(models_dir, team)?;
        Ok(PredictionService { bundle, fell_back })
    }

    pub fn from_bundle(bundle: Arc<ModelBundle>) -> PredictionService {
        PredictionService {
            bundle,
            fell_back: false,
        }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn scope(&self) -> &BundleScope {
        &self.bundle.scope
    }

    pub fn fell_back(&self) -> bool {
        self.fell_back
    }

    pub fn predict(&self, situation: &Situation) -> Prediction {
        let encoded = self.bundle.contract.encode(situation);
        let (play_type, play_type_probabilities) =
            scored_call(&self.bundle.play_type.model, &encoded);
        let coverage = called_class(&self.bundle.coverage.model, &encoded);
        let (direction, direction_probabilities) = match &self.bundle.direction {
            Some(task) => {
                let (label, dist) = scored_call(&task.model, &encoded);
                (Some(label), Some(dist))
            }
            None => (None, None),
        };
        Prediction {
            play_type,
            play_type_probabilities,
            coverage,
            direction,
            direction_probabilities,
        }
    }
}

fn called_class(model: &SoftmaxModel, encoded: &[f64]) -> String {
    model
        .classes
        .get(model.predict(encoded))
        .cloned()
        .unwrap_or_default()
}

fn scored_call(model: &SoftmaxModel, encoded: &[f64]) -> (String, Vec<(String, f64)>) {
    let label = called_class(model, encoded);
    let distribution = model
        .classes
        .iter()
        .cloned()
        .zip(model.predict_proba(encoded))
        .collect();
    (label, distribution)
}

/// Pass rate for a team from the stats table, if it was ever observed.
pub fn pass_rate_for(stats: &[TeamStat], team: &str) -> Option<f64> {
    stats
        .iter()
        .find(|s| s.offense == team)
        .map(|s| s.team_pass_rate)
}

/// Converts a game clock in quarters of `quarter_minutes` into the
/// model's 15-minute clock. Shorter formats stretch proportionally, so
/// halfway through a 12-minute game lands halfway through the model
/// clock.
pub fn clock_to_model_seconds(
    quarter: f64,
    minutes: f64,
    seconds: f64,
    quarter_minutes: f64,
) -> f64 {
    let raw = (4.0 - quarter) * quarter_minutes * 60.0 + minutes * 60.0 + seconds;
    raw * (MODEL_QUARTER_MINUTES / quarter_minutes)
}
