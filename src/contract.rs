use serde::{Deserialize, Serialize};

use crate::features::FeatureRecord;

/// Number of numeric situation features, in encoding order: down,
/// distance, yard_line, score_diff, seconds_remaining, team_pass_rate.
pub const NUMERIC_COUNT: usize = 6;

/// When a column's spread collapses to zero the scale is pinned to one so
/// standardization becomes a plain mean shift.
const MIN_STD: f64 = 1e-12;

/// The frozen numeric encoding a bundle was trained under. Fitted once on
/// the selected training rows before any split, then applied identically
/// at train and predict time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureContract {
    pub numeric_medians: Vec<f64>,
    pub numeric_means: Vec<f64>,
    pub numeric_stds: Vec<f64>,
    /// Formation labels observed at fit time, sorted. One indicator column
    /// each; labels outside this vocabulary encode to all zeros.
    pub formations: Vec<String>,
}

/// A game situation to encode. Missing numerics fall back to the
/// contract's stored medians; the formation is matched against the stored
/// vocabulary by exact label.
#[derive(Debug, Clone, Default)]
pub struct Situation {
    pub down: Option<f64>,
    pub distance: Option<f64>,
    pub yard_line: Option<f64>,
    pub score_diff: Option<f64>,
    pub seconds_remaining: Option<f64>,
    pub team_pass_rate: Option<f64>,
    pub formation: String,
}

impl Situation {
    pub fn from_record(record: &FeatureRecord) -> Self {
        Situation {
            down: Some(f64::from(record.down)),
            distance: Some(record.distance),
            yard_line: Some(record.yard_line),
            score_diff: Some(record.score_diff),
            seconds_remaining: Some(record.seconds_remaining),
            team_pass_rate: Some(record.team_pass_rate),
            formation: record.offensive_formation.as_str().to_string(),
        }
    }

    fn numerics(&self) -> [Option<f64>; NUMERIC_COUNT] {
        [
            self.down,
            self.distance,
            self.yard_line,
            self.score_diff,
            self.seconds_remaining,
            self.team_pass_rate,
        ]
    }
}

impl FeatureContract {
    /// Fits medians, means, stds and the formation vocabulary from
    /// training rows.
    pub fn fit(rows: &[FeatureRecord]) -> FeatureContract {
        let mut columns: [Vec<f64>; NUMERIC_COUNT] = Default::default();
        for row in rows {
            let sit = Situation::from_record(row);
            for (col, value) in columns.iter_mut().zip(sit.numerics()) {
                if let Some(v) = value {
                    col.push(v);
                }
            }
        }

        let mut medians = Vec::with_capacity(NUMERIC_COUNT);
        let mut means = Vec::with_capacity(NUMERIC_COUNT);
        let mut stds = Vec::with_capacity(NUMERIC_COUNT);
        for col in &mut columns {
            medians.push(median(col));
            let n = col.len().max(1) as f64;
            let mean = col.iter().sum::<f64>() / n;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            means.push(mean);
            stds.push(if std > MIN_STD { std } else { 1.0 });
        }

        let mut formations: Vec<String> = rows
            .iter()
            .map(|r| r.offensive_formation.as_str().to_string())
            .collect();
        formations.sort();
        formations.dedup();

        FeatureContract {
            numeric_medians: medians,
            numeric_means: means,
            numeric_stds: stds,
            formations,
        }
    }

    /// Total encoded width: the numerics plus one indicator per known
    /// formation.
    pub fn width(&self) -> usize {
        NUMERIC_COUNT + self.formations.len()
    }

    /// Encodes a situation into the model's input vector. Never fails:
    /// unknown formations contribute an all-zero block rather than an
    /// error.
    pub fn encode(&self, situation: &Situation) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());
        for (i, value) in situation.numerics().into_iter().enumerate() {
            let raw = value.unwrap_or(self.numeric_medians[i]);
            out.push((raw - self.numeric_means[i]) / self.numeric_stds[i]);
        }
        for label in &self.formations {
            out.push(if *label == situation.formation { 1.0 } else { 0.0 });
        }
        out
    }

    pub fn encode_rows(&self, rows: &[FeatureRecord]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|r| self.encode(&Situation::from_record(r)))
            .collect()
    }
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
