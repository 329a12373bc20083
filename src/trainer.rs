use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::bundle::{BUNDLE_VERSION, BundleScope, ModelBundle, TaskModel, save_bundle};
use crate::classifier::{ClassReport, SoftmaxModel, TrainConfig, accuracy, class_report, log_loss};
use crate::contract::FeatureContract;
use crate::features::{CoverScheme, FeatureRecord};
use crate::filter::{MIN_DIRECTION_ROWS, TargetSelection, select_direction_subset, select_for_target};
use crate::play_text::{Direction, PlayType};

/// Matches the original modeling setup this pipeline was calibrated
/// against, so retrains reproduce historical splits.
pub const DEFAULT_SEED: u64 = 42;

const HOLDOUT_FRACTION: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub target_team: Option<String>,
    pub seed: u64,
    pub config: TrainConfig,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            target_team: None,
            seed: DEFAULT_SEED,
            config: TrainConfig::default(),
        }
    }
}

/// A finished training run: the bundle plus everything the caller needs
/// to report on it.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub bundle: ModelBundle,
    pub selection: TargetSelection,
    pub play_type_report: Vec<ClassReport>,
    /// Rows carrying a concrete direction label, whether or not that was
    /// enough to train the direction task.
    pub direction_rows: usize,
}

struct TaskFit {
    task: TaskModel,
    report: Vec<ClassReport>,
    train_rows: usize,
    holdout_rows: usize,
}

/// Trains the three situational models over the feature table and returns
/// the assembled bundle. Selection, the feature contract, the shuffled
/// split and every fit are deterministic for a given seed.
pub fn train(rows: &[FeatureRecord], opts: &TrainOptions) -> Result<TrainingOutcome> {
    let (selected, selection) = select_for_target(rows, opts.target_team.as_deref());
    let selected: Vec<FeatureRecord> = selected
        .into_iter()
        .filter(|r| r.play_type != PlayType::Other)
        .collect();
    if selected.is_empty() {
        bail!("no scrimmage rows to train on");
    }

    let contract = FeatureContract::fit(&selected);
    let encoded = contract.encode_rows(&selected);

    let (main_xs, play_type_ys) = task_dataset(&encoded, &selected, play_type_label);
    let (_, coverage_ys) = task_dataset(&encoded, &selected, |r| Some(cover_label(r)));

    let directional = select_direction_subset(&selected);
    let direction_rows = directional.len();
    let direction_xs = contract.encode_rows(&directional);
    let direction_ys: Vec<usize> = directional
        .iter()
        .filter_map(|r| direction_label(r))
        .collect();

    let seed = opts.seed;
    let cfg = opts.config;
    let (play_type_fit, (coverage_fit, direction_fit)) = rayon::join(
        || fit_task(&main_xs, &play_type_ys, play_type_classes(), seed, cfg),
        || {
            rayon::join(
                || fit_task(&main_xs, &coverage_ys, cover_classes(), seed, cfg),
                || {
                    if direction_rows > MIN_DIRECTION_ROWS {
                        Some(fit_task(
                            &direction_xs,
                            &direction_ys,
                            direction_classes(),
                            seed,
                            cfg,
                        ))
                    } else {
                        None
                    }
                },
            )
        },
    );

    let play_type_fit = play_type_fit?;
    let coverage_fit = coverage_fit?;
    let direction_task = match direction_fit {
        Some(fit) => Some(fit?.task),
        None => None,
    };

    let scope = match selection.specialized_team() {
        Some(team) => BundleScope::Team { name: team.to_string() },
        None => BundleScope::Generic,
    };
    let bundle = ModelBundle {
        version: BUNDLE_VERSION,
        generated_at: chrono::Utc::now().to_rfc3339(),
        scope,
        seed,
        training_rows: play_type_fit.train_rows,
        holdout_rows: play_type_fit.holdout_rows,
        contract,
        play_type: play_type_fit.task,
        coverage: coverage_fit.task,
        direction: direction_task,
    };

    Ok(TrainingOutcome {
        bundle,
        selection,
        play_type_report: play_type_fit.report,
        direction_rows,
    })
}

/// Trains and persists in one step. Saving also drops every cached bundle
/// so serving picks up the fresh artifacts.
pub fn train_and_save(
    rows: &[FeatureRecord],
    models_dir: &Path,
    opts: &TrainOptions,
) -> Result<(TrainingOutcome, PathBuf)> {
    let outcome = train(rows, opts)?;
    let path = save_bundle(models_dir, &outcome.bundle)?;
    Ok((outcome, path))
}

fn fit_task(
    xs: &[Vec<f64>],
    ys: &[usize],
    classes: Vec<String>,
    seed: u64,
    cfg: TrainConfig,
) -> Result<TaskFit> {
    let (train_idx, hold_idx) = split_indices(xs.len(), seed);
    if train_idx.is_empty() {
        bail!("not enough rows to carve a training split");
    }
    let train_xs: Vec<Vec<f64>> = train_idx.iter().map(|&i| xs[i].clone()).collect();
    let train_ys: Vec<usize> = train_idx.iter().map(|&i| ys[i]).collect();
    let hold_xs: Vec<Vec<f64>> = hold_idx.iter().map(|&i| xs[i].clone()).collect();
    let hold_ys: Vec<usize> = hold_idx.iter().map(|&i| ys[i]).collect();

    let model = SoftmaxModel::fit(&train_xs, &train_ys, classes, cfg);
    let report = class_report(&model, &hold_xs, &hold_ys);
    Ok(TaskFit {
        task: TaskModel {
            holdout_accuracy: accuracy(&model, &hold_xs, &hold_ys),
            holdout_log_loss: log_loss(&model, &hold_xs, &hold_ys),
            model,
        },
        report,
        train_rows: train_idx.len(),
        holdout_rows: hold_idx.len(),
    })
}

/// Seeded shuffle then an 80/20 cut, holdout size rounded up so any
/// non-empty dataset evaluates on at least one row.
fn split_indices(n: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);
    let holdout = ((n as f64) * HOLDOUT_FRACTION).ceil() as usize;
    let hold = idx[..holdout].to_vec();
    let train = idx[holdout..].to_vec();
    (train, hold)
}

fn task_dataset(
    encoded: &[Vec<f64>],
    rows: &[FeatureRecord],
    label: impl Fn(&FeatureRecord) -> Option<usize>,
) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut xs = Vec::with_capacity(rows.len());
    let mut ys = Vec::with_capacity(rows.len());
    for (x, row) in encoded.iter().zip(rows) {
        if let Some(y) = label(row) {
            xs.push(x.clone());
            ys.push(y);
        }
    }
    (xs, ys)
}

fn play_type_classes() -> Vec<String> {
    vec![
        PlayType::Run.as_str().to_string(),
        PlayType::Pass.as_str().to_string(),
    ]
}

fn play_type_label(row: &FeatureRecord) -> Option<usize> {
    match row.play_type {
        PlayType::Run => Some(0),
        PlayType::Pass => Some(1),
        PlayType::Other => None,
    }
}

fn cover_classes() -> Vec<String> {
    vec![
        CoverScheme::GoalLine.as_str().to_string(),
        CoverScheme::Cover1.as_str().to_string(),
        CoverScheme::Cover2.as_str().to_string(),
        CoverScheme::Cover3.as_str().to_string(),
    ]
}

fn cover_label(row: &FeatureRecord) -> usize {
    match row.recommended_cover {
        CoverScheme::GoalLine => 0,
        CoverScheme::Cover1 => 1,
        CoverScheme::Cover2 => 2,
        CoverScheme::Cover3 => 3,
    }
}

fn direction_classes() -> Vec<String> {
    vec![
        Direction::Left.as_str().to_string(),
        Direction::Right.as_str().to_string(),
        Direction::Middle.as_str().to_string(),
    ]
}

fn direction_label(row: &FeatureRecord) -> Option<usize> {
    match row.play_direction {
        Direction::Left => Some(0),
        Direction::Right => Some(1),
        Direction::Middle => Some(2),
        Direction::Unknown => None,
    }
}
