use std::path::PathBuf;

use anyhow::Result;

use playcall_lab::bundle;
use playcall_lab::classifier::TrainConfig;
use playcall_lab::dataset;
use playcall_lab::filter::MIN_DIRECTION_ROWS;
use playcall_lab::trainer::{self, TrainOptions};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let features_path =
        parse_path_arg("--features").unwrap_or_else(dataset::default_features_path);
    let models_dir = parse_path_arg("--models-dir").unwrap_or_else(bundle::default_models_dir);

    let defaults = TrainConfig::default();
    let opts = TrainOptions {
        target_team: parse_string_arg("--team"),
        seed: parse_u64_arg("--seed").unwrap_or(trainer::DEFAULT_SEED),
        config: TrainConfig {
            epochs: parse_usize_arg("--epochs")
                .unwrap_or(defaults.epochs)
                .clamp(10, 10_000),
            learning_rate: parse_f64_arg("--learning-rate")
                .unwrap_or(defaults.learning_rate)
                .clamp(0.001, 5.0),
            ..defaults
        },
    };

    let rows = dataset::load_feature_table(&features_path)?;
    let (outcome, path) = trainer::train_and_save(&rows, &models_dir, &opts)?;

    println!("Training complete");
    println!("Dataset: {}", outcome.selection.summary_line());
    println!(
        "Split: {} train / {} holdout (seed {})",
        outcome.bundle.training_rows, outcome.bundle.holdout_rows, outcome.bundle.seed
    );
    println!(
        "Play type: accuracy {:.3} log_loss {:.3}",
        outcome.bundle.play_type.holdout_accuracy, outcome.bundle.play_type.holdout_log_loss
    );
    for entry in &outcome.play_type_report {
        println!(
            "  {:<5} precision {:.3} recall {:.3} support {}",
            entry.class, entry.precision, entry.recall, entry.support
        );
    }
    println!(
        "Coverage: accuracy {:.3} log_loss {:.3}",
        outcome.bundle.coverage.holdout_accuracy, outcome.bundle.coverage.holdout_log_loss
    );
    match &outcome.bundle.direction {
        Some(task) => println!(
            "Direction: accuracy {:.3} log_loss {:.3} ({} labeled plays)",
            task.holdout_accuracy, task.holdout_log_loss, outcome.direction_rows
        ),
        None => println!(
            "Direction: skipped ({} labeled plays, need more than {})",
            outcome.direction_rows, MIN_DIRECTION_ROWS
        ),
    }
    println!("Bundle: {}", path.display());

    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_string_arg(name).map(PathBuf::from)
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_u64_arg(name: &str) -> Option<u64> {
    parse_string_arg(name).and_then(|raw| raw.parse::<u64>().ok())
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    parse_string_arg(name).and_then(|raw| raw.parse::<usize>().ok())
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    parse_string_arg(name).and_then(|raw| raw.parse::<f64>().ok())
}
