use std::path::PathBuf;

use anyhow::{Context, Result};

use playcall_lab::dataset;
use playcall_lab::features::{build_features, top_passing};

const TOP_PASSING_COUNT: usize = 5;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let input = parse_path_arg("--input")
        .context("missing --input <raw play-by-play csv>")?;
    let data_dir = parse_path_arg("--data-dir").unwrap_or_else(dataset::default_data_dir);
    let top_count = parse_usize_arg("--top").unwrap_or(TOP_PASSING_COUNT).clamp(1, 50);
    let features_path = data_dir.join(dataset::FEATURES_FILE);
    let team_stats_path = data_dir.join(dataset::TEAM_STATS_FILE);

    let load = dataset::load_raw_plays(&input)?;
    if load.skipped > 0 {
        eprintln!(
            "[WARN] skipped {} unreadable rows in {}",
            load.skipped,
            input.display()
        );
    }

    let build = build_features(&load.records);
    dataset::write_feature_table(&features_path, &build.rows)?;
    dataset::write_team_stats(&team_stats_path, &build.team_stats)?;

    println!("Featurize complete");
    println!("Raw rows: {}", load.records.len());
    println!(
        "Scrimmage rows kept: {} ({} non-scrimmage, {} dropped invalid)",
        build.rows.len(),
        build.non_scrimmage,
        build.dropped
    );
    println!("Offenses observed: {}", build.team_stats.len());
    println!("Features: {}", features_path.display());
    println!("Team stats: {}", team_stats_path.display());

    let top = top_passing(&build.team_stats, top_count);
    if !top.is_empty() {
        println!("Top passing offenses:");
        for stat in &top {
            println!("  {:<28} {:.3}", stat.offense, stat.team_pass_rate);
        }
    }

    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_string_arg(name).map(PathBuf::from)
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    parse_string_arg(name).and_then(|raw| raw.parse::<usize>().ok())
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
