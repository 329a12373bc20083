use std::path::PathBuf;

use anyhow::Result;

use playcall_lab::bundle;
use playcall_lab::contract::Situation;
use playcall_lab::dataset;
use playcall_lab::predict::{
    DEFAULT_PASS_RATE, MODEL_QUARTER_MINUTES, PredictionService, clock_to_model_seconds,
    pass_rate_for,
};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let models_dir = parse_path_arg("--models-dir").unwrap_or_else(bundle::default_models_dir);
    let team_stats_path =
        parse_path_arg("--team-stats").unwrap_or_else(dataset::default_team_stats_path);
    let team = parse_string_arg("--team");

    let down = parse_f64_arg("--down").unwrap_or(1.0).clamp(1.0, 4.0);
    let distance = parse_f64_arg("--distance").unwrap_or(10.0).max(1.0);
    let yard_line = parse_f64_arg("--yard-line").unwrap_or(75.0).clamp(1.0, 99.0);
    let score_diff = parse_f64_arg("--score-diff").unwrap_or(0.0);
    let quarter = parse_f64_arg("--quarter").unwrap_or(1.0).clamp(1.0, 4.0);
    let quarter_minutes = parse_f64_arg("--quarter-minutes")
        .unwrap_or(MODEL_QUARTER_MINUTES)
        .clamp(1.0, 20.0);
    let minutes = parse_f64_arg("--minutes")
        .unwrap_or(quarter_minutes)
        .clamp(0.0, quarter_minutes);
    let seconds = parse_f64_arg("--seconds").unwrap_or(0.0).clamp(0.0, 59.0);
    let formation = parse_string_arg("--formation").unwrap_or_else(|| "Shotgun".to_string());

    let service = PredictionService::open(&models_dir, team.as_deref())?;
    if service.fell_back()
        && let Some(name) = team.as_deref()
    {
        eprintln!("[WARN] no specialized bundle for {name}, using generic models");
    }

    let team_pass_rate = match parse_f64_arg("--pass-rate") {
        Some(rate) => rate.clamp(0.0, 1.0),
        None => match team.as_deref() {
            Some(name) => {
                if team_stats_path.exists() {
                    let stats = dataset::load_team_stats(&team_stats_path)?;
                    match pass_rate_for(&stats, name) {
                        Some(rate) => rate,
                        None => {
                            eprintln!(
                                "[INFO] {name} not in {}, assuming pass rate {DEFAULT_PASS_RATE}",
                                team_stats_path.display()
                            );
                            DEFAULT_PASS_RATE
                        }
                    }
                } else {
                    eprintln!(
                        "[WARN] team stats missing at {}, assuming pass rate {DEFAULT_PASS_RATE}",
                        team_stats_path.display()
                    );
                    DEFAULT_PASS_RATE
                }
            }
            None => DEFAULT_PASS_RATE,
        },
    };

    let situation = Situation {
        down: Some(down),
        distance: Some(distance),
        yard_line: Some(yard_line),
        score_diff: Some(score_diff),
        seconds_remaining: Some(clock_to_model_seconds(
            quarter,
            minutes,
            seconds,
            quarter_minutes,
        )),
        team_pass_rate: Some(team_pass_rate),
        formation,
    };
    let call = service.predict(&situation);

    println!("Serving {} models", service.scope().describe());
    println!(
        "Situation: {} and {:.0} at the {:.0}, Q{:.0} {:02.0}:{:02.0}, margin {:+.0}, {}",
        ordinal(down),
        distance,
        yard_line,
        quarter,
        minutes,
        seconds,
        score_diff,
        situation.formation
    );
    println!("Play call: {}", call.play_type);
    for (class, prob) in &call.play_type_probabilities {
        println!("  {:<8} {:>5.1}%", class, prob * 100.0);
    }
    println!("Recommended coverage: {}", call.coverage);
    match (&call.direction, &call.direction_probabilities) {
        (Some(direction), Some(distribution)) => {
            println!("Likely direction: {}", direction);
            for (class, prob) in distribution {
                println!("  {:<8} {:>5.1}%", class, prob * 100.0);
            }
        }
        _ => println!("Likely direction: unavailable (not enough directional data)"),
    }

    Ok(())
}

fn ordinal(down: f64) -> &'static str {
    match down as u8 {
        1 => "1st",
        2 => "2nd",
        3 => "3rd",
        _ => "4th",
    }
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

fn parse_f64_arg(name: &str) -> Option<f64> {
    parse_string_arg(name).and_then(|raw| raw.parse::<f64>().ok())
}
