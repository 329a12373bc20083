use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use playcall_lab::classifier::{SoftmaxModel, TrainConfig};
use playcall_lab::contract::{FeatureContract, Situation};
use playcall_lab::dataset::parse_raw_plays;
use playcall_lab::features::{FeatureRecord, RawPlayRecord, build_features, recommend_cover};
use playcall_lab::play_text::{Direction, Formation, PlayType};
use playcall_lab::predict::PredictionService;
use playcall_lab::trainer::{TrainOptions, train};

fn sample_raw_play(i: usize) -> RawPlayRecord {
    let run = i % 2 == 0;
    let (play_type, text) = if run {
        ("Rush", "rush left for 3 yards")
    } else {
        ("Pass Reception", "shotgun pass complete right for 11 yards")
    };
    RawPlayRecord {
        offense: Some(format!("Team {}", i % 24)),
        play_type: Some(play_type.to_string()),
        play_text: Some(text.to_string()),
        down: Some((i % 4 + 1).to_string()),
        distance: Some((i % 12 + 1).to_string()),
        yards_to_goal: Some((i % 99 + 1).to_string()),
        offense_score: Some((i % 35).to_string()),
        defense_score: Some((i % 28).to_string()),
        period: Some((i % 4 + 1).to_string()),
        clock_minutes: Some((i % 15).to_string()),
        clock_seconds: Some((i % 60).to_string()),
    }
}

fn sample_feature_rows(n: usize) -> Vec<FeatureRecord> {
    (0..n)
        .map(|i| {
            let run = i % 2 == 0;
            let distance = if run { 1.0 + (i % 3) as f64 } else { 8.0 + (i % 4) as f64 };
            let yard_line = 20.0 + (i % 60) as f64;
            FeatureRecord {
                down: (i % 4 + 1) as u8,
                distance,
                yard_line,
                offensive_formation: if run { Formation::Standard } else { Formation::Shotgun },
                play_direction: if run { Direction::Left } else { Direction::Right },
                play_type: if run { PlayType::Run } else { PlayType::Pass },
                recommended_cover: recommend_cover(distance, yard_line),
                score_diff: (i % 28) as f64 - 14.0,
                seconds_remaining: 3600.0 - (i % 3600) as f64,
                team_pass_rate: 0.5,
                offense_team: format!("Team {}", i % 24),
            }
        })
        .collect()
}

fn bench_raw_plays_parse(c: &mut Criterion) {
    c.bench_function("raw_plays_parse", |b| {
        b.iter(|| {
            let load = parse_raw_plays(black_box(RAW_PLAYS_CSV.as_bytes())).unwrap();
            black_box(load.records.len());
        })
    });
}

fn bench_feature_build(c: &mut Criterion) {
    let records: Vec<RawPlayRecord> = (0..2000).map(sample_raw_play).collect();
    c.bench_function("feature_build_2000", |b| {
        b.iter(|| {
            let build = build_features(black_box(&records));
            black_box(build.rows.len());
        })
    });
}

fn bench_situation_encode(c: &mut Criterion) {
    let rows = sample_feature_rows(500);
    let contract = FeatureContract::fit(&rows);
    let situation = Situation {
        down: Some(3.0),
        distance: Some(7.0),
        yard_line: Some(45.0),
        score_diff: Some(-3.0),
        seconds_remaining: Some(840.0),
        team_pass_rate: Some(0.55),
        formation: "Shotgun".to_string(),
    };
    c.bench_function("situation_encode", |b| {
        b.iter(|| {
            let encoded = contract.encode(black_box(&situation));
            black_box(encoded.len());
        })
    });
}

fn bench_softmax_fit(c: &mut Criterion) {
    let rows = sample_feature_rows(200);
    let contract = FeatureContract::fit(&rows);
    let xs = contract.encode_rows(&rows);
    let ys: Vec<usize> = rows
        .iter()
        .map(|r| usize::from(r.play_type == PlayType::Pass))
        .collect();
    let cfg = TrainConfig { epochs: 50, ..TrainConfig::default() };
    c.bench_function("softmax_fit_200x50", |b| {
        b.iter(|| {
            let model = SoftmaxModel::fit(
                black_box(&xs),
                black_box(&ys),
                vec!["Run".to_string(), "Pass".to_string()],
                cfg,
            );
            black_box(model.bias[0]);
        })
    });
}

fn bench_predict_call(c: &mut Criterion) {
    let rows = sample_feature_rows(400);
    let outcome = train(&rows, &TrainOptions::default()).expect("bench training should run");
    let service = PredictionService::from_bundle(Arc::new(outcome.bundle));
    let situation = Situation {
        down: Some(2.0),
        distance: Some(4.0),
        yard_line: Some(60.0),
        score_diff: Some(7.0),
        seconds_remaining: Some(1500.0),
        team_pass_rate: Some(0.48),
        formation: "Standard".to_string(),
    };
    c.bench_function("predict_call", |b| {
        b.iter(|| {
            let call = service.predict(black_box(&situation));
            black_box(call.play_type_confidence());
        })
    });
}

criterion_group!(
    perf,
    bench_raw_plays_parse,
    bench_feature_build,
    bench_situation_encode,
    bench_softmax_fit,
    bench_predict_call
);
criterion_main!(perf);

static RAW_PLAYS_CSV: &str = include_str!("../tests/fixtures/raw_plays.csv");
