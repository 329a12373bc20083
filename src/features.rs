use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::play_text::{
    Direction, Formation, PlayType, normalize_play_type, parse_direction, parse_formation,
};

/// One observed play as it arrives from the raw export. Numeric cells stay
/// raw strings so a malformed value rejects the row instead of the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPlayRecord {
    #[serde(rename = "Offense")]
    pub offense: Option<String>,
    #[serde(rename = "PlayType")]
    pub play_type: Option<String>,
    #[serde(rename = "PlayText")]
    pub play_text: Option<String>,
    #[serde(rename = "Down")]
    pub down: Option<String>,
    #[serde(rename = "Distance")]
    pub distance: Option<String>,
    #[serde(rename = "YardsToGoal")]
    pub yards_to_goal: Option<String>,
    #[serde(rename = "OffenseScore")]
    pub offense_score: Option<String>,
    #[serde(rename = "DefenseScore")]
    pub defense_score: Option<String>,
    #[serde(rename = "Period")]
    pub period: Option<String>,
    #[serde(rename = "Clock Minutes")]
    pub clock_minutes: Option<String>,
    #[serde(rename = "Clock Seconds")]
    pub clock_seconds: Option<String>,
}

/// Defensive coverage recommended for a situation by the fixed heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverScheme {
    #[serde(rename = "Goal Line")]
    GoalLine,
    #[serde(rename = "Cover 1")]
    Cover1,
    #[serde(rename = "Cover 2")]
    Cover2,
    #[serde(rename = "Cover 3")]
    Cover3,
}

impl CoverScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverScheme::GoalLine => "Goal Line",
            CoverScheme::Cover1 => "Cover 1",
            CoverScheme::Cover2 => "Cover 2",
            CoverScheme::Cover3 => "Cover 3",
        }
    }
}

/// One fully derived row of the feature table. Field order is the on-disk
/// column order of the feature artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub down: u8,
    pub distance: f64,
    pub yard_line: f64,
    pub offensive_formation: Formation,
    pub play_direction: Direction,
    pub play_type: PlayType,
    pub recommended_cover: CoverScheme,
    pub score_diff: f64,
    pub seconds_remaining: f64,
    pub team_pass_rate: f64,
    pub offense_team: String,
}

/// Per-offense aggregate: fraction of that offense's scrimmage plays that
/// normalized to Pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStat {
    #[serde(rename = "Offense")]
    pub offense: String,
    pub team_pass_rate: f64,
}

/// Output of the feature-derivation stage. `dropped` counts rows rejected
/// by the validity rules; Run/Pass-scoped exclusions (`Other` plays) are
/// tracked separately because they are out of scope rather than invalid.
#[derive(Debug, Clone)]
pub struct FeatureBuild {
    pub rows: Vec<FeatureRecord>,
    pub team_stats: Vec<TeamStat>,
    pub dropped: usize,
    pub non_scrimmage: usize,
}

/// Quarter length in seconds and regulation period count for the source
/// competition. Fixed by the data's 15-minute format, never configurable.
const QUARTER_SECS: f64 = 900.0;
const REGULATION_PERIODS: f64 = 4.0;

pub fn seconds_remaining(period: f64, minutes: f64, seconds: f64) -> f64 {
    (REGULATION_PERIODS - period) * QUARTER_SECS + minutes * 60.0 + seconds
}

/// The fixed coverage heuristic. Goal-line proximity beats the distance
/// rules regardless of distance; the trailing Cover 2 arm is unreachable
/// for finite distances and exists for the non-finite case only.
pub fn recommend_cover(distance: f64, yard_line: f64) -> CoverScheme {
    if yard_line <= 10.0 {
        return CoverScheme::GoalLine;
    }
    if distance <= 3.0 {
        CoverScheme::Cover1
    } else if distance <= 7.0 {
        CoverScheme::Cover2
    } else if distance > 7.0 {
        CoverScheme::Cover3
    } else {
        CoverScheme::Cover2
    }
}

/// Derives the feature table and the per-offense pass-rate table from raw
/// plays.
///
/// Pass rates aggregate over every Run/Pass-normalized play, before any
/// validity filtering, so a team's tendency reflects its whole sample and
/// not whichever subset survives for training. Per-row failures are
/// filtered and counted, never raised.
pub fn build_features(records: &[RawPlayRecord]) -> FeatureBuild {
    let mut scrimmage: Vec<(&RawPlayRecord, PlayType)> = Vec::with_capacity(records.len());
    let mut non_scrimmage = 0usize;
    for rec in records {
        let ptype = normalize_play_type(rec.play_type.as_deref().unwrap_or(""));
        if ptype == PlayType::Other {
            non_scrimmage += 1;
            continue;
        }
        scrimmage.push((rec, ptype));
    }

    let mut counts: HashMap<String, (u64, u64)> = HashMap::new();
    for (rec, ptype) in &scrimmage {
        let name = offense_name(rec);
        let entry = counts.entry(name).or_insert((0, 0));
        if *ptype == PlayType::Pass {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    let mut team_stats: Vec<TeamStat> = counts
        .into_iter()
        .map(|(offense, (passes, total))| TeamStat {
            offense,
            team_pass_rate: passes as f64 / total.max(1) as f64,
        })
        .collect();
    team_stats.sort_by(|a, b| a.offense.cmp(&b.offense));

    let rate_by_team: HashMap<&str, f64> = team_stats
        .iter()
        .map(|t| (t.offense.as_str(), t.team_pass_rate))
        .collect();

    let mut rows = Vec::with_capacity(scrimmage.len());
    let mut dropped = 0usize;
    for (rec, ptype) in &scrimmage {
        let name = offense_name(rec);
        // Every scrimmage offense has a stat entry by construction.
        let pass_rate = rate_by_team.get(name.as_str()).copied().unwrap_or(0.0);
        match derive_row(rec, *ptype, name, pass_rate) {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }

    FeatureBuild {
        rows,
        team_stats,
        dropped,
        non_scrimmage,
    }
}

/// Team-stat rows sorted by pass rate, heaviest-passing first, name as the
/// tiebreak.
pub fn top_passing(stats: &[TeamStat], n: usize) -> Vec<TeamStat> {
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| {
        b.team_pass_rate
            .partial_cmp(&a.team_pass_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.offense.cmp(&b.offense))
    });
    sorted.truncate(n);
    sorted
}

fn offense_name(rec: &RawPlayRecord) -> String {
    rec.offense.as_deref().unwrap_or("").trim().to_string()
}

fn derive_row(
    rec: &RawPlayRecord,
    play_type: PlayType,
    offense_team: String,
    team_pass_rate: f64,
) -> Option<FeatureRecord> {
    let down = parse_num(rec.down.as_deref())?;
    let distance = parse_num(rec.distance.as_deref())?;
    let yard_line = parse_num(rec.yards_to_goal.as_deref())?;
    let offense_score = parse_num(rec.offense_score.as_deref())?;
    let defense_score = parse_num(rec.defense_score.as_deref())?;
    let period = parse_num(rec.period.as_deref())?;
    let minutes = parse_num(rec.clock_minutes.as_deref())?;
    let seconds = parse_num(rec.clock_seconds.as_deref())?;

    if down.fract() != 0.0 || !(1.0..=4.0).contains(&down) {
        return None;
    }

    let text = rec.play_text.as_deref().unwrap_or("");
    Some(FeatureRecord {
        down: down as u8,
        distance,
        yard_line,
        offensive_formation: parse_formation(text),
        play_direction: parse_direction(text),
        play_type,
        recommended_cover: recommend_cover(distance, yard_line),
        score_diff: offense_score - defense_score,
        seconds_remaining: seconds_remaining(period, minutes, seconds),
        team_pass_rate,
        offense_team,
    })
}

fn parse_num(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        offense: &str,
        play_type: &str,
        text: &str,
        down: &str,
        distance: &str,
        ytg: &str,
    ) -> RawPlayRecord {
        RawPlayRecord {
            offense: Some(offense.to_string()),
            play_type: Some(play_type.to_string()),
            play_text: Some(text.to_string()),
            down: Some(down.to_string()),
            distance: Some(distance.to_string()),
            yards_to_goal: Some(ytg.to_string()),
            offense_score: Some("7".to_string()),
            defense_score: Some("3".to_string()),
            period: Some("2".to_string()),
            clock_minutes: Some("5".to_string()),
            clock_seconds: Some("30".to_string()),
        }
    }

    #[test]
    fn cover_heuristic_bands() {
        assert_eq!(recommend_cover(2.0, 50.0), CoverScheme::Cover1);
        assert_eq!(recommend_cover(5.0, 50.0), CoverScheme::Cover2);
        assert_eq!(recommend_cover(9.0, 50.0), CoverScheme::Cover3);
        // Goal-line rule wins regardless of distance.
        assert_eq!(recommend_cover(9.0, 8.0), CoverScheme::GoalLine);
        assert_eq!(recommend_cover(1.0, 10.0), CoverScheme::GoalLine);
    }

    #[test]
    fn seconds_remaining_counts_down_from_regulation() {
        assert_eq!(seconds_remaining(1.0, 12.0, 0.0), 3420.0);
        assert_eq!(seconds_remaining(4.0, 0.0, 30.0), 30.0);
        assert_eq!(seconds_remaining(2.0, 15.0, 0.0), 2700.0);
    }

    #[test]
    fn other_plays_never_reach_the_table() {
        let records = vec![
            raw("A", "Rush", "rush left", "1", "10", "75"),
            raw("A", "Kneel", "kneel", "4", "1", "40"),
            raw("A", "Punt", "punt downed", "4", "12", "60"),
        ];
        let build = build_features(&records);
        assert_eq!(build.rows.len(), 1);
        assert_eq!(build.non_scrimmage, 2);
        assert_eq!(build.dropped, 0);
        assert!(build.rows.iter().all(|r| r.play_type != PlayType::Other));
    }

    #[test]
    fn pass_rate_aggregates_before_validity_filtering() {
        // Three scrimmage plays for A, one with an invalid down. The rate
        // must still be computed over all three.
        let records = vec![
            raw("A", "Pass Reception", "pass right", "1", "10", "70"),
            raw("A", "Pass Incompletion", "pass left", "5", "10", "70"),
            raw("A", "Rush", "rush middle", "2", "4", "55"),
        ];
        let build = build_features(&records);
        assert_eq!(build.rows.len(), 2);
        assert_eq!(build.dropped, 1);
        assert_eq!(build.team_stats.len(), 1);
        let rate = build.team_stats[0].team_pass_rate;
        assert!((rate - 2.0 / 3.0).abs() < 1e-12);
        assert!(build.rows.iter().all(|r| (r.team_pass_rate - rate).abs() < 1e-12));
    }

    #[test]
    fn invalid_downs_and_bad_numbers_are_dropped_not_fatal() {
        let records = vec![
            raw("B", "Rush", "rush", "0", "10", "50"),
            raw("B", "Rush", "rush", "2.5", "10", "50"),
            raw("B", "Rush", "rush", "1", "ten", "50"),
            raw("B", "Rush", "rush", "3", "2", "50"),
        ];
        let build = build_features(&records);
        assert_eq!(build.rows.len(), 1);
        assert_eq!(build.dropped, 3);
        assert!(build.rows.iter().all(|r| (1..=4).contains(&r.down)));
    }

    #[test]
    fn missing_clock_seconds_rejects_the_row() {
        let mut rec = raw("C", "Rush", "rush", "1", "10", "50");
        rec.clock_seconds = None;
        let build = build_features(&[rec]);
        assert!(build.rows.is_empty());
        assert_eq!(build.dropped, 1);
    }

    #[test]
    fn derived_row_carries_score_diff_and_clock() {
        let build = build_features(&[raw("D", "Rush", "shotgun rush left", "1", "10", "75")]);
        let row = &build.rows[0];
        assert_eq!(row.score_diff, 4.0);
        assert_eq!(row.seconds_remaining, seconds_remaining(2.0, 5.0, 30.0));
        assert_eq!(row.offensive_formation, Formation::Shotgun);
        assert_eq!(row.play_direction, Direction::Left);
    }

    #[test]
    fn top_passing_orders_heaviest_first() {
        let stats = vec![
            TeamStat { offense: "Ground Game U".into(), team_pass_rate: 0.25 },
            TeamStat { offense: "Air Raid Tech".into(), team_pass_rate: 0.80 },
            TeamStat { offense: "Balanced State".into(), team_pass_rate: 0.50 },
        ];
        let top = top_passing(&stats, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].offense, "Air Raid Tech");
        assert_eq!(top[1].offense, "Balanced State");
    }
}
