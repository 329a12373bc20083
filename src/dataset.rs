use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::features::{FeatureRecord, RawPlayRecord, TeamStat};

pub const FEATURES_FILE: &str = "features.csv";
pub const TEAM_STATS_FILE: &str = "team_stats.csv";

/// Directory the derived CSV artifacts live in, overridable through
/// APP_DATA_DIR.
pub fn default_data_dir() -> PathBuf {
    match std::env::var("APP_DATA_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
        _ => PathBuf::from("data"),
    }
}

pub fn default_features_path() -> PathBuf {
    default_data_dir().join(FEATURES_FILE)
}

pub fn default_team_stats_path() -> PathBuf {
    default_data_dir().join(TEAM_STATS_FILE)
}

/// Raw plays that survived CSV decoding, plus the count that did not.
#[derive(Debug, Clone)]
pub struct RawLoad {
    pub records: Vec<RawPlayRecord>,
    pub skipped: usize,
}

/// Reads a raw play-by-play export. Rows that fail to decode are skipped
/// and counted rather than failing the load; a missing or unreadable file
/// is still an error.
pub fn load_raw_plays(path: &Path) -> Result<RawLoad> {
    let file = fs::File::open(path)
        .with_context(|| format!("open raw plays at {}", path.display()))?;
    parse_raw_plays(file).with_context(|| format!("parse raw plays at {}", path.display()))
}

pub fn parse_raw_plays<R: std::io::Read>(input: R) -> Result<RawLoad> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers().context("read raw plays header row")?.clone();

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let Ok(row) = row else {
            skipped += 1;
            continue;
        };
        match row.deserialize::<RawPlayRecord>(Some(&headers)) {
            Ok(rec) => records.push(rec),
            Err(_) => skipped += 1,
        }
    }
    Ok(RawLoad { records, skipped })
}

pub fn load_feature_table(path: &Path) -> Result<Vec<FeatureRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open feature table at {}", path.display()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: FeatureRecord =
            row.with_context(|| format!("decode feature row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_feature_table(path: &Path, rows: &[FeatureRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).context("encode feature row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("finalize feature csv: {e}"))?;
    write_atomic(path, &bytes)
}

pub fn load_team_stats(path: &Path) -> Result<Vec<TeamStat>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open team stats at {}", path.display()))?;
    let mut stats = Vec::new();
    for row in reader.deserialize() {
        let row: TeamStat =
            row.with_context(|| format!("decode team stat in {}", path.display()))?;
        stats.push(row);
    }
    Ok(stats)
}

pub fn write_team_stats(path: &Path, stats: &[TeamStat]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for stat in stats {
        writer.serialize(stat).context("encode team stat")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("finalize team stats csv: {e}"))?;
    write_atomic(path, &bytes)
}

/// Writes through a sibling tmp file and renames into place so a crash
/// mid-write never leaves a truncated artifact behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("move {} into place", tmp.display()))?;
    Ok(())
}
