use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::classifier::SoftmaxModel;
use crate::contract::FeatureContract;
use crate::dataset::write_atomic;

pub const BUNDLE_VERSION: u32 = 1;

/// Directory bundle artifacts live in, overridable through
/// APP_MODELS_DIR.
pub fn default_models_dir() -> PathBuf {
    match std::env::var("APP_MODELS_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
        _ => PathBuf::from("models"),
    }
}

/// Whether a bundle was trained on the full dataset or one team's plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleScope {
    Generic,
    Team { name: String },
}

impl BundleScope {
    pub fn describe(&self) -> String {
        match self {
            BundleScope::Generic => "generic".to_string(),
            BundleScope::Team { name } => format!("specialized for {name}"),
        }
    }
}

/// One trained task with its holdout evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskModel {
    pub model: SoftmaxModel,
    pub holdout_accuracy: f64,
    pub holdout_log_loss: f64,
}

/// Everything needed to serve predictions for one scope: the frozen
/// feature contract and the per-task models. Written as a single JSON
/// artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub version: u32,
    pub generated_at: String,
    pub scope: BundleScope,
    pub seed: u64,
    pub training_rows: usize,
    pub holdout_rows: usize,
    pub contract: FeatureContract,
    pub play_type: TaskModel,
    pub coverage: TaskModel,
    /// Absent when too few plays carried a usable direction label.
    pub direction: Option<TaskModel>,
}

/// Keeps alphanumerics and spaces, drops everything else, then strips
/// trailing whitespace. Idempotent, so an already-sanitized name passes
/// through unchanged.
pub fn sanitize_team_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();
    kept.trim_end().to_string()
}

/// On-disk file name for a scope. Errors when a team name sanitizes to
/// nothing, since that could only collide with another scope's file.
pub fn bundle_file_name(scope: &BundleScope) -> Result<String> {
    match scope {
        BundleScope::Generic => Ok("playcall_models.json".to_string()),
        BundleScope::Team { name } => {
            let stem = sanitize_team_name(name);
            if stem.is_empty() {
                bail!("team name {name:?} has no usable characters for a file name");
            }
            Ok(format!("{stem}_playcall_models.json"))
        }
    }
}

pub fn bundle_path(dir: &Path, scope: &BundleScope) -> Result<PathBuf> {
    Ok(dir.join(bundle_file_name(scope)?))
}

static REGISTRY: OnceCell<Mutex<HashMap<PathBuf, Arc<ModelBundle>>>> = OnceCell::new();

fn registry() -> &'static Mutex<HashMap<PathBuf, Arc<ModelBundle>>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

fn registry_guard() -> std::sync::MutexGuard<'static, HashMap<PathBuf, Arc<ModelBundle>>> {
    registry().lock().unwrap_or_else(|poison| poison.into_inner())
}

/// Serializes and atomically writes a bundle, then drops every cached
/// bundle so readers pick up the new artifacts on their next load.
pub fn save_bundle(dir: &Path, bundle: &ModelBundle) -> Result<PathBuf> {
    let path = bundle_path(dir, &bundle.scope)?;
    let json = serde_json::to_vec_pretty(bundle).context("encode model bundle")?;
    write_atomic(&path, &json)?;
    registry_guard().clear();
    Ok(path)
}

/// Loads a bundle through the process-wide cache. Repeat loads of the
/// same file share one Arc until a save invalidates the cache.
pub fn load_bundle(dir: &Path, scope: &BundleScope) -> Result<Arc<ModelBundle>> {
    let path = bundle_path(dir, scope)?;
    if let Some(cached) = registry_guard().get(&path) {
        return Ok(Arc::clone(cached));
    }
    let bytes = fs::read(&path)
        .with_context(|| format!("read model bundle at {}", path.display()))?;
    let bundle: ModelBundle = serde_json::from_slice(&bytes)
        .with_context(|| format!("decode model bundle at {}", path.display()))?;
    if bundle.version != BUNDLE_VERSION {
        bail!(
            "model bundle at {} has version {}, expected {BUNDLE_VERSION}; retrain to refresh it",
            path.display(),
            bundle.version
        );
    }
    let bundle = Arc::new(bundle);
    registry_guard().insert(path, Arc::clone(&bundle));
    Ok(bundle)
}

/// Resolves the bundle for an optional team: the specialized bundle when
/// its file exists, otherwise the generic one. The flag reports that a
/// requested specialization was not available. A specialized file that
/// exists but fails to load is an error, never silently masked.
pub fn load_bundle_or_generic(
    dir: &Path,
    team: Option<&str>,
) -> Result<(Arc<ModelBundle>, bool)> {
    if let Some(name) = team {
        let scope = BundleScope::Team { name: name.to_string() };
        let path = bundle_path(dir, &scope)?;
        if path.exists() {
            return Ok((load_bundle(dir, &scope)?, false));
        }
        return Ok((load_bundle(dir, &BundleScope::Generic)?, true));
    }
    Ok((load_bundle(dir, &BundleScope::Generic)?, false))
}
