use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

/// Largest input file the pipeline accepts, matching the upload ceiling of
/// the surrounding service.
pub const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Artifact file name looked up next to the executable when no explicit
/// model path is given.
const DEFAULT_MODEL_FILE: &str = "classifier.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Resolved classifier artifact, when one is available.
    pub model_path: Option<PathBuf>,
}

impl AppConfig {
    /// Resolve the model artifact location. An explicit override must exist;
    /// without one, a default artifact beside the executable is picked up
    /// when present.
    pub fn from_override(path: Option<PathBuf>) -> Result<Self> {
        let model_path = match path {
            Some(custom) => Some(canonicalize_file(&custom)?),
            None => default_model_path(),
        };
        Ok(Self { model_path })
    }
}

fn canonicalize_file(path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("failed to resolve model artifact at {:?}", path))?;
    if canonical.is_file() {
        Ok(canonical)
    } else {
        Err(anyhow!("model path {:?} is not a file", canonical))
    }
}

fn default_model_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.ancestors().find_map(|dir| {
        let candidate = dir.join(DEFAULT_MODEL_FILE);
        candidate.is_file().then_some(candidate)
    })
}
