use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const SETTINGS_FILE_NAME: &str = "apiprobe.json";

/// Optional defaults read from `apiprobe.json`. Command-line flags win over
/// anything set here.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProbeSettings {
    #[serde(rename = "catalogDir")]
    pub catalog_dir: Option<String>,
    #[serde(rename = "resultsDir")]
    pub results_dir: Option<String>,
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
    #[serde(rename = "acceptInvalidCerts")]
    pub accept_invalid_certs: bool,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
    #[serde(rename = "defaultHeaders")]
    pub default_headers: BTreeMap<String, String>,
    pub microservices: Vec<String>,
    pub envs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: ProbeSettings,
    pub path: PathBuf,
    pub dir: PathBuf,
}

impl LoadedSettings {
    /// Resolves a path from the settings file against the file's directory.
    pub fn resolve(&self, value: &str) -> PathBuf {
        let candidate = Path::new(value);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.dir.join(candidate)
        }
    }
}

/// Reads `apiprobe.json` from `target` (a directory or the file itself).
/// A missing file is not an error.
pub fn load_settings(target: &Path) -> Result<Option<LoadedSettings>> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(SETTINGS_FILE_NAME), resolved)
    } else {
        let dir = match resolved.parent() {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()?,
        };
        (resolved, dir)
    };

    if !file_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading settings {}", file_path.display()))?;

    let settings: ProbeSettings = serde_json::from_str(&contents)
        .with_context(|| format!("parsing settings {}", file_path.display()))?;

    Ok(Some(LoadedSettings {
        settings,
        path: file_path,
        dir,
    }))
}
