use std::{
    fs,
    io::{self, Cursor},
    path::Path,
};

use tracing::debug;

use crate::{
    env::EnvMap,
    error::{ProbeError, Result},
};

/// Name of the dotenv file holding one (microservice, environment) pair's settings.
pub fn env_file_name(microservice: &str, env: &str) -> String {
    format!(".env.{microservice}.{env}")
}

/// Merges a dotenv file into `env` without touching the process environment.
pub fn load_env_file_sync(path: &Path, env: &mut EnvMap) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|source| ProbeError::io(path, source))?;

    for item in dotenvy::from_read_iter(Cursor::new(content)) {
        let (key, value) = item.map_err(|err| ProbeError::InvalidSetting {
            key: path.display().to_string(),
            message: err.to_string(),
        })?;
        env.insert(key, value);
    }

    Ok(())
}

/// Loads a fresh map for one pair. Each call starts empty, so values from a
/// previously loaded pair can never bleed into this one.
pub fn load_pair_env(config_dir: &Path, microservice: &str, env: &str) -> Result<EnvMap> {
    let path = config_dir.join(env_file_name(microservice, env));
    let mut values = EnvMap::new();

    match load_env_file_sync(&path, &mut values) {
        Ok(()) => {
            debug!(path = %path.display(), keys = values.len(), "loaded pair settings");
            Ok(values)
        }
        Err(ProbeError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Err(ProbeError::ConfigNotFound { path })
        }
        Err(err) => Err(err),
    }
}
