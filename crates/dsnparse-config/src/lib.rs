use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expanding environment in {path}: {message}")]
    EnvExpansion { path: PathBuf, message: String },

    #[error("parsing yaml {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("dsn entry `{0}` is defined more than once")]
    DuplicateName(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingCfg,

    /// Named connection strings to parse.
    pub dsns: Vec<DsnEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingCfg {
    /// Either a simple level like "info" or a full EnvFilter string
    /// e.g. "warn,dsnparse_core=trace".
    pub level: Option<String>,
    /// Emit logs as JSON lines when true.
    pub json: bool,
    /// Include target info in logs.
    pub with_targets: bool,
}

impl Default for LoggingCfg {
    fn default() -> Self {
        Self {
            level: Some("warn".to_owned()),
            json: false,
            with_targets: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsnEntry {
    /// Entry name (unique)
    pub name: String,

    /// Raw connection string; `${VAR}` is expanded from the environment.
    pub dsn: String,
}

impl AppConfig {
    /// Append the entries of `other`, keeping this config's logging.
    fn merge(&mut self, other: AppConfig) {
        self.dsns.extend(other.dsns);
    }

    fn check_unique(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.dsns {
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(())
    }
}

pub fn load_from_path(file_path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
    let path = file_path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let with_env = shellexpand::env(&raw).map_err(|e| {
        ConfigError::EnvExpansion {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    let cfg: AppConfig =
        serde_yaml::from_str(&with_env).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    cfg.check_unique()?;
    debug!(path = %path.display(), entries = cfg.dsns.len(), "config loaded");
    Ok(cfg)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

/// Load every `.yaml`/`.yml` file under `dir_path` (sorted by path) into
/// one config. Other files are skipped.
///
/// Logging settings come from the first file; DSN entries are merged.
pub fn load_from_dir(dir_path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
    let mut merged: Option<AppConfig> = None;
    for entry in WalkDir::new(dir_path.as_ref())
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_yaml(e.path()))
    {
        if entry.path().to_str().is_none() {
            error!(file = %entry.path().display(), "skipping file in config dir");
            continue;
        }

        let cfg = load_from_path(entry.path())?;
        match merged.as_mut() {
            Some(m) => m.merge(cfg),
            None => merged = Some(cfg),
        }
    }

    let merged = merged.unwrap_or_default();
    merged.check_unique()?;
    Ok(merged)
}

pub fn load_cfg(path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
    let cfg_path = path.as_ref();

    match cfg_path.is_dir() {
        true => load_from_dir(cfg_path),
        false => load_from_path(cfg_path),
    }
}
