//! Runtime configuration.
//!
//! # Responsibility
//! - Describe where rule documents and the taxonomy database live.
//! - Carry matcher thresholds and optional logging settings.
//!
//! # Invariants
//! - Thresholds are within `[0, 1]`.
//! - Storage paths are non-empty after trimming.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Minimum leaf-similarity score accepted by default.
pub const DEFAULT_MIN_SCORE: f64 = 0.75;
/// Minimum lead over the runner-up accepted by default.
pub const DEFAULT_MIN_MARGIN: f64 = 0.05;

/// Leaf-similarity acceptance thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub min_score: f64,
    pub min_margin: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            min_margin: DEFAULT_MIN_MARGIN,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("min_score", self.min_score), ("min_margin", self.min_margin)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: name,
                    message: format!("must be within [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Top-level configuration file (`JSON`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoreConfig {
    /// Directory holding one sub-directory of rule documents per group.
    pub rules_dir: PathBuf,
    /// SQLite file holding the taxonomy master.
    pub taxonomy_db: PathBuf,
    #[serde(default)]
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; logging is off when absent.
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default)]
    pub matcher: MatcherConfig,
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_path(&self.rules_dir, "rules_dir")?;
        require_path(&self.taxonomy_db, "taxonomy_db")?;
        self.matcher.validate()
    }

    /// Resolves relative storage paths against `base`.
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        if self.rules_dir.is_relative() {
            self.rules_dir = base.join(&self.rules_dir);
        }
        if self.taxonomy_db.is_relative() {
            self.taxonomy_db = base.join(&self.taxonomy_db);
        }
        self
    }
}

/// Reads, validates and path-resolves a JSON config file.
///
/// Relative storage paths are taken relative to the config file's directory.
pub fn load_config(path: impl AsRef<Path>) -> Result<CoreConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;
    let config = parse_config(&text)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.resolve_relative_to(base))
}

pub fn parse_config(text: &str) -> Result<CoreConfig, ConfigError> {
    let config: CoreConfig = serde_json::from_str(text).map_err(ConfigError::Parse)?;
    config.validate()?;
    Ok(config)
}

fn require_path(path: &Path, field: &'static str) -> Result<(), ConfigError> {
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field,
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidValue { field, message } => write!(f, "config `{field}` {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}
