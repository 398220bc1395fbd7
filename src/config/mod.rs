//! Configuration system (layered: defaults < config file < env).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RateguardError, Result};
use crate::util::retry::{RetryPolicy, DEFAULT_GRACE, DEFAULT_MAX_ATTEMPTS};

/// Overrides `retry.max_attempts`.
pub const MAX_ATTEMPTS_ENV: &str = "RATEGUARD_MAX_ATTEMPTS";
/// Overrides `retry.grace_ms`.
pub const GRACE_MS_ENV: &str = "RATEGUARD_RETRY_GRACE_MS";

/// Retry section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub grace_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            grace_ms: DEFAULT_GRACE.as_millis() as u64,
        }
    }
}

/// Layered configuration for Rateguard.
///
/// ```toml
/// [retry]
/// max_attempts = 5
/// grace_ms = 250
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateguardConfig {
    pub retry: RetrySettings,
}

impl RateguardConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Defaults overridden by environment variables (`.env` is loaded if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults, then `~/.rateguard/config.toml` if it exists, then the environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let base = match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `RATEGUARD_*` overrides resolved through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(MAX_ATTEMPTS_ENV) {
            self.retry.max_attempts = parse_env(MAX_ATTEMPTS_ENV, &raw)?;
        }
        if let Some(raw) = lookup(GRACE_MS_ENV) {
            self.retry.grace_ms = parse_env(GRACE_MS_ENV, &raw)?;
        }
        self.validate()
    }

    /// Build the retry driver configured here.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(self.retry.max_attempts)
            .grace(Duration::from_millis(self.retry.grace_ms))
            .build()
    }

    fn validate(self) -> Result<Self> {
        if self.retry.max_attempts == 0 {
            return Err(RateguardError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

/// `~/.rateguard/config.toml`, when a home directory can be resolved.
pub fn default_config_path() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".rateguard").join("config.toml"))
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| RateguardError::Configuration(format!("{key} must be a non-negative integer, got '{raw}'")))
}
