//! Error types for Rateguard.

pub mod unified;

pub use unified::{ErrorCategory, ErrorCode, RecoverySuggestion};

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Surface form of an upstream error string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Dialect {
    /// `METHOD "URL": STATUS REASON { ...json... }`
    Json,
    /// `METHOD URL: STATUS REASON - MESSAGE`
    Plain,
}

/// Failure to interpret a raw error string.
///
/// Body malformations never surface here; they degrade into the
/// `message` field instead. Only a header that does not match the
/// dialect's `METHOD URL: STATUS REASON` shape is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized {dialect} error header")]
    HeaderUnrecognized { dialect: Dialect },
}

impl ParseError {
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::HeaderUnrecognized { dialect } => *dialect,
        }
    }
}

/// Primary error type for Rateguard operations outside the pure parsers.
#[derive(Error, Debug)]
pub enum RateguardError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RateguardError>;
