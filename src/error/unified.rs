//! Unified error classification and recovery.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Machine-readable error codes the upstream API is known to emit.
///
/// Codes outside this set are kept verbatim on [`ApiError::code`](crate::interpreter::ApiError)
/// and simply have no `ErrorCode` counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCode {
    RateLimitExceeded,
    InsufficientQuota,
    InvalidApiKey,
    InvalidApiKeyHeader,
    AccountDeactivated,
    OrganizationDeactivated,
    ModelNotFound,
    ContextLengthExceeded,
}

impl ErrorCode {
    /// Codes that mean the credentials themselves are unusable.
    pub fn is_auth(self) -> bool {
        matches!(
            self,
            Self::InvalidApiKey
                | Self::InvalidApiKeyHeader
                | Self::AccountDeactivated
                | Self::OrganizationDeactivated
        )
    }
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    RateLimit,
    Authentication,
    Server,
    Client,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverySuggestion {
    /// Sleep for the advised delay, then reissue the request.
    RetryAfterDelay,
    RetryWithBackoff,
    CheckCredentials,
    FixRequest,
    ContactSupport,
}
