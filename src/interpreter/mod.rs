//! Typed interpretation of upstream chat-completion error strings.
//!
//! The upstream HTTP client reports failures as a single string in one of two
//! dialects:
//!
//! ```text
//! POST "https://api.openai.com/v1/chat/completions": 429 Too Many Requests { "error": { ... } }
//! POST https://api.openai.com/v1/chat/completions: 429 Too Many Requests - Rate limit reached for ...
//! ```
//!
//! [`parse_json_format`] and [`parse_plain_format`] turn one of those strings
//! into an [`ApiError`]; [`parse`] tries both. Everything here is pure and
//! safe to call from any number of threads.
//!
//! ```
//! use rateguard::interpreter::{parse, Classify};
//!
//! let raw = r#"POST "https://api.openai.com/v1/chat/completions": 502 Bad Gateway { "message": "Upstream error" }"#;
//! let err = parse(raw).unwrap();
//! assert!(err.is_server_error());
//! assert_eq!(err.message, "Upstream error");
//! ```

mod json;
mod plain;
mod rate_limit;

pub use json::parse_json_format;
pub use plain::parse_plain_format;
pub use rate_limit::{extract_rate_info, RetryAfterPrecision};

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};
use strum::{Display, EnumString};

use crate::error::{ErrorCategory, ErrorCode, ParseError, RecoverySuggestion};

/// Machine code assigned to 429 responses whose message mentions a rate limit.
pub const RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";

/// HTTP verbs the upstream client reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Owner of the quota that was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScopeType {
    Organization,
    Project,
}

/// Quantitative rate-limit descriptor recovered from an error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateInfo {
    /// Model the quota applies to, e.g. `gpt-4.1`.
    pub model: String,
    pub scope_type: ScopeType,
    /// e.g. `org-YvWUPqaYaDO3IEven3giqHwj`
    pub scope_id: String,
    /// e.g. `tokens per min (TPM)`
    pub metric: String,
    pub limit: u64,
    pub used: u64,
    pub requested: u64,
    /// Advisory delay before the request may succeed again.
    #[serde(serialize_with = "serialize_secs")]
    pub retry_after: Duration,
    pub docs_url: String,
}

/// One parsed upstream API failure.
///
/// Produced by the parsers in this module; `Display` renders the canonical
/// `METHOD URL: STATUS REASON - MESSAGE` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub method: HttpMethod,
    pub url: String,
    pub status: u16,
    /// Reason phrase, e.g. `Too Many Requests`.
    pub reason: String,
    /// Human-readable message from the body; may be empty.
    pub message: String,
    /// Short category string such as `tokens` or `invalid_request_error`.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Offending request parameter. `None` and `Some("")` stay distinct.
    pub param: Option<String>,
    /// Machine code such as `rate_limit_exceeded`; may be empty.
    pub code: String,
    pub rate_info: Option<RateInfo>,
}

impl ApiError {
    pub(crate) fn from_header(method: HttpMethod, url: &str, status: u16, reason: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            status,
            reason: reason.trim().to_string(),
            message: String::new(),
            error_type: String::new(),
            param: None,
            code: String::new(),
            rate_info: None,
        }
    }

    /// Fill an empty `code` for 429 responses that talk about a rate limit.
    /// A code supplied by the upstream is never overwritten.
    pub(crate) fn infer_code(&mut self) {
        if self.code.is_empty() && self.status == 429 && mentions_rate_limit(&self.message) {
            self.code = RATE_LIMIT_EXCEEDED.to_string();
        }
    }

    /// The `code` as a known [`ErrorCode`], if it is one.
    pub fn known_code(&self) -> Option<ErrorCode> {
        self.code.parse().ok()
    }

    /// Advisory delay supplied by the upstream, if a rate-limit descriptor was found.
    pub fn retry_after(&self) -> Option<Duration> {
        self.rate_info.as_ref().map(|info| info.retry_after)
    }

    /// Whether the upstream gave enough information to wait and reissue.
    ///
    /// Requires a 429 status, the `rate_limit_exceeded` code and a parsed
    /// [`RateInfo`]; a rate limit without an advisory delay is not retried.
    pub fn is_retry_advised(&self) -> bool {
        self.status == 429 && self.code == RATE_LIMIT_EXCEEDED && self.rate_info.is_some()
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        if self.is_rate_limit() {
            ErrorCategory::RateLimit
        } else if self.is_auth() {
            ErrorCategory::Authentication
        } else if self.is_server_error() {
            ErrorCategory::Server
        } else if (400..=499).contains(&self.status) {
            ErrorCategory::Client
        } else {
            ErrorCategory::Unknown
        }
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::RateLimit if self.is_retry_advised() => {
                RecoverySuggestion::RetryAfterDelay
            }
            ErrorCategory::RateLimit | ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::Client => RecoverySuggestion::FixRequest,
            ErrorCategory::Unknown => RecoverySuggestion::ContactSupport,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} {} - {}",
            self.method, self.url, self.status, self.reason, self.message
        )
    }
}

impl std::error::Error for ApiError {}

/// Classifier predicates over a parsed error.
///
/// Implemented for `Option` as well, so an absent error answers `false`
/// to every question.
pub trait Classify {
    /// 429, the `rate_limit_exceeded` code, or a message mentioning a rate limit.
    fn is_rate_limit(&self) -> bool;
    /// 401/403 or a credential error code. The message is not consulted.
    fn is_auth(&self) -> bool;
    /// Any 5xx status.
    fn is_server_error(&self) -> bool;
}

impl Classify for ApiError {
    fn is_rate_limit(&self) -> bool {
        self.status == 429 || self.code == RATE_LIMIT_EXCEEDED || mentions_rate_limit(&self.message)
    }

    fn is_auth(&self) -> bool {
        matches!(self.status, 401 | 403) || self.known_code().is_some_and(ErrorCode::is_auth)
    }

    fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.status)
    }
}

impl<T: Classify + ?Sized> Classify for &T {
    fn is_rate_limit(&self) -> bool {
        (**self).is_rate_limit()
    }

    fn is_auth(&self) -> bool {
        (**self).is_auth()
    }

    fn is_server_error(&self) -> bool {
        (**self).is_server_error()
    }
}

impl<T: Classify> Classify for Option<T> {
    fn is_rate_limit(&self) -> bool {
        self.as_ref().is_some_and(|e| e.is_rate_limit())
    }

    fn is_auth(&self) -> bool {
        self.as_ref().is_some_and(|e| e.is_auth())
    }

    fn is_server_error(&self) -> bool {
        self.as_ref().is_some_and(|e| e.is_server_error())
    }
}

/// Render an optional error; an absent one renders as `<nil>`.
pub fn render(error: Option<&ApiError>) -> String {
    match error {
        Some(error) => error.to_string(),
        None => "<nil>".to_string(),
    }
}

/// Interpret a raw error string in either dialect.
///
/// The JSON dialect is tried first; the plain dialect only when the JSON
/// header is rejected. If both reject, the plain dialect's error is returned.
pub fn parse(raw: &str) -> Result<ApiError, ParseError> {
    parse_json_format(raw).or_else(|_| parse_plain_format(raw))
}

fn mentions_rate_limit(message: &str) -> bool {
    message.to_lowercase().contains("rate limit")
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
