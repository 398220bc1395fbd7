//! Convenience re-exports for common use.

pub use crate::config::RateguardConfig;
pub use crate::error::{Dialect, ErrorCategory, ParseError, RateguardError};
pub use crate::interpreter::{
    parse, parse_json_format, parse_plain_format, render, ApiError, Classify, RateInfo,
};
pub use crate::util::retry::{RetryError, RetryPolicy};
