//! Plain dialect: `METHOD URL: STATUS REASON - MESSAGE`.

use std::sync::OnceLock;

use regex::Regex;

use super::rate_limit::{extract_rate_info, RetryAfterPrecision};
use super::ApiError;
use crate::error::{Dialect, ParseError};

static HEADER_RE: OnceLock<Regex> = OnceLock::new();

fn header_re() -> &'static Regex {
    HEADER_RE.get_or_init(|| {
        Regex::new(r"^(GET|POST|PUT|PATCH|DELETE)\s+(\S+):\s+([0-9]{3})\s+([A-Za-z ]+)\s+-(?: (?s:(.*)))?$")
            .expect("plain header pattern is valid")
    })
}

/// Parse the plain dialect.
///
/// The advisory delay is rounded to whole seconds here, unlike the JSON
/// dialect. Since this form carries no `type`, it is guessed from the
/// rate-limit metric when one is present.
pub fn parse_plain_format(raw: &str) -> Result<ApiError, ParseError> {
    let unrecognized = || ParseError::HeaderUnrecognized {
        dialect: Dialect::Plain,
    };
    let caps = header_re().captures(raw.trim()).ok_or_else(unrecognized)?;

    let method = caps[1].parse().map_err(|_| unrecognized())?;
    let status = caps[3].parse().map_err(|_| unrecognized())?;
    let mut error = ApiError::from_header(method, &caps[2], status, &caps[4]);
    error.message = caps
        .get(5)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    error.rate_info = extract_rate_info(&error.message, RetryAfterPrecision::WholeSeconds);
    if let Some(info) = &error.rate_info {
        error.error_type = type_from_metric(&info.metric).to_string();
    }
    error.infer_code();
    Ok(error)
}

fn type_from_metric(metric: &str) -> &'static str {
    let metric = metric.to_lowercase();
    if metric.contains("token") {
        "tokens"
    } else if metric.contains("requests") {
        "requests"
    } else {
        ""
    }
}
