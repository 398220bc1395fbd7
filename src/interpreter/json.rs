//! JSON-body dialect: `METHOD "URL": STATUS REASON { ...json... }`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use super::rate_limit::{extract_rate_info, RetryAfterPrecision};
use super::ApiError;
use crate::error::{Dialect, ParseError};

static HEADER_RE: OnceLock<Regex> = OnceLock::new();

fn header_re() -> &'static Regex {
    HEADER_RE.get_or_init(|| {
        Regex::new(r#"^(GET|POST|PUT|PATCH|DELETE)\s+"([^"]+)"\s*:\s*([0-9]{3})\s+([A-Za-z ]+)(?:\s+|$)"#)
            .expect("json header pattern is valid")
    })
}

/// Error fields as they appear in the body, nested or flat.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    param: Option<String>,
    code: Option<String>,
}

/// Accepts `{"error": {...}}` and the same fields at top level in one pass.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    error: Option<ErrorBody>,
    #[serde(flatten)]
    inline: ErrorBody,
}

impl Envelope {
    fn into_body(self) -> ErrorBody {
        self.error.unwrap_or(self.inline)
    }
}

/// Parse the JSON-body dialect.
///
/// Only a header mismatch is an error. A missing body leaves the message
/// empty; a body that does not decode, even after cutting it at its last
/// `}`, becomes the message verbatim (trimmed).
pub fn parse_json_format(raw: &str) -> Result<ApiError, ParseError> {
    let raw = raw.trim();
    let caps = header_re()
        .captures(raw)
        .ok_or(ParseError::HeaderUnrecognized {
            dialect: Dialect::Json,
        })?;

    let method = caps[1].parse().map_err(|_| ParseError::HeaderUnrecognized {
        dialect: Dialect::Json,
    })?;
    let status = caps[3].parse().map_err(|_| ParseError::HeaderUnrecognized {
        dialect: Dialect::Json,
    })?;
    let mut error = ApiError::from_header(method, &caps[2], status, &caps[4]);

    let rest = &raw[caps.get(0).map_or(raw.len(), |m| m.end())..];
    let Some(start) = rest.find('{') else {
        return Ok(error);
    };
    let body = unescape_whitespace(rest[start..].trim());

    match decode(&body) {
        Some(fields) => {
            error.message = fields.message.unwrap_or_default();
            error.error_type = fields.kind.unwrap_or_default();
            error.param = fields.param;
            error.code = fields.code.unwrap_or_default();
        }
        None => {
            tracing::debug!(status, "error body did not decode, keeping it as the message");
            error.message = body.trim().to_string();
        }
    }

    error.rate_info = extract_rate_info(&error.message, RetryAfterPrecision::Exact);
    error.infer_code();
    Ok(error)
}

// Bodies that were escaped once arrive with literal `\n` / `\t` pairs.
fn unescape_whitespace(body: &str) -> String {
    body.replace("\\n", "\n").replace("\\t", "\t")
}

fn decode(body: &str) -> Option<ErrorBody> {
    if let Ok(envelope) = serde_json::from_str::<Envelope>(body) {
        return Some(envelope.into_body());
    }
    // Tolerate trailing junk or a cut-off tail after the last complete object.
    let last = body.rfind('}').filter(|&idx| idx > 0)?;
    serde_json::from_str::<Envelope>(&body[..=last])
        .ok()
        .map(Envelope::into_body)
}
