//! Rate-limit descriptor grammar.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use super::{RateInfo, ScopeType};

static RATE_LIMIT_RE: OnceLock<Regex> = OnceLock::new();

fn rate_limit_re() -> &'static Regex {
    RATE_LIMIT_RE.get_or_init(|| {
        Regex::new(concat!(
            r"Rate limit reached for ([A-Za-z0-9_.\-]+) in (organization|project) ([A-Za-z0-9_\-]+)",
            r" on ([^:]+): Limit ([0-9]+), Used ([0-9]+), Requested ([0-9]+)\.",
            r" Please try again in ([0-9.]+)s\. Visit (\S+)",
        ))
        .expect("rate limit pattern is valid")
    })
}

/// How the advisory delay is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAfterPrecision {
    /// Keep the upstream's fractional seconds.
    Exact,
    /// Round to the nearest whole second.
    WholeSeconds,
}

/// Scan `message` for the upstream's rate-limit sentence.
///
/// Returns `None` when the sentence is absent or one of its numbers does not
/// convert (an integer overflowing `u64`, or a delay such as `1.2.3s`).
pub fn extract_rate_info(message: &str, precision: RetryAfterPrecision) -> Option<RateInfo> {
    let caps = rate_limit_re().captures(message)?;

    let scope_type = match &caps[2] {
        "organization" => ScopeType::Organization,
        _ => ScopeType::Project,
    };
    let limit = caps[5].parse().ok()?;
    let used = caps[6].parse().ok()?;
    let requested = caps[7].parse().ok()?;
    let mut secs: f64 = caps[8].parse().ok()?;
    if precision == RetryAfterPrecision::WholeSeconds {
        secs = secs.round();
    }

    Some(RateInfo {
        model: caps[1].to_string(),
        scope_type,
        scope_id: caps[3].to_string(),
        metric: caps[4].trim().to_string(),
        limit,
        used,
        requested,
        retry_after: secs_to_duration(secs)?,
        docs_url: caps[9].to_string(),
    })
}

// Round through nanoseconds so `3.482` lands on exactly 3482ms.
fn secs_to_duration(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let nanos = (secs * 1e9).round();
    if nanos >= u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(nanos as u64))
}
