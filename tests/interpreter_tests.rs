//! Tests for the error interpreter.

use std::time::Duration;

use pretty_assertions::assert_eq;
use rateguard::error::{Dialect, ParseError};
use rateguard::interpreter::*;

const RATE_LIMIT_JSON: &str = r#"POST "https://api.openai.com/v1/chat/completions": 429 Too Many Requests {
        "message": "Rate limit reached for gpt-4.1 in organization org-YvWUPqaYaDO3IEven3giqHwj on tokens per min (TPM): Limit 30000, Used 30000, Requested 1741. Please try again in 3.482s. Visit https://platform.openai.com/account/rate-limits to learn more.",
        "type": "tokens",
        "param": null,
        "code": "rate_limit_exceeded"
    }"#;

const RATE_LIMIT_PLAIN: &str = "POST https://api.openai.com/v1/chat/completions: 429 Too Many Requests - Rate limit reached for gpt-4.1 in organization org-YvWUPqaYaDO3IEven3giqHwj on tokens per min (TPM): Limit 30000, Used 30000, Requested 1895. Please try again in 3.789s. Visit https://platform.openai.com/account/rate-limits to learn more.";

const AUTH_JSON: &str = r#"POST "https://api.openai.com/v1/chat/completions": 401 Unauthorized {
		"error": {
			"message": "Incorrect API key provided",
			"type": "invalid_request_error",
			"param": null,
			"code": "invalid_api_key"
		}
	}"#;

const SERVER_JSON: &str = r#"POST "https://api.openai.com/v1/chat/completions": 502 Bad Gateway {
		"message": "Upstream error"
	}"#;

const INDENTED_JSON: &str = r#"POST "https://api.openai.com/v1/chat/completions": 400 Bad Request {"message": "  indented note"}"#;

#[test]
fn json_rate_limit_is_fully_parsed() {
    let error = parse_json_format(RATE_LIMIT_JSON).unwrap();

    assert_eq!(error.method, HttpMethod::Post);
    assert_eq!(error.url, "https://api.openai.com/v1/chat/completions");
    assert_eq!(error.status, 429);
    assert_eq!(error.reason, "Too Many Requests");
    assert_eq!(error.error_type, "tokens");
    assert_eq!(error.param, None);
    assert_eq!(error.code, "rate_limit_exceeded");

    let expected = RateInfo {
        model: "gpt-4.1".to_string(),
        scope_type: ScopeType::Organization,
        scope_id: "org-YvWUPqaYaDO3IEven3giqHwj".to_string(),
        metric: "tokens per min (TPM)".to_string(),
        limit: 30000,
        used: 30000,
        requested: 1741,
        retry_after: Duration::from_millis(3482),
        docs_url: "https://platform.openai.com/account/rate-limits".to_string(),
    };
    assert_eq!(error.rate_info, Some(expected));

    assert!(error.is_rate_limit());
    assert!(!error.is_auth());
    assert!(!error.is_server_error());
    assert!(error.is_retry_advised());
}

#[test]
fn plain_rate_limit_rounds_retry_after() {
    let error = parse_plain_format(RATE_LIMIT_PLAIN).unwrap();

    assert_eq!(error.status, 429);
    assert!(!error.message.is_empty());
    assert_eq!(error.error_type, "tokens");
    assert_eq!(error.code, "rate_limit_exceeded");
    assert!(error.is_rate_limit());

    let info = error.rate_info.as_ref().unwrap();
    assert_eq!(info.requested, 1895);
    assert_eq!(info.retry_after, Duration::from_millis(4000));
}

#[test]
fn dialects_disagree_on_retry_precision_for_same_message() {
    let json = parse_json_format(RATE_LIMIT_JSON).unwrap();
    let message = json.message.clone();
    let plain = parse_plain_format(&format!(
        "POST https://api.openai.com/v1/chat/completions: 429 Too Many Requests - {message}"
    ))
    .unwrap();

    assert_eq!(json.retry_after(), Some(Duration::from_millis(3482)));
    assert_eq!(plain.retry_after(), Some(Duration::from_secs(3)));
}

#[test]
fn auth_failure_is_classified_as_auth_only() {
    let error = parse_json_format(AUTH_JSON).unwrap();

    assert_eq!(error.status, 401);
    assert_eq!(error.code, "invalid_api_key");
    assert_eq!(error.error_type, "invalid_request_error");
    assert!(error.is_auth());
    assert!(!error.is_rate_limit());
    assert!(!error.is_server_error());
}

#[test]
fn server_error_with_flat_body() {
    let error = parse_json_format(SERVER_JSON).unwrap();

    assert_eq!(error.status, 502);
    assert_eq!(error.reason, "Bad Gateway");
    assert_eq!(error.message, "Upstream error");
    assert!(error.is_server_error());
    assert!(!error.is_auth());
    assert!(!error.is_rate_limit());
}

#[test]
fn garbage_is_rejected_by_both_dialects() {
    assert_eq!(
        parse_json_format("hello world"),
        Err(ParseError::HeaderUnrecognized {
            dialect: Dialect::Json
        })
    );
    assert_eq!(
        parse_plain_format("hello world"),
        Err(ParseError::HeaderUnrecognized {
            dialect: Dialect::Plain
        })
    );
    assert_eq!(parse("hello world").unwrap_err().dialect(), Dialect::Plain);
}

#[test]
fn parse_falls_back_to_plain_dialect() {
    assert_eq!(parse(RATE_LIMIT_JSON).unwrap(), parse_json_format(RATE_LIMIT_JSON).unwrap());
    assert_eq!(parse(RATE_LIMIT_PLAIN).unwrap(), parse_plain_format(RATE_LIMIT_PLAIN).unwrap());
}

#[test]
fn rendered_json_errors_reparse_as_plain() {
    for raw in [RATE_LIMIT_JSON, AUTH_JSON, SERVER_JSON, INDENTED_JSON] {
        let original = parse_json_format(raw).unwrap();
        let rendered = render(Some(&original));
        let reparsed = parse_plain_format(&rendered).unwrap();

        assert_eq!(reparsed.method, original.method);
        assert_eq!(reparsed.url, original.url);
        assert_eq!(reparsed.status, original.status);
        assert_eq!(reparsed.reason, original.reason);
        assert_eq!(reparsed.message, original.message);
    }
}

#[test]
fn header_only_error_round_trips_with_empty_message() {
    let original = parse_json_format(r#"GET "https://api.openai.com/v1/models": 503 Service Unavailable"#).unwrap();
    assert_eq!(original.message, "");

    let reparsed = parse_plain_format(&original.to_string()).unwrap();
    assert_eq!(reparsed.reason, "Service Unavailable");
    assert_eq!(reparsed.message, "");
}

#[test]
fn prose_after_bodiless_header_joins_the_reason() {
    let error = parse_json_format(r#"POST "https://x/y": 500 Internal Server Error upstream exploded"#).unwrap();

    assert_eq!(error.reason, "Internal Server Error upstream exploded");
    assert_eq!(error.message, "");
    assert!(error.is_server_error());
}

#[test]
fn rate_sentence_fills_rate_info_whatever_the_status() {
    let raw = r#"POST "https://api.openai.com/v1/chat/completions": 400 Bad Request {"message": "Rate limit reached for gpt-4.1 in organization org-1 on tokens per min (TPM): Limit 30000, Used 30000, Requested 1741. Please try again in 3.482s. Visit https://platform.openai.com/account/rate-limits to learn more."}"#;
    let error = parse_json_format(raw).unwrap();

    assert_eq!(error.status, 400);
    assert_eq!(error.retry_after(), Some(Duration::from_millis(3482)));
    assert_eq!(error.code, "");
    assert!(error.is_rate_limit());
    assert!(!error.is_retry_advised());
}

#[test]
fn upstream_code_survives_rate_limit_inference() {
    let raw = r#"POST "https://api.openai.com/v1/chat/completions": 429 Too Many Requests {"error": {"message": "You exceeded your current quota; rate limit applies.", "code": "insufficient_quota"}}"#;
    let error = parse_json_format(raw).unwrap();

    assert_eq!(error.code, "insufficient_quota");
    assert!(error.is_rate_limit());
    assert!(!error.is_retry_advised());
}

#[test]
fn null_code_at_429_is_inferred() {
    let raw = r#"POST "https://api.openai.com/v1/chat/completions": 429 Too Many Requests {"error": {"message": "Rate limit exceeded", "type": "requests", "param": null, "code": null}}"#;
    let error = parse_json_format(raw).unwrap();

    assert_eq!(error.code, "rate_limit_exceeded");
    assert_eq!(error.error_type, "requests");
}

#[test]
fn truncated_body_uses_prefix_up_to_last_brace() {
    let raw = r#"POST "https://api.openai.com/v1/chat/completions": 400 Bad Request {"message": "Invalid 'messages'", "type": "invalid_request_error", "param": "messages", "code": null} ...[truncated 812 bytes"#;
    let error = parse_json_format(raw).unwrap();

    assert_eq!(error.message, "Invalid 'messages'");
    assert_eq!(error.error_type, "invalid_request_error");
    assert_eq!(error.param.as_deref(), Some("messages"));
    assert_eq!(error.code, "");
}

#[test]
fn parsing_is_safe_across_threads() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(|| {
                (0..100)
                    .map(|_| parse(RATE_LIMIT_JSON).unwrap().retry_after())
                    .all(|delay| delay == Some(Duration::from_millis(3482)))
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn serializes_with_wire_field_names() {
    let error = parse_json_format(RATE_LIMIT_JSON).unwrap();
    let json = serde_json::to_value(&error).unwrap();

    assert_eq!(json["type"], "tokens");
    assert_eq!(json["method"], "POST");
    assert_eq!(json["rate_info"]["scope_type"], "organization");
    let retry_after = json["rate_info"]["retry_after"].as_f64().unwrap();
    assert!((retry_after - 3.482).abs() < 1e-9);
}
