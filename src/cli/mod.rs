//! CLI entry point for Rateguard.

use std::io::Read;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::error::{ErrorCategory, ParseError, RecoverySuggestion, Result};
use crate::interpreter::{self, ApiError};

/// Rateguard CLI
#[derive(Parser, Debug)]
#[command(name = "rateguard", version, about = "Interpret chat-completion API error strings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse an error string and print it as JSON
    Parse(ParseArgs),
    /// Parse an error string and print its canonical one-line form
    Render(RenderArgs),
}

/// Which dialect(s) to try.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialectArg {
    /// JSON dialect, then plain
    #[default]
    Auto,
    Json,
    Plain,
}

/// Arguments for `rateguard parse`.
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Dialect to parse with
    #[arg(short, long, value_enum, default_value_t = DialectArg::Auto)]
    pub dialect: DialectArg,

    /// Raw error string (read from stdin when omitted)
    pub raw: Option<String>,
}

/// Arguments for `rateguard render`.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Raw error string (read from stdin when omitted)
    pub raw: Option<String>,
}

/// JSON document printed by `rateguard parse`.
#[derive(Debug, Serialize)]
pub struct ParseReport<'a> {
    #[serde(flatten)]
    pub error: &'a ApiError,
    pub category: ErrorCategory,
    pub recovery: RecoverySuggestion,
    pub retry_advised: bool,
}

impl<'a> ParseReport<'a> {
    pub fn new(error: &'a ApiError) -> Self {
        Self {
            error,
            category: error.category(),
            recovery: error.recovery_suggestion(),
            retry_advised: error.is_retry_advised(),
        }
    }
}

/// Interpret `raw` with the selected dialect.
pub fn parse_with(dialect: DialectArg, raw: &str) -> std::result::Result<ApiError, ParseError> {
    match dialect {
        DialectArg::Auto => interpreter::parse(raw),
        DialectArg::Json => interpreter::parse_json_format(raw),
        DialectArg::Plain => interpreter::parse_plain_format(raw),
    }
}

/// Handle `rateguard parse`, returning the pretty JSON report.
pub fn handle_parse(args: &ParseArgs) -> Result<String> {
    let raw = read_input(args.raw.as_deref())?;
    let error = parse_with(args.dialect, &raw)?;
    Ok(serde_json::to_string_pretty(&ParseReport::new(&error))?)
}

/// Handle `rateguard render`.
pub fn handle_render(args: &RenderArgs) -> Result<String> {
    let raw = read_input(args.raw.as_deref())?;
    Ok(interpreter::parse(&raw)?.to_string())
}

fn read_input(arg: Option<&str>) -> Result<String> {
    match arg {
        Some(raw) => Ok(raw.to_string()),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
