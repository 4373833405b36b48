//! Shared helpers for CLI commands.

use chrono::{Local, NaiveDate};
use habitkit_core::{Config, ValidationError};

/// Today's local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` argument, defaulting to today.
pub fn parse_date_arg(arg: Option<&str>) -> Result<NaiveDate, ValidationError> {
    match arg {
        None => Ok(today()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ValidationError::MalformedDate(s.to_string())),
    }
}

/// Resolve the acting user: flag wins, otherwise the configured default.
pub fn resolve_user(flag: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    match flag {
        Some(user) => Ok(user),
        None => Ok(Config::load()?.default_user),
    }
}

/// Single-threaded runtime for commands that drive async core ops.
pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    Ok(tokio::runtime::Runtime::new()?)
}
