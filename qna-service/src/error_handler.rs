//! Unified error handling for `qna-service`.
//!
//! This module exposes a single top-level error type [`QnaServiceError`] for the
//! whole library, and groups domain-specific errors in nested enums (e.g.,
//! [`ConfigError`], [`HttpError`]). Small helpers for reading/validating
//! configuration values are provided and return the unified [`Result<T>`] alias.
//!
//! All messages start with `[QnA Service]` to simplify attribution in logs.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, QnaServiceError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `qna-service` crate.
///
/// Configuration problems are raised at construction time. Everything else is
/// a runtime failure of the remote knowledge-base service, which callers treat
/// as "scorer unavailable".
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum QnaServiceError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[QnA Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Upstream returned a non-successful HTTP status.
    #[error("[QnA Service] {0}")]
    HttpStatus(HttpError),

    /// Response payload could not be decoded as expected.
    #[error("[QnA Service] decode error: {0}")]
    Decode(String),

    /// Operation exceeded the configured timeout.
    #[error("[QnA Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl QnaServiceError {
    /// Returns `true` for errors raised while validating configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, QnaServiceError::Config(_))
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for configuration-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required setting is missing or empty.
    #[error("[QnA Service] missing required setting: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like thresholds, counts, timeouts).
    #[error("[QnA Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Setting name (e.g., `QnATopAnswers`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[QnA Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Setting name (e.g., `QnAEndpointHostName`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[QnA Service] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `score_threshold`).
        field: &'static str,
        /// Description of the expected range (e.g., `expected 0.0..=1.0`).
        detail: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* HTTP status errors                                                        */
/* ------------------------------------------------------------------------- */

/// Details of a non-2xx response from the knowledge-base service.
#[derive(Debug)]
pub struct HttpError {
    /// Numeric HTTP status code.
    pub status: StatusCode,
    /// Request URL.
    pub url: String,
    /// Short snippet of the response body (trimmed).
    pub snippet: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// Max number of characters kept from an error body.
const SNIPPET_MAX_CHARS: usize = 240;

/// Trims a response body down to a short single-line snippet for logs/errors.
pub fn make_snippet(body: &str) -> String {
    body.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(SNIPPET_MAX_CHARS)
        .collect()
}

/* ------------------------------------------------------------------------- */
/* Settings helpers (return unified `Result<T>`)                             */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty setting through `lookup`.
///
/// # Errors
/// Returns [`QnaServiceError::Config`] with [`ConfigError::MissingVar`] if the
/// setting is absent or empty.
pub fn must_setting<F>(lookup: &F, name: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Parses an optional value from a setting (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`QnaServiceError::Config`] with [`ConfigError::InvalidNumber`] if
/// the setting is present but does not parse.
pub fn opt_setting<F, T>(lookup: &F, name: &'static str, reason: &'static str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => v.trim().parse::<T>().map(Some).map_err(|_| {
            QnaServiceError::from(ConfigError::InvalidNumber { var: name, reason })
        }),
        _ => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`QnaServiceError::Config`] with [`ConfigError::InvalidFormat`] when
/// the string does not start with a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`QnaServiceError::Config`] with [`ConfigError::OutOfRange`] if `value`
/// is outside `[min, max]` or not finite.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn must_setting_rejects_blank_values() {
        let lookup = lookup_from(&[("A", "  "), ("B", " value ")]);
        assert!(matches!(
            must_setting(&lookup, "A"),
            Err(QnaServiceError::Config(ConfigError::MissingVar("A")))
        ));
        assert!(must_setting(&lookup, "C").is_err());
        assert_eq!(must_setting(&lookup, "B").unwrap(), "value");
    }

    #[test]
    fn opt_setting_parses_or_reports() {
        let lookup = lookup_from(&[("N", "3"), ("BAD", "three")]);
        assert_eq!(opt_setting::<_, u32>(&lookup, "N", "expected u32").unwrap(), Some(3));
        assert_eq!(opt_setting::<_, u32>(&lookup, "MISSING", "expected u32").unwrap(), None);
        let err = opt_setting::<_, u32>(&lookup, "BAD", "expected u32").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn range_and_endpoint_validation() {
        assert!(validate_range_f32("t", 0.3, 0.0, 1.0).is_ok());
        assert!(validate_range_f32("t", 1.2, 0.0, 1.0).is_err());
        assert!(validate_range_f32("t", f32::NAN, 0.0, 1.0).is_err());
        assert!(validate_http_endpoint("h", "https://x").is_ok());
        assert!(validate_http_endpoint("h", "ftp://x").is_err());
    }

    #[test]
    fn snippet_is_compact_and_bounded() {
        let body = format!("line one\n\n  line two {}", "x".repeat(500));
        let s = make_snippet(&body);
        assert!(s.starts_with("line one line two"));
        assert_eq!(s.chars().count(), SNIPPET_MAX_CHARS);
    }
}
