//! Builders for [`QnaEndpointConfig`] from a key/value settings source.
//!
//! The lookup is injected so that callers decide where values come from
//! (process environment at start-up, a map in tests).

use crate::config::qna_endpoint_config::QnaEndpointConfig;
use crate::config::service_type::QnaServiceType;
use crate::error_handler::{Result, must_setting, opt_setting, validate_http_endpoint};

/// Default scorer timeout when `QnATimeoutSecs` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Constructs the knowledge-base endpoint config.
///
/// # Settings
/// - `QnAKnowledgebaseId` (required)
/// - `QnAEndpointKey` (required)
/// - `QnAEndpointHostName` (required, http/https)
/// - `QnAServiceType` (optional, `language` selects the Language service)
/// - `QnATimeoutSecs` (optional)
///
/// # Errors
/// Returns a config error when a required setting is missing or malformed.
pub fn endpoint_config_from<F>(lookup: &F) -> Result<QnaEndpointConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let knowledge_base_id = must_setting(lookup, "QnAKnowledgebaseId")?;
    let endpoint_key = must_setting(lookup, "QnAEndpointKey")?;
    let host = must_setting(lookup, "QnAEndpointHostName")?;
    validate_http_endpoint("QnAEndpointHostName", &host)?;

    let service_type = lookup("QnAServiceType")
        .map(|raw| QnaServiceType::from_setting(&raw))
        .unwrap_or_default();

    let timeout_secs =
        opt_setting::<_, u64>(lookup, "QnATimeoutSecs", "expected u64")?.or(Some(DEFAULT_TIMEOUT_SECS));

    Ok(QnaEndpointConfig {
        service_type,
        knowledge_base_id,
        endpoint_key,
        host,
        timeout_secs,
    })
}
