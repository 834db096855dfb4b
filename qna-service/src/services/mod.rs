//! HTTP clients for the hosted knowledge-base runtimes.

pub mod language_service;
pub mod qna_maker_service;

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::error;

use crate::error_handler::{HttpError, QnaServiceError, Result, make_snippet};

/// Fallback timeout when the config does not set one.
pub(crate) const FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Answer id the runtimes use for their built-in "no good match" answer.
pub(crate) const NO_MATCH_ID: i64 = -1;

/// Sends a request and turns transport failures and non-2xx statuses into
/// [`QnaServiceError`]s.
pub(crate) async fn send_checked(
    req: RequestBuilder,
    url: &str,
    timeout: Duration,
) -> Result<Response> {
    let resp = req.send().await.map_err(|e| {
        if e.is_timeout() {
            QnaServiceError::Timeout(timeout)
        } else {
            QnaServiceError::HttpTransport(e)
        }
    })?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);
        error!(%url, %status, %snippet, "knowledge base returned non-success status");
        return Err(QnaServiceError::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet,
        }));
    }

    Ok(resp)
}

/// Decodes a JSON body, mapping serde failures to [`QnaServiceError::Decode`].
pub(crate) async fn decode_json<T: DeserializeOwned>(resp: Response, expected: &str) -> Result<T> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| QnaServiceError::Decode(format!("serde error: {e}; expected {expected}")))
}

/// Parses a textual answer id into the numeric form the runtimes expect.
pub(crate) fn numeric_id(id: &str) -> Option<i64> {
    id.trim().parse().ok()
}
