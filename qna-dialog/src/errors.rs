//! Errors raised by the answer dialog.

use bot_state::StateError;
use qna_service::QnaServiceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DialogError>;

#[derive(Debug, Error)]
pub enum DialogError {
    /// Options rejected at construction; the bot must not start.
    #[error("[QnA Dialog] invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The scorer call failed or timed out. Recovered inside the dialog by
    /// answering with the fallback text.
    #[error("[QnA Dialog] scorer unavailable: {0}")]
    ScorerUnavailable(#[source] QnaServiceError),

    /// The dialog's slice of conversation state could not be read or written.
    #[error(transparent)]
    State(#[from] StateError),
}
