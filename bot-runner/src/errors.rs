//! Errors surfaced by the turn runner to the transport.

use bot_state::StateError;
use qna_dialog::DialogError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TurnError>;

#[derive(Debug, Error)]
pub enum TurnError {
    /// The runner was assembled incorrectly; raised by the builder.
    #[error("[Turn Runner] invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The activity lacks an id the state stores are keyed by.
    #[error("[Turn Runner] invalid activity: {0}")]
    InvalidActivity(String),

    /// A handler failed. Never escapes `run_turn`: the user gets the error
    /// text and state is still saved.
    #[error("[Turn Runner] dialog error: {0}")]
    Dialog(#[from] DialogError),

    /// Loading or saving conversation/user state failed. Not retried.
    #[error("[Turn Runner] persistence failure: {0}")]
    Persistence(#[from] StateError),
}

impl TurnError {
    pub fn is_persistence(&self) -> bool {
        matches!(self, TurnError::Persistence(_))
    }
}
