//! Unified error type for the bot-state crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateError>;

/// Errors produced while loading or persisting state.
#[derive(Debug, Error)]
pub enum StateError {
    // ── Storage back ends ───────────────────────────────────────────────────
    /// Underlying I/O error.
    #[error("[Bot State] io error: {0}")]
    Io(#[from] std::io::Error),

    /// Sled database error (open, insert, flush).
    #[error("[Bot State] sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Blocking storage task failed to complete.
    #[error("[Bot State] task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    // ── JSON / serialization ────────────────────────────────────────────────
    /// A stored blob or property value could not be (de)serialized.
    #[error("[Bot State] json error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Keys ────────────────────────────────────────────────────────────────
    /// The activity lacks the identifier the state scope is keyed by.
    #[error("[Bot State] cannot derive storage key: missing {0}")]
    MissingKey(&'static str),
}
