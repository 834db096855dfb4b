use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bot_runner::TurnError;
use bot_state::StateError;
use qna_dialog::DialogError;
use qna_service::QnaServiceError;
use thiserror::Error;
use tracing::error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Settings(#[from] QnaServiceError),

    #[error("configuration error: {0}")]
    Dialog(#[from] DialogError),

    #[error("storage error: {0}")]
    Storage(#[from] StateError),

    // --- IO / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Turns ---
    #[error(transparent)]
    Turn(#[from] TurnError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Turn(TurnError::InvalidActivity(_)) => StatusCode::BAD_REQUEST,
            AppError::Turn(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // startup-only
            AppError::Settings(_) | AppError::Dialog(_) | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Settings(_) | AppError::Dialog(_) => "CONFIG_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Turn(TurnError::InvalidActivity(_)) => "BAD_REQUEST",
            AppError::Turn(TurnError::Persistence(_)) => "PERSISTENCE_FAILURE",
            AppError::Turn(TurnError::InvalidConfiguration(_)) => "CONFIG_ERROR",
            AppError::Turn(TurnError::Dialog(_)) => "DIALOG_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string(), Vec::new())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
