mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

pub use crate::core::{
    app_state::AppState,
    bot_settings::{BotSettings, StorageKind},
};
pub use crate::error_handler::{AppError, AppResult};

use crate::middleware_layer::json_extractor::json_error_mapper;
use crate::routes::{health_route::health, messages::messages_route::post_messages};

/// Loads settings from the environment and serves the bot until Ctrl+C.
pub async fn start() -> AppResult<()> {
    let settings = BotSettings::from_env()?;
    let state = AppState::build(&settings)?;
    serve(&settings.api_address, state).await
}

/// Builds the HTTP surface over prepared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/messages", post(post_messages))
        .route("/health", get(health))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(Arc::new(state))
}

pub async fn serve(address: &str, state: AppState) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(AppError::Bind)?;
    info!(%address, "bot listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("bot stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
