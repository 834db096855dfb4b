//! POST /api/messages: runs one turn for an inbound activity.

use std::sync::Arc;

use axum::{Json, extract::State};
use qna_dialog::Activity;
use tracing::instrument;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::messages::messages_response::MessagesResponse,
};

/// Handler: POST /api/messages
///
/// If the client disconnects, axum drops this future together with the turn:
/// the scorer call is abandoned and no state is saved.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:3978/api/messages \
///   -H 'content-type: application/json' \
///   -d '{"type":"message","channelId":"webchat","from":{"id":"u-1"},
///        "recipient":{"id":"bot"},"conversation":{"id":"c-1"},"text":"hours"}'
/// ```
#[instrument(skip_all, fields(conversation = %activity.conversation.id))]
pub async fn post_messages(
    State(state): State<Arc<AppState>>,
    Json(activity): Json<Activity>,
) -> AppResult<ApiResponse<MessagesResponse>> {
    let replies = state.runner.run_turn(activity).await?;
    Ok(ApiResponse::success(MessagesResponse { replies }))
}
