use bot_runner::Reply;
use serde::Serialize;

/// Response payload for `POST /api/messages`.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    /// Activities to deliver, in the order they were produced.
    pub replies: Vec<Reply>,
}
