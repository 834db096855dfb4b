//! Per-conversation scratch state owned by the answer dialog.

use qna_service::{FollowUpPrompt, ScoredAnswer};
use serde::{Deserialize, Serialize};

/// Property name the dialog stores its state under in conversation state.
pub const TURN_STATE_PROPERTY: &str = "QnADialogState";

/// A clarification option the user can pick on the next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCandidate {
    /// Label shown on the card; matched against the next utterance.
    pub label: String,
    pub answer: ScoredAnswer,
}

/// Where the dialog is between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DialogCursor {
    #[default]
    Idle,
    /// A clarification card was sent for `question`.
    Clarifying {
        question: String,
        candidates: Vec<PendingCandidate>,
    },
}

/// The last answer's follow-up prompts and what they were attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpState {
    pub previous_qna_id: String,
    pub previous_user_query: String,
    pub prompts: Vec<FollowUpPrompt>,
}

impl FollowUpState {
    /// The prompt whose display text equals `utterance`, if any.
    pub fn matching_prompt(&self, utterance: &str) -> Option<&FollowUpPrompt> {
        self.prompts
            .iter()
            .find(|p| p.display_text.trim() == utterance)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnState {
    #[serde(default)]
    pub cursor: DialogCursor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUpState>,
}

impl TurnState {
    /// `true` when nothing needs to survive until the next turn.
    pub fn is_clear(&self) -> bool {
        self.cursor == DialogCursor::Idle && self.follow_up.is_none()
    }

    pub fn clear(&mut self) {
        *self = TurnState::default();
    }
}
