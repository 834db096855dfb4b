//! Per-turn context handed to every handler.

use bot_state::StateBag;
use qna_dialog::{Activity, ChannelAccount, OutboundActivity};
use serde::{Deserialize, Serialize};

/// An outbound activity addressed to one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub conversation_id: String,
    pub recipient: ChannelAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    pub activity: OutboundActivity,
}

/// The inbound activity, both loaded state bags and the replies queued so
/// far. Handlers mutate the bags in place; the runner saves them afterwards.
#[derive(Debug)]
pub struct TurnContext {
    pub activity: Activity,
    pub conversation_state: StateBag,
    pub user_state: StateBag,
    replies: Vec<Reply>,
}

impl TurnContext {
    pub fn new(activity: Activity, conversation_state: StateBag, user_state: StateBag) -> Self {
        Self {
            activity,
            conversation_state,
            user_state,
            replies: Vec::new(),
        }
    }

    /// Queues a reply to the sender of the inbound activity.
    pub fn send(&mut self, activity: OutboundActivity) {
        let recipient = self.activity.from.clone();
        self.send_to(recipient, activity);
    }

    /// Queues an activity for a specific participant.
    pub fn send_to(&mut self, recipient: ChannelAccount, activity: OutboundActivity) {
        self.replies.push(Reply {
            conversation_id: self.activity.conversation.id.clone(),
            recipient,
            reply_to_id: self.activity.id.clone(),
            activity,
        });
    }

    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    pub fn into_replies(self) -> Vec<Reply> {
        self.replies
    }
}
