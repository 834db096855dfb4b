//! Inbound and outbound activity model.
//!
//! Only the fields the bot reads are modelled; unknown JSON fields are
//! ignored on input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    #[default]
    Message,
    ConversationUpdate,
    #[serde(other)]
    Other,
}

/// A participant (user or bot) on a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
}

/// One inbound activity delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub from: ChannelAccount,
    /// The bot this activity was addressed to.
    #[serde(default)]
    pub recipient: ChannelAccount,
    #[serde(default)]
    pub conversation: ConversationAccount,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub members_added: Vec<ChannelAccount>,
}

impl Activity {
    /// A user message on `channel_id`, addressed to the bot `bot_id`.
    pub fn message(
        channel_id: &str,
        conversation_id: &str,
        user_id: &str,
        bot_id: &str,
        text: &str,
    ) -> Self {
        Self {
            activity_type: ActivityType::Message,
            id: None,
            timestamp: Some(Utc::now()),
            channel_id: channel_id.to_string(),
            from: ChannelAccount::new(user_id),
            recipient: ChannelAccount::new(bot_id),
            conversation: ConversationAccount {
                id: conversation_id.to_string(),
            },
            text: Some(text.to_string()),
            members_added: Vec::new(),
        }
    }

    /// The message text, or `""` when the activity carries none.
    pub fn utterance(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// A prompt the user answers by picking one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceCard {
    pub title: String,
    /// Option labels, in display order. Picking one sends its label back as
    /// the next utterance.
    pub options: Vec<String>,
}

/// What the bot sends back for a turn; rendering per channel is left to the
/// transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutboundActivity {
    #[serde(rename_all = "camelCase")]
    Message {
        text: String,
        /// Full answer shown under a precise answer span.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        /// Follow-up prompt labels attached to an answer.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        prompts: Vec<String>,
    },
    ChoiceCard(ChoiceCard),
}

impl OutboundActivity {
    /// A plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        OutboundActivity::Message {
            text: text.into(),
            detail: None,
            prompts: Vec::new(),
        }
    }

    /// Main text of a message; `None` for cards.
    pub fn message_text(&self) -> Option<&str> {
        match self {
            OutboundActivity::Message { text, .. } => Some(text),
            OutboundActivity::ChoiceCard(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_members_added_update() {
        let raw = r#"{
            "type": "conversationUpdate",
            "channelId": "webchat",
            "recipient": { "id": "bot" },
            "conversation": { "id": "c-1" },
            "membersAdded": [{ "id": "bot" }, { "id": "u-1", "name": "Ann" }],
            "locale": "en-US"
        }"#;
        let activity: Activity = serde_json::from_str(raw).unwrap();
        assert_eq!(activity.activity_type, ActivityType::ConversationUpdate);
        assert_eq!(activity.members_added.len(), 2);
        assert_eq!(activity.utterance(), "");
    }

    #[test]
    fn unknown_activity_type_maps_to_other() {
        let activity: Activity = serde_json::from_str(r#"{ "type": "typing" }"#).unwrap();
        assert_eq!(activity.activity_type, ActivityType::Other);
    }

    #[test]
    fn outbound_is_tagged_by_kind() {
        let card = OutboundActivity::ChoiceCard(ChoiceCard {
            title: "Did you mean:".into(),
            options: vec!["A".into(), "None of the above.".into()],
        });
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["kind"], "choiceCard");
        assert_eq!(json["options"][1], "None of the above.");

        let json = serde_json::to_value(OutboundActivity::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "message", "text": "hi" }));
    }
}
