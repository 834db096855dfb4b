use qna_dialog::{ActivityType, OutboundActivity};
use tracing::debug;

use crate::context::TurnContext;
use crate::handler::{Flow, HandlerFuture, TurnHandler};

/// Greeting used when no welcome text is configured.
pub const DEFAULT_WELCOME_TEXT: &str =
    "Welcome to the QnA Maker sample! Ask me a question and I will try to answer it.";

/// Welcomes every newly added member except the bot itself.
pub struct MembersAddedHandler {
    welcome_text: String,
}

impl MembersAddedHandler {
    /// `welcome_text` of `None` or blank selects [`DEFAULT_WELCOME_TEXT`].
    pub fn new(welcome_text: Option<String>) -> Self {
        let welcome_text = welcome_text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WELCOME_TEXT.to_string());
        Self { welcome_text }
    }
}

impl TurnHandler for MembersAddedHandler {
    fn name(&self) -> &'static str {
        "members-added"
    }

    fn on_turn<'a>(&'a self, ctx: &'a mut TurnContext) -> HandlerFuture<'a> {
        Box::pin(async move {
            if ctx.activity.activity_type != ActivityType::ConversationUpdate {
                return Ok(Flow::Continue);
            }
            let bot_id = ctx.activity.recipient.id.clone();
            let newcomers: Vec<_> = ctx
                .activity
                .members_added
                .iter()
                .filter(|m| m.id != bot_id)
                .cloned()
                .collect();
            debug!(welcomed = newcomers.len(), "members added");
            for member in newcomers {
                ctx.send_to(member, OutboundActivity::text(self.welcome_text.clone()));
            }
            Ok(Flow::Continue)
        })
    }
}
