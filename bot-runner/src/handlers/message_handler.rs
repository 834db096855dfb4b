use bot_state::StatePropertyAccessor;
use qna_dialog::{ActivityType, AnswerDialog, TURN_STATE_PROPERTY, TurnState};
use tracing::debug;

use crate::context::TurnContext;
use crate::handler::{Flow, HandlerFuture, TurnHandler};

/// Sends every message activity through the answer dialog, exactly once.
pub struct MessageHandler {
    dialog: AnswerDialog,
    turn_state: StatePropertyAccessor<TurnState>,
}

impl MessageHandler {
    pub fn new(dialog: AnswerDialog) -> Self {
        Self {
            dialog,
            turn_state: StatePropertyAccessor::new(TURN_STATE_PROPERTY),
        }
    }
}

impl TurnHandler for MessageHandler {
    fn name(&self) -> &'static str {
        "message"
    }

    fn on_turn<'a>(&'a self, ctx: &'a mut TurnContext) -> HandlerFuture<'a> {
        Box::pin(async move {
            if ctx.activity.activity_type != ActivityType::Message {
                return Ok(Flow::Continue);
            }
            let reply = self
                .dialog
                .run(&ctx.activity, &mut ctx.conversation_state, &self.turn_state)
                .await?;
            match reply {
                Some(activity) => ctx.send(activity),
                None => debug!("dialog produced no reply"),
            }
            Ok(Flow::Continue)
        })
    }
}
