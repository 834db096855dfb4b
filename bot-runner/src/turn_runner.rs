//! Drives one inbound activity through the handler pipeline and persists
//! state afterwards.

use std::sync::Arc;

use bot_state::{BotState, StateScope};
use qna_dialog::{Activity, OutboundActivity};
use tracing::{debug, error, info, instrument};

use crate::context::{Reply, TurnContext};
use crate::conversation_locks::ConversationLocks;
use crate::errors::{Result, TurnError};
use crate::handler::{Flow, TurnHandler};

/// Sent when a handler fails mid-turn.
pub const DEFAULT_ERROR_TEXT: &str = "Sorry, something went wrong. Please try again.";

pub struct TurnRunner {
    handlers: Vec<Arc<dyn TurnHandler>>,
    conversation_state: BotState,
    user_state: BotState,
    error_text: String,
    locks: ConversationLocks,
}

pub struct TurnRunnerBuilder {
    handlers: Vec<Arc<dyn TurnHandler>>,
    conversation_state: BotState,
    user_state: BotState,
    error_text: String,
}

impl TurnRunnerBuilder {
    /// Appends a handler; handlers run in the order they are added.
    pub fn handler(mut self, handler: impl TurnHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Text sent to the user when a handler fails.
    pub fn error_text(mut self, text: impl Into<String>) -> Self {
        self.error_text = text.into();
        self
    }

    /// # Errors
    /// [`TurnError::InvalidConfiguration`] when the stores have the wrong
    /// scopes or no handler was registered.
    pub fn build(self) -> Result<TurnRunner> {
        if self.conversation_state.scope() != StateScope::Conversation {
            return Err(TurnError::InvalidConfiguration(
                "conversation state must be conversation-scoped".into(),
            ));
        }
        if self.user_state.scope() != StateScope::User {
            return Err(TurnError::InvalidConfiguration(
                "user state must be user-scoped".into(),
            ));
        }
        if self.handlers.is_empty() {
            return Err(TurnError::InvalidConfiguration(
                "at least one turn handler is required".into(),
            ));
        }
        let names: Vec<_> = self.handlers.iter().map(|h| h.name()).collect();
        info!(handlers = ?names, "turn runner ready");
        Ok(TurnRunner {
            handlers: self.handlers,
            conversation_state: self.conversation_state,
            user_state: self.user_state,
            error_text: self.error_text,
            locks: ConversationLocks::new(),
        })
    }
}

impl TurnRunner {
    pub fn builder(conversation_state: BotState, user_state: BotState) -> TurnRunnerBuilder {
        TurnRunnerBuilder {
            handlers: Vec::new(),
            conversation_state,
            user_state,
            error_text: DEFAULT_ERROR_TEXT.to_string(),
        }
    }

    /// Runs one turn and returns the replies to deliver.
    ///
    /// Turns of one conversation are serialized. A failing handler stops the
    /// pipeline and queues the error text; conversation state and then user
    /// state are saved in every case once the handlers are done. Dropping the
    /// returned future before it completes saves nothing.
    ///
    /// # Errors
    /// [`TurnError::InvalidActivity`] when the conversation or user id is
    /// missing, [`TurnError::Persistence`] when state cannot be loaded or saved.
    #[instrument(skip_all, fields(conversation = %activity.conversation.id, kind = ?activity.activity_type))]
    pub async fn run_turn(&self, activity: Activity) -> Result<Vec<Reply>> {
        let conversation_key = self
            .conversation_state
            .storage_key(&activity.channel_id, &activity.conversation.id, &activity.from.id)
            .map_err(|e| TurnError::InvalidActivity(e.to_string()))?;
        let user_key = self
            .user_state
            .storage_key(&activity.channel_id, &activity.conversation.id, &activity.from.id)
            .map_err(|e| TurnError::InvalidActivity(e.to_string()))?;

        let _turn = self.locks.acquire(&conversation_key).await;

        let conversation_state = self.conversation_state.load(&conversation_key).await?;
        let user_state = self.user_state.load(&user_key).await?;
        let mut ctx = TurnContext::new(activity, conversation_state, user_state);

        for handler in &self.handlers {
            match handler.on_turn(&mut ctx).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => {
                    debug!(handler = handler.name(), "pipeline stopped");
                    break;
                }
                Err(err) => {
                    error!(handler = handler.name(), error = %err, "turn handler failed");
                    ctx.send(OutboundActivity::text(self.error_text.clone()));
                    break;
                }
            }
        }

        self.conversation_state
            .save(&conversation_key, &ctx.conversation_state)
            .await?;
        self.user_state.save(&user_key, &ctx.user_state).await?;

        let replies = ctx.into_replies();
        info!(replies = replies.len(), "turn completed");
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use bot_state::{MemoryStorage, StateError, StatePropertyAccessor, Storage, StorageFuture};
    use qna_dialog::{
        ActivityType, AnswerDialog, ChannelAccount, ConversationAccount, DialogOptions,
    };
    use qna_service::{AnswerScorer, ScoreFuture, ScoreRequest, ScoredAnswer};
    use tokio::task::JoinSet;

    use super::*;
    use crate::handler::HandlerFuture;
    use crate::handlers::{
        members_added_handler::{DEFAULT_WELCOME_TEXT, MembersAddedHandler},
        message_handler::MessageHandler,
    };

    struct FixedScorer(Vec<ScoredAnswer>);

    impl AnswerScorer for FixedScorer {
        fn score<'a>(&'a self, _request: &'a ScoreRequest) -> ScoreFuture<'a, Vec<ScoredAnswer>> {
            let answers = self.0.clone();
            Box::pin(async move { Ok(answers) })
        }
    }

    /// Reads like memory storage, refuses every write.
    #[derive(Default)]
    struct ReadOnlyStorage;

    impl Storage for ReadOnlyStorage {
        fn load<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, Option<Vec<u8>>> {
            Box::pin(async { Ok(None) })
        }

        fn save<'a>(&'a self, _key: &'a str, _blob: &'a [u8]) -> StorageFuture<'a, ()> {
            Box::pin(async {
                Err(StateError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )))
            })
        }

        fn delete<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, ()> {
            Box::pin(async { Ok(()) })
        }
    }

    /// Bumps a counter in conversation state, yielding between read and write.
    struct CountingHandler;

    impl TurnHandler for CountingHandler {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn on_turn<'a>(&'a self, ctx: &'a mut TurnContext) -> HandlerFuture<'a> {
            Box::pin(async move {
                let counter = StatePropertyAccessor::<u32>::new("count");
                let seen = counter.get_or_default(&ctx.conversation_state)?;
                tokio::time::sleep(Duration::from_millis(2)).await;
                counter.set(&mut ctx.conversation_state, &(seen + 1))?;
                Ok(Flow::Continue)
            })
        }
    }

    /// Writes state, then fails.
    struct FailingHandler;

    impl TurnHandler for FailingHandler {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn on_turn<'a>(&'a self, ctx: &'a mut TurnContext) -> HandlerFuture<'a> {
            Box::pin(async move {
                StatePropertyAccessor::<bool>::new("touched").set(&mut ctx.conversation_state, &true)?;
                Err(TurnError::InvalidActivity("boom".into()))
            })
        }
    }

    /// Writes state, then never finishes.
    struct HangingHandler;

    impl TurnHandler for HangingHandler {
        fn name(&self) -> &'static str {
            "hanging"
        }

        fn on_turn<'a>(&'a self, ctx: &'a mut TurnContext) -> HandlerFuture<'a> {
            Box::pin(async move {
                StatePropertyAccessor::<bool>::new("partial").set(&mut ctx.conversation_state, &true)?;
                std::future::pending::<()>().await;
                Ok(Flow::Continue)
            })
        }
    }

    struct StopHandler;

    impl TurnHandler for StopHandler {
        fn name(&self) -> &'static str {
            "stop"
        }

        fn on_turn<'a>(&'a self, _ctx: &'a mut TurnContext) -> HandlerFuture<'a> {
            Box::pin(async { Ok(Flow::Stop) })
        }
    }

    struct FlagHandler(Arc<AtomicBool>);

    impl TurnHandler for FlagHandler {
        fn name(&self) -> &'static str {
            "flag"
        }

        fn on_turn<'a>(&'a self, _ctx: &'a mut TurnContext) -> HandlerFuture<'a> {
            self.0.store(true, Ordering::SeqCst);
            Box::pin(async { Ok(Flow::Continue) })
        }
    }

    fn stores(storage: Arc<dyn Storage>) -> (BotState, BotState) {
        (BotState::conversation(storage.clone()), BotState::user(storage))
    }

    fn message(text: &str) -> Activity {
        Activity::message("test", "c-1", "u-1", "bot", text)
    }

    fn qna_runner(storage: Arc<dyn Storage>, answers: Vec<ScoredAnswer>) -> TurnRunner {
        let dialog = AnswerDialog::new(
            Arc::new(FixedScorer(answers)),
            DialogOptions::new("kb-1", "https://qna.example.test"),
        )
        .unwrap();
        let (conversation, user) = stores(storage);
        TurnRunner::builder(conversation, user)
            .handler(MembersAddedHandler::new(None))
            .handler(MessageHandler::new(dialog))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn answers_message_and_saves_both_scopes() {
        let memory = Arc::new(MemoryStorage::new());
        let runner = qna_runner(memory.clone(), vec![ScoredAnswer::new("9-5", 0.91, "7")]);

        let replies = runner.run_turn(message("hours")).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].activity, OutboundActivity::text("9-5"));
        assert_eq!(replies[0].recipient.id, "u-1");
        assert_eq!(replies[0].conversation_id, "c-1");

        assert!(memory.load("test/conversations/c-1").await.unwrap().is_some());
        assert!(memory.load("test/users/u-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clarification_survives_between_turns() {
        let memory = Arc::new(MemoryStorage::new());
        let runner = qna_runner(
            memory.clone(),
            vec![ScoredAnswer::new("A", 0.61, "1"), ScoredAnswer::new("B", 0.59, "2")],
        );

        let replies = runner.run_turn(message("reset password")).await.unwrap();
        assert!(matches!(replies[0].activity, OutboundActivity::ChoiceCard(_)));

        let replies = runner.run_turn(message("B")).await.unwrap();
        assert_eq!(replies[0].activity, OutboundActivity::text("B"));
    }

    #[tokio::test]
    async fn unreadable_dialog_state_does_not_wedge_the_conversation() {
        let memory = Arc::new(MemoryStorage::new());
        memory
            .save("test/conversations/c-1", br#"{"QnADialogState":{"cursor":{"state":"legacy"}}}"#)
            .await
            .unwrap();
        let runner = qna_runner(memory.clone(), vec![ScoredAnswer::new("9-5", 0.91, "7")]);

        for _ in 0..2 {
            let replies = runner.run_turn(message("hours")).await.unwrap();
            assert_eq!(replies.len(), 1);
            assert_eq!(replies[0].activity, OutboundActivity::text("9-5"));
        }
        let saved = memory.load("test/conversations/c-1").await.unwrap().unwrap();
        assert!(!String::from_utf8_lossy(&saved).contains("legacy"));
    }

    #[tokio::test]
    async fn welcomes_everyone_but_the_bot() {
        let runner = qna_runner(Arc::new(MemoryStorage::new()), Vec::new());
        let update = Activity {
            activity_type: ActivityType::ConversationUpdate,
            channel_id: "test".into(),
            from: ChannelAccount::new("u-1"),
            recipient: ChannelAccount::new("bot"),
            conversation: ConversationAccount { id: "c-1".into() },
            members_added: vec![ChannelAccount::new("bot"), ChannelAccount::new("u-1")],
            ..Activity::default()
        };

        let replies = runner.run_turn(update).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].recipient.id, "u-1");
        assert_eq!(replies[0].activity, OutboundActivity::text(DEFAULT_WELCOME_TEXT));
    }

    #[tokio::test]
    async fn configured_welcome_text_is_used() {
        let (conversation, user) = stores(Arc::new(MemoryStorage::new()));
        let runner = TurnRunner::builder(conversation, user)
            .handler(MembersAddedHandler::new(Some("Hi there!".into())))
            .build()
            .unwrap();
        let update = Activity {
            activity_type: ActivityType::ConversationUpdate,
            from: ChannelAccount::new("u-2"),
            recipient: ChannelAccount::new("bot"),
            conversation: ConversationAccount { id: "c-2".into() },
            members_added: vec![ChannelAccount::new("u-2")],
            ..Activity::default()
        };
        let replies = runner.run_turn(update).await.unwrap();
        assert_eq!(replies[0].activity, OutboundActivity::text("Hi there!"));
    }

    #[tokio::test]
    async fn save_failure_propagates() {
        let runner = qna_runner(Arc::new(ReadOnlyStorage), vec![ScoredAnswer::new("9-5", 0.91, "7")]);
        let err = runner.run_turn(message("hours")).await.unwrap_err();
        assert!(err.is_persistence());
    }

    #[tokio::test]
    async fn handler_error_still_persists_and_replies() {
        let memory = Arc::new(MemoryStorage::new());
        let (conversation, user) = stores(memory.clone());
        let runner = TurnRunner::builder(conversation.clone(), user)
            .handler(FailingHandler)
            .error_text("Oops.")
            .build()
            .unwrap();

        let replies = runner.run_turn(message("hours")).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].activity, OutboundActivity::text("Oops."));

        let bag = conversation.load("test/conversations/c-1").await.unwrap();
        assert!(bag.contains("touched"));
    }

    #[tokio::test]
    async fn cancelled_turn_persists_nothing() {
        let memory = Arc::new(MemoryStorage::new());
        let (conversation, user) = stores(memory.clone());
        let runner = TurnRunner::builder(conversation, user)
            .handler(HangingHandler)
            .build()
            .unwrap();

        let outcome = tokio::time::timeout(Duration::from_millis(20), runner.run_turn(message("hours"))).await;
        assert!(outcome.is_err());
        assert!(memory.is_empty().await);
    }

    #[tokio::test]
    async fn stop_skips_later_handlers() {
        let flag = Arc::new(AtomicBool::new(false));
        let (conversation, user) = stores(Arc::new(MemoryStorage::new()));
        let runner = TurnRunner::builder(conversation, user)
            .handler(StopHandler)
            .handler(FlagHandler(flag.clone()))
            .build()
            .unwrap();
        runner.run_turn(message("hours")).await.unwrap();
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn turns_of_one_conversation_do_not_interleave() {
        let memory = Arc::new(MemoryStorage::new());
        let (conversation, user) = stores(memory.clone());
        let runner = Arc::new(
            TurnRunner::builder(conversation.clone(), user)
                .handler(CountingHandler)
                .build()
                .unwrap(),
        );

        let mut turns = JoinSet::new();
        for _ in 0..8 {
            let runner = runner.clone();
            turns.spawn(async move { runner.run_turn(message("hi")).await });
        }
        while let Some(result) = turns.join_next().await {
            result.unwrap().unwrap();
        }

        let bag = conversation.load("test/conversations/c-1").await.unwrap();
        let count = StatePropertyAccessor::<u32>::new("count").get(&bag).unwrap();
        assert_eq!(count, Some(8));
    }

    #[tokio::test]
    async fn missing_ids_are_rejected() {
        let runner = qna_runner(Arc::new(MemoryStorage::new()), Vec::new());
        let mut activity = message("hours");
        activity.conversation.id.clear();
        let err = runner.run_turn(activity).await.unwrap_err();
        assert!(matches!(err, TurnError::InvalidActivity(_)));
    }

    #[test]
    fn builder_checks_scopes_and_handlers() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let swapped = TurnRunner::builder(BotState::user(storage.clone()), BotState::conversation(storage.clone()))
            .handler(StopHandler)
            .build();
        assert!(matches!(swapped, Err(TurnError::InvalidConfiguration(_))));

        let (conversation, user) = stores(storage);
        let empty = TurnRunner::builder(conversation, user).build();
        assert!(matches!(empty, Err(TurnError::InvalidConfiguration(_))));
    }
}
