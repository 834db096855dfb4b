use std::sync::Arc;

use bot_runner::{MembersAddedHandler, MessageHandler, TurnRunner};
use bot_state::{BotState, MemoryStorage, SledStorage, Storage};
use qna_dialog::AnswerDialog;
use qna_service::{
    AnswerScorer, HostedScorer, config::qna_endpoint_config::QnaEndpointConfig,
    health_service::HealthService,
};
use tracing::info;

use crate::core::bot_settings::{BotSettings, StorageKind};
use crate::error_handler::AppResult;

/// Sled tree holding both state scopes.
const STATE_TREE: &str = "bot_state";

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<TurnRunner>,
    pub health: Arc<HealthService>,
    /// Scorer endpoint probed by `/health`.
    pub endpoint: QnaEndpointConfig,
}

impl AppState {
    /// Wires storage, the hosted scorer, the dialog and the turn runner.
    pub fn build(settings: &BotSettings) -> AppResult<Self> {
        let scorer = HostedScorer::new(settings.endpoint.clone())?;
        Self::with_scorer(settings, Arc::new(scorer))
    }

    /// Same as [`AppState::build`] with a caller-supplied scorer.
    pub fn with_scorer(settings: &BotSettings, scorer: Arc<dyn AnswerScorer>) -> AppResult<Self> {
        let storage: Arc<dyn Storage> = match &settings.storage {
            StorageKind::Memory => Arc::new(MemoryStorage::new()),
            StorageKind::Sled { path } => Arc::new(SledStorage::open(path, STATE_TREE)?),
        };
        info!(storage = ?settings.storage, "state storage ready");

        let dialog = AnswerDialog::new(scorer, settings.dialog.clone())?;
        let runner = TurnRunner::builder(
            BotState::conversation(storage.clone()),
            BotState::user(storage),
        )
        .handler(MembersAddedHandler::new(settings.welcome_message.clone()))
        .handler(MessageHandler::new(dialog))
        .error_text(settings.dialog.fallback_text())
        .build()?;

        Ok(Self {
            runner: Arc::new(runner),
            health: Arc::new(HealthService::new(settings.endpoint.timeout_secs)?),
            endpoint: settings.endpoint.clone(),
        })
    }
}
