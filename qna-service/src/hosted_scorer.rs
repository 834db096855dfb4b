//! [`AnswerScorer`] backed by one of the hosted runtimes.
//!
//! The runtime is picked once from [`QnaEndpointConfig::service_type`]; the
//! dialog only ever sees the trait.
//!
//! # Example
//! ```no_run
//! use qna_service::{HostedScorer, AnswerScorer, ScoreRequest};
//! use qna_service::config::{qna_endpoint_config::QnaEndpointConfig, service_type::QnaServiceType};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scorer = HostedScorer::new(QnaEndpointConfig {
//!     service_type: QnaServiceType::Language,
//!     knowledge_base_id: "faq".into(),
//!     endpoint_key: "key".into(),
//!     host: "https://my-language.cognitiveservices.azure.com".into(),
//!     timeout_secs: Some(10),
//! })?;
//! let answers = scorer.score(&ScoreRequest::new("opening hours")).await?;
//! println!("{} candidates", answers.len());
//! # Ok(()) }
//! ```

use tracing::info;

use crate::{
    config::{qna_endpoint_config::QnaEndpointConfig, service_type::QnaServiceType},
    error_handler::Result,
    scorer::{AnswerScorer, FeedbackRecord, ScoreFuture, ScoreRequest, ScoredAnswer},
    services::{language_service::LanguageService, qna_maker_service::QnaMakerService},
};

/// Hosted knowledge-base scorer.
#[derive(Debug)]
pub enum HostedScorer {
    QnaMaker(QnaMakerService),
    Language(LanguageService),
}

impl HostedScorer {
    /// Builds the client matching `cfg.service_type`.
    ///
    /// # Errors
    /// Propagates configuration and client-construction errors.
    pub fn new(cfg: QnaEndpointConfig) -> Result<Self> {
        let scorer = match cfg.service_type {
            QnaServiceType::QnaMaker => HostedScorer::QnaMaker(QnaMakerService::new(cfg)?),
            QnaServiceType::Language => HostedScorer::Language(LanguageService::new(cfg)?),
        };
        info!(
            service = ?scorer.config().service_type,
            kb = %scorer.config().knowledge_base_id,
            "HostedScorer initialized"
        );
        Ok(scorer)
    }

    pub fn config(&self) -> &QnaEndpointConfig {
        match self {
            HostedScorer::QnaMaker(s) => s.config(),
            HostedScorer::Language(s) => s.config(),
        }
    }
}

impl AnswerScorer for HostedScorer {
    fn score<'a>(&'a self, request: &'a ScoreRequest) -> ScoreFuture<'a, Vec<ScoredAnswer>> {
        Box::pin(async move {
            match self {
                HostedScorer::QnaMaker(s) => s.generate_answer(request).await,
                HostedScorer::Language(s) => s.query_knowledge_base(request).await,
            }
        })
    }

    fn record_feedback<'a>(&'a self, records: &'a [FeedbackRecord]) -> ScoreFuture<'a, ()> {
        Box::pin(async move {
            match self {
                HostedScorer::QnaMaker(s) => s.train(records).await,
                HostedScorer::Language(s) => s.feedback(records).await,
            }
        })
    }
}
