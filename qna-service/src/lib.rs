//! Answer scoring against hosted question-answering knowledge bases.
//!
//! - [`AnswerScorer`]: the capability the dialog depends on.
//! - [`HostedScorer`]: QnA Maker / Language implementation picked from config.
//! - [`health_service`]: reachability probe for `/health`.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod hosted_scorer;
pub mod scorer;
pub mod services;

pub use error_handler::{ConfigError, QnaServiceError};
pub use hosted_scorer::HostedScorer;
pub use scorer::{
    AnswerContext, AnswerScorer, FeedbackRecord, FollowUpPrompt, PreciseAnswer, QueryContext,
    RankerMode, ScoreFuture, ScoreRequest, ScoredAnswer,
};
