//! The answer-scorer capability and the data it exchanges.
//!
//! [`AnswerScorer`] is the only seam between the dialog and a knowledge base:
//! one query in, zero or more [`ScoredAnswer`]s out. Hosted clients live in
//! [`crate::services`]; tests plug in their own implementations.

use std::{future::Future, pin::Pin};

use serde::{Deserialize, Serialize};

use crate::error_handler::Result;

/// Boxed future returned by [`AnswerScorer`] methods.
pub type ScoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Scorer-side ranking strategy. Opaque to the dialog; forwarded as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RankerMode {
    /// Rank against questions and answers.
    #[default]
    Default,
    /// Rank against the question side of QnA pairs only.
    QaPairsOnly,
}

impl RankerMode {
    /// Value sent in the `rankerType` field.
    pub fn as_wire(&self) -> &'static str {
        match self {
            RankerMode::Default => "Default",
            RankerMode::QaPairsOnly => "QuestionOnly",
        }
    }

    /// Parses a settings value (`Default`, `QuestionOnly`, `qa-pairs-only`).
    pub fn from_setting(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Some(RankerMode::Default),
            "questiononly" | "qa-pairs-only" | "qapairsonly" => Some(RankerMode::QaPairsOnly),
            _ => None,
        }
    }
}

/// Previous turn of a multi-turn exchange, sent so the knowledge base can
/// resolve follow-up prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub previous_qna_id: String,
    pub previous_user_query: String,
}

/// One query against the knowledge base.
///
/// Knowledge base id, endpoint key and host belong to the scorer's own
/// configuration and are added by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    pub utterance: String,
    /// Max number of answers to return.
    pub top: u32,
    /// Minimum score in `[0, 1]`; clients rescale to their wire scale.
    pub score_threshold: f32,
    pub ranker_mode: RankerMode,
    /// Query the test index instead of the published one.
    pub is_test: bool,
    pub include_unstructured_sources: bool,
    /// Request an extracted answer span alongside each answer.
    pub precise_answer: bool,
    /// Exact answer id to fetch (set when the user picked a follow-up prompt).
    pub qna_id: Option<String>,
    pub context: Option<QueryContext>,
}

impl ScoreRequest {
    /// Request with library defaults for everything but the utterance.
    pub fn new(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            top: 3,
            score_threshold: 0.3,
            ranker_mode: RankerMode::Default,
            is_test: false,
            include_unstructured_sources: true,
            precise_answer: false,
            qna_id: None,
            context: None,
        }
    }
}

/// A follow-up prompt attached to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpPrompt {
    pub display_order: i32,
    pub qna_id: String,
    pub display_text: String,
}

/// Structured follow-up information carried by an answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerContext {
    /// The answer is only reachable through a prompt, never as a top-level match.
    pub is_context_only: bool,
    pub prompts: Vec<FollowUpPrompt>,
}

/// Shorter extracted span inside a longer answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreciseAnswer {
    pub text: String,
    pub score: f32,
}

/// A candidate answer produced for one query. Never persisted beyond the
/// turn, except as part of a pending clarification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub text: String,
    /// Normalized to `[0, 1]`.
    pub score: f32,
    /// Knowledge-base answer id.
    pub source_id: String,
    /// Questions of the matched QnA pair, as reported by the scorer.
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub context: Option<AnswerContext>,
    #[serde(default)]
    pub precise_answer: Option<PreciseAnswer>,
}

impl ScoredAnswer {
    pub fn new(text: impl Into<String>, score: f32, source_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score,
            source_id: source_id.into(),
            questions: Vec::new(),
            context: None,
            precise_answer: None,
        }
    }

    /// Follow-up prompts sorted by display order (empty if none).
    pub fn prompts(&self) -> Vec<FollowUpPrompt> {
        let mut prompts = self
            .context
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();
        prompts.sort_by_key(|p| p.display_order);
        prompts
    }
}

/// Active-learning feedback: which answer the user confirmed for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRecord {
    pub user_id: String,
    pub user_question: String,
    pub qna_id: String,
}

/// Scores an utterance against a knowledge base.
///
/// Implement this trait to plug in a back end (hosted service, local index,
/// scripted test double).
pub trait AnswerScorer: Send + Sync {
    /// Returns candidates ordered as the back end ranked them.
    fn score<'a>(&'a self, request: &'a ScoreRequest) -> ScoreFuture<'a, Vec<ScoredAnswer>>;

    /// Uploads active-learning feedback. Back ends without training support
    /// keep the default no-op.
    fn record_feedback<'a>(&'a self, records: &'a [FeedbackRecord]) -> ScoreFuture<'a, ()> {
        let _ = records;
        Box::pin(async { Ok(()) })
    }
}
