//! Dialog configuration, resolved once at start-up and shared read-only.

use std::time::Duration;

use qna_service::{RankerMode, ScoreRequest};

use crate::errors::{DialogError, Result};

pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.3;
pub const DEFAULT_TOP_ANSWERS: u32 = 3;
pub const DEFAULT_AMBIGUITY_BAND: f32 = 0.05;
pub const DEFAULT_SCORER_TIMEOUT: Duration = Duration::from_secs(10);

pub const ACTIVE_LEARNING_TITLE: &str = "Did you mean:";
pub const NO_MATCH_TEXT: &str = "None of the above.";
pub const NO_MATCH_RESPONSE_TEXT: &str = "Thanks for your feedback.";
/// Used when no default answer is configured.
pub const GENERIC_FALLBACK_TEXT: &str = "No QnAMaker answers found.";

#[derive(Debug, Clone, PartialEq)]
pub struct DialogOptions {
    pub knowledge_base_id: String,
    pub service_endpoint: String,
    pub score_threshold: f32,
    pub top_answers: u32,
    pub ranker_mode: RankerMode,
    /// Candidates scoring within this distance of the best one make the
    /// query ambiguous.
    pub ambiguity_band: f32,
    pub default_answer: Option<String>,
    pub active_learning_title: String,
    pub no_match_text: String,
    pub no_match_response_text: String,
    pub precise_answer_enabled: bool,
    pub precise_answer_only: bool,
    pub is_test: bool,
    pub include_unstructured_sources: bool,
    pub scorer_timeout: Duration,
}

impl DialogOptions {
    /// Options with the stock texts and thresholds.
    pub fn new(knowledge_base_id: impl Into<String>, service_endpoint: impl Into<String>) -> Self {
        Self {
            knowledge_base_id: knowledge_base_id.into(),
            service_endpoint: service_endpoint.into(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            top_answers: DEFAULT_TOP_ANSWERS,
            ranker_mode: RankerMode::Default,
            ambiguity_band: DEFAULT_AMBIGUITY_BAND,
            default_answer: None,
            active_learning_title: ACTIVE_LEARNING_TITLE.to_string(),
            no_match_text: NO_MATCH_TEXT.to_string(),
            no_match_response_text: NO_MATCH_RESPONSE_TEXT.to_string(),
            precise_answer_enabled: false,
            precise_answer_only: false,
            is_test: false,
            include_unstructured_sources: true,
            scorer_timeout: DEFAULT_SCORER_TIMEOUT,
        }
    }

    /// Checks the invariants every dialog relies on.
    ///
    /// # Errors
    /// [`DialogError::InvalidConfiguration`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(DialogError::InvalidConfiguration(msg.to_string()));

        if self.knowledge_base_id.trim().is_empty() {
            return invalid("knowledge base id is required");
        }
        if self.service_endpoint.trim().is_empty() {
            return invalid("service endpoint is required");
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return invalid("score threshold must be within [0, 1]");
        }
        if self.top_answers < 1 {
            return invalid("top answers count must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.ambiguity_band) {
            return invalid("ambiguity band must be within [0, 1]");
        }
        if self.no_match_text.trim().is_empty() {
            return invalid("no-match option text must not be empty");
        }
        if self.scorer_timeout.is_zero() {
            return invalid("scorer timeout must be positive");
        }
        Ok(())
    }

    /// Text sent when nothing qualifies.
    pub fn fallback_text(&self) -> &str {
        match self.default_answer.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => GENERIC_FALLBACK_TEXT,
        }
    }

    /// Scorer request for `utterance` carrying these options.
    pub fn score_request(&self, utterance: &str) -> ScoreRequest {
        ScoreRequest {
            top: self.top_answers,
            score_threshold: self.score_threshold,
            ranker_mode: self.ranker_mode,
            is_test: self.is_test,
            include_unstructured_sources: self.include_unstructured_sources,
            precise_answer: self.precise_answer_enabled,
            ..ScoreRequest::new(utterance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> DialogOptions {
        DialogOptions::new("kb-1", "https://qna.example.test")
    }

    #[test]
    fn stock_options_are_valid() {
        assert!(options().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut o = options();
        o.score_threshold = 1.5;
        assert!(matches!(o.validate(), Err(DialogError::InvalidConfiguration(_))));

        let mut o = options();
        o.top_answers = 0;
        assert!(o.validate().is_err());

        let mut o = options();
        o.score_threshold = f32::NAN;
        assert!(o.validate().is_err());

        let mut o = options();
        o.knowledge_base_id = " ".into();
        assert!(o.validate().is_err());
    }

    #[test]
    fn fallback_prefers_configured_default() {
        let mut o = options();
        assert_eq!(o.fallback_text(), GENERIC_FALLBACK_TEXT);
        o.default_answer = Some("   ".into());
        assert_eq!(o.fallback_text(), GENERIC_FALLBACK_TEXT);
        o.default_answer = Some("Ask HR.".into());
        assert_eq!(o.fallback_text(), "Ask HR.");
    }

    #[test]
    fn score_request_carries_options() {
        let mut o = options();
        o.top_answers = 5;
        o.ranker_mode = RankerMode::QaPairsOnly;
        o.precise_answer_enabled = true;
        let req = o.score_request("hours");
        assert_eq!(req.utterance, "hours");
        assert_eq!(req.top, 5);
        assert_eq!(req.ranker_mode, RankerMode::QaPairsOnly);
        assert!(req.precise_answer);
        assert!(req.qna_id.is_none());
    }
}
