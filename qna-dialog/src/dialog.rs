//! The answer dialog: one utterance in, at most one outbound activity out.

use std::sync::Arc;

use bot_state::{StateBag, StatePropertyAccessor};
use qna_service::{AnswerScorer, FeedbackRecord, QnaServiceError, QueryContext, ScoredAnswer};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::activity::{Activity, OutboundActivity};
use crate::card::{build_active_learning_card, render_answer};
use crate::decision::{Decision, decide};
use crate::errors::{DialogError, Result};
use crate::options::DialogOptions;
use crate::turn_state::{DialogCursor, FollowUpState, TurnState};

/// Input of one dialog invocation.
#[derive(Debug, Clone, Copy)]
pub struct DialogTurn<'a> {
    pub utterance: &'a str,
    pub user_id: &'a str,
}

/// Resolves utterances against an [`AnswerScorer`].
///
/// Holds no per-conversation data: everything that survives a turn lives in
/// the caller-supplied [`TurnState`], so one dialog serves every conversation.
#[derive(Clone)]
pub struct AnswerDialog {
    scorer: Arc<dyn AnswerScorer>,
    options: Arc<DialogOptions>,
}

impl std::fmt::Debug for AnswerDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerDialog")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl AnswerDialog {
    /// # Errors
    /// [`DialogError::InvalidConfiguration`] if `options` fail validation.
    pub fn new(scorer: Arc<dyn AnswerScorer>, options: DialogOptions) -> Result<Self> {
        options.validate()?;
        info!(
            knowledge_base = %options.knowledge_base_id,
            threshold = options.score_threshold,
            top = options.top_answers,
            band = options.ambiguity_band,
            "answer dialog initialized"
        );
        Ok(Self {
            scorer,
            options: Arc::new(options),
        })
    }

    pub fn options(&self) -> &DialogOptions {
        &self.options
    }

    /// Runs one turn against the dialog's slice of conversation state.
    ///
    /// The slice is removed from `bag` once nothing is pending. A slice that
    /// no longer decodes is discarded and the turn starts from a clear state.
    pub async fn run(
        &self,
        activity: &Activity,
        bag: &mut StateBag,
        accessor: &StatePropertyAccessor<TurnState>,
    ) -> Result<Option<OutboundActivity>> {
        let mut state = match accessor.get_or_default(bag) {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, property = accessor.name(), "discarding unreadable dialog state");
                accessor.delete(bag);
                TurnState::default()
            }
        };
        let turn = DialogTurn {
            utterance: activity.utterance(),
            user_id: &activity.from.id,
        };
        let reply = self.handle(turn, &mut state).await;
        if state.is_clear() {
            accessor.delete(bag);
        } else {
            accessor.set(bag, &state)?;
        }
        Ok(reply)
    }

    /// Handles one utterance. Returns `None` only for blank utterances.
    #[instrument(skip_all, fields(user = %turn.user_id))]
    pub async fn handle(&self, turn: DialogTurn<'_>, state: &mut TurnState) -> Option<OutboundActivity> {
        let utterance = turn.utterance.trim();
        if utterance.is_empty() {
            debug!("blank utterance ignored");
            return None;
        }

        if let DialogCursor::Clarifying { question, candidates } = std::mem::take(&mut state.cursor) {
            if utterance == self.options.no_match_text.trim() {
                debug!("clarification declined");
                state.clear();
                return Some(OutboundActivity::text(self.options.no_match_response_text.clone()));
            }
            if let Some(chosen) = candidates.into_iter().find(|c| c.label == utterance) {
                debug!(source_id = %chosen.answer.source_id, "clarification resolved");
                self.send_feedback(turn.user_id, &question, &chosen.answer);
                return Some(self.answer(chosen.answer, &question, state));
            }
            debug!("free text while clarifying, querying again");
        }

        self.query(utterance, state).await
    }

    async fn query(&self, utterance: &str, state: &mut TurnState) -> Option<OutboundActivity> {
        let mut request = self.options.score_request(utterance);
        if let Some(follow_up) = state.follow_up.take() {
            if let Some(prompt) = follow_up.matching_prompt(utterance) {
                debug!(qna_id = %prompt.qna_id, "follow-up prompt selected");
                request.qna_id = Some(prompt.qna_id.clone());
            }
            request.context = Some(QueryContext {
                previous_qna_id: follow_up.previous_qna_id,
                previous_user_query: follow_up.previous_user_query,
            });
        }

        let candidates = match timeout(self.options.scorer_timeout, self.scorer.score(&request)).await {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(err)) => return Some(self.unavailable(err)),
            Err(_) => return Some(self.unavailable(QnaServiceError::Timeout(self.options.scorer_timeout))),
        };

        let decision = decide(
            &candidates,
            self.options.score_threshold,
            self.options.ambiguity_band,
            self.options.top_answers as usize,
        );
        debug!(candidates = candidates.len(), decision = decision_name(&decision), "scored");

        match decision {
            Decision::Fallback => Some(OutboundActivity::text(self.options.fallback_text())),
            Decision::Answer(answer) => Some(self.answer(answer, utterance, state)),
            Decision::Clarify(set) => {
                let built = build_active_learning_card(
                    &set,
                    self.options.top_answers as usize,
                    &self.options.active_learning_title,
                    &self.options.no_match_text,
                );
                state.cursor = DialogCursor::Clarifying {
                    question: utterance.to_string(),
                    candidates: built.candidates,
                };
                Some(OutboundActivity::ChoiceCard(built.card))
            }
        }
    }

    fn answer(&self, answer: ScoredAnswer, question: &str, state: &mut TurnState) -> OutboundActivity {
        let prompts = answer.prompts();
        state.cursor = DialogCursor::Idle;
        state.follow_up = (!prompts.is_empty()).then(|| FollowUpState {
            previous_qna_id: answer.source_id.clone(),
            previous_user_query: question.to_string(),
            prompts,
        });
        render_answer(&answer, &self.options)
    }

    fn unavailable(&self, err: QnaServiceError) -> OutboundActivity {
        let err = DialogError::ScorerUnavailable(err);
        warn!(error = %err, "falling back");
        OutboundActivity::text(self.options.fallback_text())
    }

    /// Reports the confirmed answer in the background. Failures never change
    /// the reply.
    fn send_feedback(&self, user_id: &str, question: &str, answer: &ScoredAnswer) {
        let records = vec![FeedbackRecord {
            user_id: user_id.to_string(),
            user_question: question.to_string(),
            qna_id: answer.source_id.clone(),
        }];
        let scorer = self.scorer.clone();
        let limit = self.options.scorer_timeout;
        tokio::spawn(async move {
            match timeout(limit, scorer.record_feedback(&records)).await {
                Ok(Ok(())) => debug!(qna_id = %records[0].qna_id, "feedback recorded"),
                Ok(Err(err)) => warn!(error = %err, "feedback upload failed"),
                Err(_) => warn!("feedback upload timed out"),
            }
        });
    }
}

fn decision_name(decision: &Decision) -> &'static str {
    match decision {
        Decision::Fallback => "fallback",
        Decision::Answer(_) => "answer",
        Decision::Clarify(_) => "clarify",
    }
}

/// Labels of the options awaiting a pick; empty when idle.
pub fn pending_labels(state: &TurnState) -> Vec<&str> {
    match &state.cursor {
        DialogCursor::Clarifying { candidates, .. } => candidates.iter().map(|c| c.label.as_str()).collect(),
        DialogCursor::Idle => Vec::new(),
    }
}
