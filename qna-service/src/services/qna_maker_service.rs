//! QnA Maker runtime client.
//!
//! Endpoints are derived from [`QnaEndpointConfig`]:
//! - `POST {host}/knowledgebases/{kb}/generateAnswer`: rank the knowledge base
//! - `POST {host}/knowledgebases/{kb}/train`: active-learning feedback
//!
//! Requests carry `Authorization: EndpointKey {key}`. The runtime scores on a
//! 0–100 scale; answers are normalized to `[0, 1]` before leaving this module.

use std::time::Duration;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    config::{qna_endpoint_config::QnaEndpointConfig, service_type::QnaServiceType},
    error_handler::{ConfigError, Result},
    scorer::{
        AnswerContext, FeedbackRecord, FollowUpPrompt, PreciseAnswer, ScoreRequest, ScoredAnswer,
    },
    services::{FALLBACK_TIMEOUT, NO_MATCH_ID, decode_json, numeric_id, send_checked},
};

/// Thin client for the QnA Maker runtime.
#[derive(Debug)]
pub struct QnaMakerService {
    client: reqwest::Client,
    cfg: QnaEndpointConfig,
    timeout: Duration,
    url_generate: String,
    url_train: String,
}

impl QnaMakerService {
    /// Creates a new [`QnaMakerService`] from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidFormat`] if `cfg.service_type` is not QnA Maker
    ///   or the host is not http/https
    /// - [`crate::QnaServiceError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: QnaEndpointConfig) -> Result<Self> {
        if cfg.service_type != QnaServiceType::QnaMaker {
            return Err(ConfigError::InvalidFormat {
                var: "QnAServiceType",
                reason: "expected the QnA Maker service",
            }
            .into());
        }
        crate::error_handler::validate_http_endpoint("QnAEndpointHostName", cfg.base_url())?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(FALLBACK_TIMEOUT);

        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("EndpointKey {}", cfg.endpoint_key))
            .map_err(|_| ConfigError::InvalidFormat {
                var: "QnAEndpointKey",
                reason: "must be a valid header value",
            })?;
        headers.insert(header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let kb_base = format!("{}/knowledgebases/{}", cfg.base_url(), cfg.knowledge_base_id);
        let url_generate = format!("{kb_base}/generateAnswer");
        let url_train = format!("{kb_base}/train");

        Ok(Self {
            client,
            cfg,
            timeout,
            url_generate,
            url_train,
        })
    }

    /// Host the client talks to.
    pub fn config(&self) -> &QnaEndpointConfig {
        &self.cfg
    }

    /// Ranks the knowledge base against `req.utterance`.
    ///
    /// The runtime's built-in "no good match" answer (id `-1`) is dropped, so
    /// an empty vector means nothing matched.
    ///
    /// # Errors
    /// - [`crate::QnaServiceError::HttpStatus`] for non-2xx responses
    /// - [`crate::QnaServiceError::Timeout`] / [`crate::QnaServiceError::HttpTransport`] for client errors
    /// - [`crate::QnaServiceError::Decode`] if the response cannot be parsed
    #[instrument(skip_all, fields(kb = %self.cfg.knowledge_base_id, top = req.top))]
    pub async fn generate_answer(&self, req: &ScoreRequest) -> Result<Vec<ScoredAnswer>> {
        let body = GenerateAnswerRequest::from_request(req);

        debug!("POST {}", self.url_generate);
        let resp = send_checked(
            self.client.post(&self.url_generate).json(&body),
            &self.url_generate,
            self.timeout,
        )
        .await?;

        let out: GenerateAnswerResponse =
            decode_json(resp, "`{ answers: [{ answer, score, id }] }`").await?;

        let answers: Vec<ScoredAnswer> = out
            .answers
            .into_iter()
            .filter(|a| a.id != NO_MATCH_ID)
            .map(WireAnswer::into_scored)
            .collect();
        debug!(count = answers.len(), "generateAnswer decoded");
        Ok(answers)
    }

    /// Uploads active-learning feedback via `/train`.
    ///
    /// # Errors
    /// Same as [`QnaMakerService::generate_answer`], minus decoding.
    #[instrument(skip_all, fields(kb = %self.cfg.knowledge_base_id, records = records.len()))]
    pub async fn train(&self, records: &[FeedbackRecord]) -> Result<()> {
        let body = TrainRequest {
            feedback_records: records
                .iter()
                .map(|r| TrainRecord {
                    user_id: &r.user_id,
                    user_question: &r.user_question,
                    qna_id: &r.qna_id,
                })
                .collect(),
        };

        debug!("POST {}", self.url_train);
        send_checked(
            self.client.post(&self.url_train).json(&body),
            &self.url_train,
            self.timeout,
        )
        .await?;
        Ok(())
    }
}

/* ==========================
HTTP payloads
========================== */

/// Request body for `/generateAnswer`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAnswerRequest<'a> {
    question: &'a str,
    top: u32,
    /// 0–100 scale.
    score_threshold: f32,
    ranker_type: &'static str,
    is_test: bool,
    include_unstructured_sources: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    qna_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<WireContext<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_span_request: Option<AnswerSpanRequest>,
}

impl<'a> GenerateAnswerRequest<'a> {
    fn from_request(req: &'a ScoreRequest) -> Self {
        Self {
            question: &req.utterance,
            top: req.top,
            score_threshold: req.score_threshold * 100.0,
            ranker_type: req.ranker_mode.as_wire(),
            is_test: req.is_test,
            include_unstructured_sources: req.include_unstructured_sources,
            qna_id: req.qna_id.as_deref().and_then(numeric_id),
            context: req.context.as_ref().map(|c| WireContext {
                previous_qn_a_id: numeric_id(&c.previous_qna_id).unwrap_or(NO_MATCH_ID),
                previous_user_query: &c.previous_user_query,
            }),
            answer_span_request: req.precise_answer.then_some(AnswerSpanRequest {
                enable: true,
                top_answers_with_span: 1,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireContext<'a> {
    #[serde(rename = "previousQnAId")]
    previous_qn_a_id: i64,
    #[serde(rename = "previousUserQuery")]
    previous_user_query: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerSpanRequest {
    enable: bool,
    top_answers_with_span: u32,
}

/// Response body for `/generateAnswer`.
#[derive(Debug, Deserialize)]
struct GenerateAnswerResponse {
    #[serde(default)]
    answers: Vec<WireAnswer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnswer {
    #[serde(default)]
    questions: Vec<String>,
    answer: String,
    /// 0–100 scale.
    score: f32,
    id: i64,
    #[serde(default)]
    context: Option<WireAnswerContext>,
    #[serde(default)]
    answer_span: Option<WireSpan>,
}

impl WireAnswer {
    fn into_scored(self) -> ScoredAnswer {
        ScoredAnswer {
            text: self.answer,
            score: (self.score / 100.0).clamp(0.0, 1.0),
            source_id: self.id.to_string(),
            questions: self.questions,
            context: self.context.map(|c| AnswerContext {
                is_context_only: c.is_context_only,
                prompts: c
                    .prompts
                    .into_iter()
                    .map(|p| FollowUpPrompt {
                        display_order: p.display_order,
                        qna_id: p.qna_id.to_string(),
                        display_text: p.display_text,
                    })
                    .collect(),
            }),
            precise_answer: self
                .answer_span
                .filter(|s| !s.text.trim().is_empty())
                .map(|s| PreciseAnswer {
                    text: s.text,
                    score: (s.score / 100.0).clamp(0.0, 1.0),
                }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnswerContext {
    #[serde(default)]
    is_context_only: bool,
    #[serde(default)]
    prompts: Vec<WirePrompt>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePrompt {
    #[serde(default)]
    display_order: i32,
    qna_id: i64,
    display_text: String,
}

#[derive(Debug, Deserialize)]
struct WireSpan {
    text: String,
    #[serde(default)]
    score: f32,
}

/// Request body for `/train`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrainRequest<'a> {
    feedback_records: Vec<TrainRecord<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrainRecord<'a> {
    user_id: &'a str,
    user_question: &'a str,
    qna_id: &'a str,
}
