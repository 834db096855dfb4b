//! Language service (custom question answering) client.
//!
//! Endpoints are derived from [`QnaEndpointConfig`]:
//! - `POST {host}/language/:query-knowledgebases?projectName={kb}&deploymentName={production|test}&api-version=2021-10-01`
//! - `POST {host}/language/query-knowledgebases/projects/{kb}/feedback?api-version=2021-10-01`
//!
//! Requests carry `Ocp-Apim-Subscription-Key`. Confidence scores are already
//! in `[0, 1]`.

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

const API_VERSION: &str = "2021-10-01";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Thin client for Language custom question answering.
#[derive(Debug)]
pub struct LanguageService {
    client: reqwest::Client,
    cfg: QnaEndpointConfig,
    timeout: Duration,
    url_query: String,
    url_feedback: String,
}

impl LanguageService {
    /// Creates a new [`LanguageService`] from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidFormat`] if `cfg.service_type` is not Language
    ///   or the host is not http/https
    /// - [`crate::QnaServiceError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: QnaEndpointConfig) -> Result<Self> {
        if cfg.service_type != QnaServiceType::Language {
            return Err(ConfigError::InvalidFormat {
                var: "QnAServiceType",
                reason: "expected the Language service",
            }
            .into());
        }
        crate::error_handler::validate_http_endpoint("QnAEndpointHostName", cfg.base_url())?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(FALLBACK_TIMEOUT);

        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(&cfg.endpoint_key).map_err(|_| {
            ConfigError::InvalidFormat {
                var: "QnAEndpointKey",
                reason: "must be a valid header value",
            }
        })?;
        headers.insert(SUBSCRIPTION_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_query = format!("{}/language/:query-knowledgebases", cfg.base_url());
        let url_feedback = format!(
            "{}/language/query-knowledgebases/projects/{}/feedback",
            cfg.base_url(),
            cfg.knowledge_base_id
        );

        Ok(Self {
            client,
            cfg,
            timeout,
            url_query,
            url_feedback,
        })
    }

    pub fn config(&self) -> &QnaEndpointConfig {
        &self.cfg
    }

    /// Queries the project. `req.is_test` selects the `test` deployment.
    ///
    /// # Errors
    /// - [`crate::QnaServiceError::HttpStatus`] for non-2xx responses
    /// - [`crate::QnaServiceError::Timeout`] / [`crate::QnaServiceError::HttpTransport`] for client errors
    /// - [`crate::QnaServiceError::Decode`] if the response cannot be parsed
    #[instrument(skip_all, fields(project = %self.cfg.knowledge_base_id, top = req.top))]
    pub async fn query_knowledge_base(&self, req: &ScoreRequest) -> Result<Vec<ScoredAnswer>> {
        let deployment = if req.is_test { "test" } else { "production" };
        let body = QueryRequest::from_request(req);

        debug!("POST {} ({deployment})", self.url_query);
        let call = self
            .client
            .post(&self.url_query)
            .query(&[
                ("projectName", self.cfg.knowledge_base_id.as_str()),
                ("deploymentName", deployment),
                ("api-version", API_VERSION),
            ])
            .json(&body);
        let resp = send_checked(call, &self.url_query, self.timeout).await?;

        let out: QueryResponse =
            decode_json(resp, "`{ answers: [{ answer, confidenceScore, id }] }`").await?;

        let answers: Vec<ScoredAnswer> = out
            .answers
            .into_iter()
            .filter(|a| a.id != NO_MATCH_ID)
            .map(WireAnswer::into_scored)
            .collect();
        debug!(count = answers.len(), "query-knowledgebases decoded");
        Ok(answers)
    }

    /// Uploads active-learning feedback for the project.
    #[instrument(skip_all, fields(project = %self.cfg.knowledge_base_id, records = records.len()))]
    pub async fn feedback(&self, records: &[FeedbackRecord]) -> Result<()> {
        let body = FeedbackRequest {
            records: records
                .iter()
                .map(|r| WireFeedback {
                    user_id: &r.user_id,
                    user_question: &r.user_question,
                    qna_id: numeric_id(&r.qna_id).unwrap_or(NO_MATCH_ID),
                })
                .collect(),
        };

        debug!("POST {}", self.url_feedback);
        let call = self
            .client
            .post(&self.url_feedback)
            .query(&[("api-version", API_VERSION)])
            .json(&body);
        send_checked(call, &self.url_feedback, self.timeout).await?;
        Ok(())
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    question: &'a str,
    top: u32,
    confidence_score_threshold: f32,
    ranker_type: &'static str,
    include_unstructured_sources: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    qna_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<WireContext<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_span_request: Option<AnswerSpanRequest>,
}

impl<'a> QueryRequest<'a> {
    fn from_request(req: &'a ScoreRequest) -> Self {
        Self {
            question: &req.utterance,
            top: req.top,
            confidence_score_threshold: req.score_threshold,
            ranker_type: req.ranker_mode.as_wire(),
            include_unstructured_sources: req.include_unstructured_sources,
            qna_id: req.qna_id.as_deref().and_then(numeric_id),
            context: req.context.as_ref().map(|c| WireContext {
                previous_qna_id: numeric_id(&c.previous_qna_id).unwrap_or(NO_MATCH_ID),
                previous_user_query: &c.previous_user_query,
            }),
            answer_span_request: req.precise_answer.then(|| AnswerSpanRequest {
                enable: true,
                confidence_score_threshold: req.score_threshold,
                top_answers_with_span: 1,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireContext<'a> {
    previous_qna_id: i64,
    previous_user_query: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerSpanRequest {
    enable: bool,
    confidence_score_threshold: f32,
    top_answers_with_span: u32,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    answers: Vec<WireAnswer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnswer {
    #[serde(default)]
    questions: Vec<String>,
    answer: String,
    confidence_score: f32,
    id: i64,
    #[serde(default)]
    dialog: Option<WireDialog>,
    #[serde(default)]
    answer_span: Option<WireSpan>,
}

impl WireAnswer {
    fn into_scored(self) -> ScoredAnswer {
        ScoredAnswer {
            text: self.answer,
            score: self.confidence_score.clamp(0.0, 1.0),
            source_id: self.id.to_string(),
            questions: self.questions,
            context: self.dialog.map(|d| AnswerContext {
                is_context_only: d.is_context_only,
                prompts: d
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
                    score: s.confidence_score.clamp(0.0, 1.0),
                }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDialog {
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
#[serde(rename_all = "camelCase")]
struct WireSpan {
    text: String,
    #[serde(default)]
    confidence_score: f32,
}

#[derive(Debug, Serialize)]
struct FeedbackRequest<'a> {
    records: Vec<WireFeedback<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFeedback<'a> {
    user_id: &'a str,
    user_question: &'a str,
    qna_id: i64,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode, Uri},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::scorer::QueryContext;
    use crate::services::test_server;

    type Seen = Arc<Mutex<Option<(String, HashMap<String, String>, Value)>>>;

    fn cfg(host: &str) -> QnaEndpointConfig {
        QnaEndpointConfig {
            service_type: QnaServiceType::Language,
            knowledge_base_id: "faq-project".into(),
            endpoint_key: "lang-key".into(),
            host: host.into(),
            timeout_secs: Some(5),
        }
    }

    #[tokio::test]
    async fn query_maps_dialog_prompts_and_answer_span() {
        let seen: Seen = Arc::default();
        let seen_in = seen.clone();
        // The route segment starts with `:`, which the router reserves; use the fallback.
        let app = Router::new().fallback(
                move |uri: Uri,
                      headers: HeaderMap,
                      Query(params): Query<HashMap<String, String>>,
                      Json(body): Json<Value>| {
                    let seen = seen_in.clone();
                    async move {
                        let key = headers
                            .get(SUBSCRIPTION_KEY_HEADER)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        assert_eq!(uri.path(), "/language/:query-knowledgebases");
                        *seen.lock().unwrap() = Some((key, params, body));
                        Json(json!({
                            "answers": [{
                                "questions": ["How do I reset my password?"],
                                "answer": "Open settings, choose security, then reset your password.",
                                "confidenceScore": 0.82,
                                "id": 21,
                                "dialog": {
                                    "isContextOnly": false,
                                    "prompts": [
                                        { "displayOrder": 1, "qnaId": 23, "displayText": "Forgot username" },
                                        { "displayOrder": 0, "qnaId": 22, "displayText": "Locked out" }
                                    ]
                                },
                                "answerSpan": { "text": "reset your password", "confidenceScore": 0.7 }
                            }]
                        }))
                    }
                },
        );
        let base = test_server::spawn(app).await;
        let svc = LanguageService::new(cfg(&base)).unwrap();

        let mut req = ScoreRequest::new("reset password");
        req.is_test = true;
        req.precise_answer = true;
        req.context = Some(QueryContext {
            previous_qna_id: "20".into(),
            previous_user_query: "account".into(),
        });
        let answers = svc.query_knowledge_base(&req).await.unwrap();

        assert_eq!(answers.len(), 1);
        let a = &answers[0];
        assert!((a.score - 0.82).abs() < 1e-6);
        assert_eq!(a.precise_answer.as_ref().unwrap().text, "reset your password");
        let prompts: Vec<_> = a.prompts().into_iter().map(|p| p.display_text).collect();
        assert_eq!(prompts, vec!["Locked out", "Forgot username"]);

        let (key, params, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(key, "lang-key");
        assert_eq!(params["projectName"], "faq-project");
        assert_eq!(params["deploymentName"], "test");
        assert_eq!(params["api-version"], API_VERSION);
        assert_eq!(body["context"]["previousQnaId"], 20);
        assert_eq!(body["answerSpanRequest"]["enable"], true);
        assert_eq!(body["includeUnstructuredSources"], true);
    }

    #[tokio::test]
    async fn empty_answers_are_not_an_error() {
        let app = Router::new().fallback(|| async {
            Json(json!({
                "answers": [{ "answer": "No answer found", "confidenceScore": 0.0, "id": -1 }]
            }))
        });
        let base = test_server::spawn(app).await;
        let svc = LanguageService::new(cfg(&base)).unwrap();
        let answers = svc.query_knowledge_base(&ScoreRequest::new("xyz123")).await.unwrap();
        assert!(answers.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let app = Router::new().fallback(|| async { (StatusCode::OK, "not json") });
        let base = test_server::spawn(app).await;
        let svc = LanguageService::new(cfg(&base)).unwrap();
        let err = svc.query_knowledge_base(&ScoreRequest::new("q")).await.unwrap_err();
        assert!(matches!(err, crate::QnaServiceError::Decode(_)));
    }
}
