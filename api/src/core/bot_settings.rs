//! Start-up configuration for the whole bot.
//!
//! Read once from a key/value source; after that only this object is passed
//! around and nothing reads the process environment again.

use std::{path::PathBuf, time::Duration};

use qna_dialog::DialogOptions;
use qna_service::{
    ConfigError, QnaServiceError, RankerMode,
    config::{
        default_config::{DEFAULT_TIMEOUT_SECS, endpoint_config_from},
        qna_endpoint_config::QnaEndpointConfig,
    },
    error_handler::{opt_setting, validate_range_f32},
};

use crate::error_handler::AppResult;

pub const DEFAULT_API_ADDRESS: &str = "127.0.0.1:3978";
pub const DEFAULT_STORAGE_PATH: &str = "bot_state";

/// Where conversation and user state live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Sled { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub endpoint: QnaEndpointConfig,
    pub dialog: DialogOptions,
    /// `None` selects the built-in greeting.
    pub welcome_message: Option<String>,
    pub storage: StorageKind,
    pub api_address: String,
}

impl BotSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`.
    ///
    /// # Errors
    /// Fails on the first missing required value or malformed setting.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = endpoint_config_from(&lookup)?;

        let mut dialog = DialogOptions::new(endpoint.knowledge_base_id.clone(), endpoint.base_url());

        if let Some(threshold) = opt_setting::<_, f32>(&lookup, "QnAScoreThreshold", "expected a number")? {
            validate_range_f32("QnAScoreThreshold", threshold, 0.0, 1.0)?;
            dialog.score_threshold = threshold;
        }
        if let Some(top) = opt_setting::<_, u32>(&lookup, "QnATopAnswers", "expected a positive integer")? {
            if top == 0 {
                return Err(QnaServiceError::from(ConfigError::OutOfRange {
                    field: "QnATopAnswers",
                    detail: "expected at least 1",
                })
                .into());
            }
            dialog.top_answers = top;
        }
        if let Some(raw) = text(&lookup, "QnARankerType") {
            dialog.ranker_mode = RankerMode::from_setting(&raw).ok_or_else(|| {
                QnaServiceError::from(ConfigError::InvalidFormat {
                    var: "QnARankerType",
                    reason: "expected Default or QuestionOnly",
                })
            })?;
        }
        if let Some(band) = opt_setting::<_, f32>(&lookup, "QnAAmbiguityBand", "expected a number")? {
            validate_range_f32("QnAAmbiguityBand", band, 0.0, 1.0)?;
            dialog.ambiguity_band = band;
        }

        dialog.default_answer = text(&lookup, "DefaultAnswer");
        dialog.precise_answer_enabled = flag(&lookup, "EnablePreciseAnswer");
        dialog.precise_answer_only = flag(&lookup, "DisplayPreciseAnswerOnly");
        dialog.scorer_timeout =
            Duration::from_secs(endpoint.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        dialog.validate()?;

        let storage = match text(&lookup, "BOT_STORAGE")
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("memory") => StorageKind::Memory,
            Some("sled") => StorageKind::Sled {
                path: text(&lookup, "BOT_STORAGE_PATH")
                    .unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_string())
                    .into(),
            },
            Some(_) => {
                return Err(QnaServiceError::from(ConfigError::InvalidFormat {
                    var: "BOT_STORAGE",
                    reason: "expected memory or sled",
                })
                .into());
            }
        };

        Ok(Self {
            endpoint,
            dialog,
            welcome_message: text(&lookup, "DefaultWelcomeMessage"),
            storage,
            api_address: text(&lookup, "API_ADDRESS").unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string()),
        })
    }
}

/// Trimmed value, `None` when unset or blank.
fn text<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Only the literal `true` (any case) enables a flag.
fn flag<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> bool {
    text(lookup, name).is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use qna_service::config::service_type::QnaServiceType;

    use super::*;
    use crate::error_handler::AppError;

    fn settings(extra: &[(&str, &str)]) -> AppResult<BotSettings> {
        let mut map: HashMap<String, String> = [
            ("QnAKnowledgebaseId", "kb-1"),
            ("QnAEndpointKey", "secret"),
            ("QnAEndpointHostName", "https://kb.example.test/qnamaker/"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in extra {
            map.insert(k.to_string(), v.to_string());
        }
        BotSettings::from_lookup(move |k| map.get(k).cloned())
    }

    #[test]
    fn defaults_follow_the_sample() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.endpoint.service_type, QnaServiceType::QnaMaker);
        assert_eq!(s.dialog.score_threshold, 0.3);
        assert_eq!(s.dialog.top_answers, 3);
        assert_eq!(s.dialog.ambiguity_band, 0.05);
        assert_eq!(s.dialog.service_endpoint, "https://kb.example.test/qnamaker");
        assert_eq!(s.dialog.scorer_timeout, Duration::from_secs(10));
        assert!(!s.dialog.precise_answer_enabled);
        assert_eq!(s.dialog.default_answer, None);
        assert_eq!(s.welcome_message, None);
        assert_eq!(s.storage, StorageKind::Memory);
        assert_eq!(s.api_address, DEFAULT_API_ADDRESS);
    }

    #[test]
    fn reads_optional_settings() {
        let s = settings(&[
            ("QnAServiceType", "language"),
            ("DefaultAnswer", "Ask HR."),
            ("EnablePreciseAnswer", "true"),
            ("DisplayPreciseAnswerOnly", "yes"),
            ("DefaultWelcomeMessage", "Hello!"),
            ("QnAScoreThreshold", "0.5"),
            ("QnATopAnswers", "5"),
            ("QnARankerType", "QuestionOnly"),
            ("QnAAmbiguityBand", "0.1"),
            ("QnATimeoutSecs", "3"),
            ("BOT_STORAGE", "sled"),
            ("API_ADDRESS", "0.0.0.0:8080"),
        ])
        .unwrap();
        assert_eq!(s.endpoint.service_type, QnaServiceType::Language);
        assert_eq!(s.dialog.default_answer.as_deref(), Some("Ask HR."));
        assert!(s.dialog.precise_answer_enabled);
        assert!(!s.dialog.precise_answer_only);
        assert_eq!(s.welcome_message.as_deref(), Some("Hello!"));
        assert_eq!(s.dialog.score_threshold, 0.5);
        assert_eq!(s.dialog.top_answers, 5);
        assert_eq!(s.dialog.ranker_mode, RankerMode::QaPairsOnly);
        assert_eq!(s.dialog.ambiguity_band, 0.1);
        assert_eq!(s.dialog.scorer_timeout, Duration::from_secs(3));
        assert_eq!(s.storage, StorageKind::Sled { path: DEFAULT_STORAGE_PATH.into() });
        assert_eq!(s.api_address, "0.0.0.0:8080");
    }

    #[test]
    fn empty_strings_mean_unset() {
        let s = settings(&[("DefaultAnswer", ""), ("DefaultWelcomeMessage", "  ")]).unwrap();
        assert_eq!(s.dialog.default_answer, None);
        assert_eq!(s.welcome_message, None);
    }

    #[test]
    fn invalid_values_fail_fast() {
        for (key, value) in [
            ("QnAScoreThreshold", "1.5"),
            ("QnAScoreThreshold", "high"),
            ("QnATopAnswers", "0"),
            ("QnARankerType", "fuzzy"),
            ("QnAAmbiguityBand", "-0.1"),
            ("BOT_STORAGE", "redis"),
            ("QnAEndpointHostName", "kb.example.test"),
        ] {
            let err = settings(&[(key, value)]).unwrap_err();
            assert!(matches!(err, AppError::Settings(_)), "{key}={value} gave {err:?}");
        }
    }

    #[test]
    fn missing_required_value_is_reported() {
        let err = BotSettings::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("QnAKnowledgebaseId"));
    }
}
