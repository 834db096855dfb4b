/// Hosted back end that answers knowledge-base queries.
///
/// Both services expose the same logical operation (rank the knowledge base
/// against an utterance) with different routes, auth headers and score scales.
///
/// # Examples
///
/// ```
/// use qna_service::config::service_type::QnaServiceType;
///
/// assert_eq!(QnaServiceType::from_setting("language"), QnaServiceType::Language);
/// assert_eq!(QnaServiceType::from_setting("qnamaker"), QnaServiceType::QnaMaker);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QnaServiceType {
    /// Classic QnA Maker runtime (`/knowledgebases/{id}/generateAnswer`).
    #[default]
    QnaMaker,
    /// Language service custom question answering (`/language/:query-knowledgebases`).
    Language,
}

impl QnaServiceType {
    /// Maps the raw setting value; only `language` selects the Language service.
    pub fn from_setting(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("language") {
            QnaServiceType::Language
        } else {
            QnaServiceType::QnaMaker
        }
    }
}
