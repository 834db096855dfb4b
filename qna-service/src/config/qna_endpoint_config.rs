use crate::config::service_type::QnaServiceType;

/// Connection settings for one hosted knowledge base.
///
/// # Fields
///
/// - `service_type`: Which back end protocol to speak.
/// - `knowledge_base_id`: Knowledge base id (QnA Maker) or project name (Language).
/// - `endpoint_key`: Endpoint/subscription key sent with every request.
/// - `host`: Base URL of the runtime, e.g. `https://my-kb.azurewebsites.net/qnamaker`.
/// - `timeout_secs`: Optional per-request timeout in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QnaEndpointConfig {
    /// Back end protocol.
    pub service_type: QnaServiceType,

    /// Knowledge base id or Language project name.
    pub knowledge_base_id: String,

    /// Endpoint key (QnA Maker) or subscription key (Language).
    pub endpoint_key: String,

    /// Base URL of the runtime host.
    pub host: String,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl QnaEndpointConfig {
    /// Host without trailing slashes, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.host.trim().trim_end_matches('/')
    }
}
