pub mod default_config;
pub mod qna_endpoint_config;
pub mod service_type;
