pub mod app_state;
pub mod bot_settings;
pub mod http;
