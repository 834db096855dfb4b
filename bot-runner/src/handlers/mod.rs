pub mod members_added_handler;
pub mod message_handler;
