//! Conversation and user state for the bot.
//!
//! State is a JSON property bag per scope instance, loaded at the start of a
//! turn and saved exactly once after it through a [`Storage`] back end.

pub mod bot_state;
pub mod errors;
pub mod memory_storage;
pub mod sled_storage;
pub mod storage;

pub use bot_state::{BotState, StateBag, StatePropertyAccessor, StateScope};
pub use errors::{Result, StateError};
pub use memory_storage::MemoryStorage;
pub use sled_storage::SledStorage;
pub use storage::{Storage, StorageFuture};
