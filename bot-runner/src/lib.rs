//! Turn runner for the QnA bot.
//!
//! Every inbound activity becomes one turn: state is loaded, the registered
//! [`TurnHandler`]s run in order, and conversation and user state are saved.
//! The stock pipeline is [`MembersAddedHandler`] followed by
//! [`MessageHandler`].

pub mod context;
pub mod conversation_locks;
pub mod errors;
pub mod handler;
pub mod handlers;
pub mod turn_runner;

pub use context::{Reply, TurnContext};
pub use errors::TurnError;
pub use handler::{Flow, HandlerFuture, TurnHandler};
pub use handlers::{
    members_added_handler::{DEFAULT_WELCOME_TEXT, MembersAddedHandler},
    message_handler::MessageHandler,
};
pub use turn_runner::{TurnRunner, TurnRunnerBuilder};
