//! The turn-handler seam.

use std::{future::Future, pin::Pin};

use crate::context::TurnContext;
use crate::errors::Result;

/// Whether the runner should call the next handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Flow>> + Send + 'a>>;

/// One step of the turn pipeline. Handlers run in registration order until
/// one returns [`Flow::Stop`] or fails.
pub trait TurnHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn on_turn<'a>(&'a self, ctx: &'a mut TurnContext) -> HandlerFuture<'a>;
}
