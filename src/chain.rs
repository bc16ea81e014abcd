//! Middleware chain runner.
//!
//! A [`Chain`] is an ordered list of handlers sharing one context. Running it
//! walks the list strictly in sequence; each handler decides through its
//! [`Signal`] whether the next one runs.
//!
//! ```text
//! Pending ─► Running(0) ─► Running(1) ─► … ─► Completed
//!               │             │
//!               ├─► Halted    ├─► Halted     (Signal::Halt, or a terminal context)
//!               └─► Failed    └─► Failed     (Signal::Fail)
//! ```
//!
//! # Halting on error responses
//!
//! Whether writing an error response also stops the chain is decided here,
//! once, not by each handler. After a handler returns `Continue`, the runner
//! asks the context [`is_terminal`](ChainContext::is_terminal); a terminal
//! context halts the chain at that handler. For [`HttpContext`] that means
//! any 4xx/5xx status. A handler that writes `404` and then continues still
//! stops the chain.
//!
//! [`HttpContext`]: crate::HttpContext

use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler, Signal};

/// A context a [`Chain`] can run over.
pub trait ChainContext: Send + 'static {
    /// `true` once the context holds a final error result.
    fn is_terminal(&self) -> bool {
        false
    }
}

/// How a chain invocation ended.
#[derive(Debug)]
pub enum Outcome<C> {
    /// Every handler ran and continued.
    Completed(C),
    /// Handler `at` stopped the chain.
    Halted { ctx: C, at: usize },
    /// Handler `at` returned an error.
    Failed { error: Error, at: usize },
}

impl<C> Outcome<C> {
    /// The final context, or the error a handler failed with.
    pub fn into_context(self) -> Result<C, Error> {
        match self {
            Self::Completed(ctx) | Self::Halted { ctx, .. } => Ok(ctx),
            Self::Failed { error, .. } => Err(error),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Halted { .. } => "halted",
            Self::Failed { .. } => "failed",
        }
    }
}

/// An ordered sequence of handlers over context `C`.
///
/// Cloning is cheap: handlers are reference-counted.
pub struct Chain<C> {
    handlers: Vec<BoxedHandler<C>>,
}

impl<C: ChainContext> Chain<C> {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Appends `handler`. Returns `self` so registrations chain naturally.
    pub fn then(mut self, handler: impl Handler<C>) -> Self {
        self.handlers.push(handler.into_boxed_handler());
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the handlers in registration order over `ctx`.
    ///
    /// Only one handler is active at a time. An empty chain completes
    /// immediately with `ctx` unchanged.
    pub async fn run(&self, ctx: C) -> Outcome<C> {
        let mut ctx = ctx;
        for (at, handler) in self.handlers.iter().enumerate() {
            match handler.call(ctx).await {
                Signal::Continue(next) if next.is_terminal() => {
                    debug!(at, "chain halted on terminal context");
                    return Outcome::Halted { ctx: next, at };
                }
                Signal::Continue(next) => ctx = next,
                Signal::Halt(last) => return Outcome::Halted { ctx: last, at },
                Signal::Fail(error) => return Outcome::Failed { error, at },
            }
        }
        Outcome::Completed(ctx)
    }
}

impl<C: ChainContext> Default for Chain<C> {
    fn default() -> Self { Self::new() }
}

impl<C> Clone for Chain<C> {
    fn clone(&self) -> Self {
        Self { handlers: self.handlers.iter().map(Arc::clone).collect() }
    }
}
