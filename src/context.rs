//! Contexts threaded through a chain.
//!
//! A context is owned by exactly one chain invocation. Handlers receive it by
//! value and pass it on inside a [`Signal`], so no two handlers ever touch it
//! at the same time and no locking is needed.

use http::Extensions;

use crate::chain::ChainContext;
use crate::error::Error;
use crate::handler::Signal;
use crate::middleware::PathParams;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Request, response and a typed side-channel for one HTTP invocation.
#[derive(Debug)]
pub struct HttpContext {
    pub request: Request,
    pub response: Response,
    /// Values earlier handlers leave for later ones, keyed by type
    /// (e.g. [`PathParams`], [`RequestId`](crate::middleware::RequestId)).
    pub extras: Extensions,
}

impl HttpContext {
    pub fn new(request: Request) -> Self {
        Self { request, response: Response::new(), extras: Extensions::new() }
    }

    /// Hands the context to the next handler.
    pub fn next(self) -> Signal<Self> {
        Signal::Continue(self)
    }

    /// Ends the chain with this context as the result.
    pub fn halt(self) -> Signal<Self> {
        Signal::Halt(self)
    }

    /// Ends the chain with an error for the host; the context is dropped.
    pub fn fail(self, error: impl Into<Error>) -> Signal<Self> {
        Signal::Fail(error.into())
    }

    /// Writes a plain-text response and continues.
    ///
    /// With an error status the runner halts right after this handler, so
    /// `return ctx.respond(Status::BadRequest, "…")` is the usual way out.
    pub fn respond(mut self, status: Status, message: impl Into<String>) -> Signal<Self> {
        self.response.set_text(status, message);
        self.next()
    }

    /// Parameters extracted by [`path_parser`](crate::middleware::path_parser), if it ran and matched.
    pub fn path_params(&self) -> Option<&PathParams> {
        self.extras.get::<PathParams>()
    }

    /// A single named path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params().and_then(|p| p.get(name))
    }
}

impl ChainContext for HttpContext {
    fn is_terminal(&self) -> bool {
        self.response.status().is_error()
    }
}

/// An event delivered by a topic or fired by a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Topic or schedule name the event came from.
    pub source: String,
    pub id: String,
    pub data: Vec<u8>,
}

/// Event plus a typed side-channel for one event invocation.
#[derive(Debug)]
pub struct EventContext {
    pub event: Event,
    pub extras: Extensions,
}

impl EventContext {
    pub fn new(event: Event) -> Self {
        Self { event, extras: Extensions::new() }
    }

    pub fn next(self) -> Signal<Self> {
        Signal::Continue(self)
    }

    pub fn halt(self) -> Signal<Self> {
        Signal::Halt(self)
    }

    pub fn fail(self, error: impl Into<Error>) -> Signal<Self> {
        Signal::Fail(error.into())
    }

    /// Event data as text, with invalid UTF-8 replaced.
    pub fn data_text(&self) -> String {
        String::from_utf8_lossy(&self.event.data).into_owned()
    }
}

impl ChainContext for EventContext {}
