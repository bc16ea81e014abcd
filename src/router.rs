//! Radix-tree request router.
//!
//! One tree per HTTP method, each leaf a [`Chain`]. A global prefix chain
//! (see [`Router::layer`]) runs ahead of every route chain.

use std::collections::HashMap;
use std::time::Instant;

use matchit::Router as MatchitRouter;
use tracing::{Instrument, Span, error, field, info, info_span};

use crate::chain::{Chain, Outcome};
use crate::context::HttpContext;
use crate::handler::Handler;
use crate::method::Method;
use crate::middleware::{PathTemplate, REQUEST_ID_HEADER, RequestId};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so they chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Chain<HttpContext>>>,
    prefix: Chain<HttpContext>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), prefix: Chain::new() }
    }

    /// Registers a single-handler route.
    ///
    /// Templates use `:name` (or `{name}`) parameter segments. Matching picks
    /// the chain; extracting parameters is left to
    /// [`path_parser`](crate::middleware::path_parser).
    ///
    /// ```rust
    /// use quill::{HttpContext, Method, Router, Signal, Status};
    ///
    /// async fn ping(ctx: HttpContext) -> Signal<HttpContext> {
    ///     ctx.respond(Status::Ok, "pong")
    /// }
    ///
    /// let router = Router::new().on(Method::Get, "/ping", ping);
    /// ```
    pub fn on(self, method: Method, template: &str, handler: impl Handler<HttpContext>) -> Self {
        self.route(method, template, Chain::new().then(handler))
    }

    /// Registers a full chain for a method + template pair.
    ///
    /// # Panics
    ///
    /// Panics if the template conflicts with one already registered for
    /// `method`.
    pub fn route(mut self, method: Method, template: &str, chain: Chain<HttpContext>) -> Self {
        let path = PathTemplate::parse(template).to_matchit();
        self.routes
            .entry(method)
            .or_default()
            .insert(path, chain)
            .unwrap_or_else(|e| panic!("invalid route `{template}`: {e}"));
        self
    }

    /// Appends `handler` to the prefix chain run before every route.
    pub fn layer(mut self, handler: impl Handler<HttpContext>) -> Self {
        self.prefix = self.prefix.then(handler);
        self
    }

    fn lookup(&self, method: Method, path: &str) -> Option<&Chain<HttpContext>> {
        let tree = self.routes.get(&method)?;
        let trimmed = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        tree.at(trimmed).ok().map(|matched| matched.value)
    }

    /// Runs `request` through the prefix chain and its route chain.
    ///
    /// Everything runs inside a `request` span carrying the method, the path
    /// and, once the prefix chain has set it, the [`RequestId`]. Unknown
    /// routes answer `404` after the prefix chain. A failed chain answers
    /// `500` with the error text.
    pub async fn handle(&self, request: Request) -> Response {
        let started = Instant::now();
        let method = request.method();
        let path = request.path().to_owned();
        let span = info_span!("request", %method, %path, request_id = field::Empty);

        async move {
            let (response, outcome) = self.run(HttpContext::new(request)).await;
            info!(
                status = response.status().code(),
                outcome,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request"
            );
            response
        }
        .instrument(span)
        .await
    }

    async fn run(&self, ctx: HttpContext) -> (Response, &'static str) {
        let mut ctx = match self.prefix.run(ctx).await {
            Outcome::Completed(ctx) => ctx,
            stopped => return finish(stopped),
        };
        let request_id = ctx.extras.get::<RequestId>().cloned();
        if let Some(id) = &request_id {
            Span::current().record("request_id", id.as_str());
        }

        let (mut response, label) = match self.lookup(ctx.request.method(), ctx.request.path()) {
            Some(chain) => finish(chain.run(ctx).await),
            None => {
                ctx.response.set_text(Status::NotFound, "not found");
                (ctx.response, "unrouted")
            }
        };
        // A failed chain drops its context, so the 500 needs the id again.
        if let Some(RequestId(id)) = request_id {
            if response.header(REQUEST_ID_HEADER).is_none() {
                response.set_header(REQUEST_ID_HEADER, id);
            }
        }
        (response, label)
    }
}

fn finish(outcome: Outcome<HttpContext>) -> (Response, &'static str) {
    let label = outcome.label();
    let response = match outcome {
        Outcome::Completed(ctx) | Outcome::Halted { ctx, .. } => ctx.response,
        Outcome::Failed { error, at } => {
            error!(at, "handler failed: {error}");
            Response::text(Status::InternalServerError, error.to_string())
        }
    };
    (response, label)
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
