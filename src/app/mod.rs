//! The demo functions and the resources they share.
//!
//! Every handler here takes the shared [`Resources`] plus its context.
//! [`api`] wires them into a [`Router`]; [`worker`] holds the topic
//! subscriber and the queue-draining schedule.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::AppConfig;
use crate::context::HttpContext;
use crate::handler::{Handler, Signal};
use crate::method::Method;
use crate::middleware::{audit, path_parser, request_id};
use crate::platform::memory::{MemoryBucket, MemoryCollection, MemoryQueue, MemorySecret, MemoryTopic};
use crate::platform::{Bucket, DocumentStore, Queue, SecretStore, Topic};
use crate::recorder::{FactRecorder, FactWriter};
use crate::router::Router;
use crate::status::Status;
use crate::{Chain, health};

mod dispatch;
mod documents;
mod files;
mod history;
mod vault;
pub mod worker;

pub use documents::StoreItem;
pub use files::FileRef;

/// Platform handles, built once at startup and read-only afterwards.
pub struct Resources {
    pub store: Arc<dyn DocumentStore>,
    pub history: Arc<dyn DocumentStore>,
    pub queue: Arc<dyn Queue>,
    pub topic: Arc<dyn Topic>,
    pub safe: Arc<dyn SecretStore>,
    pub bucket: Arc<dyn Bucket>,
    /// Feeds the `history` collection.
    pub recorder: FactRecorder,
    /// Lifetime of signed bucket URLs.
    pub url_expiry: Duration,
}

impl Resources {
    /// Every resource backed by [`memory`](crate::platform::memory), with
    /// the fact writer draining into `history`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn in_memory(config: &AppConfig) -> (Arc<Resources>, FactWriter) {
        let history: Arc<dyn DocumentStore> = Arc::new(MemoryCollection::new("history"));
        let (recorder, writer) = FactRecorder::spawn(Arc::clone(&history), config.fact_buffer);

        let resources = Resources {
            store: Arc::new(MemoryCollection::new("store")),
            history,
            queue: Arc::new(MemoryQueue::new("work")),
            topic: Arc::new(MemoryTopic::new("ping")),
            safe: Arc::new(MemorySecret::new("safe")),
            bucket: Arc::new(MemoryBucket::new("files")),
            recorder,
            url_expiry: config.url_expiry(),
        };
        (Arc::new(resources), writer)
    }
}

/// Adapts `f(resources, ctx)` into a chain handler.
pub(crate) fn bind<C, F, Fut>(res: &Arc<Resources>, f: F) -> impl Handler<C> + use<C, F, Fut>
where
    C: Send + 'static,
    F: Fn(Arc<Resources>, C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Signal<C>> + Send + 'static,
{
    let res = Arc::clone(res);
    move |ctx: C| f(Arc::clone(&res), ctx)
}

/// The HTTP surface.
pub fn api(res: &Arc<Resources>) -> Router {
    let store = res.store.name().to_owned();

    Router::new()
        .layer(request_id)
        .on(Method::Get, "/history", bind(res, history::list))
        .route(
            Method::Delete,
            "/history/:id",
            Chain::new().then(path_parser("/history/:id")).then(bind(res, history::delete)),
        )
        .on(Method::Post, "/send", bind(res, dispatch::send))
        .on(Method::Post, "/safe", bind(res, vault::put))
        .on(Method::Get, "/safe", bind(res, vault::latest))
        .on(Method::Post, "/store", bind(res, documents::create))
        .route(
            Method::Get,
            "/store",
            Chain::new()
                .then(bind(res, documents::list))
                .then(audit(res.recorder.clone(), &store, "list")),
        )
        .route(
            Method::Get,
            "/store/:id",
            Chain::new().then(path_parser("/store/:id")).then(bind(res, documents::get)),
        )
        .route(
            Method::Put,
            "/store/:id",
            Chain::new().then(path_parser("/store/:id")).then(bind(res, documents::update)),
        )
        .route(
            Method::Delete,
            "/store/:id",
            Chain::new()
                .then(path_parser("/store/:id"))
                .then(bind(res, documents::delete))
                .then(audit(res.recorder.clone(), &store, "delete")),
        )
        .on(Method::Post, "/file", bind(res, files::upload))
        .on(Method::Get, "/file", bind(res, files::list))
        .route(
            Method::Get,
            "/file/:name",
            Chain::new().then(path_parser("/file/:name")).then(bind(res, files::download)),
        )
        .on(Method::Get, "/healthz", health::liveness)
        .on(Method::Get, "/readyz", health::readiness)
}

// ── Shared response helpers ───────────────────────────────────────────────────

/// `200` with `value` as JSON; an encoding failure answers `400`.
fn respond_json<T: Serialize + ?Sized>(mut ctx: HttpContext, value: &T) -> Signal<HttpContext> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            ctx.response.set_status(Status::Ok);
            ctx.response.set_json(body);
            ctx.next()
        }
        Err(e) => ctx.respond(Status::BadRequest, e.to_string()),
    }
}

/// The named path parameter, or the `400` every parameterised route
/// answers when it is missing.
fn require_param(ctx: HttpContext, name: &str) -> Result<(String, HttpContext), Signal<HttpContext>> {
    match ctx.param(name) {
        Some(value) => Ok((value.to_owned(), ctx)),
        None => Err(ctx.respond(Status::BadRequest, "error retrieving path params")),
    }
}

/// Deletes document `:id` from `collection`: `204`, `404` when absent,
/// `400` on any other failure.
async fn delete_document(collection: &dyn DocumentStore, ctx: HttpContext) -> Signal<HttpContext> {
    let (id, mut ctx) = match require_param(ctx, "id") {
        Ok(found) => found,
        Err(signal) => return signal,
    };

    match collection.delete(&id).await {
        Ok(()) => {
            ctx.response.set_status(Status::NoContent);
            ctx.next()
        }
        Err(e) if e.is_not_found() => ctx.respond(Status::NotFound, format!("error deleting document {id}")),
        Err(e) => {
            tracing::warn!(collection = collection.name(), %id, "delete failed: {e}");
            ctx.respond(Status::BadRequest, format!("error deleting document {id}"))
        }
    }
}
