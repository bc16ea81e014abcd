//! `/store`: CRUD over the store collection.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::{Resources, delete_document, require_param, respond_json};
use crate::platform::{Document, from_document, to_document};
use crate::{HttpContext, Signal, Status};

/// A document in the store collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreItem {
    pub id: String,
    pub data: String,
    /// RFC 3339, stamped on create.
    pub date_stored: String,
}

/// `POST /store`
pub async fn create(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    let mut item: StoreItem = match serde_json::from_slice(ctx.request.body()) {
        Ok(item) => item,
        Err(_) => return ctx.respond(Status::BadRequest, "error decoding json body"),
    };
    item.date_stored = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    if item.id.is_empty() {
        item.id = Uuid::new_v4().to_string();
    }

    match save(&res, &item, "create", ctx).await {
        Ok(ctx) => ctx.respond(Status::Ok, format!("Created store with ID: {}", item.id)),
        Err(signal) => signal,
    }
}

/// `GET /store`
pub async fn list(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    match res.store.query().await {
        Ok(docs) => respond_json(ctx, &docs),
        Err(e) => ctx.respond(Status::InternalServerError, format!("error querying collection: {e}")),
    }
}

/// `GET /store/:id`
pub async fn get(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    let (id, ctx) = match require_param(ctx, "id") {
        Ok(found) => found,
        Err(signal) => return signal,
    };
    match res.store.get(&id).await {
        Ok(doc) => respond_json(ctx, &doc),
        Err(_) => ctx.respond(Status::NotFound, format!("error retrieving document {id}")),
    }
}

/// `PUT /store/:id`: the path id wins over any id in the body.
pub async fn update(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    let (id, ctx) = match require_param(ctx, "id") {
        Ok(found) => found,
        Err(signal) => return signal,
    };
    let existing = match res.store.get(&id).await {
        Ok(doc) => doc,
        Err(_) => return ctx.respond(Status::NotFound, format!("error retrieving document {id}")),
    };

    let mut item: StoreItem = match serde_json::from_slice(ctx.request.body()) {
        Ok(item) => item,
        Err(_) => return ctx.respond(Status::BadRequest, "error decoding json body"),
    };
    item.id = id;
    if item.date_stored.is_empty() {
        item.date_stored = from_document::<StoreItem>(existing).map(|old| old.date_stored).unwrap_or_default();
    }

    match save(&res, &item, "update", ctx).await {
        Ok(ctx) => ctx.respond(Status::Ok, format!("Updated store with ID: {}", item.id)),
        Err(signal) => signal,
    }
}

/// `DELETE /store/:id`
pub async fn delete(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    delete_document(res.store.as_ref(), ctx).await
}

/// Upserts `item`, then records a fact `(store, action, <item json>)`.
/// `Err` carries the `400` to answer with.
async fn save(
    res: &Resources,
    item: &StoreItem,
    action: &str,
    ctx: HttpContext,
) -> Result<HttpContext, Signal<HttpContext>> {
    let doc: Document = match to_document(item) {
        Ok(doc) => doc,
        Err(_) => return Err(ctx.respond(Status::BadRequest, "error decoding store document")),
    };
    let data = Value::Object(doc.clone()).to_string();

    if let Err(e) = res.store.set(&item.id, doc).await {
        warn!(id = %item.id, "error writing store document: {e}");
        return Err(ctx.respond(Status::BadRequest, "error writing store document"));
    }
    res.recorder.record(res.store.name(), action, &data);
    Ok(ctx)
}
