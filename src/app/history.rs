//! `/history`: the audit trail.

use std::sync::Arc;

use super::{Resources, delete_document, respond_json};
use crate::{HttpContext, Signal, Status};

/// `GET /history`
pub async fn list(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    match res.history.query().await {
        Ok(docs) => respond_json(ctx, &docs),
        Err(e) => ctx.respond(Status::InternalServerError, format!("error querying collection: {e}")),
    }
}

/// `DELETE /history/:id`
pub async fn delete(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    delete_document(res.history.as_ref(), ctx).await
}
