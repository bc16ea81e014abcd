//! `/safe`: a single versioned secret.

use std::sync::Arc;

use tracing::debug;

use super::Resources;
use crate::{ContentType, HttpContext, Signal, Status};

/// `POST /safe`: stores the raw body as the next version.
pub async fn put(res: Arc<Resources>, mut ctx: HttpContext) -> Signal<HttpContext> {
    match res.safe.put(ctx.request.body().to_vec()).await {
        Ok(version) => {
            debug!(version = %version.0, "secret stored");
            ctx.response.set_status(Status::Ok);
            ctx.next()
        }
        Err(e) => ctx.respond(Status::BadRequest, format!("error Putting:{e}")),
    }
}

/// `GET /safe`: the latest version, typed by sniffing its bytes.
pub async fn latest(res: Arc<Resources>, mut ctx: HttpContext) -> Signal<HttpContext> {
    match res.safe.latest().await {
        Ok(secret) => {
            ctx.response.set_body(ContentType::sniff(&secret.value), secret.value);
            ctx.next()
        }
        Err(e) => ctx.respond(Status::BadRequest, e.to_string()),
    }
}
