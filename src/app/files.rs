//! `/file`: signed bucket URLs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Resources, require_param, respond_json};
use crate::{HttpContext, Signal, Status};

/// A bucket object name and a signed URL for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRef {
    pub name: String,
    pub url: String,
}

/// `POST /file`: an upload URL for the named file.
pub async fn upload(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    let mut file: FileRef = match serde_json::from_slice(ctx.request.body()) {
        Ok(file) => file,
        Err(e) => return ctx.respond(Status::BadRequest, format!("error un-marshalling:{e}")),
    };
    match res.bucket.upload_url(&file.name, res.url_expiry).await {
        Ok(url) => {
            file.url = url;
            respond_json(ctx, &file)
        }
        Err(e) => ctx.respond(Status::BadRequest, format!("error Putting:{e}")),
    }
}

/// `GET /file`: every stored file with a download URL. Files whose URL
/// cannot be signed are left out.
pub async fn list(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    let names = match res.bucket.files().await {
        Ok(names) => names,
        Err(e) => return ctx.respond(Status::BadRequest, e.to_string()),
    };

    let mut refs = Vec::with_capacity(names.len());
    for name in names {
        match res.bucket.download_url(&name, res.url_expiry).await {
            Ok(url) => refs.push(FileRef { name, url }),
            Err(e) => debug!(%name, "skipping file: {e}"),
        }
    }
    respond_json(ctx, &refs)
}

/// `GET /file/:name`
pub async fn download(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    let (name, ctx) = match require_param(ctx, "name") {
        Ok(found) => found,
        Err(signal) => return signal,
    };
    match res.bucket.download_url(&name, res.url_expiry).await {
        Ok(url) => respond_json(ctx, &FileRef { name, url }),
        Err(e) => ctx.respond(Status::BadRequest, format!("error Getting:{e}")),
    }
}
