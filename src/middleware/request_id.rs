//! Request-id injection.

use uuid::Uuid;

use crate::context::HttpContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The id correlating one request across log lines and the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reuses an inbound `x-request-id` or generates a UUID v4, stores it as
/// [`RequestId`] and echoes it on the response.
pub async fn request_id(mut ctx: HttpContext) -> crate::Signal<HttpContext> {
    let id = ctx.request
        .header(REQUEST_ID_HEADER)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    ctx.response.set_header(REQUEST_ID_HEADER, id.clone());
    ctx.extras.insert(RequestId(id));
    ctx.next()
}
