//! Audit middleware.

use crate::context::HttpContext;
use crate::handler::Handler;
use crate::recorder::FactRecorder;

/// Records a fact `(source, action, data)` and continues.
///
/// `data` is the request body, or the request path when the body is empty.
/// Placed after a route handler it only runs when that handler succeeded,
/// since an error response halts the chain first.
pub fn audit(recorder: FactRecorder, source: &str, action: &str) -> impl Handler<HttpContext> + use<> {
    let source = source.to_owned();
    let action = action.to_owned();
    move |ctx: HttpContext| {
        let data = if ctx.request.body().is_empty() {
            ctx.request.path().to_owned()
        } else {
            ctx.request.body_text().into_owned()
        };
        recorder.record(&source, &action, &data);
        std::future::ready(ctx.next())
    }
}
