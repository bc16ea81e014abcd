//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can it serve traffic? |
//!
//! ```rust
//! use quill::{Method, Router, health};
//!
//! let app = Router::new()
//!     .on(Method::Get, "/healthz", health::liveness)
//!     .on(Method::Get, "/readyz", health::readiness);
//! ```

use crate::{HttpContext, Signal, Status};

/// Always `200 OK` with body `"ok"`.
pub async fn liveness(ctx: HttpContext) -> Signal<HttpContext> {
    ctx.respond(Status::Ok, "ok")
}

/// `200 OK` with body `"ready"`. The in-memory platform needs no warm-up.
pub async fn readiness(ctx: HttpContext) -> Signal<HttpContext> {
    ctx.respond(Status::Ok, "ready")
}
