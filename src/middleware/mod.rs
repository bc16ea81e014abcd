//! Middleware layer.
//!
//! Middleware is ordinary chain handlers placed ahead of (or behind) a
//! route's own handler. It is the right place for cross-cutting concerns:
//! path-parameter extraction, request-id injection, audit facts.
//!
//! Built-in middleware:
//! - [`path_parser`]: matches the path against a `:name` template and stores [`PathParams`]
//! - [`request_id`]: reuses or generates `x-request-id` and stores [`RequestId`]
//! - [`audit`]: records a [`Fact`](crate::Fact) about the request, then continues
//!
//! Because the runner halts on error responses, a middleware placed *after*
//! a route handler only runs when that handler succeeded.

mod audit;
mod params;
mod request_id;

pub use audit::audit;
pub use params::{PathParams, PathTemplate, path_parser};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id};
