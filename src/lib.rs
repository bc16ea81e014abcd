//! # quill
//!
//! Serverless-style demo functions built on two small pieces of machinery:
//!
//! - a **middleware chain runner**: an ordered list of handlers sharing one
//!   exclusively owned context, any of which can stop the chain
//!   ([`Chain`], [`Signal`], [`Outcome`]);
//! - a **fact recorder**: a best-effort audit trail whose failures never
//!   reach the request that caused them ([`record_fact`], [`FactRecorder`]).
//!
//! The functions ([`app`]) talk to document collections, a queue, a topic, a
//! secret and a bucket through the traits in [`platform`]. In-memory
//! backends stand in for the managed platform.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use quill::{AppConfig, Server, app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quill::Error> {
//!     let config = AppConfig::default();
//!     let (resources, _writer) = app::Resources::in_memory(&config);
//!     app::worker::subscribe(&resources);
//!
//!     Server::bind(config.socket_addr()?).serve(app::api(&resources)).await
//! }
//! ```

mod chain;
mod config;
mod context;
mod error;
mod fact;
mod handler;
mod message;
mod method;
mod recorder;
mod request;
mod response;
mod router;
mod schedule;
mod server;
mod status;

pub mod app;
pub mod health;
pub mod middleware;
pub mod platform;

pub use chain::{Chain, ChainContext, Outcome};
pub use config::AppConfig;
pub use context::{Event, EventContext, HttpContext};
pub use error::Error;
pub use fact::Fact;
pub use handler::{Handler, Signal};
pub use message::{Message, MessageType, UnknownMessageType};
pub use method::{Method, UnsupportedMethod};
pub use recorder::{FactRecorder, FactWriter, record_fact};
pub use request::Request;
pub use response::{ContentType, Response};
pub use router::Router;
pub use schedule::Schedule;
pub use server::Server;
pub use status::Status;
