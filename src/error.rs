//! Unified error type.

use crate::platform::PlatformError;

/// The error type returned by quill's fallible operations.
///
/// Request-level failures (a malformed body, a missing document) are written
/// into the [`Response`](crate::Response) by the handler and never become an
/// `Error`. This type covers what a handler hands back to the host through
/// [`Signal::Fail`](crate::Signal::Fail), plus startup failures: binding a
/// port, loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("platform: {0}")]
    Platform(#[from] PlatformError),

    #[error("config: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid address `{addr}`: {source}")]
    Addr {
        addr: String,
        source: std::net::AddrParseError,
    },
}
