//! Runtime configuration.
//!
//! Sources, later ones winning: built-in defaults, an optional `quill.toml`
//! (or `.yaml`, `.json`) in the working directory, then `QUILL__*`
//! environment variables such as `QUILL__PORT=8080`.

use std::net::SocketAddr;
use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json_logs: bool,

    /// Facts buffered ahead of the writer before new ones are dropped.
    #[serde(default = "default_fact_buffer")]
    pub fact_buffer: usize,

    #[serde(default = "default_schedule_interval_secs")]
    pub schedule_interval_secs: u64,

    /// Tasks taken from the queue per schedule tick.
    #[serde(default = "default_queue_batch")]
    pub queue_batch: usize,

    /// Lifetime of signed bucket URLs.
    #[serde(default = "default_url_expiry_secs")]
    pub url_expiry_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            log_level: default_log_level(),
            json_logs: false,
            fact_buffer: default_fact_buffer(),
            schedule_interval_secs: default_schedule_interval_secs(),
            queue_batch: default_queue_batch(),
            url_expiry_secs: default_url_expiry_secs(),
        }
    }
}

impl AppConfig {
    /// Loads from the optional `quill` file and `QUILL__*` variables.
    pub fn load() -> Result<Self, Error> {
        Self::from_builder(
            config::Config::builder()
                .add_source(File::with_name("quill").required(false))
                .add_source(Environment::with_prefix("QUILL").separator("__").try_parsing(true)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, Error> {
        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        let addr = format!("{}:{}", self.bind_addr, self.port);
        addr.parse().map_err(|source| Error::Addr { addr, source })
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs)
    }

    pub fn url_expiry(&self) -> Duration {
        Duration::from_secs(self.url_expiry_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fact_buffer() -> usize {
    1024
}

fn default_schedule_interval_secs() -> u64 {
    60
}

fn default_queue_batch() -> usize {
    10
}

fn default_url_expiry_secs() -> u64 {
    3600
}
