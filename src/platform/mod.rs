//! Collaborators the functions call into.
//!
//! Collections, queues, topics, secrets and buckets belong to the managed
//! platform; quill only consumes them through these traits. Durability,
//! redelivery and ordering are the platform's business. The
//! [`memory`] backends exist so the functions run locally and under test.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::chain::Chain;
use crate::context::EventContext;

pub mod memory;

/// A stored document: field name → JSON value.
pub type Document = serde_json::Map<String, Value>;

/// Projects a struct into a [`Document`]; serde field names become keys verbatim.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "expected a JSON object, got `{other}`"
        ))),
    }
}

/// Inverse of [`to_document`].
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(doc))
}

/// Failure reported by a platform resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    #[error("resource unavailable: {0}")]
    Unavailable(String),
}

impl PlatformError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A keyed document collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    /// Upserts `doc` under `id`.
    async fn set(&self, id: &str, doc: Document) -> Result<(), PlatformError>;

    async fn get(&self, id: &str) -> Result<Document, PlatformError>;

    /// Fails with [`PlatformError::NotFound`] when `id` is absent.
    async fn delete(&self, id: &str) -> Result<(), PlatformError>;

    /// Every document in the collection.
    async fn query(&self) -> Result<Vec<Document>, PlatformError>;
}

/// A unit of work on a [`Queue`].
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub payload_type: String,
    pub payload: Document,
}

/// A received task awaiting [`Queue::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct Lease {
    pub lease_id: String,
    pub task: Task,
}

/// A work queue.
#[async_trait]
pub trait Queue: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, tasks: Vec<Task>) -> Result<(), PlatformError>;

    /// Leases up to `depth` tasks.
    async fn receive(&self, depth: usize) -> Result<Vec<Lease>, PlatformError>;

    async fn complete(&self, lease: &Lease) -> Result<(), PlatformError>;
}

/// A message published on a [`Topic`].
#[derive(Debug, Clone, PartialEq)]
pub struct TopicEvent {
    pub id: String,
    pub payload_type: String,
    pub payload: Document,
}

/// A pub/sub topic. Subscribers are event chains.
#[async_trait]
pub trait Topic: Send + Sync {
    fn name(&self) -> &str;

    /// Publishes `event`, delivered to subscribers after `delay`.
    async fn publish(&self, event: TopicEvent, delay: Duration) -> Result<(), PlatformError>;

    fn subscribe(&self, chain: Chain<EventContext>);
}

/// Identifies one stored secret value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretVersion(pub String);

/// A secret value read back from a [`SecretStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretValue {
    pub version: SecretVersion,
    pub value: Vec<u8>,
}

/// A versioned secret.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn put(&self, value: Vec<u8>) -> Result<SecretVersion, PlatformError>;

    /// The latest version's value.
    async fn latest(&self) -> Result<SecretValue, PlatformError>;
}

/// An object bucket handing out signed URLs.
#[async_trait]
pub trait Bucket: Send + Sync {
    async fn upload_url(&self, name: &str, expiry: Duration) -> Result<String, PlatformError>;

    async fn download_url(&self, name: &str, expiry: Duration) -> Result<String, PlatformError>;

    /// Names of every stored object.
    async fn files(&self) -> Result<Vec<String>, PlatformError>;
}
