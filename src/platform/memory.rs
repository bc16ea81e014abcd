//! In-process stand-ins for the platform resources.
//!
//! Good enough to run the functions on a laptop and in tests: no
//! persistence, no redelivery of abandoned leases, no delivery retries.
//! An abandoned lease is forgotten once it expires.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{PoisonError, RwLock as StdRwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    Bucket, Document, DocumentStore, Lease, PlatformError, Queue, SecretStore, SecretValue,
    SecretVersion, Task, Topic, TopicEvent,
};
use crate::chain::{Chain, Outcome};
use crate::context::{Event, EventContext};

// ── Collection ────────────────────────────────────────────────────────────────

/// A document collection kept in a `BTreeMap`, so queries list by id.
pub struct MemoryCollection {
    name: String,
    docs: RwLock<BTreeMap<String, Document>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), docs: RwLock::new(BTreeMap::new()) }
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set(&self, id: &str, doc: Document) -> Result<(), PlatformError> {
        self.docs.write().await.insert(id.to_owned(), doc);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Document, PlatformError> {
        self.docs.read().await.get(id).cloned().ok_or_else(|| PlatformError::NotFound {
            kind: "document",
            id: id.to_owned(),
        })
    }

    async fn delete(&self, id: &str) -> Result<(), PlatformError> {
        match self.docs.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(PlatformError::NotFound { kind: "document", id: id.to_owned() }),
        }
    }

    async fn query(&self) -> Result<Vec<Document>, PlatformError> {
        Ok(self.docs.read().await.values().cloned().collect())
    }
}

// ── Queue ─────────────────────────────────────────────────────────────────────

/// How long a received task may stay uncompleted before its lease is dropped.
pub const DEFAULT_LEASE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Task>,
    leased: HashMap<String, (Task, Instant)>,
}

/// A FIFO queue. Received tasks stay leased until completed or until their
/// lease expires, whichever comes first.
pub struct MemoryQueue {
    name: String,
    lease_timeout: Duration,
    state: Mutex<QueueState>,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lease_timeout: DEFAULT_LEASE_TIMEOUT,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn with_lease_timeout(mut self, timeout: Duration) -> Self {
        self.lease_timeout = timeout;
        self
    }

    /// Tasks waiting to be received.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Tasks received but not yet completed.
    pub async fn leased(&self) -> usize {
        self.state.lock().await.leased.len()
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, tasks: Vec<Task>) -> Result<(), PlatformError> {
        self.state.lock().await.pending.extend(tasks);
        Ok(())
    }

    async fn receive(&self, depth: usize) -> Result<Vec<Lease>, PlatformError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.leased.retain(|lease_id, (task, expires)| {
            let live = *expires > now;
            if !live {
                warn!(queue = %self.name, %lease_id, task_id = %task.id, "lease expired, task abandoned");
            }
            live
        });

        let take = depth.min(state.pending.len());
        let tasks: Vec<Task> = state.pending.drain(..take).collect();

        let leases = tasks.into_iter()
            .map(|task| Lease { lease_id: Uuid::new_v4().to_string(), task })
            .collect::<Vec<_>>();
        let expires = now + self.lease_timeout;
        for lease in &leases {
            state.leased.insert(lease.lease_id.clone(), (lease.task.clone(), expires));
        }
        Ok(leases)
    }

    async fn complete(&self, lease: &Lease) -> Result<(), PlatformError> {
        match self.state.lock().await.leased.remove(&lease.lease_id) {
            Some(_) => Ok(()),
            None => Err(PlatformError::NotFound { kind: "lease", id: lease.lease_id.clone() }),
        }
    }
}

// ── Topic ─────────────────────────────────────────────────────────────────────

/// A topic that delivers each event to every subscriber on its own task.
pub struct MemoryTopic {
    name: String,
    subscribers: StdRwLock<Vec<Chain<EventContext>>>,
}

impl MemoryTopic {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), subscribers: StdRwLock::new(Vec::new()) }
    }
}

#[async_trait]
impl Topic for MemoryTopic {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, event: TopicEvent, delay: Duration) -> Result<(), PlatformError> {
        let data = serde_json::to_vec(&event.payload)
            .map_err(|e| PlatformError::Unavailable(format!("encoding event {}: {e}", event.id)))?;

        let subscribers = self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if subscribers.is_empty() {
            debug!(topic = %self.name, event_id = %event.id, "no subscribers, event dropped");
        }

        for chain in subscribers {
            let delivered = Event { source: self.name.clone(), id: event.id.clone(), data: data.clone() };
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let event_id = delivered.id.clone();
                if let Outcome::Failed { error, at } = chain.run(EventContext::new(delivered)).await {
                    warn!(%event_id, at, "subscriber failed: {error}");
                }
            });
        }
        Ok(())
    }

    fn subscribe(&self, chain: Chain<EventContext>) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chain);
    }
}

// ── Secret ────────────────────────────────────────────────────────────────────

/// A secret whose versions are numbered from 1.
pub struct MemorySecret {
    name: String,
    versions: Mutex<Vec<Vec<u8>>>,
}

impl MemorySecret {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), versions: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl SecretStore for MemorySecret {
    async fn put(&self, value: Vec<u8>) -> Result<SecretVersion, PlatformError> {
        let mut versions = self.versions.lock().await;
        versions.push(value);
        Ok(SecretVersion(versions.len().to_string()))
    }

    async fn latest(&self) -> Result<SecretValue, PlatformError> {
        let versions = self.versions.lock().await;
        match versions.last() {
            Some(value) => Ok(SecretValue {
                version: SecretVersion(versions.len().to_string()),
                value: value.clone(),
            }),
            None => Err(PlatformError::NotFound { kind: "secret", id: format!("{}/latest", self.name) }),
        }
    }
}

// ── Bucket ────────────────────────────────────────────────────────────────────

/// A bucket whose "signed" URLs use a `memory://` scheme.
pub struct MemoryBucket {
    name: String,
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), files: RwLock::new(BTreeMap::new()) }
    }

    /// Stores an object directly, standing in for a client using an upload URL.
    pub async fn write(&self, name: &str, contents: Vec<u8>) {
        self.files.write().await.insert(name.to_owned(), contents);
    }

    fn signed_url(&self, name: &str, op: &str, expiry: Duration) -> String {
        format!("memory://{}/{name}?op={op}&expires={}", self.name, expiry.as_secs())
    }
}

#[async_trait]
impl Bucket for MemoryBucket {
    async fn upload_url(&self, name: &str, expiry: Duration) -> Result<String, PlatformError> {
        if name.is_empty() {
            return Err(PlatformError::Unavailable("file name must not be empty".to_owned()));
        }
        Ok(self.signed_url(name, "write", expiry))
    }

    async fn download_url(&self, name: &str, expiry: Duration) -> Result<String, PlatformError> {
        if !self.files.read().await.contains_key(name) {
            return Err(PlatformError::NotFound { kind: "file", id: name.to_owned() });
        }
        Ok(self.signed_url(name, "read", expiry))
    }

    async fn files(&self) -> Result<Vec<String>, PlatformError> {
        Ok(self.files.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn collection_set_get_delete() {
        let col = MemoryCollection::new("store");
        col.set("a", doc(json!({"id": "a"}))).await.unwrap();
        assert_eq!(col.get("a").await.unwrap().get("id"), Some(&json!("a")));

        col.delete("a").await.unwrap();
        assert!(col.get("a").await.unwrap_err().is_not_found());
        assert!(col.delete("a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn queue_leases_until_completed() {
        let queue = MemoryQueue::new("work");
        let task = |id: &str| Task { id: id.into(), payload_type: "None".into(), payload: Document::new() };
        queue.send(vec![task("1"), task("2"), task("3")]).await.unwrap();

        let leases = queue.receive(2).await.unwrap();
        assert_eq!(leases.iter().map(|l| l.task.id.as_str()).collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(queue.pending().await, 1);
        assert_eq!(queue.leased().await, 2);

        queue.complete(&leases[0]).await.unwrap();
        assert_eq!(queue.leased().await, 1);
        assert!(queue.complete(&leases[0]).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_leases_are_forgotten() {
        let queue = MemoryQueue::new("work").with_lease_timeout(Duration::from_secs(30));
        let task = |id: &str| Task { id: id.into(), payload_type: "None".into(), payload: Document::new() };
        queue.send(vec![task("stuck")]).await.unwrap();

        let abandoned = queue.receive(1).await.unwrap();
        assert_eq!(queue.leased().await, 1);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(queue.receive(1).await.unwrap().is_empty());
        assert_eq!(queue.leased().await, 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(queue.receive(1).await.unwrap().is_empty());
        assert_eq!(queue.leased().await, 0);
        assert_eq!(queue.pending().await, 0);
        assert!(queue.complete(&abandoned[0]).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn empty_secret_has_no_latest() {
        let secret = MemorySecret::new("safe");
        assert!(secret.latest().await.unwrap_err().is_not_found());

        secret.put(b"one".to_vec()).await.unwrap();
        let v2 = secret.put(b"two".to_vec()).await.unwrap();
        let latest = secret.latest().await.unwrap();
        assert_eq!(latest.version, v2);
        assert_eq!(latest.value, b"two");
    }

    #[tokio::test]
    async fn bucket_signs_only_existing_downloads() {
        let bucket = MemoryBucket::new("files");
        let expiry = Duration::from_secs(3600);
        assert_eq!(
            bucket.upload_url("a.txt", expiry).await.unwrap(),
            "memory://files/a.txt?op=write&expires=3600"
        );
        assert!(bucket.download_url("a.txt", expiry).await.is_err());

        bucket.write("a.txt", b"hi".to_vec()).await;
        assert!(bucket.download_url("a.txt", expiry).await.is_ok());
        assert_eq!(bucket.files().await.unwrap(), ["a.txt"]);
    }
}
