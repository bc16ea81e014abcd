//! Best-effort audit trail.
//!
//! Recording a [`Fact`] never fails from the caller's point of view. A write
//! that goes wrong is logged and forgotten; the request that caused it has
//! already been answered or is about to be.
//!
//! Two ways in:
//!
//! - [`record_fact`] writes straight to a sink and awaits the one write.
//! - [`FactRecorder`] hands the fact to a background writer through a
//!   bounded buffer and returns immediately. When the buffer is full the new
//!   fact is dropped and counted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::fact::Fact;
use crate::platform::DocumentStore;

/// Builds a [`Fact`] and writes it to `sink` under its id.
///
/// Encoding and write failures are logged, never returned.
pub async fn record_fact(sink: &dyn DocumentStore, source: &str, action: &str, data: &str) {
    write_fact(sink, &Fact::new(source, action, data)).await;
}

async fn write_fact(sink: &dyn DocumentStore, fact: &Fact) -> bool {
    let doc = match fact.to_document() {
        Ok(doc) => doc,
        Err(e) => {
            error!(fact_id = %fact.id, "error encoding fact: {e}");
            return false;
        }
    };
    match sink.set(&fact.id, doc).await {
        Ok(()) => {
            debug!(fact_id = %fact.id, sink = sink.name(), action = %fact.action, "fact recorded");
            true
        }
        Err(e) => {
            error!(fact_id = %fact.id, sink = sink.name(), "error writing fact: {e}");
            false
        }
    }
}

enum Command {
    Write(Fact),
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle feeding the background fact writer.
#[derive(Clone)]
pub struct FactRecorder {
    tx: mpsc::Sender<Command>,
    dropped: Arc<AtomicU64>,
}

/// The background writer started by [`FactRecorder::spawn`].
pub struct FactWriter {
    handle: JoinHandle<u64>,
}

impl FactRecorder {
    /// Starts a writer task that owns `sink`, buffering up to `capacity`
    /// facts (at least one).
    pub fn spawn(sink: Arc<dyn DocumentStore>, capacity: usize) -> (FactRecorder, FactWriter) {
        let (tx, mut rx) = mpsc::channel(capacity.max(1));

        let handle = tokio::spawn(async move {
            let mut attempted = 0u64;
            while let Some(command) = rx.recv().await {
                match command {
                    Command::Write(fact) => {
                        write_fact(sink.as_ref(), &fact).await;
                        attempted += 1;
                    }
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!(attempted, "fact writer stopped");
            attempted
        });

        let recorder = FactRecorder { tx, dropped: Arc::new(AtomicU64::new(0)) };
        (recorder, FactWriter { handle })
    }

    /// Queues a fact without waiting.
    ///
    /// Never blocks and never reports failure. A full buffer drops this fact.
    pub fn record(&self, source: &str, action: &str, data: &str) {
        let fact = Fact::new(source, action, data);
        match self.tx.try_send(Command::Write(fact)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(Command::Write(fact))) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(fact_id = %fact.id, %source, %action, dropped, "fact buffer full, fact dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(%source, %action, "fact writer gone, fact dropped");
            }
            Err(mpsc::error::TrySendError::Full(Command::Flush(_))) => {}
        }
    }

    /// Facts dropped so far because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Waits until every fact queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).await.is_err() {
            return;
        }
        let _ = wait.await;
    }
}

impl FactWriter {
    /// Resolves once every [`FactRecorder`] handle is gone and the buffer is
    /// drained. Returns how many facts the writer attempted.
    pub async fn finish(self) -> u64 {
        match self.handle.await {
            Ok(attempted) => attempted,
            Err(e) => {
                error!("fact writer aborted: {e}");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemoryCollection;

    #[tokio::test]
    async fn record_fact_writes_one_document() {
        let sink = MemoryCollection::new("history");
        record_fact(&sink, "store", "create", "{}").await;
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn finish_reports_attempted_facts() {
        let sink = Arc::new(MemoryCollection::new("history"));
        let (recorder, writer) = FactRecorder::spawn(sink.clone(), 8);
        recorder.record("a", "one", "");
        recorder.record("a", "two", "");
        drop(recorder);

        assert_eq!(writer.finish().await, 2);
        assert_eq!(sink.len().await, 2);
    }

    #[tokio::test]
    async fn facts_after_the_writer_is_gone_are_dropped_quietly() {
        let sink = Arc::new(MemoryCollection::new("history"));
        let (recorder, writer) = FactRecorder::spawn(sink.clone(), 8);
        writer.handle.abort();
        assert_eq!(writer.finish().await, 0);

        recorder.record("store", "create", "{}");
        recorder.flush().await;

        assert_eq!(recorder.dropped(), 0);
        assert_eq!(sink.len().await, 0);
    }
}
