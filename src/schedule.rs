//! Fixed-interval triggers.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::chain::{Chain, Outcome};
use crate::context::{Event, EventContext};

/// Runs an event chain every `interval`.
///
/// Each tick delivers an [`Event`] whose `source` is the schedule name and
/// whose data is empty.
#[derive(Clone)]
pub struct Schedule {
    name: String,
    interval: Duration,
    chain: Chain<EventContext>,
}

impl Schedule {
    pub fn every(name: impl Into<String>, interval: Duration, chain: Chain<EventContext>) -> Self {
        Self { name: name.into(), interval, chain }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one tick now.
    pub async fn fire(&self) -> Outcome<EventContext> {
        let event = Event { source: self.name.clone(), id: Uuid::new_v4().to_string(), data: Vec::new() };
        let outcome = self.chain.run(EventContext::new(event)).await;
        match &outcome {
            Outcome::Failed { error, at } => warn!(schedule = %self.name, at, "tick failed: {error}"),
            other => debug!(schedule = %self.name, outcome = other.label(), "tick done"),
        }
        outcome
    }

    /// Spawns the tick loop. The first tick comes one interval after start;
    /// ticks missed while a slow one runs are skipped.
    ///
    /// Abort the returned handle to stop the schedule.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.interval.max(Duration::from_millis(1));
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.fire().await;
            }
        })
    }
}
