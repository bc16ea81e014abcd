//! Background consumers: the `ping` topic subscriber and the `job` schedule
//! that drains the work queue.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{Resources, bind};
use crate::message::Message;
use crate::platform::from_document;
use crate::schedule::Schedule;
use crate::{Chain, EventContext, Signal};

/// Subscribes to the topic, recording a `received event` fact per delivery.
pub fn subscribe(res: &Arc<Resources>) {
    res.topic.subscribe(Chain::new().then(bind(res, received)));
}

async fn received(res: Arc<Resources>, ctx: EventContext) -> Signal<EventContext> {
    res.recorder.record(&ctx.event.source, "received event", &ctx.data_text());
    ctx.next()
}

/// The `job` schedule: every `interval`, takes up to `batch` tasks off the
/// queue and records a `task complete` fact for each.
pub fn schedule(res: &Arc<Resources>, interval: Duration, batch: usize) -> Schedule {
    let chain = Chain::new().then(bind(res, move |res, ctx: EventContext| drain(res, ctx, batch)));
    Schedule::every("job", interval, chain)
}

async fn drain(res: Arc<Resources>, ctx: EventContext, batch: usize) -> Signal<EventContext> {
    debug!(event_id = %ctx.event.id, "scheduled tick");
    let leases = match res.queue.receive(batch).await {
        Ok(leases) => leases,
        Err(e) => return ctx.fail(e),
    };

    for lease in leases {
        let msg: Message = match from_document(lease.task.payload.clone()) {
            Ok(msg) => msg,
            Err(e) => {
                // Left uncompleted; the queue forgets it once the lease expires.
                warn!(task_id = %lease.task.id, "error decoding task payload: {e}");
                continue;
            }
        };
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                warn!(task_id = %lease.task.id, "error encoding task message: {e}");
                continue;
            }
        };

        res.recorder.record(res.queue.name(), "task complete", &json);
        if let Err(e) = res.queue.complete(&lease).await {
            warn!(task_id = %lease.task.id, "error completing task: {e}");
        }
    }
    ctx.next()
}
