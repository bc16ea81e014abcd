//! `POST /send`: forwards a [`Message`] to the topic or the queue.

use std::sync::Arc;

use tracing::info;

use super::Resources;
use crate::message::{Message, MessageType};
use crate::platform::{Task, TopicEvent, to_document};
use crate::{HttpContext, Signal, Status};

pub async fn send(res: Arc<Resources>, ctx: HttpContext) -> Signal<HttpContext> {
    let mut msg: Message = match serde_json::from_slice(ctx.request.body()) {
        Ok(msg) => msg,
        Err(_) => return ctx.respond(Status::BadRequest, "error decoding json body"),
    };
    let id = msg.ensure_id().to_owned();

    let payload = match to_document(&msg) {
        Ok(doc) => doc,
        Err(_) => return ctx.respond(Status::BadRequest, "error decoding message document"),
    };

    let sent = match msg.kind() {
        Ok(MessageType::Topic) => {
            let event = TopicEvent { id, payload_type: msg.payload_type.clone(), payload };
            res.topic.publish(event, msg.delay()).await.map_err(|e| e.to_string())
        }
        Ok(MessageType::Queue) => {
            let task = Task { id, payload_type: msg.payload_type.clone(), payload };
            res.queue.send(vec![task]).await.map_err(|e| e.to_string())
        }
        Err(unknown) => Err(unknown.to_string()),
    };
    if let Err(e) = sent {
        return ctx.respond(Status::BadRequest, format!("error sending:{e}"));
    }

    info!(message_id = %msg.id, message_type = %msg.message_type, delay = msg.delay, "message sent");
    let echoed = serde_json::to_string(&msg).unwrap_or_default();
    ctx.respond(Status::Ok, format!("Run action : {echoed}"))
}
