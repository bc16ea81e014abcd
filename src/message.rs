//! Dispatch requests accepted by `POST /send`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which delivery path a [`Message`] takes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageType {
    Topic,
    Queue,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message type {0}")]
pub struct UnknownMessageType(pub String);

/// Case-insensitive: `"Topic"`, `"QUEUE"` and friends are accepted.
impl FromStr for MessageType {
    type Err = UnknownMessageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "topic" => Ok(Self::Topic),
            "queue" => Ok(Self::Queue),
            _ => Err(UnknownMessageType(s.to_owned())),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Topic => "topic",
            Self::Queue => "queue",
        })
    }
}

/// An inbound dispatch request. Missing fields decode to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    pub message_type: String,
    pub id: String,
    /// Seconds; honoured on the topic path only. Negative means none.
    pub delay: i64,
    pub payload_type: String,
    pub payload: String,
}

impl Message {
    pub fn kind(&self) -> Result<MessageType, UnknownMessageType> {
        self.message_type.parse()
    }

    /// Generates an id when the caller supplied none, so dispatch and later
    /// facts can be correlated.
    pub fn ensure_id(&mut self) -> &str {
        if self.id.is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        &self.id
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay.max(0) as u64)
    }
}
