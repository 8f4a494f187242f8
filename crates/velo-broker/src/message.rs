//! Message and payload types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Topic for daemon and command notifications.
pub const TOPIC_NOTIFICATION: &str = "notification";
/// Topic for inbound chat traffic.
pub const TOPIC_CHAT: &str = "chat";
/// Topic for outbound responses.
pub const TOPIC_RESPONSE: &str = "response";
/// Wildcard token matching every topic in a subscription filter.
pub const TOPIC_WILDCARD: &str = "*";

/// A message payload, tagged by shape.
///
/// Consumers that only render text can call [`Payload::to_string`] and get
/// a sensible rendering for structured data too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    /// Plain text.
    Text(String),
    /// Structured JSON data.
    Data(serde_json::Value),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Data(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Self::Data(v)
    }
}

/// An immutable unit of broker traffic.
///
/// Messages have no identity beyond their content and are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The topic this message is published under.
    pub topic: String,
    /// The message payload.
    pub payload: Payload,
    /// The originating subscriber id.
    pub source: String,
    /// Open key/value metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Message {
    /// Create a message with an arbitrary payload.
    pub fn new(
        topic: impl Into<String>,
        source: impl Into<String>,
        payload: impl Into<Payload>,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            source: source.into(),
            metadata: HashMap::new(),
        }
    }

    /// Create a text message.
    pub fn text(
        topic: impl Into<String>,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(topic, source, Payload::Text(text.into()))
    }

    /// Create a structured-data message.
    pub fn data(
        topic: impl Into<String>,
        source: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        Self::new(topic, source, Payload::Data(value))
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
