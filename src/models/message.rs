use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Well-known message kinds
pub mod kind {
    pub const SYSTEM: &str = "system";
    pub const DATA: &str = "data";
    pub const RECEIVED: &str = "received";
}

pub const CONNECTION_ESTABLISHED: &str = "Connection established";
pub const SINGLE_MESSAGE_RESPONSE: &str = "Single message response";
pub const DEFAULT_PUBLISHED_TEXT: &str = "Message received";

/// A relayed message, identical on the publish response and on every stream frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    /// RFC 3339 with millisecond precision, always UTC (`Z`)
    pub timestamp: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(id: i64, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message: message.into(),
            kind: kind.into(),
        }
    }

    /// First frame on every new subscription
    pub fn connection_established(id: i64) -> Self {
        Self::new(id, kind::SYSTEM, CONNECTION_ESTABLISHED)
    }

    /// Placeholder returned by a non-streaming `GET`
    pub fn single_response(id: i64) -> Self {
        Self::new(id, kind::DATA, SINGLE_MESSAGE_RESPONSE)
    }

    /// Normalize an accepted publish. Missing or empty fields fall back to defaults.
    pub fn from_publish(id: i64, request: PublishRequest) -> Self {
        let message = request
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_PUBLISHED_TEXT.to_string());
        let kind = request
            .kind
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| kind::RECEIVED.to_string());

        Self::new(id, kind, message)
    }
}

/// Body of `POST /message`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishRequest {
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Time-derived message ids.
///
/// Ids are the current Unix time in milliseconds, bumped past the previous id
/// when two messages land in the same millisecond so they stay unique and increasing.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last: AtomicI64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);

        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}
