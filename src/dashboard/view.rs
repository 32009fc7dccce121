use tracing::warn;

use super::buffer::MessageBuffer;
use super::decoder::EventStreamDecoder;
use crate::error::{PulseError, Result};
use crate::models::Message;

/// Stream connection state shown next to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Client-side state of one dashboard: a bounded message table fed by a single stream
#[derive(Debug)]
pub struct DashboardView {
    buffer: MessageBuffer,
    status: ConnectionStatus,
    decoder: EventStreamDecoder,
}

impl DashboardView {
    pub fn new(max_messages: usize) -> Self {
        Self {
            buffer: MessageBuffer::new(max_messages),
            status: ConnectionStatus::default(),
            decoder: EventStreamDecoder::new(),
        }
    }

    pub fn on_open(&mut self) {
        self.status = ConnectionStatus::Connected;
    }

    pub fn on_error(&mut self) {
        self.status = ConnectionStatus::Disconnected;
    }

    /// Apply one event payload
    pub fn on_data(&mut self, data: &str) -> Result<()> {
        let message: Message =
            serde_json::from_str(data).map_err(|e| PulseError::MalformedPayload(e.to_string()))?;
        self.buffer.push(message);
        Ok(())
    }

    /// Feed raw stream bytes; returns how many messages were appended.
    /// Records that are not valid messages are logged and skipped.
    pub fn ingest(&mut self, chunk: &[u8]) -> usize {
        let mut appended = 0;
        for data in self.decoder.feed(chunk) {
            match self.on_data(&data) {
                Ok(()) => appended += 1,
                Err(e) => warn!("Skipping stream record: {}", e),
            }
        }
        appended
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Plain-text rendering of the table, oldest row first
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} | Messages: {}\n", self.status, self.buffer.len()));
        out.push_str(&format!(
            "{:<15} {:<26} {:<10} MESSAGE\n",
            "ID", "TIMESTAMP", "TYPE"
        ));

        if self.buffer.is_empty() {
            out.push_str("Waiting for messages...\n");
            return out;
        }

        for m in self.buffer.iter() {
            out.push_str(&format!(
                "{:<15} {:<26} {:<10} {}\n",
                m.id, m.timestamp, m.kind, m.message
            ));
        }
        out
    }
}
