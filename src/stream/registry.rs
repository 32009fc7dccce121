//! Connection registry and fan-out broadcast
//!
//! Every open subscriber owns one bounded channel. The registry keeps the
//! sending halves and writes each broadcast frame to all of them without
//! awaiting, so a publish finishes once every channel has been attempted.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PulseError, Result};
use crate::models::Message;

/// A serialized message, shared by every channel it is written to
pub type Frame = Arc<str>;

/// Identifier of a single subscriber channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Channels that accepted the frame
    pub delivered: usize,
    /// Live channels whose buffer was full; they miss this frame only
    pub dropped: usize,
    /// Channels found closed and removed
    pub pruned: usize,
}

enum Delivery {
    Sent,
    Dropped,
}

/// Process-wide set of open subscriber channels
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    channels: Arc<DashMap<ChannelId, mpsc::Sender<Frame>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel. Returns `false` and keeps the existing sender if `id` is already registered.
    pub fn register(&self, id: ChannelId, sender: mpsc::Sender<Frame>) -> bool {
        match self.channels.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(sender);
                debug!("Registered channel {} ({} total)", id, self.channels.len());
                true
            }
        }
    }

    /// Remove a channel. Unknown ids are ignored.
    pub fn unregister(&self, id: ChannelId) -> bool {
        if self.channels.remove(&id).is_some() {
            debug!(
                "Unregistered channel {} ({} remaining)",
                id,
                self.channels.len()
            );
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: ChannelId) -> bool {
        self.channels.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Serialize `message` once and write it to every registered channel.
    ///
    /// Closed channels are unregistered after the pass; one failing channel
    /// never stops delivery to the rest.
    pub fn broadcast(&self, message: &Message) -> Result<BroadcastReport> {
        let frame: Frame = serde_json::to_string(message)?.into();
        let mut report = BroadcastReport::default();
        let mut closed = Vec::new();

        // Shard locks are held while iterating, so removal waits until after the loop.
        for entry in self.channels.iter() {
            match deliver(entry.value(), &frame) {
                Ok(Delivery::Sent) => report.delivered += 1,
                Ok(Delivery::Dropped) => {
                    warn!(
                        "Channel {} buffer full, dropping message {}",
                        entry.key(),
                        message.id
                    );
                    report.dropped += 1;
                }
                Err(_) => closed.push(*entry.key()),
            }
        }

        for id in closed {
            if self.unregister(id) {
                report.pruned += 1;
            }
        }

        debug!(
            "Broadcast message {}: {} delivered, {} dropped, {} pruned",
            message.id, report.delivered, report.dropped, report.pruned
        );

        Ok(report)
    }
}

fn deliver(sender: &mpsc::Sender<Frame>, frame: &Frame) -> Result<Delivery> {
    match sender.try_send(Arc::clone(frame)) {
        Ok(()) => Ok(Delivery::Sent),
        Err(TrySendError::Full(_)) => Ok(Delivery::Dropped),
        Err(TrySendError::Closed(_)) => Err(PulseError::ChannelClosed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::kind;

    fn channel(buffer: usize) -> (ChannelId, mpsc::Sender<Frame>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(buffer);
        (ChannelId::new(), tx, rx)
    }

    fn decode(frame: Frame) -> Message {
        serde_json::from_str(&frame).unwrap()
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (id, tx, _rx) = channel(4);

        assert!(registry.register(id, tx.clone()));
        assert!(!registry.register(id, tx));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id));
    }

    #[test]
    fn test_unregister_unknown_and_repeated() {
        let registry = ConnectionRegistry::new();
        let (id, tx, _rx) = channel(4);

        assert!(!registry.unregister(id));

        registry.register(id, tx);
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_reaches_every_channel_once() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (id, tx, rx) = channel(4);
            registry.register(id, tx);
            receivers.push(rx);
        }

        let msg = Message::new(1, kind::DATA, "hi");
        let report = registry.broadcast(&msg).unwrap();

        assert_eq!(report.delivered, 3);
        assert_eq!(report.pruned, 0);
        for rx in receivers.iter_mut() {
            assert_eq!(decode(rx.try_recv().unwrap()), msg);
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_broadcast_preserves_order_per_channel() {
        let registry = ConnectionRegistry::new();
        let (id, tx, mut rx) = channel(8);
        registry.register(id, tx);

        for i in 1..=3 {
            registry
                .broadcast(&Message::new(i, kind::DATA, format!("m{}", i)))
                .unwrap();
        }

        let ids: Vec<i64> = (0..3).map(|_| decode(rx.try_recv().unwrap()).id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_broadcast_prunes_closed_channels_without_affecting_others() {
        let registry = ConnectionRegistry::new();
        let (gone, gone_tx, gone_rx) = channel(4);
        let (live, live_tx, mut live_rx) = channel(4);
        registry.register(gone, gone_tx);
        registry.register(live, live_tx);
        drop(gone_rx);

        let report = registry
            .broadcast(&Message::new(1, kind::DATA, "hi"))
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.pruned, 1);
        assert!(!registry.contains(gone));
        assert!(registry.contains(live));
        assert_eq!(decode(live_rx.try_recv().unwrap()).message, "hi");
    }

    #[test]
    fn test_broadcast_full_channel_stays_registered() {
        let registry = ConnectionRegistry::new();
        let (id, tx, mut rx) = channel(1);
        registry.register(id, tx);

        registry.broadcast(&Message::new(1, kind::DATA, "a")).unwrap();
        let report = registry.broadcast(&Message::new(2, kind::DATA, "b")).unwrap();

        assert_eq!(report.dropped, 1);
        assert!(registry.contains(id));
        assert_eq!(decode(rx.try_recv().unwrap()).id, 1);
    }

    #[test]
    fn test_broadcast_with_no_channels() {
        let registry = ConnectionRegistry::new();
        let report = registry
            .broadcast(&Message::new(1, kind::DATA, "hi"))
            .unwrap();
        assert_eq!(report, BroadcastReport::default());
    }

    #[test]
    fn test_clones_share_channels() {
        let registry = ConnectionRegistry::new();
        let other = registry.clone();
        let (id, tx, _rx) = channel(4);

        registry.register(id, tx);
        assert!(other.contains(id));
        other.unregister(id);
        assert!(registry.is_empty());
    }
}
