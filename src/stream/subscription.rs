//! Subscriber lifecycle
//!
//! A [`Subscription`] registers a channel on creation and unregisters it on
//! drop, so every exit path (peer disconnect, stream end, lifetime ceiling)
//! releases the registry slot. [`SubscriberStream`] yields the channel's
//! frames until the ceiling elapses.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use pin_project_lite::pin_project;
use tokio::sync::mpsc;
use tokio::time::{sleep, Sleep};
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use super::registry::{ChannelId, ConnectionRegistry, Frame};
use crate::error::{PulseError, Result};
use crate::models::Message;

/// Registry membership for one subscriber channel
pub struct Subscription {
    id: ChannelId,
    registry: ConnectionRegistry,
}

impl Subscription {
    /// Allocate a channel, queue `welcome` on it, then register it.
    ///
    /// The welcome frame is queued before registration so it always precedes
    /// any broadcast.
    pub fn open(
        registry: &ConnectionRegistry,
        buffer: usize,
        welcome: &Message,
    ) -> Result<(Self, mpsc::Receiver<Frame>)> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let frame: Frame = serde_json::to_string(welcome)?.into();
        tx.try_send(frame)
            .map_err(|e| PulseError::Internal(format!("failed to queue welcome frame: {}", e)))?;

        let id = ChannelId::new();
        registry.register(id, tx);

        Ok((
            Self {
                id,
                registry: registry.clone(),
            },
            rx,
        ))
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

pin_project! {
    /// Frames for one subscriber, ending when the lifetime ceiling elapses
    pub struct SubscriberStream {
        #[pin]
        frames: ReceiverStream<Frame>,
        #[pin]
        deadline: Sleep,
        subscription: Option<Subscription>,
    }
}

impl SubscriberStream {
    pub fn new(
        subscription: Subscription,
        rx: mpsc::Receiver<Frame>,
        max_lifetime: Duration,
    ) -> Self {
        Self {
            frames: ReceiverStream::new(rx),
            deadline: sleep(max_lifetime),
            subscription: Some(subscription),
        }
    }

    /// Open a subscription on `registry` and wrap it in a stream
    pub fn open(
        registry: &ConnectionRegistry,
        buffer: usize,
        welcome: &Message,
        max_lifetime: Duration,
    ) -> Result<Self> {
        let (subscription, rx) = Subscription::open(registry, buffer, welcome)?;
        Ok(Self::new(subscription, rx, max_lifetime))
    }

    /// `None` once the stream has finished and released its channel
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.subscription.as_ref().map(Subscription::id)
    }
}

impl Stream for SubscriberStream {
    type Item = Frame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if this.subscription.is_none() {
            return Poll::Ready(None);
        }

        // Fixed ceiling from connect time, independent of traffic.
        if this.deadline.poll(cx).is_ready() {
            if let Some(subscription) = this.subscription.take() {
                debug!("Channel {} reached its lifetime ceiling", subscription.id());
            }
            return Poll::Ready(None);
        }

        match this.frames.poll_next(cx) {
            Poll::Ready(None) => {
                this.subscription.take();
                Poll::Ready(None)
            }
            other => other,
        }
    }
}
