//! Subscriber channels and fan-out

mod registry;
mod subscription;

pub use registry::{BroadcastReport, ChannelId, ConnectionRegistry, Frame};
pub use subscription::{SubscriberStream, Subscription};
