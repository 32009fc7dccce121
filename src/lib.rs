//! Pulseboard - Live Message Relay
//!
//! Accepts messages over HTTP and rebroadcasts them to every open
//! Server-Sent Events subscriber, with a browser dashboard that renders the
//! live stream.
//!
//! ## Features
//!
//! - Shared-secret publish endpoint (`POST /message`, `apiKey` header)
//! - Fan-out to all subscribers (`GET /message?stream=true`)
//! - Fixed five minute ceiling on every subscriber connection
//! - Live dashboard page with a bounded, oldest-first-evicted table

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod stream;

pub use config::Config;
pub use error::{PulseError, Result};
pub use models::Message;
pub use stream::ConnectionRegistry;
