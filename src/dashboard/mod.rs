//! Dashboard view
//!
//! The browser page served at `/` and the equivalent client model used to
//! consume a subscriber stream: one connection, a capped FIFO of messages and
//! a connected/disconnected flag.

mod buffer;
mod decoder;
mod page;
mod view;

pub use buffer::MessageBuffer;
pub use decoder::EventStreamDecoder;
pub use page::render_page;
pub use view::{ConnectionStatus, DashboardView};
