//! HTTP API
//!
//! The message endpoint (publish, subscribe, single message), the dashboard
//! page and a health check.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState};
