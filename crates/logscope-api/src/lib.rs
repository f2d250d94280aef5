//! Log service client for logscope
//!
//! This crate talks to the external ingestion/aggregation service: the
//! one-shot bulk history fetch, the periodic aggregate fetch, and the
//! WebSocket push channel carrying live `new_log` events.

mod client;
mod push;

pub use client::{ApiClient, ApiError};
pub use push::WsTransport;

// Re-export types used in our public API
pub use logscope_types::{LogEvent, StatsSnapshot};
