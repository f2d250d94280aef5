//! Stream state management for logscope
//!
//! This crate reconciles the two asynchronous data sources of the dashboard
//! (the push channel delivering individual log events and the polled
//! statistics endpoint) into one bounded, filterable view. It owns no I/O
//! itself; transports are injected through the [`PushTransport`] and
//! [`StatsSource`] seams.

mod buffer;
mod filter;
mod poller;
mod project;
mod session;

pub use buffer::{DEFAULT_CAPACITY, EventBuffer};
pub use filter::apply_filter;
pub use poller::{StatsCell, StatsPoller, StatsSource};
pub use project::project_levels;
pub use session::{EventStream, PushError, PushTransport, SessionState, StreamSession};

// Re-export types used in our public API
pub use logscope_types::{ChartSeries, FilterCriteria, LogEvent, LogLevel, StatsSnapshot};
