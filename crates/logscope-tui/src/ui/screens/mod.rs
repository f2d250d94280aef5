//! Screen implementations

mod dashboard;

pub use dashboard::DashboardScreen;
