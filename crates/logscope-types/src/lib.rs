//! Shared types for logscope
//!
//! This crate contains data structures used across multiple logscope crates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level as reported by the ingestion service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "WARN")]
    Warn,
    #[serde(rename = "ERROR")]
    Error,
}

impl LogLevel {
    /// Parse a level from its wire spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warn),
            "ERROR" | "ERR" => Some(Self::Error),
            _ => None,
        }
    }

    /// Wire/display spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Get display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Info => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
        }
    }

    /// All levels, in severity order (for cycling the level filter)
    pub fn all() -> [Self; 3] {
        [Self::Info, Self::Warn, Self::Error]
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log event as emitted by the ingestion service.
///
/// Events are immutable once received; the buffer owns them after ingestion
/// and nothing mutates them afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Unique, order-stable ID assigned by the source
    pub id: u64,

    /// Source-assigned timestamp
    pub timestamp: DateTime<Utc>,

    /// Severity level
    pub level: LogLevel,

    /// Emitting service name (open set)
    pub service: String,

    /// Log message text
    pub message: String,
}

/// Filter criteria for the log table.
///
/// Every field is independently optional; an absent field places no
/// constraint. Owned and mutated only by the UI input layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Exact level match
    pub level: Option<LogLevel>,

    /// Exact service match
    pub service: Option<String>,

    /// Case-insensitive substring match against the message
    pub text: Option<String>,
}

impl FilterCriteria {
    /// Check if the criteria place no constraint at all
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.service.is_none() && self.text.is_none()
    }
}

// ============================================================================
// Statistics Types
// ============================================================================

/// Server-computed aggregate statistics over a trailing window.
///
/// Wholly replaced on each successful poll; never merged field-by-field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Event count per level name for the window
    pub per_level: BTreeMap<String, u64>,

    /// Average events per second over the window
    pub average_per_second: f64,

    /// Fraction of events at ERROR level, in [0, 1]
    pub error_rate: f64,
}

/// Chart-ready labeled bar series derived from a [`StatsSnapshot`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}
