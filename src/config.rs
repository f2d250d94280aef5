use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use logscope_stream::DEFAULT_CAPACITY;

pub const DEFAULT_SERVER: &str = "http://localhost:4000";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_STATS_WINDOW_SECS: u64 = 60;

/// Optional TOML config file shape; every field can be overridden by a
/// CLI flag
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    server: Option<String>,
    poll_interval: Option<u64>,
    stats_window: Option<u64>,
    buffer_size: Option<usize>,
}

impl FileConfig {
    fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config file")
    }
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the log service
    pub server: String,

    /// Seconds between stats polls
    pub poll_interval: u64,

    /// Trailing window for aggregate stats, in seconds
    pub stats_window: u64,

    /// History bound for the event buffer
    pub buffer_size: usize,
}

impl Config {
    /// Merge CLI flags over the config file over built-in defaults
    pub fn load(args: &crate::Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("cannot read config file {}", path.display()))?;
                FileConfig::parse(&text)?
            }
            None => Self::default_file_config(),
        };

        Ok(Self {
            server: args
                .server
                .clone()
                .or(file.server)
                .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            poll_interval: args
                .poll_interval
                .or(file.poll_interval)
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            stats_window: args
                .stats_window
                .or(file.stats_window)
                .unwrap_or(DEFAULT_STATS_WINDOW_SECS),
            buffer_size: args
                .buffer_size
                .or(file.buffer_size)
                .unwrap_or(DEFAULT_CAPACITY),
        })
    }

    /// Config file next to the binary's working directory, if present
    fn default_file_config() -> FileConfig {
        let path = Path::new("logscope.toml");
        if let Ok(text) = fs::read_to_string(path) {
            FileConfig::parse(&text).unwrap_or_default()
        } else {
            FileConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let file = FileConfig::parse(
            r#"
            server = "http://logs.internal:4000"
            poll_interval = 10
            stats_window = 120
            buffer_size = 200
            "#,
        )
        .unwrap();
        assert_eq!(file.server.as_deref(), Some("http://logs.internal:4000"));
        assert_eq!(file.poll_interval, Some(10));
        assert_eq!(file.stats_window, Some(120));
        assert_eq!(file.buffer_size, Some(200));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(FileConfig::parse("sevrer = \"typo\"").is_err());
    }

    #[test]
    fn test_empty_file_is_valid() {
        let file = FileConfig::parse("").unwrap();
        assert!(file.server.is_none());
    }
}
