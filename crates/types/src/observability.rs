//! Execution observability options attached to a deployed chain.

use serde::{Deserialize, Serialize};

/// Verbosity of the execution-history log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Record every execution event.
    All,
    /// Record error events only.
    Error,
    /// Record terminal failures only.
    Fatal,
    /// Disable execution-history logging.
    Off,
}

/// How executions of the chain are started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionMode {
    /// Synchronous, low-latency executions with no queuing.
    Express,
    /// Durable asynchronous executions.
    Standard,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Express => "EXPRESS",
            ExecutionMode::Standard => "STANDARD",
        }
    }
}

/// Log sink configuration for a chain's execution history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOptions {
    /// Name of the destination log group.
    pub log_group_name: String,
    /// Retention window in days for recorded history.
    pub retention_days: u32,
    /// Whether full execution data is captured alongside events.
    pub include_execution_data: bool,
    /// Event verbosity.
    pub level: LogLevel,
}

impl LogOptions {
    /// Short-retention, full-capture, verbose sink for a named chain.
    pub fn verbose_short_retention(chain_name: &str) -> Self {
        Self {
            log_group_name: format!("/chainline/chains/{chain_name}"),
            retention_days: 1,
            include_execution_data: true,
            level: LogLevel::All,
        }
    }
}
