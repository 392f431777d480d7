use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the write session and its controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound for each individual tag operation (connect, write,
    /// read, close). An operation that exceeds it counts as a lost
    /// connection.
    pub transport_timeout_ms: u64,
    /// Capacity of the tag presentation channel.
    pub event_capacity: usize,
    /// Capacity of the report broadcast channel.
    pub report_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transport_timeout_ms: 2_000,
            event_capacity: 16,
            report_capacity: 64,
        }
    }
}

impl SessionConfig {
    pub fn transport_timeout(&self) -> Duration {
        Duration::from_millis(self.transport_timeout_ms)
    }
}
