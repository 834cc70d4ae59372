//! Runtime settings for the protocol encoder.

use serde::{Deserialize, Serialize};

/// Default response timeout for query exchanges.
pub const DEFAULT_READ_TIMEOUT_MS: i32 = 1000;

/// Encoder configuration. Built from CLI flags; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// How long a query waits for the hub's answer.
    pub read_timeout_ms: i32,
    /// Cap near-white LEDs to the manufacturer's current limit.
    pub white_limiter: bool,
    /// Pause after every report, for hubs on slow firmware.
    pub write_delay_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            white_limiter: false,
            write_delay_ms: 0,
        }
    }
}
