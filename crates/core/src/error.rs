//! Error types for open-uni-hub-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HID device communication failure.
    #[error("HID error: {0}")]
    Hid(String),

    /// Device not found when opening the hub.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The hub answered with a report that does not match the request.
    #[error("protocol error at register 0x{address:04X}: {reason}")]
    Protocol { address: u16, reason: String },

    /// Value out of safe range.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Rejected setup input, such as a mode list without the per-LED mode.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Permission denied (udev rule missing, or exclusive access on Windows).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Operation timed out.
    #[error("timeout: {0}")]
    Timeout(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
