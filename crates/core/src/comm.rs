//! Error classification and connectivity checks.
//!
//! The hub protocol has no retry semantics: a failed write leaves the
//! channel in an unknown state and the caller decides what to do. This
//! module only sorts failures into classes a front end can act on.

use crate::error::Error;
use crate::protocol::QUERY_FIRMWARE;
use crate::transport::HidTransport;
use tracing::debug;

/// Classification of communication errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The hub did not answer in time.
    Timeout,
    /// Device is disconnected; stop sending, notify user.
    Disconnected,
    /// Permission denied, usually a missing udev rule.
    PermissionDenied,
    /// The hub answered with something unexpected.
    Protocol,
    /// Rejected before anything was sent.
    InvalidInput,
    /// Any other transport failure.
    Io,
}

impl ErrorClass {
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::Timeout(_) => Self::Timeout,
            Error::PermissionDenied(_) => Self::PermissionDenied,
            Error::DeviceNotFound(_) => Self::Disconnected,
            Error::Protocol { .. } => Self::Protocol,
            Error::OutOfRange { .. } | Error::InvalidConfig(_) => Self::InvalidInput,
            Error::Hid(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("disconnect")
                    || lower.contains("not found")
                    || lower.contains("no such device")
                {
                    Self::Disconnected
                } else if lower.contains("permission")
                    || lower.contains("access denied")
                    || lower.contains("access is denied")
                {
                    Self::PermissionDenied
                } else if lower.contains("timeout") || lower.contains("timed out") {
                    Self::Timeout
                } else {
                    Self::Io
                }
            }
        }
    }

    /// Short advice for the user, if there is any to give.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied => {
                Some("install a udev rule granting access to 0cf2:a102, then replug the hub")
            }
            Self::Disconnected => Some("check the hub's USB connection"),
            Self::Timeout => Some("the hub stopped answering; try replugging it"),
            _ => None,
        }
    }
}

/// Device connection status for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Device is connected and responding.
    Connected,
    /// Device is not found / disconnected.
    Disconnected,
    /// Permission denied; needs udev setup.
    PermissionError,
    /// Communication error (timeout or protocol).
    Error,
}

impl DeviceStatus {
    /// Status implied by a failure to open or talk to the hub.
    pub fn from_error(err: &Error) -> Self {
        match ErrorClass::classify(err) {
            ErrorClass::Disconnected => Self::Disconnected,
            ErrorClass::PermissionDenied => Self::PermissionError,
            _ => Self::Error,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::PermissionError => "permission denied",
            Self::Error => "not responding",
        }
    }
}

/// Check device connectivity by re-reading the firmware version register.
///
/// Works on a bare transport, so a hub that would fail to open as a
/// controller still gets a status.
pub fn check_device_status(transport: &dyn HidTransport, timeout_ms: i32) -> DeviceStatus {
    match crate::controller::query_string(transport, QUERY_FIRMWARE, timeout_ms) {
        Ok(_) => DeviceStatus::Connected,
        Err(ref e) => {
            debug!(class = ?ErrorClass::classify(e), error = %e, "Status query failed");
            DeviceStatus::from_error(e)
        }
    }
}
