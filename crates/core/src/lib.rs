//! open-uni-hub-core: protocol encoder and lighting model for the Lian Li
//! Uni Hub SL-INF.
//!
//! The hub takes 65-byte HID output reports addressed to per-channel
//! registers. This crate turns lighting requests (modes, per-LED colors,
//! fan duty) into correctly ordered report sequences over any
//! [`transport::HidTransport`].

pub mod color;
pub mod comm;
pub mod config;
pub mod controller;
pub mod error;
pub mod lighting;
pub mod modes;
pub mod protocol;
pub mod safety;
pub mod transport;
pub mod zones;

/// Lian Li USB Vendor ID.
pub const LIANLI_VID: u16 = 0x0CF2;

/// Known Uni Hub product IDs.
pub mod pids {
    /// Uni Hub for SL Infinity fans.
    pub const UNI_HUB_SLINF: u16 = 0xA102;
}
