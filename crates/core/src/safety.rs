//! Safety layer: validates parameters against the hub's known ranges
//! before anything is sent.
//!
//! ## Channels
//! - **Range**: 0–3, one per physical output. The register table has no
//!   entry past channel 3, so an unchecked index would address nothing.
//!
//! ## LED counts
//! - **Range**: 0–80 per channel (four SL-INF fans of 20 LEDs).
//!
//! ## Fan duty
//! - **Range**: 0–100 %. The hub latches whatever byte it receives, and
//!   values above 100 spin some fans past their rated speed.
//!
//! ## Mode levels
//! - Speed and brightness are small discrete levels, not continuous
//!   values; each mode declares its own min/max.

use crate::error::{Error, Result};
use crate::protocol::{ChannelAddresses, CHANNEL_COUNT, CHAN_LED_COUNT};

/// Highest accepted fan duty, in percent.
pub const FAN_DUTY_MAX: u8 = 100;

/// Validate a channel index and resolve its register table.
pub fn validate_channel(channel: usize) -> Result<&'static ChannelAddresses> {
    crate::protocol::channel_addresses(channel).ok_or(Error::OutOfRange {
        field: "channel",
        value: channel as u32,
        min: 0,
        max: (CHANNEL_COUNT - 1) as u32,
    })
}

/// Validate a per-channel LED count.
pub fn validate_led_count(count: usize) -> Result<usize> {
    if count > CHAN_LED_COUNT {
        return Err(Error::OutOfRange {
            field: "led_count",
            value: count as u32,
            min: 0,
            max: CHAN_LED_COUNT as u32,
        });
    }
    Ok(count)
}

/// Validate a fan duty percentage.
pub fn validate_fan_duty(percent: u8) -> Result<u8> {
    if percent > FAN_DUTY_MAX {
        return Err(Error::OutOfRange {
            field: "fan_duty",
            value: percent as u32,
            min: 0,
            max: FAN_DUTY_MAX as u32,
        });
    }
    Ok(percent)
}

/// Validate a mode level (speed, brightness, color slot) against its range.
pub fn validate_level(field: &'static str, value: u32, min: u32, max: u32) -> Result<u32> {
    if !(min..=max).contains(&value) {
        return Err(Error::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
