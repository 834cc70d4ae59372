//! Uni Hub SL-INF report encoding and decoding.
//!
//! Every report to the hub is a fixed 65-byte buffer:
//! - byte 0: transaction ID (always 0xE0, the hub drops anything else)
//! - bytes 1..=2: 16-bit register address, big-endian
//! - bytes 3..65: payload, zero padded
//!
//! The high address byte selects a register; the low byte is a selector
//! whose meaning depends on the register family (sub-zone mask for LED
//! registers, fan-count variant for fan-hub registers). Register bases are
//! compiled-in per channel and always have a zero low byte.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Command value that starts every report.
pub const TRANSACTION_ID: u8 = 0xE0;

/// Total report length (including transaction ID).
pub const REPORT_LEN: usize = 65;
/// Transaction ID plus two address bytes.
pub const HEADER_LEN: usize = 3;
/// Usable payload bytes per report.
pub const PAYLOAD_LEN: usize = REPORT_LEN - HEADER_LEN;
/// RBG triples that fit in one data packet.
pub const COLORS_PER_PACKET: usize = PAYLOAD_LEN / 3;

/// Number of independent outputs on the hub.
pub const CHANNEL_COUNT: usize = 4;
/// Fans that can be chained on one channel.
pub const MAX_FANS_PER_CHANNEL: usize = 4;
/// LEDs per SL-INF fan (inner fan ring plus outer edge ring).
pub const LEDS_PER_FAN: usize = 20;
/// Inner-ring (fan sub-zone) LEDs per fan.
pub const FAN_LEDS_PER_FAN: usize = 8;
/// Outer-ring (edge sub-zone) LEDs per fan.
pub const EDGE_LEDS_PER_FAN: usize = 12;
/// Max fan sub-zone LEDs per channel (32).
pub const CHAN_FANLED_COUNT: usize = MAX_FANS_PER_CHANNEL * FAN_LEDS_PER_FAN;
/// Max edge sub-zone LEDs per channel (48).
pub const CHAN_EDGELED_COUNT: usize = MAX_FANS_PER_CHANNEL * EDGE_LEDS_PER_FAN;
/// Max LEDs per channel (80).
pub const CHAN_LED_COUNT: usize = CHAN_FANLED_COUNT + CHAN_EDGELED_COUNT;

/// Register queried for the firmware version string.
pub const QUERY_FIRMWARE: u16 = 0x0A01;
/// Register queried for the serial number string.
pub const QUERY_SERIAL: u16 = 0x0A02;
/// Longest ASCII field returned by a string query.
pub const QUERY_STRING_MAX: usize = 32;

/// Device mode bytes for lighting effects.
pub mod effects {
    /// Rainbow wave. Fan sub-zone only.
    pub const RAINBOW: u8 = 0x05;
    /// Rainbow morph. Fan sub-zone only.
    pub const RAINBOW_MORPH: u8 = 0x35;
    pub const STATIC_COLOR: u8 = 0x01;
    pub const BREATHING: u8 = 0x02;
    pub const BREATHING_RAINBOW: u8 = 0x06;
    pub const RUNWAY: u8 = 0x1A;
    pub const METEOR: u8 = 0x19;
    pub const WARNING: u8 = 0x2D;
    pub const VOICE: u8 = 0x2E;
    pub const MIXING: u8 = 0x2F;
    pub const STACK: u8 = 0x30;
    pub const TIDE: u8 = 0x31;
    pub const SCAN: u8 = 0x1B;
    pub const ELECTRIC_CURRENT: u8 = 0x07;

    /// Effects that must be pushed to fan and edge sub-zones together.
    pub fn syncs_fan_and_edge(mode: u8) -> bool {
        matches!(mode, STATIC_COLOR | BREATHING | RUNWAY | METEOR)
    }
}

/// Speed levels 0..=4 (very slow .. very fast).
pub const SPEED_TABLE: [u8; 5] = [0x02, 0x01, 0x00, 0xFF, 0xFE];

/// Brightness levels 0..=4 (off .. full). Lower bytes are brighter.
pub const BRIGHTNESS_TABLE: [u8; 5] = [0x08, 0x03, 0x02, 0x01, 0x00];

/// Fan-hub selector for fan index 0..=3 (one to four chained fans).
pub const FAN_COUNT_SELECTORS: [u8; MAX_FANS_PER_CHANNEL] = [0x01, 0x02, 0x03, 0x04];

/// Encode a speed level. Levels past the table saturate at the fastest code.
pub fn encode_speed(level: u32) -> u8 {
    SPEED_TABLE[(level as usize).min(SPEED_TABLE.len() - 1)]
}

/// Encode a brightness level. Levels past the table saturate at full brightness.
pub fn encode_brightness(level: u32) -> u8 {
    BRIGHTNESS_TABLE[(level as usize).min(BRIGHTNESS_TABLE.len() - 1)]
}

/// Fan-hub selector for a fan index. Indices past four fans saturate.
pub fn fan_selector(num_fans: usize) -> u8 {
    FAN_COUNT_SELECTORS[num_fans.min(MAX_FANS_PER_CHANNEL - 1)]
}

/// Effect direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl Direction {
    /// Device byte.
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::LeftToRight => 0x00,
            Self::RightToLeft => 0x01,
        }
    }

    /// Parse a CLI-friendly name ("ltr", "left-to-right", "rtl", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ltr" | "left" | "left-to-right" => Some(Self::LeftToRight),
            "rtl" | "right" | "right-to-left" => Some(Self::RightToLeft),
            _ => None,
        }
    }
}

/// Sub-zone mask carried in the low address byte of LED registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubZones(u8);

impl SubZones {
    /// Inner fan ring.
    pub const FAN: Self = Self(0x01);
    /// Outer edge ring.
    pub const EDGE: Self = Self(0x02);
    pub const BOTH: Self = Self(0x03);

    pub fn bits(&self) -> u8 {
        self.0
    }
}

/// Per-channel register bases. Low bytes are zero; selectors are OR'ed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAddresses {
    pub led_action: u16,
    pub led_commit: u16,
    pub led_mode: u16,
    pub led_speed: u16,
    pub led_direction: u16,
    pub led_brightness: u16,

    pub fan_hub_action: u16,
    pub fan_hub_commit: u16,

    pub fan_pwm_action: u16,
    pub fan_pwm_commit: u16,
    pub fan_rpm_action: u16,
}

impl ChannelAddresses {
    /// The six LED-control registers.
    pub fn led_registers(&self) -> [u16; 6] {
        [
            self.led_action,
            self.led_commit,
            self.led_mode,
            self.led_speed,
            self.led_direction,
            self.led_brightness,
        ]
    }

    /// The five fan-control registers.
    pub fn fan_registers(&self) -> [u16; 5] {
        [
            self.fan_hub_action,
            self.fan_hub_commit,
            self.fan_pwm_action,
            self.fan_pwm_commit,
            self.fan_rpm_action,
        ]
    }
}

// The register layout is not regular across channels; keep it as data.
static CHANNEL_ADDRESSES: [ChannelAddresses; CHANNEL_COUNT] = [
    ChannelAddresses {
        led_action: 0x3000,
        led_commit: 0x1000,
        led_mode: 0x2100,
        led_speed: 0x2200,
        led_direction: 0x2300,
        led_brightness: 0x2900,
        fan_hub_action: 0x8000,
        fan_hub_commit: 0x8100,
        fan_pwm_action: 0xA000,
        fan_pwm_commit: 0xA100,
        fan_rpm_action: 0xB000,
    },
    ChannelAddresses {
        led_action: 0x3200,
        led_commit: 0x1200,
        led_mode: 0x4100,
        led_speed: 0x4200,
        led_direction: 0x4300,
        led_brightness: 0x4900,
        fan_hub_action: 0x8200,
        fan_hub_commit: 0x8300,
        fan_pwm_action: 0xA200,
        fan_pwm_commit: 0xA300,
        fan_rpm_action: 0xB200,
    },
    ChannelAddresses {
        led_action: 0x3400,
        led_commit: 0x1400,
        led_mode: 0x5100,
        led_speed: 0x5200,
        led_direction: 0x5300,
        led_brightness: 0x5900,
        fan_hub_action: 0x8400,
        fan_hub_commit: 0x8500,
        fan_pwm_action: 0xA400,
        fan_pwm_commit: 0xA500,
        fan_rpm_action: 0xB400,
    },
    ChannelAddresses {
        led_action: 0x3600,
        led_commit: 0x1600,
        led_mode: 0x6100,
        led_speed: 0x6200,
        led_direction: 0x6300,
        led_brightness: 0x6900,
        fan_hub_action: 0x8600,
        fan_hub_commit: 0x8700,
        fan_pwm_action: 0xA600,
        fan_pwm_commit: 0xA700,
        fan_rpm_action: 0xB600,
    },
];

/// Look up the register table for a channel.
pub fn channel_addresses(channel: usize) -> Option<&'static ChannelAddresses> {
    CHANNEL_ADDRESSES.get(channel)
}

/// Combine a register base with a selector byte.
pub fn with_selector(base: u16, selector: u8) -> u16 {
    base | selector as u16
}

/// Effect parameters as device bytes, in commit payload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    pub mode: u8,
    pub speed: u8,
    pub direction: u8,
    pub brightness: u8,
}

impl Effect {
    /// Latch for direct per-LED color: static, full device brightness.
    /// Brightness for direct color is applied to the color bytes instead.
    pub const DIRECT: Effect = Effect {
        mode: effects::STATIC_COLOR,
        speed: SPEED_TABLE[2],
        direction: 0x00,
        brightness: BRIGHTNESS_TABLE[4],
    };

    pub fn payload(&self) -> [u8; 4] {
        [self.mode, self.speed, self.direction, self.brightness]
    }
}

/// One outbound or inbound hub report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Register address including selector.
    pub address: u16,
    /// Payload bytes (at most [`PAYLOAD_LEN`]).
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(address: u16, payload: Vec<u8>) -> Self {
        Self { address, payload }
    }

    /// Encode into a full-length report.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.payload.len() > PAYLOAD_LEN {
            return Err(Error::OutOfRange {
                field: "payload_len",
                value: self.payload.len() as u32,
                min: 0,
                max: PAYLOAD_LEN as u32,
            });
        }

        let mut buf = vec![0u8; REPORT_LEN];
        buf[0] = TRANSACTION_ID;
        buf[1..HEADER_LEN].copy_from_slice(&self.address.to_be_bytes());
        buf[HEADER_LEN..HEADER_LEN + self.payload.len()].copy_from_slice(&self.payload);
        Ok(buf)
    }

    /// Decode a raw report. The payload keeps its trailing padding.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::Hid(format!(
                "report too short: {} bytes (minimum {})",
                data.len(),
                HEADER_LEN
            )));
        }
        let address = u16::from_be_bytes([data[1], data[2]]);
        if data[0] != TRANSACTION_ID {
            return Err(Error::Protocol {
                address,
                reason: format!("unexpected transaction ID: 0x{:02X}", data[0]),
            });
        }

        Ok(Self {
            address,
            payload: data[HEADER_LEN..].to_vec(),
        })
    }
}

/// Read a NUL-terminated ASCII field from the start of a response payload.
pub fn parse_ascii_field(payload: &[u8]) -> String {
    let field = &payload[..payload.len().min(QUERY_STRING_MAX)];
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn led_addresses_distinct_and_non_zero() {
        for channel in 0..CHANNEL_COUNT {
            let regs = channel_addresses(channel).unwrap().led_registers();
            let unique: HashSet<u16> = regs.iter().copied().collect();
            assert_eq!(unique.len(), 6, "channel {channel} has duplicate LED registers");
            assert!(regs.iter().all(|&a| a != 0));
        }
    }

    #[test]
    fn no_register_shared_between_channels() {
        let mut seen = HashSet::new();
        for channel in 0..CHANNEL_COUNT {
            let addrs = channel_addresses(channel).unwrap();
            for reg in addrs.led_registers().iter().chain(addrs.fan_registers().iter()) {
                assert!(seen.insert(*reg), "register 0x{reg:04X} reused");
                assert_eq!(reg & 0x00FF, 0, "register base must leave selector byte clear");
            }
        }
        assert_eq!(seen.len(), CHANNEL_COUNT * 11);
    }

    #[test]
    fn channel_lookup_out_of_range() {
        assert!(channel_addresses(CHANNEL_COUNT).is_none());
    }

    #[test]
    fn encode_packet_layout() {
        let pkt = Packet::new(0x1003, vec![0x1A, 0x00, 0x01, 0x02]);
        let encoded = pkt.encode().unwrap();
        assert_eq!(encoded.len(), REPORT_LEN);
        assert_eq!(encoded[0], TRANSACTION_ID);
        assert_eq!(encoded[1], 0x10);
        assert_eq!(encoded[2], 0x03);
        assert_eq!(&encoded[3..7], &[0x1A, 0x00, 0x01, 0x02]);
        assert!(encoded[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let pkt = Packet::new(0x3001, vec![0u8; PAYLOAD_LEN + 1]);
        assert!(pkt.encode().is_err());
    }

    #[test]
    fn decode_reads_header() {
        let mut data = vec![TRANSACTION_ID, 0x0A, 0x01, b'1', b'.', b'0'];
        data.resize(REPORT_LEN, 0);
        let pkt = Packet::decode(&data).unwrap();
        assert_eq!(pkt.address, QUERY_FIRMWARE);
        assert_eq!(&pkt.payload[..3], b"1.0");
        assert_eq!(pkt.payload.len(), PAYLOAD_LEN);
    }

    #[test]
    fn decode_rejects_bad_transaction_id() {
        match Packet::decode(&[0x11, 0x0A, 0x01]) {
            Err(Error::Protocol { address, reason }) => {
                assert_eq!(address, QUERY_FIRMWARE);
                assert!(reason.contains("0x11"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_truncated_header() {
        assert!(matches!(
            Packet::decode(&[TRANSACTION_ID, 0x0A]),
            Err(Error::Hid(_))
        ));
    }

    #[test]
    fn speed_and_brightness_tables() {
        assert_eq!(encode_speed(0), 0x02);
        assert_eq!(encode_speed(3), 0xFF);
        assert_eq!(encode_speed(4), 0xFE);
        assert_eq!(encode_speed(99), 0xFE);
        assert_eq!(encode_brightness(0), 0x08);
        assert_eq!(encode_brightness(4), 0x00);
        assert_eq!(encode_brightness(50), 0x00);
    }

    #[test]
    fn fan_selector_saturates() {
        assert_eq!(fan_selector(0), 0x01);
        assert_eq!(fan_selector(1), 0x02);
        assert_eq!(fan_selector(3), 0x04);
        assert_eq!(fan_selector(9), 0x04);
    }

    #[test]
    fn sync_modes() {
        assert!(effects::syncs_fan_and_edge(effects::RUNWAY));
        assert!(effects::syncs_fan_and_edge(effects::STATIC_COLOR));
        assert!(!effects::syncs_fan_and_edge(effects::RAINBOW));
        assert!(!effects::syncs_fan_and_edge(effects::SCAN));
    }

    #[test]
    fn direction_names() {
        assert_eq!(Direction::from_name("RTL"), Some(Direction::RightToLeft));
        assert_eq!(Direction::from_name("left"), Some(Direction::LeftToRight));
        assert_eq!(Direction::from_name("up"), None);
    }

    #[test]
    fn ascii_field_stops_at_nul() {
        let mut payload = b"V1.2.3".to_vec();
        payload.extend_from_slice(&[0, b'x', b'y']);
        assert_eq!(parse_ascii_field(&payload), "V1.2.3");
        assert_eq!(parse_ascii_field(&[0u8; 10]), "");
    }
}
