//! Protocol encoder for the Uni Hub SL-INF.
//!
//! Owns the transport and turns channel-level requests into correctly
//! ordered report sequences. Every update is two-phase: data and parameter
//! reports first, then a commit report that makes the hub latch them.
//!
//! LED layout per channel: each chained fan contributes 20 LEDs. The first
//! 8 of every group of 20 sit on the inner fan ring, the remaining 12 on the
//! outer edge ring; the hub addresses the two rings as separate sub-zones.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::color::{to_wire, Rbg, RgbColor};
use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::protocol::{
    encode_brightness, encode_speed, fan_selector, parse_ascii_field, with_selector, Direction,
    Effect, Packet, SubZones, CHANNEL_COUNT, CHAN_EDGELED_COUNT, CHAN_FANLED_COUNT,
    CHAN_LED_COUNT, COLORS_PER_PACKET, EDGE_LEDS_PER_FAN, FAN_LEDS_PER_FAN, LEDS_PER_FAN,
    QUERY_FIRMWARE, QUERY_SERIAL,
};
use crate::safety::{validate_channel, validate_fan_duty};
use crate::transport::{query, send_packet, HidTransport};

/// Manufacturer name reported to the lighting layer.
pub const VENDOR: &str = "Lian Li";
/// Device description reported to the lighting layer.
pub const DESCRIPTION: &str = "Lian Li Uni Hub - SLINF";
/// Mode-specific color slots the hub accepts per effect.
pub const MODE_COLOR_SLOTS: usize = 4;

/// Last values pushed to one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    pub mode: u8,
    pub speed: u8,
    pub direction: u8,
    pub brightness: u8,
    /// Fan PWM duty in percent.
    pub fan_speed: u16,
    pub fan_colors: [Rbg; CHAN_FANLED_COUNT],
    pub edge_colors: [Rbg; CHAN_EDGELED_COUNT],
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            mode: 0,
            speed: 0,
            direction: 0,
            brightness: 0,
            fan_speed: 0,
            fan_colors: [Rbg::BLACK; CHAN_FANLED_COUNT],
            edge_colors: [Rbg::BLACK; CHAN_EDGELED_COUNT],
        }
    }
}

/// Read a string register from the hub.
pub fn query_string(transport: &dyn HidTransport, address: u16, timeout_ms: i32) -> Result<String> {
    let resp = query(transport, &Packet::new(address, vec![]), timeout_ms)?;
    Ok(parse_ascii_field(&resp.payload))
}

/// Driver for one hub. Exclusively owns its transport.
pub struct UniHubController<T: HidTransport> {
    transport: T,
    config: ControllerConfig,
    name: String,
    location: String,
    firmware_version: String,
    serial: String,
    channels: [ChannelState; CHANNEL_COUNT],
}

impl<T: HidTransport> UniHubController<T> {
    /// Take over an open hub and resolve its identity strings.
    pub fn open(transport: T, path: &str, name: &str, config: ControllerConfig) -> Result<Self> {
        let firmware_version = query_string(&transport, QUERY_FIRMWARE, config.read_timeout_ms)?;
        let serial = query_string(&transport, QUERY_SERIAL, config.read_timeout_ms)?;

        info!(
            device = name,
            path,
            firmware = %firmware_version,
            serial = %serial,
            "Opened Uni Hub"
        );

        Ok(Self {
            transport,
            config,
            name: name.to_string(),
            location: format!("HID: {path}"),
            firmware_version,
            serial,
            channels: Default::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Last values pushed to a channel, if the index exists.
    pub fn channel_state(&self, channel: usize) -> Option<&ChannelState> {
        self.channels.get(channel)
    }

    fn send(&self, packet: Packet) -> Result<()> {
        send_packet(&self.transport, &packet)?;
        if self.config.write_delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.write_delay_ms));
        }
        Ok(())
    }

    fn to_device(&self, color: RgbColor, brightness: f32) -> Rbg {
        let rbg = Rbg::scaled(color, brightness);
        if self.config.white_limiter {
            rbg.limited()
        } else {
            rbg
        }
    }

    /// Arm a channel for an update of `sub_zones` with `num_fans` (fan index) chained.
    pub fn send_start_action(&self, channel: usize, sub_zones: SubZones, num_fans: usize) -> Result<()> {
        let addrs = validate_channel(channel)?;
        self.send(Packet::new(
            with_selector(addrs.fan_hub_action, fan_selector(num_fans)),
            vec![sub_zones.bits()],
        ))
    }

    /// Write raw colors to one sub-zone, split across as many reports as needed.
    pub fn send_color_data(&self, channel: usize, sub_zone: SubZones, colors: &[Rbg]) -> Result<()> {
        let addrs = validate_channel(channel)?;
        let address = with_selector(addrs.led_action, sub_zone.bits());

        for chunk in colors.chunks(COLORS_PER_PACKET) {
            self.send(Packet::new(address, to_wire(chunk)))?;
        }
        Ok(())
    }

    /// Latch pending data on `sub_zones` with the given effect parameters.
    pub fn send_commit_action(&self, channel: usize, sub_zones: SubZones, effect: Effect) -> Result<()> {
        let addrs = validate_channel(channel)?;
        self.send(Packet::new(
            with_selector(addrs.led_commit, sub_zones.bits()),
            effect.payload().to_vec(),
        ))
    }

    /// Push a hardware effect to a channel.
    ///
    /// `num_fans` is the fan index (chained fans minus one). Without
    /// `sync_fan_edge` only the fan sub-zone is addressed; with it both
    /// sub-zones are, and the effect is also committed to the fan-hub
    /// register for that fan count. Colors beyond the four slots are ignored.
    #[allow(clippy::too_many_arguments)]
    pub fn set_channel_mode(
        &mut self,
        channel: usize,
        mode_value: u8,
        colors: &[RgbColor],
        num_fans: usize,
        sync_fan_edge: bool,
        brightness: u32,
        speed: u32,
        direction: Direction,
    ) -> Result<()> {
        let addrs = validate_channel(channel)?;
        let sub_zones = if sync_fan_edge {
            SubZones::BOTH
        } else {
            SubZones::FAN
        };
        let mask = sub_zones.bits();
        let effect = Effect {
            mode: mode_value,
            speed: encode_speed(speed),
            direction: direction.as_byte(),
            brightness: encode_brightness(brightness),
        };

        debug!(
            channel,
            mode = format_args!("0x{mode_value:02X}"),
            num_fans,
            sync_fan_edge,
            "Setting channel mode"
        );

        self.send_start_action(channel, sub_zones, num_fans)?;

        let slots: Vec<Rbg> = colors
            .iter()
            .take(MODE_COLOR_SLOTS)
            .map(|&c| self.to_device(c, 1.0))
            .collect();
        let mut mode_payload = vec![mode_value, slots.len() as u8];
        mode_payload.extend(to_wire(&slots));
        self.send(Packet::new(with_selector(addrs.led_mode, mask), mode_payload))?;
        self.send(Packet::new(with_selector(addrs.led_speed, mask), vec![effect.speed]))?;
        self.send(Packet::new(
            with_selector(addrs.led_direction, mask),
            vec![effect.direction],
        ))?;
        self.send(Packet::new(
            with_selector(addrs.led_brightness, mask),
            vec![effect.brightness],
        ))?;

        self.send_commit_action(channel, sub_zones, effect)?;

        if sync_fan_edge {
            self.send(Packet::new(
                with_selector(addrs.fan_hub_commit, fan_selector(num_fans)),
                effect.payload().to_vec(),
            ))?;
        }

        let state = &mut self.channels[channel];
        state.mode = effect.mode;
        state.speed = effect.speed;
        state.direction = effect.direction;
        state.brightness = effect.brightness;
        Ok(())
    }

    /// Push per-LED colors to a channel, scaled by `brightness` (0.0..=1.0).
    ///
    /// Sends nothing for an empty slice. Colors past 80 are dropped.
    pub fn set_channel_leds(&mut self, channel: usize, colors: &[RgbColor], brightness: f32) -> Result<()> {
        validate_channel(channel)?;
        if colors.is_empty() {
            debug!(channel, "No LEDs configured, skipping color update");
            return Ok(());
        }

        let colors = if colors.len() > CHAN_LED_COUNT {
            warn!(
                channel,
                count = colors.len(),
                max = CHAN_LED_COUNT,
                "Too many colors for channel, truncating"
            );
            &colors[..CHAN_LED_COUNT]
        } else {
            colors
        };

        let fans = colors.len().div_ceil(LEDS_PER_FAN);
        let mut fan_data = [Rbg::BLACK; CHAN_FANLED_COUNT];
        let mut edge_data = [Rbg::BLACK; CHAN_EDGELED_COUNT];

        for (idx, &color) in colors.iter().enumerate() {
            let fan = idx / LEDS_PER_FAN;
            let pos = idx % LEDS_PER_FAN;
            let rbg = self.to_device(color, brightness);
            if pos < FAN_LEDS_PER_FAN {
                fan_data[fan * FAN_LEDS_PER_FAN + pos] = rbg;
            } else {
                edge_data[fan * EDGE_LEDS_PER_FAN + pos - FAN_LEDS_PER_FAN] = rbg;
            }
        }

        self.send_start_action(channel, SubZones::BOTH, fans - 1)?;
        self.send_color_data(channel, SubZones::FAN, &fan_data[..fans * FAN_LEDS_PER_FAN])?;
        self.send_color_data(channel, SubZones::EDGE, &edge_data[..fans * EDGE_LEDS_PER_FAN])?;
        self.send_commit_action(channel, SubZones::BOTH, Effect::DIRECT)?;

        let state = &mut self.channels[channel];
        state.fan_colors = fan_data;
        state.edge_colors = edge_data;
        state.mode = Effect::DIRECT.mode;
        state.speed = Effect::DIRECT.speed;
        state.direction = Effect::DIRECT.direction;
        state.brightness = Effect::DIRECT.brightness;
        Ok(())
    }

    /// Set a channel's fan PWM duty (0..=100 %).
    pub fn set_fan_speed(&mut self, channel: usize, percent: u8) -> Result<()> {
        let addrs = validate_channel(channel)?;
        let duty = validate_fan_duty(percent)?;

        self.send(Packet::new(addrs.fan_pwm_action, vec![duty]))?;
        self.send(Packet::new(addrs.fan_pwm_commit, vec![]))?;

        self.channels[channel].fan_speed = duty as u16;
        Ok(())
    }

    /// Read a channel's fan speed in RPM.
    pub fn read_fan_rpm(&self, channel: usize) -> Result<u16> {
        let addrs = validate_channel(channel)?;
        let resp = query(
            &self.transport,
            &Packet::new(addrs.fan_rpm_action, vec![]),
            self.config.read_timeout_ms,
        )?;

        match resp.payload.as_slice() {
            [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
            _ => Err(Error::Protocol {
                address: addrs.fan_rpm_action,
                reason: "RPM response missing payload".into(),
            }),
        }
    }
}
