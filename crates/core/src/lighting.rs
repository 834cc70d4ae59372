//! Zone/mode model for one hub.
//!
//! Holds what a lighting front end sees (modes, zones, LEDs and the active
//! mode) and turns "apply mode" and "update LEDs" requests into encoder
//! calls. Per-LED colors only go out through the LED update path; the mode
//! path never touches the per-LED mode.

use tracing::{debug, info};

use crate::color::RgbColor;
use crate::controller::{UniHubController, DESCRIPTION, VENDOR};
use crate::error::{Error, Result};
use crate::modes::{default_modes, ColorMode, Mode, CUSTOM_MODE};
use crate::protocol::{Direction, CHANNEL_COUNT, LEDS_PER_FAN};
use crate::transport::HidTransport;
use crate::zones::{Led, Zone};

/// Lighting state for one hub, driving its encoder.
pub struct HubLighting<T: HidTransport> {
    controller: UniHubController<T>,
    modes: Vec<Mode>,
    zones: Vec<Zone>,
    leds: Vec<Led>,
    active_mode: usize,
    /// False until the first non-custom mode has been pushed.
    mode_applied: bool,
}

impl<T: HidTransport> HubLighting<T> {
    /// Wrap an encoder with the stock mode list. Starts in the per-LED mode
    /// with every channel disabled.
    pub fn new(controller: UniHubController<T>) -> Self {
        Self::build(controller, default_modes())
    }

    /// Wrap an encoder with a custom mode list. The first mode must be the
    /// per-LED mode.
    pub fn with_modes(controller: UniHubController<T>, modes: Vec<Mode>) -> Result<Self> {
        match modes.get(CUSTOM_MODE) {
            Some(mode) if mode.descriptor.color_mode == ColorMode::PerLed => {
                Ok(Self::build(controller, modes))
            }
            Some(mode) => Err(Error::InvalidConfig(format!(
                "mode {CUSTOM_MODE} is '{}', expected a per-LED mode",
                mode.name()
            ))),
            None => Err(Error::InvalidConfig("mode list is empty".into())),
        }
    }

    fn build(controller: UniHubController<T>, modes: Vec<Mode>) -> Self {
        let mut lighting = Self {
            controller,
            modes,
            zones: Vec::new(),
            leds: Vec::new(),
            active_mode: CUSTOM_MODE,
            mode_applied: false,
        };
        lighting.setup_zones();
        lighting
    }

    pub fn vendor(&self) -> &'static str {
        VENDOR
    }

    pub fn description(&self) -> &'static str {
        DESCRIPTION
    }

    pub fn name(&self) -> &str {
        self.controller.name()
    }

    pub fn firmware_version(&self) -> &str {
        self.controller.firmware_version()
    }

    pub fn serial(&self) -> &str {
        self.controller.serial()
    }

    pub fn location(&self) -> &str {
        self.controller.location()
    }

    pub fn controller(&self) -> &UniHubController<T> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut UniHubController<T> {
        &mut self.controller
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn leds(&self) -> &[Led] {
        &self.leds
    }

    pub fn active_mode(&self) -> usize {
        self.active_mode
    }

    pub fn active(&self) -> &Mode {
        &self.modes[self.active_mode]
    }

    pub fn mode_applied(&self) -> bool {
        self.mode_applied
    }

    /// Derive zone geometry from LED counts and rebuild the LED list.
    ///
    /// Any LED index handed out earlier is invalid afterwards.
    pub fn setup_zones(&mut self) {
        if self.zones.is_empty() {
            self.zones = (0..CHANNEL_COUNT)
                .map(|channel| {
                    let mut zone = Zone::new(channel);
                    zone.set_leds_count(zone.leds_min);
                    zone
                })
                .collect();
        }

        self.leds.clear();
        for (channel, zone) in self.zones.iter_mut().enumerate() {
            zone.rebuild();
            self.leds.extend((0..zone.leds_count()).map(|idx| Led {
                name: format!("{}, LED {}", zone.name, idx + 1),
                channel,
            }));
        }
    }

    /// Change a zone's LED count. Out-of-range requests are ignored.
    pub fn resize_zone(&mut self, zone: usize, count: usize) {
        match self.zones.get_mut(zone) {
            Some(z) if z.accepts(count) => {
                z.set_leds_count(count);
                self.setup_zones();
                debug!(zone, count, "Resized zone");
            }
            _ => debug!(zone, count, "Ignoring out-of-range zone resize"),
        }
    }

    /// Push every zone's colors, applying the active mode first if none has
    /// gone out yet.
    pub fn update_leds(&mut self) -> Result<()> {
        if !self.mode_applied {
            self.update_mode()?;
        }

        let scale = self.active().brightness_scale();
        for (channel, zone) in self.zones.iter().enumerate() {
            self.controller
                .set_channel_leds(channel, zone.colors(), scale)?;
        }
        Ok(())
    }

    /// Push one zone's colors. Out-of-range zones are ignored.
    pub fn update_zone_leds(&mut self, zone: usize) -> Result<()> {
        if zone >= self.zones.len() {
            debug!(zone, "Ignoring update for unknown zone");
            return Ok(());
        }
        if !self.mode_applied {
            self.update_mode()?;
        }

        let scale = self.active().brightness_scale();
        self.controller
            .set_channel_leds(zone, self.zones[zone].colors(), scale)
    }

    /// The hub has no single-LED addressing, so this re-applies the mode.
    pub fn update_single_led(&mut self, _led: usize) -> Result<()> {
        self.update_mode()
    }

    /// Push the active hardware effect to every channel.
    ///
    /// Does nothing for the per-LED mode. Aborts before any traffic if a
    /// channel has no LEDs configured.
    pub fn update_mode(&mut self) -> Result<()> {
        if self.active_mode == CUSTOM_MODE {
            return Ok(());
        }

        if let Some(zone) = self.zones.iter().position(|z| z.leds_count() == 0) {
            debug!(zone, "Channel has no LEDs, not applying mode");
            return Ok(());
        }

        let mode = &self.modes[self.active_mode];
        let sync = mode.syncs_fan_and_edge();
        info!(mode = mode.name(), sync, "Applying mode");

        for (channel, zone) in self.zones.iter().enumerate() {
            let fan_idx = (zone.leds_count() / LEDS_PER_FAN).saturating_sub(1);
            self.controller.set_channel_mode(
                channel,
                mode.value(),
                mode.colors(),
                fan_idx,
                sync,
                mode.brightness(),
                mode.speed(),
                mode.direction(),
            )?;
        }

        self.mode_applied = true;
        Ok(())
    }

    /// Switch to the per-LED mode. Nothing is sent until the next LED update.
    pub fn set_custom_mode(&mut self) {
        self.active_mode = CUSTOM_MODE;
    }

    /// Select the active mode by index. Nothing is sent until the next
    /// update.
    pub fn set_active_mode(&mut self, index: usize) -> Result<()> {
        if index >= self.modes.len() {
            return Err(Error::OutOfRange {
                field: "mode",
                value: index as u32,
                min: 0,
                max: self.modes.len().saturating_sub(1) as u32,
            });
        }
        self.active_mode = index;
        Ok(())
    }

    pub fn set_mode_speed(&mut self, speed: u32) -> Result<()> {
        self.modes[self.active_mode].set_speed(speed)
    }

    pub fn set_mode_brightness(&mut self, brightness: u32) -> Result<()> {
        self.modes[self.active_mode].set_brightness(brightness)
    }

    pub fn set_mode_direction(&mut self, direction: Direction) {
        self.modes[self.active_mode].set_direction(direction);
    }

    pub fn set_mode_color(&mut self, slot: usize, color: RgbColor) -> Result<()> {
        self.modes[self.active_mode].set_color(slot, color)
    }

    /// Paint every LED of one zone.
    pub fn set_zone_color(&mut self, zone: usize, color: RgbColor) -> Result<()> {
        let zones = self.zones.len();
        let z = self.zones.get_mut(zone).ok_or(Error::OutOfRange {
            field: "zone",
            value: zone as u32,
            min: 0,
            max: zones.saturating_sub(1) as u32,
        })?;
        z.colors_mut().fill(color);
        Ok(())
    }

    /// Paint one LED by its index in [`Self::leds`].
    pub fn set_led_color(&mut self, led: usize, color: RgbColor) -> Result<()> {
        let out_of_range = Error::OutOfRange {
            field: "led",
            value: led as u32,
            min: 0,
            max: self.leds.len().saturating_sub(1) as u32,
        };
        let channel = self.leds.get(led).ok_or(out_of_range)?.channel;
        let offset: usize = self.zones[..channel].iter().map(Zone::leds_count).sum();
        self.zones[channel].colors_mut()[led - offset] = color;
        Ok(())
    }

    /// Paint every LED of every zone.
    pub fn fill_all(&mut self, color: RgbColor) {
        for zone in &mut self.zones {
            zone.colors_mut().fill(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::modes::{find_mode, ModeDescriptor, MODE_TABLE};
    use crate::protocol::{channel_addresses, with_selector};
    use crate::transport::mock::MockTransport;
    use crate::zones::ZoneType;

    fn lighting() -> HubLighting<MockTransport> {
        let mock = MockTransport::with_identity("0.9", "HUB-1");
        let controller =
            UniHubController::open(mock, "/dev/hidraw0", "Uni Hub", ControllerConfig::default())
                .unwrap();
        controller.transport().clear();
        HubLighting::new(controller)
    }

    fn written(hub: &HubLighting<MockTransport>) -> usize {
        hub.controller().transport().written().len()
    }

    #[test]
    fn starts_disabled_in_custom_mode() {
        let hub = lighting();
        assert_eq!(hub.zones().len(), 4);
        assert!(hub.zones().iter().all(|z| z.leds_count() == 0));
        assert!(hub.leds().is_empty());
        assert_eq!(hub.active_mode(), CUSTOM_MODE);
        assert!(!hub.mode_applied());
        assert_eq!(hub.vendor(), "Lian Li");
        assert_eq!(hub.description(), "Lian Li Uni Hub - SLINF");
        assert_eq!(hub.firmware_version(), "0.9");
        assert_eq!(hub.serial(), "HUB-1");
        assert_eq!(hub.location(), "HID: /dev/hidraw0");
    }

    #[test]
    fn resize_rebuilds_leds_and_geometry() {
        let mut hub = lighting();
        hub.resize_zone(1, 40);
        hub.resize_zone(3, 13);

        assert_eq!(hub.leds().len(), 53);
        assert_eq!(hub.leds()[0].name, "Channel 2, LED 1");
        assert_eq!(hub.leds()[40].name, "Channel 4, LED 1");
        assert_eq!(hub.leds()[40].channel, 3);
        assert!(matches!(hub.zones()[1].zone_type, ZoneType::Matrix(_)));
        assert_eq!(hub.zones()[3].zone_type, ZoneType::Linear);
        assert_eq!(hub.zones()[1].colors().len(), 40);
    }

    #[test]
    fn resize_resets_colors() {
        let mut hub = lighting();
        hub.resize_zone(0, 20);
        hub.fill_all(RgbColor::new(1, 2, 3));
        hub.resize_zone(2, 20);
        assert!(hub.zones()[0].colors().iter().all(|&c| c == RgbColor::BLACK));
    }

    #[test]
    fn resize_out_of_range_is_noop() {
        let mut hub = lighting();
        hub.resize_zone(0, 20);
        hub.set_zone_color(0, RgbColor::new(9, 9, 9)).unwrap();
        let zones = hub.zones().to_vec();
        let leds = hub.leds().to_vec();

        hub.resize_zone(0, 81);
        hub.resize_zone(4, 20);
        hub.resize_zone(usize::MAX, 0);

        assert_eq!(hub.zones(), zones.as_slice());
        assert_eq!(hub.leds(), leds.as_slice());
        assert_eq!(written(&hub), 0);
    }

    #[test]
    fn custom_mode_update_mode_is_silent() {
        let mut hub = lighting();
        hub.resize_zone(0, 20);
        hub.update_mode().unwrap();
        assert_eq!(written(&hub), 0);
        assert!(!hub.mode_applied());
    }

    #[test]
    fn zero_led_zone_aborts_mode() {
        let mut hub = lighting();
        for (zone, count) in [20, 40, 0, 80].into_iter().enumerate() {
            hub.resize_zone(zone, count);
        }
        for index in 1..hub.modes().len() {
            hub.set_active_mode(index).unwrap();
            hub.update_mode().unwrap();
        }
        assert_eq!(written(&hub), 0);
        assert!(!hub.mode_applied());
    }

    #[test]
    fn fan_index_follows_led_count() {
        let mut hub = lighting();
        for (zone, count) in [20, 40, 13, 80].into_iter().enumerate() {
            hub.resize_zone(zone, count);
        }
        hub.set_active_mode(find_mode(hub.modes(), "Rainbow Wave").unwrap())
            .unwrap();
        hub.update_mode().unwrap();

        let starts: Vec<u16> = hub
            .controller()
            .transport()
            .addresses()
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % 6 == 0)
            .map(|(_, a)| a)
            .collect();
        let expected: Vec<u16> = [0x01, 0x02, 0x01, 0x04]
            .into_iter()
            .enumerate()
            .map(|(ch, sel)| with_selector(channel_addresses(ch).unwrap().fan_hub_action, sel))
            .collect();
        assert_eq!(starts, expected);
        assert!(hub.mode_applied());
    }

    #[test]
    fn update_leds_applies_mode_once() {
        let mut hub = lighting();
        for zone in 0..4 {
            hub.resize_zone(zone, 20);
        }
        hub.set_active_mode(find_mode(hub.modes(), "Rainbow Morph").unwrap())
            .unwrap();

        hub.update_leds().unwrap();
        // 4 x (6 mode reports + 4 LED reports)
        assert_eq!(written(&hub), 40);

        hub.controller().transport().clear();
        hub.update_leds().unwrap();
        assert_eq!(written(&hub), 16);
    }

    #[test]
    fn update_zone_leds_targets_one_channel() {
        let mut hub = lighting();
        hub.resize_zone(2, 20);
        hub.update_zone_leds(2).unwrap();

        let addrs = channel_addresses(2).unwrap();
        let addresses = hub.controller().transport().addresses();
        assert_eq!(addresses.len(), 4);
        assert_eq!(addresses[3], with_selector(addrs.led_commit, 0x03));

        hub.controller().transport().clear();
        hub.update_zone_leds(9).unwrap();
        assert_eq!(written(&hub), 0);
    }

    #[test]
    fn custom_brightness_scales_colors() {
        let mut hub = lighting();
        hub.resize_zone(0, 20);
        hub.set_mode_brightness(25).unwrap();
        hub.set_zone_color(0, RgbColor::new(200, 100, 50)).unwrap();
        hub.update_zone_leds(0).unwrap();

        let state = hub.controller().channel_state(0).unwrap();
        assert_eq!(state.fan_colors[0].to_rgb(), RgbColor::new(100, 50, 25));
    }

    #[test]
    fn zero_brightness_max_scales_to_black() {
        let mut modes = crate::modes::default_modes();
        modes[CUSTOM_MODE] = Mode::new(ModeDescriptor {
            brightness_max: 0,
            default_brightness: 0,
            ..MODE_TABLE[CUSTOM_MODE]
        });
        let mock = MockTransport::with_identity("0.9", "HUB-1");
        let controller =
            UniHubController::open(mock, "/dev/hidraw0", "Uni Hub", ControllerConfig::default())
                .unwrap();
        let mut hub = HubLighting::with_modes(controller, modes).unwrap();
        hub.resize_zone(0, 20);
        hub.fill_all(RgbColor::new(255, 255, 255));
        hub.update_leds().unwrap();

        let state = hub.controller().channel_state(0).unwrap();
        assert_eq!(state.fan_colors[0].to_rgb(), RgbColor::BLACK);
    }

    fn open_controller() -> UniHubController<MockTransport> {
        let mock = MockTransport::with_identity("0.9", "HUB-1");
        UniHubController::open(mock, "/dev/hidraw0", "Uni Hub", ControllerConfig::default())
            .unwrap()
    }

    #[test]
    fn with_modes_requires_per_led_first() {
        let result = HubLighting::with_modes(open_controller(), Vec::new());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let mut modes = crate::modes::default_modes();
        modes.remove(CUSTOM_MODE);
        let result = HubLighting::with_modes(open_controller(), modes);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let hub = HubLighting::with_modes(open_controller(), crate::modes::default_modes()).unwrap();
        assert_eq!(hub.active().name(), "Custom");
    }

    #[test]
    fn update_single_led_reapplies_mode() {
        let mut hub = lighting();
        hub.resize_zone(0, 20);
        hub.resize_zone(1, 20);
        hub.resize_zone(2, 20);
        hub.resize_zone(3, 20);
        hub.set_active_mode(find_mode(hub.modes(), "Scan").unwrap()).unwrap();
        hub.update_single_led(5).unwrap();
        assert_eq!(written(&hub), 24);
    }

    #[test]
    fn set_custom_mode_sends_nothing() {
        let mut hub = lighting();
        hub.set_active_mode(4).unwrap();
        hub.set_custom_mode();
        assert_eq!(hub.active_mode(), CUSTOM_MODE);
        assert_eq!(written(&hub), 0);
    }

    #[test]
    fn set_active_mode_rejects_unknown_index() {
        let mut hub = lighting();
        assert!(hub.set_active_mode(12).is_err());
        assert_eq!(hub.active_mode(), CUSTOM_MODE);
    }

    #[test]
    fn mode_setters_act_on_active_mode() {
        let mut hub = lighting();
        let meteor = find_mode(hub.modes(), "Meteor").unwrap();
        hub.set_active_mode(meteor).unwrap();
        hub.set_mode_speed(1).unwrap();
        hub.set_mode_direction(Direction::RightToLeft);
        hub.set_mode_color(3, RgbColor::new(0, 0, 255)).unwrap();
        assert!(hub.set_mode_color(4, RgbColor::BLACK).is_err());
        assert!(hub.set_mode_brightness(5).is_err());

        let mode = hub.active();
        assert_eq!(mode.speed(), 1);
        assert_eq!(mode.direction(), Direction::RightToLeft);
        assert_eq!(mode.colors()[3], RgbColor::new(0, 0, 255));
        assert_eq!(mode.brightness(), 3);
    }

    #[test]
    fn set_led_color_maps_flat_index() {
        let mut hub = lighting();
        hub.resize_zone(0, 3);
        hub.resize_zone(2, 5);
        hub.set_led_color(4, RgbColor::new(7, 7, 7)).unwrap();
        assert_eq!(hub.zones()[2].colors()[1], RgbColor::new(7, 7, 7));
        assert!(hub.set_led_color(8, RgbColor::BLACK).is_err());
    }
}
