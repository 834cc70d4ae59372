//! Lighting modes offered by the hub.
//!
//! Each mode pairs a fixed descriptor (name, device byte, capabilities and
//! UI ranges) with settings the caller can adjust within those ranges.
//! Speed and brightness are discrete levels; the encoder maps them through
//! lookup tables, except for the per-LED mode whose brightness becomes a
//! multiplicative factor on the color bytes.

use serde::Serialize;

use crate::color::RgbColor;
use crate::error::{Error, Result};
use crate::protocol::{effects, Direction};
use crate::safety::validate_level;

/// Index of the per-LED mode in [`MODE_TABLE`].
pub const CUSTOM_MODE: usize = 0;

/// Where a mode takes its colors from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorMode {
    None,
    PerLed,
    ModeSpecific,
}

/// Parameters a mode honors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModeCaps {
    pub per_led_color: bool,
    pub mode_specific_color: bool,
    pub speed: bool,
    pub direction: bool,
    pub brightness: bool,
}

/// Immutable description of one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeDescriptor {
    pub name: &'static str,
    /// Device mode byte.
    pub value: u8,
    pub caps: ModeCaps,
    pub color_mode: ColorMode,
    pub speed_min: u32,
    pub speed_max: u32,
    pub brightness_min: u32,
    pub brightness_max: u32,
    pub colors_min: u32,
    pub colors_max: u32,
    pub default_speed: u32,
    pub default_brightness: u32,
}

const NO_CAPS: ModeCaps = ModeCaps {
    per_led_color: false,
    mode_specific_color: false,
    speed: false,
    direction: false,
    brightness: false,
};

/// Speed + brightness + mode colors, optionally with direction.
const fn effect_caps(direction: bool) -> ModeCaps {
    ModeCaps {
        per_led_color: false,
        mode_specific_color: true,
        speed: true,
        direction,
        brightness: true,
    }
}

/// A hardware effect with the usual 0..=4 speed and brightness levels.
const fn effect(name: &'static str, value: u8, caps: ModeCaps, colors: u32) -> ModeDescriptor {
    ModeDescriptor {
        name,
        value,
        caps,
        color_mode: if colors == 0 {
            ColorMode::None
        } else {
            ColorMode::ModeSpecific
        },
        speed_min: 0,
        speed_max: if caps.speed { 4 } else { 0 },
        brightness_min: 0,
        brightness_max: 4,
        colors_min: 0,
        colors_max: colors,
        default_speed: if caps.speed { 3 } else { 0 },
        default_brightness: 3,
    }
}

/// Every mode, in menu order. Index 0 is the per-LED mode.
pub static MODE_TABLE: [ModeDescriptor; 12] = [
    ModeDescriptor {
        name: "Custom",
        value: effects::STATIC_COLOR,
        caps: ModeCaps {
            per_led_color: true,
            brightness: true,
            ..NO_CAPS
        },
        color_mode: ColorMode::PerLed,
        speed_min: 0,
        speed_max: 0,
        brightness_min: 0,
        brightness_max: 50,
        colors_min: 0,
        colors_max: 0,
        default_speed: 0,
        default_brightness: 37,
    },
    effect(
        "Rainbow Wave",
        effects::RAINBOW,
        ModeCaps {
            speed: true,
            direction: true,
            brightness: true,
            ..NO_CAPS
        },
        0,
    ),
    effect(
        "Rainbow Morph",
        effects::RAINBOW_MORPH,
        ModeCaps {
            speed: true,
            brightness: true,
            ..NO_CAPS
        },
        0,
    ),
    effect(
        "Static Color",
        effects::STATIC_COLOR,
        ModeCaps {
            mode_specific_color: true,
            brightness: true,
            ..NO_CAPS
        },
        4,
    ),
    effect("Breathing", effects::BREATHING, effect_caps(false), 4),
    effect("Runway", effects::RUNWAY, effect_caps(false), 2),
    effect("Meteor", effects::METEOR, effect_caps(true), 4),
    effect("Warning", effects::WARNING, effect_caps(false), 4),
    effect("Voice", effects::VOICE, effect_caps(true), 4),
    effect("Stack", effects::STACK, effect_caps(true), 2),
    effect("Tide", effects::TIDE, effect_caps(false), 4),
    effect("Scan", effects::SCAN, effect_caps(false), 2),
];

/// Adjustable part of a mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeSettings {
    pub speed: u32,
    pub brightness: u32,
    pub direction: Direction,
    /// Mode-specific colors; length is fixed at `colors_max`.
    pub colors: Vec<RgbColor>,
}

/// A mode descriptor together with its current settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mode {
    pub descriptor: ModeDescriptor,
    settings: ModeSettings,
}

impl Mode {
    pub fn new(descriptor: ModeDescriptor) -> Self {
        let settings = ModeSettings {
            speed: descriptor.default_speed,
            brightness: descriptor.default_brightness,
            direction: Direction::LeftToRight,
            colors: vec![RgbColor::BLACK; descriptor.colors_max as usize],
        };
        Self {
            descriptor,
            settings,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Device mode byte.
    pub fn value(&self) -> u8 {
        self.descriptor.value
    }

    pub fn settings(&self) -> &ModeSettings {
        &self.settings
    }

    pub fn speed(&self) -> u32 {
        self.settings.speed
    }

    pub fn brightness(&self) -> u32 {
        self.settings.brightness
    }

    pub fn direction(&self) -> Direction {
        self.settings.direction
    }

    pub fn colors(&self) -> &[RgbColor] {
        &self.settings.colors
    }

    pub fn set_speed(&mut self, speed: u32) -> Result<()> {
        let d = &self.descriptor;
        self.settings.speed = validate_level("speed", speed, d.speed_min, d.speed_max)?;
        Ok(())
    }

    pub fn set_brightness(&mut self, brightness: u32) -> Result<()> {
        let d = &self.descriptor;
        self.settings.brightness =
            validate_level("brightness", brightness, d.brightness_min, d.brightness_max)?;
        Ok(())
    }

    /// Modes without a direction capability keep the value but the hub ignores it.
    pub fn set_direction(&mut self, direction: Direction) {
        self.settings.direction = direction;
    }

    /// Set one mode-specific color slot.
    pub fn set_color(&mut self, slot: usize, color: RgbColor) -> Result<()> {
        let slots = self.settings.colors.len();
        match self.settings.colors.get_mut(slot) {
            Some(entry) => {
                *entry = color;
                Ok(())
            }
            None => Err(Error::OutOfRange {
                field: "color_slot",
                value: slot as u32,
                min: 0,
                max: slots.saturating_sub(1) as u32,
            }),
        }
    }

    /// Brightness as a factor of the mode's maximum; 0.0 when the maximum is 0.
    pub fn brightness_scale(&self) -> f32 {
        if self.descriptor.brightness_max == 0 {
            return 0.0;
        }
        self.settings.brightness as f32 / self.descriptor.brightness_max as f32
    }

    /// Whether this mode drives fan and edge sub-zones together.
    pub fn syncs_fan_and_edge(&self) -> bool {
        effects::syncs_fan_and_edge(self.descriptor.value)
    }
}

/// The full mode list with default settings.
pub fn default_modes() -> Vec<Mode> {
    MODE_TABLE.iter().copied().map(Mode::new).collect()
}

/// Find a mode by name, ignoring case, spaces, dashes and underscores.
pub fn find_mode(modes: &[Mode], name: &str) -> Option<usize> {
    let normalize = |s: &str| -> String {
        s.chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect()
    };
    let wanted = normalize(name);
    modes.iter().position(|m| normalize(m.name()) == wanted)
}
