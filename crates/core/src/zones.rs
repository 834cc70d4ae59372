//! Zone model: one zone per hub channel.
//!
//! A channel wired with whole SL-INF fans (20, 40, 60 or 80 LEDs) is
//! presented as a matrix using the physical fan layout; anything else is a
//! plain linear strip.

use crate::color::RgbColor;
use crate::protocol::CHAN_LED_COUNT;

/// Marks a matrix cell with no LED behind it.
pub const NA: u32 = u32::MAX;

pub const MATRIX_HEIGHT: usize = 8;
pub const MATRIX_WIDTH: usize = 35;

/// LED counts that correspond to one to four complete fans.
pub const MATRIX_LED_COUNTS: [usize; 4] = [20, 40, 60, 80];

/// Fixed coordinate map from (row, col) to LED index.
#[derive(Debug, PartialEq, Eq)]
pub struct MatrixMap {
    pub height: usize,
    pub width: usize,
    pub map: [[u32; MATRIX_WIDTH]; MATRIX_HEIGHT],
}

impl MatrixMap {
    /// LED index at a cell, or `None` for empty and out-of-bounds cells.
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        self.map
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .filter(|&v| v != NA)
    }

    /// Cells that address an LED below `led_count`.
    pub fn valid_cells(&self, led_count: usize) -> usize {
        self.map
            .iter()
            .flatten()
            .filter(|&&v| v != NA && (v as usize) < led_count)
            .count()
    }
}

/// Four fans side by side; each fan is an inner ring of 8 and an outer ring of 12.
#[rustfmt::skip]
pub static MATRIX_MAP: MatrixMap = MatrixMap {
    height: MATRIX_HEIGHT,
    width: MATRIX_WIDTH,
    map: [
        [NA, NA, 10, NA, NA, 11, NA, NA, NA, NA, NA, 30, NA, NA, 31, NA, NA, NA, NA, NA, 50, NA, NA, 51, NA, NA, NA, NA, NA, 70, NA, NA, 71, NA, NA],
        [NA,  9, NA, NA, NA, NA, 12, NA, NA, NA, 29, NA, NA, NA, NA, 32, NA, NA, NA, 49, NA, NA, NA, NA, 52, NA, NA, NA, 69, NA, NA, NA, NA, 72, NA],
        [ 8, NA, NA,  1,  2, NA, NA, 13, NA, 28, NA, NA, 21, 22, NA, NA, 33, NA, 48, NA, NA, 41, 42, NA, NA, 53, NA, 68, NA, NA, 61, 62, NA, NA, 73],
        [NA, NA,  0, NA, NA,  3, NA, NA, NA, NA, NA, 20, NA, NA, 23, NA, NA, NA, NA, NA, 40, NA, NA, 43, NA, NA, NA, NA, NA, 60, NA, NA, 63, NA, NA],
        [NA, NA,  7, NA, NA,  4, NA, NA, NA, NA, NA, 27, NA, NA, 24, NA, NA, NA, NA, NA, 47, NA, NA, 44, NA, NA, NA, NA, NA, 67, NA, NA, 64, NA, NA],
        [19, NA, NA,  6,  5, NA, NA, 14, NA, 39, NA, NA, 26, 25, NA, NA, 34, NA, 59, NA, NA, 46, 45, NA, NA, 54, NA, 79, NA, NA, 66, 65, NA, NA, 74],
        [NA, 18, NA, NA, NA, NA, 15, NA, NA, NA, 38, NA, NA, NA, NA, 35, NA, NA, NA, 58, NA, NA, NA, NA, 55, NA, NA, NA, 78, NA, NA, NA, NA, 75, NA],
        [NA, NA, 17, NA, NA, 16, NA, NA, NA, NA, NA, 37, NA, NA, 36, NA, NA, NA, NA, NA, 57, NA, NA, 56, NA, NA, NA, NA, NA, 77, NA, NA, 76, NA, NA],
    ],
};

/// Zone geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneType {
    Linear,
    Matrix(&'static MatrixMap),
}

impl ZoneType {
    /// Geometry for a given LED count.
    pub fn for_led_count(count: usize) -> Self {
        if MATRIX_LED_COUNTS.contains(&count) {
            Self::Matrix(&MATRIX_MAP)
        } else {
            Self::Linear
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Matrix(_) => "matrix",
        }
    }
}

/// One lighting zone, backed by one hub channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub zone_type: ZoneType,
    pub leds_min: usize,
    pub leds_max: usize,
    leds_count: usize,
    colors: Vec<RgbColor>,
}

impl Zone {
    /// An empty zone for channel `index` (0-based).
    pub fn new(index: usize) -> Self {
        Self {
            name: format!("Channel {}", index + 1),
            zone_type: ZoneType::Linear,
            leds_min: 0,
            leds_max: CHAN_LED_COUNT,
            leds_count: 0,
            colors: Vec::new(),
        }
    }

    pub fn leds_count(&self) -> usize {
        self.leds_count
    }

    pub fn colors(&self) -> &[RgbColor] {
        &self.colors
    }

    pub fn colors_mut(&mut self) -> &mut [RgbColor] {
        &mut self.colors
    }

    /// Whether `count` is inside this zone's bounds.
    pub fn accepts(&self, count: usize) -> bool {
        (self.leds_min..=self.leds_max).contains(&count)
    }

    pub(crate) fn set_leds_count(&mut self, count: usize) {
        self.leds_count = count;
    }

    /// Re-derive geometry and reset the color buffer for the current count.
    pub(crate) fn rebuild(&mut self) {
        self.zone_type = ZoneType::for_led_count(self.leds_count);
        self.colors = vec![RgbColor::BLACK; self.leds_count];
    }
}

/// One addressable LED in the flattened device LED list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Led {
    pub name: String,
    /// Channel the LED belongs to.
    pub channel: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn matrix_counts_select_matrix_geometry() {
        for count in MATRIX_LED_COUNTS {
            match ZoneType::for_led_count(count) {
                ZoneType::Matrix(map) => {
                    assert_eq!((map.height, map.width), (8, 35));
                    assert_eq!(map.valid_cells(count), count);
                    let cells = map.height * map.width;
                    let sentinels = map.map.iter().flatten().filter(|&&v| v == NA).count();
                    assert_eq!(sentinels, cells - CHAN_LED_COUNT);
                }
                ZoneType::Linear => panic!("{count} LEDs should be a matrix"),
            }
        }
    }

    #[test]
    fn other_counts_are_linear() {
        for count in (0..=CHAN_LED_COUNT).filter(|c| !MATRIX_LED_COUNTS.contains(c)) {
            assert_eq!(ZoneType::for_led_count(count), ZoneType::Linear);
        }
    }

    #[test]
    fn matrix_indices_are_unique_and_complete() {
        let indices: HashSet<u32> = MATRIX_MAP
            .map
            .iter()
            .flatten()
            .copied()
            .filter(|&v| v != NA)
            .collect();
        assert_eq!(indices.len(), CHAN_LED_COUNT);
        assert!(indices.iter().all(|&i| (i as usize) < CHAN_LED_COUNT));
    }

    #[test]
    fn matrix_lookup() {
        assert_eq!(MATRIX_MAP.get(3, 2), Some(0));
        assert_eq!(MATRIX_MAP.get(0, 0), None);
        assert_eq!(MATRIX_MAP.get(8, 0), None);
        assert_eq!(MATRIX_MAP.get(0, 35), None);
    }

    #[test]
    fn zones_share_one_map() {
        let (a, b) = (ZoneType::for_led_count(20), ZoneType::for_led_count(80));
        match (a, b) {
            (ZoneType::Matrix(x), ZoneType::Matrix(y)) => assert!(std::ptr::eq(x, y)),
            _ => panic!("expected matrix zones"),
        }
    }

    #[test]
    fn new_zone_is_empty_linear() {
        let zone = Zone::new(2);
        assert_eq!(zone.name, "Channel 3");
        assert_eq!(zone.leds_count(), 0);
        assert_eq!(zone.zone_type, ZoneType::Linear);
        assert!(zone.accepts(80));
        assert!(!zone.accepts(81));
    }
}
