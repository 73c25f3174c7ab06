//! Byte value classification for the heatmap

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::constants::byte_ranges::{ByteRange, BYTE_RANGES};

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Opaque black, used for pixels with no data behind them
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Split a 0xRRGGBB value
    pub const fn from_hex(color: u32) -> Self {
        Rgb((color >> 16) as u8, (color >> 8) as u8, color as u8)
    }

    /// RGBA bytes with full alpha
    pub fn to_rgba(self) -> [u8; 4] {
        [self.0, self.1, self.2, 255]
    }
}

/// Label and color assigned to a byte value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteClass {
    pub label: &'static str,
    pub rgb: Rgb,
}

/// Per-byte classification, built once from [`BYTE_RANGES`]
static COLOR_TABLE: Lazy<[ByteClass; 256]> = Lazy::new(|| build_table(BYTE_RANGES));

/// RGB triples derived from the color table
static RGB_TABLE: Lazy<[Rgb; 256]> = Lazy::new(|| {
    let mut rgb = [Rgb::BLACK; 256];
    for (entry, class) in rgb.iter_mut().zip(COLOR_TABLE.iter()) {
        *entry = class.rgb;
    }
    rgb
});

fn build_table(ranges: &[ByteRange]) -> [ByteClass; 256] {
    debug_assert!(covers_every_byte(ranges), "byte ranges must partition 0x00..=0xFF");

    let mut table = [ByteClass { label: "unmapped", rgb: Rgb::BLACK }; 256];
    for range in ranges {
        for byte in range.start..=range.end {
            table[byte as usize] = ByteClass {
                label: range.label,
                rgb: Rgb::from_hex(range.color),
            };
        }
    }
    table
}

/// Check that every byte value is covered by exactly one range
pub fn covers_every_byte(ranges: &[ByteRange]) -> bool {
    let mut hits = [0u8; 256];
    for range in ranges {
        if range.start > range.end {
            return false;
        }
        for byte in range.start..=range.end {
            hits[byte as usize] = hits[byte as usize].saturating_add(1);
        }
    }
    hits.iter().all(|&count| count == 1)
}

/// Classify a byte value
pub fn classify(byte: u8) -> ByteClass {
    COLOR_TABLE[byte as usize]
}

/// Color of a byte value
#[inline]
pub fn byte_color(byte: u8) -> Rgb {
    RGB_TABLE[byte as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_partition_byte_domain() {
        assert!(covers_every_byte(BYTE_RANGES));
        let covered: usize = BYTE_RANGES.iter().map(|r| r.len()).sum();
        assert_eq!(covered, 256);

        for byte in 0..=255u8 {
            let matches = BYTE_RANGES.iter().filter(|r| r.contains(byte)).count();
            assert_eq!(matches, 1, "byte {:#04x} matched {} ranges", byte, matches);
        }
    }

    #[test]
    fn test_partition_check_rejects_gaps_and_overlaps() {
        let gap = [
            ByteRange { start: 0x00, end: 0x7f, label: "low", color: 0 },
            ByteRange { start: 0x81, end: 0xff, label: "high", color: 0 },
        ];
        assert!(!covers_every_byte(&gap));

        let overlap = [
            ByteRange { start: 0x00, end: 0x80, label: "low", color: 0 },
            ByteRange { start: 0x80, end: 0xff, label: "high", color: 0 },
        ];
        assert!(!covers_every_byte(&overlap));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(b'A').label, "uppercase");
        assert_eq!(classify(b'z').label, "lowercase");
        assert_eq!(classify(b'7').label, "digit");
        assert_eq!(classify(b' ').label, "whitespace");
        assert_eq!(classify(b'\n').label, "whitespace");
        assert_eq!(classify(b'{').label, "punctuation");
        assert_eq!(classify(0x00).label, "null");
        assert_eq!(classify(0x1b).label, "control");
        assert_eq!(classify(0x7f).label, "delete");
        assert_eq!(classify(0x90).label, "extended");
        assert_eq!(classify(0xfe).label, "high");
        assert_eq!(classify(0xff).label, "full");
    }

    #[test]
    fn test_rgb_table_matches_classes() {
        for byte in 0..=255u8 {
            assert_eq!(byte_color(byte), classify(byte).rgb);
        }
        assert_eq!(byte_color(0xff), Rgb(255, 255, 255));
        assert_eq!(Rgb::from_hex(0x3cba54), Rgb(0x3c, 0xba, 0x54));
        assert_eq!(Rgb(1, 2, 3).to_rgba(), [1, 2, 3, 255]);
    }
}
