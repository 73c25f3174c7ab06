//! Byte value categories for the heatmap
//!
//! The ranges below partition 0x00..=0xFF: every byte value falls into
//! exactly one range. Colors are 0xRRGGBB.

/// A contiguous, inclusive range of byte values sharing a label and color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte value in the range
    pub start: u8,
    /// Last byte value in the range (inclusive)
    pub end: u8,
    /// Category label
    pub label: &'static str,
    /// Display color as 0xRRGGBB
    pub color: u32,
}

impl ByteRange {
    const fn new(start: u8, end: u8, label: &'static str, color: u32) -> Self {
        Self { start, end, label, color }
    }

    /// Check whether a byte value falls inside this range
    pub fn contains(&self, byte: u8) -> bool {
        self.start <= byte && byte <= self.end
    }

    /// Number of byte values covered
    pub fn len(&self) -> usize {
        (self.end as usize) - (self.start as usize) + 1
    }
}

/// Ordered partition of the byte domain
pub const BYTE_RANGES: &[ByteRange] = &[
    ByteRange::new(0x00, 0x00, "null", 0x000000),
    ByteRange::new(0x01, 0x08, "control", 0x1f3a93),
    ByteRange::new(0x09, 0x0d, "whitespace", 0x4a90d9),
    ByteRange::new(0x0e, 0x1f, "control", 0x1f3a93),
    ByteRange::new(0x20, 0x20, "whitespace", 0x4a90d9),
    ByteRange::new(0x21, 0x2f, "punctuation", 0xe8a33d),
    ByteRange::new(0x30, 0x39, "digit", 0x3cba54),
    ByteRange::new(0x3a, 0x40, "punctuation", 0xe8a33d),
    ByteRange::new(0x41, 0x5a, "uppercase", 0xd94f70),
    ByteRange::new(0x5b, 0x60, "punctuation", 0xe8a33d),
    ByteRange::new(0x61, 0x7a, "lowercase", 0xf27fa5),
    ByteRange::new(0x7b, 0x7e, "punctuation", 0xe8a33d),
    ByteRange::new(0x7f, 0x7f, "delete", 0x8e44ad),
    ByteRange::new(0x80, 0xbf, "extended", 0x7a6a53),
    ByteRange::new(0xc0, 0xfe, "high", 0xb0a58f),
    ByteRange::new(0xff, 0xff, "full", 0xffffff),
];
