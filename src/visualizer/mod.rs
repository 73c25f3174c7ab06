//! Heatmap rendering and instruction view state

pub mod color;
pub mod hilbert;
pub mod render;

use std::ops::Range;

use crate::analyzer::CodeListing;
use crate::errors::{InspectorError, InspectorResult};
use crate::models::display::DisplayRow;
use crate::models::instruction::InstructionCategory;
use crate::models::render::BYTES_PER_PIXEL;

pub use self::color::{byte_color, classify, ByteClass, Rgb};
pub use self::hilbert::{hilbert_index, hilbert_point, HilbertLookupTable};
pub use self::render::{spawn_render, ChunkedRenderer, RenderCanceller, RenderChunks, RenderHandle, RenderOutcome};

/// Legend color for an instruction category
pub fn category_color(category: InstructionCategory) -> Rgb {
    match category {
        InstructionCategory::Alu => Rgb::from_hex(0x4fc3f7),
        InstructionCategory::Alu64 => Rgb::from_hex(0x0288d1),
        InstructionCategory::Jmp => Rgb::from_hex(0xe53935),
        InstructionCategory::Jmp32 => Rgb::from_hex(0xff8a65),
        InstructionCategory::Ld => Rgb::from_hex(0x43a047),
        InstructionCategory::Ldx => Rgb::from_hex(0x9ccc65),
        InstructionCategory::St => Rgb::from_hex(0x8e24aa),
        InstructionCategory::Stx => Rgb::from_hex(0xce93d8),
        InstructionCategory::Unknown => Rgb::from_hex(0x757575),
    }
}

/// Every category with its color, in display order
pub fn legend() -> Vec<(InstructionCategory, Rgb)> {
    InstructionCategory::ALL
        .iter()
        .map(|&category| (category, category_color(category)))
        .collect()
}

/// Encode a square RGBA image as binary PPM (P6). Alpha is dropped.
pub fn encode_ppm(rgba: &[u8], base_size: usize) -> InspectorResult<Vec<u8>> {
    let expected = base_size * base_size * BYTES_PER_PIXEL;
    if rgba.len() != expected {
        return Err(InspectorError::Render(format!(
            "Image has {} bytes, expected {} for {}x{}",
            rgba.len(),
            expected,
            base_size,
            base_size
        )));
    }

    let header = format!("P6\n{} {}\n255\n", base_size, base_size);
    let mut out = Vec::with_capacity(header.len() + base_size * base_size * 3);
    out.extend_from_slice(header.as_bytes());
    for pixel in rgba.chunks_exact(BYTES_PER_PIXEL) {
        out.extend_from_slice(&pixel[..3]);
    }
    Ok(out)
}

/// Disassembly rows plus the current selection
#[derive(Debug, Clone, Default)]
pub struct InstructionView {
    rows: Vec<DisplayRow>,
    /// Added to row offsets when reporting byte ranges
    base_offset: usize,
    selected: Option<usize>,
}

impl InstructionView {
    pub fn new(rows: Vec<DisplayRow>) -> Self {
        Self {
            rows,
            base_offset: 0,
            selected: None,
        }
    }

    /// View over a code listing; byte ranges are reported in account offsets
    pub fn from_listing(listing: &CodeListing) -> Self {
        Self {
            rows: listing.program.rows.clone(),
            base_offset: listing.file_offset,
            selected: None,
        }
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Select a row. An index past the end clears the selection.
    pub fn select(&mut self, index: usize) -> Option<&DisplayRow> {
        if index < self.rows.len() {
            self.selected = Some(index);
            self.rows.get(index)
        } else {
            self.selected = None;
            None
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Index of the selected row
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&DisplayRow> {
        self.selected.and_then(|index| self.rows.get(index))
    }

    pub fn is_highlighted(&self, index: usize) -> bool {
        self.selected == Some(index)
    }

    /// Legend color of a row's category
    pub fn row_color(&self, index: usize) -> Option<Rgb> {
        self.rows
            .get(index)
            .map(|row| category_color(row.decoded.category))
    }

    /// Bytes covered by the selected instruction
    pub fn selected_byte_range(&self) -> Option<Range<usize>> {
        self.selected_row().map(|row| {
            let range = row.byte_range();
            range.start + self.base_offset..range.end + self.base_offset
        })
    }
}
