//! Render request, plan and chunk models

use serde::Serialize;
use std::sync::Arc;

use crate::errors::{InspectorError, InspectorResult};

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Hard ceiling for any configured maximum dimension. A lookup table for
/// 8192 needs 2^26 u32 entries (256 MiB). The table cache keeps only the most
/// recent table of this size class, see `cache::LARGE_ORDER`.
pub const MAX_SUPPORTED_BASE_SIZE: usize = 8192;

/// Input message for a render: the account bytes and the square dimension
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Account data, shared with any concurrent disassembly
    pub data: Arc<[u8]>,
    /// Width and height of the output image in pixels
    pub base_size: usize,
}

impl RenderRequest {
    pub fn new(data: impl Into<Arc<[u8]>>, base_size: usize) -> Self {
        Self {
            data: data.into(),
            base_size,
        }
    }
}

/// One output message: RGBA pixels for `[chunk_start, chunk_end)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderChunk {
    /// `(chunk_end - chunk_start) * 4` bytes of RGBA
    pub image_data: Vec<u8>,
    /// First pixel index covered
    pub chunk_start: usize,
    /// One past the last pixel index covered
    pub chunk_end: usize,
}

impl RenderChunk {
    /// Number of pixels in this chunk
    pub fn pixel_count(&self) -> usize {
        self.chunk_end - self.chunk_start
    }

    /// RGBA value of the pixel at absolute index `pixel`, if it is in this chunk
    pub fn pixel(&self, pixel: usize) -> Option<[u8; 4]> {
        if pixel < self.chunk_start || pixel >= self.chunk_end {
            return None;
        }
        let at = (pixel - self.chunk_start) * BYTES_PER_PIXEL;
        let px = &self.image_data[at..at + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Where a pixel's color comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelSource {
    /// Classify the byte at this buffer offset
    Data(usize),
    /// Outside the rendered square or the curve grid, or no data at all
    Sentinel,
}

/// Geometry of a render, derived from the buffer length and dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPlan {
    pub base_size: usize,
    /// ceil(log2(base_size))
    pub order: u32,
    /// 2^order
    pub grid_size: usize,
    /// base_size^2
    pub total_pixels: usize,
    pub buffer_len: usize,
}

impl RenderPlan {
    /// Plan a render, rejecting dimensions outside `1..=max_base_size`
    pub fn new(buffer_len: usize, base_size: usize, max_base_size: usize) -> InspectorResult<Self> {
        let max = max_base_size.min(MAX_SUPPORTED_BASE_SIZE);
        if base_size == 0 || base_size > max {
            return Err(InspectorError::InvalidDimension { base_size, max });
        }

        let order = curve_order(base_size);
        let grid_size = 1usize << order;

        Ok(Self {
            base_size,
            order,
            grid_size,
            total_pixels: base_size * base_size,
            buffer_len,
        })
    }

    /// Number of cells on the curve grid
    pub fn grid_cells(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// Bytes of input per Hilbert index step
    pub fn data_scale(&self) -> f64 {
        let last = self.grid_cells() - 1;
        if last == 0 {
            return 0.0;
        }
        self.buffer_len as f64 / last as f64
    }

    /// Buffer offset for a Hilbert index, clamped to the last byte.
    ///
    /// Integer form of `floor(index * data_scale)`.
    pub fn data_offset(&self, hilbert_index: u32) -> usize {
        let last = (self.grid_cells() - 1) as u128;
        if last == 0 || self.buffer_len == 0 {
            return 0;
        }
        let scaled = (hilbert_index as u128 * self.buffer_len as u128) / last;
        (scaled as usize).min(self.buffer_len - 1)
    }

    /// Coordinates of a row-major pixel index in the output square
    pub fn coordinates(&self, pixel: usize) -> (usize, usize) {
        (pixel % self.base_size, pixel / self.base_size)
    }

    /// Check whether `(x, y)` falls outside the rendered square or the curve grid
    pub fn is_out_of_grid(&self, x: usize, y: usize) -> bool {
        x >= self.base_size || y >= self.base_size || x >= self.grid_size || y >= self.grid_size
    }
}

/// Curve order for a dimension: ceil(log2(base_size))
pub fn curve_order(base_size: usize) -> u32 {
    if base_size <= 1 {
        0
    } else {
        usize::BITS - (base_size - 1).leading_zeros()
    }
}
