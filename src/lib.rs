//! Inspection of Solana program account data
//!
//! This crate decodes sBPF bytecode into a readable disassembly listing and
//! renders raw account bytes as a Hilbert-curve heatmap, chunk by chunk.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod constants;
pub mod errors;
pub mod input;
pub mod models;
pub mod visualizer;

use config::InspectorConfig;
use errors::InspectorResult;
use models::display::DisplayRow;
use models::render::RenderRequest;

/// Disassemble `buffer` from offset 0, producing at most `limit` rows
pub fn disassemble(buffer: &[u8], limit: usize) -> Vec<DisplayRow> {
    analyzer::bytecode::format(buffer, limit)
}

/// Render `data` as a `base_size x base_size` RGBA heatmap on a background task
pub async fn render_heatmap(
    data: impl Into<std::sync::Arc<[u8]>>,
    base_size: usize,
    config: &InspectorConfig,
) -> InspectorResult<Vec<u8>> {
    let handle = visualizer::spawn_render(RenderRequest::new(data, base_size), config)?;
    handle.collect_image().await
}

/// Version of the inspector
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
