//! Chunked heatmap rendering
//!
//! Every pixel of a `base_size x base_size` image is mapped through the
//! Hilbert curve to an offset in the account buffer and colored by the byte
//! found there. Pixels are produced in fixed-size chunks, either from a plain
//! iterator or from a tokio task that yields between chunks.

use log::{debug, info, warn};
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cache::LookupCache;
use crate::config::InspectorConfig;
use crate::errors::{InspectorError, InspectorResult};
use crate::models::render::{PixelSource, RenderChunk, RenderPlan, RenderRequest, BYTES_PER_PIXEL};
use crate::visualizer::color::{byte_color, Rgb};
use crate::visualizer::hilbert::HilbertLookupTable;

/// Renders one request chunk by chunk
#[derive(Debug, Clone)]
pub struct ChunkedRenderer {
    data: Arc<[u8]>,
    plan: RenderPlan,
    table: Arc<HilbertLookupTable>,
    chunk_pixels: usize,
}

impl ChunkedRenderer {
    /// Plan a render and fetch its lookup table from the cache
    pub fn new(request: RenderRequest, config: &InspectorConfig) -> InspectorResult<Self> {
        let plan = plan_request(&request, config)?;
        let table = LookupCache::get_or_build(plan.order);
        Ok(Self::from_parts(request.data, plan, table, config.chunk_pixels))
    }

    fn from_parts(
        data: Arc<[u8]>,
        plan: RenderPlan,
        table: Arc<HilbertLookupTable>,
        chunk_pixels: usize,
    ) -> Self {
        debug_assert_eq!(table.order(), plan.order);
        Self {
            data,
            plan,
            table,
            chunk_pixels: chunk_pixels.max(1),
        }
    }

    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }

    /// Number of chunks the render will produce
    pub fn chunk_count(&self) -> usize {
        (self.plan.total_pixels + self.chunk_pixels - 1) / self.chunk_pixels
    }

    /// Where the color of pixel `(x, y)` comes from
    pub fn locate(&self, x: usize, y: usize) -> PixelSource {
        if self.data.is_empty() || self.plan.is_out_of_grid(x, y) {
            return PixelSource::Sentinel;
        }
        match self.table.get(x, y) {
            Some(index) => PixelSource::Data(self.plan.data_offset(index)),
            None => PixelSource::Sentinel,
        }
    }

    /// Color of pixel `(x, y)`
    pub fn pixel_color(&self, x: usize, y: usize) -> Rgb {
        match self.locate(x, y) {
            PixelSource::Data(offset) => byte_color(self.data[offset]),
            PixelSource::Sentinel => Rgb::BLACK,
        }
    }

    /// Render pixels `[chunk_start, chunk_end)` in row-major order
    pub fn render_chunk(&self, chunk_start: usize, chunk_end: usize) -> RenderChunk {
        let chunk_end = chunk_end.min(self.plan.total_pixels);
        let chunk_start = chunk_start.min(chunk_end);

        let mut image_data = Vec::with_capacity((chunk_end - chunk_start) * BYTES_PER_PIXEL);
        for pixel in chunk_start..chunk_end {
            let (x, y) = self.plan.coordinates(pixel);
            image_data.extend_from_slice(&self.pixel_color(x, y).to_rgba());
        }

        RenderChunk {
            image_data,
            chunk_start,
            chunk_end,
        }
    }

    /// Lazy stream of chunks covering the whole image
    pub fn chunks(self) -> RenderChunks {
        RenderChunks {
            renderer: self,
            next_pixel: 0,
        }
    }

    /// Render the whole image into one RGBA buffer
    pub fn render_all(self) -> Vec<u8> {
        let mut image = Vec::with_capacity(self.plan.total_pixels * BYTES_PER_PIXEL);
        for chunk in self.chunks() {
            image.extend_from_slice(&chunk.image_data);
        }
        image
    }
}

fn plan_request(request: &RenderRequest, config: &InspectorConfig) -> InspectorResult<RenderPlan> {
    config.validate()?;
    let plan = RenderPlan::new(request.data.len(), request.base_size, config.max_base_size)?;

    if request.data.is_empty() {
        warn!("Rendering an empty buffer; every pixel will be black");
    }
    info!(
        "Rendering {} bytes at {}x{} (order {}, grid {}, {:.3} bytes per cell)",
        plan.buffer_len,
        plan.base_size,
        plan.base_size,
        plan.order,
        plan.grid_size,
        plan.data_scale()
    );
    Ok(plan)
}

/// Iterator over the chunks of one render. It cannot be restarted.
#[derive(Debug)]
pub struct RenderChunks {
    renderer: ChunkedRenderer,
    next_pixel: usize,
}

impl RenderChunks {
    pub fn plan(&self) -> &RenderPlan {
        self.renderer.plan()
    }
}

impl Iterator for RenderChunks {
    type Item = RenderChunk;

    fn next(&mut self) -> Option<RenderChunk> {
        let total = self.renderer.plan.total_pixels;
        if self.next_pixel >= total {
            return None;
        }

        let start = self.next_pixel;
        let end = total.min(start + self.renderer.chunk_pixels);
        self.next_pixel = end;

        debug!("Rendering pixels {}..{} of {}", start, end, total);
        Some(self.renderer.render_chunk(start, end))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining_pixels = self.renderer.plan.total_pixels.saturating_sub(self.next_pixel);
        let remaining = (remaining_pixels + self.renderer.chunk_pixels - 1) / self.renderer.chunk_pixels;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RenderChunks {}

impl FusedIterator for RenderChunks {}

/// How a background render ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Every chunk was delivered
    Completed { chunks: usize },
    /// Stopped early by cancellation or because the consumer went away
    Cancelled { chunks_emitted: usize },
}

/// Cancels a background render from anywhere
#[derive(Debug, Clone)]
pub struct RenderCanceller {
    cancelled: Arc<AtomicBool>,
}

impl RenderCanceller {
    /// Request that no further chunks be produced
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            info!("Render cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Consumer side of a background render
#[derive(Debug)]
pub struct RenderHandle {
    plan: RenderPlan,
    receiver: mpsc::Receiver<RenderChunk>,
    canceller: RenderCanceller,
    task: JoinHandle<InspectorResult<RenderOutcome>>,
}

/// Start a render on the tokio runtime.
///
/// The request is validated up front. The lookup table is built on the
/// blocking pool, then chunks are sent through a bounded channel, yielding
/// to the scheduler after each one. Fails with a render error outside a
/// tokio runtime.
pub fn spawn_render(request: RenderRequest, config: &InspectorConfig) -> InspectorResult<RenderHandle> {
    let plan = plan_request(&request, config)?;
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| InspectorError::Render(format!("No tokio runtime to render on: {}", e)))?;
    let (sender, receiver) = mpsc::channel(config.channel_capacity);
    let canceller = RenderCanceller {
        cancelled: Arc::new(AtomicBool::new(false)),
    };

    let task = runtime.spawn(run_render(
        request.data,
        plan,
        config.chunk_pixels,
        sender,
        canceller.clone(),
    ));

    Ok(RenderHandle {
        plan,
        receiver,
        canceller,
        task,
    })
}

async fn run_render(
    data: Arc<[u8]>,
    plan: RenderPlan,
    chunk_pixels: usize,
    sender: mpsc::Sender<RenderChunk>,
    canceller: RenderCanceller,
) -> InspectorResult<RenderOutcome> {
    let order = plan.order;
    let table = tokio::task::spawn_blocking(move || LookupCache::get_or_build(order))
        .await
        .map_err(|e| InspectorError::Render(format!("Lookup table build failed: {}", e)))?;

    let mut chunks = ChunkedRenderer::from_parts(data, plan, table, chunk_pixels).chunks();
    let mut emitted = 0;

    loop {
        if canceller.is_cancelled() {
            info!("Render cancelled after {} chunks", emitted);
            return Ok(RenderOutcome::Cancelled { chunks_emitted: emitted });
        }

        let Some(chunk) = chunks.next() else {
            break;
        };

        if sender.send(chunk).await.is_err() {
            debug!("Render consumer went away after {} chunks", emitted);
            return Ok(RenderOutcome::Cancelled { chunks_emitted: emitted });
        }
        emitted += 1;

        tokio::task::yield_now().await;
    }

    debug!("Render complete: {} chunks", emitted);
    Ok(RenderOutcome::Completed { chunks: emitted })
}

impl RenderHandle {
    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }

    /// Next chunk, or `None` once the render is finished or cancelled
    pub async fn next_chunk(&mut self) -> Option<RenderChunk> {
        if self.canceller.is_cancelled() {
            return None;
        }
        self.receiver.recv().await
    }

    /// Stop the render. Chunks not yet received are discarded.
    pub fn cancel(&mut self) {
        self.canceller.cancel();
        self.receiver.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.canceller.is_cancelled()
    }

    /// A handle that can cancel this render from another task
    pub fn canceller(&self) -> RenderCanceller {
        self.canceller.clone()
    }

    /// Stop receiving and wait for the render task to end
    pub async fn finish(self) -> InspectorResult<RenderOutcome> {
        let RenderHandle { receiver, task, .. } = self;
        drop(receiver);
        task.await
            .map_err(|e| InspectorError::Render(format!("Render task failed: {}", e)))?
    }

    /// Receive every chunk and assemble the full RGBA image
    pub async fn collect_image(mut self) -> InspectorResult<Vec<u8>> {
        let total = self.plan.total_pixels;
        let mut image = Vec::with_capacity(total * BYTES_PER_PIXEL);
        let mut next_pixel = 0;

        while let Some(chunk) = self.next_chunk().await {
            if chunk.chunk_start != next_pixel {
                return Err(InspectorError::Render(format!(
                    "Chunk starts at pixel {} but {} was expected",
                    chunk.chunk_start, next_pixel
                )));
            }
            next_pixel = chunk.chunk_end;
            image.extend_from_slice(&chunk.image_data);
        }

        match self.finish().await? {
            RenderOutcome::Completed { .. } if next_pixel == total => Ok(image),
            _ => Err(InspectorError::Render(format!(
                "Render stopped after {} of {} pixels",
                next_pixel, total
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::color::classify;

    fn renderer(data: Vec<u8>, base_size: usize, chunk_pixels: usize) -> ChunkedRenderer {
        let config = InspectorConfig {
            chunk_pixels,
            ..InspectorConfig::default()
        };
        ChunkedRenderer::new(RenderRequest::new(data, base_size), &config).unwrap()
    }

    #[test]
    fn test_chunks_tile_image() {
        let chunks: Vec<RenderChunk> = renderer(vec![0x41; 300], 10, 7).chunks().collect();
        assert_eq!(chunks.len(), 15);

        let mut expected_start = 0;
        for chunk in &chunks {
            assert_eq!(chunk.chunk_start, expected_start);
            assert!(chunk.chunk_end > chunk.chunk_start);
            assert_eq!(chunk.image_data.len(), chunk.pixel_count() * 4);
            expected_start = chunk.chunk_end;
        }
        assert_eq!(expected_start, 100);
    }

    #[test]
    fn test_chunk_count_and_size_hint() {
        let r = renderer(vec![1; 64], 16, 100);
        assert_eq!(r.chunk_count(), 3);
        let mut chunks = r.chunks();
        assert_eq!(chunks.len(), 3);
        chunks.next();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.by_ref().count(), 2);
        assert!(chunks.next().is_none());
    }

    #[test]
    fn test_power_of_two_plan() {
        let r = renderer(vec![0; 1024], 16, 1000);
        assert_eq!(r.plan().order, 4);
        assert_eq!(r.plan().grid_size, 16);
        assert_eq!(r.plan().total_pixels, 256);
        assert_eq!(r.chunk_count(), 1);
    }

    #[test]
    fn test_non_power_of_two_sentinel() {
        let r = renderer(vec![b'A'; 4096], 10, 1000);
        assert_eq!(r.plan().order, 4);
        assert_eq!(r.plan().grid_size, 16);

        let uppercase = classify(b'A').rgb;
        for y in 0..16 {
            for x in 0..16 {
                let color = r.pixel_color(x, y);
                if x >= 10 || y >= 10 {
                    assert_eq!(r.locate(x, y), PixelSource::Sentinel);
                    assert_eq!(color, Rgb::BLACK);
                } else {
                    assert_eq!(color, uppercase);
                }
            }
        }
        assert_eq!(r.pixel_color(16, 0), Rgb::BLACK);
    }

    #[test]
    fn test_pixels_follow_curve() {
        // One byte per cell: pixel color is the color of the byte at its index
        let data: Vec<u8> = (0..=255u8).collect();
        let r = renderer(data, 16, 50);
        let table = HilbertLookupTable::build(4);

        let image = r.clone().render_all();
        assert_eq!(image.len(), 256 * 4);
        for y in 0..16 {
            for x in 0..16 {
                let index = table.get(x, y).unwrap() as usize;
                let expected = byte_color(index as u8).to_rgba();
                let at = (y * 16 + x) * 4;
                assert_eq!(&image[at..at + 4], &expected);
            }
        }
    }

    #[test]
    fn test_alpha_is_opaque() {
        let image = renderer(vec![0x00, 0x7f, 0xff], 5, 4).render_all();
        assert_eq!(image.len(), 25 * 4);
        assert!(image.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_empty_buffer_is_black() {
        let image = renderer(Vec::new(), 4, 3).render_all();
        assert!(image.chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_invalid_dimension() {
        let config = InspectorConfig::default();
        let err = ChunkedRenderer::new(RenderRequest::new(vec![1, 2, 3], 0), &config).unwrap_err();
        assert!(matches!(err, InspectorError::InvalidDimension { .. }));
    }

    #[test]
    fn test_render_chunk_clamps_range() {
        let r = renderer(vec![1; 10], 4, 8);
        let chunk = r.render_chunk(12, 40);
        assert_eq!((chunk.chunk_start, chunk.chunk_end), (12, 16));
        assert_eq!(chunk.image_data.len(), 16);
    }

    #[tokio::test]
    async fn test_spawned_render_matches_iterator() {
        let data: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        let config = InspectorConfig {
            chunk_pixels: 333,
            ..InspectorConfig::default()
        };

        let expected = ChunkedRenderer::new(RenderRequest::new(data.clone(), 40), &config)
            .unwrap()
            .render_all();
        let handle = spawn_render(RenderRequest::new(data, 40), &config).unwrap();
        let image = handle.collect_image().await.unwrap();
        assert_eq!(image, expected);
    }

    #[tokio::test]
    async fn test_cancel_stops_render() {
        let config = InspectorConfig {
            chunk_pixels: 16,
            channel_capacity: 1,
            ..InspectorConfig::default()
        };
        let mut handle = spawn_render(RenderRequest::new(vec![7u8; 512], 64), &config).unwrap();

        let first = handle.next_chunk().await.unwrap();
        assert_eq!(first.chunk_start, 0);

        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(handle.next_chunk().await.is_none());

        match handle.finish().await.unwrap() {
            RenderOutcome::Cancelled { chunks_emitted } => assert!(chunks_emitted < 256),
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    #[test]
    fn test_spawn_outside_runtime_is_error() {
        let result = spawn_render(RenderRequest::new(vec![1u8; 8], 4), &InspectorConfig::default());
        assert!(matches!(result, Err(InspectorError::Render(_))));
    }

    #[tokio::test]
    async fn test_spawn_rejects_oversized_dimension() {
        let config = InspectorConfig {
            max_base_size: 32,
            ..InspectorConfig::default()
        };
        let result = spawn_render(RenderRequest::new(vec![1u8; 8], 33), &config);
        assert!(matches!(result, Err(InspectorError::InvalidDimension { base_size: 33, max: 32 })));
    }
}
