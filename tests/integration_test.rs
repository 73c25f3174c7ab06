use solana_bytecode_inspector::config::InspectorConfig;
use solana_bytecode_inspector::errors::InspectorError;
use solana_bytecode_inspector::models::render::RenderRequest;
use solana_bytecode_inspector::models::InstructionCategory;
use solana_bytecode_inspector::visualizer::{self, spawn_render, InstructionView, RenderOutcome, Rgb};
use solana_bytecode_inspector::{disassemble, render_heatmap};
use std::io::Write;
use tempfile::NamedTempFile;

fn sample_program() -> Vec<u8> {
    vec![
        0xb7, 0x01, 0x00, 0x00, 0x2a, 0x00, 0x00, 0x00, // mov64 r1, 42
        0x7b, 0x1a, 0xf8, 0xff, 0x00, 0x00, 0x00, 0x00, // stxdw [r10-8], r1
        0x79, 0xa2, 0xf8, 0xff, 0x00, 0x00, 0x00, 0x00, // ldxdw r2, [r10-8]
        0x85, 0x00, 0x00, 0x00, 0xbd, 0x59, 0x75, 0x20, // call sol_log_
        0x95, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // exit
        0xde, 0xad, 0xbe, // trailing fragment
    ]
}

#[test]
fn test_disassemble_program() {
    let rows = disassemble(&sample_program(), 128);
    assert_eq!(rows.len(), 5);

    let categories: Vec<InstructionCategory> = rows.iter().map(|r| r.decoded.category).collect();
    assert_eq!(
        categories,
        vec![
            InstructionCategory::Alu64,
            InstructionCategory::Stx,
            InstructionCategory::Ldx,
            InstructionCategory::Jmp,
            InstructionCategory::Jmp,
        ]
    );

    assert_eq!(rows[0].decoded.mnemonic, "mov64");
    assert_eq!(rows[1].decoded.mnemonic, "stxdw");
    assert_eq!(rows[1].offset_field, -8);
    assert_eq!(rows[3].decoded.comment.as_deref(), Some("syscall sol_log_"));
    assert_eq!(rows[4].decoded.mnemonic, "exit");
    assert_eq!(rows[4].offset, 32);
}

#[test]
fn test_disassemble_respects_limit() {
    let rows = disassemble(&sample_program(), 2);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].offset, 8);
}

#[test]
fn test_rows_serialize_to_json() {
    let rows = disassemble(&sample_program(), 1);
    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json[0]["opcode_hex"], "0xb7");
    assert_eq!(json[0]["decoded"]["category"], "ALU64");
    assert_eq!(json[0]["imm_field"], 42);
}

#[test]
fn test_view_over_disassembly() {
    let mut view = InstructionView::new(disassemble(&sample_program(), 128));
    view.select(2);
    assert_eq!(view.selected_byte_range(), Some(16..24));
    assert_eq!(
        view.row_color(2),
        Some(visualizer::category_color(InstructionCategory::Ldx))
    );
}

#[tokio::test]
async fn test_render_heatmap_full_image() {
    let data: Vec<u8> = (0..1024u32).map(|i| (i % 256) as u8).collect();
    let image = render_heatmap(data, 16, &InspectorConfig::default()).await.unwrap();
    assert_eq!(image.len(), 256 * 4);
    assert!(image.chunks(4).all(|px| px[3] == 255));
}

#[tokio::test]
async fn test_chunks_tile_image() {
    let config = InspectorConfig {
        chunk_pixels: 37,
        ..InspectorConfig::default()
    };
    let mut handle = spawn_render(RenderRequest::new(vec![b'a'; 900], 30), &config).unwrap();
    assert_eq!(handle.plan().total_pixels, 900);

    let mut next_pixel = 0;
    let mut chunks = 0;
    while let Some(chunk) = handle.next_chunk().await {
        assert_eq!(chunk.chunk_start, next_pixel);
        assert!(chunk.chunk_end - chunk.chunk_start <= 37);
        assert_eq!(chunk.image_data.len(), chunk.pixel_count() * 4);
        next_pixel = chunk.chunk_end;
        chunks += 1;
    }
    assert_eq!(next_pixel, 900);

    assert_eq!(handle.finish().await.unwrap(), RenderOutcome::Completed { chunks });
}

#[tokio::test]
async fn test_non_power_of_two_square_is_data_colored() {
    let image = render_heatmap(vec![b'Z'; 500], 10, &InspectorConfig::default()).await.unwrap();
    assert_eq!(image.len(), 100 * 4);

    let uppercase = visualizer::byte_color(b'Z').to_rgba();
    for px in image.chunks(4) {
        assert_eq!(px, uppercase);
    }
    assert_ne!(uppercase, Rgb::BLACK.to_rgba());
}

#[tokio::test]
async fn test_cancel_from_another_task() {
    let config = InspectorConfig {
        chunk_pixels: 8,
        channel_capacity: 1,
        ..InspectorConfig::default()
    };
    let mut handle = spawn_render(RenderRequest::new(vec![3u8; 256], 128), &config).unwrap();
    let canceller = handle.canceller();

    assert!(handle.next_chunk().await.is_some());
    tokio::spawn(async move { canceller.cancel() }).await.unwrap();

    assert!(handle.is_cancelled());
    assert!(handle.next_chunk().await.is_none());
    assert!(matches!(
        handle.finish().await.unwrap(),
        RenderOutcome::Cancelled { .. }
    ));
}

#[tokio::test]
async fn test_unconsumed_render_reports_cancelled() {
    let config = InspectorConfig {
        chunk_pixels: 4,
        channel_capacity: 1,
        ..InspectorConfig::default()
    };
    let handle = spawn_render(RenderRequest::new(vec![9u8; 64], 32), &config).unwrap();
    match handle.finish().await.unwrap() {
        RenderOutcome::Cancelled { chunks_emitted } => assert!(chunks_emitted < 256),
        other => panic!("expected cancellation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_render_and_disassembly_run_concurrently() {
    let program = sample_program();
    let config = InspectorConfig::default();
    let render = render_heatmap(program.clone(), 8, &config);
    let listing = tokio::task::spawn_blocking({
        let program = program.clone();
        move || disassemble(&program, 128)
    });

    let (image, rows) = tokio::join!(render, listing);
    assert_eq!(image.unwrap().len(), 64 * 4);
    assert_eq!(rows.unwrap().len(), 5);
}

#[tokio::test]
async fn test_config_file_limits_dimension() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"max_base_size": 64, "chunk_pixels": 512}}"#).unwrap();
    let config = InspectorConfig::load(file.path()).unwrap();

    let err = render_heatmap(vec![1u8; 16], 65, &config).await.unwrap_err();
    assert!(matches!(err, InspectorError::InvalidDimension { base_size: 65, max: 64 }));

    let image = render_heatmap(vec![1u8; 16], 64, &config).await.unwrap();
    assert_eq!(image.len(), 64 * 64 * 4);
}

#[test]
fn test_ppm_export() {
    let config = InspectorConfig::default();
    let renderer = visualizer::ChunkedRenderer::new(RenderRequest::new(vec![0xffu8; 4], 4), &config).unwrap();
    let image = renderer.render_all();
    let ppm = visualizer::encode_ppm(&image, 4).unwrap();
    assert!(ppm.starts_with(b"P6\n4 4\n255\n"));
    assert_eq!(ppm.len(), b"P6\n4 4\n255\n".len() + 16 * 3);
}
