use anyhow::{bail, Context, Result};
use env_logger::Builder;
use log::{info, warn, LevelFilter};
use solana_bytecode_inspector::analyzer::Analyzer;
use solana_bytecode_inspector::config::InspectorConfig;
use solana_bytecode_inspector::input::{read_account_data, InputEncoding};
use solana_bytecode_inspector::models::render::RenderRequest;
use solana_bytecode_inspector::visualizer::{self, spawn_render};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

// Simple CLI without clap
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger, RUST_LOG overrides the default level
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-v") {
        println!("Solana Bytecode Inspector v{}", solana_bytecode_inspector::VERSION);
        return Ok(());
    }

    if args.len() < 3 {
        print_usage(&args[0]);
        return Ok(());
    }

    let command = args[1].as_str();
    let input_path = PathBuf::from(&args[2]);

    let mut config_path = None;
    let mut limit = None;
    let mut size = None;
    let mut output_path = None;
    let mut base64_input = false;
    let mut json = false;
    let mut raw = false;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                config_path = Some(PathBuf::from(flag_value(&args, i, "--config")?));
                i += 2;
            }
            "--limit" | "-n" => {
                let value = flag_value(&args, i, "--limit")?;
                limit = Some(value.parse::<usize>().with_context(|| format!("Invalid --limit: {}", value))?);
                i += 2;
            }
            "--size" | "-s" => {
                let value = flag_value(&args, i, "--size")?;
                size = Some(value.parse::<usize>().with_context(|| format!("Invalid --size: {}", value))?);
                i += 2;
            }
            "--output" | "-o" => {
                output_path = Some(PathBuf::from(flag_value(&args, i, "--output")?));
                i += 2;
            }
            "--base64" => {
                base64_input = true;
                i += 1;
            }
            "--json" => {
                json = true;
                i += 1;
            }
            "--raw" => {
                raw = true;
                i += 1;
            }
            other => {
                warn!("Ignoring unknown argument: {}", other);
                i += 1;
            }
        }
    }

    let mut config = match &config_path {
        Some(path) => InspectorConfig::load(path)?,
        None => InspectorConfig::load_or_default()?,
    };
    if let Some(limit) = limit {
        config.max_rows = limit;
        config.validate()?;
    }

    let encoding = if base64_input { InputEncoding::Base64 } else { InputEncoding::Binary };
    let data = read_account_data(&input_path, encoding)
        .with_context(|| format!("Failed to load {}", input_path.display()))?;
    info!("Loaded {} bytes from {}", data.len(), input_path.display());

    match command {
        "disasm" => run_disasm(&data, &config, raw, json),
        "heatmap" => {
            let Some(size) = size else {
                bail!("heatmap requires --size");
            };
            let Some(output_path) = output_path else {
                bail!("heatmap requires --output");
            };
            run_heatmap(data, size, &output_path, &config).await
        }
        other => {
            print_usage(&args[0]);
            bail!("Unknown command: {}", other)
        }
    }
}

fn print_usage(program: &str) {
    println!("Solana Bytecode Inspector v{}", solana_bytecode_inspector::VERSION);
    println!("\nUsage:");
    println!("  {} disasm <FILE> [--limit N] [--raw] [--json] [--base64] [--config PATH]", program);
    println!("  {} heatmap <FILE> --size N --output PATH [--base64] [--config PATH]", program);
    println!("  {} --version", program);
    println!("\nOptions:");
    println!("  --limit, -n N        Show at most N instructions (default: 128)");
    println!("  --raw                Disassemble from offset 0 instead of the ELF .text section");
    println!("  --json               Print rows as JSON");
    println!("  --base64             Input file holds base64 account data");
    println!("  --size, -s N         Heatmap width and height in pixels");
    println!("  --output, -o PATH    Write the heatmap as a PPM image");
    println!("  --config PATH        Load settings from PATH (default: ~/.solana/inspector.json)");
    println!("  --version, -v        Show version information");
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    match args.get(i + 1) {
        Some(value) => Ok(value.as_str()),
        None => bail!("Missing value for {}", flag),
    }
}

fn run_disasm(data: &[u8], config: &InspectorConfig, raw: bool, json: bool) -> Result<()> {
    let analyzer = Analyzer::with_config(config);

    let program = if raw {
        analyzer.disassemble(data)
    } else {
        match analyzer.disassemble_code(data) {
            Ok(listing) => {
                info!(
                    ".text at address {:#x}, account offset {}",
                    listing.address, listing.file_offset
                );
                listing.program
            }
            Err(e) => {
                warn!("{}; disassembling from offset 0", e);
                analyzer.disassemble(data)
            }
        }
    };

    if program.unknown_count() > 0 {
        warn!("{} rows did not decode to a known instruction", program.unknown_count());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&program.rows)?);
    } else {
        print!("{}", program.to_text());
    }
    Ok(())
}

async fn run_heatmap(data: Vec<u8>, size: usize, output_path: &Path, config: &InspectorConfig) -> Result<()> {
    let handle = spawn_render(RenderRequest::new(data, size), config)?;
    let image = handle.collect_image().await?;

    let ppm = visualizer::encode_ppm(&image, size)?;
    fs::write(output_path, ppm).with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!("Wrote {}x{} heatmap to {}", size, size, output_path.display());
    Ok(())
}
