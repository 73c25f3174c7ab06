//! Inspector configuration

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::bytecode::DEFAULT_MAX_ROWS;
use crate::errors::{InspectorError, InspectorResult};
use crate::models::render::MAX_SUPPORTED_BASE_SIZE;

/// Pixels produced per render chunk
pub const DEFAULT_CHUNK_PIXELS: usize = 200_000;

/// Largest render dimension accepted by default. The lookup table for it
/// holds 2^24 entries (64 MiB).
pub const DEFAULT_MAX_BASE_SIZE: usize = 4096;

/// Chunks buffered between the render task and its consumer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4;

/// Tunables for disassembly and rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Display cap for disassembly rows
    pub max_rows: usize,
    /// Pixels per render chunk
    pub chunk_pixels: usize,
    /// Largest accepted render dimension
    pub max_base_size: usize,
    /// Bounded channel depth for render chunks
    pub channel_capacity: usize,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            chunk_pixels: DEFAULT_CHUNK_PIXELS,
            max_base_size: DEFAULT_MAX_BASE_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl InspectorConfig {
    /// Default configuration file location
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".solana").join("inspector.json")
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> InspectorResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            InspectorError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            InspectorError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the default configuration file, falling back to defaults when absent
    pub fn load_or_default() -> InspectorResult<Self> {
        Self::load_from_or_default(&Self::default_path())
    }

    /// Load `path` if it exists, otherwise use defaults
    pub fn load_from_or_default(path: &Path) -> InspectorResult<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Reject values the pipelines cannot run with
    pub fn validate(&self) -> InspectorResult<()> {
        if self.max_rows == 0 {
            return Err(InspectorError::Config("max_rows must be at least 1".to_string()));
        }
        if self.chunk_pixels == 0 {
            return Err(InspectorError::Config("chunk_pixels must be at least 1".to_string()));
        }
        if self.channel_capacity == 0 {
            return Err(InspectorError::Config("channel_capacity must be at least 1".to_string()));
        }
        if self.max_base_size == 0 || self.max_base_size > MAX_SUPPORTED_BASE_SIZE {
            return Err(InspectorError::Config(format!(
                "max_base_size must be between 1 and {}",
                MAX_SUPPORTED_BASE_SIZE
            )));
        }
        Ok(())
    }
}
