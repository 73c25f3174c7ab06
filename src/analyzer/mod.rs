//! Disassembly engine for Solana program accounts

pub mod bytecode;

use log::{info, warn};

use crate::config::InspectorConfig;
use crate::errors::InspectorResult;

pub use self::bytecode::DisassembledProgram;

/// Disassembly of a program's code section
#[derive(Debug, Clone)]
pub struct CodeListing {
    /// Virtual address of the first instruction
    pub address: u64,
    /// Offset of the code within the account buffer
    pub file_offset: usize,
    /// Disassembled rows, offsets relative to the start of the code
    pub program: DisassembledProgram,
}

/// Coordinates disassembly of account data
pub struct Analyzer {
    max_rows: usize,
}

impl Analyzer {
    /// Create an analyzer with the default display cap
    pub fn new() -> Self {
        Self::with_config(&InspectorConfig::default())
    }

    /// Create an analyzer using the display cap from a configuration
    pub fn with_config(config: &InspectorConfig) -> Self {
        Self {
            max_rows: config.max_rows,
        }
    }

    /// Disassemble a buffer from offset 0
    pub fn disassemble(&self, data: &[u8]) -> DisassembledProgram {
        bytecode::disassemble_program(data, self.max_rows)
    }

    /// Disassemble the `.text` section of the ELF image inside account data
    pub fn disassemble_code(&self, account_data: &[u8]) -> InspectorResult<CodeListing> {
        let text = bytecode::text_section(account_data)?;
        info!(
            "Disassembling .text ({} bytes at address {:#x})",
            text.data.len(),
            text.address
        );
        if text.data.is_empty() {
            warn!(".text section is empty");
        }

        Ok(CodeListing {
            address: text.address,
            file_offset: text.file_offset,
            program: bytecode::disassemble_program(text.data, self.max_rows),
        })
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
