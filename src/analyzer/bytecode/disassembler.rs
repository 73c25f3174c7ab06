//! sBPF disassembly into display rows

use log::{debug, warn};
use std::fmt::Write;

use crate::analyzer::bytecode::decoder::decode_raw;
use crate::analyzer::bytecode::parser::windows;
use crate::constants::opcodes::INSTRUCTION_SIZE;
use crate::models::display::DisplayRow;
use crate::models::instruction::RawInstruction;

/// Default display cap: 1024 bytes of code, 128 rows
pub const DEFAULT_MAX_ROWS: usize = 1024 / INSTRUCTION_SIZE;

/// Disassembled program
#[derive(Debug, Clone)]
pub struct DisassembledProgram {
    /// Display rows, at most the requested cap
    pub rows: Vec<DisplayRow>,
    /// Number of complete 8-byte windows in the buffer
    pub total_windows: usize,
    /// Bytes left over after the last complete window
    pub trailing_bytes: usize,
}

impl DisassembledProgram {
    /// Check whether the display cap cut the listing short
    pub fn is_truncated(&self) -> bool {
        self.rows.len() < self.total_windows
    }

    /// Number of rows whose opcode did not decode
    pub fn unknown_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.decoded.is_known()).count()
    }

    /// Render the rows as an assembly listing
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let _ = writeln!(out, "{}", row);
        }
        if self.is_truncated() {
            let _ = writeln!(
                out,
                "... {} more instructions not shown",
                self.total_windows - self.rows.len()
            );
        }
        out
    }
}

/// Build the display row for one window
pub fn display_row(offset: usize, window: &[u8; INSTRUCTION_SIZE]) -> DisplayRow {
    let raw = RawInstruction::from_window(window);
    DisplayRow {
        offset,
        raw_bytes: *window,
        opcode_hex: format!("{:#04x}", raw.opcode),
        dst_reg: raw.dst_reg,
        src_reg: raw.src_reg,
        offset_field: raw.offset,
        imm_field: raw.imm,
        decoded: decode_raw(&raw),
    }
}

/// Disassemble up to `max_instructions` windows from the start of `buffer`.
///
/// A trailing fragment shorter than 8 bytes is dropped.
pub fn format(buffer: &[u8], max_instructions: usize) -> Vec<DisplayRow> {
    windows(buffer)
        .take(max_instructions)
        .map(|(offset, window)| display_row(offset, window))
        .collect()
}

/// Disassemble every complete window, without a display cap
pub fn format_all(buffer: &[u8]) -> Vec<DisplayRow> {
    format(buffer, usize::MAX)
}

/// Disassemble a buffer and report how much of it was shown
pub fn disassemble_program(buffer: &[u8], max_instructions: usize) -> DisassembledProgram {
    let total_windows = buffer.len() / INSTRUCTION_SIZE;
    let trailing_bytes = buffer.len() % INSTRUCTION_SIZE;

    if trailing_bytes != 0 {
        warn!("Skipping {} trailing bytes after the last full instruction", trailing_bytes);
    }

    let rows = format(buffer, max_instructions);
    debug!(
        "Disassembled {} of {} instructions ({} bytes)",
        rows.len(),
        total_windows,
        buffer.len()
    );

    DisassembledProgram {
        rows,
        total_windows,
        trailing_bytes,
    }
}
