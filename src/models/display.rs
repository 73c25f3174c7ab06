//! Disassembly display rows

use serde::Serialize;
use std::fmt;

use crate::models::instruction::DecodedInstruction;

/// One disassembled instruction window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    /// Byte offset of the window in the buffer
    pub offset: usize,
    /// The raw window
    pub raw_bytes: [u8; 8],
    /// Opcode as "0xNN"
    pub opcode_hex: String,
    pub dst_reg: u8,
    pub src_reg: u8,
    pub offset_field: i16,
    pub imm_field: i32,
    pub decoded: DecodedInstruction,
}

impl DisplayRow {
    /// Raw bytes as space-separated hex
    pub fn hex_bytes(&self) -> String {
        self.raw_bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Byte range of this row within the buffer
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.raw_bytes.len()
    }
}

impl fmt::Display for DisplayRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}: {}  {}", self.offset, self.hex_bytes(), self.decoded.assembly())?;
        if let Some(comment) = &self.decoded.comment {
            write!(f, " ; {}", comment)?;
        }
        Ok(())
    }
}
