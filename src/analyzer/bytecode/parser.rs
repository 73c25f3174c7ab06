//! sBPF instruction window parsing

use crate::constants::opcodes::INSTRUCTION_SIZE;
use crate::models::instruction::RawInstruction;

impl RawInstruction {
    /// Parse the fields of one 8-byte window.
    ///
    /// Returns `None` when fewer than 8 bytes are available.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let window: &[u8; INSTRUCTION_SIZE] = data.get(..INSTRUCTION_SIZE)?.try_into().ok()?;
        Some(Self::from_window(window))
    }

    /// Parse the fields of an exact 8-byte window
    pub fn from_window(window: &[u8; INSTRUCTION_SIZE]) -> Self {
        Self {
            opcode: window[0],
            dst_reg: window[1] & 0x0f,
            src_reg: (window[1] & 0xf0) >> 4,
            offset: i16::from_le_bytes([window[2], window[3]]),
            imm: i32::from_le_bytes([window[4], window[5], window[6], window[7]]),
        }
    }

    /// Encode back into an 8-byte window
    pub fn to_bytes(&self) -> [u8; INSTRUCTION_SIZE] {
        let offset = self.offset.to_le_bytes();
        let imm = self.imm.to_le_bytes();
        [
            self.opcode,
            (self.src_reg << 4) | (self.dst_reg & 0x0f),
            offset[0],
            offset[1],
            imm[0],
            imm[1],
            imm[2],
            imm[3],
        ]
    }
}

/// Iterate the complete 8-byte windows of a buffer with their offsets.
///
/// A trailing fragment shorter than one instruction is skipped.
pub fn windows(data: &[u8]) -> impl Iterator<Item = (usize, &[u8; INSTRUCTION_SIZE])> {
    data.chunks_exact(INSTRUCTION_SIZE)
        .enumerate()
        .filter_map(|(i, chunk)| {
            let window: &[u8; INSTRUCTION_SIZE] = chunk.try_into().ok()?;
            Some((i * INSTRUCTION_SIZE, window))
        })
}

/// Parse every complete window of a buffer
pub fn parse_instructions(data: &[u8]) -> Vec<RawInstruction> {
    windows(data).map(|(_, w)| RawInstruction::from_window(w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields() {
        let insn = RawInstruction::parse(&[0x79, 0xa1, 0xf8, 0xff, 0x2a, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(insn.opcode, 0x79);
        assert_eq!(insn.dst_reg, 1);
        assert_eq!(insn.src_reg, 10);
        assert_eq!(insn.offset, -8);
        assert_eq!(insn.imm, 42);
    }

    #[test]
    fn test_sign_extension() {
        let insn = RawInstruction::parse(&[0x07, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap();
        assert_eq!(insn.offset, -1);
        assert_eq!(insn.imm, -1);
    }

    #[test]
    fn test_short_window() {
        assert!(RawInstruction::parse(&[0xb7, 0x00, 0x00]).is_none());
        assert!(RawInstruction::parse(&[]).is_none());
    }

    #[test]
    fn test_to_bytes() {
        let bytes = [0x7b, 0x1a, 0xf0, 0xff, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(RawInstruction::parse(&bytes).unwrap().to_bytes(), bytes);
    }

    #[test]
    fn test_parse_instructions_skips_tail() {
        let data = [0u8; 20];
        let parsed = parse_instructions(&data);
        assert_eq!(parsed.len(), 2);
        let offsets: Vec<usize> = windows(&data).map(|(offset, _)| offset).collect();
        assert_eq!(offsets, vec![0, 8]);
    }
}
