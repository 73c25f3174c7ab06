//! Bytecode decoding for Solana programs

pub mod parser;
pub mod decoder;
pub mod disassembler;
pub mod elf;

// Re-export key components
pub use parser::{parse_instructions, windows};
pub use decoder::{decode, decode_raw};
pub use disassembler::{disassemble_program, format, DisassembledProgram, DEFAULT_MAX_ROWS};
pub use elf::{find_elf_start, text_section, TextSection};
