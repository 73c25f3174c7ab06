//! sBPF opcode bit-fields and named opcodes
//!
//! An opcode byte is split into fields whose meaning depends on the class in
//! the low three bits:
//!
//! ```text
//!   ALU / JMP:        | op (4) | source (1) | class (3) |
//!   LD / LDX / ST:    | mode (3) | size (2) | class (3) |
//! ```

// Instruction classes (opcode & 0x07)
pub const CLASS_MASK: u8 = 0x07;
pub const CLASS_LD: u8 = 0x00;      // Non-standard loads (lddw, abs, ind)
pub const CLASS_LDX: u8 = 0x01;     // Register-indexed loads
pub const CLASS_ST: u8 = 0x02;      // Store immediate
pub const CLASS_STX: u8 = 0x03;     // Store register
pub const CLASS_ALU: u8 = 0x04;     // 32-bit arithmetic
pub const CLASS_JMP: u8 = 0x05;     // 64-bit jumps, call, exit
pub const CLASS_JMP32: u8 = 0x06;   // 32-bit compare jumps
pub const CLASS_ALU64: u8 = 0x07;   // 64-bit arithmetic

// Source operand (ALU and JMP classes)
pub const SOURCE_MASK: u8 = 0x08;
pub const SOURCE_K: u8 = 0x00;      // Immediate operand
pub const SOURCE_X: u8 = 0x08;      // Register operand

// Operation (ALU and JMP classes, opcode & 0xf0)
pub const OP_MASK: u8 = 0xf0;
pub const ALU_ADD: u8 = 0x00;
pub const ALU_SUB: u8 = 0x10;
pub const ALU_MUL: u8 = 0x20;
pub const ALU_DIV: u8 = 0x30;
pub const ALU_OR: u8 = 0x40;
pub const ALU_AND: u8 = 0x50;
pub const ALU_LSH: u8 = 0x60;
pub const ALU_RSH: u8 = 0x70;
pub const ALU_NEG: u8 = 0x80;
pub const ALU_MOD: u8 = 0x90;
pub const ALU_XOR: u8 = 0xa0;
pub const ALU_MOV: u8 = 0xb0;
pub const ALU_ARSH: u8 = 0xc0;
pub const ALU_END: u8 = 0xd0;       // Byte swap, ALU class only
pub const ALU_HOR: u8 = 0xf0;       // High-OR immediate, ALU64 class only

pub const JMP_JA: u8 = 0x00;
pub const JMP_JEQ: u8 = 0x10;
pub const JMP_JGT: u8 = 0x20;
pub const JMP_JGE: u8 = 0x30;
pub const JMP_JSET: u8 = 0x40;
pub const JMP_JNE: u8 = 0x50;
pub const JMP_JSGT: u8 = 0x60;
pub const JMP_JSGE: u8 = 0x70;
pub const JMP_CALL: u8 = 0x80;
pub const JMP_EXIT: u8 = 0x90;
pub const JMP_JLT: u8 = 0xa0;
pub const JMP_JLE: u8 = 0xb0;
pub const JMP_JSLT: u8 = 0xc0;
pub const JMP_JSLE: u8 = 0xd0;

// Access size (load/store classes, opcode & 0x18)
pub const SIZE_MASK: u8 = 0x18;
pub const SIZE_W: u8 = 0x00;        // 4 bytes
pub const SIZE_H: u8 = 0x08;        // 2 bytes
pub const SIZE_B: u8 = 0x10;        // 1 byte
pub const SIZE_DW: u8 = 0x18;       // 8 bytes

// Addressing mode (load/store classes, opcode & 0xe0)
pub const MODE_MASK: u8 = 0xe0;
pub const MODE_IMM: u8 = 0x00;
pub const MODE_ABS: u8 = 0x20;
pub const MODE_IND: u8 = 0x40;
pub const MODE_MEM: u8 = 0x60;

// Named opcodes used when rendering and in tests
pub const LDDW: u8 = 0x18;          // Load double word immediate
pub const LDXB: u8 = 0x71;          // Load byte
pub const LDXH: u8 = 0x69;          // Load half word
pub const LDXW: u8 = 0x61;          // Load word
pub const LDXDW: u8 = 0x79;         // Load double word
pub const STB: u8 = 0x72;           // Store byte immediate
pub const STH: u8 = 0x6a;           // Store half word immediate
pub const STW: u8 = 0x62;           // Store word immediate
pub const STDW: u8 = 0x7a;          // Store double word immediate
pub const STXB: u8 = 0x73;          // Store byte register
pub const STXH: u8 = 0x6b;          // Store half word register
pub const STXW: u8 = 0x63;          // Store word register
pub const STXDW: u8 = 0x7b;         // Store double word register
pub const ADD32_IMM: u8 = 0x04;     // 32-bit add immediate
pub const ADD64_IMM: u8 = 0x07;     // 64-bit add immediate
pub const ADD64_REG: u8 = 0x0f;     // 64-bit add register
pub const NEG64: u8 = 0x87;         // 64-bit negate
pub const MOV32_REG: u8 = 0xbc;     // 32-bit move register
pub const MOV64_IMM: u8 = 0xb7;     // 64-bit move immediate
pub const MOV64_REG: u8 = 0xbf;     // 64-bit move register
pub const LE: u8 = 0xd4;            // Endian conversion (little endian)
pub const BE: u8 = 0xdc;            // Endian conversion (big endian)
pub const HOR64: u8 = 0xf7;         // High-OR immediate
pub const JA: u8 = 0x05;            // Jump always
pub const JEQ_IMM: u8 = 0x15;       // Jump if equal immediate
pub const JNE_REG: u8 = 0x5d;       // Jump if not equal register
pub const JSLT_IMM: u8 = 0xc5;      // Jump if signed less than immediate
pub const JEQ32_IMM: u8 = 0x16;     // 32-bit jump if equal immediate
pub const CALL: u8 = 0x85;          // Call function immediate
pub const CALLX: u8 = 0x8d;         // Call function register
pub const EXIT: u8 = 0x95;          // Exit (return)

/// Width of one encoded instruction in bytes
pub const INSTRUCTION_SIZE: usize = 8;

/// Number of architectural registers (r0-r10)
pub const REGISTER_COUNT: u8 = 11;
