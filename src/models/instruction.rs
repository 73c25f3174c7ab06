//! Instruction models for sBPF bytecode

use serde::{Serialize, Deserialize};
use std::fmt;

use crate::constants::opcodes;

/// Fields of one 8-byte little-endian instruction window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInstruction {
    /// Instruction opcode
    pub opcode: u8,
    /// Destination register (low nibble of byte 1)
    pub dst_reg: u8,
    /// Source register (high nibble of byte 1)
    pub src_reg: u8,
    /// Signed 16-bit offset
    pub offset: i16,
    /// Signed 32-bit immediate
    pub imm: i32,
}

impl RawInstruction {
    /// Instruction class bits
    pub fn class(&self) -> u8 {
        self.opcode & opcodes::CLASS_MASK
    }
}

/// Instruction category, taken from the opcode class bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstructionCategory {
    /// 32-bit arithmetic and logic
    Alu,
    /// 64-bit arithmetic and logic
    Alu64,
    /// Jumps, calls and exit
    Jmp,
    /// 32-bit compare jumps
    Jmp32,
    /// Immediate and packet loads
    Ld,
    /// Register-indexed loads
    Ldx,
    /// Immediate stores
    St,
    /// Register stores
    Stx,
    /// Undefined bit pattern
    Unknown,
}

impl InstructionCategory {
    /// All categories, in legend order
    pub const ALL: [InstructionCategory; 9] = [
        InstructionCategory::Alu,
        InstructionCategory::Alu64,
        InstructionCategory::Jmp,
        InstructionCategory::Jmp32,
        InstructionCategory::Ld,
        InstructionCategory::Ldx,
        InstructionCategory::St,
        InstructionCategory::Stx,
        InstructionCategory::Unknown,
    ];

    /// Category named by an opcode class
    pub fn from_class(class: u8) -> Self {
        match class & opcodes::CLASS_MASK {
            opcodes::CLASS_LD => InstructionCategory::Ld,
            opcodes::CLASS_LDX => InstructionCategory::Ldx,
            opcodes::CLASS_ST => InstructionCategory::St,
            opcodes::CLASS_STX => InstructionCategory::Stx,
            opcodes::CLASS_ALU => InstructionCategory::Alu,
            opcodes::CLASS_JMP => InstructionCategory::Jmp,
            opcodes::CLASS_JMP32 => InstructionCategory::Jmp32,
            _ => InstructionCategory::Alu64,
        }
    }

    /// Short display label
    pub fn label(&self) -> &'static str {
        match self {
            InstructionCategory::Alu => "ALU",
            InstructionCategory::Alu64 => "ALU64",
            InstructionCategory::Jmp => "JMP",
            InstructionCategory::Jmp32 => "JMP32",
            InstructionCategory::Ld => "LD",
            InstructionCategory::Ldx => "LDX",
            InstructionCategory::St => "ST",
            InstructionCategory::Stx => "STX",
            InstructionCategory::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for InstructionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Calling-convention role of a register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterRole {
    /// r0
    ReturnValue,
    /// r1-r5
    Argument,
    /// r6-r9
    CalleeSaved,
    /// r10
    FramePointer,
    /// r11 and above do not exist
    Invalid,
}

impl RegisterRole {
    pub fn of(register: u8) -> Self {
        match register {
            r if r >= opcodes::REGISTER_COUNT => RegisterRole::Invalid,
            0 => RegisterRole::ReturnValue,
            1..=5 => RegisterRole::Argument,
            6..=9 => RegisterRole::CalleeSaved,
            _ => RegisterRole::FramePointer,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RegisterRole::ReturnValue => "return value",
            RegisterRole::Argument => "argument",
            RegisterRole::CalleeSaved => "callee-saved",
            RegisterRole::FramePointer => "frame pointer (read-only)",
            RegisterRole::Invalid => "invalid register",
        }
    }
}

/// Role annotation for a register referenced by an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegInfo {
    /// Register number
    pub register: u8,
    /// Role of the register
    pub role: RegisterRole,
}

impl RegInfo {
    pub fn new(register: u8) -> Self {
        Self {
            register,
            role: RegisterRole::of(register),
        }
    }
}

impl fmt::Display for RegInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}: {}", self.register, self.role.description())
    }
}

/// A decoded instruction, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedInstruction {
    /// Category from the opcode class
    pub category: InstructionCategory,
    /// Mnemonic, e.g. "add64" or "jeq"
    pub mnemonic: String,
    /// Operands in assembly order
    pub operands: Vec<String>,
    /// C-like description of the effect
    pub comment: Option<String>,
    /// Roles of the registers the instruction references
    pub reg_info: Vec<RegInfo>,
}

impl DecodedInstruction {
    /// Fallback for undefined bit patterns
    pub fn unknown(opcode: u8) -> Self {
        Self {
            category: InstructionCategory::Unknown,
            mnemonic: "unknown".to_string(),
            operands: Vec::new(),
            comment: Some(format!("undefined opcode {:#04x}", opcode)),
            reg_info: Vec::new(),
        }
    }

    /// Check whether the instruction decoded to a known operation
    pub fn is_known(&self) -> bool {
        self.category != InstructionCategory::Unknown
    }

    /// Assembly text, e.g. "add64 r1, 5"
    pub fn assembly(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, self.operands.join(", "))
        }
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.assembly())?;
        if let Some(comment) = &self.comment {
            write!(f, " ; {}", comment)?;
        }
        Ok(())
    }
}
