//! sBPF instruction decoding
//!
//! Decoding is total: every opcode byte yields a [`DecodedInstruction`].
//! The category comes from the opcode class bits; bit patterns that are
//! undefined within their class decode to [`InstructionCategory::Unknown`].

use crate::constants::opcodes::*;
use crate::constants::syscalls::syscall_name;
use crate::models::instruction::{DecodedInstruction, InstructionCategory, RawInstruction, RegInfo};

/// Decode instruction fields into mnemonic, operands and description
pub fn decode(opcode: u8, dst_reg: u8, src_reg: u8, offset: i16, imm: i32) -> DecodedInstruction {
    decode_raw(&RawInstruction {
        opcode,
        dst_reg: dst_reg & 0x0f,
        src_reg: src_reg & 0x0f,
        offset,
        imm,
    })
}

/// Decode a parsed instruction window
pub fn decode_raw(raw: &RawInstruction) -> DecodedInstruction {
    match raw.class() {
        CLASS_ALU => decode_alu(raw, false),
        CLASS_ALU64 => decode_alu(raw, true),
        CLASS_JMP => decode_jump(raw, true),
        CLASS_JMP32 => decode_jump(raw, false),
        CLASS_LD => decode_ld(raw),
        CLASS_LDX => decode_ldx(raw),
        CLASS_ST => decode_st(raw),
        _ => decode_stx(raw),
    }
}

fn instruction(
    category: InstructionCategory,
    mnemonic: String,
    operands: Vec<String>,
    comment: String,
    registers: &[u8],
) -> DecodedInstruction {
    let mut reg_info: Vec<RegInfo> = Vec::with_capacity(registers.len());
    for &register in registers {
        if !reg_info.iter().any(|info| info.register == register) {
            reg_info.push(RegInfo::new(register));
        }
    }

    DecodedInstruction {
        category,
        mnemonic,
        operands,
        comment: Some(comment),
        reg_info,
    }
}

fn reg(n: u8) -> String {
    format!("r{}", n)
}

/// `[r10-8]`
fn mem_operand(base: u8, offset: i16) -> String {
    format!("[r{}{:+}]", base, offset)
}

/// `r10 - 8`
fn address_expr(base: u8, offset: i16) -> String {
    match offset {
        0 => reg(base),
        o if o < 0 => format!("r{} - {}", base, o.unsigned_abs()),
        o => format!("r{} + {}", base, o),
    }
}

/// Access width suffix and bit count for the size field
fn access_size(opcode: u8) -> (&'static str, u32) {
    match opcode & SIZE_MASK {
        SIZE_W => ("w", 32),
        SIZE_H => ("h", 16),
        SIZE_B => ("b", 8),
        _ => ("dw", 64),
    }
}

fn decode_alu(raw: &RawInstruction, wide: bool) -> DecodedInstruction {
    let op = raw.opcode & OP_MASK;
    let from_reg = raw.opcode & SOURCE_MASK == SOURCE_X;
    let (category, suffix, prefix) = if wide {
        (InstructionCategory::Alu64, "64", 'r')
    } else {
        (InstructionCategory::Alu, "32", 'w')
    };

    let dst = format!("{}{}", prefix, raw.dst_reg);
    let (src_operand, src_expr) = if from_reg {
        (reg(raw.src_reg), format!("{}{}", prefix, raw.src_reg))
    } else {
        (raw.imm.to_string(), raw.imm.to_string())
    };
    let pair = [raw.dst_reg, raw.src_reg];
    let registers = if from_reg { &pair[..] } else { &pair[..1] };

    let binary = |name: &str, c_op: &str| {
        instruction(
            category,
            format!("{}{}", name, suffix),
            vec![reg(raw.dst_reg), src_operand.clone()],
            format!("{} {} {}", dst, c_op, src_expr),
            registers,
        )
    };

    match op {
        ALU_ADD => binary("add", "+="),
        ALU_SUB => binary("sub", "-="),
        ALU_MUL => binary("mul", "*="),
        ALU_DIV => binary("div", "/="),
        ALU_OR => binary("or", "|="),
        ALU_AND => binary("and", "&="),
        ALU_LSH => binary("lsh", "<<="),
        ALU_RSH => binary("rsh", ">>="),
        ALU_MOD => binary("mod", "%="),
        ALU_XOR => binary("xor", "^="),
        ALU_MOV => binary("mov", "="),
        ALU_ARSH => binary("arsh", "s>>="),
        ALU_NEG if !from_reg => instruction(
            category,
            format!("neg{}", suffix),
            vec![reg(raw.dst_reg)],
            format!("{} = -{}", dst, dst),
            &[raw.dst_reg],
        ),
        ALU_END if !wide && matches!(raw.imm, 16 | 32 | 64) => {
            let order = if from_reg { "be" } else { "le" };
            instruction(
                category,
                format!("{}{}", order, raw.imm),
                vec![reg(raw.dst_reg)],
                format!("r{} = hto{}{}(r{})", raw.dst_reg, order, raw.imm, raw.dst_reg),
                &[raw.dst_reg],
            )
        }
        ALU_HOR if wide && !from_reg => instruction(
            category,
            "hor64".to_string(),
            vec![reg(raw.dst_reg), raw.imm.to_string()],
            format!("r{} |= {} << 32", raw.dst_reg, raw.imm),
            &[raw.dst_reg],
        ),
        _ => DecodedInstruction::unknown(raw.opcode),
    }
}

fn decode_jump(raw: &RawInstruction, wide: bool) -> DecodedInstruction {
    let op = raw.opcode & OP_MASK;
    let from_reg = raw.opcode & SOURCE_MASK == SOURCE_X;
    let category = if wide {
        InstructionCategory::Jmp
    } else {
        InstructionCategory::Jmp32
    };

    let condition = match op {
        JMP_JEQ => Some(("jeq", "==")),
        JMP_JGT => Some(("jgt", ">")),
        JMP_JGE => Some(("jge", ">=")),
        JMP_JSET => Some(("jset", "&")),
        JMP_JNE => Some(("jne", "!=")),
        JMP_JSGT => Some(("jsgt", "s>")),
        JMP_JSGE => Some(("jsge", "s>=")),
        JMP_JLT => Some(("jlt", "<")),
        JMP_JLE => Some(("jle", "<=")),
        JMP_JSLT => Some(("jslt", "s<")),
        JMP_JSLE => Some(("jsle", "s<=")),
        _ => None,
    };

    if let Some((name, c_op)) = condition {
        let prefix = if wide { 'r' } else { 'w' };
        let (src_operand, src_expr) = if from_reg {
            (reg(raw.src_reg), format!("{}{}", prefix, raw.src_reg))
        } else {
            (raw.imm.to_string(), raw.imm.to_string())
        };
        let pair = [raw.dst_reg, raw.src_reg];
        let registers = if from_reg { &pair[..] } else { &pair[..1] };
        let mnemonic = if wide { name.to_string() } else { format!("{}32", name) };

        return instruction(
            category,
            mnemonic,
            vec![reg(raw.dst_reg), src_operand, format!("{:+}", raw.offset)],
            format!("if {}{} {} {} goto {:+}", prefix, raw.dst_reg, c_op, src_expr, raw.offset),
            registers,
        );
    }

    // ja, call and exit only exist in the 64-bit jump class
    if !wide {
        return DecodedInstruction::unknown(raw.opcode);
    }

    match (op, from_reg) {
        (JMP_JA, false) => instruction(
            category,
            "ja".to_string(),
            vec![format!("{:+}", raw.offset)],
            format!("goto {:+}", raw.offset),
            &[],
        ),
        (JMP_CALL, false) => match syscall_name(raw.imm as u32) {
            Some(name) => instruction(
                category,
                "call".to_string(),
                vec![name.to_string()],
                format!("syscall {}", name),
                &[],
            ),
            None => instruction(
                category,
                "call".to_string(),
                vec![raw.imm.to_string()],
                format!("call function {:+}", raw.imm),
                &[],
            ),
        },
        // Target register is carried in the immediate
        (JMP_CALL, true) if (0..16).contains(&raw.imm) => {
            let target = raw.imm as u8;
            instruction(
                category,
                "callx".to_string(),
                vec![reg(target)],
                format!("call *r{}", target),
                &[target],
            )
        }
        (JMP_EXIT, false) => instruction(
            category,
            "exit".to_string(),
            Vec::new(),
            "return r0".to_string(),
            &[0],
        ),
        _ => DecodedInstruction::unknown(raw.opcode),
    }
}

fn decode_ld(raw: &RawInstruction) -> DecodedInstruction {
    let (suffix, bits) = access_size(raw.opcode);

    match raw.opcode & MODE_MASK {
        MODE_IMM if raw.opcode & SIZE_MASK == SIZE_DW => instruction(
            InstructionCategory::Ld,
            "lddw".to_string(),
            vec![reg(raw.dst_reg), format!("{:#x}", raw.imm as u32)],
            format!(
                "r{} = {:#x} (low 32 bits; high 32 bits in next slot)",
                raw.dst_reg, raw.imm as u32
            ),
            &[raw.dst_reg],
        ),
        MODE_ABS => instruction(
            InstructionCategory::Ld,
            format!("ldabs{}", suffix),
            vec![raw.imm.to_string()],
            format!("r0 = *(u{} *)(skb + {})", bits, raw.imm),
            &[0],
        ),
        MODE_IND => instruction(
            InstructionCategory::Ld,
            format!("ldind{}", suffix),
            vec![reg(raw.src_reg), raw.imm.to_string()],
            format!("r0 = *(u{} *)(skb + r{} + {})", bits, raw.src_reg, raw.imm),
            &[0, raw.src_reg],
        ),
        _ => DecodedInstruction::unknown(raw.opcode),
    }
}

fn decode_ldx(raw: &RawInstruction) -> DecodedInstruction {
    if raw.opcode & MODE_MASK != MODE_MEM {
        return DecodedInstruction::unknown(raw.opcode);
    }
    let (suffix, bits) = access_size(raw.opcode);
    instruction(
        InstructionCategory::Ldx,
        format!("ldx{}", suffix),
        vec![reg(raw.dst_reg), mem_operand(raw.src_reg, raw.offset)],
        format!("r{} = *(u{} *)({})", raw.dst_reg, bits, address_expr(raw.src_reg, raw.offset)),
        &[raw.dst_reg, raw.src_reg],
    )
}

fn decode_st(raw: &RawInstruction) -> DecodedInstruction {
    if raw.opcode & MODE_MASK != MODE_MEM {
        return DecodedInstruction::unknown(raw.opcode);
    }
    let (suffix, bits) = access_size(raw.opcode);
    instruction(
        InstructionCategory::St,
        format!("st{}", suffix),
        vec![mem_operand(raw.dst_reg, raw.offset), raw.imm.to_string()],
        format!("*(u{} *)({}) = {}", bits, address_expr(raw.dst_reg, raw.offset), raw.imm),
        &[raw.dst_reg],
    )
}

fn decode_stx(raw: &RawInstruction) -> DecodedInstruction {
    if raw.opcode & MODE_MASK != MODE_MEM {
        return DecodedInstruction::unknown(raw.opcode);
    }
    let (suffix, bits) = access_size(raw.opcode);
    instruction(
        InstructionCategory::Stx,
        format!("stx{}", suffix),
        vec![mem_operand(raw.dst_reg, raw.offset), reg(raw.src_reg)],
        format!("*(u{} *)({}) = r{}", bits, address_expr(raw.dst_reg, raw.offset), raw.src_reg),
        &[raw.dst_reg, raw.src_reg],
    )
}
