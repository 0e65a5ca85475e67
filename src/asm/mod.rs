//! Two-pass RV32I assembler front-end.
//!
//! Accepts a textual dialect with labels, the base RV32I mnemonics, a small
//! set of pseudo-ops (`mv`, `li`, `j`, `nop`, `ret`, `halt`), displacement
//! operands `imm(rs)` and the data directives `.byte .half .word .dword
//! .string .align`. Pass one tokenizes, places items and binds labels; pass
//! two encodes. Instructions accumulate in the text segment and directives
//! in the data segment; a label binds to the next item emitted, in that
//! item's segment. Branch and jump targets are label-relative byte
//! displacements from the instruction's own address.

/// Instruction word encoders.
pub mod encode;

/// Assembler error reporting.
pub mod error;

/// Line tokenizer.
pub mod lexer;

use std::collections::HashMap;

pub use error::{AsmError, AsmErrorKind};

use lexer::{Operand, OperandKind, SourceLine};

/// Segment base addresses the assembler places code and data at.
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    pub text_start: u32,
    pub data_start: u32,
}

impl Layout {
    pub fn new(text_start: u32, data_start: u32) -> Self {
        Self {
            text_start,
            data_start,
        }
    }
}

/// One assembled instruction with the source line it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssembledWord {
    pub line: usize,
    pub word: u32,
}

/// Assembler output: the text segment word-by-word plus the data segment.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub text: Vec<AssembledWord>,
    pub data: Vec<u8>,
}

impl Program {
    /// The machine words alone, ready for `Simulator::set_code`.
    pub fn words(&self) -> Vec<u32> {
        self.text.iter().map(|w| w.word).collect()
    }
}

/// Maps a register name (`x7`, ABI aliases) to its index.
fn parse_register(name: &str) -> Option<u32> {
    let idx = match name {
        "zero" => 0,
        "ra" => 1,
        "sp" => 2,
        "gp" => 3,
        "tp" => 4,
        "t0" => 5,
        "t1" => 6,
        "t2" => 7,
        "s0" | "fp" => 8,
        "s1" => 9,
        "a0" => 10,
        "a1" => 11,
        "a2" => 12,
        "a3" => 13,
        "a4" => 14,
        "a5" => 15,
        "a6" => 16,
        "a7" => 17,
        "s2" => 18,
        "s3" => 19,
        "s4" => 20,
        "s5" => 21,
        "s6" => 22,
        "s7" => 23,
        "s8" => 24,
        "s9" => 25,
        "s10" => 26,
        "s11" => 27,
        "t3" => 28,
        "t4" => 29,
        "t5" => 30,
        "t6" => 31,
        _ => {
            let n = name.strip_prefix('x')?.parse::<u32>().ok()?;
            if n < 32 {
                n
            } else {
                return None;
            }
        }
    };
    Some(idx)
}

struct PendingInst<'a> {
    line: usize,
    col: usize,
    mnemonic: &'a str,
    operands: Vec<Operand<'a>>,
    addr: u32,
}

/// Operand cursor over one instruction, producing positioned errors.
struct Ops<'a, 'b> {
    line: usize,
    mnemonic_col: usize,
    items: &'b [Operand<'a>],
    next: usize,
}

impl<'a, 'b> Ops<'a, 'b> {
    fn new(inst: &'b PendingInst<'a>) -> Self {
        Self {
            line: inst.line,
            mnemonic_col: inst.col,
            items: &inst.operands,
            next: 0,
        }
    }

    fn take(&mut self, what: &'static str) -> Result<&'b Operand<'a>, AsmError> {
        match self.items.get(self.next) {
            Some(op) => {
                self.next += 1;
                Ok(op)
            }
            None => Err(AsmError::new(
                self.line,
                self.mnemonic_col,
                AsmErrorKind::ExpectedOperand(what),
            )),
        }
    }

    fn reg(&mut self) -> Result<u32, AsmError> {
        let op = self.take("a register")?;
        match op.kind {
            OperandKind::Ident(name) => parse_register(name)
                .ok_or_else(|| AsmError::new(self.line, op.col, AsmErrorKind::UnknownRegister(name.to_string()))),
            _ => Err(AsmError::new(
                self.line,
                op.col,
                AsmErrorKind::ExpectedOperand("a register"),
            )),
        }
    }

    fn imm(&mut self, what: &'static str) -> Result<(i64, usize), AsmError> {
        let op = self.take(what)?;
        match op.kind {
            OperandKind::Number(value) => Ok((value, op.col)),
            _ => Err(AsmError::new(
                self.line,
                op.col,
                AsmErrorKind::ExpectedOperand(what),
            )),
        }
    }

    /// A displacement operand `offset(reg)`, returned as (offset, reg, col).
    fn disp(&mut self) -> Result<(i64, u32, usize), AsmError> {
        let op = self.take("a displacement `imm(reg)`")?;
        match op.kind {
            OperandKind::Disp { offset, reg } => {
                let idx = parse_register(reg).ok_or_else(|| {
                    AsmError::new(self.line, op.col, AsmErrorKind::UnknownRegister(reg.to_string()))
                })?;
                Ok((offset, idx, op.col))
            }
            _ => Err(AsmError::new(
                self.line,
                op.col,
                AsmErrorKind::ExpectedOperand("a displacement `imm(reg)`"),
            )),
        }
    }

    /// A branch/jump target: a label (resolved relative to `addr`) or a
    /// literal byte displacement.
    fn target(
        &mut self,
        labels: &HashMap<&str, u32>,
        addr: u32,
    ) -> Result<(i64, usize), AsmError> {
        let op = self.take("a label or byte displacement")?;
        match op.kind {
            OperandKind::Ident(name) => match labels.get(name) {
                Some(target) => Ok(((*target as i64) - (addr as i64), op.col)),
                None => Err(AsmError::new(
                    self.line,
                    op.col,
                    AsmErrorKind::UnknownLabel(name.to_string()),
                )),
            },
            OperandKind::Number(value) => Ok((value, op.col)),
            _ => Err(AsmError::new(
                self.line,
                op.col,
                AsmErrorKind::ExpectedOperand("a label or byte displacement"),
            )),
        }
    }

    fn finish(&self) -> Result<(), AsmError> {
        match self.items.get(self.next) {
            Some(extra) => Err(AsmError::new(self.line, extra.col, AsmErrorKind::ExtraOperand)),
            None => Ok(()),
        }
    }
}

fn check_range(
    line: usize,
    col: usize,
    value: i64,
    lo: i64,
    hi: i64,
    what: &'static str,
) -> Result<i64, AsmError> {
    if (lo..=hi).contains(&value) {
        Ok(value)
    } else {
        Err(AsmError::new(
            line,
            col,
            AsmErrorKind::ImmediateRange { value, what },
        ))
    }
}

fn check_even(line: usize, col: usize, value: i64) -> Result<i64, AsmError> {
    if value % 2 == 0 {
        Ok(value)
    } else {
        Err(AsmError::new(
            line,
            col,
            AsmErrorKind::UnalignedTarget { offset: value },
        ))
    }
}

fn encode_instruction(
    inst: &PendingInst<'_>,
    labels: &HashMap<&str, u32>,
) -> Result<u32, AsmError> {
    let mut ops = Ops::new(inst);
    let line = inst.line;
    let word = match inst.mnemonic {
        "add" | "sub" | "sll" | "slt" | "sltu" | "xor" | "srl" | "sra" | "or" | "and" => {
            let (funct3, funct7) = match inst.mnemonic {
                "add" => (0b000, 0),
                "sub" => (0b000, 0b0100000),
                "sll" => (0b001, 0),
                "slt" => (0b010, 0),
                "sltu" => (0b011, 0),
                "xor" => (0b100, 0),
                "srl" => (0b101, 0),
                "sra" => (0b101, 0b0100000),
                "or" => (0b110, 0),
                _ => (0b111, 0),
            };
            let rd = ops.reg()?;
            let rs1 = ops.reg()?;
            let rs2 = ops.reg()?;
            encode::r_type(funct7, rs2, rs1, funct3, rd, encode::OP)
        }
        "addi" | "slti" | "sltiu" | "xori" | "ori" | "andi" => {
            let funct3 = match inst.mnemonic {
                "addi" => 0b000,
                "slti" => 0b010,
                "sltiu" => 0b011,
                "xori" => 0b100,
                "ori" => 0b110,
                _ => 0b111,
            };
            let rd = ops.reg()?;
            let rs1 = ops.reg()?;
            let (imm, col) = ops.imm("a 12-bit immediate")?;
            check_range(line, col, imm, -2048, 4095, "a 12-bit immediate")?;
            encode::i_type(imm as i32, rs1, funct3, rd, encode::OP_IMM)
        }
        "slli" | "srli" | "srai" => {
            let funct3 = if inst.mnemonic == "slli" { 0b001 } else { 0b101 };
            let funct7: u32 = if inst.mnemonic == "srai" { 0b0100000 } else { 0 };
            let rd = ops.reg()?;
            let rs1 = ops.reg()?;
            let (shamt, col) = ops.imm("a shift amount")?;
            check_range(line, col, shamt, 0, 31, "a shift amount")?;
            encode::i_type(((funct7 << 5) | shamt as u32) as i32, rs1, funct3, rd, encode::OP_IMM)
        }
        "lui" | "auipc" => {
            let opcode = if inst.mnemonic == "lui" {
                encode::LUI
            } else {
                encode::AUIPC
            };
            let rd = ops.reg()?;
            let (imm, col) = ops.imm("a 20-bit immediate")?;
            check_range(line, col, imm, 0, 0xF_FFFF, "a 20-bit immediate")?;
            encode::u_type(imm as u32, rd, opcode)
        }
        "lb" | "lh" | "lw" | "lbu" | "lhu" => {
            let funct3 = match inst.mnemonic {
                "lb" => 0b000,
                "lh" => 0b001,
                "lw" => 0b010,
                "lbu" => 0b100,
                _ => 0b101,
            };
            let rd = ops.reg()?;
            let (offset, rs1, col) = ops.disp()?;
            check_range(line, col, offset, -2048, 2047, "a load offset")?;
            encode::i_type(offset as i32, rs1, funct3, rd, encode::LOAD)
        }
        "sb" | "sh" | "sw" => {
            let funct3 = match inst.mnemonic {
                "sb" => 0b000,
                "sh" => 0b001,
                _ => 0b010,
            };
            let rs2 = ops.reg()?;
            let (offset, rs1, col) = ops.disp()?;
            check_range(line, col, offset, -2048, 2047, "a store offset")?;
            encode::s_type(offset as i32, rs2, rs1, funct3, encode::STORE)
        }
        "beq" | "bne" | "blt" | "bge" | "bltu" | "bgeu" => {
            let funct3 = match inst.mnemonic {
                "beq" => 0b000,
                "bne" => 0b001,
                "blt" => 0b100,
                "bge" => 0b101,
                "bltu" => 0b110,
                _ => 0b111,
            };
            let rs1 = ops.reg()?;
            let rs2 = ops.reg()?;
            let (disp, col) = ops.target(labels, inst.addr)?;
            check_even(line, col, disp)?;
            check_range(line, col, disp, -4096, 4094, "a branch target")?;
            encode::b_type(disp as i32, rs2, rs1, funct3, encode::BRANCH)
        }
        "jal" => {
            let rd = if inst.operands.len() >= 2 { ops.reg()? } else { 1 };
            let (disp, col) = ops.target(labels, inst.addr)?;
            check_even(line, col, disp)?;
            check_range(line, col, disp, -(1 << 20), (1 << 20) - 2, "a jump target")?;
            encode::j_type(disp as i32, rd, encode::JAL)
        }
        "jalr" => {
            let rd = ops.reg()?;
            let (offset, rs1, col) = ops.disp()?;
            check_range(line, col, offset, -2048, 2047, "a jump offset")?;
            encode::i_type(offset as i32, rs1, 0b000, rd, encode::JALR)
        }
        "mv" => {
            let rd = ops.reg()?;
            let rs = ops.reg()?;
            encode::i_type(0, rs, 0b000, rd, encode::OP_IMM)
        }
        "li" => {
            let rd = ops.reg()?;
            let (imm, col) = ops.imm("a 12-bit immediate")?;
            check_range(line, col, imm, -2048, 2047, "li (12-bit)")?;
            encode::i_type(imm as i32, 0, 0b000, rd, encode::OP_IMM)
        }
        "j" => {
            let (disp, col) = ops.target(labels, inst.addr)?;
            check_even(line, col, disp)?;
            check_range(line, col, disp, -(1 << 20), (1 << 20) - 2, "a jump target")?;
            encode::j_type(disp as i32, 0, encode::JAL)
        }
        "nop" => encode::i_type(0, 0, 0b000, 0, encode::OP_IMM),
        "ret" => encode::i_type(0, 1, 0b000, 0, encode::JALR),
        "halt" => 0x0000_0000,
        other => {
            return Err(AsmError::new(
                line,
                inst.col,
                AsmErrorKind::UnknownMnemonic(other.to_string()),
            ))
        }
    };
    ops.finish()?;
    Ok(word)
}

fn emit_directive(
    name: &str,
    col: usize,
    line: &SourceLine<'_>,
    data: &mut Vec<u8>,
) -> Result<(), AsmError> {
    let ln = line.number;
    match name {
        ".byte" | ".half" | ".word" | ".dword" => {
            let (size, lo, hi): (usize, i64, i64) = match name {
                ".byte" => (1, -128, 255),
                ".half" => (2, -32768, 65535),
                ".word" => (4, i32::MIN as i64, u32::MAX as i64),
                _ => (8, i64::MIN, i64::MAX),
            };
            if line.operands.is_empty() {
                return Err(AsmError::new(ln, col, AsmErrorKind::ExpectedOperand("a value")));
            }
            for op in &line.operands {
                let OperandKind::Number(value) = op.kind else {
                    return Err(AsmError::new(
                        ln,
                        op.col,
                        AsmErrorKind::ExpectedOperand("a numeric value"),
                    ));
                };
                check_range(ln, op.col, value, lo, hi, "a data value")?;
                data.extend_from_slice(&(value as u64).to_le_bytes()[..size]);
            }
        }
        ".string" => {
            if line.operands.is_empty() {
                return Err(AsmError::new(
                    ln,
                    col,
                    AsmErrorKind::ExpectedOperand("a string literal"),
                ));
            }
            for op in &line.operands {
                let OperandKind::Str(ref bytes) = op.kind else {
                    return Err(AsmError::new(
                        ln,
                        op.col,
                        AsmErrorKind::ExpectedOperand("a string literal"),
                    ));
                };
                data.extend_from_slice(bytes);
                data.push(0);
            }
        }
        ".align" => {
            let Some(op) = line.operands.first() else {
                return Err(AsmError::new(
                    ln,
                    col,
                    AsmErrorKind::ExpectedOperand("an alignment exponent"),
                ));
            };
            let OperandKind::Number(n) = op.kind else {
                return Err(AsmError::new(
                    ln,
                    op.col,
                    AsmErrorKind::ExpectedOperand("an alignment exponent"),
                ));
            };
            check_range(ln, op.col, n, 0, 16, "an alignment exponent")?;
            let align = 1usize << n;
            while data.len() % align != 0 {
                data.push(0);
            }
        }
        other => {
            return Err(AsmError::new(
                ln,
                col,
                AsmErrorKind::BadDirective(other.to_string()),
            ))
        }
    }
    Ok(())
}

fn bind<'a>(
    labels: &mut HashMap<&'a str, u32>,
    pending: &mut Vec<(&'a str, usize, usize)>,
    addr: u32,
) -> Result<(), AsmError> {
    for (name, line, col) in pending.drain(..) {
        if labels.insert(name, addr).is_some() {
            return Err(AsmError::new(
                line,
                col,
                AsmErrorKind::DuplicateLabel(name.to_string()),
            ));
        }
    }
    Ok(())
}

/// Assembles `source` against the given segment layout.
pub fn assemble(source: &str, layout: &Layout) -> Result<Program, AsmError> {
    let mut labels: HashMap<&str, u32> = HashMap::new();
    let mut pending: Vec<(&str, usize, usize)> = Vec::new();
    let mut insts: Vec<PendingInst<'_>> = Vec::new();
    let mut data: Vec<u8> = Vec::new();
    let mut text_addr = layout.text_start;

    for (idx, raw) in source.lines().enumerate() {
        let line = lexer::lex_line(idx + 1, raw)?;
        if line.is_empty() {
            continue;
        }
        if let Some((name, col)) = line.label {
            pending.push((name, line.number, col));
        }
        let Some((op, col)) = line.op else { continue };
        if op.starts_with('.') {
            bind(&mut labels, &mut pending, layout.data_start.wrapping_add(data.len() as u32))?;
            emit_directive(op, col, &line, &mut data)?;
        } else {
            bind(&mut labels, &mut pending, text_addr)?;
            insts.push(PendingInst {
                line: line.number,
                col,
                mnemonic: op,
                operands: line.operands,
                addr: text_addr,
            });
            text_addr = text_addr.wrapping_add(4);
        }
    }
    // A trailing label names the address past the last instruction.
    bind(&mut labels, &mut pending, text_addr)?;

    let mut text = Vec::with_capacity(insts.len());
    for inst in &insts {
        text.push(AssembledWord {
            line: inst.line,
            word: encode_instruction(inst, &labels)?,
        });
    }
    Ok(Program { text, data })
}
