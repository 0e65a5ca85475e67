//! Control finite-state machine.
//!
//! One instruction takes five cycles: FETCH, DECODE, EXECUTE, MEMORY,
//! WRITEBACK. In each cycle the FSM decodes its current state together with
//! the latched opcode/funct3/funct7 into the full set of control signals,
//! reading them out of four declarative truth tables. The FSM must run
//! first on every rising edge: it is the only component allowed to mutate
//! control lines before the others observe them in the same phase.

use super::wires::{AluSrc1, AluSrc2, JumpSrc, MemAddrSrc, Wires, WriteDataSrc};
use super::Component;
use crate::common::{Bits, SimError, TruthTable};

/// The five machine states, advanced by one per cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsmState {
    Fetch,
    Decode,
    Execute,
    Memory,
    Writeback,
}

impl FsmState {
    fn next(self) -> Self {
        match self {
            Self::Fetch => Self::Decode,
            Self::Decode => Self::Execute,
            Self::Execute => Self::Memory,
            Self::Memory => Self::Writeback,
            Self::Writeback => Self::Fetch,
        }
    }
}

/// How the EXECUTE cycle derives `(aluOp, aluAlt)` for an opcode family.
#[derive(Clone, Copy)]
enum AluMode {
    /// R-type: op = funct3, alt = funct7\[5\].
    Register,
    /// I-type arithmetic: op = funct3, alt = funct7\[5\] for shifts only.
    Immediate,
    /// Plain addition (address generation, AUIPC, JAL/JALR).
    Add,
    /// Branch comparison: op = funct3\[2:1\], alt = 1.
    Branch,
}

#[derive(Clone, Copy)]
struct AluSetup {
    src1: AluSrc1,
    src2: AluSrc2,
    calc: bool,
    mode: AluMode,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MemCtrl {
    Inert,
    Load,
    Store,
    /// A load/store funct3 outside RV32I.
    Undefined,
}

#[derive(Clone, Copy)]
struct WbCtrl {
    reg_write: bool,
    src: WriteDataSrc,
}

#[derive(Clone, Copy)]
enum JumpCtrl {
    Pick {
        zero: bool,
        not_zero: bool,
        src: JumpSrc,
    },
    /// A branch funct3 outside RV32I.
    Undefined,
}

/// The control FSM and its decode tables.
pub struct ControlFsm {
    state: FsmState,
    alu_table: TruthTable<AluSetup>,
    mem_table: TruthTable<MemCtrl>,
    wb_table: TruthTable<WbCtrl>,
    jump_table: TruthTable<JumpCtrl>,
}

impl ControlFsm {
    pub fn new() -> Self {
        use AluSrc1::*;
        use AluSrc2::*;

        let alu = |src1, src2, calc, mode| AluSetup {
            src1,
            src2,
            calc,
            mode,
        };
        let alu_table = TruthTable::new(&[7])
            .row(&["0110011"], alu(Reg1, Reg2, true, AluMode::Register))
            .row(&["0010011"], alu(Reg1, Imm, true, AluMode::Immediate))
            .row(&["0010111"], alu(Pc, Imm, true, AluMode::Add)) // auipc
            .row(&["0X00011"], alu(Reg1, Imm, true, AluMode::Add)) // load/store address
            .row(&["1100011"], alu(Reg1, Reg2, true, AluMode::Branch))
            .row(&["1100111"], alu(Reg1, Imm, true, AluMode::Add)) // jalr
            .row(&["1101111"], alu(Pc, Imm, true, AluMode::Add)) // jal
            .row(&["XXXXXXX"], alu(Reg1, Reg2, false, AluMode::Add)); // lui and the rest

        let mem_table = TruthTable::new(&[7, 3])
            .row(&["0000011", "X00"], MemCtrl::Load) // lb/lbu
            .row(&["0000011", "X01"], MemCtrl::Load) // lh/lhu
            .row(&["0000011", "010"], MemCtrl::Load) // lw
            .row(&["0000011", "XXX"], MemCtrl::Undefined)
            .row(&["0100011", "000"], MemCtrl::Store) // sb
            .row(&["0100011", "001"], MemCtrl::Store) // sh
            .row(&["0100011", "010"], MemCtrl::Store) // sw
            .row(&["0100011", "XXX"], MemCtrl::Undefined)
            .row(&["XXXXXXX", "XXX"], MemCtrl::Inert);

        let wb = |reg_write, src| WbCtrl { reg_write, src };
        let wb_table = TruthTable::new(&[7])
            .row(&["0110011"], wb(true, WriteDataSrc::AluOut))
            .row(&["0010011"], wb(true, WriteDataSrc::AluOut))
            .row(&["0010111"], wb(true, WriteDataSrc::AluOut))
            .row(&["0110111"], wb(true, WriteDataSrc::Imm)) // lui
            .row(&["0000011"], wb(true, WriteDataSrc::MemRead)) // loads
            .row(&["110X111"], wb(true, WriteDataSrc::Pc4)) // jal, jalr
            .row(&["XXXXXXX"], wb(false, WriteDataSrc::AluOut)); // branches, stores

        let pick = |zero, not_zero, src| JumpCtrl::Pick {
            zero,
            not_zero,
            src,
        };
        let jump_table = TruthTable::new(&[7, 3])
            .row(&["1101111", "XXX"], pick(true, true, JumpSrc::PcImm)) // jal
            .row(&["1100111", "XXX"], pick(true, true, JumpSrc::Rs1Imm)) // jalr
            .row(&["1100011", "000"], pick(true, false, JumpSrc::PcImm)) // beq
            .row(&["1100011", "001"], pick(false, true, JumpSrc::PcImm)) // bne
            .row(&["1100011", "100"], pick(false, true, JumpSrc::PcImm)) // blt
            .row(&["1100011", "101"], pick(true, false, JumpSrc::PcImm)) // bge
            .row(&["1100011", "110"], pick(false, true, JumpSrc::PcImm)) // bltu
            .row(&["1100011", "111"], pick(true, false, JumpSrc::PcImm)) // bgeu
            .row(&["1100011", "XXX"], JumpCtrl::Undefined)
            .row(&["XXXXXXX", "XXX"], pick(false, false, JumpSrc::PcImm));

        Self {
            state: FsmState::Fetch,
            alu_table,
            mem_table,
            wb_table,
            jump_table,
        }
    }

    pub fn state(&self) -> FsmState {
        self.state
    }

    /// Restores every control line to its default. Runs at the start of
    /// each rising edge so signals have defined values for the whole cycle.
    fn reset_outputs(&self, w: &mut Wires) {
        w.load_instr = false;
        w.alu_calc = false;
        w.alu_op = Bits::zero(3);
        w.alu_alt = false;
        w.alu_src1 = AluSrc1::Reg1;
        w.alu_src2 = AluSrc2::Reg2;
        w.reg_write = false;
        w.write_data_src = WriteDataSrc::AluOut;
        w.mem_write = false;
        w.mem_size = Bits::unsigned(0b10, 2);
        w.mem_unsigned = false;
        w.mem_addr_src = MemAddrSrc::Pc;
        w.branch_zero = false;
        w.branch_not_zero = false;
        w.jump_src = JumpSrc::PcImm;
        w.load_pc = false;
    }

    fn undefined(w: &Wires) -> SimError {
        SimError::UndefinedDecode {
            opcode: w.opcode.to_u64() as u8,
            funct3: w.funct3.to_u64() as u8,
        }
    }
}

impl Default for ControlFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ControlFsm {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        self.reset_outputs(w);
        match self.state {
            FsmState::Fetch => {
                w.mem_addr_src = MemAddrSrc::Pc;
                w.mem_size = Bits::unsigned(0b10, 2);
            }
            FsmState::Decode => {
                w.load_instr = true;
            }
            FsmState::Execute => {
                let setup = self
                    .alu_table
                    .lookup(&[w.opcode])
                    .expect("ALU setup table has a catch-all row");
                w.alu_src1 = setup.src1;
                w.alu_src2 = setup.src2;
                w.alu_calc = setup.calc;
                let (op, alt) = match setup.mode {
                    AluMode::Add => (Bits::zero(3), false),
                    AluMode::Register => (w.funct3, w.funct7.bit(5)),
                    AluMode::Immediate => {
                        let is_shift = matches!(w.funct3.to_u64(), 0b001 | 0b101);
                        (w.funct3, is_shift && w.funct7.bit(5))
                    }
                    AluMode::Branch => (w.funct3.slice(1, 3).zero_extend(3), true),
                };
                w.alu_op = op;
                w.alu_alt = alt;
            }
            FsmState::Memory => match self.mem_table.lookup(&[w.opcode, w.funct3]) {
                Some(MemCtrl::Load) => {
                    w.mem_addr_src = MemAddrSrc::AluOut;
                    w.mem_size = w.funct3.slice(0, 2);
                    w.mem_unsigned = w.funct3.bit(2);
                }
                Some(MemCtrl::Store) => {
                    w.mem_addr_src = MemAddrSrc::AluOut;
                    w.mem_size = w.funct3.slice(0, 2);
                    w.mem_write = true;
                }
                Some(MemCtrl::Inert) => {}
                Some(MemCtrl::Undefined) | None => return Err(Self::undefined(w)),
            },
            FsmState::Writeback => {
                let wb = self
                    .wb_table
                    .lookup(&[w.opcode])
                    .expect("writeback table has a catch-all row");
                w.reg_write = wb.reg_write;
                w.write_data_src = wb.src;
                match self.jump_table.lookup(&[w.opcode, w.funct3]) {
                    Some(JumpCtrl::Pick {
                        zero,
                        not_zero,
                        src,
                    }) => {
                        w.branch_zero = *zero;
                        w.branch_not_zero = *not_zero;
                        w.jump_src = *src;
                    }
                    Some(JumpCtrl::Undefined) | None => return Err(Self::undefined(w)),
                }
                w.load_pc = true;
            }
        }
        Ok(())
    }

    fn falling_edge(&mut self, _w: &mut Wires) {
        self.state = self.state.next();
    }
}
