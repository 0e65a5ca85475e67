//! Instruction memory: the instruction latch and field decoder.
//!
//! On DECODE's rising edge the component latches `memReadData` as the new
//! instruction word. Every rising edge it re-extracts the fixed fields and
//! rebuilds the immediate from the latch (the extraction is idempotent), so
//! the decoded lines are valid for the whole instruction. The all-zero word
//! is not a valid RV32I encoding and serves as the program terminator.

use super::wires::Wires;
use super::Component;
use crate::common::{Bits, SimError, TruthTable};

/// Encoding of `addi x0, x0, 0`, latched at reset so decoding produces
/// defined outputs before the first fetch completes.
const NOP: u32 = 0x0000_0013;

/// Immediate format families, selected by opcode.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ImmFormat {
    I,
    S,
    B,
    U,
    J,
    /// R-type and unknown opcodes carry no immediate.
    None,
}

pub struct InstructionMemory {
    latch: Bits,
    formats: TruthTable<ImmFormat>,
    end_of_program: bool,
}

impl InstructionMemory {
    pub fn new() -> Self {
        let formats = TruthTable::new(&[7])
            .row(&["00X0011"], ImmFormat::I) // loads, op-imm
            .row(&["1100111"], ImmFormat::I) // jalr
            .row(&["0100011"], ImmFormat::S)
            .row(&["1100011"], ImmFormat::B)
            .row(&["0X10111"], ImmFormat::U) // lui, auipc
            .row(&["1101111"], ImmFormat::J)
            .row(&["XXXXXXX"], ImmFormat::None);
        Self {
            latch: Bits::unsigned(NOP as u64, 32),
            formats,
            end_of_program: false,
        }
    }

    /// The currently latched instruction word.
    pub fn latched(&self) -> u32 {
        self.latch.to_u64() as u32
    }

    /// True once the all-zero terminator has been latched.
    pub fn end_of_program(&self) -> bool {
        self.end_of_program
    }

    /// Builds the sign-extended 32-bit immediate for the latched word.
    ///
    /// Pieces are joined most-significant first, per the RV32I encoding
    /// diagrams; B and J reassemble their scrambled fields and append the
    /// implicit zero bit.
    fn immediate(&self) -> Bits {
        let i = &self.latch;
        let format = self
            .formats
            .lookup(&[i.slice(0, 7)])
            .expect("immediate format table has a catch-all row");
        match format {
            ImmFormat::I => i.slice(20, 32).sign_extend(32),
            ImmFormat::S => Bits::join(&[i.slice(25, 32), i.slice(7, 12)]).sign_extend(32),
            ImmFormat::B => Bits::join(&[
                i.slice(31, 32),
                i.slice(7, 8),
                i.slice(25, 31),
                i.slice(8, 12),
                Bits::zero(1),
            ])
            .sign_extend(32),
            ImmFormat::U => Bits::join(&[i.slice(12, 32), Bits::zero(12)]),
            ImmFormat::J => Bits::join(&[
                i.slice(31, 32),
                i.slice(12, 20),
                i.slice(20, 21),
                i.slice(21, 31),
                Bits::zero(1),
            ])
            .sign_extend(32),
            ImmFormat::None => Bits::zero(32),
        }
    }

    fn publish(&self, w: &mut Wires) {
        w.opcode = self.latch.slice(0, 7);
        w.write_reg = self.latch.slice(7, 12);
        w.funct3 = self.latch.slice(12, 15);
        w.read_reg1 = self.latch.slice(15, 20);
        w.read_reg2 = self.latch.slice(20, 25);
        w.funct7 = self.latch.slice(25, 32);
        w.immediate = self.immediate();
    }
}

impl Default for InstructionMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for InstructionMemory {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        if w.load_instr {
            self.latch = w.mem_read_data;
        }
        if self.latch.is_zero() {
            self.end_of_program = true;
            return Ok(());
        }
        // Published on the rising edge as well: the register file samples
        // readReg1/readReg2 later in this same phase.
        self.publish(w);
        Ok(())
    }

    fn falling_edge(&mut self, w: &mut Wires) {
        if !self.end_of_program {
            self.publish(w);
        }
    }
}
