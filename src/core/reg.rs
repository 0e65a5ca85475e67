//! Register file.
//!
//! Thirty-two 32-bit registers. x0 is hardwired to zero: reads return zero
//! and writes are silently discarded. On the rising edge the file samples
//! both read ports before applying any write; the sampled values go out on
//! the falling edge.

use super::wires::Wires;
use super::Component;
use crate::common::{Bits, SimError};

pub struct RegisterFile {
    regs: [u32; 32],
    out1: u32,
    out2: u32,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            regs: [0; 32],
            out1: 0,
            out2: 0,
        }
    }

    /// Reads a register; x0 always returns 0.
    pub fn read(&self, idx: usize) -> u32 {
        if idx == 0 {
            0
        } else {
            self.regs[idx]
        }
    }

    /// Writes a register; writes to x0 are ignored.
    pub fn write(&mut self, idx: usize, val: u32) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    /// Dumps all registers to stdout, two per line.
    pub fn dump(&self) {
        for i in (0..32).step_by(2) {
            println!(
                "x{:<2}={:#010x} x{:<2}={:#010x}",
                i,
                self.read(i),
                i + 1,
                self.read(i + 1)
            );
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for RegisterFile {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        self.out1 = self.read(w.read_reg1.to_u64() as usize);
        self.out2 = self.read(w.read_reg2.to_u64() as usize);
        if w.reg_write {
            self.write(w.write_reg.to_u64() as usize, w.write_data.to_u64() as u32);
        }
        Ok(())
    }

    fn falling_edge(&mut self, w: &mut Wires) {
        w.read_data1 = Bits::unsigned(self.out1 as u64, 32);
        w.read_data2 = Bits::unsigned(self.out2 as u64, 32);
    }
}
