//! Program counter.
//!
//! A 32-bit register starting at the configured text segment base. It
//! latches `pcIn` under `loadPC` on the falling edge — by then PCSrcMux has
//! finalized `pcIn` from the jump resolution of this cycle — and then
//! publishes `pcVal` and the sequential `pcVal4`. The increment wraps
//! modulo 2^32.

use super::wires::Wires;
use super::Component;
use crate::common::{Bits, SimError};

pub struct Pc {
    val: u32,
}

impl Pc {
    pub fn new(text_start: u32) -> Self {
        Self { val: text_start }
    }

    pub fn value(&self) -> u32 {
        self.val
    }
}

impl Component for Pc {
    fn rising_edge(&mut self, _w: &mut Wires) -> Result<(), SimError> {
        Ok(())
    }

    fn falling_edge(&mut self, w: &mut Wires) {
        if w.load_pc {
            self.val = w.pc_in.to_u64() as u32;
        }
        w.pc_val = Bits::unsigned(self.val as u64, 32);
        w.pc_val4 = Bits::unsigned(self.val.wrapping_add(4) as u64, 32);
    }
}
