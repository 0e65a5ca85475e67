//! Jump and branch resolution.
//!
//! Purely combinational: no latched state. The branch-taken predicate
//! combines the EXECUTE-stage zero flag with the `branchZero` and
//! `branchNotZero` masks set during WRITEBACK, and the target adds the
//! sign-extended immediate to either the instruction's own PC or rs1
//! (JALR). The sum wraps modulo 2^32.

use super::wires::{JumpSrc, PcSrc, Wires};
use super::Component;
use crate::common::{Bits, SimError};

pub struct JumpControl;

impl Component for JumpControl {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        let taken = (w.branch_zero && w.alu_zero) || (w.branch_not_zero && !w.alu_zero);
        w.pc_src = if taken { PcSrc::Jump } else { PcSrc::Pc4 };

        let base = match w.jump_src {
            JumpSrc::PcImm => w.pc_val.to_u64() as u32,
            JumpSrc::Rs1Imm => w.read_data1.to_u64() as u32,
        };
        let target = base.wrapping_add(w.immediate.to_u64() as u32);
        w.jump_addr = Bits::unsigned(target as u64, 32);
        Ok(())
    }

    fn falling_edge(&mut self, _w: &mut Wires) {}
}
