//! Bus selectors.
//!
//! Each mux is combinational and routes on both edges: the rising pass
//! feeds components later in the same phase (RAM needs `memAddress` on the
//! rising edge it loads), the falling pass finalizes the routed value after
//! its select and sources have settled (the PC latches `pcIn` on the
//! falling edge, after JumpControl has driven `pcSrc`).

use super::wires::{AluSrc1, AluSrc2, MemAddrSrc, PcSrc, Wires, WriteDataSrc};
use super::Component;
use crate::common::{Bits, SimError};

/// Selects the value written back to the register file.
pub struct WriteDataMux;

impl WriteDataMux {
    fn route(w: &mut Wires) {
        w.write_data = match w.write_data_src {
            WriteDataSrc::AluOut => w.alu_out,
            WriteDataSrc::MemRead => w.mem_read_data,
            WriteDataSrc::Pc4 => w.pc_val4,
            WriteDataSrc::Imm => w.immediate,
        };
    }
}

impl Component for WriteDataMux {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        Self::route(w);
        Ok(())
    }

    fn falling_edge(&mut self, w: &mut Wires) {
        Self::route(w);
    }
}

/// Selects ALU operand A.
pub struct AluSrc1Mux;

impl AluSrc1Mux {
    fn route(w: &mut Wires) {
        w.alu_in1 = match w.alu_src1 {
            AluSrc1::Reg1 => w.read_data1,
            AluSrc1::Pc => w.pc_val,
        };
    }
}

impl Component for AluSrc1Mux {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        Self::route(w);
        Ok(())
    }

    fn falling_edge(&mut self, w: &mut Wires) {
        Self::route(w);
    }
}

/// Selects ALU operand B.
pub struct AluSrc2Mux;

impl AluSrc2Mux {
    fn route(w: &mut Wires) {
        w.alu_in2 = match w.alu_src2 {
            AluSrc2::Reg2 => w.read_data2,
            AluSrc2::Imm => w.immediate,
        };
    }
}

impl Component for AluSrc2Mux {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        Self::route(w);
        Ok(())
    }

    fn falling_edge(&mut self, w: &mut Wires) {
        Self::route(w);
    }
}

/// Selects the next PC value.
pub struct PcSrcMux;

impl PcSrcMux {
    fn route(w: &mut Wires) {
        w.pc_in = match w.pc_src {
            PcSrc::Pc4 => w.pc_val4,
            PcSrc::Jump => w.jump_addr,
        };
    }
}

impl Component for PcSrcMux {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        Self::route(w);
        Ok(())
    }

    fn falling_edge(&mut self, w: &mut Wires) {
        Self::route(w);
    }
}

/// Selects the memory address: PC for fetches, the ALU sum for data.
///
/// A jump may leave the PC misaligned; the fetch path masks the two low
/// bits so the following fetch reads the aligned word at that address.
pub struct MemAddrMux;

impl MemAddrMux {
    fn route(w: &mut Wires) {
        w.mem_address = match w.mem_addr_src {
            MemAddrSrc::Pc => {
                let aligned = (w.pc_val.to_u64() as u32) & !0b11;
                Bits::unsigned(aligned as u64, 32)
            }
            MemAddrSrc::AluOut => w.alu_out,
        };
    }
}

impl Component for MemAddrMux {
    fn rising_edge(&mut self, w: &mut Wires) -> Result<(), SimError> {
        Self::route(w);
        Ok(())
    }

    fn falling_edge(&mut self, w: &mut Wires) {
        Self::route(w);
    }
}
