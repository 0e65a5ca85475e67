//! The inter-component signal bus.
//!
//! `Wires` is the record of every signal travelling between components in
//! the current cycle. It is owned by the simulator and passed by exclusive
//! reference through the fixed component order, so every read observes the
//! write of an earlier-positioned component in the same phase. Single-bit
//! control lines are `bool`s, mux selects are closed enums, and multi-bit
//! buses carry `Bits` with their architectural widths.

use crate::common::Bits;

/// Operand A source select for the ALU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AluSrc1 {
    #[default]
    Reg1,
    Pc,
}

/// Operand B source select for the ALU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AluSrc2 {
    #[default]
    Reg2,
    Imm,
}

/// Register-file write-data source select.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WriteDataSrc {
    #[default]
    AluOut,
    MemRead,
    Pc4,
    Imm,
}

/// Memory address source select.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MemAddrSrc {
    #[default]
    Pc,
    AluOut,
}

/// Next-PC source select, driven by JumpControl.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PcSrc {
    #[default]
    Pc4,
    Jump,
}

/// Jump target base select.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JumpSrc {
    /// Target = PC + immediate (branches, JAL).
    #[default]
    PcImm,
    /// Target = rs1 + immediate (JALR).
    Rs1Imm,
}

/// Current-cycle values of every inter-component signal.
#[derive(Clone, Debug)]
pub struct Wires {
    // Decoder outputs.
    pub opcode: Bits,     // 7
    pub funct3: Bits,     // 3
    pub funct7: Bits,     // 7
    pub read_reg1: Bits,  // 5
    pub read_reg2: Bits,  // 5
    pub write_reg: Bits,  // 5
    pub immediate: Bits,  // 32

    // Control lines, reset by the FSM at the start of every rising edge.
    pub load_instr: bool,
    pub alu_calc: bool,
    pub alu_op: Bits, // 3
    pub alu_alt: bool,
    pub alu_src1: AluSrc1,
    pub alu_src2: AluSrc2,
    pub reg_write: bool,
    pub write_data_src: WriteDataSrc,
    pub mem_write: bool,
    pub mem_size: Bits, // 2
    pub mem_unsigned: bool,
    pub mem_addr_src: MemAddrSrc,
    pub branch_zero: bool,
    pub branch_not_zero: bool,
    pub jump_src: JumpSrc,
    pub load_pc: bool,

    // Datapath buses.
    pub mem_address: Bits,   // 32
    pub mem_read_data: Bits, // 32
    pub alu_in1: Bits,       // 32
    pub alu_in2: Bits,       // 32
    pub alu_out: Bits,       // 32
    pub alu_zero: bool,
    pub read_data1: Bits, // 32
    pub read_data2: Bits, // 32
    pub write_data: Bits, // 32
    pub pc_val: Bits,     // 32
    pub pc_val4: Bits,    // 32
    pub pc_in: Bits,      // 32
    pub pc_src: PcSrc,
    pub jump_addr: Bits, // 32
}

impl Wires {
    /// A cold bus: datapath buses zero, PC lines at the reset vector.
    pub fn new(text_start: u32) -> Self {
        Self {
            opcode: Bits::zero(7),
            funct3: Bits::zero(3),
            funct7: Bits::zero(7),
            read_reg1: Bits::zero(5),
            read_reg2: Bits::zero(5),
            write_reg: Bits::zero(5),
            immediate: Bits::zero(32),

            load_instr: false,
            alu_calc: false,
            alu_op: Bits::zero(3),
            alu_alt: false,
            alu_src1: AluSrc1::default(),
            alu_src2: AluSrc2::default(),
            reg_write: false,
            write_data_src: WriteDataSrc::default(),
            mem_write: false,
            mem_size: Bits::unsigned(0b10, 2),
            mem_unsigned: false,
            mem_addr_src: MemAddrSrc::default(),
            branch_zero: false,
            branch_not_zero: false,
            jump_src: JumpSrc::default(),
            load_pc: false,

            mem_address: Bits::zero(32),
            mem_read_data: Bits::zero(32),
            alu_in1: Bits::zero(32),
            alu_in2: Bits::zero(32),
            alu_out: Bits::zero(32),
            alu_zero: false,
            read_data1: Bits::zero(32),
            read_data2: Bits::zero(32),
            write_data: Bits::zero(32),
            pc_val: Bits::unsigned(text_start as u64, 32),
            pc_val4: Bits::unsigned(text_start.wrapping_add(4) as u64, 32),
            pc_in: Bits::unsigned(text_start as u64, 32),
            pc_src: PcSrc::default(),
            jump_addr: Bits::zero(32),
        }
    }
}
