//! The microarchitectural simulation engine.
//!
//! A `Simulator` owns the signal bus and the datapath components and steps
//! them one clock cycle per `tick`. Each cycle has two phases: a rising
//! edge where components sample the bus and update internal state, and a
//! falling edge where they finalize their outputs. Components run in a
//! fixed order in both phases — control first, then the bus selectors, then
//! the decoder, then the datapath proper — so combinational control signals
//! propagate to their consumers within the same phase. That order is a
//! load-bearing invariant of the engine.

/// Arithmetic logic unit.
pub mod alu;

/// Control finite-state machine and decode tables.
pub mod control;

/// Instruction latch and field decoder.
pub mod decode;

/// Jump and branch resolution.
pub mod jump;

/// Bus selectors.
pub mod mux;

/// Program counter.
pub mod pc;

/// Sparse byte-addressable memory.
pub mod ram;

/// Register file.
pub mod reg;

/// The inter-component signal bus.
pub mod wires;

use crate::common::SimError;
use crate::config::Config;
use crate::stats::SimStats;

use alu::Alu;
use control::{ControlFsm, FsmState};
use decode::InstructionMemory;
use jump::JumpControl;
use mux::{AluSrc1Mux, AluSrc2Mux, MemAddrMux, PcSrcMux, WriteDataMux};
use pc::Pc;
use ram::Ram;
use reg::RegisterFile;
use wires::{MemAddrSrc, Wires};

/// Shared capability set of every datapath component.
///
/// The rising edge samples inputs and updates internal state and may
/// publish outputs for later-positioned components; the falling edge
/// finalizes outputs on the bus. A rising-edge error aborts the cycle
/// before the falling phase, leaving the control FSM un-advanced.
pub trait Component {
    fn rising_edge(&mut self, wires: &mut Wires) -> Result<(), SimError>;
    fn falling_edge(&mut self, wires: &mut Wires);
}

/// A single-hart RV32I machine stepped one cycle at a time.
pub struct Simulator {
    wires: Wires,

    control: ControlFsm,
    write_data_mux: WriteDataMux,
    alu_src1_mux: AluSrc1Mux,
    alu_src2_mux: AluSrc2Mux,
    pc_src_mux: PcSrcMux,
    mem_addr_mux: MemAddrMux,
    instr_mem: InstructionMemory,
    ram: Ram,
    pc: Pc,
    jump: JumpControl,
    alu: Alu,
    regs: RegisterFile,

    stats: SimStats,
    trace: bool,
    text_start: u32,
    data_start: u32,
}

impl Simulator {
    /// A cold machine: PC at the text base, sp/gp from the configuration,
    /// a nop in the instruction latch and an empty RAM.
    pub fn new(config: &Config) -> Self {
        let text_start = config.general.text_start_val();
        let mut regs = RegisterFile::new();
        regs.write(2, config.registers.sp_val());
        regs.write(3, config.registers.gp_val());
        Self {
            wires: Wires::new(text_start),
            control: ControlFsm::new(),
            write_data_mux: WriteDataMux,
            alu_src1_mux: AluSrc1Mux,
            alu_src2_mux: AluSrc2Mux,
            pc_src_mux: PcSrcMux,
            mem_addr_mux: MemAddrMux,
            instr_mem: InstructionMemory::new(),
            ram: Ram::new(),
            pc: Pc::new(text_start),
            jump: JumpControl,
            alu: Alu::new(),
            regs,
            stats: SimStats::default(),
            trace: config.general.trace_instructions,
            text_start,
            data_start: config.general.data_start_val(),
        }
    }

    /// Convenience constructor: a cold machine with `words` already loaded.
    pub fn with_program(config: &Config, words: &[u32]) -> Self {
        let mut sim = Self::new(config);
        sim.set_code(words);
        sim
    }

    /// Loads machine words into RAM starting at the text base.
    pub fn set_code(&mut self, words: &[u32]) {
        for (i, word) in words.iter().enumerate() {
            self.ram
                .store(self.text_start.wrapping_add(4 * i as u32), 4, *word);
        }
    }

    /// Loads a data segment into RAM starting at the data base.
    pub fn set_data(&mut self, data: &[u8]) {
        self.ram.store_bytes(self.data_start, data);
    }

    /// Presets registers from `(index, value)` pairs.
    ///
    /// Rejects indexes out of range and any attempt to give the hardwired
    /// x0 a non-zero value.
    pub fn set_registers(&mut self, values: &[(usize, u32)]) -> Result<(), SimError> {
        for &(index, value) in values {
            if index >= 32 || (index == 0 && value != 0) {
                return Err(SimError::InvalidRegister { index, value });
            }
            self.regs.write(index, value);
        }
        Ok(())
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Runs one clock cycle. Returns `false` once the all-zero terminator
    /// word has been latched; the machine state is then frozen.
    pub fn tick(&mut self) -> Result<bool, SimError> {
        if self.instr_mem.end_of_program() {
            return Ok(false);
        }

        let state = self.control.state();

        self.control.rising_edge(&mut self.wires)?;
        self.write_data_mux.rising_edge(&mut self.wires)?;
        self.alu_src1_mux.rising_edge(&mut self.wires)?;
        self.alu_src2_mux.rising_edge(&mut self.wires)?;
        self.pc_src_mux.rising_edge(&mut self.wires)?;
        self.mem_addr_mux.rising_edge(&mut self.wires)?;
        self.instr_mem.rising_edge(&mut self.wires)?;
        if self.instr_mem.end_of_program() {
            return Ok(false);
        }
        self.ram.rising_edge(&mut self.wires)?;
        self.pc.rising_edge(&mut self.wires)?;
        self.jump.rising_edge(&mut self.wires)?;
        self.alu.rising_edge(&mut self.wires)?;
        self.regs.rising_edge(&mut self.wires)?;

        if self.trace_enabled() {
            self.trace_cycle(state);
        }

        self.control.falling_edge(&mut self.wires);
        self.write_data_mux.falling_edge(&mut self.wires);
        self.alu_src1_mux.falling_edge(&mut self.wires);
        self.alu_src2_mux.falling_edge(&mut self.wires);
        self.pc_src_mux.falling_edge(&mut self.wires);
        self.mem_addr_mux.falling_edge(&mut self.wires);
        self.instr_mem.falling_edge(&mut self.wires);
        self.ram.falling_edge(&mut self.wires);
        self.pc.falling_edge(&mut self.wires);
        self.jump.falling_edge(&mut self.wires);
        self.alu.falling_edge(&mut self.wires);
        self.regs.falling_edge(&mut self.wires);

        self.stats.cycles += 1;
        if state == FsmState::Writeback {
            self.stats.retire(self.wires.opcode.to_u64() as u8);
        }
        Ok(true)
    }

    /// Ticks until the terminator is latched. Returns the cycle count.
    pub fn run(&mut self) -> Result<u64, SimError> {
        while self.tick()? {}
        Ok(self.stats.cycles)
    }

    pub fn pc(&self) -> u32 {
        self.pc.value()
    }

    pub fn register(&self, idx: usize) -> u32 {
        self.regs.read(idx)
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn fsm_state(&self) -> FsmState {
        self.control.state()
    }

    pub fn latched_instruction(&self) -> u32 {
        self.instr_mem.latched()
    }

    /// Current-cycle signal values, for visualization hosts.
    pub fn wires(&self) -> &Wires {
        &self.wires
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    fn trace_enabled(&self) -> bool {
        self.trace || cfg!(feature = "always-trace")
    }

    fn trace_cycle(&self, state: FsmState) {
        let w = &self.wires;
        match state {
            FsmState::Fetch => {
                eprintln!("IF  pc={:#010x}", w.pc_val.to_u64());
            }
            FsmState::Decode => {
                eprintln!(
                    "ID  inst={:#010x} rd=x{} rs1=x{} rs2=x{} imm={:#x}",
                    self.instr_mem.latched(),
                    w.write_reg.to_u64(),
                    w.read_reg1.to_u64(),
                    w.read_reg2.to_u64(),
                    w.immediate.to_u64()
                );
            }
            FsmState::Execute => {
                if w.alu_calc {
                    eprintln!(
                        "EX  a={:#010x} b={:#010x}",
                        w.alu_in1.to_u64(),
                        w.alu_in2.to_u64()
                    );
                } else {
                    eprintln!("EX  pc={:#010x}", w.pc_val.to_u64());
                }
            }
            FsmState::Memory => {
                if w.mem_write {
                    eprintln!(
                        "MEM STORE addr={:#010x} data={:#010x}",
                        w.mem_address.to_u64(),
                        w.read_data2.to_u64()
                    );
                } else if w.mem_addr_src == MemAddrSrc::AluOut {
                    eprintln!("MEM LOAD addr={:#010x}", w.mem_address.to_u64());
                } else {
                    eprintln!("MEM pc={:#010x}", w.pc_val.to_u64());
                }
            }
            FsmState::Writeback => {
                if w.reg_write {
                    eprintln!(
                        "WB  x{} <= {:#010x}",
                        w.write_reg.to_u64(),
                        w.write_data.to_u64()
                    );
                } else {
                    eprintln!("WB  pc={:#010x}", w.pc_val.to_u64());
                }
            }
        }
    }
}
