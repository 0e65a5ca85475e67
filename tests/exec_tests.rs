//! End-to-end execution tests: load a program, run to the terminator,
//! inspect machine state.

use assert_hex::assert_eq_hex;
use rv32_datapath::asm::{self, Layout};
use rv32_datapath::common::SimError;
use rv32_datapath::config::Config;
use rv32_datapath::core::control::FsmState;
use rv32_datapath::core::Simulator;

const TEXT_START: u32 = 0x0001_0000;

/// Runs raw machine words to termination.
fn run_words(words: &[u32]) -> Simulator {
    let config = Config::default();
    let mut sim = Simulator::with_program(&config, words);
    sim.run().expect("program runs to the terminator");
    sim
}

/// Assembles `source` against the default layout and loads it.
fn build(source: &str) -> Simulator {
    let config = Config::default();
    let layout = Layout::new(
        config.general.text_start_val(),
        config.general.data_start_val(),
    );
    let program = asm::assemble(source, &layout).expect("source assembles");
    let mut sim = Simulator::with_program(&config, &program.words());
    sim.set_data(&program.data);
    sim
}

/// Assembles and runs `source` to termination.
fn run_asm(source: &str) -> Simulator {
    let mut sim = build(source);
    sim.run().expect("program runs to the terminator");
    sim
}

/// Tests the initial machine state: PC at the text base, sp/gp preset,
/// everything else zero, FSM in FETCH.
#[test]
fn test_initial_state() {
    let sim = Simulator::new(&Config::default());
    assert_eq_hex!(sim.pc(), TEXT_START);
    assert_eq_hex!(sim.register(2), 0xBFFF_FFF0);
    assert_eq_hex!(sim.register(3), 0x1000_8000);
    assert_eq!(sim.register(5), 0);
    assert_eq!(sim.fsm_state(), FsmState::Fetch);
}

/// Tests `addi x5, x0, -1`: the 12-bit immediate sign-extends to 32 bits.
#[test]
fn test_addi_sign_extends() {
    let sim = run_words(&[0xFFF00293, 0x00000000]);
    assert_eq_hex!(sim.register(5), 0xFFFF_FFFF);
}

/// Tests `lui x28, 100000`.
#[test]
fn test_lui() {
    let sim = run_words(&[0x186A0E37, 0x00000000]);
    assert_eq_hex!(sim.register(28), 0x186A_0000);
}

/// Tests `auipc x5, 0` at the text base.
#[test]
fn test_auipc() {
    let sim = run_words(&[0x00000297, 0x00000000]);
    assert_eq_hex!(sim.register(5), TEXT_START);
}

/// Tests a countdown loop: the `bne` is taken twice, then falls through.
#[test]
fn test_countdown_loop() {
    // addi x5, x0, 3 / addi x5, x5, -1 / bne x5, x0, -4 / halt
    let sim = run_words(&[0x00300293, 0xFFF28293, 0xFE029EE3, 0x00000000]);
    assert_eq!(sim.register(5), 0);
    // 1 setup + 3 decrements + 3 branches retired.
    assert_eq!(sim.stats().instructions_retired, 7);
    assert_eq!(sim.stats().inst_branch, 3);
}

/// Tests a store/load round trip through RAM.
#[test]
fn test_store_load_round_trip() {
    // addi x6, x0, 0x123 / sw x6, 0(x0) / lw x7, 0(x0) / halt
    let sim = run_words(&[0x12300313, 0x00602023, 0x00002383, 0x00000000]);
    assert_eq_hex!(sim.register(6), 0x123);
    assert_eq_hex!(sim.register(7), 0x123);
    assert_eq_hex!(sim.ram().load(0, 4), 0x123);
}

/// Tests JAL/JALR: x1 holds the address after the JAL and control returns
/// to it.
#[test]
fn test_jal_jalr_link_and_return() {
    let sim = run_asm(
        "
    jal x1, hop
    addi x6, x0, 55
    j end
hop:
    jalr x0, 0(x1)
end:
    halt
",
    );
    assert_eq_hex!(sim.register(1), TEXT_START + 4);
    assert_eq!(sim.register(6), 55);
}

/// Tests that register 0 reads zero after every cycle, even when written.
#[test]
fn test_x0_stays_zero() {
    // addi x0, x0, 5 / halt
    let mut sim = Simulator::with_program(&Config::default(), &[0x00500013, 0x00000000]);
    loop {
        let more = sim.tick().unwrap();
        assert_eq!(sim.register(0), 0);
        if !more {
            break;
        }
    }
}

/// Tests that `set_registers` rejects a non-zero x0 and bad indexes.
#[test]
fn test_set_registers_rejects_misuse() {
    let mut sim = Simulator::new(&Config::default());
    assert_eq!(
        sim.set_registers(&[(0, 1)]),
        Err(SimError::InvalidRegister { index: 0, value: 1 })
    );
    assert_eq!(
        sim.set_registers(&[(32, 7)]),
        Err(SimError::InvalidRegister { index: 32, value: 7 })
    );
    assert!(sim.set_registers(&[(0, 0), (31, 7)]).is_ok());
    assert_eq!(sim.register(31), 7);
}

/// Tests that an RV64-only load funct3 is an undefined decode: the MEMORY
/// cycle errors and the FSM does not advance.
#[test]
fn test_undefined_load_decode_freezes_fsm() {
    // ld x0, 0(x0) is not RV32I.
    let mut sim = Simulator::with_program(&Config::default(), &[0x00003003]);
    assert!(sim.tick().unwrap()); // FETCH
    assert!(sim.tick().unwrap()); // DECODE
    assert!(sim.tick().unwrap()); // EXECUTE
    let err = sim.tick().unwrap_err();
    assert!(matches!(
        err,
        SimError::UndefinedDecode {
            opcode: 0b0000011,
            funct3: 0b011
        }
    ));
    assert_eq!(sim.fsm_state(), FsmState::Memory);
    // Still frozen on the next attempt.
    assert!(sim.tick().is_err());
    assert_eq!(sim.fsm_state(), FsmState::Memory);
}

/// Tests that a branch funct3 outside RV32I errors in WRITEBACK.
#[test]
fn test_undefined_branch_decode() {
    // Opcode BRANCH with funct3 = 010.
    let mut sim = Simulator::with_program(&Config::default(), &[0x00002063]);
    for _ in 0..4 {
        assert!(sim.tick().unwrap());
    }
    let err = sim.tick().unwrap_err();
    assert!(matches!(
        err,
        SimError::UndefinedDecode {
            opcode: 0b1100011,
            funct3: 0b010
        }
    ));
    assert_eq!(sim.fsm_state(), FsmState::Writeback);
}

/// Tests shift boundary behavior through full instructions.
#[test]
fn test_shift_boundaries() {
    let mut sim = build(
        "
    srai x6, x5, 1
    srli x7, x5, 1
    slli x28, x5, 0
    srli x29, x5, 31
    halt
",
    );
    sim.set_registers(&[(5, 0x8000_0000)]).unwrap();
    sim.run().unwrap();
    assert_eq_hex!(sim.register(6), 0xC000_0000);
    assert_eq_hex!(sim.register(7), 0x4000_0000);
    assert_eq_hex!(sim.register(28), 0x8000_0000);
    assert_eq!(sim.register(29), 1);
}

/// Tests that BLTU treats `0xFFFF_FFFF < 1` as false.
#[test]
fn test_bltu_unsigned_compare() {
    let mut sim = build(
        "
    bltu x5, x7, skip
    addi x28, x0, 1
skip:
    halt
",
    );
    sim.set_registers(&[(5, 0xFFFF_FFFF), (7, 1)]).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.register(28), 1);
}

/// Tests that BEQ on equal registers is taken.
#[test]
fn test_beq_taken_on_equal() {
    let mut sim = build(
        "
    beq x5, x5, yes
    addi x28, x0, 1
yes:
    halt
",
    );
    sim.set_registers(&[(5, 42)]).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.register(28), 0);
}

/// Tests LB sign extension against LBU zero extension of byte 0xFF.
#[test]
fn test_byte_load_extension() {
    let sim = run_asm(
        "
    addi x5, x0, 255
    sb x5, 0(x0)
    lb x6, 0(x0)
    lbu x7, 0(x0)
    halt
",
    );
    assert_eq_hex!(sim.register(6), 0xFFFF_FFFF);
    assert_eq_hex!(sim.register(7), 0x0000_00FF);
}

/// Tests a misaligned half-word store/load pair: the two bytes at the odd
/// address come back, no trap.
#[cfg(not(feature = "strict-align"))]
#[test]
fn test_misaligned_half_word_access() {
    let mut sim = build(
        "
    sh x5, 1(x0)
    lhu x6, 1(x0)
    halt
",
    );
    sim.set_registers(&[(5, 0xBEEF)]).unwrap();
    sim.run().unwrap();
    assert_eq_hex!(sim.register(6), 0xBEEF);
}

/// Tests that the strict alignment mode traps misaligned data accesses.
#[cfg(feature = "strict-align")]
#[test]
fn test_strict_align_traps() {
    let mut sim = build(
        "
    sh x5, 1(x0)
    halt
",
    );
    sim.set_registers(&[(5, 0xBEEF)]).unwrap();
    let err = sim.run().unwrap_err();
    assert!(matches!(err, SimError::MisalignedAccess { addr: 1, size: 2 }));
}

/// Tests little-endian layout observed through size-mixing store/loads.
#[test]
fn test_little_endian_size_mixing() {
    let mut sim = build(
        "
    sw x5, 0(x0)
    lbu x6, 0(x0)
    lbu x7, 3(x0)
    lhu x28, 2(x0)
    halt
",
    );
    sim.set_registers(&[(5, 0x1234_5678)]).unwrap();
    sim.run().unwrap();
    assert_eq_hex!(sim.register(6), 0x78);
    assert_eq_hex!(sim.register(7), 0x12);
    assert_eq_hex!(sim.register(28), 0x1234);
}

/// Tests modulo-2^32 addition through the full datapath.
#[test]
fn test_add_wraps() {
    let mut sim = build(
        "
    add x7, x5, x6
    halt
",
    );
    sim.set_registers(&[(5, 0xFFFF_FFFF), (6, 1)]).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.register(7), 0);
}

/// Tests that the PC wraps modulo 2^32 instead of trapping.
#[test]
fn test_pc_wraps_at_top_of_address_space() {
    let mut config = Config::default();
    config.general.text_start = "0xfffffff8".to_string();
    // addi x5, x0, 1 / addi x6, x0, 2 / halt (at 0x0 after the wrap)
    let mut sim = Simulator::with_program(&config, &[0x00100293, 0x00200313, 0x00000000]);
    sim.run().unwrap();
    assert_eq!(sim.register(5), 1);
    assert_eq!(sim.register(6), 2);
    assert_eq!(sim.pc(), 0);
}

/// Tests loading from the assembled data segment.
#[test]
fn test_data_segment_load() {
    let sim = run_asm(
        "
    lui x5, 0x10000
    lw x6, 0(x5)
    halt
    .word 0xCAFEBABE
",
    );
    assert_eq_hex!(sim.register(6), 0xCAFE_BABE);
}

/// Tests cycle accounting: five cycles per instruction plus the final
/// fetch of the terminator.
#[test]
fn test_cycle_and_instruction_counts() {
    // addi / addi / addi / halt
    let sim = run_words(&[0x00100293, 0x00200313, 0x00300393, 0x00000000]);
    assert_eq!(sim.stats().instructions_retired, 3);
    assert_eq!(sim.stats().cycles, 16);
    assert_eq!(sim.stats().inst_alu, 3);
}

/// Tests that a finished machine keeps reporting termination.
#[test]
fn test_tick_after_termination() {
    let mut sim = run_words(&[0x00100293, 0x00000000]);
    assert!(!sim.tick().unwrap());
    assert!(!sim.tick().unwrap());
    assert_eq!(sim.latched_instruction(), 0);
}
