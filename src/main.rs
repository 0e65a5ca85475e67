//! RV32I Datapath Simulator CLI.
//!
//! The main executable for the simulator. It loads the TOML configuration,
//! assembles a source file (or loads raw little-endian machine words),
//! runs the machine to the terminator and reports final state.
//!
//! # Usage
//!
//! Two input modes:
//! 1. **Assembly Mode**: a `.s`/`.asm` file is assembled by the built-in
//!    two-pass assembler.
//! 2. **Binary Mode**: any other file is loaded as raw little-endian words.

use clap::Parser;
use serde::Serialize;
use std::{fs, process};

use rv32_datapath::asm;
use rv32_datapath::config::Config;
use rv32_datapath::core::Simulator;

/// Command-line arguments for the datapath simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "RV32I cycle-stepped datapath simulator")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    /// Assembly source (`.s`/`.asm`) or raw binary to execute.
    file: String,

    /// Print a per-cycle trace of the datapath to stderr.
    #[arg(long)]
    trace: bool,

    /// Print the final machine state as JSON.
    #[arg(long)]
    dump_json: bool,
}

/// Final machine state, serialized under `--dump-json`.
#[derive(Serialize)]
struct MachineState {
    pc: u32,
    registers: Vec<u32>,
    ram: Vec<(u32, u8)>,
    cycles: u64,
    instructions: u64,
}

fn main() {
    let args = Args::parse();
    let config_content = fs::read_to_string(&args.config).expect("Failed to read config");
    let config: Config = toml::from_str(&config_content).expect("Failed to parse config");

    let mut sim = Simulator::new(&config);
    if args.trace {
        sim.set_trace(true);
    }

    if args.file.ends_with(".s") || args.file.ends_with(".asm") {
        let source = fs::read_to_string(&args.file).unwrap_or_else(|e| {
            eprintln!("[!] FATAL: Could not read file '{}': {}", args.file, e);
            process::exit(1);
        });
        let layout = asm::Layout::new(
            config.general.text_start_val(),
            config.general.data_start_val(),
        );
        let program = match asm::assemble(&source, &layout) {
            Ok(program) => program,
            Err(e) => {
                eprintln!("{}: {}", args.file, e);
                process::exit(1);
            }
        };
        println!(
            "[Loader] {} instructions, {} data bytes",
            program.text.len(),
            program.data.len()
        );
        sim.set_code(&program.words());
        sim.set_data(&program.data);
    } else {
        let bytes = fs::read(&args.file).unwrap_or_else(|e| {
            eprintln!("[!] FATAL: Could not read file '{}': {}", args.file, e);
            process::exit(1);
        });
        let words: Vec<u32> = bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                u32::from_le_bytes(word)
            })
            .collect();
        println!("[Loader] {} words from raw binary", words.len());
        sim.set_code(&words);
    }

    loop {
        match sim.tick() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                eprintln!("\n[!] FATAL: {}", e);
                sim.registers().dump();
                process::exit(1);
            }
        }
    }

    println!("\n[*] Program terminated at pc={:#010x}", sim.pc());
    sim.registers().dump();
    sim.stats().print();

    if args.dump_json {
        let state = MachineState {
            pc: sim.pc(),
            registers: (0..32).map(|i| sim.register(i)).collect(),
            ram: sim.ram().iter().collect(),
            cycles: sim.stats().cycles,
            instructions: sim.stats().instructions_retired,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&state).expect("state serialization")
        );
    }
}
