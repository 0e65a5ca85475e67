//! Engine error types.

use std::error::Error;
use std::fmt;

/// Errors surfaced by the simulation engine.
///
/// `EndOfProgram` is deliberately absent: reaching the all-zero terminator
/// is the normal completion path and `Simulator::tick` reports it by
/// returning `Ok(false)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// An opcode/funct combination no decode table row accepts.
    UndefinedDecode { opcode: u8, funct3: u8 },
    /// `set_registers` was given an index out of range or a non-zero
    /// value for the hardwired x0.
    InvalidRegister { index: usize, value: u32 },
    /// A misaligned data access, raised only with the `strict-align`
    /// feature enabled.
    MisalignedAccess { addr: u32, size: u32 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedDecode { opcode, funct3 } => write!(
                f,
                "undefined decode: opcode {:#09b}, funct3 {:#05b}",
                opcode, funct3
            ),
            Self::InvalidRegister { index, value } => {
                if *index >= 32 {
                    write!(f, "register index {} out of range", index)
                } else {
                    write!(f, "cannot set x0 to {:#x}: register 0 is hardwired to zero", value)
                }
            }
            Self::MisalignedAccess { addr, size } => write!(
                f,
                "misaligned {}-byte access at {:#010x}",
                size, addr
            ),
        }
    }
}

impl Error for SimError {}
