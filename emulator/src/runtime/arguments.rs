//! Addressing modes and operand resolution
//!
//! The two low digits of an instruction word hold the opcode, every following digit holds the
//! mode of a parameter: the hundreds for the first one, the thousands for the second one, and so
//! on.

use parse_display::Display;

use super::{fault::Fault, memory::Memory};
use crate::constants::{Address, Word};

/// How a parameter cell should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "lowercase")]
pub enum Mode {
    /// The cell holds the address of the operand
    Position,

    /// The cell holds the operand itself
    Immediate,
}

/// Extract the mode of a parameter (1-based) from an instruction word
///
/// # Errors
///
/// Fails if the digit is neither 0 nor 1.
pub fn mode(instruction: Word, parameter: usize) -> Result<Mode, Fault> {
    // Digits past the width of a word are all zeroes
    let digit = u32::try_from(parameter + 1)
        .ok()
        .and_then(|exponent| Word::checked_pow(10, exponent))
        .map_or(0, |divisor| instruction / divisor % 10);

    match digit {
        0 => Ok(Mode::Position),
        1 => Ok(Mode::Immediate),
        mode => Err(Fault::InvalidMode {
            instruction,
            parameter,
            mode,
        }),
    }
}

/// Read the raw cell of a parameter
fn raw(memory: &Memory, pc: Address, parameter: usize) -> Result<Word, Fault> {
    let address = pc.saturating_add(parameter);
    Ok(memory.get(address)?)
}

/// A parameter read as a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Param {
    #[display("[{0}]")]
    Position(Word),

    #[display("{0}")]
    Immediate(Word),
}

impl Param {
    /// Decode a parameter of the instruction at `pc`
    ///
    /// # Errors
    ///
    /// Fails if the parameter cell is outside of the memory or if its mode is invalid.
    pub fn fetch(
        memory: &Memory,
        pc: Address,
        instruction: Word,
        parameter: usize,
    ) -> Result<Self, Fault> {
        let cell = raw(memory, pc, parameter)?;
        Ok(match mode(instruction, parameter)? {
            Mode::Position => Self::Position(cell),
            Mode::Immediate => Self::Immediate(cell),
        })
    }

    /// Get the operand this parameter designates
    ///
    /// # Errors
    ///
    /// Fails if a position parameter does not point inside the memory.
    pub fn value(self, memory: &Memory) -> Result<Word, Fault> {
        match self {
            Self::Position(address) => {
                let address = memory.address(address)?;
                Ok(memory.get(address)?)
            }
            Self::Immediate(value) => Ok(value),
        }
    }
}

/// A parameter designating the cell an instruction writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("[{0}]")]
pub struct Target(pub Word);

impl Target {
    /// Decode a target parameter of the instruction at `pc`
    ///
    /// # Errors
    ///
    /// Fails if the parameter cell is outside of the memory, or if its mode is anything but
    /// position.
    pub fn fetch(
        memory: &Memory,
        pc: Address,
        instruction: Word,
        parameter: usize,
    ) -> Result<Self, Fault> {
        let cell = raw(memory, pc, parameter)?;
        match mode(instruction, parameter)? {
            Mode::Position => Ok(Self(cell)),
            Mode::Immediate => Err(Fault::ImmediateTarget {
                instruction,
                parameter,
            }),
        }
    }

    /// Get the address to write to, without dereferencing it
    ///
    /// # Errors
    ///
    /// Fails if the target does not point inside the memory.
    pub fn address(self, memory: &Memory) -> Result<Address, Fault> {
        Ok(memory.address(self.0)?)
    }
}

/// Resolve a parameter of the instruction at `pc` to its operand
///
/// # Errors
///
/// Fails on an invalid mode or on any access outside of the memory.
pub fn resolve_value(
    memory: &Memory,
    pc: Address,
    instruction: Word,
    parameter: usize,
) -> Result<Word, Fault> {
    Param::fetch(memory, pc, instruction, parameter)?.value(memory)
}

/// Resolve a parameter of the instruction at `pc` to the address it writes to
///
/// # Errors
///
/// Fails on an invalid or immediate mode, or on any access outside of the memory.
pub fn resolve_target(
    memory: &Memory,
    pc: Address,
    instruction: Word,
    parameter: usize,
) -> Result<Address, Fault> {
    Target::fetch(memory, pc, instruction, parameter)?.address(memory)
}
