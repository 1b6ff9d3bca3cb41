//! Render the memory of a machine as a listing of instructions

use parse_display::Display;

use crate::constants::{Address, Word};
use crate::runtime::{Instruction, Memory};

/// A line of a listing: either an instruction, or a cell which could not be decoded as one
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Line {
    #[display("{0}")]
    Instruction(Instruction),

    #[display(".word {0}")]
    Data(Word),
}

impl Line {
    /// Number of cells covered by this line
    #[must_use]
    pub const fn width(&self) -> usize {
        match self {
            Self::Instruction(instruction) => instruction.width(),
            Self::Data(_) => 1,
        }
    }
}

/// Walks the memory from the first cell, decoding instructions one after the other
#[derive(Debug, Clone)]
pub struct Disassembler<'a> {
    memory: &'a Memory,
    address: Address,
}

impl Iterator for Disassembler<'_> {
    type Item = (Address, Line);

    fn next(&mut self) -> Option<Self::Item> {
        let address = self.address;
        let cell = self.memory.get(address).ok()?;
        let line = Instruction::decode(self.memory, address)
            .map_or(Line::Data(cell), Line::Instruction);
        self.address += line.width();
        Some((address, line))
    }
}

#[must_use]
pub fn disassemble(memory: &Memory) -> Disassembler<'_> {
    Disassembler { memory, address: 0 }
}

/// Format the whole memory, one line per instruction
#[must_use]
pub fn listing(memory: &Memory) -> String {
    disassemble(memory)
        .map(|(address, line)| format!("{address:04}: {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
