use parse_display::Display;
use thiserror::Error;

use crate::constants::Word;

use super::memory::MemoryError;

/// Broad category of a [`Fault`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "kebab-case")]
pub enum FaultKind {
    Decode,
    Bounds,
    Overflow,
    StepLimit,
}

/// Unrecoverable condition stopping a machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("invalid opcode {opcode} in instruction {instruction}")]
    InvalidOpcode { instruction: Word, opcode: Word },

    #[error("invalid mode {mode} for parameter {parameter} of instruction {instruction}")]
    InvalidMode {
        instruction: Word,
        parameter: usize,
        mode: Word,
    },

    #[error("parameter {parameter} of instruction {instruction} is written to and cannot be immediate")]
    ImmediateTarget { instruction: Word, parameter: usize },

    #[error("invalid memory access ({0})")]
    InvalidMemoryAccess(#[from] MemoryError),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("step limit of {0} instructions reached")]
    StepLimit(u64),
}

impl Fault {
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        match self {
            Fault::InvalidOpcode { .. }
            | Fault::InvalidMode { .. }
            | Fault::ImmediateTarget { .. } => FaultKind::Decode,
            Fault::InvalidMemoryAccess(_) => FaultKind::Bounds,
            Fault::Overflow => FaultKind::Overflow,
            Fault::StepLimit(_) => FaultKind::StepLimit,
        }
    }
}
