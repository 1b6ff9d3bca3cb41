use parse_display::Display;
use tracing::debug;

use super::{
    arguments::{Param, Target},
    channel::Channel,
    fault::Fault,
    memory::Memory,
    Computer,
};
use crate::constants::{Address, Word};

/// Operation selected by the two low digits of an instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "snake_case")]
pub enum Opcode {
    Nop,
    Add,
    Multiply,
    Input,
    Output,
    JumpIfTrue,
    JumpIfFalse,
    LessThan,
    Equals,
    Halt,
}

impl TryFrom<Word> for Opcode {
    type Error = Fault;

    fn try_from(instruction: Word) -> Result<Self, Self::Error> {
        use Opcode::*;

        let opcode = instruction % 100;
        Ok(match opcode {
            0 => Nop,
            1 => Add,
            2 => Multiply,
            3 => Input,
            4 => Output,
            5 => JumpIfTrue,
            6 => JumpIfFalse,
            7 => LessThan,
            8 => Equals,
            99 => Halt,
            opcode => {
                return Err(Fault::InvalidOpcode {
                    instruction,
                    opcode,
                })
            }
        })
    }
}

impl Opcode {
    /// Number of cells taken by the instruction, the instruction word included
    #[must_use]
    pub const fn width(self) -> usize {
        use Opcode::*;

        match self {
            Nop | Halt => 1,
            Input | Output => 2,
            JumpIfTrue | JumpIfFalse => 3,
            Add | Multiply | LessThan | Equals => 4,
        }
    }
}

/// What the machine should do once an instruction has been executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Move to the following instruction
    Next,

    /// Move to the given address
    Jump(Word),

    /// Wait for input without moving
    Suspend,

    Halt,
}

impl Opcode {
    /// Execute the instruction at `computer.pc`
    ///
    /// Operands are resolved lazily, in parameter order, so that a jump which is not taken never
    /// looks at its target.
    #[tracing::instrument(skip(computer, input, output), level = "trace")]
    pub(crate) fn execute(
        self,
        computer: &mut Computer,
        instruction: Word,
        input: &Channel,
        output: &Channel,
    ) -> Result<Flow, Fault> {
        use Opcode::*;

        match self {
            Nop => {}

            Add => {
                let a = computer.value(instruction, 1)?;
                let b = computer.value(instruction, 2)?;
                let target = computer.target(instruction, 3)?;
                let res = computer.config.overflow.apply(a.overflowing_add(b))?;
                debug!("{} + {} = {}", a, b, res);
                computer.write(target, res)?;
            }

            Multiply => {
                let a = computer.value(instruction, 1)?;
                let b = computer.value(instruction, 2)?;
                let target = computer.target(instruction, 3)?;
                let res = computer.config.overflow.apply(a.overflowing_mul(b))?;
                debug!("{} * {} = {}", a, b, res);
                computer.write(target, res)?;
            }

            Input => {
                let Ok(value) = input.pop() else {
                    debug!("Input channel empty, suspending");
                    return Ok(Flow::Suspend);
                };
                let target = computer.target(instruction, 1)?;
                debug!("in => {}", value);
                computer.write(target, value)?;
            }

            Output => {
                let value = computer.value(instruction, 1)?;
                debug!("out({})", value);
                output.push(value);
                computer.last_output = Some(value);
            }

            JumpIfTrue => {
                if computer.value(instruction, 1)? != 0 {
                    return Ok(Flow::Jump(computer.value(instruction, 2)?));
                }
            }

            JumpIfFalse => {
                if computer.value(instruction, 1)? == 0 {
                    return Ok(Flow::Jump(computer.value(instruction, 2)?));
                }
            }

            LessThan => {
                let a = computer.value(instruction, 1)?;
                let b = computer.value(instruction, 2)?;
                let target = computer.target(instruction, 3)?;
                debug!("{} < {} => {}", a, b, a < b);
                computer.write(target, Word::from(a < b))?;
            }

            Equals => {
                let a = computer.value(instruction, 1)?;
                let b = computer.value(instruction, 2)?;
                let target = computer.target(instruction, 3)?;
                debug!("{} == {} => {}", a, b, a == b);
                computer.write(target, Word::from(a == b))?;
            }

            Halt => return Ok(Flow::Halt),
        }

        Ok(Flow::Next)
    }
}

/// A fully decoded instruction, used to display programs
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Instruction {
    #[display("nop")]
    Nop,

    #[display("add  {0}, {1}, {2}")]
    Add(Param, Param, Target),

    #[display("mul  {0}, {1}, {2}")]
    Mul(Param, Param, Target),

    #[display("in   {0}")]
    In(Target),

    #[display("out  {0}")]
    Out(Param),

    /// Jump if the first parameter is not zero
    #[display("jt   {0}, {1}")]
    Jt(Param, Param),

    /// Jump if the first parameter is zero
    #[display("jf   {0}, {1}")]
    Jf(Param, Param),

    #[display("lt   {0}, {1}, {2}")]
    Lt(Param, Param, Target),

    #[display("eq   {0}, {1}, {2}")]
    Eq(Param, Param, Target),

    #[display("halt")]
    Halt,
}

impl Instruction {
    /// Decode the instruction at an address, with all of its parameters
    ///
    /// # Errors
    ///
    /// Fails if the opcode or a mode is invalid, or if a parameter is past the end of the memory.
    pub fn decode(memory: &Memory, pc: Address) -> Result<Self, Fault> {
        let instruction = memory.get(pc)?;
        let param = |parameter| Param::fetch(memory, pc, instruction, parameter);
        let target = |parameter| Target::fetch(memory, pc, instruction, parameter);

        Ok(match Opcode::try_from(instruction)? {
            Opcode::Nop => Self::Nop,
            Opcode::Add => Self::Add(param(1)?, param(2)?, target(3)?),
            Opcode::Multiply => Self::Mul(param(1)?, param(2)?, target(3)?),
            Opcode::Input => Self::In(target(1)?),
            Opcode::Output => Self::Out(param(1)?),
            Opcode::JumpIfTrue => Self::Jt(param(1)?, param(2)?),
            Opcode::JumpIfFalse => Self::Jf(param(1)?, param(2)?),
            Opcode::LessThan => Self::Lt(param(1)?, param(2)?, target(3)?),
            Opcode::Equals => Self::Eq(param(1)?, param(2)?, target(3)?),
            Opcode::Halt => Self::Halt,
        })
    }

    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Nop => Opcode::Nop,
            Self::Add(..) => Opcode::Add,
            Self::Mul(..) => Opcode::Multiply,
            Self::In(_) => Opcode::Input,
            Self::Out(_) => Opcode::Output,
            Self::Jt(..) => Opcode::JumpIfTrue,
            Self::Jf(..) => Opcode::JumpIfFalse,
            Self::Lt(..) => Opcode::LessThan,
            Self::Eq(..) => Opcode::Equals,
            Self::Halt => Opcode::Halt,
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.opcode().width()
    }
}
