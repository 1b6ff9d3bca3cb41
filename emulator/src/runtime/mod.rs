use parse_display::{Display, FromStr};
use tracing::debug;

use crate::constants::{Address, Word};

mod arguments;
mod channel;
mod fault;
mod instructions;
mod memory;

pub use self::arguments::{mode, resolve_target, resolve_value, Mode, Param, Target};
pub use self::channel::{Channel, Empty};
pub use self::fault::{Fault, FaultKind};
pub use self::instructions::{Instruction, Opcode};
pub use self::memory::{Memory, MemoryError};

use self::instructions::Flow;

/// What happens when the program counter leaves the memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromStr)]
#[display(style = "lowercase")]
pub enum Termination {
    /// Leaving the memory, by stepping past its end or jumping outside of it, is a fault
    #[default]
    Strict,

    /// Leaving the memory halts the machine
    Lenient,
}

/// What happens when an addition or a multiplication overflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromStr)]
#[display(style = "lowercase")]
pub enum Overflow {
    /// Two's complement wrapping
    #[default]
    Wrap,

    /// Raise a fault, leaving the target untouched
    Fault,
}

impl Overflow {
    /// Apply the policy to the result of an `overflowing_*` operation
    fn apply(self, (res, overflowed): (Word, bool)) -> Result<Word, Fault> {
        match self {
            Self::Fault if overflowed => Err(Fault::Overflow),
            _ => Ok(res),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub termination: Termination,
    pub overflow: Overflow,

    /// Maximum number of instructions to execute over the lifetime of the machine
    pub max_steps: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Running,
    Suspended,
    Halted,
    Faulted(Fault),
}

/// Why a call to [`Computer::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The machine halted, with the last value it output if any
    Halted(Option<Word>),

    /// The machine is waiting for input at this address
    Suspended(Address),
}

/// A single machine: its memory, its program counter and its execution status
#[derive(Clone, Default)]
pub struct Computer {
    pub memory: Memory,
    pub pc: Address,

    /// Number of instructions executed so far, across resumes
    pub steps: u64,

    status: Status,
    last_output: Option<Word>,
    config: Config,
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ pc: {}, status: {:?}, steps: {}, memory: [...] }}",
            self.pc, self.status, self.steps
        )
    }
}

impl Computer {
    #[must_use]
    pub fn new(memory: impl Into<Memory>) -> Self {
        Self::with_config(memory, Config::default())
    }

    #[must_use]
    pub fn with_config(memory: impl Into<Memory>, config: Config) -> Self {
        Self {
            memory: memory.into(),
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// The last value written by an `OUTPUT` instruction
    #[must_use]
    pub fn last_output(&self) -> Option<Word> {
        self.last_output
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        matches!(self.status, Status::Halted)
    }

    fn value(&self, instruction: Word, parameter: usize) -> Result<Word, Fault> {
        resolve_value(&self.memory, self.pc, instruction, parameter)
    }

    fn target(&self, instruction: Word, parameter: usize) -> Result<Address, Fault> {
        resolve_target(&self.memory, self.pc, instruction, parameter)
    }

    fn write(&mut self, address: Address, value: Word) -> Result<(), Fault> {
        let cell = self.memory.get_mut(address)?;
        *cell = value;
        Ok(())
    }

    /// Called when the program counter does not point inside the memory anymore
    fn leave_memory(&self, fault: MemoryError) -> Result<Option<Exit>, Fault> {
        match self.config.termination {
            Termination::Strict => Err(fault.into()),
            Termination::Lenient => {
                debug!(pc = self.pc, "Left the memory, halting");
                Ok(Some(Exit::Halted(self.last_output)))
            }
        }
    }

    /// Execute a single instruction
    ///
    /// Returns the reason to stop if the instruction halted or suspended the machine.
    #[tracing::instrument(skip(self, input, output), fields(pc = self.pc), level = "trace")]
    fn step(&mut self, input: &Channel, output: &Channel) -> Result<Option<Exit>, Fault> {
        if let Some(limit) = self.config.max_steps {
            if self.steps >= limit {
                return Err(Fault::StepLimit(limit));
            }
        }

        let instruction = match self.memory.get(self.pc) {
            Ok(instruction) => instruction,
            Err(e) => return self.leave_memory(e),
        };
        let opcode = Opcode::try_from(instruction)?;
        debug!(pc = self.pc, instruction, %opcode, "Executing instruction");

        let flow = opcode.execute(self, instruction, input, output)?;
        if flow != Flow::Suspend {
            self.steps += 1;
        }

        match flow {
            Flow::Next => {
                self.pc += opcode.width();
                Ok(None)
            }
            Flow::Jump(target) => match self.memory.address(target) {
                Ok(address) => {
                    debug!("Jumping to address {}", address);
                    self.pc = address;
                    Ok(None)
                }
                Err(e) => self.leave_memory(e),
            },
            Flow::Suspend => Ok(Some(Exit::Suspended(self.pc))),
            Flow::Halt => Ok(Some(Exit::Halted(self.last_output))),
        }
    }

    /// Run until the machine halts, faults, or needs input that is not there yet.
    ///
    /// A suspended machine can be run again once its input channel has been refilled: it picks
    /// up at the `INPUT` instruction it stopped on. Running a halted machine again reports the
    /// same halt, and running a faulted one reports the same fault.
    ///
    /// # Errors
    ///
    /// Returns the fault that stopped the machine.
    #[tracing::instrument(skip(self, input, output), fields(pc = self.pc), level = "debug")]
    pub fn run(&mut self, input: &Channel, output: &Channel) -> Result<Exit, Fault> {
        match &self.status {
            Status::Halted => return Ok(Exit::Halted(self.last_output)),
            Status::Faulted(fault) => return Err(fault.clone()),
            Status::Running | Status::Suspended => {}
        }

        self.status = Status::Running;
        loop {
            match self.step(input, output) {
                Ok(None) => {}
                Ok(Some(exit)) => {
                    self.status = match exit {
                        Exit::Halted(_) => {
                            debug!(steps = self.steps, output = ?self.last_output, "Machine halted");
                            Status::Halted
                        }
                        Exit::Suspended(pc) => {
                            debug!(pc, "Machine suspended");
                            Status::Suspended
                        }
                    };
                    return Ok(exit);
                }
                Err(fault) => {
                    debug!(pc = self.pc, %fault, "Machine faulted");
                    self.status = Status::Faulted(fault.clone());
                    return Err(fault);
                }
            }
        }
    }

    /// Run a machine fed with a fixed list of inputs, collecting its outputs
    ///
    /// # Errors
    ///
    /// Returns the fault that stopped the machine.
    pub fn run_with_inputs(
        &mut self,
        inputs: impl IntoIterator<Item = Word>,
    ) -> Result<(Exit, Vec<Word>), Fault> {
        let input: Channel = inputs.into_iter().collect();
        let output = Channel::new();
        let exit = self.run(&input, &output)?;
        Ok((exit, output.drain()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn run(program: Vec<Word>) -> Computer {
        let mut computer = Computer::new(program);
        computer.run_with_inputs([]).unwrap();
        computer
    }

    #[test]
    fn add_test() {
        let computer = run(vec![1, 0, 0, 0, 99]);
        assert_eq!(computer.memory.as_slice(), &[2, 0, 0, 0, 99]);
        assert_eq!(computer.pc, 4);
        assert!(computer.is_halted());
    }

    #[test]
    fn multiply_test() {
        assert_eq!(run(vec![2, 3, 0, 3, 99]).memory.as_slice(), &[2, 3, 0, 6, 99]);
        assert_eq!(
            run(vec![2, 4, 4, 5, 99, 0]).memory.as_slice(),
            &[2, 4, 4, 5, 99, 9801]
        );
        // Immediate operand
        assert_eq!(
            run(vec![1002, 4, 3, 4, 33]).memory.as_slice(),
            &[1002, 4, 3, 4, 99]
        );
    }

    #[test]
    fn self_modifying_test() {
        assert_eq!(
            run(vec![1, 1, 1, 4, 99, 5, 6, 0, 99]).memory.as_slice(),
            &[30, 1, 1, 4, 2, 5, 6, 0, 99]
        );
    }

    #[test]
    fn nop_test() {
        let computer = run(vec![0, 0, 1101, 2, 3, 0, 99]);
        assert_eq!(computer.memory.get(0), Ok(5));
        assert_eq!(computer.steps, 4);
    }

    #[test]
    fn echo_test() {
        let mut computer = Computer::new(vec![3, 0, 4, 0, 99]);
        let (exit, outputs) = computer.run_with_inputs([42]).unwrap();
        assert_eq!(exit, Exit::Halted(Some(42)));
        assert_eq!(outputs, vec![42]);
    }

    #[test]
    fn compare_test() {
        // Output 1 if the input is equal to 8, 0 otherwise
        let program = vec![3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
        for (input, expected) in [(8, 1), (7, 0), (9, 0)] {
            let (_, outputs) = Computer::new(program.clone())
                .run_with_inputs([input])
                .unwrap();
            assert_eq!(outputs, vec![expected]);
        }

        // Output 1 if the input is less than 8, 0 otherwise
        let program = vec![3, 3, 1107, -1, 8, 3, 4, 3, 99];
        for (input, expected) in [(7, 1), (8, 0), (-20, 1)] {
            let (_, outputs) = Computer::new(program.clone())
                .run_with_inputs([input])
                .unwrap();
            assert_eq!(outputs, vec![expected]);
        }
    }

    #[test]
    fn jump_test() {
        // Output 0 if the input is zero, 1 otherwise
        let program = vec![3, 12, 6, 12, 15, 1, 13, 14, 13, 4, 13, 99, -1, 0, 1, 9];
        for (input, expected) in [(0, 0), (5, 1)] {
            let (_, outputs) = Computer::new(program.clone())
                .run_with_inputs([input])
                .unwrap();
            assert_eq!(outputs, vec![expected]);
        }

        let program = vec![3, 3, 1105, -1, 9, 1101, 0, 0, 12, 4, 12, 99, 1];
        for (input, expected) in [(0, 0), (-3, 1)] {
            let (_, outputs) = Computer::new(program.clone())
                .run_with_inputs([input])
                .unwrap();
            assert_eq!(outputs, vec![expected]);
        }
    }

    #[test]
    fn jump_not_taken_test() {
        // jt 0, [100] is not taken, so the cell 100 is never read
        let computer = run(vec![105, 0, 100, 99]);
        assert_eq!(computer.pc, 3);
        assert_eq!(computer.steps, 2);
    }

    #[test]
    fn suspend_test() {
        let mut computer = Computer::new(vec![3, 0, 4, 0, 99]);
        let input = Channel::new();
        let output = Channel::new();

        // Nothing to read: the machine suspends without touching anything
        assert_eq!(computer.run(&input, &output), Ok(Exit::Suspended(0)));
        assert_eq!(computer.status(), &Status::Suspended);
        assert_eq!(computer.memory.as_slice(), &[3, 0, 4, 0, 99]);
        assert_eq!(computer.pc, 0);
        assert_eq!(computer.steps, 0);

        // Still nothing
        assert_eq!(computer.run(&input, &output), Ok(Exit::Suspended(0)));

        input.push(7);
        assert_eq!(computer.run(&input, &output), Ok(Exit::Halted(Some(7))));
        assert_eq!(output.drain(), vec![7]);

        // Halted machines stay halted
        assert_eq!(computer.run(&input, &output), Ok(Exit::Halted(Some(7))));
    }

    #[test]
    fn unknown_opcode_test() {
        let mut computer = Computer::new(vec![1101, 1, 1, 0, 42, 99]);
        let fault = computer.run_with_inputs([]).unwrap_err();
        assert_eq!(
            fault,
            Fault::InvalidOpcode {
                instruction: 42,
                opcode: 42
            }
        );
        assert_eq!(computer.memory.get(0), Ok(2));
        assert_eq!(computer.pc, 4);
        assert_eq!(computer.status(), &Status::Faulted(fault.clone()));

        // Faulted machines stay faulted
        assert_eq!(computer.run_with_inputs([]), Err(fault));
    }

    #[test]
    fn invalid_mode_test() {
        let mut computer = Computer::new(vec![201, 0, 0, 0, 99]);
        let fault = computer.run_with_inputs([]).unwrap_err();
        assert_eq!(fault.kind(), FaultKind::Decode);
        assert_eq!(computer.memory.as_slice(), &[201, 0, 0, 0, 99]);
    }

    #[test]
    fn immediate_target_test() {
        let mut computer = Computer::new(vec![3, 0, 10_001, 0, 0, 0, 99]);
        let fault = computer.run_with_inputs([5]).unwrap_err();
        assert_eq!(
            fault,
            Fault::ImmediateTarget {
                instruction: 10_001,
                parameter: 3
            }
        );
    }

    #[test]
    fn jump_out_of_bounds_test() {
        // Store 1 in cell 0, then jump to 1000
        let program = vec![1101, 0, 1, 0, 1105, 1, 1000, 1101, 5, 5, 0, 99];
        let mut computer = Computer::new(program.clone());
        let fault = computer.run_with_inputs([]).unwrap_err();
        assert_eq!(
            fault,
            Fault::InvalidMemoryAccess(MemoryError::OutOfBounds {
                address: 1000,
                size: 12
            })
        );
        assert_eq!(fault.kind(), FaultKind::Bounds);
        assert_eq!(computer.pc, 4);

        let mut expected = program;
        expected[0] = 1;
        assert_eq!(computer.memory.as_slice(), expected.as_slice());
    }

    #[test]
    fn lenient_termination_test() {
        let config = Config {
            termination: Termination::Lenient,
            ..Config::default()
        };

        // Runs off the end of the memory without halting
        let mut computer = Computer::with_config(vec![1101, 2, 3, 0, 104, 9], config);
        assert_eq!(computer.run_with_inputs([]), Ok((Exit::Halted(Some(9)), vec![9])));
        assert_eq!(computer.memory.get(0), Ok(5));

        // Jumps away
        let mut computer = Computer::with_config(vec![1105, 1, -4, 99], config);
        assert_eq!(computer.run_with_inputs([]), Ok((Exit::Halted(None), vec![])));

        // The strict policy faults in both cases
        let mut computer = Computer::new(vec![1101, 2, 3, 0, 104, 9]);
        assert_eq!(
            computer.run_with_inputs([]).unwrap_err().kind(),
            FaultKind::Bounds
        );
        let mut computer = Computer::new(vec![1105, 1, -4, 99]);
        assert_eq!(
            computer.run_with_inputs([]),
            Err(Fault::InvalidMemoryAccess(MemoryError::Negative(-4)))
        );
    }

    #[test]
    fn lenient_still_faults_on_operands_test() {
        let config = Config {
            termination: Termination::Lenient,
            ..Config::default()
        };
        let mut computer = Computer::with_config(vec![1, 0, 100, 0, 99], config);
        assert_eq!(
            computer.run_with_inputs([]).unwrap_err().kind(),
            FaultKind::Bounds
        );
    }

    #[test]
    fn overflow_test() {
        let program = vec![1102, Word::MAX, 2, 0, 99];

        let mut computer = Computer::new(program.clone());
        computer.run_with_inputs([]).unwrap();
        assert_eq!(computer.memory.get(0), Ok(-2));

        let mut computer = Computer::new(vec![1101, Word::MAX, 1, 0, 99]);
        computer.run_with_inputs([]).unwrap();
        assert_eq!(computer.memory.get(0), Ok(Word::MIN));

        let config = Config {
            overflow: Overflow::Fault,
            ..Config::default()
        };
        let mut computer = Computer::with_config(program, config);
        assert_eq!(computer.run_with_inputs([]), Err(Fault::Overflow));
        assert_eq!(computer.memory.get(0), Ok(1102));

        let mut computer = Computer::with_config(vec![1101, 40, 2, 0, 99], config);
        computer.run_with_inputs([]).unwrap();
        assert_eq!(computer.memory.get(0), Ok(42));
    }

    #[test]
    fn step_limit_test() {
        let config = Config {
            max_steps: Some(10),
            ..Config::default()
        };
        // Infinite loop
        let mut computer = Computer::with_config(vec![1105, 1, 0], config);
        assert_eq!(computer.run_with_inputs([]), Err(Fault::StepLimit(10)));
        assert_eq!(computer.steps, 10);
    }

    #[test]
    fn policy_parse_test() {
        assert_eq!(
            "lenient".parse::<Termination>().unwrap(),
            Termination::Lenient
        );
        assert_eq!("fault".parse::<Overflow>().unwrap(), Overflow::Fault);
        assert_eq!(Termination::Strict.to_string(), "strict");
        assert!("sometimes".parse::<Overflow>().is_err());
    }
}
