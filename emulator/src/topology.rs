//! Wire several machines together
//!
//! Every machine runs its own copy of the same program. Machine `i` reads from channel `i` and
//! writes to the channel read by the next machine. In a [`Shape::Pipeline`] the last machine
//! writes to an extra sink channel; in a [`Shape::Ring`] it writes back to the first machine.

use parse_display::Display;
use thiserror::Error;
use tracing::debug;

use crate::constants::Word;
use crate::runtime::{Channel, Computer, Config, Exit, Fault, Memory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "lowercase")]
pub enum Shape {
    /// The outputs of the last machine go to a sink
    Pipeline,

    /// The outputs of the last machine go back to the first one
    Ring,
}

impl Shape {
    /// Number of channels needed to link `machines` machines
    const fn channels(self, machines: usize) -> usize {
        match self {
            Self::Pipeline => machines + 1,
            Self::Ring => machines,
        }
    }

    /// Index of the channel the machine at `index` writes to
    const fn output_of(self, index: usize, machines: usize) -> usize {
        match self {
            Self::Pipeline => index + 1,
            Self::Ring => (index + 1) % machines,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("a topology needs at least one machine")]
    NoMachine,

    #[error("machine {machine} faulted: {fault}")]
    Fault {
        machine: usize,

        #[source]
        fault: Fault,
    },

    #[error("every running machine is waiting for input")]
    Deadlock,

    #[error("the last machine halted without any output")]
    NoOutput,
}

#[derive(Debug)]
pub struct Topology {
    shape: Shape,
    machines: Vec<Computer>,
    channels: Vec<Channel>,
}

impl Topology {
    /// Build a topology with one machine per setting.
    ///
    /// The channel of each machine is seeded with its setting, and the channel of the first machine
    /// also gets the initial signal right after it.
    ///
    /// # Errors
    ///
    /// Fails if there is no setting.
    pub fn new(
        shape: Shape,
        program: &Memory,
        settings: &[Word],
        signal: Word,
        config: Config,
    ) -> Result<Self, TopologyError> {
        if settings.is_empty() {
            return Err(TopologyError::NoMachine);
        }

        let machines = settings
            .iter()
            .map(|_| Computer::with_config(program.clone(), config))
            .collect();

        let channels: Vec<Channel> = (0..shape.channels(settings.len()))
            .map(|_| Channel::new())
            .collect();
        for (channel, setting) in channels.iter().zip(settings) {
            channel.push(*setting);
        }
        channels[0].push(signal);

        Ok(Self {
            shape,
            machines,
            channels,
        })
    }

    /// Build a chain of machines, the last one writing to a sink
    ///
    /// # Errors
    ///
    /// Fails if there is no setting.
    pub fn pipeline(
        program: &Memory,
        settings: &[Word],
        signal: Word,
        config: Config,
    ) -> Result<Self, TopologyError> {
        Self::new(Shape::Pipeline, program, settings, signal, config)
    }

    /// Build a loop of machines, the last one feeding the first one
    ///
    /// # Errors
    ///
    /// Fails if there is no setting.
    pub fn ring(
        program: &Memory,
        settings: &[Word],
        signal: Word,
        config: Config,
    ) -> Result<Self, TopologyError> {
        Self::new(Shape::Ring, program, settings, signal, config)
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[must_use]
    pub fn machines(&self) -> &[Computer] {
        &self.machines
    }

    /// The channel the last machine writes to
    #[must_use]
    pub fn sink(&self) -> &Channel {
        let last = self.machines.len() - 1;
        &self.channels[self.shape.output_of(last, self.machines.len())]
    }

    /// Resume every machine in order, over and over, until they all halted.
    ///
    /// Returns the last value output by the last machine.
    ///
    /// # Errors
    ///
    /// Fails as soon as a machine faults, if no machine can make progress, or if the last machine
    /// never output anything.
    #[tracing::instrument(skip(self), fields(shape = %self.shape, machines = self.machines.len()), level = "debug")]
    pub fn run(&mut self) -> Result<Word, TopologyError> {
        let count = self.machines.len();

        for round in 1.. {
            let mut halted = true;
            let mut progressed = false;

            for (index, machine) in self.machines.iter_mut().enumerate() {
                if machine.is_halted() {
                    continue;
                }

                let input = &self.channels[index];
                let output = &self.channels[self.shape.output_of(index, count)];

                let steps = machine.steps;
                let exit = machine
                    .run(input, output)
                    .map_err(|fault| TopologyError::Fault {
                        machine: index,
                        fault,
                    })?;
                progressed |= machine.steps != steps;

                if let Exit::Suspended(_) = exit {
                    halted = false;
                }
            }

            debug!(round, halted, "End of round");

            if halted {
                break;
            }

            if !progressed {
                return Err(TopologyError::Deadlock);
            }
        }

        let result = self
            .machines
            .last()
            .and_then(Computer::last_output)
            .ok_or(TopologyError::NoOutput)?;
        debug!(result, "All machines halted");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parse;
    use crate::runtime::MemoryError;

    #[test]
    fn pipeline_test() {
        let program =
            parse("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0").unwrap();
        let mut topology =
            Topology::pipeline(&program, &[4, 3, 2, 1, 0], 0, Config::default()).unwrap();
        assert_eq!(topology.run(), Ok(43210));
        assert_eq!(topology.sink().drain(), vec![43210]);
        assert!(topology.machines().iter().all(Computer::is_halted));
    }

    #[test]
    fn ring_test() {
        let program = parse(
            "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,\
             27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5",
        )
        .unwrap();
        let mut topology =
            Topology::ring(&program, &[9, 8, 7, 6, 5], 0, Config::default()).unwrap();
        assert_eq!(topology.run(), Ok(139_629_729));
    }

    #[test]
    fn single_machine_ring_test() {
        // Reads its setting and the signal, outputs their sum and halts
        let program = parse("3,11,3,12,1,11,12,13,4,13,99,0,0,0").unwrap();
        let mut topology = Topology::ring(&program, &[5], 10, Config::default()).unwrap();
        assert_eq!(topology.run(), Ok(15));
    }

    #[test]
    fn fault_test() {
        // Forwards the signal, then writes to the address given by the setting
        let program = parse("3,15,3,16,4,16,1001,15,0,13,1101,0,0,0,99,0,0").unwrap();

        let mut topology = Topology::pipeline(&program, &[0, 5], 0, Config::default()).unwrap();
        assert_eq!(topology.run(), Ok(0));

        let mut topology =
            Topology::pipeline(&program, &[0, 1000], 0, Config::default()).unwrap();
        assert_eq!(
            topology.run(),
            Err(TopologyError::Fault {
                machine: 1,
                fault: Fault::InvalidMemoryAccess(MemoryError::OutOfBounds {
                    address: 1000,
                    size: 17
                }),
            })
        );
        assert!(topology.machines()[0].is_halted());

        // An invalid opcode right after the first input
        let program = parse("3,0,42").unwrap();
        let mut topology = Topology::ring(&program, &[0, 1], 0, Config::default()).unwrap();
        assert!(matches!(
            topology.run(),
            Err(TopologyError::Fault { machine: 0, .. })
        ));
    }

    #[test]
    fn deadlock_test() {
        // Every machine wants two more values than it is given
        let program = parse("3,0,3,0,3,0,99").unwrap();
        let mut topology = Topology::ring(&program, &[1, 2], 0, Config::default()).unwrap();
        assert_eq!(topology.run(), Err(TopologyError::Deadlock));
    }

    #[test]
    fn no_output_test() {
        let program = parse("3,0,99").unwrap();
        let mut topology = Topology::pipeline(&program, &[1], 0, Config::default()).unwrap();
        assert_eq!(topology.run(), Err(TopologyError::NoOutput));
    }

    #[test]
    fn empty_test() {
        let program = parse("99").unwrap();
        assert_eq!(
            Topology::ring(&program, &[], 0, Config::default()).unwrap_err(),
            TopologyError::NoMachine
        );
    }

    #[test]
    fn deterministic_test() {
        let program = parse(
            "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,1001,54,\
             -5,54,1105,1,12,1,53,54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,\
             53,1001,56,-1,56,1005,56,6,99,0,0,0,0,10",
        )
        .unwrap();
        let results: Vec<_> = (0..3)
            .map(|_| {
                Topology::ring(&program, &[9, 7, 8, 5, 6], 0, Config::default())
                    .unwrap()
                    .run()
            })
            .collect();
        assert_eq!(results, vec![Ok(18216), Ok(18216), Ok(18216)]);
    }
}
