use anyhow::bail;
use clap::Parser;
use intcode_emulator::constants::Word;
use intcode_emulator::runtime::{Channel, Computer, Exit};
use tracing::info;

use super::{MachineOpt, ProgramOpt};

#[derive(Parser, Debug)]
pub struct RunOpt {
    #[command(flatten)]
    program: ProgramOpt,

    #[command(flatten)]
    machine: MachineOpt,

    /// Value read by an INPUT instruction. Can be used multiple times.
    #[arg(
        short,
        long = "input",
        value_name = "VALUE",
        allow_negative_numbers = true
    )]
    inputs: Vec<Word>,

    /// Print the memory once the program halted
    #[arg(long)]
    dump: bool,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let memory = self.program.load()?;
        let mut computer = Computer::with_config(memory, self.machine.config());

        let input: Channel = self.inputs.iter().copied().collect();
        let output = Channel::new();

        info!("Running program");
        let res = computer.run(&input, &output);

        // Outputs are printed even if the machine faulted afterwards
        for value in output.drain() {
            println!("{value}");
        }

        match res? {
            Exit::Halted(_) => {
                info!(steps = computer.steps, pc = computer.pc, "End of program");
            }
            Exit::Suspended(pc) => bail!("the program is waiting for more input at address {pc}"),
        }

        if self.dump {
            let cells: Vec<String> = computer
                .memory
                .as_slice()
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("{}", cells.join(","));
        }

        Ok(())
    }
}
