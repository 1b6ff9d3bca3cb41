use clap::Parser;
use intcode_emulator::disassembler::listing;
use tracing::debug;

use super::ProgramOpt;

#[derive(Parser, Debug)]
pub struct PrintOpt {
    #[command(flatten)]
    program: ProgramOpt,
}

impl PrintOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let memory = self.program.load()?;

        debug!("Disassembling program");
        println!("{}", listing(&memory));

        Ok(())
    }
}
