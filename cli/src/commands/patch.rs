use anyhow::bail;
use clap::Parser;
use intcode_emulator::constants::Word;
use intcode_emulator::runtime::Config;
use intcode_emulator::search::{Patch, PatchSearch};
use tracing::info;

use super::ProgramOpt;

#[derive(Parser, Debug)]
pub struct PatchOpt {
    #[command(flatten)]
    program: ProgramOpt,

    /// Value the program should leave in its first cell
    #[arg(
        short,
        long,
        allow_negative_numbers = true,
        required_unless_present = "noun"
    )]
    target: Option<Word>,

    /// Only run the program patched with this noun
    #[arg(long, requires = "verb", conflicts_with = "target")]
    noun: Option<Word>,

    /// Only run the program patched with this verb
    #[arg(long, requires = "noun")]
    verb: Option<Word>,

    /// Fault instead of halting when the program counter leaves the memory
    #[arg(long)]
    strict: bool,
}

impl PatchOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let program = self.program.load()?;

        let mut search = PatchSearch::default();
        if self.strict {
            search.config = Config::default();
        }

        if let (Some(noun), Some(verb)) = (self.noun, self.verb) {
            let output = search.output(&program, Patch { noun, verb })?;
            println!("{output}");
            return Ok(());
        }

        let Some(target) = self.target else {
            bail!("either a target or a noun and a verb are needed");
        };

        let Some(patch) = search.find(&program, target) else {
            bail!("no noun and verb give {target}");
        };

        info!(noun = patch.noun, verb = patch.verb, "Found a patch");
        println!("{}", patch.answer());

        Ok(())
    }
}
