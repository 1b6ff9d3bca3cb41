use anyhow::bail;
use clap::Parser;
use intcode_emulator::constants::{Word, INITIAL_SIGNAL};
use intcode_emulator::search::{AmplifierSearch, Outcome};
use tracing::info;

use super::{MachineOpt, ProgramOpt};

fn format_settings(settings: &[Word]) -> String {
    settings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Parser, Debug)]
pub struct AmplifyOpt {
    #[command(flatten)]
    program: ProgramOpt,

    #[command(flatten)]
    machine: MachineOpt,

    /// Wire the amplifiers in a feedback loop instead of a chain
    #[arg(short, long)]
    feedback: bool,

    /// Lowest phase setting. Defaults to 0, or 5 in a feedback loop
    #[arg(long, requires = "last_phase", allow_negative_numbers = true)]
    first_phase: Option<Word>,

    /// Highest phase setting. Defaults to 4, or 9 in a feedback loop
    #[arg(long, requires = "first_phase", allow_negative_numbers = true)]
    last_phase: Option<Word>,

    /// Signal sent to the first amplifier
    #[arg(long, default_value_t = INITIAL_SIGNAL, allow_negative_numbers = true)]
    signal: Word,

    /// Print the result of every permutation
    #[arg(short, long)]
    all: bool,
}

impl AmplifyOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let program = self.program.load()?;

        let mut search = if self.feedback {
            AmplifierSearch::feedback()
        } else {
            AmplifierSearch::serial()
        };
        if let (Some(first), Some(last)) = (self.first_phase, self.last_phase) {
            search.phases = first..=last;
        }
        search.signal = self.signal;
        search.config = self.machine.config();

        info!(shape = %search.shape, phases = ?search.phases, "Searching phase settings");

        if self.all {
            for Outcome { settings, result } in search.outcomes(&program) {
                match result {
                    Ok(signal) => println!("{}: {signal}", format_settings(&settings)),
                    Err(e) => println!("{}: no result ({e})", format_settings(&settings)),
                }
            }
        }

        let report = search.run(&program);
        let Some(best) = report.best else {
            bail!(
                "none of the {} permutations gave a result",
                report.evaluated
            );
        };

        info!(
            evaluated = report.evaluated,
            failed = report.failed,
            "Best phase settings: {}",
            format_settings(&best.settings)
        );
        println!("{}", best.signal);

        Ok(())
    }
}
