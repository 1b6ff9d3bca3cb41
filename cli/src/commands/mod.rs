use std::process::exit;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Args, ValueHint};
use intcode_emulator::constants::DEFAULT_DELIMITER;
use intcode_emulator::parse_with_delimiter;
use intcode_emulator::runtime::{Config, Memory, Overflow, Termination};
use tracing::{debug, info};

mod amplify;
mod completion;
mod patch;
mod print;
mod run;

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Run a program on a single machine
    Run(self::run::RunOpt),

    /// Find the phase settings sending the highest signal to the thrusters
    Amplify(self::amplify::AmplifyOpt),

    /// Find the noun and verb making a program produce a given value
    Patch(self::patch::PatchOpt),

    /// Print the disassembled program
    Print(self::print::PrintOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Self::Run(opt) => opt.exec(),
            Self::Amplify(opt) => opt.exec(),
            Self::Patch(opt) => opt.exec(),
            Self::Print(opt) => opt.exec(),
            Self::Completion(opt) => opt.exec(),
        }
    }
}

/// Where to read a program from
#[derive(Args, Debug)]
pub struct ProgramOpt {
    /// Input file, "-" for the standard input
    #[arg(value_parser, value_hint = ValueHint::FilePath, default_value = "-")]
    input: Utf8PathBuf,

    /// Separator between the cells of the program
    #[arg(short, long, default_value_t = DEFAULT_DELIMITER)]
    delimiter: char,
}

impl ProgramOpt {
    /// Read and parse the program. Parse errors are reported against the source, and end the
    /// process.
    pub fn load(&self) -> anyhow::Result<Memory> {
        info!(path = %self.input, "Reading program");
        let source = if self.input.as_str() == "-" {
            std::io::read_to_string(std::io::stdin()).context("could not read the standard input")?
        } else {
            std::fs::read_to_string(&self.input)
                .with_context(|| format!("could not read {}", self.input))?
        };

        debug!("Parsing program");
        match parse_with_delimiter(&source, self.delimiter) {
            Ok(memory) => {
                debug!(cells = memory.len(), "Program parsed");
                Ok(memory)
            }
            Err(e) => {
                let source = miette::NamedSource::new(self.input.as_str(), source);
                let report = miette::Report::new(e).with_source_code(source);
                eprintln!("{report:?}");
                exit(1);
            }
        }
    }
}

/// Execution policies of the machines
#[derive(Args, Debug)]
pub struct MachineOpt {
    /// Halt instead of faulting when the program counter leaves the memory
    #[arg(long)]
    lenient: bool,

    /// What to do when an addition or a multiplication overflows
    #[arg(long, value_name = "POLICY", default_value_t = Overflow::Wrap)]
    overflow: Overflow,

    /// Fault after this many instructions
    #[arg(long, value_name = "STEPS")]
    max_steps: Option<u64>,
}

impl MachineOpt {
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            termination: if self.lenient {
                Termination::Lenient
            } else {
                Termination::Strict
            },
            overflow: self.overflow,
            max_steps: self.max_steps,
        }
    }
}
