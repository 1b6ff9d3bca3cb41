//! Exhaustive searches over the configuration of machines

use std::ops::RangeInclusive;

use tracing::{debug, info};

use crate::constants::{
    Word, FEEDBACK_PHASES, INITIAL_SIGNAL, NOUN_ADDRESS, PATCH_VALUES, RESULT_ADDRESS,
    SERIAL_PHASES, VERB_ADDRESS,
};
use crate::runtime::{Computer, Config, Fault, Memory, Termination};
use crate::topology::{Shape, Topology, TopologyError};

/// Lazily enumerates the permutations of a set, in lexicographic order of positions.
///
/// The sequence is finite and can be restarted with [`Permutations::restart`].
#[derive(Debug, Clone)]
pub struct Permutations<T> {
    items: Vec<T>,
    indices: Vec<usize>,
    done: bool,
}

#[must_use]
pub fn permutations<T: Clone>(items: impl IntoIterator<Item = T>) -> Permutations<T> {
    let items: Vec<T> = items.into_iter().collect();
    let indices = (0..items.len()).collect();
    Permutations {
        items,
        indices,
        done: false,
    }
}

impl<T> Permutations<T> {
    /// Start over from the first permutation
    pub fn restart(&mut self) {
        for (position, index) in self.indices.iter_mut().enumerate() {
            *index = position;
        }
        self.done = false;
    }
}

/// Rearrange the indices into the next permutation in lexicographic order.
///
/// Returns `false` if they already were the last one.
fn next_permutation(indices: &mut [usize]) -> bool {
    // Find the rightmost ascent
    let Some(pivot) = indices.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };

    // The suffix after the pivot is decreasing: swap the pivot with the smallest larger element
    let suffix = &indices[pivot + 1..];
    let successor = pivot + 1 + suffix.iter().rposition(|&i| i > indices[pivot]).unwrap_or(0);
    indices.swap(pivot, successor);
    indices[pivot + 1..].reverse();
    true
}

impl<T: Clone> Iterator for Permutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self.indices.iter().map(|&i| self.items[i].clone()).collect();
        self.done = !next_permutation(&mut self.indices);
        Some(current)
    }
}

/// Result of a topology run for one permutation of settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub settings: Vec<Word>,
    pub result: Result<Word, TopologyError>,
}

/// Best signal found, and the settings which produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Best {
    pub signal: Word,
    pub settings: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub best: Option<Best>,

    /// Number of permutations tried
    pub evaluated: usize,

    /// Number of permutations which did not give any result
    pub failed: usize,
}

/// Tries every permutation of a range of phase settings on a chain or a loop of amplifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmplifierSearch {
    pub shape: Shape,
    pub phases: RangeInclusive<Word>,
    pub signal: Word,
    pub config: Config,
}

impl AmplifierSearch {
    /// Amplifiers in series, with phases 0 to 4
    #[must_use]
    pub fn serial() -> Self {
        Self {
            shape: Shape::Pipeline,
            phases: SERIAL_PHASES,
            signal: INITIAL_SIGNAL,
            config: Config::default(),
        }
    }

    /// Amplifiers in a feedback loop, with phases 5 to 9
    #[must_use]
    pub fn feedback() -> Self {
        Self {
            shape: Shape::Ring,
            phases: FEEDBACK_PHASES,
            signal: INITIAL_SIGNAL,
            config: Config::default(),
        }
    }

    /// Run a single permutation of settings on a fresh set of machines
    ///
    /// # Errors
    ///
    /// Fails if the topology does not produce a result.
    pub fn evaluate(&self, program: &Memory, settings: &[Word]) -> Result<Word, TopologyError> {
        Topology::new(self.shape, program, settings, self.signal, self.config)?.run()
    }

    /// Lazily evaluate every permutation
    pub fn outcomes<'a>(&'a self, program: &'a Memory) -> impl Iterator<Item = Outcome> + 'a {
        permutations(self.phases.clone()).map(move |settings| {
            let result = self.evaluate(program, &settings);
            Outcome { settings, result }
        })
    }

    /// Evaluate every permutation and keep the highest signal
    #[tracing::instrument(skip(program), fields(cells = program.len()))]
    pub fn run(&self, program: &Memory) -> Report {
        let mut report = Report::default();

        for Outcome { settings, result } in self.outcomes(program) {
            report.evaluated += 1;
            match result {
                Ok(signal) => {
                    debug!(?settings, signal, "Permutation evaluated");
                    if report.best.as_ref().is_none_or(|best| signal > best.signal) {
                        report.best = Some(Best { signal, settings });
                    }
                }
                Err(error) => {
                    debug!(?settings, %error, "Permutation gave no result");
                    report.failed += 1;
                }
            }
        }

        info!(
            evaluated = report.evaluated,
            failed = report.failed,
            best = ?report.best,
            "Search done"
        );
        report
    }
}

impl Default for AmplifierSearch {
    fn default() -> Self {
        Self::serial()
    }
}

/// Values written at the noun and verb addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    pub noun: Word,
    pub verb: Word,
}

impl Patch {
    /// The `100 * noun + verb` combination
    #[must_use]
    pub const fn answer(self) -> Word {
        100 * self.noun + self.verb
    }
}

/// Looks for the noun and verb making a program leave a given value in its first cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSearch {
    pub values: RangeInclusive<Word>,
    pub config: Config,
}

impl Default for PatchSearch {
    fn default() -> Self {
        Self {
            values: PATCH_VALUES,
            config: Config {
                termination: Termination::Lenient,
                ..Config::default()
            },
        }
    }
}

impl PatchSearch {
    /// Patch the program, run it and read its first cell
    ///
    /// # Errors
    ///
    /// Fails if the program is too short to be patched, or if it faults.
    pub fn output(&self, program: &Memory, patch: Patch) -> Result<Word, Fault> {
        let mut computer = Computer::with_config(program.clone(), self.config);
        *computer.memory.get_mut(NOUN_ADDRESS)? = patch.noun;
        *computer.memory.get_mut(VERB_ADDRESS)? = patch.verb;
        computer.run_with_inputs([])?;
        Ok(computer.memory.get(RESULT_ADDRESS)?)
    }

    /// Find the first patch, noun first, giving the target
    #[tracing::instrument(skip(self, program), fields(cells = program.len()))]
    pub fn find(&self, program: &Memory, target: Word) -> Option<Patch> {
        let patches = self.values.clone().flat_map(|noun| {
            self.values
                .clone()
                .map(move |verb| Patch { noun, verb })
        });

        for patch in patches {
            match self.output(program, patch) {
                Ok(output) if output == target => {
                    info!(?patch, "Found patch");
                    return Some(patch);
                }
                Ok(_) => {}
                Err(fault) => debug!(?patch, %fault, "Patched program faulted"),
            }
        }

        info!("Search space exhausted");
        None
    }
}
