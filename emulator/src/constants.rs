use std::ops::RangeInclusive;

/// Width of a memory cell and of every value flowing through a machine
pub type Word = i32;

/// Index of a memory cell
pub type Address = usize;

/// Default separator between cells in a program listing
pub const DEFAULT_DELIMITER: char = ',';

/// Number of amplifiers in the standard circuits
pub const AMPLIFIER_COUNT: usize = 5;

/// Phase settings of the serial amplifier chain
pub const SERIAL_PHASES: RangeInclusive<Word> = 0..=4;

/// Phase settings of the feedback amplifier loop
pub const FEEDBACK_PHASES: RangeInclusive<Word> = 5..=9;

/// Signal fed to the first amplifier after its phase setting
pub const INITIAL_SIGNAL: Word = 0;

/// Address patched with the noun
pub const NOUN_ADDRESS: Address = 1;

/// Address patched with the verb
pub const VERB_ADDRESS: Address = 2;

/// Values tried for both the noun and the verb
pub const PATCH_VALUES: RangeInclusive<Word> = 0..=99;

/// Address holding the result of a patched program
pub const RESULT_ADDRESS: Address = 0;
