//! Program parsing logic
//!
//! A program is a list of decimal integers separated by a delimiter, usually a comma. Each cell is
//! parsed with `nom`; whitespace around a cell is ignored.

use miette::{Diagnostic, SourceSpan};
use nom::{
    character::complete::{digit1, multispace0, one_of},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::{delimited, pair},
    Finish, IResult, Offset,
};
use thiserror::Error;

use crate::constants::{Word, DEFAULT_DELIMITER};
use crate::runtime::Memory;

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("the program is empty")]
    #[diagnostic(code(intcode::parse::empty))]
    Empty,

    #[error("invalid cell {token:?} (cells are separated by {delimiter:?})")]
    #[diagnostic(
        code(intcode::parse::invalid_cell),
        help("cells must be 32-bit signed integers")
    )]
    InvalidCell {
        token: String,
        delimiter: char,

        #[label("not an integer")]
        span: SourceSpan,
    },
}

/// Parse a signed decimal word
fn parse_word(input: &str) -> IResult<&str, Word> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), str::parse::<Word>)(input)
}

/// Parse a single cell, with the whitespace around it
fn parse_cell(input: &str) -> IResult<&str, Word> {
    delimited(multispace0, parse_word, multispace0)(input)
}

/// Parse a program using a custom delimiter
///
/// # Errors
///
/// This function will return an error on the first cell which is not a valid word, or if the
/// program has no cell at all.
#[tracing::instrument(skip(input), fields(len = input.len()))]
pub fn parse_with_delimiter(input: &str, delimiter: char) -> Result<Memory, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    input
        .trim_end()
        .split(delimiter)
        .map(|token| {
            all_consuming(parse_cell)(token)
                .finish()
                .map(|(_, word)| word)
                .map_err(|_| {
                    let trimmed = token.trim();
                    let start = input.offset(token) + token.offset(trimmed);
                    ParseError::InvalidCell {
                        token: trimmed.to_owned(),
                        delimiter,
                        span: (start, trimmed.len()).into(),
                    }
                })
        })
        .collect()
}

/// Parse a comma-separated program
///
/// # Errors
///
/// This function will return an error if the program is invalid
pub fn parse(input: &str) -> Result<Memory, ParseError> {
    parse_with_delimiter(input, DEFAULT_DELIMITER)
}
