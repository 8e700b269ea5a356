//! Observation input for the CLI.
//!
//! Symbols are non-negative integers separated by whitespace. A blank line
//! ends the current sequence.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("line {line}: '{token}' is not a symbol index")]
    BadToken { line: usize, token: String },
}

/// Parse one input line into symbol indices.
///
/// `line_no` is 1-based and only used for error reporting. A line holding
/// nothing but whitespace yields an empty vector (a sequence boundary).
pub fn parse_symbols(line: &str, line_no: usize) -> Result<Vec<usize>, InputError> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<usize>().map_err(|_| InputError::BadToken {
                line: line_no,
                token: token.to_string(),
            })
        })
        .collect()
}
