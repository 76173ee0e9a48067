//! Grammar errors.
//!
//! [`ParseError`] is a grammar mismatch. Productions return it to
//! backtrack, and the top-level loop turns it into an unparsed region.
//! [`DefinitionError`] is a declaration that matched the grammar but
//! cannot be reduced to the type model; the declaration is skipped.

use cheader_types::{EvalError, TypeError};
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found '{found}'")]
    Unexpected {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("unexpected '{found}' after type")]
    TrailingInput { found: String },
}

/// Result type for grammar productions
pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("line {line}: enum member '{member}' has no integer value: {source}")]
    EnumValue {
        line: usize,
        member: SmolStr,
        source: EvalError,
    },

    #[error("line {line}: bit width of '{field}' is not an integer constant")]
    BitWidth { line: usize, field: String },

    #[error("line {line}: {keyword} '{name}': {source}")]
    Aggregate {
        line: usize,
        keyword: &'static str,
        name: SmolStr,
        source: TypeError,
    },

    #[error("line {line}: function '{name}': {source}")]
    Function {
        line: usize,
        name: SmolStr,
        source: TypeError,
    },

    #[error("line {line}: {construct} declarator has no name")]
    Unnamed { line: usize, construct: &'static str },
}

impl DefinitionError {
    pub fn line(&self) -> usize {
        match self {
            Self::EnumValue { line, .. }
            | Self::BitWidth { line, .. }
            | Self::Aggregate { line, .. }
            | Self::Function { line, .. }
            | Self::Unnamed { line, .. } => *line,
        }
    }
}
