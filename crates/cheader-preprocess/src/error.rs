//! Preprocessor diagnostics.
//!
//! None of these abort preprocessing. They are collected in
//! [`PreprocessOutput::diagnostics`](crate::PreprocessOutput) and logged.

use cheader_types::{EvalError, MacroError};
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessError {
    #[error("line {line}: call to macro '{name}' left unexpanded: {source}")]
    MacroExpansion {
        line: usize,
        name: SmolStr,
        source: MacroError,
    },

    #[error("line {line}: condition '{expr}' treated as false: {source}")]
    ConditionEval {
        line: usize,
        expr: String,
        source: EvalError,
    },

    #[error("line {line}: #{directive} without matching #if")]
    UnbalancedConditional { line: usize, directive: SmolStr },

    #[error("{count} conditional block(s) still open at end of file")]
    UnterminatedConditional { count: usize },

    #[error("line {line}: #pragma pack(pop) with nothing to pop")]
    PackUnderflow { line: usize },

    #[error("line {line}: ignoring packing value '{value}'")]
    InvalidPack { line: usize, value: String },

    #[error("line {line}: malformed #{directive} '{text}'")]
    MalformedDirective {
        line: usize,
        directive: SmolStr,
        text: String,
    },

    #[error("line {line}: macro expansion limit reached")]
    ExpansionLimit { line: usize },
}

impl PreprocessError {
    pub fn malformed(line: usize, directive: &str, text: &str) -> Self {
        Self::MalformedDirective {
            line,
            directive: SmolStr::new(directive),
            text: text.trim().to_string(),
        }
    }
}
