//! Error types for the type model.

use smol_str::SmolStr;
use thiserror::Error;

/// Result type for type model operations
pub type TypeResult<T> = Result<T, TypeError>;

/// Result type for constant-expression evaluation
pub type EvalResult<T> = Result<T, EvalError>;

fn join_chain(chain: &[SmolStr]) -> String {
    chain.iter().map(SmolStr::as_str).collect::<Vec<_>>().join(" -> ")
}

fn via(chain: &[SmolStr]) -> String {
    if chain.is_empty() {
        String::new()
    } else {
        format!(" (via {})", join_chain(chain))
    }
}

/// Type model errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    /// A typedef name has no registered definition
    #[error("unresolved type '{name}'{}", via(.chain))]
    Unresolved {
        name: SmolStr,
        /// Names traversed before the lookup failed
        chain: Vec<SmolStr>,
    },

    /// A typedef chain refers back to itself
    #[error("recursive type definition: {}", join_chain(.chain))]
    Recursive {
        /// Full chain traversed, ending with the repeated name
        chain: Vec<SmolStr>,
    },

    /// Struct packing must be a power of two
    #[error("invalid packing value {0}: must be a power of two")]
    InvalidPack(u32),

    /// A type must carry one qualifier set per modifier plus the base
    #[error("{qualifiers} qualifier level(s) for {declarators} modifier(s)")]
    QualifierLevels { qualifiers: usize, declarators: usize },

    /// The outermost modifier was expected to be a parameter list
    #[error("'{0}' is not a function type")]
    NotAFunction(String),
}

impl TypeError {
    pub fn unresolved(name: impl Into<SmolStr>, chain: Vec<SmolStr>) -> Self {
        Self::Unresolved {
            name: name.into(),
            chain,
        }
    }
}

/// Constant-expression evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(SmolStr),

    #[error("unsupported construct in constant expression: {0}")]
    Unsupported(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("operator '{op}' cannot be applied to {operand}")]
    TypeMismatch { op: &'static str, operand: String },

    #[error("malformed literal '{0}'")]
    MalformedLiteral(String),

    #[error("unexpected {found} at token {position}")]
    Unexpected { found: String, position: usize },
}

/// Function-macro substitution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    #[error("macro expects {expected} argument(s), got {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("placeholder {index} out of range for {available} argument(s)")]
    PlaceholderOutOfRange { index: usize, available: usize },

    #[error("missing argument list")]
    MissingArguments,

    #[error("unbalanced argument list")]
    UnbalancedArguments,
}
