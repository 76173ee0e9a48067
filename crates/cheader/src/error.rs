//! Session errors.
//!
//! Only caller mistakes surface here. Problems inside the headers
//! themselves are collected in each file's [`FileReport`](crate::FileReport).

use cheader_parser::ParseError;
use cheader_registry::RegistryError;
use cheader_types::TypeError;
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no content was supplied for header '{0}'")]
    MissingHeader(SmolStr),

    #[error("invalid replacement pattern '{pattern}': {source}")]
    InvalidReplacement {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("session headers were already processed")]
    AlreadyProcessed,

    #[error("cache blob: {0}")]
    Cache(#[from] serde_json::Error),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
