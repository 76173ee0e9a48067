//! cheader: C header extraction without a compiler
//!
//! Reads C/C++ headers and builds a [`Registry`] of their public
//! interface: macros and their values, typedefs, variables, function
//! prototypes, structs, unions and enums. Binding generators consume the
//! registry; this crate never emits target-language code.
//!
//! ## Pipeline
//!
//! Each header goes through, in order:
//!
//! 1. replacement rules (regular expressions over the raw text)
//! 2. comment stripping and line joining ([`cheader_preprocess::normalize`])
//! 3. directive execution and macro expansion ([`cheader_preprocess`])
//! 4. the declarator grammar ([`Grammar`]), which fills the registry
//!
//! Headers are processed in the order they were added, so later headers
//! see the macros and types of earlier ones.
//!
//! ## Example
//!
//! ```
//! use cheader::SessionBuilder;
//! use cheader::types::{Type, Value};
//!
//! let header = "
//! #define M 1
//! #define N M+1
//! typedef int count_t;
//! count_t x = N;
//! ";
//! let mut session = SessionBuilder::new().header("demo.h", header).build().unwrap();
//! session.process_all().unwrap();
//!
//! let registry = session.registry();
//! assert_eq!(registry.values()["N"], Value::Int(2));
//! assert_eq!(registry.variables()["x"].value, Some(Value::Int(2)));
//! assert_eq!(session.resolve_type("count_t *").unwrap(), Type::new("int").pointer());
//! ```
//!
//! ## Caching
//!
//! [`HeaderSession::to_cache`] serializes the registry with the options
//! that produced it. [`HeaderSession::process_all_cached`] restores such a
//! blob instead of parsing when the options match and no header changed
//! since it was written.

mod cache;
mod error;
mod options;
mod session;

pub use cache::{CacheBlob, CACHE_VERSION};
pub use error::{SessionError, SessionResult};
pub use options::{Replacement, SessionOptions};
pub use session::{FileReport, HeaderSession, SessionBuilder, TextMatch};

pub use cheader_parser::{DefinitionError, Grammar, GrammarBuilder, GrammarConfig, ParseReport, Unparsed};
pub use cheader_preprocess::PreprocessError;
pub use cheader_registry::{Category, Definition, Definitions, FunctionDecl, Registry, Variable};

/// The type model: [`types::Type`], values and aggregates
pub mod types {
    pub use cheader_types::*;
}
