//! Definition Registry
//!
//! Accumulates the named definitions extracted from C headers, keyed by
//! [`Category`]. Two indices are kept in step:
//!
//! - the flat view: the current definition of every name
//! - the per-file view: which file contributed which definitions, used for
//!   provenance ([`Registry::find_file_of`]) and for cache export/import
//!
//! Later definitions of a name overwrite earlier ones; removal drops the
//! name from both indices.

mod definition;
mod definitions;
mod dump;
mod error;
mod registry;

pub use definition::{Category, Definition, FunctionDecl, Variable};
pub use definitions::Definitions;
pub use error::{RegistryError, RegistryResult};
pub use registry::Registry;
