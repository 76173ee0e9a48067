//! C Declarator Grammar
//!
//! Recursive-descent parser for preprocessed C/C++ header text. Each
//! top-level declaration is reduced to registry definitions: typedefs,
//! variables, function prototypes, structs, unions and enums.
//!
//! ## Example
//!
//! ```
//! use cheader_parser::Grammar;
//! use cheader_types::Type;
//!
//! let grammar = Grammar::default();
//! let (name, ty) = grammar.parse_type("int (*table)[4]").unwrap();
//! assert_eq!(name.as_deref(), Some("table"));
//! assert_eq!(ty, Type::new("int").array(Some(4)).pointer());
//! ```
//!
//! ## Error recovery
//!
//! A declaration that does not match the grammar is skipped up to the next
//! `;` (or past its `{ ... }` block) and reported as [`Unparsed`]. A
//! declaration that matches but cannot be turned into definitions, such as
//! an enum value that does not evaluate, is dropped as a whole and
//! reported as a [`DefinitionError`]. Neither stops the rest of the file.

mod config;
mod declarator;
mod error;
mod parser;

pub use config::{Grammar, GrammarBuilder, GrammarConfig};
pub use error::{DefinitionError, ParseError, ParseResult};

/// Declaration text the grammar could not match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unparsed {
    /// 0-based line of the first skipped token
    pub line: usize,
    pub text: String,
}

/// Problems found while parsing one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub unparsed: Vec<Unparsed>,
    pub errors: Vec<DefinitionError>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.unparsed.is_empty() && self.errors.is_empty()
    }
}
