//! Initialization options recorded in cache blobs.

use cheader_registry::Definition;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A regular-expression rewrite applied to raw header text before
/// comments are stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Header the rule applies to; `None` applies it to every header
    pub file: Option<SmolStr>,
    pub pattern: String,
    /// Replacement text, `$1`-style group references allowed
    pub replacement: String,
}

impl Replacement {
    pub fn applies_to(&self, file: &str) -> bool {
        self.file.as_deref().map_or(true, |f| f == file)
    }
}

/// Everything that determines what a session extracts. Two sessions with
/// equal options over unchanged headers produce equal registries, which is
/// what cache validation relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Header names in processing order
    pub files: Vec<SmolStr>,
    pub replacements: Vec<Replacement>,
    /// Predefined object macros as `(name, body)`
    pub macros: Vec<(SmolStr, String)>,
    /// Built-in definitions inserted before any header is processed
    pub seeds: Vec<(SmolStr, Definition)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_scope() {
        let rule = |file: Option<&str>| Replacement {
            file: file.map(SmolStr::new),
            pattern: "a".to_string(),
            replacement: String::new(),
        };
        assert!(rule(None).applies_to("x.h"));
        assert!(rule(Some("x.h")).applies_to("x.h"));
        assert!(!rule(Some("y.h")).applies_to("x.h"));
    }
}
