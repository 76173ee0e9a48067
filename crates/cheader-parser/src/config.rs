//! Grammar configuration.
//!
//! The C vocabulary accepted by a [`Grammar`] is fixed when it is built.
//! Compiler-specific words (extra integer types, calling conventions,
//! `__declspec`) are added through [`GrammarConfig`] rather than by
//! mutating shared tables.

use crate::parser::Parser;
use crate::{ParseReport, ParseResult};
use cheader_preprocess::PackingLog;
use cheader_registry::Registry;
use cheader_types::{Type, TypeVocabulary, BASE_TYPES, SIGN_MODIFIERS, SIZE_MODIFIERS};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tracing::debug;

/// Words recognized by the declarator grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarConfig {
    /// Built-in base type keywords (`int`, `char`, ...)
    pub base_types: Vec<SmolStr>,

    /// `short`, `long`
    pub size_modifiers: Vec<SmolStr>,

    /// `signed`, `unsigned`
    pub sign_modifiers: Vec<SmolStr>,

    /// Additional built-in base types, e.g. `__int64`
    pub extra_types: Vec<SmolStr>,

    /// Type qualifiers and calling conventions
    pub qualifiers: Vec<SmolStr>,

    /// Compiler-specific modifiers, optionally followed by a parenthesized
    /// argument list (`__declspec(dllimport)`)
    pub extra_modifiers: Vec<SmolStr>,

    /// Storage class specifiers
    pub storage_classes: Vec<SmolStr>,

    /// Treat unknown `__identifier` words in qualifier position as
    /// modifiers
    pub double_underscore_modifiers: bool,
}

fn words(list: &[&str]) -> Vec<SmolStr> {
    list.iter().map(|w| SmolStr::new(w)).collect()
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            base_types: words(BASE_TYPES),
            size_modifiers: words(SIZE_MODIFIERS),
            sign_modifiers: words(SIGN_MODIFIERS),
            extra_types: Vec::new(),
            qualifiers: words(&[
                "const", "volatile", "restrict", "near", "far", "__cdecl", "__stdcall", "call_conv",
            ]),
            extra_modifiers: Vec::new(),
            storage_classes: words(&["inline", "static", "extern"]),
            double_underscore_modifiers: true,
        }
    }
}

impl GrammarConfig {
    /// Microsoft compiler vocabulary
    pub fn msvc() -> Self {
        let mut config = Self::default();
        config.extra_types.push("__int64".into());
        config.extra_modifiers.extend(words(&[
            "__based",
            "__declspec",
            "__fastcall",
            "__restrict",
            "__sptr",
            "__uptr",
            "__w64",
            "__unaligned",
            "__nullterminated",
        ]));
        config
    }

    pub fn with_extra_types<S: Into<SmolStr>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.extra_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn with_extra_modifiers<S: Into<SmolStr>>(mut self, modifiers: impl IntoIterator<Item = S>) -> Self {
        self.extra_modifiers
            .extend(modifiers.into_iter().map(Into::into));
        self
    }

    /// Vocabulary for [`Type::is_fundamental`] matching this grammar
    pub fn vocabulary(&self) -> TypeVocabulary {
        TypeVocabulary::standard().with_words(
            self.base_types
                .iter()
                .chain(&self.size_modifiers)
                .chain(&self.sign_modifiers)
                .chain(&self.extra_types)
                .cloned(),
        )
    }
}

/// Builds an immutable [`Grammar`] from a [`GrammarConfig`]
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    config: GrammarConfig,
}

impl GrammarBuilder {
    pub fn new(config: GrammarConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> Grammar {
        let set = |lists: &[&Vec<SmolStr>]| -> FxHashSet<SmolStr> {
            lists.iter().flat_map(|l| l.iter().cloned()).collect()
        };
        let c = &self.config;
        let fundamental = set(&[&c.base_types, &c.size_modifiers, &c.sign_modifiers, &c.extra_types]);
        let qualifiers = set(&[&c.qualifiers]);
        let modifiers = set(&[&c.extra_modifiers]);
        let storage = set(&[&c.storage_classes]);

        let mut keywords = set(&[
            &c.base_types,
            &c.size_modifiers,
            &c.sign_modifiers,
            &c.extra_types,
            &c.qualifiers,
            &c.extra_modifiers,
            &c.storage_classes,
        ]);
        for word in ["struct", "union", "enum", "typedef"] {
            keywords.insert(SmolStr::new(word));
        }
        debug!(keywords = keywords.len(), "grammar built");

        Grammar {
            vocabulary: self.config.vocabulary(),
            config: self.config,
            fundamental,
            qualifiers,
            modifiers,
            storage,
            keywords,
        }
    }
}

/// Declarator grammar over a fixed vocabulary. Reusable across files and
/// sessions.
#[derive(Debug, Clone)]
pub struct Grammar {
    config: GrammarConfig,
    vocabulary: TypeVocabulary,
    pub(crate) fundamental: FxHashSet<SmolStr>,
    pub(crate) qualifiers: FxHashSet<SmolStr>,
    pub(crate) modifiers: FxHashSet<SmolStr>,
    pub(crate) storage: FxHashSet<SmolStr>,
    pub(crate) keywords: FxHashSet<SmolStr>,
}

impl Default for Grammar {
    fn default() -> Self {
        GrammarBuilder::default().build()
    }
}

impl Grammar {
    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &TypeVocabulary {
        &self.vocabulary
    }

    pub(crate) fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word)
    }

    /// Word usable as a speculative modifier: `__name` outside the keyword
    /// tables
    pub(crate) fn is_underscore_word(&self, word: &str) -> bool {
        self.config.double_underscore_modifiers && word.starts_with("__") && !self.is_keyword(word)
    }

    /// Parse preprocessed header text, registering every declaration in
    /// `registry` under `file`. `packing` supplies `#pragma pack` state by
    /// line.
    pub fn parse_file(&self, text: &str, file: &str, packing: &PackingLog, registry: &mut Registry) -> ParseReport {
        Parser::new(self, text, file, packing, registry).parse_file()
    }

    /// Parse a single declaration or abstract type name such as
    /// `int (*)[4]` or `char *argv[]`. Aggregates defined inline are not
    /// registered anywhere.
    pub fn parse_type(&self, text: &str) -> ParseResult<(Option<SmolStr>, Type)> {
        let mut scratch = Registry::new();
        let packing = PackingLog::new();
        Parser::new(self, text, "", &packing, &mut scratch).parse_type_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msvc_preset_extends_default() {
        let config = GrammarConfig::msvc();
        assert!(config.extra_types.contains(&SmolStr::new("__int64")));
        assert!(config.vocabulary().contains("__int64"));
        assert!(!GrammarConfig::default().vocabulary().contains("__int64"));

        let grammar = GrammarBuilder::new(config).build();
        assert!(grammar.is_keyword("__declspec"));
        assert!(grammar.is_keyword("struct"));
        assert!(!grammar.is_underscore_word("__declspec"));
        assert!(grammar.is_underscore_word("__attribute__"));
    }

    #[test]
    fn test_underscore_words_can_be_disabled() {
        let config = GrammarConfig {
            double_underscore_modifiers: false,
            ..GrammarConfig::default()
        };
        let grammar = GrammarBuilder::new(config).build();
        assert!(!grammar.is_underscore_word("__attribute__"));
    }
}
