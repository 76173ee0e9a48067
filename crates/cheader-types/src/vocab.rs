//! Built-in type vocabulary.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// Built-in base type keywords
pub const BASE_TYPES: &[&str] = &["void", "char", "bool", "_Bool", "int", "float", "double"];

pub const SIZE_MODIFIERS: &[&str] = &["short", "long"];

pub const SIGN_MODIFIERS: &[&str] = &["signed", "unsigned"];

/// Integer typedefs treated as built-in so resolution stops at them
pub const FIXED_WIDTH_TYPES: &[&str] = &[
    "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "intptr_t", "uintptr_t", "size_t", "ssize_t", "ptrdiff_t", "wchar_t",
];

/// The set of words a fundamental type name may be built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVocabulary {
    words: FxHashSet<SmolStr>,
}

impl TypeVocabulary {
    /// Empty vocabulary; only `struct`/`union`/`enum` tags are fundamental
    pub fn empty() -> Self {
        Self {
            words: FxHashSet::default(),
        }
    }

    /// Keywords, size and sign modifiers, and the fixed-width family
    pub fn standard() -> Self {
        let mut vocab = Self::empty();
        for word in BASE_TYPES
            .iter()
            .chain(SIZE_MODIFIERS)
            .chain(SIGN_MODIFIERS)
            .chain(FIXED_WIDTH_TYPES)
        {
            vocab.insert(*word);
        }
        vocab
    }

    /// Add extra base types, e.g. `__int64`
    pub fn with_words<S: Into<SmolStr>>(mut self, words: impl IntoIterator<Item = S>) -> Self {
        for word in words {
            self.insert(word);
        }
        self
    }

    pub fn insert(&mut self, word: impl Into<SmolStr>) {
        self.words.insert(word.into());
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

impl Default for TypeVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}
