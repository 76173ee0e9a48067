//! Typedef resolution and fundamental-type classification.

use crate::error::{TypeError, TypeResult};
use crate::ty::Type;
use crate::vocab::TypeVocabulary;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Source of typedef definitions
pub trait TypeLookup {
    fn lookup_type(&self, name: &str) -> Option<&Type>;
}

impl TypeLookup for IndexMap<SmolStr, Type> {
    fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.get(name)
    }
}

impl TypeLookup for FxHashMap<SmolStr, Type> {
    fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.get(name)
    }
}

const TAG_PREFIXES: [&str; 3] = ["struct ", "union ", "enum "];

impl Type {
    /// True if the base is a `struct`/`union`/`enum` tag
    pub fn is_tagged(&self) -> bool {
        TAG_PREFIXES.iter().any(|p| self.base_name().starts_with(p))
    }

    /// True if no typedef lookup is needed: the base is a tag or made only
    /// of vocabulary words.
    pub fn is_fundamental(&self, vocab: &TypeVocabulary) -> bool {
        if self.is_tagged() {
            return true;
        }
        let mut words = self.base_name().split_whitespace().peekable();
        words.peek().is_some() && words.all(|w| vocab.contains(w))
    }

    /// Chase typedefs until a fundamental type is reached.
    ///
    /// Each step splices the typedef's modifiers in front of the current
    /// ones. Fails with [`TypeError::Unresolved`] for unknown names and with
    /// [`TypeError::Recursive`] when a name reappears in its own chain.
    pub fn resolve(&self, typedefs: &impl TypeLookup, vocab: &TypeVocabulary) -> TypeResult<Type> {
        let mut current = self.clone();
        let mut chain: Vec<SmolStr> = Vec::new();

        loop {
            if current.is_fundamental(vocab) {
                return Ok(current.strip_signed());
            }

            let name = SmolStr::new(current.base_name());
            if chain.contains(&name) {
                chain.push(name);
                return Err(TypeError::Recursive { chain });
            }

            let typedef = match typedefs.lookup_type(&name) {
                Some(typedef) => typedef,
                None => return Err(TypeError::unresolved(name, chain)),
            };
            chain.push(name);
            current = typedef.splice(&current);
        }
    }

    /// Drop a `signed` keyword that does not change meaning. `signed char`
    /// stays distinct from `char`; a lone `signed` becomes `int`.
    pub fn strip_signed(&self) -> Type {
        let words: Vec<&str> = self.base_name().split_whitespace().collect();
        if !words.contains(&"signed") || words.contains(&"char") {
            return self.clone();
        }
        let rest: Vec<&str> = words.into_iter().filter(|w| *w != "signed").collect();
        if rest.is_empty() {
            self.with_base("int")
        } else {
            self.with_base(rest.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Modifier;
    use pretty_assertions::assert_eq;

    fn table(entries: &[(&str, Type)]) -> IndexMap<SmolStr, Type> {
        entries.iter().map(|(n, t)| (SmolStr::new(n), t.clone())).collect()
    }

    #[test]
    fn test_is_fundamental() {
        let vocab = TypeVocabulary::standard();
        assert!(Type::new("unsigned long long int").is_fundamental(&vocab));
        assert!(Type::new("struct anything").is_fundamental(&vocab));
        assert!(Type::new("uint32_t").is_fundamental(&vocab));
        assert!(!Type::new("DWORD").is_fundamental(&vocab));
        assert!(!Type::new("unsigned DWORD").is_fundamental(&vocab));
        assert!(!Type::new("").is_fundamental(&vocab));
        assert!(Type::new("__int64").is_fundamental(&vocab.clone().with_words(["__int64"])));
    }

    #[test]
    fn test_resolve_chain() {
        let vocab = TypeVocabulary::standard();
        let typedefs = table(&[
            ("A", Type::new("int").pointer()),
            ("B", Type::new("A").array(Some(4))),
        ]);
        let resolved = Type::new("B").pointer().resolve(&typedefs, &vocab).unwrap();
        assert_eq!(resolved.base_name(), "int");
        assert_eq!(
            resolved.declarators(),
            &[Modifier::Pointer, Modifier::Array(Some(4)), Modifier::Pointer]
        );
        assert_eq!(resolved.qualifiers().len(), resolved.declarators().len() + 1);
    }

    #[test]
    fn test_resolve_merges_junction_qualifiers() {
        let vocab = TypeVocabulary::standard();
        let typedefs = table(&[("cstr", Type::new("char").qualified(["const"]).pointer())]);
        let ty = Type::new("cstr").qualified(["volatile"]);
        let resolved = ty.resolve(&typedefs, &vocab).unwrap();
        assert!(resolved.base_qualifiers().contains("const"));
        assert!(resolved.qualifiers()[1].contains("volatile"));
    }

    #[test]
    fn test_resolve_unknown() {
        let vocab = TypeVocabulary::standard();
        let typedefs = table(&[("A", Type::new("missing"))]);
        let err = Type::new("A").resolve(&typedefs, &vocab).unwrap_err();
        assert_eq!(err, TypeError::unresolved("missing", vec!["A".into()]));
        assert_eq!(err.to_string(), "unresolved type 'missing' (via A)");
    }

    #[test]
    fn test_resolve_cycle() {
        let vocab = TypeVocabulary::standard();
        let typedefs = table(&[
            ("recType1", Type::new("recType2")),
            ("recType2", Type::new("recType3")),
            ("recType3", Type::new("recType1").pointer()),
        ]);
        let err = Type::new("recType1").resolve(&typedefs, &vocab).unwrap_err();
        assert_eq!(
            err,
            TypeError::Recursive {
                chain: vec!["recType1".into(), "recType2".into(), "recType3".into(), "recType1".into()]
            }
        );
    }

    #[test]
    fn test_strip_signed() {
        assert_eq!(Type::new("signed int").strip_signed().base_name(), "int");
        assert_eq!(Type::new("signed").strip_signed().base_name(), "int");
        assert_eq!(Type::new("signed char").strip_signed().base_name(), "signed char");
        assert_eq!(Type::new("unsigned").strip_signed().base_name(), "unsigned");
    }
}
