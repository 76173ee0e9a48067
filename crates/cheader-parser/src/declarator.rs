//! Declarator shapes and their reduction to [`Type`]s.
//!
//! A declarator is parsed into a [`Declarator`] tree first and reduced
//! against the base type afterwards. Reduction applies, in order, the
//! pointer levels, the qualifiers that follow them, the parameter list,
//! the array dimensions (innermost last) and finally the parenthesized
//! center. Applying the center last is what makes `int (*a)[2]` a pointer
//! to an array while `int *a[2]` is an array of pointers.

use cheader_types::{FunctionSig, Modifier, QualifierSet, Type};
use smol_str::SmolStr;

/// One `*` or `&` with the qualifiers written before it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Indirection {
    pub before: QualifierSet,
    pub modifier: Modifier,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Core {
    Name(SmolStr),
    Center(Box<Declarator>),
    Abstract,
}

/// Parsed declarator, not yet applied to a base type
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declarator {
    pub indirections: Vec<Indirection>,
    /// Qualifiers between the last `*` and the name
    pub qualifiers: QualifierSet,
    pub core: Core,
    pub params: Option<FunctionSig>,
    pub arrays: Vec<Option<u64>>,
}

impl Declarator {
    #[cfg(test)]
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            core: Core::Name(name.into()),
            ..Self::unnamed()
        }
    }

    #[cfg(test)]
    pub fn unnamed() -> Self {
        Self {
            indirections: Vec::new(),
            qualifiers: QualifierSet::new(),
            core: Core::Abstract,
            params: None,
            arrays: Vec::new(),
        }
    }

    /// True if nothing at all was written
    pub fn is_empty(&self) -> bool {
        self.indirections.is_empty()
            && self.qualifiers.is_empty()
            && matches!(self.core, Core::Abstract)
            && self.params.is_none()
            && self.arrays.is_empty()
    }

    /// The declared name, searching through centers
    #[cfg(test)]
    pub fn name(&self) -> Option<&SmolStr> {
        match &self.core {
            Core::Name(name) => Some(name),
            Core::Center(inner) => inner.name(),
            Core::Abstract => None,
        }
    }

    /// Apply this declarator to `base`
    pub fn reduce(self, base: Type) -> (Option<SmolStr>, Type) {
        let mut ty = base;
        for ind in self.indirections {
            ty.add_outer_qualifiers(&ind.before);
            ty = ty.push(ind.modifier);
        }
        match self.params {
            None => ty.add_outer_qualifiers(&self.qualifiers),
            Some(sig) => {
                ty = ty.function(sig);
                ty.add_outer_qualifiers(&self.qualifiers);
            }
        }
        for size in self.arrays.into_iter().rev() {
            ty = ty.array(size);
        }
        match self.core {
            Core::Name(name) => (Some(name), ty),
            Core::Center(inner) => inner.reduce(ty),
            Core::Abstract => (None, ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cheader_types::Param;
    use pretty_assertions::assert_eq;

    fn pointer() -> Indirection {
        Indirection {
            before: QualifierSet::new(),
            modifier: Modifier::Pointer,
        }
    }

    #[test]
    fn test_array_of_pointers() {
        let decl = Declarator {
            indirections: vec![pointer()],
            arrays: vec![Some(2)],
            ..Declarator::named("a")
        };
        let (name, ty) = decl.reduce(Type::new("int"));
        assert_eq!(name.as_deref(), Some("a"));
        assert_eq!(ty, Type::new("int").pointer().array(Some(2)));
    }

    #[test]
    fn test_pointer_to_array() {
        let center = Declarator {
            indirections: vec![pointer()],
            ..Declarator::named("a")
        };
        let decl = Declarator {
            core: Core::Center(Box::new(center)),
            arrays: vec![Some(2)],
            ..Declarator::unnamed()
        };
        let (name, ty) = decl.reduce(Type::new("int"));
        assert_eq!(name.as_deref(), Some("a"));
        assert_eq!(ty, Type::new("int").array(Some(2)).pointer());
    }

    #[test]
    fn test_arrays_apply_innermost_last() {
        let decl = Declarator {
            arrays: vec![Some(10), Some(20)],
            ..Declarator::named("str")
        };
        let (_, ty) = decl.reduce(Type::new("char"));
        assert_eq!(ty.c_repr(Some("str")), "char str[10][20]");
    }

    #[test]
    fn test_qualifier_placement() {
        // int const * volatile * const p
        let decl = Declarator {
            indirections: vec![
                Indirection {
                    before: ["const"].into_iter().collect(),
                    modifier: Modifier::Pointer,
                },
                Indirection {
                    before: ["volatile"].into_iter().collect(),
                    modifier: Modifier::Pointer,
                },
            ],
            qualifiers: ["const"].into_iter().collect(),
            ..Declarator::named("p")
        };
        let (_, ty) = decl.reduce(Type::new("int"));
        assert_eq!(ty.qualifiers().len(), 3);
        assert!(ty.qualifiers()[0].contains("const"));
        assert!(ty.qualifiers()[1].contains("volatile"));
        assert!(ty.qualifiers()[2].contains("const"));
    }

    #[test]
    fn test_function_pointer() {
        let center = Declarator {
            indirections: vec![pointer()],
            ..Declarator::named("cb")
        };
        let sig = FunctionSig::new(vec![Param::new(Some("x"), Type::new("int"))]);
        let decl = Declarator {
            core: Core::Center(Box::new(center)),
            params: Some(sig.clone()),
            ..Declarator::unnamed()
        };
        assert_eq!(decl.name().map(SmolStr::as_str), Some("cb"));
        let (_, ty) = decl.reduce(Type::new("void"));
        assert_eq!(ty, Type::new("void").function(sig).pointer());
        assert!(!Declarator::unnamed().reduce(Type::new("int")).1.is_function());
    }
}
