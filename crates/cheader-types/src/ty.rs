//! The [`Type`] value and its modifiers.

use crate::error::{TypeError, TypeResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

// ============================================================================
// Qualifiers
// ============================================================================

/// Ordered, duplicate-free set of qualifier words for one declarator level
/// (`const`, `volatile`, `__stdcall`, `__declspec(dllexport)`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifierSet(Vec<SmolStr>);

impl QualifierSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, qualifier: impl Into<SmolStr>) {
        let qualifier = qualifier.into();
        if !self.0.contains(&qualifier) {
            self.0.push(qualifier);
        }
    }

    pub fn extend_from(&mut self, other: &QualifierSet) {
        for q in &other.0 {
            self.insert(q.clone());
        }
    }

    pub fn contains(&self, qualifier: &str) -> bool {
        self.0.iter().any(|q| q == qualifier)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(SmolStr::as_str)
    }
}

impl<S: Into<SmolStr>> FromIterator<S> for QualifierSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = QualifierSet::new();
        for q in iter {
            set.insert(q);
        }
        set
    }
}

impl fmt::Display for QualifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, q) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{q}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// One function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Option<SmolStr>,
    pub ty: Type,
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: Option<&str>, ty: Type) -> Self {
        Self {
            name: name.map(SmolStr::new),
            ty,
            default: None,
        }
    }
}

/// Parameter list of a function modifier. `(void)` is an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionSig {
    pub params: Vec<Param>,
    pub variadic: bool,
}

impl FunctionSig {
    pub fn new(params: Vec<Param>) -> Self {
        Self {
            params,
            variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// A single declarator level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    Pointer,
    /// C++ style `&`
    Reference,
    /// `None` is an incomplete array (`T[]`) or a bound that could not be
    /// evaluated
    Array(Option<u64>),
    Function(FunctionSig),
}

// ============================================================================
// Type
// ============================================================================

/// A C type: base name, modifiers applied base-outward, and one qualifier
/// set per level (level 0 qualifies the base).
///
/// The qualifier list always holds exactly one more entry than the
/// modifier list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawType")]
pub struct Type {
    base: SmolStr,
    declarators: Vec<Modifier>,
    qualifiers: Vec<QualifierSet>,
}

/// Decoded form of [`Type`] before the level count is checked
#[derive(Deserialize)]
struct RawType {
    base: SmolStr,
    declarators: Vec<Modifier>,
    qualifiers: Vec<QualifierSet>,
}

impl TryFrom<RawType> for Type {
    type Error = TypeError;

    fn try_from(raw: RawType) -> TypeResult<Self> {
        if raw.qualifiers.len() != raw.declarators.len() + 1 {
            return Err(TypeError::QualifierLevels {
                qualifiers: raw.qualifiers.len(),
                declarators: raw.declarators.len(),
            });
        }
        Ok(Self {
            base: raw.base,
            declarators: raw.declarators,
            qualifiers: raw.qualifiers,
        })
    }
}

impl Type {
    pub fn new(base: impl Into<SmolStr>) -> Self {
        Self {
            base: base.into(),
            declarators: Vec::new(),
            qualifiers: vec![QualifierSet::new()],
        }
    }

    pub(crate) fn from_parts(base: SmolStr, declarators: Vec<Modifier>, qualifiers: Vec<QualifierSet>) -> Self {
        debug_assert_eq!(qualifiers.len(), declarators.len() + 1);
        Self {
            base,
            declarators,
            qualifiers,
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base
    }

    pub fn declarators(&self) -> &[Modifier] {
        &self.declarators
    }

    pub fn qualifiers(&self) -> &[QualifierSet] {
        &self.qualifiers
    }

    /// Qualifiers on the base type (level 0)
    pub fn base_qualifiers(&self) -> &QualifierSet {
        &self.qualifiers[0]
    }

    /// Qualifiers on the outermost level
    pub fn outer_qualifiers(&self) -> &QualifierSet {
        &self.qualifiers[self.qualifiers.len() - 1]
    }

    pub fn outermost(&self) -> Option<&Modifier> {
        self.declarators.last()
    }

    /// Apply one more modifier outside the existing ones
    pub fn push(mut self, modifier: Modifier) -> Self {
        self.declarators.push(modifier);
        self.qualifiers.push(QualifierSet::new());
        self
    }

    pub fn pointer(self) -> Self {
        self.push(Modifier::Pointer)
    }

    pub fn reference(self) -> Self {
        self.push(Modifier::Reference)
    }

    pub fn array(self, size: Option<u64>) -> Self {
        self.push(Modifier::Array(size))
    }

    pub fn function(self, sig: FunctionSig) -> Self {
        self.push(Modifier::Function(sig))
    }

    /// Add qualifiers to the outermost level
    pub fn qualified<S: Into<SmolStr>>(mut self, qualifiers: impl IntoIterator<Item = S>) -> Self {
        let outer = self.qualifiers.len() - 1;
        for q in qualifiers {
            self.qualifiers[outer].insert(q);
        }
        self
    }

    pub fn add_outer_qualifiers(&mut self, qualifiers: &QualifierSet) {
        let outer = self.qualifiers.len() - 1;
        self.qualifiers[outer].extend_from(qualifiers);
    }

    pub fn is_function(&self) -> bool {
        matches!(self.outermost(), Some(Modifier::Function(_)))
    }

    /// Split a function type into `(return type, parameter list)`.
    ///
    /// The return type keeps every modifier below the parameter list, so a
    /// function returning a pointer to an array yields the full
    /// pointer-to-array type.
    pub fn signature(&self) -> TypeResult<(Type, &FunctionSig)> {
        match self.declarators.last() {
            Some(Modifier::Function(sig)) => {
                let n = self.declarators.len() - 1;
                let ret = Type::from_parts(
                    self.base.clone(),
                    self.declarators[..n].to_vec(),
                    self.qualifiers[..=n].to_vec(),
                );
                Ok((ret, sig))
            }
            _ => Err(TypeError::NotAFunction(self.c_repr(None))),
        }
    }

    /// Same type under a different base name, keeping modifiers and
    /// qualifiers.
    pub fn with_base(&self, base: impl Into<SmolStr>) -> Self {
        Self {
            base: base.into(),
            ..self.clone()
        }
    }

    /// Splice `outer` on top of this type, as when `outer` refers to this
    /// type through a typedef name. The innermost qualifier set of `outer`
    /// joins this type's outermost set.
    pub fn splice(&self, outer: &Type) -> Type {
        let mut declarators = self.declarators.clone();
        declarators.extend(outer.declarators.iter().cloned());

        let mut qualifiers = self.qualifiers.clone();
        if let Some(junction) = qualifiers.last_mut() {
            junction.extend_from(&outer.qualifiers[0]);
        }
        qualifiers.extend(outer.qualifiers[1..].iter().cloned());

        Type::from_parts(self.base.clone(), declarators, qualifiers)
    }
}

impl From<&str> for Type {
    fn from(base: &str) -> Self {
        Type::new(base)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.c_repr(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_qualifier_levels_track_modifiers() {
        let ty = Type::new("int").qualified(["const"]).pointer().qualified(["volatile"]).array(Some(3));
        assert_eq!(ty.declarators().len(), 2);
        assert_eq!(ty.qualifiers().len(), 3);
        assert!(ty.base_qualifiers().contains("const"));
        assert!(ty.qualifiers()[1].contains("volatile"));
        assert!(ty.outer_qualifiers().is_empty());
    }

    #[test]
    fn test_decoding_checks_qualifier_levels() {
        let ty = Type::new("int").pointer();
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(serde_json::from_str::<Type>(&json).unwrap(), ty);

        let short = json.replace(r#""qualifiers":[[],[]]"#, r#""qualifiers":[]"#);
        assert_ne!(short, json);
        let err = serde_json::from_str::<Type>(&short).unwrap_err();
        assert!(err.to_string().contains("0 qualifier level(s) for 1 modifier(s)"));
    }

    #[test]
    fn test_qualifier_set_dedupes() {
        let set: QualifierSet = ["const", "volatile", "const"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "const volatile");
    }

    #[test]
    fn test_splice_joins_qualifiers() {
        let typedef = Type::new("char").pointer().qualified(["const"]);
        let outer = Type::new("name_t").qualified(["volatile"]).array(Some(2));
        let spliced = typedef.splice(&outer);

        assert_eq!(spliced.base_name(), "char");
        assert_eq!(
            spliced.declarators(),
            &[Modifier::Pointer, Modifier::Array(Some(2))]
        );
        assert_eq!(spliced.qualifiers().len(), 3);
        let junction: Vec<&str> = spliced.qualifiers()[1].iter().collect();
        assert_eq!(junction, vec!["const", "volatile"]);
    }

    #[test]
    fn test_signature_keeps_return_modifiers() {
        let sig = FunctionSig::new(vec![Param::new(Some("x"), Type::new("int"))]);
        let ty = Type::new("char").pointer().function(sig.clone());
        let (ret, params) = ty.signature().expect("function type");
        assert_eq!(ret, Type::new("char").pointer());
        assert_eq!(params, &sig);

        let err = Type::new("int").pointer().signature().unwrap_err();
        assert!(matches!(err, TypeError::NotAFunction(_)));
    }
}
