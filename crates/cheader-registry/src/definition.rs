//! Definition categories and the values stored under them.

use crate::error::RegistryError;
use cheader_types::{Compound, EnumDef, FnMacro, FunctionSig, Macro, QualifierSet, Type, TypeResult, Value};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

/// The nine kinds of named definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Macros,
    FnMacros,
    Types,
    Variables,
    Functions,
    Structs,
    Unions,
    Enums,
    Values,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Macros,
        Category::FnMacros,
        Category::Types,
        Category::Variables,
        Category::Functions,
        Category::Structs,
        Category::Unions,
        Category::Enums,
        Category::Values,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Macros => "macros",
            Category::FnMacros => "fnmacros",
            Category::Types => "types",
            Category::Variables => "variables",
            Category::Functions => "functions",
            Category::Structs => "structs",
            Category::Unions => "unions",
            Category::Enums => "enums",
            Category::Values => "values",
        }
    }
}

impl FromStr for Category {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A global variable: initializer value (if any) and type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub value: Option<Value>,
    pub ty: Type,
    /// Storage classes written before the declaration (`extern`, `static`)
    pub storage: Vec<SmolStr>,
}

impl Variable {
    pub fn new(value: Option<Value>, ty: Type) -> Self {
        Self {
            value,
            ty,
            storage: Vec::new(),
        }
    }
}

/// A function prototype or definition, kept as `(return type, parameters)`
/// whatever modifiers the return type carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    return_type: Type,
    sig: FunctionSig,
    /// Qualifiers of the function itself, such as a calling convention
    qualifiers: QualifierSet,
    pub storage: Vec<SmolStr>,
}

impl FunctionDecl {
    /// Fails unless the outermost modifier of `ty` is a parameter list
    pub fn new(ty: &Type) -> TypeResult<Self> {
        let (return_type, sig) = ty.signature()?;
        Ok(Self {
            return_type,
            sig: sig.clone(),
            qualifiers: ty.qualifiers().last().cloned().unwrap_or_default(),
            storage: Vec::new(),
        })
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn sig(&self) -> &FunctionSig {
        &self.sig
    }

    /// The full function type
    pub fn ty(&self) -> Type {
        let mut ty = self.return_type.clone().function(self.sig.clone());
        ty.add_outer_qualifiers(&self.qualifiers);
        ty
    }

    pub fn signature(&self) -> (&Type, &FunctionSig) {
        (&self.return_type, &self.sig)
    }
}

/// A definition of any category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Definition {
    Macro(Macro),
    FnMacro(FnMacro),
    Type(Type),
    Variable(Variable),
    Function(FunctionDecl),
    Struct(Compound),
    Union(Compound),
    Enum(EnumDef),
    Value(Value),
}

impl Definition {
    pub fn category(&self) -> Category {
        match self {
            Definition::Macro(_) => Category::Macros,
            Definition::FnMacro(_) => Category::FnMacros,
            Definition::Type(_) => Category::Types,
            Definition::Variable(_) => Category::Variables,
            Definition::Function(_) => Category::Functions,
            Definition::Struct(_) => Category::Structs,
            Definition::Union(_) => Category::Unions,
            Definition::Enum(_) => Category::Enums,
            Definition::Value(_) => Category::Values,
        }
    }
}
