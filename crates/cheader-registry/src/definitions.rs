//! One view of the registry: category maps in definition order.

use crate::definition::{Category, Definition, FunctionDecl, Variable};
use cheader_types::{Compound, EnumDef, FnMacro, Macro, Type, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Category maps for one view (the flat view, or a single file)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definitions {
    pub macros: IndexMap<SmolStr, Macro>,
    pub fnmacros: IndexMap<SmolStr, FnMacro>,
    pub types: IndexMap<SmolStr, Type>,
    pub variables: IndexMap<SmolStr, Variable>,
    pub functions: IndexMap<SmolStr, FunctionDecl>,
    pub structs: IndexMap<SmolStr, Compound>,
    pub unions: IndexMap<SmolStr, Compound>,
    pub enums: IndexMap<SmolStr, EnumDef>,
    pub values: IndexMap<SmolStr, Value>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `name` in the definition's category
    pub fn insert(&mut self, name: SmolStr, def: Definition) {
        match def {
            Definition::Macro(d) => {
                self.macros.insert(name, d);
            }
            Definition::FnMacro(d) => {
                self.fnmacros.insert(name, d);
            }
            Definition::Type(d) => {
                self.types.insert(name, d);
            }
            Definition::Variable(d) => {
                self.variables.insert(name, d);
            }
            Definition::Function(d) => {
                self.functions.insert(name, d);
            }
            Definition::Struct(d) => {
                self.structs.insert(name, d);
            }
            Definition::Union(d) => {
                self.unions.insert(name, d);
            }
            Definition::Enum(d) => {
                self.enums.insert(name, d);
            }
            Definition::Value(d) => {
                self.values.insert(name, d);
            }
        }
    }

    /// Remove `name` from `category`, keeping the order of the rest
    pub fn remove(&mut self, category: Category, name: &str) -> Option<Definition> {
        match category {
            Category::Macros => self.macros.shift_remove(name).map(Definition::Macro),
            Category::FnMacros => self.fnmacros.shift_remove(name).map(Definition::FnMacro),
            Category::Types => self.types.shift_remove(name).map(Definition::Type),
            Category::Variables => self.variables.shift_remove(name).map(Definition::Variable),
            Category::Functions => self.functions.shift_remove(name).map(Definition::Function),
            Category::Structs => self.structs.shift_remove(name).map(Definition::Struct),
            Category::Unions => self.unions.shift_remove(name).map(Definition::Union),
            Category::Enums => self.enums.shift_remove(name).map(Definition::Enum),
            Category::Values => self.values.shift_remove(name).map(Definition::Value),
        }
    }

    pub fn get(&self, category: Category, name: &str) -> Option<Definition> {
        match category {
            Category::Macros => self.macros.get(name).cloned().map(Definition::Macro),
            Category::FnMacros => self.fnmacros.get(name).cloned().map(Definition::FnMacro),
            Category::Types => self.types.get(name).cloned().map(Definition::Type),
            Category::Variables => self.variables.get(name).cloned().map(Definition::Variable),
            Category::Functions => self.functions.get(name).cloned().map(Definition::Function),
            Category::Structs => self.structs.get(name).cloned().map(Definition::Struct),
            Category::Unions => self.unions.get(name).cloned().map(Definition::Union),
            Category::Enums => self.enums.get(name).cloned().map(Definition::Enum),
            Category::Values => self.values.get(name).cloned().map(Definition::Value),
        }
    }

    pub fn contains(&self, category: Category, name: &str) -> bool {
        match category {
            Category::Macros => self.macros.contains_key(name),
            Category::FnMacros => self.fnmacros.contains_key(name),
            Category::Types => self.types.contains_key(name),
            Category::Variables => self.variables.contains_key(name),
            Category::Functions => self.functions.contains_key(name),
            Category::Structs => self.structs.contains_key(name),
            Category::Unions => self.unions.contains_key(name),
            Category::Enums => self.enums.contains_key(name),
            Category::Values => self.values.contains_key(name),
        }
    }

    /// Names defined in `category`, in definition order
    pub fn names(&self, category: Category) -> Vec<&str> {
        fn keys<V>(map: &IndexMap<SmolStr, V>) -> Vec<&str> {
            map.keys().map(SmolStr::as_str).collect()
        }
        match category {
            Category::Macros => keys(&self.macros),
            Category::FnMacros => keys(&self.fnmacros),
            Category::Types => keys(&self.types),
            Category::Variables => keys(&self.variables),
            Category::Functions => keys(&self.functions),
            Category::Structs => keys(&self.structs),
            Category::Unions => keys(&self.unions),
            Category::Enums => keys(&self.enums),
            Category::Values => keys(&self.values),
        }
    }

    /// True if `name` is defined in any category
    pub fn defines(&self, name: &str) -> bool {
        Category::ALL.into_iter().any(|c| self.contains(c, name))
    }

    pub fn len(&self) -> usize {
        Category::ALL.into_iter().map(|c| self.names(c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy every entry of `other` into this view, overwriting same-named
    /// entries.
    pub fn merge(&mut self, other: &Definitions) {
        fn extend<V: Clone>(into: &mut IndexMap<SmolStr, V>, from: &IndexMap<SmolStr, V>) {
            for (name, value) in from {
                into.insert(name.clone(), value.clone());
            }
        }
        extend(&mut self.macros, &other.macros);
        extend(&mut self.fnmacros, &other.fnmacros);
        extend(&mut self.types, &other.types);
        extend(&mut self.variables, &other.variables);
        extend(&mut self.functions, &other.functions);
        extend(&mut self.structs, &other.structs);
        extend(&mut self.unions, &other.unions);
        extend(&mut self.enums, &other.enums);
        extend(&mut self.values, &other.values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut defs = Definitions::new();
        defs.insert("A".into(), Definition::Value(Value::Int(1)));
        defs.insert("B".into(), Definition::Value(Value::Int(2)));
        defs.insert("T".into(), Definition::Type(Type::new("int")));

        assert_eq!(defs.len(), 3);
        assert_eq!(defs.get(Category::Values, "A"), Some(Definition::Value(Value::Int(1))));
        assert!(defs.get(Category::Types, "A").is_none());
        assert!(defs.defines("T"));

        assert!(defs.remove(Category::Values, "A").is_some());
        assert_eq!(defs.names(Category::Values), vec!["B"]);
        assert!(defs.remove(Category::Values, "A").is_none());
    }

    #[test]
    fn test_merge_overwrites_in_place() {
        let mut a = Definitions::new();
        a.insert("X".into(), Definition::Value(Value::Int(1)));
        a.insert("Y".into(), Definition::Value(Value::Int(2)));

        let mut b = Definitions::new();
        b.insert("X".into(), Definition::Value(Value::Int(10)));
        b.insert("Z".into(), Definition::Value(Value::Int(3)));

        a.merge(&b);
        assert_eq!(a.names(Category::Values), vec!["X", "Y", "Z"]);
        assert_eq!(a.values["X"], Value::Int(10));
    }
}
