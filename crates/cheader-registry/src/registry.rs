//! The two-index definition registry.

use crate::definition::{Category, Definition, FunctionDecl, Variable};
use crate::definitions::Definitions;
use crate::error::RegistryResult;
use cheader_types::{Compound, EnumDef, FnMacro, Macro, Type, TypeLookup, Value, ValueLookup};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

/// All definitions of a parsing session, flat and per file.
///
/// Definitions inserted without a file (seeded built-ins, predefined
/// macros) appear only in the flat view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    flat: Definitions,
    files: IndexMap<SmolStr, Definitions>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` in both indices. Later definitions overwrite earlier
    /// ones.
    pub fn insert(&mut self, file: Option<&str>, name: impl Into<SmolStr>, def: Definition) {
        let name = name.into();
        if let Some(file) = file {
            self.files
                .entry(SmolStr::new(file))
                .or_default()
                .insert(name.clone(), def.clone());
        }
        debug!(category = %def.category(), %name, file = file.unwrap_or("-"), "definition");
        self.flat.insert(name, def);
    }

    /// Remove `name` from `category` in the flat view and every file
    pub fn remove(&mut self, category: Category, name: &str) -> Option<Definition> {
        for defs in self.files.values_mut() {
            defs.remove(category, name);
        }
        self.flat.remove(category, name)
    }

    pub fn get(&self, category: Category, name: &str) -> Option<Definition> {
        self.flat.get(category, name)
    }

    pub fn contains(&self, category: Category, name: &str) -> bool {
        self.flat.contains(category, name)
    }

    /// Look up by category name; unknown category names are an error
    pub fn lookup(&self, category: &str, name: &str) -> RegistryResult<Option<Definition>> {
        let category: Category = category.parse()?;
        Ok(self.get(category, name))
    }

    /// Names in a category given by name
    pub fn names(&self, category: &str) -> RegistryResult<Vec<&str>> {
        let category: Category = category.parse()?;
        Ok(self.flat.names(category))
    }

    /// The most recently processed file that defines `name`
    pub fn find_file_of(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .rev()
            .find(|(_, defs)| defs.defines(name))
            .map(|(file, _)| file.as_str())
    }

    pub fn flat(&self) -> &Definitions {
        &self.flat
    }

    /// Files in processing order
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(SmolStr::as_str)
    }

    pub fn file_view(&self, file: &str) -> Option<&Definitions> {
        self.files.get(file)
    }

    /// Bulk import of another registry. Entries of `other` overwrite
    /// same-named entries here; importing a registry into a copy of itself
    /// changes nothing.
    pub fn import(&mut self, other: &Registry) {
        self.flat.merge(&other.flat);
        for (file, defs) in &other.files {
            self.files.entry(file.clone()).or_default().merge(defs);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    // ========================================================================
    // Category accessors
    // ========================================================================

    pub fn macros(&self) -> &IndexMap<SmolStr, Macro> {
        &self.flat.macros
    }

    pub fn fnmacros(&self) -> &IndexMap<SmolStr, FnMacro> {
        &self.flat.fnmacros
    }

    pub fn types(&self) -> &IndexMap<SmolStr, Type> {
        &self.flat.types
    }

    pub fn variables(&self) -> &IndexMap<SmolStr, Variable> {
        &self.flat.variables
    }

    pub fn functions(&self) -> &IndexMap<SmolStr, FunctionDecl> {
        &self.flat.functions
    }

    pub fn structs(&self) -> &IndexMap<SmolStr, Compound> {
        &self.flat.structs
    }

    pub fn unions(&self) -> &IndexMap<SmolStr, Compound> {
        &self.flat.unions
    }

    pub fn enums(&self) -> &IndexMap<SmolStr, EnumDef> {
        &self.flat.enums
    }

    pub fn values(&self) -> &IndexMap<SmolStr, Value> {
        &self.flat.values
    }

    /// True if `name` is an object or function macro
    pub fn is_macro(&self, name: &str) -> bool {
        self.flat.macros.contains_key(name) || self.flat.fnmacros.contains_key(name)
    }
}

impl TypeLookup for Registry {
    fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.flat.types.get(name)
    }
}

impl ValueLookup for Registry {
    fn lookup_value(&self, name: &str) -> Option<Value> {
        self.flat.values.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Registry {
        let mut registry = Registry::new();
        registry.insert(None, "BUILTIN", Definition::Macro(Macro::new("1")));
        registry.insert(Some("a.h"), "A", Definition::Value(Value::Int(1)));
        registry.insert(Some("a.h"), "point_t", Definition::Type(Type::new("struct point")));
        registry.insert(Some("b.h"), "B", Definition::Value(Value::Int(2)));
        registry
    }

    #[test]
    fn test_file_provenance() {
        let registry = sample();
        assert_eq!(registry.find_file_of("A"), Some("a.h"));
        assert_eq!(registry.find_file_of("B"), Some("b.h"));
        assert_eq!(registry.find_file_of("BUILTIN"), None);
        assert_eq!(registry.files().collect::<Vec<_>>(), vec!["a.h", "b.h"]);
    }

    #[test]
    fn test_redefinition_moves_provenance() {
        let mut registry = sample();
        registry.insert(Some("b.h"), "A", Definition::Value(Value::Int(5)));
        assert_eq!(registry.values()["A"], Value::Int(5));
        assert_eq!(registry.find_file_of("A"), Some("b.h"));
    }

    #[test]
    fn test_remove_from_both_indices() {
        let mut registry = sample();
        assert!(registry.remove(Category::Values, "A").is_some());
        assert!(!registry.contains(Category::Values, "A"));
        assert_eq!(registry.find_file_of("A"), None);
        assert!(registry.file_view("a.h").is_some_and(|d| d.types.contains_key("point_t")));
    }

    #[test]
    fn test_lookup_by_category_name() {
        let registry = sample();
        assert_eq!(
            registry.lookup("values", "B").unwrap(),
            Some(Definition::Value(Value::Int(2)))
        );
        assert!(registry.lookup("widgets", "B").is_err());
        assert_eq!(registry.names("types").unwrap(), vec!["point_t"]);
    }

    #[test]
    fn test_import_into_itself_is_idempotent() {
        let mut registry = sample();
        let snapshot = registry.clone();
        registry.import(&snapshot);
        assert_eq!(registry, snapshot);
    }

    #[test]
    fn test_import_overwrites() {
        let mut registry = sample();
        let mut other = Registry::new();
        other.insert(Some("c.h"), "A", Definition::Value(Value::Int(9)));
        registry.import(&other);
        assert_eq!(registry.values()["A"], Value::Int(9));
        assert_eq!(registry.find_file_of("A"), Some("c.h"));
    }

    #[test]
    fn test_lookup_traits() {
        let registry = sample();
        assert_eq!(registry.lookup_value("B"), Some(Value::Int(2)));
        assert_eq!(registry.lookup_type("point_t"), Some(&Type::new("struct point")));
    }
}
