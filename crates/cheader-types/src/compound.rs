//! Struct, union and enum definitions.

use crate::error::{TypeError, TypeResult};
use crate::ty::Type;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A struct or union member. Anonymous embedded aggregates have no name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: Option<SmolStr>,
    pub ty: Type,
    pub default: Option<Value>,
    pub bit_width: Option<u32>,
}

impl Field {
    pub fn new(name: impl Into<SmolStr>, ty: Type) -> Self {
        Self {
            name: Some(name.into()),
            ty,
            default: None,
            bit_width: None,
        }
    }

    pub fn anonymous(ty: Type) -> Self {
        Self {
            name: None,
            ty,
            default: None,
            bit_width: None,
        }
    }

    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bit_width = Some(bits);
        self
    }
}

/// Member layout of a struct or union
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCompound")]
pub struct Compound {
    fields: Vec<Field>,
    pack: Option<u32>,
}

#[derive(Deserialize)]
struct RawCompound {
    fields: Vec<Field>,
    pack: Option<u32>,
}

impl TryFrom<RawCompound> for Compound {
    type Error = TypeError;

    fn try_from(raw: RawCompound) -> TypeResult<Self> {
        Compound::new(raw.fields).with_pack(raw.pack)
    }
}

impl Compound {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields, pack: None }
    }

    /// Forward declaration with no known members
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the packing alignment; must be a power of two
    pub fn with_pack(mut self, pack: Option<u32>) -> TypeResult<Self> {
        if let Some(p) = pack {
            if !p.is_power_of_two() {
                return Err(TypeError::InvalidPack(p));
            }
        }
        self.pack = pack;
        Ok(self)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn pack(&self) -> Option<u32> {
        self.pack
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.as_deref() == Some(name))
    }

    /// Render as a C definition, e.g. `struct point {\n    int x;\n}`
    pub fn c_repr(&self, keyword: &str, name: &str) -> String {
        let mut out = format!("{keyword} {name}");
        if self.fields.is_empty() {
            return out;
        }
        out.push_str(" {\n");
        for field in &self.fields {
            out.push_str("    ");
            out.push_str(&field.ty.c_repr(field.name.as_deref()));
            if let Some(bits) = field.bit_width {
                out.push_str(&format!(" : {bits}"));
            }
            if let Some(default) = &field.default {
                out.push_str(&format!(" = {default}"));
            }
            out.push_str(";\n");
        }
        out.push('}');
        out
    }
}

/// Enum members and their resolved values, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    members: IndexMap<SmolStr, i64>,
}

impl EnumDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<SmolStr>, value: i64) {
        self.members.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.members.get(name).copied()
    }

    /// Value the next member takes when none is given
    pub fn next_value(&self) -> i64 {
        self.members.last().map_or(0, |(_, v)| v.wrapping_add(1))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.members.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn c_repr(&self, name: &str) -> String {
        let mut out = format!("enum {name}");
        if self.members.is_empty() {
            return out;
        }
        out.push_str(" {\n");
        for (member, value) in &self.members {
            out.push_str(&format!("    {member} = {value},\n"));
        }
        out.push('}');
        out
    }
}

impl<S: Into<SmolStr>> FromIterator<(S, i64)> for EnumDef {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut def = EnumDef::new();
        for (name, value) in iter {
            def.insert(name, value);
        }
        def
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_must_be_power_of_two() {
        assert_eq!(Compound::empty().with_pack(Some(4)).unwrap().pack(), Some(4));
        assert_eq!(Compound::empty().with_pack(None).unwrap().pack(), None);
        assert_eq!(Compound::empty().with_pack(Some(3)), Err(TypeError::InvalidPack(3)));
    }

    #[test]
    fn test_decoding_checks_pack() {
        let packed = Compound::new(vec![Field::new("c", Type::new("char"))])
            .with_pack(Some(2))
            .unwrap();
        let json = serde_json::to_string(&packed).unwrap();
        assert_eq!(serde_json::from_str::<Compound>(&json).unwrap(), packed);

        let odd = json.replace(r#""pack":2"#, r#""pack":6"#);
        assert_ne!(odd, json);
        assert!(serde_json::from_str::<Compound>(&odd).is_err());
    }

    #[test]
    fn test_compound_render() {
        let compound = Compound::new(vec![
            Field::new("flags", Type::new("unsigned int")).with_bits(3),
            Field::new("next", Type::new("struct node").pointer()),
            Field::anonymous(Type::new("union anon_union0")),
        ]);
        insta::assert_snapshot!(compound.c_repr("struct", "node"), @r###"
        struct node {
            unsigned int flags : 3;
            struct node *next;
            union anon_union0;
        }
        "###);
        assert!(compound.field("next").is_some());
        assert!(compound.field("missing").is_none());
    }

    #[test]
    fn test_enum_next_value() {
        let mut def = EnumDef::new();
        assert_eq!(def.next_value(), 0);
        def.insert("RED", 0);
        def.insert("GREEN", 5);
        assert_eq!(def.next_value(), 6);
        assert_eq!(def.get("GREEN"), Some(5));
        assert_eq!(def.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec!["RED", "GREEN"]);
    }
}
