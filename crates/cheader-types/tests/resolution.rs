//! Typedef resolution over realistic typedef tables.

use cheader_types::{FunctionSig, Modifier, Param, Type, TypeError, TypeVocabulary};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use smol_str::SmolStr;

fn typedefs() -> IndexMap<SmolStr, Type> {
    let mut table = IndexMap::new();
    table.insert("typeChar".into(), Type::new("char"));
    table.insert("typeInt".into(), Type::new("int"));
    table.insert("typeIntPtr".into(), Type::new("int").pointer());
    table.insert("typeIntArr".into(), Type::new("int").array(Some(10)));
    table.insert("typeTypeInt".into(), Type::new("typeInt"));
    table.insert("ULONG".into(), Type::new("unsigned long"));
    table.insert("PULONG".into(), Type::new("ULONG").pointer());
    table.insert(
        "callback_t".into(),
        Type::new("void")
            .function(FunctionSig::new(vec![Param::new(Some("data"), Type::new("PULONG"))]))
            .pointer(),
    );
    table.insert("struct_ptr".into(), Type::new("struct node").pointer());
    table
}

fn assert_invariant(ty: &Type) {
    assert_eq!(ty.qualifiers().len(), ty.declarators().len() + 1, "{ty:?}");
}

#[test]
fn every_acyclic_typedef_resolves_to_a_fundamental_type() {
    let vocab = TypeVocabulary::standard();
    let table = typedefs();
    for name in table.keys() {
        let resolved = Type::new(name.as_str()).resolve(&table, &vocab).unwrap();
        assert!(resolved.is_fundamental(&vocab), "{name} -> {resolved}");
        assert_invariant(&resolved);
    }
}

#[test]
fn nested_typedef_modifiers_are_spliced_innermost_first() {
    let vocab = TypeVocabulary::standard();
    let table = typedefs();
    let resolved = Type::new("typeIntPtr").array(Some(5)).resolve(&table, &vocab).unwrap();
    assert_eq!(resolved.c_repr(Some("x")), "int *x[5]");

    let resolved = Type::new("PULONG").pointer().resolve(&table, &vocab).unwrap();
    assert_eq!(resolved, Type::new("unsigned long").pointer().pointer());
}

#[test]
fn function_parameters_are_left_unresolved() {
    let vocab = TypeVocabulary::standard();
    let table = typedefs();
    let resolved = Type::new("callback_t").resolve(&table, &vocab).unwrap();
    assert_eq!(resolved.c_repr(Some("cb")), "void (*cb)(PULONG data)");
    assert!(matches!(resolved.declarators()[0], Modifier::Function(_)));
}

#[test]
fn tagged_types_stop_resolution() {
    let vocab = TypeVocabulary::standard();
    let resolved = Type::new("struct_ptr").resolve(&typedefs(), &vocab).unwrap();
    assert_eq!(resolved.base_name(), "struct node");
}

#[test]
fn self_reference_is_reported_as_a_cycle() {
    let vocab = TypeVocabulary::standard();
    let mut table = typedefs();
    table.insert("loop_t".into(), Type::new("loop_t").pointer());
    let err = Type::new("loop_t").resolve(&table, &vocab).unwrap_err();
    assert_eq!(
        err,
        TypeError::Recursive {
            chain: vec!["loop_t".into(), "loop_t".into()]
        }
    );
}
