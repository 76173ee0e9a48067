//! Whole-file preprocessing of realistic header fragments.

use cheader_preprocess::{preprocess, PreprocessError};
use cheader_registry::Registry;
use cheader_types::Value;
use pretty_assertions::assert_eq;

const MACROS_H: &str = r#"
/* export helpers */
#define API __declspec(dllexport)
#define EXPORT(type) API type   // decorated return type
#define SETBITS(x, y) ((x) | \
(y))
#define MAKEINTRESOURCEA(i) ((char *)((unsigned short)(i)))
#define MAKEINTRESOURCE MAKEINTRESOURCEA
#define LOG(fmt, ...) log_message(fmt, __VA_ARGS__)
#define FLAGS SETBITS(1, 4)
#define NAME "widget // not a comment"

EXPORT(int) open_widget(const char *name);
int flags = FLAGS;
char *res = MAKEINTRESOURCE(101);
LOG("%d %s", 1, NAME);
"#;

#[test]
fn test_function_macros_expand() {
    let mut registry = Registry::new();
    let out = preprocess(&mut registry, "macros.h", MACROS_H);
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    insta::assert_snapshot!(out.text.trim(), @r###"
    __declspec(dllexport) int open_widget(const char *name);
    int flags = ((1) | (4));
    char *res = ((char *)((unsigned short)(101)));
    log_message("%d %s", 1, "widget // not a comment");
    "###);

    assert_eq!(registry.values()["FLAGS"], Value::Int(5));
    assert_eq!(
        registry.values()["NAME"],
        Value::Str("widget // not a comment".to_string())
    );
    assert!(registry.values().get("API").is_none());
}

#[test]
fn test_line_numbers_survive_continuations() {
    let mut registry = Registry::new();
    let out = preprocess(&mut registry, "macros.h", MACROS_H);
    assert_eq!(out.text.split('\n').count(), MACROS_H.split('\n').count());
    let line = out
        .text
        .split('\n')
        .position(|l| l.starts_with("int flags"))
        .unwrap();
    let source_line = MACROS_H
        .split('\n')
        .position(|l| l.starts_with("int flags"))
        .unwrap();
    assert_eq!(line, source_line);
}

const CONDITIONS_H: &str = "\
#define VERSION 3
#if VERSION >= 3 && defined(VERSION)
#  if VERSION == 4
int v4;
#  elif VERSION == 3
int v3;
#  else
int older;
#  endif
#elif UNKNOWN_THING
int never;
#else
int fallback;
#endif
#ifndef VERSION
int unversioned;
#endif
";

#[test]
fn test_nested_conditionals() {
    let mut registry = Registry::new();
    let out = preprocess(&mut registry, "cond.h", CONDITIONS_H);
    let code: Vec<&str> = out.text.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(code, vec!["int v3;"]);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_packing_fixture() {
    let text = "\
#pragma pack(push, 4)
struct S { char c; int i; };
#pragma pack(pop)
struct T { char c; };
#pragma pack(push, r1, 2)
#pragma pack(push, 8)
#pragma pack(pop, r1)
#pragma pack(5)
";
    let mut registry = Registry::new();
    let out = preprocess(&mut registry, "pack.h", text);
    assert_eq!(out.packing.packing_at(1), Some(4));
    assert_eq!(out.packing.packing_at(3), None);
    assert_eq!(out.packing.packing_at(5), Some(8));
    assert_eq!(out.packing.packing_at(6), None);
    assert_eq!(
        out.diagnostics,
        vec![PreprocessError::InvalidPack {
            line: 7,
            value: "5".to_string()
        }]
    );
}

#[test]
fn test_macros_recorded_per_file() {
    let mut registry = Registry::new();
    preprocess(&mut registry, "a.h", "#define A 1");
    preprocess(&mut registry, "b.h", "#define B A + 1\n#undef A");
    assert_eq!(registry.values()["B"], Value::Int(2));
    assert_eq!(registry.find_file_of("B"), Some("b.h"));
    assert!(!registry.is_macro("A"));
    assert!(registry.file_view("a.h").is_some_and(|d| d.macros.is_empty()));
}
