//! C Header Preprocessor
//!
//! Turns raw header text into declaration text for the grammar, without a
//! compilation environment.
//!
//! ## Pipeline
//!
//! 1. [`normalize`] strips comments and joins continued lines.
//! 2. [`Preprocessor::run`] walks the text line by line, executing
//!    directives against the [`Registry`] macro tables and expanding macros
//!    in active code lines.
//!
//! Every input line produces exactly one output line (directives and
//! excluded code become empty lines), so line numbers stay valid for the
//! packing lookup done by the grammar.
//!
//! ## Failure policy
//!
//! Preprocessing never fails. Macro calls that cannot be expanded stay as
//! written, unevaluable `#if` conditions count as false and stray
//! `#endif`/`#pragma pack(pop)` lines are ignored. Each such event is
//! recorded as a [`PreprocessError`] in the output diagnostics.

mod condition;
mod directive;
mod error;
mod expand;
mod normalize;
mod pack;

pub use error::PreprocessError;
pub use expand::EXPANSION_LIMIT;
pub use normalize::{join_continuations, normalize, strip_comments};
pub use pack::PackingLog;

use crate::condition::ConditionStack;
use crate::directive::{leading_name, parse_define, parse_directive, resolve_defined, MacroDefinition};
use crate::expand::MacroExpander;
use crate::pack::{parse_pack, PackIssue, PackStack};
use cheader_registry::{Category, Definition, Registry};
use cheader_types::{eval_str, FnMacro, Macro, Value};
use smol_str::SmolStr;
use tracing::{debug, warn};

/// Result of preprocessing one file
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessOutput {
    /// Expanded text, one line per input line
    pub text: String,
    pub packing: PackingLog,
    pub diagnostics: Vec<PreprocessError>,
}

/// Preprocessing state for one file
pub struct Preprocessor<'r> {
    registry: &'r mut Registry,
    file: SmolStr,
    conditions: ConditionStack,
    pack: PackStack,
    packing: PackingLog,
    diagnostics: Vec<PreprocessError>,
}

impl<'r> Preprocessor<'r> {
    /// Macros defined while running are recorded in `registry` under `file`
    pub fn new(registry: &'r mut Registry, file: impl Into<SmolStr>) -> Self {
        Self {
            registry,
            file: file.into(),
            conditions: ConditionStack::new(),
            pack: PackStack::new(),
            packing: PackingLog::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Preprocess already normalized text
    pub fn run(mut self, text: &str) -> PreprocessOutput {
        let mut lines = Vec::new();
        for (line_no, line) in text.split('\n').enumerate() {
            let out = match parse_directive(line) {
                Some(directive) => {
                    self.directive(directive.keyword, directive.rest, line_no);
                    String::new()
                }
                None if self.conditions.is_active() => {
                    MacroExpander::new(self.registry).expand(line, line_no, &mut self.diagnostics)
                }
                None => String::new(),
            };
            lines.push(out);
        }

        if self.conditions.depth() > 0 {
            let count = self.conditions.depth();
            warn!(file = %self.file, count, "unterminated conditional block");
            self.diagnostics
                .push(PreprocessError::UnterminatedConditional { count });
        }

        PreprocessOutput {
            text: lines.join("\n"),
            packing: self.packing,
            diagnostics: self.diagnostics,
        }
    }

    fn directive(&mut self, keyword: &str, rest: &str, line: usize) {
        match keyword {
            "if" => self.push_if(rest.to_string(), line),
            "ifdef" => self.push_if(format!("defined {rest}"), line),
            "ifndef" => self.push_if(format!("!defined {rest}"), line),
            "elif" => {
                let registry = &*self.registry;
                let diagnostics = &mut self.diagnostics;
                let result = self
                    .conditions
                    .elif(|| eval_condition(registry, rest, line, diagnostics));
                if result.is_err() {
                    self.unbalanced(keyword, line);
                }
            }
            "else" => {
                if self.conditions.else_branch().is_err() {
                    self.unbalanced(keyword, line);
                }
            }
            "endif" => {
                if self.conditions.endif().is_err() {
                    self.unbalanced(keyword, line);
                }
            }
            _ if !self.conditions.is_active() => {}
            "define" => self.define(rest, line),
            "undef" => match leading_name(rest) {
                Some(name) => {
                    debug!(line, name, "undef");
                    undefine(self.registry, name);
                }
                None => self.report(PreprocessError::malformed(line, keyword, rest)),
            },
            "pragma" => self.pragma(rest, line),
            _ => debug!(line, directive = keyword, "ignored directive"),
        }
    }

    fn push_if(&mut self, condition: String, line: usize) {
        let registry = &*self.registry;
        let diagnostics = &mut self.diagnostics;
        self.conditions
            .push_if(|| eval_condition(registry, &condition, line, diagnostics));
    }

    fn define(&mut self, rest: &str, line: usize) {
        let Some(definition) = parse_define(rest) else {
            self.report(PreprocessError::malformed(line, "define", rest));
            return;
        };
        match definition {
            MacroDefinition::Object { name, body } => {
                define_object(
                    self.registry,
                    Some(self.file.as_str()),
                    &name,
                    &body,
                    line,
                    &mut self.diagnostics,
                );
            }
            MacroDefinition::Function {
                name,
                params,
                variadic,
                body,
            } => {
                debug!(line, %name, ?params, "function macro");
                undefine(self.registry, &name);
                let m = FnMacro::new(params, body, variadic);
                self.registry
                    .insert(Some(self.file.as_str()), name, Definition::FnMacro(m));
            }
        }
    }

    fn pragma(&mut self, rest: &str, line: usize) {
        let applied = match parse_pack(rest) {
            None => {
                debug!(line, pragma = rest.trim(), "ignored pragma");
                return;
            }
            Some(parsed) => parsed.and_then(|pragma| self.pack.apply(&pragma)),
        };
        match applied {
            Ok(pack) => {
                debug!(line, ?pack, "packing changed");
                self.packing.record(line, pack);
            }
            Err(PackIssue::Underflow) => self.report(PreprocessError::PackUnderflow { line }),
            Err(PackIssue::InvalidValue(value)) => {
                self.report(PreprocessError::InvalidPack { line, value })
            }
        }
    }

    fn unbalanced(&mut self, directive: &str, line: usize) {
        self.report(PreprocessError::UnbalancedConditional {
            line,
            directive: SmolStr::new(directive),
        });
    }

    fn report(&mut self, error: PreprocessError) {
        warn!(file = %self.file, "{error}");
        self.diagnostics.push(error);
    }
}

/// Normalize and preprocess one file's raw text
pub fn preprocess(registry: &mut Registry, file: &str, raw: &str) -> PreprocessOutput {
    Preprocessor::new(registry, file).run(&normalize(raw))
}

/// Define an object macro outside any file, as if by `#define name body`.
/// Used for predefined macros.
pub fn predefine(registry: &mut Registry, name: &str, body: &str) -> Vec<PreprocessError> {
    let mut diagnostics = Vec::new();
    define_object(registry, None, name, body, 0, &mut diagnostics);
    diagnostics
}

/// Register an object macro. The body is expanded against the macros
/// defined so far and, when it is a constant expression, its value is
/// recorded in `values`.
fn define_object(
    registry: &mut Registry,
    file: Option<&str>,
    name: &str,
    body: &str,
    line: usize,
    diagnostics: &mut Vec<PreprocessError>,
) {
    let hidden = [SmolStr::new(name)];
    let expanded = MacroExpander::new(registry).expand_hiding(body, line, &hidden, diagnostics);
    undefine(registry, name);

    match eval_str(&expanded, &*registry) {
        Ok(value) => {
            debug!(line, name, %value, "macro value");
            registry.insert(file, name, Definition::Value(value));
        }
        Err(err) => debug!(line, name, body = %expanded, error = %err, "macro has no constant value"),
    }
    registry.insert(file, name, Definition::Macro(Macro::new(expanded)));
}

fn undefine(registry: &mut Registry, name: &str) {
    for category in [Category::Macros, Category::FnMacros, Category::Values] {
        registry.remove(category, name);
    }
}

/// Evaluate an `#if`/`#elif` condition. `defined` is resolved before
/// expansion and identifiers left afterwards count as 0.
fn eval_condition(
    registry: &Registry,
    condition: &str,
    line: usize,
    diagnostics: &mut Vec<PreprocessError>,
) -> bool {
    let resolved = resolve_defined(condition, |name| registry.is_macro(name));
    let expanded = MacroExpander::new(registry).expand(&resolved, line, diagnostics);
    let zero = |_: &str| Some(Value::Int(0));
    match eval_str(&expanded, &zero) {
        Ok(value) => {
            let taken = value.is_truthy();
            debug!(line, condition = condition.trim(), taken, "conditional");
            taken
        }
        Err(source) => {
            debug!(line, condition = condition.trim(), error = %source, "condition treated as false");
            diagnostics.push(PreprocessError::ConditionEval {
                line,
                expr: condition.trim().to_string(),
                source,
            });
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(text: &str) -> (Registry, PreprocessOutput) {
        let mut registry = Registry::new();
        let out = preprocess(&mut registry, "test.h", text);
        (registry, out)
    }

    #[test]
    fn test_line_count_preserved() {
        let text = "#define A 1\n#if A\nint a;\n#else\nint b;\n#endif\n";
        let (_, out) = run(text);
        assert_eq!(out.text, "\n\nint a;\n\n\n\n");
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_macro_values() {
        let (registry, out) = run("#define M 1\n#define N M+1\nint x = N;");
        assert_eq!(registry.values()["N"], Value::Int(2));
        assert_eq!(registry.macros()["N"].content(), "1+1");
        assert_eq!(out.text, "\n\nint x = 1+1;");
    }

    #[test]
    fn test_ifdef_else() {
        let (_, out) = run("#ifdef X\nint a;\n#else\nint b;\n#endif");
        assert_eq!(out.text, "\n\n\nint b;\n");
    }

    #[test]
    fn test_defined_sees_function_macros() {
        let (_, out) = run("#define F(x) x\n#if defined(F) && !defined G\nyes\n#endif");
        assert_eq!(out.text, "\n\nyes\n");
    }

    #[test]
    fn test_inactive_defines_ignored() {
        let (registry, _) = run("#if 0\n#define A 1\n#endif\n#ifndef A\n#define B 2\n#endif");
        assert!(!registry.is_macro("A"));
        assert_eq!(registry.values()["B"], Value::Int(2));
    }

    #[test]
    fn test_undef_drops_value() {
        let (registry, _) = run("#define A 3\n#undef A\n");
        assert!(!registry.is_macro("A"));
        assert!(registry.values().get("A").is_none());
    }

    #[test]
    fn test_unevaluable_condition_is_false() {
        let (_, out) = run("#if sizeof(int) == 4\nint a;\n#endif");
        assert_eq!(out.text, "\n\n");
        assert!(matches!(
            out.diagnostics.as_slice(),
            [PreprocessError::ConditionEval { line: 0, .. }]
        ));
    }

    #[test]
    fn test_unbalanced_directives_tolerated() {
        let (_, out) = run("#endif\nint a;\n#if 1\n");
        assert_eq!(out.text, "\nint a;\n\n");
        assert_eq!(
            out.diagnostics,
            vec![
                PreprocessError::UnbalancedConditional {
                    line: 0,
                    directive: "endif".into()
                },
                PreprocessError::UnterminatedConditional { count: 1 },
            ]
        );
    }

    #[test]
    fn test_pack_records() {
        let (_, out) = run("#pragma pack(push, 4)\nstruct S { char c; };\n#pragma pack(pop)\n#pragma once");
        assert_eq!(out.packing.entries(), &[(0, None), (0, Some(4)), (2, None)]);
        assert_eq!(out.packing.packing_at(1), Some(4));
        assert_eq!(out.packing.packing_at(3), None);
    }

    #[test]
    fn test_predefine() {
        let mut registry = Registry::new();
        assert!(predefine(&mut registry, "WIN32", "1").is_empty());
        assert_eq!(registry.values()["WIN32"], Value::Int(1));
        assert_eq!(registry.find_file_of("WIN32"), None);
    }
}
