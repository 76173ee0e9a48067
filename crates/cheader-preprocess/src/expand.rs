//! Macro expansion over raw text.
//!
//! Expansion splices a replacement into the buffer and rescans from the
//! insertion point, so macros that expand to other macros (including a
//! bare alias of a function macro followed by its argument list) resolve
//! naturally. A macro is hidden while the scan is inside its own
//! replacement, which stops self-referential definitions from looping.

use crate::error::PreprocessError;
use cheader_lexer::{scan_words, Segment};
use cheader_registry::Registry;
use cheader_types::{FnMacro, Macro, MacroError};
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::ops::Range;
use tracing::debug;

/// Maximum number of macro replacements in one `expand` call
pub const EXPANSION_LIMIT: usize = 10_000;

/// A macro hidden while more than `tail` bytes remain after the scan
/// position
#[derive(Debug, Clone)]
struct Hidden {
    name: SmolStr,
    tail: usize,
}

pub(crate) struct MacroExpander<'a> {
    macros: &'a IndexMap<SmolStr, Macro>,
    fnmacros: &'a IndexMap<SmolStr, FnMacro>,
}

impl<'a> MacroExpander<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            macros: registry.macros(),
            fnmacros: registry.fnmacros(),
        }
    }

    /// Expand every macro in `text`. Failed function-macro calls stay as
    /// written and are recorded in `diagnostics`.
    pub fn expand(&self, text: &str, line: usize, diagnostics: &mut Vec<PreprocessError>) -> String {
        self.expand_hiding(text, line, &[], diagnostics)
    }

    /// Expand with `hidden` never expanded
    pub fn expand_hiding(
        &self,
        text: &str,
        line: usize,
        hidden: &[SmolStr],
        diagnostics: &mut Vec<PreprocessError>,
    ) -> String {
        let mut budget = EXPANSION_LIMIT;
        let out = self.expand_inner(text, line, hidden, &mut budget, diagnostics);
        if budget == 0 {
            debug!(line, "macro expansion limit reached");
            diagnostics.push(PreprocessError::ExpansionLimit { line });
        }
        out
    }

    fn expand_inner(
        &self,
        text: &str,
        line: usize,
        seeds: &[SmolStr],
        budget: &mut usize,
        diagnostics: &mut Vec<PreprocessError>,
    ) -> String {
        if self.macros.is_empty() && self.fnmacros.is_empty() {
            return text.to_string();
        }

        let mut buf = text.to_string();
        let mut hidden: Vec<Hidden> = seeds
            .iter()
            .map(|name| Hidden {
                name: name.clone(),
                tail: 0,
            })
            .collect();
        let mut pos = 0;

        while let Some(ident) = next_ident(&buf, pos) {
            if *budget == 0 {
                break;
            }
            let remaining = buf.len() - ident.start;
            hidden.retain(|h| remaining > h.tail);

            let name = &buf[ident.clone()];
            if hidden.iter().any(|h| h.name == name) {
                pos = ident.end;
                continue;
            }

            let replacement = if let Some(m) = self.macros.get(name) {
                Some((m.content().to_string(), ident.end))
            } else if let Some(m) = self.fnmacros.get(name) {
                self.expand_call(name, m, &buf, ident.end, line, &hidden, budget, diagnostics)
            } else {
                None
            };

            let Some((replacement, end)) = replacement else {
                pos = ident.end;
                continue;
            };
            // argument expansion may have spent the rest of the budget
            if *budget == 0 {
                break;
            }

            let name = SmolStr::new(name);
            buf.replace_range(ident.start..end, &replacement);
            *budget -= 1;

            let tail = buf.len() - (ident.start + replacement.len());
            for h in &mut hidden {
                h.tail = h.tail.min(tail);
            }
            hidden.push(Hidden { name, tail });
            pos = ident.start;
        }
        buf
    }

    /// Expand a function macro call whose name ends at `after`. Returns the
    /// replacement and the end of the call, or `None` to leave the name.
    #[allow(clippy::too_many_arguments)]
    fn expand_call(
        &self,
        name: &str,
        m: &FnMacro,
        buf: &str,
        after: usize,
        line: usize,
        hidden: &[Hidden],
        budget: &mut usize,
        diagnostics: &mut Vec<PreprocessError>,
    ) -> Option<(String, usize)> {
        let (args, end) = match split_arguments(buf, after)? {
            Ok(found) => found,
            Err(source) => {
                record_failure(name, line, source, diagnostics);
                return None;
            }
        };

        let seeds: Vec<SmolStr> = hidden.iter().map(|h| h.name.clone()).collect();
        let args: Vec<String> = args
            .iter()
            .map(|arg| self.expand_inner(arg, line, &seeds, budget, diagnostics))
            .collect();

        match m.substitute(&args) {
            Ok(text) => Some((text, end)),
            Err(source) => {
                record_failure(name, line, source, diagnostics);
                None
            }
        }
    }
}

fn record_failure(name: &str, line: usize, source: MacroError, diagnostics: &mut Vec<PreprocessError>) {
    debug!(line, name, error = %source, "function macro left unexpanded");
    diagnostics.push(PreprocessError::MacroExpansion {
        line,
        name: SmolStr::new(name),
        source,
    });
}

/// First identifier starting at or after `pos`
fn next_ident(buf: &str, pos: usize) -> Option<Range<usize>> {
    scan_words(&buf[pos..])
        .find(|(segment, _)| *segment == Segment::Ident)
        .map(|(_, range)| range.start + pos..range.end + pos)
}

/// Arguments of a call whose `(` follows `after` (whitespace allowed).
///
/// Returns `None` when no `(` follows, so the name is not a call. Commas
/// split arguments only at the outermost parenthesis level; quoted literals
/// are opaque.
fn split_arguments(buf: &str, after: usize) -> Option<Result<(Vec<String>, usize), MacroError>> {
    let rest = &buf[after..];
    let open = rest.len() - rest.trim_start().len();
    if !rest[open..].starts_with('(') {
        return None;
    }

    let body_start = after + open + 1;
    let mut args = Vec::new();
    let mut depth = 1usize;
    let mut arg_start = body_start;
    for (segment, range) in scan_words(&buf[body_start..]) {
        if segment != Segment::Other {
            continue;
        }
        let at = body_start + range.start;
        match &buf[at..body_start + range.end] {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    args.push(buf[arg_start..at].trim().to_string());
                    return Some(Ok((args, at + 1)));
                }
            }
            "," if depth == 1 => {
                args.push(buf[arg_start..at].trim().to_string());
                arg_start = at + 1;
            }
            _ => {}
        }
    }
    Some(Err(MacroError::UnbalancedArguments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cheader_registry::Definition;
    use pretty_assertions::assert_eq;

    fn registry(defs: &[(&str, &str)], fns: &[(&str, &[&str], &str)]) -> Registry {
        let mut registry = Registry::new();
        for (name, body) in defs {
            registry.insert(None, *name, Definition::Macro(Macro::new(*body)));
        }
        for (name, params, body) in fns {
            let params = params.iter().map(|p| SmolStr::new(p)).collect();
            registry.insert(None, *name, Definition::FnMacro(FnMacro::new(params, *body, false)));
        }
        registry
    }

    fn expand(registry: &Registry, text: &str) -> (String, Vec<PreprocessError>) {
        let mut diagnostics = Vec::new();
        let out = MacroExpander::new(registry).expand(text, 0, &mut diagnostics);
        (out, diagnostics)
    }

    #[test]
    fn test_object_macros_rescan() {
        let registry = registry(&[("A", "B + 1"), ("B", "2")], &[]);
        assert_eq!(expand(&registry, "int x = A;").0, "int x = 2 + 1;");
    }

    #[test]
    fn test_quoted_text_untouched() {
        let registry = registry(&[("A", "1")], &[]);
        assert_eq!(expand(&registry, r#"f("A", 'A', A)"#).0, r#"f("A", 'A', 1)"#);
    }

    #[test]
    fn test_self_reference_terminates() {
        let registry = registry(&[("X", "X + 1"), ("P", "Q"), ("Q", "P")], &[]);
        let (out, diagnostics) = expand(&registry, "X P");
        assert_eq!(out, "X + 1 P");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_function_macro_call() {
        let registry = registry(
            &[("WIDTH", "4")],
            &[("MUL", &["a", "b"], "((a) * (b))")],
        );
        assert_eq!(
            expand(&registry, "int v = MUL(WIDTH, f(1, 2));").0,
            "int v = ((4) * (f(1, 2)));"
        );
    }

    #[test]
    fn test_nested_calls_of_same_macro() {
        let registry = registry(&[], &[("INC", &["x"], "x+1")]);
        assert_eq!(expand(&registry, "INC(INC(0))").0, "0+1+1");
    }

    #[test]
    fn test_alias_of_function_macro() {
        let registry = registry(&[("ALIAS", "TWICE")], &[("TWICE", &["x"], "x x")]);
        assert_eq!(expand(&registry, "ALIAS(y)").0, "y y");
    }

    #[test]
    fn test_name_without_call_left_alone() {
        let registry = registry(&[], &[("F", &["x"], "x")]);
        let (out, diagnostics) = expand(&registry, "int F;");
        assert_eq!(out, "int F;");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_budget_spent_inside_arguments() {
        let registry = registry(&[("Z", "1")], &[("F", &["x"], "x")]);
        let text = format!("F({})", "Z ".repeat(EXPANSION_LIMIT + 1));
        let (out, diagnostics) = expand(&registry, &text);

        assert!(out.starts_with("F("));
        assert_eq!(diagnostics, vec![PreprocessError::ExpansionLimit { line: 0 }]);
    }

    #[test]
    fn test_failed_calls_recorded() {
        let registry = registry(&[], &[("F", &["x", "y"], "x")]);
        let (out, diagnostics) = expand(&registry, "F(1) F(2");
        assert_eq!(out, "F(1) F(2");
        assert_eq!(
            diagnostics,
            vec![
                PreprocessError::MacroExpansion {
                    line: 0,
                    name: "F".into(),
                    source: MacroError::ArgumentCount { expected: 2, found: 1 },
                },
                PreprocessError::MacroExpansion {
                    line: 0,
                    name: "F".into(),
                    source: MacroError::UnbalancedArguments,
                },
            ]
        );
    }
}
