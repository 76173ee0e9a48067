//! Object-like and function-like macro definitions.

use crate::error::MacroError;
use cheader_lexer::identifiers;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Name bound to the variable arguments of a `...` macro
pub const VA_ARGS: &str = "__VA_ARGS__";

/// An object-like macro: `#define NAME text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    content: String,
}

impl Macro {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Replacement text split at parameter occurrences.
///
/// `pieces` holds the literal text between occurrences and `slots[i]` the
/// parameter index substituted between `pieces[i]` and `pieces[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Template {
    pieces: Vec<String>,
    slots: Vec<usize>,
}

impl Template {
    fn compile(content: &str, params: &[SmolStr]) -> Self {
        let index: FxHashMap<&str, usize> = params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        let mut pieces = Vec::new();
        let mut slots = Vec::new();
        let mut last = 0;
        for range in identifiers(content) {
            if let Some(&slot) = index.get(&content[range.clone()]) {
                pieces.push(content[last..range.start].to_string());
                slots.push(slot);
                last = range.end;
            }
        }
        pieces.push(content[last..].to_string());

        Self { pieces, slots }
    }
}

/// A function-like macro: `#define NAME(a, b) text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FnMacro {
    params: Vec<SmolStr>,
    variadic: bool,
    content: String,
    template: Template,
}

impl FnMacro {
    /// Compile `content` against `params`. For a variadic macro the last
    /// parameter receives the trailing arguments.
    pub fn new(params: Vec<SmolStr>, content: impl Into<String>, variadic: bool) -> Self {
        let content = content.into();
        let template = Template::compile(&content, &params);
        Self {
            params,
            variadic,
            content,
            template,
        }
    }

    pub fn params(&self) -> &[SmolStr] {
        &self.params
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Substitute already-expanded arguments into the template
    pub fn substitute(&self, args: &[String]) -> Result<String, MacroError> {
        let args = self.bind(args)?;

        let mut out = String::with_capacity(self.content.len());
        for (piece, &slot) in self.template.pieces.iter().zip(&self.template.slots) {
            out.push_str(piece);
            let arg = args.get(slot).ok_or(MacroError::PlaceholderOutOfRange {
                index: slot,
                available: args.len(),
            })?;
            out.push_str(arg);
        }
        if let Some(tail) = self.template.pieces.last() {
            out.push_str(tail);
        }
        Ok(out)
    }

    /// Match call arguments to parameters
    fn bind(&self, args: &[String]) -> Result<Vec<String>, MacroError> {
        let expected = self.params.len();
        // `F()` passes one empty argument
        let args: &[String] = if expected == 0 && args.len() == 1 && args[0].trim().is_empty() {
            &[]
        } else {
            args
        };

        if self.variadic && expected > 0 {
            let fixed = expected - 1;
            if args.len() < fixed {
                return Err(MacroError::ArgumentCount {
                    expected,
                    found: args.len(),
                });
            }
            let mut bound: Vec<String> = args[..fixed].to_vec();
            let rest: Vec<&str> = args[fixed..].iter().map(|a| a.trim()).collect();
            bound.push(rest.join(", "));
            return Ok(bound);
        }

        if args.len() != expected {
            return Err(MacroError::ArgumentCount {
                expected,
                found: args.len(),
            });
        }
        Ok(args.to_vec())
    }
}
