//! Directive line recognition and `#define` parsing.

use cheader_lexer::{scan_words, Segment};
use cheader_types::VA_ARGS;
use smol_str::SmolStr;

/// A `#keyword rest` line. `keyword` is empty for null directives
/// (`#` alone, `# 12 "file.h"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Directive<'a> {
    pub keyword: &'a str,
    pub rest: &'a str,
}

pub(crate) fn parse_directive(line: &str) -> Option<Directive<'_>> {
    let body = line.trim_start().strip_prefix('#')?.trim_start();
    let end = body
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(body.len());
    Some(Directive {
        keyword: &body[..end],
        rest: &body[end..],
    })
}

/// Body of a `#define`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MacroDefinition {
    Object {
        name: SmolStr,
        body: String,
    },
    Function {
        name: SmolStr,
        params: Vec<SmolStr>,
        variadic: bool,
        body: String,
    },
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Split a leading identifier off `text`
fn take_ident(text: &str) -> Option<(&str, &str)> {
    if !text.starts_with(is_ident_start) {
        return None;
    }
    let end = text.find(|c: char| !is_ident_char(c)).unwrap_or(text.len());
    Some(text.split_at(end))
}

/// Parse the text after `#define`. A parameter list only counts when the
/// `(` directly follows the name.
pub(crate) fn parse_define(rest: &str) -> Option<MacroDefinition> {
    let (name, after) = take_ident(rest.trim_start())?;
    let name = SmolStr::new(name);

    let Some(list) = after.strip_prefix('(') else {
        return Some(MacroDefinition::Object {
            name,
            body: after.trim().to_string(),
        });
    };
    let close = list.find(')')?;
    let inner = list[..close].trim();
    let mut params = Vec::new();
    let mut variadic = false;
    if !inner.is_empty() {
        for param in inner.split(',').map(str::trim) {
            if variadic {
                // `...` must be last
                return None;
            }
            let ident = if param == "..." {
                variadic = true;
                VA_ARGS
            } else if let Some(named) = param.strip_suffix("...") {
                variadic = true;
                named.trim_end()
            } else {
                param
            };
            match take_ident(ident) {
                Some((name, "")) => params.push(SmolStr::new(name)),
                _ => return None,
            }
        }
    }
    Some(MacroDefinition::Function {
        name,
        params,
        variadic,
        body: list[close + 1..].trim().to_string(),
    })
}

/// Name operand of `#undef`, `#ifdef` and `#ifndef`
pub(crate) fn leading_name(rest: &str) -> Option<&str> {
    take_ident(rest.trim_start()).map(|(name, _)| name)
}

/// Replace every `defined X` and `defined(X)` with `1` or `0`
pub(crate) fn resolve_defined(text: &str, is_defined: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (segment, range) in scan_words(text) {
        if segment != Segment::Ident || range.start < last || &text[range.clone()] != "defined" {
            continue;
        }
        let Some((name, consumed)) = defined_operand(&text[range.end..]) else {
            continue;
        };
        out.push_str(&text[last..range.start]);
        out.push_str(if is_defined(name) { "1" } else { "0" });
        last = range.end + consumed;
    }
    out.push_str(&text[last..]);
    out
}

/// Operand of `defined` and the byte length it spans
fn defined_operand(text: &str) -> Option<(&str, usize)> {
    let trimmed = text.trim_start();
    let lead = text.len() - trimmed.len();
    if let Some(inner) = trimmed.strip_prefix('(') {
        let name_part = inner.trim_start();
        let (name, after) = take_ident(name_part)?;
        let after_trim = after.trim_start();
        after_trim.strip_prefix(')')?;
        let consumed = text.len() - after_trim.len() + 1;
        return Some((name, consumed));
    }
    let (name, _) = take_ident(trimmed)?;
    Some((name, lead + name.len()))
}
