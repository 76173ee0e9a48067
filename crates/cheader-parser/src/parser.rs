//! Recursive descent over preprocessed header tokens.
//!
//! Productions backtrack by restoring a [`Checkpoint`]. Definitions found
//! while matching are staged in `pending` and only reach the registry once
//! the whole top-level declaration has matched, so an abandoned
//! alternative leaves nothing behind.

use crate::config::Grammar;
use crate::declarator::{Core, Declarator, Indirection};
use crate::error::{DefinitionError, ParseError, ParseResult};
use crate::{ParseReport, Unparsed};
use cheader_lexer::{Lexer, LineIndex, Token, TokenKind};
use cheader_preprocess::PackingLog;
use cheader_registry::{Definition, FunctionDecl, Registry, Variable};
use cheader_types::{
    eval_tokens, Compound, EnumDef, EvalError, Field, FunctionSig, Modifier, Param, QualifierSet, Type, Value,
    ValueLookup,
};
use smol_str::SmolStr;
use std::ops::Range;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    pos: usize,
    pending: usize,
    errors: usize,
}

/// Storage classes and the qualified base type of a declaration
#[derive(Debug, Clone)]
struct Specifiers {
    storage: Vec<SmolStr>,
    base: Type,
}

pub(crate) struct Parser<'a> {
    grammar: &'a Grammar,
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    lines: LineIndex,
    file: SmolStr,
    packing: &'a PackingLog,
    registry: &'a mut Registry,
    pending: Vec<(SmolStr, Definition)>,
    errors: Vec<DefinitionError>,
}

impl<'a> Parser<'a> {
    pub fn new(
        grammar: &'a Grammar,
        source: &'a str,
        file: &str,
        packing: &'a PackingLog,
        registry: &'a mut Registry,
    ) -> Self {
        let (tokens, lex_errors) = Lexer::new(source).tokenize();
        for err in &lex_errors {
            debug!(file, error = %err, "lexer");
        }
        Self {
            grammar,
            source,
            tokens,
            pos: 0,
            lines: LineIndex::new(source),
            file: SmolStr::new(file),
            packing,
            registry,
            pending: Vec::new(),
            errors: Vec::new(),
        }
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    pub fn parse_file(mut self) -> ParseReport {
        let mut report = ParseReport::default();
        let mut linkage_blocks = 0usize;

        while !self.is_eof() {
            if self.eat(&TokenKind::Semi) {
                continue;
            }
            if self.linkage_spec() == Some(true) {
                linkage_blocks += 1;
                continue;
            }
            if linkage_blocks > 0 && self.eat(&TokenKind::RBrace) {
                linkage_blocks -= 1;
                continue;
            }

            let start = self.pos;
            let cp = self.checkpoint();
            match self.declaration() {
                Ok(()) => self.commit(cp, &mut report),
                Err(err) => {
                    self.rollback(cp);
                    let line = self.line();
                    self.recover();
                    let text = self.text_between(start, self.pos);
                    debug!(file = %self.file, line, error = %err, text = %text, "unparsed");
                    report.unparsed.push(Unparsed { line, text });
                }
            }
        }
        report
    }

    /// One declaration or abstract type name spanning the whole input
    pub fn parse_type_name(mut self) -> ParseResult<(Option<SmolStr>, Type)> {
        let specs = self.specifiers()?;
        let cp = self.checkpoint();
        let decl = match self.declarator() {
            Ok(decl) => decl,
            Err(_) => {
                self.rollback(cp);
                self.abstract_declarator()?
            }
        };
        self.eat(&TokenKind::Semi);
        if let Some(token) = self.tokens.get(self.pos) {
            return Err(ParseError::TrailingInput {
                found: token.kind.to_string(),
            });
        }
        Ok(decl.reduce(specs.base))
    }

    // ========================================================================
    // Token navigation
    // ========================================================================

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn peek_word(&self) -> Option<&str> {
        self.tokens.get(self.pos).and_then(Token::ident)
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn at_word(&self, word: &str) -> bool {
        self.peek_word() == Some(word)
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.error(&format!("'{kind}'")))
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::Unexpected {
                expected: expected.to_string(),
                found: token.kind.to_string(),
                line: self.line_of(self.pos),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    fn line_of(&self, index: usize) -> usize {
        self.tokens
            .get(index)
            .or(self.tokens.last())
            .map_or(0, |t| self.lines.line_of(t.span.start))
    }

    fn line(&self) -> usize {
        self.line_of(self.pos)
    }

    fn text_between(&self, start: usize, end: usize) -> String {
        match (self.tokens.get(start), end.checked_sub(1).and_then(|e| self.tokens.get(e))) {
            (Some(first), Some(last)) if end > start => self.source[first.span.start..last.span.end].to_string(),
            _ => String::new(),
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            pending: self.pending.len(),
            errors: self.errors.len(),
        }
    }

    fn rollback(&mut self, cp: Checkpoint) {
        self.pos = cp.pos;
        self.pending.truncate(cp.pending);
        self.errors.truncate(cp.errors);
    }

    /// Move staged definitions into the registry, unless the declaration
    /// raised definition errors, in which case it is dropped.
    fn commit(&mut self, cp: Checkpoint, report: &mut ParseReport) {
        if self.errors.len() > cp.errors {
            let errors = self.errors.split_off(cp.errors);
            self.pending.truncate(cp.pending);
            for err in &errors {
                warn!(file = %self.file, "{err}");
            }
            report.errors.extend(errors);
            return;
        }
        for (name, def) in self.pending.drain(..) {
            self.registry.insert(Some(self.file.as_str()), name, def);
        }
    }

    /// Skip to the end of the current statement: past a `;` or a balanced
    /// `{ ... }` block (and the `;` after it).
    fn recover(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::Semi if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                    if depth == 0 {
                        self.eat(&TokenKind::Semi);
                        break;
                    }
                }
                _ => self.advance(),
            }
        }
    }

    /// Advance to the first of `stops` (or any unmatched closing bracket)
    /// outside nested brackets and return the skipped token range.
    fn balanced_until(&mut self, stops: &[TokenKind]) -> ParseResult<Range<usize>> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            let Some(kind) = self.peek() else {
                return Err(self.error("closing bracket"));
            };
            if depth == 0 && (stops.contains(kind) || kind.is_close()) {
                return Ok(start..self.pos);
            }
            if kind.is_open() {
                depth += 1;
            } else if kind.is_close() {
                depth -= 1;
            }
            self.advance();
        }
    }

    /// Skip a balanced `{ ... }` block starting at the current token
    fn skip_block(&mut self) -> ParseResult<()> {
        self.expect(TokenKind::LBrace)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                None => return Err(self.error("'}'")),
                Some(TokenKind::LBrace) => depth += 1,
                Some(TokenKind::RBrace) => depth -= 1,
                Some(_) => {}
            }
            self.advance();
        }
        Ok(())
    }

    /// `extern "C"` (or `"C++"`), returning whether a `{` block opened
    fn linkage_spec(&mut self) -> Option<bool> {
        let is_linkage = self.at_word("extern")
            && matches!(self.peek_at(1), Some(TokenKind::Str(s)) if s == "\"C\"" || s == "\"C++\"");
        if !is_linkage {
            return None;
        }
        self.pos += 2;
        Some(self.eat(&TokenKind::LBrace))
    }

    // ========================================================================
    // Staged definitions and lookups
    // ========================================================================

    fn define(&mut self, name: impl Into<SmolStr>, def: Definition) {
        self.pending.push((name.into(), def));
    }

    fn staged(&self) -> impl Iterator<Item = &(SmolStr, Definition)> {
        self.pending.iter().rev()
    }

    fn lookup_value(&self, name: &str) -> Option<Value> {
        self.staged()
            .find_map(|(n, def)| match def {
                Definition::Value(v) if n == name => Some(v.clone()),
                _ => None,
            })
            .or_else(|| self.registry.lookup_value(name))
    }

    fn type_exists(&self, name: &str) -> bool {
        self.staged()
            .any(|(n, def)| n == name && matches!(def, Definition::Type(_)))
            || self.registry.types().contains_key(name)
    }

    /// Whether an aggregate of this kind exists, and if so whether it has
    /// members
    fn aggregate_state(&self, keyword: &str, name: &str) -> Option<bool> {
        let staged = self.staged().find_map(|(n, def)| match (keyword, def) {
            ("struct", Definition::Struct(c)) | ("union", Definition::Union(c)) if n == name => Some(c.is_empty()),
            ("enum", Definition::Enum(e)) if n == name => Some(e.is_empty()),
            _ => None,
        });
        staged.or_else(|| match keyword {
            "struct" => self.registry.structs().get(name).map(Compound::is_empty),
            "union" => self.registry.unions().get(name).map(Compound::is_empty),
            _ => self.registry.enums().get(name).map(EnumDef::is_empty),
        })
    }

    fn anonymous_name(&self, keyword: &str) -> SmolStr {
        let mut n = 0usize;
        loop {
            let name = format!("anon_{keyword}{n}");
            if !self.type_exists(&format!("{keyword} {name}")) {
                return name.into();
            }
            n += 1;
        }
    }

    /// Evaluate a token range against staged and registered values, plus
    /// the members of an enum being defined
    fn evaluate(&self, range: Range<usize>, locals: Option<&EnumDef>) -> Result<Value, EvalError> {
        let env = |name: &str| -> Option<Value> {
            locals
                .and_then(|def| def.get(name))
                .map(Value::Int)
                .or_else(|| self.lookup_value(name))
        };
        eval_tokens(&self.tokens[range], &env)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn declaration(&mut self) -> ParseResult<()> {
        if self.eat_word("typedef") {
            return self.typedef_body();
        }

        let line = self.line();
        let specs = self.specifiers()?;
        if self.eat(&TokenKind::Semi) {
            return Ok(());
        }

        let mut decl = self.declarator()?;
        if self.at(&TokenKind::LBrace) {
            let (name, ty) = decl.reduce(specs.base);
            if !ty.is_function() {
                return Err(self.error("';'"));
            }
            self.skip_block()?;
            if let Some(name) = name {
                self.add_function(name, ty, &specs.storage, line);
            }
            return Ok(());
        }

        loop {
            let value = if self.eat(&TokenKind::Eq) {
                self.initializer()?
            } else {
                None
            };
            self.add_object(decl, value, &specs, line);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            decl = self.declarator()?;
        }
        self.expect(TokenKind::Semi)
    }

    fn typedef_body(&mut self) -> ParseResult<()> {
        let specs = self.specifiers()?;
        if !self.at(&TokenKind::Semi) {
            loop {
                let line = self.line();
                let decl = self.declarator()?;
                match decl.reduce(specs.base.clone()) {
                    (Some(name), ty) => {
                        debug!(%name, ty = %ty, "typedef");
                        self.define(name, Definition::Type(ty));
                    }
                    (None, _) => self.errors.push(DefinitionError::Unnamed {
                        line,
                        construct: "typedef",
                    }),
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::Semi)
    }

    /// Register a variable, or a function declared with variable syntax
    fn add_object(&mut self, decl: Declarator, value: Option<Value>, specs: &Specifiers, line: usize) {
        let (name, ty) = decl.reduce(specs.base.clone());
        let Some(name) = name else {
            self.errors.push(DefinitionError::Unnamed {
                line,
                construct: "variable",
            });
            return;
        };
        if ty.is_function() {
            self.add_function(name, ty, &specs.storage, line);
            return;
        }
        if let Some(v) = value.as_ref().filter(|v| v.is_scalar()) {
            self.define(name.clone(), Definition::Value(v.clone()));
        }
        let mut var = Variable::new(value, ty);
        var.storage = specs.storage.clone();
        self.define(name, Definition::Variable(var));
    }

    fn add_function(&mut self, name: SmolStr, ty: Type, storage: &[SmolStr], line: usize) {
        match FunctionDecl::new(&ty) {
            Ok(mut func) => {
                func.storage = storage.to_vec();
                self.define(name, Definition::Function(func));
            }
            Err(source) => self.errors.push(DefinitionError::Function { line, name, source }),
        }
    }

    /// Scalar expression or nested brace list. Values that cannot be
    /// evaluated are `None`.
    fn initializer(&mut self) -> ParseResult<Option<Value>> {
        if self.eat(&TokenKind::LBrace) {
            let mut items = Vec::new();
            let mut complete = true;
            while !self.at(&TokenKind::RBrace) {
                match self.initializer()? {
                    Some(item) => items.push(item),
                    None => complete = false,
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace)?;
            return Ok(complete.then_some(Value::List(items)));
        }

        let range = self.balanced_until(&[TokenKind::Comma, TokenKind::Semi])?;
        if range.is_empty() {
            return Err(self.error("initializer"));
        }
        match self.evaluate(range, None) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                debug!(line = self.line(), error = %err, "initializer not evaluated");
                Ok(None)
            }
        }
    }

    // ========================================================================
    // Specifiers and qualifiers
    // ========================================================================

    fn specifiers(&mut self) -> ParseResult<Specifiers> {
        let mut storage = Vec::new();
        let mut quals = QualifierSet::new();
        loop {
            if let Some(word) = self.peek_word().filter(|w| self.grammar.storage.contains(*w)) {
                storage.push(SmolStr::new(word));
                self.advance();
            } else if !self.qualifier(&mut quals, true) {
                break;
            }
        }
        let mut base = Type::new(self.type_name()?);
        base.add_outer_qualifiers(&quals);
        Ok(Specifiers { storage, base })
    }

    /// Consume one qualifier or modifier into `quals`
    fn qualifier(&mut self, quals: &mut QualifierSet, before_type: bool) -> bool {
        let Some(word) = self.peek_word() else {
            return false;
        };
        if self.grammar.qualifiers.contains(word) {
            quals.insert(word);
            self.advance();
            return true;
        }
        let is_modifier = self.grammar.modifiers.contains(word)
            || (self.grammar.is_underscore_word(word) && self.modifier_follows(before_type));
        if !is_modifier {
            return false;
        }

        let mut text = word.to_string();
        self.advance();
        if self.at(&TokenKind::LParen) {
            let start = self.pos;
            self.advance();
            if self.balanced_until(&[]).is_ok() && self.eat(&TokenKind::RParen) {
                for token in &self.tokens[start..self.pos] {
                    text.push_str(&token.kind.to_string());
                }
            } else {
                self.pos = start;
            }
        }
        quals.insert(text);
        true
    }

    /// Decide whether the `__word` at the cursor acts as a modifier, judged
    /// by what follows it (and its argument list, if any).
    fn modifier_follows(&self, before_type: bool) -> bool {
        let mut next = self.pos + 1;
        if matches!(self.tokens.get(next).map(|t| &t.kind), Some(TokenKind::LParen)) {
            let mut depth = 0usize;
            loop {
                match self.tokens.get(next).map(|t| &t.kind) {
                    None => return false,
                    Some(TokenKind::LParen) => depth += 1,
                    Some(TokenKind::RParen) => {
                        depth -= 1;
                        if depth == 0 {
                            next += 1;
                            break;
                        }
                    }
                    Some(_) => {}
                }
                next += 1;
            }
        }

        let kind_at = |i: usize| self.tokens.get(i).map(|t| &t.kind);
        match kind_at(next) {
            Some(TokenKind::Ident(w)) if self.grammar.is_keyword(w) => true,
            // before the type the word is only a modifier if a type name and
            // then a declarator follow
            Some(TokenKind::Ident(_)) if before_type => matches!(
                kind_at(next + 1),
                Some(TokenKind::Ident(_) | TokenKind::Star | TokenKind::Amp | TokenKind::LParen)
            ),
            Some(TokenKind::Ident(_)) => true,
            Some(TokenKind::Star | TokenKind::Amp | TokenKind::LParen) => !before_type,
            _ => false,
        }
    }

    /// Base type name: built-in words, an aggregate, or a typedef name
    fn type_name(&mut self) -> ParseResult<SmolStr> {
        let Some(word) = self.peek_word() else {
            return Err(self.error("type name"));
        };
        match word {
            "struct" | "union" => self.compound_spec(),
            "enum" => self.enum_spec(),
            w if self.grammar.fundamental.contains(w) => {
                let mut words = Vec::new();
                while let Some(w) = self.peek_word().filter(|w| self.grammar.fundamental.contains(*w)) {
                    words.push(w.to_string());
                    self.advance();
                }
                Ok(words.join(" ").into())
            }
            w if !self.grammar.is_keyword(w) => {
                let name = SmolStr::new(w);
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("type name")),
        }
    }

    /// A non-keyword identifier
    fn name(&mut self) -> Option<SmolStr> {
        let word = self.peek_word().filter(|w| !self.grammar.is_keyword(w))?;
        let name = SmolStr::new(word);
        self.advance();
        Some(name)
    }

    // ========================================================================
    // Declarators
    // ========================================================================

    fn declarator(&mut self) -> ParseResult<Declarator> {
        self.declarator_shape(true)
    }

    fn abstract_declarator(&mut self) -> ParseResult<Declarator> {
        self.declarator_shape(false)
    }

    fn declarator_shape(&mut self, named: bool) -> ParseResult<Declarator> {
        let mut indirections = Vec::new();
        let mut quals = QualifierSet::new();
        loop {
            if self.qualifier(&mut quals, false) {
                continue;
            }
            let modifier = match self.peek() {
                Some(TokenKind::Star) => Modifier::Pointer,
                Some(TokenKind::Amp) => Modifier::Reference,
                _ => break,
            };
            self.advance();
            indirections.push(Indirection {
                before: std::mem::take(&mut quals),
                modifier,
            });
        }

        let core = if named {
            if let Some(name) = self.name() {
                Core::Name(name)
            } else if self.eat(&TokenKind::LParen) {
                let inner = self.declarator_shape(true)?;
                self.expect(TokenKind::RParen)?;
                Core::Center(Box::new(inner))
            } else {
                return Err(self.error("declarator"));
            }
        } else {
            self.abstract_center()
        };

        let params = if self.at(&TokenKind::LParen) {
            Some(self.parameter_list()?)
        } else {
            None
        };

        let mut arrays = Vec::new();
        while self.eat(&TokenKind::LBracket) {
            let range = self.balanced_until(&[TokenKind::RBracket])?;
            self.expect(TokenKind::RBracket)?;
            let size = if range.is_empty() {
                None
            } else {
                self.evaluate(range, None).ok().and_then(|v| v.as_size())
            };
            arrays.push(size);
        }

        Ok(Declarator {
            indirections,
            qualifiers: quals,
            core,
            params,
            arrays,
        })
    }

    /// A parenthesized group in an abstract declarator is a center only if
    /// it holds a non-empty declarator; otherwise it is a parameter list.
    fn abstract_center(&mut self) -> Core {
        let cp = self.checkpoint();
        if !self.eat(&TokenKind::LParen) {
            return Core::Abstract;
        }
        match self.abstract_declarator() {
            Ok(inner) if !inner.is_empty() && self.eat(&TokenKind::RParen) => Core::Center(Box::new(inner)),
            _ => {
                self.rollback(cp);
                Core::Abstract
            }
        }
    }

    fn parameter_list(&mut self) -> ParseResult<FunctionSig> {
        self.expect(TokenKind::LParen)?;
        let mut sig = FunctionSig::new(Vec::new());
        if self.eat(&TokenKind::RParen) {
            return Ok(sig);
        }
        if self.at_word("void") && self.peek_at(1) == Some(&TokenKind::RParen) {
            self.pos += 2;
            return Ok(sig);
        }

        loop {
            if self.eat(&TokenKind::Ellipsis) {
                sig.variadic = true;
                break;
            }
            let specs = self.specifiers()?;
            let cp = self.checkpoint();
            let decl = match self.declarator() {
                Ok(decl) => decl,
                Err(_) => {
                    self.rollback(cp);
                    self.abstract_declarator()?
                }
            };
            let default = if self.eat(&TokenKind::Eq) {
                let range = self.balanced_until(&[TokenKind::Comma])?;
                self.evaluate(range, None).ok()
            } else {
                None
            };
            let (name, ty) = decl.reduce(specs.base);
            sig.params.push(Param { name, ty, default });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(sig)
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    fn compound_spec(&mut self) -> ParseResult<SmolStr> {
        let line = self.line();
        let keyword = if self.eat_word("struct") {
            "struct"
        } else {
            self.expect_word("union")?;
            "union"
        };
        let name = self.name();

        if !self.at(&TokenKind::LBrace) {
            let Some(name) = name else {
                return Err(self.error("aggregate name or '{'"));
            };
            if self.aggregate_state(keyword, &name).is_none() {
                self.define_aggregate(keyword, name.clone(), Compound::empty());
            }
            return Ok(format!("{keyword} {name}").into());
        }

        self.advance();
        let fields = self.members()?;
        let name = name.unwrap_or_else(|| self.anonymous_name(keyword));
        if !fields.is_empty() || self.aggregate_state(keyword, &name) != Some(false) {
            match Compound::new(fields).with_pack(self.packing.packing_at(line)) {
                Ok(compound) => {
                    debug!(keyword, %name, pack = ?compound.pack(), "aggregate");
                    self.define_aggregate(keyword, name.clone(), compound);
                }
                Err(source) => self.errors.push(DefinitionError::Aggregate {
                    line,
                    keyword,
                    name: name.clone(),
                    source,
                }),
            }
        }
        Ok(format!("{keyword} {name}").into())
    }

    fn define_aggregate(&mut self, keyword: &str, name: SmolStr, compound: Compound) {
        let synonym = format!("{keyword} {name}");
        let def = if keyword == "union" {
            Definition::Union(compound)
        } else {
            Definition::Struct(compound)
        };
        self.define(name, def);
        self.define(synonym.clone(), Definition::Type(Type::new(synonym)));
    }

    fn expect_word(&mut self, word: &str) -> ParseResult<()> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.error(&format!("'{word}'")))
        }
    }

    /// Member declarations up to and including the closing `}`
    fn members(&mut self) -> ParseResult<Vec<Field>> {
        let mut fields = Vec::new();
        loop {
            if self.eat(&TokenKind::RBrace) {
                return Ok(fields);
            }
            if self.eat(&TokenKind::Semi) {
                continue;
            }
            if self.is_eof() {
                return Err(self.error("'}'"));
            }
            self.member(&mut fields)?;
        }
    }

    fn member(&mut self, fields: &mut Vec<Field>) -> ParseResult<()> {
        // constructors and other bodies without a return type
        let cp = self.checkpoint();
        if self.declarator().is_ok() && self.at(&TokenKind::LBrace) {
            self.skip_block()?;
            self.eat(&TokenKind::Semi);
            return Ok(());
        }
        self.rollback(cp);

        let line = self.line();
        let specs = self.specifiers()?;
        if self.eat(&TokenKind::Semi) {
            fields.push(Field::anonymous(specs.base));
            return Ok(());
        }
        if self.eat(&TokenKind::Colon) {
            let mut field = Field::anonymous(specs.base);
            field.bit_width = self.bit_width("<padding>", line)?;
            fields.push(field);
            return self.expect(TokenKind::Semi);
        }

        let mut decl = self.declarator()?;
        if self.at(&TokenKind::LBrace) {
            self.skip_block()?;
            self.eat(&TokenKind::Semi);
            return Ok(());
        }
        loop {
            let mut field = match decl.reduce(specs.base.clone()) {
                (Some(name), ty) => Field::new(name, ty),
                (None, ty) => Field::anonymous(ty),
            };
            if self.eat(&TokenKind::Colon) {
                let label = field.name.clone().unwrap_or_default();
                field.bit_width = self.bit_width(&label, line)?;
            }
            if self.eat(&TokenKind::Eq) {
                field.default = self.initializer()?;
            }
            fields.push(field);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            decl = self.declarator()?;
        }
        self.expect(TokenKind::Semi)
    }

    fn bit_width(&mut self, field: &str, line: usize) -> ParseResult<Option<u32>> {
        let range = self.balanced_until(&[TokenKind::Comma, TokenKind::Semi, TokenKind::Eq])?;
        let bits = self
            .evaluate(range, None)
            .ok()
            .and_then(|v| v.as_int())
            .and_then(|n| u32::try_from(n).ok());
        if bits.is_none() {
            self.errors.push(DefinitionError::BitWidth {
                line,
                field: field.to_string(),
            });
        }
        Ok(bits)
    }

    fn enum_spec(&mut self) -> ParseResult<SmolStr> {
        let line = self.line();
        self.expect_word("enum")?;
        let name = self.name();

        if !self.at(&TokenKind::LBrace) {
            let Some(name) = name else {
                return Err(self.error("enum name or '{'"));
            };
            if self.aggregate_state("enum", &name).is_none() {
                self.define_enum(name.clone(), EnumDef::new());
            }
            return Ok(format!("enum {name}").into());
        }

        self.advance();
        let mut def = EnumDef::new();
        while !self.at(&TokenKind::RBrace) {
            let member = self.name().ok_or_else(|| self.error("enum member"))?;
            let value = if self.eat(&TokenKind::Eq) {
                let member_line = self.line();
                let range = self.balanced_until(&[TokenKind::Comma])?;
                let evaluated = self.evaluate(range, Some(&def)).and_then(|v| {
                    v.as_int().ok_or_else(|| EvalError::TypeMismatch {
                        op: "enum",
                        operand: v.kind_name().to_string(),
                    })
                });
                evaluated.unwrap_or_else(|source| {
                    self.errors.push(DefinitionError::EnumValue {
                        line: member_line,
                        member: member.clone(),
                        source,
                    });
                    def.next_value()
                })
            } else {
                def.next_value()
            };
            def.insert(member, value);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;

        let name = name.unwrap_or_else(|| self.anonymous_name("enum"));
        if !def.is_empty() || self.aggregate_state("enum", &name) != Some(false) {
            debug!(%name, members = def.len(), line, "enum");
            for (member, value) in def.iter() {
                self.define(member, Definition::Value(Value::Int(value)));
            }
            self.define_enum(name.clone(), def);
        }
        Ok(format!("enum {name}").into())
    }

    fn define_enum(&mut self, name: SmolStr, def: EnumDef) {
        let synonym = format!("enum {name}");
        self.define(name, Definition::Enum(def));
        self.define(synonym.clone(), Definition::Type(Type::new(synonym)));
    }
}
