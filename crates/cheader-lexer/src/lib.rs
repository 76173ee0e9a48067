//! C Header Lexer
//!
//! Tokenizes preprocessed C header text. Uses the `logos` crate for the
//! token stream and provides two text-level helpers shared by the
//! preprocessor and the declaration parser:
//!
//! - [`LineIndex`] maps byte offsets to 0-based line numbers
//! - [`scan_words`] walks raw text, separating free identifiers from
//!   quoted literals and numbers without tokenizing the whole line
//!
//! Keywords are not distinguished here: which identifiers are reserved
//! depends on the grammar configuration, so every word lexes as
//! [`TokenKind::Ident`].

mod line_index;
mod words;

pub use line_index::LineIndex;
pub use words::{identifiers, scan_words, Segment, WordScanner};

use logos::Logos;
use smol_str::SmolStr;
use std::fmt;
use std::ops::Range;

/// Source span representing a byte range in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// A token with its kind and source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Identifier text, if this token is an identifier
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// All token kinds appearing in preprocessed C header text
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f\x0B]+")]
pub enum TokenKind {
    // ========== Words and literals ==========
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| SmolStr::new(lex.slice()))]
    Ident(SmolStr),

    #[regex(r"0[xX][0-9a-fA-F]+[uUlL]*", |lex| SmolStr::new(lex.slice()))]
    #[regex(r"[0-9]+[uUlL]*", |lex| SmolStr::new(lex.slice()))]
    Integer(SmolStr),

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fFlL]?", |lex| SmolStr::new(lex.slice()))]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[fFlL]?", |lex| SmolStr::new(lex.slice()))]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFlL]?", |lex| SmolStr::new(lex.slice()))]
    Float(SmolStr),

    #[regex(r#"L?"([^"\\\n]|\\.)*""#, |lex| SmolStr::new(lex.slice()))]
    Str(SmolStr),

    #[regex(r"L?'([^'\\\n]|\\.)+'", |lex| SmolStr::new(lex.slice()))]
    Char(SmolStr),

    // ========== Delimiters ==========
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("->")]
    Arrow,
    #[token("#")]
    Hash,
    #[token("##")]
    HashHash,

    // ========== Operators ==========
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("&")]
    Amp,
    #[token("&&")]
    AmpAmp,
    #[token("|")]
    Pipe,
    #[token("||")]
    PipePipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[regex(r"(\+|-|\*|/|%|&|\||\^|<<|>>)=", |lex| SmolStr::new(lex.slice()))]
    CompoundAssign(SmolStr),

    /// Placeholder for an unrecognized character
    Error,
}

impl TokenKind {
    /// Returns true for tokens that open a bracketed group
    pub fn is_open(&self) -> bool {
        matches!(self, TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace)
    }

    /// Returns true for tokens that close a bracketed group
    pub fn is_close(&self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s)
            | TokenKind::Integer(s)
            | TokenKind::Float(s)
            | TokenKind::Str(s)
            | TokenKind::Char(s)
            | TokenKind::CompoundAssign(s) => write!(f, "{s}"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Semi => write!(f, ";"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Question => write!(f, "?"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Ellipsis => write!(f, "..."),
            TokenKind::Arrow => write!(f, "->"),
            TokenKind::Hash => write!(f, "#"),
            TokenKind::HashHash => write!(f, "##"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::PlusPlus => write!(f, "++"),
            TokenKind::MinusMinus => write!(f, "--"),
            TokenKind::Shl => write!(f, "<<"),
            TokenKind::Shr => write!(f, ">>"),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::Amp => write!(f, "&"),
            TokenKind::AmpAmp => write!(f, "&&"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::Tilde => write!(f, "~"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Error => write!(f, "<error>"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexerError {
    #[error("unexpected character '{1}' at position {0}")]
    UnexpectedCharacter(usize, char),
}

/// The lexer for C header text
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Tokenize the entire source. Unrecognized characters become
    /// [`TokenKind::Error`] tokens so the parser can skip past them.
    pub fn tokenize(self) -> (Vec<Token>, Vec<LexerError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        for (result, span) in self.inner.spanned() {
            match result {
                Ok(kind) => tokens.push(Token::new(kind, Span::from(span))),
                Err(_) => {
                    let bad_char = self.source[span.clone()].chars().next().unwrap_or('?');
                    errors.push(LexerError::UnexpectedCharacter(span.start, bad_char));
                    tokens.push(Token::new(TokenKind::Error, Span::from(span)));
                }
            }
        }

        (tokens, errors)
    }
}

/// Convenience wrapper returning only the tokens
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize().0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_declaration() {
        let kinds = kinds("unsigned long *x[4];");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("unsigned".into()),
                TokenKind::Ident("long".into()),
                TokenKind::Star,
                TokenKind::Ident("x".into()),
                TokenKind::LBracket,
                TokenKind::Integer("4".into()),
                TokenKind::RBracket,
                TokenKind::Semi,
            ]
        );
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(kinds("0x1fUL"), vec![TokenKind::Integer("0x1fUL".into())]);
        assert_eq!(kinds("017"), vec![TokenKind::Integer("017".into())]);
        assert_eq!(kinds("1.5e-3f"), vec![TokenKind::Float("1.5e-3f".into())]);
        assert_eq!(kinds(".25"), vec![TokenKind::Float(".25".into())]);
        assert_eq!(kinds("2."), vec![TokenKind::Float("2.".into())]);
    }

    #[test]
    fn test_string_and_char_literals() {
        assert_eq!(
            kinds(r#""a \"b\"" L"w" 'c' '\n'"#),
            vec![
                TokenKind::Str(r#""a \"b\"""#.into()),
                TokenKind::Str(r#"L"w""#.into()),
                TokenKind::Char("'c'".into()),
                TokenKind::Char(r"'\n'".into()),
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("... -> <<= && || ## # != ~"),
            vec![
                TokenKind::Ellipsis,
                TokenKind::Arrow,
                TokenKind::CompoundAssign("<<=".into()),
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::HashHash,
                TokenKind::Hash,
                TokenKind::NotEq,
                TokenKind::Tilde,
            ]
        );
    }

    #[test]
    fn test_unknown_character_reported() {
        let (tokens, errors) = Lexer::new("int @x;").tokenize();
        assert_eq!(errors, vec![LexerError::UnexpectedCharacter(4, '@')]);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[2].ident(), Some("x"));
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("int  value;");
        assert_eq!(tokens[1].span, Span::new(5, 10));
        assert_eq!(Range::from(tokens[2].span), 10..11);
    }

    #[test]
    fn test_display_round_trip() {
        let text: Vec<String> = tokenize("f(a, \"s\") >= 0x10")
            .iter()
            .map(|t| t.kind.to_string())
            .collect();
        assert_eq!(text.join(" "), "f ( a , \"s\" ) >= 0x10");
    }
}
