//! Constant-expression evaluation.
//!
//! Evaluates the C expressions that appear in macro bodies, `#if` lines,
//! array bounds, enum members and initializers. Expressions are parsed by
//! precedence climbing into a small tree and then evaluated, so `&&`,
//! `||` and `?:` short-circuit over operands that would fail.
//!
//! Identifiers are looked up through a [`ValueLookup`]. Casts are
//! recognized syntactically (`(unsigned long) 1`) and leave the value
//! unchanged. `sizeof` and function calls are rejected.

use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use cheader_lexer::{Lexer, Token, TokenKind};
use indexmap::IndexMap;
use smol_str::SmolStr;

/// Source of identifier values during evaluation
pub trait ValueLookup {
    fn lookup_value(&self, name: &str) -> Option<Value>;
}

impl<F> ValueLookup for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn lookup_value(&self, name: &str) -> Option<Value> {
        self(name)
    }
}

impl ValueLookup for IndexMap<SmolStr, Value> {
    fn lookup_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Evaluate expression text
pub fn eval_str(text: &str, env: &dyn ValueLookup) -> EvalResult<Value> {
    let (tokens, errors) = Lexer::new(text).tokenize();
    if let Some(err) = errors.first() {
        return Err(EvalError::Unsupported(err.to_string()));
    }
    eval_tokens(&tokens, env)
}

/// Evaluate a token slice holding exactly one expression
pub fn eval_tokens(tokens: &[Token], env: &dyn ValueLookup) -> EvalResult<Value> {
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }
    let mut parser = ExprParser { tokens, pos: 0, env };
    let expr = parser.expr_conditional()?;
    if let Some(tok) = parser.current() {
        return Err(EvalError::Unexpected {
            found: tok.kind.to_string(),
            position: parser.pos,
        });
    }
    expr.eval(env)
}

// ============================================================================
// Expression tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Name(SmolStr),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, env: &dyn ValueLookup) -> EvalResult<Value> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) => env
                .lookup_value(name)
                .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
            Expr::Unary(op, operand) => eval_unary(*op, operand.eval(env)?),
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                if !lhs.eval(env)?.is_truthy() {
                    return Ok(Value::Int(0));
                }
                Ok(rhs.eval(env)?.is_truthy().into())
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                if lhs.eval(env)?.is_truthy() {
                    return Ok(Value::Int(1));
                }
                Ok(rhs.eval(env)?.is_truthy().into())
            }
            Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs.eval(env)?, rhs.eval(env)?),
            Expr::Conditional(cond, then, otherwise) => {
                if cond.eval(env)?.is_truthy() {
                    then.eval(env)
                } else {
                    otherwise.eval(env)
                }
            }
        }
    }
}

fn mismatch(op: &'static str, value: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op,
        operand: value.kind_name().to_string(),
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> EvalResult<Value> {
    match (op, value) {
        (UnaryOp::Not, v) => Ok((!v.is_truthy()).into()),
        (UnaryOp::Plus, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::BitNot, Value::Int(n)) => Ok(Value::Int(!n)),
        (UnaryOp::Plus, v) => Err(mismatch("+", &v)),
        (UnaryOp::Neg, v) => Err(mismatch("-", &v)),
        (UnaryOp::BitNot, v) => Err(mismatch("~", &v)),
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => eval_int(op, *a, *b),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (lhs.as_float().unwrap_or_default(), rhs.as_float().unwrap_or_default());
            eval_float(op, a, b)
        }
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Eq => Ok((a == b).into()),
            BinaryOp::Ne => Ok((a != b).into()),
            _ => Err(mismatch(op.symbol(), &lhs)),
        },
        (Value::Str(_) | Value::List(_), _) => Err(mismatch(op.symbol(), &lhs)),
        _ => Err(mismatch(op.symbol(), &rhs)),
    }
}

fn eval_int(op: BinaryOp, a: i64, b: i64) -> EvalResult<Value> {
    let value = match op {
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Rem => a.wrapping_rem(b),
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Shl => a.wrapping_shl(b as u32),
        BinaryOp::Shr => a.wrapping_shr(b as u32),
        BinaryOp::Lt => i64::from(a < b),
        BinaryOp::Le => i64::from(a <= b),
        BinaryOp::Gt => i64::from(a > b),
        BinaryOp::Ge => i64::from(a >= b),
        BinaryOp::Eq => i64::from(a == b),
        BinaryOp::Ne => i64::from(a != b),
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::BitOr => a | b,
        BinaryOp::And => i64::from(a != 0 && b != 0),
        BinaryOp::Or => i64::from(a != 0 || b != 0),
    };
    Ok(Value::Int(value))
}

fn eval_float(op: BinaryOp, a: f64, b: f64) -> EvalResult<Value> {
    let value = match op {
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => Value::Float(a / b),
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Lt => (a < b).into(),
        BinaryOp::Le => (a <= b).into(),
        BinaryOp::Gt => (a > b).into(),
        BinaryOp::Ge => (a >= b).into(),
        BinaryOp::Eq => (a == b).into(),
        BinaryOp::Ne => (a != b).into(),
        BinaryOp::And => (a != 0.0 && b != 0.0).into(),
        BinaryOp::Or => (a != 0.0 || b != 0.0).into(),
        BinaryOp::Rem | BinaryOp::Shl | BinaryOp::Shr | BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => {
            return Err(mismatch(op.symbol(), &Value::Float(a)))
        }
    };
    Ok(value)
}

// ============================================================================
// Literals
// ============================================================================

/// Parse an integer literal with optional `u`/`l` suffixes. Values above
/// `i64::MAX` wrap, as an unsigned 64-bit constant would.
pub fn parse_int_literal(text: &str) -> EvalResult<i64> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<u64>()
    };
    parsed
        .map(|n| n as i64)
        .map_err(|_| EvalError::MalformedLiteral(text.to_string()))
}

fn parse_float_literal(text: &str) -> EvalResult<f64> {
    text.trim_end_matches(['f', 'F', 'l', 'L'])
        .parse::<f64>()
        .map_err(|_| EvalError::MalformedLiteral(text.to_string()))
}

/// Decode the escapes in the body of a string or character literal
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some('x') => {
                let mut code = 0u32;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(16)) {
                    code = code.wrapping_mul(16).wrapping_add(d);
                    chars.next();
                }
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            Some(d @ '0'..='7') => {
                let mut code = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn literal_body(text: &str, quote: char) -> &str {
    let text = text.strip_prefix('L').unwrap_or(text);
    text.strip_prefix(quote)
        .and_then(|t| t.strip_suffix(quote))
        .unwrap_or(text)
}

fn char_value(text: &str) -> i64 {
    unescape(literal_body(text, '\''))
        .chars()
        .fold(0i64, |acc, c| acc.wrapping_shl(8) | i64::from(u32::from(c)))
}

// ============================================================================
// Parser
// ============================================================================

struct ExprParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    env: &'t dyn ValueLookup,
}

impl<'t> ExprParser<'t> {
    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn kind_at(&self, pos: usize) -> Option<&'t TokenKind> {
        self.tokens.get(pos).map(|t| &t.kind)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.kind_at(self.pos) == Some(kind)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn unexpected(&self) -> EvalError {
        match self.current() {
            Some(tok) => EvalError::Unexpected {
                found: tok.kind.to_string(),
                position: self.pos,
            },
            None => EvalError::Unexpected {
                found: "end of expression".to_string(),
                position: self.pos,
            },
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> EvalResult<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    // Operator precedence (lowest to highest):
    // ?:
    // ||
    // &&
    // |
    // ^
    // &
    // == !=
    // < <= > >=
    // << >>
    // + -
    // * / %
    // ! ~ - + casts (unary)
    // primary

    fn expr_conditional(&mut self) -> EvalResult<Expr> {
        let cond = self.expr_or()?;
        if !self.check(&TokenKind::Question) {
            return Ok(cond);
        }
        self.advance();
        let then = self.expr_conditional()?;
        self.expect(&TokenKind::Colon)?;
        let otherwise = self.expr_conditional()?;
        Ok(Expr::Conditional(Box::new(cond), Box::new(then), Box::new(otherwise)))
    }

    /// One left-associative precedence level
    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> EvalResult<Expr>,
        ops: &[(TokenKind, BinaryOp)],
    ) -> EvalResult<Expr> {
        let mut left = next(self)?;
        'outer: loop {
            for (kind, op) in ops {
                if self.check(kind) {
                    self.advance();
                    let right = next(self)?;
                    left = Expr::Binary(*op, Box::new(left), Box::new(right));
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn expr_or(&mut self) -> EvalResult<Expr> {
        self.binary_level(Self::expr_and, &[(TokenKind::PipePipe, BinaryOp::Or)])
    }

    fn expr_and(&mut self) -> EvalResult<Expr> {
        self.binary_level(Self::expr_bitor, &[(TokenKind::AmpAmp, BinaryOp::And)])
    }

    fn expr_bitor(&mut self) -> EvalResult<Expr> {
        self.binary_level(Self::expr_bitxor, &[(TokenKind::Pipe, BinaryOp::BitOr)])
    }

    fn expr_bitxor(&mut self) -> EvalResult<Expr> {
        self.binary_level(Self::expr_bitand, &[(TokenKind::Caret, BinaryOp::BitXor)])
    }

    fn expr_bitand(&mut self) -> EvalResult<Expr> {
        self.binary_level(Self::expr_equality, &[(TokenKind::Amp, BinaryOp::BitAnd)])
    }

    fn expr_equality(&mut self) -> EvalResult<Expr> {
        self.binary_level(
            Self::expr_relational,
            &[(TokenKind::EqEq, BinaryOp::Eq), (TokenKind::NotEq, BinaryOp::Ne)],
        )
    }

    fn expr_relational(&mut self) -> EvalResult<Expr> {
        self.binary_level(
            Self::expr_shift,
            &[
                (TokenKind::Lt, BinaryOp::Lt),
                (TokenKind::LtEq, BinaryOp::Le),
                (TokenKind::Gt, BinaryOp::Gt),
                (TokenKind::GtEq, BinaryOp::Ge),
            ],
        )
    }

    fn expr_shift(&mut self) -> EvalResult<Expr> {
        self.binary_level(
            Self::expr_additive,
            &[(TokenKind::Shl, BinaryOp::Shl), (TokenKind::Shr, BinaryOp::Shr)],
        )
    }

    fn expr_additive(&mut self) -> EvalResult<Expr> {
        self.binary_level(
            Self::expr_multiplicative,
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
        )
    }

    fn expr_multiplicative(&mut self) -> EvalResult<Expr> {
        self.binary_level(
            Self::expr_unary,
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Rem),
            ],
        )
    }

    fn expr_unary(&mut self) -> EvalResult<Expr> {
        let op = match self.kind_at(self.pos) {
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Tilde) => UnaryOp::BitNot,
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::LParen) => {
                if let Some(after) = self.cast_end() {
                    self.pos = after;
                    return self.expr_unary();
                }
                return self.expr_primary();
            }
            _ => return self.expr_primary(),
        };
        self.advance();
        Ok(Expr::Unary(op, Box::new(self.expr_unary()?)))
    }

    /// If a cast `( type-name )` starts here, the position after its `)`.
    ///
    /// A parenthesized lone identifier that names a known value is a
    /// grouping, not a cast.
    fn cast_end(&self) -> Option<usize> {
        let mut i = self.pos + 1;
        let mut words = 0;
        loop {
            match self.kind_at(i)? {
                TokenKind::Ident(_) => words += 1,
                TokenKind::Star => {}
                TokenKind::RParen => break,
                _ => return None,
            }
            i += 1;
        }
        if words == 0 {
            return None;
        }
        if words == 1 && i == self.pos + 2 {
            if let Some(TokenKind::Ident(name)) = self.kind_at(self.pos + 1) {
                if self.env.lookup_value(name).is_some() {
                    return None;
                }
            }
        }
        match self.kind_at(i + 1)? {
            TokenKind::Ident(_)
            | TokenKind::Integer(_)
            | TokenKind::Float(_)
            | TokenKind::Char(_)
            | TokenKind::Str(_)
            | TokenKind::LParen
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Bang
            | TokenKind::Tilde => Some(i + 1),
            _ => None,
        }
    }

    fn expr_primary(&mut self) -> EvalResult<Expr> {
        let tok = self.current().ok_or_else(|| self.unexpected())?;
        match &tok.kind {
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr_conditional()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Integer(text) => {
                self.advance();
                Ok(Expr::Literal(Value::Int(parse_int_literal(text)?)))
            }
            TokenKind::Float(text) => {
                self.advance();
                Ok(Expr::Literal(Value::Float(parse_float_literal(text)?)))
            }
            TokenKind::Char(text) => {
                self.advance();
                Ok(Expr::Literal(Value::Int(char_value(text))))
            }
            TokenKind::Str(_) => {
                let mut joined = String::new();
                while let Some(TokenKind::Str(text)) = self.kind_at(self.pos) {
                    joined.push_str(&unescape(literal_body(text, '"')));
                    self.advance();
                }
                Ok(Expr::Literal(Value::Str(joined)))
            }
            TokenKind::Ident(name) if name == "sizeof" => Err(EvalError::Unsupported("sizeof".to_string())),
            TokenKind::Ident(name) => {
                if self.kind_at(self.pos + 1) == Some(&TokenKind::LParen) {
                    return Err(EvalError::Unsupported(format!("call to '{name}'")));
                }
                self.advance();
                Ok(Expr::Name(name.clone()))
            }
            _ => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_values(_: &str) -> Option<Value> {
        None
    }

    fn eval(text: &str) -> EvalResult<Value> {
        eval_str(text, &no_values)
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3"), Ok(Value::Int(7)));
        assert_eq!(eval("(1 + 2) * 3"), Ok(Value::Int(9)));
        assert_eq!(eval("1 << 4 | 1"), Ok(Value::Int(17)));
        assert_eq!(eval("10 - 4 - 3"), Ok(Value::Int(3)));
        assert_eq!(eval("-5 % 3"), Ok(Value::Int(-2)));
        assert_eq!(eval("~0"), Ok(Value::Int(-1)));
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(eval("0x10"), Ok(Value::Int(16)));
        assert_eq!(eval("010"), Ok(Value::Int(8)));
        assert_eq!(eval("0"), Ok(Value::Int(0)));
        assert_eq!(eval("42UL"), Ok(Value::Int(42)));
        assert_eq!(eval("0xFFFFFFFFFFFFFFFF"), Ok(Value::Int(-1)));
    }

    #[test]
    fn test_float_and_mixed() {
        assert_eq!(eval("1.5f"), Ok(Value::Float(1.5)));
        assert_eq!(eval("1 + 0.5"), Ok(Value::Float(1.5)));
        assert_eq!(eval("2.0 > 1"), Ok(Value::Int(1)));
    }

    #[test]
    fn test_strings_and_chars() {
        assert_eq!(eval(r#""abc" "def""#), Ok(Value::Str("abcdef".into())));
        assert_eq!(eval(r#""tab\there""#), Ok(Value::Str("tab\there".into())));
        assert_eq!(eval("'A'"), Ok(Value::Int(65)));
        assert_eq!(eval(r"'\n'"), Ok(Value::Int(10)));
        assert_eq!(eval(r"'\x41'"), Ok(Value::Int(65)));
    }

    #[test]
    fn test_logical_and_conditional() {
        assert_eq!(eval("1 && 0"), Ok(Value::Int(0)));
        assert_eq!(eval("0 || 3"), Ok(Value::Int(1)));
        assert_eq!(eval("!0"), Ok(Value::Int(1)));
        assert_eq!(eval("1 ? 2 : 3"), Ok(Value::Int(2)));
        assert_eq!(eval("0 ? 2 : 0 ? 3 : 4"), Ok(Value::Int(4)));
    }

    #[test]
    fn test_short_circuit_skips_failing_operand() {
        assert_eq!(eval("1 || 1 / 0"), Ok(Value::Int(1)));
        assert_eq!(eval("0 && UNKNOWN"), Ok(Value::Int(0)));
        assert_eq!(eval("1 / 0"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_identifier_lookup() {
        let mut values = IndexMap::new();
        values.insert(SmolStr::new("M"), Value::Int(1));
        values.insert(SmolStr::new("VALUE"), Value::Int(0x10));
        assert_eq!(eval_str("M + 1", &values), Ok(Value::Int(2)));
        assert_eq!(eval_str("(VALUE|1)", &values), Ok(Value::Int(17)));
        assert_eq!(
            eval_str("N", &values),
            Err(EvalError::UnknownIdentifier("N".into()))
        );
    }

    #[test]
    fn test_casts_preserve_value() {
        assert_eq!(eval("(unsigned long) 5"), Ok(Value::Int(5)));
        assert_eq!(eval("(char *) 0"), Ok(Value::Int(0)));
        assert_eq!(eval("(DWORD)-1"), Ok(Value::Int(-1)));

        let known = |name: &str| (name == "X").then_some(Value::Int(3));
        assert_eq!(eval_str("(X) - 1", &known), Ok(Value::Int(2)));
    }

    #[test]
    fn test_unsupported_constructs() {
        assert!(matches!(eval("sizeof(int)"), Err(EvalError::Unsupported(_))));
        assert!(matches!(eval("f(1)"), Err(EvalError::Unsupported(_))));
        assert_eq!(eval(""), Err(EvalError::Empty));
        assert!(matches!(eval("1 +"), Err(EvalError::Unexpected { .. })));
        assert!(matches!(eval("1 2"), Err(EvalError::Unexpected { .. })));
        assert!(matches!(eval(r#""a" + 1"#), Err(EvalError::TypeMismatch { .. })));
    }
}
