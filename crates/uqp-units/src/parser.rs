//! Recursive-descent parser for unit expressions.
//!
//! ```text
//! expr := term { ("*" | "/" | " ") term }
//! term := atom [ ("^" | "**") ["-"] int ]
//! atom := symbol | "1" | "(" expr ")"
//! ```
//!
//! Operators are left-associative, so `J/mol/K` reads as `(J/mol)/K`.

use uqp_core::{ErrorInfo, UqpError};

use crate::symbols;
use crate::unit::Unit;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i32),
    Star,
    Slash,
    Caret,
    Minus,
    LParen,
    RParen,
}

fn parse_error(expr: &str, message: impl Into<String>) -> UqpError {
    UqpError::Parse(ErrorInfo::new("unit-expression", message).with_context("expression", expr))
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '%' || c == 'µ' || c == 'μ'
}

fn tokenize(expr: &str) -> Result<Vec<Token>, UqpError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '*' => {
                if chars.peek().map(|(_, next)| *next) == Some('*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '·' => tokens.push(Token::Star),
            '/' => tokens.push(Token::Slash),
            '^' => tokens.push(Token::Caret),
            '-' => tokens.push(Token::Minus),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            c if c.is_ascii_digit() => {
                let mut end = idx + c.len_utf8();
                while let Some((next_idx, next)) = chars.peek().copied() {
                    if !next.is_ascii_digit() {
                        break;
                    }
                    end = next_idx + next.len_utf8();
                    chars.next();
                }
                let value = expr[idx..end]
                    .parse::<i32>()
                    .map_err(|err| parse_error(expr, format!("invalid exponent: {err}")))?;
                tokens.push(Token::Int(value));
            }
            c if is_symbol_char(c) => {
                let mut end = idx + c.len_utf8();
                while let Some((next_idx, next)) = chars.peek().copied() {
                    if !is_symbol_char(next) {
                        break;
                    }
                    end = next_idx + next.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Ident(expr[idx..end].to_string()));
            }
            other => {
                return Err(parse_error(
                    expr,
                    format!("unexpected character '{other}' at byte {idx}"),
                ))
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    expr: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_expr(&mut self) -> Result<Unit, UqpError> {
        let mut unit = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    unit = unit.mul(&self.parse_term()?);
                }
                Some(Token::Slash) => {
                    self.advance();
                    unit = unit.div(&self.parse_term()?);
                }
                Some(Token::Ident(_)) | Some(Token::LParen) => {
                    unit = unit.mul(&self.parse_term()?);
                }
                _ => return Ok(unit),
            }
        }
    }

    fn parse_term(&mut self) -> Result<Unit, UqpError> {
        let atom = self.parse_atom()?;
        if self.peek() != Some(&Token::Caret) {
            return Ok(atom);
        }
        self.advance();
        let negative = if self.peek() == Some(&Token::Minus) {
            self.advance();
            true
        } else {
            false
        };
        match self.advance() {
            Some(Token::Int(exp)) => Ok(atom.powi(if negative { -exp } else { exp })),
            _ => Err(parse_error(self.expr, "expected an integer exponent")),
        }
    }

    fn parse_atom(&mut self) -> Result<Unit, UqpError> {
        match self.advance() {
            Some(Token::Ident(name)) => symbols::lookup(&name).ok_or_else(|| {
                UqpError::UnknownUnit(
                    ErrorInfo::new("unknown-symbol", format!("unknown unit '{name}'"))
                        .with_context("expression", self.expr)
                        .with_hint("use SI symbols, optionally prefixed (e.g. km, ms, kPa)"),
                )
            }),
            Some(Token::Int(1)) => Ok(Unit::dimensionless()),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(parse_error(self.expr, "unbalanced parenthesis")),
                }
            }
            Some(token) => Err(parse_error(
                self.expr,
                format!("unexpected token {token:?}"),
            )),
            None => Err(parse_error(self.expr, "unexpected end of expression")),
        }
    }
}

/// Parses a unit expression; an empty expression is the dimensionless unit.
///
/// The resulting unit keeps the trimmed expression as its display symbol.
pub fn parse_unit(expr: &str) -> Result<Unit, UqpError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Ok(Unit::dimensionless());
    }
    let mut parser = Parser {
        expr: trimmed,
        tokens: tokenize(trimmed)?,
        pos: 0,
    };
    let unit = parser.parse_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parse_error(trimmed, "trailing tokens after unit expression"));
    }
    let symbol = if unit.is_dimensionless() && trimmed == "1" {
        String::new()
    } else {
        trimmed.to_string()
    };
    Ok(unit.with_symbol(symbol))
}

/// Splits `"1.5e3 km"` into its numeric literal and the remaining text.
///
/// Returns `None` when the text does not start with a decimal literal.
pub fn split_number(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut idx = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        idx += 1;
    }
    let digits_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    let mut digit_count = idx - digits_start;
    if idx < bytes.len() && bytes[idx] == b'.' {
        idx += 1;
        let frac_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        digit_count += idx - frac_start;
    }
    if digit_count == 0 {
        return None;
    }
    if idx < bytes.len() && matches!(bytes[idx], b'e' | b'E') {
        let mut exp_idx = idx + 1;
        if exp_idx < bytes.len() && matches!(bytes[exp_idx], b'+' | b'-') {
            exp_idx += 1;
        }
        let exp_digits = exp_idx;
        while exp_idx < bytes.len() && bytes[exp_idx].is_ascii_digit() {
            exp_idx += 1;
        }
        if exp_idx > exp_digits {
            idx = exp_idx;
        }
    }
    Some((&text[..idx], &text[idx..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::Dimension;

    #[test]
    fn parses_compound_expressions() {
        let accel = parse_unit("m/s^2").unwrap();
        assert_eq!(accel.dimension(), Dimension::LENGTH.div(&Dimension::TIME.pow(2)));
        assert_eq!(accel.symbol(), "m/s^2");

        let gas = parse_unit("J/(mol*K)").unwrap();
        let chained = parse_unit("J/mol/K").unwrap();
        assert_eq!(gas, chained);
    }

    #[test]
    fn accepts_implicit_multiplication_and_double_star() {
        let torque = parse_unit("N m").unwrap();
        assert_eq!(torque.dimension(), Dimension::ENERGY);
        let area = parse_unit("cm**2").unwrap();
        assert!((area.scale() - 1e-4).abs() < 1e-18);
        let rate = parse_unit("s^-1").unwrap();
        assert_eq!(rate.dimension(), Dimension::FREQUENCY);
        assert_eq!(parse_unit("1/s").unwrap().dimension(), Dimension::FREQUENCY);
    }

    #[test]
    fn reports_unknown_symbols_and_syntax() {
        let err = parse_unit("furlong").unwrap_err();
        assert_eq!(err.family(), "UnknownUnit");
        assert_eq!(parse_unit("m/(s").unwrap_err().family(), "Parse");
        assert_eq!(parse_unit("m^x").unwrap_err().family(), "Parse");
        assert_eq!(parse_unit("m^").unwrap_err().family(), "Parse");
    }

    #[test]
    fn empty_is_dimensionless() {
        assert!(parse_unit("  ").unwrap().is_dimensionless());
        assert_eq!(parse_unit("%").unwrap().scale(), 0.01);
    }

    #[test]
    fn splits_numeric_prefix() {
        assert_eq!(split_number("1.5 m"), Some(("1.5", " m")));
        assert_eq!(split_number("-2e-3km"), Some(("-2e-3", "km")));
        assert_eq!(split_number("3 eV"), Some(("3", " eV")));
        assert_eq!(split_number(".5"), Some((".5", "")));
        assert_eq!(split_number("m"), None);
    }
}
