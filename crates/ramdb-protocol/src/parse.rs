//! Array-literal parser.
//!
//! Decodes the host's textual array form, e.g.
//! `["id", "fn", 1, 3, "say ""hi""", true, "entity"]`. Elements are
//! double-quoted strings (with `""` as an escaped quote), integers,
//! floats, `true`/`false`, or nested arrays. Whitespace between tokens
//! is ignored.

use crate::error::ProtocolError;
use crate::types::Literal;

/// Maximum nesting depth for arrays.
const MAX_NESTING_DEPTH: usize = 64;

/// Parses a complete array literal. Trailing non-whitespace is an error.
pub fn parse_array(text: &str) -> Result<Vec<Literal>, ProtocolError> {
    let mut p = Parser { src: text, pos: 0 };
    p.skip_ws();
    let items = p.array(0)?;
    p.skip_ws();
    if p.pos != p.src.len() {
        return Err(p.error("trailing characters after array"));
    }
    Ok(items)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> ProtocolError {
        ProtocolError::MalformedLiteral(format!("{msg} at offset {}", self.pos))
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ProtocolError> {
        match self.bump() {
            Some(ch) if ch == want => Ok(()),
            Some(_) => Err(self.error(&format!("expected '{want}'"))),
            None => Err(self.error(&format!("expected '{want}', found end of input"))),
        }
    }

    fn array(&mut self, depth: usize) -> Result<Vec<Literal>, ProtocolError> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(self.error("arrays nested too deeply"));
        }
        self.expect('[')?;
        let mut items = Vec::new();

        self.skip_ws();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(items);
        }

        loop {
            self.skip_ws();
            items.push(self.value(depth)?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(items),
                Some(_) => return Err(self.error("expected ',' or ']'")),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn value(&mut self, depth: usize) -> Result<Literal, ProtocolError> {
        match self.peek() {
            Some('"') => self.string().map(Literal::String),
            Some('[') => self.array(depth + 1).map(Literal::Array),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.number(),
            Some(_) => self.word(),
            None => Err(self.error("expected a value")),
        }
    }

    fn string(&mut self) -> Result<String, ProtocolError> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => {
                    if self.peek() == Some('"') {
                        self.bump();
                        out.push('"');
                    } else {
                        return Ok(out);
                    }
                }
                Some(ch) => out.push(ch),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn number(&mut self) -> Result<Literal, ProtocolError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Literal::Integer(n));
        }
        text.parse::<f64>()
            .map(Literal::Float)
            .map_err(|_| self.error(&format!("invalid number '{text}'")))
    }

    fn word(&mut self) -> Result<Literal, ProtocolError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.bump();
        }
        match &self.src[start..self.pos] {
            w if w.eq_ignore_ascii_case("true") => Ok(Literal::Bool(true)),
            w if w.eq_ignore_ascii_case("false") => Ok(Literal::Bool(false)),
            _ => Err(self.error("unexpected token")),
        }
    }
}
