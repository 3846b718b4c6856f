//! Tokenizer for XPath expressions.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    Pipe,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Dot,
    DotDot,
    ColonColon,
    Star,
    Eq,
    NotEq,
    Name(String),
    Literal(String),
    Number(f64),
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn tokenize(expr: &str) -> Result<Vec<Spanned>> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    let error = |offset: usize, reason: &str| Error::XPath {
        expr: expr.to_string(),
        offset,
        reason: reason.to_string(),
    };

    while pos < bytes.len() {
        let start = pos;
        let b = bytes[pos];

        let token = match b {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos += 2;
                Token::DoubleSlash
            }
            b'/' => {
                pos += 1;
                Token::Slash
            }
            b'|' => {
                pos += 1;
                Token::Pipe
            }
            b'[' => {
                pos += 1;
                Token::LBracket
            }
            b']' => {
                pos += 1;
                Token::RBracket
            }
            b'(' => {
                pos += 1;
                Token::LParen
            }
            b')' => {
                pos += 1;
                Token::RParen
            }
            b'@' => {
                pos += 1;
                Token::At
            }
            b'*' => {
                pos += 1;
                Token::Star
            }
            b'=' => {
                pos += 1;
                Token::Eq
            }
            b'!' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 2;
                Token::NotEq
            }
            b':' if bytes.get(pos + 1) == Some(&b':') => {
                pos += 2;
                Token::ColonColon
            }
            b'.' if bytes.get(pos + 1) == Some(&b'.') => {
                pos += 2;
                Token::DotDot
            }
            b'.' if bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) => {
                pos = scan_number(bytes, pos);
                Token::Number(parse_number(&expr[start..pos]).ok_or_else(|| error(start, "invalid number"))?)
            }
            b'.' => {
                pos += 1;
                Token::Dot
            }
            b'0'..=b'9' => {
                pos = scan_number(bytes, pos);
                Token::Number(parse_number(&expr[start..pos]).ok_or_else(|| error(start, "invalid number"))?)
            }
            b'\'' | b'"' => {
                let close = expr[pos + 1..]
                    .find(b as char)
                    .ok_or_else(|| error(start, "unterminated string literal"))?;
                let literal = expr[pos + 1..pos + 1 + close].to_string();
                pos += close + 2;
                Token::Literal(literal)
            }
            _ => {
                let rest = &expr[pos..];
                let mut chars = rest.char_indices();
                match chars.next() {
                    Some((_, c)) if c.is_alphabetic() || c == '_' => {}
                    _ => return Err(error(start, "unexpected character")),
                }
                let len = chars
                    .find(|&(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                pos += len;
                Token::Name(rest[..len].to_string())
            }
        };

        tokens.push(Spanned {
            token,
            offset: start,
        });
    }

    Ok(tokens)
}

fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(pos) {
        match b {
            b'0'..=b'9' => pos += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                pos += 1;
            }
            _ => break,
        }
    }
    pos
}

fn parse_number(text: &str) -> Option<f64> {
    text.parse().ok()
}
