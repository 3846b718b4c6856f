//! Recursive descent parser for the XPath subset.
//!
//! Grammar:
//!
//! ```text
//! Expr       := Path ('|' Path)*
//! Path       := '/' Relative? | '//' Relative | Relative
//! Relative   := Step (('/' | '//') Step)*
//! Step       := '.' | '..' | (AxisName '::' | '@')? NodeTest Predicate*
//! NodeTest   := Name | '*' | 'text()' | 'node()' | 'comment()'
//! Predicate  := '[' Filter ']'
//! Filter     := Number | 'last()' | 'not(' Filter ')' | Expr (('=' | '!=') Literal)?
//! ```

use super::ast::{Axis, Expr, LocationPath, NodeTest, Predicate, Step};
use super::lexer::{Spanned, Token, tokenize};
use crate::error::{Error, Result};

pub(crate) fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };

    let expr = parser.parse_expr()?;
    if parser.peek().is_some() {
        return Err(parser.error("unexpected token"));
    }
    Ok(expr)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<()> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn error(&self, reason: &str) -> Error {
        let offset = self
            .tokens
            .get(self.pos)
            .map(|s| s.offset)
            .unwrap_or(self.source.len());
        Error::XPath {
            expr: self.source.to_string(),
            offset,
            reason: reason.to_string(),
        }
    }

    /// Whether the next token is a function call on `name`.
    fn at_call(&self, name: &str) -> bool {
        matches!(self.peek(), Some(Token::Name(n)) if n == name)
            && self.peek_at(1) == Some(&Token::LParen)
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Dot | Token::DotDot | Token::At | Token::Star | Token::Name(_))
        )
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut paths = vec![self.parse_path()?];
        while self.eat(&Token::Pipe) {
            paths.push(self.parse_path()?);
        }
        Ok(Expr::union(paths))
    }

    fn parse_path(&mut self) -> Result<LocationPath> {
        match self.peek() {
            Some(Token::Slash) => {
                self.advance();
                let steps = if self.at_step_start() {
                    self.parse_relative()?
                } else {
                    Vec::new()
                };
                Ok(LocationPath {
                    absolute: true,
                    steps,
                })
            }
            Some(Token::DoubleSlash) => {
                self.advance();
                let mut steps = vec![Step::descendant_or_self()];
                steps.extend(self.parse_relative()?);
                Ok(LocationPath {
                    absolute: true,
                    steps,
                })
            }
            _ => Ok(LocationPath::relative(self.parse_relative()?)),
        }
    }

    fn parse_relative(&mut self) -> Result<Vec<Step>> {
        let mut steps = vec![self.parse_step()?];
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.advance();
                    steps.push(self.parse_step()?);
                }
                Some(Token::DoubleSlash) => {
                    self.advance();
                    steps.push(Step::descendant_or_self());
                    steps.push(self.parse_step()?);
                }
                _ => return Ok(steps),
            }
        }
    }

    fn parse_step(&mut self) -> Result<Step> {
        let axis = match self.peek() {
            Some(Token::Dot) => {
                self.advance();
                return Ok(Step::new(Axis::SelfAxis, NodeTest::Node));
            }
            Some(Token::DotDot) => {
                self.advance();
                return Ok(Step::new(Axis::Parent, NodeTest::Node));
            }
            Some(Token::At) => {
                self.advance();
                Axis::Attribute
            }
            Some(Token::Name(name)) if self.peek_at(1) == Some(&Token::ColonColon) => {
                let axis = Axis::from_name(name).ok_or_else(|| self.error("unknown axis"))?;
                self.pos += 2;
                axis
            }
            Some(_) if self.at_step_start() => Axis::Child,
            _ => return Err(self.error("expected a location step")),
        };

        let test = self.parse_node_test()?;
        let mut step = Step::new(axis, test);

        while self.eat(&Token::LBracket) {
            step.predicates.push(self.parse_predicate()?);
            self.expect(Token::RBracket, "']'")?;
        }

        Ok(step)
    }

    fn parse_node_test(&mut self) -> Result<NodeTest> {
        if self.eat(&Token::Star) {
            return Ok(NodeTest::Any);
        }

        let name = match self.peek() {
            Some(Token::Name(name)) => name.clone(),
            _ => return Err(self.error("expected a node test")),
        };

        if self.peek_at(1) != Some(&Token::LParen) {
            self.advance();
            return Ok(NodeTest::Name(name));
        }

        let test = match name.as_str() {
            "text" => NodeTest::Text,
            "node" => NodeTest::Node,
            "comment" => NodeTest::Comment,
            _ => return Err(self.error("unsupported node type test")),
        };
        self.pos += 2;
        self.expect(Token::RParen, "')'")?;
        Ok(test)
    }

    fn parse_predicate(&mut self) -> Result<Predicate> {
        if let Some(&Token::Number(n)) = self.peek() {
            if n < 1.0 || n.fract() != 0.0 {
                return Err(self.error("position must be a positive integer"));
            }
            self.advance();
            return Ok(Predicate::Position(n as usize));
        }

        if self.at_call("last") {
            self.pos += 2;
            self.expect(Token::RParen, "')'")?;
            return Ok(Predicate::Last);
        }

        if self.at_call("not") {
            self.pos += 2;
            let inner = self.parse_predicate()?;
            self.expect(Token::RParen, "')'")?;
            return Ok(Predicate::Not(Box::new(inner)));
        }

        let expr = self.parse_expr()?;
        let equal = match self.peek() {
            Some(Token::Eq) => true,
            Some(Token::NotEq) => false,
            _ => return Ok(Predicate::Exists(expr)),
        };
        self.advance();

        match self.advance() {
            Some(Token::Literal(literal)) => Ok(Predicate::Compare {
                expr,
                literal,
                equal,
            }),
            _ => {
                self.pos -= 1;
                Err(self.error("expected a string literal"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_of(result: Result<Expr>) -> usize {
        match result {
            Err(Error::XPath { offset, .. }) => offset,
            other => panic!("expected an XPath error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_rows_query() {
        let expr = parse("tbody/tr").unwrap();
        assert_eq!(
            expr,
            LocationPath::relative(vec![Step::child("tbody"), Step::child("tr")]).into()
        );
    }

    #[test]
    fn test_union() {
        let expr = parse("td | th").unwrap();
        assert_eq!(expr.paths.len(), 2);
        assert_eq!(expr.paths[1].steps, vec![Step::child("th")]);
    }

    #[test]
    fn test_double_slash_expands() {
        let expr = parse("//table").unwrap();
        let path = &expr.paths[0];
        assert!(path.absolute);
        assert_eq!(
            path.steps,
            vec![Step::descendant_or_self(), Step::child("table")]
        );
    }

    #[test]
    fn test_root_only() {
        let expr = parse("/").unwrap();
        assert!(expr.paths[0].absolute);
        assert!(expr.paths[0].steps.is_empty());
    }

    #[test]
    fn test_axes_and_abbreviations() {
        let expr = parse("../preceding-sibling::*/@id").unwrap();
        let axes: Vec<_> = expr.paths[0].steps.iter().map(|s| s.axis).collect();
        assert_eq!(
            axes,
            vec![Axis::Parent, Axis::PrecedingSibling, Axis::Attribute]
        );
        assert_eq!(expr.paths[0].steps[1].test, NodeTest::Any);
    }

    #[test]
    fn test_predicates() {
        let expr = parse("tr[2][td][not(@hidden)][@class='x'][last()]").unwrap();
        let predicates = &expr.paths[0].steps[0].predicates;
        assert_eq!(predicates.len(), 5);
        assert_eq!(predicates[0], Predicate::Position(2));
        assert!(matches!(predicates[1], Predicate::Exists(_)));
        assert!(matches!(predicates[2], Predicate::Not(_)));
        assert!(matches!(
            &predicates[3],
            Predicate::Compare { literal, equal: true, .. } if literal == "x"
        ));
        assert_eq!(predicates[4], Predicate::Last);
    }

    #[test]
    fn test_selects_values() {
        assert!(parse("text()").unwrap().selects_values());
        assert!(parse("td/@class | th/text()").unwrap().selects_values());
        assert!(!parse("td | th/text()").unwrap().selects_values());
        assert!(!parse("node()").unwrap().selects_values());
        assert!(!parse("/").unwrap().selects_values());
    }

    #[test]
    fn test_errors_report_offsets() {
        assert_eq!(offset_of(parse("")), 0);
        assert_eq!(offset_of(parse("tbody/")), 6);
        assert_eq!(offset_of(parse("tr[0]")), 3);
        assert_eq!(offset_of(parse("tr[1")), 4);
        assert_eq!(offset_of(parse("sideways::td")), 0);
        assert_eq!(offset_of(parse("count(td)")), 0);
        assert_eq!(offset_of(parse("td th")), 3);
        assert_eq!(offset_of(parse("td[.=1]")), 5);
    }
}
