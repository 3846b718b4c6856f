//! A small XPath 1.0 subset: location paths, the common axes, node tests,
//! positional and comparison predicates, and unions.
//!
//! Expressions are parsed once into an [`Expr`] and evaluated per context
//! node. Evaluation cannot fail; every error is reported by [`parse`].

mod ast;
mod eval;
mod lexer;
mod parser;

pub(crate) use ast::{Expr, LocationPath, Step};
pub(crate) use eval::evaluate;
pub(crate) use parser::parse;
