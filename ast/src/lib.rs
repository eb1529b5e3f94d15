//! Meld Expression AST
//!
//! A tagged-variant syntax tree for the declarative expression language that
//! derived properties, operations and constraints are written in. There is
//! no concrete syntax: expressions are built in code with the helpers in
//! [`build`] and the chaining methods on [`Expr`].

pub mod build;
mod expr;

pub use expr::*;
