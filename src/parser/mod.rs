//! Java-subset source parser
//!
//! This module turns source text into matched constructs or structured
//! failures:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`grammar`]: Declarative construct rules, FIRST sets and EBNF
//! - [`braces`]: `{`/`}` pairing pre-pass used for recovery
//! - [`parse`]: The parser, prediction and resynchronization
//! - [`ast`]: Construct node definitions
//!
//! # Supported Subset
//!
//! - Variable declarations with an optional initializer
//! - Array declarations with either bracket placement
//! - `if`/`else` chains and `while` loops with braced bodies
//! - Function declarations with typed parameters
//! - Simple statements: assignments, increments, calls and `return`
//!
//! # Parser Implementation
//!
//! Hand-written predictive recursive descent parser with precedence climbing
//! for binary operators. No external parser generator dependencies.

pub mod ast;
pub mod braces;
mod declarations;
pub(crate) mod expressions;
pub mod grammar;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{Failure, ParseResult, Parser};
