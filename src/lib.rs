//! # Introduction
//!
//! javacheck validates source text written in a small subset of Java. It
//! reports, for every top-level construct, whether it is well formed and, when
//! it is not, a diagnostic naming the problem, its position, what was expected
//! and what was found. Validation never stops at the first error: after a
//! malformed construct the parser resynchronizes and carries on.
//!
//! ## Validation pipeline
//!
//! ```text
//! Source → Lexer → Parser (predict, trial, recover) → Diagnostics → Report
//! ```
//!
//! 1. [`parser::lexer`] turns text into tokens, keeping lexical problems as
//!    error tokens instead of aborting.
//! 2. [`parser::grammar`] holds the construct rules as data.
//! 3. [`parser::parse`] predicts which construct starts at the cursor, tries
//!    it, and skips to the next construct boundary on failure.
//! 4. [`diagnostics`] maps each failure to a templated message and fix.
//! 5. [`validator`] drives the loop and aggregates a [`Report`].
//! 6. [`render`] formats reports for the terminal; not needed by library
//!    users who consume [`Report`] directly.
//!
//! ## Supported subset
//!
//! Declarations: variables and arrays (`int[] a` and `int a[]`), functions
//! with typed parameters. Control flow: `if/else`, `while`. Statements:
//! assignment, increment, decrement, calls, `return`.
//!
//! ```
//! let report = javacheck::validate("int age;\nint count").unwrap();
//! assert_eq!(report.total_passed, 1);
//! assert_eq!(report.total_failed, 1);
//! ```

pub mod config;
pub mod diagnostics;
pub mod parser;
pub mod render;
pub mod validator;

pub use config::{ConfigError, ValidatorConfig};
pub use diagnostics::{Diagnostic, ErrorKind, Severity};
pub use validator::{validate, ConstructOutcome, Report, ValidateError, Validator};
