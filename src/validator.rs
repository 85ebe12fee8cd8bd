//! Validation driver and report builder
//!
//! [`Validator::validate`] runs lexer → parser → diagnostics over a whole
//! input and aggregates the per-construct outcomes into a [`Report`]. It does
//! no I/O and never prints.

use crate::config::ValidatorConfig;
use crate::diagnostics::{to_diagnostic, to_warning, Diagnostic, ErrorKind};
use crate::parser::ast::{ConstructKind, ConstructNode, SourceLocation, Span};
use crate::parser::{Failure, ParseResult, Parser};
use miette::Diagnostic as MietteDiagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Whole-call failures
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ValidateError {
    #[error("input is {size} bytes, over the {limit} byte limit")]
    #[diagnostic(
        code(javacheck::resource_limit),
        help("raise max_input_bytes or split the input")
    )]
    ResourceLimitExceeded { size: usize, limit: usize },
}

impl ValidateError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidateError::ResourceLimitExceeded { .. } => "RESOURCE_LIMIT_EXCEEDED",
        }
    }
}

/// Result for one attempted top-level construct
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructOutcome {
    /// Construct the validator took this to be; None for unrecognized input
    pub kind: Option<ConstructKind>,
    pub name: Option<String>,
    pub location: SourceLocation,
    pub span: Span,
    pub passed: bool,
    /// Error that failed the construct
    pub error: Option<ErrorKind>,
}

/// Final result of a validation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total_constructs_attempted: usize,
    pub total_passed: usize,
    pub total_failed: usize,
    /// Errors and warnings in detection order
    pub diagnostics: Vec<Diagnostic>,
    pub outcomes: Vec<ConstructOutcome>,
}

impl Report {
    /// True when every construct passed
    pub fn is_valid(&self) -> bool {
        self.total_failed == 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

#[derive(Debug, Default)]
struct ReportBuilder {
    diagnostics: Vec<Diagnostic>,
    outcomes: Vec<ConstructOutcome>,
}

impl ReportBuilder {
    fn passed(&mut self, node: &ConstructNode) {
        self.outcomes.push(ConstructOutcome {
            kind: Some(node.kind),
            name: node.name.clone(),
            location: node.location,
            span: node.span,
            passed: true,
            error: None,
        });
    }

    fn failed(
        &mut self,
        kind: Option<ConstructKind>,
        failure: &Failure,
        parser: &Parser<'_>,
        start: usize,
    ) {
        let first = &parser.tokens()[start];
        self.outcomes.push(ConstructOutcome {
            kind,
            name: None,
            location: first.location,
            span: first.span,
            passed: false,
            error: Some(failure.kind),
        });
        self.diagnostics.push(to_diagnostic(failure));
    }

    fn warning(&mut self, failure: &Failure) {
        self.diagnostics.push(to_warning(failure));
    }

    fn finish(self) -> Report {
        let total_passed = self.outcomes.iter().filter(|o| o.passed).count();
        Report {
            total_constructs_attempted: self.outcomes.len(),
            total_passed,
            total_failed: self.outcomes.len() - total_passed,
            diagnostics: self.diagnostics,
            outcomes: self.outcomes,
        }
    }
}

/// Validates source text against the configured grammar subset
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a whole input
    pub fn validate(&self, source: &str) -> Result<Report, ValidateError> {
        if source.len() > self.config.max_input_bytes {
            return Err(ValidateError::ResourceLimitExceeded {
                size: source.len(),
                limit: self.config.max_input_bytes,
            });
        }

        let mut parser = Parser::new(source, &self.config);
        let mut report = ReportBuilder::default();

        while !parser.is_at_end() {
            if parser.skip_empty_statements() {
                continue;
            }

            let start = parser.position();
            let candidates = parser.candidates();
            match parser.match_best(&candidates) {
                Some((_, ParseResult::Success(node))) => {
                    report.passed(&node);
                    for warning in parser.take_warnings() {
                        report.warning(&warning);
                    }
                }
                Some((kind, ParseResult::Failure(failure))) => {
                    report.failed(Some(kind), &failure, &parser, start);
                    parser.recover(&failure, start);
                }
                None => {
                    let failure = parser.unexpected();
                    report.failed(None, &failure, &parser, start);
                    parser.recover(&failure, start);
                }
            }
        }

        let report = report.finish();
        debug!(
            attempted = report.total_constructs_attempted,
            passed = report.total_passed,
            failed = report.total_failed,
            "validation finished"
        );
        Ok(report)
    }
}

/// Validate `source` with the default configuration
pub fn validate(source: &str) -> Result<Report, ValidateError> {
    Validator::default().validate(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    fn kinds(report: &Report) -> Vec<ErrorKind> {
        report.errors().map(|d| d.kind).collect()
    }

    #[test]
    fn test_single_declaration() {
        let report = validate("int age;").unwrap();
        assert_eq!(report.total_constructs_attempted, 1);
        assert_eq!(report.total_passed, 1);
        assert_eq!(report.total_failed, 0);
        assert!(report.is_valid());
        assert_eq!(report.outcomes[0].name.as_deref(), Some("age"));
    }

    #[test]
    fn test_missing_semicolon() {
        let report = validate("int age").unwrap();
        assert_eq!(report.total_failed, 1);
        assert_eq!(kinds(&report), vec![ErrorKind::MissingSemicolon]);
        assert_eq!(report.diagnostics[0].line, 1);
        assert_eq!(report.outcomes[0].error, Some(ErrorKind::MissingSemicolon));
    }

    #[test]
    fn test_stray_tokens() {
        let report = validate("int a;\n}\nint b;").unwrap();
        assert_eq!(report.total_constructs_attempted, 3);
        assert_eq!(report.total_failed, 1);
        assert_eq!(kinds(&report), vec![ErrorKind::UnexpectedToken]);
        assert_eq!(report.outcomes[1].kind, None);
        assert_eq!(
            report.diagnostics[0].expected,
            crate::parser::grammar::construct_start_description()
        );
    }

    #[test]
    fn test_lexical_error_consumed_alone() {
        let report = validate("int a; @@ int b;").unwrap();
        assert_eq!(kinds(&report), vec![ErrorKind::LexicalError]);
        assert_eq!(report.total_passed, 2);
    }

    #[test]
    fn test_empty_statements_are_skipped() {
        let report = validate(";; int a; ;").unwrap();
        assert_eq!(report.total_constructs_attempted, 1);
        assert!(report.is_valid());
    }

    #[test]
    fn test_warning_does_not_fail() {
        let report = validate("void f() {\n    x = 1\n}").unwrap();
        assert!(report.is_valid());
        let warnings: Vec<&Diagnostic> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert_eq!(warnings[0].kind, ErrorKind::MissingSemicolon);
    }

    #[test]
    fn test_resource_limit() {
        let validator = Validator::new(ValidatorConfig::default().with_max_input_bytes(4));
        let err = validator.validate("int age;").unwrap_err();
        assert_eq!(err, ValidateError::ResourceLimitExceeded { size: 8, limit: 4 });
        assert_eq!(err.code(), "RESOURCE_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_custom_types() {
        let source = "Point origin;";
        assert_eq!(kinds(&validate(source).unwrap()), vec![ErrorKind::InvalidType]);

        let validator = Validator::new(ValidatorConfig::default().with_type("Point"));
        assert!(validator.validate(source).unwrap().is_valid());
    }

    #[test]
    fn test_empty_input() {
        let report = validate("").unwrap();
        assert_eq!(report.total_constructs_attempted, 0);
        assert!(report.is_valid());
    }

    #[test]
    fn test_validator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();
        assert_send_sync::<Report>();
    }
}
