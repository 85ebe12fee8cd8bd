//! Report rendering
//!
//! Turns a [`Report`] into text for the terminal. Three shapes are offered:
//! miette graphical reports with source snippets, a compact one-line-per-
//! construct listing, and pretty JSON. Nothing here prints; callers decide
//! where the text goes.

use crate::diagnostics::{Diagnostic, Severity};
use crate::validator::Report;
use crossterm::style::{Color, Stylize};
use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, SourceCode};
use std::fmt::{self, Write};

/// A diagnostic paired with the source it points into
#[derive(Debug, thiserror::Error)]
#[error("{}", .diagnostic.message)]
pub struct SourceDiagnostic<'a> {
    diagnostic: &'a Diagnostic,
    named: &'a NamedSource<String>,
    source_len: usize,
}

impl<'a> SourceDiagnostic<'a> {
    pub fn new(
        diagnostic: &'a Diagnostic,
        named: &'a NamedSource<String>,
        source_len: usize,
    ) -> Self {
        Self {
            diagnostic,
            named,
            source_len,
        }
    }

    fn label(&self) -> String {
        format!("expected {}", self.diagnostic.expected)
    }
}

impl miette::Diagnostic for SourceDiagnostic<'_> {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        Some(Box::new(self.diagnostic.kind.code()))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diagnostic.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn help<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        self.diagnostic
            .suggested_fix
            .as_ref()
            .map(|fix| Box::new(fix) as Box<dyn fmt::Display + 'b>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(self.named)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.diagnostic.span;
        let start = span.start.min(self.source_len);
        let len = span.end.min(self.source_len).saturating_sub(start);
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.label()),
            (start, len),
        ))))
    }
}

/// Render every diagnostic as a miette graphical report
pub fn render_human(report: &Report, name: &str, source: &str, color: bool) -> String {
    let theme = if color {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let handler = GraphicalReportHandler::new_themed(theme);
    let named = NamedSource::new(name, source.to_string());

    let mut out = String::new();
    for diagnostic in &report.diagnostics {
        let wrapped = SourceDiagnostic::new(diagnostic, &named, source.len());
        if handler.render_report(&mut out, &wrapped).is_err() {
            // Fall back to the plain one-liner
            let _ = writeln!(out, "{name}:{diagnostic}");
        }
    }
    out.push_str(&render_summary(report, color));
    out
}

/// One line per attempted construct
pub fn render_listing(report: &Report, color: bool) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        let position = format!("{}:{}", outcome.location.line, outcome.location.column);
        let construct = outcome
            .kind
            .map_or("unrecognized input", |kind| kind.name());
        let status = if outcome.passed {
            paint("PASS", Color::Green, color)
        } else {
            paint("FAIL", Color::Red, color)
        };

        let _ = write!(out, "{position:>8}  {status}  {construct}");
        if let Some(name) = &outcome.name {
            let _ = write!(out, " '{name}'");
        }
        if let Some(error) = outcome.error {
            let _ = write!(out, " ({})", error.code());
        }
        out.push('\n');
    }
    out.push_str(&render_summary(report, color));
    out
}

/// Totals line shared by the text formats
pub fn render_summary(report: &Report, color: bool) -> String {
    let warnings = report.warnings().count();
    let passed = paint(&report.total_passed.to_string(), Color::Green, color);
    let failed = if report.total_failed > 0 {
        paint(&report.total_failed.to_string(), Color::Red, color)
    } else {
        report.total_failed.to_string()
    };

    let mut line = format!(
        "{} constructs: {passed} passed, {failed} failed",
        report.total_constructs_attempted
    );
    if warnings > 0 {
        let noun = if warnings == 1 { "warning" } else { "warnings" };
        let _ = write!(line, ", {} {noun}", paint(&warnings.to_string(), Color::Yellow, color));
    }
    line.push('\n');
    line
}

pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn paint(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        text.with(color).bold().to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;

    #[test]
    fn test_listing() {
        let report = validate("int age;\nint count\n").unwrap();
        let listing = render_listing(&report, false);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "     1:1  PASS  declaration 'age'");
        assert_eq!(lines[1], "     2:1  FAIL  declaration (MISSING_SEMICOLON)");
        assert_eq!(lines[2], "2 constructs: 1 passed, 1 failed");
    }

    #[test]
    fn test_listing_unrecognized() {
        let report = validate("}").unwrap();
        let listing = render_listing(&report, false);
        assert!(listing.contains("FAIL  unrecognized input (UNEXPECTED_TOKEN)"));
    }

    #[test]
    fn test_summary_counts_warnings() {
        let report = validate("void f() {\n    x = 1\n}").unwrap();
        assert_eq!(
            render_summary(&report, false),
            "1 constructs: 1 passed, 0 failed, 1 warning\n"
        );
    }

    #[test]
    fn test_colored_summary_has_escapes() {
        let report = validate("int age;").unwrap();
        assert!(render_summary(&report, true).contains('\u{1b}'));
        assert!(!render_summary(&report, false).contains('\u{1b}'));
    }

    #[test]
    fn test_human_report() {
        let source = "int age\n";
        let report = validate(source).unwrap();
        let text = render_human(&report, "demo.java", source, false);
        assert!(text.contains("MISSING_SEMICOLON"));
        assert!(text.contains("demo.java"));
        assert!(text.ends_with("1 constructs: 0 passed, 1 failed\n"));
    }

    #[test]
    fn test_labels_clamped_to_source() {
        let report = validate("int age").unwrap();
        let named = NamedSource::new("x.java", "int age".to_string());
        let wrapped = SourceDiagnostic::new(&report.diagnostics[0], &named, 7);
        let labels: Vec<LabeledSpan> = miette::Diagnostic::labels(&wrapped).unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].offset() + labels[0].len() <= 7);
    }

    #[test]
    fn test_json() {
        let report = validate("int age").unwrap();
        let json = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_failed"], 1);
        assert_eq!(value["diagnostics"][0]["kind"], "MISSING_SEMICOLON");
        assert_eq!(value["diagnostics"][0]["severity"], "error");
        assert_eq!(value["outcomes"][0]["kind"], "declaration");
    }
}
