//! Diagnostic engine
//!
//! Maps parser [`Failure`]s to user-facing [`Diagnostic`]s. Every
//! [`ErrorKind`] owns exactly one [`MessageTemplate`] in a static table; the
//! engine only substitutes placeholders, so adding a new error kind means
//! adding a row to the table.
//!
//! # Placeholders
//!
//! | Placeholder   | Value                                        |
//! |---------------|----------------------------------------------|
//! | `{found}`     | the offending token, e.g. `identifier 'x'`   |
//! | `{lexeme}`    | the offending token's raw text               |
//! | `{expected}`  | what the grammar expected at that point      |
//! | `{line}`      | 1-based line of the failure                  |
//! | `{column}`    | 1-based column of the failure                |
//! | `{construct}` | the construct being matched, e.g. `while loop` |
//!
//! `{{` and `}}` produce literal braces.

use crate::parser::ast::{ConstructKind, Span};
use crate::parser::parse::Failure;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// Taxonomy of construct-level syntax errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MissingSemicolon,
    InvalidType,
    InvalidIdentifier,
    MissingIdentifier,
    MalformedBrackets,
    MissingArrayBrackets,
    MissingArraySize,
    MissingOpenParen,
    MissingCloseParen,
    EmptyCondition,
    MissingConditionParens,
    UnclosedBlock,
    MissingOpenBrace,
    MissingReturnType,
    InvalidModifier,
    MissingParamType,
    ExpectedExpression,
    NotAStatement,
    UnexpectedToken,
    NestingTooDeep,
    LexicalError,
}

impl ErrorKind {
    /// Stable code, e.g. `MISSING_SEMICOLON`
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::MissingSemicolon => "MISSING_SEMICOLON",
            ErrorKind::InvalidType => "INVALID_TYPE",
            ErrorKind::InvalidIdentifier => "INVALID_IDENTIFIER",
            ErrorKind::MissingIdentifier => "MISSING_IDENTIFIER",
            ErrorKind::MalformedBrackets => "MALFORMED_BRACKETS",
            ErrorKind::MissingArrayBrackets => "MISSING_ARRAY_BRACKETS",
            ErrorKind::MissingArraySize => "MISSING_ARRAY_SIZE",
            ErrorKind::MissingOpenParen => "MISSING_OPEN_PAREN",
            ErrorKind::MissingCloseParen => "MISSING_CLOSE_PAREN",
            ErrorKind::EmptyCondition => "EMPTY_CONDITION",
            ErrorKind::MissingConditionParens => "MISSING_CONDITION_PARENS",
            ErrorKind::UnclosedBlock => "UNCLOSED_BLOCK",
            ErrorKind::MissingOpenBrace => "MISSING_OPEN_BRACE",
            ErrorKind::MissingReturnType => "MISSING_RETURN_TYPE",
            ErrorKind::InvalidModifier => "INVALID_MODIFIER",
            ErrorKind::MissingParamType => "MISSING_PARAM_TYPE",
            ErrorKind::ExpectedExpression => "EXPECTED_EXPRESSION",
            ErrorKind::NotAStatement => "NOT_A_STATEMENT",
            ErrorKind::UnexpectedToken => "UNEXPECTED_TOKEN",
            ErrorKind::NestingTooDeep => "NESTING_TOO_DEEP",
            ErrorKind::LexicalError => "LEXICAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Message and optional fix text for one error kind
#[derive(Debug, Clone, Copy)]
pub struct MessageTemplate {
    pub kind: ErrorKind,
    pub message: &'static str,
    pub fix: Option<&'static str>,
}

const fn template(
    kind: ErrorKind,
    message: &'static str,
    fix: Option<&'static str>,
) -> MessageTemplate {
    MessageTemplate { kind, message, fix }
}

pub static TEMPLATES: &[MessageTemplate] = &[
    template(
        ErrorKind::MissingSemicolon,
        "missing ';' at the end of the {construct}",
        Some("add ';' at line {line}, column {column}"),
    ),
    template(
        ErrorKind::InvalidType,
        "'{lexeme}' is not a known type",
        Some("use a known type such as int, float, char, boolean or String"),
    ),
    template(
        ErrorKind::InvalidIdentifier,
        "'{lexeme}' is not a valid identifier",
        Some("identifiers must start with a letter or '_'"),
    ),
    template(
        ErrorKind::MissingIdentifier,
        "expected {expected} in the {construct}, found {found}",
        Some("add a name after the type"),
    ),
    template(
        ErrorKind::MalformedBrackets,
        "malformed array brackets in the {construct}: found {found}",
        Some("write the brackets as '[]' after the type or after the name"),
    ),
    template(
        ErrorKind::MissingArrayBrackets,
        "an array value is assigned to a variable declared without '[]'",
        Some("declare the variable as an array, e.g. 'int[] name'"),
    ),
    template(
        ErrorKind::MissingArraySize,
        "array creation is missing its size",
        Some("put a size between the brackets, e.g. 'new int[10]'"),
    ),
    template(
        ErrorKind::MissingOpenParen,
        "missing '(' before the condition of the {construct}",
        Some("add '(' before {found}"),
    ),
    template(
        ErrorKind::MissingCloseParen,
        "missing ')' in the {construct}: expected {expected}, found {found}",
        Some("add ')' before {found}"),
    ),
    template(
        ErrorKind::EmptyCondition,
        "the {construct} has an empty condition",
        Some("put a boolean expression between the parentheses"),
    ),
    template(
        ErrorKind::MissingConditionParens,
        "the condition of the {construct} is not enclosed in parentheses",
        Some("wrap the condition in '(' and ')'"),
    ),
    template(
        ErrorKind::UnclosedBlock,
        "unclosed block in the {construct}: expected {expected}, found {found}",
        Some("make sure every '{{' has a matching '}}'"),
    ),
    template(
        ErrorKind::MissingOpenBrace,
        "missing '{{' before the body of the {construct}",
        Some("add '{{' after the parameter list"),
    ),
    template(
        ErrorKind::MissingReturnType,
        "missing or unknown return type before {found}",
        Some("add a return type such as 'void' or 'int'"),
    ),
    template(
        ErrorKind::InvalidModifier,
        "'{lexeme}' is not a valid access modifier",
        Some("use public, private, protected, static or final, or remove '{lexeme}'"),
    ),
    template(
        ErrorKind::MissingParamType,
        "parameter '{lexeme}' has no type",
        Some("declare the parameter with a type, e.g. 'int {lexeme}'"),
    ),
    template(
        ErrorKind::ExpectedExpression,
        "expected an expression in the {construct}, found {found}",
        None,
    ),
    template(
        ErrorKind::NotAStatement,
        "expression starting with {found} is not a statement",
        Some("only assignments, increments, decrements and calls can stand alone"),
    ),
    template(
        ErrorKind::UnexpectedToken,
        "unexpected {found}; expected {expected}",
        None,
    ),
    template(
        ErrorKind::NestingTooDeep,
        "the {construct} is nested too deeply",
        Some("split deeply nested code into separate functions"),
    ),
    template(
        ErrorKind::LexicalError,
        "{found} is not valid input",
        Some("remove the stray characters or close the literal or comment"),
    ),
];

static TEMPLATE_INDEX: Lazy<FxHashMap<ErrorKind, &'static MessageTemplate>> =
    Lazy::new(|| TEMPLATES.iter().map(|t| (t.kind, t)).collect());

/// Template for `kind`
pub fn template_for(kind: ErrorKind) -> Option<&'static MessageTemplate> {
    TEMPLATE_INDEX.get(&kind).copied()
}

/// A reported problem, ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub construct: Option<ConstructKind>,
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub span: Span,
    pub message: String,
    pub expected: String,
    pub found: String,
    pub suggested_fix: Option<String>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]",
            self.line, self.column, self.message, self.kind
        )
    }
}

/// Map a construct failure to an error diagnostic
pub fn to_diagnostic(failure: &Failure) -> Diagnostic {
    build(failure, Severity::Error)
}

/// Map a tolerated failure to a warning diagnostic
pub fn to_warning(failure: &Failure) -> Diagnostic {
    build(failure, Severity::Warning)
}

fn build(failure: &Failure, severity: Severity) -> Diagnostic {
    let (message, suggested_fix) = match template_for(failure.kind) {
        Some(template) => (
            render_template(template.message, failure),
            template.fix.map(|fix| render_template(fix, failure)),
        ),
        None => (format!("{} at {}", failure.kind, failure.location), None),
    };

    Diagnostic {
        kind: failure.kind,
        construct: failure.construct,
        severity,
        line: failure.location.line,
        column: failure.location.column,
        span: failure.span,
        message,
        expected: failure.expected.clone(),
        found: failure.found.to_string(),
        suggested_fix,
    }
}

fn placeholder(name: &str, failure: &Failure) -> Option<String> {
    let value = match name {
        "found" => failure.found.to_string(),
        "lexeme" => failure.found.lexeme.clone(),
        "expected" => failure.expected.clone(),
        "line" => failure.location.line.to_string(),
        "column" => failure.location.column.to_string(),
        "construct" => failure
            .construct
            .map_or_else(|| "input".to_string(), |kind| kind.name().to_string()),
        _ => return None,
    };
    Some(value)
}

/// Substitute `{name}` placeholders; unknown names are kept verbatim
pub fn render_template(template: &str, failure: &Failure) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                match placeholder(&name, failure) {
                    Some(value) if closed => out.push_str(&value),
                    _ => {
                        out.push('{');
                        out.push_str(&name);
                        if closed {
                            out.push('}');
                        }
                    }
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceLocation;
    use crate::parser::lexer::{Token, TokenKind};

    fn failure(kind: ErrorKind, lexeme: &str, token_kind: TokenKind) -> Failure {
        Failure {
            kind,
            construct: Some(ConstructKind::Declaration),
            location: SourceLocation::new(3, 7),
            span: Span::new(20, 20 + lexeme.len()),
            expected: "';'".to_string(),
            found: Token {
                kind: token_kind,
                lexeme: lexeme.to_string(),
                location: SourceLocation::new(3, 7),
                span: Span::new(20, 20 + lexeme.len()),
            },
            index: 4,
            progress: 2,
            resume: None,
        }
    }

    #[test]
    fn test_every_kind_has_one_template() {
        let kinds = [
            ErrorKind::MissingSemicolon,
            ErrorKind::InvalidType,
            ErrorKind::InvalidIdentifier,
            ErrorKind::MissingIdentifier,
            ErrorKind::MalformedBrackets,
            ErrorKind::MissingArrayBrackets,
            ErrorKind::MissingArraySize,
            ErrorKind::MissingOpenParen,
            ErrorKind::MissingCloseParen,
            ErrorKind::EmptyCondition,
            ErrorKind::MissingConditionParens,
            ErrorKind::UnclosedBlock,
            ErrorKind::MissingOpenBrace,
            ErrorKind::MissingReturnType,
            ErrorKind::InvalidModifier,
            ErrorKind::MissingParamType,
            ErrorKind::ExpectedExpression,
            ErrorKind::NotAStatement,
            ErrorKind::UnexpectedToken,
            ErrorKind::NestingTooDeep,
            ErrorKind::LexicalError,
        ];
        assert_eq!(TEMPLATES.len(), kinds.len());
        for kind in kinds {
            assert_eq!(template_for(kind).map(|t| t.kind), Some(kind));
        }
    }

    #[test]
    fn test_placeholders() {
        let f = failure(ErrorKind::InvalidType, "invalidType", TokenKind::Ident);
        assert_eq!(
            render_template("{lexeme} at {line}:{column} in {construct}; found {found}", &f),
            "invalidType at 3:7 in declaration; found identifier 'invalidType'"
        );
    }

    #[test]
    fn test_escaped_braces_and_unknown_names() {
        let f = failure(ErrorKind::UnclosedBlock, "}", TokenKind::RBrace);
        assert_eq!(render_template("'{{' and '}}'", &f), "'{' and '}'");
        assert_eq!(render_template("{nope} {lexeme", &f), "{nope} {lexeme");
    }

    #[test]
    fn test_to_diagnostic() {
        let f = failure(ErrorKind::MissingSemicolon, "invalidType", TokenKind::Ident);
        let diagnostic = to_diagnostic(&f);
        assert_eq!(diagnostic.kind, ErrorKind::MissingSemicolon);
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!((diagnostic.line, diagnostic.column), (3, 7));
        assert_eq!(diagnostic.message, "missing ';' at the end of the declaration");
        assert_eq!(diagnostic.suggested_fix.as_deref(), Some("add ';' at line 3, column 7"));
        assert_eq!(diagnostic.expected, "';'");
        assert_eq!(diagnostic.found, "identifier 'invalidType'");
        assert_eq!(
            diagnostic.to_string(),
            "3:7: missing ';' at the end of the declaration [MISSING_SEMICOLON]"
        );
    }

    #[test]
    fn test_to_warning() {
        let f = failure(ErrorKind::MissingSemicolon, "}", TokenKind::RBrace);
        let warning = to_warning(&f);
        assert_eq!(warning.severity, Severity::Warning);
        assert!(!warning.is_error());
    }

    #[test]
    fn test_unclosed_block_fix_escapes_braces() {
        let f = failure(ErrorKind::UnclosedBlock, "if", TokenKind::If);
        let diagnostic = to_diagnostic(&f);
        assert_eq!(
            diagnostic.suggested_fix.as_deref(),
            Some("make sure every '{' has a matching '}'")
        );
    }

    #[test]
    fn test_error_kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::MissingArraySize).unwrap();
        assert_eq!(json, "\"MISSING_ARRAY_SIZE\"");
        assert_eq!(ErrorKind::MissingArraySize.to_string(), "MISSING_ARRAY_SIZE");
    }
}
