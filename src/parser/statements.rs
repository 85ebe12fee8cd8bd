//! Statement parsing implementation
//!
//! This module handles the control-flow constructs and block bodies:
//!
//! - Selection: `if (cond) { ... } else if (cond) { ... } else { ... }`
//! - Loops: `while (cond) { ... }`
//! - Blocks: `{ ... }`, whose contents are declarations and statements
//! - Simple statements: assignments, increments, calls and `return`
//!
//! # Grammar
//!
//! ```text
//! if_else   ::= 'if' '(' CONDITION ')' BLOCK [ 'else' ( BLOCK | if_else ) ]
//! while     ::= 'while' '(' CONDITION ')' BLOCK
//! BLOCK     ::= '{' { declaration | array_declaration | if_else | while | statement } '}'
//! statement ::= 'return' [ EXPR ] ';' | EXPR ';'
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::diagnostics::ErrorKind;
use crate::parser::ast::*;
use crate::parser::braces::BraceEnd;
use crate::parser::expressions::ExprForm;
use crate::parser::grammar::Symbol;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{PResult, ParseResult, Parser};

impl Parser<'_> {
    /// Parse an if statement with its optional else chain
    pub(crate) fn parse_if_statement(&mut self) -> PResult<ConstructNode> {
        self.within(ConstructKind::IfElse, |p| {
            let start = p.position;
            let header_column = p.line_head(start);
            p.expect(TokenKind::If, ErrorKind::UnexpectedToken)?;
            p.parse_condition()?;
            let mut children = p.parse_body(header_column, ErrorKind::UnclosedBlock)?;

            if p.match_token(TokenKind::Else) {
                if p.check(TokenKind::If) {
                    children.push(p.parse_if_statement()?);
                } else {
                    let else_column = p.line_head(p.position - 1);
                    children.extend(p.parse_body(else_column, ErrorKind::UnclosedBlock)?);
                }
            }

            Ok(p.node(ConstructKind::IfElse, start, None, children))
        })
    }

    /// Parse a while loop
    pub(crate) fn parse_while_statement(&mut self) -> PResult<ConstructNode> {
        self.within(ConstructKind::While, |p| {
            let start = p.position;
            let header_column = p.line_head(start);
            p.expect(TokenKind::While, ErrorKind::UnexpectedToken)?;
            p.parse_condition()?;
            let children = p.parse_body(header_column, ErrorKind::UnclosedBlock)?;
            Ok(p.node(ConstructKind::While, start, None, children))
        })
    }

    /// Parse `"(" EXPR ")"` after `if` or `while`
    fn parse_condition(&mut self) -> PResult<()> {
        if !self.check(TokenKind::LParen) {
            let kind = if self.paren_before_block() {
                ErrorKind::MissingOpenParen
            } else {
                ErrorKind::MissingConditionParens
            };
            return Err(self.fail(kind, Symbol::Token(TokenKind::LParen).describe()));
        }
        self.advance();

        if self.check(TokenKind::RParen) {
            return Err(self.fail(ErrorKind::EmptyCondition, Symbol::Condition.describe()));
        }
        self.nested(|p| p.parse_expression())?;

        if !self.match_token(TokenKind::RParen) {
            return Err(self.fail(
                ErrorKind::MissingCloseParen,
                Symbol::Token(TokenKind::RParen).describe(),
            ));
        }
        Ok(())
    }

    /// Whether a `)` shows up on the keyword's line before the body starts
    fn paren_before_block(&self) -> bool {
        let line = self.previous().location.line;
        for token in &self.tokens[self.position..] {
            if token.location.line > line {
                return false;
            }
            match token.kind {
                TokenKind::RParen => return true,
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Eof => {
                    return false
                }
                _ => {}
            }
        }
        false
    }

    /// Parse a construct body. A missing `{` fails with `missing`; recovery
    /// then continues after the stray `}` that was meant to close the body.
    pub(crate) fn parse_body(
        &mut self,
        header_column: usize,
        missing: ErrorKind,
    ) -> PResult<Vec<ConstructNode>> {
        if !self.check(TokenKind::LBrace) {
            let mut failure = self.fail(missing, Symbol::Block.describe());
            failure.resume = self.stray_close_after(self.position, header_column);
            return Err(failure);
        }
        self.parse_block()
    }

    /// Parse `{ ... }`, returning the constructs inside.
    ///
    /// A failure anywhere inside resumes after this block; since enclosing
    /// blocks overwrite the resume point on the way out, the outermost block
    /// decides.
    pub(crate) fn parse_block(&mut self) -> PResult<Vec<ConstructNode>> {
        let open = self.position;
        self.expect(TokenKind::LBrace, ErrorKind::UnclosedBlock)?;

        self.block_depth += 1;
        let result = self.parse_block_statements(open);
        self.block_depth -= 1;

        result.map_err(|mut failure| {
            failure.resume = Some(self.skip_else_chain(self.after_block(open)));
            failure
        })
    }

    /// Parse block contents up to and including the closing brace
    fn parse_block_statements(&mut self, open: usize) -> PResult<Vec<ConstructNode>> {
        let end = self.braces.end_of(open);
        let mut children = Vec::new();

        loop {
            if let Some(BraceEnd::Unclosed { implied_end }) = end {
                if self.position >= implied_end {
                    return Err(self.fail_unclosed(open, implied_end));
                }
            }

            match self.peek_kind() {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(children);
                }
                TokenKind::Eof => return Err(self.fail_unclosed(open, self.position)),
                TokenKind::Semicolon => {
                    self.advance();
                }
                _ => children.push(self.parse_nested()?),
            }
        }
    }

    /// Parse one construct inside a block. Functions do not nest.
    fn parse_nested(&mut self) -> PResult<ConstructNode> {
        let candidates: Vec<ConstructKind> = match self.predict() {
            Some(ConstructKind::Function) => Vec::new(),
            _ => self
                .candidates()
                .into_iter()
                .filter(|&kind| kind != ConstructKind::Function)
                .collect(),
        };

        match self.match_best(&candidates) {
            Some((_, ParseResult::Success(node))) => Ok(node),
            Some((_, ParseResult::Failure(failure))) => Err(failure),
            None => Err(self.fail(ErrorKind::UnexpectedToken, "a declaration or statement")),
        }
    }

    /// Parse `return EXPR? ;` or an expression statement
    pub(crate) fn parse_simple_statement(&mut self) -> PResult<ConstructNode> {
        self.within(ConstructKind::Statement, |p| {
            let start = p.position;

            if p.match_token(TokenKind::Return) {
                if p.peek_kind().can_start_expression() {
                    p.parse_expression()?;
                }
            } else if p.parse_expression()? == ExprForm::Other {
                return Err(p.fail_at(
                    ErrorKind::NotAStatement,
                    "an assignment, increment, decrement or call",
                    start,
                ));
            }

            p.expect_semicolon()?;
            Ok(p.node(ConstructKind::Statement, start, None, Vec::new()))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ValidatorConfig;
    use crate::diagnostics::ErrorKind;
    use crate::parser::ast::{ConstructKind, SourceLocation};
    use crate::parser::parse::{Failure, ParseResult, Parser};

    fn parse(source: &str, kind: ConstructKind) -> ParseResult {
        let config = ValidatorConfig::default();
        let mut parser = Parser::new(source, &config);
        parser.match_construct(kind)
    }

    fn failure(source: &str, kind: ConstructKind) -> Box<Failure> {
        match parse(source, kind) {
            ParseResult::Failure(failure) => failure,
            ParseResult::Success(node) => panic!("{source}: expected failure, got {node:?}"),
        }
    }

    fn passes(source: &str, kind: ConstructKind) -> bool {
        matches!(parse(source, kind), ParseResult::Success(_))
    }

    #[test]
    fn test_if_statements() {
        use ConstructKind::IfElse;
        assert!(passes("if (x > 5) {\n    y = 10;\n}", IfElse));
        assert!(passes("if (a) { b = 1; } else { b = 2; }", IfElse));
        assert!(passes("if (a) { b = 1; } else if (c) { b = 2; } else { b = 3; }", IfElse));
        assert!(passes("if (a && !b || c == null) { }", IfElse));
        assert!(passes("if (ready) { start(); return; }", IfElse));
    }

    #[test]
    fn test_else_if_is_a_child() {
        match parse("if (a) { x++; } else if (b) { y++; }", ConstructKind::IfElse) {
            ParseResult::Success(node) => {
                assert_eq!(node.children.len(), 2);
                assert_eq!(node.children[1].kind, ConstructKind::IfElse);
            }
            ParseResult::Failure(f) => panic!("{f:?}"),
        }
    }

    #[test]
    fn test_condition_errors() {
        use ConstructKind::{IfElse, While};
        assert_eq!(
            failure("if x > 5 {\n    count++;\n}", IfElse).kind,
            ErrorKind::MissingConditionParens
        );
        assert_eq!(
            failure("if x > 5) {\n    count++;\n}", IfElse).kind,
            ErrorKind::MissingOpenParen
        );
        assert_eq!(failure("if () {\n    x = 10;\n}", IfElse).kind, ErrorKind::EmptyCondition);
        assert_eq!(
            failure("while (x > 0 {\n    x--;\n}", While).kind,
            ErrorKind::MissingCloseParen
        );
        assert_eq!(failure("while () {\n    count++;\n}", While).kind, ErrorKind::EmptyCondition);
        assert_eq!(
            failure("while count < 10 {\n    count++;\n}", While).kind,
            ErrorKind::MissingConditionParens
        );
    }

    #[test]
    fn test_missing_braces() {
        use ConstructKind::{IfElse, While};
        assert_eq!(failure("while (x) x--;", While).kind, ErrorKind::UnclosedBlock);
        assert_eq!(failure("if (x) { y++; } else y--;", IfElse).kind, ErrorKind::UnclosedBlock);
    }

    #[test]
    fn test_unclosed_block_uses_implied_end() {
        let source = "if (x > 5) {\n    y = 10;\n\n\nif x > 5) {\n    count++;\n}";
        let failure = failure(source, ConstructKind::IfElse);
        assert_eq!(failure.kind, ErrorKind::UnclosedBlock);
        assert_eq!(failure.location, SourceLocation::new(1, 12));
        assert_eq!(failure.found.lexeme, "if");
        assert_eq!(failure.resume, Some(failure.index));
        assert_eq!(failure.found.location.line, 5);
    }

    #[test]
    fn test_unclosed_block_at_eof() {
        let failure = failure("while (x) {\n    x--;\n", ConstructKind::While);
        assert_eq!(failure.kind, ErrorKind::UnclosedBlock);
        assert_eq!(failure.found.lexeme, "");
    }

    #[test]
    fn test_statements() {
        use ConstructKind::Statement;
        assert!(passes("count++;", Statement));
        assert!(passes("--count;", Statement));
        assert!(passes("sum = sum + 1;", Statement));
        assert!(passes("total += price * qty;", Statement));
        assert!(passes("print(x, y);", Statement));
        assert!(passes("obj.method(1);", Statement));
        assert!(passes("arr[i] = 0;", Statement));
        assert!(passes("return;", Statement));
        assert!(passes("return a + b;", Statement));
    }

    #[test]
    fn test_statement_errors() {
        use ConstructKind::Statement;
        assert_eq!(failure("x + 1;", Statement).kind, ErrorKind::NotAStatement);
        assert_eq!(failure("x = ;", Statement).kind, ErrorKind::ExpectedExpression);
        assert_eq!(failure("print(x;", Statement).kind, ErrorKind::MissingCloseParen);
        assert_eq!(failure("count++", Statement).kind, ErrorKind::MissingSemicolon);
    }

    #[test]
    fn test_block_rejects_nested_function() {
        let f = failure("while (x) {\n    int f() { }\n}", ConstructKind::While);
        assert_eq!(f.kind, ErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_empty_statements_in_block() {
        assert!(passes("while (x) { ; x--; ; }", ConstructKind::While));
    }
}
