//! Expression parsing implementation
//!
//! This module handles expressions using precedence climbing for binary
//! operators and recursive descent for other expression forms. Expressions
//! are only checked for shape; the parser reports what kind of expression it
//! saw so statements can reject ones with no effect.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, characters, strings, `true`, `false`, `null`
//! - Identifiers
//! - Binary operators: arithmetic, comparison, logical
//! - Unary operators: `-`, `!`, `++`, `--`
//! - Postfix: `()`, `[]`, `.`, `++`, `--`
//! - Assignment: `=`, `+=`, `-=`, `*=`, `/=`
//! - Array creation: `new T[size]`, `new T[] { ... }`
//!
//! # Precedence
//!
//! From loosest to tightest: assignment, `||`, `&&`, equality, relational,
//! additive, multiplicative, unary, postfix, primary.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::diagnostics::ErrorKind;
use crate::parser::grammar::Symbol;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{PResult, Parser};

/// Shape of a parsed expression, as far as statements care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprForm {
    Assignment,
    Update,
    Call,
    Other,
}

impl Parser<'_> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> PResult<ExprForm> {
        self.parse_assignment()
    }

    /// Parse assignment (right-associative)
    fn parse_assignment(&mut self) -> PResult<ExprForm> {
        let target = self.parse_logical_or()?;

        if matches!(
            self.peek_kind(),
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
        ) {
            self.advance();
            self.nested(|p| p.parse_assignment())?;
            return Ok(ExprForm::Assignment);
        }

        Ok(target)
    }

    /// One left-associative binary level
    fn parse_binary(
        &mut self,
        operators: &[TokenKind],
        operand: fn(&mut Self) -> PResult<ExprForm>,
    ) -> PResult<ExprForm> {
        let mut form = operand(self)?;
        while operators.contains(&self.peek_kind()) {
            self.advance();
            operand(self)?;
            form = ExprForm::Other;
        }
        Ok(form)
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> PResult<ExprForm> {
        self.parse_binary(&[TokenKind::OrOr], Self::parse_logical_and)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> PResult<ExprForm> {
        self.parse_binary(&[TokenKind::AndAnd], Self::parse_equality)
    }

    /// Parse equality (== !=)
    fn parse_equality(&mut self) -> PResult<ExprForm> {
        self.parse_binary(&[TokenKind::EqEq, TokenKind::NotEq], Self::parse_relational)
    }

    /// Parse relational (< <= > >=)
    fn parse_relational(&mut self) -> PResult<ExprForm> {
        self.parse_binary(
            &[TokenKind::Lt, TokenKind::Le, TokenKind::Gt, TokenKind::Ge],
            Self::parse_additive,
        )
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> PResult<ExprForm> {
        self.parse_binary(&[TokenKind::Plus, TokenKind::Minus], Self::parse_multiplicative)
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> PResult<ExprForm> {
        self.parse_binary(
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::parse_unary,
        )
    }

    /// Parse unary operators
    fn parse_unary(&mut self) -> PResult<ExprForm> {
        match self.peek_kind() {
            TokenKind::Minus | TokenKind::Bang => {
                self.advance();
                self.nested(|p| p.parse_unary())?;
                Ok(ExprForm::Other)
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.advance();
                self.nested(|p| p.parse_unary())?;
                Ok(ExprForm::Update)
            }
            _ => self.parse_postfix(),
        }
    }

    /// Parse postfix operators: calls, indexing, member access, ++ and --
    fn parse_postfix(&mut self) -> PResult<ExprForm> {
        let mut form = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    self.parse_arguments()?;
                    form = ExprForm::Call;
                }
                TokenKind::LBracket => {
                    self.advance();
                    self.nested(|p| p.parse_expression())?;
                    self.expect(TokenKind::RBracket, ErrorKind::MalformedBrackets)?;
                    form = ExprForm::Other;
                }
                TokenKind::Dot => {
                    self.advance();
                    self.expect_identifier()?;
                    form = ExprForm::Other;
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    self.advance();
                    form = ExprForm::Update;
                }
                _ => return Ok(form),
            }
        }
    }

    /// Parse call arguments after `(`, including the closing `)`
    fn parse_arguments(&mut self) -> PResult<()> {
        if self.match_token(TokenKind::RParen) {
            return Ok(());
        }
        loop {
            self.nested(|p| p.parse_expression())?;
            if self.match_token(TokenKind::Comma) {
                continue;
            }
            if self.match_token(TokenKind::RParen) {
                return Ok(());
            }
            return Err(self.fail(ErrorKind::MissingCloseParen, "',' or ')'"));
        }
    }

    /// Parse primary expressions
    fn parse_primary(&mut self) -> PResult<ExprForm> {
        let kind = self.peek_kind();
        if kind.is_literal() || kind == TokenKind::Ident {
            self.advance();
            return Ok(ExprForm::Other);
        }

        match kind {
            TokenKind::LParen => {
                self.advance();
                self.nested(|p| p.parse_expression())?;
                if !self.match_token(TokenKind::RParen) {
                    return Err(self.fail(
                        ErrorKind::MissingCloseParen,
                        Symbol::Token(TokenKind::RParen).describe(),
                    ));
                }
                Ok(ExprForm::Other)
            }
            TokenKind::New => {
                self.parse_array_creation()?;
                Ok(ExprForm::Other)
            }
            _ => Err(self.fail(ErrorKind::ExpectedExpression, Symbol::Expr.describe())),
        }
    }
}
