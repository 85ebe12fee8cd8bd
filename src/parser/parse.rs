//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! the [`Failure`] record, cursor helpers, construct prediction, and
//! resynchronization after a failed construct.
//!
//! # Parser Architecture
//!
//! The Parser is a predictive recursive-descent parser with the following
//! organization:
//! - This module: Parser struct, helper methods, prediction and recovery
//! - `declarations`: variable, array and function declarations
//! - `statements`: if/else, while, blocks and simple statements
//! - `expressions`: expressions with precedence climbing
//! - `braces`: the `{`/`}` pairing pre-pass used by blocks and recovery
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! Each top-level attempt goes through [`Parser::match_construct`], which
//! rolls the cursor (and any warnings) back when the construct fails. Nothing
//! inside a construct backtracks. Between constructs, [`Parser::match_best`]
//! tries the rule picked by bounded lookahead in [`Parser::predict`] first,
//! then the other rules that can start at the cursor, and keeps the failure
//! that got furthest.

use crate::config::ValidatorConfig;
use crate::diagnostics::ErrorKind;
use crate::parser::ast::*;
use crate::parser::braces::{starts_line, BraceEnd, BraceMap};
use crate::parser::grammar::{self, Symbol};
use crate::parser::lexer::{tokenize, Token, TokenKind};
use tracing::{debug, trace};

/// Why a construct did not match, and where to continue
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: ErrorKind,
    /// Innermost construct being matched when the failure occurred
    pub construct: Option<ConstructKind>,
    pub location: SourceLocation,
    pub span: Span,
    /// What the grammar expected at the failure point
    pub expected: String,
    pub found: Token,
    /// Token index of `found`
    pub index: usize,
    /// Tokens matched before the failure
    pub progress: usize,
    /// Token index where matching should continue, if known
    pub resume: Option<usize>,
}

pub type PResult<T> = Result<T, Box<Failure>>;

/// Outcome of one construct attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    Success(ConstructNode),
    Failure(Box<Failure>),
}

/// Predictive recursive descent parser for the validated subset
pub struct Parser<'c> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) config: &'c ValidatorConfig,
    pub(crate) braces: BraceMap,
    /// Column of the first token on each token's line
    line_heads: Vec<usize>,
    constructs: Vec<ConstructKind>,
    depth: usize,
    pub(crate) block_depth: usize,
    warnings: Vec<Failure>,
}

impl<'c> Parser<'c> {
    pub fn new(source: &str, config: &'c ValidatorConfig) -> Self {
        let tokens: Vec<Token> = tokenize(source).collect();
        debug!(tokens = tokens.len(), bytes = source.len(), "tokenized input");

        let braces = BraceMap::build(&tokens);
        let mut line_heads = Vec::with_capacity(tokens.len());
        let mut head = 1;
        for i in 0..tokens.len() {
            if starts_line(&tokens, i) {
                head = tokens[i].location.column;
            }
            line_heads.push(head);
        }

        Self {
            tokens,
            position: 0,
            config,
            braces,
            line_heads,
            constructs: Vec::new(),
            depth: 0,
            block_depth: 0,
            warnings: Vec::new(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Warnings recorded by successful constructs since the last call
    pub fn take_warnings(&mut self) -> Vec<Failure> {
        std::mem::take(&mut self.warnings)
    }

    /// Skip lone `;` tokens; true if any were skipped
    pub fn skip_empty_statements(&mut self) -> bool {
        let start = self.position;
        while self.check(TokenKind::Semicolon) {
            self.advance();
        }
        self.position > start
    }

    /// Attempt one construct at the cursor, rolling back on failure
    pub fn match_construct(&mut self, kind: ConstructKind) -> ParseResult {
        let start = self.position;
        let warnings = self.warnings.len();

        let result = match kind {
            ConstructKind::Declaration => self.parse_declaration(),
            ConstructKind::ArrayDeclaration => self.parse_array_declaration(),
            ConstructKind::IfElse => self.parse_if_statement(),
            ConstructKind::While => self.parse_while_statement(),
            ConstructKind::Function => self.parse_function(),
            ConstructKind::Statement => self.parse_simple_statement(),
        };

        match result {
            Ok(node) => {
                debug!(construct = %kind, at = %node.location, "construct matched");
                ParseResult::Success(node)
            }
            Err(mut failure) => {
                failure.progress = failure.index.saturating_sub(start);
                debug!(
                    construct = %kind,
                    error = %failure.kind,
                    at = %failure.location,
                    progress = failure.progress,
                    "construct failed"
                );
                self.position = start;
                self.warnings.truncate(warnings);
                ParseResult::Failure(failure)
            }
        }
    }

    /// Rules worth trying at the cursor: the predicted one first, then every
    /// other rule whose FIRST set admits the current token, in priority order
    pub fn candidates(&self) -> Vec<ConstructKind> {
        let token = self.peek();
        let predicted = self
            .predict()
            .filter(|&kind| grammar::rule(kind).matches_start(token));
        let mut kinds: Vec<ConstructKind> = predicted.into_iter().collect();
        kinds.extend(
            grammar::priority_order()
                .iter()
                .filter(|rule| Some(rule.kind) != predicted && rule.matches_start(token))
                .map(|rule| rule.kind),
        );
        kinds
    }

    /// Try `candidates` in order and stop at the first match. When all of
    /// them fail, the failure that got furthest is returned with its rule;
    /// ties go to the earlier candidate. None when there is nothing to try.
    pub fn match_best(
        &mut self,
        candidates: &[ConstructKind],
    ) -> Option<(ConstructKind, ParseResult)> {
        let mut best: Option<(ConstructKind, Box<Failure>)> = None;
        for &kind in candidates {
            match self.match_construct(kind) {
                ParseResult::Success(node) => {
                    return Some((kind, ParseResult::Success(node)));
                }
                ParseResult::Failure(failure) => {
                    if best
                        .as_ref()
                        .map_or(true, |(_, b)| failure.progress > b.progress)
                    {
                        best = Some((kind, failure));
                    }
                }
            }
        }
        best.map(|(kind, failure)| (kind, ParseResult::Failure(failure)))
    }

    /// Guess which construct starts at the cursor
    pub fn predict(&self) -> Option<ConstructKind> {
        let start = self.position;
        let mut i = start;
        while self.kind_at(i).is_modifier() {
            i += 1;
        }
        let modified = i > start;

        let head = self.kind_at(i);
        let prediction = match head {
            TokenKind::If => Some(ConstructKind::IfElse),
            TokenKind::While => Some(ConstructKind::While),
            TokenKind::Ident => Some(self.predict_type_led(i, modified)),
            TokenKind::Return if !modified => Some(ConstructKind::Statement),
            _ if modified => Some(ConstructKind::Function),
            _ if head.can_start_expression() => Some(ConstructKind::Statement),
            _ => None,
        };

        trace!(at = %self.peek().location, ?head, ?prediction, "predicted construct");
        prediction
    }

    /// Prediction for a construct whose first non-modifier token is an
    /// identifier, looking at most four tokens past it
    fn predict_type_led(&self, i: usize, modified: bool) -> ConstructKind {
        let known = self.is_known_type_at(i);
        let next = [self.kind_at(i + 1), self.kind_at(i + 2), self.kind_at(i + 3)];

        match next {
            // name ( ...
            [TokenKind::LParen, t2, t3] => {
                let header = matches!((t2, t3), (TokenKind::RParen, TokenKind::LBrace))
                    || (t2 == TokenKind::Ident && t3 == TokenKind::Ident)
                    || (self.is_known_type_at(i + 2) && t3 == TokenKind::LBracket);
                if modified || header {
                    ConstructKind::Function
                } else {
                    ConstructKind::Statement
                }
            }
            // T [ ...   or   T ] ...
            [TokenKind::LBracket | TokenKind::RBracket, t2, t3]
                if known || t2 == TokenKind::RBracket =>
            {
                if t2 == TokenKind::RBracket
                    && t3 == TokenKind::Ident
                    && self.kind_at(i + 4) == TokenKind::LParen
                {
                    ConstructKind::Function
                } else {
                    ConstructKind::ArrayDeclaration
                }
            }
            [TokenKind::LBracket | TokenKind::RBracket, ..] => ConstructKind::Statement,
            // bogus int getValue ( : a header behind an invalid modifier
            [TokenKind::Ident, TokenKind::Ident, TokenKind::LParen]
                if !known && self.is_known_type_at(i + 1) =>
            {
                ConstructKind::Function
            }
            [TokenKind::Ident | TokenKind::InvalidIdentifier, t2, _] => match t2 {
                TokenKind::LBracket | TokenKind::RBracket => ConstructKind::ArrayDeclaration,
                TokenKind::LParen => ConstructKind::Function,
                TokenKind::Eq | TokenKind::Semicolon => ConstructKind::Declaration,
                // T name int a) {  : a header that lost its `(`
                _ if self.closes_header_on_line(i + 2) => ConstructKind::Function,
                _ => ConstructKind::Declaration,
            },
            _ if known => ConstructKind::Declaration,
            _ if modified => ConstructKind::Function,
            _ => ConstructKind::Statement,
        }
    }

    /// Whether a `)` and then a `{` follow `from` before its line ends
    fn closes_header_on_line(&self, from: usize) -> bool {
        let Some(line) = self.tokens.get(from).map(|t| t.location.line) else {
            return false;
        };
        let mut closed = false;
        for token in self.tokens[from..].iter().take_while(|t| t.location.line == line) {
            match token.kind {
                TokenKind::RParen => closed = true,
                TokenKind::LBrace => return closed,
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eq => return false,
                _ => {}
            }
        }
        false
    }

    /// Failure for a token no construct can start with
    pub fn unexpected(&self) -> Box<Failure> {
        let mut failure = self.fail(
            ErrorKind::UnexpectedToken,
            grammar::construct_start_description(),
        );
        if failure.found.kind.is_lexical_error() {
            failure.resume = Some(self.position + 1);
        }
        failure
    }

    /// Move the cursor past a failed construct that started at `start`
    pub fn recover(&mut self, failure: &Failure, start: usize) -> usize {
        let target = match failure.resume {
            Some(resume) => resume,
            None => self.synchronize_from(failure.index),
        };
        let target = target.max(start + 1).min(self.eof_index());
        debug!(
            from = %self.tokens[start].location,
            to = %self.tokens[target].location,
            "resynchronized"
        );
        self.position = target;
        target
    }

    /// Next statement boundary at or after `from`
    pub(crate) fn synchronize_from(&self, from: usize) -> usize {
        let mut i = from;
        loop {
            match self.kind_at(i) {
                TokenKind::Eof => return i,
                TokenKind::Semicolon | TokenKind::RBrace => return i + 1,
                TokenKind::LBrace => return self.skip_else_chain(self.after_block(i)),
                _ => i += 1,
            }
        }
    }

    /// Token index just past the block opened at `open`
    pub(crate) fn after_block(&self, open: usize) -> usize {
        match self.braces.end_of(open) {
            Some(BraceEnd::Closed(close)) => close + 1,
            Some(BraceEnd::Unclosed { implied_end }) => implied_end,
            None => open + 1,
        }
    }

    /// Skip `else { ... }` and `else if (...) { ... }` tails starting at `from`
    pub(crate) fn skip_else_chain(&self, from: usize) -> usize {
        let mut i = from;
        while self.kind_at(i) == TokenKind::Else {
            let mut j = i + 1;
            if self.kind_at(j) == TokenKind::If {
                while !matches!(
                    self.kind_at(j),
                    TokenKind::LBrace | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                ) {
                    j += 1;
                }
            }
            if self.kind_at(j) != TokenKind::LBrace {
                return j;
            }
            i = self.after_block(j);
        }
        i
    }

    /// Resume point after the stray `}` that closes a body whose `{` is
    /// missing. None when the body dedents out of the construct first.
    pub(crate) fn stray_close_after(&self, from: usize, header_column: usize) -> Option<usize> {
        let stray = self.braces.stray();
        let close = *stray.get(stray.partition_point(|&s| s < from))?;
        let dedented = (from..close).any(|i| {
            starts_line(&self.tokens, i) && self.tokens[i].location.column <= header_column
        });
        (!dedented).then_some(close + 1)
    }

    /// Run `f` as part of construct `kind`
    pub(crate) fn within<T>(
        &mut self,
        kind: ConstructKind,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        self.constructs.push(kind);
        let result = self.nested(f);
        self.constructs.pop();
        result
    }

    /// Run `f` one nesting level deeper, failing past `max_nesting`
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= self.config.max_nesting {
            return Err(self.failure(
                ErrorKind::NestingTooDeep,
                format!("at most {} nested levels", self.config.max_nesting),
                self.position,
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Build the node for a construct spanning `start..position`
    pub(crate) fn node(
        &self,
        kind: ConstructKind,
        start: usize,
        name: Option<String>,
        children: Vec<ConstructNode>,
    ) -> ConstructNode {
        let first = &self.tokens[start];
        let span = match self.position.checked_sub(1).filter(|&last| last >= start) {
            Some(last) => first.span.join(self.tokens[last].span),
            None => first.span,
        };
        ConstructNode {
            kind,
            name,
            location: first.location,
            span,
            tokens: start..self.position,
            children,
        }
    }

    // ===== Helper methods =====

    pub(crate) fn kind_at(&self, index: usize) -> TokenKind {
        self.tokens.get(index).map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.kind_at(self.position)
    }

    pub(crate) fn is_known_type_at(&self, index: usize) -> bool {
        self.tokens
            .get(index)
            .is_some_and(|t| t.kind == TokenKind::Ident && self.config.is_known_type(&t.lexeme))
    }

    pub(crate) fn line_head(&self, index: usize) -> usize {
        self.line_heads.get(index).copied().unwrap_or(1)
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub fn peek(&self) -> &Token {
        &self.tokens[self.position.min(self.eof_index())]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    fn eof_index(&self) -> usize {
        self.tokens.len() - 1
    }

    pub(crate) fn skip_modifiers(&mut self) {
        while self.peek_kind().is_modifier() {
            self.advance();
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, error: ErrorKind) -> PResult<()> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(self.fail(error, kind.describe()))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> PResult<String> {
        if self.check(TokenKind::Ident) {
            Ok(self.advance().lexeme.clone())
        } else {
            Err(self.fail(ErrorKind::MissingIdentifier, Symbol::Ident.describe()))
        }
    }

    /// Consume a known type name
    pub(crate) fn expect_type(&mut self) -> PResult<String> {
        if self.is_known_type_at(self.position) {
            Ok(self.advance().lexeme.clone())
        } else {
            Err(self.fail(ErrorKind::InvalidType, Symbol::Type.describe()))
        }
    }

    /// Consume a `;`. Inside a block, a `;` missing right before `}` is
    /// recorded as a warning when lenient semicolons are enabled.
    pub(crate) fn expect_semicolon(&mut self) -> PResult<()> {
        if self.match_token(TokenKind::Semicolon) {
            return Ok(());
        }

        let mut failure = self.fail_after_previous(
            ErrorKind::MissingSemicolon,
            Symbol::Token(TokenKind::Semicolon).describe(),
        );
        if self.block_depth > 0
            && self.check(TokenKind::RBrace)
            && self.config.lenient_block_semicolons
        {
            self.warnings.push(*failure);
            return Ok(());
        }
        if self.peek().location.line > self.previous().location.line {
            failure.resume = Some(self.position);
        }
        Err(failure)
    }

    // ===== Failure construction =====

    pub(crate) fn failure(
        &self,
        kind: ErrorKind,
        expected: impl Into<String>,
        index: usize,
    ) -> Box<Failure> {
        let index = index.min(self.eof_index());
        let found = self.tokens[index].clone();
        Box::new(Failure {
            kind,
            construct: self.constructs.last().copied(),
            location: found.location,
            span: found.span,
            expected: expected.into(),
            found,
            index,
            progress: 0,
            resume: None,
        })
    }

    /// Failure at token `index`. A lexical-error token there takes over the
    /// error kind.
    pub(crate) fn fail_at(
        &self,
        kind: ErrorKind,
        expected: impl Into<String>,
        index: usize,
    ) -> Box<Failure> {
        let mut failure = self.failure(kind, expected, index);
        failure.kind = match failure.found.kind {
            TokenKind::InvalidIdentifier => ErrorKind::InvalidIdentifier,
            found if found.is_lexical_error() => ErrorKind::LexicalError,
            _ => kind,
        };
        failure
    }

    pub(crate) fn fail(&self, kind: ErrorKind, expected: impl Into<String>) -> Box<Failure> {
        self.fail_at(kind, expected, self.position)
    }

    /// Failure located just after the previous token. A lexical-error token
    /// at the cursor takes over the error kind and keeps its own location.
    pub(crate) fn fail_after_previous(
        &self,
        kind: ErrorKind,
        expected: impl Into<String>,
    ) -> Box<Failure> {
        let mut failure = self.fail_at(kind, expected, self.position);
        if !failure.found.kind.is_lexical_error() && self.position > 0 {
            let previous = self.previous();
            failure.location = previous.end_location();
            failure.span = Span::point(previous.span.end);
        }
        failure
    }

    /// UNCLOSED_BLOCK for the `{` at `open`, detected at token `at`
    pub(crate) fn fail_unclosed(&self, open: usize, at: usize) -> Box<Failure> {
        let mut failure = self.failure(
            ErrorKind::UnclosedBlock,
            Symbol::Token(TokenKind::RBrace).describe(),
            at,
        );
        failure.location = self.tokens[open].location;
        failure.span = self.tokens[open].span;
        failure.resume = Some(at);
        failure
    }
}
