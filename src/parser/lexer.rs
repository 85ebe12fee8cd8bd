//! Lexer (tokenizer) for the validated Java subset
//!
//! Converts raw source text into a lazy [`Token`] stream consumed by the
//! parser. Scanning never aborts: characters the lexer does not understand
//! come out as lexical-error tokens so later constructs are still checked.
//!
//! Type names (`int`, `String`, ...) are deliberately *not* keywords. They lex
//! as identifiers and the parser checks them against the configured type set.
//!
//! A digit run glued to identifier characters (`123abc`) lexes as a single
//! [`TokenKind::InvalidIdentifier`] token rather than a literal followed by an
//! identifier; the parser reports it as an invalid identifier wherever it
//! turns up.

use super::ast::{SourceLocation, Span};
use serde::Serialize;
use std::fmt;

/// Every token variant the lexer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Literals
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,

    Ident,

    // Keywords
    If,
    Else,
    While,
    New,
    Return,
    True,
    False,
    Null,

    // Access modifiers
    Public,
    Private,
    Protected,
    Static,
    Final,

    // Arithmetic
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=

    // Logical
    AndAnd, // &&
    OrOr,   // ||
    Bang,   // !

    // Assignment
    Eq,      // =
    PlusEq,  // +=
    MinusEq, // -=
    StarEq,  // *=
    SlashEq, // /=

    // Increment/Decrement
    PlusPlus,   // ++
    MinusMinus, // --

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Semicolon, // ;
    Comma,     // ,
    Dot,       // .

    // Lexical errors
    InvalidIdentifier,
    UnknownChar,
    UnterminatedLiteral,
    UnterminatedComment,

    Eof,
}

/// Coarse token classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenCategory {
    Keyword,
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,
    Operator,
    Punct,
    LexicalError,
    Eof,
}

impl TokenKind {
    pub fn category(self) -> TokenCategory {
        use TokenKind::*;
        match self {
            IntLiteral => TokenCategory::IntLiteral,
            FloatLiteral => TokenCategory::FloatLiteral,
            StringLiteral => TokenCategory::StringLiteral,
            CharLiteral => TokenCategory::CharLiteral,
            Ident => TokenCategory::Identifier,
            If | Else | While | New | Return | True | False | Null | Public
            | Private | Protected | Static | Final => TokenCategory::Keyword,
            Plus | Minus | Star | Slash | Percent | EqEq | NotEq | Lt | Le
            | Gt | Ge | AndAnd | OrOr | Bang | Eq | PlusEq | MinusEq
            | StarEq | SlashEq | PlusPlus | MinusMinus => {
                TokenCategory::Operator
            }
            LParen | RParen | LBrace | RBrace | LBracket | RBracket
            | Semicolon | Comma | Dot => TokenCategory::Punct,
            InvalidIdentifier | UnknownChar | UnterminatedLiteral
            | UnterminatedComment => TokenCategory::LexicalError,
            Eof => TokenCategory::Eof,
        }
    }

    pub fn is_lexical_error(self) -> bool {
        self.category() == TokenCategory::LexicalError
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Static
                | TokenKind::Final
        )
    }

    pub fn is_bracket(self) -> bool {
        matches!(self, TokenKind::LBracket | TokenKind::RBracket)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Whether an expression may begin with this token
    pub fn can_start_expression(self) -> bool {
        self.is_literal()
            || matches!(
                self,
                TokenKind::Ident
                    | TokenKind::InvalidIdentifier
                    | TokenKind::New
                    | TokenKind::LParen
                    | TokenKind::Minus
                    | TokenKind::Bang
                    | TokenKind::PlusPlus
                    | TokenKind::MinusMinus
            )
    }

    /// Description used in "expected ..." messages
    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "an integer literal",
            FloatLiteral => "a float literal",
            StringLiteral => "a string literal",
            CharLiteral => "a character literal",
            Ident => "an identifier",
            If => "'if'",
            Else => "'else'",
            While => "'while'",
            New => "'new'",
            Return => "'return'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            Public => "'public'",
            Private => "'private'",
            Protected => "'protected'",
            Static => "'static'",
            Final => "'final'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            EqEq => "'=='",
            NotEq => "'!='",
            Lt => "'<'",
            Le => "'<='",
            Gt => "'>'",
            Ge => "'>='",
            AndAnd => "'&&'",
            OrOr => "'||'",
            Bang => "'!'",
            Eq => "'='",
            PlusEq => "'+='",
            MinusEq => "'-='",
            StarEq => "'*='",
            SlashEq => "'/='",
            PlusPlus => "'++'",
            MinusMinus => "'--'",
            LParen => "'('",
            RParen => "')'",
            LBrace => "'{'",
            RBrace => "'}'",
            LBracket => "'['",
            RBracket => "']'",
            Semicolon => "';'",
            Comma => "','",
            Dot => "'.'",
            InvalidIdentifier => "an invalid identifier",
            UnknownChar => "an unrecognized character",
            UnterminatedLiteral => "an unterminated literal",
            UnterminatedComment => "an unterminated comment",
            Eof => "end of input",
        }
    }
}

/// A single lexeme with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: SourceLocation,
    pub span: Span,
}

impl Token {
    pub fn category(&self) -> TokenCategory {
        self.kind.category()
    }

    /// Location just past the last character of the token
    pub fn end_location(&self) -> SourceLocation {
        SourceLocation::new(
            self.location.line,
            self.location.column + self.lexeme.chars().count(),
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::IntLiteral => write!(f, "integer literal {}", self.lexeme),
            TokenKind::FloatLiteral => write!(f, "float literal {}", self.lexeme),
            TokenKind::StringLiteral => write!(f, "string literal {}", self.lexeme),
            TokenKind::CharLiteral => write!(f, "character literal {}", self.lexeme),
            TokenKind::Ident => write!(f, "identifier '{}'", self.lexeme),
            TokenKind::InvalidIdentifier => {
                write!(f, "invalid identifier '{}'", self.lexeme)
            }
            TokenKind::UnknownChar => {
                write!(f, "unrecognized character '{}'", self.lexeme)
            }
            TokenKind::UnterminatedLiteral => {
                write!(f, "unterminated literal {}", self.lexeme)
            }
            TokenKind::UnterminatedComment => {
                write!(f, "unterminated block comment")
            }
            kind => f.write_str(kind.describe()),
        }
    }
}

/// Start lexing `source`. The returned iterator is lazy, always ends with a
/// single [`TokenKind::Eof`] token, and can be cloned to restart.
pub fn tokenize(source: &str) -> Lexer {
    Lexer::new(source)
}

/// Lexer for the validated subset
#[derive(Debug, Clone)]
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    offset: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            offset: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Get next token
    fn next_token(&mut self) -> Token {
        let start = self.mark();
        let Some(ch) = self.advance() else {
            return self.finish(TokenKind::Eof, start);
        };

        let kind = match ch {
            '"' => self.quoted_literal('"', TokenKind::StringLiteral),
            '\'' => self.quoted_literal('\'', TokenKind::CharLiteral),
            '0'..='9' => self.number_literal(),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(start),

            '+' => self.either(
                &[('+', TokenKind::PlusPlus), ('=', TokenKind::PlusEq)],
                TokenKind::Plus,
            ),
            '-' => self.either(
                &[('-', TokenKind::MinusMinus), ('=', TokenKind::MinusEq)],
                TokenKind::Minus,
            ),
            '*' => self.either(&[('=', TokenKind::StarEq)], TokenKind::Star),
            '/' => self.either(&[('=', TokenKind::SlashEq)], TokenKind::Slash),
            '=' => self.either(&[('=', TokenKind::EqEq)], TokenKind::Eq),
            '!' => self.either(&[('=', TokenKind::NotEq)], TokenKind::Bang),
            '<' => self.either(&[('=', TokenKind::Le)], TokenKind::Lt),
            '>' => self.either(&[('=', TokenKind::Ge)], TokenKind::Gt),
            '&' => self.either(&[('&', TokenKind::AndAnd)], TokenKind::UnknownChar),
            '|' => self.either(&[('|', TokenKind::OrOr)], TokenKind::UnknownChar),
            '%' => TokenKind::Percent,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,

            _ => {
                // Collapse a run of garbage into one token
                while let Some(next) = self.peek() {
                    if next.is_whitespace() || starts_token(next) {
                        break;
                    }
                    self.advance();
                }
                TokenKind::UnknownChar
            }
        };

        self.finish(kind, start)
    }

    /// Consume one of the listed follow characters, if present
    fn either(&mut self, follows: &[(char, TokenKind)], single: TokenKind) -> TokenKind {
        for &(ch, kind) in follows {
            if self.peek() == Some(ch) {
                self.advance();
                return kind;
            }
        }
        single
    }

    /// String or character literal; the opening quote is already consumed
    fn quoted_literal(&mut self, quote: char, kind: TokenKind) -> TokenKind {
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => break,
                '\\' => {
                    self.advance();
                    if self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                c if c == quote => {
                    self.advance();
                    return kind;
                }
                _ => {
                    self.advance();
                }
            }
        }
        TokenKind::UnterminatedLiteral
    }

    /// Integer or float literal; a trailing identifier run makes the whole
    /// lexeme an invalid identifier
    fn number_literal(&mut self) -> TokenKind {
        self.consume_while(|c| c.is_ascii_digit());

        let mut kind = TokenKind::IntLiteral;
        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            self.consume_while(|c| c.is_ascii_digit());
            kind = TokenKind::FloatLiteral;
        }

        // Type suffix: 10L, 2.5f, 3d
        if let Some(suffix @ ('f' | 'F' | 'd' | 'D' | 'l' | 'L')) = self.peek() {
            let glued = self.peek_ahead(1).is_some_and(is_ident_char);
            if !glued {
                self.advance();
                if matches!(suffix, 'f' | 'F' | 'd' | 'D') {
                    kind = TokenKind::FloatLiteral;
                }
                return kind;
            }
        }

        if self.peek().is_some_and(is_ident_char) {
            self.consume_while(is_ident_char);
            return TokenKind::InvalidIdentifier;
        }

        kind
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, start: Mark) -> TokenKind {
        self.consume_while(is_ident_char);

        let ident: String = self.input[start.position..self.position].iter().collect();
        match ident.as_str() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "new" => TokenKind::New,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "public" => TokenKind::Public,
            "private" => TokenKind::Private,
            "protected" => TokenKind::Protected,
            "static" => TokenKind::Static,
            "final" => TokenKind::Final,
            _ => TokenKind::Ident,
        }
    }

    /// Skip whitespace and comments. An unterminated block comment is
    /// returned as an error token.
    fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_ahead(1) == Some('/') => {
                    self.consume_while(|c| c != '\n');
                }
                Some('/') if self.peek_ahead(1) == Some('*') => {
                    let start = self.mark();
                    self.advance(); // skip '/'
                    self.advance(); // skip '*'
                    if !self.skip_block_comment() {
                        return Some(self.finish(TokenKind::UnterminatedComment, start));
                    }
                }
                _ => return None,
            }
        }
    }

    /// Skip the body of a block comment; false when it never closes
    fn skip_block_comment(&mut self) -> bool {
        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return true;
            }
            self.advance();
        }
        false
    }

    fn consume_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        self.offset += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn mark(&self) -> Mark {
        Mark {
            position: self.position,
            offset: self.offset,
            location: SourceLocation::new(self.line, self.column),
        }
    }

    fn finish(&self, kind: TokenKind, start: Mark) -> Token {
        Token {
            kind,
            lexeme: self.input[start.position..self.position].iter().collect(),
            location: start.location,
            span: Span::new(start.offset, self.offset),
        }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }

        if let Some(error) = self.skip_whitespace_and_comments() {
            return Some(error);
        }

        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

impl std::iter::FusedIterator for Lexer {}

/// Saved lexer position
#[derive(Debug, Clone, Copy)]
struct Mark {
    position: usize,
    offset: usize,
    location: SourceLocation,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Characters that begin a recognized token
fn starts_token(c: char) -> bool {
    is_ident_char(c) || "\"'+-*/%=!<>&|(){}[];,.".contains(c)
}
