//! Declaration parsing implementation
//!
//! This module handles the declaration constructs:
//!
//! - Variable declarations: `int count = 10;`
//! - Array declarations, with brackets after the type or after the name:
//!   `int[] arr = new int[10];`, `String names[];`
//! - Function declarations: `public int sum(int a, int b) { ... }`
//!
//! # Grammar
//!
//! ```text
//! declaration       ::= { MODIFIER } TYPE IDENT [ '=' EXPR ] ';'
//! array_declaration ::= { MODIFIER } TYPE '[' ']' IDENT [ '=' ARRAY_INIT ] ';'
//!                     | { MODIFIER } TYPE IDENT '[' ']' [ '=' ARRAY_INIT ] ';'
//! function          ::= { MODIFIER } RETURN_TYPE [ '[' ']' ] IDENT '(' [ PARAMS ] ')' BLOCK
//! PARAM             ::= TYPE [ '[' ']' ] IDENT
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::diagnostics::ErrorKind;
use crate::parser::ast::*;
use crate::parser::grammar::Symbol;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{PResult, Parser};

impl Parser<'_> {
    /// Parse `MODIFIER* TYPE IDENT ("=" EXPR)? ";"`
    pub(crate) fn parse_declaration(&mut self) -> PResult<ConstructNode> {
        self.within(ConstructKind::Declaration, |p| {
            let start = p.position;
            p.skip_modifiers();
            p.expect_type()?;
            let name = p.expect_identifier()?;

            if p.match_token(TokenKind::Eq) {
                if p.is_array_value() {
                    return Err(p.fail(ErrorKind::MissingArrayBrackets, "'[]' after the type"));
                }
                p.parse_expression()?;
            }

            p.expect_semicolon()?;
            Ok(p.node(ConstructKind::Declaration, start, Some(name), Vec::new()))
        })
    }

    /// An array creation or initializer list, which only an array
    /// declaration may take
    fn is_array_value(&self) -> bool {
        self.check(TokenKind::LBrace)
            || (self.check(TokenKind::New)
                && self.kind_at(self.position + 2) == TokenKind::LBracket)
    }

    /// Parse either bracket placement of an array declaration
    pub(crate) fn parse_array_declaration(&mut self) -> PResult<ConstructNode> {
        self.within(ConstructKind::ArrayDeclaration, |p| {
            let start = p.position;
            p.skip_modifiers();
            p.expect_type()?;

            let name = match p.peek_kind() {
                // T [ ] name
                TokenKind::LBracket => {
                    p.advance();
                    p.expect(TokenKind::RBracket, ErrorKind::MalformedBrackets)?;
                    let name = p.expect_identifier()?;
                    if p.peek_kind().is_bracket() {
                        return Err(p.fail(ErrorKind::MalformedBrackets, "'=' or ';'"));
                    }
                    name
                }
                TokenKind::RBracket => {
                    return Err(p.fail(ErrorKind::MalformedBrackets, "'['"));
                }
                // T name [ ]
                _ => {
                    let name = p.expect_identifier()?;
                    match p.peek_kind() {
                        TokenKind::LBracket => {
                            p.advance();
                            p.expect(TokenKind::RBracket, ErrorKind::MalformedBrackets)?;
                        }
                        TokenKind::RBracket => {
                            return Err(p.fail(ErrorKind::MalformedBrackets, "'['"));
                        }
                        _ => return Err(p.fail(ErrorKind::MissingArrayBrackets, "'[' ']'")),
                    }
                    name
                }
            };

            if p.match_token(TokenKind::Eq) {
                p.parse_array_init()?;
            }

            p.expect_semicolon()?;
            Ok(p.node(ConstructKind::ArrayDeclaration, start, Some(name), Vec::new()))
        })
    }

    /// Parse the value of an array declaration
    fn parse_array_init(&mut self) -> PResult<()> {
        match self.peek_kind() {
            TokenKind::New => self.parse_array_creation(),
            TokenKind::LBrace => self.parse_init_list(),
            _ => self.parse_expression().map(drop),
        }
    }

    /// Parse `new T[size]` or `new T[] { ... }`
    pub(crate) fn parse_array_creation(&mut self) -> PResult<()> {
        self.expect(TokenKind::New, ErrorKind::ExpectedExpression)?;
        self.expect_type()?;
        if !self.check(TokenKind::LBracket) {
            return Err(self.fail(ErrorKind::MissingArrayBrackets, "'['"));
        }
        self.advance();

        if self.check(TokenKind::RBracket) {
            if self.kind_at(self.position + 1) == TokenKind::LBrace {
                self.advance();
                return self.parse_init_list();
            }
            return Err(self.fail(ErrorKind::MissingArraySize, Symbol::ArraySize.describe()));
        }

        self.parse_expression()?;
        self.expect(TokenKind::RBracket, ErrorKind::MalformedBrackets)
    }

    /// Parse `{ (EXPR ("," EXPR)*)? }`
    fn parse_init_list(&mut self) -> PResult<()> {
        self.expect(TokenKind::LBrace, ErrorKind::UnexpectedToken)?;
        if self.match_token(TokenKind::RBrace) {
            return Ok(());
        }
        loop {
            self.nested(|p| p.parse_expression())?;
            if self.match_token(TokenKind::Comma) {
                continue;
            }
            if self.match_token(TokenKind::RBrace) {
                return Ok(());
            }
            return Err(self.fail(ErrorKind::UnexpectedToken, "',' or '}'"));
        }
    }

    /// Parse `MODIFIER* RETURN_TYPE ([ ])? IDENT "(" PARAMS? ")" BLOCK`
    pub(crate) fn parse_function(&mut self) -> PResult<ConstructNode> {
        self.within(ConstructKind::Function, |p| {
            let start = p.position;
            let header_column = p.line_head(start);
            p.skip_modifiers();

            // `invalid int getValue()`: an unknown word where a modifier goes
            if p.check(TokenKind::Ident)
                && !p.is_known_type_at(p.position)
                && p.is_known_type_at(p.position + 1)
            {
                return Err(p.fail(ErrorKind::InvalidModifier, Symbol::Modifier.describe()));
            }

            if !p.is_known_type_at(p.position) {
                return Err(p.fail(ErrorKind::MissingReturnType, Symbol::ReturnType.describe()));
            }
            p.advance();
            if p.match_token(TokenKind::LBracket) {
                p.expect(TokenKind::RBracket, ErrorKind::MalformedBrackets)?;
            }

            let name = p.expect_identifier()?;
            p.expect(TokenKind::LParen, ErrorKind::MissingOpenParen)?;
            p.parse_parameters()?;
            if !p.match_token(TokenKind::RParen) {
                return Err(p.fail(ErrorKind::MissingCloseParen, "',' or ')'"));
            }

            let body = p.parse_body(header_column, ErrorKind::MissingOpenBrace)?;
            Ok(p.node(ConstructKind::Function, start, Some(name), body))
        })
    }

    /// Parse a comma-separated parameter list, stopping before `)`
    fn parse_parameters(&mut self) -> PResult<()> {
        if self.check(TokenKind::RParen) {
            return Ok(());
        }
        loop {
            self.parse_parameter()?;
            if !self.match_token(TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    /// Parse `TYPE ([ ])? IDENT`
    fn parse_parameter(&mut self) -> PResult<()> {
        if self.is_known_type_at(self.position) {
            self.advance();
            if self.match_token(TokenKind::LBracket) {
                self.expect(TokenKind::RBracket, ErrorKind::MalformedBrackets)?;
            }
            self.expect_identifier()?;
            return Ok(());
        }

        let typed = self.check(TokenKind::Ident)
            && matches!(
                self.kind_at(self.position + 1),
                TokenKind::Ident | TokenKind::LBracket
            );
        if typed {
            Err(self.fail(ErrorKind::InvalidType, Symbol::Type.describe()))
        } else {
            Err(self.fail(ErrorKind::MissingParamType, Symbol::Param.describe()))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ValidatorConfig;
    use crate::diagnostics::ErrorKind;
    use crate::parser::ast::ConstructKind;
    use crate::parser::parse::{ParseResult, Parser};

    fn parse(source: &str, kind: ConstructKind) -> ParseResult {
        let config = ValidatorConfig::default();
        let mut parser = Parser::new(source, &config);
        parser.match_construct(kind)
    }

    fn error(source: &str, kind: ConstructKind) -> ErrorKind {
        match parse(source, kind) {
            ParseResult::Failure(failure) => failure.kind,
            ParseResult::Success(node) => panic!("{source}: expected failure, got {node:?}"),
        }
    }

    fn passes(source: &str, kind: ConstructKind) -> bool {
        matches!(parse(source, kind), ParseResult::Success(_))
    }

    #[test]
    fn test_declarations() {
        assert!(passes("int age;", ConstructKind::Declaration));
        assert!(passes("float rate = 3.14;", ConstructKind::Declaration));
        assert!(passes("private static final int MAX = 10 * 2;", ConstructKind::Declaration));
        assert!(passes("String s = name.trim();", ConstructKind::Declaration));
    }

    #[test]
    fn test_declaration_name() {
        match parse("boolean isActive = true;", ConstructKind::Declaration) {
            ParseResult::Success(node) => assert_eq!(node.name.as_deref(), Some("isActive")),
            ParseResult::Failure(f) => panic!("{f:?}"),
        }
    }

    #[test]
    fn test_declaration_errors() {
        use ConstructKind::Declaration;
        assert_eq!(error("int age", Declaration), ErrorKind::MissingSemicolon);
        assert_eq!(error("invalidType variable;", Declaration), ErrorKind::InvalidType);
        assert_eq!(error("int 123abc;", Declaration), ErrorKind::InvalidIdentifier);
        assert_eq!(error("float ;", Declaration), ErrorKind::MissingIdentifier);
        assert_eq!(error("int arr = new int[10];", Declaration), ErrorKind::MissingArrayBrackets);
        assert_eq!(error("int arr = {1, 2};", Declaration), ErrorKind::MissingArrayBrackets);
        assert_eq!(error("int x = ;", Declaration), ErrorKind::ExpectedExpression);
    }

    #[test]
    fn test_array_declarations() {
        use ConstructKind::ArrayDeclaration;
        assert!(passes("int[] numbers;", ArrayDeclaration));
        assert!(passes("String names[];", ArrayDeclaration));
        assert!(passes("int[] arr = new int[10];", ArrayDeclaration));
        assert!(passes("int values[] = new int[n + 1];", ArrayDeclaration));
        assert!(passes("int[] primes = {2, 3, 5};", ArrayDeclaration));
        assert!(passes("int[] empty = {};", ArrayDeclaration));
        assert!(passes("char[] letters = new char[] {'a', 'b'};", ArrayDeclaration));
        assert!(passes("int[] copy = numbers;", ArrayDeclaration));
    }

    #[test]
    fn test_array_errors() {
        use ConstructKind::ArrayDeclaration;
        assert_eq!(error("int] numbers[;", ArrayDeclaration), ErrorKind::MalformedBrackets);
        assert_eq!(error("int numbers[;", ArrayDeclaration), ErrorKind::MalformedBrackets);
        assert_eq!(error("int[ numbers;", ArrayDeclaration), ErrorKind::MalformedBrackets);
        assert_eq!(error("int[] a[];", ArrayDeclaration), ErrorKind::MalformedBrackets);
        assert_eq!(
            error("String[] names = new String[];", ArrayDeclaration),
            ErrorKind::MissingArraySize
        );
        assert_eq!(error("Foo[] items;", ArrayDeclaration), ErrorKind::InvalidType);
        assert_eq!(
            error("int[] a = new Foo[3];", ArrayDeclaration),
            ErrorKind::InvalidType
        );
        assert_eq!(error("int[] a = {1 2};", ArrayDeclaration), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_missing_array_size_points_at_bracket() {
        match parse("String[] names = new String[];", ConstructKind::ArrayDeclaration) {
            ParseResult::Failure(failure) => {
                assert_eq!(failure.found.lexeme, "]");
                assert_eq!(failure.location.column, 29);
            }
            ParseResult::Success(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_functions() {
        use ConstructKind::Function;
        assert!(passes("int add(int a, int b) {\n    sum = a + b;\n}", Function));
        assert!(passes("void display() {\n    count++;\n}", Function));
        assert!(passes("public static void main(String[] args) { run(args); }", Function));
        assert!(passes("int[] values() { return data; }", Function));
        assert!(passes("void nothing() {}", Function));
    }

    #[test]
    fn test_function_children() {
        let source = "void f() {\n    int x = 1;\n    if (x > 0) {\n        x--;\n    }\n}";
        match parse(source, ConstructKind::Function) {
            ParseResult::Success(node) => {
                assert_eq!(node.children.len(), 2);
                assert_eq!(node.children[0].kind, ConstructKind::Declaration);
                assert_eq!(node.children[1].kind, ConstructKind::IfElse);
                assert_eq!(node.count(), 4);
            }
            ParseResult::Failure(f) => panic!("{f:?}"),
        }
    }

    #[test]
    fn test_function_errors() {
        use ConstructKind::Function;
        assert_eq!(
            error("public calculateSum(int a, int b) {\n    return a + b;\n}", Function),
            ErrorKind::MissingReturnType
        );
        assert_eq!(
            error("public int sum(a, b) {\n    return a + b;\n}", Function),
            ErrorKind::MissingParamType
        );
        assert_eq!(error("int f(Foo x) {}", Function), ErrorKind::InvalidType);
        assert_eq!(
            error("public int multiply(int a, int b {\n    return a * b;\n}", Function),
            ErrorKind::MissingCloseParen
        );
        assert_eq!(
            error("public void display()\n    count++;\n}", Function),
            ErrorKind::MissingOpenBrace
        );
        assert_eq!(
            error("invalid int getValue() {\n    return 0;\n}", Function),
            ErrorKind::InvalidModifier
        );
        assert_eq!(error("int f int a) {}", Function), ErrorKind::MissingOpenParen);
        assert_eq!(error("int (int a) {}", Function), ErrorKind::MissingIdentifier);
    }

    #[test]
    fn test_missing_open_brace_resumes_after_stray_close() {
        let source = "public void display()\n    count++;\n}\nint x;";
        let config = ValidatorConfig::default();
        let mut parser = Parser::new(source, &config);
        match parser.match_construct(ConstructKind::Function) {
            ParseResult::Failure(failure) => {
                let resume = failure.resume.unwrap();
                assert_eq!(parser.tokens()[resume].lexeme, "int");
            }
            ParseResult::Success(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_missing_open_brace_without_stray_close() {
        let source = "void display()\nint x;";
        let config = ValidatorConfig::default();
        let mut parser = Parser::new(source, &config);
        match parser.match_construct(ConstructKind::Function) {
            ParseResult::Failure(failure) => {
                assert_eq!(failure.kind, ErrorKind::MissingOpenBrace);
                assert_eq!(failure.resume, None);
            }
            ParseResult::Success(_) => panic!("expected failure"),
        }
    }
}
