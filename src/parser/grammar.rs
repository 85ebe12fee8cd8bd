//! Declarative grammar for the validated constructs
//!
//! Each construct is a [`GrammarRule`] whose alternatives are sequences of
//! [`Symbol`]s. The parser consults the rules for FIRST-set checks before it
//! commits to a construct, and draws its "expected ..." wording from
//! [`Symbol::describe`]. The same tables render as EBNF for
//! `javacheck grammar`.
//!
//! # Grammar
//!
//! ```text
//! declaration       ::= { MODIFIER } TYPE IDENT [ '=' EXPR ] ';'
//! array_declaration ::= { MODIFIER } TYPE '[' ']' IDENT [ '=' ARRAY_INIT ] ';'
//!                     | { MODIFIER } TYPE IDENT '[' ']' [ '=' ARRAY_INIT ] ';'
//! if_else           ::= 'if' '(' CONDITION ')' BLOCK [ 'else' ( BLOCK | if_else ) ]
//! while             ::= 'while' '(' CONDITION ')' BLOCK
//! function          ::= { MODIFIER } RETURN_TYPE [ '[' ']' ] IDENT '(' [ PARAMS ] ')' BLOCK
//! statement         ::= 'return' [ EXPR ] ';' | EXPR ';'
//! ```

use super::ast::ConstructKind;
use super::lexer::{Token, TokenKind};
use std::fmt;

/// One grammar symbol: a terminal, a non-terminal, or a combinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Token(TokenKind),
    Type,
    ReturnType,
    Ident,
    Modifier,
    Expr,
    Condition,
    ArraySize,
    ArrayInit,
    InitList,
    Params,
    Param,
    Block,
    Rule(ConstructKind),
    Opt(&'static [Symbol]),
    Many(&'static [Symbol]),
    OneOf(&'static [Symbol]),
}

impl Symbol {
    /// Wording used for this symbol in "expected ..." messages
    pub fn describe(&self) -> String {
        match self {
            Symbol::Token(kind) => kind.describe().to_string(),
            Symbol::Type => "a type name".to_string(),
            Symbol::ReturnType => "a return type".to_string(),
            Symbol::Ident => "an identifier".to_string(),
            Symbol::Modifier => "an access modifier".to_string(),
            Symbol::Expr => "an expression".to_string(),
            Symbol::Condition => "a condition".to_string(),
            Symbol::ArraySize => "an array size".to_string(),
            Symbol::ArrayInit => "an array initializer".to_string(),
            Symbol::InitList => "an initializer list".to_string(),
            Symbol::Params => "a parameter list".to_string(),
            Symbol::Param => "a parameter".to_string(),
            Symbol::Block => "'{'".to_string(),
            Symbol::Rule(kind) => format!("a {}", kind.name()),
            Symbol::Opt(inner) | Symbol::Many(inner) => inner
                .first()
                .map(Symbol::describe)
                .unwrap_or_default(),
            Symbol::OneOf(choices) => join_alternatives(choices.iter().map(Symbol::describe)),
        }
    }

    /// Whether the symbol may match zero tokens
    pub fn is_nullable(&self) -> bool {
        match self {
            Symbol::Opt(_) | Symbol::Many(_) => true,
            Symbol::OneOf(choices) => choices.iter().any(Symbol::is_nullable),
            _ => false,
        }
    }

    /// Whether `token` can be the first token this symbol matches.
    ///
    /// Type positions admit any identifier; whether the name is a known type
    /// is checked by the parser so it can report INVALID_TYPE.
    pub fn admits(&self, token: &Token) -> bool {
        let kind = token.kind;
        match self {
            Symbol::Token(expected) => kind == *expected,
            Symbol::Type | Symbol::ReturnType | Symbol::Ident | Symbol::Params | Symbol::Param => {
                kind == TokenKind::Ident
            }
            Symbol::Modifier => kind.is_modifier(),
            Symbol::Expr | Symbol::Condition | Symbol::ArraySize => kind.can_start_expression(),
            Symbol::ArrayInit => kind.can_start_expression() || kind == TokenKind::LBrace,
            Symbol::InitList | Symbol::Block => kind == TokenKind::LBrace,
            Symbol::Rule(rule_kind) => rule(*rule_kind).matches_start(token),
            Symbol::Opt(inner) | Symbol::Many(inner) => sequence_admits(inner, token),
            Symbol::OneOf(choices) => choices.iter().any(|s| s.admits(token)),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Token(kind) => f.write_str(kind.describe()),
            Symbol::Type => f.write_str("TYPE"),
            Symbol::ReturnType => f.write_str("RETURN_TYPE"),
            Symbol::Ident => f.write_str("IDENT"),
            Symbol::Modifier => f.write_str("MODIFIER"),
            Symbol::Expr => f.write_str("EXPR"),
            Symbol::Condition => f.write_str("CONDITION"),
            Symbol::ArraySize => f.write_str("ARRAY_SIZE"),
            Symbol::ArrayInit => f.write_str("ARRAY_INIT"),
            Symbol::InitList => f.write_str("INIT_LIST"),
            Symbol::Params => f.write_str("PARAMS"),
            Symbol::Param => f.write_str("PARAM"),
            Symbol::Block => f.write_str("BLOCK"),
            Symbol::Rule(kind) => f.write_str(rule(*kind).name),
            Symbol::Opt(inner) => write!(f, "[ {} ]", Sequence(inner)),
            Symbol::Many(inner) => write!(f, "{{ {} }}", Sequence(inner)),
            Symbol::OneOf(choices) => {
                f.write_str("( ")?;
                for (i, choice) in choices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{choice}")?;
                }
                f.write_str(" )")
            }
        }
    }
}

/// Space-separated symbol sequence
struct Sequence<'a>(&'a [Symbol]);

impl fmt::Display for Sequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, symbol) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

fn sequence_admits(sequence: &[Symbol], token: &Token) -> bool {
    for symbol in sequence {
        if symbol.admits(token) {
            return true;
        }
        if !symbol.is_nullable() {
            return false;
        }
    }
    false
}

/// The symbols that can supply the first token of `sequence`
fn first_symbols(sequence: &'static [Symbol], out: &mut Vec<Symbol>) {
    for symbol in sequence {
        match symbol {
            Symbol::Opt(inner) | Symbol::Many(inner) => first_symbols(inner, out),
            _ => out.push(*symbol),
        }
        if !symbol.is_nullable() {
            break;
        }
    }
}

/// A named construct grammar
#[derive(Debug, PartialEq, Eq)]
pub struct GrammarRule {
    pub name: &'static str,
    pub kind: ConstructKind,
    pub alternatives: &'static [&'static [Symbol]],
}

impl GrammarRule {
    /// The symbols that may begin this construct, deduplicated
    pub fn first_set(&self) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        for alternative in self.alternatives {
            first_symbols(alternative, &mut symbols);
        }
        let mut unique: Vec<Symbol> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if !unique.contains(&symbol) {
                unique.push(symbol);
            }
        }
        unique
    }

    pub fn matches_start(&self, token: &Token) -> bool {
        self.alternatives
            .iter()
            .any(|alternative| sequence_admits(alternative, token))
    }
}

impl fmt::Display for GrammarRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_production(f, self.name, self.alternatives)
    }
}

fn write_production(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    alternatives: &[&[Symbol]],
) -> fmt::Result {
    write!(f, "{name} ::=")?;
    let indent = name.len() + 2;
    for (i, alternative) in alternatives.iter().enumerate() {
        if i > 0 {
            write!(f, "\n{:indent$}|", "")?;
        }
        write!(f, " {}", Sequence(alternative))?;
    }
    Ok(())
}

use Symbol::*;
use TokenKind as T;

const MODIFIERS: Symbol = Many(&[Modifier]);
const INITIALIZER: &[Symbol] = &[Token(T::Eq), Expr];
const ARRAY_INITIALIZER: &[Symbol] = &[Token(T::Eq), ArrayInit];

/// Construct rules in priority order
static RULES: [GrammarRule; 6] = [
    GrammarRule {
        name: "declaration",
        kind: ConstructKind::Declaration,
        alternatives: &[&[MODIFIERS, Type, Ident, Opt(INITIALIZER), Token(T::Semicolon)]],
    },
    GrammarRule {
        name: "array_declaration",
        kind: ConstructKind::ArrayDeclaration,
        alternatives: &[
            &[
                MODIFIERS,
                Type,
                Token(T::LBracket),
                Token(T::RBracket),
                Ident,
                Opt(ARRAY_INITIALIZER),
                Token(T::Semicolon),
            ],
            &[
                MODIFIERS,
                Type,
                Ident,
                Token(T::LBracket),
                Token(T::RBracket),
                Opt(ARRAY_INITIALIZER),
                Token(T::Semicolon),
            ],
        ],
    },
    GrammarRule {
        name: "if_else",
        kind: ConstructKind::IfElse,
        alternatives: &[&[
            Token(T::If),
            Token(T::LParen),
            Condition,
            Token(T::RParen),
            Block,
            Opt(&[Token(T::Else), OneOf(&[Block, Rule(ConstructKind::IfElse)])]),
        ]],
    },
    GrammarRule {
        name: "while",
        kind: ConstructKind::While,
        alternatives: &[&[Token(T::While), Token(T::LParen), Condition, Token(T::RParen), Block]],
    },
    GrammarRule {
        name: "function",
        kind: ConstructKind::Function,
        alternatives: &[&[
            MODIFIERS,
            ReturnType,
            Opt(&[Token(T::LBracket), Token(T::RBracket)]),
            Ident,
            Token(T::LParen),
            Opt(&[Params]),
            Token(T::RParen),
            Block,
        ]],
    },
    GrammarRule {
        name: "statement",
        kind: ConstructKind::Statement,
        alternatives: &[
            &[Token(T::Return), Opt(&[Expr]), Token(T::Semicolon)],
            &[Expr, Token(T::Semicolon)],
        ],
    },
];

/// Productions referenced by the construct rules
static AUXILIARY: [(&str, &[&[Symbol]]); 5] = [
    (
        "BLOCK",
        &[&[
            Token(T::LBrace),
            Many(&[OneOf(&[
                Rule(ConstructKind::Declaration),
                Rule(ConstructKind::ArrayDeclaration),
                Rule(ConstructKind::IfElse),
                Rule(ConstructKind::While),
                Rule(ConstructKind::Statement),
            ])]),
            Token(T::RBrace),
        ]],
    ),
    ("PARAMS", &[&[Param, Many(&[Token(T::Comma), Param])]]),
    ("PARAM", &[&[Type, Opt(&[Token(T::LBracket), Token(T::RBracket)]), Ident]]),
    (
        "ARRAY_INIT",
        &[
            &[Token(T::New), Type, Token(T::LBracket), ArraySize, Token(T::RBracket)],
            &[Token(T::New), Type, Token(T::LBracket), Token(T::RBracket), InitList],
            &[InitList],
            &[Expr],
        ],
    ),
    (
        "INIT_LIST",
        &[&[
            Token(T::LBrace),
            Opt(&[Expr, Many(&[Token(T::Comma), Expr])]),
            Token(T::RBrace),
        ]],
    ),
];

/// Rule for `kind`
pub fn rule(kind: ConstructKind) -> &'static GrammarRule {
    match kind {
        ConstructKind::Declaration => &RULES[0],
        ConstructKind::ArrayDeclaration => &RULES[1],
        ConstructKind::IfElse => &RULES[2],
        ConstructKind::While => &RULES[3],
        ConstructKind::Function => &RULES[4],
        ConstructKind::Statement => &RULES[5],
    }
}

/// All construct rules, highest priority first
pub fn priority_order() -> &'static [GrammarRule] {
    &RULES
}

/// Union of every rule's FIRST-set wording, e.g. for UNEXPECTED_TOKEN
pub fn construct_start_description() -> String {
    let mut seen: Vec<String> = Vec::new();
    for rule in priority_order() {
        for symbol in rule.first_set() {
            let description = symbol.describe();
            if !seen.contains(&description) {
                seen.push(description);
            }
        }
    }
    join_alternatives(seen.into_iter())
}

/// The whole grammar as EBNF text
pub fn ebnf() -> String {
    struct Ebnf;

    impl fmt::Display for Ebnf {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            for rule in priority_order() {
                writeln!(f, "{rule}")?;
            }
            writeln!(f)?;
            for (name, alternatives) in &AUXILIARY {
                write_production(f, name, alternatives)?;
                writeln!(f)?;
            }
            Ok(())
        }
    }

    Ebnf.to_string()
}

/// "a, b or c"
fn join_alternatives(items: impl Iterator<Item = String>) -> String {
    let items: Vec<String> = items.collect();
    match items.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn first_token(source: &str) -> Token {
        tokenize(source).next().unwrap()
    }

    #[test]
    fn test_priority_order() {
        let kinds: Vec<ConstructKind> = priority_order().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ConstructKind::Declaration,
                ConstructKind::ArrayDeclaration,
                ConstructKind::IfElse,
                ConstructKind::While,
                ConstructKind::Function,
                ConstructKind::Statement,
            ]
        );
        for r in priority_order() {
            assert_eq!(rule(r.kind), r);
        }
    }

    #[test]
    fn test_first_sets() {
        assert_eq!(
            rule(ConstructKind::Declaration).first_set(),
            vec![Modifier, Type]
        );
        assert_eq!(
            rule(ConstructKind::IfElse).first_set(),
            vec![Token(T::If)]
        );
        assert_eq!(
            rule(ConstructKind::Statement).first_set(),
            vec![Token(T::Return), Expr]
        );
    }

    #[test]
    fn test_keyword_rules_are_disjoint() {
        let if_token = first_token("if");
        let while_token = first_token("while");
        for r in priority_order() {
            assert_eq!(r.matches_start(&if_token), r.kind == ConstructKind::IfElse);
            assert_eq!(r.matches_start(&while_token), r.kind == ConstructKind::While);
        }
    }

    #[test]
    fn test_matches_start() {
        let modifier = first_token("public");
        assert!(rule(ConstructKind::Function).matches_start(&modifier));
        assert!(rule(ConstructKind::Declaration).matches_start(&modifier));
        assert!(!rule(ConstructKind::Statement).matches_start(&modifier));

        let brace = first_token("}");
        assert!(priority_order().iter().all(|r| !r.matches_start(&brace)));
    }

    #[test]
    fn test_describe() {
        assert_eq!(Token(T::Semicolon).describe(), "';'");
        assert_eq!(Rule(ConstructKind::While).describe(), "a while loop");
        assert_eq!(OneOf(&[Block, Token(T::If)]).describe(), "'{' or 'if'");
    }

    #[test]
    fn test_construct_start_description() {
        assert_eq!(
            construct_start_description(),
            "an access modifier, a type name, 'if', 'while', a return type, \
             'return' or an expression"
        );
    }

    #[test]
    fn test_rule_display_as_ebnf() {
        assert_eq!(
            rule(ConstructKind::While).to_string(),
            "while ::= 'while' '(' CONDITION ')' BLOCK"
        );
        assert_eq!(
            rule(ConstructKind::Declaration).to_string(),
            "declaration ::= { MODIFIER } TYPE IDENT [ '=' EXPR ] ';'"
        );
    }

    #[test]
    fn test_ebnf_lists_every_production() {
        let text = ebnf();
        for name in [
            "declaration ::=",
            "array_declaration ::=",
            "if_else ::=",
            "while ::=",
            "function ::=",
            "statement ::=",
            "BLOCK ::=",
            "PARAMS ::=",
            "ARRAY_INIT ::=",
        ] {
            assert!(text.contains(name), "missing {name}");
        }
        assert!(text.contains("( BLOCK | if_else )"));
    }
}
