//! Brace pairing pre-pass
//!
//! Pairs every `{` with its `}` before parsing starts. Indentation is used to
//! decide where a block that is never closed was meant to end: a block whose
//! body starts on a new line, indented deeper than the line holding the `{`,
//! ends implicitly at the first later line that starts at or left of that
//! header column with anything other than `}`.

use super::lexer::{Token, TokenKind};
use rustc_hash::FxHashMap;

/// Where a `{` ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceEnd {
    /// Matched by the `}` at this token index
    Closed(usize),
    /// Never closed; the block is taken to end just before `implied_end`
    Unclosed { implied_end: usize },
}

#[derive(Debug, Clone, Copy)]
struct Open {
    index: usize,
    header_column: usize,
    indented: bool,
}

#[derive(Debug, Default)]
pub struct BraceMap {
    ends: FxHashMap<usize, BraceEnd>,
    stray: Vec<usize>,
}

impl BraceMap {
    pub fn build(tokens: &[Token]) -> Self {
        let mut map = BraceMap::default();
        let mut stack: Vec<Open> = Vec::new();
        let mut line_head_column = 1;

        for (i, token) in tokens.iter().enumerate() {
            if token.kind == TokenKind::Eof {
                break;
            }

            if starts_line(tokens, i) {
                line_head_column = token.location.column;
                if token.kind != TokenKind::RBrace {
                    while let Some(open) = stack.last().copied() {
                        if !open.indented || token.location.column > open.header_column {
                            break;
                        }
                        stack.pop();
                        map.ends.insert(open.index, BraceEnd::Unclosed { implied_end: i });
                    }
                }
            }

            match token.kind {
                TokenKind::LBrace => {
                    let indented = tokens.get(i + 1).is_some_and(|next| {
                        next.kind != TokenKind::Eof
                            && next.location.line > token.location.line
                            && next.location.column > line_head_column
                    });
                    stack.push(Open {
                        index: i,
                        header_column: line_head_column,
                        indented,
                    });
                }
                TokenKind::RBrace => match stack.pop() {
                    Some(open) => {
                        map.ends.insert(open.index, BraceEnd::Closed(i));
                    }
                    None => map.stray.push(i),
                },
                _ => {}
            }
        }

        let eof = tokens.len().saturating_sub(1);
        for open in stack {
            map.ends.insert(open.index, BraceEnd::Unclosed { implied_end: eof });
        }

        map
    }

    /// End of the block opened at token index `open`
    pub fn end_of(&self, open: usize) -> Option<BraceEnd> {
        self.ends.get(&open).copied()
    }

    pub fn stray(&self) -> &[usize] {
        &self.stray
    }
}

/// Whether token `i` is the first token on its line
pub(crate) fn starts_line(tokens: &[Token], i: usize) -> bool {
    i == 0 || tokens[i - 1].location.line < tokens[i].location.line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn map(source: &str) -> (Vec<Token>, BraceMap) {
        let tokens: Vec<Token> = tokenize(source).collect();
        let map = BraceMap::build(&tokens);
        (tokens, map)
    }

    fn index_of(tokens: &[Token], lexeme: &str, nth: usize) -> usize {
        tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.lexeme == lexeme)
            .nth(nth)
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_nested_pairs() {
        let (tokens, map) = map("void f() {\n    if (x) { y++; }\n}");
        let outer = index_of(&tokens, "{", 0);
        let inner = index_of(&tokens, "{", 1);
        assert_eq!(map.end_of(outer), Some(BraceEnd::Closed(index_of(&tokens, "}", 1))));
        assert_eq!(map.end_of(inner), Some(BraceEnd::Closed(index_of(&tokens, "}", 0))));
        assert!(map.stray().is_empty());
    }

    #[test]
    fn test_dedent_closes_indented_block() {
        let source = "if (x > 5) {\n    y = 10;\n\nif x > 5) {\n    count++;\n}";
        let (tokens, map) = map(source);
        let first = index_of(&tokens, "{", 0);
        let second_if = index_of(&tokens, "if", 1);
        assert_eq!(
            map.end_of(first),
            Some(BraceEnd::Unclosed { implied_end: second_if })
        );
        let second = index_of(&tokens, "{", 1);
        assert_eq!(map.end_of(second), Some(BraceEnd::Closed(tokens.len() - 2)));
    }

    #[test]
    fn test_else_on_closing_line_is_not_a_dedent() {
        let (tokens, map) = map("if (a) {\n    b = 1;\n} else {\n    b = 2;\n}");
        let then_block = index_of(&tokens, "{", 0);
        let else_block = index_of(&tokens, "{", 1);
        assert!(matches!(map.end_of(then_block), Some(BraceEnd::Closed(_))));
        assert!(matches!(map.end_of(else_block), Some(BraceEnd::Closed(_))));
    }

    #[test]
    fn test_flat_body_is_not_indentation_sensitive() {
        let (tokens, map) = map("void f() {\nx = 1;\n}");
        let open = index_of(&tokens, "{", 0);
        assert_eq!(map.end_of(open), Some(BraceEnd::Closed(tokens.len() - 2)));
    }

    #[test]
    fn test_stray_close() {
        let (tokens, map) = map("void display()\n    count++;\n}\nint x;");
        let close = index_of(&tokens, "}", 0);
        assert_eq!(map.stray(), &[close]);
    }

    #[test]
    fn test_unclosed_at_eof() {
        let (tokens, map) = map("while (x) { x--;");
        let open = index_of(&tokens, "{", 0);
        assert_eq!(
            map.end_of(open),
            Some(BraceEnd::Unclosed { implied_end: tokens.len() - 1 })
        );
    }
}
