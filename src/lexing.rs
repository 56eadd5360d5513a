//! Tokenization entry point
//!
//! `tokenize` drives the logos rule set over a source buffer and materializes
//! owned `Token`s with byte spans and sequence indices, closing a clean
//! stream with one empty-span `eof` token. When no rule matches, scanning
//! stops at that byte: the tokens seen so far are kept (without an `eof`
//! terminator, since the scan never reached end-of-input) and the offset
//! of the unmatched position is reported. Nothing is ever fabricated to
//! paper over a bad byte.

use std::fmt;

use logos::Logos;

use crate::token::{RawToken, Token, TokenKind};

/// No lexical rule matched at `offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalError {
    /// Byte offset of the first unmatched position
    pub offset: usize,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no lexical rule matches input at byte offset {}", self.offset)
    }
}

impl std::error::Error for LexicalError {}

/// Outcome of scanning one source unit
#[derive(Debug, Clone, PartialEq)]
pub struct Tokenization {
    /// Full stream ending in `eof`, or the partial stream up to the error
    pub tokens: Vec<Token>,
    /// First unmatched position, if scanning stopped early
    pub error: Option<LexicalError>,
}

impl Tokenization {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// The tokens if scanning completed, otherwise the error
    pub fn into_result(self) -> Result<Vec<Token>, LexicalError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.tokens),
        }
    }
}

/// Scan `source` into classified tokens with maximal munch
pub fn tokenize(source: &str) -> Tokenization {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(raw) => {
                let span = lexer.span();
                let index = tokens.len();
                tokens.push(Token {
                    lexeme: lexer.slice().to_string(),
                    kind: raw.into(),
                    start: span.start,
                    end: span.end,
                    index,
                });
            }
            Err(()) => {
                return Tokenization {
                    tokens,
                    error: Some(LexicalError {
                        offset: lexer.span().start,
                    }),
                };
            }
        }
    }
    let index = tokens.len();
    tokens.push(Token {
        lexeme: String::new(),
        kind: TokenKind::Eof,
        start: source.len(),
        end: source.len(),
        index,
    });
    Tokenization { tokens, error: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_input_is_just_eof() {
        let scan = tokenize("");
        assert!(scan.is_complete());
        assert_eq!(scan.tokens.len(), 1);
        assert_eq!(scan.tokens[0].kind, TokenKind::Eof);
        assert_eq!(scan.tokens[0].span(), 0..0);
    }

    #[test]
    fn test_eof_sits_at_end_of_input_with_empty_span() {
        let scan = tokenize("int x;");
        let eof = scan.tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.span(), 6..6);
        assert_eq!(eof.lexeme, "");
    }

    #[test]
    fn test_indices_are_sequential() {
        let scan = tokenize("int x = 1;");
        for (position, token) in scan.tokens.iter().enumerate() {
            assert_eq!(token.index, position);
        }
    }

    #[test]
    fn test_spans_slice_back_to_lexemes() {
        let source = "public class Point { }";
        let scan = tokenize(source);
        for token in scan.tokens.iter().filter(|t| !t.is_eof()) {
            assert_eq!(&source[token.span()], token.lexeme);
        }
    }

    #[test]
    fn test_simple_statement() {
        assert_eq!(
            kinds("int x = 1;"),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::IntegerLiteral,
                TokenKind::Separator,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_a_lexical_error() {
        let scan = tokenize("String s = \"oops");
        assert_eq!(scan.error, Some(LexicalError { offset: 11 }));
        // String, s, = were already scanned; no eof terminator
        assert_eq!(scan.tokens.len(), 3);
        assert!(scan.tokens.iter().all(|t| !t.is_eof()));
    }

    #[test]
    fn test_unmatched_byte_keeps_partial_tokens() {
        let scan = tokenize("int x = #");
        assert_eq!(scan.error, Some(LexicalError { offset: 8 }));
        let lexemes: Vec<&str> = scan.tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["int", "x", "="]);
        assert!(scan.clone().into_result().is_err());
    }

    #[test]
    fn test_line_comment_at_end_of_input() {
        assert_eq!(kinds("x // done"), vec![TokenKind::Identifier, TokenKind::Eof]);
    }
}
