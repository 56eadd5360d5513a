//! Token index to byte span resolution
//!
//! The grammar evaluator speaks token *indices*; byte offsets exist only on
//! this side of the boundary. `TokenOffsets` is the per-source table that
//! turns an index range from an evaluator record back into a span of the
//! original text. The `eof` token is deliberately excluded: it covers no
//! bytes, and keeping it out means a record whose range runs past the last
//! real token fails to resolve instead of resolving to an empty span.

use std::ops::Range;

use crate::token::Token;

/// Per-source mapping from token index to original byte span
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenOffsets {
    spans: Vec<Range<usize>>,
}

impl TokenOffsets {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        Self {
            spans: tokens
                .iter()
                .filter(|token| !token.is_eof())
                .map(Token::span)
                .collect(),
        }
    }

    /// Number of real (non-`eof`) tokens
    pub fn token_count(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Byte span of the token at `index`
    pub fn get(&self, index: usize) -> Option<Range<usize>> {
        self.spans.get(index).cloned()
    }

    /// Byte span covered by the tokens `[start, end_exclusive)`
    ///
    /// The end offset is the end of token `end_exclusive - 1`. Returns
    /// `None` when the range is empty, inverted, or runs past the last real
    /// token; the caller decides what that breach means.
    pub fn span_of_tokens(&self, start: u32, end_exclusive: u32) -> Option<Range<usize>> {
        if end_exclusive <= start {
            return None;
        }
        let first = self.get(start as usize)?;
        let last = self.get(end_exclusive as usize - 1)?;
        Some(first.start..last.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexing::tokenize;

    #[test]
    fn test_spans_match_tokenization() {
        let scan = tokenize("int x = 42;");
        let offsets = TokenOffsets::from_tokens(&scan.tokens);
        for token in scan.tokens.iter().filter(|t| !t.is_eof()) {
            assert_eq!(offsets.get(token.index), Some(token.span()));
        }
    }

    #[test]
    fn test_eof_is_not_in_the_table() {
        let scan = tokenize("x");
        let offsets = TokenOffsets::from_tokens(&scan.tokens);
        assert_eq!(offsets.token_count(), 1);
        assert_eq!(offsets.get(1), None);
        assert!(!offsets.is_empty());
        assert!(TokenOffsets::from_tokens(&[]).is_empty());
    }

    #[test]
    fn test_span_of_token_range() {
        let scan = tokenize("int x = 42;");
        let offsets = TokenOffsets::from_tokens(&scan.tokens);
        // whole statement: tokens [0, 5)
        assert_eq!(offsets.span_of_tokens(0, 5), Some(0..11));
        // `x = 42`
        assert_eq!(offsets.span_of_tokens(1, 4), Some(4..10));
        // single token
        assert_eq!(offsets.span_of_tokens(3, 4), Some(8..10));
    }

    #[test]
    fn test_bad_ranges_do_not_resolve() {
        let scan = tokenize("int x;");
        let offsets = TokenOffsets::from_tokens(&scan.tokens);
        assert_eq!(offsets.span_of_tokens(2, 2), None, "empty range");
        assert_eq!(offsets.span_of_tokens(2, 1), None, "inverted range");
        assert_eq!(offsets.span_of_tokens(0, 4), None, "past the last token");
        assert_eq!(offsets.span_of_tokens(9, 10), None, "start out of range");
    }
}
