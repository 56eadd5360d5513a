//! Token definitions for Java-like source
//!
//! The lexical rules live on the `RawToken` enum as logos patterns: fixed
//! `#[token]` literals for keywords, operators, separators and brackets, and
//! `#[regex]` rules for identifiers and literals. Logos gives maximal munch
//! for free (the longest match always wins), and equal-length conflicts fall
//! back to rule priority, where literal tokens outrank regexes; that is
//! exactly what makes `class` a keyword while `classFoo` stays an identifier.
//!
//! Numerals are the one hand-written rule: an entry pattern anchors the
//! first digit (or a dot with a digit behind it) and `scan_numeral` extends
//! the token over radix prefix, grouped digits, fraction, exponent and
//! suffix, then classifies it. A numeral never ends on a `_`; a trailing
//! underscore is left to the next token.
//!
//! Whitespace and both comment forms are recognized and skipped; they never
//! surface as tokens. Escape sequences inside string and character literals
//! are deliberately not interpreted: an escaped quote ends the literal. The
//! grammar downstream only needs the lexeme and its span, not the decoded
//! value.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use logos::Logos;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The reserved words of the grammar
///
/// `true`, `false` and `null` are not reserved here; they lex as identifiers.
pub const KEYWORDS: [&str; 50] = [
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extends",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "try",
    "void",
    "volatile",
    "while",
];

static KEYWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| KEYWORDS.iter().copied().collect());

/// Whether `text` is one of the reserved words
pub fn is_keyword(text: &str) -> bool {
    KEYWORD_SET.contains(text)
}

/// Raw lexical rules, one variant per token class
///
/// Variants carry no payload except the numeral class; the lexeme is sliced
/// out of the source by the caller. `eof` has no rule here; it is appended
/// by `lexing::tokenize`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\x0B\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+([^*/][^*]*\*+)*/")]
pub enum RawToken {
    // Reserved words; each literal outranks the identifier rule on a
    // same-length match
    #[token("abstract")]
    #[token("assert")]
    #[token("boolean")]
    #[token("break")]
    #[token("byte")]
    #[token("case")]
    #[token("catch")]
    #[token("char")]
    #[token("class")]
    #[token("const")]
    #[token("continue")]
    #[token("default")]
    #[token("do")]
    #[token("double")]
    #[token("else")]
    #[token("enum")]
    #[token("extends")]
    #[token("final")]
    #[token("finally")]
    #[token("float")]
    #[token("for")]
    #[token("goto")]
    #[token("if")]
    #[token("implements")]
    #[token("import")]
    #[token("instanceof")]
    #[token("int")]
    #[token("interface")]
    #[token("long")]
    #[token("native")]
    #[token("new")]
    #[token("package")]
    #[token("private")]
    #[token("protected")]
    #[token("public")]
    #[token("return")]
    #[token("short")]
    #[token("static")]
    #[token("strictfp")]
    #[token("super")]
    #[token("switch")]
    #[token("synchronized")]
    #[token("this")]
    #[token("throw")]
    #[token("throws")]
    #[token("transient")]
    #[token("try")]
    #[token("void")]
    #[token("volatile")]
    #[token("while")]
    Keyword,

    // No `$` in identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z_0-9]*")]
    Identifier,

    // Decimal, hex, octal and binary numerals, integer and float. The
    // entry patterns anchor only the first digit (or a dot followed by
    // one); `scan_numeral` munches the rest and picks the class.
    #[regex(r"[0-9]", scan_numeral)]
    #[regex(r"\.[0-9]", scan_numeral)]
    Numeric(NumericKind),

    // Escapes are not interpreted; a literal never crosses a line
    #[regex(r#""[^"\n]*""#)]
    StringLiteral,

    #[regex(r"'[^'\n]'")]
    CharLiteral,

    // Multi-character operators win over their prefixes by maximal munch
    #[token("||")]
    #[token("&&")]
    #[token("|")]
    #[token("^")]
    #[token("&")]
    #[token("==")]
    #[token("!=")]
    #[token("<")]
    #[token(">")]
    #[token("<=")]
    #[token(">=")]
    #[token("<<")]
    #[token(">>")]
    #[token(">>>")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("++")]
    #[token("--")]
    #[token("!")]
    #[token("@")]
    #[token("?")]
    #[token(":")]
    #[token("->")]
    #[token("...")]
    #[token("=")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("%=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token(">>>=")]
    Operator,

    #[token(";")]
    #[token(",")]
    #[token(".")]
    Separator,

    #[token("{")]
    #[token("}")]
    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    Bracket,
}

/// Numeral class decided by `scan_numeral`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Float,
}

/// Extend a numeral entry match to the full token and classify it
fn scan_numeral<'s>(lex: &mut logos::Lexer<'s, RawToken>) -> NumericKind {
    let start = lex.span().start;
    let (len, kind) = numeral_at(&lex.source().as_bytes()[start..]);
    let matched = lex.slice().len();
    if len > matched {
        lex.bump(len - matched);
    }
    kind
}

/// Longest numeral at the start of `text`, with its class
///
/// `text` begins at the matched entry: a decimal digit, or a `.` with a
/// digit behind it. Candidates follow the Java numeral grammar: decimal,
/// hex, octal and binary integers with an optional `[lL]` suffix, and
/// decimal or hex-significand floats with fraction, exponent and `[fFdD]`
/// suffix. The longest candidate wins, mirroring maximal munch.
fn numeral_at(text: &[u8]) -> (usize, NumericKind) {
    if text[0] == b'.' {
        // . digits exp? suffix?
        let fraction = digit_run(text, 1, is_dec);
        if fraction == 0 {
            return (1, NumericKind::Float);
        }
        let mut len = 1 + fraction;
        len += exponent_run(text, len, b'e', b'E');
        len += float_suffix(text, len);
        return (len, NumericKind::Float);
    }

    let mut best = (0, NumericKind::Integer);
    let mut consider = |len: usize, kind: NumericKind| {
        if len > best.0 {
            best = (len, kind);
        }
    };

    // decimal integer: 0 alone, or a run not led by 0
    let digits = digit_run(text, 0, is_dec);
    let decimal = if text[0] == b'0' { 1 } else { digits };
    consider(decimal + integer_suffix(text, decimal), NumericKind::Integer);

    if text[0] == b'0' {
        // octal: underscores may sit between the leading 0 and the digits
        let mut cursor = 1;
        while text.get(cursor).copied() == Some(b'_') {
            cursor += 1;
        }
        let octal = digit_run(text, cursor, is_oct);
        if octal > 0 {
            let len = cursor + octal;
            consider(len + integer_suffix(text, len), NumericKind::Integer);
        }

        if matches!(text.get(1).copied(), Some(b'b' | b'B')) {
            let binary = digit_run(text, 2, is_bin);
            if binary > 0 {
                let len = 2 + binary;
                consider(len + integer_suffix(text, len), NumericKind::Integer);
            }
        }

        if matches!(text.get(1).copied(), Some(b'x' | b'X')) {
            let hex = digit_run(text, 2, is_hex);
            if hex > 0 {
                let len = 2 + hex;
                consider(len + integer_suffix(text, len), NumericKind::Integer);
            }

            // hex significand, whole and fractional parts, with a
            // required binary exponent
            let mut cursor = 2 + hex;
            let mut significand = hex > 0;
            if text.get(cursor).copied() == Some(b'.') {
                let fraction = digit_run(text, cursor + 1, is_hex);
                if fraction > 0 {
                    cursor += 1 + fraction;
                    significand = true;
                } else if hex > 0 {
                    cursor += 1;
                }
            }
            if significand {
                let exponent = exponent_run(text, cursor, b'p', b'P');
                if exponent > 0 {
                    let len = cursor + exponent;
                    consider(len + float_suffix(text, len), NumericKind::Float);
                }
            }
        }
    }

    // decimal float: digits . digits? exp? suffix? | digits exp suffix?
    // | digits suffix
    if text.get(digits).copied() == Some(b'.') {
        let mut len = digits + 1;
        len += digit_run(text, len, is_dec);
        len += exponent_run(text, len, b'e', b'E');
        len += float_suffix(text, len);
        consider(len, NumericKind::Float);
    } else {
        let exponent = exponent_run(text, digits, b'e', b'E');
        if exponent > 0 {
            let len = digits + exponent;
            consider(len + float_suffix(text, len), NumericKind::Float);
        } else if float_suffix(text, digits) > 0 {
            consider(digits + 1, NumericKind::Float);
        }
    }

    best
}

fn is_dec(byte: u8) -> bool {
    byte.is_ascii_digit()
}

fn is_hex(byte: u8) -> bool {
    byte.is_ascii_hexdigit()
}

fn is_oct(byte: u8) -> bool {
    (b'0'..=b'7').contains(&byte)
}

fn is_bin(byte: u8) -> bool {
    byte == b'0' || byte == b'1'
}

/// Length of the digit run at `at`, `_` grouping allowed inside
///
/// The run must start and end on a digit; trailing underscores stay
/// outside. `0` when `at` holds no digit.
fn digit_run(text: &[u8], at: usize, digit: fn(u8) -> bool) -> usize {
    if at >= text.len() || !digit(text[at]) {
        return 0;
    }
    let mut run = 1;
    let mut end = at + 1;
    while end < text.len() && (digit(text[end]) || text[end] == b'_') {
        if digit(text[end]) {
            run = end + 1 - at;
        }
        end += 1;
    }
    run
}

/// Length of `[eE][+-]?digits` at `at` (`[pP]` for hex floats); `0`
/// unless at least one exponent digit follows the marker
fn exponent_run(text: &[u8], at: usize, lower: u8, upper: u8) -> usize {
    match text.get(at).copied() {
        Some(byte) if byte == lower || byte == upper => {}
        _ => return 0,
    }
    let mut cursor = at + 1;
    if matches!(text.get(cursor).copied(), Some(b'+' | b'-')) {
        cursor += 1;
    }
    let digits = digit_run(text, cursor, is_dec);
    if digits == 0 {
        return 0;
    }
    cursor + digits - at
}

fn integer_suffix(text: &[u8], at: usize) -> usize {
    usize::from(matches!(text.get(at).copied(), Some(b'l' | b'L')))
}

fn float_suffix(text: &[u8], at: usize) -> usize {
    usize::from(matches!(text.get(at).copied(), Some(b'f' | b'F' | b'd' | b'D')))
}

/// Token classification exposed to the rest of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Keyword,
    Identifier,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,
    Operator,
    Separator,
    Bracket,
    Eof,
}

impl TokenKind {
    /// Label carried in `token_type` facts
    ///
    /// `None` for the kinds grammar rules match by lexeme alone
    /// (operators, separators, brackets) and for `eof`, which is never
    /// exported.
    pub fn fact_label(self) -> Option<&'static str> {
        match self {
            TokenKind::Keyword => Some("keyword"),
            TokenKind::Identifier => Some("identifier"),
            TokenKind::IntegerLiteral => Some("integer"),
            TokenKind::FloatLiteral => Some("float"),
            TokenKind::StringLiteral => Some("string"),
            TokenKind::CharLiteral => Some("char"),
            TokenKind::Operator | TokenKind::Separator | TokenKind::Bracket | TokenKind::Eof => {
                None
            }
        }
    }

    /// Whether this kind is one of the four literal classes
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntegerLiteral
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
        )
    }

    pub fn is_eof(self) -> bool {
        self == TokenKind::Eof
    }
}

impl From<RawToken> for TokenKind {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::Keyword => TokenKind::Keyword,
            RawToken::Identifier => TokenKind::Identifier,
            RawToken::Numeric(NumericKind::Integer) => TokenKind::IntegerLiteral,
            RawToken::Numeric(NumericKind::Float) => TokenKind::FloatLiteral,
            RawToken::StringLiteral => TokenKind::StringLiteral,
            RawToken::CharLiteral => TokenKind::CharLiteral,
            RawToken::Operator => TokenKind::Operator,
            RawToken::Separator => TokenKind::Separator,
            RawToken::Bracket => TokenKind::Bracket,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerLiteral => "integer_literal",
            TokenKind::FloatLiteral => "float_literal",
            TokenKind::StringLiteral => "string_literal",
            TokenKind::CharLiteral => "char_literal",
            TokenKind::Operator => "operator",
            TokenKind::Separator => "separator",
            TokenKind::Bracket => "bracket",
            TokenKind::Eof => "eof",
        };
        f.write_str(name)
    }
}

/// A classified token with its exact byte span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub lexeme: String,
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// Sequence position within the stream, the unit the evaluator speaks
    pub index: usize,
}

impl Token {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_eof(&self) -> bool {
        self.kind.is_eof()
    }
}
