//! Module `scanner` implements a one‑pass, streaming lexer for the Quill language.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping
//! spaces and comments, emitting `NEWLINE` tokens as statement separators and
//! exactly one `EOF` token at the end. Designed as a `FusedIterator`, it can be
//! chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//! - `Scanner::from_bytes(src: &'a [u8]) -> Result<Scanner<'a>>` validates UTF‑8 first.
//! - `tokenize(src) -> Result<Vec<Token>>` collects every token, stopping at the first error.
//! - `impl Iterator for Scanner<'a>` yields `Result<Token<'a>, QuillError>`.
//!
//! # Token Recognition
//!
//! - Punctuation and operators use maximal munch (`>>>=` is not an operator,
//!   `>>>` is; `?::` beats `?`).
//! - String literals: `"…"` or `'…'` with backslash escapes.
//! - Numeric literals: digits with optional `_` separators and fraction.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a
//!   perfect‑hash `KEYWORDS` map.
//! - Comments: `//` to end of line, skipped with `memchr`.

use crate::error::{QuillError, Result};
use crate::position::{Position, Span};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"        => TokenType::AND,
    b"or"         => TokenType::OR,
    b"not"        => TokenType::NOT,
    b"var"        => TokenType::VAR,
    b"define"     => TokenType::DEFINE,
    b"if"         => TokenType::IF,
    b"elif"       => TokenType::ELIF,
    b"else"       => TokenType::ELSE,
    b"for"        => TokenType::FOR,
    b"to"         => TokenType::TO,
    b"step"       => TokenType::STEP,
    b"foreach"    => TokenType::FOREACH,
    b"as"         => TokenType::AS,
    b"while"      => TokenType::WHILE,
    b"func"       => TokenType::FUNC,
    b"return"     => TokenType::RETURN,
    b"continue"   => TokenType::CONTINUE,
    b"break"      => TokenType::BREAK,
    b"end"        => TokenType::END,
    b"delete"     => TokenType::DELETE,
    b"none"       => TokenType::NONE,
    b"true"       => TokenType::TRUE,
    b"false"      => TokenType::FALSE,
    b"class"      => TokenType::CLASS,
    b"extends"    => TokenType::EXTENDS,
    b"new"        => TokenType::NEW,
    b"self"       => TokenType::SELF_,
    b"super"      => TokenType::SUPER,
    b"private"    => TokenType::PRIVATE,
    b"protected"  => TokenType::PROTECTED,
    b"public"     => TokenType::PUBLIC,
    b"static"     => TokenType::STATIC,
    b"override"   => TokenType::OVERRIDE,
    b"property"   => TokenType::PROPERTY,
    b"method"     => TokenType::METHOD,
    b"getter"     => TokenType::GETTER,
    b"setter"     => TokenType::SETTER,
    b"enum"       => TokenType::ENUM,
    b"switch"     => TokenType::SWITCH,
    b"case"       => TokenType::CASE,
    b"default"    => TokenType::DEFAULT,
    b"typeof"     => TokenType::TYPEOF,
    b"instanceof" => TokenType::INSTANCEOF,
    b"tag"        => TokenType::TAG,
    b"prop"       => TokenType::PROP,
    b"state"      => TokenType::STATE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s. The lifetime `'a` ties every emitted token’s
/// `lexeme` slice back to the original source buffer.
pub struct Scanner<'a> {
    text: &'a str,              // entire source file
    src: &'a [u8],              // byte view of `text`
    start: Position,            // position of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    line_start: usize,          // byte index where the current line begins
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `text`.
    #[inline]
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            src: text.as_bytes(),
            start: Position::new(0, 1, 1),
            curr: 0,
            line: 1,
            line_start: 0,
            pending: None,
        }
    }

    /// Create a lexer over raw bytes, rejecting invalid UTF‑8 up front.
    pub fn from_bytes(src: &'a [u8]) -> Result<Self> {
        let text: &str = std::str::from_utf8(src)?;

        Ok(Self::new(text))
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    #[inline(always)]
    fn current_position(&self) -> Position {
        Position::new(self.curr, self.line, self.curr - self.line_start + 1)
    }

    /// Advance one byte and return it. Callers guard with [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it. Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.src.get(self.curr + offset).copied().unwrap_or(0)
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn new_line(&mut self) {
        self.line += 1;
        self.line_start = self.curr;
    }

    fn error_span(&self) -> Span {
        Span::new(self.start, self.current_position())
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`. If the lexeme produces an
    /// actual token the kind is stored in `self.pending`. Spaces and comments
    /// are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt: TokenType = match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'[' => TokenType::LEFT_BRACKET,
            b']' => TokenType::RIGHT_BRACKET,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b';' => TokenType::SEMICOLON,
            b'#' => TokenType::HASH,
            b'@' => TokenType::AT,
            b'~' => TokenType::TILDE,
            b'^' => TokenType::CARET,

            b'.' => {
                if self.peek() == b'.' && self.peek_at(1) == b'.' {
                    self.curr += 2;
                    TokenType::TRIPLE_DOT
                } else {
                    TokenType::DOT
                }
            }

            b':' => {
                if self.match_byte(b':') {
                    TokenType::DOUBLE_COLON
                } else {
                    TokenType::COLON
                }
            }

            b'?' => {
                if self.peek() == b':' && self.peek_at(1) == b':' {
                    self.curr += 2;
                    TokenType::OPTIONAL_STATIC
                } else if self.match_byte(b'.') {
                    TokenType::OPTIONAL_DOT
                } else if self.match_byte(b'?') {
                    if self.match_byte(b'=') {
                        TokenType::NULLISH_EQUAL
                    } else {
                        TokenType::NULLISH
                    }
                } else {
                    TokenType::QMARK
                }
            }

            b'+' => {
                if self.match_byte(b'+') {
                    TokenType::INC
                } else if self.match_byte(b'=') {
                    TokenType::PLUS_EQUAL
                } else {
                    TokenType::PLUS
                }
            }

            b'-' => {
                if self.match_byte(b'-') {
                    TokenType::DEC
                } else if self.match_byte(b'=') {
                    TokenType::MINUS_EQUAL
                } else if self.match_byte(b'>') {
                    TokenType::ARROW
                } else {
                    TokenType::MINUS
                }
            }

            b'*' => {
                if self.match_byte(b'*') {
                    if self.match_byte(b'=') {
                        TokenType::POWER_EQUAL
                    } else {
                        TokenType::POWER
                    }
                } else if self.match_byte(b'=') {
                    TokenType::STAR_EQUAL
                } else {
                    TokenType::STAR
                }
            }

            b'%' => {
                if self.match_byte(b'=') {
                    TokenType::PERCENT_EQUAL
                } else {
                    TokenType::PERCENT
                }
            }

            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => {
                if self.match_byte(b'<') {
                    TokenType::SHIFT_LEFT
                } else if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                }
            }

            b'>' => {
                if self.peek() == b'>' && self.peek_at(1) == b'>' {
                    self.curr += 2;
                    TokenType::UNSIGNED_SHIFT_RIGHT
                } else if self.match_byte(b'>') {
                    TokenType::SHIFT_RIGHT
                } else if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                }
            }

            b'&' => {
                if self.match_byte(b'&') {
                    if self.match_byte(b'=') {
                        TokenType::AND_EQUAL
                    } else {
                        TokenType::AND_AND
                    }
                } else {
                    TokenType::AMPERSAND
                }
            }

            b'|' => {
                if self.match_byte(b'|') {
                    if self.match_byte(b'=') {
                        TokenType::OR_EQUAL
                    } else {
                        TokenType::OR_OR
                    }
                } else {
                    TokenType::PIPE
                }
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(());
            }

            b'\n' => {
                self.new_line();
                TokenType::NEWLINE
            }

            // ── comments (// … until newline) or slash operators ─────────
            b'/' => {
                if self.match_byte(b'/') {
                    // The newline itself is left in place so it still
                    // separates statements.
                    if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }

                    return Ok(());
                }

                if self.match_byte(b'=') {
                    TokenType::SLASH_EQUAL
                } else {
                    TokenType::SLASH
                }
            }

            b'"' | b'\'' => self.parse_string(b)?,

            b'0'..=b'9' => self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            _ => {
                let shown: char = self.text[self.curr - 1..]
                    .chars()
                    .next()
                    .unwrap_or(b as char);

                // skip the remaining bytes of a multi-byte character
                self.curr = self.curr - 1 + shown.len_utf8();

                return Err(QuillError::lex(
                    self.error_span(),
                    format!("Unexpected character: {}", shown),
                ));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// Parse a quoted string literal, resolving escapes.
    ///
    /// `self.start` points to the opening quote; on return `self.curr` points
    /// past the closing quote.
    fn parse_string(&mut self, quote: u8) -> Result<TokenType> {
        let mut value: String = String::new();
        let mut chunk_start: usize = self.curr;

        while !self.is_at_end() && self.peek() != quote {
            match self.peek() {
                b'\\' => {
                    value.push_str(&self.text[chunk_start..self.curr]);
                    self.advance();

                    if self.is_at_end() {
                        break;
                    }

                    let escaped = self.advance();
                    match escaped {
                        b'n' => value.push('\n'),
                        b't' => value.push('\t'),
                        b'r' => value.push('\r'),
                        b'\\' => value.push('\\'),
                        b'"' => value.push('"'),
                        b'\'' => value.push('\''),
                        b'{' => value.push('{'),
                        b'\n' => self.new_line(),
                        other => {
                            return Err(QuillError::lex(
                                self.error_span(),
                                format!("Invalid escape sequence: \\{}", other as char),
                            ));
                        }
                    }

                    chunk_start = self.curr;
                }

                b'\n' => {
                    self.advance();
                    self.new_line();
                }

                _ => {
                    self.advance();
                }
            }
        }

        if self.is_at_end() {
            return Err(QuillError::lex(self.error_span(), "Unterminated string."));
        }

        value.push_str(&self.text[chunk_start..self.curr]);
        self.advance(); // closing quote

        Ok(TokenType::STRING(value))
    }

    /// Parse a numeric literal (`123`, `3.14`, `1_000`). Fractions are optional.
    fn parse_number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() || self.peek() == b'_' {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() || self.peek() == b'_' {
                self.advance();
            }
        }

        let digits: String = self.text[self.start.idx..self.curr]
            .chars()
            .filter(|c| *c != '_')
            .collect();

        // only digits, '_' and one '.' were consumed
        TokenType::NUMBER(digits.parse::<f64>().unwrap_or(0.0))
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start.idx..self.curr];

        KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.len() {
            // EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                let at = self.current_position();
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", Span::new(at, at))));
            }

            self.start = self.current_position();
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let lex: &'a str = &self.text[self.start.idx..self.curr];
                // a NEWLINE token ends on the next line; keep its span on the line it ends
                let end = if matches!(tt, TokenType::NEWLINE) {
                    Position::new(self.curr, self.start.line, self.start.col + 1)
                } else {
                    self.current_position()
                };

                return Some(Ok(Token::new(tt, lex, Span::new(self.start, end))));
            }
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan the whole input, failing on the first lexical error.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>> {
    let tokens: Vec<Token<'_>> = Scanner::new(text).collect::<Result<Vec<_>>>()?;

    debug!("Tokenized {} tokens", tokens.len());

    Ok(tokens)
}
