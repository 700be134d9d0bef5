use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

use crate::position::Span;

/// The different kinds of tokens recognized by the Quill scanner.
///
/// Variants without data represent punctuation, operators or keywords.
/// `STRING(String)` and `NUMBER(f64)` carry their literal values.
/// `IDENTIFIER` is used for user‑defined names.
/// `NEWLINE` separates statements; `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '['
    LEFT_BRACKET,

    /// ']'
    RIGHT_BRACKET,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// ':'
    COLON,

    /// '::'
    DOUBLE_COLON,

    /// ';'
    SEMICOLON,

    /// '\n'
    NEWLINE,

    /// '->'
    ARROW,

    /// '...'
    TRIPLE_DOT,

    /// '?'
    QMARK,

    /// '?.'
    OPTIONAL_DOT,

    /// '?::'
    OPTIONAL_STATIC,

    /// '#'
    HASH,

    /// '@'
    AT,

    /// '+'
    PLUS,

    /// '-'
    MINUS,

    /// '*'
    STAR,

    /// '/'
    SLASH,

    /// '%'
    PERCENT,

    /// '**'
    POWER,

    /// '++'
    INC,

    /// '--'
    DEC,

    /// '+='
    PLUS_EQUAL,

    /// '-='
    MINUS_EQUAL,

    /// '*='
    STAR_EQUAL,

    /// '/='
    SLASH_EQUAL,

    /// '%='
    PERCENT_EQUAL,

    /// '**='
    POWER_EQUAL,

    /// '??='
    NULLISH_EQUAL,

    /// '&&='
    AND_EQUAL,

    /// '||='
    OR_EQUAL,

    /// '??'
    NULLISH,

    /// '&&'
    AND_AND,

    /// '||'
    OR_OR,

    /// '!'
    BANG,

    /// '&'
    AMPERSAND,

    /// '|'
    PIPE,

    /// '^'
    CARET,

    /// '~'
    TILDE,

    /// '<<'
    SHIFT_LEFT,

    /// '>>'
    SHIFT_RIGHT,

    /// '>>>'
    UNSIGNED_SHIFT_RIGHT,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '!='
    BANG_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes, escapes resolved)
    STRING(String),

    /// A numeric literal
    #[serde(rename = "NUMBER")]
    NUMBER(f64),

    AND,
    OR,
    NOT,
    VAR,
    DEFINE,
    IF,
    ELIF,
    ELSE,
    FOR,
    TO,
    STEP,
    FOREACH,
    AS,
    WHILE,
    FUNC,
    RETURN,
    CONTINUE,
    BREAK,
    END,
    DELETE,
    NONE,
    TRUE,
    FALSE,
    CLASS,
    EXTENDS,
    NEW,
    SELF_,
    SUPER,
    PRIVATE,
    PROTECTED,
    PUBLIC,
    STATIC,
    OVERRIDE,
    PROPERTY,
    METHOD,
    GETTER,
    SETTER,
    ENUM,
    SWITCH,
    CASE,
    DEFAULT,
    TYPEOF,
    INSTANCEOF,
    TAG,
    PROP,
    STATE,

    /// End‑of‑file marker
    EOF,
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl TokenType {
    /// Upper-case variant name, used by `tokenize` output.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACKET => "LEFT_BRACKET",
            TokenType::RIGHT_BRACKET => "RIGHT_BRACKET",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::COLON => "COLON",
            TokenType::DOUBLE_COLON => "DOUBLE_COLON",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::NEWLINE => "NEWLINE",
            TokenType::ARROW => "ARROW",
            TokenType::TRIPLE_DOT => "TRIPLE_DOT",
            TokenType::QMARK => "QMARK",
            TokenType::OPTIONAL_DOT => "OPTIONAL_DOT",
            TokenType::OPTIONAL_STATIC => "OPTIONAL_STATIC",
            TokenType::HASH => "HASH",
            TokenType::AT => "AT",
            TokenType::PLUS => "PLUS",
            TokenType::MINUS => "MINUS",
            TokenType::STAR => "STAR",
            TokenType::SLASH => "SLASH",
            TokenType::PERCENT => "PERCENT",
            TokenType::POWER => "POWER",
            TokenType::INC => "INC",
            TokenType::DEC => "DEC",
            TokenType::PLUS_EQUAL => "PLUS_EQUAL",
            TokenType::MINUS_EQUAL => "MINUS_EQUAL",
            TokenType::STAR_EQUAL => "STAR_EQUAL",
            TokenType::SLASH_EQUAL => "SLASH_EQUAL",
            TokenType::PERCENT_EQUAL => "PERCENT_EQUAL",
            TokenType::POWER_EQUAL => "POWER_EQUAL",
            TokenType::NULLISH_EQUAL => "NULLISH_EQUAL",
            TokenType::AND_EQUAL => "AND_EQUAL",
            TokenType::OR_EQUAL => "OR_EQUAL",
            TokenType::NULLISH => "NULLISH",
            TokenType::AND_AND => "AND_AND",
            TokenType::OR_OR => "OR_OR",
            TokenType::BANG => "BANG",
            TokenType::AMPERSAND => "AMPERSAND",
            TokenType::PIPE => "PIPE",
            TokenType::CARET => "CARET",
            TokenType::TILDE => "TILDE",
            TokenType::SHIFT_LEFT => "SHIFT_LEFT",
            TokenType::SHIFT_RIGHT => "SHIFT_RIGHT",
            TokenType::UNSIGNED_SHIFT_RIGHT => "UNSIGNED_SHIFT_RIGHT",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::AND => "AND",
            TokenType::OR => "OR",
            TokenType::NOT => "NOT",
            TokenType::VAR => "VAR",
            TokenType::DEFINE => "DEFINE",
            TokenType::IF => "IF",
            TokenType::ELIF => "ELIF",
            TokenType::ELSE => "ELSE",
            TokenType::FOR => "FOR",
            TokenType::TO => "TO",
            TokenType::STEP => "STEP",
            TokenType::FOREACH => "FOREACH",
            TokenType::AS => "AS",
            TokenType::WHILE => "WHILE",
            TokenType::FUNC => "FUNC",
            TokenType::RETURN => "RETURN",
            TokenType::CONTINUE => "CONTINUE",
            TokenType::BREAK => "BREAK",
            TokenType::END => "END",
            TokenType::DELETE => "DELETE",
            TokenType::NONE => "NONE",
            TokenType::TRUE => "TRUE",
            TokenType::FALSE => "FALSE",
            TokenType::CLASS => "CLASS",
            TokenType::EXTENDS => "EXTENDS",
            TokenType::NEW => "NEW",
            TokenType::SELF_ => "SELF",
            TokenType::SUPER => "SUPER",
            TokenType::PRIVATE => "PRIVATE",
            TokenType::PROTECTED => "PROTECTED",
            TokenType::PUBLIC => "PUBLIC",
            TokenType::STATIC => "STATIC",
            TokenType::OVERRIDE => "OVERRIDE",
            TokenType::PROPERTY => "PROPERTY",
            TokenType::METHOD => "METHOD",
            TokenType::GETTER => "GETTER",
            TokenType::SETTER => "SETTER",
            TokenType::ENUM => "ENUM",
            TokenType::SWITCH => "SWITCH",
            TokenType::CASE => "CASE",
            TokenType::DEFAULT => "DEFAULT",
            TokenType::TYPEOF => "TYPEOF",
            TokenType::INSTANCEOF => "INSTANCEOF",
            TokenType::TAG => "TAG",
            TokenType::PROP => "PROP",
            TokenType::STATE => "STATE",
            TokenType::EOF => "EOF",
        }
    }
}

/// A scanned token, including its type, the original lexeme,
/// and the span where it was found.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: &'a str,

    pub span: Span,
}

impl<'a> Token<'a> {
    /// Create a new Token with the given type, lexeme, and span.
    pub fn new(token_type: TokenType, lexeme: &'a str, span: Span) -> Self {
        debug!(
            "Creating new token: type={:?}, lexeme={:?}, {}",
            token_type, lexeme, span
        );

        Self {
            token_type,
            lexeme,
            span,
        }
    }

    /// Keywords double as attribute names inside HTML literals (`for`,
    /// `class`, `default`...), so the parser needs to know which tokens are
    /// word-shaped.
    pub fn is_word(&self) -> bool {
        !self.lexeme.is_empty()
            && !matches!(self.token_type, TokenType::STRING(_) | TokenType::NUMBER(_))
            && self
                .lexeme
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
            && !self.lexeme.as_bytes()[0].is_ascii_digit()
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = self.token_type.name();
        let lexeme = if matches!(self.token_type, TokenType::NEWLINE) {
            "\\n"
        } else {
            self.lexeme
        };

        match &self.token_type {
            TokenType::STRING(s) => write!(f, "{} {} {}", variant, lexeme, s),

            // 3 → "3.0", 3.14 → "3.14"
            TokenType::NUMBER(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                write!(f, "{} {} {}.0", variant, lexeme, buf.format(*n as i64))
            }

            TokenType::NUMBER(n) => write!(f, "{} {} {}", variant, lexeme, n),

            _ => write!(f, "{} {} null", variant, lexeme),
        }
    }
}
