//! Centralised error hierarchy for the **Quill interpreter**.
//!
//! All subsystems (scanner, parser, interpreter, natives) convert their
//! failure modes into one of the variants defined here. Every variant carries
//! the [`Span`] of the offending source text so an external reporting layer
//! can render it with context.
//!
//! The module **does not** print diagnostics itself.

use thiserror::Error;

use log::info;

use crate::position::Span;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuillError {
    /// Lexical (scanner) error.
    #[error("[{span}] Lexical error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        span: Span,
    },

    /// Syntactic (parser) error. One error aborts the parse.
    #[error("[{span}] Syntax error: {message}")]
    Syntax { message: String, span: Span },

    /// General evaluation-time error.
    #[error("[{span}] Runtime error in {context}: {message}")]
    Runtime {
        message: String,
        span: Span,

        /// Display name of the context that raised the error.
        context: String,
    },

    /// Declared-type mismatch on a declaration, argument or assignment.
    #[error("[{span}] Type error in {context}: expected '{expected_type}' but got '{value_type}' ({message})")]
    Type {
        message: String,
        value_type: String,
        expected_type: String,
        span: Span,
        context: String,
    },

    /// UTF‑8 decoding failure when ingesting source bytes.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl QuillError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(span: Span, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: {}, msg={}", span, message);

        QuillError::Lex { message, span }
    }

    /// Helper constructor for the **parser**.
    pub fn syntax<S: Into<String>>(span: Span, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Syntax error: {}, msg={}", span, message);

        QuillError::Syntax { message, span }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(span: Span, context: &str, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: {}, msg={}", span, message);

        QuillError::Runtime {
            message,
            span,
            context: context.to_string(),
        }
    }

    pub fn type_mismatch<S: Into<String>>(
        span: Span,
        context: &str,
        value_type: &str,
        expected_type: &str,
        msg: S,
    ) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Type error: {}, expected={}, got={}",
            span, expected_type, value_type
        );

        QuillError::Type {
            message,
            value_type: value_type.to_string(),
            expected_type: expected_type.to_string(),
            span,
            context: context.to_string(),
        }
    }

    /// Span of the offending source, when the error has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            QuillError::Lex { span, .. }
            | QuillError::Syntax { span, .. }
            | QuillError::Runtime { span, .. }
            | QuillError::Type { span, .. } => Some(*span),
            QuillError::Utf8(_) => None,
        }
    }

    /// Human-readable message without the location prefix.
    pub fn message(&self) -> String {
        match self {
            QuillError::Lex { message, .. }
            | QuillError::Syntax { message, .. }
            | QuillError::Runtime { message, .. }
            | QuillError::Type { message, .. } => message.clone(),
            QuillError::Utf8(e) => e.to_string(),
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, QuillError::Runtime { .. })
    }

    pub fn is_type(&self) -> bool {
        matches!(self, QuillError::Type { .. })
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, QuillError::Syntax { .. })
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, QuillError>;
