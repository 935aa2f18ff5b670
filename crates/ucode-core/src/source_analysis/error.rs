// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for lexing and parsing.
//!
//! Neither error stops the pipeline: lexical errors are folded into the token
//! stream as [`TokenKind::Error`] and syntax errors are turned into
//! diagnostics once the parser has resynchronized.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use super::{Span, Token, TokenKind};

/// A lexical error encountered during tokenization.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic()]
pub struct LexError {
    #[source]
    pub kind: LexErrorKind,
    #[label("here")]
    pub span: Span,
}

impl LexError {
    #[must_use]
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Converts the error into the [`TokenKind::Error`] token the lexer emits.
    #[must_use]
    pub fn into_token(self) -> Token {
        Token::new(TokenKind::Error(EcoString::from(self.kind.to_string())), self.span)
    }
}

/// The kind of lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("Unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Unterminated template literal")]
    UnterminatedTemplate,

    #[error("Unterminated comment")]
    UnterminatedComment,

    #[error("Unterminated regular expression")]
    UnterminatedRegex,

    #[error("Invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    #[error("Invalid number literal '{0}'")]
    InvalidNumber(EcoString),

    #[error("Invalid regular expression flag '{0}'")]
    InvalidRegexFlag(char),

    #[error("Invalid character class in regular expression")]
    InvalidRegexClass,

    #[error("Unexpected '/': did you mean '//' for a line comment or '/* */' for a block comment?")]
    StraySlash,
}

/// A syntax error raised while parsing a statement.
///
/// The parser records exactly one diagnostic per `SyntaxError` and then
/// skips ahead to the next statement boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic()]
pub struct SyntaxError {
    pub message: EcoString,
    #[label("here")]
    pub span: Span,
}

impl SyntaxError {
    #[must_use]
    pub fn new(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}
