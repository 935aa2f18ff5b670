// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexing and parsing for ucode source.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s, each
//! carrying its byte range as a [`Span`]. Whether `/` starts a regular
//! expression or is a division depends on the previous token, so the lexer
//! is inherently sequential.
//!
//! ```
//! use ucode_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("x + 1").collect();
//! assert_eq!(tokens.len(), 3); // x, +, 1
//! ```
//!
//! Template files (`Hello {{ name }}`) are lexed with
//! [`SourceMode::Template`].
//!
//! # Parsing
//!
//! [`parse`] turns a token stream into a [`Program`](crate::ast::Program).
//! Expression precedence uses a Pratt rule table (see the `parser` module).
//!
//! # Error Handling
//!
//! Neither stage stops at the first problem. Invalid input becomes
//! [`TokenKind::Error`] tokens, which the parser turns into [`Diagnostic`]s
//! before resynchronizing at the next statement boundary.

mod error;
mod lexer;
mod parser;
mod span;
mod token;


pub use error::{LexError, LexErrorKind, SyntaxError};
pub use lexer::{Lexer, SourceMode, tokenize, tokenize_with_mode};
pub use parser::{
    Diagnostic, DiagnosticCategory, MAX_NESTING_DEPTH, ParseOutput, Severity, parse,
    parse_source, parse_template,
};
pub use span::Span;
pub use token::{Token, TokenKind};
