// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! ucode language tooling core.
//!
//! This crate contains the front end of a ucode language server:
//! - Lexical analysis (tokenization, including template files)
//! - Parsing (AST construction with error recovery)
//! - Semantic analysis (scopes, type inference and narrowing, builtin checks)
//! - A per-document façade answering editor-style queries
//!
//! Every stage keeps going after errors, so a half-typed document still
//! yields tokens, a tree and diagnostics.
//!
//! ```
//! use ucode_core::language_service::DocumentAnalysis;
//! use ucode_core::semantic_analysis::AnalysisOptions;
//!
//! let analysis = DocumentAnalysis::new("let x = 1; print(x, y);", &AnalysisOptions::default());
//! assert_eq!(analysis.diagnostics().len(), 1); // `y` is not defined
//! ```

pub mod ast;
pub mod ast_walker;
pub mod language_service;
pub mod semantic_analysis;
pub mod source_analysis;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{Expression, Identifier, Literal, Program, Statement};
    pub use crate::language_service::DocumentAnalysis;
    pub use crate::semantic_analysis::{AnalysisOptions, AnalysisResult, analyze};
    pub use crate::source_analysis::{Diagnostic, Severity, Span, parse_source, tokenize};
}
