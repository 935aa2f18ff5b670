// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Semantic analysis for ucode.
//!
//! This module performs semantic analysis on the AST, including:
//! - Scope resolution and symbol declaration (via `symbol_table`)
//! - Type inference over unions of runtime types (via `types`)
//! - Flow-sensitive narrowing from type guards (via `narrowing`)
//! - Argument checks for calls to builtin functions (via `builtins`)
//!
//! The analysis produces diagnostics plus the symbol table and inferred
//! types used by editor queries.

use std::sync::LazyLock;

use ecow::EcoString;

use crate::ast::Program;
use crate::source_analysis::Diagnostic;

mod analyzer;
pub mod builtins;
pub mod narrowing;
pub mod symbol_table;
pub mod types;

#[cfg(test)]
mod property_tests;

pub use analyzer::TypeMap;
pub use builtins::{BuiltinRegistry, BuiltinValidator, CallSite, TypeOracle};
pub use symbol_table::{ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind, SymbolTable};
pub use types::{DataType, ValueType};

/// Which checks the analyzer reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Operator, call and builtin argument checks.
    pub type_checking: bool,
    pub unused_variables: bool,
    pub shadowing: bool,
    pub undefined_identifiers: bool,
    /// Names treated as predeclared globals of unknown type.
    pub extra_globals: Vec<EcoString>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            type_checking: true,
            unused_variables: true,
            shadowing: true,
            undefined_identifiers: true,
            extra_globals: Vec::new(),
        }
    }
}

/// Result of semantic analysis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Every scope and symbol seen during the walk.
    pub symbol_table: SymbolTable,

    /// Diagnostics (errors and warnings) from analysis.
    pub diagnostics: Vec<Diagnostic>,

    /// Inferred types indexed by expression span.
    pub type_map: TypeMap,
}

impl AnalysisResult {
    /// Create a new empty analysis result.
    #[must_use]
    pub fn new() -> Self {
        Self {
            symbol_table: SymbolTable::default(),
            diagnostics: Vec::new(),
            type_map: TypeMap::new(),
        }
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::new()
    }
}

static BUILTINS: LazyLock<BuiltinRegistry> = LazyLock::new(BuiltinRegistry::new);

/// Analyse a program against the standard ucode builtins.
///
/// # Examples
///
/// ```
/// use ucode_core::semantic_analysis::{AnalysisOptions, analyze};
/// use ucode_core::source_analysis::parse_source;
///
/// let program = parse_source("let n = length(42);").program.unwrap();
/// let result = analyze(&program, &AnalysisOptions::default());
/// assert_eq!(
///     result.diagnostics[0].message,
///     "Argument 1 of length() must be string, array or object, got integer"
/// );
/// ```
#[must_use]
pub fn analyze(program: &Program, options: &AnalysisOptions) -> AnalysisResult {
    analyze_with_registry(program, options, &BUILTINS)
}

/// Analyse a program against a caller-supplied set of builtins.
#[must_use]
pub fn analyze_with_registry(
    program: &Program,
    options: &AnalysisOptions,
    registry: &BuiltinRegistry,
) -> AnalysisResult {
    let result = analyzer::Analyzer::new(program.span, options, registry).analyze_program(program);
    tracing::debug!(
        statements = program.body.len(),
        symbols = result.symbol_table.all_symbols().len(),
        diagnostics = result.diagnostics.len(),
        "semantic analysis complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_result_default() {
        let result = AnalysisResult::default();
        assert!(result.diagnostics.is_empty());
        assert!(result.type_map.is_empty());
        assert_eq!(result.symbol_table.scopes().len(), 1);
    }

    #[test]
    fn options_enable_everything_by_default() {
        let options = AnalysisOptions::default();
        assert!(options.type_checking);
        assert!(options.unused_variables);
        assert!(options.shadowing);
        assert!(options.undefined_identifiers);
        assert!(options.extra_globals.is_empty());
    }
}
