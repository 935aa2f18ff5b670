// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Per-document analysis for editor integration.
//!
//! [`DocumentAnalysis`] runs the whole pipeline (tokenize, parse, analyze)
//! once and then answers position-based queries against the result:
//!
//! - **Diagnostics** - lexical, syntax and semantic problems, in source order
//! - **Symbol at cursor** - the declaration an identifier resolves to
//! - **Go to definition** - the span of that declaration
//! - **Completions** - every name visible at a cursor
//! - **Types** - the inferred type of any expression
//!
//! Editors speak in lines and columns; [`LineIndex`] converts between those
//! and the byte offsets used everywhere else.
//!
//! ```
//! use ucode_core::language_service::{DocumentAnalysis, Position};
//! use ucode_core::semantic_analysis::AnalysisOptions;
//!
//! let source = "let greeting = \"hi\";\nprint(greeting);";
//! let analysis = DocumentAnalysis::new(source, &AnalysisOptions::default());
//!
//! let offset = analysis.line_index().offset(Position::new(1, 8)).unwrap();
//! assert_eq!(analysis.definition_at(offset).map(|span| span.start()), Some(4));
//! ```

use crate::ast::{Expression, Identifier, MemberProperty, Program};
use crate::ast_walker::{Node, path_at};
use crate::semantic_analysis::{
    AnalysisOptions, AnalysisResult, Symbol, SymbolKind, SymbolTable, ValueType, analyze,
};
use crate::source_analysis::{Diagnostic, SourceMode, Span, Token, parse, tokenize_with_mode};

// ============================================================================
// Positions
// ============================================================================

/// A position in a source file.
///
/// The `column` field is a **byte offset within the line**, not a character
/// count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Line number (0-indexed).
    pub line: u32,
    /// Column offset in bytes from the start of the line (0-indexed).
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Line start offsets of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .match_indices('\n')
                .map(|(index, _)| u32::try_from(index + 1).unwrap_or(u32::MAX)),
        );
        Self {
            line_starts,
            len: u32::try_from(source.len()).unwrap_or(u32::MAX),
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a position. Returns `None` past the end of
    /// the document.
    #[must_use]
    pub fn position(&self, offset: u32) -> Option<Position> {
        if offset > self.len {
            return None;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Some(Position::new(
            u32::try_from(line).ok()?,
            offset - self.line_starts[line],
        ))
    }

    /// Converts a position back to a byte offset. Returns `None` if the line
    /// does not exist or the column runs past its end.
    #[must_use]
    pub fn offset(&self, position: Position) -> Option<u32> {
        let line = usize::try_from(position.line).ok()?;
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.len, |next| next - 1);
        let offset = start.checked_add(position.column)?;
        (offset <= end).then_some(offset)
    }
}

// ============================================================================
// Document Analysis
// ============================================================================

/// Everything known about one document.
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    tokens: Vec<Token>,
    program: Option<Program>,
    diagnostics: Vec<Diagnostic>,
    analysis: AnalysisResult,
    line_index: LineIndex,
}

impl DocumentAnalysis {
    /// Analyses a plain ucode script.
    #[must_use]
    pub fn new(source: &str, options: &AnalysisOptions) -> Self {
        Self::with_mode(source, SourceMode::Raw, options)
    }

    /// Analyses a document in the given lexer mode (script or template).
    #[must_use]
    pub fn with_mode(source: &str, mode: SourceMode, options: &AnalysisOptions) -> Self {
        let tokens = tokenize_with_mode(source, mode);
        let output = parse(tokens.clone());
        let analysis = output
            .program
            .as_ref()
            .map(|program| analyze(program, options))
            .unwrap_or_default();

        let mut diagnostics = output.diagnostics;
        diagnostics.extend(analysis.diagnostics.iter().cloned());
        diagnostics.sort_by_key(|diagnostic| diagnostic.span.start());

        Self {
            tokens,
            program: output.program,
            diagnostics,
            analysis,
            line_index: LineIndex::new(source),
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The syntax tree, unless nesting was too deep to parse.
    #[must_use]
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Lexical, syntax and semantic diagnostics ordered by start offset.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.analysis.symbol_table
    }

    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// The token under `offset`, or the one ending exactly there.
    #[must_use]
    pub fn token_at(&self, offset: u32) -> Option<&Token> {
        let tokens = || self.tokens.iter().filter(|token| !token.kind().is_eof());
        tokens()
            .find(|token| token.span().contains_offset(offset))
            .or_else(|| tokens().find(|token| token.span().touches_offset(offset)))
    }

    /// The declaration the identifier under `offset` resolves to.
    ///
    /// Property names (`obj.name`) are not variables and resolve to nothing.
    #[must_use]
    pub fn symbol_at(&self, offset: u32) -> Option<&Symbol> {
        let identifier = self.identifier_at(offset)?;
        self.analysis
            .symbol_table
            .lookup_at(&identifier.name, identifier.span.start())
    }

    /// Where the name under `offset` is declared. Builtins have no
    /// declaration site.
    #[must_use]
    pub fn definition_at(&self, offset: u32) -> Option<Span> {
        self.symbol_at(offset)
            .filter(|symbol| symbol.kind != SymbolKind::Builtin)
            .map(|symbol| symbol.declared_at)
    }

    /// Names visible at `offset`, innermost scope first.
    #[must_use]
    pub fn completion_symbols(&self, offset: u32) -> Vec<&Symbol> {
        self.analysis.symbol_table.visible_symbols_at(offset)
    }

    /// The inferred type of the expression spanning exactly `span`.
    #[must_use]
    pub fn type_at(&self, span: Span) -> Option<&ValueType> {
        self.analysis.type_map.get(span)
    }

    fn identifier_at(&self, offset: u32) -> Option<&Identifier> {
        let path = path_at(self.program.as_ref()?, offset);
        let (node, ancestors) = path.split_last()?;
        let identifier = node.as_identifier()?;
        if let Some(Node::Expression(Expression::Member {
            property: MemberProperty::Named(property),
            ..
        })) = ancestors.last()
        {
            if property.span == identifier.span {
                return None;
            }
        }
        Some(identifier)
    }
}
