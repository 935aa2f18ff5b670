// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `ucode tokens`, `ucode ast` and `ucode symbols`: dump pipeline stages
//! of a single file.

use crate::commands::check::OutputFormat;
use crate::commands::sources::{read_source, source_mode};
use camino::Utf8Path;
use miette::Result;
use serde::Serialize;
use std::fmt::Write as _;
use ucode_core::language_service::{DocumentAnalysis, LineIndex};
use ucode_core::semantic_analysis::{AnalysisOptions, Symbol, SymbolKind};
use ucode_core::source_analysis::{Token, tokenize_with_mode};

/// Print one token per line: `line:column  start..end  kind`.
pub fn run_tokens(path: &Utf8Path) -> Result<()> {
    let source = read_source(path)?;
    let tokens = tokenize_with_mode(&source, source_mode(path));
    print!("{}", format_tokens(&tokens, &LineIndex::new(&source)));
    Ok(())
}

fn format_tokens(tokens: &[Token], index: &LineIndex) -> String {
    let mut out = String::new();
    for token in tokens {
        let span = token.span();
        let position = index.position(span.start()).unwrap_or_default();
        let _ = writeln!(
            out,
            "{}:{}\t{}..{}\t{:?}",
            position.line + 1,
            position.column + 1,
            span.start(),
            span.end(),
            token.kind()
        );
    }
    out
}

/// Pretty-print the syntax tree, followed by any syntax errors.
pub fn run_ast(path: &Utf8Path) -> Result<()> {
    let source = read_source(path)?;
    let analysis = DocumentAnalysis::with_mode(&source, source_mode(path), &AnalysisOptions::default());
    match analysis.program() {
        Some(program) => println!("{program:#?}"),
        None => miette::bail!("'{path}' is nested too deeply to parse"),
    }
    Ok(())
}

/// A symbol as emitted with `--format json`.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct SymbolRow {
    name: String,
    kind: &'static str,
    #[serde(rename = "type")]
    data_type: String,
    line: u32,
    column: u32,
    used: bool,
    exported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    imported_from: Option<String>,
}

/// List the declarations of a file (builtins excluded).
pub fn run_symbols(path: &Utf8Path, format: OutputFormat, options: &AnalysisOptions) -> Result<()> {
    let source = read_source(path)?;
    let analysis = DocumentAnalysis::with_mode(&source, source_mode(path), options);
    let rows = symbol_rows(&analysis);
    match format {
        OutputFormat::Text => {
            for row in &rows {
                println!(
                    "{}:{}\t{}\t{}\t{}",
                    row.line, row.column, row.kind, row.name, row.data_type
                );
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows)
                .map_err(|e| miette::miette!("Failed to encode symbols: {e}"))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn symbol_rows(analysis: &DocumentAnalysis) -> Vec<SymbolRow> {
    let mut symbols: Vec<&Symbol> = analysis
        .symbol_table()
        .all_symbols()
        .into_iter()
        .filter(|symbol| symbol.kind != SymbolKind::Builtin)
        .collect();
    symbols.sort_by_key(|symbol| symbol.declared_at);

    symbols
        .into_iter()
        .map(|symbol| {
            let position = analysis
                .line_index()
                .position(symbol.declared_at.start())
                .unwrap_or_default();
            SymbolRow {
                name: symbol.name.to_string(),
                kind: symbol.kind.as_str(),
                data_type: symbol.data_type.to_string(),
                line: position.line + 1,
                column: position.column + 1,
                used: symbol.used,
                exported: symbol.exported,
                imported_from: symbol.imported_from.as_ref().map(ToString::to_string),
            }
        })
        .collect()
}
