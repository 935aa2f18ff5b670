// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `ucode check`: report diagnostics for ucode scripts.
//!
//! Each file is tokenized, parsed and analysed; `// ucode-lsp disable`
//! suppressions are applied and the remaining diagnostics are printed. The
//! command fails if any error is left.

use crate::commands::sources::{find_source_files, read_source, source_mode};
use crate::diagnostic::CheckDiagnostic;
use crate::suppression::apply_suppressions;
use camino::{Utf8Path, Utf8PathBuf};
use miette::Result;
use serde::Serialize;
use ucode_core::language_service::{DocumentAnalysis, LineIndex};
use ucode_core::semantic_analysis::AnalysisOptions;
use ucode_core::source_analysis::{Diagnostic, Severity, SourceMode};

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output via miette (default).
    #[default]
    Text,
    /// Machine-readable JSON (one object per line).
    Json,
}

/// Diagnostics of one checked document after suppression.
#[derive(Debug)]
pub struct FileReport {
    pub diagnostics: Vec<Diagnostic>,
    line_index: LineIndex,
}

impl FileReport {
    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }
}

/// A diagnostic as emitted with `--format json`.
#[derive(Debug, Serialize)]
struct JsonDiagnostic<'a> {
    file: &'a str,
    severity: &'static str,
    category: Option<&'static str>,
    message: &'a str,
    line: u32,
    column: u32,
    span_start: u32,
    span_end: u32,
    hint: Option<&'a str>,
}

/// Analyse one document.
#[must_use]
pub fn check_source(source: &str, mode: SourceMode, options: &AnalysisOptions) -> FileReport {
    let analysis = DocumentAnalysis::with_mode(source, mode, options);
    let mut diagnostics = analysis.diagnostics().to_vec();
    let downgraded = apply_suppressions(source, &mut diagnostics);
    if downgraded > 0 {
        tracing::debug!(downgraded, "applied suppressions");
    }
    FileReport {
        diagnostics,
        line_index: analysis.line_index().clone(),
    }
}

/// Check the given files and directories.
///
/// Prints each diagnostic and returns an error if any errors remain.
pub fn run_check(paths: &[Utf8PathBuf], format: OutputFormat, options: &AnalysisOptions) -> Result<()> {
    let source_files = find_source_files(paths)?;
    if source_files.is_empty() {
        miette::bail!("No .uc source files found");
    }

    let mut errors = 0usize;
    let mut warnings = 0usize;

    for file in &source_files {
        let source = read_source(file)?;
        let report = check_source(&source, source_mode(file), options);
        tracing::debug!(
            file = %file,
            diagnostics = report.diagnostics.len(),
            "checked file"
        );

        match format {
            OutputFormat::Text => print_text(file, &source, &report),
            OutputFormat::Json => print_json(file, &report)?,
        }

        errors += report.count(Severity::Error);
        warnings += report.count(Severity::Warning);
    }

    let files_checked = source_files.len();
    if format == OutputFormat::Text {
        eprintln!("Checked {files_checked} file(s): {errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        let plural = if errors == 1 { "" } else { "s" };
        miette::bail!("{errors} error{plural} found in {files_checked} file(s)");
    }

    Ok(())
}

fn print_text(file: &Utf8Path, source: &str, report: &FileReport) {
    for diagnostic in &report.diagnostics {
        let rendered = CheckDiagnostic::from_core_diagnostic(diagnostic, file.as_str(), source);
        eprintln!("{:?}", miette::Report::new(rendered));
    }
}

fn print_json(file: &Utf8Path, report: &FileReport) -> Result<()> {
    for line in json_lines(file, report)? {
        println!("{line}");
    }
    Ok(())
}

fn json_lines(file: &Utf8Path, report: &FileReport) -> Result<Vec<String>> {
    report
        .diagnostics
        .iter()
        .map(|diagnostic| {
            let position = report
                .line_index
                .position(diagnostic.span.start())
                .unwrap_or_default();
            let json = JsonDiagnostic {
                file: file.as_str(),
                severity: diagnostic.severity.as_str(),
                category: diagnostic.category.map(|category| category.as_str()),
                message: diagnostic.message.as_str(),
                line: position.line + 1,
                column: position.column + 1,
                span_start: diagnostic.span.start(),
                span_end: diagnostic.span.end(),
                hint: diagnostic.hint.as_deref(),
            };
            serde_json::to_string(&json).map_err(|e| miette::miette!("Failed to encode diagnostic: {e}"))
        })
        .collect()
}
