// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error diagnostics using miette.
//!
//! Converts ucode-core diagnostics into miette-formatted reports with:
//! - Source code context
//! - Arrows pointing to the problem location
//! - The fix-it hint, when the analyzer provides one

// Suppress unused_assignments for struct fields used by derive macros
#![allow(unused_assignments)]

use miette::{Diagnostic, SourceSpan};
use ucode_core::source_analysis::{Diagnostic as CoreDiagnostic, Severity};

/// A checker diagnostic with rich formatting.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(ucode::check))]
pub struct CheckDiagnostic {
    pub severity: Severity,
    /// Human-readable message, prefixed with the severity
    pub message: String,
    #[source_code]
    pub src: miette::NamedSource<String>,
    #[label("{label}")]
    pub span: SourceSpan,
    /// Label for the span (interpolated by miette derive macro)
    pub label: String,
    #[help]
    pub hint: Option<String>,
}

impl CheckDiagnostic {
    /// Create a new diagnostic from a ucode-core diagnostic.
    pub fn from_core_diagnostic(
        diagnostic: &CoreDiagnostic,
        source_path: &str,
        source: &str,
    ) -> Self {
        let label = match diagnostic.category {
            Some(category) => format!("{} ({})", diagnostic.severity, category.as_str()),
            None => diagnostic.severity.to_string(),
        };

        Self {
            severity: diagnostic.severity,
            message: format!("{}: {}", diagnostic.severity, diagnostic.message),
            src: miette::NamedSource::new(source_path, source.to_string()),
            span: diagnostic.span.into(),
            label,
            hint: diagnostic.hint.as_ref().map(ToString::to_string),
        }
    }
}
