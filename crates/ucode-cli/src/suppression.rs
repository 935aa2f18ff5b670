// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `// ucode-lsp disable` line comments.
//!
//! A line ending in the marker comment downgrades every diagnostic that
//! starts on it by one severity level (error to warning, warning to info).

use std::collections::HashSet;

use ucode_core::language_service::LineIndex;
use ucode_core::source_analysis::Diagnostic;

pub const DISABLE_MARKER: &str = "// ucode-lsp disable";

/// Zero-based numbers of lines carrying the marker.
fn suppressed_lines(source: &str) -> HashSet<u32> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| line.trim_end().ends_with(DISABLE_MARKER))
        .filter_map(|(number, _)| u32::try_from(number).ok())
        .collect()
}

/// Downgrades diagnostics on suppressed lines. Returns how many changed.
pub fn apply_suppressions(source: &str, diagnostics: &mut [Diagnostic]) -> usize {
    let lines = suppressed_lines(source);
    if lines.is_empty() {
        return 0;
    }
    let index = LineIndex::new(source);
    let mut downgraded = 0;
    for diagnostic in diagnostics {
        let on_suppressed_line = index
            .position(diagnostic.span.start())
            .is_some_and(|position| lines.contains(&position.line));
        if on_suppressed_line {
            diagnostic.severity = diagnostic.severity.downgrade();
            downgraded += 1;
        }
    }
    downgraded
}
