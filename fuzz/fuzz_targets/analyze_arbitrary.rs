// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the full document pipeline.
//!
//! Runs tokenize, parse and semantic analysis plus the cursor queries on
//! arbitrary input. Success = no panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ucode_core::language_service::DocumentAnalysis;
use ucode_core::semantic_analysis::AnalysisOptions;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let analysis = DocumentAnalysis::new(source, &AnalysisOptions::default());

    let len = u32::try_from(source.len()).unwrap_or(u32::MAX);
    for offset in (0..=len).step_by(7) {
        let _ = analysis.definition_at(offset);
        let _ = analysis.completion_symbols(offset);
        let _ = analysis.token_at(offset);
    }
});
