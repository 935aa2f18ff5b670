// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for lexer and parser crash safety testing.
//!
//! This target feeds arbitrary byte sequences to the lexer and parser in
//! both source modes and asserts that neither panics.
//!
//! # Success Criteria
//!
//! - No panic on any UTF-8 input
//! - Exactly one trailing `Eof` token
//! - Every diagnostic span lies within the input

#![no_main]

use libfuzzer_sys::fuzz_target;
use ucode_core::source_analysis::{SourceMode, parse, tokenize_with_mode};

fuzz_target!(|data: &[u8]| {
    // Invalid UTF-8 never reaches the lexer
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let len = u32::try_from(source.len()).unwrap_or(u32::MAX);

    for mode in [SourceMode::Raw, SourceMode::Template] {
        let tokens = tokenize_with_mode(source, mode);
        assert_eq!(tokens.iter().filter(|t| t.kind().is_eof()).count(), 1);

        let output = parse(tokens);
        for diagnostic in &output.diagnostics {
            assert!(diagnostic.span.end() <= len);
        }
    }
});
