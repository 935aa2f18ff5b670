// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for ucode semantic analysis.
//!
//! These tests verify that the analyzer never panics on whatever the parser
//! produces, and that its diagnostics point into the input:
//!
//! 1. **`analyze` never panics**, on random text and on near-valid ucode
//! 2. **Semantic diagnostic spans within input**
//! 3. **Disabled checks stay silent**: with every option off, only
//!    redeclaration and constant errors remain

use proptest::prelude::*;

use crate::source_analysis::{DiagnosticCategory, parse_source};

use super::{AnalysisOptions, analyze};

// ============================================================================
// Generators
// ============================================================================

const FRAGMENTS: &[&str] = &[
    "let x = 1;",
    "const k = \"s\";",
    "x = x + 1;",
    "function f(a, ...rest) { return a ?? rest; }",
    "let g = (a, b) => a * b;",
    "if (type(x) == \"string\") { print(x); } else { print(length(x)); }",
    "if (x == null) return;",
    "while (x != null) { x = null; }",
    "for (let k, v in { a: 1 }) print(k, v);",
    "for (let i = 0; i < 3; i++) { continue; }",
    "switch (x) { case 1: break; default: die(\"no\"); }",
    "try { f(); } catch (e) { warn(e); }",
    "signal(\"HUP\", \"ignore\");",
    "system([\"ls\", 1], 1000);",
    "import { a as b } from \"m\";",
    "export default x;",
    "x.y[0]?.z(1, ...[2]);",
    "let s = `a${x}b`;",
    "let r = /a+/g;",
];

fn valid_fragment() -> impl Strategy<Value = String> {
    prop::sample::select(FRAGMENTS).prop_map(std::string::ToString::to_string)
}

/// Fragments, truncated fragments and concatenations.
fn near_valid_ucode() -> impl Strategy<Value = String> {
    prop_oneof![
        valid_fragment(),
        valid_fragment().prop_flat_map(|s| {
            let len = s.len();
            (0..len).prop_map(move |cut| s[..cut].to_string())
        }),
        prop::collection::vec(valid_fragment(), 1..6).prop_map(|parts| parts.join("\n")),
        (valid_fragment(), valid_fragment())
            .prop_map(|(a, b)| format!("function w() {{ {a} {{ {b} }} }}")),
    ]
}

// ============================================================================
// Property tests
// ============================================================================

fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: `analyze` never panics on arbitrary string input.
    #[test]
    fn analyze_never_panics(input in "\\PC{0,500}") {
        if let Some(program) = parse_source(&input).program {
            let _result = analyze(&program, &AnalysisOptions::default());
        }
    }

    /// Property 1b: `analyze` never panics on near-valid structured input.
    #[test]
    fn analyze_never_panics_near_valid(input in near_valid_ucode()) {
        if let Some(program) = parse_source(&input).program {
            let _result = analyze(&program, &AnalysisOptions::default());
        }
    }

    /// Property 2: Semantic diagnostic spans are within input bounds.
    #[test]
    fn semantic_diagnostic_spans_within_input(input in near_valid_ucode()) {
        let Some(program) = parse_source(&input).program else {
            return Ok(());
        };
        let result = analyze(&program, &AnalysisOptions::default());
        let input_len = u32::try_from(input.len()).unwrap_or(u32::MAX);
        for diag in &result.diagnostics {
            prop_assert!(
                diag.span.end() <= input_len,
                "Semantic diagnostic span end {} exceeds input length {} for input {:?}: {}",
                diag.span.end(),
                input_len,
                input,
                diag.message,
            );
            prop_assert!(diag.span.start() <= diag.span.end());
        }
    }

    /// Property 3: With every optional check off only hard errors remain.
    #[test]
    fn disabled_checks_stay_silent(input in near_valid_ucode()) {
        let Some(program) = parse_source(&input).program else {
            return Ok(());
        };
        let options = AnalysisOptions {
            type_checking: false,
            unused_variables: false,
            shadowing: false,
            undefined_identifiers: false,
            extra_globals: Vec::new(),
        };
        for diag in analyze(&program, &options).diagnostics {
            prop_assert!(
                matches!(
                    diag.category,
                    Some(DiagnosticCategory::Redeclaration | DiagnosticCategory::Constant)
                ),
                "unexpected diagnostic {:?} for input {:?}",
                diag,
                input,
            );
        }
    }
}
