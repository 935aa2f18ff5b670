// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `signal(signal, handler?)`
//!
//! A literal signal must be a number in 1-31 or one of the known names,
//! optionally `SIG`-prefixed and in any case. The handler is a function or
//! one of the strings `"ignore"` and `"default"`.

use super::{Arity, BuiltinValidator, CallSite, Param, TypeOracle, check_argument};
use crate::ast::{Expression, Literal, UnaryOperator};
use crate::semantic_analysis::types::{DataType, ValueType, union_of};
use crate::source_analysis::{Diagnostic, DiagnosticCategory};

/// Signal names with their Linux numbers.
pub const SIGNALS: &[(&str, u8)] = &[
    ("HUP", 1),
    ("INT", 2),
    ("QUIT", 3),
    ("ILL", 4),
    ("TRAP", 5),
    ("ABRT", 6),
    ("BUS", 7),
    ("FPE", 8),
    ("KILL", 9),
    ("USR1", 10),
    ("SEGV", 11),
    ("USR2", 12),
    ("PIPE", 13),
    ("ALRM", 14),
    ("TERM", 15),
    ("CHLD", 17),
    ("CONT", 18),
    ("STOP", 19),
    ("TSTP", 20),
    ("TTIN", 21),
    ("TTOU", 22),
    ("URG", 23),
    ("XCPU", 24),
    ("XFSZ", 25),
    ("VTALRM", 26),
    ("PROF", 27),
    ("WINCH", 28),
    ("IO", 29),
    ("PWR", 30),
    ("SYS", 31),
];

const MAX_SIGNAL: i64 = 31;

/// Resolves a signal name such as `"sigterm"` or `"TERM"` to its number.
#[must_use]
pub fn signal_number(name: &str) -> Option<u8> {
    let upper = name.to_ascii_uppercase();
    let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
    SIGNALS
        .iter()
        .find(|(known, _)| *known == bare)
        .map(|(_, number)| *number)
}

fn signal_name(number: i64) -> Option<&'static str> {
    SIGNALS
        .iter()
        .find(|(_, known)| i64::from(*known) == number)
        .map(|(name, _)| *name)
}

/// The value of an integer literal, including a negated one (`-1`).
fn integer_literal(expression: &Expression) -> Option<i64> {
    match expression {
        Expression::Literal(Literal::Integer(number), _) => Some(*number),
        Expression::Unary {
            operator: UnaryOperator::Minus,
            argument,
            ..
        } => match argument.as_ref() {
            Expression::Literal(Literal::Integer(number), _) => number.checked_neg(),
            _ => None,
        },
        _ => None,
    }
}

const SIGNAL: Param = Param::of(&[DataType::Integer, DataType::String]);
const HANDLER: Param = Param::of(&[DataType::Function, DataType::String]);

pub(super) struct SignalValidator;

impl SignalValidator {
    /// Checks a literal signal; returns its canonical name when known.
    fn check_signal(
        argument: &Expression,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (bool, Option<&'static str>) {
        if let Some(number) = integer_literal(argument) {
            if (1..=MAX_SIGNAL).contains(&number) {
                return (true, signal_name(number));
            }
            diagnostics.push(
                Diagnostic::error(
                    format!("Signal number {number} is out of range (1-{MAX_SIGNAL})"),
                    argument.span(),
                )
                .with_category(DiagnosticCategory::Builtin),
            );
            return (false, None);
        }
        match argument {
            Expression::Literal(Literal::String(name), span) => match signal_number(name) {
                Some(number) => (true, signal_name(i64::from(number))),
                None => {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid signal name '{name}'"), *span)
                            .with_category(DiagnosticCategory::Builtin)
                            .with_hint("Use a name such as \"SIGTERM\" or \"HUP\""),
                    );
                    (false, None)
                }
            },
            _ => (true, None),
        }
    }

    fn check_handler(handler: &Expression, diagnostics: &mut Vec<Diagnostic>) -> bool {
        match handler.as_string_literal() {
            Some("ignore" | "default") | None => true,
            Some(other) => {
                diagnostics.push(
                    Diagnostic::error(
                        format!(
                            "Invalid signal handler '{other}': expected a function, \"ignore\" or \"default\""
                        ),
                        handler.span(),
                    )
                    .with_category(DiagnosticCategory::Builtin),
                );
                false
            }
        }
    }
}

impl BuiltinValidator for SignalValidator {
    fn validate(
        &self,
        call: &CallSite<'_>,
        oracle: &dyn TypeOracle,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        let mut valid = Arity::Range(1, 2).check(call, diagnostics);
        valid &= check_argument(call, 0, SIGNAL, oracle, diagnostics);
        valid &= check_argument(call, 1, HANDLER, oracle, diagnostics);

        let name = match call.argument(0) {
            Some(signal) => {
                let (ok, name) = Self::check_signal(signal, diagnostics);
                valid &= ok;
                name
            }
            None => None,
        };

        if let Some(handler) = call.argument(1) {
            valid &= Self::check_handler(handler, diagnostics);
            if let Some(uncatchable @ ("KILL" | "STOP")) = name {
                diagnostics.push(
                    Diagnostic::warning(
                        format!("Signal '{uncatchable}' cannot be caught or ignored"),
                        call.span,
                    )
                    .with_category(DiagnosticCategory::Builtin),
                );
            }
        }
        valid
    }

    fn return_type(&self) -> ValueType {
        union_of(&[
            DataType::Function.into(),
            DataType::String.into(),
            DataType::Null.into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{messages, validate};
    use super::*;
    use crate::source_analysis::Severity;

    #[test]
    fn thirty_signal_names() {
        assert_eq!(SIGNALS.len(), 30);
        assert_eq!(signal_number("SIGTERM"), Some(15));
        assert_eq!(signal_number("sigchld"), Some(17));
        assert_eq!(signal_number("Winch"), Some(28));
        assert_eq!(signal_number("STKFLT"), None);
        assert_eq!(signal_number("SIG"), None);
    }

    #[test]
    fn valid_signals() {
        assert!(messages("signal(\"SIGTERM\", handler);").is_empty());
        assert!(messages("signal(15, handler);").is_empty());
        assert!(messages("signal(\"int\", function() { exit(0); });").is_empty());
        assert!(messages("signal(\"HUP\", \"ignore\");").is_empty());
        assert!(messages("signal(\"USR1\");").is_empty());
    }

    #[test]
    fn invalid_signal_name() {
        let (valid, diagnostics) = validate("signal(\"BOGUS\");");
        assert!(!valid);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Invalid signal name 'BOGUS'");
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn signal_number_out_of_range() {
        assert_eq!(
            messages("signal(0, handler);"),
            vec!["Signal number 0 is out of range (1-31)"]
        );
        assert_eq!(
            messages("signal(64);"),
            vec!["Signal number 64 is out of range (1-31)"]
        );
    }

    #[test]
    fn negative_signal_number() {
        let (valid, diagnostics) = validate("signal(-1, handler);");
        assert!(!valid);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Signal number -1 is out of range (1-31)");
        assert_eq!(diagnostics[0].span, crate::source_analysis::Span::new(7, 9));
    }

    #[test]
    fn uncatchable_signals_warn() {
        let (valid, diagnostics) = validate("signal(\"KILL\", handler);");
        assert!(valid);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].message, "Signal 'KILL' cannot be caught or ignored");

        assert_eq!(
            messages("signal(19, \"ignore\");"),
            vec!["Signal 'STOP' cannot be caught or ignored"]
        );
        assert!(messages("signal(\"KILL\");").is_empty());
    }

    #[test]
    fn handler_strings() {
        assert_eq!(
            messages("signal(\"TERM\", \"restart\");"),
            vec!["Invalid signal handler 'restart': expected a function, \"ignore\" or \"default\""]
        );
        assert_eq!(
            messages("signal(\"TERM\", 5);"),
            vec!["Argument 2 of signal() must be function or string, got integer"]
        );
    }

    #[test]
    fn signal_arity() {
        assert_eq!(messages("signal();"), vec!["signal() expects 1-2 arguments, got 0"]);
    }
}
