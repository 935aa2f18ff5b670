// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Numeric builtins.

use super::{Arity, Param, Signature};
use crate::semantic_analysis::types::DataType::{Boolean, Double, Integer, Null, String};

/// `int()` converts strings and numbers alike.
const CONVERTIBLE: Param = Param::of(&[Integer, Double, String, Boolean]);

pub(super) const SIGNATURES: &[Signature] = &[
    Signature::new("int", Arity::Range(1, 2), &[CONVERTIBLE, Param::NUMBER], &[Integer]),
    Signature::new("hex", Arity::Exact(1), &[Param::STRING], &[Integer]),
    Signature::new("sleep", Arity::Exact(1), &[Param::NUMBER], &[Boolean]),
    Signature::new("exit", Arity::Range(0, 1), &[Param::NUMBER], &[Null]),
    Signature::new("min", Arity::AtLeast(0), &[], &[]),
    Signature::new("max", Arity::AtLeast(0), &[], &[]),
];

#[cfg(test)]
mod tests {
    use super::super::test_support::messages;

    #[test]
    fn sleep_takes_milliseconds() {
        assert!(messages("sleep(250);").is_empty());
        assert!(messages("sleep(0.5);").is_empty());
        assert!(messages("sleep(\" 0x10 \");").is_empty());
        assert_eq!(
            messages("sleep([]);"),
            vec!["Argument 1 of sleep() must be number, got array"]
        );
    }

    #[test]
    fn int_with_base() {
        assert!(messages("int(\"ff\", 16);").is_empty());
        assert!(messages("int(3.7);").is_empty());
        assert_eq!(
            messages("int(\"ff\", \"hex\");"),
            vec!["Argument 2 of int() must be number, got string"]
        );
    }

    #[test]
    fn exit_code_is_optional() {
        assert!(messages("exit();").is_empty());
        assert!(messages("exit(1);").is_empty());
        assert_eq!(messages("exit(1, 2);"), vec!["exit() expects 0-1 arguments, got 2"]);
    }
}
