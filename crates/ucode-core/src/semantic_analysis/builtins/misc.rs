// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Builtins for modules, types, diagnostics and output.

use super::{Arity, Param, Signature};
use crate::semantic_analysis::types::DataType::{
    Array, Boolean, Function, Integer, Null, Object, String,
};

const TEMPLATE: Param = Param::of(&[String, Function]);
const JSON_SOURCE: Param = Param::of(&[String, Object, Array]);
const OBJECT_OR_ARRAY: Param = Param::of(&[Object, Array]);

pub(super) const SIGNATURES: &[Signature] = &[
    Signature::new("type", Arity::Exact(1), &[], &[String, Null]),
    Signature::new("die", Arity::Range(0, 1), &[], &[Null]),
    Signature::new("require", Arity::Exact(1), &[Param::STRING], &[]),
    Signature::new("include", Arity::Range(1, 2), &[Param::STRING, Param::OBJECT], &[]),
    Signature::new("render", Arity::AtLeast(1), &[TEMPLATE], &[String]),
    Signature::new("loadstring", Arity::Range(1, 2), &[Param::STRING, Param::OBJECT], &[Function]),
    Signature::new("loadfile", Arity::Range(1, 2), &[Param::STRING, Param::OBJECT], &[Function]),
    Signature::new("call", Arity::AtLeast(1), &[Param::FUNCTION, Param::ANY, Param::OBJECT], &[]),
    Signature::new("proto", Arity::Range(1, 2), &[OBJECT_OR_ARRAY, Param::OBJECT], &[Object, Null]),
    Signature::new("getenv", Arity::Range(0, 1), &[Param::STRING], &[String, Object, Null]),
    Signature::new(
        "wildcard",
        Arity::Range(2, 3),
        &[Param::STRING, Param::STRING, Param::ANY],
        &[Boolean],
    ),
    Signature::new("iptoarr", Arity::Exact(1), &[Param::STRING], &[Array, Null]),
    Signature::new("arrtoip", Arity::Exact(1), &[Param::ARRAY], &[String, Null]),
    Signature::new("json", Arity::Exact(1), &[JSON_SOURCE], &[]),
    Signature::new("trace", Arity::Exact(1), &[Param::NUMBER], &[Integer]),
    Signature::new("warn", Arity::AtLeast(0), &[], &[Integer]),
    Signature::new("assert", Arity::Range(1, 2), &[], &[]),
    Signature::new("gc", Arity::Range(0, 2), &[Param::STRING, Param::NUMBER], &[]),
    Signature::new("sourcepath", Arity::Range(0, 2), &[Param::NUMBER], &[String, Null]),
    Signature::new("print", Arity::AtLeast(0), &[], &[Integer]),
];

#[cfg(test)]
mod tests {
    use super::super::test_support::messages;

    #[test]
    fn require_module_name() {
        assert!(messages("require(\"fs\");").is_empty());
        assert_eq!(
            messages("require(fs, 1);"),
            vec!["require() expects 1 argument, got 2"]
        );
    }

    #[test]
    fn render_takes_template_or_function() {
        assert!(messages("render(\"page.ut\", { title: 1 });").is_empty());
        assert!(messages("render(() => print(1));").is_empty());
        assert_eq!(
            messages("render(1);"),
            vec!["Argument 1 of render() must be string or function, got integer"]
        );
    }

    #[test]
    fn print_and_die_accept_anything() {
        assert!(messages("print();").is_empty());
        assert!(messages("print(1, \"a\", [], {});").is_empty());
        assert!(messages("die({ code: 1 });").is_empty());
    }

    #[test]
    fn type_needs_exactly_one_value() {
        assert_eq!(messages("type();"), vec!["type() expects 1 argument, got 0"]);
    }
}
