// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! String builtins.

use super::{Arity, Param, Signature};
use crate::semantic_analysis::types::DataType::{Array, Function, Integer, Null, Object, Regex, String};

const COLLECTION: Param = Param::of(&[String, Array, Object]);
const SEARCHABLE: Param = Param::of(&[String, Array]);
const REPLACEMENT: Param = Param::of(&[String, Function]);

pub(super) const SIGNATURES: &[Signature] = &[
    Signature::new("length", Arity::Exact(1), &[COLLECTION], &[Integer, Null]),
    Signature::new("index", Arity::Exact(2), &[SEARCHABLE], &[Integer, Null]),
    Signature::new("rindex", Arity::Exact(2), &[SEARCHABLE], &[Integer, Null]),
    Signature::new(
        "substr",
        Arity::Range(2, 3),
        &[Param::STRING, Param::NUMBER, Param::NUMBER],
        &[String],
    ),
    Signature::new(
        "split",
        Arity::Range(2, 3),
        &[Param::STRING, Param::PATTERN, Param::NUMBER],
        &[Array],
    ),
    Signature::new("join", Arity::Exact(2), &[Param::STRING, Param::ARRAY], &[String]),
    Signature::new(
        "replace",
        Arity::Range(3, 4),
        &[Param::STRING, Param::PATTERN, REPLACEMENT, Param::NUMBER],
        &[String],
    ),
    Signature::new("match", Arity::Exact(2), &[Param::STRING, Param::PATTERN], &[Array, Null]),
    Signature::new("lc", Arity::Exact(1), &[Param::STRING], &[String]),
    Signature::new("uc", Arity::Exact(1), &[Param::STRING], &[String]),
    Signature::new("ltrim", Arity::Range(1, 2), &[Param::STRING, Param::STRING], &[String]),
    Signature::new("rtrim", Arity::Range(1, 2), &[Param::STRING, Param::STRING], &[String]),
    Signature::new("trim", Arity::Range(1, 2), &[Param::STRING, Param::STRING], &[String]),
    Signature::new("ord", Arity::Range(1, 2), &[Param::STRING, Param::NUMBER], &[Integer, Null]),
    Signature::new("chr", Arity::AtLeast(0), &[], &[String]),
    Signature::new("uchr", Arity::AtLeast(0), &[], &[String]),
    Signature::new("sprintf", Arity::AtLeast(1), &[Param::STRING], &[String]),
    Signature::new("printf", Arity::AtLeast(1), &[Param::STRING], &[Integer]),
    Signature::new("hexenc", Arity::Exact(1), &[Param::STRING], &[String]),
    Signature::new("hexdec", Arity::Range(1, 2), &[Param::STRING, Param::STRING], &[String, Null]),
    Signature::new("b64enc", Arity::Exact(1), &[Param::STRING], &[String, Null]),
    Signature::new("b64dec", Arity::Exact(1), &[Param::STRING], &[String, Null]),
    Signature::new("regexp", Arity::Range(1, 2), &[Param::STRING, Param::STRING], &[Regex]),
];

#[cfg(test)]
mod tests {
    use super::super::test_support::messages;

    #[test]
    fn replace_accepts_function_replacement() {
        assert!(messages("replace(\"abc\", /b/, function(m) { return uc(m); });").is_empty());
        assert_eq!(
            messages("replace(\"abc\", \"b\", 1);"),
            vec!["Argument 3 of replace() must be string or function, got integer"]
        );
    }

    #[test]
    fn join_takes_separator_first() {
        assert!(messages("join(\",\", [1, 2]);").is_empty());
        assert_eq!(
            messages("join([1, 2], \",\");"),
            vec![
                "Argument 1 of join() must be string, got array",
                "Argument 2 of join() must be array, got string",
            ]
        );
    }

    #[test]
    fn trim_optional_characters() {
        assert!(messages("trim(\"  x  \");").is_empty());
        assert!(messages("trim(\"--x--\", \"-\");").is_empty());
        assert_eq!(messages("trim();"), vec!["trim() expects 1-2 arguments, got 0"]);
    }

    #[test]
    fn variadic_format_functions() {
        assert!(messages("sprintf(\"%d-%s\", 1, \"a\");").is_empty());
        assert!(messages("chr();").is_empty());
        assert!(messages("chr(65, 66, 67);").is_empty());
        assert_eq!(
            messages("printf(42);"),
            vec!["Argument 1 of printf() must be string, got integer"]
        );
    }

    #[test]
    fn index_searches_strings_and_arrays() {
        assert!(messages("index(\"abc\", \"b\");").is_empty());
        assert!(messages("rindex([1, 2, 1], 1);").is_empty());
        assert_eq!(
            messages("index({}, \"a\");"),
            vec!["Argument 1 of index() must be string or array, got object"]
        );
    }
}
