// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Array and object builtins.

use super::{Arity, Param, Signature};
use crate::semantic_analysis::types::DataType::{Array, Boolean, Null, Object, String};

const SORTABLE: Param = Param::of(&[Array, Object]);
const REVERSIBLE: Param = Param::of(&[Array, String]);

pub(super) const SIGNATURES: &[Signature] = &[
    Signature::new("push", Arity::AtLeast(1), &[Param::ARRAY], &[]),
    Signature::new("pop", Arity::Exact(1), &[Param::ARRAY], &[]),
    Signature::new("shift", Arity::Exact(1), &[Param::ARRAY], &[]),
    Signature::new("unshift", Arity::AtLeast(1), &[Param::ARRAY], &[]),
    Signature::new(
        "splice",
        Arity::AtLeast(2),
        &[Param::ARRAY, Param::NUMBER, Param::NUMBER],
        &[Array],
    ),
    Signature::new(
        "slice",
        Arity::Range(1, 3),
        &[Param::ARRAY, Param::NUMBER, Param::NUMBER],
        &[Array],
    ),
    Signature::new("sort", Arity::Range(1, 2), &[SORTABLE, Param::FUNCTION], &[Array, Object]),
    Signature::new("reverse", Arity::Exact(1), &[REVERSIBLE], &[Array, String]),
    Signature::new("uniq", Arity::Exact(1), &[Param::ARRAY], &[Array]),
    Signature::new("filter", Arity::Exact(2), &[Param::ARRAY, Param::FUNCTION], &[Array]),
    Signature::new("map", Arity::Exact(2), &[Param::ARRAY, Param::FUNCTION], &[Array]),
    Signature::new("keys", Arity::Exact(1), &[Param::OBJECT], &[Array, Null]),
    Signature::new("values", Arity::Exact(1), &[Param::OBJECT], &[Array, Null]),
    Signature::new("exists", Arity::Exact(2), &[Param::OBJECT, Param::STRING], &[Boolean]),
];
