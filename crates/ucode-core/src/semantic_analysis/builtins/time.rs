// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Time builtins.

use super::{Arity, Param, Signature};
use crate::semantic_analysis::types::DataType::{Array, Integer, Null, Object};

pub(super) const SIGNATURES: &[Signature] = &[
    Signature::new("localtime", Arity::Range(0, 1), &[Param::NUMBER], &[Object]),
    Signature::new("gmtime", Arity::Range(0, 1), &[Param::NUMBER], &[Object]),
    Signature::new("timelocal", Arity::Exact(1), &[Param::OBJECT], &[Integer, Null]),
    Signature::new("timegm", Arity::Exact(1), &[Param::OBJECT], &[Integer, Null]),
    Signature::new("clock", Arity::Range(0, 1), &[Param::ANY], &[Array, Null]),
];
