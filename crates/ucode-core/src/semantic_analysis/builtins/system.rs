// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `system(command, timeout?)`

use super::{Arity, BuiltinValidator, CallSite, Param, TypeOracle, check_argument};
use crate::ast::{Element, Expression};
use crate::semantic_analysis::types::{DataType, ValueType, may_be};
use crate::source_analysis::{Diagnostic, DiagnosticCategory};

const COMMAND: Param = Param::of(&[DataType::String, DataType::Array]);

pub(super) struct SystemValidator;

impl BuiltinValidator for SystemValidator {
    fn validate(
        &self,
        call: &CallSite<'_>,
        oracle: &dyn TypeOracle,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        let mut valid = Arity::Range(1, 2).check(call, diagnostics);
        valid &= check_argument(call, 0, COMMAND, oracle, diagnostics);
        valid &= check_argument(call, 1, Param::NUMBER, oracle, diagnostics);

        // An argv array is passed to execvp as-is.
        if let Some(Expression::Array { elements, .. }) = call.argument(0) {
            for element in elements {
                let Element::Expression(argument) = element else {
                    continue;
                };
                if !may_be(&oracle.type_of(argument), DataType::String) {
                    diagnostics.push(
                        Diagnostic::error("system() command arguments must be strings", argument.span())
                            .with_category(DiagnosticCategory::Builtin),
                    );
                    valid = false;
                }
            }
        }
        valid
    }

    fn return_type(&self) -> ValueType {
        DataType::Integer.into()
    }
}
