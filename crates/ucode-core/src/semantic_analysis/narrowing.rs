// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Type guards extracted from conditions.
//!
//! A condition such as `type(x) == "string"` tells the analyzer something
//! about `x` in each branch. [`guards_for`] turns a condition into the facts
//! that hold when it is true and when it is false:
//!
//! | Condition                      | then-branch        | else-branch        |
//! |--------------------------------|--------------------|--------------------|
//! | `type(x) == "T"` (`===`)       | `x` is `T`         | `x` is not `T`     |
//! | `type(x) != "T"` (`!==`)       | `x` is not `T`     | `x` is `T`         |
//! | `x == null` / `x != null`      | is / is not `null` | the opposite       |
//! | `x`                            | `x` is not `null`  | nothing            |
//! | `!c`                           | else of `c`        | then of `c`        |
//! | `a && b`                       | then of both       | nothing            |
//! | `a \|\| b`                     | nothing            | else of both       |
//!
//! Operands may appear in either order.

use ecow::EcoString;

use super::types::{DataType, ValueType, without};
use crate::ast::{BinaryOperator, Expression, Literal, LogicalOperator, UnaryOperator};

/// One fact about a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Is { name: EcoString, member: DataType },
    IsNot { name: EcoString, member: DataType },
}

impl Guard {
    #[must_use]
    pub fn name(&self) -> &EcoString {
        match self {
            Self::Is { name, .. } | Self::IsNot { name, .. } => name,
        }
    }

    fn negate(self) -> Self {
        match self {
            Self::Is { name, member } => Self::IsNot { name, member },
            Self::IsNot { name, member } => Self::Is { name, member },
        }
    }

    /// The type `current` becomes once this fact holds.
    #[must_use]
    pub fn apply(&self, current: &ValueType) -> ValueType {
        match self {
            Self::Is { member, .. } => ValueType::Single(*member),
            Self::IsNot { member, .. } => without(current, *member),
        }
    }
}

/// Facts for both branches of a condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guards {
    pub when_true: Vec<Guard>,
    pub when_false: Vec<Guard>,
}

impl Guards {
    fn negate(self) -> Self {
        Self {
            when_true: self.when_false,
            when_false: self.when_true,
        }
    }
}

/// Extracts the narrowing facts of `test`.
#[must_use]
pub fn guards_for(test: &Expression) -> Guards {
    match test {
        Expression::Unary {
            operator: UnaryOperator::Not,
            argument,
            ..
        } => guards_for(argument).negate(),

        Expression::Logical {
            operator: LogicalOperator::And,
            left,
            right,
            ..
        } => {
            let mut when_true = guards_for(left).when_true;
            when_true.extend(guards_for(right).when_true);
            Guards {
                when_true,
                when_false: Vec::new(),
            }
        }

        Expression::Logical {
            operator: LogicalOperator::Or,
            left,
            right,
            ..
        } => {
            let mut when_false = guards_for(left).when_false;
            when_false.extend(guards_for(right).when_false);
            Guards {
                when_true: Vec::new(),
                when_false,
            }
        }

        Expression::Binary {
            operator,
            left,
            right,
            ..
        } => {
            let positive = match operator {
                BinaryOperator::Equal | BinaryOperator::StrictEqual => true,
                BinaryOperator::NotEqual | BinaryOperator::StrictNotEqual => false,
                _ => return Guards::default(),
            };
            let Some(guard) = equality_guard(left, right).or_else(|| equality_guard(right, left))
            else {
                return Guards::default();
            };
            let guards = Guards {
                when_true: vec![guard.clone()],
                when_false: vec![guard.negate()],
            };
            if positive { guards } else { guards.negate() }
        }

        Expression::Identifier(identifier) => Guards {
            when_true: vec![Guard::IsNot {
                name: identifier.name.clone(),
                member: DataType::Null,
            }],
            when_false: Vec::new(),
        },

        _ => Guards::default(),
    }
}

/// `type(x) == "T"` or `x == null`, with `subject` on the left.
fn equality_guard(subject: &Expression, other: &Expression) -> Option<Guard> {
    match (subject, other) {
        (Expression::Call { callee, arguments, .. }, _) => {
            if callee.as_identifier()?.name != "type" || arguments.len() != 1 {
                return None;
            }
            let name = arguments[0].as_expression()?.as_identifier()?.name.clone();
            let member = DataType::from_type_name(other.as_string_literal()?)?;
            Some(Guard::Is { name, member })
        }
        (Expression::Identifier(identifier), Expression::Literal(Literal::Null, _)) => Some(Guard::Is {
            name: identifier.name.clone(),
            member: DataType::Null,
        }),
        _ => None,
    }
}
