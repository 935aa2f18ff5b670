// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Static type vocabulary and compatibility rules.
//!
//! ucode is dynamically typed; the analyzer tracks what a value *may* be:
//! - [`DataType`] is one runtime type, or [`DataType::Unknown`] when
//!   inference gives up.
//! - [`ValueType`] is a single type or a union of at least two distinct
//!   types. `unknown` absorbs unions: anything unioned with `unknown` is
//!   `unknown`.
//!
//! Every function here is pure. `unknown` is compatible in both directions
//! so that incomplete inference never produces false positives.

use std::fmt;

use crate::ast::{BinaryOperator, UnaryOperator, UpdateOperator};

/// A runtime type of a ucode value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Null,
    Boolean,
    Integer,
    Double,
    String,
    Array,
    Object,
    Function,
    Regex,
    Unknown,
}

impl DataType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Function => "function",
            Self::Regex => "regex",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a result of ucode's `type()` builtin to a data type.
    ///
    /// `type()` reports `"int"`, `"bool"`, `"regexp"` and `"cfunction"`;
    /// the long spellings are accepted too.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" | "integer" => Self::Integer,
            "double" => Self::Double,
            "bool" | "boolean" => Self::Boolean,
            "string" => Self::String,
            "array" => Self::Array,
            "object" => Self::Object,
            "function" | "cfunction" => Self::Function,
            "regexp" | "regex" => Self::Regex,
            "null" => Self::Null,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Double)
    }

    /// Numeric or boolean.
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Integer | Self::Double | Self::Boolean)
    }

    /// Values of this type never carry named properties.
    #[must_use]
    pub const fn is_property_less(self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::Integer | Self::Double | Self::Function | Self::Regex
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Value Types
// ============================================================================

/// The inferred type of an expression or variable.
#[derive(Debug, Clone)]
pub enum ValueType {
    Single(DataType),
    /// At least two distinct members, none of them `unknown`.
    Union(UnionType),
}

/// An ordered set of two or more distinct data types.
///
/// Equality ignores order; display keeps insertion order.
#[derive(Debug, Clone)]
pub struct UnionType {
    members: Vec<DataType>,
}

impl UnionType {
    #[must_use]
    pub fn members(&self) -> &[DataType] {
        &self.members
    }

    #[must_use]
    pub fn contains(&self, member: DataType) -> bool {
        self.members.contains(&member)
    }
}

impl PartialEq for UnionType {
    fn eq(&self, other: &Self) -> bool {
        self.members.len() == other.members.len()
            && self.members.iter().all(|member| other.contains(*member))
    }
}

impl Eq for UnionType {}

impl ValueType {
    pub const UNKNOWN: Self = Self::Single(DataType::Unknown);
    pub const NULL: Self = Self::Single(DataType::Null);

    /// Every member; a single type is a one-element slice.
    #[must_use]
    pub fn members(&self) -> &[DataType] {
        match self {
            Self::Single(data_type) => std::slice::from_ref(data_type),
            Self::Union(union) => union.members(),
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Single(DataType::Unknown))
    }

    #[must_use]
    pub fn is(&self, data_type: DataType) -> bool {
        matches!(self, Self::Single(single) if *single == data_type)
    }

    #[must_use]
    pub fn as_single(&self) -> Option<DataType> {
        match self {
            Self::Single(data_type) => Some(*data_type),
            Self::Union(_) => None,
        }
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Single(a), Self::Single(b)) => a == b,
            (Self::Union(a), Self::Union(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ValueType {}

impl From<DataType> for ValueType {
    fn from(data_type: DataType) -> Self {
        Self::Single(data_type)
    }
}

impl Default for ValueType {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, member) in self.members().iter().enumerate() {
            if index > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(member.as_str())?;
        }
        Ok(())
    }
}

// ============================================================================
// Construction
// ============================================================================

/// Unions the members of `types`, keeping first-seen order.
///
/// An empty input is `null`; any `unknown` member makes the result
/// `unknown`; a single distinct member collapses to [`ValueType::Single`].
#[must_use]
pub fn union_of<'a>(types: impl IntoIterator<Item = &'a ValueType>) -> ValueType {
    let mut members: Vec<DataType> = Vec::new();
    for value_type in types {
        for member in value_type.members() {
            if *member == DataType::Unknown {
                return ValueType::UNKNOWN;
            }
            if !members.contains(member) {
                members.push(*member);
            }
        }
    }
    from_members(members)
}

fn from_members(members: Vec<DataType>) -> ValueType {
    match members.len() {
        0 => ValueType::NULL,
        1 => ValueType::Single(members[0]),
        _ => ValueType::Union(UnionType { members }),
    }
}

/// Removes `member` from `value_type`.
///
/// `unknown` stays `unknown`, and removing the only member leaves
/// `unknown` since nothing can be said about the value any more.
#[must_use]
pub fn without(value_type: &ValueType, member: DataType) -> ValueType {
    if value_type.is_unknown() {
        return ValueType::UNKNOWN;
    }
    let remaining: Vec<DataType> = value_type
        .members()
        .iter()
        .copied()
        .filter(|candidate| *candidate != member)
        .collect();
    if remaining.is_empty() {
        ValueType::UNKNOWN
    } else {
        from_members(remaining)
    }
}

/// Whether a value of `value_type` may be a `member` at runtime.
#[must_use]
pub fn may_be(value_type: &ValueType, member: DataType) -> bool {
    value_type.is_unknown() || value_type.members().contains(&member)
}

// ============================================================================
// Predicates
// ============================================================================

/// Integer or double, including the union of the two.
#[must_use]
pub fn is_numeric_type(value_type: &ValueType) -> bool {
    value_type.members().iter().all(|member| member.is_numeric())
}

/// Numeric or boolean in every member.
#[must_use]
pub fn is_arithmetic_type(value_type: &ValueType) -> bool {
    value_type.members().iter().all(|member| member.is_arithmetic())
}

fn may_be_arithmetic(value_type: &ValueType) -> bool {
    value_type.is_unknown() || value_type.members().iter().any(|member| member.is_arithmetic())
}

/// True when both operands can take part in arithmetic.
///
/// A union operand qualifies if any of its members does; an `unknown`
/// operand always qualifies.
#[must_use]
pub fn can_perform_arithmetic(left: &ValueType, right: &ValueType) -> bool {
    if left.is_unknown() || right.is_unknown() {
        return true;
    }
    may_be_arithmetic(left) && may_be_arithmetic(right)
}

/// ucode converts any operand of a bitwise operator to an integer.
#[must_use]
pub fn can_perform_bitwise_op(_left: &ValueType, _right: &ValueType) -> bool {
    true
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type of an arithmetic operator.
///
/// `+` with a string operand concatenates. Otherwise the result is a double
/// if either side is a double, else an integer. Unions produce the union of
/// the member-wise results.
#[must_use]
pub fn get_arithmetic_result_type(
    left: &ValueType,
    right: &ValueType,
    operator: BinaryOperator,
) -> ValueType {
    if left.is_unknown() || right.is_unknown() {
        return ValueType::UNKNOWN;
    }
    let mut results = Vec::new();
    for l in left.members() {
        for r in right.members() {
            results.push(ValueType::Single(arithmetic_member_result(*l, *r, operator)));
        }
    }
    union_of(&results)
}

fn arithmetic_member_result(left: DataType, right: DataType, operator: BinaryOperator) -> DataType {
    if operator == BinaryOperator::Add && (left == DataType::String || right == DataType::String) {
        DataType::String
    } else if left == DataType::Double || right == DataType::Double {
        DataType::Double
    } else {
        DataType::Integer
    }
}

/// Result type of a bitwise operator: always an integer unless unknown.
#[must_use]
pub fn get_bitwise_result_type(left: &ValueType, right: &ValueType) -> ValueType {
    if left.is_unknown() || right.is_unknown() {
        ValueType::UNKNOWN
    } else {
        DataType::Integer.into()
    }
}

/// Prefix and postfix operators with a typed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    BitNot,
    Plus,
    Minus,
    Increment,
    Decrement,
}

impl UnaryOp {
    /// `None` for `delete`, whose result is the removed value.
    #[must_use]
    pub const fn from_unary(operator: UnaryOperator) -> Option<Self> {
        match operator {
            UnaryOperator::Not => Some(Self::Not),
            UnaryOperator::BitNot => Some(Self::BitNot),
            UnaryOperator::Plus => Some(Self::Plus),
            UnaryOperator::Minus => Some(Self::Minus),
            UnaryOperator::Delete => None,
        }
    }

    #[must_use]
    pub const fn from_update(operator: UpdateOperator) -> Self {
        match operator {
            UpdateOperator::Increment => Self::Increment,
            UpdateOperator::Decrement => Self::Decrement,
        }
    }
}

/// Result type of a unary operator.
///
/// `!` always yields a boolean. The others need an arithmetic operand:
/// `~` yields an integer, `+ - ++ --` keep the numeric type (booleans become
/// integers). Anything else is `unknown`.
#[must_use]
pub fn get_unary_result_type(operator: UnaryOp, operand: &ValueType) -> ValueType {
    if operator == UnaryOp::Not {
        return DataType::Boolean.into();
    }
    if operand.is_unknown() || !is_arithmetic_type(operand) {
        return ValueType::UNKNOWN;
    }
    if operator == UnaryOp::BitNot {
        return DataType::Integer.into();
    }
    let results: Vec<ValueType> = operand
        .members()
        .iter()
        .map(|member| match member {
            DataType::Double => ValueType::Single(DataType::Double),
            _ => ValueType::Single(DataType::Integer),
        })
        .collect();
    union_of(&results)
}

/// `test ? a : b`: the shared type, or the union of both.
#[must_use]
pub fn get_ternary_result_type(consequent: &ValueType, alternate: &ValueType) -> ValueType {
    if consequent == alternate {
        consequent.clone()
    } else {
        union_of([consequent, alternate])
    }
}

/// The type covering every entry of `types`.
///
/// Empty is `null`. All-numeric inputs promote to double if any entry may
/// be a double, else integer; everything else becomes a union.
#[must_use]
pub fn get_common_type(types: &[ValueType]) -> ValueType {
    match types {
        [] => ValueType::NULL,
        [single] => single.clone(),
        _ if types.iter().all(|t| !t.is_unknown() && is_numeric_type(t)) => {
            if types.iter().any(|t| t.members().contains(&DataType::Double)) {
                DataType::Double.into()
            } else {
                DataType::Integer.into()
            }
        }
        _ => union_of(types),
    }
}

// ============================================================================
// Compatibility
// ============================================================================

fn is_member_compatible(source: DataType, target: DataType) -> bool {
    source == target
        || source == DataType::Unknown
        || target == DataType::Unknown
        || (source == DataType::Integer && target == DataType::Double)
}

/// Whether a value of type `source` may be used where `target` is expected.
///
/// Every member of `source` must be accepted by some member of `target`.
/// `unknown` is compatible in both directions and integers widen to
/// doubles.
#[must_use]
pub fn is_type_compatible(source: &ValueType, target: &ValueType) -> bool {
    if source.is_unknown() || target.is_unknown() {
        return true;
    }
    source.members().iter().all(|s| {
        target
            .members()
            .iter()
            .any(|t| is_member_compatible(*s, *t))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(data_type: DataType) -> ValueType {
        ValueType::Single(data_type)
    }

    fn union(members: &[DataType]) -> ValueType {
        union_of(&members.iter().map(|m| single(*m)).collect::<Vec<_>>())
    }

    #[test]
    fn arithmetic_promotion() {
        use DataType::{Boolean, Double, Integer, String};
        let add = BinaryOperator::Add;
        assert_eq!(
            get_arithmetic_result_type(&single(Integer), &single(Double), add),
            single(Double)
        );
        assert_eq!(
            get_arithmetic_result_type(&single(String), &single(Integer), add),
            single(String)
        );
        assert_eq!(
            get_arithmetic_result_type(&single(Boolean), &single(Integer), add),
            single(Integer)
        );
        assert_eq!(
            get_arithmetic_result_type(&single(String), &single(Integer), BinaryOperator::Multiply),
            single(Integer)
        );
    }

    #[test]
    fn arithmetic_with_unknown_is_unknown() {
        assert!(
            get_arithmetic_result_type(&ValueType::UNKNOWN, &single(DataType::Integer), BinaryOperator::Subtract)
                .is_unknown()
        );
    }

    #[test]
    fn arithmetic_over_union_is_member_wise() {
        let left = union(&[DataType::String, DataType::Integer]);
        let result = get_arithmetic_result_type(&left, &single(DataType::Double), BinaryOperator::Add);
        assert_eq!(result, union(&[DataType::String, DataType::Double]));
    }

    #[test]
    fn ternary_union_collapse() {
        let string = single(DataType::String);
        let integer = single(DataType::Integer);
        assert_eq!(get_ternary_result_type(&string, &string), string);

        let mixed = get_ternary_result_type(&string, &integer);
        let ValueType::Union(members) = &mixed else {
            panic!("expected a union, got {mixed}");
        };
        assert_eq!(members.members().len(), 2);
        assert!(members.contains(DataType::String));
        assert!(members.contains(DataType::Integer));

        let wider = union(&[DataType::String, DataType::Integer, DataType::Boolean]);
        assert!(is_type_compatible(&mixed, &wider));
        assert!(!is_type_compatible(&mixed, &string));
    }

    #[test]
    fn union_equality_ignores_order() {
        let a = union(&[DataType::String, DataType::Integer]);
        let b = union(&[DataType::Integer, DataType::String]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "string | integer");
        assert_eq!(b.to_string(), "integer | string");
    }

    #[test]
    fn union_never_has_one_member_or_duplicates() {
        let collapsed = union(&[DataType::Array, DataType::Array]);
        assert_eq!(collapsed, single(DataType::Array));
        let triple = union(&[DataType::Null, DataType::String, DataType::Null, DataType::Object]);
        assert_eq!(triple.members().len(), 3);
    }

    #[test]
    fn unknown_absorbs_unions() {
        let with_unknown = union(&[DataType::String, DataType::Unknown]);
        assert!(with_unknown.is_unknown());
    }

    #[test]
    fn unknown_is_compatible_both_ways() {
        let string = single(DataType::String);
        assert!(is_type_compatible(&ValueType::UNKNOWN, &string));
        assert!(is_type_compatible(&string, &ValueType::UNKNOWN));
    }

    #[test]
    fn integer_widens_to_double() {
        assert!(is_type_compatible(&single(DataType::Integer), &single(DataType::Double)));
        assert!(!is_type_compatible(&single(DataType::Double), &single(DataType::Integer)));
    }

    #[test]
    fn single_source_against_union_target() {
        let target = union(&[DataType::String, DataType::Array]);
        assert!(is_type_compatible(&single(DataType::Array), &target));
        assert!(!is_type_compatible(&single(DataType::Object), &target));
    }

    #[test]
    fn common_type_rules() {
        assert_eq!(get_common_type(&[]), ValueType::NULL);
        assert_eq!(get_common_type(&[single(DataType::Regex)]), single(DataType::Regex));
        assert_eq!(
            get_common_type(&[single(DataType::Integer), single(DataType::Integer)]),
            single(DataType::Integer)
        );
        assert_eq!(
            get_common_type(&[single(DataType::Integer), single(DataType::Double)]),
            single(DataType::Double)
        );
        assert_eq!(
            get_common_type(&[single(DataType::String), single(DataType::Null)]),
            union(&[DataType::String, DataType::Null])
        );
    }

    #[test]
    fn unary_results() {
        let string = single(DataType::String);
        assert_eq!(get_unary_result_type(UnaryOp::Not, &string), single(DataType::Boolean));
        assert!(get_unary_result_type(UnaryOp::Minus, &string).is_unknown());
        assert_eq!(
            get_unary_result_type(UnaryOp::Minus, &single(DataType::Double)),
            single(DataType::Double)
        );
        assert_eq!(
            get_unary_result_type(UnaryOp::Increment, &single(DataType::Boolean)),
            single(DataType::Integer)
        );
        assert_eq!(
            get_unary_result_type(UnaryOp::BitNot, &single(DataType::Double)),
            single(DataType::Integer)
        );
    }

    #[test]
    fn arithmetic_compatibility() {
        let string = single(DataType::String);
        let integer = single(DataType::Integer);
        let null = ValueType::NULL;
        assert!(can_perform_arithmetic(&integer, &single(DataType::Boolean)));
        assert!(!can_perform_arithmetic(&string, &integer));
        assert!(!can_perform_arithmetic(&null, &integer));
        assert!(can_perform_arithmetic(&union(&[DataType::String, DataType::Integer]), &integer));
        assert!(can_perform_arithmetic(&ValueType::UNKNOWN, &string));
        assert!(can_perform_bitwise_op(&string, &null));
    }

    #[test]
    fn narrowing_helpers() {
        let maybe_string = union(&[DataType::String, DataType::Null]);
        assert_eq!(without(&maybe_string, DataType::Null), single(DataType::String));
        assert!(without(&single(DataType::String), DataType::String).is_unknown());
        assert!(may_be(&maybe_string, DataType::Null));
        assert!(!may_be(&maybe_string, DataType::Array));
        assert!(may_be(&ValueType::UNKNOWN, DataType::Array));
    }

    #[test]
    fn type_names_from_type_builtin() {
        assert_eq!(DataType::from_type_name("int"), Some(DataType::Integer));
        assert_eq!(DataType::from_type_name("regexp"), Some(DataType::Regex));
        assert_eq!(DataType::from_type_name("widget"), None);
    }
}
