// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Argument contracts for ucode's builtin functions.
//!
//! Each builtin name maps to a [`BuiltinValidator`] in the
//! [`BuiltinRegistry`]. Most builtins are described by a [`Signature`]
//! (arity, accepted argument types and result type) and checked by the
//! generic [`SignatureValidator`]; `signal()` and `system()` have dedicated
//! validators with extra literal checks.
//!
//! Validators never see the analyzer itself. Argument types come from a
//! [`TypeOracle`] passed on every call.
//!
//! Families:
//! - strings: `length`, `split`, `replace`, `sprintf`, ...
//! - arrays and objects: `push`, `sort`, `keys`, ...
//! - numbers: `int`, `hex`, `sleep`, `min`, `max`, ...
//! - time: `localtime`, `gmtime`, `timelocal`, `timegm`, `clock`
//! - processes: `system`, `signal`
//! - everything else: `type`, `die`, `require`, `json`, `print`, ...

mod arrays;
mod misc;
mod numbers;
mod signal;
mod strings;
mod system;
mod time;

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::types::{DataType, ValueType, union_of};
use crate::ast::{Element, Expression, Literal};
use crate::source_analysis::{Diagnostic, DiagnosticCategory, Span};

pub use signal::{SIGNALS, signal_number};

/// Answers "what type does this expression have" for validators.
pub trait TypeOracle {
    fn type_of(&self, expression: &Expression) -> ValueType;
}

/// A call to a builtin, as seen by its validator.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    pub name: &'a str,
    pub arguments: &'a [Element],
    /// The whole call expression.
    pub span: Span,
}

impl<'a> CallSite<'a> {
    #[must_use]
    pub fn new(name: &'a str, arguments: &'a [Element], span: Span) -> Self {
        Self {
            name,
            arguments,
            span,
        }
    }

    /// The argument at `index`, unless it is missing, a spread or a hole.
    #[must_use]
    pub fn argument(&self, index: usize) -> Option<&'a Expression> {
        self.arguments.get(index).and_then(Element::as_expression)
    }

    /// A spread argument makes the argument count unknowable.
    #[must_use]
    pub fn has_spread(&self) -> bool {
        self.arguments
            .iter()
            .any(|argument| matches!(argument, Element::Spread { .. }))
    }
}

/// Checks one builtin's argument contract.
pub trait BuiltinValidator: Send + Sync {
    /// Pushes a diagnostic for every violation. Returns `true` when the call
    /// satisfies the contract.
    fn validate(
        &self,
        call: &CallSite<'_>,
        oracle: &dyn TypeOracle,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool;

    /// The type a call produces.
    fn return_type(&self) -> ValueType {
        ValueType::UNKNOWN
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Maps builtin names to their validators.
pub struct BuiltinRegistry {
    validators: HashMap<&'static str, Box<dyn BuiltinValidator>>,
}

impl BuiltinRegistry {
    /// Creates a registry holding every ucode builtin.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            validators: HashMap::new(),
        };
        registry.register_builtins();
        registry
    }

    /// A registry with nothing registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    fn register_builtins(&mut self) {
        for family in [
            strings::SIGNATURES,
            arrays::SIGNATURES,
            numbers::SIGNATURES,
            time::SIGNATURES,
            misc::SIGNATURES,
        ] {
            for signature in family {
                self.register(signature.name, SignatureValidator::new(signature));
            }
        }
        self.register("system", system::SystemValidator);
        self.register("signal", signal::SignalValidator);
    }

    /// Adds or replaces the validator for `name`.
    pub fn register(&mut self, name: &'static str, validator: impl BuiltinValidator + 'static) {
        self.validators.insert(name, Box::new(validator));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn BuiltinValidator> {
        self.validators.get(name).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.validators.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Runs the validator registered for `call.name`, if any.
    pub fn validate(
        &self,
        call: &CallSite<'_>,
        oracle: &dyn TypeOracle,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<bool> {
        self.get(call.name)
            .map(|validator| validator.validate(call, oracle, diagnostics))
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Predefined global values that are not functions.
pub const GLOBAL_VALUES: &[(&str, DataType)] = &[
    ("ARGV", DataType::Array),
    ("SCRIPT_NAME", DataType::String),
    ("REQUIRE_SEARCH_PATH", DataType::Array),
    ("modules", DataType::Object),
    ("global", DataType::Object),
    ("NaN", DataType::Double),
    ("Infinity", DataType::Double),
];

// ============================================================================
// Signatures
// ============================================================================

/// How many arguments a builtin takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::Range(min, max) => count >= min && count <= max,
            Self::AtLeast(min) => count >= min,
        }
    }

    fn describe(self) -> String {
        match self {
            Self::Exact(n) => format!("{n} {}", plural(n)),
            Self::Range(min, max) => format!("{min}-{max} arguments"),
            Self::AtLeast(min) => format!("at least {min} {}", plural(min)),
        }
    }

    /// Reports a count mismatch. Calls with a spread argument are skipped.
    pub fn check(self, call: &CallSite<'_>, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let count = call.arguments.len();
        if call.has_spread() || self.accepts(count) {
            return true;
        }
        diagnostics.push(
            Diagnostic::error(
                format!("{}() expects {}, got {count}", call.name, self.describe()),
                call.span,
            )
            .with_category(DiagnosticCategory::Builtin),
        );
        false
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "argument" } else { "arguments" }
}

/// The types one parameter accepts. An empty set accepts anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub types: &'static [DataType],
    /// String literals that spell a number are accepted.
    pub numeric_strings: bool,
}

impl Param {
    pub const ANY: Self = Self::of(&[]);
    pub const STRING: Self = Self::of(&[DataType::String]);
    pub const ARRAY: Self = Self::of(&[DataType::Array]);
    pub const OBJECT: Self = Self::of(&[DataType::Object]);
    pub const FUNCTION: Self = Self::of(&[DataType::Function]);
    pub const NUMBER: Self = Self {
        types: &[DataType::Integer, DataType::Double],
        numeric_strings: true,
    };
    pub const PATTERN: Self = Self::of(&[DataType::String, DataType::Regex]);

    #[must_use]
    pub const fn of(types: &'static [DataType]) -> Self {
        Self {
            types,
            numeric_strings: false,
        }
    }

    fn accepts_member(self, member: DataType) -> bool {
        member == DataType::Unknown
            || self.types.contains(&member)
            || (member == DataType::Integer && self.types.contains(&DataType::Double))
    }

    /// `unknown` always passes; a union passes if any member does.
    #[must_use]
    pub fn accepts(self, value_type: &ValueType, expression: &Expression) -> bool {
        if self.types.is_empty() || value_type.members().iter().any(|m| self.accepts_member(*m)) {
            return true;
        }
        self.numeric_strings
            && matches!(expression, Expression::Literal(Literal::String(text), _) if looks_numeric(text))
    }

    fn describe(self) -> String {
        let names: Vec<&str> = if self.numeric_strings {
            vec!["number"]
        } else {
            self.types.iter().map(|t| t.as_str()).collect()
        };
        match names.as_slice() {
            [] => "any value".to_owned(),
            [single] => (*single).to_owned(),
            [init @ .., last] => format!("{} or {last}", init.join(", ")),
        }
    }
}

/// The contract of one builtin.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub name: &'static str,
    pub arity: Arity,
    /// Accepted types by position. Arguments past the end are unchecked.
    pub params: &'static [Param],
    pub returns: &'static [DataType],
}

impl Signature {
    #[must_use]
    pub const fn new(
        name: &'static str,
        arity: Arity,
        params: &'static [Param],
        returns: &'static [DataType],
    ) -> Self {
        Self {
            name,
            arity,
            params,
            returns,
        }
    }

    fn return_type(&self) -> ValueType {
        let members: Vec<ValueType> = self.returns.iter().map(|t| ValueType::Single(*t)).collect();
        if members.is_empty() {
            ValueType::UNKNOWN
        } else {
            union_of(&members)
        }
    }
}

/// Checks arity then each positional argument against its [`Param`].
#[derive(Debug, Clone, Copy)]
pub struct SignatureValidator {
    signature: &'static Signature,
}

impl SignatureValidator {
    #[must_use]
    pub const fn new(signature: &'static Signature) -> Self {
        Self { signature }
    }
}

impl BuiltinValidator for SignatureValidator {
    fn validate(
        &self,
        call: &CallSite<'_>,
        oracle: &dyn TypeOracle,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        let mut valid = self.signature.arity.check(call, diagnostics);
        for (index, param) in self.signature.params.iter().enumerate() {
            valid &= check_argument(call, index, *param, oracle, diagnostics);
        }
        valid
    }

    fn return_type(&self) -> ValueType {
        self.signature.return_type()
    }
}

/// Checks the argument at `index` against `param`; missing arguments pass.
pub fn check_argument(
    call: &CallSite<'_>,
    index: usize,
    param: Param,
    oracle: &dyn TypeOracle,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let Some(argument) = call.argument(index) else {
        return true;
    };
    let actual = oracle.type_of(argument);
    if param.accepts(&actual, argument) {
        return true;
    }
    diagnostics.push(
        Diagnostic::error(
            format!(
                "Argument {} of {}() must be {}, got {actual}",
                index + 1,
                call.name,
                param.describe()
            ),
            argument.span(),
        )
        .with_category(DiagnosticCategory::Builtin),
    );
    false
}

const NUMERIC_PATTERN: &str =
    r"^\s*[+-]?(0[xX][0-9a-fA-F]+|0[bB][01]+|0[oO][0-7]+|(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?)\s*$";

static NUMERIC_STRING: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(NUMERIC_PATTERN).ok());

/// Whether ucode would read `text` as a number.
#[must_use]
pub fn looks_numeric(text: &str) -> bool {
    NUMERIC_STRING
        .as_ref()
        .is_none_or(|pattern| pattern.is_match(text))
}


#[cfg(test)]
mod tests {
    use super::test_support::{messages, validate, validate_with};
    use super::*;

    #[test]
    fn length_arity() {
        assert_eq!(messages("length();"), vec!["length() expects 1 argument, got 0"]);
        assert_eq!(messages("length(\"a\", \"b\");"), vec!["length() expects 1 argument, got 2"]);
        assert!(messages("length(\"abc\");").is_empty());
        assert!(messages("length([1, 2]);").is_empty());
        assert!(messages("length({ a: 1 });").is_empty());
        assert!(messages("length(unknown_thing);").is_empty());
    }

    #[test]
    fn length_rejects_numbers() {
        let (valid, diagnostics) = validate("length(42);");
        assert!(!valid);
        assert_eq!(
            diagnostics[0].message,
            "Argument 1 of length() must be string, array or object, got integer"
        );
        assert_eq!(diagnostics[0].category, Some(DiagnosticCategory::Builtin));
    }

    #[test]
    fn range_and_minimum_messages() {
        assert_eq!(messages("substr(\"a\");"), vec!["substr() expects 2-3 arguments, got 1"]);
        assert_eq!(messages("sprintf();"), vec!["sprintf() expects at least 1 argument, got 0"]);
    }

    #[test]
    fn spread_arguments_skip_arity() {
        assert!(messages("length(...args);").is_empty());
    }

    #[test]
    fn union_argument_passes_if_any_member_does() {
        let maybe = union_of(&[DataType::Integer.into(), DataType::String.into()]);
        let (valid, diagnostics) = validate_with("lc(value);", &[("value", maybe)]);
        assert!(valid, "{diagnostics:?}");
    }

    #[test]
    fn patterns_accept_strings_and_regexes() {
        assert!(messages("split(\"a,b\", \",\");").is_empty());
        assert!(messages("split(\"a b\", /\\s+/);").is_empty());
        assert!(messages("replace(s, /x/g, \"y\");").is_empty());
        assert!(messages("match(\"abc\", /b/);").is_empty());
        assert_eq!(
            messages("split(\"a\", 1);"),
            vec!["Argument 2 of split() must be string or regex, got integer"]
        );
    }

    #[test]
    fn numeric_strings() {
        assert!(looks_numeric("42"));
        assert!(looks_numeric(" -3.5e2 "));
        assert!(looks_numeric("0x1F"));
        assert!(looks_numeric("0b101"));
        assert!(looks_numeric(".5"));
        assert!(!looks_numeric("abc"));
        assert!(!looks_numeric("0x"));
        assert!(messages("sleep(\"100\");").is_empty());
        assert_eq!(
            messages("sleep(\"soon\");"),
            vec!["Argument 1 of sleep() must be number, got string"]
        );
    }

    #[test]
    fn registry_lookup() {
        let registry = BuiltinRegistry::new();
        assert!(registry.contains("length"));
        assert!(registry.contains("signal"));
        assert!(!registry.contains("not_a_builtin"));
        assert_eq!(registry.get("length").map(|v| v.return_type()), Some(union_of(&[
            DataType::Integer.into(),
            DataType::Null.into()
        ])));
        assert!(registry.names().windows(2).all(|pair| pair[0] < pair[1]));
        assert!(BuiltinRegistry::empty().names().is_empty());
    }

    #[test]
    fn custom_validators_can_be_registered() {
        struct Never;
        impl BuiltinValidator for Never {
            fn validate(
                &self,
                call: &CallSite<'_>,
                _oracle: &dyn TypeOracle,
                diagnostics: &mut Vec<Diagnostic>,
            ) -> bool {
                diagnostics.push(Diagnostic::error("no", call.span));
                false
            }
        }
        let mut registry = BuiltinRegistry::empty();
        registry.register("custom", Never);
        let call = CallSite::new("custom", &[], Span::new(0, 8));
        let oracle = test_support::LiteralOracle {
            names: HashMap::new(),
        };
        let mut diagnostics = Vec::new();
        assert_eq!(registry.validate(&call, &oracle, &mut diagnostics), Some(false));
        assert_eq!(diagnostics.len(), 1);
    }
}
