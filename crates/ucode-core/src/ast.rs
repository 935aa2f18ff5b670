// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract Syntax Tree (AST) definitions for ucode.
//!
//! The AST is a strict tree: each node owns its children and there are no
//! parent back-references. Passes that need context (the analyzer, the
//! language service) carry it down explicitly while walking.
//!
//! # Design Philosophy
//!
//! - **All nodes have spans.** Every span lies inside its parent's span.
//! - **Closed enums.** Statement and expression kinds are Rust enum variants;
//!   [`Statement::node_type`] and [`Expression::node_type`] give the
//!   conventional ESTree-style tag names for tooling that keys on strings.
//! - **Decoded literals.** Strings, numbers and regexes carry values, not
//!   source text.
//!
//! # Example
//!
//! ```
//! use ucode_core::ast::{Expression, Statement};
//! use ucode_core::source_analysis::parse_source;
//!
//! let output = parse_source("x = 1 + 2;");
//! let program = output.program.unwrap();
//! let Statement::Expression { expression, .. } = &program.body[0] else {
//!     panic!("expected expression statement");
//! };
//! assert_eq!(expression.node_type(), "AssignmentExpression");
//! ```

use ecow::EcoString;

use crate::source_analysis::Span;

/// A parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Statement>,
    /// Covers the whole document.
    pub span: Span,
}

/// A name in source, with its location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: EcoString,
    pub span: Span,
}

impl Identifier {
    #[must_use]
    pub fn new(name: impl Into<EcoString>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

/// A ucode statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// An expression evaluated for its effect: `print(x);`
    Expression { expression: Expression, span: Span },

    /// `let a = 1, b;` or `const c = 2;`
    Variable(VariableDeclaration),

    /// `function name(a, b) { ... }`. The function's `name` is always set.
    Function(Function),

    /// `if (test) consequent else alternate`, including the `elif` chain of
    /// the colon syntax (each `elif` becomes a nested `If` in `alternate`).
    If {
        test: Expression,
        consequent: Box<Statement>,
        alternate: Option<Box<Statement>>,
        span: Span,
    },

    While {
        test: Expression,
        body: Box<Statement>,
        span: Span,
    },

    /// C-style `for (init; test; update) body`.
    For {
        init: Option<ForInit>,
        test: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
        span: Span,
    },

    /// `for (key in object)` or `for (key, value in object)`.
    ForIn {
        /// `let`/`const` when the loop declares its variables.
        declaration: Option<DeclarationKind>,
        key: Identifier,
        value: Option<Identifier>,
        object: Expression,
        body: Box<Statement>,
        span: Span,
    },

    Switch {
        discriminant: Expression,
        cases: Vec<SwitchCase>,
        span: Span,
    },

    /// `try { ... } catch (e) { ... }`. The catch clause is mandatory in
    /// ucode but kept optional here so a missing one can be reported.
    Try {
        block: Block,
        handler: Option<CatchClause>,
        span: Span,
    },

    Return {
        argument: Option<Expression>,
        span: Span,
    },
    Break { span: Span },
    Continue { span: Span },
    Block(Block),
    Import(ImportDeclaration),
    Export(ExportDeclaration),
    /// A lone `;`.
    Empty { span: Span },

    /// Literal output text of a template file.
    Text { value: EcoString, span: Span },
    /// `{{ expression }}` in a template file.
    Echo { expression: Expression, span: Span },
}

impl Statement {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Expression { span, .. }
            | Self::If { span, .. }
            | Self::While { span, .. }
            | Self::For { span, .. }
            | Self::ForIn { span, .. }
            | Self::Switch { span, .. }
            | Self::Try { span, .. }
            | Self::Return { span, .. }
            | Self::Break { span }
            | Self::Continue { span }
            | Self::Empty { span }
            | Self::Text { span, .. }
            | Self::Echo { span, .. } => *span,
            Self::Variable(declaration) => declaration.span,
            Self::Function(function) => function.span,
            Self::Block(block) => block.span,
            Self::Import(import) => import.span,
            Self::Export(export) => export.span(),
        }
    }

    /// The ESTree-style tag for this statement.
    #[must_use]
    pub fn node_type(&self) -> &'static str {
        match self {
            Self::Expression { .. } => "ExpressionStatement",
            Self::Variable(_) => "VariableDeclaration",
            Self::Function(_) => "FunctionDeclaration",
            Self::If { .. } => "IfStatement",
            Self::While { .. } => "WhileStatement",
            Self::For { .. } => "ForStatement",
            Self::ForIn { .. } => "ForInStatement",
            Self::Switch { .. } => "SwitchStatement",
            Self::Try { .. } => "TryStatement",
            Self::Return { .. } => "ReturnStatement",
            Self::Break { .. } => "BreakStatement",
            Self::Continue { .. } => "ContinueStatement",
            Self::Block(_) => "BlockStatement",
            Self::Import(_) => "ImportDeclaration",
            Self::Export(_) => "ExportDeclaration",
            Self::Empty { .. } => "EmptyStatement",
            Self::Text { .. } => "TemplateText",
            Self::Echo { .. } => "TemplateEcho",
        }
    }
}

/// A braced statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Let,
    Const,
}

impl DeclarationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Const => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub kind: DeclarationKind,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

/// One `name = init` inside a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub id: Identifier,
    pub init: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Declaration(VariableDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Identifier>,
    pub body: Block,
    pub span: Span,
}

/// `import ... from "module";`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: EcoString,
    pub source_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import { imported as local } from ...`
    Named { imported: Identifier, local: Identifier },
    /// `import local from ...`
    Default { local: Identifier },
    /// `import * as local from ...`
    Namespace { local: Identifier },
}

impl ImportSpecifier {
    /// The binding this specifier introduces.
    #[must_use]
    pub fn local(&self) -> &Identifier {
        match self {
            Self::Named { local, .. } | Self::Default { local } | Self::Namespace { local } => {
                local
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportDeclaration {
    /// `export let ...`, `export const ...` or `export function ...`
    Declaration { declaration: Box<Statement>, span: Span },
    /// `export { a, b as c };`
    Named {
        specifiers: Vec<ExportSpecifier>,
        span: Span,
    },
    /// `export default expression;`
    Default { expression: Expression, span: Span },
}

impl ExportDeclaration {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Declaration { span, .. } | Self::Named { span, .. } | Self::Default { span, .. } => {
                *span
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: Identifier,
    pub exported: Identifier,
}

// ============================================================================
// Functions
// ============================================================================

/// A function declaration, function expression or arrow function.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<Identifier>,
    pub params: Vec<Identifier>,
    /// Trailing `...rest` parameter.
    pub rest: Option<Identifier>,
    pub body: FunctionBody,
    pub is_arrow: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Block),
    /// Arrow function with an expression body: `x => x * 2`.
    Expression(Box<Expression>),
}

impl FunctionBody {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Block(block) => block.span,
            Self::Expression(expression) => expression.span(),
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// A ucode expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    Literal(Literal, Span),
    This(Span),

    /// `` `a${b}c` ``: `quasis` always has one more entry than `expressions`.
    Template {
        quasis: Vec<EcoString>,
        expressions: Vec<Expression>,
        span: Span,
    },

    /// `/pattern/flags`, with the pattern already in POSIX form.
    Regex {
        pattern: EcoString,
        flags: EcoString,
        span: Span,
    },

    Array { elements: Vec<Element>, span: Span },
    Object { properties: Vec<Property>, span: Span },
    Function(Box<Function>),

    Unary {
        operator: UnaryOperator,
        argument: Box<Expression>,
        span: Span,
    },

    /// `++x`, `x--`
    Update {
        operator: UpdateOperator,
        prefix: bool,
        argument: Box<Expression>,
        span: Span,
    },

    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },

    /// `&&`, `||` and `??`
    Logical {
        operator: LogicalOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },

    Assignment {
        operator: AssignmentOperator,
        target: Box<Expression>,
        value: Box<Expression>,
        span: Span,
    },

    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
        span: Span,
    },

    Call {
        callee: Box<Expression>,
        arguments: Vec<Element>,
        /// `f?.(x)`
        optional: bool,
        span: Span,
    },

    Member {
        object: Box<Expression>,
        property: MemberProperty,
        /// `a?.b` or `a?.[b]`
        optional: bool,
        span: Span,
    },

    /// Comma operator: `(a, b)`.
    Sequence {
        expressions: Vec<Expression>,
        span: Span,
    },
}

impl Expression {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Identifier(identifier) => identifier.span,
            Self::Literal(_, span) | Self::This(span) => *span,
            Self::Function(function) => function.span,
            Self::Template { span, .. }
            | Self::Regex { span, .. }
            | Self::Array { span, .. }
            | Self::Object { span, .. }
            | Self::Unary { span, .. }
            | Self::Update { span, .. }
            | Self::Binary { span, .. }
            | Self::Logical { span, .. }
            | Self::Assignment { span, .. }
            | Self::Conditional { span, .. }
            | Self::Call { span, .. }
            | Self::Member { span, .. }
            | Self::Sequence { span, .. } => *span,
        }
    }

    /// The ESTree-style tag for this expression.
    #[must_use]
    pub fn node_type(&self) -> &'static str {
        match self {
            Self::Identifier(_) => "Identifier",
            Self::Literal(..) => "Literal",
            Self::This(_) => "ThisExpression",
            Self::Template { .. } => "TemplateLiteral",
            Self::Regex { .. } => "RegexLiteral",
            Self::Array { .. } => "ArrayExpression",
            Self::Object { .. } => "ObjectExpression",
            Self::Function(function) if function.is_arrow => "ArrowFunctionExpression",
            Self::Function(_) => "FunctionExpression",
            Self::Unary { .. } => "UnaryExpression",
            Self::Update { .. } => "UpdateExpression",
            Self::Binary { .. } => "BinaryExpression",
            Self::Logical { .. } => "LogicalExpression",
            Self::Assignment { .. } => "AssignmentExpression",
            Self::Conditional { .. } => "ConditionalExpression",
            Self::Call { .. } => "CallExpression",
            Self::Member { .. } => "MemberExpression",
            Self::Sequence { .. } => "SequenceExpression",
        }
    }

    /// Returns the identifier if this is a bare name.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Self::Identifier(identifier) => Some(identifier),
            _ => None,
        }
    }

    /// Returns the string value if this is a string literal.
    #[must_use]
    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(Literal::String(value), _) => Some(value),
            _ => None,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(EcoString),
}

/// An element of an array literal or an argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Expression(Expression),
    /// `...argument`
    Spread { argument: Expression, span: Span },
    /// An elided array slot: the middle of `[1,,3]`.
    Hole(Span),
}

impl Element {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Expression(expression) => expression.span(),
            Self::Spread { span, .. } | Self::Hole(span) => *span,
        }
    }

    /// The plain expression, if this element is neither a spread nor a hole.
    #[must_use]
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Self::Expression(expression) => Some(expression),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// `key: value` or shorthand `{ key }`.
    KeyValue {
        key: PropertyKey,
        value: Expression,
        shorthand: bool,
        span: Span,
    },
    /// `...argument`
    Spread { argument: Expression, span: Span },
}

impl Property {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::KeyValue { span, .. } | Self::Spread { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// A bare name, including reserved words such as `default` or `if`.
    Named(Identifier),
    /// A string or number key.
    Literal(Literal, Span),
    /// `[expression]`
    Computed(Box<Expression>, Span),
}

impl PropertyKey {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Named(identifier) => identifier.span,
            Self::Literal(_, span) | Self::Computed(_, span) => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `object.name`
    Named(Identifier),
    /// `object[expression]`
    Computed(Box<Expression>),
}

// ============================================================================
// Operators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    BitNot,
    Plus,
    Minus,
    Delete,
}

impl UnaryOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::BitNot => "~",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

impl UpdateOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
}

impl BinaryOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Exponent => "**",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::StrictEqual => "===",
            Self::StrictNotEqual => "!==",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::In => "in",
        }
    }

    /// `+ - * / % **`
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Modulo | Self::Exponent
        )
    }

    /// `& | ^ << >>`
    #[must_use]
    pub const fn is_bitwise(self) -> bool {
        matches!(
            self,
            Self::BitAnd | Self::BitOr | Self::BitXor | Self::ShiftLeft | Self::ShiftRight
        )
    }

    /// Operators whose result is always a boolean.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::StrictEqual
                | Self::StrictNotEqual
                | Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
                | Self::In
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
    NullishCoalescing,
}

impl LogicalOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::NullishCoalescing => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Assign,
    /// `op=` for an arithmetic or bitwise operator.
    Compound(BinaryOperator),
    /// `&&=`, `||=`, `??=`
    Logical(LogicalOperator),
}

impl AssignmentOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Compound(BinaryOperator::Add) => "+=",
            Self::Compound(BinaryOperator::Subtract) => "-=",
            Self::Compound(BinaryOperator::Multiply) => "*=",
            Self::Compound(BinaryOperator::Divide) => "/=",
            Self::Compound(BinaryOperator::Modulo) => "%=",
            Self::Compound(BinaryOperator::Exponent) => "**=",
            Self::Compound(BinaryOperator::ShiftLeft) => "<<=",
            Self::Compound(BinaryOperator::ShiftRight) => ">>=",
            Self::Compound(BinaryOperator::BitAnd) => "&=",
            Self::Compound(BinaryOperator::BitOr) => "|=",
            Self::Compound(BinaryOperator::BitXor) => "^=",
            Self::Compound(_) => "?=",
            Self::Logical(LogicalOperator::And) => "&&=",
            Self::Logical(LogicalOperator::Or) => "||=",
            Self::Logical(LogicalOperator::NullishCoalescing) => "??=",
        }
    }
}
