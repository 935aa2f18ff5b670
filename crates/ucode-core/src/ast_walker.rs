// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shared AST walker for analysis and editor queries.
//!
//! - [`Node`]: a borrowed reference to any node that carries a span.
//! - [`children`]: the direct children of a node, in source order.
//! - [`walk_program`]: pre-order walk calling a visitor on every
//!   parent/child edge.
//! - [`path_at`]: the chain of nodes enclosing a byte offset, outermost
//!   first.
//!
//! Passes that thread scope state through the traversal (the semantic
//! analyzer) keep their own recursion. This module handles the stateless
//! cases.

use crate::ast::{
    Block, Element, ExportDeclaration, Expression, ForInit, Function, FunctionBody, Identifier,
    ImportSpecifier, MemberProperty, Program, Property, PropertyKey, Statement,
};
use crate::source_analysis::Span;

/// A borrowed AST node.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Statement(&'a Statement),
    Expression(&'a Expression),
    Block(&'a Block),
    Identifier(&'a Identifier),
}

impl<'a> Node<'a> {
    #[must_use]
    pub fn span(self) -> Span {
        match self {
            Self::Program(program) => program.span,
            Self::Statement(statement) => statement.span(),
            Self::Expression(expression) => expression.span(),
            Self::Block(block) => block.span,
            Self::Identifier(identifier) => identifier.span,
        }
    }

    #[must_use]
    pub fn node_type(self) -> &'static str {
        match self {
            Self::Program(_) => "Program",
            Self::Statement(statement) => statement.node_type(),
            Self::Expression(expression) => expression.node_type(),
            Self::Block(_) => "BlockStatement",
            Self::Identifier(_) => "Identifier",
        }
    }

    /// The identifier this node names, if it is one.
    #[must_use]
    pub fn as_identifier(self) -> Option<&'a Identifier> {
        match self {
            Self::Identifier(identifier) | Self::Expression(Expression::Identifier(identifier)) => {
                Some(identifier)
            }
            _ => None,
        }
    }
}

// ── Children ──────────────────────────────────────────────────────────────────

/// Returns the direct children of `node` in source order.
#[must_use]
pub fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    match node {
        Node::Program(program) => out.extend(program.body.iter().map(Node::Statement)),
        Node::Block(block) => out.extend(block.body.iter().map(Node::Statement)),
        Node::Identifier(_) => {}
        Node::Statement(statement) => statement_children(statement, &mut out),
        Node::Expression(expression) => expression_children(expression, &mut out),
    }
    out
}

fn statement_children<'a>(statement: &'a Statement, out: &mut Vec<Node<'a>>) {
    match statement {
        Statement::Expression { expression, .. } | Statement::Echo { expression, .. } => {
            out.push(Node::Expression(expression));
        }
        Statement::Variable(declaration) => {
            for declarator in &declaration.declarations {
                out.push(Node::Identifier(&declarator.id));
                out.extend(declarator.init.as_ref().map(Node::Expression));
            }
        }
        Statement::Function(function) => function_children(function, out),
        Statement::If {
            test,
            consequent,
            alternate,
            ..
        } => {
            out.push(Node::Expression(test));
            out.push(Node::Statement(consequent));
            out.extend(alternate.as_deref().map(Node::Statement));
        }
        Statement::While { test, body, .. } => {
            out.push(Node::Expression(test));
            out.push(Node::Statement(body));
        }
        Statement::For {
            init,
            test,
            update,
            body,
            ..
        } => {
            match init {
                Some(ForInit::Declaration(declaration)) => {
                    for declarator in &declaration.declarations {
                        out.push(Node::Identifier(&declarator.id));
                        out.extend(declarator.init.as_ref().map(Node::Expression));
                    }
                }
                Some(ForInit::Expression(expression)) => out.push(Node::Expression(expression)),
                None => {}
            }
            out.extend(test.as_ref().map(Node::Expression));
            out.extend(update.as_ref().map(Node::Expression));
            out.push(Node::Statement(body));
        }
        Statement::ForIn {
            key,
            value,
            object,
            body,
            ..
        } => {
            out.push(Node::Identifier(key));
            out.extend(value.as_ref().map(Node::Identifier));
            out.push(Node::Expression(object));
            out.push(Node::Statement(body));
        }
        Statement::Switch {
            discriminant,
            cases,
            ..
        } => {
            out.push(Node::Expression(discriminant));
            for case in cases {
                out.extend(case.test.as_ref().map(Node::Expression));
                out.extend(case.consequent.iter().map(Node::Statement));
            }
        }
        Statement::Try { block, handler, .. } => {
            out.push(Node::Block(block));
            if let Some(handler) = handler {
                out.extend(handler.param.as_ref().map(Node::Identifier));
                out.push(Node::Block(&handler.body));
            }
        }
        Statement::Return { argument, .. } => {
            out.extend(argument.as_ref().map(Node::Expression));
        }
        Statement::Block(block) => out.extend(block.body.iter().map(Node::Statement)),
        Statement::Import(import) => {
            for specifier in &import.specifiers {
                if let ImportSpecifier::Named { imported, .. } = specifier {
                    if imported.span != specifier.local().span {
                        out.push(Node::Identifier(imported));
                    }
                }
                out.push(Node::Identifier(specifier.local()));
            }
        }
        Statement::Export(export) => match export {
            ExportDeclaration::Declaration { declaration, .. } => {
                out.push(Node::Statement(declaration));
            }
            ExportDeclaration::Named { specifiers, .. } => {
                for specifier in specifiers {
                    out.push(Node::Identifier(&specifier.local));
                }
            }
            ExportDeclaration::Default { expression, .. } => {
                out.push(Node::Expression(expression));
            }
        },
        Statement::Break { .. }
        | Statement::Continue { .. }
        | Statement::Empty { .. }
        | Statement::Text { .. } => {}
    }
}

fn function_children<'a>(function: &'a Function, out: &mut Vec<Node<'a>>) {
    out.extend(function.name.as_ref().map(Node::Identifier));
    out.extend(function.params.iter().map(Node::Identifier));
    out.extend(function.rest.as_ref().map(Node::Identifier));
    match &function.body {
        FunctionBody::Block(block) => out.push(Node::Block(block)),
        FunctionBody::Expression(expression) => out.push(Node::Expression(expression)),
    }
}

fn element_child(element: &Element) -> Option<Node<'_>> {
    match element {
        Element::Expression(expression) | Element::Spread {
            argument: expression,
            ..
        } => Some(Node::Expression(expression)),
        Element::Hole(_) => None,
    }
}

fn expression_children<'a>(expression: &'a Expression, out: &mut Vec<Node<'a>>) {
    match expression {
        Expression::Identifier(_)
        | Expression::Literal(..)
        | Expression::This(_)
        | Expression::Regex { .. } => {}
        Expression::Template { expressions, .. } => {
            out.extend(expressions.iter().map(Node::Expression));
        }
        Expression::Sequence { expressions, .. } => {
            out.extend(expressions.iter().map(Node::Expression));
        }
        Expression::Array { elements, .. } => out.extend(elements.iter().filter_map(element_child)),
        Expression::Object { properties, .. } => {
            for property in properties {
                match property {
                    Property::KeyValue { key, value, .. } => {
                        if let PropertyKey::Computed(key, _) = key {
                            out.push(Node::Expression(key));
                        }
                        out.push(Node::Expression(value));
                    }
                    Property::Spread { argument, .. } => out.push(Node::Expression(argument)),
                }
            }
        }
        Expression::Function(function) => function_children(function, out),
        Expression::Unary { argument, .. } | Expression::Update { argument, .. } => {
            out.push(Node::Expression(argument));
        }
        Expression::Binary { left, right, .. } | Expression::Logical { left, right, .. } => {
            out.push(Node::Expression(left));
            out.push(Node::Expression(right));
        }
        Expression::Assignment { target, value, .. } => {
            out.push(Node::Expression(target));
            out.push(Node::Expression(value));
        }
        Expression::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            out.push(Node::Expression(test));
            out.push(Node::Expression(consequent));
            out.push(Node::Expression(alternate));
        }
        Expression::Call {
            callee, arguments, ..
        } => {
            out.push(Node::Expression(callee));
            out.extend(arguments.iter().filter_map(element_child));
        }
        Expression::Member {
            object, property, ..
        } => {
            out.push(Node::Expression(object));
            match property {
                MemberProperty::Named(name) => out.push(Node::Identifier(name)),
                MemberProperty::Computed(index) => out.push(Node::Expression(index)),
            }
        }
    }
}

// ── Walkers ───────────────────────────────────────────────────────────────────

/// Walks the program in pre-order, calling `f(parent, child)` for every edge.
pub fn walk_program<'a, F>(program: &'a Program, f: &mut F)
where
    F: FnMut(Node<'a>, Node<'a>),
{
    walk_edges(Node::Program(program), f);
}

fn walk_edges<'a, F>(node: Node<'a>, f: &mut F)
where
    F: FnMut(Node<'a>, Node<'a>),
{
    stacker::maybe_grow(32 * 1024, 256 * 1024, || {
        for child in children(node) {
            f(node, child);
            walk_edges(child, f);
        }
    });
}

/// Calls `f` on every node of the program in pre-order, the program first.
pub fn visit_program<'a, F>(program: &'a Program, f: &mut F)
where
    F: FnMut(Node<'a>),
{
    f(Node::Program(program));
    walk_program(program, &mut |_, child| f(child));
}

/// Returns the nodes whose span touches `offset`, outermost first.
///
/// A cursor sitting just past the end of a name still resolves to that
/// name. The last entry is the innermost such node.
#[must_use]
pub fn path_at(program: &Program, offset: u32) -> Vec<Node<'_>> {
    let mut path = vec![Node::Program(program)];
    let mut current = Node::Program(program);
    loop {
        // Prefer a child that strictly contains the offset over one that
        // merely ends at it.
        let candidates = children(current);
        let next = candidates
            .iter()
            .copied()
            .find(|child| child.span().contains_offset(offset))
            .or_else(|| {
                candidates
                    .iter()
                    .copied()
                    .find(|child| child.span().touches_offset(offset))
            });
        match next {
            Some(child) => {
                path.push(child);
                current = child;
            }
            None => return path,
        }
    }
}
