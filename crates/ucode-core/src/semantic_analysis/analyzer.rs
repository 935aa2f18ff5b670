// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The semantic analysis walk.
//!
//! One top-down pass over the program that:
//! - opens and closes scopes and declares every binding (function
//!   declarations are hoisted to the top of their block)
//! - infers a [`ValueType`] for every expression, recorded in a [`TypeMap`]
//! - narrows variable types inside guarded branches and merges the types
//!   a variable may have where branches rejoin
//! - reports undefined, unused, shadowed and redeclared names, assignments
//!   to constants and operator misuse
//! - hands calls to builtins to their validators
//!
//! The walk never stops early; shapes it does not understand are skipped.

use std::collections::{HashMap, HashSet};

use ecow::EcoString;

use super::builtins::{BuiltinRegistry, CallSite, GLOBAL_VALUES, TypeOracle};
use super::narrowing::{Guard, guards_for};
use super::symbol_table::{DeclareOutcome, ScopeKind, SymbolId, SymbolKind, SymbolTable};
use super::types::{
    DataType, UnaryOp, ValueType, can_perform_arithmetic, get_arithmetic_result_type,
    get_bitwise_result_type, get_common_type, get_ternary_result_type, get_unary_result_type,
    may_be, union_of, without,
};
use super::{AnalysisOptions, AnalysisResult};
use crate::ast::{
    AssignmentOperator, BinaryOperator, Block, DeclarationKind, Element, ExportDeclaration,
    Expression, ForInit, Function, FunctionBody, Identifier, ImportDeclaration, ImportSpecifier,
    Literal, LogicalOperator, MemberProperty, Program, Property, PropertyKey, Statement,
    VariableDeclaration,
};
use crate::source_analysis::{Diagnostic, DiagnosticCategory, Span};

// ============================================================================
// Type Map
// ============================================================================

/// Inferred types keyed by expression span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMap {
    types: HashMap<Span, ValueType>,
}

impl TypeMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// The type recorded for the expression or declaration at `span`.
    #[must_use]
    pub fn get(&self, span: Span) -> Option<&ValueType> {
        self.types.get(&span)
    }

    fn insert(&mut self, span: Span, value_type: ValueType) {
        self.types.insert(span, value_type);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeOracle for TypeMap {
    fn type_of(&self, expression: &Expression) -> ValueType {
        self.get(expression.span()).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// A narrowed variable and the type to restore.
#[derive(Debug)]
struct Narrowed {
    symbol: SymbolId,
    previous: ValueType,
    narrowed: ValueType,
}

/// A code region that may or may not run: a branch, a loop body, the
/// right side of `&&`.
#[derive(Debug)]
struct FlowRegion {
    /// Symbols from this id on were declared inside the region.
    first_local: SymbolId,
    /// Type of each outer variable the region changed, as it was on entry.
    before: HashMap<SymbolId, ValueType>,
}

/// An outer variable's type on entry to and exit from a region.
#[derive(Debug)]
struct FlowChange {
    symbol: SymbolId,
    before: ValueType,
    after: ValueType,
}

pub(crate) struct Analyzer<'a> {
    options: &'a AnalysisOptions,
    registry: &'a BuiltinRegistry,
    symbols: SymbolTable,
    type_map: TypeMap,
    diagnostics: Vec<Diagnostic>,
    /// Types of `return` statements, one frame per enclosing function.
    returns: Vec<Vec<ValueType>>,
    /// Return types of function expressions by function span.
    function_returns: HashMap<Span, ValueType>,
    /// Name spans of function declarations already declared by hoisting.
    hoisted: HashSet<Span>,
    /// Narrowings that last until the end of the current statement list.
    block_narrowings: Vec<Vec<Narrowed>>,
    /// Open conditional regions, innermost last.
    flow: Vec<FlowRegion>,
}

impl<'a> Analyzer<'a> {
    pub(crate) fn new(
        program_span: Span,
        options: &'a AnalysisOptions,
        registry: &'a BuiltinRegistry,
    ) -> Self {
        Self {
            options,
            registry,
            symbols: SymbolTable::new(program_span),
            type_map: TypeMap::new(),
            diagnostics: Vec::new(),
            returns: Vec::new(),
            function_returns: HashMap::new(),
            hoisted: HashSet::new(),
            block_narrowings: Vec::new(),
            flow: Vec::new(),
        }
    }

    pub(crate) fn analyze_program(mut self, program: &Program) -> AnalysisResult {
        self.declare_globals();
        self.visit_statements(&program.body);
        self.report_unused();
        AnalysisResult {
            symbol_table: self.symbols,
            diagnostics: self.diagnostics,
            type_map: self.type_map,
        }
    }

    fn declare_globals(&mut self) {
        for name in self.registry.names() {
            let return_type = self.registry.get(name).map(|validator| validator.return_type());
            self.symbols.declare(
                name,
                SymbolKind::Builtin,
                DataType::Function.into(),
                Span::default(),
            );
            if let Some(symbol) = self.symbols.lookup_mut(name) {
                symbol.return_type = return_type;
            }
        }
        for (name, data_type) in GLOBAL_VALUES {
            self.symbols
                .declare(name, SymbolKind::Builtin, (*data_type).into(), Span::default());
        }
        for name in &self.options.extra_globals {
            self.symbols
                .declare(name, SymbolKind::Builtin, ValueType::UNKNOWN, Span::default());
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn error(&mut self, message: String, span: Span, category: DiagnosticCategory) {
        self.diagnostics
            .push(Diagnostic::error(message, span).with_category(category));
    }

    fn warning(&mut self, message: String, span: Span, category: DiagnosticCategory) {
        self.diagnostics
            .push(Diagnostic::warning(message, span).with_category(category));
    }

    fn report_undefined(&mut self, identifier: &Identifier) {
        if self.options.undefined_identifiers {
            self.error(
                format!("'{}' is not defined", identifier.name),
                identifier.span,
                DiagnosticCategory::Undefined,
            );
        }
    }

    fn report_unused(&mut self) {
        if !self.options.unused_variables {
            return;
        }
        let mut unused: Vec<(String, Span)> = self
            .symbols
            .unused_in_current_scope()
            .into_iter()
            .map(|symbol| {
                let message = match symbol.kind {
                    SymbolKind::Function => format!("Function '{}' is declared but never used", symbol.name),
                    SymbolKind::Imported | SymbolKind::Module => {
                        format!("Import '{}' is never used", symbol.name)
                    }
                    _ => format!("Variable '{}' is declared but never used", symbol.name),
                };
                (message, symbol.declared_at)
            })
            .collect();
        unused.sort_by_key(|(_, span)| *span);
        for (message, span) in unused {
            self.warning(message, span, DiagnosticCategory::Unused);
        }
    }

    fn check_arithmetic(
        &mut self,
        operator: BinaryOperator,
        left: &ValueType,
        right: &ValueType,
        span: Span,
    ) {
        if !self.options.type_checking {
            return;
        }
        // `+` concatenates as soon as one side is a string.
        if operator == BinaryOperator::Add
            && (may_be(left, DataType::String) || may_be(right, DataType::String))
        {
            return;
        }
        if !can_perform_arithmetic(left, right) {
            self.error(
                format!("Cannot apply '{}' to {left} and {right}", operator.as_str()),
                span,
                DiagnosticCategory::Type,
            );
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn declare(&mut self, identifier: &Identifier, kind: SymbolKind, data_type: ValueType) {
        self.type_map.insert(identifier.span, data_type.clone());
        match self
            .symbols
            .declare(&identifier.name, kind, data_type, identifier.span)
        {
            DeclareOutcome::Declared => {}
            DeclareOutcome::Redeclared { .. } => self.error(
                format!("'{}' is already declared in this scope", identifier.name),
                identifier.span,
                DiagnosticCategory::Redeclaration,
            ),
            DeclareOutcome::Shadows { .. } => {
                if self.options.shadowing {
                    self.warning(
                        format!("'{}' shadows a declaration in an outer scope", identifier.name),
                        identifier.span,
                        DiagnosticCategory::Shadowing,
                    );
                }
            }
        }
    }

    /// Whether `identifier` is the declaration the current scope chain
    /// resolves its name to.
    fn is_declared_here(&self, identifier: &Identifier) -> bool {
        self.symbols
            .lookup(&identifier.name)
            .is_some_and(|symbol| symbol.declared_at == identifier.span)
    }

    fn hoist_functions(&mut self, statements: &[Statement]) {
        for statement in statements {
            let function = match statement {
                Statement::Function(function) => function,
                Statement::Export(ExportDeclaration::Declaration { declaration, .. }) => {
                    match declaration.as_ref() {
                        Statement::Function(function) => function,
                        _ => continue,
                    }
                }
                _ => continue,
            };
            if let Some(name) = &function.name {
                self.declare(name, SymbolKind::Function, DataType::Function.into());
                self.hoisted.insert(name.span);
            }
        }
    }

    fn mark_exported(&mut self, identifier: &Identifier) {
        match self.symbols.lookup_mut(&identifier.name) {
            Some(symbol) => symbol.exported = true,
            None => self.report_undefined(identifier),
        }
    }

    // ========================================================================
    // Narrowing
    // ========================================================================

    fn narrow(&mut self, guards: &[Guard]) -> Vec<Narrowed> {
        let mut applied = Vec::new();
        for guard in guards {
            let Some(symbol) = self.symbols.resolve(guard.name()) else {
                continue;
            };
            let previous = self.symbols.symbol(symbol).data_type.clone();
            let narrowed = guard.apply(&previous);
            self.set_type(symbol, narrowed.clone());
            applied.push(Narrowed {
                symbol,
                previous,
                narrowed,
            });
        }
        applied
    }

    /// Undoes narrowings. A variable reassigned while narrowed keeps its
    /// assigned type.
    fn restore(&mut self, narrowed: Vec<Narrowed>) {
        for entry in narrowed.into_iter().rev() {
            if self.symbols.symbol(entry.symbol).data_type == entry.narrowed {
                self.set_type(entry.symbol, entry.previous);
            }
        }
    }

    /// Narrows until the end of the enclosing statement list.
    fn narrow_rest_of_block(&mut self, guards: &[Guard]) {
        let narrowed = self.narrow(guards);
        match self.block_narrowings.last_mut() {
            Some(frame) => frame.extend(narrowed),
            None => self.restore(narrowed),
        }
    }

    // ========================================================================
    // Control Flow
    // ========================================================================

    /// Changes the type of a variable. Every open region records the type
    /// the variable had when the region was entered.
    fn set_type(&mut self, symbol: SymbolId, value_type: ValueType) {
        let current = &self.symbols.symbol(symbol).data_type;
        for region in &mut self.flow {
            if symbol < region.first_local {
                region
                    .before
                    .entry(symbol)
                    .or_insert_with(|| current.clone());
            }
        }
        self.symbols.symbol_mut(symbol).data_type = value_type;
    }

    /// Visits one side of a fork under `guards`. The variables it changed
    /// are put back to their entry types; the changes are returned for
    /// [`join`](Self::join).
    fn visit_fork<T>(
        &mut self,
        guards: &[Guard],
        visit: impl FnOnce(&mut Self) -> T,
    ) -> (T, Vec<FlowChange>) {
        self.flow.push(FlowRegion {
            first_local: self.symbols.next_symbol_id(),
            before: HashMap::new(),
        });
        let narrowed = self.narrow(guards);
        let result = visit(self);
        self.restore(narrowed);

        let changes: Vec<FlowChange> = match self.flow.pop() {
            Some(region) => region
                .before
                .into_iter()
                .map(|(symbol, before)| FlowChange {
                    symbol,
                    before,
                    after: self.symbols.symbol(symbol).data_type.clone(),
                })
                .collect(),
            None => Vec::new(),
        };
        for change in &changes {
            self.set_type(change.symbol, change.before.clone());
        }
        (result, changes)
    }

    /// Merges the forks that reach the same point. A variable changed by
    /// any fork gets the union of its exit types; forks that left it alone
    /// contribute its entry type.
    fn join(&mut self, forks: &[Vec<FlowChange>]) {
        let mut entry_types: HashMap<SymbolId, &ValueType> = HashMap::new();
        for change in forks.iter().flatten() {
            entry_types.entry(change.symbol).or_insert(&change.before);
        }
        let joined: Vec<(SymbolId, ValueType)> = entry_types
            .into_iter()
            .map(|(symbol, before)| {
                let exits = forks.iter().map(|fork| {
                    fork.iter()
                        .find(|change| change.symbol == symbol)
                        .map_or(before, |change| &change.after)
                });
                (symbol, union_of(exits))
            })
            .collect();
        for (symbol, value_type) in joined {
            self.set_type(symbol, value_type);
        }
    }

    /// A region that may be skipped entirely.
    fn visit_optional<T>(&mut self, guards: &[Guard], visit: impl FnOnce(&mut Self) -> T) -> T {
        let (result, changes) = self.visit_fork(guards, visit);
        self.join(&[changes, Vec::new()]);
        result
    }

    /// The body of an `if` or loop. Early exits inside it narrow only up to
    /// its end.
    fn visit_branch(&mut self, statement: &Statement) {
        self.block_narrowings.push(Vec::new());
        self.visit_statement(statement);
        if let Some(narrowed) = self.block_narrowings.pop() {
            self.restore(narrowed);
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn visit_statements(&mut self, statements: &[Statement]) {
        self.hoist_functions(statements);
        self.block_narrowings.push(Vec::new());
        for statement in statements {
            self.visit_statement(statement);
        }
        if let Some(narrowed) = self.block_narrowings.pop() {
            self.restore(narrowed);
        }
    }

    fn visit_block(&mut self, block: &Block, kind: ScopeKind) {
        self.symbols.enter_scope(kind, block.span);
        self.visit_statements(&block.body);
        self.report_unused();
        self.symbols.exit_scope();
    }

    fn visit_statement(&mut self, statement: &Statement) {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || self.visit_statement_inner(statement));
    }

    fn visit_statement_inner(&mut self, statement: &Statement) {
        match statement {
            Statement::Expression { expression, .. } | Statement::Echo { expression, .. } => {
                self.visit_expression(expression);
            }
            Statement::Variable(declaration) => self.visit_variable_declaration(declaration),
            Statement::Function(function) => self.visit_function_declaration(function),
            Statement::If {
                test,
                consequent,
                alternate,
                ..
            } => self.visit_if(test, consequent, alternate.as_deref()),
            Statement::While { test, body, .. } => {
                self.visit_expression(test);
                let guards = guards_for(test).when_true;
                self.visit_optional(&guards, |this| this.visit_branch(body));
            }
            Statement::For {
                init,
                test,
                update,
                body,
                span,
            } => {
                self.symbols.enter_scope(ScopeKind::Loop, *span);
                match init {
                    Some(ForInit::Declaration(declaration)) => {
                        self.visit_variable_declaration(declaration);
                    }
                    Some(ForInit::Expression(expression)) => {
                        self.visit_expression(expression);
                    }
                    None => {}
                }
                let guards = match test {
                    Some(test) => {
                        self.visit_expression(test);
                        guards_for(test).when_true
                    }
                    None => Vec::new(),
                };
                self.visit_optional(&guards, |this| {
                    this.visit_branch(body);
                    if let Some(update) = update {
                        this.visit_expression(update);
                    }
                });
                self.report_unused();
                self.symbols.exit_scope();
            }
            Statement::ForIn {
                declaration,
                key,
                value,
                object,
                body,
                span,
            } => self.visit_for_in(*declaration, key, value.as_ref(), object, body, *span),
            Statement::Switch {
                discriminant,
                cases,
                span,
            } => {
                self.visit_expression(discriminant);
                self.symbols.enter_scope(ScopeKind::Switch, *span);
                // Without `default` no case may run.
                let mut forks = Vec::new();
                if cases.iter().all(|case| case.test.is_some()) {
                    forks.push(Vec::new());
                }
                for case in cases {
                    if let Some(test) = &case.test {
                        self.visit_expression(test);
                    }
                    let ((), changes) =
                        self.visit_fork(&[], |this| this.visit_statements(&case.consequent));
                    forks.push(changes);
                }
                self.join(&forks);
                self.report_unused();
                self.symbols.exit_scope();
            }
            Statement::Try { block, handler, .. } => {
                // Either part may stop anywhere.
                self.visit_optional(&[], |this| this.visit_block(block, ScopeKind::Block));
                if let Some(handler) = handler {
                    self.visit_optional(&[], |this| {
                        this.symbols.enter_scope(ScopeKind::Catch, handler.span);
                        if let Some(param) = &handler.param {
                            this.declare(param, SymbolKind::Parameter, DataType::Object.into());
                        }
                        this.visit_statements(&handler.body.body);
                        this.report_unused();
                        this.symbols.exit_scope();
                    });
                }
            }
            Statement::Return { argument, .. } => {
                let value_type = match argument {
                    Some(argument) => self.visit_expression(argument),
                    None => ValueType::NULL,
                };
                if let Some(frame) = self.returns.last_mut() {
                    frame.push(value_type);
                }
            }
            Statement::Block(block) => self.visit_block(block, ScopeKind::Block),
            Statement::Import(import) => self.visit_import(import),
            Statement::Export(export) => self.visit_export(export),
            Statement::Break { .. }
            | Statement::Continue { .. }
            | Statement::Empty { .. }
            | Statement::Text { .. } => {}
        }
    }

    fn visit_variable_declaration(&mut self, declaration: &VariableDeclaration) {
        let kind = match declaration.kind {
            DeclarationKind::Let => SymbolKind::Variable,
            DeclarationKind::Const => SymbolKind::Constant,
        };
        for declarator in &declaration.declarations {
            let data_type = match &declarator.init {
                Some(init) => self.visit_expression(init),
                None => ValueType::UNKNOWN,
            };
            self.declare(&declarator.id, kind, data_type);
            if let Some(Expression::Function(function)) = &declarator.init {
                let return_type = self.function_returns.get(&function.span).cloned();
                if self.is_declared_here(&declarator.id) {
                    if let Some(symbol) = self.symbols.lookup_mut(&declarator.id.name) {
                        symbol.return_type = return_type;
                    }
                }
            }
        }
    }

    fn visit_function_declaration(&mut self, function: &Function) {
        let Some(name) = &function.name else {
            self.visit_function(function);
            return;
        };
        // Declarations outside a statement list (`if (x) function f() {}`)
        // were not hoisted.
        if !self.hoisted.contains(&name.span) {
            self.declare(name, SymbolKind::Function, DataType::Function.into());
        }
        let return_type = self.visit_function(function);
        if self.is_declared_here(name) {
            if let Some(symbol) = self.symbols.lookup_mut(&name.name) {
                symbol.return_type = Some(return_type);
            }
        }
    }

    /// Analyzes parameters and body in a new scope; returns the inferred
    /// return type.
    fn visit_function(&mut self, function: &Function) -> ValueType {
        self.symbols.enter_scope(ScopeKind::Function, function.span);
        for param in &function.params {
            self.declare(param, SymbolKind::Parameter, ValueType::UNKNOWN);
        }
        if let Some(rest) = &function.rest {
            self.declare(rest, SymbolKind::Parameter, DataType::Array.into());
        }

        self.returns.push(Vec::new());
        let body_type = match &function.body {
            FunctionBody::Block(block) => {
                self.visit_statements(&block.body);
                None
            }
            FunctionBody::Expression(expression) => Some(self.visit_expression(expression)),
        };
        let returns = self.returns.pop().unwrap_or_default();

        self.report_unused();
        self.symbols.exit_scope();

        let return_type = body_type.unwrap_or_else(|| get_common_type(&returns));
        self.function_returns.insert(function.span, return_type.clone());
        return_type
    }

    fn visit_if(&mut self, test: &Expression, consequent: &Statement, alternate: Option<&Statement>) {
        self.visit_expression(test);
        let guards = guards_for(test);

        let ((), consequent_changes) =
            self.visit_fork(&guards.when_true, |this| this.visit_branch(consequent));
        let alternate_changes = match alternate {
            Some(alternate) => {
                let ((), changes) =
                    self.visit_fork(&guards.when_false, |this| this.visit_branch(alternate));
                changes
            }
            None => Vec::new(),
        };

        // Only branches that fall through reach the next statement, and
        // when just one does, its facts hold afterwards.
        let consequent_exits = always_exits(consequent);
        let alternate_exits = alternate.is_some_and(always_exits);
        match (consequent_exits, alternate_exits) {
            (true, false) => self.join(&[alternate_changes]),
            (false, true) => self.join(&[consequent_changes]),
            _ => self.join(&[consequent_changes, alternate_changes]),
        }
        match (consequent_exits, alternate_exits) {
            (true, false) => self.narrow_rest_of_block(&guards.when_false),
            (false, true) => self.narrow_rest_of_block(&guards.when_true),
            _ => {}
        }
    }

    fn visit_for_in(
        &mut self,
        declaration: Option<DeclarationKind>,
        key: &Identifier,
        value: Option<&Identifier>,
        object: &Expression,
        body: &Statement,
        span: Span,
    ) {
        let object_type = self.visit_expression(object);
        self.symbols.enter_scope(ScopeKind::Loop, span);
        self.visit_optional(&[], |this| {
            this.visit_for_in_body(declaration, key, value, &object_type, body);
        });
        self.report_unused();
        self.symbols.exit_scope();
    }

    /// Binds the loop variables and visits the body of a `for-in` loop.
    fn visit_for_in_body(
        &mut self,
        declaration: Option<DeclarationKind>,
        key: &Identifier,
        value: Option<&Identifier>,
        object_type: &ValueType,
        body: &Statement,
    ) {
        // `for (x in array)` walks values; `for (i, x in array)` adds the index.
        let (key_type, value_type) = match object_type.as_single() {
            Some(DataType::Object) => (DataType::String.into(), ValueType::UNKNOWN),
            Some(DataType::Array) if value.is_some() => (DataType::Integer.into(), ValueType::UNKNOWN),
            _ => (ValueType::UNKNOWN, ValueType::UNKNOWN),
        };

        match declaration {
            Some(kind) => {
                let kind = match kind {
                    DeclarationKind::Let => SymbolKind::Variable,
                    DeclarationKind::Const => SymbolKind::Constant,
                };
                self.declare(key, kind, key_type);
                if let Some(value) = value {
                    self.declare(value, kind, value_type);
                }
            }
            None => {
                self.assign_identifier(key, key_type);
                if let Some(value) = value {
                    self.assign_identifier(value, value_type);
                }
            }
        }

        self.visit_branch(body);
    }

    fn visit_import(&mut self, import: &ImportDeclaration) {
        for specifier in &import.specifiers {
            let (kind, data_type, imported): (SymbolKind, ValueType, EcoString) = match specifier {
                ImportSpecifier::Named { imported, .. } => {
                    (SymbolKind::Imported, ValueType::UNKNOWN, imported.name.clone())
                }
                ImportSpecifier::Default { .. } => {
                    (SymbolKind::Imported, ValueType::UNKNOWN, "default".into())
                }
                ImportSpecifier::Namespace { .. } => {
                    (SymbolKind::Module, DataType::Object.into(), "*".into())
                }
            };
            let local = specifier.local();
            self.declare(local, kind, data_type);
            if self.is_declared_here(local) {
                if let Some(symbol) = self.symbols.lookup_mut(&local.name) {
                    symbol.imported_from = Some(import.source.clone());
                    symbol.import_specifier = Some(imported);
                }
            }
        }
    }

    fn visit_export(&mut self, export: &ExportDeclaration) {
        match export {
            ExportDeclaration::Declaration { declaration, .. } => {
                self.visit_statement(declaration);
                match declaration.as_ref() {
                    Statement::Variable(variables) => {
                        for declarator in &variables.declarations {
                            self.mark_exported(&declarator.id);
                        }
                    }
                    Statement::Function(Function { name: Some(name), .. }) => {
                        self.mark_exported(name);
                    }
                    _ => {}
                }
            }
            ExportDeclaration::Named { specifiers, .. } => {
                for specifier in specifiers {
                    if let Some(data_type) = self.symbols.type_of(&specifier.local.name).cloned() {
                        self.type_map.insert(specifier.local.span, data_type);
                    }
                    self.mark_exported(&specifier.local);
                }
            }
            ExportDeclaration::Default { expression, .. } => {
                self.visit_expression(expression);
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn visit_expression(&mut self, expression: &Expression) -> ValueType {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            let value_type = self.visit_expression_inner(expression);
            self.type_map.insert(expression.span(), value_type.clone());
            value_type
        })
    }

    fn visit_expression_inner(&mut self, expression: &Expression) -> ValueType {
        match expression {
            Expression::Identifier(identifier) => self.visit_identifier(identifier),
            Expression::Literal(literal, _) => literal_type(literal).into(),
            Expression::This(_) => ValueType::UNKNOWN,
            Expression::Template { expressions, .. } => {
                for part in expressions {
                    self.visit_expression(part);
                }
                DataType::String.into()
            }
            Expression::Regex { .. } => DataType::Regex.into(),
            Expression::Array { elements, .. } => {
                for element in elements {
                    self.visit_element(element);
                }
                DataType::Array.into()
            }
            Expression::Object { properties, .. } => {
                for property in properties {
                    match property {
                        Property::KeyValue { key, value, .. } => {
                            if let PropertyKey::Computed(key, _) = key {
                                self.visit_expression(key);
                            }
                            self.visit_expression(value);
                        }
                        Property::Spread { argument, .. } => {
                            self.visit_expression(argument);
                        }
                    }
                }
                DataType::Object.into()
            }
            Expression::Function(function) => {
                self.visit_function_expression(function);
                DataType::Function.into()
            }
            Expression::Unary {
                operator, argument, ..
            } => {
                let operand = self.visit_expression(argument);
                match UnaryOp::from_unary(*operator) {
                    Some(operator) => get_unary_result_type(operator, &operand),
                    None => ValueType::UNKNOWN,
                }
            }
            Expression::Update {
                operator, argument, ..
            } => {
                let operand = self.visit_expression(argument);
                let result = get_unary_result_type(UnaryOp::from_update(*operator), &operand);
                if let Expression::Identifier(identifier) = argument.as_ref() {
                    self.write_identifier(identifier, &result);
                }
                result
            }
            Expression::Binary {
                operator,
                left,
                right,
                span,
            } => {
                let left = self.visit_expression(left);
                let right = self.visit_expression(right);
                if operator.is_arithmetic() {
                    self.check_arithmetic(*operator, &left, &right, *span);
                    get_arithmetic_result_type(&left, &right, *operator)
                } else if operator.is_bitwise() {
                    get_bitwise_result_type(&left, &right)
                } else {
                    DataType::Boolean.into()
                }
            }
            Expression::Logical {
                operator,
                left,
                right,
                ..
            } => self.visit_logical(*operator, left, right),
            Expression::Assignment {
                operator,
                target,
                value,
                span,
            } => self.visit_assignment(*operator, target, value, *span),
            Expression::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.visit_expression(test);
                let guards = guards_for(test);
                let (consequent, consequent_changes) =
                    self.visit_fork(&guards.when_true, |this| this.visit_expression(consequent));
                let (alternate, alternate_changes) =
                    self.visit_fork(&guards.when_false, |this| this.visit_expression(alternate));
                self.join(&[consequent_changes, alternate_changes]);
                get_ternary_result_type(&consequent, &alternate)
            }
            Expression::Call {
                callee,
                arguments,
                span,
                ..
            } => self.visit_call(callee, arguments, *span),
            Expression::Member {
                object, property, ..
            } => self.visit_member(object, property),
            Expression::Sequence { expressions, .. } => {
                let mut last = ValueType::UNKNOWN;
                for part in expressions {
                    last = self.visit_expression(part);
                }
                last
            }
        }
    }

    fn visit_element(&mut self, element: &Element) {
        match element {
            Element::Expression(expression) | Element::Spread { argument: expression, .. } => {
                self.visit_expression(expression);
            }
            Element::Hole(_) => {}
        }
    }

    fn visit_identifier(&mut self, identifier: &Identifier) -> ValueType {
        match self.symbols.lookup_mut(&identifier.name) {
            Some(symbol) => {
                symbol.used = true;
                symbol.data_type.clone()
            }
            None => {
                self.report_undefined(identifier);
                ValueType::UNKNOWN
            }
        }
    }

    /// Named function expressions can call themselves by name.
    fn visit_function_expression(&mut self, function: &Function) {
        match &function.name {
            Some(name) => {
                self.symbols.enter_scope(ScopeKind::Block, function.span);
                self.declare(name, SymbolKind::Function, DataType::Function.into());
                self.symbols.mark_used(&name.name);
                self.visit_function(function);
                self.symbols.exit_scope();
            }
            None => {
                self.visit_function(function);
            }
        }
    }

    /// A binding written without `let`: `for (k in o)` or an assignment.
    fn assign_identifier(&mut self, identifier: &Identifier, value_type: ValueType) {
        self.type_map.insert(identifier.span, value_type.clone());
        if self.symbols.lookup(&identifier.name).is_none() {
            self.report_undefined(identifier);
            return;
        }
        self.write_identifier(identifier, &value_type);
    }

    /// Records a new type for a declared variable, rejecting constants.
    fn write_identifier(&mut self, identifier: &Identifier, value_type: &ValueType) {
        let Some(symbol) = self.symbols.resolve(&identifier.name) else {
            return;
        };
        if self.symbols.symbol(symbol).kind == SymbolKind::Constant {
            let message = format!("Cannot assign to constant '{}'", identifier.name);
            self.error(message, identifier.span, DiagnosticCategory::Constant);
            return;
        }
        self.set_type(symbol, value_type.clone());
    }

    fn visit_assignment(
        &mut self,
        operator: AssignmentOperator,
        target: &Expression,
        value: &Expression,
        span: Span,
    ) -> ValueType {
        let value_type = self.visit_expression(value);
        let Expression::Identifier(identifier) = target else {
            self.visit_expression(target);
            return value_type;
        };

        let Some(current) = self.symbols.type_of(&identifier.name).cloned() else {
            self.report_undefined(identifier);
            return value_type;
        };
        let result = match operator {
            AssignmentOperator::Assign => value_type,
            AssignmentOperator::Compound(binary) if binary.is_arithmetic() => {
                self.check_arithmetic(binary, &current, &value_type, span);
                get_arithmetic_result_type(&current, &value_type, binary)
            }
            AssignmentOperator::Compound(_) => get_bitwise_result_type(&current, &value_type),
            AssignmentOperator::Logical(LogicalOperator::NullishCoalescing) => {
                union_of([&without(&current, DataType::Null), &value_type])
            }
            AssignmentOperator::Logical(_) => union_of([&current, &value_type]),
        };
        self.type_map.insert(identifier.span, result.clone());
        self.write_identifier(identifier, &result);
        result
    }

    fn visit_logical(
        &mut self,
        operator: LogicalOperator,
        left: &Expression,
        right: &Expression,
    ) -> ValueType {
        let left_type = self.visit_expression(left);
        // The right side only runs when the left side allows it.
        let facts = match operator {
            LogicalOperator::And => guards_for(left).when_true,
            LogicalOperator::Or => guards_for(left).when_false,
            LogicalOperator::NullishCoalescing => Vec::new(),
        };
        let right_type = self.visit_optional(&facts, |this| this.visit_expression(right));

        match operator {
            LogicalOperator::NullishCoalescing => {
                union_of([&without(&left_type, DataType::Null), &right_type])
            }
            LogicalOperator::And | LogicalOperator::Or => union_of([&left_type, &right_type]),
        }
    }

    fn visit_call(&mut self, callee: &Expression, arguments: &[Element], span: Span) -> ValueType {
        let callee_type = self.visit_expression(callee);
        for argument in arguments {
            self.visit_element(argument);
        }

        let symbol = callee
            .as_identifier()
            .and_then(|identifier| self.symbols.lookup(&identifier.name))
            .map(|symbol| (symbol.kind, symbol.return_type.clone()));

        if self.options.type_checking && !may_be(&callee_type, DataType::Function) {
            let message = match callee.as_identifier() {
                Some(identifier) => format!("'{}' is not a function ({callee_type})", identifier.name),
                None => format!("Value of type {callee_type} is not callable"),
            };
            self.error(message, callee.span(), DiagnosticCategory::Type);
            return ValueType::UNKNOWN;
        }

        let Some((kind, return_type)) = symbol else {
            return ValueType::UNKNOWN;
        };
        if kind == SymbolKind::Builtin && self.options.type_checking {
            if let Some(identifier) = callee.as_identifier() {
                let call = CallSite::new(&identifier.name, arguments, span);
                self.registry
                    .validate(&call, &self.type_map, &mut self.diagnostics);
            }
        }
        return_type.unwrap_or_default()
    }

    fn visit_member(&mut self, object: &Expression, property: &MemberProperty) -> ValueType {
        let object_type = self.visit_expression(object);
        if let MemberProperty::Computed(index) = property {
            self.visit_expression(index);
        }

        let property_less = !object_type.is_unknown()
            && object_type
                .members()
                .iter()
                .all(|member| member.is_property_less());
        if self.options.type_checking && property_less {
            let message = match property {
                MemberProperty::Named(name) => {
                    format!("Cannot read property '{}' of {object_type}", name.name)
                }
                MemberProperty::Computed(_) => format!("Cannot index a value of type {object_type}"),
            };
            self.warning(message, object.span(), DiagnosticCategory::Type);
        }

        match (property, object_type.as_single()) {
            (MemberProperty::Computed(_), Some(DataType::String)) => {
                union_of(&[
                    ValueType::from(DataType::String),
                    ValueType::from(DataType::Null),
                ])
            }
            _ => ValueType::UNKNOWN,
        }
    }
}

fn literal_type(literal: &Literal) -> DataType {
    match literal {
        Literal::Null => DataType::Null,
        Literal::Boolean(_) => DataType::Boolean,
        Literal::Integer(_) => DataType::Integer,
        Literal::Double(_) => DataType::Double,
        Literal::String(_) => DataType::String,
    }
}

/// Control never continues past `statement`.
fn always_exits(statement: &Statement) -> bool {
    match statement {
        Statement::Return { .. } | Statement::Break { .. } | Statement::Continue { .. } => true,
        Statement::Expression {
            expression: Expression::Call { callee, .. },
            ..
        } => callee
            .as_identifier()
            .is_some_and(|identifier| matches!(identifier.name.as_str(), "die" | "exit")),
        Statement::Block(block) => block.body.iter().any(always_exits),
        Statement::If {
            consequent,
            alternate: Some(alternate),
            ..
        } => always_exits(consequent) && always_exits(alternate),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic_analysis::analyze;
    use crate::source_analysis::{Severity, parse_source};

    fn analyze_source(source: &str) -> AnalysisResult {
        let output = parse_source(source);
        assert!(
            output.diagnostics.is_empty(),
            "unexpected syntax errors: {:?}",
            output.diagnostics
        );
        analyze(&output.program.unwrap(), &AnalysisOptions::default())
    }

    fn messages(source: &str) -> Vec<String> {
        analyze_source(source)
            .diagnostics
            .iter()
            .map(|d| d.message.to_string())
            .collect()
    }

    fn type_at(result: &AnalysisResult, source: &str, needle: &str) -> ValueType {
        let start = u32::try_from(source.rfind(needle).unwrap()).unwrap();
        let span = Span::new(start, start + u32::try_from(needle.len()).unwrap());
        result.type_map.get(span).cloned().unwrap_or_default()
    }

    fn string_or_null() -> ValueType {
        union_of(&[
            ValueType::from(DataType::String),
            ValueType::from(DataType::Null),
        ])
    }

    // ------------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------------

    #[test]
    fn inner_block_declaration_is_invisible_outside() {
        let source = "let x = 1; { let x = \"s\"; print(x); } print(x);";
        let result = analyze_source(source);
        let inner = source.find("x);").unwrap();
        let outer = source.rfind("x);").unwrap();
        let at = |offset: usize| {
            result
                .symbol_table
                .lookup_at("x", u32::try_from(offset).unwrap())
                .map(|symbol| symbol.data_type.clone())
        };
        assert_eq!(at(inner), Some(DataType::String.into()));
        assert_eq!(at(outer), Some(DataType::Integer.into()));
        assert_eq!(
            result.diagnostics[0].message,
            "'x' shadows a declaration in an outer scope"
        );
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn undefined_identifier_is_an_error() {
        let result = analyze_source("print(missing);");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "'missing' is not defined");
        assert_eq!(result.diagnostics[0].severity, Severity::Error);
        assert_eq!(result.diagnostics[0].span, Span::new(6, 13));
    }

    #[test]
    fn functions_are_hoisted() {
        assert!(messages("print(twice(2)); function twice(n) { return n * 2; }").is_empty());
    }

    #[test]
    fn redeclaration_in_same_scope() {
        assert_eq!(
            messages("let a = 1; let a = 2; print(a);"),
            vec!["'a' is already declared in this scope"]
        );
        assert_eq!(
            messages("function f() {} function f() {} f();"),
            vec!["'f' is already declared in this scope"]
        );
    }

    #[test]
    fn redefining_a_builtin_is_silent() {
        assert!(messages("function print(x) { return x; } print(1);").is_empty());
    }

    #[test]
    fn unused_variables_and_exemptions() {
        assert_eq!(
            messages("let a = 1; let _b = 2; function f(unused) {} export let c = 3;"),
            vec![
                "Variable 'a' is declared but never used",
                "Function 'f' is declared but never used"
            ]
        );
        assert_eq!(
            messages("import { read } from \"fs\";"),
            vec!["Import 'read' is never used"]
        );
    }

    #[test]
    fn unused_inner_variables_are_reported_at_scope_exit() {
        assert_eq!(
            messages("function f() { let tmp = 1; } f();"),
            vec!["Variable 'tmp' is declared but never used"]
        );
    }

    #[test]
    fn options_silence_checks() {
        let program = parse_source("let a = 1; { let a = 2; } print(b);").program.unwrap();
        let options = AnalysisOptions {
            unused_variables: false,
            shadowing: false,
            undefined_identifiers: false,
            ..AnalysisOptions::default()
        };
        assert!(analyze(&program, &options).diagnostics.is_empty());

        let options = AnalysisOptions {
            extra_globals: vec!["b".into()],
            unused_variables: false,
            ..AnalysisOptions::default()
        };
        assert_eq!(analyze(&program, &options).diagnostics.len(), 1);
    }

    #[test]
    fn catch_parameter_and_loop_variables() {
        assert!(messages("try { die(\"x\"); } catch (e) { print(e.message); }").is_empty());
        assert!(messages("for (let k, v in { a: 1 }) print(k, v);").is_empty());
        assert!(messages("for (let i = 0; i < 3; i++) print(i);").is_empty());
    }

    #[test]
    fn for_in_without_declaration_needs_an_existing_variable() {
        assert_eq!(
            messages("for (k in [1]) print(k);"),
            vec!["'k' is not defined", "'k' is not defined"]
        );
    }

    #[test]
    fn imports_record_their_origin() {
        let result = analyze_source("import { readfile as rf } from \"fs\"; rf(\"/x\");");
        let symbol = result
            .symbol_table
            .all_symbols()
            .into_iter()
            .find(|symbol| symbol.name == "rf")
            .unwrap();
        assert_eq!(symbol.kind, SymbolKind::Imported);
        assert_eq!(symbol.imported_from.as_deref(), Some("fs"));
        assert_eq!(symbol.import_specifier.as_deref(), Some("readfile"));
    }

    #[test]
    fn exporting_an_undefined_name() {
        assert_eq!(messages("export { nope };"), vec!["'nope' is not defined"]);
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    #[test]
    fn constants_cannot_be_reassigned() {
        assert_eq!(
            messages("const k = 1; k = 2; k++;"),
            vec!["Cannot assign to constant 'k'", "Cannot assign to constant 'k'"]
        );
    }

    #[test]
    fn arithmetic_on_incompatible_operands() {
        assert_eq!(
            messages("let s = \"a\"; let n = s - 1; print(n);"),
            vec!["Cannot apply '-' to string and integer"]
        );
        assert_eq!(
            messages("let s = \"a\" + 1; print(s * 1.5 + 2);"),
            vec!["Cannot apply '*' to string and double"]
        );
        assert!(messages("let t = \"a\" + 1; print(t);").is_empty());
    }

    #[test]
    fn inferred_expression_types() {
        let source = "let a = 1 + 2.5; let b = \"x\" + 1; let c = 7 & 3; let d = !a; print(a, b, c, d);";
        let result = analyze_source(source);
        assert_eq!(type_at(&result, source, "1 + 2.5"), DataType::Double.into());
        assert_eq!(type_at(&result, source, "\"x\" + 1"), DataType::String.into());
        assert_eq!(type_at(&result, source, "7 & 3"), DataType::Integer.into());
        assert_eq!(type_at(&result, source, "!a"), DataType::Boolean.into());
    }

    #[test]
    fn calling_a_non_function() {
        assert_eq!(
            messages("let n = 1; n();"),
            vec!["'n' is not a function (integer)"]
        );
    }

    #[test]
    fn property_access_on_scalars_warns() {
        let result = analyze_source("let n = 5; print(n.size, n[0]);");
        let found: Vec<&str> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            found,
            vec![
                "Cannot read property 'size' of integer",
                "Cannot index a value of type integer"
            ]
        );
        assert!(result.diagnostics.iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn type_checking_off_silences_type_errors() {
        let program = parse_source("let n = 1; n(); print(length(1), \"a\" - 1);").program.unwrap();
        let options = AnalysisOptions {
            type_checking: false,
            ..AnalysisOptions::default()
        };
        assert!(analyze(&program, &options).diagnostics.is_empty());
    }

    #[test]
    fn function_return_types_flow_into_calls() {
        let source = "function f(a) { if (a) return 1; return 2.5; } let g = (x) => \"s\"; let r = f(1); let s = g(1); print(r, s);";
        let result = analyze_source(source);
        assert_eq!(type_at(&result, source, "f(1)"), DataType::Double.into());
        assert_eq!(type_at(&result, source, "g(1)"), DataType::String.into());
    }

    #[test]
    fn function_without_return_yields_null() {
        let source = "function f() { print(1); } let r = f(); print(r);";
        let result = analyze_source(source);
        assert_eq!(type_at(&result, source, "f()"), ValueType::NULL);
    }

    #[test]
    fn builtin_return_types() {
        let source = "let parts = split(\"a b\", \" \"); print(parts);";
        let result = analyze_source(source);
        assert_eq!(
            type_at(&result, source, "split(\"a b\", \" \")"),
            DataType::Array.into()
        );
    }

    // ------------------------------------------------------------------------
    // Narrowing
    // ------------------------------------------------------------------------

    #[test]
    fn type_guard_narrows_then_branch() {
        let source = "let v = ARGV[0] ? \"s\" : null; if (type(v) == \"string\") { print(v); } else { print(v); }";
        let result = analyze_source(source);
        let then_use = source.find("print(v)").unwrap() + 6;
        let else_use = source.rfind("print(v)").unwrap() + 6;
        let at = |offset: usize| {
            let start = u32::try_from(offset).unwrap();
            result.type_map.get(Span::new(start, start + 1)).cloned()
        };
        assert_eq!(at(then_use), Some(DataType::String.into()));
        assert_eq!(at(else_use), Some(DataType::Null.into()));
    }

    #[test]
    fn narrowing_is_undone_after_the_branch() {
        let source = "let v = ARGV[0] ? \"s\" : null; if (v != null) { print(v); } print(v);";
        let result = analyze_source(source);
        let inside = source.find("print(v)").unwrap() + 6;
        let after = source.rfind("print(v)").unwrap() + 6;
        let at = |offset: usize| {
            let start = u32::try_from(offset).unwrap();
            result.type_map.get(Span::new(start, start + 1)).cloned()
        };
        assert_eq!(at(inside), Some(DataType::String.into()));
        assert_eq!(at(after), Some(string_or_null()));
    }

    #[test]
    fn early_exit_narrows_the_rest_of_the_block() {
        let source = "function f() { let v = ARGV[0] ? \"s\" : null; if (v == null) return 0; return length(v); } f();";
        let result = analyze_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let use_site = source.rfind("(v)").unwrap() + 1;
        let start = u32::try_from(use_site).unwrap();
        assert_eq!(
            result.type_map.get(Span::new(start, start + 1)),
            Some(&ValueType::from(DataType::String))
        );
    }

    #[test]
    fn logical_and_narrows_right_operand() {
        let source = "let v = ARGV[0] ? \"s\" : null; print(v && v.length);";
        assert!(messages(source).is_empty());
        let source = "let n = 5; let m = type(n) == \"string\" && n.size; print(m);";
        assert!(messages(source).is_empty());
    }

    #[test]
    fn nullish_assignment_removes_null() {
        let source = "let v = ARGV[0] ? \"s\" : null; v ??= \"default\"; print(v);";
        let result = analyze_source(source);
        let use_site = source.rfind("v)").unwrap();
        let start = u32::try_from(use_site).unwrap();
        assert_eq!(
            result.type_map.get(Span::new(start, start + 1)),
            Some(&ValueType::from(DataType::String))
        );
    }

    // ------------------------------------------------------------------------
    // Joins
    // ------------------------------------------------------------------------

    /// Type of the one-character identifier starting the last `needle`.
    fn variable_type_at(result: &AnalysisResult, source: &str, needle: &str) -> ValueType {
        let start = u32::try_from(source.rfind(needle).unwrap()).unwrap();
        result
            .type_map
            .get(Span::new(start, start + 1))
            .cloned()
            .unwrap_or_default()
    }

    fn integer_or_string() -> ValueType {
        union_of(&[
            ValueType::from(DataType::Integer),
            ValueType::from(DataType::String),
        ])
    }

    #[test]
    fn assignment_in_if_without_else_keeps_the_old_type() {
        let source = "let v = 1; if (ARGV[0]) v = \"a\"; print(v - 1);";
        let result = analyze_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(variable_type_at(&result, source, "v - 1"), integer_or_string());

        assert!(messages("let f = print; if (ARGV[0]) f = 1; f(2);").is_empty());
    }

    #[test]
    fn assignment_in_both_branches_replaces_the_old_type() {
        let source = "let v = null; if (ARGV[0]) v = \"a\"; else v = [1]; print(length(v));";
        let result = analyze_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(
            variable_type_at(&result, source, "v))"),
            union_of(&[
                ValueType::from(DataType::String),
                ValueType::from(DataType::Array),
            ])
        );
    }

    #[test]
    fn assignment_in_exiting_branch_does_not_flow_on() {
        let source = "function f() { let v = 1; if (ARGV[0]) { v = \"a\"; return v; } return v - 1; } f();";
        let result = analyze_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(
            variable_type_at(&result, source, "v - 1"),
            DataType::Integer.into()
        );
    }

    #[test]
    fn assignment_in_loop_body_may_not_happen() {
        let source = "let v = 1; while (ARGV[0]) { v = \"a\"; } print(v * 2);";
        let result = analyze_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(variable_type_at(&result, source, "v * 2"), integer_or_string());

        assert!(messages("let v = 1; for (let i = 0; i < 2; i++) v = \"a\"; print(v - 1);").is_empty());
        assert!(messages("let k = 1; for (k in { a: 1 }) print(k); print(k - 1);").is_empty());
    }

    #[test]
    fn conditional_expressions_and_switch_join() {
        assert!(messages("let v = 1; ARGV[0] && (v = \"a\"); print(v - 1);").is_empty());
        assert!(
            messages("let v = 1; switch (ARGV[0]) { case \"a\": v = \"s\"; break; } print(v - 1);")
                .is_empty()
        );
        assert_eq!(
            messages("let v = 1; switch (ARGV[0]) { default: v = \"s\"; } print(v - 1);"),
            vec!["Cannot apply '-' to string and integer"]
        );
    }

    #[test]
    fn early_exit_in_nested_body_stays_inside_it() {
        let source = "function f() { let v = ARGV[0] ? \"s\" : null; if (ARGV[1]) if (v != null) return 0; return length(v); } f();";
        let result = analyze_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(variable_type_at(&result, source, "v);"), string_or_null());

        let source = "function f() { let v = ARGV[0] ? \"s\" : null; while (ARGV[1]) if (v != null) break; return length(v); } f();";
        let result = analyze_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(variable_type_at(&result, source, "v);"), string_or_null());
    }

    // ------------------------------------------------------------------------
    // Builtins
    // ------------------------------------------------------------------------

    #[test]
    fn builtin_calls_are_validated() {
        assert_eq!(
            messages("print(length(\"a\", \"b\"));"),
            vec!["length() expects 1 argument, got 2"]
        );
        assert_eq!(
            messages("signal(\"SIGFOO\");"),
            vec!["Invalid signal name 'SIGFOO'"]
        );
    }

    #[test]
    fn validators_see_narrowed_types() {
        let source = "function f(x) { if (type(x) == \"int\") return length(x); return 0; } f(1);";
        assert_eq!(
            messages(source),
            vec!["Argument 1 of length() must be string, array or object, got integer"]
        );
    }

    #[test]
    fn shadowed_builtins_are_not_validated() {
        assert!(messages("function f(length) { return length(1, 2, 3); } f(print);").is_empty());
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let source = format!("let x = {}1{};print(x);", "(".repeat(200), ")".repeat(200));
        assert!(messages(&source).is_empty());
    }
}
