// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Scoped symbol table for semantic analysis.
//!
//! Scopes live in an arena and point at their parent by index, so lookup
//! walks a finite chain whose length is the source nesting depth. Exited
//! scopes stay in the arena; after analysis the table can still answer
//! "what does this name mean at this offset" for editor queries.
//!
//! Scope kinds mirror ucode's block structure:
//! - Global (the whole document, including builtins)
//! - Function (parameters and body)
//! - Block, Loop, Catch and Switch bodies

use std::collections::HashMap;

use ecow::EcoString;

use super::types::ValueType;
use crate::source_analysis::Span;

/// Index of a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Index of a symbol in the arena. Later declarations have larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
    Loop,
    Catch,
    Switch,
}

/// One lexical scope.
#[derive(Debug, Clone)]
pub struct ScopeRecord {
    pub kind: ScopeKind,
    pub span: Span,
    pub parent: Option<ScopeId>,
    /// 0 for the global scope.
    pub depth: usize,
    /// Name to index into the symbol arena.
    names: HashMap<EcoString, usize>,
    /// Every symbol declared here, in declaration order.
    declared: Vec<usize>,
}

/// What a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Parameter,
    Function,
    Imported,
    /// A namespace import (`import * as fs from "fs"`).
    Module,
    Builtin,
}

impl SymbolKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Parameter => "parameter",
            Self::Function => "function",
            Self::Imported => "imported",
            Self::Module => "module",
            Self::Builtin => "builtin",
        }
    }
}

/// A declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: EcoString,
    pub kind: SymbolKind,
    pub data_type: ValueType,
    /// The declaring identifier; an empty span for builtins.
    pub declared_at: Span,
    /// Module path for imported symbols.
    pub imported_from: Option<EcoString>,
    /// The exported name an import binds, when it differs from the local one.
    pub import_specifier: Option<EcoString>,
    /// Inferred result type, for functions.
    pub return_type: Option<ValueType>,
    pub used: bool,
    pub exported: bool,
    pub scope: ScopeId,
}

/// The result of [`SymbolTable::declare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareOutcome {
    Declared,
    /// The name already exists in the current scope. The first declaration
    /// is kept.
    Redeclared { previous: Span },
    /// The name hides a declaration of an enclosing scope.
    Shadows { outer: Span },
}

/// Scope chain plus every symbol declared during one analysis.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<ScopeRecord>,
    symbols: Vec<Symbol>,
    current: ScopeId,
}

impl SymbolTable {
    /// Creates a table holding only the global scope.
    #[must_use]
    pub fn new(global_span: Span) -> Self {
        Self {
            scopes: vec![ScopeRecord {
                kind: ScopeKind::Global,
                span: global_span,
                parent: None,
                depth: 0,
                names: HashMap::new(),
                declared: Vec::new(),
            }],
            symbols: Vec::new(),
            current: ScopeId::GLOBAL,
        }
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    pub fn enter_scope(&mut self, kind: ScopeKind, span: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let depth = self.scope(self.current).depth + 1;
        self.scopes.push(ScopeRecord {
            kind,
            span,
            parent: Some(self.current),
            depth,
            names: HashMap::new(),
            declared: Vec::new(),
        });
        self.current = id;
        id
    }

    /// Returns to the parent scope. A no-op at the global scope.
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scope(self.current).parent {
            self.current = parent;
        }
    }

    #[must_use]
    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &ScopeRecord {
        &self.scopes[id.0]
    }

    #[must_use]
    pub fn scopes(&self) -> &[ScopeRecord] {
        &self.scopes
    }

    /// The deepest scope whose span contains `offset`.
    #[must_use]
    pub fn scope_at(&self, offset: u32) -> ScopeId {
        self.scopes
            .iter()
            .enumerate()
            .filter(|(_, scope)| scope.span.contains_offset(offset) || scope.span.end() == offset)
            .max_by_key(|(_, scope)| scope.depth)
            .map_or(ScopeId::GLOBAL, |(index, _)| ScopeId(index))
    }

    fn chain(&self, start: ScopeId) -> impl Iterator<Item = &ScopeRecord> {
        std::iter::successors(Some(self.scope(start)), |scope| {
            scope.parent.map(|parent| self.scope(parent))
        })
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Declares `name` in the current scope.
    ///
    /// Builtins never count as a previous declaration: redefining one
    /// replaces it silently.
    pub fn declare(
        &mut self,
        name: &str,
        kind: SymbolKind,
        data_type: ValueType,
        span: Span,
    ) -> DeclareOutcome {
        if let Some(&existing) = self.scope(self.current).names.get(name) {
            let previous = &self.symbols[existing];
            if previous.kind != SymbolKind::Builtin {
                return DeclareOutcome::Redeclared {
                    previous: previous.declared_at,
                };
            }
        }

        let outer = self
            .scope(self.current)
            .parent
            .and_then(|parent| self.resolve_from(parent, name))
            .map(|index| &self.symbols[index])
            .filter(|symbol| symbol.kind != SymbolKind::Builtin)
            .map(|symbol| symbol.declared_at);

        let index = self.symbols.len();
        self.symbols.push(Symbol {
            name: name.into(),
            kind,
            data_type,
            declared_at: span,
            imported_from: None,
            import_specifier: None,
            return_type: None,
            used: false,
            exported: false,
            scope: self.current,
        });
        let scope = &mut self.scopes[self.current.0];
        scope.names.insert(name.into(), index);
        scope.declared.push(index);

        match outer {
            Some(outer) => DeclareOutcome::Shadows { outer },
            None => DeclareOutcome::Declared,
        }
    }

    fn resolve_from(&self, start: ScopeId, name: &str) -> Option<usize> {
        self.chain(start).find_map(|scope| scope.names.get(name).copied())
    }

    /// The id of the visible `name`, from the current scope outwards.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<SymbolId> {
        self.resolve_from(self.current, name).map(SymbolId)
    }

    /// The id the next declaration will receive.
    #[must_use]
    pub fn next_symbol_id(&self) -> SymbolId {
        SymbolId(self.symbols.len())
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    /// Looks up `name` from the current scope outwards.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.resolve_from(self.current, name)
            .map(|index| &self.symbols[index])
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.resolve_from(self.current, name)
            .map(|index| &mut self.symbols[index])
    }

    /// Looks up `name` as seen from source position `offset`.
    #[must_use]
    pub fn lookup_at(&self, name: &str, offset: u32) -> Option<&Symbol> {
        self.resolve_from(self.scope_at(offset), name)
            .map(|index| &self.symbols[index])
    }

    /// Every symbol visible at `offset`, innermost first, without shadowed
    /// duplicates.
    #[must_use]
    pub fn visible_symbols_at(&self, offset: u32) -> Vec<&Symbol> {
        let mut seen: Vec<&str> = Vec::new();
        let mut visible = Vec::new();
        for scope in self.chain(self.scope_at(offset)) {
            let mut indices: Vec<usize> = scope.names.values().copied().collect();
            indices.sort_unstable();
            for index in indices {
                let symbol = &self.symbols[index];
                if !seen.contains(&symbol.name.as_str()) {
                    seen.push(symbol.name.as_str());
                    visible.push(symbol);
                }
            }
        }
        visible
    }

    /// Every symbol of the analysis, innermost scopes first.
    #[must_use]
    pub fn all_symbols(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self.symbols.iter().collect();
        symbols.sort_by_key(|symbol| std::cmp::Reverse(self.scope(symbol.scope).depth));
        symbols
    }

    /// Symbols declared directly in scope `id`, in declaration order.
    pub fn symbols_in(&self, id: ScopeId) -> impl Iterator<Item = &Symbol> {
        self.scope(id)
            .declared
            .iter()
            .map(move |&index| &self.symbols[index])
    }

    // ========================================================================
    // Types and Usage
    // ========================================================================

    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<&ValueType> {
        self.lookup(name).map(|symbol| &symbol.data_type)
    }

    /// Marks the visible `name` as read. Returns `false` if it is undeclared.
    pub fn mark_used(&mut self, name: &str) -> bool {
        match self.lookup_mut(name) {
            Some(symbol) => {
                symbol.used = true;
                true
            }
            None => false,
        }
    }

    /// Unread declarations of the current scope that deserve a warning.
    ///
    /// Parameters, builtins, exported names and names starting with `_` are
    /// exempt.
    #[must_use]
    pub fn unused_in_current_scope(&self) -> Vec<&Symbol> {
        self.symbols_in(self.current)
            .filter(|symbol| {
                !symbol.used
                    && !symbol.exported
                    && !symbol.name.starts_with('_')
                    && !matches!(symbol.kind, SymbolKind::Parameter | SymbolKind::Builtin)
            })
            .collect()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(Span::default())
    }
}
