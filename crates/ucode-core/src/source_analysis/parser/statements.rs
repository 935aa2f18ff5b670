// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing.
//!
//! Each control-flow statement accepts both the braced form and the colon
//! form used in templates (`if (x): ... elif (y): ... else ... endif`).

use super::{PResult, Parser};
use crate::ast::{
    Block, CatchClause, DeclarationKind, ExportDeclaration, ExportSpecifier, Expression, ForInit,
    Identifier, ImportDeclaration, ImportSpecifier, Statement, SwitchCase, VariableDeclaration,
    VariableDeclarator,
};
use crate::source_analysis::{Span, SyntaxError, TokenKind};

impl Parser {
    pub(super) fn parse_statement(&mut self) -> PResult<Statement> {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            self.enter_nesting()?;
            let result = self.parse_statement_inner();
            self.leave_nesting();
            result
        })
    }

    fn parse_statement_inner(&mut self) -> PResult<Statement> {
        self.skip_statement_delimiters();
        let start = self.current_token().span();

        match self.current_kind() {
            TokenKind::Let | TokenKind::Const => {
                let mut declaration = self.parse_variable_declaration()?;
                self.expect_semicolon();
                declaration.span = self.span_from(start);
                Ok(Statement::Variable(declaration))
            }
            TokenKind::Function if matches!(self.peek_at(1), TokenKind::Identifier(_)) => {
                Ok(Statement::Function(self.parse_function(true)?))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                self.advance();
                self.expect_semicolon();
                Ok(Statement::Break {
                    span: self.span_from(start),
                })
            }
            TokenKind::Continue => {
                self.advance();
                self.expect_semicolon();
                Ok(Statement::Continue {
                    span: self.span_from(start),
                })
            }
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty { span: start })
            }
            TokenKind::Import => self.parse_import(),
            TokenKind::Export => self.parse_export(),
            TokenKind::Text(value) => {
                let value = value.clone();
                self.advance();
                Ok(Statement::Text { value, span: start })
            }
            TokenKind::ExpressionOpen => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect(&TokenKind::ExpressionClose, "Expected '}}'")?;
                Ok(Statement::Echo {
                    expression,
                    span: self.span_from(start),
                })
            }
            _ => {
                let expression = self.parse_expression()?;
                self.expect_semicolon();
                Ok(Statement::Expression {
                    expression,
                    span: self.span_from(start),
                })
            }
        }
    }

    // ========================================================================
    // Terminators
    // ========================================================================

    /// Consumes a `;`, which may be omitted before a closing brace, a
    /// template delimiter, a colon-syntax keyword or end of input.
    ///
    /// A missing `;` is reported without failing the statement; the rest of
    /// the line up to the next boundary is skipped.
    pub(super) fn expect_semicolon(&mut self) {
        if self.match_token(&TokenKind::Semicolon) || self.at_implicit_semicolon() {
            return;
        }
        let error = self.error_at_current("Expected ';' after statement");
        self.report(error);
        self.skip_to_boundary(0);
    }

    fn at_implicit_semicolon(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::RightBrace
                | TokenKind::Eof
                | TokenKind::StatementClose
                | TokenKind::ExpressionClose
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::EndIf
                | TokenKind::EndFor
                | TokenKind::EndWhile
                | TokenKind::EndFunction
        )
    }

    /// Consumes a closing token, reporting (but not failing on) its absence
    /// so the enclosing construct is kept.
    fn expect_closing(&mut self, kind: &TokenKind, message: &str) {
        if !self.match_token(kind) {
            let error = self.error_at_current(message);
            self.report(error);
        }
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    pub(super) fn parse_block(&mut self) -> PResult<Block> {
        let open = self
            .expect(&TokenKind::LeftBrace, "Expected '{'")?
            .span();
        let body = self.parse_statement_list(|kind| matches!(kind, TokenKind::RightBrace));
        self.expect_closing(&TokenKind::RightBrace, "Expected '}' to close block");
        Ok(Block {
            body,
            span: self.span_from(open),
        })
    }

    /// Parses `: statements...` up to (not including) one of `terminators`.
    pub(super) fn parse_colon_body(&mut self, terminators: &[TokenKind]) -> PResult<Block> {
        let colon = self.expect(&TokenKind::Colon, "Expected ':'")?.span();
        let body = self.parse_statement_list(|kind| {
            terminators
                .iter()
                .any(|t| std::mem::discriminant(t) == std::mem::discriminant(kind))
        });
        Ok(Block {
            body,
            span: self.span_from(colon),
        })
    }

    /// The body of a loop: a statement, or a colon body closed by `end`.
    fn parse_loop_body(&mut self, end: &TokenKind, message: &str) -> PResult<Statement> {
        if self.check(&TokenKind::Colon) {
            let block = self.parse_colon_body(std::slice::from_ref(end))?;
            self.expect_closing(end, message);
            Ok(Statement::Block(block))
        } else {
            self.parse_statement()
        }
    }

    /// `( expression )` after `if`, `elif`, `while` or `switch`.
    fn parse_condition(&mut self, keyword: &str) -> PResult<Expression> {
        self.expect(
            &TokenKind::LeftParen,
            &format!("Expected '(' after '{keyword}'"),
        )?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "Expected ')' after condition")?;
        Ok(test)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// `let a = 1, b` or `const c = 2`, without the trailing `;`.
    pub(super) fn parse_variable_declaration(&mut self) -> PResult<VariableDeclaration> {
        let token = self.advance();
        let kind = if matches!(token.kind(), TokenKind::Const) {
            DeclarationKind::Const
        } else {
            DeclarationKind::Let
        };

        let mut declarations = Vec::new();
        loop {
            let id = self.expect_identifier("Expected variable name")?;
            let init = if self.match_token(&TokenKind::Assign) {
                Some(self.parse_argument()?)
            } else {
                None
            };
            if kind == DeclarationKind::Const && init.is_none() {
                self.report(SyntaxError::new(
                    format!("const declaration '{}' requires an initializer", id.name),
                    id.span,
                ));
            }
            declarations.push(VariableDeclarator {
                span: self.span_from(id.span),
                id,
                init,
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(VariableDeclaration {
            kind,
            declarations,
            span: self.span_from(token.span()),
        })
    }

    // ========================================================================
    // Control Flow
    // ========================================================================

    fn parse_if(&mut self) -> PResult<Statement> {
        let start = self.advance().span();
        let test = self.parse_condition("if")?;

        if self.check(&TokenKind::Colon) {
            return self.parse_colon_if(start, test);
        }

        let consequent = self.parse_statement()?;
        let alternate = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            test,
            consequent: Box::new(consequent),
            alternate,
            span: self.span_from(start),
        })
    }

    /// `if (a): ... elif (b): ... else ... endif`. Each `elif` becomes an
    /// `If` nested in the previous branch's `alternate`.
    fn parse_colon_if(&mut self, start: Span, test: Expression) -> PResult<Statement> {
        let branch_end = [TokenKind::Elif, TokenKind::Else, TokenKind::EndIf];
        let consequent = self.parse_colon_body(&branch_end)?;

        let mut elifs = Vec::new();
        while self.check(&TokenKind::Elif) {
            let elif_start = self.advance().span();
            let elif_test = self.parse_condition("elif")?;
            let body = self.parse_colon_body(&branch_end)?;
            elifs.push((elif_start, elif_test, body));
        }

        let mut alternate = None;
        if self.check(&TokenKind::Else) {
            let else_start = self.advance().span();
            self.match_token(&TokenKind::Colon);
            let body = self.parse_statement_list(|kind| matches!(kind, TokenKind::EndIf));
            alternate = Some(Box::new(Statement::Block(Block {
                body,
                span: self.span_from(else_start),
            })));
        }
        let chain_end = self.previous_span();

        for (elif_start, elif_test, body) in elifs.into_iter().rev() {
            alternate = Some(Box::new(Statement::If {
                test: elif_test,
                consequent: Box::new(Statement::Block(body)),
                alternate,
                span: elif_start.merge(chain_end),
            }));
        }

        self.expect_closing(&TokenKind::EndIf, "Expected 'endif'");
        Ok(Statement::If {
            test,
            consequent: Box::new(Statement::Block(consequent)),
            alternate,
            span: self.span_from(start),
        })
    }

    fn parse_while(&mut self) -> PResult<Statement> {
        let start = self.advance().span();
        let test = self.parse_condition("while")?;
        let body = self.parse_loop_body(&TokenKind::EndWhile, "Expected 'endwhile'")?;
        Ok(Statement::While {
            test,
            body: Box::new(body),
            span: self.span_from(start),
        })
    }

    fn parse_for(&mut self) -> PResult<Statement> {
        let start = self.advance().span();
        self.expect(&TokenKind::LeftParen, "Expected '(' after 'for'")?;

        if self.is_for_in_ahead() {
            return self.parse_for_in(start);
        }

        let init = if self.match_token(&TokenKind::Semicolon) {
            None
        } else {
            let init = if matches!(self.current_kind(), TokenKind::Let | TokenKind::Const) {
                ForInit::Declaration(self.parse_variable_declaration()?)
            } else {
                ForInit::Expression(self.parse_expression()?)
            };
            self.expect(&TokenKind::Semicolon, "Expected ';' after loop initializer")?;
            Some(init)
        };

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon, "Expected ';' after loop condition")?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen, "Expected ')' after loop clauses")?;

        let body = self.parse_loop_body(&TokenKind::EndFor, "Expected 'endfor'")?;
        Ok(Statement::For {
            init,
            test,
            update,
            body: Box::new(body),
            span: self.span_from(start),
        })
    }

    /// `[let|const] key [, value] in` after the opening parenthesis.
    fn is_for_in_ahead(&self) -> bool {
        let offset = usize::from(matches!(
            self.current_kind(),
            TokenKind::Let | TokenKind::Const
        ));
        if !matches!(self.peek_at(offset), TokenKind::Identifier(_)) {
            return false;
        }
        match self.peek_at(offset + 1) {
            TokenKind::In => true,
            TokenKind::Comma => {
                matches!(self.peek_at(offset + 2), TokenKind::Identifier(_))
                    && matches!(self.peek_at(offset + 3), TokenKind::In)
            }
            _ => false,
        }
    }

    fn parse_for_in(&mut self, start: Span) -> PResult<Statement> {
        let declaration = match self.current_kind() {
            TokenKind::Let => Some(DeclarationKind::Let),
            TokenKind::Const => Some(DeclarationKind::Const),
            _ => None,
        };
        if declaration.is_some() {
            self.advance();
        }
        let key = self.expect_identifier("Expected loop variable")?;
        let value = if self.match_token(&TokenKind::Comma) {
            Some(self.expect_identifier("Expected loop value variable")?)
        } else {
            None
        };
        self.expect(&TokenKind::In, "Expected 'in'")?;
        let object = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "Expected ')' after loop object")?;

        let body = self.parse_loop_body(&TokenKind::EndFor, "Expected 'endfor'")?;
        Ok(Statement::ForIn {
            declaration,
            key,
            value,
            object,
            body: Box::new(body),
            span: self.span_from(start),
        })
    }

    fn parse_switch(&mut self) -> PResult<Statement> {
        let start = self.advance().span();
        let discriminant = self.parse_condition("switch")?;
        self.expect(&TokenKind::LeftBrace, "Expected '{' after switch value")?;

        let mut cases = Vec::new();
        let mut seen_default = false;
        loop {
            self.skip_statement_delimiters();
            if self.check(&TokenKind::RightBrace) || self.is_at_end() || self.aborted() {
                break;
            }
            let case_start = self.current_token().span();
            let test = if self.match_token(&TokenKind::Case) {
                Some(self.parse_expression()?)
            } else if self.match_token(&TokenKind::Default) {
                if seen_default {
                    self.report(SyntaxError::new(
                        "Multiple default clauses in switch",
                        case_start,
                    ));
                }
                seen_default = true;
                None
            } else {
                return Err(self.error_at_current("Expected 'case' or 'default'"));
            };
            self.expect(&TokenKind::Colon, "Expected ':' after case label")?;
            let consequent = self.parse_statement_list(|kind| {
                matches!(
                    kind,
                    TokenKind::Case | TokenKind::Default | TokenKind::RightBrace
                )
            });
            cases.push(SwitchCase {
                test,
                consequent,
                span: self.span_from(case_start),
            });
        }
        self.expect_closing(&TokenKind::RightBrace, "Expected '}' after switch cases");

        Ok(Statement::Switch {
            discriminant,
            cases,
            span: self.span_from(start),
        })
    }

    fn parse_try(&mut self) -> PResult<Statement> {
        let start = self.advance().span();
        let block = self.parse_block()?;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.advance().span();
            let param = if self.match_token(&TokenKind::LeftParen) {
                let param = self.expect_identifier("Expected catch parameter name")?;
                self.expect(&TokenKind::RightParen, "Expected ')' after catch parameter")?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause {
                param,
                body,
                span: self.span_from(catch_start),
            })
        } else {
            let error = self.error_at_current("Expected 'catch' after try block");
            self.report(error);
            None
        };

        Ok(Statement::Try {
            block,
            handler,
            span: self.span_from(start),
        })
    }

    fn parse_return(&mut self) -> PResult<Statement> {
        let start = self.advance().span();
        let argument = if self.check(&TokenKind::Semicolon) || self.at_implicit_semicolon() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon();
        Ok(Statement::Return {
            argument,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // Modules
    // ========================================================================

    fn parse_import(&mut self) -> PResult<Statement> {
        let start = self.advance().span();
        let mut specifiers = Vec::new();

        // `import "module";` imports for side effects only.
        if !matches!(self.current_kind(), TokenKind::String(_)) {
            let mut more = true;
            if matches!(self.current_kind(), TokenKind::Identifier(_)) && !self.check_word("from")
            {
                let local = self.expect_identifier("Expected import name")?;
                specifiers.push(ImportSpecifier::Default { local });
                more = self.match_token(&TokenKind::Comma);
            }
            if more {
                if self.match_token(&TokenKind::Star) {
                    self.expect_word("as")?;
                    let local = self.expect_identifier("Expected namespace name")?;
                    specifiers.push(ImportSpecifier::Namespace { local });
                } else if self.match_token(&TokenKind::LeftBrace) {
                    self.parse_import_list(&mut specifiers)?;
                } else {
                    return Err(self.error_at_current("Expected import specifiers"));
                }
            }
            self.expect_word("from")?;
        }

        let source_token = self.current_token().clone();
        let TokenKind::String(source) = source_token.kind() else {
            return Err(self.error_at_current("Expected module path string"));
        };
        self.advance();
        self.expect_semicolon();

        Ok(Statement::Import(ImportDeclaration {
            specifiers,
            source: source.clone(),
            source_span: source_token.span(),
            span: self.span_from(start),
        }))
    }

    /// `{ a, b as c }` after the opening brace.
    fn parse_import_list(&mut self, specifiers: &mut Vec<ImportSpecifier>) -> PResult<()> {
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let plain = matches!(self.current_kind(), TokenKind::Identifier(_));
            let imported = self.parse_module_name()?;
            let local = if self.check_word("as") {
                self.advance();
                self.expect_identifier("Expected local name after 'as'")?
            } else if plain {
                imported.clone()
            } else {
                return Err(SyntaxError::new(
                    format!("'{}' must be renamed with 'as'", imported.name),
                    imported.span,
                ));
            };
            specifiers.push(ImportSpecifier::Named { imported, local });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace, "Expected '}' after import list")?;
        Ok(())
    }

    /// An exported name, which may be a reserved word such as `default`.
    fn parse_module_name(&mut self) -> PResult<Identifier> {
        let token = self.current_token().clone();
        let name = match token.kind() {
            TokenKind::Identifier(name) | TokenKind::String(name) => name.clone(),
            kind => match kind.as_str().filter(|_| kind.is_keyword()) {
                Some(word) => word.into(),
                None => return Err(self.error_at_current("Expected name")),
            },
        };
        self.advance();
        Ok(Identifier::new(name, token.span()))
    }

    fn expect_word(&mut self, word: &str) -> PResult<()> {
        if self.check_word(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_at_current(&format!("Expected '{word}'")))
        }
    }

    fn parse_export(&mut self) -> PResult<Statement> {
        let start = self.advance().span();

        let export = match self.current_kind() {
            TokenKind::Let | TokenKind::Const => {
                let declaration = self.parse_variable_declaration()?;
                self.expect_semicolon();
                ExportDeclaration::Declaration {
                    declaration: Box::new(Statement::Variable(declaration)),
                    span: self.span_from(start),
                }
            }
            TokenKind::Function => {
                let function = self.parse_function(true)?;
                ExportDeclaration::Declaration {
                    declaration: Box::new(Statement::Function(function)),
                    span: self.span_from(start),
                }
            }
            TokenKind::Default => {
                self.advance();
                let expression = self.parse_argument()?;
                self.expect_semicolon();
                ExportDeclaration::Default {
                    expression,
                    span: self.span_from(start),
                }
            }
            TokenKind::LeftBrace => {
                self.advance();
                let mut specifiers = Vec::new();
                while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                    let local = self.expect_identifier("Expected exported name")?;
                    let exported = if self.check_word("as") {
                        self.advance();
                        self.parse_module_name()?
                    } else {
                        local.clone()
                    };
                    specifiers.push(ExportSpecifier { local, exported });
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RightBrace, "Expected '}' after export list")?;
                self.expect_semicolon();
                ExportDeclaration::Named {
                    specifiers,
                    span: self.span_from(start),
                }
            }
            _ => {
                return Err(self.error_at_current(
                    "Expected declaration, '{' or 'default' after 'export'",
                ));
            }
        };
        Ok(Statement::Export(export))
    }
}
