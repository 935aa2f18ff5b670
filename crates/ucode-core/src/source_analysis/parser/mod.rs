// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for ucode source code.
//!
//! Statements are parsed by recursive descent; expressions use a Pratt
//! parser driven by a per-token [`ParseRule`] table.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory.** A syntax error inside a statement
//!   produces one diagnostic, then the parser skips to the next statement
//!   boundary and carries on.
//! - **Multiple errors.** Every independent error in a document is reported.
//! - **Bounded recursion.** Nesting beyond [`MAX_NESTING_DEPTH`] is the one
//!   unrecoverable error: the parser gives up and returns no program.
//!
//! # Operator Precedence
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | Comma | `,` | Left |
//! | Assignment | `=` `+=` `??=` ... | Right |
//! | Ternary | `? :` | Right |
//! | Or | `\|\|` `??` | Left |
//! | And | `&&` | Left |
//! | BitOr / BitXor / BitAnd | `\|` `^` `&` | Left |
//! | Equality | `==` `!=` `===` `!==` | Left |
//! | Relational | `<` `<=` `>` `>=` `in` | Left |
//! | Shift | `<<` `>>` | Left |
//! | Additive | `+` `-` | Left |
//! | Multiplicative | `*` `/` `%` | Left |
//! | Exponent | `**` | Right |
//! | Unary | `!` `~` `+` `-` `delete` `++x` | Prefix |
//! | Postfix | `x++` `x--` | Postfix |
//! | Call | `()` `[]` `.` `?.` | Left |
//!
//! To add an operator, add an entry to [`rule`].
//!
//! # Usage
//!
//! ```
//! use ucode_core::source_analysis::{parse, tokenize};
//!
//! let output = parse(tokenize("let x = 3 + 4;"));
//! assert!(output.diagnostics.is_empty());
//! assert_eq!(output.program.unwrap().body.len(), 1);
//! ```

use ecow::EcoString;

use crate::ast::{Expression, Program, Statement};
use crate::source_analysis::{
    SourceMode, Span, SyntaxError, Token, TokenKind, tokenize, tokenize_with_mode,
};

// Submodules with additional impl blocks for Parser
mod expressions;
mod statements;


pub(super) type PResult<T> = Result<T, SyntaxError>;

// ============================================================================
// Pratt Rule Table
// ============================================================================

/// Expression precedence levels, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    None,
    Comma,
    Assignment,
    Ternary,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
    Exponent,
    Unary,
    Postfix,
    Call,
    Primary,
}

impl Precedence {
    /// The next tighter level, used for the right operand of
    /// left-associative operators.
    pub(super) const fn next(self) -> Self {
        match self {
            Self::None => Self::Comma,
            Self::Comma => Self::Assignment,
            Self::Assignment => Self::Ternary,
            Self::Ternary => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::BitOr,
            Self::BitOr => Self::BitXor,
            Self::BitXor => Self::BitAnd,
            Self::BitAnd => Self::Equality,
            Self::Equality => Self::Relational,
            Self::Relational => Self::Shift,
            Self::Shift => Self::Additive,
            Self::Additive => Self::Multiplicative,
            Self::Multiplicative => Self::Exponent,
            Self::Exponent => Self::Unary,
            Self::Unary => Self::Postfix,
            Self::Postfix => Self::Call,
            Self::Call | Self::Primary => Self::Primary,
        }
    }
}

pub(super) type PrefixFn = fn(&mut Parser) -> PResult<Expression>;
pub(super) type InfixFn = fn(&mut Parser, Expression) -> PResult<Expression>;

/// How a token behaves at the start of an expression and after an operand.
#[derive(Clone, Copy)]
pub(super) struct ParseRule {
    pub(super) prefix: Option<PrefixFn>,
    pub(super) infix: Option<InfixFn>,
    /// Binding precedence of the infix form.
    pub(super) precedence: Precedence,
}

impl ParseRule {
    const fn new(
        prefix: Option<PrefixFn>,
        infix: Option<InfixFn>,
        precedence: Precedence,
    ) -> Self {
        Self {
            prefix,
            infix,
            precedence,
        }
    }

    const fn prefix(prefix: PrefixFn) -> Self {
        Self::new(Some(prefix), None, Precedence::None)
    }

    const fn infix(infix: InfixFn, precedence: Precedence) -> Self {
        Self::new(None, Some(infix), precedence)
    }
}

/// Looks up the parse rule for a token kind.
pub(super) fn rule(kind: &TokenKind) -> ParseRule {
    use Precedence as P;
    use TokenKind as T;

    match kind {
        T::Identifier(_) => ParseRule::prefix(Parser::parse_identifier_or_arrow),
        T::Integer(_) | T::Double(_) | T::String(_) | T::True | T::False | T::Null => {
            ParseRule::prefix(Parser::parse_literal)
        }
        T::This => ParseRule::prefix(Parser::parse_this),
        T::TemplateChunk(_) | T::TemplateTail(_) => ParseRule::prefix(Parser::parse_template),
        T::Regex { .. } => ParseRule::prefix(Parser::parse_regex),
        T::LeftBrace => ParseRule::prefix(Parser::parse_object),
        T::Function => ParseRule::prefix(Parser::parse_function_expression),
        T::Bang | T::Tilde | T::Delete => ParseRule::prefix(Parser::parse_unary),

        // Tokens with both prefix and infix forms
        T::LeftParen => ParseRule::new(
            Some(Parser::parse_group_or_arrow),
            Some(Parser::parse_call),
            P::Call,
        ),
        T::LeftBracket => ParseRule::new(
            Some(Parser::parse_array),
            Some(Parser::parse_computed_member),
            P::Call,
        ),
        T::Plus | T::Minus => ParseRule::new(
            Some(Parser::parse_unary),
            Some(Parser::parse_binary),
            P::Additive,
        ),
        T::PlusPlus | T::MinusMinus => ParseRule::new(
            Some(Parser::parse_prefix_update),
            Some(Parser::parse_postfix_update),
            P::Postfix,
        ),

        T::Dot | T::QuestionDot => ParseRule::infix(Parser::parse_member, P::Call),
        T::QuestionDotBracket => ParseRule::infix(Parser::parse_computed_member, P::Call),
        T::QuestionDotParen => ParseRule::infix(Parser::parse_call, P::Call),

        T::Comma => ParseRule::infix(Parser::parse_sequence, P::Comma),
        kind if kind.is_assignment() => ParseRule::infix(Parser::parse_assignment, P::Assignment),
        T::Question => ParseRule::infix(Parser::parse_conditional, P::Ternary),
        T::PipePipe | T::QuestionQuestion => ParseRule::infix(Parser::parse_logical, P::Or),
        T::AmpAmp => ParseRule::infix(Parser::parse_logical, P::And),
        T::Pipe => ParseRule::infix(Parser::parse_binary, P::BitOr),
        T::Caret => ParseRule::infix(Parser::parse_binary, P::BitXor),
        T::Amp => ParseRule::infix(Parser::parse_binary, P::BitAnd),
        T::EqEq | T::NotEq | T::EqEqEq | T::NotEqEq => {
            ParseRule::infix(Parser::parse_binary, P::Equality)
        }
        T::Less | T::LessEq | T::Greater | T::GreaterEq | T::In => {
            ParseRule::infix(Parser::parse_binary, P::Relational)
        }
        T::ShiftLeft | T::ShiftRight => ParseRule::infix(Parser::parse_binary, P::Shift),
        T::Star | T::Slash | T::Percent => {
            ParseRule::infix(Parser::parse_binary, P::Multiplicative)
        }
        T::StarStar => ParseRule::infix(Parser::parse_binary, P::Exponent),

        _ => ParseRule::new(None, None, P::None),
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// What kind of problem a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Lexical or syntax error.
    Syntax,
    /// Reference to a name that is not declared.
    Undefined,
    /// Declared but never read.
    Unused,
    /// Declaration hides one in an enclosing scope.
    Shadowing,
    /// Declared twice in the same scope.
    Redeclaration,
    /// Operand or value type mismatch.
    Type,
    /// Builtin function contract violation.
    Builtin,
    /// Assignment to a `const` binding.
    Constant,
}

impl DiagnosticCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Undefined => "undefined",
            Self::Unused => "unused",
            Self::Shadowing => "shadowing",
            Self::Redeclaration => "redeclaration",
            Self::Type => "type",
            Self::Builtin => "builtin",
            Self::Constant => "constant",
        }
    }
}

/// A diagnostic message (error, warning or informational note).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: EcoString,
    pub span: Span,
    /// Optional hint for how to fix the issue.
    pub hint: Option<EcoString>,
    pub category: Option<DiagnosticCategory>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity,
            message: message.into(),
            span,
            hint: None,
            category: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<EcoString>, span: Span) -> Self {
        Self::new(Severity::Error, message, span)
    }

    #[must_use]
    pub fn warning(message: impl Into<EcoString>, span: Span) -> Self {
        Self::new(Severity::Warning, message, span)
    }

    #[must_use]
    pub fn info(message: impl Into<EcoString>, span: Span) -> Self {
        Self::new(Severity::Info, message, span)
    }

    #[must_use]
    pub fn with_category(mut self, category: DiagnosticCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(error: SyntaxError) -> Self {
        Self::error(error.message, error.span).with_category(DiagnosticCategory::Syntax)
    }
}

/// Diagnostic severity level, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// One level less severe; `Info` stays `Info`.
    #[must_use]
    pub const fn downgrade(self) -> Self {
        match self {
            Self::Error => Self::Warning,
            Self::Warning | Self::Info => Self::Info,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// The result of parsing a token stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    /// `None` only when nesting exceeded [`MAX_NESTING_DEPTH`].
    pub program: Option<Program>,
    /// Lexical and syntax errors in source order of discovery.
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses a token stream produced by [`tokenize`].
///
/// Error tokens are reported as diagnostics and removed before parsing.
///
/// # Examples
///
/// ```
/// use ucode_core::source_analysis::{parse, tokenize};
///
/// let output = parse(tokenize("let x = 1; let = ; let y = 2;"));
/// assert_eq!(output.diagnostics.len(), 1);
/// assert_eq!(output.program.unwrap().body.len(), 2);
/// ```
#[must_use]
pub fn parse(tokens: Vec<Token>) -> ParseOutput {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    tracing::debug!(
        diagnostics = parser.diagnostics.len(),
        complete = program.is_some(),
        "parsed program"
    );
    ParseOutput {
        program,
        diagnostics: parser.diagnostics,
    }
}

/// Tokenizes and parses a plain script.
#[must_use]
pub fn parse_source(source: &str) -> ParseOutput {
    parse(tokenize(source))
}

/// Tokenizes and parses a template file.
#[must_use]
pub fn parse_template(source: &str) -> ParseOutput {
    parse(tokenize_with_mode(source, SourceMode::Template))
}

/// Maximum expression and statement nesting depth.
///
/// `stacker::maybe_grow` guards the recursive entry points as well, so this
/// is a limit on pathological input rather than on stack size.
pub const MAX_NESTING_DEPTH: usize = 256;

// ============================================================================
// Parser State
// ============================================================================

/// The parser state.
pub(super) struct Parser {
    /// Tokens with lexical errors removed; always ends with `Eof`.
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) diagnostics: Vec<Diagnostic>,
    nesting_depth: usize,
    /// Set once nesting overflowed; parsing unwinds and yields no program.
    too_deep: bool,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        let mut diagnostics = Vec::new();
        let mut kept = Vec::with_capacity(tokens.len());
        for token in tokens {
            if let TokenKind::Error(message) = token.kind() {
                diagnostics.push(
                    Diagnostic::error(message.clone(), token.span())
                        .with_category(DiagnosticCategory::Syntax),
                );
            } else {
                kept.push(token);
            }
        }
        if !kept.last().is_some_and(|t| t.kind().is_eof()) {
            let end = kept.last().map_or(0, |t| t.span().end());
            kept.push(Token::new(TokenKind::Eof, Span::point(end)));
        }
        Self {
            tokens: kept,
            current: 0,
            diagnostics,
            nesting_depth: 0,
            too_deep: false,
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    pub(super) fn current_token(&self) -> &Token {
        let index = self.current.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(super) fn current_kind(&self) -> &TokenKind {
        self.current_token().kind()
    }

    /// Peeks `offset` tokens past the current one.
    pub(super) fn peek_at(&self, offset: usize) -> &TokenKind {
        let index = (self.current + offset).min(self.tokens.len() - 1);
        self.tokens[index].kind()
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current_kind().is_eof()
    }

    /// Advances to the next token and returns the previous one.
    pub(super) fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    /// Checks the current token's kind, ignoring any payload.
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    pub(super) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True if the current token is the contextual word `word` (`from`, `as`).
    pub(super) fn check_word(&self, word: &str) -> bool {
        matches!(self.current_kind(), TokenKind::Identifier(name) if name == word)
    }

    /// Consumes a token of the given kind or fails with `message`.
    pub(super) fn expect(&mut self, kind: &TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message))
        }
    }

    /// Span of the most recently consumed token.
    pub(super) fn previous_span(&self) -> Span {
        if self.current == 0 {
            self.current_token().span()
        } else {
            self.tokens[self.current - 1].span()
        }
    }

    /// Span from `start` through the most recently consumed token.
    pub(super) fn span_from(&self, start: Span) -> Span {
        start.merge(self.previous_span())
    }

    // ========================================================================
    // Error Handling & Recovery
    // ========================================================================

    /// Builds an error pointing at the current token.
    pub(super) fn error_at_current(&self, message: &str) -> SyntaxError {
        let token = self.current_token();
        SyntaxError::new(format!("{message}, found {}", token.kind()), token.span())
    }

    /// Records a diagnostic, unless parsing is already unwinding from a
    /// nesting overflow.
    pub(super) fn report(&mut self, error: SyntaxError) {
        if !self.too_deep {
            self.diagnostics.push(error.into());
        }
    }

    pub(super) fn aborted(&self) -> bool {
        self.too_deep
    }

    /// Increments the nesting depth, failing once it exceeds
    /// [`MAX_NESTING_DEPTH`]. Pair every `Ok` with [`leave_nesting`](Self::leave_nesting).
    pub(super) fn enter_nesting(&mut self) -> PResult<()> {
        self.nesting_depth += 1;
        if self.nesting_depth > MAX_NESTING_DEPTH {
            self.nesting_depth -= 1;
            let error = SyntaxError::new(
                format!("Nesting is too deep (maximum {MAX_NESTING_DEPTH} levels)"),
                self.current_token().span(),
            );
            if !self.too_deep {
                self.diagnostics.push(error.clone().into());
                self.too_deep = true;
            }
            return Err(error);
        }
        Ok(())
    }

    pub(super) fn leave_nesting(&mut self) {
        debug_assert!(
            self.nesting_depth > 0,
            "leave_nesting called without matching enter_nesting"
        );
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
    }

    /// Skips to a statement boundary after an error.
    ///
    /// Stops after a `;` or `}}`, or before a statement keyword, a template delimiter,
    /// end of input, or a `}` that the failed statement did not open. At
    /// least one token is consumed when the failed statement consumed
    /// nothing, so recovery always progresses.
    pub(super) fn synchronize(&mut self, statement_start: usize) {
        if self.current == statement_start {
            self.advance();
        }
        let open_braces = self.tokens[statement_start..self.current]
            .iter()
            .fold(0_usize, |depth, token| match token.kind() {
                TokenKind::LeftBrace => depth + 1,
                TokenKind::RightBrace => depth.saturating_sub(1),
                _ => depth,
            });
        self.skip_to_boundary(open_braces);
    }

    /// Skips tokens up to the next statement boundary, consuming up to
    /// `open_braces` closing braces on the way.
    pub(super) fn skip_to_boundary(&mut self, mut open_braces: usize) {
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::Semicolon | TokenKind::ExpressionClose => {
                    self.advance();
                    return;
                }
                TokenKind::RightBrace if open_braces > 0 => {
                    open_braces -= 1;
                    self.advance();
                }
                TokenKind::RightBrace
                | TokenKind::StatementClose
                | TokenKind::StatementOpen
                | TokenKind::ExpressionOpen
                | TokenKind::Text(_) => return,
                kind if kind.starts_statement() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ========================================================================
    // Program Parsing
    // ========================================================================

    fn parse_program(&mut self) -> Option<Program> {
        let body = self.parse_statement_list(|_| false);
        if self.too_deep {
            return None;
        }
        let end = self
            .tokens
            .last()
            .map_or(0, |token| token.span().end());
        Some(Program {
            body,
            span: Span::new(0, end),
        })
    }

    /// Parses statements until end of input or until `stop` accepts the
    /// current token, recovering from errors statement by statement.
    pub(super) fn parse_statement_list(
        &mut self,
        stop: impl Fn(&TokenKind) -> bool,
    ) -> Vec<Statement> {
        let mut body = Vec::new();
        loop {
            self.skip_statement_delimiters();
            if self.is_at_end() || self.aborted() || stop(self.current_kind()) {
                break;
            }
            let start = self.current;
            match self.parse_statement() {
                Ok(statement) => body.push(statement),
                Err(error) => {
                    self.report(error);
                    if self.aborted() {
                        break;
                    }
                    self.synchronize(start);
                }
            }
        }
        body
    }

    /// Template `{%` and `%}` delimiters only separate statements.
    pub(super) fn skip_statement_delimiters(&mut self) {
        while matches!(
            self.current_kind(),
            TokenKind::StatementOpen | TokenKind::StatementClose
        ) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        AssignmentOperator, BinaryOperator, Element, Expression, ExportDeclaration, ForInit,
        FunctionBody, ImportSpecifier, Literal, LogicalOperator, MemberProperty, Property,
        PropertyKey, Statement,
    };
    use crate::ast_walker::{Node, walk_program};

    fn parse_ok(source: &str) -> Program {
        let output = parse_source(source);
        assert!(
            output.diagnostics.is_empty(),
            "expected no errors for {source:?}, got: {:?}",
            output.diagnostics
        );
        output.program.expect("program")
    }

    fn parse_err(source: &str) -> ParseOutput {
        let output = parse_source(source);
        assert!(!output.diagnostics.is_empty(), "expected errors for {source:?}");
        output
    }

    fn expression(source: &str) -> Expression {
        let program = parse_ok(source);
        match program.body.into_iter().next() {
            Some(Statement::Expression { expression, .. }) => expression,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    /// Renders an expression as a fully parenthesized string.
    fn sexp(expression: &Expression) -> String {
        match expression {
            Expression::Identifier(id) => id.name.to_string(),
            Expression::Literal(Literal::Integer(v), _) => v.to_string(),
            Expression::Literal(Literal::String(v), _) => format!("{v:?}"),
            Expression::Binary {
                operator,
                left,
                right,
                ..
            } => format!("({} {} {})", sexp(left), operator.as_str(), sexp(right)),
            Expression::Logical {
                operator,
                left,
                right,
                ..
            } => format!("({} {} {})", sexp(left), operator.as_str(), sexp(right)),
            Expression::Assignment {
                operator,
                target,
                value,
                ..
            } => format!("({} {} {})", sexp(target), operator.as_str(), sexp(value)),
            Expression::Unary {
                operator, argument, ..
            } => format!("({}{})", operator.as_str(), sexp(argument)),
            Expression::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => format!("({} ? {} : {})", sexp(test), sexp(consequent), sexp(alternate)),
            Expression::Member {
                object, property, ..
            } => match property {
                MemberProperty::Named(name) => format!("{}.{}", sexp(object), name.name),
                MemberProperty::Computed(index) => format!("{}[{}]", sexp(object), sexp(index)),
            },
            Expression::Call {
                callee, arguments, ..
            } => {
                let args: Vec<_> = arguments
                    .iter()
                    .filter_map(Element::as_expression)
                    .map(sexp)
                    .collect();
                format!("{}({})", sexp(callee), args.join(", "))
            }
            other => other.node_type().to_string(),
        }
    }

    fn assert_spans_nested(program: &Program) {
        walk_program(program, &mut |parent: Node<'_>, child: Node<'_>| {
            assert!(
                parent.span().contains(child.span()),
                "{} {:?} does not contain {} {:?}",
                parent.node_type(),
                parent.span(),
                child.node_type(),
                child.span()
            );
        });
    }

    #[test]
    fn binary_precedence() {
        assert_eq!(sexp(&expression("a + b * c;")), "(a + (b * c))");
        assert_eq!(sexp(&expression("a * b + c;")), "((a * b) + c)");
        assert_eq!(sexp(&expression("a - b - c;")), "((a - b) - c)");
        assert_eq!(sexp(&expression("a << 1 + 2;")), "(a << (1 + 2))");
        assert_eq!(sexp(&expression("a & b | c ^ d;")), "((a & b) | (c ^ d))");
        assert_eq!(sexp(&expression("a < b == c > d;")), "((a < b) == (c > d))");
        assert_eq!(sexp(&expression("k in o && x;")), "((k in o) && x)");
    }

    #[test]
    fn exponent_is_right_associative() {
        assert_eq!(sexp(&expression("a ** b ** c;")), "(a ** (b ** c))");
    }

    #[test]
    fn logical_operators() {
        assert_eq!(sexp(&expression("a || b && c;")), "(a || (b && c))");
        assert_eq!(sexp(&expression("a ?? b || c;")), "((a ?? b) || c)");
        match expression("a ?? b;") {
            Expression::Logical { operator, .. } => {
                assert_eq!(operator, LogicalOperator::NullishCoalescing);
            }
            other => panic!("expected logical, got {other:?}"),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(sexp(&expression("a = b = 1;")), "(a = (b = 1))");
        assert_eq!(sexp(&expression("a.b += c ? 1 : 2;")), "(a.b += (c ? 1 : 2))");
        match expression("x ??= 1;") {
            Expression::Assignment { operator, .. } => {
                assert_eq!(
                    operator,
                    AssignmentOperator::Logical(LogicalOperator::NullishCoalescing)
                );
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn invalid_assignment_target() {
        let output = parse_err("a + b = c;");
        assert!(output.diagnostics[0].message.contains("Invalid assignment target"));
        let output = parse_err("1++;");
        assert!(output.diagnostics[0].message.contains("Invalid"));
    }

    #[test]
    fn conditional_nests_to_the_right() {
        assert_eq!(
            sexp(&expression("a ? b : c ? d : e;")),
            "(a ? b : (c ? d : e))"
        );
    }

    #[test]
    fn unary_and_update() {
        assert_eq!(sexp(&expression("!a && -b;")), "((!a) && (-b))");
        assert_eq!(sexp(&expression("delete o.k;")), "(deleteo.k)");
        match expression("x++;") {
            Expression::Update { prefix, .. } => assert!(!prefix),
            other => panic!("expected update, got {other:?}"),
        }
        match expression("--x;") {
            Expression::Update { prefix, .. } => assert!(prefix),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn calls_and_members() {
        assert_eq!(sexp(&expression("a.b(c)[d].e;")), "a.b(c)[d].e");
        assert_eq!(sexp(&expression("f(1, 2)(3);")), "f(1, 2)(3)");
        assert_eq!(sexp(&expression("o.if.default;")), "o.if.default");
    }

    #[test]
    fn optional_chaining() {
        match expression("a?.b;") {
            Expression::Member { optional, .. } => assert!(optional),
            other => panic!("expected member, got {other:?}"),
        }
        match expression("a?.[0];") {
            Expression::Member {
                optional, property, ..
            } => {
                assert!(optional);
                assert!(matches!(property, MemberProperty::Computed(_)));
            }
            other => panic!("expected member, got {other:?}"),
        }
        match expression("f?.(1);") {
            Expression::Call { optional, .. } => assert!(optional),
            other => panic!("expected call, got {other:?}"),
        }
        match expression("a.b;") {
            Expression::Member { optional, .. } => assert!(!optional),
            other => panic!("expected member, got {other:?}"),
        }
    }

    #[test]
    fn spread_arguments() {
        match expression("f(...args, 1);") {
            Expression::Call { arguments, .. } => {
                assert!(matches!(arguments[0], Element::Spread { .. }));
                assert!(matches!(arguments[1], Element::Expression(_)));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn sequence_expression() {
        match expression("a = 1, b = 2;") {
            Expression::Sequence { expressions, .. } => assert_eq!(expressions.len(), 2),
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn arrow_functions() {
        for source in ["x => x * 2;", "(a, b) => a + b;", "() => 1;", "(...rest) => rest;"] {
            match expression(source) {
                Expression::Function(function) => assert!(function.is_arrow, "{source}"),
                other => panic!("expected arrow for {source}, got {other:?}"),
            }
        }
        match expression("(a, ...b) => { return b; };") {
            Expression::Function(function) => {
                assert_eq!(function.params.len(), 1);
                assert_eq!(function.rest.as_ref().map(|r| r.name.as_str()), Some("b"));
                assert!(matches!(function.body, FunctionBody::Block(_)));
            }
            other => panic!("expected arrow, got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_expression_is_not_an_arrow() {
        assert_eq!(sexp(&expression("(a + b) * c;")), "((a + b) * c)");
        assert!(matches!(expression("(a, b);"), Expression::Sequence { .. }));
        assert_eq!(sexp(&expression("(a);")), "a");
    }

    #[test]
    fn function_expression_with_rest() {
        match expression("f = function(a, ...more) { return a; };") {
            Expression::Assignment { value, .. } => match *value {
                Expression::Function(function) => {
                    assert!(!function.is_arrow);
                    assert_eq!(function.params.len(), 1);
                    assert!(function.rest.is_some());
                }
                other => panic!("expected function, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn object_literals() {
        let source = "o = { a: 1, 'b': 2, 3: 4, [k]: 5, c, default: 6, if: 7, ...rest, };";
        let Expression::Assignment { value, .. } = expression(source) else {
            panic!("expected assignment");
        };
        let Expression::Object { properties, .. } = *value else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 8);
        assert!(matches!(
            &properties[1],
            Property::KeyValue { key: PropertyKey::Literal(Literal::String(s), _), .. } if s == "b"
        ));
        assert!(matches!(
            &properties[3],
            Property::KeyValue {
                key: PropertyKey::Computed(..),
                ..
            }
        ));
        assert!(matches!(
            &properties[4],
            Property::KeyValue {
                shorthand: true,
                ..
            }
        ));
        assert!(matches!(
            &properties[5],
            Property::KeyValue { key: PropertyKey::Named(name), .. } if name.name == "default"
        ));
        assert!(matches!(&properties[7], Property::Spread { .. }));
    }

    #[test]
    fn keyword_shorthand_is_rejected() {
        let output = parse_err("o = { if };");
        assert_eq!(output.diagnostics.len(), 1);
    }

    #[test]
    fn array_literals() {
        let Expression::Assignment { value, .. } = expression("a = [1, , 3, ...b,];") else {
            panic!("expected assignment");
        };
        let Expression::Array { elements, .. } = *value else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 4);
        assert!(matches!(elements[1], Element::Hole(_)));
        assert!(matches!(elements[3], Element::Spread { .. }));
    }

    #[test]
    fn template_literals() {
        match expression("`a${x}b${y + 1}c`;") {
            Expression::Template {
                quasis,
                expressions,
                ..
            } => {
                assert_eq!(quasis, vec!["a", "b", "c"]);
                assert_eq!(expressions.len(), 2);
            }
            other => panic!("expected template, got {other:?}"),
        }
    }

    #[test]
    fn regex_literal() {
        match expression("/a+/i;") {
            Expression::Regex { pattern, flags, .. } => {
                assert_eq!(pattern, "a+");
                assert_eq!(flags, "i");
            }
            other => panic!("expected regex, got {other:?}"),
        }
    }

    #[test]
    fn variable_declarations() {
        let program = parse_ok("let a = 1, b; const c = 2;");
        match &program.body[0] {
            Statement::Variable(declaration) => {
                assert_eq!(declaration.declarations.len(), 2);
                assert!(declaration.declarations[1].init.is_none());
            }
            other => panic!("expected declaration, got {other:?}"),
        }
        let output = parse_err("const c;");
        assert!(output.diagnostics[0].message.contains("initializer"));
    }

    #[test]
    fn if_else_chains() {
        let program = parse_ok("if (a) x(); else if (b) { y(); } else z();");
        match &program.body[0] {
            Statement::If { alternate, .. } => {
                assert!(matches!(
                    alternate.as_deref(),
                    Some(Statement::If {
                        alternate: Some(_),
                        ..
                    })
                ));
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn colon_syntax_control_flow() {
        let source = "if (a): x(); elif (b): y(); else z(); endif
            while (c): c--; endwhile
            for (let i = 0; i < 3; i++): print(i); endfor
            for (k, v in o): print(k); endfor
            function f(a): return a; endfunction";
        let program = parse_ok(source);
        assert_eq!(program.body.len(), 5);
        assert!(matches!(program.body[0], Statement::If { .. }));
        assert!(matches!(program.body[1], Statement::While { .. }));
        assert!(matches!(program.body[2], Statement::For { .. }));
        assert!(matches!(program.body[3], Statement::ForIn { .. }));
        assert!(matches!(program.body[4], Statement::Function(_)));
    }

    #[test]
    fn for_loops() {
        let program = parse_ok("for (let i = 0; i < n; i++) {} for (;;) break; for (x in o) {}");
        match &program.body[0] {
            Statement::For { init, .. } => {
                assert!(matches!(init, Some(ForInit::Declaration(_))));
            }
            other => panic!("expected for, got {other:?}"),
        }
        match &program.body[1] {
            Statement::For {
                init, test, update, ..
            } => assert!(init.is_none() && test.is_none() && update.is_none()),
            other => panic!("expected for, got {other:?}"),
        }
        match &program.body[2] {
            Statement::ForIn {
                declaration,
                key,
                value,
                ..
            } => {
                assert!(declaration.is_none());
                assert_eq!(key.name, "x");
                assert!(value.is_none());
            }
            other => panic!("expected for-in, got {other:?}"),
        }
    }

    #[test]
    fn switch_and_try() {
        let program = parse_ok(
            "switch (x) { case 1: a(); break; case 2: default: b(); }
             try { risky(); } catch (e) { print(e); }
             try { risky(); } catch { }",
        );
        match &program.body[0] {
            Statement::Switch { cases, .. } => {
                assert_eq!(cases.len(), 3);
                assert!(cases[2].test.is_none());
                assert!(cases[1].consequent.is_empty());
            }
            other => panic!("expected switch, got {other:?}"),
        }
        match &program.body[2] {
            Statement::Try { handler, .. } => {
                assert!(handler.as_ref().is_some_and(|h| h.param.is_none()));
            }
            other => panic!("expected try, got {other:?}"),
        }
    }

    #[test]
    fn imports_and_exports() {
        let program = parse_ok(
            "import { a, b as c } from 'm';
             import * as ns from 'fs';
             import d, { e } from './x.uc';
             export let x = 1;
             export function f() {}
             export { x as y };
             export default f;",
        );
        match &program.body[0] {
            Statement::Import(import) => {
                assert_eq!(import.source, "m");
                assert_eq!(import.specifiers.len(), 2);
                assert_eq!(import.specifiers[1].local().name, "c");
            }
            other => panic!("expected import, got {other:?}"),
        }
        match &program.body[1] {
            Statement::Import(import) => {
                assert!(matches!(import.specifiers[0], ImportSpecifier::Namespace { .. }));
            }
            other => panic!("expected import, got {other:?}"),
        }
        assert!(matches!(
            program.body[3],
            Statement::Export(ExportDeclaration::Declaration { .. })
        ));
        assert!(matches!(
            program.body[5],
            Statement::Export(ExportDeclaration::Named { .. })
        ));
        assert!(matches!(
            program.body[6],
            Statement::Export(ExportDeclaration::Default { .. })
        ));
    }

    #[test]
    fn error_is_contained_to_one_statement() {
        let output = parse_source("let x = 1; let = ; let y = 2;");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.program.expect("program").body.len(), 2);
    }

    #[test]
    fn recovery_inside_blocks() {
        let output = parse_source("function f() { let = 1; return 2; } let z = 3;");
        assert_eq!(output.diagnostics.len(), 1);
        let program = output.program.expect("program");
        assert_eq!(program.body.len(), 2);
        match &program.body[0] {
            Statement::Function(function) => match &function.body {
                FunctionBody::Block(block) => assert_eq!(block.body.len(), 1),
                FunctionBody::Expression(_) => panic!("expected block body"),
            },
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn missing_semicolon_keeps_statement() {
        let output = parse_source("let a = 1 let b = 2;");
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0].message.contains("Expected ';'"));
        assert_eq!(output.program.expect("program").body.len(), 2);
    }

    #[test]
    fn semicolon_optional_before_brace_and_eof() {
        parse_ok("function f() { return 1 }");
        parse_ok("x = 1");
    }

    #[test]
    fn lexical_errors_become_diagnostics() {
        let output = parse_source("let s = \"open");
        assert!(
            output
                .diagnostics
                .iter()
                .any(|d| d.message.contains("Unterminated string"))
        );
    }

    #[test]
    fn stray_slash_is_reported_once() {
        let output = parse_source("let x = 1;\n/\nlet y = 2;");
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0].message.contains("did you mean"));
        assert_eq!(output.program.expect("program").body.len(), 2);
    }

    #[test]
    fn unbalanced_closing_brace_progresses() {
        let output = parse_source("} let a = 1;");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.program.expect("program").body.len(), 1);
    }

    #[test]
    fn excessive_nesting_yields_no_program() {
        let source = format!("x = {}1{};", "(".repeat(400), ")".repeat(400));
        let output = parse_source(&source);
        assert!(output.program.is_none());
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0].message.contains("too deep"));
    }

    #[test]
    fn moderate_nesting_is_fine() {
        let source = format!("x = {}1{};", "[".repeat(100), "]".repeat(100));
        parse_ok(&source);
    }

    #[test]
    fn template_file_statements() {
        let output = parse_template("Hi {{ name }}!{% if (x): %}yes{% else %}no{% endif %}");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let program = output.program.expect("program");
        assert_eq!(program.body.len(), 4);
        assert!(matches!(program.body[0], Statement::Text { .. }));
        assert!(matches!(program.body[1], Statement::Echo { .. }));
        assert!(matches!(program.body[3], Statement::If { .. }));
    }

    #[test]
    fn spans_nest_in_realistic_program() {
        let program = parse_ok(
            "import { a } from 'm';
             function f(x, ...y) {
                 let o = { k: [1, , x?.z], [x]: `t${x}` };
                 for (let i = 0; i < 3; i++) o.k[i] += i ** 2;
                 switch (x) { case 1: return (a, b) => a ?? b; default: break; }
                 try { g(...y); } catch (e) { print(e); }
                 return x ? /re/g : -x;
             }",
        );
        assert_spans_nested(&program);
    }

    #[test]
    fn binary_operator_mapping() {
        match expression("a !== b;") {
            Expression::Binary { operator, .. } => {
                assert_eq!(operator, BinaryOperator::StrictNotEqual);
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }
}
