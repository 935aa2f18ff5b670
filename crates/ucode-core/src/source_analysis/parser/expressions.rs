// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing.
//!
//! `parse_precedence` is the Pratt loop: it runs the prefix rule of the
//! current token, then keeps folding infix rules whose precedence is at
//! least the requested minimum. Every rule function lives here and is
//! wired up in [`super::rule`].

use ecow::EcoString;

use super::{PResult, Parser, Precedence, rule};
use crate::ast::{
    AssignmentOperator, BinaryOperator, Element, Expression, Function, FunctionBody, Identifier,
    Literal, LogicalOperator, MemberProperty, Property, PropertyKey, UnaryOperator,
    UpdateOperator,
};
use crate::source_analysis::{Span, SyntaxError, TokenKind};

/// Reserved words accepted as bare object keys: `{ default: 1, if: 2 }`.
const KEYWORD_PROPERTY_NAMES: &[&str] = &[
    "break", "case", "catch", "const", "continue", "default", "delete", "elif", "else", "endfor",
    "endfunction", "endif", "endwhile", "export", "false", "for", "function", "if", "import", "in",
    "let", "null", "return", "switch", "this", "true", "try", "while",
];

impl Parser {
    // ========================================================================
    // Entry Points
    // ========================================================================

    /// Parses a full expression, including the comma operator.
    pub(super) fn parse_expression(&mut self) -> PResult<Expression> {
        self.parse_precedence(Precedence::Comma)
    }

    /// Parses an expression that stops at a top-level comma: arguments,
    /// array elements, initializers and property values.
    pub(super) fn parse_argument(&mut self) -> PResult<Expression> {
        self.parse_precedence(Precedence::Assignment)
    }

    pub(super) fn parse_precedence(&mut self, min: Precedence) -> PResult<Expression> {
        // Grow the stack on demand for deeply nested expressions.
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            self.enter_nesting()?;
            let result = self.parse_precedence_inner(min);
            self.leave_nesting();
            result
        })
    }

    fn parse_precedence_inner(&mut self, min: Precedence) -> PResult<Expression> {
        let Some(prefix) = rule(self.current_kind()).prefix else {
            return Err(self.error_at_current("Expected expression"));
        };
        let mut left = prefix(self)?;

        loop {
            let rule = rule(self.current_kind());
            let Some(infix) = rule.infix else {
                break;
            };
            if rule.precedence < min {
                break;
            }
            left = infix(self, left)?;
        }
        Ok(left)
    }

    pub(super) fn expect_identifier(&mut self, message: &str) -> PResult<Identifier> {
        let token = self.current_token();
        if let TokenKind::Identifier(name) = token.kind() {
            let identifier = Identifier::new(name.clone(), token.span());
            self.advance();
            Ok(identifier)
        } else {
            Err(self.error_at_current(message))
        }
    }

    // ========================================================================
    // Prefix Rules
    // ========================================================================

    pub(super) fn parse_identifier_or_arrow(&mut self) -> PResult<Expression> {
        let identifier = self.expect_identifier("Expected identifier")?;
        if self.match_token(&TokenKind::Arrow) {
            let start = identifier.span;
            return self.parse_arrow_body(start, vec![identifier], None);
        }
        Ok(Expression::Identifier(identifier))
    }

    pub(super) fn parse_literal(&mut self) -> PResult<Expression> {
        let token = self.advance();
        let literal = match token.kind() {
            TokenKind::Integer(value) => Literal::Integer(*value),
            TokenKind::Double(value) => Literal::Double(*value),
            TokenKind::String(value) => Literal::String(value.clone()),
            TokenKind::True => Literal::Boolean(true),
            TokenKind::False => Literal::Boolean(false),
            TokenKind::Null => Literal::Null,
            other => {
                return Err(SyntaxError::new(
                    format!("Expected literal, found {other}"),
                    token.span(),
                ));
            }
        };
        Ok(Expression::Literal(literal, token.span()))
    }

    pub(super) fn parse_this(&mut self) -> PResult<Expression> {
        Ok(Expression::This(self.advance().span()))
    }

    pub(super) fn parse_regex(&mut self) -> PResult<Expression> {
        let token = self.advance();
        match token.kind() {
            TokenKind::Regex { pattern, flags } => Ok(Expression::Regex {
                pattern: pattern.clone(),
                flags: flags.clone(),
                span: token.span(),
            }),
            other => Err(SyntaxError::new(
                format!("Expected regular expression, found {other}"),
                token.span(),
            )),
        }
    }

    /// `` `text${expr}text` `` arrives as chunk, expression, placeholder end,
    /// repeated, then a tail.
    pub(super) fn parse_template(&mut self) -> PResult<Expression> {
        let start = self.current_token().span();
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();

        loop {
            let token = self.advance();
            match token.kind() {
                TokenKind::TemplateTail(text) => {
                    quasis.push(text.clone());
                    break;
                }
                TokenKind::TemplateChunk(text) => {
                    quasis.push(text.clone());
                    expressions.push(self.parse_expression()?);
                    self.expect(
                        &TokenKind::PlaceholderEnd,
                        "Expected '}' to close template placeholder",
                    )?;
                    if !matches!(
                        self.current_kind(),
                        TokenKind::TemplateChunk(_) | TokenKind::TemplateTail(_)
                    ) {
                        // Unterminated; the lexer already reported it.
                        quasis.push(EcoString::new());
                        break;
                    }
                }
                other => {
                    return Err(SyntaxError::new(
                        format!("Expected template literal, found {other}"),
                        token.span(),
                    ));
                }
            }
        }

        Ok(Expression::Template {
            quasis,
            expressions,
            span: self.span_from(start),
        })
    }

    pub(super) fn parse_array(&mut self) -> PResult<Expression> {
        let open = self.advance().span();
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RightBracket) && !self.is_at_end() {
            if self.check(&TokenKind::Comma) {
                let comma = self.advance().span();
                elements.push(Element::Hole(Span::point(comma.start())));
                continue;
            }
            elements.push(self.parse_element()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBracket, "Expected ']' after array elements")?;

        Ok(Expression::Array {
            elements,
            span: self.span_from(open),
        })
    }

    pub(super) fn parse_object(&mut self) -> PResult<Expression> {
        let open = self.advance().span();
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            properties.push(self.parse_property()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace, "Expected '}' after object properties")?;

        Ok(Expression::Object {
            properties,
            span: self.span_from(open),
        })
    }

    fn parse_property(&mut self) -> PResult<Property> {
        let start = self.current_token().span();

        if self.match_token(&TokenKind::Ellipsis) {
            let argument = self.parse_argument()?;
            return Ok(Property::Spread {
                argument,
                span: self.span_from(start),
            });
        }

        let key = match self.current_kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                let identifier = Identifier::new(name, start);
                if self.check(&TokenKind::Comma) || self.check(&TokenKind::RightBrace) {
                    return Ok(Property::KeyValue {
                        key: PropertyKey::Named(identifier.clone()),
                        value: Expression::Identifier(identifier),
                        shorthand: true,
                        span: start,
                    });
                }
                PropertyKey::Named(identifier)
            }
            TokenKind::String(value) => {
                self.advance();
                PropertyKey::Literal(Literal::String(value), start)
            }
            TokenKind::Integer(value) => {
                self.advance();
                PropertyKey::Literal(Literal::Integer(value), start)
            }
            TokenKind::Double(value) => {
                self.advance();
                PropertyKey::Literal(Literal::Double(value), start)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let expression = self.parse_argument()?;
                self.expect(&TokenKind::RightBracket, "Expected ']' after computed key")?;
                PropertyKey::Computed(Box::new(expression), self.span_from(start))
            }
            kind => match kind
                .as_str()
                .filter(|word| KEYWORD_PROPERTY_NAMES.contains(word))
            {
                Some(word) => {
                    self.advance();
                    PropertyKey::Named(Identifier::new(word, start))
                }
                None => return Err(self.error_at_current("Expected property name")),
            },
        };

        self.expect(&TokenKind::Colon, "Expected ':' after property key")?;
        let value = self.parse_argument()?;
        Ok(Property::KeyValue {
            key,
            value,
            shorthand: false,
            span: self.span_from(start),
        })
    }

    /// An argument or array element, which may be a spread.
    fn parse_element(&mut self) -> PResult<Element> {
        let start = self.current_token().span();
        if self.match_token(&TokenKind::Ellipsis) {
            let argument = self.parse_argument()?;
            return Ok(Element::Spread {
                argument,
                span: self.span_from(start),
            });
        }
        Ok(Element::Expression(self.parse_argument()?))
    }

    /// `( ... )` is either a parenthesized expression or an arrow function's
    /// parameter list. The parameter list is tried first; on failure the
    /// cursor is rewound and the tokens are reparsed as a grouping.
    pub(super) fn parse_group_or_arrow(&mut self) -> PResult<Expression> {
        let open = self.current_token().span();
        let checkpoint = self.current;
        if let Ok((params, rest)) = self.parse_parameters() {
            if self.match_token(&TokenKind::Arrow) {
                return self.parse_arrow_body(open, params, rest);
            }
        }
        // Parameter parsing reports nothing, so rewinding leaves no trace.
        self.current = checkpoint;

        self.advance();
        let inner = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "Expected ')' after expression")?;
        Ok(inner)
    }

    fn parse_arrow_body(
        &mut self,
        start: Span,
        params: Vec<Identifier>,
        rest: Option<Identifier>,
    ) -> PResult<Expression> {
        let body = if self.check(&TokenKind::LeftBrace) {
            FunctionBody::Block(self.parse_block()?)
        } else {
            FunctionBody::Expression(Box::new(self.parse_argument()?))
        };
        let span = start.merge(body.span());
        Ok(Expression::Function(Box::new(Function {
            name: None,
            params,
            rest,
            body,
            is_arrow: true,
            span,
        })))
    }

    pub(super) fn parse_function_expression(&mut self) -> PResult<Expression> {
        let function = self.parse_function(false)?;
        Ok(Expression::Function(Box::new(function)))
    }

    /// Parses `function [name](params) body` starting at the keyword.
    pub(super) fn parse_function(&mut self, require_name: bool) -> PResult<Function> {
        let start = self.advance().span();
        let name = if require_name || matches!(self.current_kind(), TokenKind::Identifier(_)) {
            Some(self.expect_identifier("Expected function name")?)
        } else {
            None
        };
        let (params, rest) = self.parse_parameters()?;

        let body = if self.check(&TokenKind::Colon) {
            let block = self.parse_colon_body(&[TokenKind::EndFunction])?;
            self.expect(&TokenKind::EndFunction, "Expected 'endfunction'")?;
            block
        } else {
            self.parse_block()?
        };

        Ok(Function {
            name,
            params,
            rest,
            body: FunctionBody::Block(body),
            is_arrow: false,
            span: self.span_from(start),
        })
    }

    fn parse_parameters(&mut self) -> PResult<(Vec<Identifier>, Option<Identifier>)> {
        self.expect(&TokenKind::LeftParen, "Expected '(' before parameters")?;
        let mut params = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            if self.match_token(&TokenKind::Ellipsis) {
                rest = Some(self.expect_identifier("Expected rest parameter name")?);
                break;
            }
            params.push(self.expect_identifier("Expected parameter name")?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "Expected ')' after parameters")?;
        Ok((params, rest))
    }

    pub(super) fn parse_unary(&mut self) -> PResult<Expression> {
        let token = self.advance();
        let operator = match token.kind() {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Tilde => UnaryOperator::BitNot,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Delete => UnaryOperator::Delete,
            other => {
                return Err(SyntaxError::new(
                    format!("Expected unary operator, found {other}"),
                    token.span(),
                ));
            }
        };
        let argument = self.parse_precedence(Precedence::Unary)?;
        let span = token.span().merge(argument.span());
        Ok(Expression::Unary {
            operator,
            argument: Box::new(argument),
            span,
        })
    }

    pub(super) fn parse_prefix_update(&mut self) -> PResult<Expression> {
        let token = self.advance();
        let operator = update_operator(token.kind());
        let argument = self.parse_precedence(Precedence::Unary)?;
        check_update_target(&argument)?;
        let span = token.span().merge(argument.span());
        Ok(Expression::Update {
            operator,
            prefix: true,
            argument: Box::new(argument),
            span,
        })
    }

    // ========================================================================
    // Infix Rules
    // ========================================================================

    pub(super) fn parse_postfix_update(&mut self, argument: Expression) -> PResult<Expression> {
        let token = self.advance();
        check_update_target(&argument)?;
        let span = argument.span().merge(token.span());
        Ok(Expression::Update {
            operator: update_operator(token.kind()),
            prefix: false,
            argument: Box::new(argument),
            span,
        })
    }

    pub(super) fn parse_binary(&mut self, left: Expression) -> PResult<Expression> {
        let token = self.advance();
        let Some(operator) = binary_operator(token.kind()) else {
            return Err(SyntaxError::new(
                format!("Expected binary operator, found {}", token.kind()),
                token.span(),
            ));
        };
        let precedence = rule(token.kind()).precedence;
        // `**` is right-associative.
        let right_precedence = if operator == BinaryOperator::Exponent {
            precedence
        } else {
            precedence.next()
        };
        let right = self.parse_precedence(right_precedence)?;
        let span = left.span().merge(right.span());
        Ok(Expression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }

    pub(super) fn parse_logical(&mut self, left: Expression) -> PResult<Expression> {
        let token = self.advance();
        let operator = match token.kind() {
            TokenKind::AmpAmp => LogicalOperator::And,
            TokenKind::PipePipe => LogicalOperator::Or,
            _ => LogicalOperator::NullishCoalescing,
        };
        let right = self.parse_precedence(rule(token.kind()).precedence.next())?;
        let span = left.span().merge(right.span());
        Ok(Expression::Logical {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }

    pub(super) fn parse_assignment(&mut self, target: Expression) -> PResult<Expression> {
        let token = self.advance();
        let Some(operator) = assignment_operator(token.kind()) else {
            return Err(SyntaxError::new(
                format!("Expected assignment operator, found {}", token.kind()),
                token.span(),
            ));
        };
        if !is_assignable(&target) {
            return Err(SyntaxError::new("Invalid assignment target", target.span()));
        }
        let value = self.parse_precedence(Precedence::Assignment)?;
        let span = target.span().merge(value.span());
        Ok(Expression::Assignment {
            operator,
            target: Box::new(target),
            value: Box::new(value),
            span,
        })
    }

    pub(super) fn parse_conditional(&mut self, test: Expression) -> PResult<Expression> {
        self.advance();
        let consequent = self.parse_argument()?;
        self.expect(&TokenKind::Colon, "Expected ':' in conditional expression")?;
        let alternate = self.parse_argument()?;
        let span = test.span().merge(alternate.span());
        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span,
        })
    }

    pub(super) fn parse_sequence(&mut self, first: Expression) -> PResult<Expression> {
        let start = first.span();
        let mut expressions = vec![first];
        while self.match_token(&TokenKind::Comma) {
            expressions.push(self.parse_argument()?);
        }
        Ok(Expression::Sequence {
            expressions,
            span: self.span_from(start),
        })
    }

    pub(super) fn parse_call(&mut self, callee: Expression) -> PResult<Expression> {
        let token = self.advance();
        let optional = matches!(token.kind(), TokenKind::QuestionDotParen);
        let mut arguments = Vec::new();

        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            arguments.push(self.parse_element()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "Expected ')' after arguments")?;

        Ok(Expression::Call {
            span: self.span_from(callee.span()),
            callee: Box::new(callee),
            arguments,
            optional,
        })
    }

    pub(super) fn parse_member(&mut self, object: Expression) -> PResult<Expression> {
        let token = self.advance();
        let optional = matches!(token.kind(), TokenKind::QuestionDot);
        let name = self.expect_identifier("Expected property name after '.'")?;
        Ok(Expression::Member {
            span: object.span().merge(name.span),
            object: Box::new(object),
            property: MemberProperty::Named(name),
            optional,
        })
    }

    pub(super) fn parse_computed_member(&mut self, object: Expression) -> PResult<Expression> {
        let token = self.advance();
        let optional = matches!(token.kind(), TokenKind::QuestionDotBracket);
        let index = self.parse_expression()?;
        self.expect(&TokenKind::RightBracket, "Expected ']' after index")?;
        Ok(Expression::Member {
            span: self.span_from(object.span()),
            object: Box::new(object),
            property: MemberProperty::Computed(Box::new(index)),
            optional,
        })
    }
}

// ============================================================================
// Operator Mapping
// ============================================================================

fn binary_operator(kind: &TokenKind) -> Option<BinaryOperator> {
    use BinaryOperator as B;
    Some(match kind {
        TokenKind::Plus => B::Add,
        TokenKind::Minus => B::Subtract,
        TokenKind::Star => B::Multiply,
        TokenKind::Slash => B::Divide,
        TokenKind::Percent => B::Modulo,
        TokenKind::StarStar => B::Exponent,
        TokenKind::Amp => B::BitAnd,
        TokenKind::Pipe => B::BitOr,
        TokenKind::Caret => B::BitXor,
        TokenKind::ShiftLeft => B::ShiftLeft,
        TokenKind::ShiftRight => B::ShiftRight,
        TokenKind::EqEq => B::Equal,
        TokenKind::NotEq => B::NotEqual,
        TokenKind::EqEqEq => B::StrictEqual,
        TokenKind::NotEqEq => B::StrictNotEqual,
        TokenKind::Less => B::Less,
        TokenKind::LessEq => B::LessEqual,
        TokenKind::Greater => B::Greater,
        TokenKind::GreaterEq => B::GreaterEqual,
        TokenKind::In => B::In,
        _ => return None,
    })
}

fn assignment_operator(kind: &TokenKind) -> Option<AssignmentOperator> {
    use AssignmentOperator as A;
    use BinaryOperator as B;
    Some(match kind {
        TokenKind::Assign => A::Assign,
        TokenKind::PlusAssign => A::Compound(B::Add),
        TokenKind::MinusAssign => A::Compound(B::Subtract),
        TokenKind::StarAssign => A::Compound(B::Multiply),
        TokenKind::SlashAssign => A::Compound(B::Divide),
        TokenKind::PercentAssign => A::Compound(B::Modulo),
        TokenKind::StarStarAssign => A::Compound(B::Exponent),
        TokenKind::ShiftLeftAssign => A::Compound(B::ShiftLeft),
        TokenKind::ShiftRightAssign => A::Compound(B::ShiftRight),
        TokenKind::AmpAssign => A::Compound(B::BitAnd),
        TokenKind::PipeAssign => A::Compound(B::BitOr),
        TokenKind::CaretAssign => A::Compound(B::BitXor),
        TokenKind::AmpAmpAssign => A::Logical(LogicalOperator::And),
        TokenKind::PipePipeAssign => A::Logical(LogicalOperator::Or),
        TokenKind::QuestionQuestionAssign => A::Logical(LogicalOperator::NullishCoalescing),
        _ => return None,
    })
}

fn update_operator(kind: &TokenKind) -> UpdateOperator {
    if matches!(kind, TokenKind::MinusMinus) {
        UpdateOperator::Decrement
    } else {
        UpdateOperator::Increment
    }
}

/// Only plain names and non-optional member accesses can be assigned.
fn is_assignable(expression: &Expression) -> bool {
    matches!(
        expression,
        Expression::Identifier(_) | Expression::Member {
            optional: false,
            ..
        }
    )
}

fn check_update_target(argument: &Expression) -> PResult<()> {
    if is_assignable(argument) {
        Ok(())
    } else {
        Err(SyntaxError::new(
            "Invalid increment/decrement operand",
            argument.span(),
        ))
    }
}
