// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for ucode source code.
//!
//! The lexer is hand-written because ucode's grammar is context sensitive:
//! whether `/` divides or starts a regular expression depends on the
//! previous token, reserved words become plain labels after `.`, and
//! backtick templates switch between text and code.
//!
//! # States
//!
//! Lexing is driven by an explicit stack of [`LexState`]s:
//!
//! - `Code`: ordinary tokens
//! - `Template`: literal text inside a backtick string
//! - `Placeholder`: code inside `${ ... }`, tracking brace depth so the
//!   matching `}` returns to `Template`
//! - `Text` and `Block`: template files (`{{ expr }}`, `{% stmt %}`), used
//!   only with [`SourceMode::Template`]
//!
//! # Error recovery
//!
//! The lexer never fails. Malformed input becomes a [`TokenKind::Error`]
//! token covering the offending text and lexing continues after it.
//!
//! # Example
//!
//! ```
//! use ucode_core::source_analysis::{tokenize, TokenKind};
//!
//! let tokens = tokenize("let x = a / b;");
//! assert!(tokens.iter().any(|t| t.kind() == &TokenKind::Slash));
//! assert!(tokens.last().unwrap().kind().is_eof());
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::{LexError, LexErrorKind, Span, Token, TokenKind};

/// Which grammar a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// A plain script: everything is code.
    #[default]
    Raw,
    /// A template file: text with embedded `{{ }}` and `{% %}` blocks.
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Expression,
    Statement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Code,
    Text,
    Block { kind: BlockKind, depth: u32 },
    Template,
    Placeholder { depth: u32 },
}

/// Operators and punctuation, longest first so that matching is greedy.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "**=", "<<=", ">>=", "&&=", "||=", "??=", "...", "?.[", "?.(", "==", "!=",
    "<=", ">=", "<<", ">>", "&&", "||", "??", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "?.", "=>", "+", "-", "*", "/", "%", "!", "~", "&", "|", "^", "=", "<",
    ">", "?", ":", ".", ",", ";", "(", ")", "[", "]",
];

/// Words which, following a lone `/` on the same line, suggest a mistyped
/// comment rather than a regular expression.
const STATEMENT_WORDS: &[&str] = &[
    "let", "const", "function", "if", "for", "while", "return", "break", "continue", "switch",
    "try", "import", "export",
];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A lexer that tokenizes ucode source code.
///
/// Use [`Lexer::next_token`] to pull tokens one at a time (it keeps
/// returning [`TokenKind::Eof`] once input is exhausted) or iterate, which
/// stops before `Eof`.
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    /// Byte offset of the next unread character.
    position: usize,
    states: Vec<LexState>,
    /// Set when the previous token ended an operand, so `/` divides.
    expression_ended: bool,
    /// Set right after `.` or `?.`; the next word is a property label.
    after_dot: bool,
    /// Set by `-}}`, `-%}` and `-#}`; strips leading whitespace of the next text.
    strip_next_text: bool,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("states", &self.states)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a lexer for a plain script.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self::with_mode(source, SourceMode::Raw)
    }

    /// Creates a lexer for the given source mode.
    #[must_use]
    pub fn with_mode(source: &'src str, mode: SourceMode) -> Self {
        let initial = match mode {
            SourceMode::Raw => LexState::Code,
            SourceMode::Template => LexState::Text,
        };
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            states: vec![initial],
            expression_ended: false,
            after_dot: false,
            strip_next_text: false,
        }
    }

    // ========================================================================
    // Character Management
    // ========================================================================

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n` characters past the next one (`peek_char_n(0) == peek_char()`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        Some(c)
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    fn rest(&self) -> &'src str {
        &self.source[self.position..]
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.current_position())
    }

    fn text_for(&self, span: Span) -> &'src str {
        &self.source[span.as_range()]
    }

    fn state(&self) -> LexState {
        self.states.last().copied().unwrap_or(LexState::Code)
    }

    // ========================================================================
    // Token Dispatch
    // ========================================================================

    /// Returns the next token, updating the regex and property-label flags.
    pub fn next_token(&mut self) -> Token {
        let token = self.scan_token();
        self.expression_ended = token.kind().ends_expression();
        self.after_dot = matches!(token.kind(), TokenKind::Dot | TokenKind::QuestionDot);
        token
    }

    fn scan_token(&mut self) -> Token {
        loop {
            let token = match self.state() {
                LexState::Template => {
                    let start = self.current_position();
                    Some(self.lex_template_segment(start))
                }
                LexState::Text => self.lex_text(),
                state => Some(self.lex_code(state)),
            };
            if let Some(token) = token {
                return token;
            }
        }
    }

    fn lex_code(&mut self, state: LexState) -> Token {
        if let Some(error) = self.skip_trivia() {
            return error.into_token();
        }

        let start = self.current_position();
        let Some(c) = self.peek_char() else {
            return Token::new(TokenKind::Eof, self.span_from(start));
        };

        if let LexState::Block { kind, depth: 0 } = state {
            if let Some(token) = self.lex_block_close(kind, start) {
                return token;
            }
        }

        let result = match c {
            c if is_ident_start(c) => Ok(self.lex_identifier_or_keyword()),
            '0'..='9' => self.lex_number(),
            '.' if !self.expression_ended
                && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) =>
            {
                self.lex_number()
            }
            '\'' | '"' => self.lex_string(c),
            '`' => {
                self.advance();
                self.states.push(LexState::Template);
                return self.lex_template_segment(start);
            }
            '/' if !self.expression_ended => self.lex_regex_or_stray_slash(),
            '{' => {
                self.advance();
                self.open_brace();
                Ok(TokenKind::LeftBrace)
            }
            '}' => {
                self.advance();
                Ok(self.close_brace())
            }
            _ => self.lex_punctuator().ok_or_else(|| {
                self.advance();
                LexErrorKind::UnexpectedCharacter(c)
            }),
        };

        let span = self.span_from(start);
        match result {
            Ok(kind) => Token::new(kind, span),
            Err(kind) => LexError::new(kind, span).into_token(),
        }
    }

    /// Skips whitespace, comments and a leading shebang line.
    ///
    /// Returns an error for an unterminated block comment.
    fn skip_trivia(&mut self) -> Option<LexError> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => self.advance_while(char::is_whitespace),
                Some('/') if self.peek_char_n(1) == Some('/') => {
                    self.advance_while(|c| c != '\n');
                }
                Some('/') if self.peek_char_n(1) == Some('*') => {
                    let start = self.current_position();
                    self.advance_by(2);
                    loop {
                        match self.peek_char() {
                            None => {
                                return Some(LexError::new(
                                    LexErrorKind::UnterminatedComment,
                                    self.span_from(start),
                                ));
                            }
                            Some('*') if self.peek_char_n(1) == Some('/') => {
                                self.advance_by(2);
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                        }
                    }
                }
                Some('#') if self.position == 0 && self.peek_char_n(1) == Some('!') => {
                    self.advance_while(|c| c != '\n');
                }
                _ => return None,
            }
        }
    }

    fn open_brace(&mut self) {
        match self.states.last_mut() {
            Some(LexState::Placeholder { depth } | LexState::Block { depth, .. }) => *depth += 1,
            _ => {}
        }
    }

    fn close_brace(&mut self) -> TokenKind {
        if self.state() == (LexState::Placeholder { depth: 0 }) {
            self.states.pop();
            return TokenKind::PlaceholderEnd;
        }
        if let Some(LexState::Placeholder { depth } | LexState::Block { depth, .. }) =
            self.states.last_mut()
        {
            *depth = depth.saturating_sub(1);
        }
        TokenKind::RightBrace
    }

    fn lex_punctuator(&mut self) -> Option<TokenKind> {
        let rest = self.rest();
        let mut op = *PUNCTUATORS.iter().find(|op| rest.starts_with(**op))?;
        // `a?.5:1` is a conditional, not an optional chain.
        if op == "?." && rest[2..].starts_with(|c: char| c.is_ascii_digit()) {
            op = "?";
        }
        self.advance_by(op.len());
        TokenKind::punctuator(op)
    }

    fn lex_identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.current_position();
        self.advance_while(is_ident_continue);
        let text = self.text_for(self.span_from(start));
        if !self.after_dot {
            if let Some(keyword) = TokenKind::keyword(text) {
                return keyword;
            }
        }
        TokenKind::Identifier(EcoString::from(text))
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    fn lex_number(&mut self) -> Result<TokenKind, LexErrorKind> {
        let start = self.current_position();
        let radix = match (self.peek_char(), self.peek_char_n(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('b' | 'B')) => Some(2),
            (Some('0'), Some('o' | 'O')) => Some(8),
            _ => None,
        };

        if let Some(radix) = radix {
            self.advance_by(2);
            let digits_start = self.current_position();
            self.advance_while(is_ident_continue);
            let digits = self.text_for(self.span_from(digits_start));
            return parse_radix(digits, radix)
                .ok_or_else(|| self.invalid_number(start));
        }

        if self.peek_char() == Some('0') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            let digits_start = self.current_position();
            self.advance_while(is_ident_continue);
            let digits = self.text_for(self.span_from(digits_start));
            return parse_radix(digits, 8).ok_or_else(|| self.invalid_number(start));
        }

        self.advance_while(|c| c.is_ascii_digit());
        let mut is_double = false;

        if self.peek_char() == Some('.') {
            let next = self.peek_char_n(1);
            let fraction = next.is_some_and(|c| c.is_ascii_digit())
                || !next.is_some_and(|c| is_ident_start(c) || c == '.');
            if fraction {
                self.advance();
                self.advance_while(|c| c.is_ascii_digit());
                is_double = true;
            }
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            let digit_at = if matches!(self.peek_char_n(1), Some('+' | '-')) {
                2
            } else {
                1
            };
            if self.peek_char_n(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.advance_by(digit_at);
                self.advance_while(|c| c.is_ascii_digit());
                is_double = true;
            }
        }

        if self.peek_char().is_some_and(is_ident_continue) {
            self.advance_while(is_ident_continue);
            return Err(self.invalid_number(start));
        }

        let text = self.text_for(self.span_from(start));
        if !is_double {
            if let Ok(value) = text.parse::<i64>() {
                return Ok(TokenKind::Integer(value));
            }
        }
        text.parse::<f64>()
            .map(TokenKind::Double)
            .map_err(|_| self.invalid_number(start))
    }

    fn invalid_number(&self, start: u32) -> LexErrorKind {
        LexErrorKind::InvalidNumber(EcoString::from(self.text_for(self.span_from(start))))
    }

    // ========================================================================
    // Strings and Templates
    // ========================================================================

    fn lex_string(&mut self, quote: char) -> Result<TokenKind, LexErrorKind> {
        self.advance();
        let mut value = String::new();
        let mut error = None;
        loop {
            match self.peek_char() {
                None => return Err(LexErrorKind::UnterminatedString),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    if let Err(kind) = self.lex_escape(&mut value) {
                        error.get_or_insert(kind);
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
        match error {
            Some(kind) => Err(kind),
            None => Ok(TokenKind::String(EcoString::from(value))),
        }
    }

    /// Lexes template text up to `${` or the closing backtick.
    ///
    /// `start` is where the segment's token begins: the opening backtick for
    /// the first segment, otherwise the position after a placeholder's `}`.
    fn lex_template_segment(&mut self, start: u32) -> Token {
        let mut value = String::new();
        let mut error = None;
        let kind = loop {
            match self.peek_char() {
                None => {
                    self.states.pop();
                    return LexError::new(LexErrorKind::UnterminatedTemplate, self.span_from(start))
                        .into_token();
                }
                Some('`') => {
                    self.advance();
                    self.states.pop();
                    break TokenKind::TemplateTail(EcoString::from(value));
                }
                Some('$') if self.peek_char_n(1) == Some('{') => {
                    self.advance_by(2);
                    self.states.push(LexState::Placeholder { depth: 0 });
                    break TokenKind::TemplateChunk(EcoString::from(value));
                }
                Some('\\') => {
                    self.advance();
                    if let Err(kind) = self.lex_escape(&mut value) {
                        error.get_or_insert(kind);
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        };
        let span = self.span_from(start);
        match error {
            Some(error) => LexError::new(error, span).into_token(),
            None => Token::new(kind, span),
        }
    }

    /// Decodes one escape sequence; the backslash is already consumed.
    fn lex_escape(&mut self, out: &mut String) -> Result<(), LexErrorKind> {
        let Some(c) = self.peek_char() else {
            return Ok(());
        };
        self.advance();
        match c {
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'e' => out.push('\u{1b}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek_char().and_then(|d| d.to_digit(8)) {
                        Some(digit) if value * 8 + digit <= 0xff => {
                            self.advance();
                            value = value * 8 + digit;
                        }
                        _ => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'x' => {
                let value = self.lex_hex_digits(2).ok_or(LexErrorKind::InvalidEscape('x'))?;
                out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'u' => {
                let unit = self.lex_hex_digits(4).ok_or(LexErrorKind::InvalidEscape('u'))?;
                out.push(self.decode_utf16_escape(unit));
            }
            other => out.push(other),
        }
        Ok(())
    }

    /// Combines a `\uXXXX` code unit with a following low surrogate escape.
    fn decode_utf16_escape(&mut self, unit: u32) -> char {
        match unit {
            0xd800..=0xdbff => {
                let low = (self.peek_char() == Some('\\') && self.peek_char_n(1) == Some('u'))
                    .then(|| self.peek_hex_digits(2, 4))
                    .flatten()
                    .filter(|low| (0xdc00..=0xdfff).contains(low));
                match low {
                    Some(low) => {
                        self.advance_by(6);
                        let code = 0x10000 + ((unit - 0xd800) << 10) + (low - 0xdc00);
                        char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
                    }
                    None => char::REPLACEMENT_CHARACTER,
                }
            }
            _ => char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER),
        }
    }

    fn peek_hex_digits(&self, offset: usize, count: usize) -> Option<u32> {
        (0..count).try_fold(0, |acc, i| {
            let digit = self.peek_char_n(offset + i)?.to_digit(16)?;
            Some(acc * 16 + digit)
        })
    }

    fn lex_hex_digits(&mut self, count: usize) -> Option<u32> {
        let value = self.peek_hex_digits(0, count)?;
        self.advance_by(count);
        Some(value)
    }

    // ========================================================================
    // Regular Expressions
    // ========================================================================

    /// Lexes `/pattern/flags` in a position where an operand is expected.
    fn lex_regex_or_stray_slash(&mut self) -> Result<TokenKind, LexErrorKind> {
        if self.is_stray_slash() {
            self.advance();
            return Err(LexErrorKind::StraySlash);
        }

        self.advance();
        let mut pattern = String::new();
        let mut in_class = false;
        let mut error = None;

        loop {
            match self.peek_char() {
                None | Some('\n') => return Err(LexErrorKind::UnterminatedRegex),
                Some('/') if !in_class => {
                    self.advance();
                    break;
                }
                Some('[') if !in_class => {
                    self.advance();
                    pattern.push('[');
                    in_class = true;
                    if self.peek_char() == Some('^') {
                        self.advance();
                        pattern.push('^');
                    }
                    if self.peek_char() == Some(']') {
                        self.advance();
                        pattern.push(']');
                    }
                }
                Some('[') if self.peek_char_n(1) == Some(':') => {
                    self.lex_posix_class(&mut pattern);
                }
                Some(']') if in_class => {
                    self.advance();
                    pattern.push(']');
                    in_class = false;
                }
                Some('\\') => {
                    self.advance();
                    let Some(c) = self.advance() else {
                        return Err(LexErrorKind::UnterminatedRegex);
                    };
                    if let Err(kind) = expand_regex_escape(c, in_class, &mut pattern) {
                        error.get_or_insert(kind);
                    }
                }
                Some(c) => {
                    self.advance();
                    pattern.push(c);
                }
            }
        }

        let mut flags = String::new();
        while let Some(c) = self.peek_char().filter(char::is_ascii_alphanumeric) {
            self.advance();
            if matches!(c, 'g' | 'i' | 's') {
                if !flags.contains(c) {
                    flags.push(c);
                }
            } else {
                error.get_or_insert(LexErrorKind::InvalidRegexFlag(c));
            }
        }

        match error {
            Some(kind) => Err(kind),
            None => Ok(TokenKind::Regex {
                pattern: EcoString::from(pattern),
                flags: EcoString::from(flags),
            }),
        }
    }

    /// Copies a `[:name:]` class inside a bracket expression verbatim.
    fn lex_posix_class(&mut self, pattern: &mut String) {
        let name_len = self.rest()[2..]
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(0);
        if self.rest()[2 + name_len..].starts_with(":]") {
            let class = &self.rest()[..name_len + 4];
            pattern.push_str(class);
            self.advance_by(name_len + 4);
        } else {
            self.advance();
            pattern.push('[');
        }
    }

    /// A `/` where an operand is expected that is most likely a mistyped
    /// comment: nothing else on the line, a block comment opener, or a
    /// statement keyword with no closing slash.
    fn is_stray_slash(&self) -> bool {
        let line = self.rest()[1..].split('\n').next().unwrap_or("");
        let trimmed = line.trim_start();
        if trimmed.trim_end().is_empty() || trimmed.starts_with("/*") {
            return true;
        }
        let word_len = trimmed.find(|c: char| !is_ident_continue(c)).unwrap_or(trimmed.len());
        STATEMENT_WORDS.contains(&&trimmed[..word_len]) && !trimmed.contains('/')
    }

    // ========================================================================
    // Template Files
    // ========================================================================

    /// Lexes raw text outside of template blocks and the opener that ends it.
    ///
    /// Returns `None` after skipping a `{# ... #}` comment.
    fn lex_text(&mut self) -> Option<Token> {
        if std::mem::take(&mut self.strip_next_text) {
            self.advance_while(char::is_whitespace);
        }

        let start = self.current_position();
        while !self.rest().is_empty() && !starts_block(self.rest()) {
            self.advance();
        }
        let span = self.span_from(start);
        let mut text = self.text_for(span);
        let trims_left = matches!(self.rest().as_bytes().get(2), Some(b'-'));
        if trims_left {
            text = text.trim_end();
        }
        if !text.is_empty() {
            return Some(Token::new(TokenKind::Text(EcoString::from(text)), span));
        }

        let start = self.current_position();
        let rest = self.rest();
        if rest.is_empty() {
            return Some(Token::new(TokenKind::Eof, self.span_from(start)));
        }

        let modifier = matches!(rest.as_bytes().get(2), Some(b'-' | b'+'));
        let kind = if rest.starts_with("{#") {
            return self.skip_template_comment(start);
        } else if rest.starts_with("{{") {
            self.states.push(LexState::Block {
                kind: BlockKind::Expression,
                depth: 0,
            });
            TokenKind::ExpressionOpen
        } else {
            self.states.push(LexState::Block {
                kind: BlockKind::Statement,
                depth: 0,
            });
            TokenKind::StatementOpen
        };
        self.advance_by(if modifier { 3 } else { 2 });
        Some(Token::new(kind, self.span_from(start)))
    }

    fn skip_template_comment(&mut self, start: u32) -> Option<Token> {
        self.advance_by(2);
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Some(
                    LexError::new(LexErrorKind::UnterminatedComment, self.span_from(start))
                        .into_token(),
                );
            }
            if rest.starts_with("-#}") {
                self.advance_by(3);
                self.strip_next_text = true;
                return None;
            }
            if rest.starts_with("#}") {
                self.advance_by(2);
                return None;
            }
            self.advance();
        }
    }

    /// Recognizes `}}`, `-}}`, `%}` and `-%}` at the top level of a block.
    fn lex_block_close(&mut self, kind: BlockKind, start: u32) -> Option<Token> {
        let (close, token) = match kind {
            BlockKind::Expression => ("}}", TokenKind::ExpressionClose),
            BlockKind::Statement => ("%}", TokenKind::StatementClose),
        };
        let rest = self.rest();
        let len = if rest.starts_with(close) {
            2
        } else if rest.starts_with('-') && rest[1..].starts_with(close) {
            self.strip_next_text = true;
            3
        } else {
            return None;
        };
        self.advance_by(len);
        self.states.pop();
        Some(Token::new(token, self.span_from(start)))
    }
}

fn starts_block(text: &str) -> bool {
    text.starts_with("{{") || text.starts_with("{%") || text.starts_with("{#")
}

fn parse_radix(digits: &str, radix: u32) -> Option<TokenKind> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    match i64::from_str_radix(digits, radix) {
        Ok(value) => Some(TokenKind::Integer(value)),
        Err(_) => {
            let value = digits.chars().fold(0.0_f64, |acc, c| {
                acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
            });
            Some(TokenKind::Double(value))
        }
    }
}

/// Expands `\d`, `\w` and `\s` (and their negations) to POSIX classes.
fn expand_regex_escape(c: char, in_class: bool, pattern: &mut String) -> Result<(), LexErrorKind> {
    let expansion = match (c, in_class) {
        ('d', false) => "[[:digit:]]",
        ('D', false) => "[^[:digit:]]",
        ('w', false) => "[[:alnum:]_]",
        ('W', false) => "[^[:alnum:]_]",
        ('s', false) => "[[:space:]]",
        ('S', false) => "[^[:space:]]",
        ('d', true) => "[:digit:]",
        ('w', true) => "[:alnum:]_",
        ('s', true) => "[:space:]",
        ('D' | 'W' | 'S', true) => return Err(LexErrorKind::InvalidRegexClass),
        ('/', _) => "/",
        (other, _) => {
            pattern.push('\\');
            pattern.push(other);
            return Ok(());
        }
    };
    pattern.push_str(expansion);
    Ok(())
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind().is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

/// Tokenizes a plain script. The result always ends with exactly one
/// [`TokenKind::Eof`].
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_with_mode(source, SourceMode::Raw)
}

/// Tokenizes a document in the given mode, ending with one `Eof` token.
#[must_use]
pub fn tokenize_with_mode(source: &str, mode: SourceMode) -> Vec<Token> {
    let mut lexer = Lexer::with_mode(source, mode);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let is_eof = token.kind().is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tracing::trace!(count = tokens.len(), ?mode, "tokenized document");
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(Token::into_kind).collect()
    }

    fn template_kinds(source: &str) -> Vec<TokenKind> {
        Lexer::with_mode(source, SourceMode::Template)
            .map(Token::into_kind)
            .collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(name.into())
    }

    fn string(value: &str) -> TokenKind {
        TokenKind::String(value.into())
    }

    fn single(source: &str) -> TokenKind {
        let mut tokens = kinds(source);
        assert_eq!(tokens.len(), 1, "expected one token for {source:?}: {tokens:?}");
        tokens.remove(0)
    }

    fn assert_error(source: &str, fragment: &str) {
        let tokens = kinds(source);
        assert!(
            tokens
                .iter()
                .any(|k| matches!(k, TokenKind::Error(m) if m.contains(fragment))),
            "expected error containing {fragment:?} in {tokens:?}"
        );
    }

    #[test]
    fn empty_input_is_a_single_eof() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].kind().is_eof());
        assert_eq!(tokens[0].span(), Span::new(0, 0));
    }

    #[test]
    fn eof_repeats_after_end() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().into_kind(), ident("x"));
        assert!(lexer.next_token().kind().is_eof());
        assert!(lexer.next_token().kind().is_eof());
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("let x = null; const y"),
            vec![
                TokenKind::Let,
                ident("x"),
                TokenKind::Assign,
                TokenKind::Null,
                TokenKind::Semicolon,
                TokenKind::Const,
                ident("y"),
            ]
        );
        assert_eq!(single("from"), ident("from"));
    }

    #[test]
    fn keyword_after_dot_is_a_label() {
        assert_eq!(
            kinds("obj.if + a?.delete"),
            vec![
                ident("obj"),
                TokenKind::Dot,
                ident("if"),
                TokenKind::Plus,
                ident("a"),
                TokenKind::QuestionDot,
                ident("delete"),
            ]
        );
        // Only the word directly after the dot is affected.
        assert_eq!(kinds("a.b if")[3], TokenKind::If);
    }

    #[test]
    fn longest_match_operators() {
        assert_eq!(
            kinds("a >>= b"),
            vec![ident("a"), TokenKind::ShiftRightAssign, ident("b")]
        );
        assert_eq!(
            kinds("a === b !== c ??= d ** e"),
            vec![
                ident("a"),
                TokenKind::EqEqEq,
                ident("b"),
                TokenKind::NotEqEq,
                ident("c"),
                TokenKind::QuestionQuestionAssign,
                ident("d"),
                TokenKind::StarStar,
                ident("e"),
            ]
        );
        assert_eq!(single("..."), TokenKind::Ellipsis);
        assert_eq!(single("=>"), TokenKind::Arrow);
    }

    #[test]
    fn optional_chaining_tokens() {
        assert_eq!(kinds("a?.[0]")[1], TokenKind::QuestionDotBracket);
        assert_eq!(kinds("f?.(1)")[1], TokenKind::QuestionDotParen);
        assert_eq!(
            kinds("c?.5:1"),
            vec![
                ident("c"),
                TokenKind::Question,
                TokenKind::Double(0.5),
                TokenKind::Colon,
                TokenKind::Integer(1),
            ]
        );
    }

    #[test]
    fn division_after_operand() {
        assert_eq!(kinds("a / b"), vec![ident("a"), TokenKind::Slash, ident("b")]);
        assert_eq!(kinds("x++ / 2")[2], TokenKind::Slash);
        assert_eq!(kinds("(a) / 2")[3], TokenKind::Slash);
        assert_eq!(kinds("a /= 2")[1], TokenKind::SlashAssign);
    }

    #[test]
    fn regex_in_operand_position() {
        assert_eq!(
            kinds("(/abc/)"),
            vec![
                TokenKind::LeftParen,
                TokenKind::Regex {
                    pattern: "abc".into(),
                    flags: "".into()
                },
                TokenKind::RightParen,
            ]
        );
        assert!(matches!(kinds("return /x/")[1], TokenKind::Regex { .. }));
    }

    #[test]
    fn regex_macros_expand_to_posix_classes() {
        assert_eq!(
            kinds("x = /a\\d+\\S/gi")[2],
            TokenKind::Regex {
                pattern: "a[[:digit:]]+[^[:space:]]".into(),
                flags: "gi".into()
            }
        );
        assert_eq!(
            kinds("x = /[\\w.][[:alpha:]]/")[2],
            TokenKind::Regex {
                pattern: "[[:alnum:]_.][[:alpha:]]".into(),
                flags: "".into()
            }
        );
        assert_eq!(
            kinds("x = /[^/]\\//")[2],
            TokenKind::Regex {
                pattern: "[^/]/".into(),
                flags: "".into()
            }
        );
    }

    #[test]
    fn regex_errors() {
        assert_error("x = /[\\D]/", "character class");
        assert_error("x = /abc/x", "flag 'x'");
        assert_error("x = /abc", "Unterminated regular expression");
    }

    #[test]
    fn stray_slash_suggests_comment() {
        let source = "let x = 1;\n/\nlet y = 2;";
        let tokens = tokenize(source);
        let error = tokens
            .iter()
            .find(|t| t.kind().is_error())
            .expect("stray slash error");
        assert_eq!(error.span(), Span::new(11, 12));
        assert!(error.kind().to_string().contains("did you mean '//'"));
        assert_eq!(
            tokens.iter().filter(|t| t.kind() == &TokenKind::Let).count(),
            2
        );
        assert_error("/ let z = 3;", "did you mean");
        assert_error("/ /* note */", "did you mean");
    }

    #[test]
    fn regex_starting_with_keyword_is_not_stray() {
        assert!(matches!(kinds("x = /if/")[2], TokenKind::Regex { .. }));
    }

    #[test]
    fn numbers() {
        assert_eq!(single("42"), TokenKind::Integer(42));
        assert_eq!(single("0x1F"), TokenKind::Integer(31));
        assert_eq!(single("0b101"), TokenKind::Integer(5));
        assert_eq!(single("0o17"), TokenKind::Integer(15));
        assert_eq!(single("017"), TokenKind::Integer(15));
        assert_eq!(single("1.5"), TokenKind::Double(1.5));
        assert_eq!(single(".5"), TokenKind::Double(0.5));
        assert_eq!(single("1e3"), TokenKind::Double(1000.0));
        assert_eq!(single("2.5E-1"), TokenKind::Double(0.25));
        assert_eq!(single("1."), TokenKind::Double(1.0));
        assert_eq!(
            single("99999999999999999999"),
            TokenKind::Double(99_999_999_999_999_999_999.0)
        );
    }

    #[test]
    fn malformed_numbers() {
        assert_error("0x", "Invalid number literal '0x'");
        assert_error("0b102", "Invalid number literal");
        assert_error("08", "Invalid number literal '08'");
        assert_error("12abc", "Invalid number literal '12abc'");
        assert_error("1e", "Invalid number literal");
    }

    #[test]
    fn string_escapes() {
        assert_eq!(single(r#""a\tb\n""#), string("a\tb\n"));
        assert_eq!(single(r"'\x41\101\e'"), string("AA\u{1b}"));
        assert_eq!(single(r#""\u00e9""#), string("é"));
        assert_eq!(single(r#""\ud83d\ude00""#), string("😀"));
        assert_eq!(single(r#""\ud83dx""#), string("\u{fffd}x"));
        assert_eq!(single(r#""\q\'""#), string("q'"));
        assert_eq!(single(r#""\777""#), string("\u{3f}7"));
    }

    #[test]
    fn string_errors() {
        assert_error("\"abc", "Unterminated string");
        assert_error(r#""\xZZ""#, "Invalid escape sequence '\\x'");
    }

    #[test]
    fn template_literal_with_placeholders() {
        assert_eq!(
            kinds("`a${x}b${ y }c`"),
            vec![
                TokenKind::TemplateChunk("a".into()),
                ident("x"),
                TokenKind::PlaceholderEnd,
                TokenKind::TemplateChunk("b".into()),
                ident("y"),
                TokenKind::PlaceholderEnd,
                TokenKind::TemplateTail("c".into()),
            ]
        );
        assert_eq!(single("`plain\\n`"), TokenKind::TemplateTail("plain\n".into()));
    }

    #[test]
    fn template_placeholder_tracks_braces() {
        assert_eq!(
            kinds("`${ {a: 1} }`"),
            vec![
                TokenKind::TemplateChunk("".into()),
                TokenKind::LeftBrace,
                ident("a"),
                TokenKind::Colon,
                TokenKind::Integer(1),
                TokenKind::RightBrace,
                TokenKind::PlaceholderEnd,
                TokenKind::TemplateTail("".into()),
            ]
        );
    }

    #[test]
    fn nested_templates() {
        let tokens = kinds("`a${ `b${c}` }d`");
        assert_eq!(tokens.last(), Some(&TokenKind::TemplateTail("d".into())));
        assert_eq!(
            tokens
                .iter()
                .filter(|k| matches!(k, TokenKind::PlaceholderEnd))
                .count(),
            2
        );
    }

    #[test]
    fn template_tail_ends_expression() {
        assert_eq!(kinds("`a` / 2")[1], TokenKind::Slash);
    }

    #[test]
    fn unterminated_template() {
        assert_error("`abc", "Unterminated template");
    }

    #[test]
    fn comments_and_shebang_are_skipped() {
        assert_eq!(kinds("// c\n/* d */ x"), vec![ident("x")]);
        assert_eq!(kinds("#!/usr/bin/ucode\nlet")[0], TokenKind::Let);
        assert_error("x /* open", "Unterminated comment");
    }

    #[test]
    fn unexpected_character() {
        assert_error("a @ b", "Unexpected character '@'");
        // lexing continues after the error
        assert_eq!(kinds("a @ b").last(), Some(&ident("b")));
    }

    #[test]
    fn spans_are_byte_offsets() {
        let tokens = tokenize("let é = 1;");
        let spans: Vec<_> = tokens.iter().map(Token::span).collect();
        assert_eq!(spans[0], Span::new(0, 3));
        assert_eq!(tokens[1].kind(), &TokenKind::Error("Unexpected character 'é'".into()));
        assert_eq!(spans[1], Span::new(4, 6));
        assert_eq!(spans.last().copied(), Some(Span::new(11, 11)));
    }

    #[test]
    fn template_file_text_and_blocks() {
        assert_eq!(
            template_kinds("Hello {{ name }}!"),
            vec![
                TokenKind::Text("Hello ".into()),
                TokenKind::ExpressionOpen,
                ident("name"),
                TokenKind::ExpressionClose,
                TokenKind::Text("!".into()),
            ]
        );
        assert_eq!(
            template_kinds("{% if (x): %}yes{% endif %}"),
            vec![
                TokenKind::StatementOpen,
                TokenKind::If,
                TokenKind::LeftParen,
                ident("x"),
                TokenKind::RightParen,
                TokenKind::Colon,
                TokenKind::StatementClose,
                TokenKind::Text("yes".into()),
                TokenKind::StatementOpen,
                TokenKind::EndIf,
                TokenKind::StatementClose,
            ]
        );
    }

    #[test]
    fn template_file_whitespace_trimming_and_comments() {
        assert_eq!(
            template_kinds("a  {%- x -%}  b{# note #}c"),
            vec![
                TokenKind::Text("a".into()),
                TokenKind::StatementOpen,
                ident("x"),
                TokenKind::StatementClose,
                TokenKind::Text("b".into()),
                TokenKind::Text("c".into()),
            ]
        );
    }

    #[test]
    fn template_file_nested_object_braces() {
        let tokens = template_kinds("{{ {a:{b:1}} }}");
        assert_eq!(tokens.first(), Some(&TokenKind::ExpressionOpen));
        assert_eq!(tokens.last(), Some(&TokenKind::ExpressionClose));
        assert_eq!(
            tokens
                .iter()
                .filter(|k| matches!(k, TokenKind::RightBrace))
                .count(),
            2
        );
    }

    #[test]
    fn tokenize_is_deterministic() {
        let source = "let s = `x${a / 2}`; if (s =~ /y/) print(s);";
        assert_eq!(tokenize(source), tokenize(source));
    }
}
