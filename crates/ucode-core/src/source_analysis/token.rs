// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for ucode lexical analysis.
//!
//! Each token pairs a [`TokenKind`] (which carries the decoded value for
//! literals) with the [`Span`] of source text it was read from.
//!
//! # Token families
//!
//! - Value tokens: identifiers, numbers, strings, regex literals
//! - Template-literal pieces: [`TokenKind::TemplateChunk`],
//!   [`TokenKind::TemplateTail`], [`TokenKind::PlaceholderEnd`]
//! - Template-file pieces: [`TokenKind::Text`] and the `{{ }}` / `{% %}`
//!   block delimiters
//! - Reserved words, punctuators, [`TokenKind::Error`] and [`TokenKind::Eof`]

use ecow::EcoString;

use super::Span;

/// The kind of token, including any decoded literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Values ===
    /// An identifier: `foo`, `_tmp`. Also used for reserved words that
    /// follow `.` or `?.`.
    Identifier(EcoString),
    /// An integer literal that fits in `i64`: `42`, `0x1f`, `0b101`, `017`
    Integer(i64),
    /// A floating point literal, or an integer literal too large for `i64`.
    Double(f64),
    /// A single- or double-quoted string with escapes decoded.
    String(EcoString),
    /// A regular expression literal `/pattern/flags`.
    ///
    /// The pattern has `\d`, `\w` and `\s` style macros expanded to POSIX
    /// classes.
    Regex {
        pattern: EcoString,
        flags: EcoString,
    },

    // === Template literals ===
    /// Literal text of a template followed by `${`. The span covers the
    /// opening backtick or closing `}` through the `${`.
    TemplateChunk(EcoString),
    /// Final literal text of a template, up to and including the closing
    /// backtick.
    TemplateTail(EcoString),
    /// The `}` that closes a `${ ... }` placeholder.
    PlaceholderEnd,

    // === Template files ===
    /// Raw text outside of `{{ }}` and `{% %}` blocks.
    Text(EcoString),
    /// `{{`
    ExpressionOpen,
    /// `}}`
    ExpressionClose,
    /// `{%`
    StatementOpen,
    /// `%}`
    StatementClose,

    // === Reserved words ===
    Break,
    Case,
    Catch,
    Const,
    Continue,
    Default,
    Delete,
    Elif,
    Else,
    EndFor,
    EndFunction,
    EndIf,
    EndWhile,
    Export,
    False,
    For,
    Function,
    If,
    Import,
    In,
    Let,
    Null,
    Return,
    Switch,
    This,
    True,
    Try,
    While,

    // === Arithmetic and bitwise operators ===
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    Bang,
    Tilde,
    Amp,
    Pipe,
    Caret,
    ShiftLeft,
    ShiftRight,
    AmpAmp,
    PipePipe,
    QuestionQuestion,
    PlusPlus,
    MinusMinus,

    // === Assignment operators ===
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    StarStarAssign,
    ShiftLeftAssign,
    ShiftRightAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    AmpAmpAssign,
    PipePipeAssign,
    QuestionQuestionAssign,

    // === Comparison ===
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,

    // === Punctuation ===
    Question,
    Colon,
    Dot,
    /// `?.`
    QuestionDot,
    /// `?.[`
    QuestionDotBracket,
    /// `?.(`
    QuestionDotParen,
    /// `...`
    Ellipsis,
    /// `=>`
    Arrow,
    Comma,
    Semicolon,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    /// A lexical error with a human readable message.
    Error(EcoString),
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Looks up a reserved word.
    #[must_use]
    pub fn keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "break" => Self::Break,
            "case" => Self::Case,
            "catch" => Self::Catch,
            "const" => Self::Const,
            "continue" => Self::Continue,
            "default" => Self::Default,
            "delete" => Self::Delete,
            "elif" => Self::Elif,
            "else" => Self::Else,
            "endfor" => Self::EndFor,
            "endfunction" => Self::EndFunction,
            "endif" => Self::EndIf,
            "endwhile" => Self::EndWhile,
            "export" => Self::Export,
            "false" => Self::False,
            "for" => Self::For,
            "function" => Self::Function,
            "if" => Self::If,
            "import" => Self::Import,
            "in" => Self::In,
            "let" => Self::Let,
            "null" => Self::Null,
            "return" => Self::Return,
            "switch" => Self::Switch,
            "this" => Self::This,
            "true" => Self::True,
            "try" => Self::Try,
            "while" => Self::While,
            _ => return None,
        };
        Some(kind)
    }

    /// Looks up an operator or punctuation token by its exact text.
    #[must_use]
    pub fn punctuator(text: &str) -> Option<Self> {
        let kind = match text {
            "+" => Self::Plus,
            "-" => Self::Minus,
            "*" => Self::Star,
            "/" => Self::Slash,
            "%" => Self::Percent,
            "**" => Self::StarStar,
            "!" => Self::Bang,
            "~" => Self::Tilde,
            "&" => Self::Amp,
            "|" => Self::Pipe,
            "^" => Self::Caret,
            "<<" => Self::ShiftLeft,
            ">>" => Self::ShiftRight,
            "&&" => Self::AmpAmp,
            "||" => Self::PipePipe,
            "??" => Self::QuestionQuestion,
            "++" => Self::PlusPlus,
            "--" => Self::MinusMinus,
            "=" => Self::Assign,
            "+=" => Self::PlusAssign,
            "-=" => Self::MinusAssign,
            "*=" => Self::StarAssign,
            "/=" => Self::SlashAssign,
            "%=" => Self::PercentAssign,
            "**=" => Self::StarStarAssign,
            "<<=" => Self::ShiftLeftAssign,
            ">>=" => Self::ShiftRightAssign,
            "&=" => Self::AmpAssign,
            "|=" => Self::PipeAssign,
            "^=" => Self::CaretAssign,
            "&&=" => Self::AmpAmpAssign,
            "||=" => Self::PipePipeAssign,
            "??=" => Self::QuestionQuestionAssign,
            "==" => Self::EqEq,
            "!=" => Self::NotEq,
            "===" => Self::EqEqEq,
            "!==" => Self::NotEqEq,
            "<" => Self::Less,
            "<=" => Self::LessEq,
            ">" => Self::Greater,
            ">=" => Self::GreaterEq,
            "?" => Self::Question,
            ":" => Self::Colon,
            "." => Self::Dot,
            "?." => Self::QuestionDot,
            "?.[" => Self::QuestionDotBracket,
            "?.(" => Self::QuestionDotParen,
            "..." => Self::Ellipsis,
            "=>" => Self::Arrow,
            "," => Self::Comma,
            ";" => Self::Semicolon,
            "(" => Self::LeftParen,
            ")" => Self::RightParen,
            "[" => Self::LeftBracket,
            "]" => Self::RightBracket,
            "{" => Self::LeftBrace,
            "}" => Self::RightBrace,
            _ => return None,
        };
        Some(kind)
    }

    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns true for reserved words.
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Break
                | Self::Case
                | Self::Catch
                | Self::Const
                | Self::Continue
                | Self::Default
                | Self::Delete
                | Self::Elif
                | Self::Else
                | Self::EndFor
                | Self::EndFunction
                | Self::EndIf
                | Self::EndWhile
                | Self::Export
                | Self::False
                | Self::For
                | Self::Function
                | Self::If
                | Self::Import
                | Self::In
                | Self::Let
                | Self::Null
                | Self::Return
                | Self::Switch
                | Self::This
                | Self::True
                | Self::Try
                | Self::While
        )
    }

    /// Reserved words that begin a statement. The parser resynchronizes on
    /// these after a syntax error.
    #[must_use]
    pub const fn starts_statement(&self) -> bool {
        matches!(
            self,
            Self::Let
                | Self::Const
                | Self::If
                | Self::For
                | Self::While
                | Self::Function
                | Self::Return
                | Self::Break
                | Self::Continue
                | Self::Switch
                | Self::Try
                | Self::Import
                | Self::Export
        )
    }

    /// Assignment and compound-assignment operators.
    #[must_use]
    pub const fn is_assignment(&self) -> bool {
        matches!(
            self,
            Self::Assign
                | Self::PlusAssign
                | Self::MinusAssign
                | Self::StarAssign
                | Self::SlashAssign
                | Self::PercentAssign
                | Self::StarStarAssign
                | Self::ShiftLeftAssign
                | Self::ShiftRightAssign
                | Self::AmpAssign
                | Self::PipeAssign
                | Self::CaretAssign
                | Self::AmpAmpAssign
                | Self::PipePipeAssign
                | Self::QuestionQuestionAssign
        )
    }

    /// Whether a `/` following this token is a division operator rather than
    /// the start of a regular expression.
    #[must_use]
    pub const fn ends_expression(&self) -> bool {
        matches!(
            self,
            Self::Identifier(_)
                | Self::Integer(_)
                | Self::Double(_)
                | Self::String(_)
                | Self::TemplateTail(_)
                | Self::Regex { .. }
                | Self::RightParen
                | Self::RightBracket
                | Self::PlusPlus
                | Self::MinusMinus
                | Self::True
                | Self::False
                | Self::Null
                | Self::This
        )
    }

    /// Returns the fixed source text of reserved words and punctuators.
    ///
    /// Value tokens return `None`.
    #[must_use]
    pub const fn as_str(&self) -> Option<&'static str> {
        let text = match self {
            Self::Break => "break",
            Self::Case => "case",
            Self::Catch => "catch",
            Self::Const => "const",
            Self::Continue => "continue",
            Self::Default => "default",
            Self::Delete => "delete",
            Self::Elif => "elif",
            Self::Else => "else",
            Self::EndFor => "endfor",
            Self::EndFunction => "endfunction",
            Self::EndIf => "endif",
            Self::EndWhile => "endwhile",
            Self::Export => "export",
            Self::False => "false",
            Self::For => "for",
            Self::Function => "function",
            Self::If => "if",
            Self::Import => "import",
            Self::In => "in",
            Self::Let => "let",
            Self::Null => "null",
            Self::Return => "return",
            Self::Switch => "switch",
            Self::This => "this",
            Self::True => "true",
            Self::Try => "try",
            Self::While => "while",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::StarStar => "**",
            Self::Bang => "!",
            Self::Tilde => "~",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::QuestionQuestion => "??",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::PercentAssign => "%=",
            Self::StarStarAssign => "**=",
            Self::ShiftLeftAssign => "<<=",
            Self::ShiftRightAssign => ">>=",
            Self::AmpAssign => "&=",
            Self::PipeAssign => "|=",
            Self::CaretAssign => "^=",
            Self::AmpAmpAssign => "&&=",
            Self::PipePipeAssign => "||=",
            Self::QuestionQuestionAssign => "??=",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::EqEqEq => "===",
            Self::NotEqEq => "!==",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::Question => "?",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::QuestionDot => "?.",
            Self::QuestionDotBracket => "?.[",
            Self::QuestionDotParen => "?.(",
            Self::Ellipsis => "...",
            Self::Arrow => "=>",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::PlaceholderEnd => "}",
            Self::ExpressionOpen => "{{",
            Self::ExpressionClose => "}}",
            Self::StatementOpen => "{%",
            Self::StatementClose => "%}",
            _ => return None,
        };
        Some(text)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(text) = self.as_str() {
            return write!(f, "'{text}'");
        }
        match self {
            Self::Identifier(name) => write!(f, "identifier '{name}'"),
            Self::Integer(value) => write!(f, "number {value}"),
            Self::Double(value) => write!(f, "number {value}"),
            Self::String(_) => write!(f, "string"),
            Self::Regex { .. } => write!(f, "regular expression"),
            Self::TemplateChunk(_) | Self::TemplateTail(_) => write!(f, "template string"),
            Self::Text(_) => write!(f, "template text"),
            Self::Error(message) => write!(f, "{message}"),
            Self::Eof => write!(f, "end of input"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// A token with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    span: Span,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    #[must_use]
    pub fn into_kind(self) -> TokenKind {
        self.kind
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }
}
