// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Lexer for iCalendar content lines as defined in RFC 5545.
//!
//! Folded lines (CRLF followed by a single SPACE or HTAB) are skipped by the
//! lexer itself, so the tokens of a logical line arrive contiguously.

use std::fmt::{self, Display};
use std::ops::Range;

use logos::Logos;

/// A byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start position of the span
    pub start: usize,
    /// End position of the span
    pub end: usize,
}

impl Span {
    /// Create a new span from start and end positions
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Convert to a standard range
    #[must_use]
    pub const fn into_range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Tokenize iCalendar source into spanned tokens.
///
/// Lexing errors do not stop the stream, they surface as [`Token::Error`].
pub fn tokenize(src: &str) -> impl Iterator<Item = SpannedToken<'_>> {
    Token::lexer(src).spanned().map(|(tok, span)| match tok {
        Ok(tok) => SpannedToken(tok, span.into()),
        Err(()) => SpannedToken(Token::Error, span.into()),
    })
}

/// Token emitted by the iCalendar lexer
#[derive(PartialEq, Eq, Clone, Copy, Logos)]
#[logos(skip r#"\r\n[ \t]"#)] // skip folding
pub enum Token<'a> {
    /// Double Quote ("), decimal codepoint 22
    #[token(r#"""#)]
    DQuote,

    /// Comma (,), decimal codepoint 44
    #[token(",")]
    Comma,

    /// Colon (:), decimal codepoint 58
    #[token(":")]
    Colon,

    /// Semicolon (;), decimal codepoint 59
    #[token(";")]
    Semicolon,

    /// Equal sign (=), decimal codepoint 61
    #[token("=")]
    Equal,

    /// Runs of printable ASCII symbols, including SPACE and HTAB
    #[regex(r#"[\t !#$%&'()*+./<>?@\[\\\]\^`\{|\}~]+"#)]
    Symbol(&'a str),

    /// CRLF that is not followed by folding whitespace
    #[token("\r\n")]
    Newline,

    /// ASCII word characters: 0-9, A-Z, a-z, underscore and hyphen
    #[regex("[0-9A-Za-z_-]+")]
    Word(&'a str),

    /// NON-US-ASCII  = UTF8-2 / UTF8-3 / UTF8-4
    #[regex(r#"[^\x00-\x7F]+"#)]
    UnicodeText(&'a str),

    /// Control characters and bare CR / LF
    Error,
}

impl<'a> Token<'a> {
    /// Source text of the token.
    #[must_use]
    pub const fn text(self) -> &'a str {
        match self {
            Self::DQuote => "\"",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Semicolon => ";",
            Self::Equal => "=",
            Self::Newline => "\r\n",
            Self::Symbol(s) | Self::Word(s) | Self::UnicodeText(s) => s,
            Self::Error => "",
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DQuote => write!(f, "DQuote"),
            Self::Comma => write!(f, "Comma"),
            Self::Colon => write!(f, "Colon"),
            Self::Semicolon => write!(f, "Semicolon"),
            Self::Equal => write!(f, "Equal"),
            Self::Symbol(s) => write!(f, "Symbol({s})"),
            Self::Newline => write!(f, "Newline"),
            Self::Word(s) => write!(f, "Word({s})"),
            Self::UnicodeText(s) => write!(f, "UnicodeText({s})"),
            Self::Error => write!(f, "Error"),
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A token with its associated span in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpannedToken<'src>(pub Token<'src>, pub Span);

impl Display for SpannedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.0, self.1)
    }
}
