// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Scanner for iCalendar content lines.
//!
//! ```text
//! Source Text → Lexer → Token Stream → Scanner → Content Lines
//! ```
//!
//! Per RFC 5545, a content line has the format:
//! ```text
//! contentline = name *(";" param) ":" value CRLF
//! ```
//!
//! Malformed lines are kept in the output with their error attached, so the
//! caller decides whether one bad line rejects the whole input.

use std::iter::Peekable;

use crate::component::Parameter;
use crate::syntax::lexer::{Span, SpannedToken, Token};

/// A scanned iCalendar content line, already unfolded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name (e.g., "DTSTART", "SUMMARY")
    pub name: String,

    /// Property parameters (semicolon-separated)
    pub parameters: Vec<Parameter>,

    /// Raw property value, still escaped
    pub value: String,

    /// Span of the entire content line
    pub span: Span,

    /// Error information if scanning this line failed
    pub error: Option<ContentLineError>,
}

impl ContentLine {
    /// Check if this content line is valid (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Errors that can occur when scanning a content line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentLineError {
    /// Missing colon separator, e.g. `SUMMARY value`
    #[error("missing colon in property at {expected_at}")]
    MissingColon {
        /// Span where colon was expected
        expected_at: Span,
    },

    /// Empty content line (no name).
    #[error("empty content line at {span}")]
    EmptyLine {
        /// Span of the empty line
        span: Span,
    },

    /// Invalid parameter syntax.
    #[error("{kind} at {span}")]
    InvalidParameter {
        /// Span of the invalid parameter
        span: Span,
        /// Specific error details
        kind: ParameterErrorKind,
    },

    /// Characters the grammar does not allow, such as control characters
    #[error("invalid character at {span}")]
    InvalidCharacter {
        /// Span of the offending token
        span: Span,
    },
}

impl ContentLineError {
    /// Source span the error points at.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::MissingColon { expected_at: span }
            | Self::EmptyLine { span }
            | Self::InvalidParameter { span, .. }
            | Self::InvalidCharacter { span } => *span,
        }
    }
}

/// Specific parameter parsing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParameterErrorKind {
    /// Missing equals sign, e.g. `TZID Europe/Berlin`
    #[error("missing equals in parameter")]
    MissingEquals,

    /// Missing parameter value, e.g. `TZID=`
    #[error("missing parameter value")]
    MissingValue,

    /// Empty parameter name, e.g. `;=value`
    #[error("empty parameter name")]
    EmptyName,

    /// Unterminated quoted string, e.g. `CN="unclosed`
    #[error("unterminated quoted string")]
    UnterminatedQuote,
}

/// Result of scanning content lines.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// All scanned content lines (including ones with errors)
    pub lines: Vec<ContentLine>,

    /// Whether any errors were encountered
    pub has_errors: bool,
}

/// Scan a token stream into content lines.
pub fn scan_content_lines<'src>(tokens: impl IntoIterator<Item = SpannedToken<'src>>) -> ScanResult {
    let mut tokens = tokens.into_iter().peekable();
    let mut lines = Vec::new();
    let mut has_errors = false;

    while let Some(line) = scan_one_content_line(&mut tokens) {
        has_errors |= line.error.is_some();
        lines.push(line);
    }

    ScanResult { lines, has_errors }
}

/// Scan a single content line, `None` at end of input.
fn scan_one_content_line<'src>(
    tokens: &mut Peekable<impl Iterator<Item = SpannedToken<'src>>>,
) -> Option<ContentLine> {
    let SpannedToken(first, line_start) = *tokens.peek()?;

    if matches!(first, Token::Newline) {
        tokens.next();
        return Some(ContentLine {
            name: String::new(),
            parameters: Vec::new(),
            value: String::new(),
            span: line_start,
            error: Some(ContentLineError::EmptyLine { span: line_start }),
        });
    }

    let name = parse_property_name(tokens);
    let mut line = ContentLine {
        name,
        parameters: Vec::new(),
        value: String::new(),
        span: line_start,
        error: None,
    };

    while let Some(&SpannedToken(Token::Semicolon, semi_span)) = tokens.peek() {
        tokens.next();
        match parse_parameter(tokens) {
            Ok(param) => line.parameters.push(param),
            Err(kind) => {
                line.span.end = consume_until_newline(tokens).max(semi_span.end);
                line.error = Some(ContentLineError::InvalidParameter {
                    span: semi_span,
                    kind,
                });
                return Some(line);
            }
        }
    }

    match tokens.peek() {
        Some(&SpannedToken(Token::Colon, _)) => {
            tokens.next();
        }
        Some(&SpannedToken(_, span)) => {
            line.span.end = consume_until_newline(tokens).max(span.end);
            line.error = Some(ContentLineError::MissingColon { expected_at: span });
            return Some(line);
        }
        None => {
            line.error = Some(ContentLineError::MissingColon {
                expected_at: Span::new(line_start.end, line_start.end),
            });
            return Some(line);
        }
    }

    let (value, invalid) = parse_value(tokens);
    line.value = value;
    line.span.end = match tokens.next() {
        Some(SpannedToken(_, newline)) => newline.end,
        None => line.span.end.max(line_start.end),
    };
    if let Some(span) = invalid {
        line.error = Some(ContentLineError::InvalidCharacter { span });
    }
    Some(line)
}

/// Property names may be split over several word tokens when folded.
fn parse_property_name<'src>(
    tokens: &mut Peekable<impl Iterator<Item = SpannedToken<'src>>>,
) -> String {
    let mut name = String::new();
    while let Some(&SpannedToken(Token::Word(text), _)) = tokens.peek() {
        name.push_str(text);
        tokens.next();
    }
    name
}

/// Parse a single parameter: `name=value` or `name=value1,value2`
fn parse_parameter<'src>(
    tokens: &mut Peekable<impl Iterator<Item = SpannedToken<'src>>>,
) -> Result<Parameter, ParameterErrorKind> {
    let name = parse_property_name(tokens);
    if name.is_empty() {
        return Err(ParameterErrorKind::EmptyName);
    }

    match tokens.next() {
        Some(SpannedToken(Token::Equal, _)) => {}
        Some(_) | None => return Err(ParameterErrorKind::MissingEquals),
    }

    let mut values = Vec::new();
    loop {
        match parse_parameter_value(tokens)? {
            Some(value) => values.push(value),
            None => break,
        }

        match tokens.peek() {
            Some(&SpannedToken(Token::Comma, _)) => {
                tokens.next();
            }
            _ => break,
        }
    }

    if values.is_empty() {
        return Err(ParameterErrorKind::MissingValue);
    }
    Ok(Parameter { name, values })
}

/// Parse a single, possibly quoted, parameter value.
fn parse_parameter_value<'src>(
    tokens: &mut Peekable<impl Iterator<Item = SpannedToken<'src>>>,
) -> Result<Option<String>, ParameterErrorKind> {
    let mut value = String::new();

    if let Some(&SpannedToken(Token::DQuote, _)) = tokens.peek() {
        tokens.next();
        loop {
            match tokens.peek().copied() {
                Some(SpannedToken(Token::DQuote, _)) => {
                    tokens.next();
                    return Ok(Some(value));
                }
                // leave the newline for error recovery
                Some(SpannedToken(Token::Newline | Token::Error, _)) | None => {
                    return Err(ParameterErrorKind::UnterminatedQuote);
                }
                Some(SpannedToken(token, _)) => {
                    value.push_str(token.text());
                    tokens.next();
                }
            }
        }
    }

    while let Some(&SpannedToken(token, _)) = tokens.peek() {
        match token {
            Token::Semicolon
            | Token::Colon
            | Token::Comma
            | Token::Equal
            | Token::Newline
            | Token::DQuote
            | Token::Error => break,
            _ => {
                value.push_str(token.text());
                tokens.next();
            }
        }
    }

    Ok((!value.is_empty()).then_some(value))
}

/// Collect the value up to the newline, reporting the first invalid token.
fn parse_value<'src>(
    tokens: &mut Peekable<impl Iterator<Item = SpannedToken<'src>>>,
) -> (String, Option<Span>) {
    let mut value = String::new();
    let mut invalid = None;

    while let Some(&SpannedToken(token, span)) = tokens.peek() {
        match token {
            Token::Newline => break,
            Token::Error => {
                invalid.get_or_insert(span);
            }
            _ => value.push_str(token.text()),
        }
        tokens.next();
    }

    (value, invalid)
}

/// Consume all tokens up to and including the next newline, returning the end offset.
fn consume_until_newline<'src>(
    tokens: &mut Peekable<impl Iterator<Item = SpannedToken<'src>>>,
) -> usize {
    let mut end = 0;
    for SpannedToken(token, span) in tokens.by_ref() {
        end = span.end;
        if matches!(token, Token::Newline) {
            break;
        }
    }
    end
}
