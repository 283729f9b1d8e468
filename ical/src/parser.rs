// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;

use crate::component::Component;
use crate::syntax::{
    ContentLineError, Span, TreeBuildError, build_tree, scan_content_lines, tokenize,
};

/// Parse iCalendar text into its top-level components.
///
/// Lines may end with CRLF or a bare LF. Blank lines are skipped. Values are
/// kept raw; use the parsers in [`crate::value`] to interpret them.
///
/// ## Errors
///
/// The first malformed content line or nesting error, in source order, is
/// returned. Input without any component is an error as well.
///
/// ## Examples
///
/// Parsing valid iCalendar source will return the root component
///
/// ```
/// # use recurcal_ical::parse;
/// let ical_src = "\
/// BEGIN:VCALENDAR\r\n\
/// BEGIN:VEVENT\r\n\
/// SUMMARY:Test Event\r\n\
/// END:VEVENT\r\n\
/// END:VCALENDAR\r\n\
/// ";
/// let roots = parse(ical_src).unwrap();
/// assert_eq!(roots[0].children[0].property("SUMMARY").unwrap().value, "Test Event");
/// ```
///
/// Parsing invalid iCalendar source will return an error with a source span
///
/// ```
/// # use recurcal_ical::parse;
/// use ariadne::{Color, Label, Report, ReportKind, Source};
/// let invalid_ical_src = "\
/// BEGIN:VCALENDAR\r\n\
/// BEGIN:VEVENT\r\n\
/// END:VCALENDAR\r\n\
/// END:VEVENT\r\n\
/// ";
/// let err = parse(invalid_ical_src).unwrap_err();
/// let span = err.span().unwrap_or_default().into_range();
/// Report::build(ReportKind::Error, span.clone())
///     .with_config(ariadne::Config::new().with_index_type(ariadne::IndexType::Byte))
///     .with_message(err.to_string())
///     .with_label(Label::new(span).with_color(Color::Red))
///     .finish()
///     .eprint(Source::from(invalid_ical_src))
///     .unwrap();
/// ```
pub fn parse(src: &str) -> Result<Vec<Component>, ParseError> {
    let src = normalize_line_endings(src);
    let scanned = scan_content_lines(tokenize(&src));

    let mut lines = Vec::with_capacity(scanned.lines.len());
    for line in scanned.lines {
        match line.error {
            None => lines.push(line),
            Some(ContentLineError::EmptyLine { .. }) => {}
            Some(error) => {
                return Err(ParseError::ContentLine {
                    line: line_number(&src, error.span()),
                    error,
                });
            }
        }
    }

    let built = build_tree(lines);
    if let Some(error) = built.errors.into_iter().min_by_key(|e| e.span().start) {
        return Err(ParseError::Structure {
            line: line_number(&src, error.span()),
            error,
        });
    }

    if built.roots.is_empty() {
        return Err(ParseError::Empty);
    }

    Ok(built.roots)
}

/// Errors that can occur during parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A content line that does not follow the `name;params:value` shape
    #[error("line {line}: {error}")]
    ContentLine {
        /// 1-based line number, after unfolding
        line: usize,
        /// Underlying error
        #[source]
        error: ContentLineError,
    },

    /// `BEGIN`/`END` pairs that do not nest
    #[error("line {line}: {error}")]
    Structure {
        /// 1-based line number, after unfolding
        line: usize,
        /// Underlying error
        #[source]
        error: TreeBuildError,
    },

    /// The input contains no component at all
    #[error("no calendar component found")]
    Empty,
}

impl ParseError {
    /// Byte span in the line-ending normalized source, if any.
    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::ContentLine { error, .. } => Some(error.span()),
            Self::Structure { error, .. } => Some(error.span()),
            Self::Empty => None,
        }
    }
}

fn normalize_line_endings(src: &str) -> Cow<'_, str> {
    let bare_lf = src
        .match_indices('\n')
        .any(|(i, _)| i == 0 || src.as_bytes().get(i - 1) != Some(&b'\r'));
    if bare_lf {
        Cow::Owned(src.replace("\r\n", "\n").replace('\n', "\r\n"))
    } else {
        Cow::Borrowed(src)
    }
}

fn line_number(src: &str, span: Span) -> usize {
    src.get(..span.start)
        .map_or(0, |head| head.matches("\r\n").count())
        + 1
}
