// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! TEXT value as defined in RFC 5545 Section 3.3.11.

use chumsky::extra::ParserExtra;
use chumsky::prelude::*;

/// Format Definition:  This value type is defined by the following notation:
///
/// ```txt
/// text       = *(TSAFE-CHAR / ":" / DQUOTE / ESCAPED-CHAR)
///    ; Folded according to description above
///
/// ESCAPED-CHAR = ("\\" / "\;" / "\," / "\N" / "\n")
///    ; \\ encodes \, \N or \n encodes newline
///    ; \; encodes ;, \, encodes ,
/// ```
///
/// A single value is parsed, so unescaped COMMA characters are kept as-is.
pub(crate) fn value_text<'src, I, E>() -> impl Parser<'src, I, String, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan> + chumsky::input::ValueInput<'src>,
    E: ParserExtra<'src, I>,
{
    let escaped = just('\\').ignore_then(choice((
        just('\\').to('\\'),
        just(';').to(';'),
        just(',').to(','),
        one_of("nN").to('\n'),
    )));

    choice((escaped, none_of('\\')))
        .repeated()
        .collect::<String>()
}

/// Escape a string so it can be written as a TEXT value.
///
/// Carriage returns are dropped, line feeds become `\n`.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}
