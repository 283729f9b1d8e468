// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Shared numeric building blocks for the value grammars.

use std::borrow::Cow;

use chumsky::error::RichPattern;
use chumsky::extra::ParserExtra;
use chumsky::label::LabelError;
use chumsky::prelude::*;

/// Semantic expectations reported by the value grammars when the syntax is
/// fine but the content is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueExpected {
    /// A calendar date that exists
    Date,
    /// A wall-clock time within range
    Time,
    /// An unsigned integer that fits in `u32`
    U32,
    /// A strictly positive integer
    Positive,
    /// A number inside the range allowed by the rule part
    InRange,
    /// A recurrence rule part appeared more than once
    DuplicatePart,
    /// A recurrence rule without `FREQ`
    MissingFreq,
    /// A recurrence rule carrying both `UNTIL` and `COUNT`
    UntilWithCount,
}

impl From<ValueExpected> for RichPattern<'_, char> {
    fn from(expected: ValueExpected) -> Self {
        let label = match expected {
            ValueExpected::Date => "valid date",
            ValueExpected::Time => "valid time",
            ValueExpected::U32 => "u32 in range",
            ValueExpected::Positive => "positive integer",
            ValueExpected::InRange => "number in range",
            ValueExpected::DuplicatePart => "each rule part at most once",
            ValueExpected::MissingFreq => "FREQ rule part",
            ValueExpected::UntilWithCount => "either UNTIL or COUNT, not both",
        };
        Self::Label(Cow::Borrowed(label))
    }
}

/// Exactly `n` ASCII digits folded into a number.
pub(crate) fn fixed_digits<'src, I, E>(n: usize) -> impl Parser<'src, I, u32, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
{
    select! { c @ '0'..='9' => u32::from(c) - u32::from('0') }
        .repeated()
        .exactly(n)
        .collect::<Vec<_>>()
        .map(|digits| digits.into_iter().fold(0, |acc, d| acc * 10 + d))
}

/// ```txt
/// posint = 1*DIGIT
/// ```
pub(crate) fn value_u32<'src, I, E>() -> impl Parser<'src, I, u32, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    select! { c @ '0'..='9' => c }
        .repeated()
        .at_least(1)
        .collect::<String>()
        .try_map(|digits, span| {
            lexical::parse::<u32, _>(&digits)
                .map_err(|_| E::Error::expected_found([ValueExpected::U32], None, span))
        })
}

/// A strictly positive `u32`, as used by `COUNT` and `INTERVAL`.
pub(crate) fn value_positive<'src, I, E>() -> impl Parser<'src, I, u32, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    value_u32().try_map(|n, span| match n {
        0 => Err(E::Error::expected_found(
            [ValueExpected::Positive],
            None,
            span,
        )),
        n => Ok(n),
    })
}

/// An optionally signed integer whose magnitude lies in `min..=max`.
///
/// Signs are only accepted when `signed` is set; zero is accepted only when
/// `min` is zero.
pub(crate) fn value_ranged<'src, I, E>(
    min: i16,
    max: i16,
    signed: bool,
) -> impl Parser<'src, I, i16, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    let sign = select! { '+' => 1i16, '-' => -1i16 };
    sign.or_not()
        .then(
            select! { c @ '0'..='9' => c }
                .repeated()
                .at_least(1)
                .at_most(3)
                .collect::<String>(),
        )
        .try_map(move |(sign, digits), span| {
            let magnitude = lexical::parse::<i16, _>(&digits)
                .ok()
                .filter(|n| (min..=max).contains(n))
                .filter(|_| signed || sign.is_none());
            match magnitude {
                Some(n) => Ok(sign.unwrap_or(1) * n),
                None => Err(E::Error::expected_found(
                    [ValueExpected::InRange],
                    None,
                    span,
                )),
            }
        })
}

#[cfg(test)]
mod tests {
    use chumsky::extra;
    use chumsky::input::Stream;

    use super::*;

    #[test]
    fn parses_fixed_width_digits() {
        let parse = |src: &'static str| {
            let stream = Stream::from_iter(src.chars());
            fixed_digits::<'_, _, extra::Err<Rich<char>>>(4)
                .parse(stream)
                .into_result()
        };
        assert_eq!(parse("2025").unwrap(), 2025);
        assert_eq!(parse("0007").unwrap(), 7);
        assert!(parse("202").is_err());
        assert!(parse("20251").is_err());
    }

    #[test]
    fn parses_positive_integers() {
        let parse = |src: &'static str| {
            let stream = Stream::from_iter(src.chars());
            value_positive::<'_, _, extra::Err<Rich<char>>>()
                .parse(stream)
                .into_result()
        };
        assert_eq!(parse("1").unwrap(), 1);
        assert_eq!(parse("365").unwrap(), 365);
        assert!(parse("0").is_err());
        assert!(parse("-2").is_err());
        assert!(parse("99999999999").is_err());
    }

    #[test]
    fn parses_ranged_signed_integers() {
        let parse = |src: &'static str| {
            let stream = Stream::from_iter(src.chars());
            value_ranged::<'_, _, extra::Err<Rich<char>>>(1, 31, true)
                .parse(stream)
                .into_result()
        };
        assert_eq!(parse("15").unwrap(), 15);
        assert_eq!(parse("-1").unwrap(), -1);
        assert_eq!(parse("+3").unwrap(), 3);
        assert!(parse("0").is_err());
        assert!(parse("32").is_err());
        assert!(parse("-32").is_err());
    }

    #[test]
    fn rejects_sign_when_unsigned() {
        let parse = |src: &'static str| {
            let stream = Stream::from_iter(src.chars());
            value_ranged::<'_, _, extra::Err<Rich<char>>>(0, 59, false)
                .parse(stream)
                .into_result()
        };
        assert_eq!(parse("0").unwrap(), 0);
        assert_eq!(parse("59").unwrap(), 59);
        assert!(parse("-1").is_err());
        assert!(parse("60").is_err());
    }
}
