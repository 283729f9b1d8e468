// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Parse and format iCalendar (RFC 5545) text: content lines, component
//! trees and the value types used by recurring events.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

mod component;
pub mod formatter;
pub mod keyword;
mod parser;
pub mod syntax;
pub mod value;

pub use crate::component::{Component, Parameter, Property};
pub use crate::formatter::{FormatOptions, FoldingStyle, format};
pub use crate::parser::{ParseError, parse};
pub use crate::value::{
    DateOrDateTime, RecurrenceFrequency, ValueDate, ValueDateTime, ValueError,
    ValueRecurrenceRule, ValueTime, WeekDay, WeekDayNum,
};
