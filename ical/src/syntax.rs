// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Syntax layer for iCalendar text as defined in RFC 5545 Section 3.1.
//!
//! Parsing runs in three passes: [`lexer`] turns text into tokens with
//! folded lines already joined, [`scanner`] groups tokens into content lines
//! and recovers from malformed ones, and [`tree_builder`] nests the lines
//! into components by matching `BEGIN`/`END` pairs. No value is interpreted
//! here.

pub mod lexer;
pub mod scanner;
pub mod tree_builder;

pub use lexer::{Span, SpannedToken, Token, tokenize};
pub use scanner::{ContentLine, ContentLineError, ParameterErrorKind, ScanResult, scan_content_lines};
pub use tree_builder::{TreeBuildError, TreeBuilderResult, build_tree};
