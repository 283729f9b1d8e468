// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Tree builder for constructing component hierarchy from content lines.
//!
//! ```text
//! Content Lines → Tree Builder → Component Tree
//! ```
//!
//! The builder keeps a stack of open components:
//! 1. On BEGIN:X, push a new component onto the stack
//! 2. On property, add to the current component (top of stack)
//! 3. On END:X, pop from stack and add to parent component

use crate::component::{Component, Property};
use crate::keyword::{KW_BEGIN, KW_END};
use crate::syntax::lexer::Span;
use crate::syntax::scanner::ContentLine;

/// Build a component tree from scanned content lines.
///
/// Lines carrying scan errors are skipped here; the caller has already seen
/// them in the scan result.
#[must_use]
pub fn build_tree(lines: Vec<ContentLine>) -> TreeBuilderResult {
    let mut stack: Vec<(Component, Span)> = Vec::new();
    let mut roots = Vec::new();
    let mut errors = Vec::new();

    for line in lines {
        if line.error.is_some() {
            continue;
        }

        let is_begin = line.name.eq_ignore_ascii_case(KW_BEGIN);
        let is_end = line.name.eq_ignore_ascii_case(KW_END);
        if (is_begin || is_end) && !line.parameters.is_empty() {
            errors.push(TreeBuildError::BeginEndWithParameters {
                name: line.name.clone(),
                span: line.span,
            });
        }

        if is_begin {
            let name = line.value.to_ascii_uppercase();
            stack.push((Component::new(name), line.span));
        } else if is_end {
            let Some((component, _)) = stack.pop() else {
                errors.push(TreeBuildError::UnmatchedEnd {
                    name: line.value,
                    span: line.span,
                });
                continue;
            };

            if !component.is(&line.value) {
                errors.push(TreeBuildError::MismatchedNesting {
                    expected: component.name.clone(),
                    found: line.value,
                    span: line.span,
                });
            }

            match stack.last_mut() {
                Some((parent, _)) => parent.children.push(component),
                None => roots.push(component),
            }
        } else if let Some((current, _)) = stack.last_mut() {
            current.properties.push(Property {
                name: line.name,
                parameters: line.parameters,
                value: line.value,
            });
        } else {
            errors.push(TreeBuildError::OrphanProperty {
                name: line.name,
                span: line.span,
            });
        }
    }

    for (component, span) in stack {
        errors.push(TreeBuildError::UnmatchedBegin {
            name: component.name,
            span,
        });
    }

    TreeBuilderResult { roots, errors }
}

/// Errors that can occur during tree building.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeBuildError {
    /// Unmatched END (no corresponding BEGIN)
    #[error("unmatched END:{name} (no corresponding BEGIN)")]
    UnmatchedEnd {
        /// Component name that was being closed
        name: String,
        /// Span of the END line
        span: Span,
    },

    /// Unmatched BEGIN (component not closed)
    #[error("unmatched BEGIN:{name} (component not closed)")]
    UnmatchedBegin {
        /// Component name that was not closed
        name: String,
        /// Span of the BEGIN line
        span: Span,
    },

    /// Mismatched BEGIN/END names
    #[error("mismatched nesting: expected END:{expected}, found END:{found}")]
    MismatchedNesting {
        /// Expected component name
        expected: String,
        /// Actual component name found
        found: String,
        /// Span of the END line
        span: Span,
    },

    /// BEGIN or END line with parameters (not allowed per RFC 5545)
    #[error("{name} line with parameters (not allowed per RFC 5545)")]
    BeginEndWithParameters {
        /// BEGIN or END
        name: String,
        /// Span of the line
        span: Span,
    },

    /// Property outside of any component
    #[error("property {name} outside of any component")]
    OrphanProperty {
        /// Property name
        name: String,
        /// Span of the line
        span: Span,
    },
}

impl TreeBuildError {
    /// Span of the offending line.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::UnmatchedEnd { span, .. }
            | Self::UnmatchedBegin { span, .. }
            | Self::MismatchedNesting { span, .. }
            | Self::BeginEndWithParameters { span, .. }
            | Self::OrphanProperty { span, .. } => *span,
        }
    }
}

/// Result of building a tree.
#[derive(Debug, Clone)]
pub struct TreeBuilderResult {
    /// The root components (typically one VCALENDAR)
    pub roots: Vec<Component>,
    /// Errors encountered during tree building
    pub errors: Vec<TreeBuildError>,
}
