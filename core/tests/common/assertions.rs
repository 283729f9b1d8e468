// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Custom assertion helpers for integration tests.
//!
//! This module provides specialized assertion functions for validating
//! materialized occurrences.

use jiff::Timestamp;
use recurcal_core::Occurrence;

/// Asserts that occurrences start exactly at the given instants, in order.
///
/// # Arguments
///
/// * `occurrences` - The occurrences to validate
/// * `expected` - RFC 3339 instants
///
/// # Panics
///
/// Panics if the starts differ in count or value.
///
/// # Example
///
/// ```ignore
/// assert_starts(&occurrences, &["2024-01-01T09:00:00Z", "2024-01-03T09:00:00Z"]);
/// ```
pub fn assert_starts(occurrences: &[Occurrence], expected: &[&str]) {
    let actual: Vec<Timestamp> = occurrences.iter().map(|o| o.start.timestamp()).collect();
    let expected: Vec<Timestamp> = expected.iter().map(|s| s.parse().unwrap()).collect();
    assert_eq!(actual, expected, "Occurrence starts mismatch");
}

/// Asserts that occurrences are ascending by start.
///
/// # Panics
///
/// Panics if any occurrence starts before its predecessor.
pub fn assert_ascending(occurrences: &[Occurrence]) {
    for pair in occurrences.windows(2) {
        assert!(
            pair[0].start.timestamp() <= pair[1].start.timestamp(),
            "Occurrences out of order: {} after {}",
            pair[1].start,
            pair[0].start
        );
    }
}

/// Asserts that every original start lies in `[from, to]`.
///
/// # Panics
///
/// Panics on the first occurrence outside the window.
pub fn assert_within(occurrences: &[Occurrence], from: Timestamp, to: Timestamp) {
    for occurrence in occurrences {
        let at = occurrence.original_start.timestamp();
        assert!(
            from <= at && at <= to,
            "Occurrence {at} outside window [{from}, {to}]"
        );
    }
}
