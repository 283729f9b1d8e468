// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Tests for the syntax layer and its error recovery.

use recurcal_ical::syntax::{
    ContentLineError, ParameterErrorKind, TreeBuildError, build_tree, scan_content_lines, tokenize,
};
use recurcal_ical::{ParseError, parse};

#[test]
fn scanner_recovers_after_bad_lines() {
    let src = "BEGIN:VEVENT\r\nBROKEN\r\nX-P;=v:1\r\nSUMMARY:ok\r\nEND:VEVENT\r\n";
    let scanned = scan_content_lines(tokenize(src));
    assert!(scanned.has_errors);
    assert_eq!(scanned.lines.len(), 5);

    assert!(matches!(
        scanned.lines[1].error,
        Some(ContentLineError::MissingColon { .. })
    ));
    assert!(matches!(
        scanned.lines[2].error,
        Some(ContentLineError::InvalidParameter {
            kind: ParameterErrorKind::EmptyName,
            ..
        })
    ));

    let tree = build_tree(scanned.lines);
    assert!(tree.errors.is_empty());
    assert_eq!(tree.roots[0].properties.len(), 1);
    assert_eq!(tree.roots[0].properties[0].value, "ok");
}

#[test]
fn tree_builder_collects_every_structure_error() {
    let src = "END:VTODO\r\nBEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nEND:VCALENDAR\r\n";
    let tree = build_tree(scan_content_lines(tokenize(src)).lines);
    assert!(
        tree.errors
            .iter()
            .any(|e| matches!(e, TreeBuildError::UnmatchedEnd { .. }))
    );
    assert!(
        tree.errors
            .iter()
            .any(|e| matches!(e, TreeBuildError::MismatchedNesting { .. }))
    );
}

#[test]
fn parse_returns_first_error_in_source_order() {
    let src = "BEGIN:VCALENDAR\r\nEND:VEVENT\r\nEND:VCALENDAR\r\nEND:VCALENDAR\r\n";
    let err = parse(src).unwrap_err();
    let ParseError::Structure { line, .. } = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(line, 2);
}

#[test]
fn parse_rejects_control_characters() {
    let src = "BEGIN:VEVENT\r\nSUMMARY:bell\u{7}\r\nEND:VEVENT\r\n";
    let err = parse(src).unwrap_err();
    assert!(
        matches!(
            err,
            ParseError::ContentLine {
                line: 2,
                error: ContentLineError::InvalidCharacter { .. }
            }
        ),
        "unexpected error: {err:?}"
    );
}

#[test]
fn component_names_are_case_insensitive() {
    let roots = parse("begin:vcalendar\r\nend:VCALENDAR\r\n").unwrap();
    assert_eq!(roots[0].name, "VCALENDAR");
    assert!(roots[0].is("vcalendar"));
}
