// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Integration test for the common module.
//!
//! Verifies that common test utilities work correctly.

mod common;

use common::{test_config, test_scheduler, weekly_standup_draft};

#[test]
fn common_module_config_works() {
    let config = test_config();
    assert_eq!(config.default_timezone.as_deref(), Some("UTC"));
    assert_eq!(config.owner, "local");
}

#[test]
fn common_module_scheduler_works() {
    let (scheduler, ctx) = test_scheduler();
    assert_eq!(scheduler.now().timestamp().to_string(), "2024-01-01T00:00:00Z");
    assert!(scheduler.list_series(&ctx).unwrap().is_empty());
}

#[test]
fn common_module_series_draft_works() {
    let draft = weekly_standup_draft();
    assert_eq!(draft.title, "Standup");
    assert!(draft.recurrence.is_some());
}
