// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - Test data factories (fixtures)
//! - Custom assertion helpers

mod assertions;
mod fixtures;

#[allow(unused_imports)]
pub use assertions::{assert_ascending, assert_starts, assert_within};
#[allow(unused_imports)]
pub use fixtures::{
    berlin, test_config, test_scheduler, test_series_draft, ts, utc, weekly_standup_draft,
};
