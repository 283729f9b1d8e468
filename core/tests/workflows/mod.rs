// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end workflow tests for the recurcal-core crate.
//!
//! These tests drive the scheduler through multi-step scenarios covering
//! expansion, exceptions, schedule edits, calendar interchange and state
//! persistence.

mod expansion;
mod interchange;
mod occurrence_exceptions;
mod persistence;
mod series_lifecycle;
