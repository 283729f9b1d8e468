// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use jiff::{SignedDuration, Timestamp, Zoned};

use crate::error::{Error, ValidationError};
use crate::generator::generate;
use crate::series::{Exception, ExceptionKind, Occurrence, Series};

/// Occurrences of `series` whose original start lies in
/// `[window_start, window_end]`, with exceptions applied.
///
/// Deleted slots are dropped and modified slots carry their override. The
/// result is ascending by original start. Exceptions made against another
/// recurrence version, or matching no generated slot, have no effect.
///
/// # Errors
///
/// Same as [`generate`].
pub fn materialize(
    series: &Series,
    exceptions: &[Exception],
    window_start: Timestamp,
    window_end: Timestamp,
    limit: usize,
) -> Result<Vec<Occurrence>, Error> {
    let slots = generate(series, window_start, window_end, limit)?;

    let mut by_slot = HashMap::with_capacity(exceptions.len());
    for exc in exceptions {
        if exc.series_id != series.id() {
            continue;
        }
        if exc.recurrence_version != series.recurrence_version() {
            tracing::warn!(
                series_id = series.id(),
                original_start = %exc.original_start,
                exception_version = exc.recurrence_version,
                series_version = series.recurrence_version(),
                "ignoring exception from another recurrence version"
            );
            continue;
        }
        by_slot.insert(exc.original_start, &exc.kind);
    }

    let duration = series.duration();
    let mut occurrences = Vec::with_capacity(slots.len());
    for slot in slots {
        let occurrence = match by_slot.get(&slot.timestamp()) {
            Some(ExceptionKind::Deleted) => continue,
            Some(ExceptionKind::Modified(o)) => {
                let end = match &o.end {
                    Some(end) => end.clone(),
                    None => end_after(&o.start, duration)?,
                };
                Occurrence {
                    series_id: series.id().to_owned(),
                    start: o.start.clone(),
                    end,
                    title: o.title.clone().unwrap_or_else(|| series.title().to_owned()),
                    description: o
                        .description
                        .clone()
                        .unwrap_or_else(|| series.description().to_owned()),
                    modified: true,
                    original_start: slot,
                }
            }
            None => plain(series, slot, duration)?,
        };
        occurrences.push(occurrence);
    }

    Ok(occurrences)
}

fn plain(series: &Series, slot: Zoned, duration: SignedDuration) -> Result<Occurrence, Error> {
    let end = end_after(&slot, duration)?;
    Ok(Occurrence {
        series_id: series.id().to_owned(),
        start: slot.clone(),
        end,
        title: series.title().to_owned(),
        description: series.description().to_owned(),
        modified: false,
        original_start: slot,
    })
}

fn end_after(start: &Zoned, duration: SignedDuration) -> Result<Zoned, Error> {
    start
        .checked_add(duration)
        .map_err(|e| ValidationError::new("end", e.to_string()).into())
}
