//! The interval fitter.
//!
//! Shortens a candidate event until it fits the unoccupied gaps of a
//! timeline, honoring priority order:
//!
//! 1. Occlusions are applied first and unconditionally.
//! 2. Occupants follow in slice order; index 0 has the highest priority.
//! 3. A block reaching the front of the working range advances its start;
//!    a block across the tail or interior pulls its stop back.
//! 4. A block covering the whole working range, or any shortening that
//!    collapses it, fails with [`FitError::NoRoom`].
//!
//! Occupants that cannot be read (missing fields) or that are not forward
//! ranges are skipped, never fatal. Values that are present but not
//! recognizable timestamps propagate as errors.

use std::cmp::Ordering;

use chrono::FixedOffset;
use thiserror::Error;

use crate::range::TimeRange;
use crate::record::{FieldBinding, Record};
use crate::streamliner::Streamliner;
use crate::timestamp::{Timestamp, TimestampError, normalize};

/// Fitting errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    /// No valid non-empty interval remains for the candidate.
    #[error("no room left on the timeline for the event")]
    NoRoom,

    /// The candidate has no readable value for a bound field.
    #[error("event has no usable {field:?} field")]
    MissingField { field: String },

    /// Write-back was requested through a binding that has no writer.
    #[error("the {field:?} field cannot be written back")]
    WriteUnsupported { field: String },

    /// A start/stop value failed normalization or comparison.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

pub(crate) type FilterFn<E> = dyn Fn(&E) -> bool + Send + Sync;

/// One-shot fit with the default `"start"`/`"stop"` fields.
///
/// Equivalent to `Streamliner::new().streamline_times(event, timeline, &[])`.
/// Repeated calls should construct a [`Streamliner`] once instead, since the
/// free form rebuilds its field bindings on every call.
pub fn streamline_event_times<E: Record>(
    event: &E,
    timeline: &[E],
) -> Result<TimeRange, FitError> {
    Streamliner::new().streamline_times(event, timeline, &[])
}

/// One-shot fit-and-write-back with the default `"start"`/`"stop"` fields.
///
/// Consumes the candidate, adjusts its boundaries in place, and returns it,
/// so the result can be appended straight onto the timeline it was fitted
/// against. The same accessor-rebuild cost as [`streamline_event_times`]
/// applies.
pub fn streamline_event<E: Record>(event: E, timeline: &[E]) -> Result<E, FitError> {
    Streamliner::new().streamline(event, timeline, &[])
}

/// Core fitting loop shared by the facade and the one-shot functions.
pub(crate) fn fit_times<E>(
    event: &E,
    timeline: &[E],
    occlusions: &[TimeRange],
    start: &FieldBinding<E>,
    stop: &FieldBinding<E>,
    filter: Option<&FilterFn<E>>,
    fallback_zone: Option<FixedOffset>,
) -> Result<TimeRange, FitError> {
    let raw_start = start
        .extract(event)
        .ok_or_else(|| FitError::MissingField {
            field: start.label().to_owned(),
        })?;
    let raw_stop = stop.extract(event).ok_or_else(|| FitError::MissingField {
        field: stop.label().to_owned(),
    })?;
    let mut lo = normalize(raw_start, fallback_zone)?;
    let mut hi = normalize(raw_stop, fallback_zone)?;
    if hi.try_cmp(&lo)? != Ordering::Greater {
        return Err(FitError::NoRoom);
    }

    for occlusion in occlusions {
        let blocked = match fallback_zone {
            Some(zone) => TimeRange {
                start: occlusion.start.or_zone(zone),
                stop: occlusion.stop.or_zone(zone),
            },
            None => *occlusion,
        };
        if blocked.stop.try_cmp(&blocked.start)? != Ordering::Greater {
            tracing::trace!(range = ?blocked, "skipping empty occlusion");
            continue;
        }
        shorten(&mut lo, &mut hi, blocked.start, blocked.stop)?;
    }

    for (position, occupant) in timeline.iter().enumerate() {
        if filter.is_some_and(|keep| !keep(occupant)) {
            continue;
        }
        let Some((blocked_start, blocked_stop)) =
            occupant_bounds(position, occupant, start, stop, fallback_zone)?
        else {
            continue;
        };
        if blocked_stop.try_cmp(&blocked_start)? != Ordering::Greater {
            tracing::trace!(position, "skipping occupant with non-forward range");
            continue;
        }
        shorten(&mut lo, &mut hi, blocked_start, blocked_stop)?;
    }

    Ok(TimeRange { start: lo, stop: hi })
}

/// Applies one blocked range to the working range.
fn shorten(
    lo: &mut Timestamp,
    hi: &mut Timestamp,
    blocked_start: Timestamp,
    blocked_stop: Timestamp,
) -> Result<(), FitError> {
    if blocked_start.try_cmp(lo)? != Ordering::Greater {
        // The block reaches the front of the working range.
        if blocked_stop.try_cmp(hi)? != Ordering::Less {
            return Err(FitError::NoRoom);
        }
        if blocked_stop.try_cmp(lo)? == Ordering::Greater {
            *lo = blocked_stop;
        }
    } else if blocked_start.try_cmp(hi)? == Ordering::Less {
        // Tail or interior block: the stop boundary yields.
        *hi = blocked_start;
    }
    if hi.try_cmp(lo)? != Ordering::Greater {
        return Err(FitError::NoRoom);
    }
    Ok(())
}

/// Reads and normalizes one occupant's boundaries, or `None` when a field
/// is missing and the occupant should be skipped.
pub(crate) fn occupant_bounds<E>(
    position: usize,
    occupant: &E,
    start: &FieldBinding<E>,
    stop: &FieldBinding<E>,
    fallback_zone: Option<FixedOffset>,
) -> Result<Option<(Timestamp, Timestamp)>, TimestampError> {
    let Some(raw_start) = start.extract(occupant) else {
        tracing::trace!(position, field = start.label(), "skipping occupant without field");
        return Ok(None);
    };
    let Some(raw_stop) = stop.extract(occupant) else {
        tracing::trace!(position, field = stop.label(), "skipping occupant without field");
        return Ok(None);
    };
    Ok(Some((
        normalize(raw_start, fallback_zone)?,
        normalize(raw_stop, fallback_zone)?,
    )))
}

/// Maps a timeline into plain `(start, stop)` pairs, applying the fitter's
/// skip rules and nothing more.
pub(crate) fn collect_ranges<E>(
    timeline: &[E],
    start: &FieldBinding<E>,
    stop: &FieldBinding<E>,
    filter: Option<&FilterFn<E>>,
    fallback_zone: Option<FixedOffset>,
) -> Result<Vec<(Timestamp, Timestamp)>, FitError> {
    let mut pairs = Vec::with_capacity(timeline.len());
    for (position, occupant) in timeline.iter().enumerate() {
        if filter.is_some_and(|keep| !keep(occupant)) {
            continue;
        }
        let Some((range_start, range_stop)) =
            occupant_bounds(position, occupant, start, stop, fallback_zone)?
        else {
            continue;
        };
        if range_stop.try_cmp(&range_start)? != Ordering::Greater {
            tracing::trace!(position, "skipping occupant with non-forward range");
            continue;
        }
        pairs.push((range_start, range_stop));
    }
    Ok(pairs)
}
