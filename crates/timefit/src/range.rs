//! Time ranges: the fitter's currency.

use serde::{Deserialize, Serialize};

use crate::fit::FitError;
use crate::record::Record;
use crate::streamliner::Streamliner;
use crate::timestamp::{TimeValue, Timestamp, TimestampError};

/// An ordered pair of timestamps.
///
/// A range is *valid* when `start < stop`; the fitter never returns an
/// invalid range (it fails with [`FitError::NoRoom`] instead). Ranges
/// order lexicographically on `(start, stop)` so a fit result can serve
/// directly as a sort key.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub stop: Timestamp,
}

impl TimeRange {
    /// Builds a range from any two normalizable values. No fallback zone
    /// is applied; zone-naive inputs stay naive.
    pub fn new(
        start: impl Into<TimeValue>,
        stop: impl Into<TimeValue>,
    ) -> Result<Self, TimestampError> {
        Ok(Self {
            start: crate::timestamp::normalize(start, None)?,
            stop: crate::timestamp::normalize(stop, None)?,
        })
    }

    /// Whether `start < stop`; fails on an aware/naive mix.
    pub fn is_forward(&self) -> Result<bool, TimestampError> {
        Ok(self.start.try_cmp(&self.stop)? == std::cmp::Ordering::Less)
    }

    /// The plain `(start, stop)` pair.
    #[must_use]
    pub const fn as_pair(&self) -> (Timestamp, Timestamp) {
        (self.start, self.stop)
    }
}

/// Maps a timeline into plain `(start, stop)` pairs for an external
/// range-query consumer, using the default `"start"`/`"stop"` fields.
///
/// Entries are run through the same extraction pipeline as the fitter and
/// follow the same skip rules; no further validation is performed. Repeated
/// calls should go through a [`Streamliner`], which caches its accessors.
pub fn time_ranges<E: Record>(timeline: &[E]) -> Result<Vec<(Timestamp, Timestamp)>, FitError> {
    Streamliner::new().time_ranges(timeline)
}
