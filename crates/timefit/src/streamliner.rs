//! The configured front door to fitting and insertion.
//!
//! A [`Streamliner`] derives its field accessors once and reuses them for
//! every call, which is the recommended form for repeated work; the free
//! functions ([`streamline_event_times`](crate::streamline_event_times) and
//! friends) rebuild theirs on each invocation.

use std::fmt;

use chrono::FixedOffset;

use crate::fit::{self, FilterFn, FitError};
use crate::insert::{Direction, InsertError, Insertion, ordered_insert};
use crate::range::TimeRange;
use crate::record::{FieldBinding, Record};
use crate::timestamp::Timestamp;

/// Immutable bundle of field bindings, default direction, fallback zone,
/// and an optional occupant filter.
///
/// Construct once, share freely: the holder never mutates after
/// construction and owns no event or timeline data.
pub struct Streamliner<E> {
    start: FieldBinding<E>,
    stop: FieldBinding<E>,
    filter: Option<Box<FilterFn<E>>>,
    direction: Direction,
    fallback_zone: Option<FixedOffset>,
}

impl<E: Record> Streamliner<E> {
    /// Defaults: `"start"`/`"stop"` field names, ascending direction, no
    /// fallback zone, no filter.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fields("start", "stop")
    }

    /// Binds different field names, e.g. `"begin"`/`"end"`.
    #[must_use]
    pub fn with_fields(start: impl Into<String>, stop: impl Into<String>) -> Self {
        Self::with_bindings(FieldBinding::named(start), FieldBinding::named(stop))
    }
}

impl<E: Record> Default for Streamliner<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Streamliner<E> {
    /// Builds a holder from explicit bindings; events then need no
    /// [`Record`] implementation.
    #[must_use]
    pub fn with_bindings(start: FieldBinding<E>, stop: FieldBinding<E>) -> Self {
        Self {
            start,
            stop,
            filter: None,
            direction: Direction::default(),
            fallback_zone: None,
        }
    }

    /// Only occupants for which `keep` returns `true` are considered.
    #[must_use]
    pub fn filter(mut self, keep: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(keep));
        self
    }

    /// Zone attached to zone-naive inputs during normalization.
    #[must_use]
    pub fn fallback_zone(mut self, zone: FixedOffset) -> Self {
        self.fallback_zone = Some(zone);
        self
    }

    /// Default sort order assumed by [`insert`](Self::insert).
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Fits the candidate against the timeline and occlusions, returning
    /// the shortened range. The candidate is not touched.
    pub fn streamline_times(
        &self,
        event: &E,
        timeline: &[E],
        occlusions: &[TimeRange],
    ) -> Result<TimeRange, FitError> {
        fit::fit_times(
            event,
            timeline,
            occlusions,
            &self.start,
            &self.stop,
            self.filter.as_deref(),
            self.fallback_zone,
        )
    }

    /// Fits the candidate and writes the result back into it, returning
    /// the adjusted event ready to join the timeline.
    pub fn streamline(
        &self,
        mut event: E,
        timeline: &[E],
        occlusions: &[TimeRange],
    ) -> Result<E, FitError> {
        let fitted = self.streamline_times(&event, timeline, occlusions)?;
        assign(&self.start, &mut event, &fitted.start)?;
        assign(&self.stop, &mut event, &fitted.stop)?;
        Ok(event)
    }

    /// Ordered insertion keyed on the start binding, in the configured
    /// default direction.
    pub fn insert(
        &self,
        timeline: &mut Vec<E>,
        event: E,
        offset: usize,
    ) -> Result<Insertion, InsertError> {
        self.insert_directed(timeline, event, self.direction, offset)
    }

    /// Ordered insertion with a per-call direction override. The offset
    /// from a previous call is only valid under the same direction; pass 0
    /// when switching.
    pub fn insert_directed(
        &self,
        timeline: &mut Vec<E>,
        event: E,
        direction: Direction,
        offset: usize,
    ) -> Result<Insertion, InsertError> {
        ordered_insert(
            timeline,
            event,
            &self.start,
            direction,
            offset,
            self.fallback_zone,
        )
    }

    /// Maps the timeline into plain `(start, stop)` pairs for an external
    /// range-query consumer, applying the fitter's skip rules.
    pub fn time_ranges(&self, timeline: &[E]) -> Result<Vec<(Timestamp, Timestamp)>, FitError> {
        fit::collect_ranges(
            timeline,
            &self.start,
            &self.stop,
            self.filter.as_deref(),
            self.fallback_zone,
        )
    }
}

fn assign<E>(
    binding: &FieldBinding<E>,
    event: &mut E,
    value: &Timestamp,
) -> Result<(), FitError> {
    match binding.assign(event, value) {
        Some(true) => Ok(()),
        _ => Err(FitError::WriteUnsupported {
            field: binding.label().to_owned(),
        }),
    }
}

impl<E> fmt::Debug for Streamliner<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streamliner")
            .field("start", &self.start.label())
            .field("stop", &self.stop.label())
            .field("filter", &self.filter.is_some())
            .field("direction", &self.direction)
            .field("fallback_zone", &self.fallback_zone)
            .finish()
    }
}
