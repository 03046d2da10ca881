//! Ordered insertion into an already-sorted timeline.
//!
//! The timeline is assumed sorted by the key field in the given
//! [`Direction`]; correctness requires that precondition. The primitive is
//! defensive but not exhaustive: it verifies the entry just before the
//! offset hint and every adjacent pair it scans, and fails with
//! [`InsertError::Unsorted`] when a violation makes the insertion point
//! undeterminable.
//!
//! Threading the returned offset into the next call makes a monotonic
//! insertion sequence cost O(1) amortized; passing `offset = 0` every call
//! rescans from the sorted boundary, which is always correct but linear.

use std::cmp::Ordering;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::FieldBinding;
use crate::timestamp::{Timestamp, TimestampError, normalize};

/// Sort order of a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Earliest key first.
    #[default]
    Ascending,
    /// Latest key first.
    Descending,
}

impl Direction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" => Ok(Self::Ascending),
            "descending" => Ok(Self::Descending),
            _ => Err(format!("invalid direction: {s}")),
        }
    }
}

/// Where an event landed and the scan hint for the next insertion.
///
/// `offset` is only meaningful for a follow-up call with the same
/// direction; a caller that cannot guarantee monotonic insertion order
/// passes 0 instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Index the event was inserted at.
    pub position: usize,
    /// Scan hint for the next insertion.
    pub offset: usize,
}

/// Ordered-insertion errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InsertError {
    /// The sortedness precondition is violated where the scan can see it.
    #[error("timeline is not sorted at position {position}")]
    Unsorted { position: usize },

    /// The candidate has no readable value for the key field.
    #[error("event has no usable {field:?} field")]
    MissingField { field: String },

    /// A timeline entry has no readable value for the key field.
    #[error("timeline entry {position} has no usable {field:?} field")]
    EntryMissingField { field: String, position: usize },

    /// A key value failed normalization or comparison.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

/// Inserts `event` into `timeline` at its sorted position.
///
/// Scanning starts at `offset` (0 = the sorted boundary; the direction
/// only flips the comparison, not where indexing begins) and advances
/// while entries still precede the candidate's key. Entries with an equal
/// key are passed over, so insertion order stays stable.
pub fn ordered_insert<E>(
    timeline: &mut Vec<E>,
    event: E,
    key: &FieldBinding<E>,
    direction: Direction,
    offset: usize,
    fallback_zone: Option<FixedOffset>,
) -> Result<Insertion, InsertError> {
    let Some(raw) = key.extract(&event) else {
        return Err(InsertError::MissingField {
            field: key.label().to_owned(),
        });
    };
    let candidate = normalize(raw, fallback_zone)?;

    let mut position = offset.min(timeline.len());
    // The entry just before the hint must already precede the candidate.
    let mut previous = match position.checked_sub(1) {
        Some(index) => Some(entry_key(timeline, index, key, fallback_zone)?),
        None => None,
    };
    if let Some(prev) = previous {
        if precedes(candidate, prev, direction)? {
            return Err(InsertError::Unsorted {
                position: position - 1,
            });
        }
    }

    while position < timeline.len() {
        let current = entry_key(timeline, position, key, fallback_zone)?;
        if let Some(prev) = previous {
            if precedes(current, prev, direction)? {
                return Err(InsertError::Unsorted { position });
            }
        }
        if precedes(candidate, current, direction)? {
            break;
        }
        previous = Some(current);
        position += 1;
    }

    timeline.insert(position, event);
    Ok(Insertion {
        position,
        offset: position,
    })
}

fn entry_key<E>(
    timeline: &[E],
    position: usize,
    key: &FieldBinding<E>,
    fallback_zone: Option<FixedOffset>,
) -> Result<Timestamp, InsertError> {
    let Some(raw) = key.extract(&timeline[position]) else {
        return Err(InsertError::EntryMissingField {
            field: key.label().to_owned(),
            position,
        });
    };
    Ok(normalize(raw, fallback_zone)?)
}

/// Whether `a` comes strictly before `b` under `direction`.
fn precedes(a: Timestamp, b: Timestamp, direction: Direction) -> Result<bool, TimestampError> {
    let ordering = a.try_cmp(&b)?;
    Ok(match direction {
        Direction::Ascending => ordering == Ordering::Less,
        Direction::Descending => ordering == Ordering::Greater,
    })
}
