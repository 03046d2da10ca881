//! Fit time-bounded events into occupied timelines.
//!
//! This crate contains the types and logic for:
//! - Streamlining: shortening a candidate event until it avoids every
//!   occupant and occlusion on a timeline, or failing when no room is left
//! - Field access: reading/writing start and stop values from mixed record
//!   shapes through names or explicit closures
//! - Ordered insertion: keeping a timeline sorted as events arrive, with an
//!   offset hint that makes monotonic insertion sequences O(1) amortized
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use timefit::Streamliner;
//!
//! let tm = Streamliner::new();
//! let timeline = vec![
//!     json!({"start": "2024-01-01T00:00:00Z", "stop": "2024-01-02T00:00:00Z"}),
//! ];
//! let candidate = json!({"start": "2024-01-01T00:00:00Z", "stop": "2024-01-04T00:00:00Z"});
//! let fitted = tm.streamline_times(&candidate, &timeline, &[]).unwrap();
//! assert_eq!(fitted.start.to_string(), "2024-01-02T00:00:00+00:00");
//! ```

mod fit;
mod insert;
mod range;
mod record;
mod streamliner;
mod timestamp;

pub use fit::{FitError, streamline_event, streamline_event_times};
pub use insert::{Direction, InsertError, Insertion, ordered_insert};
pub use range::{TimeRange, time_ranges};
pub use record::{FieldBinding, Record};
pub use streamliner::Streamliner;
pub use timestamp::{TimeValue, Timestamp, TimestampError, normalize};
