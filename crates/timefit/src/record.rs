//! Generic field access over heterogeneous event records.
//!
//! The fitter never sees concrete event types. It reads and writes start
//! and stop values through a [`FieldBinding`], which is either a field name
//! resolved through the [`Record`] trait or a pair of caller-supplied
//! closures. Dispatch is per record, so a single timeline may mix
//! mapping-like entries (`serde_json::Value`) with plain structs.

use std::fmt;

use crate::timestamp::{TimeValue, Timestamp};

/// Field access by name, implemented by any record shape.
///
/// Mapping-like records resolve fields by key lookup; attribute-like
/// records (plain structs) match on the field name. `set_field` returns
/// `false` when the record has no way to hold the field.
pub trait Record {
    /// Reads the raw value of `name`, or `None` when the record has no
    /// such field.
    fn field(&self, name: &str) -> Option<TimeValue>;

    /// Writes `value` into `name`, returning whether the write applied.
    fn set_field(&mut self, name: &str, value: &Timestamp) -> bool;
}

/// Mapping-like access: key lookup on JSON objects.
impl Record for serde_json::Value {
    fn field(&self, name: &str) -> Option<TimeValue> {
        self.as_object()?.get(name).cloned().map(TimeValue::from)
    }

    fn set_field(&mut self, name: &str, value: &Timestamp) -> bool {
        match self.as_object_mut() {
            Some(map) => {
                map.insert(name.to_owned(), serde_json::Value::String(value.to_string()));
                true
            }
            None => false,
        }
    }
}

/// Lets timelines hold mixed record shapes behind `Box<dyn Record>`.
impl<R: Record + ?Sized> Record for Box<R> {
    fn field(&self, name: &str) -> Option<TimeValue> {
        (**self).field(name)
    }

    fn set_field(&mut self, name: &str, value: &Timestamp) -> bool {
        (**self).set_field(name, value)
    }
}

type ReadFn<E> = dyn Fn(&E) -> Option<TimeValue> + Send + Sync;
type WriteFn<E> = dyn Fn(&mut E, &Timestamp) -> bool + Send + Sync;

/// A resolved accessor pair for one field of an event type.
///
/// Built once and reused across calls; rebuilding bindings on every
/// operation is the cost the one-shot free functions pay and the
/// [`Streamliner`](crate::Streamliner) avoids.
pub struct FieldBinding<E> {
    label: String,
    read: Box<ReadFn<E>>,
    write: Option<Box<WriteFn<E>>>,
}

impl<E: Record> FieldBinding<E> {
    /// Binds a field name, used for both reading and writing through the
    /// [`Record`] trait.
    pub fn named(field: impl Into<String>) -> Self {
        let label = field.into();
        let read_name = label.clone();
        let write_name = label.clone();
        Self {
            label,
            read: Box::new(move |event: &E| event.field(&read_name)),
            write: Some(Box::new(move |event: &mut E, value: &Timestamp| {
                event.set_field(&write_name, value)
            })),
        }
    }
}

impl<E> FieldBinding<E> {
    /// Binds an explicit extraction closure. The binding cannot write back
    /// unless a writer is added with [`with_writer`](Self::with_writer).
    pub fn reader(read: impl Fn(&E) -> Option<TimeValue> + Send + Sync + 'static) -> Self {
        Self {
            label: "<custom>".to_owned(),
            read: Box::new(read),
            write: None,
        }
    }

    /// Adds an explicit assignment closure.
    #[must_use]
    pub fn with_writer(mut self, write: impl Fn(&mut E, &Timestamp) + Send + Sync + 'static) -> Self {
        self.write = Some(Box::new(move |event, value| {
            write(event, value);
            true
        }));
        self
    }

    /// The bound field name, or `"<custom>"` for closure bindings.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn extract(&self, event: &E) -> Option<TimeValue> {
        (self.read)(event)
    }

    /// `None` when the binding has no writer; `Some(applied)` otherwise.
    pub(crate) fn assign(&self, event: &mut E, value: &Timestamp) -> Option<bool> {
        self.write.as_ref().map(|write| write(event, value))
    }
}

impl<E> fmt::Debug for FieldBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
