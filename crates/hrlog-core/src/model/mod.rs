//! Audit log data model
//!
//! - [`RecordSnapshot`] / [`FieldValue`]: loosely-typed point-in-time view of a record
//! - [`FieldChange`]: a difference found by the diff engine, not yet described
//! - [`ChangeEntry`]: a described, stamped, immutable log entry

pub mod entry;
pub mod snapshot;

pub use entry::{ChangeEntry, ChangeKind, FieldChange};
pub use snapshot::{FieldValue, RecordSnapshot, Scalar, Shape};
