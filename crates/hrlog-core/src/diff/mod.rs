//! Record snapshot diff engine.
//!
//! Compares two [`RecordSnapshot`](crate::model::RecordSnapshot)s and produces
//! the list of field-level changes, then renders them for humans.
//!
//! ## Entry point
//!
//! ```
//! use hrlog_core::diff::{compute_diff, describe};
//! use hrlog_core::model::RecordSnapshot;
//! use serde_json::json;
//!
//! let a = RecordSnapshot::from_json(json!({"name": "Ahmed", "age": 30}));
//! let b = RecordSnapshot::from_json(json!({"name": "Ahmed Khan", "age": 30}));
//! let changes = compute_diff(&a, &b);
//! assert_eq!(describe(&changes[0]), "Name was changed from \"Ahmed\" to \"Ahmed Khan\"");
//! ```
//!
//! ## Guarantees
//!
//! - **Totality**: every snapshot is diffable; unexpected shapes compare as
//!   opaque canonical values.
//! - **Idempotence**: `compute_diff(a, a)` is always empty.
//! - **Symmetry**: swapping the arguments yields the same field set.
//! - **Denylist**: `id`, `createdAt`, `updatedAt` and `picture` never
//!   produce changes.

pub mod describe;
pub mod engine;
pub mod human_summary;
pub mod summary;

pub use describe::{describe, display_value, format_field_name};
pub use engine::{compute_diff, compute_diff_with, DEFAULT_DENYLIST};
pub use human_summary::render_human_summary;
