//! `bibsift-record` — Bibliographic record model and collaborators.
//!
//! Pure data crate: the ordered record structure, the interchange XML
//! parser/serializer, and the per-tag structural diff. No CLI or IO
//! dependencies.

pub mod diff;
pub mod error;
pub mod model;
pub mod xml;

pub use diff::{record_diff, DiffCode, DiffResult};
pub use error::RecordError;
pub use model::{field_list_contains, Field, FieldId, Record, Subfield};
