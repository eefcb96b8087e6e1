//! Field schema for bibliographic archives.
//!
//! The schema names every indexed field, how its values are normalized, and
//! which source document fields feed it. Index time and query time both read
//! the same schema so that terms land in, and are looked up from, the same
//! postings directories.

pub mod field;
#[allow(clippy::module_inception)]
pub mod schema;

pub use field::{FieldDefinition, FieldKind, Selection};
pub use schema::FieldSchema;
