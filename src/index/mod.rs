//! Index construction.
//!
//! Building is two passes. [`IndexBuilder`] turns raw documents into
//! forward-index bundles, one per input batch; [`Inverter`] groups the
//! bundles' records by term and writes the sharded postings. Both passes
//! are resumable: existing bundles and shards are left alone.

pub mod builder;
pub mod document;
pub mod forward;
pub mod inverter;

pub use builder::{BuildStats, IndexBuilder};
pub use document::{DocumentReader, FieldValue, SourceDocument};
pub use forward::{ForwardBundle, ForwardDocument};
pub use inverter::{InvertStats, InvertedRecord, Inverter};
