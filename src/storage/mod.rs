//! On-disk postings store.
//!
//! Terms are grouped into shards by a short prefix ([`shard`]), each shard is
//! a term list / master index / postings triplet ([`format`]) placed under the
//! archive's `Postings` directory ([`layout`]). [`ShardWriter`] writes shards
//! once and atomically; [`PostingsStore`] answers term and wildcard lookups.

pub mod format;
pub mod layout;
pub mod lock;
pub mod postings;
pub mod reader;
pub mod shard;
pub mod store;
pub mod writer;

pub use format::{MasterIndex, ShardBytes};
pub use layout::ArchiveLayout;
pub use lock::ArchiveLock;
pub use postings::Postings;
pub use reader::ShardReader;
pub use store::PostingsStore;
pub use writer::ShardWriter;
