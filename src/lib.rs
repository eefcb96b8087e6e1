//! # bibdex
//!
//! An offline, sharded full-text search engine for bibliographic archives.
//!
//! ## Features
//!
//! - Forward indexing of JSON-lines citation records on a worker pool
//! - Inversion into prefix-sharded, memory-mapped postings files
//! - Boolean, phrase and proximity queries with field qualifiers
//! - MeSH, journal and publication-type alias tables
//! - Batch cross-reference resolution over citation links
//!
//! ```no_run
//! use bibdex::config::ArchiveConfig;
//! use bibdex::query::SearchEngine;
//!
//! let config = ArchiveConfig::new("/data/archive");
//! let engine = SearchEngine::open(&config)?;
//! for uid in engine.search("\"tn3 transposition\" & 1980:1990[YEAR]")? {
//!     println!("{uid}");
//! }
//! # Ok::<(), bibdex::error::BibdexError>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod link;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod storage;

pub mod prelude {
    pub use crate::config::ArchiveConfig;
    pub use crate::error::{BibdexError, Result};
    pub use crate::index::{IndexBuilder, Inverter};
    pub use crate::link::LinkResolver;
    pub use crate::query::SearchEngine;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
