//! Archive configuration.
//!
//! An archive is a directory holding forward bundles, postings and alias
//! tables. Everything else (worker counts, batch sizes, analysis switches)
//! has a default and can be overridden with the builder-style setters.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::{FieldAnalyzer, StopWords, Tokenizer};
use crate::error::{BibdexError, Result};
use crate::pipeline::PipelineConfig;
use crate::schema::FieldSchema;
use crate::storage::layout::ArchiveLayout;

/// Environment variable naming the archive root.
pub const ARCHIVE_ENV: &str = "BIBDEX_ARCHIVE";

/// Configuration shared by the builder, inverter and query engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Archive root directory.
    pub root: PathBuf,

    /// Worker threads per pipeline stage; 0 means one per CPU.
    pub workers: usize,

    /// Capacity of each bounded queue between stages.
    pub queue_capacity: usize,

    /// Documents per forward bundle when indexing a stream.
    pub batch_size: usize,

    /// Fold accented and Greek letters to ASCII.
    pub transliterate: bool,

    /// Optional stop-word file replacing the built-in table.
    pub stop_words: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    /// Defaults rooted at the current directory.
    fn default() -> Self {
        ArchiveConfig::new(".")
    }
}

impl ArchiveConfig {
    /// Create a configuration with defaults for the given root.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        ArchiveConfig {
            root: root.as_ref().to_path_buf(),
            workers: 0,
            queue_capacity: 256,
            batch_size: 1000,
            transliterate: true,
            stop_words: None,
        }
    }

    /// Read the root from the `BIBDEX_ARCHIVE` environment variable.
    pub fn from_env() -> Result<Self> {
        let root = env::var_os(ARCHIVE_ENV).ok_or_else(|| {
            BibdexError::config(format!("{ARCHIVE_ENV} is not set and no archive was given"))
        })?;
        Ok(Self::new(root))
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_transliteration(mut self, transliterate: bool) -> Self {
        self.transliterate = transliterate;
        self
    }

    pub fn with_stop_words<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.stop_words = Some(path.as_ref().to_path_buf());
        self
    }

    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    /// Pipeline sizing derived from this configuration.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig::new(self.worker_count(), self.queue_capacity)
    }

    /// Paths inside the archive.
    pub fn layout(&self) -> ArchiveLayout {
        ArchiveLayout::new(&self.root)
    }

    /// Fail unless the archive root exists and is a directory.
    pub fn verify_root(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(BibdexError::config(format!(
                "archive root {} is not mounted or not a directory",
                self.root.display()
            )))
        }
    }

    /// The archive's schema: `schema.json` in the root, or the built-in one.
    pub fn schema(&self) -> Result<FieldSchema> {
        let path = self.layout().schema_path();
        if path.is_file() {
            log::info!("loading schema from {}", path.display());
            FieldSchema::load(path)
        } else {
            Ok(FieldSchema::bibliographic())
        }
    }

    /// Analyzer configured with this archive's stop words and folding.
    pub fn analyzer(&self) -> Result<FieldAnalyzer> {
        let stop_words = match &self.stop_words {
            Some(path) => StopWords::load(path).map_err(|e| {
                BibdexError::config(format!("cannot read stop words {}: {e}", path.display()))
            })?,
            None => StopWords::english(),
        };
        Ok(FieldAnalyzer::new(
            Tokenizer::new(self.transliterate),
            Arc::new(stop_words),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_setters() {
        let config = ArchiveConfig::new("/tmp/archive")
            .with_workers(3)
            .with_batch_size(0)
            .with_queue_capacity(0);
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.queue_capacity, 1);
        assert!(config.transliterate);

        let config = ArchiveConfig::new("/tmp/archive");
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_verify_root() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(ArchiveConfig::new(dir.path()).verify_root().is_ok());

        let missing = ArchiveConfig::new(dir.path().join("missing"));
        let err = missing.verify_root().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_schema_falls_back_to_builtin() {
        let dir = tempfile::TempDir::new().unwrap();
        let schema = ArchiveConfig::new(dir.path()).schema().unwrap();
        assert_eq!(schema, FieldSchema::bibliographic());
    }

    #[test]
    fn test_missing_stop_word_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ArchiveConfig::new(dir.path()).with_stop_words(dir.path().join("nope.txt"));
        assert!(matches!(config.analyzer(), Err(BibdexError::Config(_))));
    }
}
