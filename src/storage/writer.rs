//! Writes shard triplets.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::storage::format::ShardBytes;
use crate::storage::layout::{temp_path, ArchiveLayout, MASTER_EXT, POSTINGS_EXT, TERM_EXT};

/// Write `bytes` to `path` through a temporary sibling and a rename, so
/// readers see either nothing or the complete file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp = temp_path(path);
    {
        let mut writer = BufWriter::new(File::create(&temp)?);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&temp, path)?;
    Ok(())
}

/// Places encoded shards under an archive's postings directory.
#[derive(Debug, Clone)]
pub struct ShardWriter {
    layout: ArchiveLayout,
}

impl ShardWriter {
    pub fn new(layout: ArchiveLayout) -> Self {
        ShardWriter { layout }
    }

    /// Whether the shard is already complete. The master index is written
    /// last, so its presence implies the other two files.
    pub fn exists(&self, field: &str, key: &str) -> bool {
        self.layout.shard_file(field, key, MASTER_EXT).is_file()
    }

    /// Write a shard unless it already exists. Returns whether it was written.
    pub fn write(&self, field: &str, key: &str, shard: &ShardBytes) -> Result<bool> {
        if self.exists(field, key) {
            log::debug!("shard {field}/{key} exists, skipping");
            return Ok(false);
        }

        write_atomic(&self.layout.shard_file(field, key, TERM_EXT), &shard.terms)?;
        write_atomic(
            &self.layout.shard_file(field, key, POSTINGS_EXT),
            &shard.postings,
        )?;
        write_atomic(&self.layout.shard_file(field, key, MASTER_EXT), &shard.master)?;
        log::trace!(
            "wrote shard {field}/{key}: {} term bytes, {} postings bytes",
            shard.terms.len(),
            shard.postings.len()
        );
        Ok(true)
    }
}
