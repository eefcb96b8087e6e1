//! Paths inside an archive directory.
//!
//! ```text
//! <root>/Forward/<batch>.fwd
//! <root>/Postings/<FIELD>/<shard-path>/<key>.trm|.mst|.pst
//! <root>/Data/mesh.txt|journals.txt|pubtypes.txt
//! <root>/schema.json
//! <root>/.bibdex.lock
//! ```

use std::path::{Path, PathBuf};

use crate::storage::shard::shard_dir;

/// Term list extension.
pub const TERM_EXT: &str = "trm";
/// Master index extension.
pub const MASTER_EXT: &str = "mst";
/// Postings extension.
pub const POSTINGS_EXT: &str = "pst";
/// Forward bundle extension.
pub const FORWARD_EXT: &str = "fwd";

/// Resolves archive paths from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        ArchiveLayout {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn forward_dir(&self) -> PathBuf {
        self.root.join("Forward")
    }

    pub fn forward_path(&self, batch: &str) -> PathBuf {
        self.forward_dir().join(format!("{batch}.{FORWARD_EXT}"))
    }

    pub fn postings_dir(&self) -> PathBuf {
        self.root.join("Postings")
    }

    pub fn field_dir(&self, field: &str) -> PathBuf {
        self.postings_dir().join(field)
    }

    /// Directory holding the shard with the given key.
    pub fn shard_dir(&self, field: &str, key: &str) -> PathBuf {
        self.field_dir(field).join(shard_dir(key))
    }

    /// Path of one file of a shard triplet.
    pub fn shard_file(&self, field: &str, key: &str, ext: &str) -> PathBuf {
        self.shard_dir(field, key).join(format!("{key}.{ext}"))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("Data")
    }

    pub fn schema_path(&self) -> PathBuf {
        self.root.join("schema.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".bibdex.lock")
    }
}

/// Temporary sibling used while a file is being written.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_paths() {
        let layout = ArchiveLayout::new("/archive");
        assert_eq!(
            layout.shard_file("TIAB", "tra", TERM_EXT),
            PathBuf::from("/archive/Postings/TIAB/t/tr/tra.trm")
        );
        assert_eq!(
            layout.shard_file("TIAB", "tn", MASTER_EXT),
            PathBuf::from("/archive/Postings/TIAB/t/tn.mst")
        );
        assert_eq!(
            layout.forward_path("chunk000001"),
            PathBuf::from("/archive/Forward/chunk000001.fwd")
        );
        assert_eq!(
            temp_path(Path::new("/archive/Forward/a.fwd")),
            PathBuf::from("/archive/Forward/a.fwd.tmp")
        );
    }
}
