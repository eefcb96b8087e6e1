//! Read access to one shard triplet.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};
use regex::Regex;

use crate::error::{BibdexError, Result};
use crate::storage::format::{decode_postings, decode_term_list, MasterIndex};
use crate::storage::layout::{ArchiveLayout, MASTER_EXT, POSTINGS_EXT, TERM_EXT};
use crate::storage::postings::Postings;

/// A loaded shard: its term list and master index in memory, its postings
/// file memory-mapped.
#[derive(Debug)]
pub struct ShardReader {
    key: String,
    terms: Vec<String>,
    master: MasterIndex,
    postings: Option<Mmap>,
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BibdexError::from(e)),
    }
}

impl ShardReader {
    /// Open the shard `key` of `field`. Returns `Ok(None)` when the shard
    /// was never written.
    pub fn open(layout: &ArchiveLayout, field: &str, key: &str) -> Result<Option<Self>> {
        let master_path = layout.shard_file(field, key, MASTER_EXT);
        let terms_path = layout.shard_file(field, key, TERM_EXT);

        let (master, terms) = rayon::join(
            || read_optional(&master_path),
            || read_optional(&terms_path),
        );
        let (master, terms) = match (master?, terms?) {
            (Some(master), Some(terms)) => (master, terms),
            (None, None) => return Ok(None),
            _ => {
                return Err(BibdexError::format(format!(
                    "shard {field}/{key} is missing its term list or master index"
                )));
            }
        };

        let master = MasterIndex::decode(&master)?;
        let terms = decode_term_list(&terms, &master)?;

        let postings_path = layout.shard_file(field, key, POSTINGS_EXT);
        let file = File::open(&postings_path)?;
        let len = file.metadata()?.len() as usize;
        let (_, expected) = master.totals();
        if len != expected {
            return Err(BibdexError::format(format!(
                "{} is {len} bytes but the master index expects {expected}",
                postings_path.display()
            )));
        }
        let postings = if len == 0 {
            None
        } else {
            // SAFETY: shard files are written once under a temporary name and
            // renamed into place; nothing modifies them afterwards.
            Some(unsafe { MmapOptions::new().map(&file)? })
        };

        Ok(Some(ShardReader {
            key: key.to_string(),
            terms,
            master,
            postings,
        }))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_positional(&self) -> bool {
        self.master.is_positional()
    }

    /// The shard's sorted terms.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Binary-search for an exact term.
    pub fn find(&self, term: &str) -> Option<usize> {
        self.terms
            .binary_search_by(|probe| probe.as_str().cmp(term))
            .ok()
    }

    /// Indices of terms starting with `prefix` that also match `pattern`.
    pub fn matching(&self, prefix: &str, pattern: &Regex) -> Vec<usize> {
        let start = self.terms.partition_point(|t| t.as_str() < prefix);
        self.terms[start..]
            .iter()
            .take_while(|t| t.starts_with(prefix))
            .enumerate()
            .filter(|(_, t)| pattern.is_match(t))
            .map(|(i, _)| start + i)
            .collect()
    }

    /// Number of identifiers stored for term `i`, without decoding positions.
    pub fn document_count(&self, i: usize) -> Result<usize> {
        if self.is_positional() {
            Ok(self.postings(i)?.len())
        } else {
            let (start, end) = self.master.postings_span(i);
            Ok((end - start) / 4)
        }
    }

    /// Decode the postings of term `i`.
    pub fn postings(&self, i: usize) -> Result<Postings> {
        let (start, end) = self.master.postings_span(i);
        let bytes: &[u8] = match &self.postings {
            Some(map) => &map[..],
            None => &[],
        };
        let slice = bytes.get(start..end).ok_or_else(|| {
            BibdexError::format(format!(
                "postings range {start}..{end} of shard {} is out of bounds",
                self.key
            ))
        })?;
        decode_postings(slice, self.is_positional())
    }

    /// Postings of an exact term, if present.
    pub fn lookup(&self, term: &str) -> Result<Option<Postings>> {
        self.find(term).map(|i| self.postings(i)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::format::encode_shard;
    use crate::storage::writer::ShardWriter;
    use tempfile::TempDir;

    fn write_shard(layout: &ArchiveLayout) {
        let entries = vec![
            ("trans".to_string(), Postings::from_uids(vec![4])),
            ("transfer".to_string(), Postings::from_uids(vec![1, 2])),
            ("transposition".to_string(), Postings::from_uids(vec![2539356])),
            ("trial".to_string(), Postings::from_uids(vec![3])),
        ];
        let bytes = encode_shard(&entries, false).unwrap();
        ShardWriter::new(layout.clone())
            .write("TIAB", "tra", &bytes)
            .unwrap();
    }

    #[test]
    fn test_find_and_lookup() {
        let dir = TempDir::new().unwrap();
        let layout = ArchiveLayout::new(dir.path());
        write_shard(&layout);

        let shard = ShardReader::open(&layout, "TIAB", "tra").unwrap().unwrap();
        assert_eq!(shard.terms().len(), 4);
        assert_eq!(shard.find("transfer"), Some(1));
        assert_eq!(shard.find("transform"), None);
        assert_eq!(
            shard.lookup("transposition").unwrap().unwrap().uids,
            vec![2539356]
        );
        assert_eq!(shard.document_count(1).unwrap(), 2);
    }

    #[test]
    fn test_matching_prefix_and_pattern() {
        let dir = TempDir::new().unwrap();
        let layout = ArchiveLayout::new(dir.path());
        write_shard(&layout);

        let shard = ShardReader::open(&layout, "TIAB", "tra").unwrap().unwrap();
        let pattern = Regex::new("^trans.*$").unwrap();
        assert_eq!(shard.matching("trans", &pattern), vec![0, 1, 2]);

        let pattern = Regex::new("^trans.*r$").unwrap();
        assert_eq!(shard.matching("trans", &pattern), vec![1]);
    }

    #[test]
    fn test_missing_shard_is_none() {
        let dir = TempDir::new().unwrap();
        let layout = ArchiveLayout::new(dir.path());
        assert!(ShardReader::open(&layout, "TIAB", "zz").unwrap().is_none());
    }

    #[test]
    fn test_truncated_postings_is_format_error() {
        let dir = TempDir::new().unwrap();
        let layout = ArchiveLayout::new(dir.path());
        write_shard(&layout);

        let path = layout.shard_file("TIAB", "tra", POSTINGS_EXT);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();
        assert!(matches!(
            ShardReader::open(&layout, "TIAB", "tra"),
            Err(BibdexError::Format(_))
        ));
    }
}
