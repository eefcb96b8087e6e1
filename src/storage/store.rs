//! Term lookup over an archive's postings directory.
//!
//! [`PostingsStore`] is the read side used by the query evaluator and the
//! link resolver. Lookups never fail: a missing term is an empty list, and a
//! shard that cannot be read or decoded is logged and contributes nothing.
//! The `try_` variants surface those errors for callers that want them.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use regex::Regex;

use crate::analysis::analyzer::pad_numeric;
use crate::error::{BibdexError, Result};
use crate::storage::layout::{ArchiveLayout, MASTER_EXT};
use crate::storage::postings::Postings;
use crate::storage::reader::ShardReader;
use crate::storage::shard::{fixed_key, key_may_contain, shard_key};

/// Compile a `*` wildcard pattern into an anchored regular expression.
pub fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Ok(Regex::new(&format!("^{body}$"))?)
}

/// The literal text before the first `*`.
pub fn literal_prefix(pattern: &str) -> &str {
    match pattern.find('*') {
        Some(i) => &pattern[..i],
        None => pattern,
    }
}

/// Read-only access to the inverted index.
#[derive(Debug, Clone)]
pub struct PostingsStore {
    layout: ArchiveLayout,
}

impl PostingsStore {
    /// Open the store of an archive, failing if it has no postings directory.
    pub fn open(layout: ArchiveLayout) -> Result<Self> {
        let postings = layout.postings_dir();
        if !postings.is_dir() {
            return Err(BibdexError::config(format!(
                "postings directory {} not found; run `invert` first",
                postings.display()
            )));
        }
        Ok(PostingsStore { layout })
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    /// Load one shard.
    pub fn shard(&self, field: &str, key: &str) -> Result<Option<ShardReader>> {
        ShardReader::open(&self.layout, field, key)
    }

    /// Postings of a term or wildcard pattern, with positions when the field
    /// stores them. Errors are logged and yield an empty list.
    pub fn lookup(&self, field: &str, term: &str) -> Postings {
        self.try_lookup(field, term).unwrap_or_else(|e| {
            log::warn!("lookup of '{term}' in {field} failed: {e}");
            Postings::empty()
        })
    }

    /// Identifiers only.
    pub fn lookup_uids(&self, field: &str, term: &str) -> Vec<u32> {
        self.lookup(field, term).into_uids()
    }

    /// Like [`lookup`](Self::lookup), surfacing shard errors.
    pub fn try_lookup(&self, field: &str, term: &str) -> Result<Postings> {
        if term.contains('*') {
            return self.try_lookup_wildcard(field, term);
        }
        let term = pad_numeric(term);
        let key = shard_key(&term);
        let Some(shard) = self.shard(field, &key)? else {
            log::trace!("no shard {field}/{key} for '{term}'");
            return Ok(Postings::empty());
        };
        Ok(shard.lookup(&term)?.unwrap_or_default())
    }

    fn try_lookup_wildcard(&self, field: &str, pattern: &str) -> Result<Postings> {
        let regex = wildcard_regex(pattern)?;
        let prefix = literal_prefix(pattern);
        let lists = self
            .shard_keys_for_prefix(field, prefix)?
            .par_iter()
            .map(|key| -> Result<Vec<Postings>> {
                let Some(shard) = self.shard(field, key)? else {
                    return Ok(Vec::new());
                };
                shard
                    .matching(prefix, &regex)
                    .into_iter()
                    .map(|i| shard.postings(i))
                    .collect()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(lists
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<Postings>, list| {
                Some(match acc {
                    Some(acc) => acc.union(&list),
                    None => list,
                })
            })
            .unwrap_or_default())
    }

    /// Every stored term matching a pattern with its document count, in term
    /// order. A pattern without `*` matches at most one term.
    pub fn term_counts(&self, field: &str, pattern: &str) -> Vec<(String, usize)> {
        self.try_term_counts(field, pattern).unwrap_or_else(|e| {
            log::warn!("counting '{pattern}' in {field} failed: {e}");
            Vec::new()
        })
    }

    pub fn try_term_counts(&self, field: &str, pattern: &str) -> Result<Vec<(String, usize)>> {
        if !pattern.contains('*') {
            let term = pad_numeric(pattern);
            let Some(shard) = self.shard(field, &shard_key(&term))? else {
                return Ok(Vec::new());
            };
            return Ok(match shard.find(&term) {
                Some(i) => vec![(term, shard.document_count(i)?)],
                None => Vec::new(),
            });
        }

        let regex = wildcard_regex(pattern)?;
        let prefix = literal_prefix(pattern);
        let mut counts = self
            .shard_keys_for_prefix(field, prefix)?
            .par_iter()
            .map(|key| -> Result<Vec<(String, usize)>> {
                let Some(shard) = self.shard(field, key)? else {
                    return Ok(Vec::new());
                };
                shard
                    .matching(prefix, &regex)
                    .into_iter()
                    .map(|i| -> Result<(String, usize)> {
                        Ok((shard.terms()[i].clone(), shard.document_count(i)?))
                    })
                    .collect()
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        counts.sort();
        Ok(counts)
    }

    /// Stored terms of a field starting with `prefix`.
    pub fn terms(&self, field: &str, prefix: &str) -> Vec<String> {
        self.term_counts(field, &format!("{prefix}*"))
            .into_iter()
            .map(|(term, _)| term)
            .collect()
    }

    /// Keys of every shard written for a field, sorted.
    pub fn shard_keys(&self, field: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let dir = self.layout.field_dir(field);
        if dir.is_dir() {
            collect_keys(&dir, &mut keys)?;
        }
        keys.sort();
        Ok(keys)
    }

    /// Keys of the shards that may hold terms starting with `prefix`.
    pub fn shard_keys_for_prefix(&self, field: &str, prefix: &str) -> Result<Vec<String>> {
        if let Some(key) = fixed_key(prefix) {
            return Ok(vec![key]);
        }
        Ok(self
            .shard_keys(field)?
            .into_iter()
            .filter(|key| key_may_contain(key, prefix))
            .collect())
    }
}

fn collect_keys(dir: &Path, keys: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_keys(&path, keys)?;
        } else if path.extension().is_some_and(|ext| ext == MASTER_EXT) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::format::encode_shard;
    use crate::storage::writer::ShardWriter;
    use tempfile::TempDir;

    fn store_with(entries: &[(&str, &str, Vec<u32>)]) -> (TempDir, PostingsStore) {
        let dir = TempDir::new().unwrap();
        let layout = ArchiveLayout::new(dir.path());
        let writer = ShardWriter::new(layout.clone());

        let mut by_key: std::collections::BTreeMap<(String, String), Vec<(String, Postings)>> =
            Default::default();
        for (field, term, uids) in entries {
            by_key
                .entry((field.to_string(), shard_key(term)))
                .or_default()
                .push((term.to_string(), Postings::from_uids(uids.clone())));
        }
        for ((field, key), mut list) in by_key {
            list.sort_by(|a, b| a.0.cmp(&b.0));
            writer
                .write(&field, &key, &encode_shard(&list, false).unwrap())
                .unwrap();
        }
        let store = PostingsStore::open(layout).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_requires_postings_dir() {
        let dir = TempDir::new().unwrap();
        let err = PostingsStore::open(ArchiveLayout::new(dir.path())).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_exact_and_numeric_lookup() {
        let (_dir, store) = store_with(&[
            ("TIAB", "tn3", vec![2539356]),
            ("YEAR", "00002020", vec![1, 4]),
        ]);
        assert_eq!(store.lookup_uids("TIAB", "tn3"), vec![2539356]);
        assert_eq!(store.lookup_uids("YEAR", "2020"), vec![1, 4]);
        assert!(store.lookup_uids("TIAB", "absent").is_empty());
        assert!(store.lookup_uids("NOFIELD", "tn3").is_empty());
    }

    #[test]
    fn test_wildcard_spans_shards() {
        let (_dir, store) = store_with(&[
            ("TIAB", "transfer", vec![1, 2]),
            ("TIAB", "transposition", vec![2, 7]),
            ("TIAB", "tn3", vec![5]),
            ("TIAB", "alpha", vec![9]),
        ]);
        assert_eq!(store.lookup_uids("TIAB", "trans*"), vec![1, 2, 7]);
        assert_eq!(store.lookup_uids("TIAB", "t*"), vec![1, 2, 5, 7]);
        assert_eq!(store.lookup_uids("TIAB", "*tion"), vec![2, 7]);
    }

    #[test]
    fn test_term_counts_and_terms() {
        let (_dir, store) = store_with(&[
            ("TIAB", "transfer", vec![1, 2]),
            ("TIAB", "transposition", vec![2, 7, 8]),
        ]);
        assert_eq!(
            store.term_counts("TIAB", "trans*"),
            vec![("transfer".to_string(), 2), ("transposition".to_string(), 3)]
        );
        assert_eq!(
            store.term_counts("TIAB", "transfer"),
            vec![("transfer".to_string(), 2)]
        );
        assert_eq!(store.terms("TIAB", "transp"), vec!["transposition"]);
        assert_eq!(store.shard_keys("TIAB").unwrap(), vec!["tra"]);
    }

    #[test]
    fn test_damaged_shard_is_absorbed() {
        let (dir, store) = store_with(&[("TIAB", "tn3", vec![1])]);
        let path = ArchiveLayout::new(dir.path()).shard_file("TIAB", "tn", MASTER_EXT);
        fs::write(path, b"garbage").unwrap();
        assert!(store.lookup_uids("TIAB", "tn3").is_empty());
        assert!(store.try_lookup("TIAB", "tn3").is_err());
    }

    #[test]
    fn test_wildcard_regex() {
        let regex = wildcard_regex("smith j*").unwrap();
        assert!(regex.is_match("smith j"));
        assert!(regex.is_match("smith jr"));
        assert!(!regex.is_match("smithson j"));
        assert_eq!(literal_prefix("c01.252*"), "c01.252");
        assert!(wildcard_regex("c01.252*").unwrap().is_match("c01.252.400"));
        assert!(!wildcard_regex("c01.2*").unwrap().is_match("c01x2"));
    }
}
