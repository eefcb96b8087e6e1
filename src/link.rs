//! Batch cross-reference resolution.
//!
//! Given a stream of identifiers, [`LinkResolver`] collects every document
//! that links to any of them through a numeric link field (`CITES` by
//! default: the documents citing the input). Identifiers are stored in the
//! link field as padded numeric terms, so consecutive identifiers usually
//! share a shard; each run of identifiers with the same shard key costs one
//! shard load, and every identifier one binary search in it.

use std::collections::BTreeSet;
use std::io::{BufRead, Write};

use parking_lot::Mutex;

use crate::analysis::analyzer::pad_numeric;
use crate::error::Result;
use crate::pipeline::PipelineConfig;
use crate::storage::shard::uid_key;
use crate::storage::PostingsStore;

/// Link field used when none is given.
pub const DEFAULT_LINK_FIELD: &str = "CITES";

/// Identifiers sharing one shard key.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ShardGroup {
    key: String,
    uids: Vec<u32>,
}

/// Split identifiers into runs of consecutive identifiers with the same key.
fn group_by_key(uids: &[u32]) -> Vec<ShardGroup> {
    let mut groups: Vec<ShardGroup> = Vec::new();
    for &uid in uids {
        let key = uid_key(uid);
        match groups.last_mut() {
            Some(group) if group.key == key => group.uids.push(uid),
            _ => groups.push(ShardGroup {
                key,
                uids: vec![uid],
            }),
        }
    }
    groups
}

/// Resolves identifiers to the documents linking to them.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    store: PostingsStore,
    field: String,
    pipeline: PipelineConfig,
}

impl LinkResolver {
    pub fn new(store: PostingsStore, pipeline: PipelineConfig) -> Self {
        LinkResolver {
            store,
            field: DEFAULT_LINK_FIELD.to_string(),
            pipeline,
        }
    }

    /// Resolve through another link field, such as `CITED`.
    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = field.into().to_ascii_uppercase();
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Every identifier linked from any of `uids`, sorted and deduplicated.
    ///
    /// Shards that cannot be read are logged and contribute nothing.
    pub fn resolve(&self, uids: &[u32]) -> Result<Vec<u32>> {
        let groups = group_by_key(uids);
        log::debug!(
            "resolving {} identifiers in {} shard groups of {}",
            uids.len(),
            groups.len(),
            self.field
        );

        let linked = Mutex::new(BTreeSet::new());
        self.pipeline.ordered_map(
            groups,
            |group| self.resolve_group(&group, &linked),
            |outcome| {
                if let Err(e) = outcome {
                    log::warn!("link lookup in {} failed: {e}", self.field);
                }
                Ok(())
            },
        )?;
        Ok(linked.into_inner().into_iter().collect())
    }

    fn resolve_group(&self, group: &ShardGroup, linked: &Mutex<BTreeSet<u32>>) -> Result<()> {
        let Some(shard) = self.store.shard(&self.field, &group.key)? else {
            log::trace!("no {} shard {}", self.field, group.key);
            return Ok(());
        };
        for uid in &group.uids {
            if let Some(i) = shard.find(&pad_numeric(&uid.to_string())) {
                let postings = shard.postings(i)?;
                linked.lock().extend(postings.uids);
            }
        }
        Ok(())
    }
}

/// Read one identifier per line. Blank lines are skipped; anything that is
/// not an identifier is logged and skipped.
pub fn read_uids<R: BufRead>(reader: R) -> Result<Vec<u32>> {
    let mut uids = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse() {
            Ok(uid) => uids.push(uid),
            Err(_) => log::warn!("line {}: '{line}' is not an identifier", n + 1),
        }
    }
    Ok(uids)
}

/// Write identifiers one per line.
pub fn write_uids<W: Write>(mut writer: W, uids: &[u32]) -> Result<()> {
    for uid in uids {
        writeln!(writer, "{uid}")?;
    }
    writer.flush()?;
    Ok(())
}
