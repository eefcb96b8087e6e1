//! Inversion: forward-index bundles to per-shard postings.
//!
//! Bundles are read in parallel and every (field, term, position, uid)
//! record is routed to one of [`BUCKET_COUNT`] maps chosen by the term's
//! first character, each map behind its own lock. Once all bundles are in,
//! buckets are drained in parallel into one [`InvertedRecord`] per distinct
//! term, records are regrouped by (field, shard key), and the shards are
//! encoded on the worker pool and written sequentially in key order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use ahash::AHashMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ArchiveConfig;
use crate::error::Result;
use crate::index::forward::{bundle_paths, ForwardBundle};
use crate::storage::format::{encode_shard, ShardBytes};
use crate::storage::lock::ArchiveLock;
use crate::storage::postings::Postings;
use crate::storage::shard::shard_key;
use crate::storage::writer::ShardWriter;

/// Number of term buckets.
pub const BUCKET_COUNT: usize = 64;

/// Counters for one inversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvertStats {
    pub bundles: usize,
    pub terms: usize,
    pub shards_written: usize,
    pub shards_skipped: usize,
    pub shards_empty: usize,
}

/// Postings of one term within one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPostings {
    pub field: String,
    pub postings: Postings,
}

/// Everything known about one term across fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvertedRecord {
    pub term: String,
    pub fields: Vec<FieldPostings>,
}

/// Per-field accumulation: uid to positions, plus whether positions exist.
#[derive(Debug, Default)]
struct FieldAccumulator {
    positional: bool,
    uids: BTreeMap<u32, BTreeSet<u16>>,
}

type Bucket = AHashMap<String, BTreeMap<String, FieldAccumulator>>;

fn bucket_of(term: &str) -> usize {
    term.chars().next().map_or(0, |c| c as usize % BUCKET_COUNT)
}

/// A shard waiting to be encoded.
struct ShardJob {
    field: String,
    key: String,
    positional: bool,
    entries: Vec<(String, Postings)>,
}

/// Inverts an archive's forward bundles.
#[derive(Debug, Clone)]
pub struct Inverter {
    config: ArchiveConfig,
}

impl Inverter {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        config.verify_root()?;
        Ok(Inverter { config })
    }

    fn fill_buckets(&self, paths: &[PathBuf], buckets: &[Mutex<Bucket>]) -> Result<()> {
        paths.par_iter().try_for_each(|path| -> Result<()> {
            let bundle = ForwardBundle::read(path)?;
            log::debug!(
                "routing {} ({} records)",
                path.display(),
                bundle.record_count()
            );
            for document in &bundle.documents {
                for field in &document.fields {
                    for term in &field.terms {
                        let mut bucket = buckets[bucket_of(&term.term)].lock();
                        let accumulator = bucket
                            .entry(term.term.clone())
                            .or_default()
                            .entry(field.name.clone())
                            .or_default();
                        let positions = accumulator.uids.entry(document.uid).or_default();
                        if let Some(position) = term.position {
                            accumulator.positional = true;
                            positions.insert(position);
                        }
                    }
                }
            }
            Ok(())
        })
    }

    fn drain(bucket: Bucket) -> Vec<InvertedRecord> {
        let mut records: Vec<InvertedRecord> = bucket
            .into_iter()
            .map(|(term, fields)| InvertedRecord {
                term,
                fields: fields
                    .into_iter()
                    .map(|(field, accumulator)| {
                        let uids: Vec<u32> = accumulator.uids.keys().copied().collect();
                        let postings = if accumulator.positional {
                            let positions = accumulator
                                .uids
                                .into_values()
                                .map(|set| set.into_iter().collect())
                                .collect();
                            Postings::with_positions(uids, positions)
                        } else {
                            Postings::from_uids(uids)
                        };
                        FieldPostings { field, postings }
                    })
                    .collect(),
            })
            .collect();
        records.sort_by(|a, b| a.term.cmp(&b.term));
        records
    }

    /// Invert every bundle and write the shards that do not exist yet.
    pub fn run(&self) -> Result<InvertStats> {
        let layout = self.config.layout();
        let _lock = ArchiveLock::acquire(layout.lock_path())?;
        let paths = bundle_paths(&layout)?;
        let mut stats = InvertStats {
            bundles: paths.len(),
            ..Default::default()
        };
        if paths.is_empty() {
            log::warn!("no forward bundles under {}", layout.forward_dir().display());
            return Ok(stats);
        }

        let buckets: Vec<Mutex<Bucket>> =
            (0..BUCKET_COUNT).map(|_| Mutex::new(Bucket::default())).collect();
        self.fill_buckets(&paths, &buckets)?;

        let mut records: Vec<InvertedRecord> = buckets
            .into_par_iter()
            .flat_map_iter(|bucket| Self::drain(bucket.into_inner()))
            .collect();
        records.par_sort_unstable_by(|a, b| a.term.cmp(&b.term));
        stats.terms = records.len();
        log::info!("inverted {} terms from {} bundles", records.len(), paths.len());

        let mut shards: BTreeMap<(String, String), ShardJob> = BTreeMap::new();
        for record in records {
            let key = shard_key(&record.term);
            for FieldPostings { field, postings } in record.fields {
                let job = shards
                    .entry((field.clone(), key.clone()))
                    .or_insert_with(|| ShardJob {
                        field,
                        key: key.clone(),
                        positional: postings.has_positions(),
                        entries: Vec::new(),
                    });
                job.entries.push((record.term.clone(), postings));
            }
        }

        let writer = ShardWriter::new(layout);
        let pending: Vec<ShardJob> = shards
            .into_values()
            .filter(|job| {
                if writer.exists(&job.field, &job.key) {
                    stats.shards_skipped += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        self.config.pipeline().ordered_map(
            pending,
            |job| {
                let empty = job.entries.iter().all(|(_, p)| p.is_empty());
                let encoded = if empty {
                    Ok(ShardBytes::default())
                } else {
                    encode_shard(&job.entries, job.positional)
                };
                (job.field, job.key, empty, encoded)
            },
            |(field, key, empty, encoded)| {
                if empty {
                    log::warn!("shard {field}/{key} has no postings, not writing it");
                    stats.shards_empty += 1;
                    return Ok(());
                }
                if writer.write(&field, &key, &encoded?)? {
                    stats.shards_written += 1;
                } else {
                    stats.shards_skipped += 1;
                }
                Ok(())
            },
        )?;

        log::info!(
            "wrote {} shards ({} skipped, {} empty)",
            stats.shards_written,
            stats.shards_skipped,
            stats.shards_empty
        );
        Ok(stats)
    }
}
