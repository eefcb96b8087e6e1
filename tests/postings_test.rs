//! Ordering of postings read back from a multi-shard archive.

mod common;

use std::fs;

use bibdex::index::SourceDocument;
use bibdex::prelude::*;
use bibdex::storage::{Postings, PostingsStore};
use tempfile::TempDir;

/// Titles whose `t` words spread over several shards, with repeated words
/// and documents matching several terms of one wildcard.
fn spread_archive() -> (TempDir, ArchiveConfig) {
    let dir = TempDir::new().unwrap();
    let config = ArchiveConfig::new(dir.path().join("archive")).with_workers(3);
    fs::create_dir_all(&config.root).unwrap();

    let first = vec![
        SourceDocument::new(30).with_field("TITL", "tn3 transposition transposition tn3"),
        SourceDocument::new(5)
            .with_field("TITL", "transposase transposition transfer transposition"),
    ];
    let second = vec![
        SourceDocument::new(12).with_field("TITL", "tree trial transfer tn3 tn5"),
        SourceDocument::new(7).with_field("TITL", "triple tn7 transfer"),
    ];
    let raw = dir.path().join("raw");
    common::write_batches(&raw, &[("b1", &first[..]), ("b2", &second[..])]);

    IndexBuilder::new(config.clone())
        .unwrap()
        .build_from_dir(&raw)
        .unwrap();
    Inverter::new(config.clone()).unwrap().run().unwrap();
    (dir, config)
}

fn assert_well_formed(postings: &Postings, what: &str) {
    assert!(postings.is_well_formed(), "{what}: {postings:?}");
}

#[test]
fn test_exact_lookups_are_strictly_increasing() -> Result<()> {
    let (_dir, config) = spread_archive();
    let store = PostingsStore::open(config.layout())?;
    assert!(store.shard_keys("TITL")?.len() >= 4);

    let transposition = store.lookup("TITL", "transposition");
    assert_well_formed(&transposition, "transposition");
    assert_eq!(transposition.uids, vec![5, 30]);
    assert_eq!(transposition.positions, Some(vec![vec![2, 4], vec![2, 3]]));

    for term in ["tn3", "transfer", "tree"] {
        for field in ["TITL", "TIAB"] {
            let postings = store.lookup(field, term);
            assert!(!postings.is_empty(), "{field}/{term}");
            assert!(postings.has_positions());
            assert_well_formed(&postings, term);
        }
    }
    Ok(())
}

#[test]
fn test_wildcard_unions_across_shards_are_strictly_increasing() -> Result<()> {
    let (_dir, config) = spread_archive();
    let store = PostingsStore::open(config.layout())?;

    for (pattern, uids) in [
        ("t*", vec![5, 7, 12, 30]),
        ("tr*", vec![5, 7, 12, 30]),
        ("tra*", vec![5, 7, 12, 30]),
        ("tn*", vec![7, 12, 30]),
        ("tri*", vec![7, 12]),
    ] {
        let postings = store.lookup("TITL", pattern);
        assert_well_formed(&postings, pattern);
        assert_eq!(postings.uids, uids, "{pattern}");
    }

    // Every word of document 5 starts with "tra"; their positions merge.
    let merged = store.lookup("TITL", "tra*");
    let five = merged.iter().find(|(uid, _)| *uid == 5).map(|(_, p)| p.to_vec());
    assert_eq!(five, Some(vec![1, 2, 3, 4]));
    Ok(())
}

#[test]
fn test_search_results_are_strictly_increasing() -> Result<()> {
    let (_dir, config) = spread_archive();
    let engine = SearchEngine::open(&config)?;

    for query in ["t*", "tn3 | tree | triple", "tr* ! tn3", "transfer ~3 tn3", "tn*[TIAB]"] {
        let uids = engine.search(query)?;
        assert!(!uids.is_empty(), "{query}");
        assert!(uids.windows(2).all(|w| w[0] < w[1]), "{query}: {uids:?}");
    }
    Ok(())
}
