//! Cross-reference resolution through citation links.

mod common;

use std::io::Cursor;

use bibdex::link::read_uids;
use bibdex::prelude::*;
use bibdex::storage::PostingsStore;

#[test]
fn test_citing_documents() -> Result<()> {
    let (_dir, config) = common::build_archive();
    let store = PostingsStore::open(config.layout())?;
    let resolver = LinkResolver::new(store, config.pipeline());

    // 1001 is cited by 2539356, 1002 and 1003; 2539356 by 1003.
    let uids = read_uids(Cursor::new("1001\n2539356\n1001\n424242\n"))?;
    assert_eq!(resolver.resolve(&uids)?, vec![1002, 1003, 2539356]);
    assert_eq!(resolver.resolve(&[1002])?, vec![2539356]);
    assert!(resolver.resolve(&[])?.is_empty());
    Ok(())
}

#[test]
fn test_resolution_matches_field_queries() -> Result<()> {
    let (_dir, config) = common::build_archive();
    let engine = SearchEngine::open(&config)?;
    let resolver = LinkResolver::new(engine.store().clone(), config.pipeline());

    let via_query = engine.search("1001[CITES] | 1002[CITES]")?;
    assert_eq!(resolver.resolve(&[1001, 1002])?, via_query);
    Ok(())
}

#[test]
fn test_unindexed_link_field_yields_nothing() -> Result<()> {
    let (_dir, config) = common::build_archive();
    let store = PostingsStore::open(config.layout())?;
    let resolver = LinkResolver::new(store, config.pipeline()).with_field("cited");
    assert_eq!(resolver.field(), "CITED");
    assert!(resolver.resolve(&[1001, 2539356])?.is_empty());
    Ok(())
}
