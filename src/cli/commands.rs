//! Command implementations for the bibdex CLI.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::ArchiveConfig;
use crate::error::Result;
use crate::index::{IndexBuilder, Inverter};
use crate::link::{read_uids, LinkResolver};
use crate::query::SearchEngine;
use crate::storage::PostingsStore;

/// Execute a CLI command.
pub fn execute_command(args: BibdexArgs) -> Result<()> {
    let config = archive_config(&args)?;
    match &args.command {
        Command::Index(index_args) => build_index(index_args, config, &args),
        Command::Invert => invert_index(config, &args),
        Command::Search(search_args) => search(search_args, &config, &args),
        Command::Count(count_args) => count(count_args, &config, &args, false),
        Command::Counts(count_args) => count(count_args, &config, &args, true),
        Command::Terms(terms_args) => list_terms(terms_args, &config, &args),
        Command::Link(link_args) => link(link_args, &config, &args),
    }
}

/// Archive configuration from `--archive` (or its environment variable)
/// and the global flags.
fn archive_config(args: &BibdexArgs) -> Result<ArchiveConfig> {
    let mut config = match &args.archive {
        Some(root) => ArchiveConfig::new(root),
        None => ArchiveConfig::from_env()?,
    };
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    Ok(config)
}

/// Open a path for line reading; `-` means standard input.
fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead + Send>> {
    match path {
        Some(path) if path != Path::new("-") => Ok(Box::new(BufReader::new(File::open(path)?))),
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn build_index(index_args: &IndexArgs, mut config: ArchiveConfig, args: &BibdexArgs) -> Result<()> {
    if let Some(batch_size) = index_args.batch_size {
        config = config.with_batch_size(batch_size);
    }
    if index_args.no_transliterate {
        config = config.with_transliteration(false);
    }
    if let Some(path) = &index_args.stop_words {
        config = config.with_stop_words(path);
    }

    let start = Instant::now();
    let builder = IndexBuilder::new(config)?;
    let stats = match &index_args.input {
        Some(dir) if dir.is_dir() => builder.build_from_dir(dir)?,
        input => builder.build_from_reader(open_input(input.as_deref())?)?,
    };
    log::info!("indexing took {:?}", start.elapsed());
    if stats.malformed > 0 {
        log::warn!("{} malformed documents were skipped", stats.malformed);
    }
    output_stats("Indexing finished", &stats, args)
}

fn invert_index(config: ArchiveConfig, args: &BibdexArgs) -> Result<()> {
    let start = Instant::now();
    let stats = Inverter::new(config)?.run()?;
    log::info!("inversion took {:?}", start.elapsed());
    output_stats("Inversion finished", &stats, args)
}

fn search(search_args: &SearchArgs, config: &ArchiveConfig, args: &BibdexArgs) -> Result<()> {
    let engine = SearchEngine::open(config)?;
    let uids = match &search_args.pipe {
        Some(path) => {
            let pipe = read_uids(open_input(Some(path))?)?;
            engine.search_with_pipe(&search_args.query, &pipe)?
        }
        None => engine.search(&search_args.query)?,
    };
    log::info!("{} matches for {:?}", uids.len(), search_args.query);

    if search_args.total {
        output_total(uids.len(), args)
    } else {
        output_uids(&uids, args)
    }
}

fn count(count_args: &CountArgs, config: &ArchiveConfig, args: &BibdexArgs, expand: bool) -> Result<()> {
    let engine = SearchEngine::open(config)?;
    let counts = if expand {
        engine.counts(&count_args.query)?
    } else {
        engine.count(&count_args.query)?
    };
    output_counts(&counts, &engine.schema().default_field().name, args)
}

fn list_terms(terms_args: &TermsArgs, config: &ArchiveConfig, args: &BibdexArgs) -> Result<()> {
    let engine = SearchEngine::open(config)?;
    let terms = engine.terms(&terms_args.field, &terms_args.prefix)?;
    output_terms(&terms, args)
}

fn link(link_args: &LinkArgs, config: &ArchiveConfig, args: &BibdexArgs) -> Result<()> {
    config.verify_root()?;
    let uids = read_uids(open_input(link_args.input.as_deref())?)?;
    let store = PostingsStore::open(config.layout())?;
    let linked = LinkResolver::new(store, config.pipeline())
        .with_field(&link_args.field)
        .resolve(&uids)?;
    log::info!("{} identifiers link to {} documents", uids.len(), linked.len());
    output_uids(&linked, args)
}
