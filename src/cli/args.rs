//! Command line argument parsing for the bibdex CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::ARCHIVE_ENV;
use crate::link::DEFAULT_LINK_FIELD;

/// bibdex - offline full-text search over bibliographic archives
#[derive(Parser, Debug, Clone)]
#[command(name = "bibdex")]
#[command(about = "Offline, sharded full-text search for bibliographic archives")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct BibdexArgs {
    /// Archive root directory
    #[arg(short, long, env = ARCHIVE_ENV, value_name = "DIR", global = true)]
    pub archive: Option<PathBuf>,

    /// Worker threads per pipeline stage (default: one per CPU)
    #[arg(short = 'j', long, global = true)]
    pub workers: Option<usize>,

    /// Verbosity level (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "text", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl BibdexArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n + 1,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build forward-index bundles from JSON-lines documents
    Index(IndexArgs),

    /// Invert forward-index bundles into sharded postings
    Invert,

    /// Print the identifiers matching a query
    Search(SearchArgs),

    /// Print a document count per queried term, wildcards summed
    Count(CountArgs),

    /// Print a document count per queried term, wildcards expanded
    Counts(CountArgs),

    /// List stored terms of a field
    Terms(TermsArgs),

    /// Print the documents linking to identifiers read from input
    Link(LinkArgs),
}

/// Arguments for indexing
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    /// Directory of `*.jsonl` files, one batch per file; standard input when omitted
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Documents per batch when reading standard input
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Disable transliteration of accented and Greek letters
    #[arg(long)]
    pub no_transliterate: bool,

    /// Stop-word file replacing the built-in list
    #[arg(long, value_name = "FILE")]
    pub stop_words: Option<PathBuf>,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// File of identifiers bound to `[PIPE]`, `-` for standard input
    #[arg(short, long, value_name = "FILE")]
    pub pipe: Option<PathBuf>,

    /// Print only the number of matches
    #[arg(short, long)]
    pub total: bool,
}

/// Arguments for counting
#[derive(Parser, Debug, Clone)]
pub struct CountArgs {
    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,
}

/// Arguments for listing terms
#[derive(Parser, Debug, Clone)]
pub struct TermsArgs {
    /// Field name
    #[arg(value_name = "FIELD")]
    pub field: String,

    /// Only terms starting with this prefix
    #[arg(value_name = "PREFIX", default_value = "")]
    pub prefix: String,
}

/// Arguments for link resolution
#[derive(Parser, Debug, Clone)]
pub struct LinkArgs {
    /// Link field to resolve through
    #[arg(long, default_value = DEFAULT_LINK_FIELD)]
    pub field: String,

    /// File of identifiers, one per line; standard input when omitted
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain lines: identifiers, or `count<TAB>term`
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args() {
        let args = BibdexArgs::try_parse_from([
            "bibdex",
            "--archive",
            "/data/archive",
            "search",
            "tn3 & 1988[YEAR]",
            "--pipe",
            "-",
        ])
        .unwrap();
        assert_eq!(args.archive, Some(PathBuf::from("/data/archive")));
        match args.command {
            Command::Search(search) => {
                assert_eq!(search.query, "tn3 & 1988[YEAR]");
                assert_eq!(search.pipe, Some(PathBuf::from("-")));
                assert!(!search.total);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = BibdexArgs::try_parse_from([
            "bibdex", "invert", "-a", "/x", "-vv", "-j", "3", "-f", "json",
        ])
        .unwrap();
        assert_eq!(args.workers, Some(3));
        assert_eq!(args.verbosity(), 3);
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(matches!(args.command, Command::Invert));
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = BibdexArgs::try_parse_from(["bibdex", "-q", "-v", "invert"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_link_and_terms_defaults() {
        let args = BibdexArgs::try_parse_from(["bibdex", "link"]).unwrap();
        match args.command {
            Command::Link(link) => {
                assert_eq!(link.field, "CITES");
                assert!(link.input.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }

        let args = BibdexArgs::try_parse_from(["bibdex", "terms", "JOUR"]).unwrap();
        match args.command {
            Command::Terms(terms) => assert_eq!(terms.prefix, ""),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
