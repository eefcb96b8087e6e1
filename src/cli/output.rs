//! Output formatting for CLI commands.
//!
//! Result lists go to standard output in a pipeable form; run summaries of
//! `index` and `invert` are printed as `key: value` lines unless quiet.

use std::io::{self, Write};

use serde::Serialize;

use crate::cli::args::{BibdexArgs, OutputFormat};
use crate::error::Result;
use crate::link::write_uids;
use crate::query::TermCount;

fn output_json<T: Serialize + ?Sized>(value: &T, args: &BibdexArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut out = io::stdout().lock();
    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(())
}

/// Identifiers, one per line.
pub fn output_uids(uids: &[u32], args: &BibdexArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Text => write_uids(io::stdout().lock(), uids),
        OutputFormat::Json => output_json(uids, args),
    }
}

/// A single number.
pub fn output_total(total: usize, args: &BibdexArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Text => {
            println!("{total}");
            Ok(())
        }
        OutputFormat::Json => output_json(&serde_json::json!({ "total": total }), args),
    }
}

/// `count<TAB>term` lines; the field is shown when it is not the default.
pub fn output_counts(counts: &[TermCount], default_field: &str, args: &BibdexArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Text => {
            let mut out = io::stdout().lock();
            for count in counts {
                if count.field == default_field {
                    writeln!(out, "{}\t{}", count.count, count.term)?;
                } else {
                    writeln!(out, "{}\t{}[{}]", count.count, count.term, count.field)?;
                }
            }
            out.flush()?;
            Ok(())
        }
        OutputFormat::Json => output_json(counts, args),
    }
}

/// Terms, one per line.
pub fn output_terms(terms: &[String], args: &BibdexArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Text => {
            let mut out = io::stdout().lock();
            for term in terms {
                writeln!(out, "{term}")?;
            }
            out.flush()?;
            Ok(())
        }
        OutputFormat::Json => output_json(terms, args),
    }
}

/// A run summary.
pub fn output_stats<T: Serialize>(message: &str, stats: &T, args: &BibdexArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(stats, args),
        OutputFormat::Text => {
            if args.verbosity() == 0 {
                return Ok(());
            }
            println!("{message}");
            if let serde_json::Value::Object(map) = serde_json::to_value(stats)? {
                for (key, value) in map {
                    println!("  {key}: {value}");
                }
            }
            Ok(())
        }
    }
}
