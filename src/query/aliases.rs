//! Lookup tables for controlled vocabularies.
//!
//! Loaded once from the archive's `Data` directory and shared read-only by
//! every query:
//!
//! - `mesh.txt`: `name<TAB>code<TAB>tree1,tree2,...`
//! - `journals.txt`: `alias<TAB>canonical`
//! - `pubtypes.txt`: `alias<TAB>canonical`
//!
//! Keys and values are normalized like indexed terms. Blank lines and lines
//! starting with `#` are ignored; a missing file is an empty table.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use ahash::AHashMap;

use crate::analysis::analyzer::normalize_term;
use crate::error::Result;

/// A MeSH heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshEntry {
    pub code: String,
    pub trees: Vec<String>,
}

/// Immutable alias tables.
#[derive(Debug, Clone, Default)]
pub struct AliasTables {
    mesh: AHashMap<String, MeshEntry>,
    journals: AHashMap<String, String>,
    pubtypes: AHashMap<String, String>,
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("{} not found, table is empty", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

fn pairs(path: &Path) -> Result<AHashMap<String, String>> {
    let mut table = AHashMap::new();
    for line in read_lines(path)? {
        match line.split_once('\t') {
            Some((alias, canonical)) => {
                table.insert(normalize_term(alias), normalize_term(canonical));
            }
            None => log::warn!("{}: ignoring line without a tab: {line}", path.display()),
        }
    }
    Ok(table)
}

impl AliasTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every table from a data directory.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut tables = AliasTables::new();

        for line in read_lines(&dir.join("mesh.txt"))? {
            let mut columns = line.split('\t');
            match (columns.next(), columns.next()) {
                (Some(name), Some(code)) => {
                    let trees = columns
                        .next()
                        .unwrap_or_default()
                        .split(',')
                        .map(normalize_term)
                        .filter(|t| !t.is_empty())
                        .collect();
                    tables.mesh.insert(
                        normalize_term(name),
                        MeshEntry {
                            code: normalize_term(code),
                            trees,
                        },
                    );
                }
                _ => log::warn!("mesh.txt: ignoring malformed line: {line}"),
            }
        }
        tables.journals = pairs(&dir.join("journals.txt"))?;
        tables.pubtypes = pairs(&dir.join("pubtypes.txt"))?;

        log::info!(
            "loaded {} MeSH headings, {} journal and {} publication type aliases",
            tables.mesh.len(),
            tables.journals.len(),
            tables.pubtypes.len()
        );
        Ok(tables)
    }

    pub fn with_mesh(mut self, name: &str, code: &str, trees: &[&str]) -> Self {
        self.mesh.insert(
            normalize_term(name),
            MeshEntry {
                code: normalize_term(code),
                trees: trees.iter().map(|t| normalize_term(t)).collect(),
            },
        );
        self
    }

    pub fn with_journal(mut self, alias: &str, canonical: &str) -> Self {
        self.journals
            .insert(normalize_term(alias), normalize_term(canonical));
        self
    }

    pub fn with_pubtype(mut self, alias: &str, canonical: &str) -> Self {
        self.pubtypes
            .insert(normalize_term(alias), normalize_term(canonical));
        self
    }

    /// A MeSH heading by normalized name.
    pub fn mesh(&self, name: &str) -> Option<&MeshEntry> {
        self.mesh.get(name)
    }

    /// Canonical journal name, or the input when it has no alias.
    pub fn journal<'a>(&'a self, name: &'a str) -> &'a str {
        self.journals.get(name).map_or(name, String::as_str)
    }

    /// Canonical publication type, or the input when it has no alias.
    pub fn pubtype<'a>(&'a self, name: &'a str) -> &'a str {
        self.pubtypes.get(name).map_or(name, String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_tables() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("mesh.txt"),
            "# name\tcode\ttrees\nNeoplasms\tD009369\tC04\nDNA Transposable Elements\tD004251\tG05.275.180,G05.360\nbroken\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("journals.txt"),
            "Nature Genetics\tNat Genet\n",
        )
        .unwrap();

        let tables = AliasTables::load(dir.path()).unwrap();
        let entry = tables.mesh("dna transposable elements").unwrap();
        assert_eq!(entry.code, "d004251");
        assert_eq!(entry.trees, vec!["g05.275.180", "g05.360"]);
        assert!(tables.mesh("broken").is_none());
        assert_eq!(tables.journal("nature genetics"), "nat genet");
        assert_eq!(tables.journal("cell"), "cell");
        assert_eq!(tables.pubtype("review"), "review");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let tables = AliasTables::load(dir.path().join("Data")).unwrap();
        assert!(tables.mesh("neoplasms").is_none());
    }
}
