//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use bibdex::prelude::*;
use bibdex::index::SourceDocument;
use tempfile::TempDir;

/// A small citation archive with titles, years, authors and citation links.
pub fn documents() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new(2539356)
            .with_field(
                "TITL",
                "Nucleotide sequences required for Tn3 transposition immunity",
            )
            .with_field("YEAR", "1988")
            .with_field("JOUR", "J Bacteriol")
            .with_values("AUTH", &["Kans JA", "Casadaban MJ"])
            .with_values("CITES", &["1001", "1002"]),
        SourceDocument::new(1001)
            .with_field("TITL", "Transposition immunity of Tn3")
            .with_field("ABST", "Immunity depends on the terminal inverted repeats.")
            .with_field("YEAR", "2020")
            .with_values("AUTH", &["Lee K"]),
        SourceDocument::new(1002)
            .with_field("TITL", "Resolvase and the Tn3 resolution site")
            .with_field("YEAR", "2021")
            .with_field("DOI", "10.1016/S0140-6736(20)30183-5")
            .with_values("AUTH", &["Smith J", "Kans JA"])
            .with_values("CITES", &["1001"]),
        SourceDocument::new(1003)
            .with_field("TITL", "Insertion sequences in Escherichia coli")
            .with_field("YEAR", "2022")
            .with_values("AUTH", &["Smith JK"])
            .with_values("CITES", &["1001", "2539356"]),
    ]
}

/// Write documents as one JSON-lines batch file per entry of `batches`.
pub fn write_batches(dir: &Path, batches: &[(&str, &[SourceDocument])]) {
    fs::create_dir_all(dir).unwrap();
    for (name, documents) in batches {
        let lines: Vec<String> = documents
            .iter()
            .map(|d| serde_json::to_string(d).unwrap())
            .collect();
        fs::write(dir.join(format!("{name}.jsonl")), lines.join("\n") + "\n").unwrap();
    }
}

/// Index and invert the fixture documents into a fresh archive.
pub fn build_archive() -> (TempDir, ArchiveConfig) {
    let dir = TempDir::new().unwrap();
    let config = ArchiveConfig::new(dir.path().join("archive")).with_workers(3);
    fs::create_dir_all(&config.root).unwrap();

    let all = documents();
    let raw = dir.path().join("raw");
    write_batches(&raw, &[("b1", &all[..2]), ("b2", &all[2..])]);

    IndexBuilder::new(config.clone())
        .unwrap()
        .build_from_dir(&raw)
        .unwrap();
    Inverter::new(config.clone()).unwrap().run().unwrap();
    (dir, config)
}
