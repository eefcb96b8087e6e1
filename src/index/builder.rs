//! Forward indexing: raw documents to forward-index bundles.
//!
//! Input arrives in batches, either one JSON-lines file per batch or a
//! single stream cut into `chunkNNNNNN` batches of `batch_size` documents.
//! A batch whose bundle already exists is skipped, so an interrupted build
//! can simply be run again. Within a batch, documents are analyzed on the
//! worker pool and reassembled in input order before the bundle is written.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analysis::FieldAnalyzer;
use crate::config::ArchiveConfig;
use crate::error::{BibdexError, Result};
use crate::index::document::{DocumentReader, SourceDocument};
use crate::index::forward::{ForwardBundle, ForwardDocument, ForwardField, ForwardTerm};
use crate::schema::{FieldDefinition, FieldSchema, Selection};
use crate::storage::lock::ArchiveLock;

/// Counters for one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub batches_written: usize,
    pub batches_skipped: usize,
    pub documents: usize,
    pub records: usize,
    pub malformed: usize,
}

/// Builds forward-index bundles for an archive.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    config: ArchiveConfig,
    schema: FieldSchema,
    analyzer: FieldAnalyzer,
}

impl IndexBuilder {
    /// Create a builder with the archive's schema and analyzer.
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        config.verify_root()?;
        let schema = config.schema()?;
        let analyzer = config.analyzer()?;
        Ok(IndexBuilder {
            config,
            schema,
            analyzer,
        })
    }

    pub fn with_schema(mut self, schema: FieldSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    fn field_values(field: &FieldDefinition, document: &SourceDocument) -> Vec<String> {
        let mut values: Vec<String> = field
            .source_names()
            .into_iter()
            .flat_map(|source| document.values(source))
            .collect();
        match field.select {
            Selection::All => {}
            Selection::First => values.truncate(1),
            Selection::Last => {
                let last = values.pop();
                values = last.into_iter().collect();
            }
        }
        values
    }

    /// Analyze one document against every schema field.
    pub fn analyze(&self, document: &SourceDocument) -> ForwardDocument {
        let fields = self
            .schema
            .fields()
            .iter()
            .filter_map(|field| {
                let values = Self::field_values(field, document);
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                let terms: Vec<ForwardTerm> = self
                    .analyzer
                    .analyze_values(field, &values)
                    .into_iter()
                    .map(|t| ForwardTerm {
                        term: t.term,
                        position: t.position,
                    })
                    .collect();
                (!terms.is_empty()).then(|| ForwardField {
                    name: field.name.clone(),
                    terms,
                })
            })
            .collect();
        ForwardDocument {
            uid: document.uid,
            fields,
        }
    }

    /// Analyze one batch on the worker pool and write its bundle.
    fn build_batch<I>(&self, batch: &str, documents: I, stats: &mut BuildStats) -> Result<()>
    where
        I: Iterator<Item = Result<SourceDocument>> + Send,
    {
        let mut bundle = ForwardBundle::new(batch);
        let mut malformed = 0;
        self.config.pipeline().ordered_map(
            documents,
            |document| document.map(|d| self.analyze(&d)),
            |analyzed| {
                match analyzed {
                    Ok(document) => bundle.documents.push(document),
                    Err(BibdexError::Io(e)) => return Err(BibdexError::Io(e)),
                    Err(e) => {
                        log::warn!("batch {batch}: skipping document: {e}");
                        malformed += 1;
                    }
                }
                Ok(())
            },
        )?;

        let path = bundle.write(&self.config.layout())?;
        stats.batches_written += 1;
        stats.documents += bundle.documents.len();
        stats.records += bundle.record_count();
        stats.malformed += malformed;
        log::info!(
            "wrote {} ({} documents, {} records)",
            path.display(),
            bundle.documents.len(),
            bundle.record_count()
        );
        Ok(())
    }

    fn batch_exists(&self, batch: &str, stats: &mut BuildStats) -> bool {
        let exists = self.config.layout().forward_path(batch).is_file();
        if exists {
            log::info!("batch {batch} already indexed, skipping");
            stats.batches_skipped += 1;
        }
        exists
    }

    /// Index every `*.jsonl` file of a directory, one batch per file named
    /// after the file stem.
    pub fn build_from_dir<P: AsRef<Path>>(&self, dir: P) -> Result<BuildStats> {
        let dir = dir.as_ref();
        let _lock = ArchiveLock::acquire(self.config.layout().lock_path())?;

        let mut inputs: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| BibdexError::config(format!("cannot read {}: {e}", dir.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "jsonl"))
            .collect();
        inputs.sort();

        let mut stats = BuildStats::default();
        for input in inputs {
            let Some(batch) = input.file_stem().and_then(|s| s.to_str()) else {
                log::warn!("skipping {}: file name is not UTF-8", input.display());
                continue;
            };
            if self.batch_exists(batch, &mut stats) {
                continue;
            }
            let reader = DocumentReader::new(BufReader::new(File::open(&input)?));
            self.build_batch(batch, reader, &mut stats)?;
        }
        Ok(stats)
    }

    /// Index a JSON-lines stream in batches of `batch_size` documents named
    /// `chunk000001`, `chunk000002`, ...
    pub fn build_from_reader<R: BufRead + Send>(&self, reader: R) -> Result<BuildStats> {
        let _lock = ArchiveLock::acquire(self.config.layout().lock_path())?;
        let mut documents = DocumentReader::new(reader).peekable();
        let batch_size = self.config.batch_size.max(1);

        let mut stats = BuildStats::default();
        let mut seq = 0;
        while documents.peek().is_some() {
            seq += 1;
            let batch = format!("chunk{seq:06}");
            let chunk: Vec<_> = documents.by_ref().take(batch_size).collect();
            if self.batch_exists(&batch, &mut stats) {
                continue;
            }
            self.build_batch(&batch, chunk.into_iter(), &mut stats)?;
        }
        Ok(stats)
    }
}
