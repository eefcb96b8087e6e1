//! Query evaluation against an archive's postings.

use std::sync::Arc;

use rayon::prelude::*;

use crate::analysis::analyzer::unpad_numeric;
use crate::analysis::{FieldAnalyzer, PhraseToken};
use crate::config::ArchiveConfig;
use crate::error::Result;
use crate::query::aliases::AliasTables;
use crate::query::parser::{Expr, QueryParser};
use crate::query::setops::{difference, intersect, near_join, phrase_join, union};
use crate::schema::{FieldKind, FieldSchema};
use crate::storage::{Postings, PostingsStore};

/// Positional matches plus the offset of the last word from each match.
#[derive(Debug, Clone, Default)]
struct PositionalMatch {
    postings: Postings,
    span: u32,
}

/// Searches one archive.
///
/// The engine owns everything a query needs and is shared read-only; any
/// number of threads may search through the same instance.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    store: PostingsStore,
    schema: FieldSchema,
    analyzer: FieldAnalyzer,
    aliases: Arc<AliasTables>,
}

impl SearchEngine {
    /// Open the archive described by `config`, loading its schema and alias tables.
    pub fn open(config: &ArchiveConfig) -> Result<Self> {
        config.verify_root()?;
        let layout = config.layout();
        let aliases = AliasTables::load(layout.data_dir())?;
        Ok(SearchEngine::new(
            PostingsStore::open(layout)?,
            config.schema()?,
            config.analyzer()?,
            Arc::new(aliases),
        ))
    }

    pub fn new(
        store: PostingsStore,
        schema: FieldSchema,
        analyzer: FieldAnalyzer,
        aliases: Arc<AliasTables>,
    ) -> Self {
        SearchEngine {
            store,
            schema,
            analyzer,
            aliases,
        }
    }

    pub fn store(&self) -> &PostingsStore {
        &self.store
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// A parser bound to this engine's schema, analyzer and alias tables.
    pub fn parser(&self) -> QueryParser<'_> {
        QueryParser::new(&self.schema, &self.analyzer, &self.aliases)
    }

    pub fn parse(&self, query: &str) -> Result<Expr> {
        self.parser().parse(query)
    }

    /// Identifiers matching a query, ascending.
    pub fn search(&self, query: &str) -> Result<Vec<u32>> {
        let expr = self.parse(query)?;
        Ok(self.evaluate(&expr))
    }

    /// Like [`search`](Self::search), with `[PIPE]` bound to `pipe`.
    pub fn search_with_pipe(&self, query: &str, pipe: &[u32]) -> Result<Vec<u32>> {
        let expr = self.parser().with_pipe(pipe).parse(query)?;
        Ok(self.evaluate(&expr))
    }

    /// Evaluate a parsed expression. Missing terms and unreadable shards
    /// contribute nothing.
    pub fn evaluate(&self, expr: &Expr) -> Vec<u32> {
        match expr {
            Expr::Term { field, term } => self.store.lookup_uids(field, term),
            Expr::Uids(uids) => uids.clone(),
            Expr::Phrase { .. } | Expr::Near { .. } => self.positional(expr).postings.into_uids(),
            Expr::And(left, right) => {
                let (l, r) = rayon::join(|| self.evaluate(left), || self.evaluate(right));
                intersect(&l, &r)
            }
            Expr::Or(left, right) => {
                let (l, r) = rayon::join(|| self.evaluate(left), || self.evaluate(right));
                union(&l, &r)
            }
            Expr::Not(left, right) => {
                let (l, r) = rayon::join(|| self.evaluate(left), || self.evaluate(right));
                difference(&l, &r)
            }
        }
    }

    fn positional(&self, expr: &Expr) -> PositionalMatch {
        match expr {
            Expr::Phrase { field, words } => self.phrase(field, words),
            Expr::Near {
                left,
                right,
                distance,
            } => {
                let (l, r) = rayon::join(|| self.positional(left), || self.positional(right));
                if l.postings.is_empty() || r.postings.is_empty() {
                    return PositionalMatch::default();
                }
                PositionalMatch {
                    postings: near_join(&l.postings, l.span, &r.postings, *distance),
                    span: r.span,
                }
            }
            other => PositionalMatch {
                postings: Postings::from_uids(self.evaluate(other)),
                span: 0,
            },
        }
    }

    fn phrase(&self, field: &str, words: &[PhraseToken]) -> PositionalMatch {
        let offsets: Vec<(u32, &str)> = words
            .iter()
            .enumerate()
            .filter_map(|(offset, word)| match word {
                PhraseToken::Word(word) => Some((offset as u32, word.as_str())),
                PhraseToken::Skip => None,
            })
            .collect();
        let Some(&(span, _)) = offsets.last() else {
            return PositionalMatch::default();
        };

        let lists: Vec<Postings> = offsets
            .par_iter()
            .map(|(_, word)| self.store.lookup(field, word))
            .collect();
        if lists.iter().any(Postings::is_empty) {
            log::debug!("phrase in {field} has an absent word");
            return PositionalMatch::default();
        }

        let mut lists = lists.into_iter().zip(offsets.iter().map(|(offset, _)| *offset));
        let Some((mut acc, _)) = lists.next() else {
            return PositionalMatch::default();
        };
        for (next, offset) in lists {
            acc = phrase_join(&acc, &next, offset);
            if acc.is_empty() {
                break;
            }
        }
        PositionalMatch {
            postings: acc,
            span,
        }
    }

    /// Stored terms of a field starting with `prefix`, numeric padding removed.
    pub fn terms(&self, field: &str, prefix: &str) -> Result<Vec<String>> {
        let field = self.schema.require(field)?;
        if field.kind == FieldKind::Numeric {
            // Padded terms share no prefix with the digits a caller types.
            return Ok(self
                .store
                .terms(&field.name, "")
                .iter()
                .map(|term| unpad_numeric(term))
                .filter(|term| term.starts_with(prefix))
                .map(str::to_string)
                .collect());
        }
        Ok(self
            .store
            .terms(&field.name, prefix)
            .iter()
            .map(|term| unpad_numeric(term).to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexBuilder, Inverter, SourceDocument};
    use tempfile::TempDir;

    fn archive(documents: &[SourceDocument]) -> (TempDir, SearchEngine) {
        let dir = TempDir::new().unwrap();
        let config = ArchiveConfig::new(dir.path()).with_workers(2);
        let source = dir.path().join("raw");
        std::fs::create_dir_all(&source).unwrap();
        let lines: Vec<String> = documents
            .iter()
            .map(|d| serde_json::to_string(d).unwrap())
            .collect();
        std::fs::write(source.join("batch1.jsonl"), lines.join("\n")).unwrap();

        IndexBuilder::new(config.clone())
            .unwrap()
            .build_from_dir(&source)
            .unwrap();
        Inverter::new(config.clone()).unwrap().run().unwrap();
        let engine = SearchEngine::open(&config).unwrap();
        (dir, engine)
    }

    fn documents() -> Vec<SourceDocument> {
        vec![
            SourceDocument::new(2539356)
                .with_field(
                    "TITL",
                    "Nucleotide sequences required for Tn3 transposition immunity",
                )
                .with_field("YEAR", "1988")
                .with_values("AUTH", &["Kans JA", "Casadaban MJ"]),
            SourceDocument::new(100)
                .with_field("TITL", "Transposition of Tn3 in yeast")
                .with_field("YEAR", "1990")
                .with_values("AUTH", &["Smith J"]),
            SourceDocument::new(200)
                .with_field("TITL", "Immunity and transposition hotspots")
                .with_field("YEAR", "1990")
                .with_values("AUTH", &["Smith JK", "Kans JA"]),
        ]
    }

    #[test]
    fn test_phrases_and_booleans() {
        let (_dir, engine) = archive(&documents());
        assert_eq!(engine.search("\"tn3 transposition\"").unwrap(), vec![2539356]);
        assert_eq!(engine.search("transposition").unwrap(), vec![100, 200, 2539356]);
        assert_eq!(engine.search("tn3 | hotspots").unwrap(), vec![100, 200, 2539356]);
        assert_eq!(engine.search("transposition ! tn3").unwrap(), vec![200]);
        assert_eq!(engine.search("tn3 & 1990[YEAR]").unwrap(), vec![100]);
        assert!(engine.search("tn3 yeast").unwrap().is_empty());
        assert!(engine.search("unheardofword").unwrap().is_empty());
    }

    #[test]
    fn test_skips_and_proximity() {
        let (_dir, engine) = archive(&documents());
        // "for" is a stop word and occupies one position.
        assert_eq!(engine.search("required + tn3").unwrap(), vec![2539356]);
        assert_eq!(engine.search("required for tn3").unwrap(), vec![2539356]);
        // nucleotide(0) sequences(1) required(2) for(3) tn3(4) transposition(5) immunity(6)
        assert_eq!(engine.search("nucleotide ~6 immunity").unwrap(), vec![2539356]);
        assert!(engine.search("nucleotide ~5 immunity").unwrap().is_empty());
        assert_eq!(
            engine.search("nucleotide sequences ~5 immunity").unwrap(),
            vec![2539356]
        );
        assert!(engine.search("nucleotide sequences ~4 immunity").unwrap().is_empty());
        assert_eq!(
            engine.search("nucleotide ~2 required ~3 transposition").unwrap(),
            vec![2539356]
        );
        assert!(engine.search("nucleotide ~2 required ~2 transposition").unwrap().is_empty());
    }

    #[test]
    fn test_fields() {
        let (_dir, engine) = archive(&documents());
        assert_eq!(engine.search("smith[AUTH]").unwrap(), vec![100, 200]);
        assert_eq!(engine.search("smith j[AUTH]").unwrap(), vec![100, 200]);
        assert_eq!(engine.search("kans ja[FAUT]").unwrap(), vec![2539356]);
        assert_eq!(engine.search("1988:1990[YEAR]").unwrap(), vec![100, 200, 2539356]);
        assert_eq!(engine.search_with_pipe("transposition & x[PIPE]", &[200, 7]).unwrap(), vec![200]);
        assert_eq!(engine.terms("YEAR", "19").unwrap(), vec!["1988", "1990"]);
        assert!(engine.terms("NOPE", "").is_err());
    }
}
