//! Field-qualifier expansion: turns one resolved phrase into an expression.
//!
//! - free-text fields: a positional phrase (skip markers kept as offsets);
//! - numeric fields: each word, or each value of an `a:b` range, ORed;
//! - author fields: a lone surname also matches every `surname initials`
//!   term, and trailing initials of one or two letters match longer ones;
//! - `MESH`: the heading's tree numbers (with all descendants) or its code;
//! - `JOUR` / `PTYP`: alias substitution;
//! - `DOI`: resolver prefixes stripped;
//! - `PIPE`: the identifier list supplied with the query.

use crate::analysis::analyzer::normalize_term_with;
use crate::analysis::PhraseToken;
use crate::error::{BibdexError, Result};
use crate::query::aliases::AliasTables;
use crate::query::filter::{resolve_field, FieldTarget};
use crate::query::parser::Expr;
use crate::query::partition::QueryPhrase;
use crate::schema::{FieldDefinition, FieldKind, FieldSchema};

/// Widest numeric range a query may expand.
pub const MAX_RANGE: u64 = 10_000;

const AUTHOR_FIELDS: &[&str] = &["AUTH", "FAUT", "LAUT"];
const DOI_PREFIXES: &[&str] = &["dx.doi.org/", "doi.org/"];
const DOI_NOISE: &[&str] = &["http", "https", "doi"];

/// Expands phrases against a schema, alias tables and an optional pipe.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'a> {
    schema: &'a FieldSchema,
    aliases: &'a AliasTables,
    pipe: Option<&'a [u32]>,
}

fn join_words(phrase: &QueryPhrase) -> String {
    normalize_term_with(&phrase.plain_words().join(" "), &['*'])
}

fn term(field: &str, term: impl Into<String>) -> Expr {
    Expr::Term {
        field: field.to_string(),
        term: term.into(),
    }
}

/// Whether a wildcard's literal prefix is purely numeric. Numeric terms are
/// stored zero-padded, so such a prefix can never match what the user typed.
fn is_numeric_wildcard(word: &str) -> bool {
    word.split_once('*')
        .is_some_and(|(prefix, _)| !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()))
}

/// Values of an `a:b` range, inclusive.
fn range_values(word: &str) -> Result<Vec<String>> {
    let malformed = || BibdexError::query(format!("malformed range '{word}'"));
    let (low, high) = word.split_once(':').ok_or_else(malformed)?;
    let low: u64 = low.parse().map_err(|_| malformed())?;
    let high: u64 = high.parse().map_err(|_| malformed())?;
    if low > high {
        return Err(BibdexError::query(format!("range '{word}' is reversed")));
    }
    if high - low >= MAX_RANGE {
        return Err(BibdexError::query(format!(
            "range '{word}' spans more than {MAX_RANGE} values"
        )));
    }
    Ok((low..=high).map(|v| v.to_string()).collect())
}

impl<'a> Expander<'a> {
    pub fn new(schema: &'a FieldSchema, aliases: &'a AliasTables, pipe: Option<&'a [u32]>) -> Self {
        Expander {
            schema,
            aliases,
            pipe,
        }
    }

    /// Expand a phrase whose field has been resolved.
    pub fn expand(&self, phrase: QueryPhrase) -> Result<Expr> {
        if let Some(word) = phrase.plain_words().into_iter().find(|w| is_numeric_wildcard(w)) {
            return Err(BibdexError::query(format!(
                "numeric wildcard '{word}' is not supported; use a range such as 1910:1919[YEAR]"
            )));
        }
        match resolve_field(self.schema, phrase.field.as_deref())? {
            FieldTarget::Pipe => self.pipe_uids(),
            FieldTarget::Mesh => Ok(self.mesh(&phrase)),
            FieldTarget::Field(field) => match field.kind {
                FieldKind::Text => Ok(Self::text(field, phrase)),
                FieldKind::Numeric => Self::numeric(field, &phrase),
                FieldKind::Term => Ok(self.exact(field, &phrase)),
            },
        }
    }

    fn pipe_uids(&self) -> Result<Expr> {
        let pipe = self
            .pipe
            .ok_or_else(|| BibdexError::query("[PIPE] used but no identifiers were piped in"))?;
        let mut uids = pipe.to_vec();
        uids.sort_unstable();
        uids.dedup();
        Ok(Expr::Uids(uids))
    }

    fn text(field: &FieldDefinition, phrase: QueryPhrase) -> Expr {
        let mut words = phrase.words;
        while words.last() == Some(&PhraseToken::Skip) {
            words.pop();
        }
        let leading = words
            .iter()
            .take_while(|w| **w == PhraseToken::Skip)
            .count();
        words.drain(..leading);
        Expr::Phrase {
            field: field.name.clone(),
            words,
        }
    }

    fn numeric(field: &FieldDefinition, phrase: &QueryPhrase) -> Result<Expr> {
        let mut alternatives = Vec::new();
        for word in phrase.plain_words() {
            if word.contains(':') {
                alternatives.extend(range_values(word)?.into_iter().map(|v| term(&field.name, v)));
            } else if word.bytes().all(|b| b.is_ascii_digit()) {
                alternatives.push(term(&field.name, word));
            } else if word.contains('*') {
                return Err(BibdexError::query(format!(
                    "wildcards are not supported in [{}]; use a range such as 1990:1999",
                    field.name
                )));
            } else {
                return Err(BibdexError::query(format!(
                    "'{word}' is not a number in [{}]",
                    field.name
                )));
            }
        }
        Ok(Expr::any(alternatives))
    }

    fn exact(&self, field: &FieldDefinition, phrase: &QueryPhrase) -> Expr {
        let name = field.name.as_str();
        match name {
            "DOI" => Self::doi(field, phrase),
            "JOUR" => term(name, self.aliases.journal(&join_words(phrase))),
            "PTYP" => term(name, self.aliases.pubtype(&join_words(phrase))),
            _ if AUTHOR_FIELDS.contains(&name) => Self::author(field, phrase),
            _ => {
                let value = join_words(phrase);
                if value.is_empty() {
                    Expr::any(Vec::new())
                } else {
                    term(name, value)
                }
            }
        }
    }

    fn author(field: &FieldDefinition, phrase: &QueryPhrase) -> Expr {
        let value = join_words(phrase);
        let words: Vec<&str> = value.split(' ').filter(|w| !w.is_empty()).collect();
        match words.as_slice() {
            [] => Expr::any(Vec::new()),
            _ if value.contains('*') => term(&field.name, value.clone()),
            [surname] => Expr::any(vec![
                term(&field.name, *surname),
                term(&field.name, format!("{surname} *")),
            ]),
            [.., initials]
                if initials.len() <= 2 && initials.chars().all(|c| c.is_alphabetic()) =>
            {
                term(&field.name, format!("{value}*"))
            }
            _ => term(&field.name, value.clone()),
        }
    }

    /// A DOI is stored as one exact term, its word breaks collapsed to
    /// single spaces, so the query words are rejoined the same way.
    fn doi(field: &FieldDefinition, phrase: &QueryPhrase) -> Expr {
        let words: Vec<&str> = phrase
            .plain_words()
            .into_iter()
            .filter(|w| !DOI_NOISE.contains(w))
            .collect();
        let mut value = words.join(" ");
        for prefix in DOI_PREFIXES {
            if let Some(rest) = value.strip_prefix(prefix) {
                value = rest.to_string();
                break;
            }
        }
        let value = normalize_term_with(&value, &['*']);
        if value.is_empty() {
            Expr::any(Vec::new())
        } else {
            term(&field.name, value)
        }
    }

    fn mesh(&self, phrase: &QueryPhrase) -> Expr {
        let name = join_words(phrase);
        match self.aliases.mesh(&name) {
            Some(entry) => {
                let mut alternatives: Vec<Expr> = entry
                    .trees
                    .iter()
                    .map(|tree| term("TREE", format!("{tree}*")))
                    .collect();
                alternatives.push(term("CODE", entry.code.clone()));
                Expr::any(alternatives)
            }
            None => {
                log::debug!("'{name}' is not a MeSH heading, searching it as a code");
                term("CODE", name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_with(field: &str, words: &[&str], pipe: Option<&[u32]>) -> Result<Expr> {
        let schema = FieldSchema::bibliographic();
        let aliases = AliasTables::new()
            .with_mesh("Neoplasms", "D009369", &["C04"])
            .with_journal("Nature Genetics", "Nat Genet");
        let phrase = QueryPhrase {
            words: words
                .iter()
                .map(|w| PhraseToken::Word(w.to_string()))
                .collect(),
            field: Some(field.to_string()),
        };
        Expander::new(&schema, &aliases, pipe).expand(phrase)
    }

    fn expand(field: &str, words: &[&str]) -> Expr {
        expand_with(field, words, None).unwrap()
    }

    fn t(field: &str, value: &str) -> Expr {
        term(field, value)
    }

    #[test]
    fn test_year_range() {
        assert_eq!(
            expand("YEAR", &["2020:2022"]),
            Expr::any(vec![t("YEAR", "2020"), t("YEAR", "2021"), t("YEAR", "2022")])
        );
        assert_eq!(
            expand("YEAR", &["1999", "2001"]),
            Expr::any(vec![t("YEAR", "1999"), t("YEAR", "2001")])
        );
        assert!(expand_with("YEAR", &["2022:2020"], None).is_err());
        assert!(expand_with("YEAR", &["nineteen"], None).is_err());
        assert!(expand_with("YEAR", &["199*"], None).is_err());
        assert!(range_values("1:2:3").is_err());
        assert!(range_values("0:99999999").is_err());
    }

    #[test]
    fn test_author_rules() {
        assert_eq!(
            expand("AUTH", &["smith"]),
            Expr::any(vec![t("AUTH", "smith"), t("AUTH", "smith *")])
        );
        assert_eq!(expand("AUTH", &["smith", "j"]), t("AUTH", "smith j*"));
        assert_eq!(expand("FAUT", &["smith", "jk"]), t("FAUT", "smith jk*"));
        assert_eq!(expand("AUTH", &["van", "der", "berg"]), t("AUTH", "van der berg"));
        assert_eq!(expand("AUTH", &["smi*"]), t("AUTH", "smi*"));
    }

    #[test]
    fn test_vocabularies() {
        assert_eq!(
            expand("MESH", &["neoplasms"]),
            Expr::any(vec![t("TREE", "c04*"), t("CODE", "d009369")])
        );
        assert_eq!(expand("MESH", &["d000001"]), t("CODE", "d000001"));
        assert_eq!(expand("JOUR", &["nature", "genetics"]), t("JOUR", "nat genet"));
        assert_eq!(expand("JOUR", &["cell"]), t("JOUR", "cell"));
    }

    #[test]
    fn test_doi_prefix_is_stripped() {
        assert_eq!(
            expand("DOI", &["https", "doi.org/10.1038/nature12373"]),
            t("DOI", "10.1038/nature12373")
        );
        assert_eq!(
            expand("DOI", &["10.1038/nature12373"]),
            t("DOI", "10.1038/nature12373")
        );
    }

    #[test]
    fn test_doi_keeps_word_breaks() {
        assert_eq!(
            expand("DOI", &["10.1016/s0140-6736", "20", "30183-5"]),
            t("DOI", "10.1016/s0140-6736 20 30183-5")
        );
        assert_eq!(
            expand("DOI", &["https", "doi.org/10.1016/s0140-6736", "20", "30183-5"]),
            t("DOI", "10.1016/s0140-6736 20 30183-5")
        );
    }

    #[test]
    fn test_numeric_wildcards_are_rejected_everywhere() {
        for field in ["TIAB", "TITL", "DOI", "CITES", "YEAR"] {
            match expand_with(field, &["191*"], None) {
                Err(BibdexError::Query(_)) => {}
                other => panic!("{field}: expected a query error, got {other:?}"),
            }
        }
        assert!(is_numeric_wildcard("1918*"));
        assert!(!is_numeric_wildcard("p53*"));
        assert!(!is_numeric_wildcard("10.1038*"));
        assert!(!is_numeric_wildcard("*"));
        assert_eq!(expand("TITL", &["tn3*"]), Expr::Phrase {
            field: "TITL".into(),
            words: vec![PhraseToken::Word("tn3*".into())],
        });
    }

    #[test]
    fn test_pipe() {
        assert_eq!(
            expand_with("PIPE", &["x"], Some(&[5, 1, 5])).unwrap(),
            Expr::Uids(vec![1, 5])
        );
        assert!(expand_with("PIPE", &["x"], None).is_err());
    }

    #[test]
    fn test_text_phrase_trims_skips() {
        let phrase = QueryPhrase {
            words: vec![
                PhraseToken::Skip,
                PhraseToken::Word("tn3".into()),
                PhraseToken::Skip,
                PhraseToken::Word("immunity".into()),
                PhraseToken::Skip,
            ],
            field: Some("TIAB".into()),
        };
        let schema = FieldSchema::bibliographic();
        let aliases = AliasTables::new();
        let expr = Expander::new(&schema, &aliases, None).expand(phrase).unwrap();
        assert_eq!(
            expr,
            Expr::Phrase {
                field: "TIAB".into(),
                words: vec![
                    PhraseToken::Word("tn3".into()),
                    PhraseToken::Skip,
                    PhraseToken::Word("immunity".into()),
                ],
            }
        );
    }
}
