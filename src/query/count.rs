//! Per-term document counts for the terms a query names.

use serde::Serialize;

use crate::analysis::analyzer::unpad_numeric;
use crate::analysis::PhraseToken;
use crate::error::Result;
use crate::query::eval::SearchEngine;
use crate::query::parser::Expr;

/// Documents containing one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub field: String,
    pub term: String,
    pub count: usize,
}

/// A query leaf worth counting.
enum Leaf<'a> {
    Term { field: &'a str, term: &'a str },
    Phrase { field: &'a str, words: &'a [PhraseToken] },
}

fn leaves<'a>(expr: &'a Expr, out: &mut Vec<Leaf<'a>>) {
    match expr {
        Expr::Term { field, term } => out.push(Leaf::Term { field, term }),
        Expr::Phrase { field, words } => match words.as_slice() {
            [PhraseToken::Word(word)] => out.push(Leaf::Term { field, term: word }),
            _ => out.push(Leaf::Phrase { field, words }),
        },
        Expr::Uids(_) => {}
        Expr::And(left, right) | Expr::Or(left, right) | Expr::Not(left, right) => {
            leaves(left, out);
            leaves(right, out);
        }
        Expr::Near { left, right, .. } => {
            leaves(left, out);
            leaves(right, out);
        }
    }
}

fn phrase_text(words: &[PhraseToken]) -> String {
    words
        .iter()
        .map(|w| match w {
            PhraseToken::Word(word) => word.as_str(),
            PhraseToken::Skip => "+",
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl SearchEngine {
    /// One count per term the query names; a wildcard counts every
    /// document of every matching term, summed.
    pub fn count(&self, query: &str) -> Result<Vec<TermCount>> {
        self.count_leaves(query, false)
    }

    /// Like [`count`](Self::count), but a wildcard yields one entry per
    /// matching term.
    pub fn counts(&self, query: &str) -> Result<Vec<TermCount>> {
        self.count_leaves(query, true)
    }

    fn count_leaves(&self, query: &str, expand: bool) -> Result<Vec<TermCount>> {
        let expr = self.parse(query)?;
        let mut found = Vec::new();
        leaves(&expr, &mut found);

        let mut counts = Vec::new();
        for leaf in found {
            match leaf {
                Leaf::Term { field, term } => {
                    let matches = self.store().term_counts(field, term);
                    if expand && term.contains('*') {
                        counts.extend(matches.into_iter().map(|(stored, count)| TermCount {
                            field: field.to_string(),
                            term: unpad_numeric(&stored).to_string(),
                            count,
                        }));
                    } else {
                        counts.push(TermCount {
                            field: field.to_string(),
                            term: term.to_string(),
                            count: matches.iter().map(|(_, count)| count).sum(),
                        });
                    }
                }
                Leaf::Phrase { field, words } => {
                    let phrase = Expr::Phrase {
                        field: field.to_string(),
                        words: words.to_vec(),
                    };
                    counts.push(TermCount {
                        field: field.to_string(),
                        term: phrase_text(words),
                        count: self.evaluate(&phrase).len(),
                    });
                }
            }
        }
        Ok(counts)
    }
}
