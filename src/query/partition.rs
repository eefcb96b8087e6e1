//! Splits a token sequence into operators, parentheses and phrases, and
//! attaches field qualifiers to the phrases they apply to.

use crate::analysis::PhraseToken;
use crate::error::{BibdexError, Result};
use crate::query::lexer::Token;

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Or,
    And,
    Not,
    Near(u32),
}

/// Consecutive words searched together in one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPhrase {
    pub words: Vec<PhraseToken>,
    /// Qualifier, or `None` for the default field.
    pub field: Option<String>,
}

impl QueryPhrase {
    /// Words only, skip markers dropped.
    pub fn plain_words(&self) -> Vec<&str> {
        self.words
            .iter()
            .filter_map(|w| match w {
                PhraseToken::Word(word) => Some(word.as_str()),
                PhraseToken::Skip => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Op(Operator),
    Open,
    Close,
    Phrase(QueryPhrase),
}

struct Partitioner {
    parts: Vec<Part>,
    words: Vec<PhraseToken>,
    open_stack: Vec<usize>,
    /// Index of the `Open` matching the `Close` just pushed.
    closed_group: Option<usize>,
}

impl Partitioner {
    fn flush(&mut self, field: Option<String>) {
        if !self.words.is_empty() {
            self.parts.push(Part::Phrase(QueryPhrase {
                words: std::mem::take(&mut self.words),
                field,
            }));
            self.closed_group = None;
        }
    }

    fn push(&mut self, part: Part) {
        self.flush(None);
        self.closed_group = None;
        match part {
            Part::Open => self.open_stack.push(self.parts.len()),
            Part::Close => self.closed_group = self.open_stack.pop(),
            _ => {}
        }
        self.parts.push(part);
    }

    fn qualify(&mut self, field: String) -> Result<()> {
        if !self.words.is_empty() {
            self.flush(Some(field));
            return Ok(());
        }
        let Some(open) = self.closed_group.take() else {
            return Err(BibdexError::query(format!(
                "qualifier [{field}] does not follow a phrase"
            )));
        };
        for part in &mut self.parts[open..] {
            if let Part::Phrase(phrase) = part {
                if phrase.field.is_none() {
                    phrase.field = Some(field.clone());
                }
            }
        }
        Ok(())
    }
}

/// Group tokens into parts.
pub fn partition(tokens: Vec<Token>) -> Result<Vec<Part>> {
    let mut partitioner = Partitioner {
        parts: Vec::new(),
        words: Vec::new(),
        open_stack: Vec::new(),
        closed_group: None,
    };

    for token in tokens {
        match token {
            Token::Word(word) => partitioner.words.push(PhraseToken::Word(word)),
            Token::Skip => partitioner.words.push(PhraseToken::Skip),
            Token::Field(field) => partitioner.qualify(field)?,
            Token::And => partitioner.push(Part::Op(Operator::And)),
            Token::Or => partitioner.push(Part::Op(Operator::Or)),
            Token::Not => partitioner.push(Part::Op(Operator::Not)),
            Token::Near(distance) => partitioner.push(Part::Op(Operator::Near(distance))),
            Token::Open => partitioner.push(Part::Open),
            Token::Close => partitioner.push(Part::Close),
        }
    }
    partitioner.flush(None);
    Ok(partitioner.parts)
}
