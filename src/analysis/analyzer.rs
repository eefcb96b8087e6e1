//! Field-aware analysis: turns field values into indexed terms.
//!
//! The same [`FieldAnalyzer`] is used when building forward-index bundles and
//! when the query parser rewrites phrases, so a word is stored and looked up
//! in exactly the same form.

use std::sync::Arc;

use crate::analysis::stemmer::{PorterStemmer, Stemmer};
use crate::analysis::stop::StopWords;
use crate::analysis::tokenizer::{Lexeme, Tokenizer};
use crate::schema::{FieldDefinition, FieldKind};

/// Width numeric terms are zero-padded to.
pub const NUMERIC_WIDTH: usize = 8;

/// Positions after a text boundary restart at a multiple of this block.
pub const POSITION_BLOCK: u32 = 100;

/// Minimum number of unused positions between two text values.
pub const POSITION_GAP: u32 = 20;

/// Zero-pad a purely numeric term; other terms are returned unchanged.
pub fn pad_numeric(term: &str) -> String {
    if !term.is_empty() && term.bytes().all(|b| b.is_ascii_digit()) && term.len() < NUMERIC_WIDTH
    {
        format!("{term:0>width$}", width = NUMERIC_WIDTH)
    } else {
        term.to_string()
    }
}

/// Strip the zero padding added by [`pad_numeric`].
pub fn unpad_numeric(term: &str) -> &str {
    if term.bytes().all(|b| b.is_ascii_digit()) {
        let trimmed = term.trim_start_matches('0');
        if trimmed.is_empty() { "0" } else { trimmed }
    } else {
        term
    }
}

fn is_joiner(c: char) -> bool {
    matches!(c, '.' | '-' | '/' | '_')
}

/// Normalize an exact-term value: lower-case, apostrophes removed, `. - / _`
/// kept only between two alphanumerics, everything else collapsed to single
/// spaces. `keep` names extra characters to preserve verbatim.
pub fn normalize_term_with(value: &str, keep: &[char]) -> String {
    let chars: Vec<char> = value
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .flat_map(char::to_lowercase)
        .collect();

    let mut out = String::with_capacity(chars.len());
    let mut pending_space = false;
    for (i, &c) in chars.iter().enumerate() {
        let inner_joiner = is_joiner(c)
            && i > 0
            && chars[i - 1].is_alphanumeric()
            && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric());
        if c.is_alphanumeric() || inner_joiner || keep.contains(&c) {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Normalize an exact-term value.
pub fn normalize_term(value: &str) -> String {
    normalize_term_with(value, &[])
}

/// Extract zero-padded digit runs from a numeric value.
pub fn numeric_terms(value: &str) -> Vec<String> {
    value
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(pad_numeric)
        .collect()
}

/// Hands out word positions for one (document, field) pair.
#[derive(Debug, Clone)]
pub struct PositionCounter {
    next: u32,
    started: bool,
}

impl Default for PositionCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionCounter {
    pub fn new() -> Self {
        PositionCounter {
            next: 1,
            started: false,
        }
    }

    /// Mark the start of a new text value, padding past the previous one.
    pub fn boundary(&mut self) {
        if self.started {
            let padded = self.next + POSITION_GAP;
            self.next = padded.div_ceil(POSITION_BLOCK) * POSITION_BLOCK;
        }
    }

    /// Consume the next position.
    pub fn advance(&mut self) -> u32 {
        let position = self.next;
        self.next += 1;
        self.started = true;
        position
    }

    /// The position the next word would receive.
    pub fn peek(&self) -> u32 {
        self.next
    }
}

/// A term produced for a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedTerm {
    pub term: String,
    pub position: Option<u16>,
}

/// A word of a query phrase after stop-word and stemming rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhraseToken {
    Word(String),
    Skip,
}

/// Field-aware analyzer.
#[derive(Debug, Clone)]
pub struct FieldAnalyzer {
    tokenizer: Tokenizer,
    stop_words: Arc<StopWords>,
    stemmer: PorterStemmer,
}

impl Default for FieldAnalyzer {
    fn default() -> Self {
        Self::new(Tokenizer::new(true), Arc::new(StopWords::english()))
    }
}

impl FieldAnalyzer {
    pub fn new(tokenizer: Tokenizer, stop_words: Arc<StopWords>) -> Self {
        FieldAnalyzer {
            tokenizer,
            stop_words,
            stemmer: PorterStemmer::new(),
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    fn text_token(&self, field: &FieldDefinition, word: String) -> PhraseToken {
        if self.stop_words.contains(&word) {
            PhraseToken::Skip
        } else if field.stem {
            PhraseToken::Word(self.stemmer.stem(&word))
        } else {
            PhraseToken::Word(word)
        }
    }

    /// Analyze free text into words and skips, in position order.
    pub fn text_tokens(&self, field: &FieldDefinition, text: &str) -> Vec<PhraseToken> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .map(|lexeme| match lexeme {
                Lexeme::Word(word) => self.text_token(field, word),
                Lexeme::Break => PhraseToken::Skip,
            })
            .collect()
    }

    /// Analyze one query word of a free-text phrase. A trailing `*` is kept on
    /// the last piece and suppresses stemming of that piece.
    pub fn query_word(&self, field: &FieldDefinition, word: &str) -> Vec<PhraseToken> {
        match word.strip_suffix('*') {
            Some(prefix) => {
                let mut pieces = self.tokenizer.words(prefix);
                let Some(last) = pieces.pop() else {
                    return Vec::new();
                };
                let mut tokens: Vec<PhraseToken> = pieces
                    .into_iter()
                    .map(|piece| self.text_token(field, piece))
                    .collect();
                tokens.push(PhraseToken::Word(format!("{last}*")));
                tokens
            }
            None => self.text_tokens(field, word),
        }
    }

    /// Analyze every value of a field for one document.
    pub fn analyze_values(&self, field: &FieldDefinition, values: &[&str]) -> Vec<AnalyzedTerm> {
        let mut terms = Vec::new();
        match field.kind {
            FieldKind::Text => {
                let mut counter = PositionCounter::new();
                for value in values {
                    counter.boundary();
                    for token in self.text_tokens(field, value) {
                        let position = counter.advance();
                        let PhraseToken::Word(term) = token else {
                            continue;
                        };
                        match u16::try_from(position) {
                            Ok(position) => terms.push(AnalyzedTerm {
                                term: pad_numeric(&term),
                                position: Some(position),
                            }),
                            Err(_) => {
                                log::debug!("dropping '{term}' in {}: position overflow", field.name);
                            }
                        }
                    }
                }
            }
            FieldKind::Term => {
                for value in values {
                    let value = if self.tokenizer.transliterates() {
                        crate::analysis::translit::transliterate(value)
                    } else {
                        value.to_string()
                    };
                    let term = pad_numeric(&normalize_term(&value));
                    if !term.is_empty() {
                        terms.push(AnalyzedTerm {
                            term,
                            position: None,
                        });
                    }
                }
            }
            FieldKind::Numeric => {
                for value in values {
                    terms.extend(numeric_terms(value).into_iter().map(|term| AnalyzedTerm {
                        term,
                        position: None,
                    }));
                }
            }
        }
        terms
    }
}
