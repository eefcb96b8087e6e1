//! Word segmentation shared by indexing and query normalization.
//!
//! Text is split on Unicode word boundaries (UAX #29). Word segments are
//! further split on any non-alphanumeric character, so `tn-3`, `3.5` and
//! `u.s.a` all become separate words, and apostrophes are deleted so that
//! `don't` and `dont` agree. A period that ends a sentence becomes a
//! [`Lexeme::Break`], which occupies a position but is never indexed.
//!
//! # Examples
//!
//! ```
//! use bibdex::analysis::tokenizer::{Lexeme, Tokenizer};
//!
//! let tokens = Tokenizer::new(false).tokenize("Tn3 transposition. Immunity");
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Lexeme::Word("tn3".into()),
//!         Lexeme::Word("transposition".into()),
//!         Lexeme::Break,
//!         Lexeme::Word("immunity".into()),
//!     ]
//! );
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::translit::transliterate;

/// One unit of tokenizer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme {
    /// A lower-case alphanumeric word.
    Word(String),
    /// A sentence-final period.
    Break,
}

/// Whether a period between `prev` and `next` ends a sentence: it must
/// directly follow an alphanumeric and precede whitespace or the end of text.
/// The query lexer applies the same rule to turn such periods into skips.
pub fn ends_sentence(prev: Option<char>, next: Option<char>) -> bool {
    prev.is_some_and(char::is_alphanumeric) && next.is_none_or(char::is_whitespace)
}

/// Splits text into lower-case words and sentence breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer {
    transliterate: bool,
}

impl Tokenizer {
    /// Create a tokenizer, optionally folding non-ASCII letters to ASCII.
    pub fn new(transliterate: bool) -> Self {
        Tokenizer { transliterate }
    }

    /// Whether non-ASCII letters are folded.
    pub fn transliterates(&self) -> bool {
        self.transliterate
    }

    /// Apply folding, lower-casing and apostrophe removal.
    pub fn prepare(&self, text: &str) -> String {
        let text = if self.transliterate {
            transliterate(text)
        } else {
            text.to_string()
        };
        text.to_lowercase().replace(['\'', '\u{2019}'], "")
    }

    /// Tokenize text into words and breaks.
    pub fn tokenize(&self, text: &str) -> Vec<Lexeme> {
        let text = self.prepare(text);
        let mut lexemes = Vec::new();
        let mut prev = None;
        let mut segments = text.split_word_bounds().peekable();

        while let Some(segment) = segments.next() {
            if segment.chars().any(char::is_alphanumeric) {
                lexemes.extend(
                    segment
                        .split(|c: char| !c.is_alphanumeric())
                        .filter(|piece| !piece.is_empty())
                        .map(|piece| Lexeme::Word(piece.to_string())),
                );
            } else if segment == "."
                && ends_sentence(prev, segments.peek().and_then(|next| next.chars().next()))
            {
                lexemes.push(Lexeme::Break);
            }
            prev = segment.chars().last();
        }

        lexemes
    }

    /// Tokenize and keep only the words.
    pub fn words(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .filter_map(|lexeme| match lexeme {
                Lexeme::Word(word) => Some(word),
                Lexeme::Break => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        Tokenizer::new(true).words(text)
    }

    #[test]
    fn test_punctuation_splits_words() {
        assert_eq!(words("Tn-3 (3.5 kb)"), vec!["tn", "3", "3", "5", "kb"]);
        assert_eq!(words("Don't stop"), vec!["dont", "stop"]);
    }

    #[test]
    fn test_sentence_break() {
        let tokens = Tokenizer::new(false).tokenize("Immunity. The end.");
        assert_eq!(
            tokens,
            vec![
                Lexeme::Word("immunity".into()),
                Lexeme::Break,
                Lexeme::Word("the".into()),
                Lexeme::Word("end".into()),
                Lexeme::Break,
            ]
        );
    }

    #[test]
    fn test_inner_period_is_not_a_break() {
        let tokens = Tokenizer::new(false).tokenize("version 3.5 released");
        assert!(!tokens.contains(&Lexeme::Break));
    }

    #[test]
    fn test_period_must_touch_the_word_and_end_it() {
        let breaks = |text: &str| {
            Tokenizer::new(false)
                .tokenize(text)
                .iter()
                .filter(|l| **l == Lexeme::Break)
                .count()
        };
        assert_eq!(breaks("immunity. the"), 1);
        assert_eq!(breaks("immunity."), 1);
        assert_eq!(breaks("immunity .the"), 0);
        assert_eq!(breaks("immunity.) the"), 0);
        assert_eq!(breaks("end..."), 0);
    }

    #[test]
    fn test_transliteration_is_optional() {
        assert_eq!(Tokenizer::new(true).words("Müller"), vec!["muller"]);
        assert_eq!(Tokenizer::new(false).words("Müller"), vec!["müller"]);
    }
}
