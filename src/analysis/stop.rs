//! Stop-word table.
//!
//! The table is an opaque lookup: its linguistic quality is not this crate's
//! concern, only that index time and query time consult the same set.

use std::fs;
use std::path::Path;

use ahash::AHashSet;

use crate::error::Result;

/// Default English stop words for bibliographic text.
const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "about", "again", "all", "almost", "also", "although", "always", "among", "an", "and",
    "another", "any", "are", "as", "at", "be", "because", "been", "before", "being", "between",
    "both", "but", "by", "can", "could", "did", "do", "does", "done", "due", "during", "each",
    "either", "enough", "especially", "etc", "for", "found", "from", "further", "had", "has",
    "have", "having", "here", "how", "however", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "kg", "km", "made", "mainly", "make", "may", "mg", "might", "ml", "mm",
    "most", "mostly", "must", "nearly", "neither", "no", "nor", "not", "obtained", "of", "often",
    "on", "our", "overall", "perhaps", "quite", "rather", "really", "regarding", "seem", "seen",
    "several", "should", "show", "showed", "shown", "shows", "significantly", "since", "so",
    "some", "such", "than", "that", "the", "their", "theirs", "them", "then", "there",
    "therefore", "these", "they", "this", "those", "through", "thus", "to", "upon", "use",
    "used", "using", "various", "very", "was", "we", "were", "what", "when", "which", "while",
    "with", "within", "without", "would",
];

/// Set of words that are not indexed but still occupy a position.
#[derive(Debug, Clone)]
pub struct StopWords {
    words: AHashSet<String>,
}

impl Default for StopWords {
    fn default() -> Self {
        Self::english()
    }
}

impl StopWords {
    /// The built-in English table.
    pub fn english() -> Self {
        Self::from_words(DEFAULT_STOP_WORDS.iter().copied())
    }

    /// An empty table; every word is indexed.
    pub fn none() -> Self {
        StopWords {
            words: AHashSet::new(),
        }
    }

    /// Build a table from arbitrary words, lower-casing them.
    pub fn from_words<'a, I: IntoIterator<Item = &'a str>>(words: I) -> Self {
        StopWords {
            words: words.into_iter().map(|w| w.trim().to_lowercase()).collect(),
        }
    }

    /// Load a table with one word per line; blank lines and `#` comments are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_words(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        ))
    }

    /// Check whether a lower-case word is a stop word.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
