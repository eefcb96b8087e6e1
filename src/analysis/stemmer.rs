//! Porter stemming.
//!
//! Works on lower-case ASCII words; anything else is returned unchanged so
//! that index-time and query-time forms of non-ASCII tokens still agree.
//!
//! # Examples
//!
//! ```
//! use bibdex::analysis::stemmer::{PorterStemmer, Stemmer};
//!
//! let stemmer = PorterStemmer::new();
//! assert_eq!(stemmer.stem("hopping"), "hop");
//! assert_eq!(stemmer.stem("relational"), "relat");
//! ```

/// Trait for stemming algorithms.
pub trait Stemmer: Send + Sync + std::fmt::Debug {
    /// Stem a word to its root form.
    fn stem(&self, word: &str) -> String;

    /// Get the name of this stemmer.
    fn name(&self) -> &'static str;
}

/// The classic five-step Porter algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    /// Create a new Porter stemmer.
    pub fn new() -> Self {
        PorterStemmer
    }
}

fn is_consonant(word: &[u8], i: usize) -> bool {
    match word[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(word, i - 1),
        _ => true,
    }
}

/// Number of vowel-consonant sequences in the word.
fn measure(word: &[u8]) -> usize {
    let n = word.len();
    let mut i = 0;
    while i < n && is_consonant(word, i) {
        i += 1;
    }

    let mut m = 0;
    while i < n {
        while i < n && !is_consonant(word, i) {
            i += 1;
        }
        if i >= n {
            break;
        }
        m += 1;
        while i < n && is_consonant(word, i) {
            i += 1;
        }
    }
    m
}

fn has_vowel(word: &[u8]) -> bool {
    (0..word.len()).any(|i| !is_consonant(word, i))
}

fn ends_double_consonant(word: &[u8]) -> bool {
    let n = word.len();
    n >= 2 && word[n - 1] == word[n - 2] && is_consonant(word, n - 1)
}

/// Consonant-vowel-consonant ending where the last consonant is not w, x or y.
fn ends_cvc(word: &[u8]) -> bool {
    let n = word.len();
    n >= 3
        && is_consonant(word, n - 3)
        && !is_consonant(word, n - 2)
        && is_consonant(word, n - 1)
        && !matches!(word[n - 1], b'w' | b'x' | b'y')
}

/// Replace `suffix` when the remaining stem has a measure above `min_measure`.
/// Returns `None` when the suffix is absent, so callers stop at the first match.
fn replace(word: &mut Vec<u8>, suffix: &str, replacement: &str, min_measure: usize) -> Option<()> {
    if !word.ends_with(suffix.as_bytes()) {
        return None;
    }
    let stem_len = word.len() - suffix.len();
    if measure(&word[..stem_len]) > min_measure {
        word.truncate(stem_len);
        word.extend_from_slice(replacement.as_bytes());
    }
    Some(())
}

fn step1a(word: &mut Vec<u8>) {
    if word.ends_with(b"sses") || word.ends_with(b"ies") {
        word.truncate(word.len() - 2);
    } else if word.ends_with(b"s") && !word.ends_with(b"ss") {
        word.pop();
    }
}

fn step1b(word: &mut Vec<u8>) {
    if word.ends_with(b"eed") {
        if measure(&word[..word.len() - 3]) > 0 {
            word.pop();
        }
        return;
    }

    let stripped = if word.ends_with(b"ed") && has_vowel(&word[..word.len() - 2]) {
        word.truncate(word.len() - 2);
        true
    } else if word.ends_with(b"ing") && has_vowel(&word[..word.len() - 3]) {
        word.truncate(word.len() - 3);
        true
    } else {
        false
    };

    if !stripped {
        return;
    }

    if word.ends_with(b"at") || word.ends_with(b"bl") || word.ends_with(b"iz") {
        word.push(b'e');
    } else if ends_double_consonant(word) && !matches!(word[word.len() - 1], b'l' | b's' | b'z')
    {
        word.pop();
    } else if measure(word) == 1 && ends_cvc(word) {
        word.push(b'e');
    }
}

fn step1c(word: &mut [u8]) {
    let n = word.len();
    if n > 1 && word[n - 1] == b'y' && has_vowel(&word[..n - 1]) {
        word[n - 1] = b'i';
    }
}

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

fn step4(word: &mut Vec<u8>) {
    for suffix in STEP4 {
        if !word.ends_with(suffix.as_bytes()) {
            continue;
        }
        let stem_len = word.len() - suffix.len();
        let stem = &word[..stem_len];
        let ion_ok = *suffix != "ion" || stem.ends_with(b"s") || stem.ends_with(b"t");
        if measure(stem) > 1 && ion_ok {
            word.truncate(stem_len);
        }
        return;
    }
}

fn step5(word: &mut Vec<u8>) {
    if word.ends_with(b"e") {
        let stem = &word[..word.len() - 1];
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            word.pop();
        }
    }
    if word.ends_with(b"ll") && measure(word) > 1 {
        word.pop();
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word.to_string();
        }

        let mut bytes = word.as_bytes().to_vec();
        step1a(&mut bytes);
        step1b(&mut bytes);
        step1c(&mut bytes);
        for (suffix, replacement) in STEP2 {
            if replace(&mut bytes, suffix, replacement, 0).is_some() {
                break;
            }
        }
        for (suffix, replacement) in STEP3 {
            if replace(&mut bytes, suffix, replacement, 0).is_some() {
                break;
            }
        }
        step4(&mut bytes);
        step5(&mut bytes);

        // Only ASCII bytes were removed or appended.
        String::from_utf8(bytes).unwrap_or_else(|_| word.to_string())
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_porter_stemmer() {
        let stemmer = PorterStemmer::new();

        assert_eq!(stemmer.stem("caresses"), "caress");
        assert_eq!(stemmer.stem("ponies"), "poni");
        assert_eq!(stemmer.stem("cats"), "cat");
        assert_eq!(stemmer.stem("hopping"), "hop");
        assert_eq!(stemmer.stem("filing"), "file");
        assert_eq!(stemmer.stem("motoring"), "motor");
        assert_eq!(stemmer.stem("relational"), "relat");
        assert_eq!(stemmer.stem("generalization"), "gener");
        assert_eq!(stemmer.stem("transposition"), "transposit");
    }

    #[test]
    fn test_short_and_non_ascii_words_pass_through() {
        let stemmer = PorterStemmer::new();
        assert_eq!(stemmer.stem("is"), "is");
        assert_eq!(stemmer.stem("tn3"), "tn3");
        assert_eq!(stemmer.stem("naïve"), "naïve");
    }

    #[test]
    fn test_porter_measure() {
        assert_eq!(measure(b"tree"), 0);
        assert_eq!(measure(b"trees"), 1);
        assert_eq!(measure(b"trouble"), 1);
        assert_eq!(measure(b"troubles"), 2);
    }
}
