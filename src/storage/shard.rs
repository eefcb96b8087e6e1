//! Prefix-trie sharding.
//!
//! A shard key is a short prefix of a normalized term. Terms sharing a key
//! live in the same term list / master index / postings triplet, and the key
//! also decides the directory the triplet lives in, which bounds how many
//! files any single directory holds. This module is the only place that
//! knows the mapping; the builder, inverter, store and link resolver all
//! call into it.

use crate::analysis::analyzer::pad_numeric;

/// Key length for ordinary terms.
pub const TERM_KEY_LEN: usize = 2;

/// Key length for terms starting with a heavily populated two-letter prefix.
pub const HOT_KEY_LEN: usize = 3;

/// Key length for zero-padded numeric terms.
pub const NUMERIC_KEY_LEN: usize = 6;

/// Two-letter prefixes common enough in English scientific text to deserve a
/// deeper split.
const HOT_PREFIXES: &[&str] = &[
    "an", "ca", "ch", "co", "de", "di", "en", "ex", "hy", "im", "in", "ma", "me", "mi", "pa",
    "ph", "pr", "re", "se", "st", "tr",
];

fn key_char(c: char) -> char {
    if c.is_ascii_alphanumeric() {
        c.to_ascii_lowercase()
    } else {
        '_'
    }
}

fn mapped(term: &str) -> String {
    term.chars().map(key_char).collect()
}

fn is_numeric(term: &str) -> bool {
    !term.is_empty() && term.bytes().all(|b| b.is_ascii_digit())
}

/// Shard key of a normalized term.
pub fn shard_key(term: &str) -> String {
    if is_numeric(term) && term.len() >= NUMERIC_KEY_LEN {
        return term[..NUMERIC_KEY_LEN].to_string();
    }

    let chars: Vec<char> = term.chars().map(key_char).collect();
    let mut len = TERM_KEY_LEN;
    if chars.len() >= HOT_KEY_LEN {
        let head: String = chars[..TERM_KEY_LEN].iter().collect();
        if HOT_PREFIXES.contains(&head.as_str()) {
            len = HOT_KEY_LEN;
        }
    }

    let mut key: String = chars.into_iter().take(len).collect();
    while key.chars().count() < TERM_KEY_LEN {
        key.push('_');
    }
    key
}

/// Shard key of a document identifier stored as a numeric term.
pub fn uid_key(uid: u32) -> String {
    shard_key(&pad_numeric(&uid.to_string()))
}

/// Directory, relative to the field directory, holding a key's triplet.
pub fn shard_dir(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "_".to_string(),
        1 | 2 => chars[0].to_string(),
        3 => format!("{}/{}{}", chars[0], chars[0], chars[1]),
        _ => format!(
            "{}{}/{}{}",
            chars[0], chars[1], chars[2], chars[3]
        ),
    }
}

/// The single shard every term starting with `prefix` maps to, if the
/// prefix is long enough to decide it.
pub fn fixed_key(prefix: &str) -> Option<String> {
    if is_numeric(prefix) && prefix.len() >= NUMERIC_KEY_LEN {
        return Some(prefix[..NUMERIC_KEY_LEN].to_string());
    }

    let m = mapped(prefix);
    let count = m.chars().count();
    if count >= HOT_KEY_LEN || (count == TERM_KEY_LEN && !HOT_PREFIXES.contains(&m.as_str())) {
        // A numeric-looking prefix of this length still spans alphanumeric keys.
        if is_numeric(prefix) {
            return None;
        }
        Some(shard_key(prefix))
    } else {
        None
    }
}

/// Whether a shard may hold terms starting with `prefix`.
pub fn key_may_contain(key: &str, prefix: &str) -> bool {
    let m = mapped(prefix);
    key.starts_with(&m) || m.starts_with(key.trim_end_matches('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_key() {
        assert_eq!(shard_key("tn3"), "tn");
        assert_eq!(shard_key("transposition"), "tra");
        assert_eq!(shard_key("tr"), "tr");
        assert_eq!(shard_key("a"), "a_");
        assert_eq!(shard_key("nature genetics"), "na");
        assert_eq!(shard_key("o brien"), "o_");
        assert_eq!(shard_key("00002020"), "000020");
        assert_eq!(shard_key("müller"), "m_");
    }

    #[test]
    fn test_uid_key_groups_neighbors() {
        assert_eq!(uid_key(2539356), "025393");
        assert_eq!(uid_key(2539399), uid_key(2539300));
        assert_ne!(uid_key(2539400), uid_key(2539399));
    }

    #[test]
    fn test_shard_dir_depth() {
        assert_eq!(shard_dir("tn"), "t");
        assert_eq!(shard_dir("tra"), "t/tr");
        assert_eq!(shard_dir("025393"), "02/53");
    }

    #[test]
    fn test_fixed_key() {
        assert_eq!(fixed_key("transpos"), Some("tra".to_string()));
        assert_eq!(fixed_key("tn"), Some("tn".to_string()));
        assert_eq!(fixed_key("tr"), None);
        assert_eq!(fixed_key("t"), None);
        assert_eq!(fixed_key("000020"), Some("000020".to_string()));
        assert_eq!(fixed_key("199"), None);
    }

    #[test]
    fn test_key_may_contain() {
        assert!(key_may_contain("tra", "t"));
        assert!(key_may_contain("tr", "tr"));
        assert!(key_may_contain("a_", "a"));
        assert!(!key_may_contain("tn", "tr"));
    }
}
