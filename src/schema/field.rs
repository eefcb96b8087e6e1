//! Field definitions.

use serde::{Deserialize, Serialize};

/// How the values of a field are turned into terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text: tokenized, stop words removed, positions recorded.
    Text,
    /// Each value is one exact term (journal, author, tree number, DOI).
    Term,
    /// Digit runs, zero-padded so that lexicographic order is numeric order.
    Numeric,
}

/// Which values of a multi-valued source field are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    #[default]
    All,
    First,
    Last,
}

/// Definition of one indexed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Upper-case field name, also the postings directory name.
    pub name: String,

    /// Value handling.
    pub kind: FieldKind,

    /// Apply the stemmer to surviving text tokens.
    #[serde(default)]
    pub stem: bool,

    /// Source document fields, in indexing order. Empty means the field's own name.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Which values of the sources are used.
    #[serde(default)]
    pub select: Selection,
}

impl FieldDefinition {
    /// Create a field of the given kind that reads its own name from documents.
    pub fn new<S: Into<String>>(name: S, kind: FieldKind) -> Self {
        FieldDefinition {
            name: name.into().to_ascii_uppercase(),
            kind,
            stem: false,
            sources: Vec::new(),
            select: Selection::All,
        }
    }

    /// Enable stemming.
    pub fn stemmed(mut self) -> Self {
        self.stem = true;
        self
    }

    /// Read values from the given source fields instead of the field's own name.
    pub fn from_sources(mut self, sources: &[&str]) -> Self {
        self.sources = sources.iter().map(|s| s.to_ascii_uppercase()).collect();
        self
    }

    /// Restrict indexing to the first or last value.
    pub fn selecting(mut self, select: Selection) -> Self {
        self.select = select;
        self
    }

    /// Whether postings for this field carry word positions.
    pub fn is_positional(&self) -> bool {
        self.kind == FieldKind::Text
    }

    /// Source fields, falling back to the field's own name.
    pub fn source_names(&self) -> Vec<&str> {
        if self.sources.is_empty() {
            vec![self.name.as_str()]
        } else {
            self.sources.iter().map(String::as_str).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_definition_builders() {
        let field = FieldDefinition::new("tiab", FieldKind::Text).from_sources(&["titl", "abst"]);
        assert_eq!(field.name, "TIAB");
        assert!(field.is_positional());
        assert_eq!(field.source_names(), vec!["TITL", "ABST"]);

        let field = FieldDefinition::new("JOUR", FieldKind::Term);
        assert!(!field.is_positional());
        assert_eq!(field.source_names(), vec!["JOUR"]);
    }

    #[test]
    fn test_field_definition_json() {
        let json = r#"{"name":"FAUT","kind":"term","sources":["AUTH"],"select":"first"}"#;
        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.kind, FieldKind::Term);
        assert_eq!(field.select, Selection::First);
        assert!(!field.stem);
    }
}
