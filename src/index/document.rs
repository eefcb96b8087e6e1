//! Source documents read from JSON lines.
//!
//! ```text
//! {"uid": 2539356, "fields": {"TITL": "...", "AUTH": ["Smith J", "Doe A"], "YEAR": 1985}}
//! ```

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BibdexError, Result};

/// A field value as it appears in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Flatten into string values, in order.
    pub fn values(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<String>) {
        match self {
            FieldValue::Text(text) => out.push(text.clone()),
            FieldValue::Number(number) => out.push(number.to_string()),
            FieldValue::List(items) => items.iter().for_each(|item| item.collect_into(out)),
        }
    }
}

fn deserialize_uid<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Uid {
        Number(u32),
        Text(String),
    }

    match Uid::deserialize(deserializer)? {
        Uid::Number(uid) => Ok(uid),
        Uid::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid uid '{text}'"))),
    }
}

/// One raw document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(deserialize_with = "deserialize_uid")]
    pub uid: u32,

    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl SourceDocument {
    pub fn new(uid: u32) -> Self {
        SourceDocument {
            uid,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter; names are stored upper-case.
    pub fn with_field<S: Into<String>>(mut self, name: &str, value: S) -> Self {
        self.fields
            .insert(name.to_ascii_uppercase(), FieldValue::Text(value.into()));
        self
    }

    /// Builder-style multi-valued field setter.
    pub fn with_values(mut self, name: &str, values: &[&str]) -> Self {
        let values = values
            .iter()
            .map(|v| FieldValue::Text(v.to_string()))
            .collect();
        self.fields
            .insert(name.to_ascii_uppercase(), FieldValue::List(values));
        self
    }

    /// Parse one JSON line.
    pub fn from_json(line: &str) -> Result<Self> {
        let mut document: SourceDocument = serde_json::from_str(line)?;
        document.fields = std::mem::take(&mut document.fields)
            .into_iter()
            .map(|(name, value)| (name.to_ascii_uppercase(), value))
            .collect();
        Ok(document)
    }

    /// All values of a source field, or none.
    pub fn values(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .map(FieldValue::values)
            .unwrap_or_default()
    }
}

/// Iterates the documents of a JSON-lines stream.
///
/// Blank lines are ignored. A malformed line is yielded as an error carrying
/// its line number; iteration continues after it.
pub struct DocumentReader<R> {
    reader: R,
    line_number: usize,
    buffer: String,
}

impl<R: BufRead> DocumentReader<R> {
    pub fn new(reader: R) -> Self {
        DocumentReader {
            reader,
            line_number: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for DocumentReader<R> {
    type Item = Result<SourceDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.buffer.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(SourceDocument::from_json(line).map_err(|e| {
                        BibdexError::format(format!("line {}: {e}", self.line_number))
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_document() {
        let doc = SourceDocument::from_json(
            r#"{"uid": "2539356", "fields": {"titl": "Tn3 transposition", "auth": ["Smith J", "Doe A"], "year": 1985}}"#,
        )
        .unwrap();
        assert_eq!(doc.uid, 2539356);
        assert_eq!(doc.values("TITL"), vec!["Tn3 transposition"]);
        assert_eq!(doc.values("AUTH"), vec!["Smith J", "Doe A"]);
        assert_eq!(doc.values("YEAR"), vec!["1985"]);
        assert!(doc.values("ABST").is_empty());
    }

    #[test]
    fn test_reader_skips_blank_and_reports_bad_lines() {
        let input = "{\"uid\": 1}\n\nnot json\n{\"uid\": 2, \"fields\": {}}\n";
        let results: Vec<_> = DocumentReader::new(Cursor::new(input)).collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().uid, 1);
        let err = results[1].as_ref().unwrap_err().to_string();
        assert!(err.contains("line 3"), "{err}");
        assert_eq!(results[2].as_ref().unwrap().uid, 2);
    }

    #[test]
    fn test_negative_uid_is_rejected() {
        assert!(SourceDocument::from_json(r#"{"uid": -4}"#).is_err());
    }
}
