//! The set of fields an archive is indexed with.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BibdexError, Result};
use crate::schema::field::{FieldDefinition, FieldKind, Selection};

/// Ordered collection of field definitions plus the field unqualified query
/// phrases are searched in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    fields: Vec<FieldDefinition>,
    default_field: String,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::bibliographic()
    }
}

impl FieldSchema {
    /// Create a schema from definitions, validating names and the default field.
    pub fn new(fields: Vec<FieldDefinition>, default_field: &str) -> Result<Self> {
        let schema = FieldSchema {
            fields,
            default_field: default_field.to_ascii_uppercase(),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// The built-in schema for citation records.
    pub fn bibliographic() -> Self {
        FieldSchema {
            fields: vec![
                FieldDefinition::new("TIAB", FieldKind::Text).from_sources(&["TITL", "ABST"]),
                FieldDefinition::new("TITL", FieldKind::Text),
                FieldDefinition::new("STEM", FieldKind::Text)
                    .stemmed()
                    .from_sources(&["TITL", "ABST"]),
                FieldDefinition::new("YEAR", FieldKind::Numeric),
                FieldDefinition::new("JOUR", FieldKind::Term),
                FieldDefinition::new("PTYP", FieldKind::Term),
                FieldDefinition::new("DOI", FieldKind::Term),
                FieldDefinition::new("AUTH", FieldKind::Term),
                FieldDefinition::new("FAUT", FieldKind::Term)
                    .from_sources(&["AUTH"])
                    .selecting(Selection::First),
                FieldDefinition::new("LAUT", FieldKind::Term)
                    .from_sources(&["AUTH"])
                    .selecting(Selection::Last),
                FieldDefinition::new("TREE", FieldKind::Term),
                FieldDefinition::new("CODE", FieldKind::Term),
                FieldDefinition::new("CITED", FieldKind::Numeric),
                FieldDefinition::new("CITES", FieldKind::Numeric),
            ],
            default_field: "TIAB".to_string(),
        }
    }

    /// Load a schema from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            BibdexError::config(format!("cannot read schema {}: {e}", path.display()))
        })?;
        let mut schema: FieldSchema = serde_json::from_str(&text)
            .map_err(|e| BibdexError::config(format!("invalid schema {}: {e}", path.display())))?;
        schema.default_field = schema.default_field.to_ascii_uppercase();
        for field in &mut schema.fields {
            field.name = field.name.to_ascii_uppercase();
        }
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<()> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() || !field.name.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(BibdexError::schema(format!(
                    "field name '{}' must be non-empty and alphanumeric",
                    field.name
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(BibdexError::schema(format!(
                    "field '{}' is defined twice",
                    field.name
                )));
            }
        }
        if self.get(&self.default_field).is_none() {
            return Err(BibdexError::schema(format!(
                "default field '{}' is not defined",
                self.default_field
            )));
        }
        Ok(())
    }

    /// Look up a field by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Look up a field or fail with a query error naming it.
    pub fn require(&self, name: &str) -> Result<&FieldDefinition> {
        self.get(name)
            .ok_or_else(|| BibdexError::query(format!("unknown field [{name}]")))
    }

    /// The field unqualified phrases are searched in.
    pub fn default_field(&self) -> &FieldDefinition {
        // validate() guarantees presence; fall back to the first field otherwise.
        self.get(&self.default_field).unwrap_or(&self.fields[0])
    }

    /// All fields in definition order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }
}
