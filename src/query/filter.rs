//! Field resolution and the stop-word / stemming pass.
//!
//! Every phrase gets its field resolved (the default field when it has no
//! qualifier). Phrases in free-text fields are then re-analyzed word by
//! word with the index-time rules: stop words become skip markers, stemmed
//! fields are stemmed, and words the tokenizer would split are split.

use crate::analysis::{FieldAnalyzer, PhraseToken};
use crate::error::Result;
use crate::query::partition::Part;
use crate::schema::{FieldDefinition, FieldKind, FieldSchema};

/// Qualifier resolved to MeSH headings through the alias tables.
pub const MESH_FIELD: &str = "MESH";

/// Qualifier substituted by the caller's piped identifier list.
pub const PIPE_FIELD: &str = "PIPE";

/// Short qualifiers accepted for common fields.
const FIELD_ALIASES: &[(&str, &str)] = &[
    ("AU", "AUTH"),
    ("TI", "TITL"),
    ("TA", "JOUR"),
    ("PT", "PTYP"),
    ("DP", "YEAR"),
    ("MH", MESH_FIELD),
];

/// What a qualifier refers to.
#[derive(Debug, Clone, Copy)]
pub enum FieldTarget<'a> {
    Field(&'a FieldDefinition),
    Mesh,
    Pipe,
}

impl FieldTarget<'_> {
    pub fn name(&self) -> &str {
        match self {
            FieldTarget::Field(field) => &field.name,
            FieldTarget::Mesh => MESH_FIELD,
            FieldTarget::Pipe => PIPE_FIELD,
        }
    }
}

/// Resolve a qualifier, or the default field when there is none.
pub fn resolve_field<'a>(schema: &'a FieldSchema, name: Option<&str>) -> Result<FieldTarget<'a>> {
    let Some(name) = name else {
        return Ok(FieldTarget::Field(schema.default_field()));
    };
    let name = FIELD_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map_or(name, |(_, field)| *field);

    if name.eq_ignore_ascii_case(MESH_FIELD) {
        Ok(FieldTarget::Mesh)
    } else if name.eq_ignore_ascii_case(PIPE_FIELD) {
        Ok(FieldTarget::Pipe)
    } else {
        schema.require(name).map(FieldTarget::Field)
    }
}

/// Resolve every phrase's field and apply text analysis to free-text phrases.
pub fn apply_text_rules(
    parts: Vec<Part>,
    schema: &FieldSchema,
    analyzer: &FieldAnalyzer,
) -> Result<Vec<Part>> {
    parts
        .into_iter()
        .map(|part| {
            let Part::Phrase(mut phrase) = part else {
                return Ok(part);
            };
            let target = resolve_field(schema, phrase.field.as_deref())?;
            if let FieldTarget::Field(field) = target {
                if field.kind == FieldKind::Text {
                    phrase.words = phrase
                        .words
                        .into_iter()
                        .flat_map(|word| match word {
                            PhraseToken::Word(word) => analyzer.query_word(field, &word),
                            PhraseToken::Skip => vec![PhraseToken::Skip],
                        })
                        .collect();
                }
            }
            phrase.field = Some(target.name().to_string());
            Ok(Part::Phrase(phrase))
        })
        .collect()
}
