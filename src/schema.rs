//! Field schema: the declared fields of an index and their type and
//! indexing policy.
//!
//! GeoPoint fields that are indexed expose two numeric virtual fields,
//! `<name>.lat` and `<name>.lon`, usable in range queries, sorts and
//! numeric facets.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, Result};

/// Type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Analyzed into tokens.
    Text,
    /// Indexed verbatim as a single case-sensitive token.
    Keyword,
    Number,
    Boolean,
    Date,
    /// Stored only; never indexed.
    Binary,
    GeoPoint,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Binary => "binary",
            FieldType::GeoPoint => "geo_point",
        }
    }

    /// Whether values of this type live in the term dictionary.
    pub fn has_terms(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Keyword)
    }

    /// Whether values of this type get a sortable value column when indexed.
    pub fn has_column(&self) -> bool {
        matches!(
            self,
            FieldType::Keyword | FieldType::Number | FieldType::Boolean | FieldType::Date
        )
    }

    /// Whether values order numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Date)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn default_true() -> bool {
    true
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default = "default_true")]
    pub indexed: bool,
    #[serde(default = "default_true")]
    pub stored: bool,
    /// Analyzer for Text fields; the index default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
}

impl FieldEntry {
    pub fn new<S: Into<String>>(name: S, field_type: FieldType) -> Self {
        FieldEntry {
            name: name.into(),
            field_type,
            indexed: field_type != FieldType::Binary,
            stored: true,
            analyzer: None,
        }
    }

    pub fn text<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn keyword<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldType::Keyword)
    }

    pub fn number<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn date<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldType::Date)
    }

    pub fn binary<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldType::Binary)
    }

    pub fn geo_point<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldType::GeoPoint)
    }

    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    pub fn stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    pub fn with_analyzer<S: Into<String>>(mut self, analyzer: S) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }
}

/// Axis of a GeoPoint virtual field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoAxis {
    Lat,
    Lon,
}

impl GeoAxis {
    pub fn suffix(&self) -> &'static str {
        match self {
            GeoAxis::Lat => "lat",
            GeoAxis::Lon => "lon",
        }
    }
}

/// A field name resolved against the schema, including GeoPoint virtual
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField<'a> {
    /// The name queries and value columns use.
    pub name: String,
    pub field_type: FieldType,
    pub entry: &'a FieldEntry,
    pub geo_axis: Option<GeoAxis>,
}

impl ResolvedField<'_> {
    pub fn indexed(&self) -> bool {
        self.entry.indexed
    }

    /// Virtual fields are never stored on their own.
    pub fn stored(&self) -> bool {
        self.geo_axis.is_none() && self.entry.stored
    }
}

/// The set of fields declared for an index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    fields: BTreeMap<String, FieldEntry>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields<I: IntoIterator<Item = FieldEntry>>(fields: I) -> Result<Self> {
        let mut schema = Schema::new();
        for field in fields {
            schema.add_field(field)?;
        }
        Ok(schema)
    }

    pub fn add_field(&mut self, mut entry: FieldEntry) -> Result<()> {
        validate_field_name(&entry.name)?;
        if self.fields.contains_key(&entry.name) {
            return Err(QuarryError::invalid_argument(format!(
                "field '{}' is declared twice",
                entry.name
            )));
        }
        if entry.field_type == FieldType::Binary {
            entry.indexed = false;
        }
        if entry.field_type != FieldType::Text {
            entry.analyzer = None;
        }
        self.fields.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Resolve a field name, mapping `<geo>.lat` / `<geo>.lon` onto the
    /// numeric axes of an indexed GeoPoint field.
    pub fn resolve(&self, name: &str) -> Option<ResolvedField<'_>> {
        if let Some(entry) = self.fields.get(name) {
            return Some(ResolvedField {
                name: name.to_string(),
                field_type: entry.field_type,
                entry,
                geo_axis: None,
            });
        }

        let (parent, suffix) = name.rsplit_once('.')?;
        let axis = match suffix {
            "lat" => GeoAxis::Lat,
            "lon" => GeoAxis::Lon,
            _ => return None,
        };
        let entry = self.fields.get(parent)?;
        (entry.field_type == FieldType::GeoPoint).then(|| ResolvedField {
            name: name.to_string(),
            field_type: FieldType::Number,
            entry,
            geo_axis: Some(axis),
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldEntry> {
        self.fields.values()
    }

    /// Names of indexed Text fields, in name order.
    pub fn indexed_text_fields(&self) -> Vec<String> {
        self.fields
            .values()
            .filter(|f| f.indexed && f.field_type == FieldType::Text)
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn validate_field_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.ends_with('.')
        || name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ':' | '"' | '(' | ')' | '*' | '?' | '\\'));
    if invalid {
        return Err(QuarryError::invalid_argument(format!(
            "invalid field name '{name}'"
        )));
    }
    Ok(())
}
