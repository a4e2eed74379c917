//! Documents and the builder that validates them.
//!
//! # Examples
//!
//! ```
//! use quarry::document::Document;
//! use quarry::schema::FieldType;
//!
//! let doc = Document::builder()
//!     .id("1")
//!     .field("title", "Wireless Bluetooth Headphones", FieldType::Text)
//!     .field("price", 59.0, FieldType::Number)
//!     .boost(1.5)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(doc.id(), "1");
//! assert_eq!(doc.get("price").and_then(|v| v.as_number()), Some(59.0));
//! ```

pub mod field_value;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{QuarryError, Result};
use crate::schema::FieldType;

pub use field_value::FieldValue;

/// The values of one document field.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentField {
    /// Declared by the builder; `None` for values that came from JSON and
    /// take their type from the schema.
    pub field_type: Option<FieldType>,
    pub values: Vec<FieldValue>,
}

/// A document: an id, named field values and a score boost.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: String,
    fields: BTreeMap<String, DocumentField>,
    boost: f32,
}

impl Document {
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Build a document from a JSON object of field values.
    pub fn from_json<S: Into<String>>(id: S, fields: &Value, boost: Option<f32>) -> Result<Self> {
        let object = fields.as_object().ok_or_else(|| {
            QuarryError::invalid_argument("document fields must be a JSON object")
        })?;

        let mut builder = DocumentBuilder::new().id(id);
        if let Some(boost) = boost {
            builder = builder.boost(boost);
        }
        for (name, value) in object {
            for v in FieldValue::from_json(name, value)? {
                builder = builder.untyped(name.as_str(), v);
            }
        }
        builder.build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    /// The first value of a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(|f| f.values.first())
    }

    /// All values of a field.
    pub fn values(&self, name: &str) -> &[FieldValue] {
        self.fields
            .get(name)
            .map(|f| f.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn field(&self, name: &str) -> Option<&DocumentField> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &DocumentField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_parts(self) -> (String, BTreeMap<String, DocumentField>, f32) {
        (self.id, self.fields, self.boost)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The fields as a JSON object; single values unwrapped, multiple
    /// values as arrays.
    pub fn fields_to_json(&self) -> Value {
        fields_to_json(self.fields.iter().map(|(k, f)| (k.as_str(), f.values.as_slice())))
    }
}

/// Render named value lists as a JSON object.
pub fn fields_to_json<'a, I>(fields: I) -> Value
where
    I: IntoIterator<Item = (&'a str, &'a [FieldValue])>,
{
    let mut map = Map::new();
    for (name, values) in fields {
        let value = match values {
            [single] => single.to_json(),
            many => Value::Array(many.iter().map(FieldValue::to_json).collect()),
        };
        map.insert(name.to_string(), value);
    }
    Value::Object(map)
}

/// Stepwise document construction. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    id: Option<String>,
    fields: Vec<(String, Option<FieldType>, FieldValue)>,
    boost: Option<f32>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a value of the given type. Calling this repeatedly with the same
    /// name makes the field multi-valued.
    pub fn field<S, V>(mut self, name: S, value: V, field_type: FieldType) -> Self
    where
        S: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields
            .push((name.into(), Some(field_type), value.into()));
        self
    }

    /// Add a value whose type the index schema decides.
    pub fn untyped<S: Into<String>, V: Into<FieldValue>>(mut self, name: S, value: V) -> Self {
        self.fields.push((name.into(), None, value.into()));
        self
    }

    pub fn text<S: Into<String>, T: Into<String>>(self, name: S, value: T) -> Self {
        self.field(name, FieldValue::Text(value.into()), FieldType::Text)
    }

    pub fn keyword<S: Into<String>, T: Into<String>>(self, name: S, value: T) -> Self {
        self.field(name, FieldValue::Keyword(value.into()), FieldType::Keyword)
    }

    pub fn number<S: Into<String>>(self, name: S, value: f64) -> Self {
        self.field(name, value, FieldType::Number)
    }

    pub fn boolean<S: Into<String>>(self, name: S, value: bool) -> Self {
        self.field(name, value, FieldType::Boolean)
    }

    pub fn date<S: Into<String>, V: Into<FieldValue>>(self, name: S, value: V) -> Self {
        self.field(name, value, FieldType::Date)
    }

    pub fn geo_point<S: Into<String>>(self, name: S, lat: f64, lon: f64) -> Self {
        self.field(name, FieldValue::GeoPoint { lat, lon }, FieldType::GeoPoint)
    }

    pub fn binary<S: Into<String>>(self, name: S, value: Vec<u8>) -> Self {
        self.field(name, value, FieldType::Binary)
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Validate and build the document.
    ///
    /// Fails when the id is missing or empty, the boost is negative or not
    /// finite, a value does not convert to its declared type, or one field
    /// is given two different types.
    pub fn build(self) -> Result<Document> {
        let id = match self.id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(QuarryError::invalid_argument("document id is required")),
        };

        let boost = self.boost.unwrap_or(1.0);
        if !boost.is_finite() || boost < 0.0 {
            return Err(QuarryError::invalid_argument(format!(
                "document boost must be a finite number >= 0, got {boost}"
            )));
        }

        let mut fields: BTreeMap<String, DocumentField> = BTreeMap::new();
        for (name, field_type, value) in self.fields {
            if name.is_empty() {
                return Err(QuarryError::invalid_argument("field name must not be empty"));
            }
            if value.is_null() {
                continue;
            }
            let value = match field_type {
                Some(t) => value.coerce(&name, t)?,
                None => value,
            };

            let entry = fields.entry(name.clone()).or_insert(DocumentField {
                field_type,
                values: Vec::new(),
            });
            match (entry.field_type, field_type) {
                (Some(a), Some(b)) if a != b => {
                    return Err(QuarryError::field_type_mismatch(name, a.name(), b.name()));
                }
                (None, Some(b)) => entry.field_type = Some(b),
                _ => {}
            }
            entry.values.push(value);
        }

        Ok(Document { id, fields, boost })
    }
}
