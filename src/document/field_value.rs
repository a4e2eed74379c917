//! Field values and their conversion to and from JSON.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};

use crate::error::{QuarryError, Result};
use crate::schema::FieldType;

/// A single value of a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Keyword(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Binary(Vec<u8>),
    GeoPoint { lat: f64, lon: f64 },
    Null,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Keyword(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Keyword(_) => "keyword",
            FieldValue::Number(_) => "number",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Date(_) => "date",
            FieldValue::Binary(_) => "binary",
            FieldValue::GeoPoint { .. } => "geo_point",
            FieldValue::Null => "null",
        }
    }

    /// The field type this value implies when nothing declares one.
    pub fn inferred_type(&self) -> Option<FieldType> {
        match self {
            FieldValue::Text(_) => Some(FieldType::Text),
            FieldValue::Keyword(_) => Some(FieldType::Keyword),
            FieldValue::Number(_) => Some(FieldType::Number),
            FieldValue::Boolean(_) => Some(FieldType::Boolean),
            FieldValue::Date(_) => Some(FieldType::Date),
            FieldValue::Binary(_) => Some(FieldType::Binary),
            FieldValue::GeoPoint { .. } => Some(FieldType::GeoPoint),
            FieldValue::Null => None,
        }
    }

    /// Convert this value to the representation of `field_type`.
    ///
    /// Strings convert to Text, Keyword and Date (RFC 3339, `YYYY-MM-DD`
    /// or `YYYY-MM-DDTHH:MM:SS`); integral numbers convert to Date as epoch
    /// milliseconds. Anything else must already have the right kind.
    pub fn coerce(self, field: &str, field_type: FieldType) -> Result<FieldValue> {
        let mismatch =
            |value: &FieldValue| QuarryError::field_type_mismatch(field, field_type.name(), value.describe());

        let coerced = match (field_type, self) {
            (FieldType::Text, FieldValue::Text(s) | FieldValue::Keyword(s)) => FieldValue::Text(s),
            (FieldType::Keyword, FieldValue::Text(s) | FieldValue::Keyword(s)) => {
                FieldValue::Keyword(s)
            }
            (FieldType::Number, FieldValue::Number(n)) if n.is_finite() => FieldValue::Number(n),
            (FieldType::Boolean, FieldValue::Boolean(b)) => FieldValue::Boolean(b),
            (FieldType::Date, FieldValue::Date(d)) => FieldValue::Date(d),
            (FieldType::Date, FieldValue::Text(s) | FieldValue::Keyword(s)) => {
                match parse_date(&s) {
                    Some(d) => FieldValue::Date(d),
                    None => return Err(mismatch(&FieldValue::Text(s))),
                }
            }
            (FieldType::Date, FieldValue::Number(n)) => {
                match date_from_millis(n) {
                    Some(d) => FieldValue::Date(d),
                    None => return Err(mismatch(&FieldValue::Number(n))),
                }
            }
            (FieldType::Binary, FieldValue::Binary(b)) => FieldValue::Binary(b),
            (FieldType::GeoPoint, FieldValue::GeoPoint { lat, lon }) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(QuarryError::field_type_mismatch(
                        field,
                        "geo_point with lat in [-90, 90] and lon in [-180, 180]",
                        format!("{{lat: {lat}, lon: {lon}}}"),
                    ));
                }
                FieldValue::GeoPoint { lat, lon }
            }
            (_, value) => return Err(mismatch(&value)),
        };
        Ok(coerced)
    }

    /// A short rendering of the value for error messages.
    pub fn describe(&self) -> String {
        match self {
            FieldValue::Text(s) | FieldValue::Keyword(s) => {
                let mut shown: String = s.chars().take(32).collect();
                if shown.len() < s.len() {
                    shown.push_str("...");
                }
                format!("{} \"{shown}\"", self.kind_name())
            }
            FieldValue::Number(n) => format!("number {n}"),
            FieldValue::Boolean(b) => format!("boolean {b}"),
            FieldValue::Date(d) => format!("date {}", d.to_rfc3339()),
            FieldValue::Binary(b) => format!("binary ({} bytes)", b.len()),
            FieldValue::GeoPoint { lat, lon } => format!("geo_point ({lat}, {lon})"),
            FieldValue::Null => "null".to_string(),
        }
    }

    /// Convert a JSON value into field values. Arrays yield one value per
    /// element, objects with `lat` and `lon` yield a GeoPoint, strings
    /// yield Text.
    pub fn from_json(field: &str, value: &Value) -> Result<Vec<FieldValue>> {
        match value {
            Value::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    if item.is_array() {
                        return Err(QuarryError::field_type_mismatch(
                            field,
                            "scalar or array of scalars",
                            "nested array",
                        ));
                    }
                    values.extend(Self::from_json(field, item)?);
                }
                Ok(values)
            }
            Value::Null => Ok(Vec::new()),
            scalar => Ok(vec![Self::from_json_scalar(field, scalar)?]),
        }
    }

    fn from_json_scalar(field: &str, value: &Value) -> Result<FieldValue> {
        match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number).ok_or_else(|| {
                QuarryError::field_type_mismatch(field, "number", n.to_string())
            }),
            Value::Object(map) => match (
                map.get("lat").and_then(Value::as_f64),
                map.get("lon").and_then(Value::as_f64),
            ) {
                (Some(lat), Some(lon)) if map.len() == 2 => Ok(FieldValue::GeoPoint { lat, lon }),
                _ => Err(QuarryError::field_type_mismatch(
                    field,
                    "object with numeric 'lat' and 'lon'",
                    Value::Object(map.clone()).to_string(),
                )),
            },
            Value::Null => Ok(FieldValue::Null),
            Value::Array(_) => Err(QuarryError::field_type_mismatch(
                field,
                "scalar",
                "array",
            )),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) | FieldValue::Keyword(s) => Value::String(s.clone()),
            FieldValue::Number(n) => number_to_json(*n),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Date(d) => Value::String(d.to_rfc3339()),
            FieldValue::Binary(bytes) => {
                Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
            }
            FieldValue::GeoPoint { lat, lon } => {
                let mut map = Map::new();
                map.insert("lat".to_string(), number_to_json(*lat));
                map.insert("lon".to_string(), number_to_json(*lon));
                Value::Object(map)
            }
            FieldValue::Null => Value::Null,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Binary(value)
    }
}

/// Render a number as a JSON integer when it is integral and in range.
pub fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Parse RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(d.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

/// Epoch milliseconds to a date; the number must be integral.
pub fn date_from_millis(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() || n.fract() != 0.0 || n.abs() > 8.64e15 {
        return None;
    }
    DateTime::from_timestamp_millis(n as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce() {
        let v = FieldValue::from("2024-03-05").coerce("d", FieldType::Date).unwrap();
        assert_eq!(v.as_date().unwrap().to_rfc3339(), "2024-03-05T00:00:00+00:00");

        let v = FieldValue::from(0i64).coerce("d", FieldType::Date).unwrap();
        assert_eq!(v.as_date().unwrap().timestamp(), 0);

        let v = FieldValue::from("ACME").coerce("brand", FieldType::Keyword).unwrap();
        assert_eq!(v, FieldValue::Keyword("ACME".to_string()));

        let err = FieldValue::from("cheap").coerce("price", FieldType::Number).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field type mismatch for 'price': expected number, found text \"cheap\""
        );
        assert!(FieldValue::from(f64::NAN).coerce("p", FieldType::Number).is_err());
        assert!(
            FieldValue::GeoPoint { lat: 91.0, lon: 0.0 }
                .coerce("loc", FieldType::GeoPoint)
                .is_err()
        );
    }

    #[test]
    fn test_from_json() {
        let values = FieldValue::from_json("tags", &json!(["a", "b"])).unwrap();
        assert_eq!(values.len(), 2);

        let values = FieldValue::from_json("loc", &json!({"lat": 1.5, "lon": 2.0})).unwrap();
        assert_eq!(values, vec![FieldValue::GeoPoint { lat: 1.5, lon: 2.0 }]);

        assert!(FieldValue::from_json("x", &json!({"a": 1})).is_err());
        assert!(FieldValue::from_json("x", &json!([[1]])).is_err());
        assert!(FieldValue::from_json("x", &json!(null)).unwrap().is_empty());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(FieldValue::Number(10.0).to_json(), json!(10));
        assert_eq!(FieldValue::Number(9.99).to_json(), json!(9.99));
        assert_eq!(
            FieldValue::GeoPoint { lat: 1.0, lon: 2.5 }.to_json(),
            json!({"lat": 1, "lon": 2.5})
        );
    }
}
