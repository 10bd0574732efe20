//! Explicit mapping between field maps and typed records.
//!
//! There is no runtime reflection: a type declares the fields it reads
//! (`Record::FIELDS`) and how to convert from and to a [`FieldMap`]. The
//! `#[derive(Record)]` macro generates this mapping.

use crate::error::{Error, Result};
use crate::value::{FieldMap, Value};

/// Read access to the fields of a single record.
///
/// Handed to compute rules; implemented by record collections.
pub trait FieldReader {
    /// Name of the model the record belongs to.
    fn model_name(&self) -> &str;

    /// Id of the record, if bound to one.
    fn record_id(&self) -> Option<i64>;

    /// Raw value of a field. Relation fields yield their ids.
    fn read(&self, field: &str) -> Result<Value>;
}

/// Conversion from a [`Value`] into a Rust type.
pub trait FromValue: Sized {
    /// Convert, describing the expected type on failure.
    fn from_value(value: &Value) -> std::result::Result<Self, String>;
}

fn mismatch(expected: &str, found: &Value) -> String {
    format!("expected {expected}, found {}", found.type_name())
}

impl FromValue for Value {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        value.as_bool().ok_or_else(|| mismatch("BOOLEAN", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        value
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| mismatch("INTEGER", value))
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        value.as_i64().ok_or_else(|| mismatch("BIGINT", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        value.as_f64().ok_or_else(|| mismatch("DOUBLE", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("TEXT", value))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch("BYTES", value))
    }
}

impl FromValue for Vec<i64> {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        value.as_ids().ok_or_else(|| mismatch("id list", value))
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            other => Err(mismatch("JSON", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

/// Read one field out of a map for generated `Record` impls.
///
/// A missing key reads as NULL, so `Option` fields tolerate partial maps.
pub fn take_field<T: FromValue>(map: &FieldMap, field: &str) -> Result<T> {
    let value = map.get(field).unwrap_or(&Value::Null);
    T::from_value(value).map_err(|reason| Error::Marshal {
        field: field.to_string(),
        reason,
    })
}

/// A typed record with an explicit field mapping.
pub trait Record: Sized {
    /// Field names (or columns) this type reads, in declaration order.
    const FIELDS: &'static [&'static str];

    /// Build the record from a cached field map.
    fn from_field_map(map: &FieldMap) -> Result<Self>;

    /// Convert the record into a field map for writes.
    fn to_field_map(&self) -> FieldMap;
}

/// Input of create and update operations.
///
/// Both variants are normalized to a [`FieldMap`] at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw field-name to value map.
    Map(FieldMap),
    /// Map produced by a typed record adapter.
    Record(FieldMap),
}

impl Payload {
    /// Build a payload from a typed record.
    pub fn from_record<R: Record>(record: &R) -> Self {
        Payload::Record(record.to_field_map())
    }

    /// Whether the payload came from a raw map.
    pub fn is_map(&self) -> bool {
        matches!(self, Payload::Map(_))
    }

    /// Normalize into a field map.
    pub fn into_field_map(self) -> FieldMap {
        match self {
            Payload::Map(map) | Payload::Record(map) => map,
        }
    }
}

impl From<FieldMap> for Payload {
    fn from(map: FieldMap) -> Self {
        Payload::Map(map)
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Payload {
    fn from(pairs: [(K, V); N]) -> Self {
        Payload::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
