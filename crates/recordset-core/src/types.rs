//! SQL type descriptors and value coercion.

use crate::value::Value;

/// The storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlType {
    /// BOOLEAN
    Boolean,
    /// INTEGER (32-bit)
    Integer,
    /// BIGINT (64-bit); also the type of every id column
    #[default]
    BigInt,
    /// DOUBLE PRECISION
    Double,
    /// TEXT / VARCHAR
    Text,
    /// BLOB / BYTEA
    Bytes,
    /// JSON document
    Json,
}

impl SqlType {
    /// Get the SQL type name.
    #[must_use]
    pub const fn sql_name(&self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE",
            SqlType::Text => "TEXT",
            SqlType::Bytes => "BYTES",
            SqlType::Json => "JSON",
        }
    }

    /// The zero value returned for this type when reading an empty record set.
    #[must_use]
    pub fn zero_value(&self) -> Value {
        match self {
            SqlType::Boolean => Value::Bool(false),
            SqlType::Integer => Value::Int(0),
            SqlType::BigInt => Value::BigInt(0),
            SqlType::Double => Value::Double(0.0),
            SqlType::Text => Value::Text(String::new()),
            SqlType::Bytes => Value::Bytes(Vec::new()),
            SqlType::Json => Value::Json(serde_json::Value::Null),
        }
    }

    /// Coerce `value` to this type.
    ///
    /// Lossless widenings (`Int` → `BigInt`, integers → `Double`) are applied;
    /// NULL passes through. Returns `None` when the value does not fit.
    #[must_use]
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (SqlType::Boolean, v @ Value::Bool(_)) => Some(v),
            (SqlType::Integer, v @ Value::Int(_)) => Some(v),
            (SqlType::Integer, Value::BigInt(i)) => i32::try_from(i).ok().map(Value::Int),
            (SqlType::BigInt, Value::Int(i)) => Some(Value::BigInt(i64::from(i))),
            (SqlType::BigInt, v @ Value::BigInt(_)) => Some(v),
            (SqlType::Double, Value::Int(i)) => Some(Value::Double(f64::from(i))),
            (SqlType::Double, Value::BigInt(i)) => Some(Value::Double(i as f64)),
            (SqlType::Double, v @ Value::Double(_)) => Some(v),
            (SqlType::Text, v @ Value::Text(_)) => Some(v),
            (SqlType::Bytes, v @ Value::Bytes(_)) => Some(v),
            (SqlType::Json, v @ Value::Json(_)) => Some(v),
            (SqlType::Json, Value::Text(s)) => serde_json::from_str(&s).ok().map(Value::Json),
            _ => None,
        }
    }
}
