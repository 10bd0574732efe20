//! Error types for recordset.
//!
//! Errors fall in three groups:
//!
//! - **misuse**: unknown model or field, singleton-only operation on a
//!   non-singleton, union across models, invalid marshaling target. These are
//!   contract violations reported with enough context (model, field,
//!   operation) to diagnose.
//! - **data shape**: a value that cannot be coerced to the declared field type,
//!   a field map that cannot be marshaled into a struct. Detected before I/O.
//! - **store**: the connection failed to execute a statement. Propagated as-is.

use thiserror::Error;

/// Result type alias for recordset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for all recordset operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The model name is not declared in the registry.
    #[error("unknown model `{model}`")]
    UnknownModel { model: String },

    /// The field (or field path) is not declared on the model.
    #[error("unknown field `{field}` in model `{model}`")]
    UnknownField { model: String, field: String },

    /// A singleton-only operation was called on a collection of another size.
    #[error("expected singleton of model `{model}`, got {len} record(s)")]
    NotSingleton { model: String, len: usize },

    /// Two collections of different models were combined.
    #[error("cannot combine record sets of different models `{left}` and `{right}`")]
    ModelMismatch { left: String, right: String },

    /// An operation that requires records was called on an empty collection.
    #[error("`{operation}` called on empty record set of model `{model}`")]
    EmptyRecordSet {
        model: String,
        operation: &'static str,
    },

    /// A marshaling target does not match the model.
    #[error("invalid target `{target}` for model `{model}`: {reason}")]
    InvalidTarget {
        model: String,
        target: &'static str,
        reason: String,
    },

    /// An unknown comparison operator.
    #[error("invalid operator `{0}`")]
    InvalidOperator(String),

    /// A malformed field, order or group expression.
    #[error("invalid expression `{expression}`: {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// The registry declaration is inconsistent.
    #[error("invalid registry definition for model `{model}`: {reason}")]
    InvalidRegistry { model: String, reason: String },

    /// A value cannot be coerced to the field's type.
    #[error("invalid value for `{model}.{field}`: expected {expected}, found {found}")]
    InvalidValue {
        model: String,
        field: String,
        expected: String,
        found: String,
    },

    /// A field map could not be converted into a typed record.
    #[error("cannot marshal field `{field}`: {reason}")]
    Marshal { field: String, reason: String },

    /// The store failed to execute a statement.
    #[error("store error: {message}")]
    Store {
        message: String,
        sql: Option<String>,
    },
}

impl Error {
    /// Build a store error without statement context.
    pub fn store(message: impl Into<String>) -> Self {
        Error::Store {
            message: message.into(),
            sql: None,
        }
    }

    /// Build a store error carrying the failing statement.
    pub fn store_with_sql(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Error::Store {
            message: message.into(),
            sql: Some(sql.into()),
        }
    }

    /// Shorthand for [`Error::UnknownField`].
    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Error::UnknownField {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Shorthand for [`Error::InvalidExpression`].
    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a programmer-misuse fault rather than a runtime
    /// condition.
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Error::UnknownModel { .. }
                | Error::UnknownField { .. }
                | Error::NotSingleton { .. }
                | Error::ModelMismatch { .. }
                | Error::EmptyRecordSet { .. }
                | Error::InvalidTarget { .. }
                | Error::InvalidOperator(_)
                | Error::InvalidExpression { .. }
                | Error::InvalidRegistry { .. }
        )
    }

    /// Whether this error was raised by the store.
    #[must_use]
    pub fn is_store(&self) -> bool {
        matches!(self, Error::Store { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_context() {
        let err = Error::unknown_field("User", "nickname");
        assert_eq!(err.to_string(), "unknown field `nickname` in model `User`");

        let err = Error::NotSingleton {
            model: "User".to_string(),
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "expected singleton of model `User`, got 3 record(s)"
        );
    }

    #[test]
    fn test_error_taxonomy() {
        assert!(Error::InvalidOperator("~~".to_string()).is_misuse());
        assert!(!Error::store("connection reset").is_misuse());
        assert!(Error::store_with_sql("syntax error", "SELECT").is_store());
        let shape = Error::InvalidValue {
            model: "User".to_string(),
            field: "age".to_string(),
            expected: "BIGINT".to_string(),
            found: "TEXT".to_string(),
        };
        assert!(!shape.is_misuse());
        assert!(!shape.is_store());
    }
}
