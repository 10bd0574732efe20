//! The store protocol consumed by record sets.
//!
//! A driver only has to run parameterized statement text. Statements use
//! positional placeholders and the parameter slice is ordered the way the
//! placeholders appear in the text.

use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::Value;

/// A connection (or transaction handle) to a relational store.
///
/// Every call is synchronous and blocking. Timeouts and cancellation are the
/// driver's responsibility.
pub trait Connection {
    /// Execute a SELECT and return all rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute an INSERT / UPDATE / DELETE and return the affected row count.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute a query returning a single scalar (e.g. `COUNT(*)`).
    ///
    /// The default takes the first column of the first row, NULL if there is
    /// none.
    fn query_scalar(&self, sql: &str, params: &[Value]) -> Result<Value> {
        let rows = self.query(sql, params)?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get(0).cloned())
            .unwrap_or(Value::Null))
    }

    /// Execute an INSERT and return the identity of the new row.
    ///
    /// The default expects the statement to carry a `RETURNING` clause.
    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
        let value = self.query_scalar(sql, params)?;
        value
            .as_i64()
            .ok_or_else(|| Error::store_with_sql("INSERT did not return an id", sql))
    }
}

impl<C: Connection + ?Sized> Connection for &C {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn query_scalar(&self, sql: &str, params: &[Value]) -> Result<Value> {
        (**self).query_scalar(sql, params)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
        (**self).insert(sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountConnection;

    impl Connection for CountConnection {
        fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
            Ok(vec![Row::from_pairs([("count", Value::BigInt(12))])])
        }

        fn execute(&self, _sql: &str, _params: &[Value]) -> Result<u64> {
            Ok(0)
        }
    }

    struct EmptyConnection;

    impl Connection for EmptyConnection {
        fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }

        fn execute(&self, _sql: &str, _params: &[Value]) -> Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_default_scalar_and_insert() {
        let conn = CountConnection;
        assert_eq!(conn.query_scalar("SELECT COUNT(*)", &[]), Ok(Value::BigInt(12)));
        assert_eq!(conn.insert("INSERT ... RETURNING id", &[]), Ok(12));
    }

    #[test]
    fn test_insert_without_returning_row_is_store_error() {
        let err = EmptyConnection.insert("INSERT", &[]).unwrap_err();
        assert!(err.is_store());
    }
}
