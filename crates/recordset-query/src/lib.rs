//! Conditions, queries and SQL compilation for recordset.
//!
//! `recordset-query` turns the filter/order/paging state of a record
//! collection into parameterized SQL. It never talks to a store itself.
//!
//! # Role In The Architecture
//!
//! - **Filters**: [`Condition`] is an immutable boolean expression over
//!   `field operator value` triples; [`Operator`] parses from its textual form.
//! - **Query state**: [`Query`] holds the condition, ordering, grouping and
//!   paging of one model.
//! - **Compilation**: [`SqlCompiler`] resolves dotted paths against the
//!   [`Registry`](recordset_core::Registry) and emits [`Statement`]s for the
//!   selected [`Dialect`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use recordset_core::{FieldInfo, ModelInfo, Registry, SqlType};
//! use recordset_query::{Condition, Dialect, Operator, Query, SqlCompiler};
//!
//! let registry = Registry::builder()
//!     .model(ModelInfo::new("User", "users").field(FieldInfo::new("Name", "name", SqlType::Text)))
//!     .build()
//!     .unwrap();
//! let users = Arc::clone(registry.model("User").unwrap());
//!
//! let query = Query::new(users)
//!     .filter(&Condition::new().and("name", Operator::Like, "A%"))
//!     .order_by(["name DESC"])
//!     .limit(10);
//! let stmt = SqlCompiler::new(&registry, Dialect::Sqlite)
//!     .select(&query, &["name".to_string()])
//!     .unwrap();
//! assert_eq!(
//!     stmt.sql,
//!     r#"SELECT "users"."id", "users"."name" FROM "users" WHERE "users"."name" LIKE ? ORDER BY "users"."name" DESC LIMIT 10"#
//! );
//! ```

pub mod compile;
pub mod condition;
pub mod dialect;
pub mod expr;
pub mod operator;
pub mod query;

pub use compile::{SqlCompiler, Statement};
pub use condition::{Condition, Connector, Predicate, Term};
pub use dialect::Dialect;
pub use expr::{Direction, OrderExpr};
pub use operator::Operator;
pub use query::{ID_COLUMN, Query};
