//! Lazy, cached record sets over relational stores.
//!
//! `recordset` is the facade crate: it re-exports the workspace crates and a
//! [`prelude`] for application code.
//!
//! - [`core`]: values, rows, the [`Connection`](core::Connection) protocol
//!   and the model [`Registry`](core::Registry).
//! - [`query`]: conditions, query state and SQL compilation.
//! - [`session`]: the [`Environment`](session::Environment), its cache and
//!   [`RecordCollection`](session::RecordCollection).
//!
//! # Example
//!
//! ```ignore
//! use recordset::prelude::*;
//!
//! #[derive(Record)]
//! #[record(crate = "::recordset::core")]
//! struct User {
//!     name: String,
//! }
//!
//! let registry = Registry::builder()
//!     .model(ModelInfo::new("User", "users").field(FieldInfo::new("Name", "name", SqlType::Text)))
//!     .build()?;
//! let env = Environment::new(conn, Arc::new(registry));
//!
//! let alice = env.pool("User")?.create([("name", "Alice")])?;
//! let users: Vec<User> = env
//!     .pool("User")?
//!     .filter("name", Operator::Like, "A%")
//!     .all()?;
//! ```

pub use recordset_core as core;
pub use recordset_macros::Record;
pub use recordset_query as query;
pub use recordset_session as session;

/// Commonly used types.
pub mod prelude {
    pub use recordset_core::{
        Connection, Error, FieldInfo, FieldMap, LinkTableInfo, ModelInfo, Payload, Record,
        Registry, Result, Row, SqlType, Value,
    };
    pub use recordset_macros::Record;
    pub use recordset_query::{Condition, Dialect, Operator};
    pub use recordset_session::{Environment, EnvironmentConfig, FieldValue, RecordCollection};
}
