//! Environment, cache and record collections for recordset.
//!
//! The [`Environment`] is the unit of work: it owns the connection handle,
//! the per-environment [`Cache`] and a reference to the read-only model
//! registry. [`RecordCollection`]s are lazy, immutable handles to ordered
//! sets of records of one model; every chain operation returns a new value
//! sharing the same Environment.
//!
//! # Example
//!
//! ```ignore
//! let env = Environment::new(conn, Arc::new(registry));
//!
//! // Nothing is executed until the ids are needed.
//! let adults = env.pool("User")?.filter("age", Operator::GreaterOrEqual, 18);
//!
//! // One SELECT; the values land in the cache.
//! let adults = adults.load(&["name", "profile_id.age"])?;
//!
//! // Served from the cache.
//! let name = adults.records()?[0].get("name")?;
//!
//! // Cache entries are dropped before the UPDATE is sent.
//! adults.write([("active", Value::Bool(true))], &[])?;
//! ```

pub mod cache;
pub mod collection;
pub mod config;
pub mod environment;
pub mod tracker;
mod write;

pub use cache::{Cache, CacheStats};
pub use collection::{FieldValue, RecordCollection};
pub use config::EnvironmentConfig;
pub use environment::Environment;
pub use tracker::{RelationLoadStats, RelationLoadTracker};
