//! Core types and traits for recordset.
//!
//! `recordset-core` is the **foundation layer** of the workspace. It defines the
//! traits and data types every other crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: [`Connection`] is the store protocol drivers implement;
//!   [`Record`] is the explicit struct-marshaling contract.
//! - **Data model**: [`Row`], [`Value`], [`FieldMap`] and [`SqlType`] represent
//!   statement inputs and outputs.
//! - **Metadata**: [`ModelInfo`], [`FieldInfo`] and [`Registry`] describe models,
//!   their fields and relations. The registry is built once and read-only.
//!
//! # Who Uses This Crate
//!
//! - `recordset-query` compiles conditions against `ModelInfo` metadata.
//! - `recordset-session` drives a `Connection` and caches `FieldMap`s.
//! - `recordset-macros` generates `Record` implementations.
//!
//! Most applications should use the `recordset` facade.

pub mod connection;
pub mod error;
pub mod field;
pub mod model;
pub mod record;
pub mod registry;
pub mod relationship;
pub mod row;
pub mod types;
pub mod value;

pub use connection::Connection;
pub use error::{Error, Result};
pub use field::{ComputeFn, ComputeRule, FieldInfo};
pub use model::ModelInfo;
pub use record::{FieldReader, FromValue, Payload, Record, take_field};
pub use registry::{PathStep, Registry, RegistryBuilder};
pub use relationship::{LinkTableInfo, RelationInfo, RelationshipKind};
pub use row::Row;
pub use types::SqlType;
pub use value::{FieldMap, Value};
