//! Procedural macros for recordset.
//!
//! - `#[derive(Record)]` generates the explicit mapping between a struct and
//!   the field maps held by the record cache.
//!
//! # Attributes
//!
//! - `#[record(column = "name")]` on a field: field-map key to read and write
//!   (defaults to the struct field name).
//! - `#[record(skip)]` on a field: not mapped, filled with `Default`.
//! - `#[record(crate = "path")]` on the struct: path of `recordset_core` in the
//!   generated code.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Record)]
//! struct User {
//!     name: String,
//!     #[record(column = "age")]
//!     years: Option<i32>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record_derive;

/// Derive `recordset_core::Record` for a struct with named fields.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record_derive::parse_record(&input) {
        Ok(def) => record_derive::generate_record_impl(&def).into(),
        Err(err) => err.to_compile_error().into(),
    }
}
