//! Test fixtures for recordset integration tests.
#![allow(dead_code)]

pub mod mock_types;
pub mod sample_data;

pub use mock_types::*;
pub use sample_data::*;
