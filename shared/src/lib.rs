//! Shared types and models for Farm GAP Records
//!
//! This crate contains the record models, validation rules and the pure
//! traceability and analytics computations shared between the backend and
//! the browser (via WASM).

pub mod analytics;
pub mod models;
pub mod record;
pub mod traceability;
pub mod types;
pub mod validation;

pub use analytics::*;
pub use models::*;
pub use record::*;
pub use traceability::*;
pub use types::*;
pub use validation::*;
