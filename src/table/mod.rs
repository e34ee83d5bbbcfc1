//! Table metadata subsystem
//!
//! Key schemas and table descriptions as read from the table store.
//!
//! # Design Principles
//!
//! - Exactly one HASH key, at most one RANGE key
//! - Every key attribute carries its declared scalar type
//! - Read-only: descriptions are fetched per request and never cached

mod errors;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use types::{AttributeDefinition, KeyElement, KeyRole, KeySchema, ScalarType, TableDescription};
