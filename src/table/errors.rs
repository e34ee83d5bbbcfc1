//! Table metadata error types

use thiserror::Error;

/// Result type for table metadata operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while reading a table's key schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No HASH key element
    #[error("key schema has no HASH key")]
    MissingHashKey,

    /// More than one HASH key element
    #[error("key schema has more than one HASH key")]
    MultipleHashKeys,

    /// More than one RANGE key element
    #[error("key schema has more than one RANGE key")]
    MultipleRangeKeys,

    /// A key attribute has no attribute definition
    #[error("key attribute {0} has no attribute definition")]
    MissingAttributeDefinition(String),

    /// Attribute type code is not S, N or B
    #[error("unknown attribute type: {0}")]
    UnknownAttributeType(String),

    /// Key role is not HASH or RANGE
    #[error("unknown key role: {0}")]
    UnknownKeyRole(String),
}

impl SchemaError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::MissingHashKey => "SCHEMA_MISSING_HASH_KEY",
            SchemaError::MultipleHashKeys => "SCHEMA_MULTIPLE_HASH_KEYS",
            SchemaError::MultipleRangeKeys => "SCHEMA_MULTIPLE_RANGE_KEYS",
            SchemaError::MissingAttributeDefinition(_) => "SCHEMA_MISSING_ATTRIBUTE_DEFINITION",
            SchemaError::UnknownAttributeType(_) => "SCHEMA_UNKNOWN_ATTRIBUTE_TYPE",
            SchemaError::UnknownKeyRole(_) => "SCHEMA_UNKNOWN_KEY_ROLE",
        }
    }
}
