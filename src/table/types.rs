//! Key schema and table description types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};

/// Declared type of a key attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl ScalarType {
    /// Returns the table store's type code
    pub fn code(&self) -> &'static str {
        match self {
            ScalarType::String => "S",
            ScalarType::Number => "N",
            ScalarType::Binary => "B",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ScalarType {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        match s {
            "S" => Ok(ScalarType::String),
            "N" => Ok(ScalarType::Number),
            "B" => Ok(ScalarType::Binary),
            other => Err(SchemaError::UnknownAttributeType(other.to_string())),
        }
    }
}

/// Role of an attribute in the primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyRole {
    Hash,
    Range,
}

impl KeyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Hash => "HASH",
            KeyRole::Range => "RANGE",
        }
    }
}

impl FromStr for KeyRole {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        match s {
            "HASH" => Ok(KeyRole::Hash),
            "RANGE" => Ok(KeyRole::Range),
            other => Err(SchemaError::UnknownKeyRole(other.to_string())),
        }
    }
}

/// Declared attribute type, as listed in a table description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: ScalarType,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, attribute_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }
}

/// One element of a key schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyElement {
    pub name: String,
    pub role: KeyRole,
    #[serde(rename = "type")]
    pub attribute_type: ScalarType,
}

impl KeyElement {
    pub fn hash(name: impl Into<String>, attribute_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            role: KeyRole::Hash,
            attribute_type,
        }
    }

    pub fn range(name: impl Into<String>, attribute_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            role: KeyRole::Range,
            attribute_type,
        }
    }
}

/// A table's primary key: one HASH element and an optional RANGE element.
///
/// The invariant is enforced at construction, so a `KeySchema` value is
/// always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySchema {
    hash: KeyElement,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<KeyElement>,
}

impl KeySchema {
    /// Build a key schema from its elements, in any order.
    pub fn new(elements: Vec<KeyElement>) -> SchemaResult<Self> {
        let mut hash = None;
        let mut range = None;

        for element in elements {
            match element.role {
                KeyRole::Hash => {
                    if hash.replace(element).is_some() {
                        return Err(SchemaError::MultipleHashKeys);
                    }
                }
                KeyRole::Range => {
                    if range.replace(element).is_some() {
                        return Err(SchemaError::MultipleRangeKeys);
                    }
                }
            }
        }

        let hash = hash.ok_or(SchemaError::MissingHashKey)?;
        Ok(Self { hash, range })
    }

    /// Key schema with only a HASH key
    pub fn hash_only(name: impl Into<String>, attribute_type: ScalarType) -> Self {
        Self {
            hash: KeyElement::hash(name, attribute_type),
            range: None,
        }
    }

    /// Composite key schema
    pub fn composite(
        hash_name: impl Into<String>,
        hash_type: ScalarType,
        range_name: impl Into<String>,
        range_type: ScalarType,
    ) -> Self {
        Self {
            hash: KeyElement::hash(hash_name, hash_type),
            range: Some(KeyElement::range(range_name, range_type)),
        }
    }

    /// Resolve a key schema from the `(name, role)` pairs and attribute
    /// definitions of a table description.
    pub fn from_description(
        key_elements: &[(String, KeyRole)],
        definitions: &[AttributeDefinition],
    ) -> SchemaResult<Self> {
        let elements = key_elements
            .iter()
            .map(|(name, role)| {
                let definition = definitions
                    .iter()
                    .find(|d| &d.name == name)
                    .ok_or_else(|| SchemaError::MissingAttributeDefinition(name.clone()))?;
                Ok(KeyElement {
                    name: name.clone(),
                    role: *role,
                    attribute_type: definition.attribute_type,
                })
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        Self::new(elements)
    }

    pub fn hash(&self) -> &KeyElement {
        &self.hash
    }

    pub fn range(&self) -> Option<&KeyElement> {
        self.range.as_ref()
    }

    /// Key elements, HASH first
    pub fn elements(&self) -> impl Iterator<Item = &KeyElement> {
        std::iter::once(&self.hash).chain(self.range.iter())
    }

    /// Whether `name` is one of the key attributes
    pub fn contains(&self, name: &str) -> bool {
        self.elements().any(|e| e.name == name)
    }

    /// Key element named `name`
    pub fn element(&self, name: &str) -> Option<&KeyElement> {
        self.elements().find(|e| e.name == name)
    }
}

/// Table metadata as returned by `describe_table`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDescription {
    pub name: String,
    pub key_schema: KeySchema,
    pub attribute_definitions: Vec<AttributeDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl TableDescription {
    /// Description whose attribute definitions are exactly the key attributes
    pub fn new(name: impl Into<String>, key_schema: KeySchema) -> Self {
        let attribute_definitions = key_schema
            .elements()
            .map(|e| AttributeDefinition::new(e.name.clone(), e.attribute_type))
            .collect();
        Self {
            name: name.into(),
            key_schema,
            attribute_definitions,
            item_count: None,
            status: None,
        }
    }

    /// Declared type of `attribute`, if the table defines one
    pub fn attribute_type(&self, attribute: &str) -> Option<ScalarType> {
        self.attribute_definitions
            .iter()
            .find(|d| d.name == attribute)
            .map(|d| d.attribute_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_hash_key() {
        let err = KeySchema::new(vec![KeyElement::range("sk", ScalarType::String)]).unwrap_err();
        assert_eq!(err, SchemaError::MissingHashKey);
    }

    #[test]
    fn test_schema_rejects_duplicate_roles() {
        let err = KeySchema::new(vec![
            KeyElement::hash("a", ScalarType::String),
            KeyElement::hash("b", ScalarType::String),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::MultipleHashKeys);

        let err = KeySchema::new(vec![
            KeyElement::hash("a", ScalarType::String),
            KeyElement::range("b", ScalarType::String),
            KeyElement::range("c", ScalarType::Number),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::MultipleRangeKeys);
    }

    #[test]
    fn test_schema_range_first_is_accepted() {
        let schema = KeySchema::new(vec![
            KeyElement::range("sk", ScalarType::Number),
            KeyElement::hash("pk", ScalarType::String),
        ])
        .unwrap();
        let names: Vec<_> = schema.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["pk", "sk"]);
    }

    #[test]
    fn test_from_description_resolves_types() {
        let schema = KeySchema::from_description(
            &[
                ("pk".to_string(), KeyRole::Hash),
                ("sk".to_string(), KeyRole::Range),
            ],
            &[
                AttributeDefinition::new("pk", ScalarType::String),
                AttributeDefinition::new("sk", ScalarType::Number),
            ],
        )
        .unwrap();

        assert_eq!(schema.hash().attribute_type, ScalarType::String);
        assert_eq!(schema.range().unwrap().attribute_type, ScalarType::Number);
        assert!(schema.contains("sk"));
        assert!(!schema.contains("other"));
    }

    #[test]
    fn test_from_description_missing_definition() {
        let err = KeySchema::from_description(&[("pk".to_string(), KeyRole::Hash)], &[]).unwrap_err();
        assert_eq!(err, SchemaError::MissingAttributeDefinition("pk".into()));
    }

    #[test]
    fn test_type_codes_parse() {
        assert_eq!("N".parse::<ScalarType>().unwrap(), ScalarType::Number);
        assert!("X".parse::<ScalarType>().is_err());
        assert_eq!("RANGE".parse::<KeyRole>().unwrap(), KeyRole::Range);
    }
}
