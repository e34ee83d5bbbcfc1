//! Projection of a record onto its primary key

use crate::table::KeySchema;
use crate::value::Item;

use super::errors::{PageError, PageResult};

pub struct KeyExtractor;

impl KeyExtractor {
    /// Returns `record` restricted to the key attributes of `schema`.
    pub fn extract(record: &Item, schema: &KeySchema) -> PageResult<Item> {
        schema
            .elements()
            .map(|element| {
                record
                    .get(&element.name)
                    .map(|value| (element.name.clone(), value.clone()))
                    .ok_or_else(|| PageError::MissingKeyAttribute(element.name.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ScalarType;
    use crate::value::AttributeValue;

    #[test]
    fn test_extract_drops_non_key_attributes() {
        let schema = KeySchema::composite("pk", ScalarType::String, "sk", ScalarType::Number);
        let mut record = Item::new();
        record.insert("pk".into(), AttributeValue::from("a"));
        record.insert("sk".into(), AttributeValue::from(2i64));
        record.insert("payload".into(), AttributeValue::from("x"));

        let key = KeyExtractor::extract(&record, &schema).unwrap();
        assert_eq!(key.len(), 2);
        assert!(!key.contains_key("payload"));
    }

    #[test]
    fn test_extract_missing_attribute() {
        let schema = KeySchema::hash_only("pk", ScalarType::String);
        let err = KeyExtractor::extract(&Item::new(), &schema).unwrap_err();
        assert_eq!(err, PageError::MissingKeyAttribute("pk".into()));
    }
}
