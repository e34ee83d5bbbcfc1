//! # Filter Expressions
//!
//! Translates a caller's equality filter (attribute name to text value) into
//! backend condition parameters. Values are coerced to the attribute's
//! declared type first, so `"42"` on a NUMBER attribute is sent as the number
//! 42, never the string "42".

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::backend::{FilterParams, ReadOperation};
use crate::table::{AttributeDefinition, KeySchema, ScalarType};
use crate::value::AttributeValue;

use super::errors::{PageError, PageResult};

/// Attribute name to the text value it must equal. All entries are ANDed.
pub type FilterSpec = BTreeMap<String, String>;

/// Which read primitive to use and the parameters to send with it
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPlan {
    pub operation: ReadOperation,
    pub params: FilterParams,
}

pub struct FilterExpressionBuilder;

impl FilterExpressionBuilder {
    /// Build a filter expression for a scan. Every entry becomes one
    /// `#fN = :fN` clause.
    pub fn build(spec: &FilterSpec, definitions: &[AttributeDefinition]) -> PageResult<FilterParams> {
        let mut params = FilterParams::new();
        for (attribute, text) in spec {
            params.push_filter(attribute, coerce(attribute, text, definitions)?);
        }
        Ok(params)
    }

    /// Choose the read primitive for `spec`.
    ///
    /// When the filter spec pins the hash key, a query can serve it: key attributes
    /// go into the key condition and the rest stay in the filter. Otherwise
    /// the whole filter spec is a scan filter.
    pub fn plan(
        spec: &FilterSpec,
        definitions: &[AttributeDefinition],
        key_schema: &KeySchema,
    ) -> PageResult<ReadPlan> {
        if !spec.contains_key(&key_schema.hash().name) {
            return Ok(ReadPlan {
                operation: ReadOperation::Scan,
                params: Self::build(spec, definitions)?,
            });
        }

        let mut params = FilterParams::new();
        for (attribute, text) in spec {
            let value = coerce(attribute, text, definitions)?;
            if key_schema.contains(attribute) {
                params.push_key_condition(attribute, value);
            } else {
                params.push_filter(attribute, value);
            }
        }

        Ok(ReadPlan {
            operation: ReadOperation::Query,
            params,
        })
    }
}

fn coerce(attribute: &str, text: &str, definitions: &[AttributeDefinition]) -> PageResult<AttributeValue> {
    let declared = definitions
        .iter()
        .find(|d| d.name == attribute)
        .map(|d| d.attribute_type);

    match declared {
        Some(ScalarType::Number) => AttributeValue::number(text)
            .ok_or_else(|| PageError::invalid_filter(attribute, text, "not a number")),
        Some(ScalarType::Binary) => STANDARD
            .decode(text)
            .map(AttributeValue::B)
            .map_err(|e| PageError::invalid_filter(attribute, text, format!("not base64: {}", e))),
        Some(ScalarType::String) | None => Ok(AttributeValue::S(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(pairs: &[(&str, &str)]) -> FilterSpec {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn definitions() -> Vec<AttributeDefinition> {
        vec![
            AttributeDefinition::new("pk", ScalarType::String),
            AttributeDefinition::new("age", ScalarType::Number),
            AttributeDefinition::new("raw", ScalarType::Binary),
        ]
    }

    #[test]
    fn test_numeric_value_is_coerced() {
        let params = FilterExpressionBuilder::build(&spec(&[("age", "42")]), &definitions()).unwrap();
        assert_eq!(params.filter_expression().as_deref(), Some("#f0 = :f0"));
        assert_eq!(params.names["#f0"], "age");
        assert_eq!(params.values[":f0"], AttributeValue::N("42".into()));
    }

    #[test]
    fn test_undeclared_attribute_stays_string() {
        let params = FilterExpressionBuilder::build(&spec(&[("city", "42")]), &definitions()).unwrap();
        assert_eq!(params.values[":f0"], AttributeValue::S("42".into()));
    }

    #[test]
    fn test_clauses_joined_with_and() {
        let params = FilterExpressionBuilder::build(
            &spec(&[("age", "3"), ("city", "Oslo"), ("status", "open")]),
            &definitions(),
        )
        .unwrap();
        assert_eq!(
            params.filter_expression().as_deref(),
            Some("#f0 = :f0 AND #f1 = :f1 AND #f2 = :f2")
        );
    }

    #[test]
    fn test_bad_number_is_rejected() {
        let err = FilterExpressionBuilder::build(&spec(&[("age", "forty")]), &definitions()).unwrap_err();
        assert!(matches!(
            err,
            PageError::InvalidFilterValue { ref attribute, .. } if attribute == "age"
        ));
    }

    #[test]
    fn test_binary_value_is_decoded() {
        let params = FilterExpressionBuilder::build(&spec(&[("raw", "AQID")]), &definitions()).unwrap();
        assert_eq!(params.values[":f0"], AttributeValue::B(vec![1, 2, 3]));

        let err = FilterExpressionBuilder::build(&spec(&[("raw", "***")]), &definitions()).unwrap_err();
        assert_eq!(err.code(), "INVALID_FILTER_VALUE");
    }

    #[test]
    fn test_plan_without_hash_key_scans() {
        let schema = KeySchema::hash_only("pk", ScalarType::String);
        let plan = FilterExpressionBuilder::plan(&spec(&[("age", "1")]), &definitions(), &schema).unwrap();
        assert_eq!(plan.operation, ReadOperation::Scan);
        assert!(plan.params.key_condition.is_empty());
    }

    #[test]
    fn test_plan_with_hash_key_queries() {
        let schema = KeySchema::hash_only("pk", ScalarType::String);
        let plan = FilterExpressionBuilder::plan(
            &spec(&[("age", "1"), ("pk", "user-1")]),
            &definitions(),
            &schema,
        )
        .unwrap();

        assert_eq!(plan.operation, ReadOperation::Query);
        assert_eq!(plan.params.key_condition_expression().as_deref(), Some("#f1 = :f1"));
        assert_eq!(plan.params.filter_expression().as_deref(), Some("#f0 = :f0"));
        assert_eq!(
            plan.params.key_condition_value("pk"),
            Some(&AttributeValue::from("user-1"))
        );
    }
}
