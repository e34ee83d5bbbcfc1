//! # Condition Expressions
//!
//! The backend-native representation of an equality conjunction: expression
//! text referencing `#name` / `:value` placeholders, plus the placeholder
//! maps. Clauses are also kept in structured form so in-process backends can
//! evaluate them without parsing the expression text.

use std::collections::BTreeMap;

use crate::value::{AttributeValue, Item};

/// One `#name = :value` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityClause {
    pub name_ref: String,
    pub value_ref: String,
}

impl EqualityClause {
    fn render(&self) -> String {
        format!("{} = {}", self.name_ref, self.value_ref)
    }
}

/// Key-condition and filter clauses with their placeholder maps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    pub key_condition: Vec<EqualityClause>,
    pub filter: Vec<EqualityClause>,
    pub names: BTreeMap<String, String>,
    pub values: BTreeMap<String, AttributeValue>,
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// No clauses at all
    pub fn is_empty(&self) -> bool {
        self.key_condition.is_empty() && self.filter.is_empty()
    }

    /// Add `attribute = value` to the filter expression
    pub fn push_filter(&mut self, attribute: &str, value: AttributeValue) {
        let clause = self.allocate(attribute, value);
        self.filter.push(clause);
    }

    /// Add `attribute = value` to the key-condition expression
    pub fn push_key_condition(&mut self, attribute: &str, value: AttributeValue) {
        let clause = self.allocate(attribute, value);
        self.key_condition.push(clause);
    }

    /// Placeholders are numbered in insertion order so the same filter spec always
    /// renders the same expression.
    fn allocate(&mut self, attribute: &str, value: AttributeValue) -> EqualityClause {
        let index = self.names.len();
        let name_ref = format!("#f{}", index);
        let value_ref = format!(":f{}", index);
        self.names.insert(name_ref.clone(), attribute.to_string());
        self.values.insert(value_ref.clone(), value);
        EqualityClause { name_ref, value_ref }
    }

    /// Filter expression text, `None` when there are no filter clauses
    pub fn filter_expression(&self) -> Option<String> {
        render(&self.filter)
    }

    /// Key-condition expression text, `None` when there are no key clauses
    pub fn key_condition_expression(&self) -> Option<String> {
        render(&self.key_condition)
    }

    /// Resolve a clause to its attribute name and value
    pub fn resolve(&self, clause: &EqualityClause) -> Option<(&str, &AttributeValue)> {
        let name = self.names.get(&clause.name_ref)?;
        let value = self.values.get(&clause.value_ref)?;
        Some((name.as_str(), value))
    }

    /// Value the key condition pins `attribute` to
    pub fn key_condition_value(&self, attribute: &str) -> Option<&AttributeValue> {
        self.key_condition
            .iter()
            .filter_map(|c| self.resolve(c))
            .find(|(name, _)| *name == attribute)
            .map(|(_, value)| value)
    }

    /// Whether `item` satisfies every filter clause
    pub fn matches_filter(&self, item: &Item) -> bool {
        self.matches_all(&self.filter, item)
    }

    /// Whether `item` satisfies every key-condition clause
    pub fn matches_key_condition(&self, item: &Item) -> bool {
        self.matches_all(&self.key_condition, item)
    }

    fn matches_all(&self, clauses: &[EqualityClause], item: &Item) -> bool {
        clauses.iter().all(|clause| match self.resolve(clause) {
            Some((name, expected)) => item.get(name).map_or(false, |v| v.matches(expected)),
            None => false,
        })
    }
}

fn render(clauses: &[EqualityClause]) -> Option<String> {
    if clauses.is_empty() {
        return None;
    }
    Some(
        clauses
            .iter()
            .map(EqualityClause::render)
            .collect::<Vec<_>>()
            .join(" AND "),
    )
}
