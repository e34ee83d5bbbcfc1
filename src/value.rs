//! # Attribute Values
//!
//! Tagged attribute values mirroring the table store's type enumeration,
//! plus conversion to and from the JSON document form used by the admin API.
//!
//! Numbers are carried as their decimal text (the way the table store
//! transmits them) so that no precision is lost between reads and writes.

use std::cmp::Ordering;
use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::table::ScalarType;

/// A record: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// A dynamically-typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String
    S(String),
    /// Number, as decimal text
    N(String),
    /// Binary
    B(Vec<u8>),
    /// Boolean
    Bool(bool),
    /// Null marker
    Null,
    /// Heterogeneous list
    L(Vec<AttributeValue>),
    /// Nested map
    M(HashMap<String, AttributeValue>),
    /// String set
    Ss(Vec<String>),
    /// Number set
    Ns(Vec<String>),
    /// Binary set
    Bs(Vec<Vec<u8>>),
}

impl AttributeValue {
    /// Build a number value from text, rejecting anything that is not a
    /// finite decimal number.
    pub fn number(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        Decimal::parse(trimmed).map(|_| AttributeValue::N(trimmed.to_string()))
    }

    /// Returns the type tag used by the table store's wire format.
    pub fn type_tag(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::B(_) => "B",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null => "NULL",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
            AttributeValue::Bs(_) => "BS",
        }
    }

    /// Scalar type of this value, if it can be used as a key attribute.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            AttributeValue::S(_) => Some(ScalarType::String),
            AttributeValue::N(_) => Some(ScalarType::Number),
            AttributeValue::B(_) => Some(ScalarType::Binary),
            _ => None,
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    /// Text form of a scalar key value: strings verbatim, numbers as their
    /// decimal text, binary as standard base64.
    pub fn key_text(&self) -> Option<String> {
        match self {
            AttributeValue::S(s) => Some(s.clone()),
            AttributeValue::N(n) => Some(n.clone()),
            AttributeValue::B(b) => Some(STANDARD.encode(b)),
            _ => None,
        }
    }

    /// Equality as the table store evaluates it in conditions: numbers
    /// compare by value ("42" equals "42.0"), everything else structurally.
    pub fn matches(&self, other: &AttributeValue) -> bool {
        match (self, other) {
            (AttributeValue::N(a), AttributeValue::N(b)) => {
                match (Decimal::parse(a), Decimal::parse(b)) {
                    (Some(a), Some(b)) => a == b,
                    _ => a == b,
                }
            }
            _ => self == other,
        }
    }

    /// Convert to the JSON document form.
    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::S(s) => Value::String(s.clone()),
            AttributeValue::N(n) => number_to_json(n),
            AttributeValue::B(b) => Value::String(STANDARD.encode(b)),
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Null => Value::Null,
            AttributeValue::L(list) => Value::Array(list.iter().map(|v| v.to_json()).collect()),
            AttributeValue::M(map) => item_to_json(map),
            AttributeValue::Ss(set) => {
                Value::Array(set.iter().cloned().map(Value::String).collect())
            }
            AttributeValue::Ns(set) => Value::Array(set.iter().map(|n| number_to_json(n)).collect()),
            AttributeValue::Bs(set) => Value::Array(
                set.iter()
                    .map(|b| Value::String(STANDARD.encode(b)))
                    .collect(),
            ),
        }
    }

    /// Convert from the JSON document form.
    ///
    /// Arrays become lists and objects become maps; sets and binary values
    /// cannot be expressed in plain JSON and are never produced here.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => AttributeValue::S(s.clone()),
            Value::Number(n) => AttributeValue::N(n.to_string()),
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Null => AttributeValue::Null,
            Value::Array(list) => AttributeValue::L(list.iter().map(Self::from_json).collect()),
            Value::Object(map) => AttributeValue::M(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::S(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::S(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::N(n.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// Errors converting JSON documents into items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Items must be JSON objects
    #[error("item must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Convert an item to a JSON object. Keys come out sorted.
pub fn item_to_json(item: &HashMap<String, AttributeValue>) -> Value {
    let map: Map<String, Value> = item
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    Value::Object(map)
}

/// Convert a JSON object to an item.
pub fn item_from_json(value: &Value) -> Result<Item, ValueError> {
    match value {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
            .collect()),
        other => Err(ValueError::NotAnObject(json_kind(other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn number_to_json(text: &str) -> Value {
    match serde_json::from_str::<Number>(text.trim()) {
        Ok(n) => Value::Number(n),
        Err(_) => Value::String(text.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Sign {
    Negative,
    Zero,
    Positive,
}

/// Exact value of number text, normalized so that equal numbers are equal
/// structurally: `"100"`, `"1e2"` and `"100.00"` share one form, as do `"0"`
/// and `"-0"`. Ordering never goes through floating point, so keys beyond
/// 2^53 stay distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decimal {
    sign: Sign,
    /// Value is `0.d1d2d3.. * 10^exponent`
    exponent: i64,
    /// Significant digits, no leading or trailing zeros
    digits: Vec<u8>,
}

impl Decimal {
    /// Parse `[+-]digits[.digits][(e|E)[+-]digits]`. Surrounding whitespace
    /// is ignored.
    pub(crate) fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, rest) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        let (mantissa, exponent) = match rest.find(|c: char| c == 'e' || c == 'E') {
            Some(at) => (&rest[..at], rest[at + 1..].parse::<i64>().ok()?),
            None => (rest, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let mut all = Vec::with_capacity(int_part.len() + frac_part.len());
        for b in int_part.bytes().chain(frac_part.bytes()) {
            if !b.is_ascii_digit() {
                return None;
            }
            all.push(b - b'0');
        }

        let leading = all.iter().take_while(|&&d| d == 0).count();
        let significant = &all[leading..];
        let trailing = significant.iter().rev().take_while(|&&d| d == 0).count();
        let digits = significant[..significant.len() - trailing].to_vec();
        if digits.is_empty() {
            return Some(Self {
                sign: Sign::Zero,
                exponent: 0,
                digits,
            });
        }

        let point = i64::try_from(int_part.len()).ok()? - i64::try_from(leading).ok()?;
        Some(Self {
            sign: if negative { Sign::Negative } else { Sign::Positive },
            exponent: point.checked_add(exponent)?,
            digits,
        })
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.sign != other.sign {
            return self.sign.cmp(&other.sign);
        }
        let magnitude = self
            .exponent
            .cmp(&other.exponent)
            .then_with(|| self.digits.cmp(&other.digits));
        match self.sign {
            Sign::Negative => magnitude.reverse(),
            Sign::Zero => Ordering::Equal,
            Sign::Positive => magnitude,
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
