//! # Key Tokens
//!
//! A key token is the URL-safe text form of a primary key:
//!
//! ```text
//! <pct(hash)>             hash-only key
//! <pct(hash)>,<pct(range)> composite key
//! ```
//!
//! `pct` is percent-encoding over the URI component character set, which
//! escapes `,` to `%2C`. The delimiter can therefore never appear inside an
//! encoded value, and the first literal `,` always separates hash from range.
//!
//! Values are rendered as text before encoding: strings verbatim, numbers as
//! their decimal text, binary as standard base64.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::table::{KeyElement, KeySchema, ScalarType};
use crate::value::{AttributeValue, Item};

use super::errors::{PageError, PageResult};

/// Characters left unescaped by URI component encoding
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const DELIMITER: char = ',';

/// Opaque URL-safe primary key token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyToken(String);

impl KeyToken {
    /// Wrap token text received from a caller. Validation happens on decode.
    pub fn from_raw(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Token escaped once more for embedding in a URL path segment, which
    /// the router decodes once before the token is parsed.
    pub fn to_path_segment(&self) -> String {
        utf8_percent_encode(&self.0, COMPONENT).to_string()
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key values recovered from a token, typed per the key schema
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedKey {
    pub hash: AttributeValue,
    pub range: Option<AttributeValue>,
}

impl DecodedKey {
    /// Key item usable as a cursor or item key. Composite schemas require
    /// the range value.
    pub fn into_item(self, schema: &KeySchema) -> PageResult<Item> {
        let mut item = Item::new();
        item.insert(schema.hash().name.clone(), self.hash);

        match (schema.range(), self.range) {
            (Some(element), Some(value)) => {
                item.insert(element.name.clone(), value);
            }
            (Some(element), None) => {
                return Err(PageError::invalid_token(format!(
                    "token lacks a value for range key '{}'",
                    element.name
                )))
            }
            (None, Some(_)) => {
                return Err(PageError::invalid_token("table has no range key"));
            }
            (None, None) => {}
        }

        Ok(item)
    }
}

/// Encodes primary keys into [`KeyToken`]s and decodes them back.
pub struct KeyCodec;

impl KeyCodec {
    /// Encode a hash value and optional range value.
    pub fn encode(hash: &AttributeValue, range: Option<&AttributeValue>) -> PageResult<KeyToken> {
        let hash_text = scalar_text(hash)?;
        let range_text = range.map(scalar_text).transpose()?;
        Ok(Self::encode_text(&hash_text, range_text.as_deref()))
    }

    /// Encode already-rendered key text.
    pub fn encode_text(hash: &str, range: Option<&str>) -> KeyToken {
        let mut token = utf8_percent_encode(hash, COMPONENT).to_string();
        if let Some(range) = range {
            token.push(DELIMITER);
            token.extend(utf8_percent_encode(range, COMPONENT));
        }
        KeyToken(token)
    }

    /// Encode the key of `key`, which must hold every key attribute.
    pub fn encode_key(key: &Item, schema: &KeySchema) -> PageResult<KeyToken> {
        let hash = key_value(key, schema.hash())?;
        let range = schema.range().map(|e| key_value(key, e)).transpose()?;
        Self::encode(hash, range)
    }

    /// Decode a token, coercing each segment to the schema's declared type.
    pub fn decode(token: &KeyToken, schema: &KeySchema) -> PageResult<DecodedKey> {
        let text = token.as_str();
        if text.is_empty() {
            return Err(PageError::invalid_token("empty token"));
        }

        let (hash_segment, range_segment) = match text.split_once(DELIMITER) {
            Some((hash, range)) => (hash, Some(range)),
            None => (text, None),
        };

        let hash = coerce(&unescape(hash_segment)?, schema.hash())?;

        let range = match (range_segment, schema.range()) {
            (None, _) => None,
            (Some(_), None) => {
                return Err(PageError::invalid_token(
                    "token carries a range value but the table has no range key",
                ))
            }
            (Some(segment), Some(element)) => {
                if segment.contains(DELIMITER) {
                    return Err(PageError::invalid_token("unescaped delimiter in range value"));
                }
                Some(coerce(&unescape(segment)?, element)?)
            }
        };

        Ok(DecodedKey { hash, range })
    }

    /// Decode a token into a complete key item.
    pub fn decode_key(token: &KeyToken, schema: &KeySchema) -> PageResult<Item> {
        Self::decode(token, schema)?.into_item(schema)
    }
}

fn key_value<'a>(item: &'a Item, element: &KeyElement) -> PageResult<&'a AttributeValue> {
    item.get(&element.name)
        .ok_or_else(|| PageError::MissingKeyAttribute(element.name.clone()))
}

fn scalar_text(value: &AttributeValue) -> PageResult<String> {
    value.key_text().ok_or_else(|| {
        PageError::invalid_token(format!(
            "key values must be S, N or B, got {}",
            value.type_tag()
        ))
    })
}

/// Percent-decode one segment. Every `%` must introduce two hex digits.
fn unescape(segment: &str) -> PageResult<String> {
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(PageError::invalid_token("malformed percent-encoding"));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| PageError::invalid_token("key value is not valid UTF-8"))
}

fn coerce(text: &str, element: &KeyElement) -> PageResult<AttributeValue> {
    match element.attribute_type {
        ScalarType::String => Ok(AttributeValue::S(text.to_string())),
        ScalarType::Number => AttributeValue::number(text).ok_or_else(|| {
            PageError::invalid_token(format!(
                "value {:?} for '{}' is not a number",
                text, element.name
            ))
        }),
        ScalarType::Binary => STANDARD.decode(text).map(AttributeValue::B).map_err(|_| {
            PageError::invalid_token(format!(
                "value for '{}' is not valid base64",
                element.name
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composite() -> KeySchema {
        KeySchema::composite("pk", ScalarType::String, "sk", ScalarType::Number)
    }

    #[test]
    fn test_encode_hash_only() {
        let token = KeyCodec::encode(&AttributeValue::from("user 1"), None).unwrap();
        assert_eq!(token.as_str(), "user%201");
    }

    #[test]
    fn test_encode_escapes_delimiter() {
        let token = KeyCodec::encode(
            &AttributeValue::from("a,b"),
            Some(&AttributeValue::N("7".into())),
        )
        .unwrap();
        assert_eq!(token.as_str(), "a%2Cb,7");
    }

    #[test]
    fn test_path_segment_escapes_token_again() {
        let token = KeyToken::from_raw("a%2Cb,7");
        assert_eq!(token.to_path_segment(), "a%252Cb%2C7");
    }

    #[test]
    fn test_unreserved_characters_pass_through() {
        let token = KeyCodec::encode_text("a-b_c.d!e~f*g'h(i)j", None);
        assert_eq!(token.as_str(), "a-b_c.d!e~f*g'h(i)j");
    }

    #[test]
    fn test_decode_composite() {
        let decoded = KeyCodec::decode(&KeyToken::from_raw("a%2Cb,7"), &composite()).unwrap();
        assert_eq!(decoded.hash, AttributeValue::from("a,b"));
        assert_eq!(decoded.range, Some(AttributeValue::N("7".into())));
    }

    #[test]
    fn test_decode_range_on_hash_only_schema() {
        let schema = KeySchema::hash_only("pk", ScalarType::String);
        let err = KeyCodec::decode(&KeyToken::from_raw("a,b"), &schema).unwrap_err();
        assert!(matches!(err, PageError::InvalidKeyToken(_)));
    }

    #[test]
    fn test_decode_rejects_bad_number() {
        let err = KeyCodec::decode(&KeyToken::from_raw("a,seven"), &composite()).unwrap_err();
        assert!(matches!(err, PageError::InvalidKeyToken(_)));
    }

    #[test]
    fn test_decode_rejects_malformed_escape() {
        let schema = KeySchema::hash_only("pk", ScalarType::String);
        for raw in ["abc%", "abc%2", "abc%zz", ""] {
            let err = KeyCodec::decode(&KeyToken::from_raw(raw), &schema).unwrap_err();
            assert!(matches!(err, PageError::InvalidKeyToken(_)), "{raw}");
        }
    }

    #[test]
    fn test_binary_key_round_trip() {
        let schema = KeySchema::hash_only("blob", ScalarType::Binary);
        let value = AttributeValue::B(vec![0xfb, 0xff, 0x00]);
        let token = KeyCodec::encode(&value, None).unwrap();
        // base64 '+' and '/' are escaped
        assert!(!token.as_str().contains('/'));
        let decoded = KeyCodec::decode(&token, &schema).unwrap();
        assert_eq!(decoded.hash, value);
    }

    #[test]
    fn test_encode_key_requires_key_attributes() {
        let mut item = Item::new();
        item.insert("pk".into(), AttributeValue::from("a"));
        let err = KeyCodec::encode_key(&item, &composite()).unwrap_err();
        assert_eq!(err, PageError::MissingKeyAttribute("sk".into()));
    }

    #[test]
    fn test_encode_rejects_non_scalar() {
        let err = KeyCodec::encode(&AttributeValue::Bool(true), None).unwrap_err();
        assert!(matches!(err, PageError::InvalidKeyToken(_)));
    }

    #[test]
    fn test_decode_key_requires_range_for_composite() {
        let err = KeyCodec::decode_key(&KeyToken::from_raw("a"), &composite()).unwrap_err();
        assert!(matches!(err, PageError::InvalidKeyToken(_)));

        let key = KeyCodec::decode_key(&KeyToken::from_raw("a,3"), &composite()).unwrap();
        assert_eq!(key["pk"], AttributeValue::from("a"));
        assert_eq!(key["sk"], AttributeValue::N("3".into()));
    }
}
