//! Value matchers.
//!
//! A [`Matcher`] tests a URL string or a request body against a stored
//! criterion. Matching is total: inputs a variant cannot interpret simply
//! don't match.

use crate::error::{Result, StubError};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Decodes a candidate payload into the reference shape, `None` if it doesn't fit.
type JsonDecoder = Arc<dyn Fn(&[u8]) -> Option<Value> + Send + Sync>;

/// A predicate over strings and byte payloads.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact string equality
    Exact(String),
    /// Regex search, unanchored (at least one match anywhere in the input)
    Regex(Regex),
    /// Exact byte equality
    Bytes(Vec<u8>),
    /// Structural equality of decoded JSON
    Json(JsonMatcher),
}

/// Reference JSON value plus the decoder that normalizes candidates.
///
/// Typed matchers decode candidates through the reference type, so fields the
/// type ignores, integer literals for float fields and omitted optional fields
/// all normalize to the reference shape. Equality only looks at the reference.
#[derive(Clone)]
pub struct JsonMatcher {
    expected: Value,
    decode: JsonDecoder,
}

impl JsonMatcher {
    pub fn expected(&self) -> &Value {
        &self.expected
    }

    fn matches(&self, candidate: &[u8]) -> bool {
        (self.decode)(candidate).is_some_and(|actual| actual == self.expected)
    }
}

impl fmt::Debug for JsonMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JsonMatcher").field(&self.expected).finish()
    }
}

impl Matcher {
    pub fn exact(value: impl Into<String>) -> Self {
        Matcher::Exact(value.into())
    }

    /// Compile a regex matcher.
    ///
    /// Invalid patterns are rejected here, never at match time.
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Matcher::Regex)
            .map_err(|source| StubError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Matcher::Bytes(value.into())
    }

    /// Match bodies that decode as `T` to a value equal to `value`.
    pub fn json<T>(value: &T) -> Result<Self>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let expected = serde_json::to_value(value)?;
        let decode: JsonDecoder = Arc::new(|candidate: &[u8]| {
            let decoded = serde_json::from_slice::<T>(candidate).ok()?;
            serde_json::to_value(decoded).ok()
        });
        Ok(Matcher::Json(JsonMatcher { expected, decode }))
    }

    /// Match bodies whose untyped JSON equals `value`.
    pub fn json_value(value: Value) -> Self {
        let decode: JsonDecoder =
            Arc::new(|candidate: &[u8]| serde_json::from_slice::<Value>(candidate).ok());
        Matcher::Json(JsonMatcher {
            expected: value,
            decode,
        })
    }

    /// Test a string candidate, such as a request URL.
    pub fn matches_str(&self, candidate: &str) -> bool {
        match self {
            Matcher::Exact(value) => value == candidate,
            Matcher::Regex(regex) => regex.is_match(candidate),
            Matcher::Bytes(_) => false,
            Matcher::Json(json) => json.matches(candidate.as_bytes()),
        }
    }

    /// Test a byte candidate, such as a request body.
    pub fn matches_bytes(&self, candidate: &[u8]) -> bool {
        match self {
            Matcher::Exact(value) => value.as_bytes() == candidate,
            Matcher::Regex(regex) => std::str::from_utf8(candidate)
                .map(|s| regex.is_match(s))
                .unwrap_or(false),
            Matcher::Bytes(value) => value.as_slice() == candidate,
            Matcher::Json(json) => json.matches(candidate),
        }
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Matcher::Exact(a), Matcher::Exact(b)) => a == b,
            // Inline flags live in the pattern text
            (Matcher::Regex(a), Matcher::Regex(b)) => a.as_str() == b.as_str(),
            (Matcher::Bytes(a), Matcher::Bytes(b)) => a == b,
            (Matcher::Json(a), Matcher::Json(b)) => a.expected == b.expected,
            _ => false,
        }
    }
}

impl Eq for Matcher {}

impl Hash for Matcher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Matcher::Exact(value) => value.hash(state),
            Matcher::Regex(regex) => regex.as_str().hash(state),
            Matcher::Bytes(value) => value.hash(state),
            Matcher::Json(json) => hash_json(&json.expected, state),
        }
    }
}

/// Hash a JSON value independently of object key order.
fn hash_json<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(state),
        Value::Number(n) => n.to_string().hash(state),
        Value::String(s) => s.hash(state),
        Value::Array(items) => {
            items.len().hash(state);
            for item in items {
                hash_json(item, state);
            }
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries.len().hash(state);
            for (key, item) in entries {
                key.hash(state);
                hash_json(item, state);
            }
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(v) => write!(f, "Exact(\"{v}\")"),
            Matcher::Regex(r) => write!(f, "Regex(\"{}\")", r.as_str()),
            Matcher::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Matcher::Json(j) => write!(f, "Json({})", j.expected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_regex_matches_anywhere() {
        let matcher = Matcher::regex("Fo+").unwrap();

        assert!(matcher.matches_str("Foooo"));
        assert!(matcher.matches_str("Fo"));
        assert!(matcher.matches_str("xxFoxx"));
        assert!(!matcher.matches_str("F"));
        assert!(!matcher.matches_str("Wrong"));
    }

    #[test]
    fn test_anchored_regex() {
        let matcher = Matcher::regex("^http://www.example.com").unwrap();

        assert!(matcher.matches_str("http://www.example.com/phone"));
        assert!(!matcher.matches_str("foohttp://www.example.com/phone"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = Matcher::regex("Fo(").unwrap_err();
        assert!(matches!(err, StubError::InvalidPattern { ref pattern, .. } if pattern == "Fo("));
    }

    #[test]
    fn test_regex_equality() {
        assert_eq!(Matcher::regex("Fo+").unwrap(), Matcher::regex("Fo+").unwrap());
        assert_ne!(Matcher::regex("Fo+").unwrap(), Matcher::regex("Other").unwrap());
        assert_ne!(Matcher::regex("Fo+").unwrap(), Matcher::regex("(?i)Fo+").unwrap());
    }

    #[test]
    fn test_exact_string() {
        let matcher = Matcher::exact("foo");

        assert!(matcher.matches_str("foo"));
        assert!(!matcher.matches_str("foobar"));
        assert!(matcher.matches_bytes(b"foo"));
        assert!(!matcher.matches_bytes(b"bar"));
    }

    #[test]
    fn test_bytes() {
        let matcher = Matcher::bytes(&b"data"[..]);

        assert!(matcher.matches_bytes(b"data"));
        assert!(!matcher.matches_bytes(b"other"));
        assert!(!matcher.matches_str("data"));

        assert_eq!(matcher, Matcher::bytes(b"data".to_vec()));
        assert_ne!(matcher, Matcher::bytes(b"other".to_vec()));
    }

    #[test]
    fn test_regex_on_bytes() {
        let matcher = Matcher::regex(r#""id":\s*\d+"#).unwrap();

        assert!(matcher.matches_bytes(br#"{"id": 42}"#));
        assert!(!matcher.matches_bytes(&[0xff, 0xfe]));
    }

    #[test]
    fn test_json_ignores_key_order_and_whitespace() {
        let matcher = Matcher::json(&json!({"id": 1, "name": "name", "foo": false})).unwrap();

        assert!(matcher.matches_bytes(br#"{"foo":false,"name":"name","id":1}"#));
        assert!(matcher.matches_bytes(b"{ \"name\" : \"name\",\n \"id\" : 1, \"foo\" : false }"));
        assert!(!matcher.matches_bytes(br#"{"id":1,"name":"other","foo":true}"#));
        assert!(!matcher.matches_bytes(b"not json"));
    }

    #[test]
    fn test_json_from_serializable() {
        #[derive(Serialize, Deserialize)]
        struct Payload {
            id: u32,
            name: Option<String>,
        }

        let matcher = Matcher::json(&Payload {
            id: 7,
            name: None,
        })
        .unwrap();

        assert!(matcher.matches_bytes(br#"{"name":null,"id":7}"#));
        assert!(matcher.matches_str(r#"{"id":7,"name":null}"#));
        // Omitted optional field decodes to None
        assert!(matcher.matches_bytes(br#"{"id":7}"#));
        assert!(!matcher.matches_bytes(br#"{"id":8}"#));
    }

    #[test]
    fn test_json_decodes_through_reference_type() {
        #[derive(Serialize, Deserialize)]
        struct Item {
            id: u32,
            price: f64,
        }

        let matcher = Matcher::json(&Item { id: 1, price: 1.0 }).unwrap();

        assert!(matcher.matches_bytes(br#"{"id":1,"price":1}"#));
        assert!(matcher.matches_bytes(br#"{"id":1,"price":1.0,"extra":true}"#));
        assert!(!matcher.matches_bytes(br#"{"id":1,"price":1.5}"#));
        assert!(!matcher.matches_bytes(br#"{"id":1}"#));
    }

    #[test]
    fn test_untyped_json_is_strict() {
        let matcher = Matcher::json_value(json!({"id": 1, "price": 1.0}));

        assert!(matcher.matches_bytes(br#"{"price":1.0,"id":1}"#));
        assert!(!matcher.matches_bytes(br#"{"id":1,"price":1.0,"extra":true}"#));
    }

    #[test]
    fn test_json_equality_is_structural() {
        let a = Matcher::json_value(serde_json::from_str(r#"{"a":1,"b":[1,2]}"#).unwrap());
        let b = Matcher::json_value(serde_json::from_str(r#"{"b":[1,2],"a":1}"#).unwrap());
        let c = Matcher::json_value(json!({"a": 2, "b": [1, 2]}));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        let mut set = HashSet::new();
        set.insert(Matcher::json_value(json!({"a": 1, "b": 2})));
        set.insert(Matcher::json_value(json!({"b": 2, "a": 1})));
        set.insert(Matcher::regex("Fo+").unwrap());
        set.insert(Matcher::regex("Fo+").unwrap());
        set.insert(Matcher::exact("Fo+"));

        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_different_variants_never_equal() {
        assert_ne!(Matcher::exact("data"), Matcher::bytes(b"data".to_vec()));
    }
}
