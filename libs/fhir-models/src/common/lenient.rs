//! Lenient serde adapters
//!
//! FHIR XML carries no type information, so the schema-less JSON projection of
//! an XML document has two systematic differences from real FHIR JSON:
//! repeating elements that occur once are plain objects instead of arrays, and
//! every primitive is a string. These adapters accept both shapes.

use serde::de::{self, Deserialize, DeserializeOwned, Deserializer};
use serde_json::Value;

/// Accept either a single value or an array for a repeating element.
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(de::Error::custom))
            .collect(),
        single => serde_json::from_value(single)
            .map(|item| vec![item])
            .map_err(de::Error::custom),
    }
}

/// Optional variant of [`one_or_many`]; an absent element stays `None`.
pub fn opt_one_or_many<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    one_or_many(deserializer).map(Some)
}

/// Accept `true`/`false` as JSON booleans or as strings.
pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b)),
        Value::String(s) => match s.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(de::Error::custom(format!("invalid boolean: {other}"))),
        },
        other => Err(de::Error::custom(format!("invalid boolean: {other}"))),
    }
}

/// Accept an unsigned integer as a JSON number or as a decimal string.
pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid unsigned integer: {n}"))),
        Value::String(s) => s
            .parse::<u32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid unsigned integer: {s}"))),
        other => Err(de::Error::custom(format!("invalid unsigned integer: {other}"))),
    }
}

/// Accept a string, or a number/boolean that should have been a string.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(de::Error::custom(format!("expected a string, got {other}"))),
    }
}
