//! FHIR NamingSystem model
//!
//! NamingSystems have no canonical `url` in R4; they are addressed by their
//! `uri`-typed unique identifiers instead.

use super::complex::*;
use super::error::Result;
use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR NamingSystem resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamingSystem {
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// Canonical identifier (R5); absent in R4
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,

    /// codesystem | identifier | root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub unique_id: Vec<NamingSystemUniqueId>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

fn default_resource_type() -> String {
    "NamingSystem".to_string()
}

/// Unique identifiers used for the system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamingSystemUniqueId {
    /// oid | uuid | uri | other
    #[serde(rename = "type")]
    pub id_type: String,

    pub value: String,

    #[serde(
        default,
        deserialize_with = "lenient::opt_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred: Option<bool>,
}

impl NamingSystem {
    /// Parse from a raw JSON resource, checking `resourceType`
    pub fn from_value(value: Value) -> Result<Self> {
        check_resource_type(&value, "NamingSystem")?;
        Ok(serde_json::from_value(value)?)
    }

    /// Identifiers this system can be resolved by: `url` plus every `uri` unique id
    pub fn canonical_identifiers(&self) -> Vec<&str> {
        self.url
            .as_deref()
            .into_iter()
            .chain(
                self.unique_id
                    .iter()
                    .filter(|u| u.id_type == "uri")
                    .map(|u| u.value.as_str()),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_identifiers_are_canonical() {
        let ns = NamingSystem::from_value(serde_json::json!({
            "resourceType": "NamingSystem",
            "name": "Example",
            "kind": "identifier",
            "uniqueId": [
                { "type": "uri", "value": "http://example.org/ids", "preferred": true },
                { "type": "oid", "value": "1.2.3" }
            ]
        }))
        .unwrap();

        assert_eq!(ns.canonical_identifiers(), vec!["http://example.org/ids"]);
    }
}
