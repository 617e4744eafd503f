//! Shared complex datatypes and code enums used by the conformance models

use serde::{Deserialize, Serialize};

/// Publication status of a conformance resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Draft,
    Active,
    Retired,
    Unknown,
}

/// Contact information for the publisher
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactDetail {
    /// Name of an individual to contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Contact details for individual or organization
    #[serde(
        default,
        deserialize_with = "super::lenient::opt_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub telecom: Option<Vec<serde_json::Value>>,
}

/// Reads `resourceType` from a raw resource and checks it against `expected`.
pub(crate) fn check_resource_type(value: &serde_json::Value, expected: &str) -> super::Result<()> {
    match value.get("resourceType").and_then(serde_json::Value::as_str) {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(super::Error::UnexpectedResourceType {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        None => Err(super::Error::MissingField("resourceType".to_string())),
    }
}
