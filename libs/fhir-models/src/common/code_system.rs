//! FHIR CodeSystem model
//!
//! Version-agnostic model for CodeSystems (terminology)

use super::complex::*;
use super::error::Result;
use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR CodeSystem resource
///
/// Declares the existence of and describes a code system or code system supplement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystem {
    /// Resource type - always "CodeSystem"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// Canonical identifier
    pub url: String,

    /// Business version
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,

    /// Name (computer friendly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Publication status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,

    /// If code comparison is case sensitive
    #[serde(
        default,
        deserialize_with = "lenient::opt_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub case_sensitive: Option<bool>,

    /// Content type (not-present | example | fragment | complete | supplement)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<CodeSystemContentMode>,

    /// Concepts in the code system
    #[serde(
        default,
        deserialize_with = "lenient::opt_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub concept: Option<Vec<CodeSystemConcept>>,

    /// Additional content
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

fn default_resource_type() -> String {
    "CodeSystem".to_string()
}

/// Content mode for a code system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeSystemContentMode {
    NotPresent,
    Example,
    Fragment,
    Complete,
    Supplement,
}

/// Concept in the code system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeSystemConcept {
    /// Code that identifies the concept
    #[serde(deserialize_with = "required_string")]
    pub code: String,

    /// Text to display to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// Formal definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// Child concepts (nested hierarchy)
    #[serde(
        default,
        deserialize_with = "lenient::opt_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub concept: Option<Vec<CodeSystemConcept>>,
}

fn required_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    lenient::opt_string(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("missing concept code"))
}

impl CodeSystem {
    /// Parse from a raw JSON resource, checking `resourceType`
    pub fn from_value(value: Value) -> Result<Self> {
        check_resource_type(&value, "CodeSystem")?;
        Ok(serde_json::from_value(value)?)
    }

    /// Find a concept by code, searching nested concepts depth-first
    pub fn find_concept(&self, code: &str) -> Option<&CodeSystemConcept> {
        fn find<'a>(concepts: &'a [CodeSystemConcept], code: &str) -> Option<&'a CodeSystemConcept> {
            concepts.iter().find_map(|c| {
                if c.code == code {
                    Some(c)
                } else {
                    c.concept.as_deref().and_then(|nested| find(nested, code))
                }
            })
        }
        self.concept.as_deref().and_then(|concepts| find(concepts, code))
    }
}
