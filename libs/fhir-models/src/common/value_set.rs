//! FHIR ValueSet model
//!
//! Version-agnostic model for ValueSets (terminology)

use super::complex::*;
use super::error::Result;
use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR ValueSet resource
///
/// A set of codes drawn from one or more code systems.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueSet {
    /// Resource type - always "ValueSet"
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

    /// Content logical definition of the value set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compose: Option<ValueSetCompose>,

    /// Additional content (expansion, text, meta, ...)
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

fn default_resource_type() -> String {
    "ValueSet".to_string()
}

/// Content logical definition of the value set (intension)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetCompose {
    /// Include one or more codes from a code system or other value set
    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub include: Vec<ValueSetInclude>,

    /// Explicitly exclude codes
    #[serde(
        default,
        deserialize_with = "lenient::opt_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub exclude: Option<Vec<ValueSetInclude>>,
}

/// Include codes from a code system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetInclude {
    /// The system the codes come from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Specific version of the code system
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,

    /// Select only contents included in specified value set(s)
    #[serde(
        default,
        deserialize_with = "lenient::opt_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub value_set: Option<Vec<String>>,

    /// Specific codes and filters, kept as authored
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

impl ValueSet {
    /// Parse from a raw JSON resource, checking `resourceType`
    pub fn from_value(value: Value) -> Result<Self> {
        check_resource_type(&value, "ValueSet")?;
        Ok(serde_json::from_value(value)?)
    }

    /// Code systems referenced by the compose includes
    pub fn included_systems(&self) -> Vec<&str> {
        self.compose
            .iter()
            .flat_map(|c| c.include.iter())
            .filter_map(|i| i.system.as_deref())
            .collect()
    }
}
