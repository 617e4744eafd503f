//! FHIR StructureMap model
//!
//! Pre-parsed form of a mapping-language expression. Only the parts a
//! transformation engine and the harness need are modelled explicitly; the
//! rest is kept in `extensions`.

use super::complex::*;
use super::error::Result;
use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR StructureMap resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureMap {
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// Canonical identifier; used to address the map on a remote server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,

    /// Structure definitions used by this map
    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub structure: Vec<StructureMapStructure>,

    /// Other maps used by this map
    #[serde(
        default,
        deserialize_with = "lenient::one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub import: Vec<String>,

    /// Named sections for reader convenience
    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub group: Vec<StructureMapGroup>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

fn default_resource_type() -> String {
    "StructureMap".to_string()
}

/// source | queried | target | produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMapModelMode {
    Source,
    Queried,
    Target,
    Produced,
}

/// Structure definition used by the map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureMapStructure {
    /// Canonical reference to the structure definition
    pub url: String,

    pub mode: StructureMapModelMode,

    /// Name for type in this map
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Named group of rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapGroup {
    pub name: String,

    /// Another group that this group adds rules to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_mode: Option<String>,

    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub input: Vec<StructureMapGroupInput>,

    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub rule: Vec<StructureMapRule>,
}

/// source | target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMapInputMode {
    Source,
    Target,
}

/// Named instance provided when invoking the map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureMapGroupInput {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    pub mode: StructureMapInputMode,
}

/// Transform rule from source to target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureMapRule {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub source: Vec<StructureMapSource>,

    #[serde(
        default,
        deserialize_with = "lenient::one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub target: Vec<StructureMapTarget>,

    /// Rules contained in this rule
    #[serde(
        default,
        deserialize_with = "lenient::one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub rule: Vec<StructureMapRule>,

    /// Which other rules to apply in the context of this rule
    #[serde(
        default,
        deserialize_with = "lenient::one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub dependent: Vec<Value>,
}

impl StructureMapRule {
    /// Rule name, or `"(unnamed)"` for diagnostics
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }
}

/// Source inputs to the mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapSource {
    /// Type or variable this rule applies to
    pub context: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    /// Named context for field, if a field is specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_mode: Option<String>,
}

/// Content to create because of this mapping rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    /// create | copy | truncate | ... (absent means an implicit copy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub parameter: Vec<StructureMapParameter>,
}

/// Parameters to the transform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub value_boolean: Option<bool>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub value_integer: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub value_decimal: Option<String>,
}

/// A parameter is either a variable reference or a literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue<'a> {
    Variable(&'a str),
    Literal(String),
}

impl StructureMapParameter {
    pub fn value(&self) -> Option<ParameterValue<'_>> {
        if let Some(id) = &self.value_id {
            return Some(ParameterValue::Variable(id));
        }
        self.value_string
            .clone()
            .or_else(|| self.value_boolean.map(|b| b.to_string()))
            .or_else(|| self.value_integer.clone())
            .or_else(|| self.value_decimal.clone())
            .map(ParameterValue::Literal)
    }
}

impl StructureMap {
    /// Parse from a raw JSON resource, checking `resourceType`
    pub fn from_value(value: Value) -> Result<Self> {
        check_resource_type(&value, "StructureMap")?;
        Ok(serde_json::from_value(value)?)
    }

    /// Canonical URLs of the structures declared with the given mode
    pub fn structures(&self, mode: StructureMapModelMode) -> impl Iterator<Item = &str> {
        self.structure
            .iter()
            .filter(move |s| s.mode == mode)
            .map(|s| s.url.as_str())
    }
}
