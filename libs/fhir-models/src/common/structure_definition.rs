//! FHIR StructureDefinition model
//!
//! Version-agnostic model for StructureDefinition. Logical models authored for
//! mapping tutorials usually carry only a differential; the snapshot is filled
//! in later by the snapshot completer.

use super::complex::*;
use super::element_definition::{Differential, ElementDefinition, Snapshot};
use super::error::Result;
use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR StructureDefinition resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinition {
    /// Resource type - always "StructureDefinition"
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

    /// Name (computer friendly) - the short type name used by maps and instances
    pub name: String,

    /// Name (human friendly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Publication status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,

    /// primitive-type | complex-type | resource | logical
    pub kind: StructureDefinitionKind,

    /// Whether the structure is abstract
    #[serde(
        rename = "abstract",
        default,
        deserialize_with = "lenient::opt_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_abstract: Option<bool>,

    /// Type defined or constrained by this structure
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub type_name: Option<String>,

    /// Definition that this type is constrained/specialized from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_definition: Option<String>,

    /// specialization | constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation: Option<TypeDerivationRule>,

    /// Snapshot view of the structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,

    /// Differential view of the structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential: Option<Differential>,

    /// Additional content (text, meta, extensions, mappings, ...)
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

fn default_resource_type() -> String {
    "StructureDefinition".to_string()
}

/// Kind of structure being defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureDefinitionKind {
    PrimitiveType,
    ComplexType,
    Resource,
    Logical,
}

/// How a type relates to its base definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeDerivationRule {
    Specialization,
    Constraint,
}

impl StructureDefinition {
    /// Create a new StructureDefinition with minimal required fields
    pub fn new(
        url: impl Into<String>,
        name: impl Into<String>,
        kind: StructureDefinitionKind,
    ) -> Self {
        let name = name.into();
        Self {
            resource_type: "StructureDefinition".to_string(),
            id: None,
            url: url.into(),
            version: None,
            type_name: Some(name.clone()),
            name,
            title: None,
            status: None,
            kind,
            is_abstract: None,
            base_definition: None,
            derivation: None,
            snapshot: None,
            differential: None,
            extensions: HashMap::new(),
        }
    }

    /// Parse from a raw JSON resource, checking `resourceType`
    pub fn from_value(value: Value) -> Result<Self> {
        check_resource_type(&value, "StructureDefinition")?;
        Ok(serde_json::from_value(value)?)
    }

    /// Whether the structure is abstract (absent means false)
    pub fn is_abstract(&self) -> bool {
        self.is_abstract.unwrap_or(false)
    }

    /// Whether this defines a primitive datatype
    pub fn is_primitive(&self) -> bool {
        self.kind == StructureDefinitionKind::PrimitiveType
    }

    /// Type name used as the root element path; falls back to `name`
    pub fn type_name(&self) -> &str {
        self.type_name.as_deref().unwrap_or(&self.name)
    }

    /// Path of the root element in the snapshot (or the type name if empty)
    pub fn root_path(&self) -> &str {
        self.snapshot
            .as_ref()
            .and_then(|s| s.element.first())
            .map(|e| e.path.as_str())
            .unwrap_or_else(|| self.type_name())
    }

    /// Snapshot elements, empty when no snapshot is present
    pub fn snapshot_elements(&self) -> &[ElementDefinition] {
        self.snapshot
            .as_ref()
            .map(|s| s.element.as_slice())
            .unwrap_or(&[])
    }
}
