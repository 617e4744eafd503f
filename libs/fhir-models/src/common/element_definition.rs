//! FHIR ElementDefinition model
//!
//! Version-agnostic model for ElementDefinition (used in StructureDefinition snapshots and differentials)

use super::error::{Error, Result};
use super::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR ElementDefinition - defines an element in a resource or data type structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinition {
    /// Unique id for inter-element referencing
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// Path of the element in the hierarchy (e.g., "TLeft.name")
    pub path: String,

    /// Name for this particular element (in a slice)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_name: Option<String>,

    /// Short label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Full formal definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// Minimum cardinality
    #[serde(
        default,
        deserialize_with = "lenient::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub min: Option<u32>,

    /// Maximum cardinality (can be "*")
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<String>,

    /// Base definition information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<ElementDefinitionBase>,

    /// Reference to definition of content if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_reference: Option<String>,

    /// Data type and profile for this element
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::opt_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub types: Option<Vec<ElementDefinitionType>>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

/// Base definition information for an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDefinitionBase {
    /// Path that identifies the base element
    pub path: String,

    /// Min cardinality of the base element
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub min: Option<u32>,

    /// Max cardinality of the base element
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub max: Option<String>,
}

/// Data type for an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinitionType {
    /// Data type code (a short type name or an absolute canonical URL)
    pub code: String,

    /// Profile (StructureDefinition canonical URLs) that apply
    #[serde(
        default,
        deserialize_with = "lenient::opt_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub profile: Option<Vec<String>>,

    /// Profile (StructureDefinition) for Reference/canonical target types
    #[serde(
        default,
        deserialize_with = "lenient::opt_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_profile: Option<Vec<String>>,
}

impl ElementDefinitionType {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            profile: None,
            target_profile: None,
        }
    }
}

/// Snapshot - a set of elements that define the structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub element: Vec<ElementDefinition>,
}

/// Differential - a set of elements that define changes from the base
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Differential {
    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub element: Vec<ElementDefinition>,
}

impl Snapshot {
    /// Parse from JSON Value
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(Error::from)
    }
}

impl Differential {
    /// Parse from JSON Value
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(Error::from)
    }
}

impl ElementDefinition {
    /// Create an element with only a path (and a matching id)
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: Some(path.clone()),
            path,
            ..Default::default()
        }
    }

    /// Builder-style cardinality setter
    pub fn with_cardinality(mut self, min: u32, max: impl Into<String>) -> Self {
        self.min = Some(min);
        self.max = Some(max.into());
        self
    }

    /// Builder-style type setter
    pub fn with_type(mut self, code: impl Into<String>) -> Self {
        self.types
            .get_or_insert_with(Vec::new)
            .push(ElementDefinitionType::new(code));
        self
    }

    /// Get the key for this element (path:sliceName for slices, just path otherwise)
    pub fn key(&self) -> String {
        if let Some(ref slice_name) = self.slice_name {
            format!("{}:{}", self.path, slice_name)
        } else {
            self.path.clone()
        }
    }

    /// Check if this element has a slice name
    pub fn is_slice(&self) -> bool {
        self.slice_name.is_some()
    }

    /// Get the parent path (everything before the last '.')
    pub fn parent_path(&self) -> Option<String> {
        self.path.rfind('.').map(|pos| self.path[..pos].to_string())
    }

    /// Last segment of the path (`TLeft.name` -> `name`)
    pub fn name(&self) -> &str {
        self.path
            .rsplit_once('.')
            .map(|(_, last)| last)
            .unwrap_or(&self.path)
    }

    /// Check if this element is a descendant of the given path
    pub fn is_descendant_of(&self, parent_path: &str) -> bool {
        self.path.starts_with(parent_path)
            && self.path.len() > parent_path.len()
            && self.path.as_bytes().get(parent_path.len()) == Some(&b'.')
    }

    /// Check if this is a choice type element (ends with [x])
    pub fn is_choice_type(&self) -> bool {
        self.path.ends_with("[x]")
    }

    /// Get type codes for this element
    pub fn type_codes(&self) -> Vec<String> {
        self.types
            .as_ref()
            .map(|types| types.iter().map(|t| t.code.clone()).collect())
            .unwrap_or_default()
    }

    /// Check if element is required (min > 0)
    pub fn is_required(&self) -> bool {
        self.min.unwrap_or(0) > 0
    }

    /// Check if element is array/list (max = "*" or max > 1)
    pub fn is_array(&self) -> bool {
        self.max
            .as_ref()
            .map(|m| m == "*" || m.parse::<u32>().map(|n| n > 1).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Get the cardinality as a string (e.g., "0..1", "1..*")
    pub fn cardinality_string(&self) -> String {
        let min = self.min.unwrap_or(0);
        let max = self.max.as_deref().unwrap_or("*");
        format!("{}..{}", min, max)
    }

    /// Match an instance element name against this element's last path segment.
    ///
    /// Plain elements match by name. Choice elements (`value[x]`) match
    /// `valueString`, `valueBoolean`, ... and return the matched type code.
    pub fn match_name(&self, instance_name: &str) -> Option<NameMatch> {
        let segment = self.name();
        if let Some(prefix) = segment.strip_suffix("[x]") {
            let suffix = instance_name.strip_prefix(prefix)?;
            return self
                .types
                .iter()
                .flatten()
                .find(|t| capitalize(&t.code) == suffix)
                .map(|t| NameMatch::Choice(t.code.clone()));
        }
        (segment == instance_name).then_some(NameMatch::Exact)
    }
}

/// Outcome of [`ElementDefinition::match_name`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    /// Choice element; carries the type code selected by the name suffix
    Choice(String),
}

fn capitalize(code: &str) -> String {
    let mut chars = code.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Snapshot {
    /// Create a new empty snapshot
    pub fn new() -> Self {
        Self {
            element: Vec::new(),
        }
    }

    /// Get an element by path
    pub fn get_element(&self, path: &str) -> Option<&ElementDefinition> {
        self.element.iter().find(|e| e.path == path)
    }

    /// Get all direct children of a path
    pub fn get_children(&self, parent_path: &str) -> Vec<&ElementDefinition> {
        let expected_depth = parent_path.matches('.').count() + 1;
        self.element
            .iter()
            .filter(|e| {
                e.is_descendant_of(parent_path) && e.path.matches('.').count() == expected_depth
            })
            .collect()
    }

    /// Whether any element is declared below `path`
    pub fn has_children(&self, path: &str) -> bool {
        self.element.iter().any(|e| e.is_descendant_of(path))
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl Differential {
    /// Create a new empty differential
    pub fn new() -> Self {
        Self {
            element: Vec::new(),
        }
    }

    /// Get an element by path
    pub fn get_element(&self, path: &str) -> Option<&ElementDefinition> {
        self.element.iter().find(|e| e.path == path)
    }
}

impl Default for Differential {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_key() {
        let mut elem = ElementDefinition::new("TLeft.name");
        elem.slice_name = Some("official".to_string());

        assert_eq!(elem.key(), "TLeft.name:official");
        assert!(elem.is_slice());
    }

    #[test]
    fn test_is_choice_type() {
        let mut elem = ElementDefinition::new("TLeft.value[x]");
        assert!(elem.is_choice_type());

        elem.path = "TLeft.value".to_string();
        assert!(!elem.is_choice_type());
    }

    #[test]
    fn test_cardinality_string() {
        let elem = ElementDefinition::new("TLeft.name").with_cardinality(1, "*");

        assert_eq!(elem.cardinality_string(), "1..*");
        assert!(elem.is_required());
        assert!(elem.is_array());
    }

    #[test]
    fn test_match_name_plain_and_choice() {
        let plain = ElementDefinition::new("TLeft.name").with_type("string");
        assert_eq!(plain.match_name("name"), Some(NameMatch::Exact));
        assert_eq!(plain.match_name("names"), None);

        let choice = ElementDefinition::new("TLeft.value[x]")
            .with_type("string")
            .with_type("boolean");
        assert_eq!(
            choice.match_name("valueBoolean"),
            Some(NameMatch::Choice("boolean".to_string()))
        );
        assert_eq!(choice.match_name("valueInteger"), None);
        assert_eq!(choice.match_name("value"), None);
    }

    #[test]
    fn test_snapshot_children() {
        let snapshot = Snapshot {
            element: vec![
                ElementDefinition::new("TLeft"),
                ElementDefinition::new("TLeft.az1"),
                ElementDefinition::new("TLeft.az1.a"),
                ElementDefinition::new("TLeft.b"),
            ],
        };

        let children: Vec<_> = snapshot
            .get_children("TLeft")
            .into_iter()
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(children, vec!["TLeft.az1", "TLeft.b"]);
        assert!(snapshot.has_children("TLeft.az1"));
        assert!(!snapshot.has_children("TLeft.b"));
    }

    #[test]
    fn test_deserialize_single_type_from_xml_projection() {
        let value = serde_json::json!({
            "id": "TLeft.a",
            "path": "TLeft.a",
            "min": "0",
            "max": "1",
            "type": { "code": "string" }
        });
        let elem: ElementDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(elem.type_codes(), vec!["string"]);
        assert_eq!(elem.min, Some(0));
        assert!(!elem.is_array());
    }
}
