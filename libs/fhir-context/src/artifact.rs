//! Conformance resources that can be resolved by canonical URL

use crate::error::Result;
use ferrum_models::{CodeSystem, NamingSystem, StructureDefinition, ValueSet};
use serde_json::Value;
use std::sync::Arc;

/// A resolved conformance resource, shared between the store, the resolver
/// cache and typed elements
#[derive(Debug, Clone)]
pub enum Artifact {
    StructureDefinition(Arc<StructureDefinition>),
    CodeSystem(Arc<CodeSystem>),
    ValueSet(Arc<ValueSet>),
    NamingSystem(Arc<NamingSystem>),
}

impl Artifact {
    /// Deserialize a raw resource by its `resourceType`.
    ///
    /// Returns `Ok(None)` for resource types that are not artifacts.
    pub fn from_value(value: Value) -> Result<Option<Self>> {
        let resource_type = value
            .get("resourceType")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let artifact = match resource_type {
            "StructureDefinition" => {
                Artifact::StructureDefinition(Arc::new(StructureDefinition::from_value(value)?))
            }
            "CodeSystem" => Artifact::CodeSystem(Arc::new(CodeSystem::from_value(value)?)),
            "ValueSet" => Artifact::ValueSet(Arc::new(ValueSet::from_value(value)?)),
            "NamingSystem" => Artifact::NamingSystem(Arc::new(NamingSystem::from_value(value)?)),
            _ => return Ok(None),
        };
        Ok(Some(artifact))
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            Artifact::StructureDefinition(_) => "StructureDefinition",
            Artifact::CodeSystem(_) => "CodeSystem",
            Artifact::ValueSet(_) => "ValueSet",
            Artifact::NamingSystem(_) => "NamingSystem",
        }
    }

    /// Canonical URL; naming systems only have one when they declare it
    pub fn url(&self) -> Option<&str> {
        match self {
            Artifact::StructureDefinition(sd) => Some(&sd.url),
            Artifact::CodeSystem(cs) => Some(&cs.url),
            Artifact::ValueSet(vs) => Some(&vs.url),
            Artifact::NamingSystem(ns) => ns.url.as_deref(),
        }
    }

    pub fn as_structure_definition(&self) -> Option<&Arc<StructureDefinition>> {
        match self {
            Artifact::StructureDefinition(sd) => Some(sd),
            _ => None,
        }
    }
}

/// Make sure a structure definition is usable for typed elements.
///
/// Definitions that already went through snapshot completion are returned
/// as-is; others are cloned and completed.
pub(crate) fn complete_structure_definition(
    sd: Arc<StructureDefinition>,
) -> Result<Arc<StructureDefinition>> {
    if sd.snapshot.is_some() && sd.is_abstract == Some(false) {
        return Ok(sd);
    }
    let mut owned = Arc::unwrap_or_clone(sd);
    ferrum_snapshot::ensure_snapshot_in_place(&mut owned)?;
    Ok(Arc::new(owned))
}
