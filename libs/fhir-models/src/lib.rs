//! FHIR conformance models
//!
//! Strongly-typed Rust structures for the conformance resources the mapping
//! harness reads: StructureDefinition (with its ElementDefinitions),
//! StructureMap, CodeSystem, ValueSet and NamingSystem.
//!
//! # Module Organization
//!
//! - `common`: Version-agnostic models that work across FHIR R4, R4B, and R5
//!
//! # Design Philosophy
//!
//! - **Version-agnostic core**: Common fields present across all FHIR versions
//! - **Extensible**: `extensions` field captures version-specific or custom properties
//! - **Lenient**: Accepts the schema-less JSON projection of FHIR XML, where
//!   single repeats are objects and booleans/integers arrive as strings
//!
//! # Example
//!
//! ```rust
//! use ferrum_models::common::{StructureDefinition, StructureDefinitionKind};
//! use serde_json::json;
//!
//! let sd_json = json!({
//!     "resourceType": "StructureDefinition",
//!     "url": "http://hl7.org/fhir/StructureDefinition/tutorial-left",
//!     "name": "TLeft",
//!     "status": "draft",
//!     "kind": "logical",
//!     "abstract": "false",
//!     "type": "TLeft",
//!     "differential": { "element": { "id": "TLeft", "path": "TLeft" } }
//! });
//!
//! let sd: StructureDefinition = serde_json::from_value(sd_json).unwrap();
//! assert_eq!(sd.name, "TLeft");
//! assert_eq!(sd.kind, StructureDefinitionKind::Logical);
//! assert_eq!(sd.differential.unwrap().element.len(), 1);
//! ```

pub mod common;

// Re-export commonly used types
pub use common::*;
