//! FHIR StructureDefinition snapshot completion
//!
//! Logical models written for mapping exercises usually ship with a
//! differential only. Typed-element construction needs a snapshot, so this
//! crate promotes the differential to a snapshot verbatim: no inheritance from
//! the base definition, no cardinality narrowing, no binding checks.
//!
//! # Example
//!
//! ```rust
//! use ferrum_models::{Differential, ElementDefinition, StructureDefinition, StructureDefinitionKind};
//! use ferrum_snapshot::ensure_snapshot;
//!
//! let mut sd = StructureDefinition::new(
//!     "http://hl7.org/fhir/StructureDefinition/tutorial-left",
//!     "TLeft",
//!     StructureDefinitionKind::Logical,
//! );
//! sd.differential = Some(Differential {
//!     element: vec![ElementDefinition::new("TLeft"), ElementDefinition::new("TLeft.name")],
//! });
//!
//! let sd = ensure_snapshot(sd).unwrap();
//! assert_eq!(sd.snapshot_elements().len(), 2);
//! assert_eq!(sd.is_abstract, Some(false));
//! ```

pub mod completer;
pub mod error;

pub use completer::{ensure_snapshot, ensure_snapshot_in_place, promote_differential};
pub use error::{Error, Result};
pub use ferrum_models::{Differential, ElementDefinition, Snapshot};
