//! Typed FHIR elements
//!
//! [`TypedElementBuilder`] binds a generic [`ElementNode`](ferrum_format::ElementNode)
//! tree to StructureDefinitions resolved through a
//! [`CanonicalRegistry`](ferrum_context::CanonicalRegistry) and a
//! [`ResolverChain`](ferrum_context::ResolverChain). [`serialize`] writes a
//! typed tree back out as FHIR XML or JSON, using the definitions to decide
//! which elements are arrays and which primitives are booleans or numbers.

pub mod builder;
pub mod error;
pub mod serialize;
pub mod typed;

pub use builder::{BuildMode, BuildOutcome, TypedElementBuilder};
pub use error::{Error, Result};
pub use serialize::{serialize, to_node};
pub use typed::TypedElement;
