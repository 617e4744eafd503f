//! Definition context for typed element construction
//!
//! Loads custom (logical) StructureDefinitions from a directory, maps short
//! type names to canonical URLs and resolves canonical URLs through an ordered
//! chain of artifact sources with a per-run cache.
//!
//! ```rust,no_run
//! use ferrum_context::{CanonicalRegistry, DefinitionStore, PackageSource, ResolverChain};
//! use ferrum_format::Format;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> ferrum_context::Result<()> {
//! let store = Arc::new(DefinitionStore::load(Path::new("step1/logical"), Format::Xml)?);
//! let registry = CanonicalRegistry::from_store(&store);
//! let chain = ResolverChain::new()
//!     .with_source(store)
//!     .with_source(Arc::new(PackageSource::open(Path::new("hl7.fhir.r4.core.tgz"))?));
//!
//! let tleft = chain.structure_definition_by_name("TLeft", &registry);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod canonical;
pub mod diagnostics;
pub mod error;
pub mod resolver;
pub mod standard;
pub mod store;

pub use artifact::Artifact;
pub use canonical::{CanonicalRegistry, CanonicalResolution};
pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use error::{Error, Result};
pub use resolver::{ArtifactSource, PackageSource, ResolverChain};
pub use store::{documents, read_document, DefinitionStore, LoadWarning};
