//! Short type name to canonical URL resolution.

use crate::standard::standard_canonical;
use crate::store::DefinitionStore;
use std::collections::BTreeMap;
use tracing::debug;

/// Outcome of [`CanonicalRegistry::resolve_canonical`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalResolution {
    Resolved(String),
    Unresolved,
}

impl CanonicalResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, CanonicalResolution::Resolved(_))
    }

    /// Same as [`is_resolved`](Self::is_resolved)
    pub fn found(&self) -> bool {
        self.is_resolved()
    }

    pub fn canonical(&self) -> Option<&str> {
        match self {
            CanonicalResolution::Resolved(url) => Some(url),
            CanonicalResolution::Unresolved => None,
        }
    }

    pub fn into_canonical(self) -> Option<String> {
        match self {
            CanonicalResolution::Resolved(url) => Some(url),
            CanonicalResolution::Unresolved => None,
        }
    }
}

/// Maps the short names used by instances and maps to canonical URLs.
///
/// Names registered here (normally the names of loaded logical models) take
/// precedence over the core R4 naming convention, even for standard type
/// names. Names are case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct CanonicalRegistry {
    overrides: BTreeMap<String, String>,
}

impl CanonicalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every structure definition of the store under its name
    pub fn from_store(store: &DefinitionStore) -> Self {
        let mut registry = Self::new();
        for sd in store.structure_definitions() {
            registry.insert(sd.name.clone(), sd.url.clone());
        }
        registry
    }

    /// Add or replace an entry, returning the previous URL
    pub fn insert(&mut self, name: impl Into<String>, url: impl Into<String>) -> Option<String> {
        self.overrides.insert(name.into(), url.into())
    }

    pub fn resolve_canonical(&self, short_name: &str) -> CanonicalResolution {
        let resolution = if let Some(url) = self.overrides.get(short_name) {
            CanonicalResolution::Resolved(url.clone())
        } else if is_absolute(short_name) {
            CanonicalResolution::Resolved(short_name.to_string())
        } else {
            standard_canonical(short_name)
                .map(CanonicalResolution::Resolved)
                .unwrap_or(CanonicalResolution::Unresolved)
        };
        debug!(name = short_name, resolved = ?resolution.canonical(), "Resolved type name");
        resolution
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Registered entries ordered by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides
            .iter()
            .map(|(name, url)| (name.as_str(), url.as_str()))
    }
}

fn is_absolute(name: &str) -> bool {
    name.starts_with("http://") || name.starts_with("https://") || name.starts_with("urn:")
}
