//! Ordered, cached lookup of artifacts by canonical URL.

use crate::artifact::{complete_structure_definition, Artifact};
use crate::canonical::CanonicalRegistry;
use crate::error::Result;
use ferrum_models::StructureDefinition;
use ferrum_package::FhirPackage;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// A place artifacts can be fetched from.
///
/// `Ok(None)` means the source does not know the URL; errors are reserved for
/// sources that failed while looking.
pub trait ArtifactSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, url: &str) -> Result<Option<Artifact>>;
}

/// A FHIR package acting as the bundled standard library
#[derive(Debug)]
pub struct PackageSource {
    name: String,
    package: FhirPackage,
}

impl PackageSource {
    pub fn new(package: FhirPackage) -> Self {
        Self {
            name: package.manifest.package_id(),
            package,
        }
    }

    /// Load a `.tgz` package file or an extracted package directory
    pub fn open(path: &Path) -> Result<Self> {
        let package = if path.is_dir() {
            FhirPackage::from_directory(path)?
        } else {
            FhirPackage::from_tar_gz(std::fs::File::open(path)?)?
        };
        Ok(Self::new(package))
    }

    pub fn package(&self) -> &FhirPackage {
        &self.package
    }
}

impl ArtifactSource for PackageSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, url: &str) -> Result<Option<Artifact>> {
        match self.package.resource_by_url(url) {
            Some(value) => Artifact::from_value(value.clone()),
            None => Ok(None),
        }
    }
}

/// Sources consulted in order; the first hit wins and every answer, including
/// "not found", is cached for the lifetime of the chain.
///
/// Freshly fetched structure definitions get a snapshot before they are
/// cached.
#[derive(Default)]
pub struct ResolverChain {
    sources: Vec<Arc<dyn ArtifactSource>>,
    cache: RwLock<HashMap<String, Option<Artifact>>>,
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain")
            .field("sources", &self.source_names())
            .field("cached", &self.cached_len())
            .finish()
    }
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source; sources added first are consulted first
    pub fn with_source(mut self, source: Arc<dyn ArtifactSource>) -> Self {
        self.push_source(source);
        self
    }

    pub fn push_source(&mut self, source: Arc<dyn ArtifactSource>) {
        self.sources.push(source);
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn resolve_by_canonical(&self, url: &str) -> Option<Artifact> {
        let url = url.split_once('|').map_or(url, |(base, _)| base);

        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
        {
            return cached.clone();
        }

        let resolved = self.fetch_uncached(url);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), resolved.clone());
        resolved
    }

    fn fetch_uncached(&self, url: &str) -> Option<Artifact> {
        for source in &self.sources {
            let artifact = match source.fetch(url) {
                Ok(Some(artifact)) => artifact,
                Ok(None) => continue,
                Err(err) => {
                    warn!(source = source.name(), url, error = %err, "Artifact source failed");
                    continue;
                }
            };
            match on_load(artifact) {
                Ok(artifact) => {
                    debug!(source = source.name(), url, "Resolved artifact");
                    return Some(artifact);
                }
                Err(err) => {
                    warn!(source = source.name(), url, error = %err, "Discarding unusable artifact");
                }
            }
        }
        debug!(url, "Artifact not found in any source");
        None
    }

    pub fn structure_definition(&self, url: &str) -> Option<Arc<StructureDefinition>> {
        self.resolve_by_canonical(url)
            .and_then(|a| a.as_structure_definition().cloned())
    }

    /// Resolve a short type name through the registry, then the chain
    pub fn structure_definition_by_name(
        &self,
        name: &str,
        registry: &CanonicalRegistry,
    ) -> Option<Arc<StructureDefinition>> {
        let url = registry.resolve_canonical(name).into_canonical()?;
        self.structure_definition(&url)
    }

    /// Number of cached answers, hits and misses alike
    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Load hook applied once per freshly fetched artifact
fn on_load(artifact: Artifact) -> Result<Artifact> {
    match artifact {
        Artifact::StructureDefinition(sd) => Ok(Artifact::StructureDefinition(
            complete_structure_definition(sd)?,
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::DefinitionStore;
    use ferrum_models::StructureDefinitionKind;
    use ferrum_package::PackageManifest;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PATIENT_URL: &str = "http://hl7.org/fhir/StructureDefinition/Patient";

    fn core_package() -> FhirPackage {
        let manifest: PackageManifest = serde_json::from_value(json!({
            "name": "hl7.fhir.r4.core",
            "version": "4.0.1"
        }))
        .unwrap();
        FhirPackage::new(
            manifest,
            vec![json!({
                "resourceType": "StructureDefinition",
                "url": PATIENT_URL,
                "name": "Patient",
                "kind": "resource",
                "abstract": false,
                "type": "Patient",
                "snapshot": { "element": [{ "path": "Patient" }, { "path": "Patient.active" }] }
            })],
        )
    }

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ArtifactSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(&self, url: &str) -> Result<Option<Artifact>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::StructureDefinitionNotFound(url.to_string()));
            }
            Ok(None)
        }
    }

    #[test]
    fn custom_source_shadows_package() {
        let mut custom = StructureDefinition::new(PATIENT_URL, "Patient", StructureDefinitionKind::Logical);
        custom.title = Some("custom".into());
        let store =
            DefinitionStore::from_artifacts([Artifact::StructureDefinition(Arc::new(custom))]).unwrap();

        let chain = ResolverChain::new()
            .with_source(Arc::new(store))
            .with_source(Arc::new(PackageSource::new(core_package())));

        let sd = chain.structure_definition(PATIENT_URL).unwrap();
        assert_eq!(sd.title.as_deref(), Some("custom"));
        assert_eq!(chain.source_names(), vec!["custom-directory", "hl7.fhir.r4.core#4.0.1"]);
    }

    #[test]
    fn package_hit_and_version_suffix() {
        let chain = ResolverChain::new().with_source(Arc::new(PackageSource::new(core_package())));
        let sd = chain
            .structure_definition(&format!("{PATIENT_URL}|4.0.1"))
            .unwrap();
        assert_eq!(sd.snapshot_elements().len(), 2);
        assert_eq!(chain.cached_len(), 1);
    }

    #[test]
    fn misses_are_cached() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let chain = ResolverChain::new().with_source(source.clone());

        assert!(chain.resolve_by_canonical("http://example.org/missing").is_none());
        assert!(chain.resolve_by_canonical("http://example.org/missing").is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(chain.cached_len(), 1);
    }

    #[test]
    fn failing_source_is_skipped() {
        let chain = ResolverChain::new()
            .with_source(Arc::new(CountingSource {
                calls: AtomicUsize::new(0),
                fail: true,
            }))
            .with_source(Arc::new(PackageSource::new(core_package())));
        assert!(chain.structure_definition(PATIENT_URL).is_some());
    }

    #[test]
    fn lookup_by_name_goes_through_registry() {
        let chain = ResolverChain::new().with_source(Arc::new(PackageSource::new(core_package())));
        let registry = CanonicalRegistry::new();
        assert!(chain.structure_definition_by_name("Patient", &registry).is_some());
        assert!(chain.structure_definition_by_name("TLeft", &registry).is_none());
    }
}
