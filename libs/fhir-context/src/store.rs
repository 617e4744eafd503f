//! Definitions loaded from a directory of FHIR XML or JSON documents.

use crate::artifact::{complete_structure_definition, Artifact};
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::resolver::ArtifactSource;
use ferrum_format::Format;
use ferrum_models::StructureDefinition;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A document that was skipped, or that shadowed another one, while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    pub path: PathBuf,
    pub message: String,
}

impl LoadWarning {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::load(self.path.display().to_string(), self.message.clone())
    }
}

/// In-memory set of custom definitions, keyed by short name and by canonical URL.
///
/// Every structure definition in the store has a snapshot.
#[derive(Debug, Default)]
pub struct DefinitionStore {
    by_name: BTreeMap<String, Arc<StructureDefinition>>,
    name_origin: HashMap<String, String>,
    url_origin: HashMap<String, String>,
    by_url: HashMap<String, Artifact>,
    warnings: Vec<LoadWarning>,
    files_loaded: usize,
}

/// Documents under `root` (recursively) with the extension of `format`, sorted by path
pub fn documents(root: &Path, format: Format) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if entry.file_type().is_file() && Format::from_path(entry.path()) == Some(format) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read a document as a raw JSON resource; XML goes through the generic node tree.
pub fn read_document(path: &Path, format: Format) -> Result<Value> {
    let text = fs::read_to_string(path)?;
    let value = match format {
        Format::Json => serde_json::from_str(&text)?,
        Format::Xml => ferrum_format::to_json_value(&ferrum_format::parse_xml(&text)?),
    };
    Ok(value)
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every document of `format` under `root`.
    ///
    /// Unreadable or malformed documents are skipped and recorded as
    /// [`LoadWarning`]s. Only a missing or unreadable root is an error.
    pub fn load(root: &Path, format: Format) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("definition directory {} does not exist", root.display()),
            )));
        }

        let mut store = Self::new();
        for path in documents(root, format)? {
            if let Err(err) = store.load_file(&path, format) {
                warn!(path = %path.display(), error = %err, "Skipping definition file");
                store.warnings.push(LoadWarning {
                    path: path.clone(),
                    message: err.to_string(),
                });
            }
        }
        debug!(
            root = %root.display(),
            files = store.files_loaded,
            definitions = store.by_name.len(),
            warnings = store.warnings.len(),
            "Loaded definitions"
        );
        Ok(store)
    }

    /// Build a store from artifacts that are already in memory
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = Artifact>) -> Result<Self> {
        let mut store = Self::new();
        for (idx, artifact) in artifacts.into_iter().enumerate() {
            store.insert(artifact, &format!("artifact #{idx}"))?;
        }
        Ok(store)
    }

    fn load_file(&mut self, path: &Path, format: Format) -> Result<()> {
        let value = read_document(path, format)?;
        match Artifact::from_value(value.clone())? {
            Some(artifact) => {
                self.insert(artifact, &path.display().to_string())?;
                self.files_loaded += 1;
            }
            None => {
                let resource_type = value
                    .get("resourceType")
                    .and_then(Value::as_str)
                    .unwrap_or("<none>");
                debug!(path = %path.display(), resource_type, "Ignoring non-definition document");
            }
        }
        Ok(())
    }

    /// Add one artifact; a structure definition replaces an earlier one with
    /// the same name, and any artifact replaces an earlier one with the same
    /// canonical URL.
    pub fn insert(&mut self, artifact: Artifact, origin: &str) -> Result<()> {
        let artifact = match artifact {
            Artifact::StructureDefinition(sd) => {
                let sd = complete_structure_definition(sd)?;
                if let Some(previous) = self.name_origin.insert(sd.name.clone(), origin.to_string())
                {
                    warn!(
                        name = %sd.name,
                        previous = %previous,
                        current = %origin,
                        "Definition name loaded twice; keeping the later one"
                    );
                }
                self.by_name.insert(sd.name.clone(), sd.clone());
                Artifact::StructureDefinition(sd)
            }
            other => other,
        };
        if let Some(url) = artifact.url() {
            if let Some(previous) = self.url_origin.insert(url.to_string(), origin.to_string()) {
                warn!(
                    url,
                    previous = %previous,
                    current = %origin,
                    "Canonical URL loaded twice; keeping the later one"
                );
                self.warnings.push(LoadWarning {
                    path: PathBuf::from(origin),
                    message: format!("canonical URL {url} is also defined by {previous}"),
                });
            }
            self.by_url.insert(url.to_string(), artifact.clone());
        }
        Ok(())
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Structure definitions ordered by short name
    pub fn structure_definitions(&self) -> impl Iterator<Item = &Arc<StructureDefinition>> {
        self.by_name.values()
    }

    pub fn structure_definition(&self, name: &str) -> Option<&Arc<StructureDefinition>> {
        self.by_name.get(name)
    }

    pub fn artifact(&self, url: &str) -> Option<&Artifact> {
        self.by_url.get(url)
    }

    /// Number of documents that yielded an artifact
    pub fn files_loaded(&self) -> usize {
        self.files_loaded
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty() && self.by_name.is_empty()
    }
}

impl ArtifactSource for DefinitionStore {
    fn name(&self) -> &str {
        "custom-directory"
    }

    fn fetch(&self, url: &str) -> Result<Option<Artifact>> {
        Ok(self.by_url.get(url).cloned())
    }
}
