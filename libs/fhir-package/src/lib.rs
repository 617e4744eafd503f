//! Read-only access to FHIR NPM packages (`package/package.json` plus one JSON
//! file per resource).
//!
//! Packages are loaded eagerly and indexed by canonical URL so they can act as
//! the last artifact source in a resolver chain.

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Read;
use std::path::Path;
use tar::Archive;
use thiserror::Error;

const MANIFEST_FILE: &str = "package.json";
const INDEX_FILE: &str = ".index.json";

/// FHIR NPM Package manifest (`package/package.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fhir_versions: Vec<String>,
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    #[serde(default)]
    pub author: String,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl PackageManifest {
    /// `name#version`, the usual way packages are referred to
    pub fn package_id(&self) -> String {
        format!("{}#{}", self.name, self.version)
    }
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
    #[error("Missing file: {0}")]
    MissingFile(String),
}

pub type PackageResult<T> = Result<T, PackageError>;

/// Loaded FHIR package with its manifest and conformance resources.
///
/// Files under `package/examples/` and the package index are not resources
/// and are skipped. Resources are kept in file-name order.
#[derive(Debug, Clone)]
pub struct FhirPackage {
    pub manifest: PackageManifest,
    resources: Vec<Value>,
    by_url: HashMap<String, usize>,
}

impl FhirPackage {
    pub fn new(manifest: PackageManifest, resources: Vec<Value>) -> Self {
        let mut by_url = HashMap::new();
        for (idx, resource) in resources.iter().enumerate() {
            if let Some(url) = resource.get("url").and_then(Value::as_str) {
                // First file wins for duplicated canonicals
                by_url.entry(url.to_string()).or_insert(idx);
            }
        }
        Self {
            manifest,
            resources,
            by_url,
        }
    }

    /// Load package from a tar.gz reader.
    pub fn from_tar_gz<R: Read>(reader: R) -> PackageResult<Self> {
        let mut archive = Archive::new(GzDecoder::new(reader));
        let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            let path = entry.path()?.to_string_lossy().to_string();
            let Some(name) = path.strip_prefix("package/") else {
                continue;
            };
            if name.contains('/') || !name.ends_with(".json") {
                continue;
            }
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            files.insert(name.to_string(), contents);
        }

        let manifest = files
            .remove(MANIFEST_FILE)
            .ok_or_else(|| PackageError::MissingFile(format!("package/{MANIFEST_FILE}")))
            .and_then(|bytes| parse_json::<PackageManifest>(&bytes))?;
        files.remove(INDEX_FILE);

        let resources = files
            .values()
            .map(|bytes| parse_json(bytes))
            .collect::<PackageResult<Vec<Value>>>()?;
        Ok(Self::new(manifest, resources))
    }

    /// Load package from tar.gz bytes.
    pub fn from_tar_gz_bytes(bytes: &[u8]) -> PackageResult<Self> {
        Self::from_tar_gz(std::io::Cursor::new(bytes))
    }

    /// Load an extracted package directory (the one holding `package.json`).
    pub fn from_directory(package_dir: &Path) -> PackageResult<Self> {
        let manifest_path = package_dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(PackageError::MissingFile(
                manifest_path.to_string_lossy().into(),
            ));
        }
        let manifest = parse_json::<PackageManifest>(&fs::read(manifest_path)?)?;

        let mut paths = Vec::new();
        for entry in fs::read_dir(package_dir)? {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if path.is_file()
                && path.extension() == Some("json".as_ref())
                && name != MANIFEST_FILE
                && name != INDEX_FILE
            {
                paths.push(path);
            }
        }
        paths.sort();

        let resources = paths
            .iter()
            .map(|p| parse_json(&fs::read(p)?))
            .collect::<PackageResult<Vec<Value>>>()?;
        Ok(Self::new(manifest, resources))
    }

    pub fn resources(&self) -> &[Value] {
        &self.resources
    }

    /// Resource with the given canonical URL
    pub fn resource_by_url(&self, url: &str) -> Option<&Value> {
        self.by_url.get(url).map(|&idx| &self.resources[idx])
    }

    pub fn resources_of_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a Value> {
        self.resources
            .iter()
            .filter(move |r| r.get("resourceType").and_then(Value::as_str) == Some(resource_type))
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> PackageResult<T> {
    let cleaned = clean_bytes(bytes)?;
    Ok(serde_json::from_str(&cleaned)?)
}

/// Strip a UTF-8 BOM and stray control characters that some published
/// packages carry.
fn clean_bytes(bytes: &[u8]) -> PackageResult<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let content = std::str::from_utf8(bytes)
        .map_err(|e| PackageError::InvalidStructure(format!("Invalid UTF-8: {}", e)))?;

    Ok(content
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\x7F'))
        .collect::<String>()
        .trim()
        .to_string())
}
