//! Error types for FHIR context

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("StructureDefinition not found: {0}")]
    StructureDefinitionNotFound(String),

    #[error("Unsupported resourceType {resource_type} in {path}")]
    UnsupportedResource {
        path: PathBuf,
        resource_type: String,
    },

    #[error("Artifact source {source_name} failed for {url}: {message}")]
    Source {
        source_name: String,
        url: String,
        message: String,
    },

    #[error("Format error: {0}")]
    Format(#[from] ferrum_format::FormatError),

    #[error("Model error: {0}")]
    Model(#[from] ferrum_models::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] ferrum_snapshot::Error),

    #[error("Package error: {0}")]
    Package(#[from] ferrum_package::PackageError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
