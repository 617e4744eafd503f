//! Error types for the mapping harness

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing directory: {0}")]
    MissingDirectory(PathBuf),

    #[error("Context error: {0}")]
    Context(#[from] ferrum_context::Error),

    #[error("Element error: {0}")]
    Element(#[from] ferrum_element::Error),

    #[error("Format error: {0}")]
    Format(#[from] ferrum_format::FormatError),

    #[error("Model error: {0}")]
    Model(#[from] ferrum_models::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
