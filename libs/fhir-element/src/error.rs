//! Error types for typed element construction

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown root type: {0}")]
    UnknownRootType(String),

    #[error("No element definition matches {path}")]
    UnmatchedElement { path: String },

    #[error("Cannot add children to untyped element {path}")]
    OpaqueParent { path: String },

    #[error("Format error: {0}")]
    Format(#[from] ferrum_format::FormatError),
}

pub type Result<T> = std::result::Result<T, Error>;
