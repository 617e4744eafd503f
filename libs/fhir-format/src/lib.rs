//! FHIR JSON and XML parsing over a schema-agnostic node tree.
//!
//! Both encodings are read into the same [`ElementNode`] tree and written back
//! from it, following the official JSON/XML mapping rules used by HL7 FHIR:
//! - Root element uses the `resourceType` name.
//! - Primitive values are encoded with the `value` attribute.
//! - Primitive metadata (`id`, `extension`) is carried through `_field` entries.
//! - Arrays are represented by repeated elements and aligned metadata arrays.
//!
//! Without a schema the tree cannot know which elements repeat or which
//! primitives are booleans or numbers; [`ElementNode`] carries those as hints
//! that typed layers fill in before writing.

mod convert;
mod json;
mod node;
mod xml;

pub use convert::{json_to_xml, xml_to_json};
pub use json::{parse_json, parse_json_value, to_json_value, write_json};
pub use node::{ElementNode, ValueKind};
pub use xml::{parse_xml, write_xml};

use std::path::Path;
use thiserror::Error;

pub const FHIR_NS: &str = "http://hl7.org/fhir";
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("expected a JSON object for the resource")]
    ExpectedObject,
    #[error("missing resourceType property")]
    MissingResourceType,
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FormatError>;

/// The two interchangeable FHIR encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Xml,
    Json,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Xml, Format::Json];

    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Json => "json",
        }
    }

    /// FHIR media type for request and response bodies
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Xml => "application/fhir+xml",
            Format::Json => "application/fhir+json",
        }
    }

    /// Detect the format from a file extension (`.xml` / `.json`)
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "xml" => Some(Format::Xml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    /// Parse a document in this format into a node tree
    pub fn parse(self, input: &str) -> Result<ElementNode> {
        match self {
            Format::Xml => parse_xml(input),
            Format::Json => parse_json(input),
        }
    }

    /// Pretty-print a node tree in this format
    pub fn write(self, root: &ElementNode) -> Result<String> {
        match self {
            Format::Xml => write_xml(root),
            Format::Json => write_json(root),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(Format::Xml),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown format '{other}' (expected xml or json)")),
        }
    }
}
