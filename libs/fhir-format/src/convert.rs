use crate::json::{parse_json, write_json};
use crate::xml::{parse_xml, write_xml};
use crate::Result;

/// Convert FHIR XML to pretty-printed FHIR JSON without a schema.
///
/// Primitive kinds are guessed from their lexical form and elements that
/// occur once are written as single values.
pub fn xml_to_json(input: &str) -> Result<String> {
    let mut root = parse_xml(input)?;
    root.infer_kinds();
    write_json(&root)
}

/// Convert FHIR JSON to pretty-printed FHIR XML.
pub fn json_to_xml(input: &str) -> Result<String> {
    let root = parse_json(input)?;
    write_xml(&root)
}
