//! Typed trees back to FHIR XML and JSON

use crate::error::Result;
use crate::typed::TypedElement;
use ferrum_format::{ElementNode, Format, ValueKind};

/// Pretty-print a typed tree in the given format.
///
/// Output is deterministic: children are written in tree order, collection
/// elements become JSON arrays and primitive kinds follow the type code.
pub fn serialize(tree: &TypedElement, format: Format) -> Result<String> {
    Ok(format.write(&to_node(tree))?)
}

/// Project a typed tree onto the generic node tree with rendering hints
pub fn to_node(element: &TypedElement) -> ElementNode {
    ElementNode {
        name: element.name.clone(),
        value: element.value.clone(),
        kind: value_kind(element),
        collection: element.collection,
        children: element.children.iter().map(to_node).collect(),
    }
}

fn value_kind(element: &TypedElement) -> ValueKind {
    match element.instance_type.as_deref() {
        Some("boolean") => ValueKind::Boolean,
        Some("integer" | "decimal" | "positiveInt" | "unsignedInt") => ValueKind::Number,
        Some("xhtml") => ValueKind::Xhtml,
        None if element.name == "div"
            && element.value.as_deref().is_some_and(|v| v.starts_with('<')) =>
        {
            ValueKind::Xhtml
        }
        _ => ValueKind::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(name: &str, code: &str, value: &str) -> TypedElement {
        let mut element = TypedElement::opaque(name, format!("TRight.{name}")).with_value(value);
        element.instance_type = Some(code.to_string());
        element
    }

    #[test]
    fn json_scalars_follow_type_codes() {
        let mut root = TypedElement::opaque("TRight", "TRight");
        root.push_child(primitive("flag", "boolean", "true"));
        root.push_child(primitive("count", "integer", "3"));
        root.push_child(primitive("ratio", "decimal", "0.50"));
        root.push_child(primitive("label", "string", "42"));

        let json: serde_json::Value =
            serde_json::from_str(&serialize(&root, Format::Json).unwrap()).unwrap();
        assert_eq!(json["resourceType"], "TRight");
        assert_eq!(json["flag"], true);
        assert_eq!(json["count"], 3);
        assert_eq!(json["ratio"].to_string(), "0.50");
        assert_eq!(json["label"], "42");
    }

    #[test]
    fn collection_flag_makes_arrays() {
        let mut root = TypedElement::opaque("TRight", "TRight");
        let mut code = primitive("code", "code", "a");
        code.collection = true;
        root.push_child(code);

        let json: serde_json::Value =
            serde_json::from_str(&serialize(&root, Format::Json).unwrap()).unwrap();
        assert_eq!(json["code"], serde_json::json!(["a"]));
    }

    #[test]
    fn xml_uses_fhir_namespace_and_value_attributes() {
        let mut root = TypedElement::opaque("TRight", "TRight");
        root.push_child(primitive("name", "string", "Ada"));
        let xml = serialize(&root, Format::Xml).unwrap();
        assert!(xml.starts_with(r#"<TRight xmlns="http://hl7.org/fhir">"#));
        assert!(xml.contains(r#"<name value="Ada"/>"#));
    }
}
