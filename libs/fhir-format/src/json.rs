use crate::node::{ElementNode, ValueKind};
use crate::{FormatError, Result};
use serde_json::{Map, Number, Value};

/// Parse a FHIR JSON document into a node tree.
pub fn parse_json(input: &str) -> Result<ElementNode> {
    let value: Value = serde_json::from_str(input)?;
    parse_json_value(&value)
}

/// Convert an already-parsed FHIR JSON resource into a node tree.
pub fn parse_json_value(value: &Value) -> Result<ElementNode> {
    let obj = value.as_object().ok_or(FormatError::ExpectedObject)?;
    read_resource(obj)
}

fn read_resource(obj: &Map<String, Value>) -> Result<ElementNode> {
    let resource_type = obj
        .get("resourceType")
        .and_then(Value::as_str)
        .ok_or(FormatError::MissingResourceType)?;
    let mut root = ElementNode::new(resource_type);
    root.children = read_properties(obj)?;
    Ok(root)
}

fn read_properties(obj: &Map<String, Value>) -> Result<Vec<ElementNode>> {
    let mut children = Vec::new();
    for (key, value) in obj {
        if key == "resourceType" {
            continue;
        }
        if let Some(name) = key.strip_prefix('_') {
            // Metadata without a value (e.g. `_active` carrying only extensions)
            if !obj.contains_key(name) {
                read_property(&mut children, name, &Value::Null, Some(value))?;
            }
            continue;
        }
        read_property(&mut children, key, value, obj.get(&format!("_{key}")))?;
    }
    Ok(children)
}

fn read_property(
    out: &mut Vec<ElementNode>,
    name: &str,
    value: &Value,
    meta: Option<&Value>,
) -> Result<()> {
    match value {
        Value::Array(items) => {
            let metas = meta.and_then(Value::as_array);
            for (idx, item) in items.iter().enumerate() {
                let item_meta = metas.and_then(|m| m.get(idx));
                let mut node = read_node(name, item, item_meta)?;
                node.collection = true;
                out.push(node);
            }
            // Metadata entries beyond the value array (values that are all null)
            if let Some(metas) = metas {
                for item_meta in metas.iter().skip(items.len()) {
                    let mut node = read_node(name, &Value::Null, Some(item_meta))?;
                    node.collection = true;
                    out.push(node);
                }
            }
        }
        Value::Null if meta.and_then(Value::as_array).is_some() => {
            read_property(out, name, &Value::Array(Vec::new()), meta)?;
        }
        other => out.push(read_node(name, other, meta)?),
    }
    Ok(())
}

fn read_node(name: &str, value: &Value, meta: Option<&Value>) -> Result<ElementNode> {
    let mut node = ElementNode::new(name);
    match value {
        Value::Object(obj) if obj.contains_key("resourceType") => {
            node.children.push(read_resource(obj)?);
        }
        Value::Object(obj) => node.children = read_properties(obj)?,
        Value::String(s) => {
            node.value = Some(s.clone());
            if name == "div" && s.starts_with('<') {
                node.kind = ValueKind::Xhtml;
            }
        }
        Value::Bool(b) => {
            node.value = Some(b.to_string());
            node.kind = ValueKind::Boolean;
        }
        Value::Number(n) => {
            node.value = Some(n.to_string());
            node.kind = ValueKind::Number;
        }
        Value::Null | Value::Array(_) => {}
    }
    if let Some(Value::Object(meta)) = meta {
        let mut meta_children = read_properties(meta)?;
        meta_children.append(&mut node.children);
        node.children = meta_children;
    }
    Ok(node)
}

/// Project a node tree onto FHIR JSON.
///
/// Elements repeat as arrays when they occur more than once or carry the
/// `collection` hint; primitives with children get a `_name` metadata entry.
pub fn to_json_value(root: &ElementNode) -> Value {
    let mut map = Map::new();
    map.insert("resourceType".to_string(), Value::String(root.name.clone()));
    map.extend(write_properties(&root.children));
    Value::Object(map)
}

/// Pretty-print a node tree as FHIR JSON.
pub fn write_json(root: &ElementNode) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_json_value(root))?)
}

fn write_properties(children: &[ElementNode]) -> Map<String, Value> {
    // Group siblings by name at the position of their first occurrence
    let mut groups: Vec<(&str, Vec<&ElementNode>)> = Vec::new();
    for child in children {
        match groups.iter_mut().find(|(name, _)| *name == child.name) {
            Some((_, nodes)) => nodes.push(child),
            None => groups.push((child.name.as_str(), vec![child])),
        }
    }

    let mut map = Map::new();
    for (name, nodes) in groups {
        let as_array = nodes.len() > 1 || nodes.iter().any(|n| n.collection);
        let entries: Vec<(Value, Option<Value>)> = nodes.iter().map(|n| write_node(n)).collect();
        let has_meta = entries.iter().any(|(_, meta)| meta.is_some());

        if as_array {
            let (values, metas): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
            if values.iter().any(|v| !v.is_null()) {
                map.insert(name.to_string(), Value::Array(values));
            }
            if has_meta {
                let metas = metas
                    .into_iter()
                    .map(|m| m.unwrap_or(Value::Null))
                    .collect();
                map.insert(format!("_{name}"), Value::Array(metas));
            }
        } else if let Some((value, meta)) = entries.into_iter().next() {
            if !value.is_null() {
                map.insert(name.to_string(), value);
            }
            if let Some(meta) = meta {
                map.insert(format!("_{name}"), meta);
            }
        }
    }
    map
}

/// Returns the JSON value for a node plus its `_name` metadata, if any.
fn write_node(node: &ElementNode) -> (Value, Option<Value>) {
    if let Some(resource) = node.wrapped_resource() {
        return (to_json_value(resource), None);
    }
    match &node.value {
        Some(value) => {
            let meta = (!node.children.is_empty())
                .then(|| Value::Object(write_properties(&node.children)));
            (primitive_value(value, node.kind), meta)
        }
        None if node.children.is_empty() => (Value::Null, None),
        None => (Value::Object(write_properties(&node.children)), None),
    }
}

fn primitive_value(value: &str, kind: ValueKind) -> Value {
    match kind {
        ValueKind::Boolean => match value {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(value.to_string()),
        },
        ValueKind::Number => value
            .parse::<Number>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        ValueKind::String | ValueKind::Xhtml => Value::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_become_sibling_nodes() {
        let root = parse_json(r#"{ "resourceType": "TLeft", "a": ["x", "y"], "b": true }"#).unwrap();
        let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "a", "b"]);
        assert!(root.children[0].collection);
        assert_eq!(root.children[2].kind, ValueKind::Boolean);
    }

    #[test]
    fn collection_hint_forces_array() {
        let mut item = ElementNode::primitive("given", "Ada");
        item.collection = true;
        let root = ElementNode::new("TRight").with_child(item);
        let value = to_json_value(&root);
        assert_eq!(value["given"], serde_json::json!(["Ada"]));
    }

    #[test]
    fn missing_resource_type_is_an_error() {
        let err = parse_json(r#"{ "a": 1 }"#).unwrap_err();
        assert!(matches!(err, FormatError::MissingResourceType));
    }

    #[test]
    fn metadata_only_primitive() {
        let root = parse_json(
            r#"{ "resourceType": "Patient", "_active": { "extension": [{ "url": "http://x", "valueBoolean": true }] } }"#,
        )
        .unwrap();
        let active = root.child("active").unwrap();
        assert!(active.value.is_none());
        assert_eq!(active.children[0].name, "extension");
    }

    #[test]
    fn aligned_metadata_arrays() {
        let input = r#"{
            "resourceType": "Patient",
            "given": ["A", "B"],
            "_given": [null, { "id": "g2" }]
        }"#;
        let root = parse_json(input).unwrap();
        let given: Vec<_> = root.children_named("given").collect();
        assert_eq!(given.len(), 2);
        assert!(given[0].children.is_empty());
        assert_eq!(given[1].child_value("id"), Some("g2"));

        let back = to_json_value(&root);
        assert_eq!(back["_given"], serde_json::json!([null, { "id": "g2" }]));
    }

    #[test]
    fn interleaved_repeats_group_at_first_position() {
        let root = ElementNode::new("TLeft")
            .with_child(ElementNode::primitive("a", "1"))
            .with_child(ElementNode::primitive("b", "x"))
            .with_child(ElementNode::primitive("a", "2"));
        let value = to_json_value(&root);
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["resourceType", "a", "b"]);
        assert_eq!(value["a"], serde_json::json!(["1", "2"]));
    }

    #[test]
    fn decimals_keep_their_lexical_form() {
        let root = parse_json(r#"{ "resourceType": "TLeft", "ratio": 0.50, "scale": 1.10 }"#).unwrap();
        assert_eq!(root.child_value("ratio"), Some("0.50"));
        assert_eq!(root.child("ratio").unwrap().kind, ValueKind::Number);

        let text = write_json(&root).unwrap();
        assert!(text.contains(r#""ratio": 0.50"#), "{text}");
        assert!(text.contains(r#""scale": 1.10"#), "{text}");
    }
}
