use crate::node::{ElementNode, ValueKind};
use crate::{Result, FHIR_NS, XHTML_NS};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use roxmltree::Document;
use std::io::Cursor;

/// Attributes that FHIR XML uses instead of child elements
const ATTRIBUTE_CHILDREN: [&str; 2] = ["id", "url"];

/// Parse a FHIR XML document into a node tree.
pub fn parse_xml(input: &str) -> Result<ElementNode> {
    let doc = Document::parse(input)?;
    Ok(read_element(input, &doc.root_element()))
}

fn read_element(source: &str, node: &roxmltree::Node) -> ElementNode {
    let mut element = ElementNode::new(node.tag_name().name());

    if node.tag_name().namespace().is_some_and(|ns| ns == XHTML_NS) {
        element.value = Some(source[node.range()].to_string());
        element.kind = ValueKind::Xhtml;
        return element;
    }

    element.value = node.attribute("value").map(str::to_string);
    for attr in ATTRIBUTE_CHILDREN {
        if let Some(value) = node.attribute(attr) {
            element.children.push(ElementNode::primitive(attr, value));
        }
    }
    element.children.extend(
        node.children()
            .filter(|c| c.is_element())
            .map(|c| read_element(source, &c)),
    );
    element
}

/// Pretty-print a node tree as FHIR XML (two-space indentation).
pub fn write_xml(root: &ElementNode) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let mut start = BytesStart::new(root.name.as_str());
    start.push_attribute(("xmlns", FHIR_NS));
    if root.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        for child in &root.children {
            write_element(&mut writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(root.name.as_str())))?;
    }

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

/// Element ids and extension urls are folded into the start tag; resource-level
/// children are written by the caller and stay elements.
fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, node: &ElementNode) -> Result<()> {
    if node.kind == ValueKind::Xhtml {
        if let Some(raw) = &node.value {
            writer.write_event(Event::Text(BytesText::from_escaped(raw.as_str())))?;
        }
        return Ok(());
    }

    if let Some(resource) = node.wrapped_resource() {
        writer.write_event(Event::Start(BytesStart::new(node.name.as_str())))?;
        write_resource(writer, resource)?;
        writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
        return Ok(());
    }

    let mut start = BytesStart::new(node.name.as_str());
    let mut nested = Vec::with_capacity(node.children.len());
    for child in &node.children {
        if is_attribute(node, child) {
            if let Some(value) = &child.value {
                start.push_attribute((child.name.as_str(), value.as_str()));
            }
        } else {
            nested.push(child);
        }
    }
    if let Some(value) = &node.value {
        start.push_attribute(("value", value.as_str()));
    }

    if nested.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        for child in nested {
            write_element(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
    }
    Ok(())
}

fn write_resource(writer: &mut Writer<Cursor<Vec<u8>>>, resource: &ElementNode) -> Result<()> {
    let mut start = BytesStart::new(resource.name.as_str());
    start.push_attribute(("xmlns", FHIR_NS));
    writer.write_event(Event::Start(start))?;
    for child in &resource.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(resource.name.as_str())))?;
    Ok(())
}

fn is_attribute(parent: &ElementNode, child: &ElementNode) -> bool {
    if child.value.is_none() || !child.children.is_empty() {
        return false;
    }
    match child.name.as_str() {
        "id" => true,
        "url" => matches!(parent.name.as_str(), "extension" | "modifierExtension"),
        _ => false,
    }
}
