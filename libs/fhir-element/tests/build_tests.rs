use ferrum_context::{CanonicalRegistry, DefinitionStore, DiagnosticCategory, ResolverChain};
use ferrum_element::{serialize, BuildMode, Error, TypedElementBuilder};
use ferrum_format::{ElementNode, Format};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

fn builder(mode: BuildMode) -> TypedElementBuilder {
    let store = DefinitionStore::load(&test_data_dir().join("logical"), Format::Xml)
        .expect("Failed to load logical models");
    assert!(store.warnings().is_empty(), "{:?}", store.warnings());
    let store = Arc::new(store);
    let registry = Arc::new(CanonicalRegistry::from_store(&store));
    let chain = Arc::new(ResolverChain::new().with_source(store));
    TypedElementBuilder::new(registry, chain).with_mode(mode)
}

fn load_source(format: Format) -> ElementNode {
    let path = test_data_dir().join(format!("source1.{}", format.extension()));
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
    format.parse(&text).unwrap()
}

#[test]
fn test_build_binds_definitions() {
    let outcome = builder(BuildMode::Strict)
        .build(&load_source(Format::Xml), "TLeft")
        .unwrap();
    let root = outcome.root;

    assert_eq!(
        root.definition_url(),
        Some("http://hl7.org/fhir/StructureDefinition/tutorial-left")
    );
    assert_eq!(root.path, "TLeft");
    assert_eq!(root.child_value("name"), Some("Ada"));

    let codes: Vec<_> = root
        .children_named("code")
        .map(|c| c.value.as_deref().unwrap())
        .collect();
    assert_eq!(codes, vec!["a", "b"]);
    assert!(root.child("code").unwrap().collection);

    let nested = root.child("nested").unwrap();
    assert_eq!(nested.path, "TLeft.nested");
    let flag = nested.child("flag").unwrap();
    assert_eq!(flag.instance_type.as_deref(), Some("boolean"));
    // No standard package in this chain, so primitives stay untyped
    assert!(flag.is_opaque());
}

#[test]
fn test_xml_and_json_sources_build_equal_trees() {
    let b = builder(BuildMode::Strict);
    let from_xml = b.build(&load_source(Format::Xml), "TLeft").unwrap().root;
    let from_json = b.build(&load_source(Format::Json), "TLeft").unwrap().root;
    assert_eq!(from_xml, from_json);
}

#[test]
fn test_round_trip_through_both_formats() {
    let b = builder(BuildMode::Strict);
    for source_format in Format::ALL {
        let typed = b.build(&load_source(source_format), "TLeft").unwrap().root;
        for format in Format::ALL {
            let text = serialize(&typed, format).unwrap();
            let reparsed = format.parse(&text).unwrap();
            let rebuilt = b.build(&reparsed, "TLeft").unwrap().root;
            assert_eq!(rebuilt, typed, "{source_format} -> {format} round trip");
        }
    }
}

#[test]
fn test_serialized_json_uses_definition_hints() {
    let typed = builder(BuildMode::Strict)
        .build(&load_source(Format::Xml), "TLeft")
        .unwrap()
        .root;
    let json: serde_json::Value =
        serde_json::from_str(&serialize(&typed, Format::Json).unwrap()).unwrap();
    assert_eq!(json["code"], serde_json::json!(["a", "b"]));
    assert_eq!(json["nested"]["flag"], false);
    assert_eq!(json["name"], "Ada");
}

#[test]
fn test_strict_unmatched_child_fails_with_path() {
    let node = load_source(Format::Xml).with_child(ElementNode::primitive("bogus", "x"));
    let err = builder(BuildMode::Strict).build(&node, "TLeft").unwrap_err();
    match err {
        Error::UnmatchedElement { path } => assert_eq!(path, "TLeft.bogus"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_permissive_unmatched_child_yields_one_diagnostic() {
    let node = load_source(Format::Xml).with_child(
        ElementNode::new("bogus").with_child(ElementNode::primitive("inner", "x")),
    );
    let outcome = builder(BuildMode::Permissive).build(&node, "TLeft").unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    let diagnostic = &outcome.diagnostics[0];
    assert_eq!(diagnostic.category, DiagnosticCategory::Build);
    assert_eq!(diagnostic.location, "TLeft.bogus");

    let bogus = outcome.root.child("bogus").unwrap();
    assert!(bogus.is_opaque());
    assert_eq!(bogus.child_value("inner"), Some("x"));
}

#[test]
fn test_decimal_lexical_form_survives_round_trip() {
    let b = builder(BuildMode::Strict);
    for literal in ["0.50", "1.10"] {
        let node = ElementNode::new("TLeft").with_child(ElementNode::primitive("ratio", literal));
        let typed = b.build(&node, "TLeft").unwrap().root;
        assert_eq!(typed.child("ratio").unwrap().instance_type.as_deref(), Some("decimal"));

        for format in Format::ALL {
            let text = serialize(&typed, format).unwrap();
            let rebuilt = b.build(&format.parse(&text).unwrap(), "TLeft").unwrap().root;
            assert_eq!(
                rebuilt.child_value("ratio"),
                Some(literal),
                "{format} rewrote {literal}"
            );
        }

        let json = serialize(&typed, Format::Json).unwrap();
        assert!(json.contains(&format!("\"ratio\": {literal}")), "{json}");
    }
}
