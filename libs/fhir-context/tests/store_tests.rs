use ferrum_context::{
    Artifact, CanonicalRegistry, DefinitionStore, DiagnosticCategory, PackageSource, ResolverChain,
};
use ferrum_format::Format;
use ferrum_package::{FhirPackage, PackageManifest};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn write_definition(dir: &Path, file: &str, name: &str, url: &str) {
    let sd = json!({
        "resourceType": "StructureDefinition",
        "url": url,
        "name": name,
        "status": "draft",
        "kind": "logical",
        "abstract": false,
        "type": name,
        "differential": { "element": [{ "id": name, "path": name }] }
    });
    fs::write(dir.join(file), serde_json::to_string_pretty(&sd).unwrap()).unwrap();
}

#[test]
fn test_malformed_file_is_skipped_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    write_definition(
        dir.path(),
        "tleft.json",
        "TLeft",
        "http://hl7.org/fhir/StructureDefinition/tutorial-left",
    );
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

    let store = DefinitionStore::load(dir.path(), Format::Json).unwrap();
    assert!(store.structure_definition("TLeft").is_some());
    assert_eq!(store.warnings().len(), 1);

    let warning = &store.warnings()[0];
    assert!(warning.path.ends_with("broken.json"));
    let diagnostic = warning.to_diagnostic();
    assert_eq!(diagnostic.category, DiagnosticCategory::Load);
    assert!(diagnostic.location.contains("broken.json"));
}

#[test]
fn test_wrong_shape_definition_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    // StructureDefinition without the mandatory kind
    fs::write(
        dir.path().join("nokind.json"),
        r#"{ "resourceType": "StructureDefinition", "url": "http://x/y", "name": "Y" }"#,
    )
    .unwrap();

    let store = DefinitionStore::load(dir.path(), Format::Json).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.warnings().len(), 1);
}

#[test]
fn test_duplicate_name_keeps_later_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    write_definition(&dir.path().join("b"), "tleft.json", "TLeft", "http://example.org/b/TLeft");
    write_definition(&dir.path().join("a"), "tleft.json", "TLeft", "http://example.org/a/TLeft");

    let store = DefinitionStore::load(dir.path(), Format::Json).unwrap();
    let registry = CanonicalRegistry::from_store(&store);
    assert_eq!(
        registry.resolve_canonical("TLeft").canonical(),
        Some("http://example.org/b/TLeft")
    );
    // Both remain addressable by URL
    assert!(store.artifact("http://example.org/a/TLeft").is_some());
}

#[test]
fn test_duplicate_url_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let url = "http://example.org/StructureDefinition/shared";
    write_definition(dir.path(), "a.json", "TFirst", url);
    write_definition(dir.path(), "b.json", "TSecond", url);

    let store = DefinitionStore::load(dir.path(), Format::Json).unwrap();
    assert!(store.structure_definition("TFirst").is_some());
    assert!(store.structure_definition("TSecond").is_some());

    assert_eq!(store.warnings().len(), 1);
    let warning = &store.warnings()[0];
    assert!(warning.path.ends_with("b.json"));
    assert!(warning.message.contains(url));
    assert!(warning.message.contains("a.json"));

    match store.artifact(url) {
        Some(Artifact::StructureDefinition(sd)) => assert_eq!(sd.name, "TSecond"),
        other => panic!("unexpected artifact: {other:?}"),
    }
}

#[test]
fn test_store_then_package_chain() {
    let dir = tempfile::tempdir().unwrap();
    write_definition(
        dir.path(),
        "tright.json",
        "TRight",
        "http://hl7.org/fhir/StructureDefinition/tutorial-right",
    );
    let store = Arc::new(DefinitionStore::load(dir.path(), Format::Json).unwrap());
    let registry = CanonicalRegistry::from_store(&store);

    let manifest: PackageManifest =
        serde_json::from_value(json!({ "name": "hl7.fhir.r4.core", "version": "4.0.1" })).unwrap();
    let package = FhirPackage::new(
        manifest,
        vec![json!({
            "resourceType": "StructureDefinition",
            "url": "http://hl7.org/fhir/StructureDefinition/string",
            "name": "string",
            "kind": "primitive-type",
            "type": "string",
            "differential": { "element": [{ "path": "string" }, { "path": "string.value" }] }
        })],
    );

    let chain = ResolverChain::new()
        .with_source(store)
        .with_source(Arc::new(PackageSource::new(package)));

    let tright = chain.structure_definition_by_name("TRight", &registry).unwrap();
    assert_eq!(tright.snapshot_elements().len(), 1);

    // Package definitions only carrying a differential are completed on load
    let string = chain.structure_definition_by_name("string", &registry).unwrap();
    assert_eq!(string.snapshot_elements().len(), 2);
    assert!(chain.structure_definition_by_name("Unknown", &registry).is_none());
}
