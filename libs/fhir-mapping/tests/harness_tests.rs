use async_trait::async_trait;
use ferrum_context::{CanonicalRegistry, DefinitionStore, DiagnosticCategory, ResolverChain};
use ferrum_element::{BuildMode, TypedElementBuilder};
use ferrum_format::Format;
use ferrum_matchbox::{CrossValidator, RemoteTransform};
use ferrum_mapping::{Harness, HarnessConfig, SimpleCopyEngine};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

/// A scratch copy of the tutorial steps, so results land in a temp dir
fn scratch_base() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    copy_dir(&test_data_dir().join("step1"), &dir.path().join("step1"));
    dir
}

fn harness(formats: Vec<Format>) -> Harness {
    let config = HarnessConfig {
        formats,
        cross_validation_timeout: Duration::from_millis(200),
        ..Default::default()
    };
    Harness::new(config, Arc::new(SimpleCopyEngine::new())).unwrap()
}

fn target_builder(step_dir: &Path) -> TypedElementBuilder {
    let store = Arc::new(DefinitionStore::load(&step_dir.join("logical"), Format::Xml).unwrap());
    let registry = Arc::new(CanonicalRegistry::from_store(&store));
    let chain = Arc::new(ResolverChain::new().with_source(store));
    TypedElementBuilder::new(registry, chain)
}

/// Remote side that never answers within the harness timeout
struct SlowValidator;

#[async_trait]
impl CrossValidator for SlowValidator {
    async fn upload_definitions(
        &self,
        _documents: Vec<String>,
        _format: Format,
    ) -> ferrum_matchbox::Result<()> {
        Ok(())
    }

    async fn transform(&self, _request: RemoteTransform) -> ferrum_matchbox::Result<Vec<u8>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

/// Remote side that echoes a fixed body and records the map URL
struct EchoValidator;

#[async_trait]
impl CrossValidator for EchoValidator {
    async fn upload_definitions(
        &self,
        documents: Vec<String>,
        _format: Format,
    ) -> ferrum_matchbox::Result<()> {
        assert_eq!(documents.len(), 2);
        Ok(())
    }

    async fn transform(&self, request: RemoteTransform) -> ferrum_matchbox::Result<Vec<u8>> {
        assert_eq!(request.map_url, "http://hl7.org/fhir/StructureMap/tutorial");
        assert!(request.source_body.contains("Ada"));
        Ok(b"{\"resourceType\":\"TRight\",\"name\":\"Ada\"}".to_vec())
    }
}

#[tokio::test]
async fn test_tutorial_copy_in_both_formats() {
    let base = scratch_base();
    let reports = harness(Format::ALL.to_vec())
        .run(base.path(), &[1])
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert_eq!(report.outputs.len(), 2);

    let step_dir = base.path().join("step1");
    let result_dir = step_dir.join("result");
    let xml = fs::read_to_string(result_dir.join("tutorial.source1.xml")).unwrap();
    let json = fs::read_to_string(result_dir.join("tutorial.source1.json")).unwrap();

    assert!(xml.contains(r#"<TRight xmlns="http://hl7.org/fhir">"#));
    assert!(xml.contains(r#"<name value="Ada"/>"#));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value,
        serde_json::json!({ "resourceType": "TRight", "name": "Ada" })
    );

    let builder = target_builder(&step_dir);
    let from_xml = builder
        .build(&Format::Xml.parse(&xml).unwrap(), "TRight")
        .unwrap()
        .root;
    let from_json = builder
        .build(&Format::Json.parse(&json).unwrap(), "TRight")
        .unwrap()
        .root;
    assert_eq!(from_xml, from_json);
    assert_eq!(from_xml.child_value("name"), Some("Ada"));
}

#[tokio::test]
async fn test_remote_timeout_keeps_local_results() {
    let base = scratch_base();
    let harness = harness(vec![Format::Json]).with_cross_validator(Arc::new(SlowValidator));

    let report = harness
        .run_step(&base.path().join("step1"))
        .await
        .unwrap();

    let result_dir = base.path().join("step1").join("result");
    assert!(result_dir.join("tutorial.source1.json").is_file());
    assert!(!result_dir.join("tutorial.source1.matchbox.json").exists());

    assert_eq!(report.diagnostics.len(), 1, "{:?}", report.diagnostics);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.category, DiagnosticCategory::ComparisonUnavailable);
    assert!(diagnostic.location.ends_with("step1/tutorial.source1"));
}

#[tokio::test]
async fn test_remote_result_written_next_to_local() {
    let base = scratch_base();
    let harness = harness(vec![Format::Json]).with_cross_validator(Arc::new(EchoValidator));

    let report = harness
        .run_step(&base.path().join("step1"))
        .await
        .unwrap();
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    let remote = base
        .path()
        .join("step1")
        .join("result")
        .join("tutorial.source1.matchbox.json");
    assert!(report.outputs.contains(&remote));
    assert!(fs::read_to_string(remote).unwrap().contains("Ada"));
}

#[tokio::test]
async fn test_unsupported_rules_still_write_partial_target() {
    let base = scratch_base();
    let step_dir = base.path().join("step1");
    let map = serde_json::json!({
        "resourceType": "StructureMap",
        "url": "http://hl7.org/fhir/StructureMap/partial",
        "name": "partial",
        "status": "draft",
        "structure": [
            { "url": "http://hl7.org/fhir/StructureDefinition/tutorial-left", "mode": "source" },
            { "url": "http://hl7.org/fhir/StructureDefinition/tutorial-right", "mode": "target" }
        ],
        "group": [{
            "name": "partial",
            "input": [
                { "name": "src", "mode": "source" },
                { "name": "tgt", "mode": "target" }
            ],
            "rule": [
                {
                    "name": "name",
                    "source": [{ "context": "src", "element": "name", "variable": "n" }],
                    "target": [{ "context": "tgt", "element": "name", "transform": "copy", "parameter": [{ "valueId": "n" }] }]
                },
                {
                    "name": "shout",
                    "source": [{ "context": "src", "element": "name", "variable": "n" }],
                    "target": [{ "context": "tgt", "element": "name", "transform": "truncate", "parameter": [{ "valueId": "n" }, { "valueInteger": 2 }] }]
                },
                {
                    "name": "guarded",
                    "source": [{ "context": "src", "element": "name", "variable": "n", "condition": "n.length() > 1" }],
                    "target": [{ "context": "tgt", "element": "name", "parameter": [{ "valueId": "n" }] }]
                }
            ]
        }]
    });
    fs::write(
        step_dir.join("map").join("partial.json"),
        serde_json::to_string_pretty(&map).unwrap(),
    )
    .unwrap();

    let report = harness(vec![Format::Json]).run_step(&step_dir).await.unwrap();

    let locations: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| (d.category, d.location.as_str()))
        .collect();
    assert_eq!(
        locations,
        vec![
            (DiagnosticCategory::Transform, "step1/partial.source1#shout"),
            (DiagnosticCategory::Transform, "step1/partial.source1#guarded"),
        ]
    );

    let partial = fs::read_to_string(step_dir.join("result").join("partial.source1.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&partial).unwrap();
    assert_eq!(value["name"], "Ada");
}

#[tokio::test]
async fn test_missing_step_directory_is_an_error() {
    let base = tempfile::tempdir().unwrap();
    let err = harness(vec![Format::Json])
        .run(base.path(), &[7])
        .await
        .unwrap_err();
    assert!(matches!(err, ferrum_mapping::Error::MissingDirectory(_)));
}

/// Puts each `(name, bytes)` next to `source1.xml` in the scratch step
fn add_sources(step_dir: &Path, files: &[(&str, &[u8])]) {
    for (name, bytes) in files {
        fs::write(step_dir.join("source").join(name), bytes).unwrap();
    }
}

#[tokio::test]
async fn test_bad_sources_are_reported_and_skipped() {
    let base = scratch_base();
    let step_dir = base.path().join("step1");
    add_sources(
        &step_dir,
        &[
            ("aaa-bad.xml", &[0xFF, 0xFE, 0x00, 0x41]),
            ("aaa-broken.xml", b"<TLeft>"),
            ("aaa-other.xml", br#"<Foo xmlns="http://hl7.org/fhir"/>"#),
        ],
    );

    let reports = harness(vec![Format::Xml])
        .run(base.path(), &[1])
        .await
        .unwrap();
    let report = &reports[0];

    let found: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| (d.category, file_label(&d.location)))
        .collect();
    assert_eq!(
        found,
        vec![
            (DiagnosticCategory::Load, "aaa-bad.xml".to_string()),
            (DiagnosticCategory::Load, "aaa-broken.xml".to_string()),
            (DiagnosticCategory::Build, "aaa-other.xml".to_string()),
        ],
        "{:?}",
        report.diagnostics
    );

    let output = step_dir.join("result").join("tutorial.source1.xml");
    assert_eq!(report.outputs, vec![output.clone()]);
    assert!(fs::read_to_string(output).unwrap().contains(r#"<name value="Ada"/>"#));
}

#[tokio::test]
async fn test_unknown_root_is_skipped_in_strict_mode() {
    let base = scratch_base();
    let step_dir = base.path().join("step1");
    add_sources(&step_dir, &[("aaa-other.xml", br#"<Foo xmlns="http://hl7.org/fhir"/>"#)]);

    let config = HarnessConfig {
        formats: vec![Format::Xml],
        build_mode: BuildMode::Strict,
        ..Default::default()
    };
    let report = Harness::new(config, Arc::new(SimpleCopyEngine::new()))
        .unwrap()
        .run_step(&step_dir)
        .await
        .unwrap();

    assert_eq!(report.diagnostics.len(), 1, "{:?}", report.diagnostics);
    assert_eq!(report.diagnostics[0].category, DiagnosticCategory::Build);
    assert!(report.diagnostics[0].message.contains("Foo"));
    assert!(step_dir.join("result").join("tutorial.source1.xml").is_file());
}

#[tokio::test]
async fn test_unreadable_definition_disables_remote_only() {
    let base = scratch_base();
    let step_dir = base.path().join("step1");
    fs::write(step_dir.join("logical").join("zzz-bad.xml"), [0xFF, 0xFE, 0x00, 0x41]).unwrap();

    let report = harness(vec![Format::Xml])
        .with_cross_validator(Arc::new(SlowValidator))
        .run_step(&step_dir)
        .await
        .unwrap();

    let categories: Vec<_> = report.diagnostics.iter().map(|d| d.category).collect();
    assert_eq!(
        categories,
        vec![DiagnosticCategory::Load, DiagnosticCategory::ComparisonUnavailable],
        "{:?}",
        report.diagnostics
    );
    assert!(report
        .diagnostics
        .iter()
        .all(|d| d.location.ends_with("zzz-bad.xml")));
    assert_eq!(
        report.outputs,
        vec![step_dir.join("result").join("tutorial.source1.xml")]
    );
}

fn file_label(location: &str) -> String {
    Path::new(location)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
