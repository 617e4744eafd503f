//! Runs every (map, source) pair of a tutorial step through the local
//! pipeline and, optionally, through a remote engine for comparison.
//!
//! A step directory looks like this:
//!
//! ```text
//! step1/
//!   logical/   StructureDefinitions (XML and JSON variants)
//!   map/       StructureMaps
//!   source/    source instances
//!   result/    written by the harness
//! ```

use crate::engine::TransformationEngine;
use crate::error::{Error, Result};
use crate::worker::WorkerContext;
use ferrum_context::{
    documents, read_document, CanonicalRegistry, DefinitionStore, Diagnostic, PackageSource,
    ResolverChain,
};
use ferrum_element::{serialize, BuildMode, Error as ElementError, TypedElementBuilder};
use ferrum_format::Format;
use ferrum_matchbox::{CrossValidator, RemoteTransform};
use ferrum_models::{StructureMap, StructureMapModelMode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info};

pub const LOGICAL_DIR: &str = "logical";
pub const MAP_DIR: &str = "map";
pub const SOURCE_DIR: &str = "source";
pub const RESULT_DIR: &str = "result";

/// Harness settings
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Encodings to run, each one independently
    pub formats: Vec<Format>,
    pub build_mode: BuildMode,
    /// Target type used when a map does not declare a target structure
    pub target_type: Option<String>,
    /// Standard definitions package (`.tgz` or extracted directory)
    pub standard_package: Option<PathBuf>,
    /// Upper bound for each remote call
    pub cross_validation_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            formats: Format::ALL.to_vec(),
            build_mode: BuildMode::Permissive,
            target_type: None,
            standard_package: None,
            cross_validation_timeout: Duration::from_secs(30),
        }
    }
}

/// What one step produced
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    pub step: PathBuf,
    /// Files written under `result/`, local and remote
    pub outputs: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl StepReport {
    fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.diagnostics.push(diagnostic);
    }
}

type RemoteTask = JoinHandle<ferrum_matchbox::Result<Vec<u8>>>;

pub struct Harness {
    config: HarnessConfig,
    engine: Arc<dyn TransformationEngine>,
    standard: Option<Arc<PackageSource>>,
    cross_validator: Option<Arc<dyn CrossValidator>>,
}

impl Harness {
    /// Create a harness; the standard package, if configured, is loaded once here.
    pub fn new(config: HarnessConfig, engine: Arc<dyn TransformationEngine>) -> Result<Self> {
        let standard = match &config.standard_package {
            Some(path) => {
                let source = PackageSource::open(path)?;
                info!(package = %source.package().manifest.package_id(), "Loaded standard package");
                Some(Arc::new(source))
            }
            None => None,
        };
        Ok(Self {
            config,
            engine,
            standard,
            cross_validator: None,
        })
    }

    pub fn with_cross_validator(mut self, validator: Arc<dyn CrossValidator>) -> Self {
        self.cross_validator = Some(validator);
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the given steps (`step{N}` under `base_dir`). An empty list runs
    /// every step directory found, in numeric order.
    pub async fn run(&self, base_dir: &Path, steps: &[u32]) -> Result<Vec<StepReport>> {
        let steps = if steps.is_empty() {
            discover_steps(base_dir)?
        } else {
            steps.to_vec()
        };

        let mut reports = Vec::with_capacity(steps.len());
        for n in steps {
            reports.push(self.run_step(&base_dir.join(format!("step{n}"))).await?);
        }
        Ok(reports)
    }

    /// Run one step directory in every configured format.
    pub async fn run_step(&self, step_dir: &Path) -> Result<StepReport> {
        for dir in [LOGICAL_DIR, MAP_DIR, SOURCE_DIR] {
            let path = step_dir.join(dir);
            if !path.is_dir() {
                return Err(Error::MissingDirectory(path));
            }
        }
        tokio::fs::create_dir_all(step_dir.join(RESULT_DIR)).await?;

        let mut report = StepReport {
            step: step_dir.to_path_buf(),
            ..Default::default()
        };
        for &format in &self.config.formats {
            self.run_format(step_dir, format, &mut report).await?;
        }
        info!(
            step = %step_dir.display(),
            outputs = report.outputs.len(),
            diagnostics = report.diagnostics.len(),
            "Step finished"
        );
        Ok(report)
    }

    async fn run_format(
        &self,
        step_dir: &Path,
        format: Format,
        report: &mut StepReport,
    ) -> Result<()> {
        let logical_dir = step_dir.join(LOGICAL_DIR);
        let store = Arc::new(DefinitionStore::load(&logical_dir, format)?);
        for warning in store.warnings() {
            report.push(warning.to_diagnostic());
        }

        let registry = CanonicalRegistry::from_store(&store);
        let mut chain = ResolverChain::new().with_source(store.clone());
        if let Some(standard) = &self.standard {
            chain.push_source(standard.clone());
        }
        let builder = TypedElementBuilder::new(Arc::new(registry), Arc::new(chain))
            .with_mode(self.config.build_mode);
        let worker = WorkerContext::new(builder);

        let remote = match &self.cross_validator {
            Some(validator) => self.upload_definitions(validator, &logical_dir, format, report).await?,
            None => None,
        };

        let step_name = file_label(step_dir);
        for map_path in documents(&step_dir.join(MAP_DIR), format)? {
            let map = match read_document(&map_path, format)
                .map_err(Error::from)
                .and_then(|value| Ok(StructureMap::from_value(value)?))
            {
                Ok(map) => map,
                Err(err) => {
                    report.push(Diagnostic::load(map_path.display().to_string(), err.to_string()));
                    continue;
                }
            };
            let map_name = short_name(&map_path);

            let Some(target_type) = self.target_type(&worker, &map) else {
                report.push(Diagnostic::transform(
                    format!("{step_name}/{map_name}"),
                    "no target structure declared and no default target type configured",
                ));
                continue;
            };
            let map_body = match tokio::fs::read_to_string(&map_path).await {
                Ok(body) => body,
                Err(err) => {
                    report.push(Diagnostic::load(map_path.display().to_string(), err.to_string()));
                    continue;
                }
            };

            for source_path in documents(&step_dir.join(SOURCE_DIR), format)? {
                let pair = Pair {
                    step_name: &step_name,
                    map_name: &map_name,
                    map: &map,
                    map_body: &map_body,
                    source_path: &source_path,
                    target_type: &target_type,
                    format,
                };
                self.run_pair(&worker, &pair, remote.as_ref(), step_dir, report)
                    .await?;
            }
        }
        Ok(())
    }

    /// Upload the logical models. A failed upload, or a model file that cannot
    /// be read, disables the remote side for this step and format.
    async fn upload_definitions(
        &self,
        validator: &Arc<dyn CrossValidator>,
        logical_dir: &Path,
        format: Format,
        report: &mut StepReport,
    ) -> Result<Option<Arc<dyn CrossValidator>>> {
        let mut bodies = Vec::new();
        for path in documents(logical_dir, format)? {
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => bodies.push(body),
                Err(err) => {
                    report.push(Diagnostic::comparison_unavailable(
                        path.display().to_string(),
                        format!("cannot upload unreadable definition: {err}"),
                    ));
                    return Ok(None);
                }
            }
        }

        let location = logical_dir.display().to_string();
        let limit = self.config.cross_validation_timeout;
        match timeout(limit, validator.upload_definitions(bodies, format)).await {
            Ok(Ok(())) => Ok(Some(validator.clone())),
            Ok(Err(err)) => {
                report.push(Diagnostic::comparison_unavailable(
                    location,
                    format!("uploading definitions failed: {err}"),
                ));
                Ok(None)
            }
            Err(_) => {
                report.push(Diagnostic::comparison_unavailable(
                    location,
                    format!("uploading definitions timed out after {limit:?}"),
                ));
                Ok(None)
            }
        }
    }

    fn target_type(&self, worker: &WorkerContext, map: &StructureMap) -> Option<String> {
        map.structures(StructureMapModelMode::Target)
            .find_map(|url| worker.chain().structure_definition(url))
            .map(|sd| sd.type_name().to_string())
            .or_else(|| self.config.target_type.clone())
    }

    async fn run_pair(
        &self,
        worker: &WorkerContext,
        pair: &Pair<'_>,
        remote: Option<&Arc<dyn CrossValidator>>,
        step_dir: &Path,
        report: &mut StepReport,
    ) -> Result<()> {
        let source_name = short_name(pair.source_path);
        let location = format!("{}/{}.{}", pair.step_name, pair.map_name, source_name);
        let source_body = match tokio::fs::read_to_string(pair.source_path).await {
            Ok(body) => body,
            Err(err) => {
                report.push(Diagnostic::load(
                    pair.source_path.display().to_string(),
                    err.to_string(),
                ));
                return Ok(());
            }
        };

        // The remote run starts first so it overlaps with the local one
        let remote_task = match (remote, &pair.map.url) {
            (Some(validator), Some(map_url)) => {
                let validator = validator.clone();
                let request = RemoteTransform {
                    map_url: map_url.clone(),
                    map_body: pair.map_body.to_string(),
                    source_body: source_body.clone(),
                    format: pair.format,
                };
                Some(tokio::spawn(async move { validator.transform(request).await }))
            }
            (Some(_), None) => {
                report.push(Diagnostic::comparison_unavailable(
                    location.clone(),
                    "map has no canonical URL to run remotely",
                ));
                None
            }
            (None, _) => None,
        };

        let stem = format!("{}.{}", pair.map_name, source_name);
        let local = self.transform_locally(worker, pair, &source_body, &location, report);
        let local = match local {
            Ok(Some(text)) => {
                let path = result_path(step_dir, &stem, pair.format);
                tokio::fs::write(&path, text).await?;
                info!(output = %path.display(), "Wrote local result");
                report.outputs.push(path);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        };

        if let Some(task) = remote_task {
            self.join_remote(task, step_dir, &stem, pair.format, &location, report)
                .await?;
        }
        local
    }

    /// Build, transform and serialize one pair. `Ok(None)` means the source
    /// could not be parsed or built and a diagnostic was recorded. Only a
    /// strict unmatched element is returned as an error.
    fn transform_locally(
        &self,
        worker: &WorkerContext,
        pair: &Pair<'_>,
        source_body: &str,
        location: &str,
        report: &mut StepReport,
    ) -> Result<Option<String>> {
        let node = match pair.format.parse(source_body) {
            Ok(node) => node,
            Err(err) => {
                report.push(Diagnostic::load(
                    pair.source_path.display().to_string(),
                    err.to_string(),
                ));
                return Ok(None);
            }
        };

        let source = pair.source_path.display().to_string();
        let outcome = match worker.builder().build(&node, &node.name) {
            Ok(outcome) => outcome,
            Err(err @ ElementError::UnmatchedElement { .. }) => return Err(err.into()),
            Err(err) => {
                report.push(Diagnostic::build(source, err.to_string()));
                return Ok(None);
            }
        };
        for diagnostic in outcome.diagnostics {
            report.push(diagnostic);
        }

        let mut target = match worker.builder().empty_root(pair.target_type) {
            Ok(target) => target,
            Err(err) => {
                report.push(Diagnostic::build(location, err.to_string()));
                return Ok(None);
            }
        };
        let errors = self
            .engine
            .transform(worker, &outcome.root, pair.map, &mut target);
        for error in &errors {
            report.push(error.to_diagnostic(location));
        }
        debug!(location, rule_errors = errors.len(), "Local transform done");

        match serialize(&target, pair.format) {
            Ok(text) => Ok(Some(text)),
            Err(err) => {
                report.push(Diagnostic::transform(location, err.to_string()));
                Ok(None)
            }
        }
    }

    async fn join_remote(
        &self,
        mut task: RemoteTask,
        step_dir: &Path,
        stem: &str,
        format: Format,
        location: &str,
        report: &mut StepReport,
    ) -> Result<()> {
        let limit = self.config.cross_validation_timeout;
        let message = match timeout(limit, &mut task).await {
            Ok(Ok(Ok(bytes))) => {
                let path = result_path(step_dir, &format!("{stem}.matchbox"), format);
                tokio::fs::write(&path, bytes).await?;
                info!(output = %path.display(), "Wrote remote result");
                report.outputs.push(path);
                return Ok(());
            }
            Ok(Ok(Err(err))) => format!("remote transform failed: {err}"),
            Ok(Err(err)) => format!("remote transform task failed: {err}"),
            Err(_) => {
                task.abort();
                format!("remote transform timed out after {limit:?}")
            }
        };
        report.push(Diagnostic::comparison_unavailable(location, message));
        Ok(())
    }
}

/// One (map, source) combination within a step and format
struct Pair<'a> {
    step_name: &'a str,
    map_name: &'a str,
    map: &'a StructureMap,
    map_body: &'a str,
    source_path: &'a Path,
    target_type: &'a str,
    format: Format,
}

/// File name up to the first `.`: `tutorial.map.xml` -> `tutorial`
pub fn short_name(path: &Path) -> String {
    let name = file_label(path);
    match name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn result_path(step_dir: &Path, stem: &str, format: Format) -> PathBuf {
    step_dir
        .join(RESULT_DIR)
        .join(format!("{stem}.{}", format.extension()))
}

/// Numbers of the `step{N}` directories under `base_dir`, ascending
pub fn discover_steps(base_dir: &Path) -> Result<Vec<u32>> {
    if !base_dir.is_dir() {
        return Err(Error::MissingDirectory(base_dir.to_path_buf()));
    }
    let mut steps = Vec::new();
    for entry in std::fs::read_dir(base_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(n) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.strip_prefix("step"))
            .and_then(|n| n.parse::<u32>().ok())
        {
            steps.push(n);
        }
    }
    steps.sort_unstable();
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_stops_at_first_dot() {
        assert_eq!(short_name(Path::new("map/tutorial.map.xml")), "tutorial");
        assert_eq!(short_name(Path::new("source/source1.json")), "source1");
        assert_eq!(short_name(Path::new("plain")), "plain");
    }

    #[test]
    fn discover_steps_sorts_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["step10", "step2", "step1", "notes", "stepx"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("step3"), "not a directory").unwrap();
        assert_eq!(discover_steps(dir.path()).unwrap(), vec![1, 2, 10]);
    }

    #[test]
    fn missing_base_dir_is_reported() {
        let err = discover_steps(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, Error::MissingDirectory(_)));
    }
}
