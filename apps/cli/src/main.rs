//! ferrum-maptest - run StructureMaps over FHIR logical models
//!
//! Commands:
//! - `transform` runs the harness over tutorial `step{N}` directories
//! - `convert-logical` writes JSON and re-indented XML copies of XML documents
//! - `convert-maps` compiles `.map` files into StructureMaps through Matchbox

mod config;
mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crate::config::Config;
use ferrum_element::BuildMode;
use ferrum_format::Format;
use ferrum_mapping::{Harness, SimpleCopyEngine, StepReport};
use ferrum_matchbox::MatchboxClient;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "ferrum-maptest", version, about = "FHIR StructureMap test harness")]
struct Cli {
    /// Configuration file (defaults to ./ferrum-maptest.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run maps over the sources of one or more tutorial steps
    Transform {
        /// Directory containing the step{N} directories
        #[arg(long, default_value = ".")]
        base: PathBuf,

        /// Step number to run; repeat for several, omit for all
        #[arg(long = "step")]
        steps: Vec<u32>,

        /// Fail on instance elements without a definition
        #[arg(long)]
        strict: bool,

        /// Target type for maps that do not declare one
        #[arg(long)]
        target_type: Option<String>,

        /// Also run every transform on the Matchbox server
        #[arg(long)]
        cross_validate: bool,

        /// Restrict to one encoding; repeat for several
        #[arg(long = "format")]
        formats: Vec<Format>,
    },

    /// Convert XML documents to JSON and rewrite them as indented XML
    ConvertLogical {
        #[arg(long)]
        dir: PathBuf,
    },

    /// Compile FHIR Mapping Language files into XML and JSON StructureMaps
    ConvertMaps {
        #[arg(long)]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Command::Transform {
            base,
            steps,
            strict,
            target_type,
            cross_validate,
            formats,
        } => {
            let mut harness_config = config
                .harness_config()
                .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
            if strict {
                harness_config.build_mode = BuildMode::Strict;
            }
            if target_type.is_some() {
                harness_config.target_type = target_type;
            }
            if !formats.is_empty() {
                harness_config.formats = formats;
            }

            let mut harness = Harness::new(harness_config, Arc::new(SimpleCopyEngine::new()))
                .context("Failed to set up harness")?;
            if cross_validate || config.matchbox.enabled {
                let client = MatchboxClient::with_base_url(
                    config.matchbox.base_url.clone(),
                    config.matchbox_timeout(),
                )
                .context("Failed to create Matchbox client")?;
                tracing::info!(base_url = %client.base_url(), "Cross-validation enabled");
                harness = harness.with_cross_validator(Arc::new(client));
            }

            let reports = harness
                .run(&base, &steps)
                .await
                .with_context(|| format!("Harness run in {} failed", base.display()))?;
            print_reports(&reports);
        }
        Command::ConvertLogical { dir } => convert_logical(&dir)?,
        Command::ConvertMaps { dir } => {
            let client = MatchboxClient::with_base_url(
                config.matchbox.base_url.clone(),
                config.matchbox_timeout(),
            )
            .context("Failed to create Matchbox client")?;
            convert_maps(&client, &dir).await?;
        }
    }

    Ok(())
}

fn print_reports(reports: &[StepReport]) {
    for report in reports {
        println!("{}", report.step.display());
        for output in &report.outputs {
            println!("  wrote {}", output.display());
        }
        for diagnostic in &report.diagnostics {
            println!("  {diagnostic}");
        }
    }
    let outputs: usize = reports.iter().map(|r| r.outputs.len()).sum();
    let diagnostics: usize = reports.iter().map(|r| r.diagnostics.len()).sum();
    println!(
        "{} step(s), {outputs} output(s), {diagnostics} diagnostic(s)",
        reports.len()
    );
}

/// `x.xml` -> `x.json` (schema-less) and `x.xml.new` (re-indented)
fn convert_logical(dir: &Path) -> anyhow::Result<()> {
    let paths = ferrum_context::documents(dir, Format::Xml)
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    let mut failed = 0usize;
    for path in &paths {
        if let Err(e) = convert_logical_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "Conversion failed");
            failed += 1;
        }
    }

    println!("converted {} of {} file(s)", paths.len() - failed, paths.len());
    if failed > 0 {
        anyhow::bail!("{failed} file(s) could not be converted");
    }
    Ok(())
}

fn convert_logical_file(path: &Path) -> anyhow::Result<()> {
    let xml = fs::read_to_string(path)?;
    let json = ferrum_format::xml_to_json(&xml)?;
    let rewritten = ferrum_format::write_xml(&ferrum_format::parse_xml(&xml)?)?;

    let json_path = path.with_extension("json");
    let xml_path = path.with_extension("xml.new");
    fs::write(&json_path, json)?;
    fs::write(&xml_path, rewritten)?;
    tracing::info!(json = %json_path.display(), xml = %xml_path.display(), "Converted");
    Ok(())
}

/// `x.map` -> `x.xml` and `x.json` via `$convert`
async fn convert_maps(client: &MatchboxClient, dir: &Path) -> anyhow::Result<()> {
    let mut maps = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "map") {
            maps.push(entry.into_path());
        }
    }
    maps.sort();

    for path in &maps {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        for format in Format::ALL {
            let converted = client
                .convert_map(&text, format)
                .await
                .with_context(|| format!("Matchbox could not convert {}", path.display()))?;
            let out = path.with_extension(format.extension());
            fs::write(&out, converted)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            tracing::info!(map = %path.display(), output = %out.display(), "Converted map");
        }
    }
    println!("converted {} map(s)", maps.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_logical_writes_json_and_xml_copies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("left.xml"),
            r#"<TLeft xmlns="http://hl7.org/fhir"><name value="Ada"/><flag value="true"/></TLeft>"#,
        )
        .unwrap();

        convert_logical(dir.path()).unwrap();

        let json = fs::read_to_string(dir.path().join("left.json")).unwrap();
        assert!(json.contains(r#""resourceType": "TLeft""#));
        assert!(json.contains(r#""flag": true"#));
        let xml = fs::read_to_string(dir.path().join("left.xml.new")).unwrap();
        assert!(xml.contains("\n  <name value=\"Ada\"/>"));
    }

    #[test]
    fn convert_logical_reports_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.xml"), "<TLeft>").unwrap();
        assert!(convert_logical(dir.path()).is_err());
    }

    #[test]
    fn cli_parses_repeated_steps() {
        let cli = Cli::try_parse_from([
            "ferrum-maptest",
            "transform",
            "--base",
            "tutorial",
            "--step",
            "1",
            "--step",
            "3",
            "--format",
            "json",
            "--strict",
        ])
        .unwrap();
        match cli.command {
            Command::Transform {
                steps,
                strict,
                formats,
                ..
            } => {
                assert_eq!(steps, vec![1, 3]);
                assert!(strict);
                assert_eq!(formats, vec![Format::Json]);
            }
            _ => panic!("expected transform"),
        }
    }
}
