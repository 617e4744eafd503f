//! Layered configuration for the mapping harness
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `ferrum-maptest.toml` in the working directory, or the file given with `--config`
//! 3. environment variables, e.g. `FERRUM_MAPTEST__HARNESS__STRICT=true`
//!
//! A `.env` file is loaded into the environment before anything else.

use ::config::{Environment, File};
use ferrum_element::BuildMode;
use ferrum_format::Format;
use ferrum_mapping::HarnessConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "FERRUM_MAPTEST";
const DEFAULT_FILE: &str = "ferrum-maptest";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub harness: HarnessSettings,
    pub matchbox: MatchboxConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default level for the harness crates; `RUST_LOG` takes precedence
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarnessSettings {
    pub strict: bool,
    #[serde(default)]
    pub target_type: Option<String>,
    /// Standard definitions package, `.tgz` or extracted directory
    #[serde(default)]
    pub standard_package: Option<PathBuf>,
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchboxConfig {
    /// Cross-validate every transform against the remote engine
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from defaults, the optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        // A missing .env is the normal case
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };

        ::config::Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("harness.strict", false)?
            .set_default("harness.formats", vec!["xml", "json"])?
            .set_default("matchbox.enabled", false)?
            .set_default("matchbox.base_url", ferrum_matchbox::DEFAULT_BASE_URL)?
            .set_default("matchbox.timeout_secs", 30)?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("harness.formats"),
            )
            .build()?
            .try_deserialize()
    }

    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> Result<(), String> {
        self.formats()?;
        if self.matchbox.timeout_secs == 0 {
            return Err("matchbox.timeout_secs must be greater than zero".to_string());
        }
        if self.matchbox.base_url.trim().is_empty() {
            return Err("matchbox.base_url must not be empty".to_string());
        }
        if let Some(path) = &self.harness.standard_package {
            if !path.exists() {
                return Err(format!(
                    "harness.standard_package {} does not exist",
                    path.display()
                ));
            }
        }
        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(format!("logging.level '{other}' is not a log level")),
        }
    }

    pub fn formats(&self) -> Result<Vec<Format>, String> {
        if self.harness.formats.is_empty() {
            return Err("harness.formats must name at least one format".to_string());
        }
        let mut formats = Vec::with_capacity(self.harness.formats.len());
        for name in &self.harness.formats {
            let format: Format = name.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        Ok(formats)
    }

    pub fn matchbox_timeout(&self) -> Duration {
        Duration::from_secs(self.matchbox.timeout_secs)
    }

    pub fn harness_config(&self) -> Result<HarnessConfig, String> {
        Ok(HarnessConfig {
            formats: self.formats()?,
            build_mode: if self.harness.strict {
                BuildMode::Strict
            } else {
                BuildMode::Permissive
            },
            target_type: self.harness.target_type.clone(),
            standard_package: self.harness.standard_package.clone(),
            cross_validation_timeout: self.matchbox_timeout(),
        })
    }
}
