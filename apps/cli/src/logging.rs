//! Logging setup for the harness binary

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose logs follow the configured level
const CRATES: [&str; 6] = [
    "ferrum_maptest",
    "ferrum_mapping",
    "ferrum_context",
    "ferrum_element",
    "ferrum_matchbox",
    "ferrum_package",
];

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
///
/// Logs go to stderr so converted documents and reports on stdout stay clean.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = build_env_filter(config);
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(level = %config.level, json = config.json, "Logging initialized");
    Ok(())
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = CRATES
            .iter()
            .map(|krate| format!("{krate}={}", config.level))
            .collect();
        EnvFilter::new(format!("warn,{}", directives.join(",")))
    })
}
