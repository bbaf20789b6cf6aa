/// `load_config` module: loads the optional YAML config file and merges environment overrides
/// into the strongly typed settings of [`glab_tools_core::config`].
///
/// # Responsibilities
/// - Parse the user-supplied YAML file, if any; every key is optional
/// - Apply environment overrides (`ELASTICSEARCH_URL`, `ELASTICSEARCH_USERNAME`,
///   `ELASTICSEARCH_PASSWORD`) on top of file values
/// - Pick up the GitHub token from `GITHUB_TOKEN` so it never has to live in a file
///
/// # Errors
/// All errors use `anyhow::Error` with the offending path attached, and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use glab_tools_core::config::Config;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug)]
pub struct CliConfig {
    pub settings: Config,
    pub github_token: Option<String>,
}

/// Loads the YAML config at `path` (defaults when `None`) and applies environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let mut settings = match path {
        Some(path) => read_config_file(path)?,
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };

    if let Ok(url) = env::var("ELASTICSEARCH_URL") {
        info!(url = %url, "ELASTICSEARCH_URL found in env");
        settings.elasticsearch.url = url;
    }
    if let Ok(username) = env::var("ELASTICSEARCH_USERNAME") {
        settings.elasticsearch.username = Some(username);
    }
    if let Ok(password) = env::var("ELASTICSEARCH_PASSWORD") {
        settings.elasticsearch.password = Some(password);
    }

    let github_token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

    settings.trace_loaded();
    Ok(CliConfig {
        settings,
        github_token,
    })
}

fn read_config_file(path: &Path) -> Result<Config> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = fs::read_to_string(path)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            e
        })
        .with_context(|| format!("Failed to read config file {path:?}"))?;

    // An empty file is a valid "all defaults" config.
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Config = serde_yaml::from_str(&content)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            e
        })
        .with_context(|| format!("Failed to parse config YAML {path:?}"))?;
    info!(config_path = ?path, "Parsed config YAML successfully");
    Ok(config)
}
