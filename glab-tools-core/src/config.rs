use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::repos::GRIMOIRELAB_REPOSITORIES;

/// Top-level settings shared by all commands. Every section and key is optional;
/// missing values fall back to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub elasticsearch: ElasticsearchConfig,
    pub dev_env: DevEnvConfig,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            elasticsearch_url = %self.elasticsearch.url,
            verify_certs = self.elasticsearch.verify_certs,
            source_dir = %self.dev_env.source_dir.display(),
            repositories = self.dev_env.repositories.len(),
            "Loaded Config"
        );
        debug!(
            username = self.elasticsearch.username.as_deref().unwrap_or(""),
            password_set = self.elasticsearch.password.is_some(),
            doc_type = %self.elasticsearch.doc_type,
            timeout_secs = self.elasticsearch.timeout_secs,
            branch = %self.dev_env.branch,
            "Config loaded (details)"
        );
    }
}

/// Connection settings for the live mapping lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_certs: bool,
    pub timeout_secs: u64,
    /// Mapping type to descend into when the index still uses typed mappings.
    pub doc_type: String,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost:9200".to_string(),
            username: Some("admin".to_string()),
            password: Some("admin".to_string()),
            verify_certs: false,
            timeout_secs: 30,
            doc_type: "items".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevEnvConfig {
    /// Folder holding one working copy per repository.
    pub source_dir: PathBuf,
    pub branch: String,
    /// Repositories as `owner/name`.
    pub repositories: Vec<String>,
    pub github_url: String,
    pub github_api_url: String,
}

impl Default for DevEnvConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("sources"),
            branch: "master".to_string(),
            repositories: GRIMOIRELAB_REPOSITORIES
                .iter()
                .map(|r| r.to_string())
                .collect(),
            github_url: "https://github.com/".to_string(),
            github_api_url: "https://api.github.com".to_string(),
        }
    }
}
