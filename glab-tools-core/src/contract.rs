//! # contract: seams between the pipelines and the outside world
//!
//! This module defines the traits every external collaborator implements, together
//! with the error taxonomy the pipelines propagate:
//!
//! - [`MappingSource`]: supplies the nested field-definition document of an index
//!   (static dump file, live Elasticsearch/OpenSearch, or a test mock).
//! - [`RepositoryHost`]: the code hosting API used to verify a token and fork repositories.
//! - [`GitRunner`]: local git operations on a working copy.
//!
//! ## Mocking & Testing
//! - The traits are annotated for `mockall`; the generated `Mock*` types are exported
//!   under the `test-export-mocks` feature so integration tests in other crates can use them.
//!
//! ## Errors
//! - [`AdapterError`] and [`EmitError`] are fatal for a schema run; [`SchemaError`] wraps both.
//! - [`DevEnvError`] covers every failure of the dev environment automation.
//! - Malformed mapping nodes are not errors at all: the flattener skips and counts them.

use async_trait::async_trait;
use mockall::automock;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::mapping::FieldDefinitionNode;
use crate::repos::RepoRef;

/// The mapping could not be obtained. Processing halts before flattening.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("there is some problem connecting to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("mapping lookup for index {index} returned {status}: {body}")]
    Status {
        index: String,
        status: u16,
        body: String,
    },
    #[error("index {0} not found")]
    UnknownIndex(String),
    #[error("mapping items for index {0} are empty")]
    EmptyMapping(String),
    #[error("failed to read mapping dump {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse mapping: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The schema table could not be written to its destination.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to create schema file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write schema rows: {0}")]
    Csv(#[from] csv::Error),
}

/// Any fatal failure of a schema generation run.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}

#[derive(Debug, Error)]
pub enum DevEnvError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("repository host error: {0}")]
    Host(String),
    #[error("git {command} failed in {dir:?}: {reason}")]
    Git {
        command: String,
        dir: PathBuf,
        reason: String,
    },
    #[error("no local clone of {repository} at {dir:?}, run with --create first")]
    MissingClone { repository: String, dir: PathBuf },
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid repository {0:?}, expected owner/name")]
    InvalidRepository(String),
}

/// Trait for obtaining the field-definition document of an index.
///
/// Implementations must return [`AdapterError::EmptyMapping`] rather than an empty
/// node when the lookup succeeds but carries no mapping.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait MappingSource: Send + Sync {
    /// Fetch the root node (whose `properties` are the top-level schema fields) of `index`.
    async fn fetch_mapping(&self, index: &str) -> Result<FieldDefinitionNode, AdapterError>;
}

/// The account a [`RepositoryHost`] is authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUser {
    pub login: String,
}

/// Code hosting API (GitHub) used by the dev environment automation.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Resolve the user the configured token belongs to. Fails with
    /// [`DevEnvError::InvalidToken`] when the token is rejected.
    async fn authenticated_user(&self) -> Result<HostUser, DevEnvError>;

    /// Fork `upstream` into the authenticated account and return the fork.
    /// Forking an already forked repository returns the existing fork.
    async fn create_fork(&self, upstream: &RepoRef) -> Result<RepoRef, DevEnvError>;
}

/// Local git operations, one method per command the automation issues.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait GitRunner: Send + Sync {
    /// `git clone --branch <branch> <url> <target>`
    fn clone_branch(&self, url: &str, branch: &str, target: &Path) -> Result<(), DevEnvError>;

    /// `git remote add <name> <url>`
    fn add_remote(&self, repo_dir: &Path, name: &str, url: &str) -> Result<(), DevEnvError>;

    /// `git remote -v`
    fn list_remotes(&self, repo_dir: &Path) -> Result<(), DevEnvError>;

    /// `git fetch <remote>`
    fn fetch(&self, repo_dir: &Path, remote: &str) -> Result<(), DevEnvError>;

    /// `git checkout <branch>`
    fn checkout(&self, repo_dir: &Path, branch: &str) -> Result<(), DevEnvError>;

    /// `git rebase <onto>`
    fn rebase(&self, repo_dir: &Path, onto: &str) -> Result<(), DevEnvError>;
}
