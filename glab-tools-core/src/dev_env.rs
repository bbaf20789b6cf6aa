//! GrimoireLab development environment automation.
//!
//! - [`create`]: fork every repository into the authenticated account, clone the fork
//!   into `<source_dir>/<name>` and point an `upstream` remote at the original.
//! - [`update`]: bring every local clone up to date by rebasing onto `upstream/<branch>`.
//!
//! Both walk the repository list sequentially and stop at the first failure, except
//! that an existing non-empty clone folder only skips the clone step.
//! Git itself is driven through [`GitRunner`]; [`CommandGit`] shells out to `git`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info};

use crate::config::DevEnvConfig;
use crate::contract::{DevEnvError, GitRunner, HostUser, RepositoryHost};
use crate::repos::{parse_repositories, RepoRef};

#[derive(Debug, Clone)]
pub struct DevEnvSettings {
    pub source_dir: PathBuf,
    pub branch: String,
    pub repositories: Vec<RepoRef>,
    /// Base for clone URLs, e.g. `https://github.com/`.
    pub clone_base_url: String,
}

impl DevEnvSettings {
    pub fn from_config(config: &DevEnvConfig) -> Result<Self, DevEnvError> {
        Ok(Self {
            source_dir: config.source_dir.clone(),
            branch: config.branch.clone(),
            repositories: parse_repositories(&config.repositories)?,
            clone_base_url: config.github_url.clone(),
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DevEnvReport {
    pub forked: Vec<String>,
    pub cloned: Vec<String>,
    /// Repositories whose clone step was skipped because the folder was already populated.
    pub skipped: Vec<String>,
    pub updated: Vec<String>,
}

/// Verify the host token before doing anything else.
pub async fn check_token<H>(host: &H) -> Result<HostUser, DevEnvError>
where
    H: RepositoryHost + ?Sized,
{
    info!("Checking the access token");
    match host.authenticated_user().await {
        Ok(user) => {
            info!(login = %user.login, "Access token is working");
            Ok(user)
        }
        Err(e) => {
            error!(error = %e, "Access token check failed");
            Err(e)
        }
    }
}

pub async fn create<H, G>(
    host: &H,
    git: &G,
    settings: &DevEnvSettings,
) -> Result<DevEnvReport, DevEnvError>
where
    H: RepositoryHost + ?Sized,
    G: GitRunner + ?Sized,
{
    info!(source_dir = %settings.source_dir.display(), "Setting up the repositories");
    ensure_dir(&settings.source_dir)?;

    let mut report = DevEnvReport::default();
    for upstream in &settings.repositories {
        info!(repository = %upstream, "Forking the repository");
        let fork = host.create_fork(upstream).await.map_err(|e| {
            error!(repository = %upstream, error = %e, "Forking aborted, check the token has the `repo` scope");
            e
        })?;
        report.forked.push(upstream.to_string());

        let target = settings.source_dir.join(&upstream.name);
        if is_populated(&target) {
            info!(path = %target.display(), "Folder already exists and is not empty, cloning skipped");
            report.skipped.push(upstream.to_string());
        } else {
            info!(fork = %fork, path = %target.display(), "Cloning the forked repository");
            git.clone_branch(
                &fork.clone_url(&settings.clone_base_url),
                &settings.branch,
                &target,
            )?;
            info!(repository = %upstream, "Adding the `upstream` remote");
            git.add_remote(
                &target,
                "upstream",
                &upstream.clone_url(&settings.clone_base_url),
            )?;
            report.cloned.push(upstream.to_string());
        }

        git.list_remotes(&target)?;
    }

    info!(
        forked = report.forked.len(),
        cloned = report.cloned.len(),
        skipped = report.skipped.len(),
        "Repositories set up"
    );
    Ok(report)
}

pub fn update<G>(git: &G, settings: &DevEnvSettings) -> Result<DevEnvReport, DevEnvError>
where
    G: GitRunner + ?Sized,
{
    info!(source_dir = %settings.source_dir.display(), "Updating the forks");
    let upstream_branch = format!("upstream/{}", settings.branch);

    let mut report = DevEnvReport::default();
    for repo in &settings.repositories {
        let dir = settings.source_dir.join(&repo.name);
        if !dir.is_dir() {
            error!(repository = %repo, path = %dir.display(), "Local clone missing");
            return Err(DevEnvError::MissingClone {
                repository: repo.to_string(),
                dir,
            });
        }

        info!(repository = %repo, "Fetching upstream");
        git.fetch(&dir, "upstream")?;
        info!(repository = %repo, branch = %settings.branch, "Changing branch");
        git.checkout(&dir, &settings.branch)?;
        info!(repository = %repo, onto = %upstream_branch, "Rebasing");
        git.rebase(&dir, &upstream_branch)?;
        report.updated.push(repo.to_string());
    }
    Ok(report)
}

fn ensure_dir(dir: &Path) -> Result<(), DevEnvError> {
    if dir.is_dir() {
        debug!(path = %dir.display(), "Moving into existing folder");
        return Ok(());
    }
    info!(path = %dir.display(), "Folder not existing, creating new");
    fs::create_dir_all(dir).map_err(|source| DevEnvError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn is_populated(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// [`GitRunner`] backed by the `git` executable on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct CommandGit;

impl CommandGit {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<(), DevEnvError> {
        let mut command = Command::new("git");
        if let Some(dir) = dir {
            command.arg("-C").arg(dir);
        }
        let status = command.args(args).status();

        let cwd = dir.map(Path::to_path_buf).unwrap_or_default();
        match status {
            Ok(s) if s.success() => {
                debug!(args = ?args, path = %cwd.display(), "git succeeded");
                Ok(())
            }
            Ok(s) => {
                error!(args = ?args, path = %cwd.display(), "Git exited with non-zero code: {}", s);
                Err(DevEnvError::Git {
                    command: args.join(" "),
                    dir: cwd,
                    reason: s.to_string(),
                })
            }
            Err(e) => {
                error!(error = ?e, args = ?args, "Failed to launch git process");
                Err(DevEnvError::Git {
                    command: args.join(" "),
                    dir: cwd,
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl GitRunner for CommandGit {
    fn clone_branch(&self, url: &str, branch: &str, target: &Path) -> Result<(), DevEnvError> {
        let target = target.to_string_lossy();
        self.run(None, &["clone", "--branch", branch, url, &*target])
    }

    fn add_remote(&self, repo_dir: &Path, name: &str, url: &str) -> Result<(), DevEnvError> {
        self.run(Some(repo_dir), &["remote", "add", name, url])
    }

    fn list_remotes(&self, repo_dir: &Path) -> Result<(), DevEnvError> {
        self.run(Some(repo_dir), &["remote", "-v"])
    }

    fn fetch(&self, repo_dir: &Path, remote: &str) -> Result<(), DevEnvError> {
        self.run(Some(repo_dir), &["fetch", remote])
    }

    fn checkout(&self, repo_dir: &Path, branch: &str) -> Result<(), DevEnvError> {
        self.run(Some(repo_dir), &["checkout", branch])
    }

    fn rebase(&self, repo_dir: &Path, onto: &str) -> Result<(), DevEnvError> {
        self.run(Some(repo_dir), &["rebase", onto])
    }
}
