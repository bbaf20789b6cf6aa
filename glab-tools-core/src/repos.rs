//! The GrimoireLab repositories a development environment is built from.

use std::fmt;
use std::str::FromStr;

use crate::contract::DevEnvError;

pub const GRIMOIRELAB_REPOSITORIES: &[&str] = &[
    "chaoss/grimoirelab-sirmordred",
    "chaoss/grimoirelab-elk",
    "chaoss/grimoirelab-kingarthur",
    "chaoss/grimoirelab-graal",
    "chaoss/grimoirelab-perceval",
    "chaoss/grimoirelab-perceval-mozilla",
    "chaoss/grimoirelab-perceval-opnfv",
    "chaoss/grimoirelab-perceval-puppet",
    "chaoss/grimoirelab-perceval-weblate",
    "Bitergia/grimoirelab-perceval-finos",
    "chaoss/grimoirelab-sortinghat",
    "chaoss/grimoirelab-sigils",
    "chaoss/grimoirelab-kidash",
    "chaoss/grimoirelab-toolkit",
    "chaoss/grimoirelab-cereslib",
    "chaoss/grimoirelab-manuscripts",
];

/// A hosted repository identified as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Clone URL below `base_url` (e.g. `https://github.com/`).
    pub fn clone_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}.git",
            base_url.trim_end_matches('/'),
            self.owner,
            self.name
        )
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = DevEnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(RepoRef::new(owner, name))
            }
            _ => Err(DevEnvError::InvalidRepository(s.to_string())),
        }
    }
}

/// Parse a list of `owner/name` strings, failing on the first malformed entry.
pub fn parse_repositories<S: AsRef<str>>(list: &[S]) -> Result<Vec<RepoRef>, DevEnvError> {
    list.iter().map(|s| s.as_ref().parse()).collect()
}
