#![doc = "GitHub integration for the dev environment automation: implements the core `RepositoryHost` trait over the GitHub REST API."]
//
//! # GitHub client
//!
//! [`GitHubClient`] is the networked [`RepositoryHost`] used by `glab-tools dev-env`.
//! It authenticates with a personal access token and issues two calls:
//!
//! - `GET /user` to verify the token and learn the login.
//! - `POST /repos/{owner}/{repo}/forks` to fork a repository into that account.
//!   GitHub answers `202 Accepted` and returns the existing fork when there already is one.
//!
//! The token needs the `repo` scope for forking.

use async_trait::async_trait;
use glab_tools_core::contract::{DevEnvError, HostUser, RepositoryHost};
use glab_tools_core::repos::RepoRef;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;

pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ForkResponse {
    name: String,
    owner: UserResponse,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: String) -> Result<Self, DevEnvError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| DevEnvError::InvalidToken("token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("glab-tools"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| DevEnvError::Host(format!("failed to build http client: {e}")))?;

        tracing::debug!(api_url, "Initialized GitHubClient");
        Ok(GitHubClient {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<(StatusCode, String), DevEnvError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = ?e, url, "Failed to reach GitHub API");
            DevEnvError::Host(format!("failed to reach {url}: {e}"))
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DevEnvError::Host(format!("failed to read response from {url}: {e}")))?;
        Ok((status, body))
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn authenticated_user(&self) -> Result<HostUser, DevEnvError> {
        let url = format!("{}/user", self.api_url);
        let (status, body) = self.send(self.client.get(&url), &url).await?;

        match status {
            s if s.is_success() => {
                let user: UserResponse = serde_json::from_str(&body)
                    .map_err(|e| DevEnvError::Host(format!("unexpected /user response: {e}")))?;
                Ok(HostUser { login: user.login })
            }
            StatusCode::UNAUTHORIZED => {
                tracing::error!(status = %status, "GitHub rejected the token");
                Err(DevEnvError::InvalidToken(body))
            }
            s => {
                tracing::error!(status = %s, "GitHub API error on /user. Response body: {body}");
                Err(DevEnvError::Host(format!("GET /user returned {s}: {body}")))
            }
        }
    }

    async fn create_fork(&self, upstream: &RepoRef) -> Result<RepoRef, DevEnvError> {
        let url = format!("{}/repos/{}/{}/forks", self.api_url, upstream.owner, upstream.name);
        tracing::info!(repository = %upstream, "Requesting fork");
        let (status, body) = self.send(self.client.post(&url), &url).await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                repository = %upstream,
                "Forking aborted, please select the appropriate scope (`repo`) for the token. Response body: {body}"
            );
            return Err(DevEnvError::Host(format!(
                "forking {upstream} returned {status}: {body}"
            )));
        }

        let fork: ForkResponse = serde_json::from_str(&body)
            .map_err(|e| DevEnvError::Host(format!("unexpected fork response: {e}")))?;
        tracing::info!(fork = %format!("{}/{}", fork.owner.login, fork.name), "Fork ready");
        Ok(RepoRef::new(fork.owner.login, fork.name))
    }
}
