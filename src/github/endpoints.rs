// GitHub API endpoint functions.
// Repository metadata lookup and the star count source built on it.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::stars::{RepoId, StarLookup};

use super::client::GitHubClient;
use super::types::Repository;

impl GitHubClient {
    /// Get a repository's metadata.
    pub async fn get_repository(&self, repo: &RepoId) -> Result<Repository> {
        let endpoint = format!("/repos/{}/{}", repo.owner(), repo.name());
        let response = self.get(&endpoint).await?;
        let repository: Repository = response.json().await?;
        debug!(repo = %repository.full_name, stars = repository.stargazers_count, "fetched repository");
        Ok(repository)
    }
}

#[async_trait]
impl StarLookup for GitHubClient {
    async fn stargazers(&self, repo: &RepoId) -> Result<u64> {
        let repository = self.get_repository(repo).await?;
        Ok(repository.stargazers_count)
    }
}
