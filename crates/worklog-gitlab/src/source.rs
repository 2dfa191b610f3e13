//! Read-side abstraction over the platform API.

use crate::api::{ApiCommit, ApiDiff, ApiProject, CommitQuery};
use crate::client::{Client, GitlabError};

/// The calls the aggregator needs from a platform. [`Client`] is the
/// real implementation; tests substitute an in-memory one.
#[allow(async_fn_in_trait)]
pub trait CommitSource {
    /// One project by namespaced path.
    async fn project(&self, path: &str) -> Result<ApiProject, GitlabError>;

    /// Every project visible to the credential.
    async fn projects(&self) -> Result<Vec<ApiProject>, GitlabError>;

    /// All commits of one project matching the query.
    async fn commits(
        &self,
        project_id: u64,
        query: &CommitQuery,
    ) -> Result<Vec<ApiCommit>, GitlabError>;

    /// Per-file diff of one commit.
    async fn commit_diff(&self, project_id: u64, sha: &str)
        -> Result<Vec<ApiDiff>, GitlabError>;
}

impl CommitSource for Client {
    async fn project(&self, path: &str) -> Result<ApiProject, GitlabError> {
        Self::project(self, path).await
    }

    async fn projects(&self) -> Result<Vec<ApiProject>, GitlabError> {
        Self::projects(self).await
    }

    async fn commits(
        &self,
        project_id: u64,
        query: &CommitQuery,
    ) -> Result<Vec<ApiCommit>, GitlabError> {
        Self::commits(self, project_id, query).await
    }

    async fn commit_diff(
        &self,
        project_id: u64,
        sha: &str,
    ) -> Result<Vec<ApiDiff>, GitlabError> {
        Self::commit_diff(self, project_id, sha).await
    }
}
