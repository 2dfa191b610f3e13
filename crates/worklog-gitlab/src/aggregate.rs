//! Multi-project commit aggregation.
//!
//! Resolves the fetch scope to a project list, walks each project
//! independently, and folds everything into one deduplicated, ordered
//! commit set. A project that cannot be read degrades to a warning;
//! only failing to resolve the scope itself aborts the run.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use worklog_core::{Author, CommitSet, DiffHandle, NormalizedCommit, Project, normalize};

use crate::api::{ApiCommit, ApiDiff, CommitQuery};
use crate::client::GitlabError;
use crate::source::CommitSource;

/// Which projects a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchScope {
    /// One project by namespaced path.
    Project(String),
    /// Every project visible to the credential.
    ScanAll,
}

/// Everything needed to pull one author's commits.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub author: Author,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    /// Restrict to one branch; `None` scans the default listing.
    pub branch: Option<String>,
    pub scope: FetchScope,
}

/// A project that could not contribute data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWarning {
    pub project: String,
    pub message: String,
}

impl std::fmt::Display for RunWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.project, self.message)
    }
}

/// Outcome of a fetch run: ordered commits plus everything the caller
/// should tell the user about.
#[derive(Debug)]
pub struct Aggregation {
    /// Deduplicated, sorted by (timestamp, id, project path).
    pub commits: Vec<NormalizedCommit>,
    /// Every project the run visited, contributing or not.
    pub projects: Vec<Arc<Project>>,
    pub warnings: Vec<RunWarning>,
}

/// Fetches and normalizes all commits in scope.
///
/// Fails only when the scope cannot be resolved (single project missing,
/// or the project listing erroring out); anything after that degrades to
/// per-project [`RunWarning`]s.
pub async fn aggregate<S: CommitSource>(
    source: &S,
    request: &FetchRequest,
) -> Result<Aggregation, GitlabError> {
    let projects: Vec<Arc<Project>> = match &request.scope {
        FetchScope::Project(path) => {
            let project = source.project(path).await?;
            vec![Arc::new(project.into_project())]
        }
        FetchScope::ScanAll => {
            let listed = source.projects().await?;
            debug!(count = listed.len(), "scanning visible projects");
            listed
                .into_iter()
                .map(|project| Arc::new(project.into_project()))
                .collect()
        }
    };

    let mut set = CommitSet::new();
    let mut warnings = Vec::new();
    for project in &projects {
        match collect_project(source, project, request, &mut set).await {
            Ok(found) => {
                debug!(project = %project.path, commits = found, "project done");
            }
            Err(err) => {
                warn!(project = %project.path, error = %err, "skipping project");
                warnings.push(RunWarning {
                    project: project.path.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    Ok(Aggregation {
        commits: set.into_sorted(),
        projects,
        warnings,
    })
}

/// Pulls one project's commits into `set`; returns how many the listing
/// produced before dedup.
async fn collect_project<S: CommitSource>(
    source: &S,
    project: &Arc<Project>,
    request: &FetchRequest,
    set: &mut CommitSet,
) -> Result<usize, GitlabError> {
    let commits = fetch_for_author(source, project.id, request).await?;
    let found = commits.len();
    for api_commit in commits {
        let diff = fetch_diff(source, project, &api_commit).await;
        let raw = api_commit.into_raw(diff);
        if let Some(commit) = normalize(raw, project, request.branch.as_deref()) {
            set.insert(commit);
        }
    }
    Ok(found)
}

/// Tries each author format in turn until one matches commits. The
/// platform's `author` filter is exact, so "Name <email>", the bare
/// email, and the bare name all get a shot before concluding empty.
async fn fetch_for_author<S: CommitSource>(
    source: &S,
    project_id: u64,
    request: &FetchRequest,
) -> Result<Vec<ApiCommit>, GitlabError> {
    for candidate in request.author.candidates() {
        let query = CommitQuery {
            author: candidate.to_string(),
            since: request.since,
            until: request.until,
            ref_name: request.branch.clone(),
        };
        let commits = source.commits(project_id, &query).await?;
        if !commits.is_empty() {
            debug!(project_id, author = candidate, found = commits.len(), "author format matched");
            return Ok(commits);
        }
    }
    Ok(Vec::new())
}

/// Fetches the per-file diff for line and file counts. Failure here is
/// partial data, not an error: the commit still counts, with zeros where
/// the diff would have filled in.
async fn fetch_diff<S: CommitSource>(
    source: &S,
    project: &Arc<Project>,
    commit: &ApiCommit,
) -> DiffHandle {
    match source.commit_diff(project.id, &commit.id).await {
        Ok(diffs) => {
            DiffHandle::Materialized(diffs.into_iter().map(ApiDiff::into_file_diff).collect())
        }
        Err(err) => {
            debug!(
                project = %project.path,
                commit = %commit.short_id,
                error = %err,
                "diff unavailable"
            );
            DiffHandle::Unavailable
        }
    }
}
