//! Commit records as they move through a run.
//!
//! [`RawCommit`] is the platform-shaped input: fields may be missing and
//! statistics may sit behind a diff handle that is expensive or broken.
//! [`NormalizedCommit`] is the canonical unit every downstream component
//! consumes, produced by the normalizer in [`crate::normalize`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CommitId;

/// Branch value used when a commit cannot be attributed to one branch.
pub const MULTI_BRANCH: &str = "multi-branch";

/// Task names longer than this are truncated with a `...` suffix.
pub const TASK_NAME_MAX: usize = 100;

/// A repository discovered on the remote platform.
///
/// Immutable once discovered; shared read-only across the commits that
/// belong to it for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The platform's numeric project identifier.
    pub id: u64,
    /// Human-readable display name.
    pub name: String,
    /// Namespaced path, e.g. `group/app`.
    pub path: String,
    /// Browser URL of the project.
    pub web_url: String,
}

/// Summary line counters as some platforms inline them on a commit.
///
/// Every field is optional; a counter only participates in statistics
/// resolution when it is actually present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub total: Option<u64>,
}

impl LineStats {
    /// Total changed lines, if the counters carry enough to know.
    ///
    /// Prefers the platform's own total; falls back to summing whichever
    /// of additions/deletions are present. Returns `None` when the record
    /// carried no numeric counter at all.
    pub fn lines_changed(&self) -> Option<u64> {
        if let Some(total) = self.total {
            return Some(total);
        }
        match (self.additions, self.deletions) {
            (None, None) => None,
            (add, del) => Some(add.unwrap_or(0) + del.unwrap_or(0)),
        }
    }
}

/// One file's entry in a resolved commit diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path of the file after the change.
    pub path: String,
    /// Unified diff text; may be empty when the platform elides it.
    pub diff: String,
}

impl FileDiff {
    /// Counts added plus removed lines in the unified diff text.
    ///
    /// `+++`/`---` file headers do not count as changes.
    pub fn changed_lines(&self) -> u64 {
        self.diff
            .lines()
            .filter(|line| {
                (line.starts_with('+') && !line.starts_with("+++"))
                    || (line.starts_with('-') && !line.starts_with("---"))
            })
            .count() as u64
    }
}

/// Error produced when a deferred diff handle fails to resolve.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// The on-demand diff fetch failed.
    #[error("diff fetch failed: {0}")]
    DiffFetch(String),
}

/// Resolver invoked at most once to materialize a deferred diff.
pub type DiffResolver = Box<dyn FnOnce() -> Result<Vec<FileDiff>, StatsError> + Send>;

/// How a commit's detailed diff arrives from the platform.
///
/// The normalizer resolves this exactly once, in priority order after the
/// inline [`LineStats`], and degrades to zero counters on any failure.
pub enum DiffHandle {
    /// The platform offered no diff for this commit.
    Unavailable,
    /// The diff was already fetched alongside the commit.
    Materialized(Vec<FileDiff>),
    /// The diff must be resolved on demand.
    Deferred(DiffResolver),
}

impl DiffHandle {
    /// Resolves the handle into a file list, or an error for deferred
    /// handles whose fetch fails.
    pub fn resolve(self) -> Result<Option<Vec<FileDiff>>, StatsError> {
        match self {
            Self::Unavailable => Ok(None),
            Self::Materialized(files) => Ok(Some(files)),
            Self::Deferred(resolver) => resolver().map(Some),
        }
    }
}

impl fmt::Debug for DiffHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "DiffHandle::Unavailable"),
            Self::Materialized(files) => {
                write!(f, "DiffHandle::Materialized({} files)", files.len())
            }
            Self::Deferred(_) => write!(f, "DiffHandle::Deferred(..)"),
        }
    }
}

impl Default for DiffHandle {
    fn default() -> Self {
        Self::Unavailable
    }
}

/// A commit as returned by the remote platform, before normalization.
#[derive(Debug)]
pub struct RawCommit {
    /// Full commit hash, used for follow-up API calls.
    pub id: String,
    /// Abbreviated hash shown in reports.
    pub short_id: String,
    /// Full commit message.
    pub message: String,
    /// Commit time, preserving the committer's UTC offset.
    pub committed_at: DateTime<FixedOffset>,
    /// Browser URL of the commit, when the platform supplied one.
    pub web_url: Option<String>,
    /// Branch/ref the platform attributed the commit to, if any.
    pub ref_name: Option<String>,
    /// Inline summary counters, when present on the payload.
    pub stats: Option<LineStats>,
    /// Handle for the detailed per-file diff.
    pub diff: DiffHandle,
}

/// The canonical commit record consumed by the allocator, classifier and
/// report assembler.
#[derive(Debug, Clone)]
pub struct NormalizedCommit {
    /// Short hash; unique within `project` for one run.
    pub id: CommitId,
    /// The project the commit belongs to.
    pub project: Arc<Project>,
    /// Commit time with the committer's own UTC offset.
    pub timestamp: DateTime<FixedOffset>,
    /// Full commit message.
    pub message: String,
    /// Lines added plus removed; 0 when unavailable.
    pub lines_changed: u64,
    /// Files touched; 0 when unavailable.
    pub files_changed: u64,
    /// Resolved branch, possibly the [`MULTI_BRANCH`] sentinel.
    pub branch: String,
    /// Browser URL of the commit, when known.
    pub url: Option<String>,
}

impl NormalizedCommit {
    /// Calendar date used for day bucketing, in the committer's offset.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Task name for reports: the first message line, truncated.
    pub fn task_name(&self) -> String {
        summarize_message(&self.message, TASK_NAME_MAX)
    }
}

/// First line of a commit message, truncated to `max_len` characters
/// (counting the `...` suffix) when longer.
pub fn summarize_message(message: &str, max_len: usize) -> String {
    let first_line = message.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= max_len {
        return first_line.to_string();
    }
    let truncated: String = first_line.chars().take(max_len.saturating_sub(3)).collect();
    format!("{truncated}...")
}

/// A calendar date with that day's commits, ordered by time then id.
#[derive(Debug)]
pub struct DayBucket<'a> {
    pub date: NaiveDate,
    pub commits: Vec<&'a NormalizedCommit>,
}

/// Groups commits by their committer-local calendar date.
///
/// Buckets come back in ascending date order; within a bucket commits are
/// ordered by timestamp ascending, ties broken by commit id, so the same
/// input set always yields the same bucketing.
pub fn bucket_by_day(commits: &[NormalizedCommit]) -> Vec<DayBucket<'_>> {
    let mut days: BTreeMap<NaiveDate, Vec<&NormalizedCommit>> = BTreeMap::new();
    for commit in commits {
        days.entry(commit.day()).or_default().push(commit);
    }
    days.into_iter()
        .map(|(date, mut commits)| {
            commits.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.id.cmp(&b.id))
            });
            DayBucket { date, commits }
        })
        .collect()
}
