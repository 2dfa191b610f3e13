//! Commit normalization: raw platform records into canonical commits.
//!
//! Normalization is total. A malformed field never fails the run; each
//! field degrades independently through its fallback chain and the worst
//! outcome for a record is being dropped with a debug log when it carries
//! no usable identity at all.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::commit::{FileDiff, MULTI_BRANCH, NormalizedCommit, Project, RawCommit};
use crate::types::CommitId;

/// Line and file counters after the fallback chains have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStats {
    pub lines_changed: u64,
    pub files_changed: u64,
}

/// Resolves a raw commit's statistics in priority order.
///
/// Lines: inline summary counters, then the resolved diff, then zero.
/// Files: the resolved diff, then zero (platforms do not inline a file
/// count). The diff handle is resolved at most once and any resolution
/// failure counts as "no data", never as an error.
pub fn resolve_stats(raw: &mut RawCommit) -> ResolvedStats {
    let inline_lines = raw.stats.as_ref().and_then(|stats| stats.lines_changed());

    let files = match std::mem::take(&mut raw.diff).resolve() {
        Ok(files) => files,
        Err(err) => {
            debug!(commit = %raw.id, error = %err, "diff resolution failed, treating as no data");
            None
        }
    };

    let lines_changed = inline_lines
        .or_else(|| {
            files
                .as_ref()
                .map(|files| files.iter().map(FileDiff::changed_lines).sum())
        })
        .unwrap_or(0);
    let files_changed = files.map_or(0, |files| files.len() as u64);

    ResolvedStats {
        lines_changed,
        files_changed,
    }
}

/// Resolves the branch for a commit: embedded ref first, then the branch
/// the caller requested for this fetch, then the multi-branch sentinel.
/// Empty strings count as missing.
pub fn resolve_branch(ref_name: Option<&str>, requested: Option<&str>) -> String {
    for candidate in [ref_name, requested] {
        if let Some(branch) = candidate
            && !branch.trim().is_empty()
        {
            return branch.to_string();
        }
    }
    MULTI_BRANCH.to_string()
}

/// Converts one raw commit into its canonical form.
///
/// Returns `None` only when the record has no usable identity (empty
/// hash); every other defect degrades field-by-field.
pub fn normalize(
    mut raw: RawCommit,
    project: &Arc<Project>,
    requested_branch: Option<&str>,
) -> Option<NormalizedCommit> {
    let id = match CommitId::new(raw.short_id.as_str()).or_else(|_| CommitId::new(raw.id.as_str()))
    {
        Ok(id) => id,
        Err(_) => {
            debug!(project = %project.path, "dropping commit with empty id");
            return None;
        }
    };

    let stats = resolve_stats(&mut raw);
    let branch = resolve_branch(raw.ref_name.as_deref(), requested_branch);

    Some(NormalizedCommit {
        id,
        project: Arc::clone(project),
        timestamp: raw.committed_at,
        message: raw.message,
        lines_changed: stats.lines_changed,
        files_changed: stats.files_changed,
        branch,
        url: raw.web_url,
    })
}

/// Identity map over `(project id, commit id)`.
///
/// The same commit sighted more than once (reachable from several refs,
/// overlapping pages) collapses to a single record: the branch becomes the
/// multi-branch sentinel and every other field keeps its first sighting.
/// Merging is idempotent, so fetch order cannot change the final set.
#[derive(Debug, Default)]
pub struct CommitSet {
    commits: BTreeMap<(u64, CommitId), NormalizedCommit>,
}

impl CommitSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a commit, merging with any earlier sighting.
    pub fn insert(&mut self, commit: NormalizedCommit) {
        let key = (commit.project.id, commit.id.clone());
        match self.commits.entry(key) {
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(commit);
            }
            std::collections::btree_map::Entry::Occupied(mut entry) => {
                debug!(
                    commit = %commit.id,
                    project = %commit.project.path,
                    "duplicate sighting, collapsing to multi-branch"
                );
                entry.get_mut().branch = MULTI_BRANCH.to_string();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Consumes the set into the run's canonical order: timestamp
    /// ascending, ties broken by commit id, then project path.
    #[must_use]
    pub fn into_sorted(self) -> Vec<NormalizedCommit> {
        let mut commits: Vec<NormalizedCommit> = self.commits.into_values().collect();
        commits.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.id.cmp(&b.id))
                .then_with(|| a.project.path.cmp(&b.project.path))
        });
        commits
    }
}
