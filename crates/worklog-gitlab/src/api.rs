//! Wire types for the platform's REST v4 API.
//!
//! Payload structs stay close to the JSON the platform emits; anything
//! the run actually computes with is converted into `worklog-core` types
//! at the edge.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;

use worklog_core::{DiffHandle, FileDiff, LineStats, Project, RawCommit};

/// The authenticated user, from `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
}

/// A project, from `GET /projects` or `GET /projects/:id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProject {
    pub id: u64,
    pub name: String,
    pub path_with_namespace: String,
    pub web_url: String,
}

impl ApiProject {
    pub fn into_project(self) -> Project {
        Project {
            id: self.id,
            name: self.name,
            path: self.path_with_namespace,
            web_url: self.web_url,
        }
    }
}

/// Inline line counters on a commit payload (`with_stats=true`).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ApiCommitStats {
    #[serde(default)]
    pub additions: Option<u64>,
    #[serde(default)]
    pub deletions: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl ApiCommitStats {
    pub fn into_line_stats(self) -> LineStats {
        LineStats {
            additions: self.additions,
            deletions: self.deletions,
            total: self.total,
        }
    }
}

/// A commit, from `GET /projects/:id/repository/commits`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommit {
    pub id: String,
    pub short_id: String,
    #[serde(default)]
    pub message: String,
    pub committed_date: DateTime<FixedOffset>,
    #[serde(default)]
    pub web_url: Option<String>,
    /// Some listings attribute a ref; absent on the plain commits call.
    #[serde(default)]
    pub ref_name: Option<String>,
    #[serde(default)]
    pub stats: Option<ApiCommitStats>,
}

impl ApiCommit {
    /// Pairs the payload with its diff handle into the normalizer's input.
    pub fn into_raw(self, diff: DiffHandle) -> RawCommit {
        RawCommit {
            id: self.id,
            short_id: self.short_id,
            message: self.message,
            committed_at: self.committed_date,
            web_url: self.web_url,
            ref_name: self.ref_name,
            stats: self.stats.map(ApiCommitStats::into_line_stats),
            diff,
        }
    }
}

/// One file's diff, from `GET /projects/:id/repository/commits/:sha/diff`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDiff {
    pub new_path: String,
    #[serde(default)]
    pub diff: String,
}

impl ApiDiff {
    pub fn into_file_diff(self) -> FileDiff {
        FileDiff {
            path: self.new_path,
            diff: self.diff,
        }
    }
}

/// Parameters for one commit-listing call.
///
/// The date range is inclusive on both ends: `since` expands to midnight
/// and `until` to the last second of its day, both UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitQuery {
    /// One author format, as the platform's `author` filter expects it.
    pub author: String,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub ref_name: Option<String>,
}

impl CommitQuery {
    /// Query pairs for the commits endpoint, pagination excluded.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("author".to_string(), self.author.clone()),
            ("with_stats".to_string(), "true".to_string()),
        ];
        if let Some(ref_name) = &self.ref_name {
            params.push(("ref_name".to_string(), ref_name.clone()));
        }
        if let Some(since) = self.since {
            params.push(("since".to_string(), format!("{since}T00:00:00Z")));
        }
        if let Some(until) = self.until {
            params.push(("until".to_string(), format!("{until}T23:59:59Z")));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_payload_deserializes() {
        let json = r#"{
            "id": "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2",
            "short_id": "a1b2c3d4",
            "title": "feat: add login",
            "message": "feat: add login\n",
            "committed_date": "2025-12-01T10:30:00.000+02:00",
            "web_url": "https://gitlab.example.com/group/app/-/commit/a1b2c3d4",
            "stats": {"additions": 120, "deletions": 8, "total": 128}
        }"#;
        let commit: ApiCommit = serde_json::from_str(json).unwrap();
        assert_eq!(commit.short_id, "a1b2c3d4");
        assert_eq!(commit.stats.unwrap().total, Some(128));
        assert_eq!(commit.committed_date.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn commit_payload_tolerates_missing_fields() {
        let json = r#"{
            "id": "abc",
            "short_id": "abc",
            "committed_date": "2025-12-01T10:30:00Z"
        }"#;
        let commit: ApiCommit = serde_json::from_str(json).unwrap();
        assert!(commit.message.is_empty());
        assert!(commit.web_url.is_none());
        assert!(commit.stats.is_none());
    }

    #[test]
    fn partial_stats_deserialize() {
        let json = r#"{"additions": 3}"#;
        let stats: ApiCommitStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.additions, Some(3));
        assert_eq!(stats.into_line_stats().lines_changed(), Some(3));
    }

    #[test]
    fn project_converts_to_core() {
        let json = r#"{
            "id": 42,
            "name": "App",
            "path_with_namespace": "group/app",
            "web_url": "https://gitlab.example.com/group/app"
        }"#;
        let project: ApiProject = serde_json::from_str(json).unwrap();
        let core = project.into_project();
        assert_eq!(core.id, 42);
        assert_eq!(core.path, "group/app");
    }

    #[test]
    fn query_expands_inclusive_range() {
        let query = CommitQuery {
            author: "jane@example.com".into(),
            since: NaiveDate::from_ymd_opt(2025, 12, 1),
            until: NaiveDate::from_ymd_opt(2025, 12, 3),
            ref_name: Some("main".into()),
        };
        let params = query.to_params();
        assert!(params.contains(&("author".into(), "jane@example.com".into())));
        assert!(params.contains(&("ref_name".into(), "main".into())));
        assert!(params.contains(&("since".into(), "2025-12-01T00:00:00Z".into())));
        assert!(params.contains(&("until".into(), "2025-12-03T23:59:59Z".into())));
    }

    #[test]
    fn query_omits_absent_filters() {
        let query = CommitQuery {
            author: "jane".into(),
            since: None,
            until: None,
            ref_name: None,
        };
        let params = query.to_params();
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|(key, _)| key == "author" || key == "with_stats"));
    }

    #[test]
    fn raw_conversion_keeps_offset_and_stats() {
        let commit = ApiCommit {
            id: "full".into(),
            short_id: "short".into(),
            message: "fix: x".into(),
            committed_date: DateTime::parse_from_rfc3339("2025-12-01T10:30:00+02:00").unwrap(),
            web_url: None,
            ref_name: Some("main".into()),
            stats: Some(ApiCommitStats {
                additions: Some(1),
                deletions: Some(2),
                total: Some(3),
            }),
        };
        let raw = commit.into_raw(DiffHandle::Unavailable);
        assert_eq!(raw.short_id, "short");
        assert_eq!(raw.ref_name.as_deref(), Some("main"));
        assert_eq!(raw.stats.unwrap().total, Some(3));
        assert_eq!(raw.committed_at.offset().local_minus_utc(), 7200);
    }
}
