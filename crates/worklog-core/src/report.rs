//! Report assembly.
//!
//! Builds the two document shapes out of the run's commits and hour
//! records: a flat work log and a sectioned daily report. Assembly is
//! pure; everything time-dependent (the generation timestamp) comes in
//! through [`ReportMeta`], so identical inputs assemble identically and
//! the renderer can stay a dumb serializer.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::allocation::WorkHourRecord;
use crate::classify::{TaskKind, classify};
use crate::commit::{NormalizedCommit, Project, bucket_by_day};
use crate::types::{Author, CommitId};

/// Run facts every report carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    pub author: Author,
    /// Inclusive start of the range; `None` means unbounded history.
    pub since: Option<NaiveDate>,
    pub until: NaiveDate,
    /// When the run happened; an input so reruns can be byte-identical.
    pub generated_at: DateTime<Utc>,
}

/// The flat work log: one row per allocated record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogReport {
    pub meta: ReportMeta,
    /// The configured daily budget, echoed in the header.
    pub daily_hours: f64,
    /// Timestamp ascending, ties by commit id then project path.
    pub records: Vec<WorkHourRecord>,
    pub total_hours: f64,
}

/// One commit as the daily report's sections show it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitLine {
    pub id: CommitId,
    pub project: String,
    pub time: DateTime<FixedOffset>,
    pub task: String,
    pub kind: TaskKind,
    pub hours: f64,
    pub branch: String,
    pub url: Option<String>,
}

/// Headline counts for the overview section.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub projects_touched: usize,
    pub total_commits: usize,
    pub total_hours: f64,
    pub active_days: usize,
    pub first_commit: Option<DateTime<FixedOffset>>,
    pub last_commit: Option<DateTime<FixedOffset>>,
    /// Kinds present in the run, most frequent first.
    pub kind_distribution: Vec<(TaskKind, usize)>,
}

/// All commits of one project, with that project's allocated hours.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSection {
    pub project: Arc<Project>,
    pub hours: f64,
    pub commits: Vec<CommitLine>,
}

/// All commits sharing one task kind.
#[derive(Debug, Clone, PartialEq)]
pub struct KindSection {
    pub kind: TaskKind,
    pub count: usize,
    pub hours: f64,
    pub commits: Vec<CommitLine>,
}

/// The sectioned daily report.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub meta: ReportMeta,
    pub overview: Overview,
    /// Per-project detail, ordered by project path.
    pub projects: Vec<ProjectSection>,
    /// Per-kind summary, most frequent kind first.
    pub kinds: Vec<KindSection>,
    /// Every commit in the run, timestamp ascending, ties by commit id.
    pub timeline: Vec<CommitLine>,
    /// Narrative synthesized from the overview counts.
    pub summary: String,
}

/// Sums allocated hours without accumulating float error.
pub fn total_allocated_hours(records: &[WorkHourRecord]) -> f64 {
    let cents: i64 = records
        .iter()
        .map(|record| (record.hours * 100.0).round() as i64)
        .sum();
    cents as f64 / 100.0
}

/// Assembles the flat work log.
pub fn assemble_log(
    meta: ReportMeta,
    daily_hours: f64,
    mut records: Vec<WorkHourRecord>,
) -> LogReport {
    records.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.commit_id.cmp(&b.commit_id))
            .then_with(|| a.project.cmp(&b.project))
    });
    let total_hours = total_allocated_hours(&records);
    LogReport {
        meta,
        daily_hours,
        records,
        total_hours,
    }
}

/// Assembles the daily report from the normalized set and its allocation.
///
/// `commits` and `records` describe the same run; hours are joined back
/// onto commits by `(project path, commit id)`.
pub fn assemble_daily(
    meta: ReportMeta,
    commits: &[NormalizedCommit],
    records: &[WorkHourRecord],
) -> DailyReport {
    let hours_by_commit: HashMap<(&str, &str), f64> = records
        .iter()
        .map(|record| {
            (
                (record.project.as_str(), record.commit_id.as_str()),
                record.hours,
            )
        })
        .collect();

    let mut lines: Vec<CommitLine> = commits
        .iter()
        .map(|commit| CommitLine {
            id: commit.id.clone(),
            project: commit.project.path.clone(),
            time: commit.timestamp,
            task: commit.task_name(),
            kind: classify(&commit.message),
            hours: hours_by_commit
                .get(&(commit.project.path.as_str(), commit.id.as_str()))
                .copied()
                .unwrap_or(0.0),
            branch: commit.branch.clone(),
            url: commit.url.clone(),
        })
        .collect();
    lines.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.project.cmp(&b.project))
    });

    let overview = build_overview(commits, records, &lines);
    let projects = build_project_sections(commits, &lines);
    let kinds = build_kind_sections(&lines, &overview.kind_distribution);
    let summary = narrative_summary(&overview);

    DailyReport {
        meta,
        overview,
        projects,
        kinds,
        timeline: lines,
        summary,
    }
}

fn build_overview(
    commits: &[NormalizedCommit],
    records: &[WorkHourRecord],
    lines: &[CommitLine],
) -> Overview {
    let mut kind_counts: BTreeMap<TaskKind, usize> = BTreeMap::new();
    for line in lines {
        *kind_counts.entry(line.kind).or_default() += 1;
    }
    let mut kind_distribution: Vec<(TaskKind, usize)> = kind_counts.into_iter().collect();
    kind_distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let projects_touched = commits
        .iter()
        .map(|commit| commit.project.path.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    Overview {
        projects_touched,
        total_commits: lines.len(),
        total_hours: total_allocated_hours(records),
        active_days: bucket_by_day(commits).len(),
        first_commit: lines.first().map(|line| line.time),
        last_commit: lines.last().map(|line| line.time),
        kind_distribution,
    }
}

fn build_project_sections(
    commits: &[NormalizedCommit],
    lines: &[CommitLine],
) -> Vec<ProjectSection> {
    let mut by_path: BTreeMap<&str, Arc<Project>> = BTreeMap::new();
    for commit in commits {
        by_path
            .entry(commit.project.path.as_str())
            .or_insert_with(|| Arc::clone(&commit.project));
    }

    by_path
        .into_values()
        .map(|project| {
            let commits: Vec<CommitLine> = lines
                .iter()
                .filter(|line| line.project == project.path)
                .cloned()
                .collect();
            let hours = section_hours(&commits);
            ProjectSection {
                project,
                hours,
                commits,
            }
        })
        .collect()
}

fn build_kind_sections(
    lines: &[CommitLine],
    distribution: &[(TaskKind, usize)],
) -> Vec<KindSection> {
    distribution
        .iter()
        .map(|&(kind, count)| {
            let commits: Vec<CommitLine> = lines
                .iter()
                .filter(|line| line.kind == kind)
                .cloned()
                .collect();
            let hours = section_hours(&commits);
            KindSection {
                kind,
                count,
                hours,
                commits,
            }
        })
        .collect()
}

fn section_hours(lines: &[CommitLine]) -> f64 {
    let cents: i64 = lines
        .iter()
        .map(|line| (line.hours * 100.0).round() as i64)
        .sum();
    cents as f64 / 100.0
}

fn narrative_summary(overview: &Overview) -> String {
    if overview.total_commits == 0 {
        return "No commits in this range.".to_string();
    }
    let projects = if overview.projects_touched == 1 {
        "1 project".to_string()
    } else {
        format!("{} projects", overview.projects_touched)
    };
    let mut summary = format!(
        "Completed {} commit{} across {} over {} active day{}, {:.2}h attributed.",
        overview.total_commits,
        if overview.total_commits == 1 { "" } else { "s" },
        projects,
        overview.active_days,
        if overview.active_days == 1 { "" } else { "s" },
        overview.total_hours,
    );
    if let Some(&(kind, count)) = overview.kind_distribution.first() {
        let share = count * 100 / overview.total_commits;
        summary.push_str(&format!(
            " Main focus: {} {} ({} commit{}, {}%).",
            kind.emoji(),
            kind,
            count,
            if count == 1 { "" } else { "s" },
            share
        ));
    }
    summary
}
