//! Work-hour attribution algorithm.
//!
//! Distributes a fixed daily hour budget across the commits of each
//! calendar day. This is an attribution heuristic, not a measurement:
//! the goal is a bounded, deterministic, explainable split.
//!
//! # Algorithm Summary
//!
//! 1. Bucket commits by their committer-local calendar date.
//! 2. Within a day, weight each commit `0.6 * lines + 0.2 * position
//!    + 0.2 * files`, where lines and files are normalized against the
//!    day's totals (equal shares when a day's total is zero) and the
//!    position component is an equal per-commit share.
//! 3. Distribute the day's budget proportionally to the weights, in
//!    integer hundredths of an hour, handing leftover hundredths to the
//!    largest fractional remainders so the day sums to the budget exactly.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::classify::{TaskKind, classify};
use crate::commit::{DayBucket, NormalizedCommit, bucket_by_day};
use crate::types::CommitId;

/// Weight of the lines-changed component.
const LINES_WEIGHT: f64 = 0.6;
/// Weight of the within-day position component.
const POSITION_WEIGHT: f64 = 0.2;
/// Weight of the files-changed component.
const FILES_WEIGHT: f64 = 0.2;

/// Configuration for work-hour attribution.
#[derive(Debug, Clone, Copy)]
pub struct AllocationConfig {
    /// Hours attributed to one calendar day with at least one commit.
    /// Default: 8.0.
    pub daily_hours: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self { daily_hours: 8.0 }
    }
}

/// One row of allocated time, traceable back to its commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkHourRecord {
    /// Calendar day the hours belong to.
    pub date: NaiveDate,
    /// When the commit landed; orders records within the day.
    pub time: DateTime<FixedOffset>,
    /// Namespaced project path.
    pub project: String,
    /// Task name: first line of the commit message, truncated.
    pub task: String,
    /// Task category from the classifier.
    pub kind: TaskKind,
    /// Allocated hours, rounded to two decimals. Never negative; a day's
    /// records sum to the daily budget (rounded to the same precision).
    pub hours: f64,
    /// The originating commit.
    pub commit_id: CommitId,
    /// Branch the commit was attributed to.
    pub branch: String,
    /// Browser URL of the commit, when known.
    pub url: Option<String>,
}

/// Allocates the daily budget across every day of the commit set.
///
/// Records come back grouped by ascending date, within a day ordered by
/// timestamp then commit id, with one record per commit, never a split. A day
/// with zero commits produces nothing and consumes no budget. The same
/// input set and budget always produce the same records.
pub fn allocate(commits: &[NormalizedCommit], config: &AllocationConfig) -> Vec<WorkHourRecord> {
    bucket_by_day(commits)
        .iter()
        .flat_map(|bucket| allocate_day(bucket, config))
        .collect()
}

/// Splits one day's budget across that day's commits.
fn allocate_day(bucket: &DayBucket<'_>, config: &AllocationConfig) -> Vec<WorkHourRecord> {
    let commits = &bucket.commits;
    if commits.is_empty() {
        return Vec::new();
    }

    let weights = day_weights(commits);
    let cents = distribute_cents(budget_cents(config.daily_hours), &weights);

    commits
        .iter()
        .zip(cents)
        .map(|(commit, cents)| WorkHourRecord {
            date: bucket.date,
            time: commit.timestamp,
            project: commit.project.path.clone(),
            task: commit.task_name(),
            kind: classify(&commit.message),
            hours: cents_to_hours(cents),
            commit_id: commit.id.clone(),
            branch: commit.branch.clone(),
            url: commit.url.clone(),
        })
        .collect()
}

/// Raw weight per commit for one day.
///
/// The position component is an equal share rather than a rank, so a day
/// of commits with identical metrics splits exactly evenly; the share
/// also keeps every weight above zero, which keeps the division defined.
fn day_weights(commits: &[&NormalizedCommit]) -> Vec<f64> {
    let lines = normalize_counts(commits.iter().map(|c| c.lines_changed));
    let files = normalize_counts(commits.iter().map(|c| c.files_changed));
    let position_share = 1.0 / commits.len() as f64;

    lines
        .iter()
        .zip(&files)
        .map(|(lines, files)| {
            LINES_WEIGHT * lines + POSITION_WEIGHT * position_share + FILES_WEIGHT * files
        })
        .collect()
}

/// Maps a day's raw counts onto shares of the day's total; equal shares
/// when the day's total is zero.
fn normalize_counts(values: impl Iterator<Item = u64> + Clone) -> Vec<f64> {
    let total: u64 = values.clone().sum();
    let count = values.clone().count();
    if total == 0 {
        return vec![1.0 / count as f64; count];
    }
    values.map(|value| value as f64 / total as f64).collect()
}

/// The day's budget in integer hundredths of an hour. Non-finite or
/// non-positive budgets allocate nothing rather than misbehaving.
fn budget_cents(daily_hours: f64) -> i64 {
    if daily_hours.is_finite() && daily_hours > 0.0 {
        (daily_hours * 100.0).round() as i64
    } else {
        0
    }
}

/// Apportions `total` hundredths proportionally to `weights`.
///
/// Each commit gets the floor of its proportional share; leftover
/// hundredths go to the largest fractional remainders, earlier commits
/// first on ties. The result always sums to `total` and is never
/// negative.
fn distribute_cents(total: i64, weights: &[f64]) -> Vec<i64> {
    let weight_sum: f64 = weights.iter().sum();
    let ideals: Vec<f64> = weights
        .iter()
        .map(|weight| total as f64 * weight / weight_sum)
        .collect();

    let mut cents: Vec<i64> = ideals.iter().map(|ideal| ideal.floor() as i64).collect();
    let mut leftover = total - cents.iter().sum::<i64>();

    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| {
        let remainder_a = ideals[a] - ideals[a].floor();
        let remainder_b = ideals[b] - ideals[b].floor();
        remainder_b.total_cmp(&remainder_a).then(a.cmp(&b))
    });

    for &index in &order {
        if leftover <= 0 {
            break;
        }
        cents[index] += 1;
        leftover -= 1;
    }
    // Float drift can leave the floors one over; take it back from the
    // smallest remainders.
    if leftover < 0 {
        for &index in order.iter().rev() {
            if leftover == 0 {
                break;
            }
            if cents[index] > 0 {
                cents[index] -= 1;
                leftover += 1;
            }
        }
    }

    cents
}

fn cents_to_hours(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::DateTime;

    use super::*;
    use crate::commit::Project;

    fn project() -> Arc<Project> {
        Arc::new(Project {
            id: 1,
            name: "App".into(),
            path: "group/app".into(),
            web_url: "https://gitlab.example.com/group/app".into(),
        })
    }

    /// Builds a commit at `hour` o'clock on 2025-12-01 (+00:00).
    fn commit(id: &str, hour: u32, lines: u64, files: u64) -> NormalizedCommit {
        commit_on("2025-12-01", id, hour, lines, files)
    }

    fn commit_on(date: &str, id: &str, hour: u32, lines: u64, files: u64) -> NormalizedCommit {
        NormalizedCommit {
            id: CommitId::new(id).unwrap(),
            project: project(),
            timestamp: DateTime::parse_from_rfc3339(&format!("{date}T{hour:02}:00:00+00:00"))
                .unwrap(),
            message: format!("feat: change {id}"),
            lines_changed: lines,
            files_changed: files,
            branch: "main".into(),
            url: None,
        }
    }

    fn config(daily_hours: f64) -> AllocationConfig {
        AllocationConfig { daily_hours }
    }

    fn day_cents(records: &[WorkHourRecord]) -> i64 {
        records
            .iter()
            .map(|record| (record.hours * 100.0).round() as i64)
            .sum()
    }

    #[test]
    fn empty_set_allocates_nothing() {
        let records = allocate(&[], &config(8.0));
        assert!(records.is_empty());
    }

    #[test]
    fn single_commit_receives_full_budget() {
        let records = allocate(&[commit("aaa", 10, 120, 3)], &config(8.0));
        assert_eq!(records.len(), 1);
        assert!((records[0].hours - 8.0).abs() < 1e-9);
    }

    #[test]
    fn identical_metrics_split_evenly() {
        let commits = vec![
            commit("aaa", 9, 50, 2),
            commit("bbb", 11, 50, 2),
            commit("ccc", 15, 50, 2),
        ];
        let records = allocate(&commits, &config(8.0));
        let hours: Vec<f64> = records.iter().map(|r| r.hours).collect();
        assert_eq!(hours, vec![2.67, 2.67, 2.66]);
        assert_eq!(day_cents(&records), 800);
    }

    #[test]
    fn all_zero_metrics_split_evenly() {
        let commits = vec![
            commit("aaa", 9, 0, 0),
            commit("bbb", 11, 0, 0),
            commit("ccc", 15, 0, 0),
            commit("ddd", 16, 0, 0),
        ];
        let records = allocate(&commits, &config(8.0));
        for record in &records {
            assert!((record.hours - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn heavier_commit_gets_larger_share() {
        let commits = vec![
            commit("aaa", 9, 100, 5),
            commit("bbb", 11, 0, 0),
            commit("ccc", 15, 0, 0),
        ];
        let records = allocate(&commits, &config(8.0));
        assert!(records[0].hours > records[1].hours);
        assert!(records[0].hours > records[2].hours);
        assert_eq!(day_cents(&records), 800);
    }

    #[test]
    fn days_are_budgeted_independently() {
        let commits = vec![
            commit_on("2025-12-01", "aaa", 9, 10, 1),
            commit_on("2025-12-01", "bbb", 15, 30, 2),
            commit_on("2025-12-02", "ccc", 10, 5, 1),
        ];
        let records = allocate(&commits, &config(8.0));
        assert_eq!(records.len(), 3);
        let day_one: Vec<_> = records
            .iter()
            .filter(|r| r.date == NaiveDate::from_ymd_opt(2025, 12, 1).unwrap())
            .cloned()
            .collect();
        assert_eq!(day_cents(&day_one), 800);
        assert!((records[2].hours - 8.0).abs() < 1e-9);
    }

    #[test]
    fn records_follow_day_then_time_then_id_order() {
        let commits = vec![
            commit_on("2025-12-02", "zzz", 9, 0, 0),
            commit_on("2025-12-01", "bbb", 9, 0, 0),
            commit_on("2025-12-01", "aaa", 9, 0, 0),
            commit_on("2025-12-01", "ccc", 8, 0, 0),
        ];
        let records = allocate(&commits, &config(8.0));
        let ids: Vec<&str> = records.iter().map(|r| r.commit_id.as_str()).collect();
        assert_eq!(ids, vec!["ccc", "aaa", "bbb", "zzz"]);
    }

    #[test]
    fn never_negative_and_day_sums_to_budget() {
        let metric_sets: &[&[(u64, u64)]] = &[
            &[(0, 0)],
            &[(1, 1), (0, 0)],
            &[(100, 5), (3, 1), (3, 1), (94, 2)],
            &[(7, 0), (0, 3), (2, 2), (1, 1), (0, 0), (50, 10), (8, 8)],
        ];
        for (set_index, metrics) in metric_sets.iter().enumerate() {
            let commits: Vec<NormalizedCommit> = metrics
                .iter()
                .enumerate()
                .map(|(i, &(lines, files))| {
                    commit(&format!("c{set_index}{i}"), 8 + i as u32, lines, files)
                })
                .collect();
            let records = allocate(&commits, &config(8.0));
            assert_eq!(records.len(), commits.len());
            for record in &records {
                assert!(record.hours >= 0.0);
            }
            assert_eq!(day_cents(&records), 800, "set {set_index}");
        }
    }

    #[test]
    fn fractional_budget_sums_exactly() {
        let commits = vec![
            commit("aaa", 9, 10, 1),
            commit("bbb", 11, 20, 2),
            commit("ccc", 15, 30, 3),
        ];
        let records = allocate(&commits, &config(7.5));
        assert_eq!(day_cents(&records), 750);
    }

    #[test]
    fn tiny_budget_never_goes_negative() {
        let commits = vec![
            commit("aaa", 9, 0, 0),
            commit("bbb", 11, 0, 0),
            commit("ccc", 15, 0, 0),
        ];
        let records = allocate(&commits, &config(0.01));
        assert_eq!(day_cents(&records), 1);
        for record in &records {
            assert!(record.hours >= 0.0);
        }
    }

    #[test]
    fn pathological_budget_allocates_zero() {
        let commits = vec![commit("aaa", 9, 10, 1)];
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let records = allocate(&commits, &config(bad));
            assert_eq!(records.len(), 1);
            assert!((records[0].hours).abs() < 1e-9);
        }
    }

    #[test]
    fn allocation_is_deterministic() {
        let commits = vec![
            commit("aaa", 9, 100, 5),
            commit("bbb", 11, 37, 2),
            commit("ccc", 15, 0, 1),
        ];
        let first = allocate(&commits, &config(8.0));
        let second = allocate(&commits, &config(8.0));
        assert_eq!(first, second);
    }

    #[test]
    fn three_commit_day_matches_worked_example() {
        // lines [100, 0, 0], files [5, 0, 0], budget 8h: the first commit
        // carries the whole lines and files shares plus a third of the
        // position share, about 6.93h of the 8.
        let commits = vec![
            commit("aaa", 9, 100, 5),
            commit("bbb", 11, 0, 0),
            commit("ccc", 15, 0, 0),
        ];
        let records = allocate(&commits, &config(8.0));
        assert!((records[0].hours - 6.93).abs() < 0.02);
        assert!(records[0].hours > records[1].hours);
        assert!(records[0].hours > records[2].hours);
        assert!((records[1].hours - records[2].hours).abs() < 0.011);
        assert_eq!(day_cents(&records), 800);
    }

    #[test]
    fn records_carry_classification_and_trace_fields() {
        let mut c = commit("aaa", 9, 10, 1);
        c.message = "fix: stop the bleeding\n\ndetails".into();
        c.url = Some("https://gitlab.example.com/group/app/-/commit/aaa".into());
        let timestamp = c.timestamp;
        let records = allocate(&[c], &config(8.0));
        assert_eq!(records[0].kind, TaskKind::Fix);
        assert_eq!(records[0].task, "fix: stop the bleeding");
        assert_eq!(records[0].project, "group/app");
        assert_eq!(records[0].branch, "main");
        assert_eq!(records[0].time, timestamp);
        assert!(records[0].url.is_some());
    }
}
