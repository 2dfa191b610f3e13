//! Core domain logic for the work log generator.
//!
//! This crate contains the fundamental types and logic for:
//! - Normalization: canonical commits out of raw platform records
//! - Allocation: distributing a daily hour budget across each day's commits
//! - Classification: task kinds from commit messages
//! - Report assembly: the flat work log and the sectioned daily report

pub mod allocation;
pub mod classify;
pub mod commit;
pub mod normalize;
pub mod report;
pub mod types;

pub use allocation::{AllocationConfig, WorkHourRecord, allocate};
pub use classify::{TaskKind, classify};
pub use commit::{
    DayBucket, DiffHandle, DiffResolver, FileDiff, LineStats, MULTI_BRANCH, NormalizedCommit,
    Project, RawCommit, StatsError, bucket_by_day, summarize_message,
};
pub use normalize::{CommitSet, ResolvedStats, normalize, resolve_branch, resolve_stats};
pub use report::{
    CommitLine, DailyReport, KindSection, LogReport, Overview, ProjectSection, ReportMeta,
    assemble_daily, assemble_log, total_allocated_hours,
};
pub use types::{Author, CommitId, ValidationError};
