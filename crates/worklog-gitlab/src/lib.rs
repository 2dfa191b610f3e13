//! GitLab-compatible platform access for the work log generator.
//!
//! - [`client`]: authenticated HTTP client with retry and pagination
//! - [`api`]: wire types and query building
//! - [`source`]: the read-side trait the aggregator runs against
//! - [`aggregate`]: multi-project fetch, degradation, and dedup

pub mod aggregate;
pub mod api;
pub mod client;
pub mod source;

pub use aggregate::{Aggregation, FetchRequest, FetchScope, RunWarning, aggregate};
pub use api::{ApiCommit, ApiCommitStats, ApiDiff, ApiProject, ApiUser, CommitQuery};
pub use client::{Client, GitlabError, instance_base_url, parse_project_path};
pub use source::CommitSource;
