//! Report command: the end-to-end run.
//!
//! Validates the run configuration up front (everything here is fatal
//! before any network call), pulls commits from the platform, allocates
//! hours, assembles the requested report shape, and writes the file in
//! one shot after assembly. Per-project warnings are replayed at the end
//! so they cannot be mistaken for a failed run.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, NaiveDate, Utc};
use clap::{ArgGroup, Args, ValueEnum};
use tracing::{info, warn};

use worklog_core::{
    AllocationConfig, Author, ReportMeta, allocate, assemble_daily, assemble_log,
    total_allocated_hours,
};
use worklog_gitlab::{
    Client, FetchRequest, FetchScope, aggregate, instance_base_url, parse_project_path,
};

use crate::Config;
use crate::commands::MISSING_TOKEN_HINT;
use crate::render;

/// Which document to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportShape {
    /// Flat table, one row per allocated record.
    Log,
    /// Sectioned per-day report with overview and timeline.
    Daily,
}

impl ReportShape {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Daily => "daily",
        }
    }
}

#[derive(Debug, Args)]
#[command(group = ArgGroup::new("scope").required(true).args(["repo", "scan_all"]))]
pub struct ReportArgs {
    /// Project to report on: group/project or a full repository URL.
    #[arg(long, value_name = "URL_OR_PATH")]
    pub repo: Option<String>,

    /// Scan every project visible to the token instead.
    #[arg(long)]
    pub scan_all: bool,

    /// Author to attribute: "Name <email>", bare email, or name.
    #[arg(short, long)]
    pub author: String,

    /// Start date (YYYY-MM-DD, inclusive). Omit to include all history.
    #[arg(long, value_name = "DATE")]
    pub since: Option<NaiveDate>,

    /// End date (YYYY-MM-DD, inclusive). Defaults to today.
    #[arg(long, value_name = "DATE")]
    pub until: Option<NaiveDate>,

    /// Report on today only.
    #[arg(long, conflicts_with_all = ["since", "until"])]
    pub today: bool,

    /// Only count commits reachable from this branch.
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Hours to attribute to each active day.
    #[arg(long, value_name = "HOURS")]
    pub daily_hours: Option<f64>,

    /// Which report to produce.
    #[arg(long, value_enum, default_value_t = ReportShape::Log)]
    pub format: ReportShape,

    /// Output file, or a directory for the default file name.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Personal access token; overrides config and environment.
    #[arg(long)]
    pub token: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config) -> Result<()> {
    let (since, until) = resolve_range(args, Local::now().date_naive())?;
    let daily_hours = args.daily_hours.unwrap_or(config.daily_hours);
    if !daily_hours.is_finite() || daily_hours <= 0.0 {
        bail!("--daily-hours must be a positive number of hours");
    }
    let author = Author::new(&args.author).context("invalid --author")?;
    let token = config
        .resolve_token(args.token.as_deref())
        .ok_or_else(|| anyhow!(MISSING_TOKEN_HINT))?;
    let (scope, base_url) = resolve_scope(args, config)?;

    let client = Client::new(&base_url, &token).context("failed to create API client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;

    let user = runtime
        .block_on(client.current_user())
        .context("credential check failed")?;
    info!(user = %user.username, instance = %base_url, "authenticated");

    let request = FetchRequest {
        author,
        since,
        until: Some(until),
        branch: args.branch.clone(),
        scope,
    };
    let aggregation = runtime
        .block_on(aggregate(&client, &request))
        .context("failed to fetch commits")?;

    let records = allocate(&aggregation.commits, &AllocationConfig { daily_hours });
    let total_hours = total_allocated_hours(&records);
    let meta = ReportMeta {
        author: request.author.clone(),
        since,
        until,
        generated_at: Utc::now(),
    };
    let markdown = match args.format {
        ReportShape::Log => render::format_log_markdown(&assemble_log(meta, daily_hours, records)),
        ReportShape::Daily => {
            render::format_daily_markdown(&assemble_daily(meta, &aggregation.commits, &records))
        }
    };

    let path = resolve_output_path(
        args.output.as_deref(),
        args.format,
        &request.author,
        since,
        until,
    );
    std::fs::write(&path, &markdown)
        .with_context(|| format!("failed to write {}", path.display()))?;

    for warning in &aggregation.warnings {
        warn!(project = %warning.project, "skipped: {}", warning.message);
    }
    info!(
        projects = aggregation.projects.len(),
        commits = aggregation.commits.len(),
        total_hours,
        output = %path.display(),
        "work log written"
    );
    writeln!(writer, "Report written to {}", path.display())?;
    if !aggregation.warnings.is_empty() {
        writeln!(
            writer,
            "{} project(s) skipped; rerun with --verbose for details.",
            aggregation.warnings.len()
        )?;
    }
    Ok(())
}

/// Expands the date flags into the run's inclusive range. Both flags
/// omitted means today only; a missing end defaults to today; a missing
/// start leaves the range open toward the past.
fn resolve_range(args: &ReportArgs, today: NaiveDate) -> Result<(Option<NaiveDate>, NaiveDate)> {
    let (since, until) = if args.today || (args.since.is_none() && args.until.is_none()) {
        (Some(today), today)
    } else {
        (args.since, args.until.unwrap_or(today))
    };
    if let Some(since) = since
        && since > until
    {
        bail!("--since {since} is after --until {until}");
    }
    Ok((since, until))
}

/// The fetch scope, plus the instance to talk to. A full repository URL
/// names its own instance and overrides the configured one.
fn resolve_scope(args: &ReportArgs, config: &Config) -> Result<(FetchScope, String)> {
    if args.scan_all {
        return Ok((FetchScope::ScanAll, config.gitlab_url.clone()));
    }
    let Some(reference) = args.repo.as_deref() else {
        bail!("either --repo or --scan-all is required");
    };
    let path = parse_project_path(reference)?;
    let base_url = instance_base_url(reference).unwrap_or_else(|| config.gitlab_url.clone());
    Ok((FetchScope::Project(path), base_url))
}

/// Where the report lands: an explicit file, the default name inside an
/// explicit directory, or the default name in the working directory. An
/// open start date appears as `all` in the default name.
fn resolve_output_path(
    output: Option<&Path>,
    shape: ReportShape,
    author: &Author,
    since: Option<NaiveDate>,
    until: NaiveDate,
) -> PathBuf {
    let start = since.map_or_else(|| "all".to_string(), |date| date.to_string());
    let default_name = format!(
        "worklog_{}_{}_{start}_{until}.md",
        shape.as_str(),
        slug(author.as_str())
    );
    match output {
        None => PathBuf::from(default_name),
        Some(path) if path.is_dir() => path.join(default_name),
        Some(path) if path.extension().is_none() => path.with_extension("md"),
        Some(path) => path.to_path_buf(),
    }
}

/// File-name-safe author slug.
fn slug(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ReportArgs {
        ReportArgs {
            repo: Some("group/app".into()),
            scan_all: false,
            author: "jane@example.com".into(),
            since: None,
            until: None,
            today: false,
            branch: None,
            daily_hours: None,
            format: ReportShape::Log,
            output: None,
            token: None,
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // ========== Date range ==========

    #[test]
    fn range_defaults_to_today() {
        let today = date(2025, 12, 3);
        let (since, until) = resolve_range(&args(), today).unwrap();
        assert_eq!(since, Some(today));
        assert_eq!(until, today);
    }

    #[test]
    fn missing_until_defaults_to_today() {
        let mut args = args();
        args.since = Some(date(2025, 12, 1));
        let (since, until) = resolve_range(&args, date(2025, 12, 3)).unwrap();
        assert_eq!(since, Some(date(2025, 12, 1)));
        assert_eq!(until, date(2025, 12, 3));
    }

    #[test]
    fn missing_since_leaves_range_open() {
        // An end date alone reports all history up to it, even when it
        // is in the past.
        let mut args = args();
        args.until = Some(date(2025, 12, 1));
        let (since, until) = resolve_range(&args, date(2025, 12, 6)).unwrap();
        assert_eq!(since, None);
        assert_eq!(until, date(2025, 12, 1));
    }

    #[test]
    fn today_flag_wins() {
        let mut args = args();
        args.today = true;
        let today = date(2025, 12, 3);
        let (since, until) = resolve_range(&args, today).unwrap();
        assert_eq!((since, until), (Some(today), today));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut args = args();
        args.since = Some(date(2025, 12, 5));
        args.until = Some(date(2025, 12, 1));
        let result = resolve_range(&args, date(2025, 12, 6));
        assert!(result.unwrap_err().to_string().contains("is after"));
    }

    // ========== Scope ==========

    #[test]
    fn scan_all_uses_configured_instance() {
        let mut args = args();
        args.repo = None;
        args.scan_all = true;
        let (scope, base) = resolve_scope(&args, &Config::default()).unwrap();
        assert_eq!(scope, FetchScope::ScanAll);
        assert_eq!(base, "https://gitlab.com");
    }

    #[test]
    fn bare_path_keeps_configured_instance() {
        let (scope, base) = resolve_scope(&args(), &Config::default()).unwrap();
        assert_eq!(scope, FetchScope::Project("group/app".into()));
        assert_eq!(base, "https://gitlab.com");
    }

    #[test]
    fn full_url_overrides_instance() {
        let mut args = args();
        args.repo = Some("https://gitlab.example.com/group/app.git".into());
        let (scope, base) = resolve_scope(&args, &Config::default()).unwrap();
        assert_eq!(scope, FetchScope::Project("group/app".into()));
        assert_eq!(base, "https://gitlab.example.com");
    }

    #[test]
    fn unnamespaced_repo_is_rejected() {
        let mut args = args();
        args.repo = Some("app".into());
        assert!(resolve_scope(&args, &Config::default()).is_err());
    }

    // ========== Output path ==========

    fn author() -> Author {
        Author::new("Jane Doe <jane@example.com>").unwrap()
    }

    #[test]
    fn default_output_name_encodes_the_run() {
        let path = resolve_output_path(
            None,
            ReportShape::Daily,
            &author(),
            Some(date(2025, 12, 1)),
            date(2025, 12, 3),
        );
        assert_eq!(
            path,
            PathBuf::from("worklog_daily_jane_doe_jane_example_com_2025-12-01_2025-12-03.md")
        );
    }

    #[test]
    fn open_range_output_name_marks_the_start() {
        let path = resolve_output_path(None, ReportShape::Log, &author(), None, date(2025, 12, 3));
        assert_eq!(
            path,
            PathBuf::from("worklog_log_jane_doe_jane_example_com_all_2025-12-03.md")
        );
    }

    #[test]
    fn directory_output_gets_default_name_inside() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_output_path(
            Some(dir.path()),
            ReportShape::Log,
            &author(),
            Some(date(2025, 12, 1)),
            date(2025, 12, 1),
        );
        assert_eq!(path.parent().unwrap(), dir.path());
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("worklog_log_")
        );
    }

    #[test]
    fn missing_extension_becomes_md() {
        let path = resolve_output_path(
            Some(Path::new("december")),
            ReportShape::Log,
            &author(),
            Some(date(2025, 12, 1)),
            date(2025, 12, 1),
        );
        assert_eq!(path, PathBuf::from("december.md"));
    }

    #[test]
    fn explicit_extension_is_kept() {
        let path = resolve_output_path(
            Some(Path::new("notes/december.markdown")),
            ReportShape::Log,
            &author(),
            Some(date(2025, 12, 1)),
            date(2025, 12, 1),
        );
        assert_eq!(path, PathBuf::from("notes/december.markdown"));
    }

    // ========== Slug ==========

    #[test]
    fn slug_flattens_author_formats() {
        assert_eq!(slug("Jane Doe <jane@example.com>"), "jane_doe_jane_example_com");
        assert_eq!(slug("jane@example.com"), "jane_example_com");
        assert_eq!(slug("Jane"), "jane");
    }
}
