//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::projects::ProjectsArgs;
use crate::commands::report::ReportArgs;

/// Work log generator.
///
/// Aggregates one author's commits across GitLab projects and turns them
/// into per-day work-hour reports.
#[derive(Debug, Parser)]
#[command(name = "worklog", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a work log report from commit history.
    Report(ReportArgs),

    /// List the projects visible to the configured token.
    Projects(ProjectsArgs),
}
