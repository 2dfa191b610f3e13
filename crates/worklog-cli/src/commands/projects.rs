//! List the projects the configured token can see.

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use tracing::info;

use worklog_gitlab::Client;

use crate::Config;
use crate::commands::MISSING_TOKEN_HINT;

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Personal access token; overrides config and environment.
    #[arg(long)]
    pub token: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &ProjectsArgs, config: &Config) -> Result<()> {
    let token = config
        .resolve_token(args.token.as_deref())
        .ok_or_else(|| anyhow!(MISSING_TOKEN_HINT))?;
    let client = Client::new(&config.gitlab_url, &token).context("failed to create API client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let projects = runtime
        .block_on(client.projects())
        .context("failed to list projects")?;
    info!(count = projects.len(), "projects listed");

    if args.json {
        let entries: Vec<serde_json::Value> = projects
            .iter()
            .map(|project| {
                serde_json::json!({
                    "id": project.id,
                    "path": project.path_with_namespace,
                    "web_url": project.web_url,
                })
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if projects.is_empty() {
        writeln!(writer, "No projects visible to this token.")?;
        return Ok(());
    }
    writeln!(writer, "{:>8}  {:<40}  {}", "ID", "PATH", "URL")?;
    for project in &projects {
        writeln!(
            writer,
            "{:>8}  {:<40}  {}",
            project.id, project.path_with_namespace, project.web_url
        )?;
    }
    Ok(())
}
