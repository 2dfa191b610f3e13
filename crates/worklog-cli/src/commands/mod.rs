//! CLI subcommand implementations.

pub mod projects;
pub mod report;

/// Shared hint for every command that needs a token.
pub(crate) const MISSING_TOKEN_HINT: &str =
    "missing access token (use --token, WORKLOG_TOKEN, GITLAB_TOKEN, or config.toml)";
