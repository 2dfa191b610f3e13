//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Instance to talk to when the repo reference does not name one.
    pub gitlab_url: String,
    /// Personal access token. `WORKLOG_TOKEN` and `GITLAB_TOKEN` work too.
    pub token: Option<String>,
    /// Hour budget attributed to each active day.
    pub daily_hours: f64,
}

// Manual impl so the token never lands in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gitlab_url", &self.gitlab_url)
            .field("token", &self.token.as_deref().map(|_| "***"))
            .field("daily_hours", &self.daily_hours)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gitlab_url: "https://gitlab.com".to_string(),
            token: None,
            daily_hours: 8.0,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WORKLOG_*)
        figment = figment.merge(Env::prefixed("WORKLOG_"));

        figment.extract()
    }

    /// Resolves the access token, highest precedence first: an explicit
    /// flag, the config/`WORKLOG_TOKEN` value, then `GITLAB_TOKEN`.
    #[must_use]
    pub fn resolve_token(&self, flag: Option<&str>) -> Option<String> {
        if let Some(token) = non_empty(flag) {
            return Some(token);
        }
        if let Some(token) = non_empty(self.token.as_deref()) {
            return Some(token);
        }
        std::env::var("GITLAB_TOKEN")
            .ok()
            .and_then(|value| non_empty(Some(&value)))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Returns the platform-specific config directory for worklog.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("worklog"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_hosted_instance() {
        let config = Config::default();
        assert_eq!(config.gitlab_url, "https://gitlab.com");
        assert!(config.token.is_none());
        assert!((config.daily_hours - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn flag_token_wins_over_config() {
        let config = Config {
            token: Some("from-config".into()),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_token(Some("from-flag")).as_deref(),
            Some("from-flag")
        );
    }

    #[test]
    fn blank_flag_falls_back_to_config() {
        let config = Config {
            token: Some("from-config".into()),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_token(Some("   ")).as_deref(),
            Some("from-config")
        );
    }

    #[test]
    fn config_token_is_trimmed() {
        let config = Config {
            token: Some("  glpat-x  ".into()),
            ..Config::default()
        };
        assert_eq!(config.resolve_token(None).as_deref(), Some("glpat-x"));
    }

    #[test]
    fn debug_redacts_token() {
        let config = Config {
            token: Some("glpat-secret".into()),
            ..Config::default()
        };
        let output = format!("{config:?}");
        assert!(!output.contains("glpat-secret"));
    }

    #[test]
    fn loads_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worklog.toml");
        std::fs::write(
            &path,
            "gitlab_url = \"https://gitlab.example.com\"\ndaily_hours = 6.5\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.gitlab_url, "https://gitlab.example.com");
        assert!((config.daily_hours - 6.5).abs() < f64::EPSILON);
    }
}
