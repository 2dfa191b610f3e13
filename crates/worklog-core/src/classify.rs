//! Commit message classification.
//!
//! An ordered table of (matcher, kind) rules evaluated in sequence; the
//! first match wins and [`TaskKind::Other`] catches everything else, so
//! every message gets exactly one label.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Task categories assigned to commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    Feature,
    Fix,
    Refactor,
    Test,
    Docs,
    Style,
    Chore,
    Merge,
    Revert,
    Other,
}

impl TaskKind {
    /// Every kind, in the order report sections list them on equal counts.
    pub const ALL: [Self; 10] = [
        Self::Feature,
        Self::Fix,
        Self::Refactor,
        Self::Test,
        Self::Docs,
        Self::Style,
        Self::Chore,
        Self::Merge,
        Self::Revert,
        Self::Other,
    ];

    /// Canonical string label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Fix => "fix",
            Self::Refactor => "refactor",
            Self::Test => "test",
            Self::Docs => "docs",
            Self::Style => "style",
            Self::Chore => "chore",
            Self::Merge => "merge",
            Self::Revert => "revert",
            Self::Other => "other",
        }
    }

    /// Emoji used next to the label in rendered reports.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Feature => "✨",
            Self::Fix => "🐛",
            Self::Refactor => "♻️",
            Self::Test => "✅",
            Self::Docs => "📝",
            Self::Style => "💄",
            Self::Chore => "🔧",
            Self::Merge => "🔀",
            Self::Revert => "⏪",
            Self::Other => "📌",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feature" => Ok(Self::Feature),
            "fix" => Ok(Self::Fix),
            "refactor" => Ok(Self::Refactor),
            "test" => Ok(Self::Test),
            "docs" => Ok(Self::Docs),
            "style" => Ok(Self::Style),
            "chore" => Ok(Self::Chore),
            "merge" => Ok(Self::Merge),
            "revert" => Ok(Self::Revert),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::InvalidTaskKind {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for TaskKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One way a rule can match a message.
enum Matcher {
    /// Anchored regex over the raw message.
    Pattern(Regex),
    /// Case-insensitive prefix of the message.
    Prefix(&'static str),
    /// Case-insensitive substring anywhere in the message.
    Keyword(&'static str),
}

impl Matcher {
    fn matches(&self, message: &str, lowered: &str) -> bool {
        match self {
            Self::Pattern(pattern) => pattern.is_match(message),
            Self::Prefix(prefix) => lowered.starts_with(prefix),
            Self::Keyword(keyword) => lowered.contains(keyword),
        }
    }
}

const FIX_KEYWORDS: &[&str] = &[
    "fix", "bug", "bugfix", "hotfix", "error", "issue", "problem", "patch", "repair",
];
const FEAT_KEYWORDS: &[&str] = &[
    "feat", "feature", "add", "new", "implement", "create", "introduce", "support",
];
const TEST_KEYWORDS: &[&str] = &["test", "testing", "spec", "unit test", "e2e", "coverage"];
const REFACTOR_KEYWORDS: &[&str] = &[
    "refactor",
    "refactoring",
    "optimize",
    "improve",
    "restructure",
    "cleanup",
];
const DOCS_KEYWORDS: &[&str] = &["docs", "doc", "document", "readme", "comment", "changelog"];
const STYLE_KEYWORDS: &[&str] = &[
    "style",
    "format",
    "formatting",
    "lint",
    "prettier",
    "whitespace",
];

/// The rule table. Merge and revert are special forms checked first,
/// then conventional-commit prefixes, then looser keywords.
static RULES: LazyLock<Vec<(Matcher, TaskKind)>> = LazyLock::new(|| {
    let mut rules = vec![
        (
            Matcher::Pattern(
                Regex::new(r"(?i)^Merge\s+(branch|pull\s+request|remote)")
                    .expect("valid merge pattern"),
            ),
            TaskKind::Merge,
        ),
        (
            Matcher::Pattern(Regex::new(r"(?i)^Revert\s+").expect("valid revert pattern")),
            TaskKind::Revert,
        ),
        (Matcher::Prefix("fix"), TaskKind::Fix),
        (Matcher::Prefix("feat"), TaskKind::Feature),
        (Matcher::Prefix("refactor"), TaskKind::Refactor),
        (Matcher::Prefix("chore"), TaskKind::Chore),
        (Matcher::Prefix("docs"), TaskKind::Docs),
        (Matcher::Prefix("style"), TaskKind::Style),
        (Matcher::Prefix("test"), TaskKind::Test),
    ];
    for (keywords, kind) in [
        (FIX_KEYWORDS, TaskKind::Fix),
        (FEAT_KEYWORDS, TaskKind::Feature),
        (TEST_KEYWORDS, TaskKind::Test),
        (REFACTOR_KEYWORDS, TaskKind::Refactor),
        (DOCS_KEYWORDS, TaskKind::Docs),
        (STYLE_KEYWORDS, TaskKind::Style),
    ] {
        rules.extend(
            keywords
                .iter()
                .map(|keyword| (Matcher::Keyword(keyword), kind)),
        );
    }
    rules
});

/// Classifies a commit message.
///
/// Pure and total: any string, including the empty string, maps to
/// exactly one [`TaskKind`].
#[must_use]
pub fn classify(message: &str) -> TaskKind {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|(matcher, _)| matcher.matches(message, &lowered))
        .map_or(TaskKind::Other, |(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_is_other() {
        assert_eq!(classify(""), TaskKind::Other);
    }

    #[test]
    fn unmatched_message_is_other() {
        assert_eq!(classify("bump version to 1.2.3"), TaskKind::Other);
    }

    #[test]
    fn conventional_prefixes() {
        assert_eq!(classify("feat: user login"), TaskKind::Feature);
        assert_eq!(classify("fix(auth): expired token"), TaskKind::Fix);
        assert_eq!(classify("refactor: split parser"), TaskKind::Refactor);
        assert_eq!(classify("chore: bump deps"), TaskKind::Chore);
        assert_eq!(classify("docs: install guide"), TaskKind::Docs);
        assert_eq!(classify("style: rustfmt"), TaskKind::Style);
        assert_eq!(classify("test: cover edge case"), TaskKind::Test);
    }

    #[test]
    fn prefixes_are_case_insensitive() {
        assert_eq!(classify("FIX typo"), TaskKind::Fix);
        assert_eq!(classify("Feat: dashboard"), TaskKind::Feature);
    }

    #[test]
    fn merge_commits_detected_first() {
        assert_eq!(classify("Merge branch 'main' into dev"), TaskKind::Merge);
        assert_eq!(classify("Merge pull request #42"), TaskKind::Merge);
        assert_eq!(classify("merge remote-tracking branch"), TaskKind::Merge);
        // A merge of a fix branch is still a merge.
        assert_eq!(classify("Merge branch 'fix-crash'"), TaskKind::Merge);
    }

    #[test]
    fn revert_commits_detected() {
        assert_eq!(classify("Revert \"feat: add cache\""), TaskKind::Revert);
    }

    #[test]
    fn plain_merge_word_is_not_merge_kind() {
        // Only the platform's merge-commit forms count.
        assert_eq!(classify("merged lists in parser"), TaskKind::Other);
    }

    #[test]
    fn keywords_catch_unprefixed_messages() {
        assert_eq!(classify("resolved a nasty problem"), TaskKind::Fix);
        assert_eq!(classify("Support dark mode"), TaskKind::Feature);
        assert_eq!(classify("cleanup imports"), TaskKind::Refactor);
        assert_eq!(classify("update readme"), TaskKind::Docs);
        assert_eq!(classify("run prettier"), TaskKind::Style);
        assert_eq!(classify("improve coverage"), TaskKind::Test);
    }

    #[test]
    fn first_match_wins_across_tiers() {
        // Prefix tier beats the keyword tier.
        assert_eq!(classify("style: fix spacing"), TaskKind::Style);
        // Within the keyword tier, fix keywords come before test keywords.
        assert_eq!(classify("squash the flaky test bug"), TaskKind::Fix);
    }

    #[test]
    fn every_message_gets_exactly_one_label() {
        let long = "a very long message ".repeat(50);
        let messages = ["", " ", "feat: x", "Merge branch 'a'", "WIP", "日常更新", long.as_str()];
        for message in messages {
            let kind = classify(message);
            assert!(TaskKind::ALL.contains(&kind));
        }
    }

    #[test]
    fn task_kind_string_roundtrip() {
        for kind in TaskKind::ALL {
            let parsed: TaskKind = kind.as_str().parse().expect("should parse");
            assert_eq!(parsed, kind);
        }
        assert!("unknown".parse::<TaskKind>().is_err());
    }

    #[test]
    fn task_kind_serde_uses_labels() {
        let json = serde_json::to_string(&TaskKind::Feature).unwrap();
        assert_eq!(json, "\"feature\"");
        let parsed: TaskKind = serde_json::from_str("\"fix\"").unwrap();
        assert_eq!(parsed, TaskKind::Fix);
    }
}
