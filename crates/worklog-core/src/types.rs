//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid task kind value.
    #[error("invalid task kind: {value}")]
    InvalidTaskKind { value: String },
}

/// Generates a validated string newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated commit identifier (the platform's short hash).
    ///
    /// Commit IDs must be non-empty strings. Together with the owning
    /// project they uniquely identify a commit within one run.
    CommitId, "commit ID"
);

define_string_id!(
    /// The author identity a run is scoped to.
    ///
    /// Accepts whatever the platform matches against its `author` filter:
    /// a display name, an email address, or the combined `Name <email>`
    /// form. Must be non-empty.
    Author, "author"
);

impl Author {
    /// Query formats to try against the platform, most specific first.
    ///
    /// The platform's author filter is picky about which form it matches,
    /// so a combined `Name <email>` identity expands into the raw string,
    /// the email between the angle brackets, and the bare name before them.
    pub fn candidates(&self) -> Vec<&str> {
        let mut formats = vec![self.as_str()];
        if let (Some(open), Some(close)) = (self.0.find('<'), self.0.rfind('>'))
            && open < close
        {
            let email = self.0[open + 1..close].trim();
            if !email.is_empty() {
                formats.push(email);
            }
            let name = self.0[..open].trim();
            if !name.is_empty() {
                formats.push(name);
            }
        }
        formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_id_rejects_empty() {
        assert!(CommitId::new("").is_err());
        assert!(CommitId::new("a1b2c3d4").is_ok());
    }

    #[test]
    fn author_rejects_empty() {
        assert!(Author::new("").is_err());
        assert!(Author::new("jane@example.com").is_ok());
    }

    #[test]
    fn commit_id_serde_roundtrip() {
        let id = CommitId::new("a1b2c3d4").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"a1b2c3d4\"");
        let parsed: CommitId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn commit_id_serde_rejects_empty() {
        let result: Result<CommitId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn commit_id_as_ref() {
        let id = CommitId::new("deadbeef").unwrap();
        let s: &str = id.as_ref();
        assert_eq!(s, "deadbeef");
    }

    #[test]
    fn commit_id_orders_lexically() {
        let a = CommitId::new("aaa").unwrap();
        let b = CommitId::new("bbb").unwrap();
        assert!(a < b);
    }

    // ========== candidates tests ==========

    #[test]
    fn author_candidates_full_form() {
        let author = Author::new("Jane Doe <jane@example.com>").unwrap();
        assert_eq!(
            author.candidates(),
            vec!["Jane Doe <jane@example.com>", "jane@example.com", "Jane Doe"]
        );
    }

    #[test]
    fn author_candidates_bare_email() {
        let author = Author::new("jane@example.com").unwrap();
        assert_eq!(author.candidates(), vec!["jane@example.com"]);
    }

    #[test]
    fn author_candidates_empty_brackets() {
        let author = Author::new("Jane <>").unwrap();
        assert_eq!(author.candidates(), vec!["Jane <>", "Jane"]);
    }

    #[test]
    fn author_candidates_brackets_only() {
        let author = Author::new("<jane@example.com>").unwrap();
        assert_eq!(
            author.candidates(),
            vec!["<jane@example.com>", "jane@example.com"]
        );
    }
}
