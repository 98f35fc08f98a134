use serde::{Deserialize, Serialize};
use std::fmt;

/// Which external collaborator an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Agent,
    Judge,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collaborator::Agent => f.write_str("agent"),
            Collaborator::Judge => f.write_str("judge"),
        }
    }
}

/// Evaluation error taxonomy.
///
/// `Configuration`, `Alignment` and `Corpus` abort a run before any report is
/// produced. `Connectivity` and `Parse` are per-item and stay visible in the
/// item detail of the report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("{collaborator} unreachable: {message}")]
    Connectivity {
        collaborator: Collaborator,
        message: String,
    },

    #[error("parse error: {message}")]
    Parse {
        message: String,
        /// Leading excerpt of the offending text, if any.
        excerpt: Option<String>,
    },

    #[error("alignment error: submitted {submitted} queries but received {received} responses ({detail})")]
    Alignment {
        submitted: usize,
        received: usize,
        detail: String,
    },

    #[error("corpus error: {message}")]
    Corpus { message: String },
}

const EXCERPT_CHARS: usize = 120;

impl EvalError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn connectivity(collaborator: Collaborator, message: impl Into<String>) -> Self {
        Self::Connectivity {
            collaborator,
            message: message.into(),
        }
    }

    pub fn timeout(collaborator: Collaborator, secs: u64) -> Self {
        Self::connectivity(collaborator, format!("timed out after {}s", secs))
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            excerpt: None,
        }
    }

    pub fn parse_with_excerpt(message: impl Into<String>, raw: &str) -> Self {
        Self::Parse {
            message: message.into(),
            excerpt: Some(raw.chars().take(EXCERPT_CHARS).collect()),
        }
    }

    pub fn alignment(submitted: usize, received: usize, detail: impl Into<String>) -> Self {
        Self::Alignment {
            submitted,
            received,
            detail: detail.into(),
        }
    }

    pub fn corpus(message: impl Into<String>) -> Self {
        Self::Corpus {
            message: message.into(),
        }
    }

    /// Stable machine-readable kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::Configuration { .. } => "configuration_error",
            EvalError::Connectivity { .. } => "connectivity_error",
            EvalError::Parse { .. } => "parse_error",
            EvalError::Alignment { .. } => "alignment_error",
            EvalError::Corpus { .. } => "corpus_error",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EvalError::Configuration { .. } | EvalError::Alignment { .. } | EvalError::Corpus { .. }
        )
    }
}

/// Serializable form of a per-item error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemError {
    pub kind: String,
    pub message: String,
}

impl From<&EvalError> for ItemError {
    fn from(e: &EvalError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification_matches_taxonomy() {
        assert!(EvalError::configuration("missing model").is_fatal());
        assert!(EvalError::alignment(3, 2, "count").is_fatal());
        assert!(EvalError::corpus("dup").is_fatal());
        assert!(!EvalError::timeout(Collaborator::Agent, 30).is_fatal());
        assert!(!EvalError::parse("bad json").is_fatal());
    }

    #[test]
    fn excerpt_is_truncated() {
        let raw = "x".repeat(500);
        let EvalError::Parse { excerpt, .. } = EvalError::parse_with_excerpt("bad", &raw) else {
            panic!("expected parse error");
        };
        assert_eq!(excerpt.unwrap().len(), EXCERPT_CHARS);
    }

    #[test]
    fn item_error_carries_kind_and_message() {
        let e = EvalError::timeout(Collaborator::Judge, 5);
        let item = ItemError::from(&e);
        assert_eq!(item.kind, "connectivity_error");
        assert_eq!(item.message, "judge unreachable: timed out after 5s");
    }
}
