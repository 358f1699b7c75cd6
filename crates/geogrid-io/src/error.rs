//! Reader error taxonomy.
//!
//! Configuration and I/O problems abort a read immediately. Problems found
//! while translating features are collected in an [`IssueLog`] and reported
//! together once every sub-parser has run, split into malformed input and
//! unresolvable cross-references.

use std::fmt;
use std::path::PathBuf;

use geogrid_core::{GridError, ImportDiagnostics};
use serde::Serialize;
use thiserror::Error;

/// Sub-parser (or input document) an issue was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Features,
    Equipment,
    Assignments,
    Lines,
    Nodes,
    Transformers,
    Capacitors,
    Loads,
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Features => "features",
            Stage::Equipment => "equipment",
            Stage::Assignments => "assignments",
            Stage::Lines => "lines",
            Stage::Nodes => "nodes",
            Stage::Transformers => "transformers",
            Stage::Capacitors => "capacitors",
            Stage::Loads => "loads",
            Stage::Generation => "generation",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// The input itself is wrong: missing field, bad geometry, duplicate id
    Malformed,
    /// The input is well formed but points at something that does not exist
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseIssue {
    pub kind: IssueKind,
    pub stage: Stage,
    /// Feature id, catalog name or load feature the issue belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub message: String,
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.stage)?;
        if let Some(entity) = &self.entity {
            write!(f, " {entity}:")?;
        }
        write!(f, " {}", self.message)
    }
}

fn list_issues(issues: &[ParseIssue]) -> String {
    let mut out = format!("{} issue{}", issues.len(), if issues.len() == 1 { "" } else { "s" });
    for issue in issues {
        out.push_str("\n  ");
        out.push_str(&issue.to_string());
    }
    out
}

#[derive(Error, Debug)]
pub enum ReaderError {
    /// A required input is missing or the reader configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("problem trying to read json from {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed input: {}", list_issues(.0))]
    Malformed(Vec<ParseIssue>),

    #[error("unresolved references: {}", list_issues(.0))]
    CrossReference(Vec<ParseIssue>),

    /// Validation produced findings that strict mode does not accept
    #[error("validation failed: {}", .0.summary())]
    Validation(ImportDiagnostics),

    /// The target model refused the parsed elements
    #[error(transparent)]
    Model(#[from] GridError),
}

impl ReaderError {
    /// Issues carried by a malformed or cross-reference failure
    pub fn issues(&self) -> &[ParseIssue] {
        match self {
            ReaderError::Malformed(issues) | ReaderError::CrossReference(issues) => issues,
            _ => &[],
        }
    }
}

/// Collects issues across all sub-parsers of one read
#[derive(Debug, Default)]
pub struct IssueLog {
    issues: Vec<ParseIssue>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn malformed(&mut self, stage: Stage, entity: &str, message: impl Into<String>) {
        self.push(IssueKind::Malformed, stage, Some(entity), message.into());
    }

    pub fn unresolved(&mut self, stage: Stage, entity: &str, message: impl Into<String>) {
        self.push(IssueKind::Unresolved, stage, Some(entity), message.into());
    }

    /// Malformed issue not tied to a single entity
    pub fn malformed_input(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(IssueKind::Malformed, stage, None, message.into());
    }

    fn push(&mut self, kind: IssueKind, stage: Stage, entity: Option<&str>, message: String) {
        tracing::debug!(%stage, ?kind, entity, "{message}");
        self.issues.push(ParseIssue {
            kind,
            stage,
            entity: entity.map(str::to_string),
            message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Malformed issues take precedence; unresolved ones are reported only
    /// when the input is otherwise well formed.
    pub fn into_result(self) -> Result<(), ReaderError> {
        if self.issues.is_empty() {
            return Ok(());
        }
        let (malformed, unresolved): (Vec<_>, Vec<_>) = self
            .issues
            .into_iter()
            .partition(|i| i.kind == IssueKind::Malformed);
        if malformed.is_empty() {
            Err(ReaderError::CrossReference(unresolved))
        } else {
            Err(ReaderError::Malformed(malformed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_wins_over_unresolved() {
        let mut log = IssueLog::new();
        log.unresolved(Stage::Lines, "conn-1", "unknown junction 'J9'");
        log.malformed(Stage::Nodes, "j-2", "junction geometry must be a Point");

        match log.into_result() {
            Err(ReaderError::Malformed(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].entity.as_deref(), Some("j-2"));
            }
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_are_aggregated() {
        let mut log = IssueLog::new();
        log.unresolved(Stage::Lines, "conn-1", "unknown line type 'lt-x'");
        log.unresolved(Stage::Capacitors, "cap-1", "unknown capacitor 'c-x'");
        assert_eq!(log.count(IssueKind::Unresolved), 2);

        let err = log.into_result().unwrap_err();
        assert_eq!(err.issues().len(), 2);
        let text = err.to_string();
        assert!(text.starts_with("unresolved references: 2 issues"));
        assert!(text.contains("[capacitors] cap-1: unknown capacitor 'c-x'"));
    }

    #[test]
    fn empty_log_is_ok() {
        assert!(IssueLog::new().into_result().is_ok());
    }

    #[test]
    fn io_error_names_path() {
        let err = ReaderError::Io {
            path: PathBuf::from("/data/feeder.geojson"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/data/feeder.geojson"));
    }
}
