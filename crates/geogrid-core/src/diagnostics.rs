//! Diagnostics infrastructure for tracking issues during reads and validation.
//!
//! Issues carry a severity, a category used for grouping ("topology",
//! "equipment", "validation", ...), a message and an optional entity
//! reference such as the GeoJSON feature id the issue belongs to.
//!
//! # Example
//!
//! ```
//! use geogrid_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning("topology", "Feeder has 2 islands");
//! diag.add_warning_with_entity("validation", "Line has zero length", "conn-7");
//!
//! assert_eq!(diag.warning_count(), 2);
//! assert!(diag.issues.iter().all(|i| i.severity == Severity::Warning));
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A value was filled in rather than read
    Note,
    /// Unusual but the operation continued
    Warning,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "topology", "equipment", "validation")
    pub category: String,
    pub message: String,
    /// Optional entity reference (e.g. a feature id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            entity: None,
        }
    }

    /// Attach an entity reference to the issue
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }

        Ok(())
    }
}

fn issue_summary(warnings: usize, notes: usize) -> String {
    match (warnings, notes) {
        (0, 0) => "No issues".to_string(),
        (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
        (0, n) => format!("{} note{}", n, if n == 1 { "" } else { "s" }),
        (w, n) => format!(
            "{} warning{}, {} note{}",
            w,
            if w == 1 { "" } else { "s" },
            n,
            if n == 1 { "" } else { "s" }
        ),
    }
}

fn count(issues: &[DiagnosticIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

/// Collection of diagnostic issues for an operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        count(&self.issues, Severity::Warning)
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn summary(&self) -> String {
        issue_summary(self.warning_count(), count(&self.issues, Severity::Note))
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

// ============================================================================
// Import-Specific Extensions
// ============================================================================

/// Element counts for a read operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub buses: usize,
    pub lines: usize,
    pub transformers: usize,
    pub capacitors: usize,
    pub loads: usize,
    pub generators: usize,
    /// Entities already present in the target model and left untouched
    pub duplicates_skipped: usize,
    /// Values filled in from defaults or geometry
    pub defaulted_values: usize,
}

impl ImportStats {
    /// Total number of entities counted
    pub fn entities(&self) -> usize {
        self.buses + self.lines + self.transformers + self.capacitors + self.loads + self.generators
    }
}

/// Complete diagnostics for a read operation: counts plus issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportDiagnostics {
    pub stats: ImportStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl ImportDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    /// Record a value that was filled in rather than read (increments defaulted_values)
    pub fn add_default(&mut self, entity: &str, message: &str) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Note, "default", message).with_entity(entity),
        );
        self.stats.defaulted_values += 1;
    }

    pub fn add_validation_warning(&mut self, entity: &str, message: &str) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Warning, "validation", message).with_entity(entity),
        );
    }

    pub fn warning_count(&self) -> usize {
        count(&self.issues, Severity::Warning)
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Pull in issues from a generic [`Diagnostics`] collection
    pub fn extend_from(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        format!(
            "{} buses, {} lines, {} transformers, {} capacitors, {} loads, {} generators | {}",
            self.stats.buses,
            self.stats.lines,
            self.stats.transformers,
            self.stats.capacitors,
            self.stats.loads,
            self.stats.generators,
            issue_summary(self.warning_count(), count(&self.issues, Severity::Note))
        )
    }
}

impl std::fmt::Display for ImportDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Import: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        assert!(!diag.has_issues());
        diag.add_warning("topology", "test warning");
        diag.add_warning_with_entity("topology", "entity warning", "conn-1");

        assert_eq!(diag.warning_count(), 2);
        assert!(diag.has_issues());
        assert!(diag.has_warnings());
    }

    #[test]
    fn test_diagnostics_serialization() {
        let mut diag = Diagnostics::new();
        diag.add_warning_with_entity("topology", "Unknown junction", "conn-1");

        let json = serde_json::to_string_pretty(&diag).unwrap();
        assert!(json.contains("\"warning\""));
        assert!(json.contains("\"entity\": \"conn-1\""));
    }

    #[test]
    fn test_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Warning, "validation", "Zero-length line")
            .with_entity("conn-4");

        let display = issue.to_string();
        assert_eq!(display, "[warning:validation] Zero-length line (conn-4)");
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "No issues");

        diag.add_warning("topology", "warning");
        assert_eq!(diag.summary(), "1 warning");

        diag.add_warning("topology", "another warning");
        assert_eq!(diag.summary(), "2 warnings");
    }

    #[test]
    fn test_import_diagnostics_defaults_and_summary() {
        let mut diag = ImportDiagnostics::new();
        diag.stats.buses = 3;
        diag.stats.lines = 2;
        diag.add_default("conn-1", "Length computed from geometry");

        assert_eq!(diag.stats.defaulted_values, 1);
        assert_eq!(diag.stats.entities(), 5);
        assert_eq!(diag.warning_count(), 0);
        assert!(diag.has_issues());
        let summary = diag.summary();
        assert!(summary.contains("3 buses"));
        assert!(summary.ends_with("| 1 note"));

        diag.add_validation_warning("conn-1", "Line has zero length");
        assert!(diag.summary().ends_with("| 1 warning, 1 note"));
        assert_eq!(
            diag.issues[0].to_string(),
            "[note:default] Length computed from geometry (conn-1)"
        );
    }

    #[test]
    fn test_import_diagnostics_extend() {
        let mut generic = Diagnostics::new();
        generic.add_warning("structure", "Model has no buses");

        let mut diag = ImportDiagnostics::new();
        diag.extend_from(generic);
        assert_eq!(diag.warning_count(), 1);
    }
}
