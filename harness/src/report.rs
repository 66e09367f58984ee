//! `ValidationReport`: ordered issues produced by every checker.
//!
//! All failure kinds surface here as values. Only the retry loop decides
//! what to do about them.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
}

/// Failure taxonomy shared by the pipeline and all checkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A generation step could not satisfy its preconditions.
    StepFailure,
    /// Exhaustive search proved no goal is reachable.
    Unreachable,
    /// Search was inconclusive (ceiling hit or callback panic).
    BudgetExceeded,
    /// The world document is malformed.
    SchemaViolation,
    RewardMisalignment,
}

impl IssueKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StepFailure => "step_failure",
            Self::Unreachable => "unreachable",
            Self::BudgetExceeded => "budget_exceeded",
            Self::SchemaViolation => "schema_violation",
            Self::RewardMisalignment => "reward_misalignment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    pub fn critical(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Critical,
            message: message.into(),
        }
    }

    pub fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn with_severity(kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
        };
        write!(f, "[{sev}] {}: {}", self.kind.as_str(), self.message)
    }
}

/// Ordered issues plus the solvability summary of the checked world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
    /// Witness length when the search reached a goal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_depth: Option<u32>,
    /// Search outcome label (`reached`, `unreachable`, ...), if a search ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_outcome: Option<String>,
    /// Digest of the canonical search report, if a search ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_report_digest: Option<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Append another report's issues, keeping order.
    pub fn extend(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    /// `true` when no issue is `Critical`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Critical)
    }

    #[must_use]
    pub fn critical_count(&self) -> usize {
        self.count(Severity::Critical)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    #[must_use]
    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} critical, {} warning)",
            if self.is_valid() { "valid" } else { "invalid" },
            self.critical_count(),
            self.warning_count()
        )
    }
}
