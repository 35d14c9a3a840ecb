//! Shared data models for findings, reports, and document schemas.

pub mod schema;

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
/// How much a finding matters for the exit status.
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
/// What kind of deviation a finding describes.
pub enum FindingKind {
    /// A heading or field the schema demands is absent.
    MissingRequiredElement,
    /// Present but misplaced.
    OutOfOrderElement,
    /// Present but not declared by the schema.
    UnrecognizedElement,
    /// Two declarations of the same schema disagree.
    CrossSourceMismatch,
    /// A referenced file or directory does not exist.
    MissingInputFile,
    /// Metadata block absent or unusable where required.
    MalformedFrontmatter,
    /// A content rule (diagram, marker, reference, version...) is violated.
    ContentViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
/// A single reported deviation with severity and location.
///
/// Findings are created once and never mutated after being pushed into a
/// [`Findings`] accumulator.
pub struct Finding {
    pub severity: Severity,
    pub kind: FindingKind,
    pub rule: String,
    pub file: String,
    pub line: Option<usize>,
    pub message: String,
}

impl Finding {
    pub fn new(
        severity: Severity,
        kind: FindingKind,
        rule: &str,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Finding {
            severity,
            kind,
            rule: rule.to_string(),
            file: file.into(),
            line: None,
            message: message.into(),
        }
    }

    pub fn error(
        kind: FindingKind,
        rule: &str,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, kind, rule, file, message)
    }

    pub fn warning(
        kind: FindingKind,
        rule: &str,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, kind, rule, file, message)
    }

    pub fn info(
        kind: FindingKind,
        rule: &str,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Info, kind, rule, file, message)
    }

    /// Attach a 1-based line number.
    pub fn at(mut self, line: usize) -> Self {
        self.line = if line == 0 { None } else { Some(line) };
        self
    }
}

#[derive(Debug, Default)]
/// Accumulator threaded through every check of a run.
pub struct Findings {
    items: Vec<Finding>,
    documents: usize,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.items.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.items.extend(findings);
    }

    /// Count one document as examined.
    pub fn checked(&mut self) {
        self.documents += 1;
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn as_slice(&self) -> &[Finding] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_report(self) -> Report {
        Report::new(self.items, self.documents)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
/// Overall outcome of a run.
pub enum Status {
    Clean,
    Warnings,
    Failed,
}

impl Status {
    pub fn exit_code(&self) -> i32 {
        match self {
            Status::Failed => 1,
            Status::Clean | Status::Warnings => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
/// Aggregated counts used by printers.
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub documents: usize,
}

#[derive(Debug, Clone, Serialize)]
/// Final, de-duplicated finding list for a run.
pub struct Report {
    pub findings: Vec<Finding>,
    pub summary: Summary,
}

impl Report {
    /// Build a report, dropping exact duplicates while keeping first-seen order.
    pub fn new(findings: Vec<Finding>, documents: usize) -> Self {
        let mut seen: HashSet<Finding> = HashSet::new();
        let findings: Vec<Finding> = findings
            .into_iter()
            .filter(|f| seen.insert(f.clone()))
            .collect();
        let count = |sev: Severity| findings.iter().filter(|f| f.severity == sev).count();
        let summary = Summary {
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            infos: count(Severity::Info),
            documents,
        };
        Report { findings, summary }
    }

    pub fn status(&self) -> Status {
        if self.summary.errors > 0 {
            Status::Failed
        } else if self.summary.warnings > 0 {
            Status::Warnings
        } else {
            Status::Clean
        }
    }

    /// Findings of one severity, in run order.
    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// One-line summary used by the JSON artifact.
    pub fn headline(&self) -> String {
        format!("{} issue(s) found", self.findings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drift(sev: Severity, msg: &str) -> Finding {
        Finding::new(sev, FindingKind::ContentViolation, "test", "a.md", msg)
    }

    #[test]
    fn test_status_follows_worst_severity() {
        let clean = Findings::new().into_report();
        assert_eq!(clean.status(), Status::Clean);
        assert_eq!(clean.status().exit_code(), 0);

        let mut f = Findings::new();
        f.push(drift(Severity::Warning, "w"));
        f.push(drift(Severity::Info, "i"));
        let warned = f.into_report();
        assert_eq!(warned.status(), Status::Warnings);
        assert_eq!(warned.status().exit_code(), 0);

        let mut f = Findings::new();
        f.push(drift(Severity::Warning, "w"));
        f.push(drift(Severity::Error, "e"));
        assert_eq!(f.into_report().status().exit_code(), 1);
    }

    #[test]
    fn test_report_dedups_and_keeps_order() {
        let mut f = Findings::new();
        f.push(drift(Severity::Warning, "first"));
        f.push(drift(Severity::Error, "second"));
        f.push(drift(Severity::Warning, "first"));
        let r = f.into_report();
        assert_eq!(r.findings.len(), 2);
        assert_eq!(r.findings[0].message, "first");
        assert_eq!(r.findings[1].message, "second");
        assert_eq!(r.summary.errors, 1);
        assert_eq!(r.summary.warnings, 1);
    }

    #[test]
    fn test_line_zero_means_unknown() {
        assert_eq!(drift(Severity::Info, "x").at(0).line, None);
        assert_eq!(drift(Severity::Info, "x").at(4).line, Some(4));
    }
}
