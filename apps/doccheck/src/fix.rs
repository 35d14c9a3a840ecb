//! Heading drift analyzer and auto-fixer for generated artifacts.
//!
//! Agents tend to drift toward a handful of near-miss heading names
//! (`## Outputs` instead of `## Outputs (Expected)`). This module reports
//! missing and extra headings per file and, with `apply`, renames the known
//! near-misses in place. Only heading lines outside fenced blocks are
//! considered or rewritten, so examples inside code fences stay untouched.

use crate::config::Effective;
use crate::extract;
use crate::models::{Finding, FindingKind, Findings, Severity};
use crate::registry::{Registry, UNIVERSAL_OPTIONAL};
use crate::utils;
use std::fs;
use std::path::PathBuf;

pub const RULE_FIX_MISSING: &str = "fix-h2-missing";
pub const RULE_FIX_FIXABLE: &str = "fix-h2-fixable";
pub const RULE_FIX_EXTRA: &str = "fix-h2-extra";
pub const RULE_FIX_APPLIED: &str = "fix-h2-applied";
pub const RULE_FIX_SKIPPED: &str = "fix-h2-skipped";
pub const RULE_FIX_IO: &str = "fix-h2-io";

/// Observed near-miss headings and their canonical replacements.
pub const HEADING_FIXES: &[(&str, &str)] = &[
    ("## Outputs", "## Outputs (Expected)"),
    ("## Output", "## Outputs (Expected)"),
    ("## Expected Outputs", "## Outputs (Expected)"),
    ("## Deployment Outputs", "## Outputs (Expected)"),
    ("## Post-Deployment Configuration", "## Post-Deployment Tasks"),
    ("## Deployment Summary", "## Preflight Validation"),
    ("## Project Summary", "## 3. Project Summary"),
    ("## Document Package Contents", "## 1. Document Package Contents"),
    ("## Source Artifacts", "## 2. Source Artifacts"),
    ("## Related Resources", "## 4. Related Resources"),
    ("## Quick Links", "## 5. Quick Links"),
    ("## Resource Details", "## Resource Listing"),
    ("## Resources", "## Resource Listing"),
    ("## Introduction", "## 1. Introduction"),
    ("## 2. Architecture Overview", "## 2. Azure Architecture Overview"),
    ("## 3. Network Architecture", "## 3. Networking"),
    ("## 4. Storage Architecture", "## 4. Storage"),
    ("## 5. Compute Architecture", "## 5. Compute"),
    ("## 6. Security Architecture", "## 6. Identity & Access"),
    ("## 7. Compliance & Governance", "## 7. Security & Compliance"),
    ("## 8. Operations & Monitoring", "## 8. Backup & Disaster Recovery"),
    ("## 9. Cost Management", "## 9. Management & Monitoring"),
    ("## 10. Deployment & CI/CD", "## 10. Appendix"),
    ("## 3. Common Operational Procedures", "## 3. Common Procedures"),
    ("## 6. Contact Information", "## 6. Change Log"),
    ("## 3. Disaster Recovery Architecture", "## 3. Disaster Recovery Procedures"),
    ("## 4. Recovery Procedures", "## 4. Testing Schedule"),
    ("## 5. Failover Procedures", "## 5. Communication Plan"),
    ("## 6. Testing & Validation", "## 6. Roles and Responsibilities"),
    ("## 8. Roles & Responsibilities", "## 8. Recovery Runbooks"),
    ("## 9. Dependencies & External Services", "## 9. Appendix"),
    ("## 9. Improvement Roadmap", "## 9. Appendix"),
    ("## Overview", "## Bicep Templates Location"),
    ("## Resource Mapping", "## Resources Created"),
];

fn canonical_for(heading: &str) -> Option<&'static str> {
    HEADING_FIXES
        .iter()
        .find(|(from, _)| *from == heading)
        .map(|(_, to)| *to)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One heading rename.
pub struct Rename {
    pub from: String,
    pub to: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Heading drift found in one artifact.
pub struct Analysis {
    pub artifact_type: String,
    pub missing: Vec<String>,
    pub extra: Vec<(String, usize)>,
    pub fixable: Vec<Rename>,
}

impl Analysis {
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Per-file outcome.
pub struct FixResult {
    pub file: String,
    /// Why the file was not analyzed, if it was skipped.
    pub skipped: Option<String>,
    pub analysis: Option<Analysis>,
    /// Renames written to disk.
    pub applied: Vec<Rename>,
    /// Read or write failure for this file.
    pub failed: Option<String>,
}

/// Analyze `text` as an artifact of the type `file` resolves to.
///
/// A rename is only offered when its target is a required heading of this
/// type that the document does not already carry.
pub fn analyze(file: &str, text: &str, registry: &Registry) -> Option<Analysis> {
    let a = registry.lookup(file)?;
    let headings = extract::headings_outside_fences(text);
    let present = |h: &str| headings.iter().any(|x| x.text == h);

    let missing: Vec<String> = a
        .schema
        .required
        .iter()
        .filter(|h| !present(h.as_str()))
        .cloned()
        .collect();
    let extra: Vec<(String, usize)> = headings
        .iter()
        .filter(|h| {
            !a.schema.is_required(&h.text)
                && !a.schema.optional.contains(&h.text)
                && !UNIVERSAL_OPTIONAL.contains(&h.text.as_str())
        })
        .map(|h| (h.text.clone(), h.line))
        .collect();
    let fixable: Vec<Rename> = extra
        .iter()
        .filter_map(|(h, line)| {
            let to = canonical_for(h)?;
            (a.schema.is_required(to) && !present(to)).then(|| Rename {
                from: h.clone(),
                to: to.to_string(),
                line: *line,
            })
        })
        .collect();
    Some(Analysis {
        artifact_type: a.name().to_string(),
        missing,
        extra,
        fixable,
    })
}

/// Rewrite exactly the renamed heading lines; all other bytes are preserved.
pub fn apply_renames(text: &str, renames: &[Rename]) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split_inclusive('\n').enumerate() {
        let line_no = i + 1;
        match renames.iter().find(|r| r.line == line_no) {
            Some(r) => {
                let body = line.trim_end_matches(['\n', '\r']);
                out.push_str(&r.to);
                out.push_str(&line[body.len()..]);
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Analyze (and with `apply`, fix) each given path.
pub fn run_fix(
    eff: &Effective,
    registry: &Registry,
    paths: &[String],
    apply: bool,
) -> Vec<FixResult> {
    let mut results = Vec::new();
    for p in paths {
        let path = {
            let raw = PathBuf::from(p);
            if raw.is_absolute() {
                raw
            } else {
                eff.repo_root.join(raw)
            }
        };
        let file = utils::rel_path(&eff.repo_root, &path);
        let skip = |reason: String| FixResult {
            file: file.clone(),
            skipped: Some(reason),
            analysis: None,
            applied: Vec::new(),
            failed: None,
        };
        if !path.is_file() {
            results.push(skip(format!("File not found: {}", file)));
            continue;
        }
        let (text, lossless) = match fs::read(&path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(s) => (s, true),
                Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), false),
            },
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "unreadable file");
                results.push(FixResult {
                    failed: Some(format!("could not read file: {}", e)),
                    ..skip(format!("Unreadable file: {}", file))
                });
                continue;
            }
        };
        let Some(analysis) = analyze(&file, &text, registry) else {
            results.push(skip(format!("Unknown artifact type: {}", file)));
            continue;
        };
        let mut applied = Vec::new();
        let mut failed = None;
        if apply && !analysis.fixable.is_empty() {
            // rewriting decoded text would replace the invalid bytes
            let written = if lossless {
                fs::write(&path, apply_renames(&text, &analysis.fixable))
                    .map_err(|e| e.to_string())
            } else {
                Err("file is not valid UTF-8".to_string())
            };
            match written {
                Ok(()) => {
                    tracing::info!(file = %file, count = analysis.fixable.len(), "headings fixed");
                    applied = analysis.fixable.clone();
                }
                Err(e) => {
                    tracing::warn!(file = %file, error = %e, "could not write fixes");
                    failed = Some(format!("could not write fixes: {}", e));
                }
            }
        }
        results.push(FixResult {
            file,
            skipped: None,
            analysis: Some(analysis),
            applied,
            failed,
        });
    }
    results
}

/// Project fixer results onto findings.
///
/// With `check`, missing headings and unapplied renames are errors so the
/// run fails; otherwise they are warnings.
pub fn to_findings(results: &[FixResult], check: bool, findings: &mut Findings) {
    let drift = if check {
        Severity::Error
    } else {
        Severity::Warning
    };
    for r in results {
        if let Some(err) = &r.failed {
            findings.push(Finding::error(
                FindingKind::MissingInputFile,
                RULE_FIX_IO,
                r.file.as_str(),
                err.as_str(),
            ));
        }
        if let Some(reason) = &r.skipped {
            findings.push(Finding::info(
                FindingKind::MissingInputFile,
                RULE_FIX_SKIPPED,
                r.file.as_str(),
                reason.as_str(),
            ));
            continue;
        }
        let Some(a) = &r.analysis else {
            continue;
        };
        findings.checked();
        if !a.missing.is_empty() {
            findings.push(Finding::new(
                drift,
                FindingKind::MissingRequiredElement,
                RULE_FIX_MISSING,
                r.file.as_str(),
                format!(
                    "{}: missing headings: {}",
                    a.artifact_type,
                    a.missing.join(", ")
                ),
            ));
        }
        for (h, line) in &a.extra {
            let applied = r.applied.iter().find(|x| x.line == *line);
            let fixable = a.fixable.iter().find(|x| x.line == *line);
            let f = match (applied, fixable) {
                (Some(x), _) => Finding::info(
                    FindingKind::UnrecognizedElement,
                    RULE_FIX_APPLIED,
                    r.file.as_str(),
                    format!("fixed: \"{}\" -> \"{}\"", x.from, x.to),
                ),
                (None, Some(x)) => Finding::new(
                    drift,
                    FindingKind::UnrecognizedElement,
                    RULE_FIX_FIXABLE,
                    r.file.as_str(),
                    format!(
                        "\"{}\" can be fixed to \"{}\" ({})",
                        x.from,
                        x.to,
                        if r.failed.is_some() {
                            "not written"
                        } else {
                            "run with --apply"
                        }
                    ),
                ),
                (None, None) => Finding::info(
                    FindingKind::UnrecognizedElement,
                    RULE_FIX_EXTRA,
                    r.file.as_str(),
                    format!("extra heading not in template: {}", h),
                ),
            };
            findings.push(f.at(*line));
        }
    }
}
