//! Scanner for references to removed agents, skills and placeholder text.

use crate::config::Effective;
use crate::models::{Finding, FindingKind, Findings, Severity};
use crate::utils;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

pub const RULE_DEPRECATED_REF: &str = "deprecated-ref";

const ROOT_FILES: [&str; 3] = ["README.md", "CONTRIBUTING.md", "CHANGELOG.md"];
const EXTRA_FOLDERS: [&str; 1] = ["scenarios"];

/// Pattern, message, severity.
const PATTERNS: &[(&str, &str, Severity)] = &[
    (
        r"agents/_shared/",
        "reference to removed _shared/ directory (use azure-defaults skill)",
        Severity::Error,
    ),
    (
        r"skills/orchestration-helper",
        "reference to removed orchestration-helper skill",
        Severity::Error,
    ),
    (
        r"skills/azure-deployment-preflight",
        "reference to removed azure-deployment-preflight skill (merged into deploy agent)",
        Severity::Error,
    ),
    (
        r"skills/azure-workload-docs",
        "reference to removed azure-workload-docs skill (use azure-artifacts skill)",
        Severity::Error,
    ),
    (
        r"skills/github-issues",
        "reference to removed github-issues skill (use github-operations skill)",
        Severity::Error,
    ),
    (
        r"skills/github-pull-requests",
        "reference to removed github-pull-requests skill (use github-operations skill)",
        Severity::Error,
    ),
    (
        r"\.github/agents/diagram\.agent\.md",
        "reference to removed diagram.agent.md (use azure-diagrams skill)",
        Severity::Error,
    ),
    (
        r"\.github/agents/adr\.agent\.md",
        "reference to removed adr.agent.md (use azure-adr skill)",
        Severity::Error,
    ),
    (
        r"\.github/agents/docs\.agent\.md",
        "reference to removed docs.agent.md (use azure-artifacts skill)",
        Severity::Error,
    ),
    (
        r"@diagram\s+agent",
        "reference to @diagram agent (removed, use azure-diagrams skill)",
        Severity::Warning,
    ),
    (
        r"@adr\s+agent",
        "reference to @adr agent (removed, use azure-adr skill)",
        Severity::Warning,
    ),
    (
        r"@docs\s+agent",
        "reference to @docs agent (removed, use azure-artifacts skill)",
        Severity::Warning,
    ),
    (r"\[Insert\s+here\]", "placeholder '[Insert here]' found", Severity::Warning),
];

fn compiled() -> &'static [(Regex, &'static str, Severity)] {
    static TABLE: OnceLock<Vec<(Regex, &'static str, Severity)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|(p, msg, sev)| {
                let re = Regex::new(&format!("(?i){}", p)).expect("static pattern is valid");
                (re, *msg, *sev)
            })
            .collect()
    })
}

/// Repository-relative paths never scanned.
pub fn is_excluded(rel: &str, artifacts_dir: &str) -> bool {
    let generated = format!("{}/", artifacts_dir.trim_end_matches('/'));
    rel.contains("node_modules")
        || rel.starts_with("infra/")
        || rel.contains("/infra/")
        || rel.ends_with("CHANGELOG.md")
        || rel.starts_with(&generated)
}

pub fn run_deprecated_refs(eff: &Effective, findings: &mut Findings) {
    let p = &eff.paths;
    let mut folders: Vec<&str> = vec![
        p.docs.as_str(),
        p.agents.as_str(),
        p.skills.as_str(),
        p.instructions.as_str(),
        p.templates.as_str(),
        p.artifacts.as_str(),
    ];
    folders.extend(EXTRA_FOLDERS);

    let mut files: Vec<PathBuf> = Vec::new();
    for folder in folders {
        files.extend(utils::glob_files(&eff.path(folder), "**/*.md"));
    }
    files.extend(
        ROOT_FILES
            .iter()
            .map(|f| eff.repo_root.join(f))
            .filter(|f| f.is_file()),
    );
    files.sort();
    files.dedup();

    let mut scanned = 0usize;
    for path in &files {
        let rel = utils::rel_path(&eff.repo_root, path);
        if is_excluded(&rel, &p.artifacts) {
            continue;
        }
        let Some(text) = utils::read_text(&eff.repo_root, path, findings) else {
            continue;
        };
        scanned += 1;
        findings.checked();
        findings.extend(scan(&rel, &text));
    }
    tracing::info!(scanned, "deprecated reference scan complete");
}

/// One finding per match, located at the match's line.
pub fn scan(file: &str, text: &str) -> Vec<Finding> {
    let mut out = Vec::new();
    for (re, msg, sev) in compiled() {
        for m in re.find_iter(text) {
            let line = text[..m.start()].matches('\n').count() + 1;
            out.push(
                Finding::new(
                    *sev,
                    FindingKind::ContentViolation,
                    RULE_DEPRECATED_REF,
                    file,
                    format!("{} (found \"{}\")", msg, m.as_str()),
                )
                .at(line),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_reports_each_match_with_line() {
        let text = "intro\nsee .github/AGENTS/_shared/x\nask the @Diagram   agent\nand agents/_shared/y\n";
        let f = scan("d.md", text);
        let got: Vec<(Severity, Option<usize>)> = f.iter().map(|x| (x.severity, x.line)).collect();
        assert_eq!(
            got,
            vec![
                (Severity::Error, Some(2)),
                (Severity::Error, Some(4)),
                (Severity::Warning, Some(3))
            ]
        );
        assert!(f[2].message.ends_with("(found \"@Diagram   agent\")"));
    }

    #[test]
    fn test_exclusions() {
        assert!(is_excluded("docs/node_modules/a.md", "agent-output"));
        assert!(is_excluded("infra/bicep/readme.md", "agent-output"));
        assert!(is_excluded("CHANGELOG.md", "agent-output"));
        assert!(is_excluded("agent-output/p/01-requirements.md", "agent-output"));
        assert!(!is_excluded("docs/infrastructure.md", "agent-output"));
    }

    #[test]
    fn test_run_scans_folders_and_root_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::create_dir_all(root.join("agent-output/p")).unwrap();
        fs::write(root.join("docs/a.md"), "[Insert here]\n").unwrap();
        fs::write(root.join("README.md"), "skills/github-issues\n").unwrap();
        fs::write(root.join("CHANGELOG.md"), "skills/github-issues\n").unwrap();
        fs::write(root.join("agent-output/p/x.md"), "skills/github-issues\n").unwrap();
        let eff = crate::config::resolve_with_env(root.to_str(), None, None, None, None).unwrap();
        let mut f = Findings::new();
        run_deprecated_refs(&eff, &mut f);
        let r = f.into_report();
        assert_eq!(r.summary.errors, 1);
        assert_eq!(r.summary.warnings, 1);
        assert_eq!(r.summary.documents, 2);
    }
}
