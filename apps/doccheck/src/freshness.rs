//! Docs freshness checks.
//!
//! Documentation drifts from the filesystem it describes: agent and skill
//! counts, tables listing agents and skills, references to removed files, and
//! hardcoded version banners. Each issue carries a level that maps onto a
//! finding severity.

use crate::config::Effective;
use crate::models::{Finding, FindingKind, Findings, Severity};
use crate::utils;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const RULE_COUNT: &str = "freshness-count";
pub const RULE_PROHIBITED: &str = "freshness-prohibited-ref";
pub const RULE_REMOVED_LINK: &str = "freshness-removed-link";
pub const RULE_AGENT_TABLE: &str = "freshness-agent-table";
pub const RULE_SKILL_TABLE: &str = "freshness-skill-table";
pub const RULE_VERSION_HEADER: &str = "freshness-version-header";

/// Default report file written next to the repository root.
pub const REPORT_FILE: &str = "freshness-report.json";

const DOCS_README: &str = "README.md";
const COPILOT_INSTRUCTIONS: &str = ".github/copilot-instructions.md";

const PROHIBITED: &[(&str, &str)] = &[
    ("diagram.agent.md", "diagram.agent.md (removed)"),
    ("adr.agent.md", "adr.agent.md (removed)"),
    ("docs.agent.md", "docs.agent.md (removed)"),
    ("docs/guides/", "docs/guides/ (non-existent path)"),
];

const REMOVED_DIRS: &[&str] = &["_superseded/", ".github/templates/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub fn severity(self) -> Severity {
        match self {
            Level::High => Severity::Error,
            Level::Medium => Severity::Warning,
            Level::Low => Severity::Info,
        }
    }
}

fn issue(
    level: Level,
    kind: FindingKind,
    rule: &str,
    file: &str,
    line: usize,
    msg: String,
) -> Finding {
    Finding::new(level.severity(), kind, rule, file, msg).at(line)
}

fn table_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\|\s*`([a-z][\w-]*)`\s*\|").expect("static pattern is valid")
    })
}

fn version_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"> Version \d+\.\d+\.\d+").expect("static pattern is valid"))
}

pub fn run_freshness(eff: &Effective, findings: &mut Findings) {
    let docs = eff.path(&eff.paths.docs);
    let readme_path = docs.join(DOCS_README);
    let readme_rel = utils::rel_path(&eff.repo_root, &readme_path);
    let readme = if readme_path.is_file() {
        utils::read_text(&eff.repo_root, &readme_path, findings)
    } else {
        None
    };
    let agents_dir = eff.path(&eff.paths.agents);
    let subagents_dir = eff.path(&eff.paths.subagents);
    let skills_dir = eff.path(&eff.paths.skills);

    if let Some(text) = readme.as_deref() {
        findings.checked();
        tracing::info!("checking documented counts and tables");
        let agents = utils::glob_files(&agents_dir, "*.agent.md").len();
        let skills = utils::subdirs(&skills_dir).len();
        findings.extend(count_mismatch(&readme_rel, text, "Agents", agents));
        findings.extend(count_mismatch(&readme_rel, text, "Skills", skills));
        findings.extend(agent_table(&readme_rel, text, |name| {
            let file = format!("{}.agent.md", name);
            agents_dir.join(&file).is_file() || subagents_dir.join(&file).is_file()
        }));
        findings.extend(skill_table(&readme_rel, text, |name| {
            skills_dir.join(name).is_dir()
        }));
    }

    let mut scanned: Vec<PathBuf> = utils::glob_files(&docs, "**/*.md");
    scanned.extend(utils::glob_files(
        &eff.path(&eff.paths.instructions),
        "**/*.md",
    ));
    let copilot = eff.path(COPILOT_INSTRUCTIONS);
    if copilot.is_file() {
        scanned.push(copilot);
    }
    tracing::info!(count = scanned.len(), "scanning for prohibited references");
    for p in &scanned {
        if let Some(text) = utils::read_text(&eff.repo_root, p, findings) {
            findings.extend(prohibited_refs(&utils::rel_path(&eff.repo_root, p), &text));
        }
    }

    for p in utils::glob_files(&docs, "**/*.md") {
        let rel = utils::rel_path(&eff.repo_root, &p);
        if rel.contains("presenter") {
            continue;
        }
        // read failures were reported by the scan above
        if let Ok(text) = utils::read_lossy(&p) {
            findings.extend(removed_links(&rel, &text));
        }
    }

    for p in utils::glob_files(&docs, "*.md") {
        if let Ok(text) = utils::read_lossy(&p) {
            findings.extend(version_headers(&utils::rel_path(&eff.repo_root, &p), &text));
        }
    }
}

/// Where the report goes when `--report` is not given.
pub fn default_report_path(repo_root: &Path) -> PathBuf {
    repo_root.join(REPORT_FILE)
}

/// First `## <label> (N` anywhere in `text` compared with `actual`.
pub fn count_mismatch(file: &str, text: &str, label: &str, actual: usize) -> Option<Finding> {
    let re = Regex::new(&format!(r"## {} \((\d+)", regex::escape(label))).ok()?;
    let caps = re.captures(text)?;
    let documented: usize = caps.get(1)?.as_str().parse().ok()?;
    let line = text[..caps.get(0)?.start()].matches('\n').count() + 1;
    (documented != actual).then(|| {
        issue(
            Level::High,
            FindingKind::ContentViolation,
            RULE_COUNT,
            file,
            line,
            format!(
                "{} count mismatch: docs say {}, filesystem has {}",
                label.trim_end_matches('s'),
                documented,
                actual
            ),
        )
    })
}

/// Body of the `## <label>` section, up to the next level-two heading.
fn section<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let head = format!("## {}", label);
    let mut offset = 0;
    let mut start = None;
    for line in text.split_inclusive('\n') {
        let bare = line.trim_end();
        match start {
            None if bare.starts_with(&head) => start = Some(offset + line.len()),
            Some(s) if bare.starts_with("## ") => return Some(&text[s..offset]),
            _ => {}
        }
        offset += line.len();
    }
    start.map(|s| &text[s..])
}

fn table_names(section: &str) -> Vec<&str> {
    table_row_re()
        .captures_iter(section)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

pub fn agent_table(file: &str, text: &str, exists: impl Fn(&str) -> bool) -> Vec<Finding> {
    let Some(body) = section(text, "Agents") else {
        return Vec::new();
    };
    table_names(body)
        .into_iter()
        .filter(|name| !exists(name))
        .map(|name| {
            issue(
                Level::High,
                FindingKind::MissingInputFile,
                RULE_AGENT_TABLE,
                file,
                0,
                format!("agent table lists '{}' but no matching .agent.md found", name),
            )
        })
        .collect()
}

pub fn skill_table(file: &str, text: &str, exists: impl Fn(&str) -> bool) -> Vec<Finding> {
    let Some(body) = section(text, "Skills") else {
        return Vec::new();
    };
    table_names(body)
        .into_iter()
        .filter(|name| !exists(name))
        .map(|name| {
            issue(
                Level::High,
                FindingKind::MissingInputFile,
                RULE_SKILL_TABLE,
                file,
                0,
                format!("skill table lists '{}' but no matching skill directory", name),
            )
        })
        .collect()
}

/// Lines mentioning removed agents or paths. Lines marked with ❌ or → are
/// documenting the prohibition and are skipped.
pub fn prohibited_refs(file: &str, text: &str) -> Vec<Finding> {
    let mut out = Vec::new();
    for (needle, label) in PROHIBITED {
        for (i, line) in text.lines().enumerate() {
            if line.contains('❌') || line.contains('→') {
                continue;
            }
            if line.contains(needle) {
                out.push(issue(
                    Level::High,
                    FindingKind::ContentViolation,
                    RULE_PROHIBITED,
                    file,
                    i + 1,
                    format!("prohibited reference: {}", label),
                ));
            }
        }
    }
    out
}

pub fn removed_links(file: &str, text: &str) -> Vec<Finding> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        for dir in REMOVED_DIRS {
            if line.contains(dir) {
                out.push(issue(
                    Level::Medium,
                    FindingKind::ContentViolation,
                    RULE_REMOVED_LINK,
                    file,
                    i + 1,
                    format!("link to removed directory '{}' in live docs", dir),
                ));
            }
        }
    }
    out
}

pub fn version_headers(file: &str, text: &str) -> Vec<Finding> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| version_header_re().is_match(l))
        .map(|(i, _)| {
            issue(
                Level::Low,
                FindingKind::ContentViolation,
                RULE_VERSION_HEADER,
                file,
                i + 1,
                "hardcoded version header, link to VERSION.md instead".to_string(),
            )
        })
        .collect()
}
