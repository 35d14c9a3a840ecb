//! Skill directory format validator.

use crate::config::Effective;
use crate::extract::{self, FmValue};
use crate::models::{Finding, FindingKind, Findings};
use crate::utils;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub const RULE_SKILL_FILE: &str = "skill-file";
pub const RULE_SKILL_FRONTMATTER: &str = "skill-frontmatter";
pub const RULE_SKILL_DESCRIPTION: &str = "skill-description";
pub const RULE_SKILL_DEPRECATED: &str = "skill-deprecated";
pub const RULE_SKILLS_ABSENT: &str = "skills-absent";

const SKILL_FILE: &str = "SKILL.md";
const MIN_DESCRIPTION: usize = 10;

fn deprecated_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                r"(?i)skill-version:\s*beta",
                "skill-version: beta is deprecated, remove it",
            ),
            (
                r"(?i)\.skill\.json",
                ".skill.json files are deprecated, use SKILL.md frontmatter",
            ),
        ]
        .into_iter()
        .map(|(p, msg)| (Regex::new(p).expect("static pattern is valid"), msg))
        .collect()
    })
}

pub fn run_skills(eff: &Effective, findings: &mut Findings) {
    let dir = eff.path(&eff.paths.skills);
    let rel = utils::rel_path(&eff.repo_root, &dir);
    if !dir.is_dir() {
        findings.push(Finding::info(
            FindingKind::MissingInputFile,
            RULE_SKILLS_ABSENT,
            rel,
            "no skills directory found, skipping skill validation",
        ));
        return;
    }
    let skills = utils::subdirs(&dir);
    tracing::info!(count = skills.len(), "skill directories found");
    for skill in &skills {
        validate_skill_dir(eff, skill, findings);
    }
}

fn validate_skill_dir(eff: &Effective, dir: &Path, findings: &mut Findings) {
    let skill_file = dir.join(SKILL_FILE);
    let rel = utils::rel_path(&eff.repo_root, &skill_file);
    if !skill_file.is_file() {
        findings.push(Finding::error(
            FindingKind::MissingInputFile,
            RULE_SKILL_FILE,
            rel,
            "missing SKILL.md file",
        ));
        return;
    }
    let Some(text) = utils::read_text(&eff.repo_root, &skill_file, findings) else {
        return;
    };
    findings.checked();
    findings.extend(validate_skill(&rel, &text));

    let json: Vec<String> = utils::glob_files(dir, "*.skill.json")
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    if !json.is_empty() {
        findings.push(Finding::warning(
            FindingKind::ContentViolation,
            RULE_SKILL_DEPRECATED,
            utils::rel_path(&eff.repo_root, dir),
            format!("found deprecated .skill.json file(s): {}", json.join(", ")),
        ));
    }
}

/// Check one `SKILL.md`'s frontmatter and deprecated syntax.
pub fn validate_skill(file: &str, text: &str) -> Vec<Finding> {
    let Some(fm) = extract::frontmatter(text) else {
        return vec![Finding::error(
            FindingKind::MalformedFrontmatter,
            RULE_SKILL_FRONTMATTER,
            file,
            "no frontmatter found in SKILL.md",
        )
        .at(1)];
    };
    let mut out = Vec::new();
    match fm.get("description").map(FmValue::to_string) {
        Some(d) if !d.trim().is_empty() => {
            let len = d.trim().chars().count();
            if len < MIN_DESCRIPTION {
                out.push(Finding::warning(
                    FindingKind::ContentViolation,
                    RULE_SKILL_DESCRIPTION,
                    file,
                    format!("description is too short ({} chars)", len),
                ));
            }
        }
        _ => out.push(Finding::error(
            FindingKind::MissingRequiredElement,
            RULE_SKILL_DESCRIPTION,
            file,
            "missing required frontmatter field 'description'",
        )),
    }
    for (re, msg) in deprecated_patterns() {
        if let Some(m) = re.find(text) {
            let line = text[..m.start()].matches('\n').count() + 1;
            out.push(
                Finding::warning(FindingKind::ContentViolation, RULE_SKILL_DEPRECATED, file, *msg)
                    .at(line),
            );
        }
    }
    out
}
