//! Instruction file frontmatter validator.
//!
//! Instruction files accept exactly two keys: `description` and `applyTo`.

use crate::config::Effective;
use crate::extract;
use crate::models::{Finding, FindingKind, Findings};
use crate::utils;

pub const RULE_INSTRUCTION_FRONTMATTER: &str = "instruction-frontmatter";
pub const RULE_INSTRUCTION_FIELD: &str = "instruction-field";
pub const RULE_INSTRUCTION_UNKNOWN: &str = "instruction-unknown-field";

const ALLOWED_FIELDS: [&str; 2] = ["description", "applyTo"];

pub fn run_instructions(eff: &Effective, findings: &mut Findings) {
    let files = utils::glob_files(&eff.path(&eff.paths.instructions), "**/*.instructions.md");
    tracing::info!(count = files.len(), "instruction files found");
    for p in &files {
        let Some(text) = utils::read_text(&eff.repo_root, p, findings) else {
            continue;
        };
        findings.checked();
        findings.extend(validate_instruction(
            &utils::rel_path(&eff.repo_root, p),
            &text,
        ));
    }
}

pub fn validate_instruction(file: &str, text: &str) -> Vec<Finding> {
    let Some(fm) = extract::frontmatter(text) else {
        return vec![Finding::error(
            FindingKind::MalformedFrontmatter,
            RULE_INSTRUCTION_FRONTMATTER,
            file,
            "missing YAML frontmatter (requires description and applyTo)",
        )
        .at(1)];
    };
    let mut out = Vec::new();
    for field in ALLOWED_FIELDS {
        if fm.get(field).map_or(true, |v| v.is_empty()) {
            out.push(
                Finding::error(
                    FindingKind::MissingRequiredElement,
                    RULE_INSTRUCTION_FIELD,
                    file,
                    format!("missing required frontmatter field: {}", field),
                )
                .at(1),
            );
        }
    }
    let unknown: Vec<&str> = fm.keys().filter(|k| !ALLOWED_FIELDS.contains(k)).collect();
    if !unknown.is_empty() {
        out.push(
            Finding::error(
                FindingKind::UnrecognizedElement,
                RULE_INSTRUCTION_UNKNOWN,
                file,
                format!(
                    "unknown frontmatter fields: {} (allowed: {})",
                    unknown.join(", "),
                    ALLOWED_FIELDS.join(", ")
                ),
            )
            .at(1),
        );
    }
    out
}
