//! Artifact template validator.
//!
//! Runs five steps into one finding list:
//! 1. every registered template exists, has the schema's headings in order,
//!    and satisfies its content rules;
//! 2. each producing agent exists and links its template (or a shared skill);
//! 3. no agent embeds a pasted heading skeleton;
//! 4. the markdown standards document exists and mentions templates;
//! 5. generated artifacts under the output tree match their schemas.
//!
//! Templates are always held to standard strictness. Generated artifacts use
//! the registry's strictness, which already reflects any process override.

use crate::checks;
use crate::compare::{compare, drift_severity};
use crate::config::Effective;
use crate::extract;
use crate::models::schema::{ExtractedStructure, Strictness};
use crate::models::{Finding, FindingKind, Findings, Severity};
use crate::registry::{ArtifactType, Owner, Registry, TEMPLATE_META_HEADINGS};
use crate::skeleton;
use crate::utils;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const RULE_TEMPLATE_MISSING: &str = "template-missing";
pub const RULE_AGENT_MISSING: &str = "agent-missing";
pub const RULE_AGENT_LINK: &str = "agent-template-link";
pub const RULE_SKELETON: &str = "embedded-skeleton";
pub const RULE_STANDARDS: &str = "standards-doc";
pub const RULE_NO_ARTIFACTS: &str = "no-artifacts";

/// Shared skills an agent may reference instead of linking the template.
const SHARED_SKILLS: [&str; 2] = ["azure-artifacts", "azure-defaults"];

/// Run all five steps.
pub fn run_artifacts(eff: &Effective, registry: &Registry, findings: &mut Findings) {
    match eff.strictness {
        Some(s) => tracing::info!(strictness = %s, "artifact validation (global strictness)"),
        None => tracing::info!("artifact validation (per-artifact strictness)"),
    }

    tracing::info!("Step 1: validating templates");
    for a in registry.iter() {
        validate_template(eff, a, findings);
    }

    tracing::info!("Step 2: validating agent links");
    validate_agent_links(eff, registry, findings);

    tracing::info!("Step 3: checking for embedded skeletons");
    validate_no_embedded_skeletons(eff, registry, findings);

    tracing::info!("Step 4: validating standards documentation");
    validate_standards_reference(eff, findings);

    tracing::info!("Step 5: validating generated artifacts");
    let artifacts = find_artifacts(&eff.path(&eff.paths.artifacts), registry);
    if artifacts.is_empty() {
        findings.push(Finding::warning(
            FindingKind::MissingInputFile,
            RULE_NO_ARTIFACTS,
            eff.paths.artifacts.as_str(),
            format!(
                "No artifacts found in {}/ (expected for new workflow)",
                eff.paths.artifacts
            ),
        ));
        return;
    }
    tracing::info!(count = artifacts.len(), "artifacts to validate");
    for path in artifacts {
        validate_artifact(eff, registry, &path, findings);
    }
}

fn template_rel(eff: &Effective, a: &ArtifactType) -> String {
    format!("{}/{}", eff.paths.templates.trim_end_matches('/'), a.template)
}

/// Step 1 for one artifact type.
pub fn validate_template(eff: &Effective, a: &ArtifactType, findings: &mut Findings) {
    let rel = template_rel(eff, a);
    let path = eff.path(&rel);
    if !path.exists() {
        findings.push(Finding::error(
            FindingKind::MissingInputFile,
            RULE_TEMPLATE_MISSING,
            rel.as_str(),
            format!("Missing template file: {}", rel),
        ));
        return;
    }
    let Some(text) = utils::read_text(&eff.repo_root, &path, findings) else {
        return;
    };
    findings.checked();

    let schema = a.schema.clone().with_strictness(Strictness::Standard);
    let structure = ExtractedStructure::new(rel.as_str(), extract::headings(&text))
        .without(TEMPLATE_META_HEADINGS);
    findings.extend(compare(&structure, &schema));

    if a.rules.cost_distribution {
        findings.extend(checks::cost_distribution(&rel, &text, Severity::Error));
    }
    findings.extend(checks::diagram_references(
        &rel,
        a.rules.diagrams,
        &text,
        Severity::Error,
    ));
    findings.extend(checks::marker_rules(&rel, &text, &a.rules, Severity::Error));
    findings.extend(checks::standard_components(&rel, &text, Severity::Warning));
}

fn agent_files<'a>(
    eff: &Effective,
    registry: &'a Registry,
) -> Vec<(String, Vec<&'a ArtifactType>)> {
    let mut by_agent: Vec<(String, Vec<&'a ArtifactType>)> = Vec::new();
    for a in registry.iter() {
        let Owner::Agent(file) = a.owner else {
            continue;
        };
        let rel = format!("{}/{}", eff.paths.agents.trim_end_matches('/'), file);
        match by_agent.iter_mut().find(|(r, _)| *r == rel) {
            Some((_, types)) => types.push(a),
            None => by_agent.push((rel, vec![a])),
        }
    }
    by_agent
}

/// Step 2: agents exist and link their templates.
pub fn validate_agent_links(eff: &Effective, registry: &Registry, findings: &mut Findings) {
    for (agent_rel, types) in agent_files(eff, registry) {
        let agent_path = eff.path(&agent_rel);
        if !agent_path.exists() {
            findings.push(Finding::error(
                FindingKind::MissingInputFile,
                RULE_AGENT_MISSING,
                agent_rel.as_str(),
                format!("Missing agent file: {}", agent_rel),
            ));
            continue;
        }
        let Some(text) = utils::read_text(&eff.repo_root, &agent_path, findings) else {
            continue;
        };
        findings.checked();
        let refs_skill = SHARED_SKILLS.iter().any(|s| text.contains(s));
        let agent_dir = agent_path.parent().unwrap_or(&eff.repo_root);
        for a in types {
            let template_rel_to_agent =
                utils::rel_path(agent_dir, &eff.path(&template_rel(eff, a)));
            if !refs_skill && !text.contains(&template_rel_to_agent) {
                findings.push(Finding::error(
                    FindingKind::ContentViolation,
                    RULE_AGENT_LINK,
                    agent_rel.as_str(),
                    format!(
                        "Agent must reference template {} or the {} skill",
                        template_rel_to_agent, SHARED_SKILLS[0]
                    ),
                ));
            }
        }
    }
}

/// Step 3: no agent pastes a heading skeleton into a fenced block.
pub fn validate_no_embedded_skeletons(
    eff: &Effective,
    registry: &Registry,
    findings: &mut Findings,
) {
    for (agent_rel, types) in agent_files(eff, registry) {
        let agent_path = eff.path(&agent_rel);
        if !agent_path.exists() {
            continue;
        }
        // Unreadable agents were already reported by step 2.
        let Ok(text) = utils::read_lossy(&agent_path) else {
            continue;
        };
        for a in types {
            if let Some(hit) = skeleton::find_embedded(&text, &a.schema.required) {
                findings.push(
                    Finding::error(
                        FindingKind::ContentViolation,
                        RULE_SKELETON,
                        agent_rel.as_str(),
                        format!(
                            "appears to embed a {} skeleton (found {} headings in a fenced block)",
                            a.name(),
                            hit.matched
                        ),
                    )
                    .at(hit.open_line),
                );
            }
        }
    }
}

/// Step 4: the standards document exists and points at templates.
pub fn validate_standards_reference(eff: &Effective, findings: &mut Findings) {
    let rel = eff.paths.standards_doc.as_str();
    let path = eff.path(rel);
    if !path.exists() {
        findings.push(Finding::warning(
            FindingKind::MissingInputFile,
            RULE_STANDARDS,
            rel,
            format!("Standards file not found: {}", rel),
        ));
        return;
    }
    let Some(text) = utils::read_text(&eff.repo_root, &path, findings) else {
        return;
    };
    findings.checked();
    if !text.contains("template") {
        findings.push(Finding::warning(
            FindingKind::ContentViolation,
            RULE_STANDARDS,
            rel,
            "Standards file should reference the template-first approach",
        ));
    }
}

/// Generated artifacts under `base`, recursively, sorted.
///
/// A file qualifies when its name ends with a registered type name. The
/// output tree's own top-level `README.md` is not a project README.
pub fn find_artifacts(base: &Path, registry: &Registry) -> Vec<PathBuf> {
    if !base.is_dir() {
        return Vec::new();
    }
    let names: BTreeSet<&str> = registry.iter().map(|a| a.name()).collect();
    utils::glob_files(base, "**/*")
        .into_iter()
        .filter(|p| {
            let Some(file_name) = p.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            if file_name == "README.md" && p.parent() == Some(base) {
                return false;
            }
            names.iter().any(|n| file_name.ends_with(n))
        })
        .collect()
}

/// Step 5 for one generated artifact.
pub fn validate_artifact(
    eff: &Effective,
    registry: &Registry,
    path: &Path,
    findings: &mut Findings,
) {
    let rel = utils::rel_path(&eff.repo_root, path);
    let Some(a) = registry.lookup(&rel) else {
        tracing::debug!(file = %rel, "not a registered artifact type");
        return;
    };
    let Some(text) = utils::read_text(&eff.repo_root, path, findings) else {
        return;
    };
    findings.checked();
    let drift = drift_severity(a.schema.strictness);

    let structure = ExtractedStructure::new(rel.as_str(), extract::headings(&text));
    findings.extend(compare(&structure, &a.schema));

    if a.rules.governance_discovery {
        findings.extend(checks::governance_discovery(&rel, &text, drift));
    }
    if a.rules.cost_distribution {
        findings.extend(checks::cost_distribution(&rel, &text, Severity::Warning));
    }
    if a.rules.output_diagrams {
        findings.extend(checks::diagram_references(&rel, a.rules.diagrams, &text, drift));
        let dir = path.parent().unwrap_or(&eff.repo_root);
        findings.extend(checks::diagram_files(&rel, dir, a.rules.diagrams, drift));
    }
    findings.extend(checks::standard_components(&rel, &text, Severity::Warning));
    findings.extend(checks::marker_rules(&rel, &text, &a.rules, Severity::Warning));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_with_env;
    use std::fs;
    use tempfile::tempdir;

    fn effective(root: &Path) -> Effective {
        fs::create_dir_all(root.join(".git")).unwrap();
        resolve_with_env(root.to_str(), None, None, None, None).unwrap()
    }

    #[test]
    fn test_find_artifacts_skips_top_level_readme() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("agent-output");
        fs::create_dir_all(base.join("proj")).unwrap();
        fs::write(base.join("README.md"), "").unwrap();
        fs::write(base.join("proj/README.md"), "").unwrap();
        fs::write(base.join("proj/06-deployment-summary.md"), "").unwrap();
        fs::write(base.join("proj/notes.md"), "").unwrap();
        let reg = Registry::builtin();
        let found: Vec<String> = find_artifacts(&base, &reg)
            .iter()
            .map(|p| utils::rel_path(&base, p))
            .collect();
        assert_eq!(found, vec!["proj/06-deployment-summary.md", "proj/README.md"]);
    }

    #[test]
    fn test_find_artifacts_under_bracketed_checkout() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("proj[1]/agent-output");
        fs::create_dir_all(base.join("p")).unwrap();
        fs::write(base.join("p/06-deployment-summary.md"), "").unwrap();
        assert_eq!(find_artifacts(&base, &Registry::builtin()).len(), 1);
    }

    #[test]
    fn test_artifact_with_invalid_utf8_is_still_validated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let eff = effective(root);
        let path = root.join("agent-output/p/06-deployment-summary.md");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            b"## Preflight Validation\n## Deployment Details\nCaf\xe9 region\n",
        )
        .unwrap();
        let mut f = Findings::new();
        validate_artifact(&eff, &Registry::builtin(), &path, &mut f);
        assert_eq!(f.documents(), 1);
        assert!(f
            .as_slice()
            .iter()
            .any(|x| x.rule == crate::compare::RULE_MISSING
                && x.file == "agent-output/p/06-deployment-summary.md"));
    }

    #[test]
    fn test_missing_template_and_agent_are_errors() {
        let dir = tempdir().unwrap();
        let eff = effective(dir.path());
        let reg = Registry::builtin();
        let mut f = Findings::new();
        validate_template(&eff, reg.lookup("01-requirements.md").unwrap(), &mut f);
        validate_agent_links(&eff, &reg, &mut f);
        let r = f.into_report();
        assert!(r
            .findings
            .iter()
            .any(|x| x.rule == RULE_TEMPLATE_MISSING && x.severity == Severity::Error));
        // five distinct agent files, reported once each
        assert_eq!(
            r.findings.iter().filter(|x| x.rule == RULE_AGENT_MISSING).count(),
            5
        );
    }

    #[test]
    fn test_agent_link_accepts_relative_template_or_skill() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let eff = effective(root);
        fs::create_dir_all(root.join(".github/agents")).unwrap();
        fs::write(
            root.join(".github/agents/requirements.agent.md"),
            "See ../skills/azure-artifacts/templates/01-requirements.template.md\n",
        )
        .unwrap();
        fs::write(
            root.join(".github/agents/deploy.agent.md"),
            "No links here\n",
        )
        .unwrap();
        let mut f = Findings::new();
        validate_agent_links(&eff, &Registry::builtin(), &mut f);
        let links: Vec<Finding> = f
            .as_slice()
            .iter()
            .filter(|x| x.rule == RULE_AGENT_LINK)
            .cloned()
            .collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].file, ".github/agents/deploy.agent.md");
    }

    #[test]
    fn test_embedded_skeleton_detected_in_agent() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let eff = effective(root);
        fs::create_dir_all(root.join(".github/agents")).unwrap();
        fs::write(
            root.join(".github/agents/deploy.agent.md"),
            "Intro\n```markdown\n## Preflight Validation\n## Deployment Details\n## Deployed Resources\n```\n",
        )
        .unwrap();
        let mut f = Findings::new();
        validate_no_embedded_skeletons(&eff, &Registry::builtin(), &mut f);
        assert_eq!(f.len(), 1);
        assert_eq!(f.as_slice()[0].rule, RULE_SKELETON);
        assert_eq!(f.as_slice()[0].line, Some(2));
    }

    #[test]
    fn test_template_meta_headings_are_ignored() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let eff = effective(root);
        let tdir = root.join(".github/skills/azure-artifacts/templates");
        fs::create_dir_all(&tdir).unwrap();
        fs::write(
            tdir.join("PROJECT-README.template.md"),
            "## Template Instructions\n## 📋 Project Summary\n## ✅ Workflow Progress\n## 🏛️ Architecture\n## 📄 Generated Artifacts\n## 🔗 Related Resources\n## Required Structure\n",
        )
        .unwrap();
        let reg = Registry::builtin();
        let mut f = Findings::new();
        validate_template(&eff, reg.lookup("README.md").unwrap(), &mut f);
        assert!(f.is_empty(), "{:?}", f.as_slice());
    }
}
