//! Agent definition frontmatter validator.
//!
//! Main agents live directly in the agents directory, subagents in their own
//! directory. Both need the same required keys; they differ in whether they
//! may be invoked by a user.

use crate::config::Effective;
use crate::extract::{self, FmValue, Frontmatter};
use crate::models::{Finding, FindingKind, Findings};
use crate::utils;
use std::path::Path;

pub const RULE_FRONTMATTER: &str = "agent-frontmatter";
pub const RULE_REQUIRED: &str = "agent-required-field";
pub const RULE_RECOMMENDED: &str = "agent-recommended-field";
pub const RULE_INVOKABLE: &str = "agent-user-invokable";
pub const RULE_AGENTS_LIST: &str = "agent-agents-list";
pub const RULE_HANDOFF_SEND: &str = "agent-handoff-send";
pub const RULE_MODEL_FALLBACK: &str = "agent-model-fallback";

const REQUIRED_FIELDS: [&str; 4] = ["name", "description", "user-invokable", "tools"];
const RECOMMENDED_FIELDS: [&str; 2] = ["agents", "model"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Main,
    Subagent,
}

pub fn run_agents(eff: &Effective, findings: &mut Findings) {
    let main = utils::glob_files(&eff.path(&eff.paths.agents), "*.agent.md");
    let sub = utils::glob_files(&eff.path(&eff.paths.subagents), "*.agent.md");
    tracing::info!(main = main.len(), subagents = sub.len(), "agent files found");
    for p in &main {
        validate_agent_file(eff, p, AgentKind::Main, findings);
    }
    for p in &sub {
        validate_agent_file(eff, p, AgentKind::Subagent, findings);
    }
}

fn validate_agent_file(eff: &Effective, path: &Path, kind: AgentKind, findings: &mut Findings) {
    let rel = utils::rel_path(&eff.repo_root, path);
    let Some(text) = utils::read_text(&eff.repo_root, path, findings) else {
        return;
    };
    findings.checked();
    findings.extend(validate_agent(&rel, &text, kind));
}

/// Validate one agent document's frontmatter.
pub fn validate_agent(file: &str, text: &str, kind: AgentKind) -> Vec<Finding> {
    let Some(fm) = extract::frontmatter(text) else {
        return vec![Finding::error(
            FindingKind::MalformedFrontmatter,
            RULE_FRONTMATTER,
            file,
            "No frontmatter found",
        )
        .at(1)];
    };
    let mut out = Vec::new();
    for field in REQUIRED_FIELDS {
        if !fm.contains(field) {
            out.push(Finding::error(
                FindingKind::MissingRequiredElement,
                RULE_REQUIRED,
                file,
                format!("Missing required field '{}'", field),
            ));
        }
    }

    let invokable = fm.get("user-invokable").map(FmValue::to_string);
    match kind {
        AgentKind::Subagent => {
            if !matches!(invokable.as_deref(), Some("false" | "never")) {
                out.push(Finding::error(
                    FindingKind::ContentViolation,
                    RULE_INVOKABLE,
                    file,
                    format!(
                        "Subagent must have user-invokable: false or never (got: {})",
                        invokable.as_deref().unwrap_or("none")
                    ),
                ));
            }
        }
        AgentKind::Main => {
            if !matches!(invokable.as_deref(), Some("true" | "always")) {
                out.push(Finding::warning(
                    FindingKind::ContentViolation,
                    RULE_INVOKABLE,
                    file,
                    format!(
                        "Main agent should have user-invokable: true (got: {})",
                        invokable.as_deref().unwrap_or("none")
                    ),
                ));
            }
            for field in RECOMMENDED_FIELDS {
                if !fm.contains(field) {
                    out.push(Finding::warning(
                        FindingKind::MissingRequiredElement,
                        RULE_RECOMMENDED,
                        file,
                        format!("Missing recommended field '{}'", field),
                    ));
                }
            }
        }
    }

    if fm.get("agents").is_some_and(|v| !v.is_list()) {
        out.push(Finding::warning(
            FindingKind::ContentViolation,
            RULE_AGENTS_LIST,
            file,
            "'agents' should be an array",
        ));
    }
    out.extend(handoff_send(file, text, &fm));
    if let Some(models) = fm.get("model").and_then(FmValue::as_list) {
        if models.len() > 1 {
            out.push(Finding::info(
                FindingKind::ContentViolation,
                RULE_MODEL_FALLBACK,
                file,
                format!("Model fallback configured ({} models)", models.len()),
            ));
        }
    }
    out
}

/// Handoffs that declare a `label:` but never a `send:`.
fn handoff_send(file: &str, text: &str, fm: &Frontmatter) -> Option<Finding> {
    let raw = fm.raw("handoffs")?;
    let labels = raw.matches("label:").count();
    let sends = raw.matches("send:").count();
    (labels > 0 && sends == 0).then(|| {
        Finding::warning(
            FindingKind::MissingRequiredElement,
            RULE_HANDOFF_SEND,
            file,
            "Handoffs missing 'send' property",
        )
        .at(utils::line_of(text, "handoffs:").unwrap_or(0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MAIN_OK: &str = "---
name: Architect
description: Designs things
user-invokable: true
tools: [read, edit]
agents: [\"planner\"]
model:
  - a
  - b
handoffs:
  - label: Plan
    agent: planner
    send: true
---
# Body
";

    fn rules(f: &[Finding]) -> Vec<&str> {
        f.iter().map(|x| x.rule.as_str()).collect()
    }

    #[test]
    fn test_valid_main_agent_only_reports_fallback_info() {
        let f = validate_agent("a.agent.md", MAIN_OK, AgentKind::Main);
        assert_eq!(rules(&f), vec![RULE_MODEL_FALLBACK]);
    }

    #[test]
    fn test_missing_frontmatter_is_error() {
        let f = validate_agent("a.agent.md", "# Agent\n", AgentKind::Main);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].kind, FindingKind::MalformedFrontmatter);
    }

    #[test]
    fn test_subagent_must_not_be_invokable() {
        let f = validate_agent("s.agent.md", MAIN_OK, AgentKind::Subagent);
        assert_eq!(rules(&f), vec![RULE_INVOKABLE, RULE_MODEL_FALLBACK]);
        assert_eq!(f[0].severity, crate::models::Severity::Error);

        let never = MAIN_OK.replace("user-invokable: true", "user-invokable: never");
        assert_eq!(
            rules(&validate_agent("s.agent.md", &never, AgentKind::Subagent)),
            vec![RULE_MODEL_FALLBACK]
        );
    }

    #[test]
    fn test_main_agent_warnings() {
        let text = "---
name: x
description: y
user-invokable: false
tools: [a]
agents: planner
handoffs:
  - label: Go
    agent: z
---
";
        let f = validate_agent("m.agent.md", text, AgentKind::Main);
        assert_eq!(
            rules(&f),
            vec![RULE_INVOKABLE, RULE_RECOMMENDED, RULE_AGENTS_LIST, RULE_HANDOFF_SEND]
        );
        assert_eq!(f[3].line, Some(7));
    }

    #[test]
    fn test_run_agents_walks_both_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join(".github/agents/_subagents")).unwrap();
        fs::write(root.join(".github/agents/a.agent.md"), MAIN_OK).unwrap();
        fs::write(root.join(".github/agents/_subagents/s.agent.md"), "no fm").unwrap();
        fs::write(root.join(".github/agents/readme.md"), "no fm").unwrap();
        let eff = crate::config::resolve_with_env(root.to_str(), None, None, None, None).unwrap();
        let mut f = Findings::new();
        run_agents(&eff, &mut f);
        assert_eq!(f.documents(), 2);
        let r = f.into_report();
        assert_eq!(r.summary.errors, 1);
        assert_eq!(r.findings[1].file, ".github/agents/_subagents/s.agent.md");
    }
}
