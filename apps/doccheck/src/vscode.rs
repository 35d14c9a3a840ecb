//! Editor, devcontainer and MCP configuration checks.
//!
//! These files are JSON with comments. [`parse_jsonc`] strips line and block
//! comments outside strings plus trailing commas, then hands the result to
//! `serde_json`.

use crate::config::Effective;
use crate::models::{Finding, FindingKind, Findings};
use crate::utils;
use serde_json::Value;

pub const RULE_DEVCONTAINER: &str = "vscode-devcontainer";
pub const RULE_SETTING: &str = "vscode-setting";
pub const RULE_EXTENSIONS: &str = "vscode-extensions";
pub const RULE_MCP: &str = "vscode-mcp";

pub const DEVCONTAINER: &str = ".devcontainer/devcontainer.json";
pub const EXTENSIONS: &str = ".vscode/extensions.json";
pub const MCP: &str = ".vscode/mcp.json";

const SUBAGENT_SETTING: &str = "chat.customAgentInSubagent.enabled";
const AGENT_LOCATIONS: &str = "chat.agentFilesLocations";
const SKILL_LOCATIONS: &str = "chat.agentSkillsLocations";

const REQUIRED_SETTINGS: [&str; 4] = [
    SUBAGENT_SETTING,
    AGENT_LOCATIONS,
    SKILL_LOCATIONS,
    "chat.useAgentSkills",
];

const REQUIRED_EXTENSIONS: [&str; 5] = [
    "GitHub.copilot",
    "GitHub.copilot-chat",
    "ms-azuretools.vscode-azure-github-copilot",
    "ms-azuretools.vscode-bicep",
    "DavidAnson.vscode-markdownlint",
];

/// Drop comments and trailing commas so the text parses as strict JSON.
pub fn strip_jsonc(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    // a comma plus the whitespace after it, held until we know what follows
    let mut pending: Option<String> = None;
    let mut chars = src.chars().peekable();

    fn flush(out: &mut String, pending: &mut Option<String>) {
        if let Some(p) = pending.take() {
            out.push_str(&p);
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                flush(&mut out, &mut pending);
                out.push('"');
                while let Some(s) = chars.next() {
                    out.push(s);
                    match s {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
            }
            ',' => {
                flush(&mut out, &mut pending);
                pending = Some(",".to_string());
            }
            '}' | ']' => {
                if let Some(p) = pending.take() {
                    out.push_str(&p[1..]);
                }
                out.push(c);
            }
            c if c.is_whitespace() => match pending.as_mut() {
                Some(p) => p.push(c),
                None => out.push(c),
            },
            _ => {
                flush(&mut out, &mut pending);
                out.push(c);
            }
        }
    }
    flush(&mut out, &mut pending);
    out
}

pub fn parse_jsonc(src: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&strip_jsonc(src))
}

fn truthy(v: Option<&Value>) -> bool {
    !matches!(v, None | Some(Value::Null) | Some(Value::Bool(false)))
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|x| x.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn contains_ci(list: &[String], ext: &str) -> bool {
    list.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

pub fn run_vscode_config(eff: &Effective, findings: &mut Findings) {
    let dev_exts = check_devcontainer(eff, findings);
    let rec_exts = check_extensions(eff, findings);
    findings.extend(cross_check(&dev_exts, &rec_exts));
    check_mcp(eff, findings);
}

/// Required settings in the devcontainer; returns its extension list.
fn check_devcontainer(eff: &Effective, findings: &mut Findings) -> Vec<String> {
    let path = eff.path(DEVCONTAINER);
    if !path.is_file() {
        findings.push(Finding::error(
            FindingKind::MissingInputFile,
            RULE_DEVCONTAINER,
            DEVCONTAINER,
            format!("{} not found", DEVCONTAINER),
        ));
        return Vec::new();
    }
    let Some(text) = utils::read_text(&eff.repo_root, &path, findings) else {
        return Vec::new();
    };
    findings.checked();
    match parse_jsonc(&text) {
        Ok(doc) => {
            findings.extend(devcontainer_settings(
                &doc,
                &[eff.paths.agents.as_str(), eff.paths.subagents.as_str()],
                &eff.paths.skills,
            ));
            string_list(doc.pointer("/customizations/vscode/extensions"))
        }
        Err(e) => {
            findings.push(Finding::error(
                FindingKind::MalformedFrontmatter,
                RULE_DEVCONTAINER,
                DEVCONTAINER,
                format!("failed to parse devcontainer.json: {}", e),
            ));
            Vec::new()
        }
    }
}

/// Checks on `customizations.vscode.settings` of a parsed devcontainer.
pub fn devcontainer_settings(doc: &Value, agent_dirs: &[&str], skills_dir: &str) -> Vec<Finding> {
    let empty = serde_json::Map::new();
    let settings = doc
        .pointer("/customizations/vscode/settings")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let mut out = Vec::new();
    for key in REQUIRED_SETTINGS {
        if !settings.contains_key(key) {
            out.push(Finding::error(
                FindingKind::MissingRequiredElement,
                RULE_SETTING,
                DEVCONTAINER,
                format!("missing required setting: {}", key),
            ));
        }
    }
    if settings.get(SUBAGENT_SETTING) != Some(&Value::Bool(true)) {
        out.push(Finding::error(
            FindingKind::ContentViolation,
            RULE_SETTING,
            DEVCONTAINER,
            format!("{} must be true for subagent orchestration", SUBAGENT_SETTING),
        ));
    }
    let agent_locations = settings.get(AGENT_LOCATIONS);
    for dir in agent_dirs {
        if !truthy(agent_locations.and_then(|v| v.get(*dir))) {
            out.push(Finding::warning(
                FindingKind::MissingRequiredElement,
                RULE_SETTING,
                DEVCONTAINER,
                format!("{} not in {}", dir, AGENT_LOCATIONS),
            ));
        }
    }
    if !truthy(settings.get(SKILL_LOCATIONS).and_then(|v| v.get(skills_dir))) {
        out.push(Finding::warning(
            FindingKind::MissingRequiredElement,
            RULE_SETTING,
            DEVCONTAINER,
            format!("{} not in {}", skills_dir, SKILL_LOCATIONS),
        ));
    }
    out
}

/// Recommended extensions; returns the recommendation list.
fn check_extensions(eff: &Effective, findings: &mut Findings) -> Vec<String> {
    let path = eff.path(EXTENSIONS);
    if !path.is_file() {
        findings.push(Finding::warning(
            FindingKind::MissingInputFile,
            RULE_EXTENSIONS,
            EXTENSIONS,
            format!("{} not found (optional but recommended)", EXTENSIONS),
        ));
        return Vec::new();
    }
    let Some(text) = utils::read_text(&eff.repo_root, &path, findings) else {
        return Vec::new();
    };
    findings.checked();
    let doc = match parse_jsonc(&text) {
        Ok(doc) => doc,
        Err(e) => {
            findings.push(Finding::error(
                FindingKind::MalformedFrontmatter,
                RULE_EXTENSIONS,
                EXTENSIONS,
                format!("failed to parse extensions.json: {}", e),
            ));
            return Vec::new();
        }
    };
    let recs = string_list(doc.get("recommendations"));
    for ext in REQUIRED_EXTENSIONS {
        if !contains_ci(&recs, ext) {
            findings.push(Finding::warning(
                FindingKind::MissingRequiredElement,
                RULE_EXTENSIONS,
                EXTENSIONS,
                format!("missing recommended extension: {}", ext),
            ));
        }
    }
    recs
}

/// Required extensions recommended for the editor but absent from the container.
pub fn cross_check(devcontainer: &[String], recommended: &[String]) -> Vec<Finding> {
    if devcontainer.is_empty() || recommended.is_empty() {
        return Vec::new();
    }
    REQUIRED_EXTENSIONS
        .iter()
        .filter(|ext| !contains_ci(devcontainer, ext))
        .map(|ext| {
            Finding::warning(
                FindingKind::CrossSourceMismatch,
                RULE_EXTENSIONS,
                DEVCONTAINER,
                format!("{} in extensions.json but not in devcontainer.json", ext),
            )
        })
        .collect()
}

fn check_mcp(eff: &Effective, findings: &mut Findings) {
    let path = eff.path(MCP);
    if !path.is_file() {
        findings.push(Finding::error(
            FindingKind::MissingInputFile,
            RULE_MCP,
            MCP,
            format!("missing {}", MCP),
        ));
        return;
    }
    let Some(text) = utils::read_text(&eff.repo_root, &path, findings) else {
        return;
    };
    findings.checked();
    findings.extend(mcp_servers(&text));
}

/// The MCP config must parse and declare `servers.github`.
pub fn mcp_servers(text: &str) -> Option<Finding> {
    match parse_jsonc(text) {
        Err(e) => Some(Finding::error(
            FindingKind::MalformedFrontmatter,
            RULE_MCP,
            MCP,
            format!("invalid JSON in {}: {}", MCP, e),
        )),
        Ok(doc) if !truthy(doc.pointer("/servers/github")) => Some(Finding::error(
            FindingKind::MissingRequiredElement,
            RULE_MCP,
            MCP,
            "missing required MCP server: servers.github",
        )),
        Ok(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    const DEVCONTAINER_OK: &str = r#"{
  // dev image
  "name": "x", /* inline */
  "customizations": {
    "vscode": {
      "settings": {
        "chat.customAgentInSubagent.enabled": true,
        "chat.agentFilesLocations": { ".github/agents": true, ".github/agents/_subagents": true, },
        "chat.agentSkillsLocations": { ".github/skills": true },
        "chat.useAgentSkills": true,
        "url": "http://example.com/a//b",
      },
      "extensions": ["github.copilot", "GitHub.copilot-chat", "ms-azuretools.vscode-azure-github-copilot",
        "ms-azuretools.vscode-bicep", "DavidAnson.vscode-markdownlint",],
    },
  },
}"#;

    #[test]
    fn test_jsonc_comments_strings_and_trailing_commas() {
        let v = parse_jsonc(r#"{"a": "// not a comment", "b": "/* nor */", "c": [1, 2, ], /* x */ }"#)
            .unwrap();
        assert_eq!(v, json!({"a": "// not a comment", "b": "/* nor */", "c": [1, 2]}));
        let v = parse_jsonc("{\"q\": \"say \\\"hi\\\", ]\", // tail\n}").unwrap();
        assert_eq!(v, json!({"q": "say \"hi\", ]"}));
        assert!(parse_jsonc("{\"a\": }").is_err());
    }

    #[test]
    fn test_devcontainer_settings() {
        let doc = parse_jsonc(DEVCONTAINER_OK).unwrap();
        let dirs = [".github/agents", ".github/agents/_subagents"];
        assert!(devcontainer_settings(&doc, &dirs, ".github/skills").is_empty());

        let bare = json!({"customizations": {"vscode": {"settings": {
            "chat.customAgentInSubagent.enabled": "true"
        }}}});
        let f = devcontainer_settings(&bare, &dirs, ".github/skills");
        let sev: Vec<Severity> = f.iter().map(|x| x.severity).collect();
        assert_eq!(
            sev,
            vec![
                Severity::Error,
                Severity::Error,
                Severity::Error,
                Severity::Error,
                Severity::Warning,
                Severity::Warning,
                Severity::Warning
            ]
        );
    }

    #[test]
    fn test_cross_check_and_mcp() {
        let dev = vec!["GitHub.copilot".to_string()];
        let rec = vec!["anything".to_string()];
        assert_eq!(cross_check(&dev, &rec).len(), 4);
        assert!(cross_check(&[], &rec).is_empty());

        assert!(mcp_servers(r#"{"servers": {"github": {"type": "http"}}}"#).is_none());
        assert!(mcp_servers(r#"{"servers": {}}"#).unwrap().message.contains("servers.github"));
        assert!(mcp_servers("{").unwrap().message.starts_with("invalid JSON"));
    }

    #[test]
    fn test_run_vscode_config_missing_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        let eff =
            crate::config::resolve_with_env(dir.path().to_str(), None, None, None, None).unwrap();
        let mut f = Findings::new();
        run_vscode_config(&eff, &mut f);
        let r = f.into_report();
        assert_eq!(r.summary.errors, 2);
        assert_eq!(r.summary.warnings, 1);

        fs::create_dir_all(dir.path().join(".devcontainer")).unwrap();
        fs::write(dir.path().join(DEVCONTAINER), DEVCONTAINER_OK).unwrap();
        let mut f = Findings::new();
        run_vscode_config(&eff, &mut f);
        let files: Vec<&str> = f.as_slice().iter().map(|x| x.file.as_str()).collect();
        assert_eq!(files, vec![EXTENSIONS, MCP]);
    }
}
