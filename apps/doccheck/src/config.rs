//! Configuration discovery and effective settings resolution.
//!
//! doccheck reads `doccheck.toml|yaml|yml` from the repository root (or the
//! closest ancestor) and merges it with CLI flags and the environment to
//! produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `strictness`: none (each document type keeps its own default)
//! - `report`: none
//! - `[paths]`: the `.github/...` layout described on `Paths`
//!
//! Overrides precedence: CLI > environment (`STRICTNESS`) > config file > defaults.

use crate::error::{Error, Result};
use crate::models::schema::Strictness;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable that forces strictness for every document type.
pub const STRICTNESS_ENV: &str = "STRICTNESS";

const CONFIG_NAMES: [&str; 3] = ["doccheck.toml", "doccheck.yaml", "doccheck.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Repository-relative locations under `[paths]`.
pub struct PathsCfg {
    pub agents: Option<String>,
    pub subagents: Option<String>,
    pub skills: Option<String>,
    pub instructions: Option<String>,
    pub docs: Option<String>,
    pub artifacts: Option<String>,
    pub templates: Option<String>,
    #[serde(rename = "consolidatedSkill")]
    pub consolidated_skill: Option<String>,
    #[serde(rename = "headingReference")]
    pub heading_reference: Option<String>,
    #[serde(rename = "standardsDoc")]
    pub standards_doc: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `doccheck.toml|yaml`.
pub struct DoccheckConfig {
    pub output: Option<String>,
    pub strictness: Option<String>,
    pub report: Option<String>,
    #[serde(default)]
    pub paths: Option<PathsCfg>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Resolved repository-relative locations.
pub struct Paths {
    pub agents: String,
    pub subagents: String,
    pub skills: String,
    pub instructions: String,
    pub docs: String,
    pub artifacts: String,
    pub templates: String,
    pub consolidated_skill: String,
    pub heading_reference: String,
    pub standards_doc: String,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            agents: ".github/agents".into(),
            subagents: ".github/agents/_subagents".into(),
            skills: ".github/skills".into(),
            instructions: ".github/instructions".into(),
            docs: "docs".into(),
            artifacts: "agent-output".into(),
            templates: ".github/skills/azure-artifacts/templates".into(),
            consolidated_skill: ".github/skills/azure-artifacts/SKILL.md".into(),
            heading_reference: ".github/instructions/artifact-h2-reference.instructions.md".into(),
            standards_doc: ".github/instructions/markdown.instructions.md".into(),
        }
    }
}

impl Paths {
    fn overlay(cfg: Option<PathsCfg>) -> Self {
        let d = Paths::default();
        let Some(c) = cfg else {
            return d;
        };
        Paths {
            agents: c.agents.unwrap_or(d.agents),
            subagents: c.subagents.unwrap_or(d.subagents),
            skills: c.skills.unwrap_or(d.skills),
            instructions: c.instructions.unwrap_or(d.instructions),
            docs: c.docs.unwrap_or(d.docs),
            artifacts: c.artifacts.unwrap_or(d.artifacts),
            templates: c.templates.unwrap_or(d.templates),
            consolidated_skill: c.consolidated_skill.unwrap_or(d.consolidated_skill),
            heading_reference: c.heading_reference.unwrap_or(d.heading_reference),
            standards_doc: c.standards_doc.unwrap_or(d.standards_doc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// How findings are rendered on stdout.
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Github,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "github" => Ok(OutputFormat::Github),
            other => Err(format!(
                "unknown output '{}' (expected human|json|github)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
/// Settings after applying every override layer.
pub struct Effective {
    pub repo_root: PathBuf,
    pub output: OutputFormat,
    /// Process-wide override; `None` keeps per-type defaults.
    pub strictness: Option<Strictness>,
    pub report: Option<PathBuf>,
    pub paths: Paths,
    pub config_found: bool,
}

impl Effective {
    /// Absolute location of a repository-relative path.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.repo_root.join(rel)
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `doccheck.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `DoccheckConfig` from `doccheck.toml` or `doccheck.yaml|yml` if present.
///
/// An unreadable or malformed file is logged and treated as absent.
pub fn load_config(root: &Path) -> Option<DoccheckConfig> {
    let toml_path = root.join(CONFIG_NAMES[0]);
    if toml_path.exists() {
        let s = read_config(&toml_path)?;
        return match toml::from_str::<DoccheckConfig>(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!(path = %toml_path.display(), error = %e, "ignoring invalid config");
                None
            }
        };
    }
    for yml in &CONFIG_NAMES[1..] {
        let p = root.join(yml);
        if p.exists() {
            let s = read_config(&p)?;
            return match serde_yaml::from_str::<DoccheckConfig>(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "ignoring invalid config");
                    None
                }
            };
        }
    }
    None
}

fn read_config(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

/// Resolve `Effective` by merging CLI flags, the environment, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_strictness: Option<&str>,
    cli_report: Option<&str>,
) -> Result<Effective> {
    let env_strictness = std::env::var(STRICTNESS_ENV).ok();
    resolve_with_env(
        cli_repo_root,
        cli_output,
        cli_strictness,
        cli_report,
        env_strictness.as_deref(),
    )
}

/// Same as [`resolve_effective`] with the environment passed in explicitly.
///
/// An invalid CLI value is fatal; an invalid environment or config value is
/// logged and skipped so the next layer applies.
pub fn resolve_with_env(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_strictness: Option<&str>,
    cli_report: Option<&str>,
    env_strictness: Option<&str>,
) -> Result<Effective> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root);
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let output = match cli_output {
        Some(s) => s
            .parse::<OutputFormat>()
            .map_err(|m| Error::invalid("--output", m))?,
        None => cfg
            .output
            .as_deref()
            .and_then(|s| lenient("output", s))
            .unwrap_or_default(),
    };

    let strictness = match cli_strictness {
        Some(s) => Some(
            s.parse::<Strictness>()
                .map_err(|m| Error::invalid("--strictness", m))?,
        ),
        None => env_strictness
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| lenient(STRICTNESS_ENV, s))
            .or_else(|| {
                cfg.strictness
                    .as_deref()
                    .and_then(|s| lenient("strictness", s))
            }),
    };

    let report = cli_report
        .map(PathBuf::from)
        .or_else(|| cfg.report.map(PathBuf::from))
        .map(|p| if p.is_absolute() { p } else { repo_root.join(p) });

    Ok(Effective {
        repo_root,
        output,
        strictness,
        report,
        paths: Paths::overlay(cfg.paths),
        config_found,
    })
}

fn lenient<T: FromStr<Err = String>>(source: &str, value: &str) -> Option<T> {
    match value.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(setting = source, "{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("doccheck.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
strictness = "relaxed"
report = "out/report.json"
[paths]
agents = "agents"
consolidatedSkill = "skills/all/SKILL.md"
    "#
        )
        .unwrap();

        // Resolve using explicit repo_root to avoid global CWD races
        let eff = resolve_with_env(root.to_str(), None, None, None, None).unwrap();
        assert!(eff.config_found);
        assert_eq!(eff.output, OutputFormat::Json);
        assert_eq!(eff.strictness, Some(Strictness::Relaxed));
        assert_eq!(eff.report, Some(root.join("out/report.json")));
        assert_eq!(eff.paths.agents, "agents");
        assert_eq!(eff.paths.consolidated_skill, "skills/all/SKILL.md");
        assert_eq!(eff.paths.skills, ".github/skills");
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("doccheck.yaml"),
            "output: github\npaths:\n  docs: documentation\n",
        )
        .unwrap();

        let eff = resolve_with_env(root.to_str(), None, None, None, None).unwrap();
        assert_eq!(eff.output, OutputFormat::Github);
        assert_eq!(eff.strictness, None);
        assert_eq!(eff.report, None);
        assert_eq!(eff.paths.docs, "documentation");
        assert_eq!(eff.paths.artifacts, "agent-output");
    }

    #[test]
    fn test_precedence_cli_env_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("doccheck.toml"), "strictness = \"relaxed\"\n").unwrap();

        let env = resolve_with_env(root.to_str(), None, None, None, Some("standard")).unwrap();
        assert_eq!(env.strictness, Some(Strictness::Standard));

        let cli =
            resolve_with_env(root.to_str(), None, Some("relaxed"), None, Some("standard")).unwrap();
        assert_eq!(cli.strictness, Some(Strictness::Relaxed));

        let bad_env = resolve_with_env(root.to_str(), None, None, None, Some("loose")).unwrap();
        assert_eq!(bad_env.strictness, Some(Strictness::Relaxed));
    }

    #[test]
    fn test_invalid_cli_value_is_fatal() {
        let dir = tempdir().unwrap();
        let err = resolve_with_env(dir.path().to_str(), Some("xml"), None, None, None);
        assert!(matches!(err, Err(Error::Invalid { .. })));
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("doccheck.toml"), "output = [unterminated\n").unwrap();
        let eff = resolve_with_env(root.to_str(), None, None, None, None).unwrap();
        assert!(!eff.config_found);
        assert_eq!(eff.output, OutputFormat::Human);
    }

    #[test]
    fn test_detect_repo_root_walks_up_to_git() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();
        assert_eq!(detect_repo_root(&root.join("a/b")), root.to_path_buf());
    }
}
