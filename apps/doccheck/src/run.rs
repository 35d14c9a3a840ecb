//! Dispatch from a selected check to its validator(s), producing one report.

use crate::config::Effective;
use crate::error::{Error, Result};
use crate::models::{Finding, FindingKind, Findings, Report};
use crate::registry::Registry;
use crate::{
    agents, artifacts, fix, freshness, instructions, refs, skills, sync, utils, version, vscode,
};
use std::path::PathBuf;

pub const RULE_FATAL: &str = "fatal";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A validator selection, as chosen on the command line.
pub enum Check {
    Artifacts,
    H2Sync,
    FixH2 {
        paths: Vec<String>,
        apply: bool,
        check: bool,
    },
    Agents,
    Skills,
    Instructions,
    Freshness,
    DeprecatedRefs,
    VersionSync,
    VscodeConfig,
    All,
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Check::Artifacts => "artifacts",
            Check::H2Sync => "h2-sync",
            Check::FixH2 { .. } => "fix-h2",
            Check::Agents => "agents",
            Check::Skills => "skills",
            Check::Instructions => "instructions",
            Check::Freshness => "freshness",
            Check::DeprecatedRefs => "deprecated-refs",
            Check::VersionSync => "version-sync",
            Check::VscodeConfig => "vscode-config",
            Check::All => "all",
        }
    }
}

/// Validators in the order `all` runs them.
const ALL: [Check; 9] = [
    Check::Artifacts,
    Check::H2Sync,
    Check::Agents,
    Check::Skills,
    Check::Instructions,
    Check::Freshness,
    Check::DeprecatedRefs,
    Check::VersionSync,
    Check::VscodeConfig,
];

/// Run `check` against the repository described by `eff`.
///
/// A fatal error from a single validator aborts the run. Under `all`, it is
/// recorded as an error finding and the remaining validators still run.
pub fn run_check(check: &Check, eff: &Effective) -> Result<Report> {
    let mut findings = Findings::new();
    match check {
        Check::All => {
            for c in &ALL {
                if let Err(e) = run_into(c, eff, &mut findings) {
                    tracing::warn!(check = c.name(), error = %e, "validator aborted");
                    findings.push(fatal_finding(eff, &e));
                }
            }
        }
        other => run_into(other, eff, &mut findings)?,
    }
    Ok(findings.into_report())
}

fn run_into(check: &Check, eff: &Effective, findings: &mut Findings) -> Result<()> {
    tracing::debug!(check = check.name(), "running");
    match check {
        Check::Artifacts => {
            let registry = Registry::builtin().with_strictness_override(eff.strictness);
            artifacts::run_artifacts(eff, &registry, findings);
        }
        Check::H2Sync => sync::run_h2_sync(eff, &Registry::builtin(), findings)?,
        Check::FixH2 { paths, apply, check } => {
            let results = fix::run_fix(eff, &Registry::builtin(), paths, *apply);
            let compliant = results
                .iter()
                .filter_map(|r| r.analysis.as_ref())
                .filter(|a| a.is_compliant())
                .count();
            tracing::info!(files = results.len(), compliant, "heading analysis done");
            fix::to_findings(&results, *check, findings);
        }
        Check::Agents => agents::run_agents(eff, findings),
        Check::Skills => skills::run_skills(eff, findings),
        Check::Instructions => instructions::run_instructions(eff, findings),
        Check::Freshness => freshness::run_freshness(eff, findings),
        Check::DeprecatedRefs => refs::run_deprecated_refs(eff, findings),
        Check::VersionSync => version::run_version_sync(eff, findings)?,
        Check::VscodeConfig => vscode::run_vscode_config(eff, findings),
        Check::All => {
            for c in &ALL {
                run_into(c, eff, findings)?;
            }
        }
    }
    Ok(())
}

fn fatal_finding(eff: &Effective, e: &Error) -> Finding {
    let file = match e {
        Error::MissingSource { path }
        | Error::Read { path, .. }
        | Error::Write { path, .. }
        | Error::Parse { path, .. } => utils::rel_path(&eff.repo_root, path),
        Error::Invalid { name, .. } => name.clone(),
        Error::Json(_) => String::new(),
    };
    Finding::error(FindingKind::MissingInputFile, RULE_FATAL, file, e.to_string())
}

/// Where the JSON report goes, if anywhere.
///
/// An explicit report path always gets written. Freshness falls back to its
/// default file, but only when it found something.
pub fn report_path(check: &Check, eff: &Effective, report: &Report) -> Option<PathBuf> {
    if let Some(p) = &eff.report {
        return Some(p.clone());
    }
    (*check == Check::Freshness && !report.findings.is_empty())
        .then(|| freshness::default_report_path(&eff.repo_root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_with_env;
    use crate::models::Status;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_single_fatal_aborts_but_all_continues() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        let eff = resolve_with_env(dir.path().to_str(), None, None, None, None).unwrap();

        assert!(matches!(
            run_check(&Check::VersionSync, &eff),
            Err(Error::MissingSource { .. })
        ));

        let r = run_check(&Check::All, &eff).unwrap();
        assert_eq!(r.status(), Status::Failed);
        let fatal: Vec<&str> = r
            .findings
            .iter()
            .filter(|f| f.rule == RULE_FATAL)
            .map(|f| f.file.as_str())
            .collect();
        assert_eq!(
            fatal,
            vec![".github/skills/azure-artifacts/SKILL.md", "VERSION.md"]
        );
    }

    #[test]
    fn test_report_path_defaults_only_for_freshness_with_findings() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        let eff = resolve_with_env(dir.path().to_str(), None, None, None, None).unwrap();
        let empty = Findings::new().into_report();
        assert_eq!(report_path(&Check::Freshness, &eff, &empty), None);

        let mut f = Findings::new();
        f.push(Finding::info(FindingKind::ContentViolation, "x", "a.md", "m"));
        let some = f.into_report();
        assert_eq!(
            report_path(&Check::Freshness, &eff, &some),
            Some(eff.repo_root.join("freshness-report.json"))
        );
        assert_eq!(report_path(&Check::Agents, &eff, &some), None);

        let eff =
            resolve_with_env(dir.path().to_str(), None, None, Some("out/r.json"), None).unwrap();
        assert_eq!(
            report_path(&Check::Agents, &eff, &empty),
            Some(eff.repo_root.join("out/r.json"))
        );
    }
}
