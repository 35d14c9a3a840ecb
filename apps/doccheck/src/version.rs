//! Version synchronization against `VERSION.md`.

use crate::config::Effective;
use crate::error::{Error, Result};
use crate::models::{Finding, FindingKind, Findings};
use crate::utils;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub const RULE_VERSION: &str = "version-sync";
pub const VERSION_FILE: &str = "VERSION.md";

fn semver_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.\d+\.\d+)").expect("static pattern is valid"))
}

fn changelog_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^##\s*\[?v?(\d+\.\d+\.\d+)\]?").expect("static pattern is valid")
    })
}

/// First `X.Y.Z` in the source-of-truth file.
pub fn source_version(path: &Path) -> Result<String> {
    let text = utils::read_required(path)?;
    semver_re()
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::parse(path, "no X.Y.Z version found"))
}

/// `version` field of a `package.json` document.
pub fn package_version(text: &str) -> std::result::Result<Option<String>, serde_json::Error> {
    let v: serde_json::Value = serde_json::from_str(text)?;
    Ok(v.get("version").and_then(|x| x.as_str()).map(str::to_string))
}

/// Version of the newest `## [x.y.z]` entry.
pub fn changelog_version(text: &str) -> Option<String> {
    changelog_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn run_version_sync(eff: &Effective, findings: &mut Findings) -> Result<()> {
    let expected = source_version(&eff.path(VERSION_FILE))?;
    tracing::info!(version = %expected, "source of truth");

    let pkg = "package.json";
    let pkg_path = eff.path(pkg);
    if !pkg_path.is_file() {
        findings.push(not_found(pkg));
    } else if let Some(text) = utils::read_text(&eff.repo_root, &pkg_path, findings) {
        findings.checked();
        match package_version(&text) {
            Ok(Some(found)) => findings.extend(compare(pkg, &found, &expected)),
            Ok(None) => {}
            Err(e) => findings.push(Finding::warning(
                FindingKind::MalformedFrontmatter,
                RULE_VERSION,
                pkg,
                format!("could not parse package.json: {}", e),
            )),
        }
    }

    let changelog = "CHANGELOG.md";
    let changelog_path = eff.path(changelog);
    if !changelog_path.is_file() {
        findings.push(not_found(changelog));
    } else if let Some(text) = utils::read_text(&eff.repo_root, &changelog_path, findings) {
        findings.checked();
        if let Some(found) = changelog_version(&text) {
            findings.extend(compare(changelog, &found, &expected));
        }
    }
    Ok(())
}

fn not_found(file: &str) -> Finding {
    Finding::warning(
        FindingKind::MissingInputFile,
        RULE_VERSION,
        file,
        format!("{} not found (optional)", file),
    )
}

fn compare(file: &str, found: &str, expected: &str) -> Option<Finding> {
    (found != expected).then(|| {
        Finding::error(
            FindingKind::ContentViolation,
            RULE_VERSION,
            file,
            format!("{}: v{} (expected v{})", file, found, expected),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn repo() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        dir
    }

    #[test]
    fn test_extractors() {
        assert_eq!(
            package_version(r#"{"name":"x","version":"1.2.3"}"#).unwrap(),
            Some("1.2.3".into())
        );
        assert!(package_version("{nope").is_err());
        let log = "# Changelog\n\n## [Unreleased]\n\n## [v2.0.1] - 2026-01-01\n## [1.0.0]\n";
        assert_eq!(changelog_version(log), Some("2.0.1".into()));
    }

    #[test]
    fn test_missing_version_file_is_fatal() {
        let dir = repo();
        let eff =
            crate::config::resolve_with_env(dir.path().to_str(), None, None, None, None).unwrap();
        let mut f = Findings::new();
        let err = run_version_sync(&eff, &mut f).unwrap_err();
        assert!(matches!(err, Error::MissingSource { .. }));

        fs::write(dir.path().join("VERSION.md"), "# Version\nunreleased\n").unwrap();
        let err = run_version_sync(&eff, &mut f).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_mismatch_and_missing_files() {
        let dir = repo();
        fs::write(dir.path().join("VERSION.md"), "## Current Version: 3.1.0\n").unwrap();
        fs::write(dir.path().join("package.json"), r#"{"version": "3.0.9"}"#).unwrap();
        let eff =
            crate::config::resolve_with_env(dir.path().to_str(), None, None, None, None).unwrap();
        let mut f = Findings::new();
        run_version_sync(&eff, &mut f).unwrap();
        let r = f.into_report();
        assert_eq!(r.summary.errors, 1);
        assert_eq!(r.findings[0].message, "package.json: v3.0.9 (expected v3.1.0)");
        assert_eq!(r.summary.warnings, 1);
        assert_eq!(r.findings[1].file, "CHANGELOG.md");
    }
}
