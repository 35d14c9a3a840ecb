use doccheck::config::resolve_with_env;
use doccheck::models::{Severity, Status};
use doccheck::output::{compose_json, write_report};
use doccheck::registry::Registry;
use doccheck::run::{run_check, Check};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const SKILL: &str = ".github/skills/azure-artifacts/SKILL.md";
const REFERENCE: &str = ".github/instructions/artifact-h2-reference.instructions.md";

fn repo() -> TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    dir
}

fn write(root: &Path, rel: &str, text: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, text).unwrap();
}

/// Heading sections in the layout the skill and reference files use.
fn heading_sections(skip_last_of: Option<&str>) -> String {
    let mut out = String::from("# Artifact headings\n\n");
    for a in Registry::builtin().iter().filter(|a| a.synced) {
        out.push_str(&format!("### {}\n\n```markdown\n", a.name()));
        let mut req: Vec<&String> = a.schema.required.iter().collect();
        if skip_last_of == Some(a.name()) {
            req.pop();
        }
        for h in req {
            out.push_str(h);
            out.push('\n');
        }
        out.push_str("## References <!-- optional -->\n```\n\n");
    }
    out
}

fn plan_without_approval_gate() -> String {
    let reg = Registry::builtin();
    let schema = reg.schema("04-implementation-plan.md").unwrap();
    let mut text = String::from("# Implementation Plan\n\n");
    for h in schema.required.iter().filter(|h| h.as_str() != "## Approval Gate") {
        text.push_str(&format!("{}\n\nbody\n\n", h));
    }
    text
}

#[test]
fn fix_h2_check_mode_decides_exit_code() {
    let dir = repo();
    write(
        dir.path(),
        "agent-output/demo/04-implementation-plan.md",
        &plan_without_approval_gate(),
    );
    let eff = resolve_with_env(dir.path().to_str(), None, None, None, None).unwrap();
    let paths = vec!["agent-output/demo/04-implementation-plan.md".to_string()];

    let strict = run_check(
        &Check::FixH2 {
            paths: paths.clone(),
            apply: false,
            check: true,
        },
        &eff,
    )
    .unwrap();
    assert_eq!(strict.summary.errors, 1);
    assert!(strict.findings[0].message.ends_with("missing headings: ## Approval Gate"));
    assert_eq!(strict.status().exit_code(), 1);

    let lenient = run_check(
        &Check::FixH2 {
            paths,
            apply: false,
            check: false,
        },
        &eff,
    )
    .unwrap();
    assert_eq!(lenient.status(), Status::Warnings);
    assert_eq!(lenient.status().exit_code(), 0);
}

#[test]
fn h2_sync_agrees_then_flags_the_divergent_source() {
    let dir = repo();
    write(dir.path(), SKILL, &heading_sections(None));
    write(dir.path(), REFERENCE, &heading_sections(None));
    let eff = resolve_with_env(dir.path().to_str(), None, None, None, None).unwrap();

    let clean = run_check(&Check::H2Sync, &eff).unwrap();
    assert_eq!(clean.status(), Status::Clean, "{:?}", clean.findings);
    assert_eq!(clean.summary.documents, 15);

    write(
        dir.path(),
        REFERENCE,
        &heading_sections(Some("04-implementation-plan.md")),
    );
    let drift = run_check(&Check::H2Sync, &eff).unwrap();
    assert_eq!(drift.status(), Status::Failed);
    assert_eq!(drift.findings.len(), 1);
    assert_eq!(drift.findings[0].file, REFERENCE);
    assert!(drift.findings[0].message.contains("in "));
    assert!(drift.findings[0].message.contains("## Approval Gate"));
}

#[test]
fn relaxed_override_turns_artifact_drift_into_warnings() {
    let dir = repo();
    write(
        dir.path(),
        "agent-output/demo/04-implementation-plan.md",
        &plan_without_approval_gate(),
    );
    let missing_heading = |strictness: Option<&str>| {
        let eff = resolve_with_env(dir.path().to_str(), None, strictness, None, None).unwrap();
        let report = run_check(&Check::Artifacts, &eff).unwrap();
        report
            .findings
            .into_iter()
            .find(|f| {
                f.rule == "missing-headings"
                    && f.file == "agent-output/demo/04-implementation-plan.md"
            })
            .map(|f| f.severity)
    };
    assert_eq!(missing_heading(Some("standard")), Some(Severity::Error));
    assert_eq!(missing_heading(Some("relaxed")), Some(Severity::Warning));
}

#[test]
fn report_file_mirrors_stdout_json() {
    let dir = repo();
    let eff = resolve_with_env(
        dir.path().to_str(),
        None,
        None,
        Some("reports/out.json"),
        None,
    )
    .unwrap();
    let report = run_check(&Check::VscodeConfig, &eff).unwrap();
    let path = eff.report.clone().unwrap();
    write_report(&path, &report).unwrap();
    let on_disk: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, compose_json(&report));
    assert_eq!(on_disk["status"], "failed");
}
