//! Output rendering for validation reports.
//!
//! Supports `human` (default), `json` and `github` outputs. The JSON form
//! carries every finding plus a summary and counts; the same projection is
//! written to disk when a report path is configured.

use crate::config::OutputFormat;
use crate::error::{Error, Result};
use crate::models::{Finding, Report, Severity};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::fs;
use std::path::Path;

fn use_colors(output: OutputFormat) -> bool {
    output == OutputFormat::Human && std::env::var_os("NO_COLOR").is_none()
}

/// Print a report in the requested format.
pub fn print_report(report: &Report, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&compose_json(report))?);
        }
        OutputFormat::Github => {
            for line in github_annotations(report) {
                println!("{}", line);
            }
            println!("{}", summary_line(report));
        }
        OutputFormat::Human => print_human(report, use_colors(output)),
    }
    Ok(())
}

fn print_human(report: &Report, color: bool) {
    for sev in [Severity::Error, Severity::Warning, Severity::Info] {
        for f in report.by_severity(sev) {
            println!("{}", human_line(f, color));
        }
    }
    let summary = summary_line(report);
    if color {
        println!("{}", summary.bold());
    } else {
        println!("{}", summary);
    }
}

fn human_line(f: &Finding, color: bool) -> String {
    let (tag, icon) = match f.severity {
        Severity::Error => ("⟦error⟧", "✖"),
        Severity::Warning => ("⟦warn⟧", "▲"),
        Severity::Info => ("⟦info⟧", "◆"),
    };
    let loc = location(f);
    if !color {
        return format!("{} {} {} ❲{}❳ — {}", icon, tag, loc, f.rule, f.message);
    }
    let (tag, icon) = match f.severity {
        Severity::Error => (tag.red().bold().to_string(), icon.red().to_string()),
        Severity::Warning => (tag.yellow().bold().to_string(), icon.yellow().to_string()),
        Severity::Info => (tag.blue().bold().to_string(), icon.blue().to_string()),
    };
    format!("{} {} {} ❲{}❳ — {}", icon, tag, loc.bold(), f.rule, f.message)
}

fn location(f: &Finding) -> String {
    match f.line {
        Some(line) => format!("{}:{}", f.file, line),
        None => f.file.clone(),
    }
}

fn summary_line(report: &Report) -> String {
    let s = &report.summary;
    format!(
        "— Summary — errors={} warnings={} infos={} documents={}",
        s.errors, s.warnings, s.infos, s.documents
    )
}

/// Compose the JSON projection (pure) used for stdout and report files.
pub fn compose_json(report: &Report) -> JsonVal {
    json!({
        "findings": report.findings,
        "summary": report.headline(),
        "counts": report.summary,
        "status": report.status(),
    })
}

/// One workflow annotation per finding.
pub fn github_annotations(report: &Report) -> Vec<String> {
    report.findings.iter().map(annotation).collect()
}

fn annotation(f: &Finding) -> String {
    let level = match f.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "notice",
    };
    let mut props = format!("file={}", escape_property(&f.file));
    if let Some(line) = f.line {
        props.push_str(&format!(",line={}", line));
    }
    props.push_str(&format!(",title={}", escape_property(&f.rule)));
    format!("::{} {}::{}", level, props, escape_data(&f.message))
}

/// Escape annotation message text.
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape annotation property values, which additionally reserve `:` and `,`.
pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// Write the JSON projection to `path`, creating parent directories.
pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let body = serde_json::to_string_pretty(&compose_json(report))?;
    fs::write(path, body + "\n").map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
