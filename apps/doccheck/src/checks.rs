//! Content rules applied to templates and generated artifacts.
//!
//! Each check looks at the raw text (sometimes the filesystem next to it) and
//! returns findings at a caller-chosen severity. Templates enforce these as
//! errors while generated artifacts mostly get warnings, so the severity is
//! always a parameter here rather than a property of the rule.

use crate::models::{Finding, FindingKind, Severity};
use crate::registry::{ContentRules, DiagramRef};
use crate::utils;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub const RULE_COST: &str = "cost-distribution";
pub const RULE_DIAGRAM_REF: &str = "diagram-reference";
pub const RULE_DIAGRAM_FILE: &str = "diagram-file";
pub const RULE_COMPONENTS: &str = "standard-components";
pub const RULE_MERMAID: &str = "mermaid";
pub const RULE_TRAFFIC_LIGHT: &str = "traffic-light";
pub const RULE_COLLAPSIBLE: &str = "collapsible";
pub const RULE_GOVERNANCE: &str = "governance-discovery";

macro_rules! lazy_re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pat).expect("static pattern is valid"))
        }
    };
}

lazy_re!(table_re, r"\|[^\n]+\|\n\|[\s:-]+\|");
lazy_re!(chart_re, r"(?i)!\[[^\]]*\]\((?:\./)?[^)]+\.(png|svg)\)");
lazy_re!(attribution_re, r"> Generated by .* agent");
lazy_re!(query_results_re, r"(?i)\d+\s*(policies|tags|constraints)\s*discovered");
lazy_re!(timestamp_re, r"\d{4}-\d{2}-\d{2}|T\d{2}:\d{2}");
lazy_re!(placeholder_re, r"(?i)\{X\}|\{subscription|UNVERIFIED");

fn violation(severity: Severity, rule: &str, file: &str, message: String) -> Finding {
    Finding::new(severity, FindingKind::ContentViolation, rule, file, message)
}

/// Text from `marker` up to the nearest of `stops` after it, or the end.
fn section_after<'a>(text: &'a str, marker: &str, stops: &[&str]) -> Option<&'a str> {
    let start = text.find(marker)?;
    let body_start = start + marker.len();
    let end = stops
        .iter()
        .filter_map(|s| text[body_start..].find(s))
        .min()
        .map(|off| body_start + off)
        .unwrap_or(text.len());
    Some(&text[start..end])
}

/// Cost estimates need a distribution table or a linked chart image.
///
/// Only the `### Cost Distribution` section is inspected when present.
pub fn cost_distribution(file: &str, text: &str, severity: Severity) -> Option<Finding> {
    let section =
        section_after(text, "### Cost Distribution", &["\n### ", "\n## "]).unwrap_or(text);
    if table_re().is_match(section) || chart_re().is_match(section) {
        return None;
    }
    Some(violation(
        severity,
        RULE_COST,
        file,
        "must include a cost distribution markdown table or a linked chart image (.png/.svg)"
            .into(),
    ))
}

/// Expected diagram image and source links.
pub fn diagram_references(
    file: &str,
    diagrams: &[DiagramRef],
    text: &str,
    severity: Severity,
) -> Vec<Finding> {
    let mut out = Vec::new();
    for d in diagrams {
        if !text.contains(d.image) {
            out.push(violation(
                severity,
                RULE_DIAGRAM_REF,
                file,
                format!("missing required diagram image reference: {}", d.image),
            ));
        }
        if !text.contains(d.source) {
            out.push(violation(
                severity,
                RULE_DIAGRAM_REF,
                file,
                format!("missing required diagram source reference: {}", d.source),
            ));
        }
    }
    out
}

/// Expected diagram files next to the document in `dir`.
pub fn diagram_files(
    file: &str,
    dir: &Path,
    diagrams: &[DiagramRef],
    severity: Severity,
) -> Vec<Finding> {
    let mut out = Vec::new();
    for d in diagrams {
        for (what, rel) in [("image", d.image), ("source", d.source)] {
            let p = dir.join(rel.trim_start_matches("./"));
            if !p.exists() {
                out.push(violation(
                    severity,
                    RULE_DIAGRAM_FILE,
                    file,
                    format!("requires diagram {} artifact: {}", what, rel),
                ));
            }
        }
    }
    out
}

/// Badge row, table of contents, attribution header, and navigation table.
///
/// Project READMEs use a different layout and are exempt.
pub fn standard_components(file: &str, text: &str, severity: Severity) -> Vec<Finding> {
    let base = Path::new(file)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file);
    if base == "README.md" || base == "PROJECT-README.template.md" {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut miss = |present: bool, what: &str| {
        if !present {
            out.push(violation(
                severity,
                RULE_COMPONENTS,
                file,
                format!("is missing the {}", what),
            ));
        }
    };
    miss(
        text.contains("![Step]"),
        "badge row (![Step], ![Status], ![Agent])",
    );
    miss(
        text.contains("📑 Table of Contents"),
        "collapsible Table of Contents",
    );
    miss(attribution_re().is_match(text), "attribution header");
    miss(text.contains("⬅️ Previous"), "cross-navigation table");
    out
}

pub fn mermaid(file: &str, text: &str, severity: Severity) -> Option<Finding> {
    (!text.contains("```mermaid")).then(|| {
        violation(
            severity,
            RULE_MERMAID,
            file,
            "should contain at least one Mermaid diagram block".into(),
        )
    })
}

pub fn traffic_light(file: &str, text: &str, severity: Severity) -> Option<Finding> {
    let missing: Vec<&str> = ["✅", "⚠️", "❌"]
        .into_iter()
        .filter(|m| !text.contains(m))
        .collect();
    (!missing.is_empty()).then(|| {
        violation(
            severity,
            RULE_TRAFFIC_LIGHT,
            file,
            format!(
                "should contain traffic-light indicators (missing: {})",
                missing.join(", ")
            ),
        )
    })
}

pub fn collapsible(file: &str, text: &str, severity: Severity) -> Option<Finding> {
    (!text.contains("<details>")).then(|| {
        violation(
            severity,
            RULE_COLLAPSIBLE,
            file,
            "should contain collapsible <details> blocks".into(),
        )
    })
}

/// Governance constraints must show evidence of a real policy query.
///
/// Placeholders report at `severity`; missing query evidence is always a warning.
pub fn governance_discovery(file: &str, text: &str, severity: Severity) -> Vec<Finding> {
    const MARKER: &str = "## Discovery Source";
    let line = utils::line_of(text, MARKER).unwrap_or(0);
    let Some(section) = section_after(text, MARKER, &["##"]) else {
        return vec![violation(
            severity,
            RULE_GOVERNANCE,
            file,
            "missing Discovery Source section content".into(),
        )];
    };
    let mut out = Vec::new();
    if placeholder_re().is_match(section) {
        out.push(
            violation(
                severity,
                RULE_GOVERNANCE,
                file,
                "contains placeholder values; constraints may be assumed, not discovered".into(),
            )
            .at(line),
        );
    }
    if !query_results_re().is_match(section) && !timestamp_re().is_match(section) {
        out.push(
            violation(
                Severity::Warning,
                RULE_GOVERNANCE,
                file,
                "may not have been discovered from a live policy query (no query results or timestamps found)"
                    .into(),
            )
            .at(line),
        );
    }
    out
}

/// The marker rules (mermaid, traffic light, collapsible) enabled in `rules`.
pub fn marker_rules(
    file: &str,
    text: &str,
    rules: &ContentRules,
    severity: Severity,
) -> Vec<Finding> {
    let mut out = Vec::new();
    if rules.mermaid {
        out.extend(mermaid(file, text, severity));
    }
    if rules.traffic_light {
        out.extend(traffic_light(file, text, severity));
    }
    if rules.collapsible {
        out.extend(collapsible(file, text, severity));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cost_distribution_table_or_chart() {
        let table = "### Cost Distribution\n\n| Cat | $ |\n|---|--:|\n| A | 1 |\n## Next\n";
        assert!(cost_distribution("c.md", table, Severity::Error).is_none());
        let chart = "### Cost Distribution\n![dist](./cost.PNG)\n";
        assert!(cost_distribution("c.md", chart, Severity::Error).is_none());
        let table_elsewhere =
            "| Cat | $ |\n|---|---|\n### Cost Distribution\nnone here\n### Other\n";
        let f = cost_distribution("c.md", table_elsewhere, Severity::Warning).unwrap();
        assert_eq!(f.severity, Severity::Warning);
        assert_eq!(f.rule, RULE_COST);
    }

    #[test]
    fn test_diagram_references_and_files() {
        let d = [DiagramRef {
            image: "./x.png",
            source: "./x.py",
        }];
        let f = diagram_references("p.md", &d, "see ./x.png", Severity::Error);
        assert_eq!(f.len(), 1);
        assert!(f[0].message.ends_with("./x.py"));

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("x.py"), "").unwrap();
        let f = diagram_files("p.md", dir.path(), &d, Severity::Warning);
        assert_eq!(f.len(), 1);
        assert!(f[0].message.contains("image artifact: ./x.png"));
    }

    #[test]
    fn test_standard_components_and_readme_exemption() {
        let full = "![Step](b)\n📑 Table of Contents\n> Generated by architect agent\n⬅️ Previous\n";
        assert!(standard_components("a/02-x.md", full, Severity::Warning).is_empty());
        assert_eq!(standard_components("a/02-x.md", "", Severity::Warning).len(), 4);
        assert!(standard_components("a/README.md", "", Severity::Warning).is_empty());
    }

    #[test]
    fn test_marker_rules() {
        let rules = ContentRules {
            mermaid: true,
            traffic_light: true,
            collapsible: true,
            ..ContentRules::default()
        };
        let f = marker_rules("a.md", "✅ ok ⚠️", &rules, Severity::Error);
        assert_eq!(f.len(), 3);
        assert!(f[1].message.contains("missing: ❌"));
        let ok = "```mermaid\ngraph\n```\n✅⚠️❌<details>";
        assert!(marker_rules("a.md", ok, &rules, Severity::Error).is_empty());
    }

    #[test]
    fn test_governance_discovery() {
        let good = "## Discovery Source\n12 policies discovered on 2026-01-05\n## Azure Policy Compliance\n";
        assert!(governance_discovery("g.md", good, Severity::Error).is_empty());

        let placeholder = "intro\n## Discovery Source\n{X} policies UNVERIFIED\n## Next\n";
        let f = governance_discovery("g.md", placeholder, Severity::Error);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].severity, Severity::Error);
        assert_eq!(f[0].line, Some(2));
        assert_eq!(f[1].severity, Severity::Warning);

        let absent = governance_discovery("g.md", "## Other\n", Severity::Warning);
        assert_eq!(absent.len(), 1);
        assert!(absent[0].message.contains("missing Discovery Source"));
    }
}
