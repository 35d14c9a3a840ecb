//! Cross-source heading synchronization.
//!
//! The same artifact heading lists are declared in several places: the
//! consolidated skill file, the heading reference instructions, and the
//! built-in registry. Each markdown source declares a type as a
//! `### <name>.md` line followed by a fenced block of `## ` lines. Every
//! declared source is compared against the primary (the first one) after
//! normalization, so N sources need N-1 comparisons and drift in any of them
//! is reported against the source that diverges.

use crate::config::Effective;
use crate::error::Result;
use crate::models::schema::{ExtractedStructure, Heading};
use crate::models::{Finding, FindingKind, Findings};
use crate::registry::{Registry, UNIVERSAL_OPTIONAL};
use crate::utils;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const RULE_SYNC: &str = "h2-sync";

/// Headings per artifact name declared by one source.
pub type SourceMap = BTreeMap<String, ExtractedStructure>;

/// Default normalizer: drop headings every source may carry or omit.
pub fn strip_universal_optional(headings: &[String]) -> Vec<String> {
    headings
        .iter()
        .filter(|h| !UNIVERSAL_OPTIONAL.contains(&h.as_str()))
        .cloned()
        .collect()
}

/// Compare every source against the first one for schema `name`.
///
/// A count mismatch yields one finding with both set differences; equal
/// counts with differing content yield one finding at the first differing
/// position.
pub fn compare_sources<F>(name: &str, sources: &[ExtractedStructure], normalize: F) -> Vec<Finding>
where
    F: Fn(&[String]) -> Vec<String>,
{
    let Some((primary, rest)) = sources.split_first() else {
        return Vec::new();
    };
    let a = normalize(&owned_texts(primary));
    rest.iter()
        .filter_map(|other| {
            let b = normalize(&owned_texts(other));
            diverge(name, primary, &a, other, &b)
        })
        .collect()
}

fn owned_texts(s: &ExtractedStructure) -> Vec<String> {
    s.headings.iter().map(|h| h.text.clone()).collect()
}

fn diverge(
    name: &str,
    primary: &ExtractedStructure,
    a: &[String],
    other: &ExtractedStructure,
    b: &[String],
) -> Option<Finding> {
    if a.len() != b.len() {
        let only_a: Vec<&str> = a.iter().filter(|h| !b.contains(h)).map(String::as_str).collect();
        let only_b: Vec<&str> = b.iter().filter(|h| !a.contains(h)).map(String::as_str).collect();
        let mut message = format!(
            "{}: {} has {} headings, {} has {}",
            name,
            primary.source_id,
            a.len(),
            other.source_id,
            b.len()
        );
        if !only_a.is_empty() {
            message.push_str(&format!(
                "; in {} but not {}: {}",
                primary.source_id,
                other.source_id,
                only_a.join(", ")
            ));
        }
        if !only_b.is_empty() {
            message.push_str(&format!(
                "; in {} but not {}: {}",
                other.source_id,
                primary.source_id,
                only_b.join(", ")
            ));
        }
        return Some(Finding::error(
            FindingKind::CrossSourceMismatch,
            RULE_SYNC,
            other.source_id.as_str(),
            message,
        ));
    }
    let idx = a.iter().zip(b).position(|(x, y)| x != y)?;
    let line = other
        .headings
        .iter()
        .find(|h| h.text == b[idx])
        .map(|h| h.line)
        .unwrap_or(0);
    Some(
        Finding::error(
            FindingKind::CrossSourceMismatch,
            RULE_SYNC,
            other.source_id.as_str(),
            format!(
                "{}: heading mismatch at position {}: {}=\"{}\" vs {}=\"{}\"",
                name,
                idx + 1,
                primary.source_id,
                a[idx],
                other.source_id,
                b[idx]
            ),
        )
        .at(line),
    )
}

fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^###\s+([\w.-]+\.md)(?:\s+.*)?$").expect("section header pattern is valid")
    })
}

fn trailing_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*<!--.*?-->\s*$").expect("comment pattern is valid"))
}

/// Parse `### <name>.md` sections followed by a heading fence.
///
/// The fence must follow the section line, separated only by blank lines,
/// and open with ```` ``` ```` or ```` ```markdown ````. Sections whose block
/// holds no `## ` lines are ignored; a later section for the same name wins.
pub fn parse_markdown_source(source_id: &str, text: &str) -> SourceMap {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = SourceMap::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(caps) = section_re().captures(lines[i].trim_end()) else {
            i += 1;
            continue;
        };
        let name = caps[1].to_string();
        let mut j = i + 1;
        while j < lines.len() && lines[j].trim().is_empty() {
            j += 1;
        }
        if j >= lines.len() || !matches!(lines[j].trim_end(), "```" | "```markdown") {
            i += 1;
            continue;
        }
        let mut headings = Vec::new();
        let mut k = j + 1;
        while k < lines.len() && !lines[k].starts_with("```") {
            let line = lines[k].trim();
            if line.starts_with("## ") {
                headings.push(Heading {
                    text: trailing_comment_re().replace(line, "").trim().to_string(),
                    line: k + 1,
                });
            }
            k += 1;
        }
        if !headings.is_empty() {
            out.insert(name, ExtractedStructure::new(source_id, headings));
        }
        i = k + 1;
    }
    out
}

/// The registry's declared headings as a source.
pub fn registry_source(registry: &Registry, source_id: &str) -> SourceMap {
    registry
        .iter()
        .filter(|a| a.synced)
        .map(|a| {
            (
                a.name().to_string(),
                ExtractedStructure::from_texts(source_id, a.schema.required.iter().cloned()),
            )
        })
        .collect()
}

/// Check that the skill file, the heading reference, and the registry agree.
///
/// Both markdown sources are mandatory; a missing one aborts the run.
pub fn run_h2_sync(eff: &Effective, registry: &Registry, findings: &mut Findings) -> Result<()> {
    let skill_id = eff.paths.consolidated_skill.clone();
    let ref_id = eff.paths.heading_reference.clone();
    let skill_text = utils::read_required(&eff.path(&skill_id))?;
    let ref_text = utils::read_required(&eff.path(&ref_id))?;

    let sources: Vec<(String, SourceMap)> = vec![
        (skill_id.clone(), parse_markdown_source(&skill_id, &skill_text)),
        (ref_id.clone(), parse_markdown_source(&ref_id, &ref_text)),
        ("registry".to_string(), registry_source(registry, "registry")),
    ];
    tracing::info!(
        skill = sources[0].1.len(),
        reference = sources[1].1.len(),
        registry = sources[2].1.len(),
        "heading sources loaded"
    );

    for name in registry.synced_names() {
        findings.checked();
        let mut declared = Vec::new();
        let mut complete = true;
        for (id, map) in &sources {
            match map.get(name) {
                Some(s) => declared.push(s.clone()),
                None => {
                    findings.push(Finding::error(
                        FindingKind::CrossSourceMismatch,
                        RULE_SYNC,
                        id.as_str(),
                        format!("{}: missing from {}", name, id),
                    ));
                    complete = false;
                }
            }
        }
        if complete {
            findings.extend(compare_sources(name, &declared, strip_universal_optional));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(id: &str, hs: &[&str]) -> ExtractedStructure {
        ExtractedStructure::from_texts(id, hs.iter().copied())
    }

    #[test]
    fn test_three_sources_report_the_divergent_one() {
        let sources = vec![
            s("skill", &["## A", "## B"]),
            s("ref", &["## A", "## B"]),
            s("registry", &["## A", "## C"]),
        ];
        let f = compare_sources("x.md", &sources, strip_universal_optional);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].kind, FindingKind::CrossSourceMismatch);
        assert_eq!(f[0].file, "registry");
        assert_eq!(
            f[0].message,
            "x.md: heading mismatch at position 2: skill=\"## B\" vs registry=\"## C\""
        );
        assert_eq!(f[0].line, Some(2));
    }

    #[test]
    fn test_count_mismatch_lists_both_differences() {
        let sources = vec![s("skill", &["## A", "## B", "## D"]), s("ref", &["## A", "## C"])];
        let f = compare_sources("x.md", &sources, strip_universal_optional);
        assert_eq!(f.len(), 1);
        assert!(f[0].message.contains("skill has 3 headings, ref has 2"));
        assert!(f[0].message.contains("in skill but not ref: ## B, ## D"));
        assert!(f[0].message.contains("in ref but not skill: ## C"));
    }

    #[test]
    fn test_references_are_normalized_away() {
        let sources = vec![
            s("skill", &["## A", "## References"]),
            s("ref", &["## A"]),
        ];
        assert!(compare_sources("x.md", &sources, strip_universal_optional).is_empty());
    }

    #[test]
    fn test_parse_markdown_source_sections() {
        let text = "\
# Skill

### 01-requirements.md (Requirements agent)

```markdown
## Project Overview
## Budget <!-- keep -->
## References <!-- Optional, add at end -->
```

### 02-x.md

Some prose, no fence.

### 03-empty.md
```
nothing here
```
";
        let map = parse_markdown_source("SKILL.md", text);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["01-requirements.md"]);
        let req = &map["01-requirements.md"];
        assert_eq!(
            req.texts(),
            vec!["## Project Overview", "## Budget", "## References"]
        );
        assert_eq!(req.headings[0].line, 6);
        assert_eq!(req.source_id, "SKILL.md");
    }

    #[test]
    fn test_registry_source_covers_synced_types() {
        let reg = Registry::builtin();
        let src = registry_source(&reg, "registry");
        assert_eq!(src.len(), reg.synced_names().len());
        assert!(!src.contains_key("README.md"));
    }
}
