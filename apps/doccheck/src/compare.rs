//! Structural comparison of extracted headings against a document schema.
//!
//! `compare` is a pure function: the same structure and schema always yield
//! the same findings, in the same order. Checks run in a fixed sequence
//! (missing, order, optional placement, extras) and never short-circuit
//! across checks; only the order check stops at its first divergence.

use crate::models::schema::{DocumentSchema, ExtractedStructure, Strictness};
use crate::models::{Finding, FindingKind, Severity};

pub const RULE_MISSING: &str = "missing-headings";
pub const RULE_ORDER: &str = "heading-order";
pub const RULE_PLACEMENT: &str = "optional-placement";
pub const RULE_EXTRA: &str = "extra-headings";
pub const RULE_DUPLICATE: &str = "duplicate-heading";

/// Compare one document's headings against its schema.
pub fn compare(extracted: &ExtractedStructure, schema: &DocumentSchema) -> Vec<Finding> {
    let mut out = Vec::new();
    let drift = drift_severity(schema.strictness);
    let file = extracted.source_id.as_str();

    let missing: Vec<&str> = schema
        .required
        .iter()
        .filter(|h| !extracted.contains(h))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        out.push(Finding::new(
            drift,
            FindingKind::MissingRequiredElement,
            RULE_MISSING,
            file,
            format!("missing required headings: {}", missing.join(", ")),
        ));
    }

    if let Some(f) = order_violation(extracted, schema, drift) {
        out.push(f);
    }

    out.extend(misplaced_optionals(extracted, schema));

    if schema.strictness == Strictness::Standard {
        out.extend(extras(extracted, schema));
        out.extend(duplicates(extracted, schema));
    }
    out
}

/// Severity of missing or misordered headings under `strictness`.
pub fn drift_severity(strictness: Strictness) -> Severity {
    match strictness {
        Strictness::Standard => Severity::Error,
        Strictness::Relaxed => Severity::Warning,
    }
}

/// First adjacent pair of present required headings found in the wrong order.
fn order_violation(
    extracted: &ExtractedStructure,
    schema: &DocumentSchema,
    severity: Severity,
) -> Option<Finding> {
    let present: Vec<(&str, usize)> = schema
        .required
        .iter()
        .filter_map(|h| extracted.position(h).map(|pos| (h.as_str(), pos)))
        .collect();
    present.windows(2).find_map(|pair| {
        let (earlier, earlier_pos) = pair[0];
        let (later, later_pos) = pair[1];
        (earlier_pos > later_pos).then(|| {
            Finding::new(
                severity,
                FindingKind::OutOfOrderElement,
                RULE_ORDER,
                extracted.source_id.as_str(),
                format!(
                    "required headings out of order: '{}' should come before '{}'",
                    earlier, later
                ),
            )
            .at(extracted.headings[earlier_pos].line)
        })
    })
}

/// Optional headings that appear before the anchor. Always warnings.
fn misplaced_optionals(extracted: &ExtractedStructure, schema: &DocumentSchema) -> Vec<Finding> {
    let Some(anchor) = schema.anchor() else {
        return Vec::new();
    };
    let Some(anchor_pos) = extracted.position(anchor) else {
        return Vec::new();
    };
    schema
        .optional
        .iter()
        .filter(|h| !schema.is_required(h))
        .filter_map(|h| extracted.position(h).map(|pos| (h, pos)))
        .filter(|(_, pos)| *pos < anchor_pos)
        .map(|(h, pos)| {
            Finding::warning(
                FindingKind::OutOfOrderElement,
                RULE_PLACEMENT,
                extracted.source_id.as_str(),
                format!(
                    "optional heading '{}' appears before anchor '{}' (consider moving it)",
                    h, anchor
                ),
            )
            .at(extracted.headings[pos].line)
        })
        .collect()
}

fn extras(extracted: &ExtractedStructure, schema: &DocumentSchema) -> Option<Finding> {
    let mut unknown: Vec<&str> = Vec::new();
    for h in &extracted.headings {
        let text = h.text.as_str();
        if !schema.is_required(text) && !schema.optional.contains(text) && !unknown.contains(&text)
        {
            unknown.push(text);
        }
    }
    let first_line = extracted
        .headings
        .iter()
        .find(|h| unknown.first() == Some(&h.text.as_str()))
        .map(|h| h.line)?;
    Some(
        Finding::warning(
            FindingKind::UnrecognizedElement,
            RULE_EXTRA,
            extracted.source_id.as_str(),
            format!("contains extra headings: {}", unknown.join(", ")),
        )
        .at(first_line),
    )
}

/// Required headings written more than once.
fn duplicates(extracted: &ExtractedStructure, schema: &DocumentSchema) -> Vec<Finding> {
    schema
        .required
        .iter()
        .filter_map(|h| {
            let mut lines = extracted
                .headings
                .iter()
                .filter(|x| &x.text == h)
                .map(|x| x.line);
            let _first = lines.next()?;
            let repeat = lines.next()?;
            Some(
                Finding::warning(
                    FindingKind::UnrecognizedElement,
                    RULE_DUPLICATE,
                    extracted.source_id.as_str(),
                    format!("required heading '{}' appears more than once", h),
                )
                .at(repeat),
            )
        })
        .collect()
}
