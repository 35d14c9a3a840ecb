//! Document schemas and extracted heading structures.
//!
//! A `DocumentSchema` lists the level-2 headings a document type must carry,
//! in order. Its last required heading is the anchor: optional sections are
//! expected after it. An `ExtractedStructure` is what a concrete document
//! actually contains, in file order, duplicates included.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Whether schema drift fails the run or only warns.
pub enum Strictness {
    /// Missing or misordered headings are errors; extras are reported.
    Standard,
    /// Missing or misordered headings are warnings; extras are accepted.
    Relaxed,
}

impl FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Strictness::Standard),
            "relaxed" => Ok(Strictness::Relaxed),
            other => Err(format!(
                "unknown strictness '{}' (expected standard|relaxed)",
                other
            )),
        }
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strictness::Standard => f.write_str("standard"),
            Strictness::Relaxed => f.write_str("relaxed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Required ordered headings plus allowed trailing sections for one document type.
pub struct DocumentSchema {
    pub name: String,
    pub required: Vec<String>,
    pub optional: BTreeSet<String>,
    pub strictness: Strictness,
}

impl DocumentSchema {
    pub fn new<R, O, S1, S2>(name: &str, required: R, optional: O, strictness: Strictness) -> Self
    where
        R: IntoIterator<Item = S1>,
        O: IntoIterator<Item = S2>,
        S1: Into<String>,
        S2: Into<String>,
    {
        DocumentSchema {
            name: name.to_string(),
            required: required.into_iter().map(Into::into).collect(),
            optional: optional.into_iter().map(Into::into).collect(),
            strictness,
        }
    }

    /// Last required heading; optional sections belong after it.
    pub fn anchor(&self) -> Option<&str> {
        self.required.last().map(String::as_str)
    }

    pub fn is_required(&self, heading: &str) -> bool {
        self.required.iter().any(|h| h == heading)
    }

    pub fn is_optional(&self, heading: &str) -> bool {
        !self.is_required(heading) && self.optional.contains(heading)
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One heading line as written, with its 1-based line number.
pub struct Heading {
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Headings of one document source, in file order.
pub struct ExtractedStructure {
    pub source_id: String,
    pub headings: Vec<Heading>,
}

impl ExtractedStructure {
    pub fn new(source_id: impl Into<String>, headings: Vec<Heading>) -> Self {
        ExtractedStructure {
            source_id: source_id.into(),
            headings,
        }
    }

    /// Build from bare heading strings; line numbers are positional.
    pub fn from_texts<S: Into<String>>(
        source_id: impl Into<String>,
        texts: impl IntoIterator<Item = S>,
    ) -> Self {
        let headings = texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| Heading {
                text: t.into(),
                line: i + 1,
            })
            .collect();
        Self::new(source_id, headings)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.headings.iter().map(|h| h.text.as_str()).collect()
    }

    /// Index of the first occurrence of `heading`.
    pub fn position(&self, heading: &str) -> Option<usize> {
        self.headings.iter().position(|h| h.text == heading)
    }

    pub fn contains(&self, heading: &str) -> bool {
        self.position(heading).is_some()
    }

    /// Copy of this structure without the listed headings.
    pub fn without(&self, excluded: &[&str]) -> Self {
        ExtractedStructure {
            source_id: self.source_id.clone(),
            headings: self
                .headings
                .iter()
                .filter(|h| !excluded.contains(&h.text.as_str()))
                .cloned()
                .collect(),
        }
    }
}
