//! Containment heuristic for heading skeletons copied into fenced examples.
//!
//! This is deliberately separate from the comparator. It answers "does this
//! fenced block look like a pasted document skeleton", which is a guess based
//! on how many known headings a single block mentions. Partial examples below
//! the threshold go unnoticed.

use crate::extract::{fenced_blocks, FencedBlock};

/// Known headings one fenced block must mention before it counts as a skeleton.
pub const SKELETON_THRESHOLD: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A fenced block that appears to embed a schema's headings.
pub struct EmbeddedSkeleton {
    pub open_line: usize,
    pub matched: usize,
}

/// Headings from `required` mentioned anywhere inside `block`.
pub fn matched_headings<'a>(block: &FencedBlock, required: &'a [String]) -> Vec<&'a str> {
    required
        .iter()
        .filter(|h| block.content.contains(h.as_str()))
        .map(String::as_str)
        .collect()
}

/// First fenced block in `text` that mentions at least the threshold of `required`.
pub fn find_embedded(text: &str, required: &[String]) -> Option<EmbeddedSkeleton> {
    fenced_blocks(text).iter().find_map(|block| {
        let matched = matched_headings(block, required).len();
        (matched >= SKELETON_THRESHOLD).then_some(EmbeddedSkeleton {
            open_line: block.open_line,
            matched,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> Vec<String> {
        ["## Overview", "## Tasks", "## Phases", "## Approval Gate"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_three_headings_in_one_block_is_a_skeleton() {
        let text = "intro\n```markdown\n## Overview\n## Tasks\n## Approval Gate\n```\n";
        assert_eq!(
            find_embedded(text, &req()),
            Some(EmbeddedSkeleton {
                open_line: 2,
                matched: 3
            })
        );
    }

    #[test]
    fn test_below_threshold_or_split_blocks_pass() {
        let text = "```\n## Overview\n## Tasks\n```\n```\n## Phases\n```\n";
        assert_eq!(find_embedded(text, &req()), None);
    }

    #[test]
    fn test_headings_outside_fences_do_not_count() {
        let text = "## Overview\n## Tasks\n## Phases\n## Approval Gate\n";
        assert_eq!(find_embedded(text, &req()), None);
    }
}
