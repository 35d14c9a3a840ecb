//! Line-oriented text extractors for headings, fenced blocks, and frontmatter.
//!
//! None of these is a markdown or YAML parser. They walk the document line by
//! line with a small state machine and degrade to partial results on
//! malformed input instead of failing:
//! - Headings are lines starting with `## ` (after trimming trailing
//!   whitespace), kept verbatim, including inside fences.
//! - Fenced blocks open on a line of three or more backticks with an optional
//!   info string, and close on the next line starting with the same run.
//!   Unterminated blocks are dropped.
//! - Frontmatter is the first `---` delimited region at the very top of the
//!   document, holding `key: value`, inline arrays, block arrays, and `>`/`|`
//!   block scalars.

use crate::models::schema::Heading;

const H2_MARKER: &str = "## ";
const FRONTMATTER_DELIMITER: &str = "---";

/// Every level-2 heading line in file order, fences included.
pub fn headings(text: &str) -> Vec<Heading> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| heading_of(line, i + 1))
        .collect()
}

/// Heading strings only, in file order.
pub fn heading_texts(text: &str) -> Vec<String> {
    headings(text).into_iter().map(|h| h.text).collect()
}

/// Level-2 headings that are not inside a terminated fenced block.
pub fn headings_outside_fences(text: &str) -> Vec<Heading> {
    let blocks = fenced_blocks(text);
    headings(text)
        .into_iter()
        .filter(|h| !blocks.iter().any(|b| b.spans(h.line)))
        .collect()
}

fn heading_of(line: &str, line_no: usize) -> Option<Heading> {
    let trimmed = line.trim_end();
    trimmed.starts_with(H2_MARKER).then(|| Heading {
        text: trimmed.to_string(),
        line: line_no,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Content of one terminated fenced block.
pub struct FencedBlock {
    /// Info string after the backticks (e.g. `markdown`), possibly empty.
    pub info: String,
    /// Line number of the opening fence.
    pub open_line: usize,
    /// Line number of the closing fence.
    pub close_line: usize,
    /// Lines strictly between the fences joined with `\n`.
    pub content: String,
}

impl FencedBlock {
    /// Whether `line` falls on the fences or between them.
    pub fn spans(&self, line: usize) -> bool {
        line >= self.open_line && line <= self.close_line
    }
}

enum FenceState<'a> {
    Outside,
    InFence {
        fence: &'a str,
        info: &'a str,
        open_line: usize,
        lines: Vec<&'a str>,
    },
}

/// Terminated fenced blocks in file order.
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock> {
    let mut blocks = Vec::new();
    let mut state = FenceState::Outside;
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        state = match state {
            FenceState::Outside => match fence_open(line) {
                Some((fence, info)) => FenceState::InFence {
                    fence,
                    info,
                    open_line: line_no,
                    lines: Vec::new(),
                },
                None => FenceState::Outside,
            },
            FenceState::InFence {
                fence,
                info,
                open_line,
                mut lines,
            } => {
                if line.starts_with(fence) {
                    blocks.push(FencedBlock {
                        info: info.trim().to_string(),
                        open_line,
                        close_line: line_no,
                        content: lines.join("\n"),
                    });
                    FenceState::Outside
                } else {
                    lines.push(line);
                    FenceState::InFence {
                        fence,
                        info,
                        open_line,
                        lines,
                    }
                }
            }
        };
    }
    blocks
}

/// Split an opening fence line into its backtick run and info string.
fn fence_open(line: &str) -> Option<(&str, &str)> {
    let ticks = line.bytes().take_while(|b| *b == b'`').count();
    if ticks < 3 {
        return None;
    }
    let (fence, info) = line.split_at(ticks);
    if info.contains('`') {
        return None;
    }
    Some((fence, info))
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A frontmatter value: a scalar string or a list of strings.
pub enum FmValue {
    Scalar(String),
    List(Vec<String>),
}

impl FmValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FmValue::Scalar(s) => Some(s.as_str()),
            FmValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FmValue::List(items) => Some(items.as_slice()),
            FmValue::Scalar(_) => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FmValue::List(_))
    }

    /// Scalars are empty when blank; lists when they have no items.
    pub fn is_empty(&self) -> bool {
        match self {
            FmValue::Scalar(s) => s.trim().is_empty(),
            FmValue::List(items) => items.is_empty(),
        }
    }
}

impl std::fmt::Display for FmValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FmValue::Scalar(s) => f.write_str(s),
            FmValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Parsed frontmatter keys in declaration order, plus each key's raw lines.
pub struct Frontmatter {
    entries: Vec<(String, FmValue)>,
    raw: Vec<(String, Vec<String>)>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&FmValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source lines belonging to `key`, its own line included.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.raw
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, lines)| lines.join("\n"))
    }

    fn set(&mut self, key: String, value: FmValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    fn begin_raw(&mut self, key: &str, line: &str) {
        self.raw.retain(|(k, _)| k != key);
        self.raw.push((key.to_string(), vec![line.to_string()]));
    }

    fn append_raw(&mut self, line: &str) {
        if let Some((_, lines)) = self.raw.last_mut() {
            lines.push(line.to_string());
        }
    }
}

enum FmState {
    InFrontmatter,
    InBlockArray {
        key: String,
        items: Vec<String>,
        saw_item: bool,
    },
    InFlowArray {
        key: String,
        items: Vec<String>,
    },
    InBlockScalar {
        key: String,
        parts: Vec<String>,
    },
}

/// Parse the leading frontmatter region; `None` when the document has none.
pub fn frontmatter(text: &str) -> Option<Frontmatter> {
    let body = frontmatter_region(text)?;
    let mut fm = Frontmatter::default();
    let mut state = FmState::InFrontmatter;

    for line in body {
        let (next, consumed) = continue_block(&mut fm, state, line);
        state = next;
        if consumed {
            continue;
        }
        let Some((key, value)) = split_key(line) else {
            continue;
        };
        fm.begin_raw(key, line);
        let key = key.to_string();
        state = if matches!(value, ">" | "|" | ">-" | "|-" | ">+" | "|+") {
            FmState::InBlockScalar {
                key,
                parts: Vec::new(),
            }
        } else if value.starts_with('[') {
            let items = inline_items(value);
            if value.contains(']') {
                fm.set(key, FmValue::List(items));
                FmState::InFrontmatter
            } else {
                FmState::InFlowArray { key, items }
            }
        } else if value.is_empty() {
            FmState::InBlockArray {
                key,
                items: Vec::new(),
                saw_item: false,
            }
        } else {
            fm.set(key, FmValue::Scalar(unquote(value).to_string()));
            FmState::InFrontmatter
        };
    }

    match state {
        FmState::InFrontmatter => {}
        FmState::InBlockScalar { key, parts } => fm.set(key, FmValue::Scalar(parts.join(" "))),
        FmState::InBlockArray {
            key,
            items,
            saw_item,
        } => fm.set(key, block_array_value(items, saw_item)),
        FmState::InFlowArray { key, items } => fm.set(key, FmValue::List(items)),
    }
    Some(fm)
}

/// Feed `line` to an open block; returns whether the block consumed it.
fn continue_block(fm: &mut Frontmatter, state: FmState, line: &str) -> (FmState, bool) {
    match state {
        FmState::InFrontmatter => (FmState::InFrontmatter, false),
        FmState::InBlockScalar { key, mut parts } => {
            if line.trim().is_empty() || line.starts_with(char::is_whitespace) {
                let part = line.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                fm.append_raw(line);
                (FmState::InBlockScalar { key, parts }, true)
            } else {
                fm.set(key, FmValue::Scalar(parts.join(" ")));
                (FmState::InFrontmatter, false)
            }
        }
        FmState::InBlockArray {
            key,
            mut items,
            saw_item,
        } => {
            let trimmed = line.trim();
            if trimmed.starts_with('-') {
                let item = unquote(trimmed.trim_start_matches('-').trim());
                if !item.is_empty() {
                    items.push(item.to_string());
                }
                fm.append_raw(line);
                let state = FmState::InBlockArray {
                    key,
                    items,
                    saw_item: true,
                };
                (state, true)
            } else if trimmed.is_empty() || line.starts_with(char::is_whitespace) {
                // nested mapping lines under a list item
                fm.append_raw(line);
                let state = FmState::InBlockArray {
                    key,
                    items,
                    saw_item,
                };
                (state, true)
            } else {
                fm.set(key, block_array_value(items, saw_item));
                (FmState::InFrontmatter, false)
            }
        }
        FmState::InFlowArray { key, mut items } => {
            if split_key(line).is_some() {
                // unterminated `[`: the next key closes it
                fm.set(key, FmValue::List(items));
                return (FmState::InFrontmatter, false);
            }
            fm.append_raw(line);
            items.extend(inline_items(line));
            if line.contains(']') {
                fm.set(key, FmValue::List(items));
                (FmState::InFrontmatter, true)
            } else {
                (FmState::InFlowArray { key, items }, true)
            }
        }
    }
}

fn block_array_value(items: Vec<String>, saw_item: bool) -> FmValue {
    if saw_item {
        FmValue::List(items)
    } else {
        FmValue::Scalar(String::new())
    }
}

/// Lines between the opening and closing `---`, or `None`.
fn frontmatter_region(text: &str) -> Option<Vec<&str>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines();
    if lines.next()?.trim_end() != FRONTMATTER_DELIMITER {
        return None;
    }
    let mut body = Vec::new();
    for line in lines {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            return Some(body);
        }
        body.push(line);
    }
    None
}

/// `key: value` at column zero; keys are letters, digits, `_` and `-`.
fn split_key(line: &str) -> Option<(&str, &str)> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    let mut chars = key.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return None;
    }
    Some((key, value.trim()))
}

fn inline_items(value: &str) -> Vec<String> {
    value
        .replace(['[', ']'], "")
        .split(',')
        .map(|v| unquote(v.trim()).to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn unquote(value: &str) -> &str {
    let value = value
        .strip_prefix('"')
        .or_else(|| value.strip_prefix('\''))
        .unwrap_or(value);
    value
        .strip_suffix('"')
        .or_else(|| value.strip_suffix('\''))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_headings_verbatim_and_trailing_trimmed() {
        let text = "# Title\n## Requirements Validation ✅  \n### Sub\n##NoSpace\n## Budget\r\n";
        assert_eq!(
            heading_texts(text),
            vec!["## Requirements Validation ✅", "## Budget"]
        );
        assert_eq!(headings(text)[1].line, 5);
    }

    #[test]
    fn test_headings_inside_fences_are_reported() {
        let text = "## Real\n```markdown\n## Embedded\n```\n";
        assert_eq!(heading_texts(text), vec!["## Real", "## Embedded"]);
        let outside: Vec<String> = headings_outside_fences(text)
            .into_iter()
            .map(|h| h.text)
            .collect();
        assert_eq!(outside, vec!["## Real"]);
    }

    #[test]
    fn test_fenced_blocks_multiple_and_unterminated() {
        let text = "intro\n```markdown\n## A\n## B\n```\nmid\n````\n```inner\n````\n```\nlost\n";
        let blocks = fenced_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].info, "markdown");
        assert_eq!(blocks[0].content, "## A\n## B");
        assert_eq!(blocks[0].open_line, 2);
        assert_eq!(blocks[0].close_line, 5);
        assert_eq!(blocks[1].content, "```inner");
    }

    #[test]
    fn test_inline_backticks_do_not_open_fence() {
        assert!(fenced_blocks("```code``` inline\n## A\n```\n").is_empty());
    }

    #[test]
    fn test_frontmatter_absent_or_unterminated() {
        assert_eq!(frontmatter("# No frontmatter\n"), None);
        assert_eq!(frontmatter("---\nname: x\n"), None);
        assert_eq!(frontmatter("\n---\nname: x\n---\n"), None);
    }

    #[test]
    fn test_frontmatter_scalars_arrays_and_block_scalars() {
        let text = r#"---
name: "Architect"
description: >
  Designs the solution
  and reviews it.
tools: [read, "edit", search]
agents:
  - planner
  - 'coder'
model:
  - A
  - B
user-invokable: true
applyTo: "**/*.md"
---
# Body
name: ignored
"#;
        let fm = frontmatter(text).unwrap();
        assert_eq!(fm.get("name").and_then(FmValue::as_str), Some("Architect"));
        assert_eq!(
            fm.get("description").and_then(FmValue::as_str),
            Some("Designs the solution and reviews it.")
        );
        assert_eq!(
            fm.get("tools").and_then(FmValue::as_list),
            Some(&["read".to_string(), "edit".to_string(), "search".to_string()][..])
        );
        assert_eq!(
            fm.get("agents").and_then(FmValue::as_list),
            Some(&["planner".to_string(), "coder".to_string()][..])
        );
        assert_eq!(fm.get("user-invokable").and_then(FmValue::as_str), Some("true"));
        assert_eq!(fm.get("applyTo").and_then(FmValue::as_str), Some("**/*.md"));
        assert_eq!(fm.len(), 7);
    }

    #[test]
    fn test_frontmatter_multiline_flow_array_and_empty_key() {
        let text = "---\ntools: [\n  \"a\",\n  \"b\"\n]\nempty:\nname: n\n---\n";
        let fm = frontmatter(text).unwrap();
        assert_eq!(
            fm.get("tools"),
            Some(&FmValue::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(fm.get("empty"), Some(&FmValue::Scalar(String::new())));
        assert_eq!(fm.get("name").and_then(FmValue::as_str), Some("n"));
    }

    #[test]
    fn test_frontmatter_raw_keeps_nested_lines() {
        let text = "---\nhandoffs:\n  - label: Plan\n    agent: planner\n    send: true\nname: x\n---\n";
        let fm = frontmatter(text).unwrap();
        let raw = fm.raw("handoffs").unwrap();
        assert!(raw.contains("label: Plan"));
        assert!(raw.contains("send: true"));
        assert!(!raw.contains("name: x"));
        assert_eq!(fm.get("name").and_then(FmValue::as_str), Some("x"));
    }

    #[test]
    fn test_frontmatter_malformed_lines_degrade() {
        let text = "---\n: nokey\n  stray indent\nvalid: yes\n---\n";
        let fm = frontmatter(text).unwrap();
        assert_eq!(fm.keys().collect::<Vec<_>>(), vec!["valid"]);
    }
}
