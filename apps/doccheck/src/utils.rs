//! Small helpers shared by the validators and the binary.

use crate::error::{Error, Result};
use crate::models::{Finding, FindingKind, Findings};
use owo_colors::OwoColorize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// `path` relative to `base` with forward slashes, falling back to `path` itself.
pub fn rel_path(base: &Path, path: &Path) -> String {
    let rel = pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf());
    slash(&rel)
}

/// Display form of a path with `/` separators.
pub fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Read a file that must exist for the run to make sense.
pub fn read_required(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::MissingSource {
            path: path.to_path_buf(),
        });
    }
    read_lossy(path).map_err(|e| Error::read(path, e))
}

/// File contents with invalid UTF-8 sequences replaced by U+FFFD.
pub fn read_lossy(path: &Path) -> io::Result<String> {
    fs::read(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

pub const RULE_UNREADABLE: &str = "unreadable-file";

/// Read a document under `root`.
///
/// An I/O failure is recorded as a warning against the file's
/// repo-relative path and yields `None`.
pub fn read_text(root: &Path, path: &Path, findings: &mut Findings) -> Option<String> {
    match read_lossy(path) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable file");
            findings.push(Finding::warning(
                FindingKind::MissingInputFile,
                RULE_UNREADABLE,
                rel_path(root, path),
                format!("could not read file: {}", e),
            ));
            None
        }
    }
}

/// Files under `dir` matching the glob `pattern`, sorted for stable output.
///
/// `dir` is matched literally, so metacharacters in checkout paths are safe.
pub fn glob_files(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let base = glob::Pattern::escape(&slash(dir));
    let pattern = format!("{}/{}", base.trim_end_matches('/'), pattern);
    let mut out: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.flatten().filter(|p| p.is_file()).collect(),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "bad glob pattern");
            Vec::new()
        }
    };
    out.sort();
    out
}

/// Immediate subdirectories of `dir`, sorted by name.
pub fn subdirs(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect()
        })
        .unwrap_or_default();
    out.sort();
    out
}

/// 1-based line of the first line containing `needle`.
pub fn line_of(text: &str, needle: &str) -> Option<usize> {
    text.lines().position(|l| l.contains(needle)).map(|i| i + 1)
}
