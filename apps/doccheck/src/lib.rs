//! doccheck core library.
//!
//! This crate exposes programmatic APIs for checking that the documentation of
//! an agent-driven repository stays consistent with itself: templates and
//! generated artifacts against one heading registry, heading lists across
//! their declarations, and agent, skill and editor metadata.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `extract`: Heading, fenced block and frontmatter extraction from text.
//! - `registry`: Built-in artifact types with their heading schemas.
//! - `compare`: Structural comparison of headings against a schema.
//! - `sync`: Cross-source heading list comparison.
//! - `artifacts`, `fix`, `agents`, `skills`, `instructions`, `freshness`,
//!   `refs`, `version`, `vscode`: the individual validators.
//! - `run`: Dispatch from a selected check to its validators.
//! - `models`: Findings, reports, and schema data types.
//! - `output`: Human/JSON/GitHub printers and report files.
//! - `utils`: Supporting helpers.
pub mod agents;
pub mod artifacts;
pub mod checks;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod extract;
pub mod fix;
pub mod freshness;
pub mod instructions;
pub mod logging;
pub mod models;
pub mod output;
pub mod refs;
pub mod registry;
pub mod run;
pub mod skeleton;
pub mod skills;
pub mod sync;
pub mod utils;
pub mod version;
pub mod vscode;
