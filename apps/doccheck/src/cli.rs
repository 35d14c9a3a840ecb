//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "doccheck",
    version,
    about = "Documentation consistency checks for agent-driven repositories",
    long_about = "doccheck — validate artifact templates, generated artifacts, agent and skill metadata, and editor configuration against one canonical heading registry.\n\nConfiguration precedence: CLI > environment > doccheck.toml > defaults.",
    after_help = "Examples:\n  doccheck artifacts --strictness relaxed\n  doccheck h2-sync --output github\n  doccheck fix-h2 agent-output/demo/04-implementation-plan.md --apply\n  doccheck all --output json --report reports/doccheck.json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Debug, Clone, Default)]
/// Flags shared by every validator.
pub struct Common {
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Output mode: human|json|github (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Also write the JSON report to this path")]
    pub report: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Log progress to stderr")]
    pub verbose: bool,
}

#[derive(Subcommand)]
/// Supported validators.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current doccheck version.")]
    Version,
    /// Validate templates, agent links and generated artifacts
    #[command(
        about = "Validate artifact templates and generated artifacts",
        long_about = "Check every template against the heading registry, verify agents link their templates without embedding skeletons, then validate generated artifacts under the output directory.",
        after_help = "Examples:\n  doccheck artifacts\n  STRICTNESS=relaxed doccheck artifacts --output github"
    )]
    Artifacts {
        #[command(flatten)]
        common: Common,
        #[arg(long, help = "Heading strictness: standard|relaxed")]
        strictness: Option<String>,
    },
    /// Cross-check heading lists across their declarations
    #[command(
        name = "h2-sync",
        about = "Check heading lists agree across sources",
        long_about = "Compare the heading lists declared in the consolidated skill, the heading reference and the built-in registry."
    )]
    H2Sync {
        #[command(flatten)]
        common: Common,
    },
    /// Analyze and optionally fix heading drift in artifacts
    #[command(
        name = "fix-h2",
        about = "Analyze and fix heading drift",
        long_about = "Report missing and extra headings for the given artifacts. Known drifted headings can be renamed in place with --apply.",
        after_help = "Examples:\n  doccheck fix-h2 agent-output/demo/05-implementation-reference.md\n  doccheck fix-h2 agent-output/demo/*.md --check"
    )]
    FixH2 {
        #[command(flatten)]
        common: Common,
        #[arg(required = true, help = "Artifact files to analyze")]
        paths: Vec<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Rewrite fixable headings in place")]
        apply: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero when anything is missing or fixable")]
        check: bool,
    },
    /// Validate agent frontmatter
    #[command(about = "Validate agent definition frontmatter")]
    Agents {
        #[command(flatten)]
        common: Common,
    },
    /// Validate skill directories
    #[command(about = "Validate skill directory format")]
    Skills {
        #[command(flatten)]
        common: Common,
    },
    /// Validate instruction frontmatter
    #[command(about = "Validate instruction file frontmatter")]
    Instructions {
        #[command(flatten)]
        common: Common,
    },
    /// Check docs against the filesystem
    #[command(
        about = "Check documentation freshness",
        long_about = "Compare documented agent and skill counts and tables with the filesystem, and flag references to removed files. Writes freshness-report.json (or --report) when issues exist."
    )]
    Freshness {
        #[command(flatten)]
        common: Common,
    },
    /// Scan for deprecated references
    #[command(name = "deprecated-refs", about = "Scan markdown for references to removed content")]
    DeprecatedRefs {
        #[command(flatten)]
        common: Common,
    },
    /// Check version numbers agree with VERSION.md
    #[command(name = "version-sync", about = "Check versions agree with VERSION.md")]
    VersionSync {
        #[command(flatten)]
        common: Common,
    },
    /// Validate devcontainer, extensions and MCP configuration
    #[command(name = "vscode-config", about = "Validate editor and MCP configuration")]
    VscodeConfig {
        #[command(flatten)]
        common: Common,
    },
    /// Run every validator except fix-h2
    #[command(
        about = "Run every validator",
        long_about = "Run all validators except fix-h2 and print one combined report."
    )]
    All {
        #[command(flatten)]
        common: Common,
        #[arg(long, help = "Heading strictness: standard|relaxed")]
        strictness: Option<String>,
    },
}

impl Commands {
    /// Shared flags, absent only for `version`.
    pub fn common(&self) -> Option<&Common> {
        match self {
            Commands::Version => None,
            Commands::Artifacts { common, .. }
            | Commands::H2Sync { common }
            | Commands::FixH2 { common, .. }
            | Commands::Agents { common }
            | Commands::Skills { common }
            | Commands::Instructions { common }
            | Commands::Freshness { common }
            | Commands::DeprecatedRefs { common }
            | Commands::VersionSync { common }
            | Commands::VscodeConfig { common }
            | Commands::All { common, .. } => Some(common),
        }
    }

    /// The `--strictness` flag where the command accepts one.
    pub fn strictness(&self) -> Option<&str> {
        match self {
            Commands::Artifacts { strictness, .. } | Commands::All { strictness, .. } => {
                strictness.as_deref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fix_h2_flags() {
        let cli = Cli::try_parse_from([
            "doccheck",
            "fix-h2",
            "a.md",
            "b.md",
            "--apply",
            "--output",
            "json",
        ])
        .unwrap();
        match &cli.cmd {
            Commands::FixH2 {
                paths,
                apply,
                check,
                ..
            } => {
                assert_eq!(paths, &vec!["a.md".to_string(), "b.md".to_string()]);
                assert!(*apply);
                assert!(!*check);
            }
            _ => panic!("expected fix-h2"),
        }
        assert_eq!(cli.cmd.common().unwrap().output.as_deref(), Some("json"));
    }

    #[test]
    fn test_strictness_only_on_artifacts_and_all() {
        let cli = Cli::try_parse_from(["doccheck", "all", "--strictness", "relaxed"]).unwrap();
        assert_eq!(cli.cmd.strictness(), Some("relaxed"));
        assert!(Cli::try_parse_from(["doccheck", "agents", "--strictness", "relaxed"]).is_err());
        let cli = Cli::try_parse_from(["doccheck", "h2-sync", "--verbose"]).unwrap();
        assert!(cli.cmd.common().unwrap().verbose);
    }
}
