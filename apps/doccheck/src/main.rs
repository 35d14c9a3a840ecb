//! doccheck CLI binary entry point.
//! Resolves configuration, runs the selected checks and prints the report.

use clap::Parser;
use doccheck::cli::{Cli, Commands};
use doccheck::config::{self, Effective};
use doccheck::run::{self, Check};
use doccheck::{logging, output, utils};

fn main() {
    let cli = Cli::parse();
    let Some(common) = cli.cmd.common().cloned() else {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return;
    };
    logging::init(common.verbose);

    let eff = match config::resolve_effective(
        common.repo_root.as_deref(),
        common.output.as_deref(),
        cli.cmd.strictness(),
        common.report.as_deref(),
    ) {
        Ok(eff) => eff,
        Err(e) => fail(&e),
    };
    if !eff.config_found {
        tracing::debug!("no doccheck config found; using defaults");
    }

    if let Some(check) = check_of(cli.cmd) {
        std::process::exit(execute(&check, &eff));
    }
}

fn check_of(cmd: Commands) -> Option<Check> {
    let check = match cmd {
        Commands::Version => return None,
        Commands::Artifacts { .. } => Check::Artifacts,
        Commands::H2Sync { .. } => Check::H2Sync,
        Commands::FixH2 {
            paths, apply, check, ..
        } => Check::FixH2 {
            paths,
            apply,
            check,
        },
        Commands::Agents { .. } => Check::Agents,
        Commands::Skills { .. } => Check::Skills,
        Commands::Instructions { .. } => Check::Instructions,
        Commands::Freshness { .. } => Check::Freshness,
        Commands::DeprecatedRefs { .. } => Check::DeprecatedRefs,
        Commands::VersionSync { .. } => Check::VersionSync,
        Commands::VscodeConfig { .. } => Check::VscodeConfig,
        Commands::All { .. } => Check::All,
    };
    Some(check)
}

/// Run, print, write the report; returns the process exit code.
fn execute(check: &Check, eff: &Effective) -> i32 {
    let report = match run::run_check(check, eff) {
        Ok(r) => r,
        Err(e) => fail(&e),
    };
    if let Err(e) = output::print_report(&report, eff.output) {
        fail(&e);
    }
    if let Some(path) = run::report_path(check, eff, &report) {
        if let Err(e) = output::write_report(&path, &report) {
            fail(&e);
        }
        eprintln!(
            "{} report written to {}",
            utils::note_prefix(),
            utils::rel_path(&eff.repo_root, &path)
        );
    }
    report.status().exit_code()
}

fn fail(e: &doccheck::error::Error) -> ! {
    eprintln!("{} {}", utils::error_prefix(), e);
    std::process::exit(1);
}
