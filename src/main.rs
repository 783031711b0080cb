use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use view_lint::config::{Args, LintConfig};
use view_lint::engine::{lint_document, LintResult};
use view_lint::rules::registry::RuleRegistry;

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level.as_str()),
    )
    .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let registry = RuleRegistry::with_builtin_rules();
    let config = if args.config.exists() {
        info!("loading rule configuration from {}", args.config.display());
        LintConfig::load(&args.config)?
    } else {
        info!(
            "no configuration at {}; enabling built-in rules with defaults",
            args.config.display()
        );
        LintConfig::builtin_defaults()
    };

    // Surface activation problems once, up front.
    let (probe, failures) = registry.activate_all(&config.rules);
    for (id, err) in &failures {
        warn!("rule '{id}' not activated: {err}");
    }
    if probe.is_empty() {
        bail!("no rules could be activated from {}", args.config.display());
    }
    drop(probe);

    let mut clean = true;
    let mut total_errors = 0usize;
    let mut total_warnings = 0usize;
    let mut failed_files = 0usize;

    for file in &args.files {
        // Rule instances carry per-document state; activate fresh ones for
        // every file.
        let (rules, _) = registry.activate_all(&config.rules);
        match lint_file(file, args, rules) {
            Ok(result) => {
                print_file_result(file, &result, args.verbose);
                total_errors += result.error_count();
                total_warnings += result.warning_count();
                if result.has_errors() {
                    clean = false;
                }
            }
            Err(err) => {
                eprintln!("{}: {err:#}", file.display());
                failed_files += 1;
                clean = false;
            }
        }
    }

    println!(
        "\n{} file(s) checked: {} error(s), {} warning(s), {} file(s) failed",
        args.files.len(),
        total_errors,
        total_warnings,
        failed_files
    );
    Ok(clean)
}

fn lint_file(
    path: &Path,
    args: &Args,
    rules: Vec<view_lint::ConfiguredRule>,
) -> Result<LintResult> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    lint_document(&document, rules, args.strict)
        .with_context(|| format!("cannot lint {}", path.display()))
}

fn print_file_result(path: &Path, result: &LintResult, verbose: bool) {
    if result.is_empty() {
        if verbose {
            println!("{}: clean", path.display());
        }
        return;
    }
    println!(
        "{}: {} error(s), {} warning(s)",
        path.display(),
        result.error_count(),
        result.warning_count()
    );
    for finding in result.findings() {
        println!("  {finding}");
    }
}
