//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use goldrun_core::{first_order_violation, normalize_transcript};

use crate::artifact::read_integers;
use crate::config::{FailurePolicy, HarnessConfig, Settings};
use crate::context::{RunContext, canonical_root};
use crate::errors::HarnessError;
use crate::fixture::write_random_file;
use crate::runner::{ConsoleReporter, run_suite};
use crate::suite::{MANIFEST_FILE, Suite, SuiteManifest};

use super::{CliError, CliResult, ExitCode, RunArgs};

// ============================================================================
// run
// ============================================================================

/// Build, drive and validate the whole suite.
///
/// ## Notes
///
/// Configuration is layered: defaults, then the manifest's `settings`, then command-line flags.
pub fn run_harness(args: &RunArgs) -> CliResult<ExitCode> {
    let root = canonical_root(&args.root).map_err(CliError::diagnostic)?;
    let manifest = load_manifest(args.manifest.as_deref(), &root)?;

    let mut config = HarnessConfig::default();
    config.apply(&manifest.settings);
    apply_overrides(&mut config, args);

    let suite = Suite::from_manifest(manifest, &root).map_err(CliError::diagnostic)?;
    if suite.is_empty() {
        tracing::warn!("suite is empty; nothing to build or run");
    }

    let ctx = RunContext::new(&root, config, suite).map_err(CliError::diagnostic)?;
    let mut reporter = ConsoleReporter::new(args.verbose);
    let summary = run_suite(&ctx, &mut reporter).map_err(CliError::diagnostic)?;

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Explicit manifest, else `goldrun.json` in the root, else the built-in shell suite.
fn load_manifest(explicit: Option<&Path>, root: &Path) -> CliResult<SuiteManifest> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = root.join(MANIFEST_FILE);
            if !default.is_file() {
                tracing::info!("no {MANIFEST_FILE} in {}; using the built-in shell suite", root.display());
                return Ok(SuiteManifest::shell_benchmarks());
            }
            default
        }
    };
    tracing::info!(manifest = %path.display(), "loading suite");
    SuiteManifest::load(&path).map_err(CliError::diagnostic)
}

/// Layer command-line flags over the configuration.
fn apply_overrides(config: &mut HarnessConfig, args: &RunArgs) {
    let timeout_secs = if args.no_timeout { Some(0) } else { args.timeout_secs };
    config.apply(&Settings {
        compiler: args.compiler.clone(),
        compiler_args: (!args.compiler_args.is_empty()).then(|| args.compiler_args.clone()),
        build_dir: None,
        line_delay_ms: args.line_delay_ms,
        timeout_secs,
        jobs: args.jobs,
        policies: None,
    });

    if args.keep_going {
        config.policies.mismatch = FailurePolicy::RecordAndContinue;
    }
    if args.keep_going_builds {
        config.policies.build = FailurePolicy::RecordAndContinue;
    }
    if args.abort_on_exit_status {
        config.policies.runtime = FailurePolicy::AbortRun;
    }
}

// ============================================================================
// fixture / check-sorted
// ============================================================================

pub fn write_fixture(path: &Path, bytes: u64) -> CliResult<ExitCode> {
    write_random_file(path, bytes)
        .map_err(|e| CliError::failure(format!("Error writing fixture {}: {}", path.display(), e)))?;
    println!("wrote {bytes} random bytes to {}", path.display());
    Ok(ExitCode::SUCCESS)
}

pub fn check_sorted(path: &Path) -> CliResult<ExitCode> {
    let values = read_integers(path).map_err(CliError::diagnostic)?;
    match first_order_violation(&values) {
        None => {
            println!("{} is sorted ({} values)", path.display(), values.len());
            Ok(ExitCode::SUCCESS)
        }
        Some(violation) => Err(CliError::diagnostic(HarnessError::InvariantViolation {
            path: path.to_path_buf(),
            violation,
        })),
    }
}

// ============================================================================
// normalize
// ============================================================================

/// Print the normalized transcript read from `file` (or stdin).
///
/// The root defaults to the current directory, which is where `goldrun run` starts its children
/// when invoked without `--root`.
pub fn normalize_file(file: Option<&Path>, root: Option<&Path>) -> CliResult<ExitCode> {
    let raw = match file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| CliError::failure(format!("Error reading {}: {}", path.display(), e)))?,
        None => io::read_to_string(io::stdin())
            .map_err(|e| CliError::failure(format!("Error reading stdin: {}", e)))?,
    };

    let root = match root {
        Some(root) => root.to_path_buf(),
        None => env::current_dir().map_err(|e| CliError::failure(format!("Error reading current directory: {}", e)))?,
    };
    let root: PathBuf = canonical_root(&root).map_err(CliError::diagnostic)?;

    print!("{}", normalize_transcript(&raw, &root.to_string_lossy()));
    Ok(ExitCode::SUCCESS)
}
