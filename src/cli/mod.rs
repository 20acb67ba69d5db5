//! CLI module for the goldrun harness
//!
//! ## Commands
//!
//! - `run` - Build the programs under test, drive their sessions, validate transcripts
//! - `fixture <path> --bytes N` - Write a random input file
//! - `check-sorted <path>` - Check a little-endian `i32` file is non-decreasing
//! - `normalize [file]` - Print the normalized form of a captured transcript
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::version::GOLDRUN_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Render a diagnostic as a miette report.
    pub fn diagnostic(err: impl miette::Diagnostic + Send + Sync + 'static) -> Self {
        Self::failure(format!("{:?}", miette::Report::new(err)))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Golden-transcript test harness for interactive programs
#[derive(Parser, Debug)]
#[command(name = "goldrun")]
#[command(version = GOLDRUN_VERSION)]
#[command(about = "Build programs, drive scripted sessions, and compare against golden transcripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build every program and run the suite
    Run(RunArgs),

    /// Write a file of random bytes (sorting benchmark input)
    Fixture {
        /// File to create or overwrite
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Number of bytes to write
        #[arg(long, value_name = "N")]
        bytes: u64,
    },

    /// Check that a binary file of little-endian i32 values is sorted
    CheckSorted {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Normalize a captured transcript (stdin when FILE is omitted)
    Normalize {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
        /// Root directory to hide behind the path placeholder (default: current directory)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
    },
}

/// Options of `goldrun run`. Flags override the manifest's `settings`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Suite manifest (default: goldrun.json in the root, else the built-in shell suite)
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Harness root: child working directory and the path hidden by normalization
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Compiler command
    #[arg(long, value_name = "CMD")]
    pub compiler: Option<String>,

    /// Extra argument passed to the compiler before `-o` (repeatable)
    #[arg(long = "compiler-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub compiler_args: Vec<String>,

    /// Pause after each scripted input line, in milliseconds
    #[arg(long, value_name = "N")]
    pub line_delay_ms: Option<u64>,

    /// Wall-clock limit per session, in seconds
    #[arg(long, value_name = "N", conflicts_with = "no_timeout")]
    pub timeout_secs: Option<u64>,

    /// Let sessions run without a time limit
    #[arg(long)]
    pub no_timeout: bool,

    /// Number of sessions to run concurrently
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Report golden mismatches and keep going instead of stopping at the first
    #[arg(long)]
    pub keep_going: bool,

    /// Keep going when a build fails; cases that need it are skipped
    #[arg(long)]
    pub keep_going_builds: bool,

    /// Stop the run when a program exits with a non-zero status
    #[arg(long)]
    pub abort_on_exit_status: bool,

    /// Show build paths, timings and diffs
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run(args) => commands::run_harness(&args),
        Command::Fixture { path, bytes } => commands::write_fixture(&path, bytes),
        Command::CheckSorted { path } => commands::check_sorted(&path),
        Command::Normalize { file, root } => commands::normalize_file(file.as_deref(), root.as_deref()),
    }
}

// ============================================================================
// Tests
// ============================================================================
