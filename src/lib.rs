#![forbid(unsafe_code)]
//! goldrun - golden-transcript test harness for interactive programs
//!
//! goldrun builds programs with an external toolchain, drives each one through a scripted
//! stdin session, normalizes what it printed, and compares the result with a golden transcript.
//! Programs that write binary output (the sorting benchmarks) are checked structurally instead:
//! the output file must hold a non-decreasing sequence of little-endian `i32` values.
//!
//! ## Layout
//!
//! - [`builder`] - toolchain invocation
//! - [`session`] - scripted stdin/stdout sessions with a per-line pause and a wall-clock timeout
//! - [`validator`] - exact comparison against golden transcripts
//! - [`artifact`], [`fixture`] - binary artifact reading and random input generation
//! - [`suite`], [`config`], [`context`] - what to run and how
//! - [`runner`] - orchestration and reporting
//! - [`cli`] - the `goldrun` command line
//!
//! Normalization, the artifact codec and the ordering invariant are IO-free and live in
//! `goldrun_core`.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `runner` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a harness bug (logic error), use `.expect("INVARIANT: reason")` with a
//!   clear explanation.

pub mod artifact;
pub mod builder;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod fixture;
pub mod runner;
pub mod session;
pub mod suite;
pub mod validator;
pub mod version;

pub use builder::{BuildError, BuildSpec, Builder};
pub use config::{FailurePolicy, HarnessConfig, Policies};
pub use context::RunContext;
pub use errors::{HarnessError, HarnessResult};
pub use runner::{ConsoleReporter, RunReporter, RunSummary, run_suite, run_suite_async};
pub use session::{CapturedTranscript, SessionDriver, SessionError};
pub use suite::{Expected, Suite, SuiteManifest, TestCase};
pub use validator::{Mismatch, Verdict, validate};

pub use goldrun_core::{Normalizer, OrderViolation, is_sorted, normalize_transcript};
