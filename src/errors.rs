//! Run-level error taxonomy
//!
//! Component errors (`BuildError`, `SessionError`, `ArtifactReadError`, `SuiteError`) convert into
//! [`HarnessError`] with `?`. The remaining variants are raised by the runner when a failure policy
//! says to abort. Every variant carries enough context to diagnose without rerunning.

use std::io;
use std::path::PathBuf;

use goldrun_core::OrderViolation;
use miette::Diagnostic;
use thiserror::Error;

use crate::artifact::ArtifactReadError;
use crate::builder::BuildError;
use crate::session::SessionError;
use crate::suite::SuiteError;
use crate::validator::Mismatch;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Suite(#[from] SuiteError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Artifact(#[from] ArtifactReadError),

    #[error("{label} exited with status {status}\ninput data: {input}\n{stderr}")]
    #[diagnostic(code(goldrun::runtime::exit_status))]
    RuntimeFailure {
        label: String,
        input: String,
        status: i32,
        stderr: String,
    },

    #[error("test {} output does not match its golden transcript", .0.case_index)]
    #[diagnostic(code(goldrun::validate::mismatch), help("run `goldrun normalize` on the captured output to refresh the golden transcript"))]
    Mismatch(Box<Mismatch>),

    #[error(
        "artifact `{}` is not sorted: element {} ({}) follows a larger element ({})",
        .path.display(), .violation.index, .violation.current, .violation.previous
    )]
    #[diagnostic(code(goldrun::validate::unsorted), help("the benchmarked sort routine produced out-of-order output"))]
    InvariantViolation { path: PathBuf, violation: OrderViolation },

    #[error("cannot write fixture `{}`", .path.display())]
    #[diagnostic(code(goldrun::fixture::write))]
    Fixture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot remove stale artifact `{}`", .path.display())]
    #[diagnostic(code(goldrun::artifact::stale), help("the output of an earlier run must be removable before the program runs again"))]
    StaleArtifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("harness root `{}` is not accessible", .path.display())]
    #[diagnostic(code(goldrun::root))]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start the async runtime")]
    #[diagnostic(code(goldrun::runtime::start))]
    AsyncRuntime(#[source] io::Error),

    #[error("background task failed: {0}")]
    #[diagnostic(code(goldrun::runtime::task))]
    Task(String),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

impl From<tokio::task::JoinError> for HarnessError {
    fn from(err: tokio::task::JoinError) -> Self {
        HarnessError::Task(err.to_string())
    }
}
