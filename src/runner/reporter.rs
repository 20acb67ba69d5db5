//! Run reporting
//!
//! The runner talks to a [`RunReporter`] instead of printing directly, so alternative output
//! formats (JSON, TAP, CI annotations) only need a new implementation of the trait.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use goldrun_core::OrderViolation;

use crate::builder::{BuildError, BuildSpec};
use crate::validator::Mismatch;

/// Identifies a unit of work in reports. Indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseLabel {
    Transcript(usize),
    Artifact(usize),
}

impl fmt::Display for CaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseLabel::Transcript(i) => write!(f, "Test {i}"),
            CaseLabel::Artifact(i) => write!(f, "Artifact check {i}"),
        }
    }
}

/// Why a case failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDetail {
    Mismatch(Mismatch),
    Unsorted { path: PathBuf, violation: OrderViolation },
}

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    /// Ran to completion; no golden value to compare against.
    Unchecked,
    Failed(FailureDetail),
    /// Could not be run or exited non-zero.
    Errored(String),
    /// Not run because an executable it needs failed to build.
    Skipped(String),
}

/// Counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub unchecked: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub builds_failed: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &CaseOutcome) {
        match outcome {
            CaseOutcome::Passed => self.passed += 1,
            CaseOutcome::Unchecked => self.unchecked += 1,
            CaseOutcome::Failed(_) => self.failed += 1,
            CaseOutcome::Errored(_) => self.errored += 1,
            CaseOutcome::Skipped(_) => self.skipped += 1,
        }
    }

    /// Nothing failed, errored, or failed to build.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0 && self.builds_failed == 0
    }

    /// Human summary, e.g. `2 passed, 1 failed`.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = [
            (self.passed, "passed"),
            (self.unchecked, "unchecked"),
            (self.failed, "failed"),
            (self.errored, "errored"),
            (self.skipped, "skipped"),
            (self.builds_failed, "build(s) failed"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, what)| format!("{n} {what}"))
        .collect();

        if parts.is_empty() {
            "no tests ran".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Trait for reporting run progress and results.
pub trait RunReporter {
    /// Called before the toolchain is invoked.
    fn on_build_start(&mut self, _spec: &BuildSpec, _command_line: &str) {}

    /// Called when a build completes, successfully or not.
    fn on_build_complete(&mut self, spec: &BuildSpec, result: &Result<PathBuf, BuildError>);

    /// Called when a case completes.
    fn on_case_complete(&mut self, label: CaseLabel, outcome: &CaseOutcome, duration: Duration);

    /// Called once after the last case (not called when the run aborts).
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// Reporter that prints to a terminal (or any writer).
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    verbose: bool,
    color: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn new(verbose: bool) -> Self {
        Self {
            out: io::stdout(),
            verbose,
            color: true,
        }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W, verbose: bool, color: bool) -> Self {
        Self { out, verbose, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    // Write errors on the report stream are not actionable; ignore them.
    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> RunReporter for ConsoleReporter<W> {
    fn on_build_start(&mut self, _spec: &BuildSpec, command_line: &str) {
        self.line(command_line);
    }

    fn on_build_complete(&mut self, spec: &BuildSpec, result: &Result<PathBuf, BuildError>) {
        match result {
            Ok(path) => {
                if self.verbose {
                    let text = format!("built {} -> {}", spec.output_name, path.display());
                    self.line(&text);
                }
            }
            Err(BuildError::Failed { diagnostics, .. }) => {
                let header = self.paint("31", "Compilation error:");
                self.line(&header);
                self.line(diagnostics.trim_end());
            }
            Err(other) => {
                let text = self.paint("31", &format!("Build of {} failed: {other}", spec.output_name));
                self.line(&text);
            }
        }
    }

    fn on_case_complete(&mut self, label: CaseLabel, outcome: &CaseOutcome, duration: Duration) {
        let timing = if self.verbose {
            format!(" ({}ms)", duration.as_millis())
        } else {
            String::new()
        };

        match outcome {
            CaseOutcome::Passed => {
                let text = self.paint("32", &format!("{label} passed{timing}"));
                self.line(&text);
            }
            CaseOutcome::Unchecked => {
                let text = format!("{label} ran (no golden transcript){timing}");
                self.line(&text);
            }
            CaseOutcome::Failed(FailureDetail::Mismatch(m)) => {
                let text = self.paint("31", &m.to_string());
                self.line(&text);
                if self.verbose {
                    let diff = m.unified_diff();
                    self.line(diff.trim_end());
                }
            }
            CaseOutcome::Failed(FailureDetail::Unsorted { path, violation }) => {
                let text = self.paint("31", &format!("{label} failed: {}", describe_unsorted(path, violation)));
                self.line(&text);
            }
            CaseOutcome::Errored(message) => {
                let text = self.paint("31", &format!("Error during {label}: {message}"));
                self.line(&text);
            }
            CaseOutcome::Skipped(reason) => {
                let text = self.paint("33", &format!("{label} skipped: {reason}"));
                self.line(&text);
            }
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        let code = if summary.is_success() { "1;32" } else { "1;31" };
        let text = self.paint(
            code,
            &format!(
                "====== {} in {:.2}s ======",
                summary.describe(),
                summary.duration.as_secs_f64()
            ),
        );
        self.line(&text);
    }
}

fn describe_unsorted(path: &Path, violation: &OrderViolation) -> String {
    format!(
        "`{}` is not sorted at element {} ({} < {})",
        path.display(),
        violation.index,
        violation.current,
        violation.previous
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn render(events: impl FnOnce(&mut ConsoleReporter<Vec<u8>>)) -> String {
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), false, false);
        events(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_console_prints_build_command_line() {
        let spec = BuildSpec::new("main.exe", vec![PathBuf::from("main.cpp")]);
        let out = render(|r| r.on_build_start(&spec, "g++ -O2 -o build/main.exe main.cpp"));
        assert_eq!(out, "g++ -O2 -o build/main.exe main.cpp\n");
    }

    #[test]
    fn test_summary_describe() {
        let summary = RunSummary {
            passed: 2,
            failed: 1,
            ..RunSummary::default()
        };
        assert_eq!(summary.describe(), "2 passed, 1 failed");
        assert!(!summary.is_success());
        assert_eq!(RunSummary::default().describe(), "no tests ran");
    }

    #[test]
    fn test_unchecked_is_success() {
        let mut summary = RunSummary::default();
        summary.record(&CaseOutcome::Unchecked);
        summary.record(&CaseOutcome::Passed);
        assert!(summary.is_success());
    }

    #[test]
    fn test_errored_is_not_success() {
        let mut summary = RunSummary::default();
        summary.record(&CaseOutcome::Errored("exit 1".into()));
        assert!(!summary.is_success());
    }

    #[test]
    fn test_console_report() {
        let out = render(|r| {
            r.on_case_complete(CaseLabel::Transcript(1), &CaseOutcome::Passed, Duration::ZERO);
            r.on_case_complete(
                CaseLabel::Artifact(1),
                &CaseOutcome::Failed(FailureDetail::Unsorted {
                    path: PathBuf::from("build/out.bin"),
                    violation: OrderViolation {
                        index: 4,
                        previous: 9,
                        current: 2,
                    },
                }),
                Duration::ZERO,
            );
            r.on_case_complete(
                CaseLabel::Transcript(2),
                &CaseOutcome::Skipped("build of main.exe failed".into()),
                Duration::ZERO,
            );
            r.on_run_complete(&RunSummary {
                passed: 1,
                failed: 1,
                skipped: 1,
                ..RunSummary::default()
            });
        });
        insta::assert_snapshot!(out, @r"
        Test 1 passed
        Artifact check 1 failed: `build/out.bin` is not sorted at element 4 (2 < 9)
        Test 2 skipped: build of main.exe failed
        ====== 1 passed, 1 failed, 1 skipped in 0.00s ======
        ");
    }
}
