//! Run orchestration
//!
//! Drives one suite through the full pipeline:
//!
//! 1. **Build** every executable (toolchain calls run on the blocking pool).
//! 2. **Sessions**: run each transcript case, normalize stdout, validate against its golden value.
//! 3. **Artifact checks**: seed the fixture, run the program, decode its output, check the order.
//!
//! Every failure goes through the matching [`FailurePolicy`](crate::config::FailurePolicy) in the
//! context: `AbortRun` returns the error immediately, `RecordAndContinue` reports it and moves on
//! (and the summary will not be a success).
//!
//! ## Concurrency
//!
//! With `jobs > 1` the sessions of transcript cases run concurrently once every build has finished.
//! Verdicts are still evaluated and reported in case order, so fail-fast stops at the first failing
//! case by index. Artifact checks always run one at a time; they share the filesystem.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod reporter;

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use goldrun_core::{Normalizer, first_order_violation};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::artifact::read_integers;
use crate::builder::Builder;
use crate::context::RunContext;
use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::write_random_file;
use crate::session::{CapturedTranscript, SessionDriver, SessionError};
use crate::suite::TestCase;
use crate::validator::{Verdict, validate};

pub use reporter::{CaseLabel, CaseOutcome, ConsoleReporter, FailureDetail, RunReporter, RunSummary};

type Captured = Result<CapturedTranscript, SessionError>;

/// Run a suite on a fresh multi-threaded runtime.
pub fn run_suite(ctx: &RunContext, reporter: &mut dyn RunReporter) -> HarnessResult<RunSummary> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(HarnessError::AsyncRuntime)?;
    runtime.block_on(run_suite_async(ctx, reporter))
}

/// Run a suite on the current runtime.
pub async fn run_suite_async(ctx: &RunContext, reporter: &mut dyn RunReporter) -> HarnessResult<RunSummary> {
    Runner::new(ctx, reporter).run().await
}

struct Runner<'a, 'r> {
    ctx: &'a RunContext,
    reporter: &'r mut dyn RunReporter,
    driver: SessionDriver,
    normalizer: Normalizer,
    /// Executables that must not be run, with the reason.
    unavailable: HashMap<String, String>,
    summary: RunSummary,
}

impl<'a, 'r> Runner<'a, 'r> {
    fn new(ctx: &'a RunContext, reporter: &'r mut dyn RunReporter) -> Self {
        Self {
            ctx,
            reporter,
            driver: SessionDriver::from_context(ctx),
            normalizer: ctx.normalizer(),
            unavailable: HashMap::new(),
            summary: RunSummary::default(),
        }
    }

    async fn run(mut self) -> HarnessResult<RunSummary> {
        let start = Instant::now();
        tracing::info!(root = %self.ctx.root().display(), "starting run");

        self.build_all().await?;
        self.run_cases().await?;
        self.run_artifact_checks().await?;

        self.summary.duration = start.elapsed();
        self.reporter.on_run_complete(&self.summary);
        Ok(self.summary)
    }

    // ------------------------------------------------------------------------
    // Builds
    // ------------------------------------------------------------------------

    async fn build_all(&mut self) -> HarnessResult<()> {
        let ctx = self.ctx;
        let builder = Builder::from_context(ctx);
        // Cases may rely on the build directory even when nothing is built.
        builder.ensure_build_dir()?;

        for spec in &ctx.suite().builds {
            self.reporter.on_build_start(spec, &builder.command_line(spec).join(" "));

            let result = {
                let builder = builder.clone();
                let spec = spec.clone();
                tokio::task::spawn_blocking(move || builder.build(&spec)).await?
            };
            self.reporter.on_build_complete(spec, &result);

            if let Err(error) = result {
                let error = ctx.config().policies.build.escalate(error)?;
                tracing::warn!(build = %spec.output_name, %error, "build failed; dependent cases are skipped");
                self.summary.builds_failed += 1;
                self.unavailable
                    .insert(spec.output_name.clone(), format!("build of {} failed", spec.output_name));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Transcript cases
    // ------------------------------------------------------------------------

    async fn run_cases(&mut self) -> HarnessResult<()> {
        let ctx = self.ctx;
        let cases = &ctx.suite().cases;

        if ctx.config().jobs <= 1 {
            for (i, case) in cases.iter().enumerate() {
                let index = i + 1;
                if self.skip_if_unavailable(CaseLabel::Transcript(index), &case.executable) {
                    continue;
                }
                let captured = self
                    .driver
                    .run_with_args(&ctx.executable(&case.executable), &case.args, &case.input)
                    .await;
                self.evaluate_case(index, case, captured)?;
            }
            return Ok(());
        }

        let captured = self.capture_concurrently(cases).await?;
        for (i, (case, captured)) in cases.iter().zip(captured).enumerate() {
            let index = i + 1;
            if self.skip_if_unavailable(CaseLabel::Transcript(index), &case.executable) {
                continue;
            }
            let Some(captured) = captured else {
                continue;
            };
            self.evaluate_case(index, case, captured)?;
        }
        Ok(())
    }

    /// Run every runnable case's session, at most `jobs` at a time. Slot `i` holds case `i`'s result
    /// (`None` for cases that were not run).
    async fn capture_concurrently(&self, cases: &[TestCase]) -> HarnessResult<Vec<Option<Captured>>> {
        let ctx = self.ctx;
        let permits = Arc::new(Semaphore::new(ctx.config().jobs));
        let mut set = JoinSet::new();

        for (i, case) in cases.iter().enumerate() {
            if self.unavailable.contains_key(&case.executable) {
                continue;
            }
            let driver = self.driver.clone();
            let executable = ctx.executable(&case.executable);
            let args = case.args.clone();
            let input = case.input.clone();
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (i, driver.run_with_args(&executable, &args, &input).await)
            });
        }

        let mut results: Vec<Option<Captured>> = (0..cases.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            let (i, captured) = joined?;
            results[i] = Some(captured);
        }
        Ok(results)
    }

    fn evaluate_case(&mut self, index: usize, case: &TestCase, captured: Captured) -> HarnessResult<()> {
        let label = CaseLabel::Transcript(index);
        let Some(transcript) = self.check_session(label, &case.input, captured)? else {
            return Ok(());
        };

        let normalized = self.normalizer.normalize(&transcript.stdout);
        match validate(index, &case.input, &normalized, &case.expected) {
            Verdict::Pass => self.finish(label, CaseOutcome::Passed, transcript.duration),
            Verdict::Unchecked => self.finish(label, CaseOutcome::Unchecked, transcript.duration),
            Verdict::Fail(mismatch) => {
                self.finish(
                    label,
                    CaseOutcome::Failed(FailureDetail::Mismatch(mismatch.clone())),
                    transcript.duration,
                );
                self.ctx
                    .config()
                    .policies
                    .mismatch
                    .escalate(HarnessError::Mismatch(Box::new(mismatch)))?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Artifact checks
    // ------------------------------------------------------------------------

    async fn run_artifact_checks(&mut self) -> HarnessResult<()> {
        let ctx = self.ctx;

        for (i, check) in ctx.suite().artifact_checks.iter().enumerate() {
            let label = CaseLabel::Artifact(i + 1);
            if self.skip_if_unavailable(label, &check.executable) {
                continue;
            }

            if let Some(fixture) = &check.fixture {
                let path = ctx.resolve(&fixture.path);
                let bytes = fixture.bytes;
                let target = path.clone();
                tokio::task::spawn_blocking(move || write_random_file(&target, bytes))
                    .await?
                    .map_err(|source| HarnessError::Fixture { path, source })?;
            }

            let output = ctx.resolve(&check.output);
            remove_stale_output(&output).await?;

            let captured = self
                .driver
                .run_with_args(&ctx.executable(&check.executable), &check.args, &check.input)
                .await;
            let Some(transcript) = self.check_session(label, &check.input, captured)? else {
                continue;
            };

            let values = {
                let output = output.clone();
                tokio::task::spawn_blocking(move || read_integers(&output)).await??
            };

            match first_order_violation(&values) {
                None => self.finish(label, CaseOutcome::Passed, transcript.duration),
                Some(violation) => {
                    self.finish(
                        label,
                        CaseOutcome::Failed(FailureDetail::Unsorted {
                            path: output.clone(),
                            violation,
                        }),
                        transcript.duration,
                    );
                    ctx.config()
                        .policies
                        .mismatch
                        .escalate(HarnessError::InvariantViolation { path: output, violation })?;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Shared
    // ------------------------------------------------------------------------

    /// Pass through a transcript of a session that ran and exited 0. Anything else is reported as
    /// errored and routed through the runtime policy.
    fn check_session(
        &mut self,
        label: CaseLabel,
        input: &[String],
        captured: Captured,
    ) -> HarnessResult<Option<CapturedTranscript>> {
        let policy = self.ctx.config().policies.runtime;
        match captured {
            Err(error) => {
                self.finish(label, CaseOutcome::Errored(error.to_string()), Duration::ZERO);
                policy.escalate(HarnessError::from(error))?;
                Ok(None)
            }
            Ok(transcript) if !transcript.success() => {
                let input = input.join("\n");
                let message = format!(
                    "exit status {} with input data: {}\n{}",
                    transcript.exit_status,
                    input,
                    transcript.stderr.trim_end()
                );
                self.finish(label, CaseOutcome::Errored(message), transcript.duration);
                policy.escalate(HarnessError::RuntimeFailure {
                    label: label.to_string(),
                    input,
                    status: transcript.exit_status,
                    stderr: transcript.stderr,
                })?;
                Ok(None)
            }
            Ok(transcript) => Ok(Some(transcript)),
        }
    }

    fn skip_if_unavailable(&mut self, label: CaseLabel, executable: &str) -> bool {
        match self.unavailable.get(executable).cloned() {
            Some(reason) => {
                self.finish(label, CaseOutcome::Skipped(reason), Duration::ZERO);
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, label: CaseLabel, outcome: CaseOutcome, duration: Duration) {
        self.summary.record(&outcome);
        self.reporter.on_case_complete(label, &outcome, duration);
    }
}

/// Delete the output left by an earlier run so only this run's artifact is read back.
async fn remove_stale_output(path: &Path) -> HarnessResult<()> {
    let target = path.to_path_buf();
    match tokio::task::spawn_blocking(move || std::fs::remove_file(&target)).await? {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(HarnessError::StaleArtifact {
            path: path.to_path_buf(),
            source,
        }),
    }
}
