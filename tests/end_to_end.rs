//! End-to-end scenarios
//!
//! Builds the programs in `benchmarks/` with `rustc` as the external toolchain, then drives them
//! through real sessions.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use goldrun::artifact::read_integers;
use goldrun::builder::{BuildSpec, Builder};
use goldrun::config::{FailurePolicy, HarnessConfig, Policies};
use goldrun::fixture::write_random_file;
use goldrun::runner::{CaseLabel, CaseOutcome, FailureDetail, RunReporter, RunSummary};
use goldrun::suite::{ArtifactCheck, Expected, FixtureSpec, Suite, TestCase};
use goldrun::{BuildError, RunContext, SessionDriver, run_suite_async};
use goldrun_core::{encode_i32_le, first_order_violation, is_sorted};

const RUSTC_ARGS: [&str; 2] = ["--edition=2021", "-O"];

fn benchmark(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("benchmarks").join(rel)
}

fn build(dir: &Path, name: &str, rel: &str) -> PathBuf {
    Builder::new("rustc", dir.join("build"))
        .with_args(RUSTC_ARGS)
        .build(&BuildSpec::new(name, vec![benchmark(rel)]))
        .unwrap()
}

fn driver() -> SessionDriver {
    SessionDriver::new(Duration::from_millis(20)).with_timeout(Some(Duration::from_secs(60)))
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Default)]
struct Recorder {
    cases: Vec<(CaseLabel, CaseOutcome)>,
}

impl RunReporter for Recorder {
    fn on_build_complete(&mut self, _spec: &BuildSpec, result: &Result<PathBuf, BuildError>) {
        if let Err(e) = result {
            eprintln!("build failed: {e}");
        }
    }

    fn on_case_complete(&mut self, label: CaseLabel, outcome: &CaseOutcome, _duration: Duration) {
        self.cases.push((label, outcome.clone()));
    }

    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

fn config() -> HarnessConfig {
    HarnessConfig::default()
        .with_compiler("rustc")
        .with_compiler_args(RUSTC_ARGS)
        .with_line_delay(Duration::from_millis(20))
        .with_session_timeout(Some(Duration::from_secs(60)))
}

// ============================================================================
// Scenario A: interactive echo
// ============================================================================

#[tokio::test]
async fn echo_session_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let exe = build(dir.path(), "echo.exe", "session/echo/echo.rs");

    let transcript = driver().run_session(&exe, &lines(&["hello", "exit"])).await.unwrap();

    assert_eq!(transcript.exit_status, 0);
    assert_eq!(transcript.stdout, "hello\nexit\n");
    assert!(transcript.stderr.is_empty());
}

#[tokio::test]
async fn echo_stops_reading_after_exit() {
    let dir = tempfile::tempdir().unwrap();
    let exe = build(dir.path(), "echo.exe", "session/echo/echo.rs");

    // Lines after `exit` hit a closed pipe or are never read; the transcript is still collected.
    let transcript = driver()
        .run_session(&exe, &lines(&["one", "exit", "ignored"]))
        .await
        .unwrap();
    assert!(transcript.success());
    assert_eq!(transcript.stdout, "one\nexit\n");
}

#[tokio::test]
async fn mini_shell_golden_transcript() {
    let root = tempfile::tempdir().unwrap();
    let suite = Suite {
        builds: vec![BuildSpec::new(
            "mini_shell.exe",
            vec![benchmark("session/mini_shell/mini_shell.rs")],
        )],
        cases: vec![TestCase::new(
            "mini_shell.exe",
            lines(&["pwd", "sleep 10", "exit"]),
            Expected::Transcript(
                "__PATH__$ __PATH__\n__PATH__$ Execution time: __NUM__ seconds\n__PATH__$ ".to_string(),
            ),
        )],
        ..Suite::default()
    };
    let ctx = RunContext::new(root.path(), config(), suite).unwrap();

    let mut recorder = Recorder::default();
    let summary = run_suite_async(&ctx, &mut recorder).await.unwrap();

    assert_eq!(summary.passed, 1, "{:?}", recorder.cases);
    assert!(summary.is_success());
    // The build directory lives under the root.
    assert!(root.path().join("build/mini_shell.exe").is_file());
}

#[tokio::test]
async fn mini_shell_mismatch_is_reported_with_context() {
    let root = tempfile::tempdir().unwrap();
    let suite = Suite {
        builds: vec![BuildSpec::new(
            "mini_shell.exe",
            vec![benchmark("session/mini_shell/mini_shell.rs")],
        )],
        cases: vec![TestCase::new(
            "mini_shell.exe",
            lines(&["frobnicate", "exit"]),
            Expected::Transcript("__PATH__$ __PATH__$ ".to_string()),
        )],
        ..Suite::default()
    };
    let policies = Policies {
        mismatch: FailurePolicy::RecordAndContinue,
        ..Policies::default()
    };
    let ctx = RunContext::new(root.path(), config().with_policies(policies), suite).unwrap();

    let mut recorder = Recorder::default();
    let summary = run_suite_async(&ctx, &mut recorder).await.unwrap();

    assert_eq!(summary.failed, 1);
    let (_, CaseOutcome::Failed(FailureDetail::Mismatch(mismatch))) = &recorder.cases[0] else {
        panic!("expected a mismatch, got {:?}", recorder.cases);
    };
    assert_eq!(mismatch.case_index, 1);
    assert_eq!(mismatch.input, ["frobnicate", "exit"]);
    assert_eq!(mismatch.actual, "__PATH__$ unknown command: frobnicate\n__PATH__$ ");
}

// ============================================================================
// Scenario B/C: sorted artifact
// ============================================================================

#[tokio::test]
async fn sorter_output_is_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let exe = build(dir.path(), "int_sort.exe", "sorting/int_sort/int_sort.rs");
    let input = dir.path().join("input.bin");
    let output = dir.path().join("output.bin");
    write_random_file(&input, 1024).unwrap();

    let args = [input.display().to_string(), output.display().to_string()];
    let transcript = driver().run_with_args(&exe, &args, &[]).await.unwrap();
    assert!(transcript.success(), "{}", transcript.stderr);

    let values = read_integers(&output).unwrap();
    assert_eq!(values.len(), 256);
    assert!(is_sorted(&values));
}

#[tokio::test]
async fn corrupted_output_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let exe = build(dir.path(), "int_sort.exe", "sorting/int_sort/int_sort.rs");
    let input = dir.path().join("input.bin");
    let output = dir.path().join("output.bin");
    fs::write(&input, encode_i32_le(&[5, 3, 9, 1, 7])).unwrap();

    let args = [input.display().to_string(), output.display().to_string()];
    let transcript = driver().run_with_args(&exe, &args, &[]).await.unwrap();
    assert!(transcript.success(), "{}", transcript.stderr);
    assert_eq!(read_integers(&output).unwrap(), [1, 3, 5, 7, 9]);

    // Set the most significant byte of the last element: 9 becomes negative.
    let mut bytes = fs::read(&output).unwrap();
    let last = bytes.len() - 1;
    bytes[last] = 0x80;
    fs::write(&output, bytes).unwrap();

    let values = read_integers(&output).unwrap();
    let violation = first_order_violation(&values).unwrap();
    assert_eq!(violation.index, 4);
    assert_eq!(violation.previous, 7);
    assert!(violation.current < 0);
}

#[tokio::test]
async fn artifact_check_through_the_runner() {
    let root = tempfile::tempdir().unwrap();
    let suite = Suite {
        builds: vec![BuildSpec::new("int_sort.exe", vec![benchmark("sorting/int_sort/int_sort.rs")])],
        artifact_checks: vec![ArtifactCheck {
            executable: "int_sort.exe".to_string(),
            args: lines(&["build/input.bin", "build/output.bin"]),
            input: Vec::new(),
            fixture: Some(FixtureSpec {
                path: PathBuf::from("build/input.bin"),
                bytes: 4096,
            }),
            output: PathBuf::from("build/output.bin"),
        }],
        ..Suite::default()
    };
    let ctx = RunContext::new(root.path(), config(), suite).unwrap();

    let mut recorder = Recorder::default();
    let summary = run_suite_async(&ctx, &mut recorder).await.unwrap();

    assert_eq!(summary.passed, 1, "{:?}", recorder.cases);
    assert_eq!(recorder.cases[0].0, CaseLabel::Artifact(1));
    assert_eq!(read_integers(&root.path().join("build/output.bin")).unwrap().len(), 1024);
}

// ============================================================================
// Build failures
// ============================================================================

#[test]
fn compilation_error_yields_no_executable() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("broken.rs");
    fs::write(&source, "fn main() { let x: u8 = \"no\"; }\n").unwrap();

    let builder = Builder::new("rustc", dir.path().join("build")).with_args(RUSTC_ARGS);
    let err = builder.build(&BuildSpec::new("broken.exe", vec![source])).unwrap_err();

    match err {
        BuildError::Failed { diagnostics, .. } => assert!(diagnostics.contains("mismatched types")),
        other => panic!("expected a compilation failure, got {other:?}"),
    }
    assert!(!dir.path().join("build/broken.exe").exists());
}
