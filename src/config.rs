//! Harness configuration
//!
//! Defaults match the classic shell-benchmark layout: `g++`, a `build/` directory next to the
//! sources, and a 500 ms pause between scripted lines.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Pause between scripted input lines.
pub const DEFAULT_LINE_DELAY: Duration = Duration::from_millis(500);
/// Wall-clock limit for a single session.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_COMPILER: &str = "g++";
pub const DEFAULT_BUILD_DIR: &str = "build";

/// What to do when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole run on the first failure.
    AbortRun,
    /// Report the failure, skip what depends on it, and keep going. The run still exits non-zero.
    RecordAndContinue,
}

impl FailurePolicy {
    /// Route a failure through the policy.
    ///
    /// ## Returns
    /// - `Err(error)` under `AbortRun`: propagate with `?`.
    /// - `Ok(error)` under `RecordAndContinue`: the caller records it and continues.
    pub fn escalate<E>(self, error: E) -> Result<E, E> {
        match self {
            FailurePolicy::AbortRun => Err(error),
            FailurePolicy::RecordAndContinue => Ok(error),
        }
    }

    pub fn aborts(self) -> bool {
        self == FailurePolicy::AbortRun
    }
}

/// Failure policy per failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policies {
    /// Toolchain failures.
    pub build: FailurePolicy,
    /// Spawn failures, timeouts and non-zero child exits.
    pub runtime: FailurePolicy,
    /// Golden mismatches and invariant violations.
    pub mismatch: FailurePolicy,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            build: FailurePolicy::AbortRun,
            runtime: FailurePolicy::RecordAndContinue,
            mismatch: FailurePolicy::AbortRun,
        }
    }
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Compiler command
    pub compiler: String,
    /// Arguments placed before `-o`
    pub compiler_args: Vec<String>,
    /// Build directory, relative to the run root unless absolute
    pub build_dir: PathBuf,
    /// Pause after each scripted line
    pub line_delay: Duration,
    /// Limit on waiting for a child to exit (`None` waits forever)
    pub session_timeout: Option<Duration>,
    /// Sessions allowed to run concurrently
    pub jobs: usize,
    pub policies: Policies,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_string(),
            compiler_args: Vec::new(),
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            line_delay: DEFAULT_LINE_DELAY,
            session_timeout: Some(DEFAULT_SESSION_TIMEOUT),
            jobs: 1,
            policies: Policies::default(),
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    pub fn with_compiler_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.compiler_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    pub fn with_line_delay(mut self, delay: Duration) -> Self {
        self.line_delay = delay;
        self
    }

    pub fn with_session_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Zero is treated as one.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_policies(mut self, policies: Policies) -> Self {
        self.policies = policies;
        self
    }

    /// Overlay the `settings` section of a suite manifest.
    pub fn apply(&mut self, settings: &Settings) {
        if let Some(compiler) = &settings.compiler {
            self.compiler = compiler.clone();
        }
        if let Some(args) = &settings.compiler_args {
            self.compiler_args = args.clone();
        }
        if let Some(dir) = &settings.build_dir {
            self.build_dir = dir.clone();
        }
        if let Some(ms) = settings.line_delay_ms {
            self.line_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = settings.timeout_secs {
            self.session_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(jobs) = settings.jobs {
            self.jobs = jobs.max(1);
        }
        if let Some(policies) = settings.policies {
            self.policies = policies;
        }
    }
}

/// The `settings` section of a suite manifest. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub compiler: Option<String>,
    pub compiler_args: Option<Vec<String>>,
    pub build_dir: Option<PathBuf>,
    pub line_delay_ms: Option<u64>,
    /// `0` disables the session timeout.
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
    pub policies: Option<Policies>,
}
