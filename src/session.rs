//! Session driver - scripted terminal sessions against a built executable
//!
//! The harness plays the terminal: it spawns the child with piped stdio, writes each scripted line
//! followed by `\n`, pauses for the configured line delay after every line, closes stdin to signal
//! end of session, and collects stdout, stderr and the exit status.
//!
//! ## Notes
//!
//! - stdout/stderr are drained on background tasks while input is being written, so a chatty child
//!   cannot block on a full pipe.
//! - A child that exits (closing stdin) before the script ends is not an error; the unsent lines are
//!   dropped with a warning.
//! - An optional wall-clock timeout bounds the wait for exit and for end of output. On expiry the
//!   child is killed and the drains are abandoned.
//! - A non-zero exit status is only reported here. Call sites decide what it means.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use miette::Diagnostic;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::task::JoinHandle;

use crate::context::RunContext;

/// Exit status recorded when the child was terminated by a signal.
pub const SIGNALED_EXIT_STATUS: i32 = -1;

/// Everything a session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedTranscript {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
    pub duration: Duration,
}

impl CapturedTranscript {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("executable `{}` not found", .path.display())]
    #[diagnostic(code(goldrun::session::not_found), help("was the build for this executable skipped or did it fail?"))]
    NotFound { path: PathBuf },

    #[error("failed to spawn `{}`", .path.display())]
    #[diagnostic(code(goldrun::session::spawn))]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while talking to `{}`", .path.display())]
    #[diagnostic(code(goldrun::session::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{}` did not exit within {limit:?}; killed", .path.display())]
    #[diagnostic(code(goldrun::session::timeout))]
    Timeout { path: PathBuf, limit: Duration },
}

/// Runs scripted sessions. Cheap to clone; one driver serves every case of a run.
#[derive(Debug, Clone)]
pub struct SessionDriver {
    line_delay: Duration,
    timeout: Option<Duration>,
    working_dir: Option<PathBuf>,
}

impl Default for SessionDriver {
    fn default() -> Self {
        Self {
            line_delay: crate::config::DEFAULT_LINE_DELAY,
            timeout: None,
            working_dir: None,
        }
    }
}

impl SessionDriver {
    pub fn new(line_delay: Duration) -> Self {
        Self {
            line_delay,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory the child starts in. Defaults to the harness's own working directory.
    pub fn with_working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Driver configured from a run context: children start in the run root.
    pub fn from_context(ctx: &RunContext) -> Self {
        Self::new(ctx.config().line_delay)
            .with_timeout(ctx.config().session_timeout)
            .with_working_dir(ctx.root())
    }

    pub fn line_delay(&self) -> Duration {
        self.line_delay
    }

    /// Run `executable` with no arguments, feeding `input_lines`.
    pub async fn run_session(
        &self,
        executable: &Path,
        input_lines: &[String],
    ) -> Result<CapturedTranscript, SessionError> {
        self.run_with_args(executable, &[], input_lines).await
    }

    /// Run `executable` with `args`, feeding `input_lines`.
    pub async fn run_with_args(
        &self,
        executable: &Path,
        args: &[String],
        input_lines: &[String],
    ) -> Result<CapturedTranscript, SessionError> {
        if !executable.is_file() {
            return Err(SessionError::NotFound {
                path: executable.to_path_buf(),
            });
        }

        let mut command = Command::new(executable);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| SessionError::Spawn {
            path: executable.to_path_buf(),
            source,
        })?;
        tracing::debug!(executable = %executable.display(), pid = ?child.id(), "session started");

        let stdout_task = spawn_drain(child.stdout.take());
        let stderr_task = spawn_drain(child.stderr.take());

        if let Some(mut stdin) = child.stdin.take() {
            self.feed(&mut stdin, input_lines, executable).await?;
            // Dropping the handle closes the pipe: end of session.
            drop(stdin);
        }

        // The limit covers both the exit and the end of output: a background process that
        // inherited stdout keeps the pipes open after the child itself has exited.
        let stdout_abort = stdout_task.abort_handle();
        let stderr_abort = stderr_task.abort_handle();
        let finished = async {
            let status = child.wait().await.map_err(|source| SessionError::Io {
                path: executable.to_path_buf(),
                source,
            })?;
            let stdout = join_drain(stdout_task, executable).await?;
            let stderr = join_drain(stderr_task, executable).await?;
            Ok::<_, SessionError>((status, stdout, stderr))
        };

        let (status, stdout, stderr) = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, finished).await {
                Ok(finished) => finished?,
                Err(_) => {
                    if !matches!(child.try_wait(), Ok(Some(_))) {
                        if let Err(e) = child.kill().await {
                            tracing::warn!(error = %e, "failed to kill timed-out child");
                        }
                    }
                    stdout_abort.abort();
                    stderr_abort.abort();
                    return Err(SessionError::Timeout {
                        path: executable.to_path_buf(),
                        limit,
                    });
                }
            },
            None => finished.await?,
        };
        let duration = start.elapsed();

        let exit_status = status.code().unwrap_or(SIGNALED_EXIT_STATUS);
        tracing::debug!(executable = %executable.display(), exit_status, ?duration, "session finished");

        Ok(CapturedTranscript {
            stdout,
            stderr,
            exit_status,
            duration,
        })
    }

    /// Write the script line by line, pausing after each line.
    async fn feed(&self, stdin: &mut ChildStdin, lines: &[String], executable: &Path) -> Result<(), SessionError> {
        for (sent, line) in lines.iter().enumerate() {
            match write_line(stdin, line).await {
                Ok(()) => tracing::debug!(line = %line, "sent"),
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    tracing::warn!(
                        executable = %executable.display(),
                        unsent = lines.len() - sent,
                        "child closed stdin before the script finished"
                    );
                    return Ok(());
                }
                Err(source) => {
                    return Err(SessionError::Io {
                        path: executable.to_path_buf(),
                        source,
                    });
                }
            }
            if !self.line_delay.is_zero() {
                tokio::time::sleep(self.line_delay).await;
            }
        }
        Ok(())
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> io::Result<()> {
    let mut framed = String::with_capacity(line.len() + 1);
    framed.push_str(line);
    framed.push('\n');
    stdin.write_all(framed.as_bytes()).await?;
    stdin.flush().await
}

fn spawn_drain<R>(reader: Option<R>) -> JoinHandle<io::Result<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut reader) = reader {
            reader.read_to_end(&mut buf).await?;
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

async fn join_drain(task: JoinHandle<io::Result<String>>, executable: &Path) -> Result<String, SessionError> {
    let io_error = |source| SessionError::Io {
        path: executable.to_path_buf(),
        source,
    };
    task.await.map_err(|e| io_error(io::Error::other(e)))?.map_err(io_error)
}
