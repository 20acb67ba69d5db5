//! Builder - compiles a program under test with the external toolchain
//!
//! Invokes `<compiler> [args...] -o <build_dir>/<output_name> <source>...` and captures the
//! toolchain's diagnostic stream. A failed build never yields an executable path, so the runner
//! cannot go on to drive a stale binary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use miette::Diagnostic;
use thiserror::Error;

use crate::context::RunContext;

/// One program to build: the executable name and its ordered source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    pub output_name: String,
    pub sources: Vec<PathBuf>,
}

impl BuildSpec {
    pub fn new(output_name: impl Into<String>, sources: Vec<PathBuf>) -> Self {
        Self {
            output_name: output_name.into(),
            sources,
        }
    }
}

/// Errors raised before or by the toolchain.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("no source files selected for `{name}`")]
    #[diagnostic(
        code(goldrun::build::no_sources),
        help("check the source selectors of this build in the suite manifest")
    )]
    NoSources { name: String },

    #[error("source file `{}` for `{name}` does not exist", .path.display())]
    #[diagnostic(code(goldrun::build::missing_source))]
    MissingSource { name: String, path: PathBuf },

    #[error("cannot create build directory `{}`", .path.display())]
    #[diagnostic(code(goldrun::build::directory))]
    BuildDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to invoke `{compiler}`")]
    #[diagnostic(code(goldrun::build::toolchain), help("is the compiler installed and on PATH?"))]
    Toolchain {
        compiler: String,
        #[source]
        source: io::Error,
    },

    #[error("compilation of `{name}` failed (exit status {status})\n{diagnostics}")]
    #[diagnostic(code(goldrun::build::failed))]
    Failed {
        name: String,
        status: i32,
        diagnostics: String,
    },
}

/// Drives the external compiler.
#[derive(Debug, Clone)]
pub struct Builder {
    compiler: String,
    compiler_args: Vec<String>,
    build_dir: PathBuf,
}

impl Builder {
    pub fn new(compiler: impl Into<String>, build_dir: impl AsRef<Path>) -> Self {
        Self {
            compiler: compiler.into(),
            compiler_args: Vec::new(),
            build_dir: build_dir.as_ref().to_path_buf(),
        }
    }

    /// Extra arguments placed before `-o` (optimization level, edition, include paths...).
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.compiler_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Builder configured from a run context.
    pub fn from_context(ctx: &RunContext) -> Self {
        Self::new(&ctx.config().compiler, ctx.build_dir()).with_args(ctx.config().compiler_args.iter().cloned())
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Path the executable for `output_name` is written to.
    pub fn output_path(&self, output_name: &str) -> PathBuf {
        self.build_dir.join(output_name)
    }

    /// The full toolchain invocation, program first.
    pub fn command_line(&self, spec: &BuildSpec) -> Vec<String> {
        let mut line = Vec::with_capacity(self.compiler_args.len() + spec.sources.len() + 3);
        line.push(self.compiler.clone());
        line.extend(self.compiler_args.iter().cloned());
        line.push("-o".to_string());
        line.push(self.output_path(&spec.output_name).to_string_lossy().into_owned());
        line.extend(spec.sources.iter().map(|s| s.to_string_lossy().into_owned()));
        line
    }

    /// Create the build directory if it does not exist yet. Idempotent.
    pub fn ensure_build_dir(&self) -> Result<(), BuildError> {
        fs::create_dir_all(&self.build_dir).map_err(|source| BuildError::BuildDir {
            path: self.build_dir.clone(),
            source,
        })
    }

    /// Compile `spec` and return the path of the produced executable.
    ///
    /// ## Errors
    ///
    /// - `NoSources` / `MissingSource` when the source set is empty or references a missing file
    ///   (the toolchain is not invoked).
    /// - `Toolchain` when the compiler cannot be spawned.
    /// - `Failed` with the compiler's stderr when it exits non-zero.
    pub fn build(&self, spec: &BuildSpec) -> Result<PathBuf, BuildError> {
        if spec.sources.is_empty() {
            return Err(BuildError::NoSources {
                name: spec.output_name.clone(),
            });
        }
        if let Some(missing) = spec.sources.iter().find(|s| !s.is_file()) {
            return Err(BuildError::MissingSource {
                name: spec.output_name.clone(),
                path: missing.clone(),
            });
        }

        self.ensure_build_dir()?;

        let line = self.command_line(spec);
        tracing::debug!(target: "goldrun::build", "{}", line.join(" "));

        let output = Command::new(&line[0])
            .args(&line[1..])
            .output()
            .map_err(|source| BuildError::Toolchain {
                compiler: self.compiler.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BuildError::Failed {
                name: spec.output_name.clone(),
                status: output.status.code().unwrap_or(-1),
                diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let path = self.output_path(&spec.output_name);
        tracing::debug!(executable = %path.display(), "build succeeded");
        Ok(path)
    }
}
