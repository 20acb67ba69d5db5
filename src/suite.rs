//! Suite definition - what to build, which sessions to drive, and what they must produce
//!
//! A suite is read from a JSON manifest (`goldrun.json` by default) and resolved against the run
//! root: source selectors are expanded into ordered file lists and scripted input is split into
//! lines. Without a manifest, [`SuiteManifest::shell_benchmarks`] describes the classic
//! shell + sorting-benchmark project layout.
//!
//! ```json
//! {
//!   "settings": { "compiler": "g++", "line_delay_ms": 500 },
//!   "builds": [
//!     { "name": "main.exe", "sources": [{ "dir": "source", "suffix": ".cpp" }] },
//!     { "name": "sorter.exe", "sources": ["benchmark/Bench1.cpp"] }
//!   ],
//!   "cases": [
//!     { "executable": "main.exe", "input": "cd build\nexit\n", "expected": "__PATH__$ ..." },
//!     { "executable": "main.exe", "input": ["pwd", "exit"], "expected": null }
//!   ],
//!   "artifact_checks": [
//!     {
//!       "executable": "sorter.exe",
//!       "args": ["build/input.bin", "build/output.bin"],
//!       "fixture": { "path": "build/input.bin", "bytes": 262144 },
//!       "output": "build/output.bin"
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::builder::BuildSpec;
use crate::config::Settings;

/// Default manifest file name, looked up in the run root.
pub const MANIFEST_FILE: &str = "goldrun.json";

#[derive(Debug, Error, Diagnostic)]
pub enum SuiteError {
    #[error("cannot read suite manifest `{}`", .path.display())]
    #[diagnostic(code(goldrun::suite::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid suite manifest `{}`", .path.display())]
    #[diagnostic(code(goldrun::suite::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("build `{name}` is declared more than once")]
    #[diagnostic(code(goldrun::suite::duplicate_build))]
    DuplicateBuild { name: String },

    #[error("cannot scan `{}` for sources", .dir.display())]
    #[diagnostic(code(goldrun::suite::scan))]
    Scan {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

// ============================================================================
// Manifest (serialized form)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteManifest {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub builds: Vec<BuildManifest>,
    #[serde(default)]
    pub cases: Vec<CaseManifest>,
    #[serde(default)]
    pub artifact_checks: Vec<ArtifactCheckManifest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildManifest {
    pub name: String,
    pub sources: Vec<SourceSelector>,
}

/// Where a build's sources come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceSelector {
    /// One file, relative to the root.
    File(PathBuf),
    /// Every file under `dir` (recursively) whose name ends with `suffix`.
    Scan { dir: PathBuf, suffix: String },
}

/// Scripted input: either one block of text (split on line breaks) or explicit lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InputScript {
    Text(String),
    Lines(Vec<String>),
}

impl Default for InputScript {
    fn default() -> Self {
        InputScript::Lines(Vec::new())
    }
}

impl InputScript {
    pub fn into_lines(self) -> Vec<String> {
        match self {
            InputScript::Text(text) => text.lines().map(str::to_string).collect(),
            InputScript::Lines(lines) => lines,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseManifest {
    pub executable: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub input: InputScript,
    /// `null` (or absent) makes the case run-only.
    #[serde(default)]
    pub expected: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactCheckManifest {
    pub executable: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub input: InputScript,
    #[serde(default)]
    pub fixture: Option<FixtureSpec>,
    pub output: PathBuf,
}

/// Random input file written before an artifact check runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureSpec {
    pub path: PathBuf,
    pub bytes: u64,
}

impl SuiteManifest {
    /// Read a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        let text = fs::read_to_string(path).map_err(|source| SuiteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse manifest text. `origin` is only used in error messages.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, SuiteError> {
        serde_json::from_str(text).map_err(|source| SuiteError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// The shell + sorting-benchmark project: three executables and two run-only sessions that
    /// launch each benchmark from inside the shell.
    pub fn shell_benchmarks() -> Self {
        let scan = |dir: &str, suffix: &str| SourceSelector::Scan {
            dir: PathBuf::from(dir),
            suffix: suffix.to_string(),
        };
        let build = |name: &str, sources| BuildManifest {
            name: name.to_string(),
            sources: vec![sources],
        };
        let shell_case = |benchmark: &str| CaseManifest {
            executable: "main.exe".to_string(),
            args: Vec::new(),
            input: InputScript::Text(format!("cd build\n./{benchmark}\nexit\n")),
            expected: None,
        };

        Self {
            settings: Settings::default(),
            builds: vec![
                build("main.exe", scan("source", ".cpp")),
                build("benchmark.exe", scan("benchmark", "1.cpp")),
                build("benchmark2.exe", scan("benchmark", "2.cpp")),
            ],
            cases: vec![shell_case("benchmark.exe"), shell_case("benchmark2.exe")],
            artifact_checks: Vec::new(),
        }
    }
}

// ============================================================================
// Resolved suite
// ============================================================================

/// Golden value of a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Transcript(String),
    /// Only run the session; do not compare output.
    RunOnly,
}

impl From<Option<String>> for Expected {
    fn from(value: Option<String>) -> Self {
        value.map_or(Expected::RunOnly, Expected::Transcript)
    }
}

/// One scripted session and its golden transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub executable: String,
    pub args: Vec<String>,
    pub input: Vec<String>,
    pub expected: Expected,
}

impl TestCase {
    pub fn new(executable: impl Into<String>, input: Vec<String>, expected: Expected) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            input,
            expected,
        }
    }
}

/// Seed a fixture, run a program, then check its binary output is sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCheck {
    pub executable: String,
    pub args: Vec<String>,
    pub input: Vec<String>,
    pub fixture: Option<FixtureSpec>,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suite {
    pub builds: Vec<BuildSpec>,
    pub cases: Vec<TestCase>,
    pub artifact_checks: Vec<ArtifactCheck>,
}

impl Suite {
    /// Resolve a manifest against `root`.
    pub fn from_manifest(manifest: SuiteManifest, root: &Path) -> Result<Self, SuiteError> {
        let mut seen = HashSet::new();
        let mut builds = Vec::with_capacity(manifest.builds.len());
        for build in manifest.builds {
            if !seen.insert(build.name.clone()) {
                return Err(SuiteError::DuplicateBuild { name: build.name });
            }
            let sources = resolve_sources(&build.sources, root)?;
            tracing::debug!(build = %build.name, sources = sources.len(), "resolved sources");
            builds.push(BuildSpec::new(build.name, sources));
        }

        let cases = manifest
            .cases
            .into_iter()
            .map(|c| TestCase {
                executable: c.executable,
                args: c.args,
                input: c.input.into_lines(),
                expected: c.expected.into(),
            })
            .collect();

        let artifact_checks = manifest
            .artifact_checks
            .into_iter()
            .map(|a| ArtifactCheck {
                executable: a.executable,
                args: a.args,
                input: a.input.into_lines(),
                fixture: a.fixture,
                output: a.output,
            })
            .collect();

        Ok(Self {
            builds,
            cases,
            artifact_checks,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty() && self.cases.is_empty() && self.artifact_checks.is_empty()
    }
}

/// Expand selectors into an ordered list of source files.
///
/// Explicit files keep their position; each scan contributes its matches sorted by path. A scan of
/// a directory that does not exist contributes nothing (the builder rejects an empty source set).
pub fn resolve_sources(selectors: &[SourceSelector], root: &Path) -> Result<Vec<PathBuf>, SuiteError> {
    let mut sources = Vec::new();
    for selector in selectors {
        match selector {
            SourceSelector::File(path) => sources.push(root.join(path)),
            SourceSelector::Scan { dir, suffix } => {
                let dir = root.join(dir);
                if !dir.is_dir() {
                    tracing::warn!(dir = %dir.display(), "source directory does not exist");
                    continue;
                }
                let mut found = Vec::new();
                for entry in WalkDir::new(&dir).sort_by_file_name() {
                    let entry = entry.map_err(|source| SuiteError::Scan {
                        dir: dir.clone(),
                        source,
                    })?;
                    let matches = entry.file_type().is_file()
                        && entry.file_name().to_str().is_some_and(|name| name.ends_with(suffix.as_str()));
                    if matches {
                        found.push(entry.into_path());
                    }
                }
                found.sort();
                sources.extend(found);
            }
        }
    }
    Ok(sources)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_parse_full_manifest() {
        let text = r#"{
            "settings": { "compiler": "rustc" },
            "builds": [{ "name": "echo", "sources": ["src/echo.rs"] }],
            "cases": [
                { "executable": "echo", "input": "hello\nexit\n", "expected": "hello\nexit\n" },
                { "executable": "echo", "input": ["a", "b"], "expected": null },
                { "executable": "echo" }
            ],
            "artifact_checks": [{
                "executable": "sort",
                "args": ["in.bin", "out.bin"],
                "fixture": { "path": "in.bin", "bytes": 1024 },
                "output": "out.bin"
            }]
        }"#;
        let manifest = SuiteManifest::parse(text, Path::new("goldrun.json")).unwrap();
        assert_eq!(manifest.settings.compiler.as_deref(), Some("rustc"));

        let suite = Suite::from_manifest(manifest, Path::new("/root")).unwrap();
        assert_eq!(suite.builds[0].sources, vec![PathBuf::from("/root/src/echo.rs")]);
        assert_eq!(suite.cases[0].input, vec!["hello", "exit"]);
        assert_eq!(suite.cases[0].expected, Expected::Transcript("hello\nexit\n".into()));
        assert_eq!(suite.cases[1].input, vec!["a", "b"]);
        assert_eq!(suite.cases[1].expected, Expected::RunOnly);
        assert!(suite.cases[2].input.is_empty());
        assert_eq!(suite.cases[2].expected, Expected::RunOnly);
        assert_eq!(
            suite.artifact_checks[0].fixture,
            Some(FixtureSpec {
                path: PathBuf::from("in.bin"),
                bytes: 1024
            })
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = SuiteManifest::parse(r#"{ "case": [] }"#, Path::new("m.json")).unwrap_err();
        assert!(matches!(err, SuiteError::Parse { .. }));
    }

    #[test]
    fn test_duplicate_build_names() {
        let text = r#"{ "builds": [
            { "name": "a", "sources": ["x.c"] },
            { "name": "a", "sources": ["y.c"] }
        ] }"#;
        let manifest = SuiteManifest::parse(text, Path::new("m.json")).unwrap();
        let err = Suite::from_manifest(manifest, Path::new("/r")).unwrap_err();
        assert!(matches!(err, SuiteError::DuplicateBuild { name } if name == "a"));
    }

    #[test]
    fn test_scan_is_recursive_sorted_and_suffix_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("benchmark/Bench2.cpp"));
        touch(&root.join("benchmark/Bench1.cpp"));
        touch(&root.join("benchmark/util/extra1.cpp"));
        touch(&root.join("benchmark/Shell.cpp"));
        touch(&root.join("benchmark/notes1.txt"));

        let selectors = [SourceSelector::Scan {
            dir: PathBuf::from("benchmark"),
            suffix: "1.cpp".into(),
        }];
        let sources = resolve_sources(&selectors, root).unwrap();
        assert_eq!(
            sources,
            vec![root.join("benchmark/Bench1.cpp"), root.join("benchmark/util/extra1.cpp")]
        );
    }

    #[test]
    fn test_scan_of_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let selectors = [SourceSelector::Scan {
            dir: PathBuf::from("nope"),
            suffix: ".cpp".into(),
        }];
        assert!(resolve_sources(&selectors, dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_shell_benchmarks_layout() {
        let manifest = SuiteManifest::shell_benchmarks();
        let names: Vec<_> = manifest.builds.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["main.exe", "benchmark.exe", "benchmark2.exe"]);

        let suite = Suite::from_manifest(manifest, Path::new("/nonexistent-root")).unwrap();
        assert_eq!(suite.cases.len(), 2);
        assert_eq!(suite.cases[0].input, vec!["cd build", "./benchmark.exe", "exit"]);
        assert_eq!(suite.cases[1].input, vec!["cd build", "./benchmark2.exe", "exit"]);
        assert!(suite.cases.iter().all(|c| c.expected == Expected::RunOnly));
    }
}
