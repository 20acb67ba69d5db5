//! Run context - everything one harness run needs, passed explicitly to each component.

use std::path::{Path, PathBuf};

use goldrun_core::Normalizer;

use crate::config::HarnessConfig;
use crate::errors::{HarnessError, HarnessResult};
use crate::suite::Suite;

/// Root directory, configuration, and the suite (with its golden transcripts) for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    root: PathBuf,
    build_dir: PathBuf,
    config: HarnessConfig,
    suite: Suite,
}

impl RunContext {
    /// Create a context rooted at `root`.
    ///
    /// The root is canonicalized: it is both the working directory of every child and the path that
    /// normalization hides, so it must be spelled the way the child will see it.
    pub fn new(root: impl AsRef<Path>, config: HarnessConfig, suite: Suite) -> HarnessResult<Self> {
        let root = canonical_root(root.as_ref())?;
        let build_dir = if config.build_dir.is_absolute() {
            config.build_dir.clone()
        } else {
            root.join(&config.build_dir)
        };
        Ok(Self {
            root,
            build_dir,
            config,
            suite,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn suite(&self) -> &Suite {
        &self.suite
    }

    /// Path of a built executable.
    pub fn executable(&self, name: &str) -> PathBuf {
        self.build_dir.join(name)
    }

    /// Resolve a manifest path against the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Normalizer hiding this run's root.
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.root.to_string_lossy())
    }
}

/// Canonical absolute form of a harness root.
pub fn canonical_root(root: &Path) -> HarnessResult<PathBuf> {
    root.canonicalize().map_err(|source| HarnessError::Root {
        path: root.to_path_buf(),
        source,
    })
}
