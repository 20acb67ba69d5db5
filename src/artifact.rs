//! Binary artifact reader - loads a file of little-endian `i32` values.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use goldrun_core::{ArtifactError, decode_i32_le};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ArtifactReadError {
    #[error("artifact `{}` not found", .path.display())]
    #[diagnostic(code(goldrun::artifact::not_found), help("the program under test did not write its output file"))]
    NotFound { path: PathBuf },

    #[error("cannot read artifact `{}`", .path.display())]
    #[diagnostic(code(goldrun::artifact::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("artifact `{}` is malformed", .path.display())]
    #[diagnostic(code(goldrun::artifact::malformed))]
    Malformed {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },
}

/// Read and decode every value in `path`, in file order.
pub fn read_integers(path: &Path) -> Result<Vec<i32>, ArtifactReadError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ArtifactReadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ArtifactReadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let values = decode_i32_le(&bytes).map_err(|source| ArtifactReadError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(artifact = %path.display(), values = values.len(), "artifact decoded");
    Ok(values)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use goldrun_core::encode_i32_le;

    #[test]
    fn test_reads_known_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, encode_i32_le(&[1, -2, 1_000_000])).unwrap();
        assert_eq!(read_integers(&path).unwrap(), vec![1, -2, 1_000_000]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_integers(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, ArtifactReadError::NotFound { .. }));
    }

    #[test]
    fn test_partial_trailing_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        fs::write(&path, [0u8, 0, 0, 0, 1]).unwrap();
        let err = read_integers(&path).unwrap_err();
        assert!(matches!(
            err,
            ArtifactReadError::Malformed {
                source: ArtifactError::TrailingBytes { len: 5, remainder: 1 },
                ..
            }
        ));
    }
}
