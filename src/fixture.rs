//! Fixture generator - random unsorted input for the sorting benchmarks.
//!
//! The bytes come from the thread-local RNG and are not reproducible between runs, so only
//! structural invariants can be checked on anything derived from them.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rand::RngCore;

const CHUNK: usize = 64 * 1024;

/// Write `byte_len` random bytes to `path`, replacing any existing file.
///
/// Missing parent directories are created. Memory use is bounded by the chunk size, so the
/// 256 MiB fixtures of the large benchmark are fine.
pub fn write_random_file(path: &Path, byte_len: u64) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let mut rng = rand::thread_rng();
    let mut chunk = vec![0u8; CHUNK];
    let mut remaining = byte_len;

    while remaining > 0 {
        let n = remaining.min(CHUNK as u64) as usize;
        rng.fill_bytes(&mut chunk[..n]);
        writer.write_all(&chunk[..n])?;
        remaining -= n as u64;
    }

    writer.flush()?;
    tracing::debug!(fixture = %path.display(), bytes = byte_len, "fixture written");
    Ok(())
}
