//! Uncompressed size of the benchmark source directory

use std::fs;
use std::path::Path;

use crate::error::{BenchError, Result};

/// Sum the sizes of every direct entry of `source_dir`.
///
/// Entries are stat'ed through symlinks and sub-directories contribute only
/// their own metadata size, not their contents. Any failure is fatal: without
/// a baseline size no compression ratio can be reported.
pub fn measure_source_size(source_dir: &Path) -> Result<u64> {
    let source_error = |source: std::io::Error| BenchError::SourceDirectory {
        path: source_dir.to_path_buf(),
        source,
    };

    let mut total_size = 0u64;
    for entry in fs::read_dir(source_dir).map_err(source_error)? {
        let entry = entry.map_err(source_error)?;
        let metadata = fs::metadata(entry.path()).map_err(source_error)?;
        total_size += metadata.len();
    }

    tracing::debug!("Source directory {} holds {} bytes", source_dir.display(), total_size);
    Ok(total_size)
}
