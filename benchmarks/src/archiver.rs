//! Archiver adapter: tar a directory and compress the stream
//!
//! The harness only relies on three properties of an archiver: the output
//! path is chosen by the caller, the returned future resolves once the
//! artifact is fully written, and repeated runs against the same path
//! overwrite the previous artifact.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::algorithm::Algorithm;
use crate::config::CompressionSettings;
use crate::error::{ArchiveError, ArchiveResult};

const BROTLI_BUFFER_SIZE: usize = 64 * 1024;

/// Produces one compressed archive of a source directory
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Archive `source_dir` into `target`. Resolves when `target` is complete.
    async fn archive(&self, source_dir: &Path, target: &Path, algorithm: Algorithm) -> ArchiveResult<()>;
}

/// Tar + gzip/brotli archiver running on the blocking thread pool
#[derive(Debug, Clone)]
pub struct TarArchiver {
    settings: CompressionSettings,
}

impl TarArchiver {
    pub fn new(settings: CompressionSettings) -> Self {
        Self { settings }
    }

    /// Write the archive synchronously on the current thread
    pub fn archive_blocking(
        settings: &CompressionSettings,
        source_dir: &Path,
        target: &Path,
        algorithm: Algorithm,
    ) -> io::Result<()> {
        let file = BufWriter::new(File::create(target)?);
        let file = compress_tar(settings, source_dir, algorithm, file)?;

        let mut file = file.into_inner().map_err(|e| e.into_error())?;
        file.flush()?;
        Ok(())
    }
}

/// Tar `source_dir` through the `algorithm` encoder into `sink`
fn compress_tar<W: Write>(
    settings: &CompressionSettings,
    source_dir: &Path,
    algorithm: Algorithm,
    sink: W,
) -> io::Result<W> {
    match algorithm {
        Algorithm::Gzip => {
            let encoder = GzEncoder::new(sink, Compression::new(settings.gzip_level));
            write_tar(source_dir, encoder)?.finish()
        }
        Algorithm::Brotli => {
            let encoder =
                brotli::CompressorWriter::new(sink, BROTLI_BUFFER_SIZE, settings.brotli_quality, settings.brotli_window);
            let mut encoder = write_tar(source_dir, encoder)?;
            // into_inner drops write errors from the closing block, so push
            // everything buffered through a checked flush first.
            encoder.flush()?;
            Ok(encoder.into_inner())
        }
    }
}

impl Default for TarArchiver {
    fn default() -> Self {
        Self::new(CompressionSettings::default())
    }
}

#[async_trait]
impl Archiver for TarArchiver {
    async fn archive(&self, source_dir: &Path, target: &Path, algorithm: Algorithm) -> ArchiveResult<()> {
        let settings = self.settings.clone();
        let source: PathBuf = source_dir.to_path_buf();
        let destination: PathBuf = target.to_path_buf();

        let written = tokio::task::spawn_blocking(move || {
            Self::archive_blocking(&settings, &source, &destination, algorithm)
        })
        .await
        .map_err(|e| ArchiveError::WorkerLost {
            algorithm,
            reason: e.to_string(),
        })?;

        written.map_err(|source| ArchiveError::WriteFailed {
            algorithm,
            source_dir: source_dir.to_path_buf(),
            target: target.to_path_buf(),
            source,
        })
    }
}

/// Append every direct entry of `source_dir` to a tar stream, named relative
/// to the directory, and hand back the finished inner writer.
fn write_tar<W: Write>(source_dir: &Path, writer: W) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);

    let mut entries = fs::read_dir(source_dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        if fs::metadata(&path)?.is_dir() {
            builder.append_dir_all(&name, &path)?;
        } else {
            builder.append_path_with_name(&path, &name)?;
        }
    }

    builder.into_inner()
}
