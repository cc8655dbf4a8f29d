//! Append-only, human readable results log

use std::path::Path;

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{BenchError, Result};
use crate::executor::Measurement;
use crate::utils::stats;

/// Results log shared by every campaign of one benchmark run
pub struct StatsLog<W> {
    sink: W,
    source_size: u64,
}

impl StatsLog<File> {
    /// Open `path` for appending, creating it if needed
    pub async fn open(path: &Path, source_size: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(BenchError::LogSink)?;
        Ok(Self::new(file, source_size))
    }
}

impl<W: AsyncWrite + Unpin> StatsLog<W> {
    pub fn new(sink: W, source_size: u64) -> Self {
        Self { sink, source_size }
    }

    /// Append one line, newline included
    pub async fn line(&mut self, text: &str) -> Result<()> {
        self.write(&format!("{}\n", text)).await
    }

    /// Benchmark banner with the uncompressed baseline
    pub async fn benchmark_header(&mut self) -> Result<()> {
        let header = format!(
            "Compression Algorithms Benchmark\n  Uncompressed Files Size: {} bytes\n\n",
            self.source_size
        );
        self.write(&header).await
    }

    /// Append the stats block for one measurement.
    ///
    /// Size and ratio are reported only when the measurement carries an
    /// artifact; an artifact that cannot be stat'ed degrades to a time-only
    /// block.
    pub async fn log_stats(&mut self, measurement: &Measurement) -> Result<()> {
        let compressed_size = match measurement.artifact.as_deref() {
            Some(artifact) => match fs::metadata(artifact).await {
                Ok(metadata) => Some(metadata.len()),
                Err(e) => {
                    tracing::warn!("Cannot read size of {}: {}", artifact.display(), e);
                    None
                }
            },
            None => None,
        };

        let block = format_stats(measurement, compressed_size, self.source_size);
        self.write(&block).await
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.sink.write_all(text.as_bytes()).await.map_err(BenchError::LogSink)?;
        self.sink.flush().await.map_err(BenchError::LogSink)
    }
}

/// Render one stats block
pub fn format_stats(measurement: &Measurement, compressed_size: Option<u64>, source_size: u64) -> String {
    let mut block = format!("\t{}\n", measurement.algorithm.label());
    if let Some(size) = compressed_size {
        let ratio = stats::compression_ratio(size, source_size);
        block.push_str(&format!("\t\tCompressed Size: {} bytes\n", size));
        block.push_str(&format!("\t\tCompression Ratio: {:.2}%\n", ratio));
    }
    block.push_str(&format!("\t\tExecution Time: {:.4} ms\n", measurement.elapsed_ms));
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;
    use std::fs;
    use tempfile::TempDir;

    fn measurement(artifact: Option<&Path>) -> Measurement {
        Measurement {
            algorithm: Algorithm::Gzip,
            elapsed_ms: 12.345678,
            artifact: artifact.map(Path::to_path_buf),
        }
    }

    #[test]
    fn test_time_only_block() {
        let block = format_stats(&measurement(None), None, 1_000);
        assert_eq!(block, "\tGzip\n\t\tExecution Time: 12.3457 ms\n");
    }

    #[test]
    fn test_size_aware_block() {
        let block = format_stats(&measurement(None), Some(123_456), 1_000_000);
        assert_eq!(
            block,
            "\tGzip\n\t\tCompressed Size: 123456 bytes\n\t\tCompression Ratio: 12.35%\n\t\tExecution Time: 12.3457 ms\n"
        );
    }

    #[tokio::test]
    async fn test_log_stats_reads_artifact_size() {
        let temp_dir = TempDir::new().unwrap();
        let artifact = temp_dir.path().join("files.tgz");
        fs::write(&artifact, vec![0u8; 250]).unwrap();

        let mut log = StatsLog::new(Vec::new(), 1_000);
        log.log_stats(&measurement(Some(&artifact))).await.unwrap();
        let text = String::from_utf8(log.into_inner()).unwrap();

        assert!(text.contains("Compressed Size: 250 bytes"));
        assert!(text.contains("Compression Ratio: 25.00%"));
    }

    #[tokio::test]
    async fn test_missing_artifact_degrades_to_time_only() {
        let temp_dir = TempDir::new().unwrap();
        let artifact = temp_dir.path().join("files.tgz");

        let mut log = StatsLog::new(Vec::new(), 1_000);
        log.log_stats(&measurement(Some(&artifact))).await.unwrap();
        let text = String::from_utf8(log.into_inner()).unwrap();

        assert!(!text.contains("Compressed Size"));
        assert!(text.contains("Execution Time"));
    }

    #[tokio::test]
    async fn test_open_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.txt");
        fs::write(&path, "previous run\n").unwrap();

        let mut log = StatsLog::open(&path, 42).await.unwrap();
        log.benchmark_header().await.unwrap();
        drop(log);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("previous run\nCompression Algorithms Benchmark\n"));
        assert!(text.contains("  Uncompressed Files Size: 42 bytes\n\n"));
    }
}
