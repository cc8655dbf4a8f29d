//! Error handling for the archive benchmark harness
//!
//! Errors fall into three groups: fatal startup errors (the source directory
//! cannot be measured), recoverable directory and archive errors (reported and
//! skipped), and best-effort sweep failures, which never surface as errors at
//! all and are collected into a `SweepReport` instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::algorithm::Algorithm;

/// The main error type for the benchmark harness
#[derive(Error, Debug)]
pub enum BenchError {
    /// The source directory is missing or unreadable
    #[error("Source directory error at {path}: {source}")]
    SourceDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The target directory could not be created, listed or swept
    #[error("Target directory error at {path}: {source}")]
    TargetDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single archive run failed
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The results log could not be opened or written
    #[error("Log sink error: {0}")]
    LogSink(#[source] io::Error),
}

/// Archiver adapter errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("{algorithm} archive of {source_dir} into {target} failed: {source}")]
    WriteFailed {
        algorithm: Algorithm,
        source_dir: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{algorithm} archive worker did not complete: {reason}")]
    WorkerLost { algorithm: Algorithm, reason: String },
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration parsing error: {reason}")]
    ParseError { reason: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BenchError>;

/// A specialized result type for archiver operations
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// A specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl BenchError {
    /// Whether the benchmark may carry on after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            BenchError::SourceDirectory { .. } => false,
            BenchError::Config(_) => false,
            BenchError::LogSink(_) => false,
            BenchError::TargetDirectory { .. } => true,
            BenchError::Archive(_) => true,
        }
    }

    /// Stable label for the `category` field of error traces
    pub fn category(&self) -> &'static str {
        match self {
            BenchError::SourceDirectory { .. } => "source_directory",
            BenchError::TargetDirectory { .. } => "target_directory",
            BenchError::Archive(_) => "archive",
            BenchError::Config(_) => "config",
            BenchError::LogSink(_) => "log_sink",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        let source_error = BenchError::SourceDirectory {
            path: PathBuf::from("./files"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(source_error.category(), "source_directory");
        assert!(!source_error.is_recoverable());

        let target_error = BenchError::TargetDirectory {
            path: PathBuf::from("./compressed"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(target_error.category(), "target_directory");
        assert!(target_error.is_recoverable());

        let archive_error = BenchError::from(ArchiveError::WorkerLost {
            algorithm: Algorithm::Brotli,
            reason: "panicked".to_string(),
        });
        assert_eq!(archive_error.category(), "archive");
        assert!(archive_error.is_recoverable());

        let sink_error = BenchError::LogSink(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(sink_error.category(), "log_sink");
        assert!(!sink_error.is_recoverable());

        let config_error = BenchError::from(ConfigError::ValidationFailed {
            reason: "empty rates".to_string(),
        });
        assert_eq!(config_error.category(), "config");
        assert!(!config_error.is_recoverable());
    }

    #[test]
    fn test_error_messages_name_the_path() {
        let error = BenchError::SourceDirectory {
            path: PathBuf::from("/missing/files"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(error.to_string().contains("/missing/files"));

        let error = ArchiveError::WorkerLost {
            algorithm: Algorithm::Gzip,
            reason: "cancelled".to_string(),
        };
        assert_eq!(error.to_string(), "Gzip archive worker did not complete: cancelled");
    }
}
