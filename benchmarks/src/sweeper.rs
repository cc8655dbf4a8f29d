//! Best-effort removal of generated artifacts between campaigns

use std::future::Future;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::campaign::TickTimer;
use crate::error::{BenchError, Result};

/// Outcome of one sweep of the target directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Entries removed
    pub removed: usize,
    /// Entries that could not be removed; never fatal
    pub failures: Vec<SweepFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub error: String,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Empties the shared target directory
#[derive(Debug, Clone)]
pub struct Sweeper {
    target_dir: PathBuf,
}

impl Sweeper {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
        }
    }

    /// Remove every entry of the target directory.
    ///
    /// A supplied timer is cancelled before anything is removed so no further
    /// tick can write into the directory mid-sweep. Per-entry failures are
    /// collected into the report; only an unreadable directory is an error.
    pub async fn sweep(&self, timer: Option<&mut TickTimer>) -> Result<SweepReport> {
        self.sweep_with(timer, remove_entry).await
    }

    async fn sweep_with<F, Fut>(&self, timer: Option<&mut TickTimer>, remove: F) -> Result<SweepReport>
    where
        F: Fn(PathBuf) -> Fut,
        Fut: Future<Output = io::Result<()>>,
    {
        if let Some(timer) = timer {
            timer.cancel();
        }

        let mut entries = fs::read_dir(&self.target_dir)
            .await
            .map_err(|source| BenchError::TargetDirectory {
                path: self.target_dir.clone(),
                source,
            })?;

        let mut report = SweepReport::default();
        loop {
            let path = match entries.next_entry().await {
                Ok(Some(entry)) => entry.path(),
                Ok(None) => break,
                Err(e) => {
                    report.failures.push(SweepFailure {
                        path: self.target_dir.clone(),
                        error: e.to_string(),
                    });
                    break;
                }
            };

            match remove(path.clone()).await {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    tracing::warn!("Failed to remove {}: {}", path.display(), e);
                    report.failures.push(SweepFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            "Swept {}: {} removed, {} failed",
            self.target_dir.display(),
            report.removed,
            report.failures.len()
        );
        Ok(report)
    }
}

async fn remove_entry(path: PathBuf) -> io::Result<()> {
    if fs::symlink_metadata(&path).await?.is_dir() {
        fs::remove_dir_all(&path).await
    } else {
        fs::remove_file(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sweep_removes_files_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("files.tgz"), b"gz").unwrap();
        fs::write(temp_dir.path().join("files.tar.br"), b"br").unwrap();
        fs::create_dir(temp_dir.path().join("stale")).unwrap();
        fs::write(temp_dir.path().join("stale").join("inner"), b"x").unwrap();

        let report = Sweeper::new(temp_dir.path()).sweep(None).await.unwrap();

        assert_eq!(report.removed, 3);
        assert!(report.is_clean());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let sweeper = Sweeper::new(temp_dir.path());

        let first = sweeper.sweep(None).await.unwrap();
        let second = sweeper.sweep(None).await.unwrap();

        assert_eq!(first, SweepReport::default());
        assert_eq!(second, SweepReport::default());
        assert!(temp_dir.path().exists());
    }

    #[tokio::test]
    async fn test_missing_directory_is_recoverable() {
        let temp_dir = TempDir::new().unwrap();
        let error = Sweeper::new(temp_dir.path().join("compressed")).sweep(None).await.unwrap_err();

        assert!(matches!(error, BenchError::TargetDirectory { .. }));
        assert!(error.is_recoverable());
    }

    #[tokio::test]
    async fn test_sweep_cancels_timer_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut timer = TickTimer::every(Duration::from_millis(5));

        Sweeper::new(temp_dir.path()).sweep(Some(&mut timer)).await.unwrap();

        assert!(timer.is_cancelled());
        assert!(!timer.tick().await);
    }

    #[tokio::test]
    async fn test_failed_removal_does_not_stop_sweep() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.tgz", "locked.tgz", "z.tar.br"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        let report = Sweeper::new(temp_dir.path())
            .sweep_with(None, |path: PathBuf| async move {
                if path.ends_with("locked.tgz") {
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
                } else {
                    remove_entry(path).await
                }
            })
            .await
            .unwrap();

        assert_eq!(report.removed, 2);
        assert!(!report.is_clean());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("locked.tgz"));
        assert_eq!(report.failures[0].error, "locked");

        let left: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(left, vec![std::ffi::OsString::from("locked.tgz")]);
    }
}
