//! Timed single archive runs

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;
use crate::archiver::Archiver;
use crate::error::ArchiveResult;
use crate::utils::Timer;

/// Outcome of one timed archive run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub algorithm: Algorithm,
    pub elapsed_ms: f64,
    /// Artifact to stat for size reporting; `None` logs time only
    pub artifact: Option<PathBuf>,
}

impl Measurement {
    /// Drop the artifact reference so the stats logger skips the size read
    pub fn time_only(self) -> Self {
        Self {
            artifact: None,
            ..self
        }
    }
}

/// Runs the archiver once per call and times it
pub struct RunExecutor<A> {
    archiver: Arc<A>,
    source_dir: PathBuf,
    target_dir: PathBuf,
}

impl<A: Archiver> RunExecutor<A> {
    pub fn new(archiver: Arc<A>, source_dir: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            archiver,
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
        }
    }

    /// Deterministic artifact path for `algorithm`
    pub fn artifact_path(&self, algorithm: Algorithm) -> PathBuf {
        self.target_dir.join(algorithm.file_name())
    }

    /// Archive the source directory once and return the elapsed wall-clock time.
    ///
    /// The timer stops only after the archiver signals completion, so the
    /// returned artifact is stable on disk.
    pub async fn run_once(&self, algorithm: Algorithm) -> ArchiveResult<Measurement> {
        let artifact = self.artifact_path(algorithm);
        let timer = Timer::start();

        self.archiver.archive(&self.source_dir, &artifact, algorithm).await?;

        let elapsed_ms = timer.elapsed_ms();
        tracing::debug!("{} run finished in {:.4} ms", algorithm, elapsed_ms);

        Ok(Measurement {
            algorithm,
            elapsed_ms,
            artifact: Some(artifact),
        })
    }
}
