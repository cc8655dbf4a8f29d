//! Archive compression benchmarks
//!
//! Repeatedly tars and compresses a fixed source directory with Gzip and
//! Brotli, timing every run and appending the results to a text log:
//!
//! - one single-event campaign reporting time, compressed size and ratio
//! - one rate-controlled campaign per configured events-per-second rate,
//!   reporting time only, run back to back
//! - a sweep of the target directory after every campaign

pub mod algorithm;
pub mod archiver;
pub mod campaign;
pub mod config;
pub mod error;
pub mod executor;
pub mod prober;
pub mod stats_log;
pub mod sweeper;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use algorithm::Algorithm;
pub use archiver::{Archiver, TarArchiver};
pub use campaign::{Campaign, CampaignPhase, CampaignScheduler};
pub use config::Config;
pub use error::{BenchError, Result};
pub use executor::{Measurement, RunExecutor};
pub use stats_log::StatsLog;
pub use sweeper::{SweepReport, Sweeper};

use utils::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetrics {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
}

/// Timing summary for one algorithm over one campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmLatency {
    pub algorithm: Algorithm,
    /// Successful runs
    pub runs: usize,
    pub latency: LatencyMetrics,
}

impl AlgorithmLatency {
    pub fn from_samples(algorithm: Algorithm, samples_ms: &[f64]) -> Self {
        Self {
            algorithm,
            runs: samples_ms.len(),
            latency: LatencyMetrics {
                p50_ms: stats::percentile(samples_ms, 50.0),
                p95_ms: stats::percentile(samples_ms, 95.0),
                p99_ms: stats::percentile(samples_ms, 99.0),
                max_ms: stats::max(samples_ms),
                mean_ms: stats::mean(samples_ms),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignKind {
    SingleEvent,
    MultiEvent,
}

impl std::fmt::Display for CampaignKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignKind::SingleEvent => write!(f, "single_event"),
            CampaignKind::MultiEvent => write!(f, "multi_event"),
        }
    }
}

/// Result of one finished campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReport {
    pub kind: CampaignKind,
    /// Events per second; `None` for the single-event campaign
    pub rate: Option<u32>,
    /// Ticks scheduled; the single-event pass is one tick
    pub target_ticks: u64,
    /// Ticks that ran to the end, whether or not their archive runs
    /// succeeded; failures are counted in `failed_runs`
    pub completed_ticks: u64,
    /// Archive runs that failed and were left out of the log
    pub failed_runs: u64,
    pub latency: Vec<AlgorithmLatency>,
    /// `None` when the target directory could not be read
    pub sweep: Option<SweepReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: f64,
}

/// Result of a whole benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub source_size: u64,
    pub campaigns: Vec<CampaignReport>,
}

impl BenchmarkReport {
    pub fn failed_runs(&self) -> u64 {
        self.campaigns.iter().map(|campaign| campaign.failed_runs).sum()
    }
}

/// Create the target directory if it does not exist yet
pub fn prepare_target_dir(target_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(target_dir).map_err(|source| BenchError::TargetDirectory {
        path: target_dir.to_path_buf(),
        source,
    })
}

/// Run the full benchmark with the tar archiver
pub async fn run_benchmark(config: &Config) -> Result<BenchmarkReport> {
    let archiver = Arc::new(TarArchiver::new(config.compression.clone()));
    run_benchmark_with(config, archiver).await
}

/// Run the full benchmark with a caller supplied archiver.
///
/// The source size is measured before the target directory or the log is
/// touched; a missing source directory aborts before any campaign runs.
pub async fn run_benchmark_with<A: Archiver>(config: &Config, archiver: Arc<A>) -> Result<BenchmarkReport> {
    config.validate()?;

    let source_size = prober::measure_source_size(&config.paths.source_dir)?;
    prepare_target_dir(&config.paths.target_dir)?;

    let mut log = StatsLog::open(&config.paths.log_path, source_size).await?;
    log.benchmark_header().await?;

    tracing::info!(
        "Benchmarking {} ({}) into {}",
        config.paths.source_dir.display(),
        utils::format::bytes_human(source_size as f64),
        config.paths.target_dir.display()
    );

    let executor = RunExecutor::new(archiver, &config.paths.source_dir, &config.paths.target_dir);
    let sweeper = Sweeper::new(&config.paths.target_dir);
    let mut scheduler = CampaignScheduler::new(executor, log, sweeper);

    let campaigns = scheduler.run(campaign::campaign_queue(config)).await?;

    Ok(BenchmarkReport {
        source_size,
        campaigns,
    })
}
