//! Campaign scheduling
//!
//! A benchmark is a queue of campaigns consumed one at a time by
//! [`CampaignScheduler::run`]. The single-event campaign archives the source
//! once per algorithm and reports sizes; each multi-event campaign ticks at a
//! fixed rate for a fixed duration and reports timings only. The next campaign
//! starts only after the previous one has finished and swept the target
//! directory, so campaigns never contend for it.
//!
//! Log writes, artifact stats and sweeps go through `tokio::fs`, so the
//! driver never blocks its thread on I/O.
//!
//! A stuck archiver stalls its tick indefinitely; no run has a timeout.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use tokio::io::AsyncWrite;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::algorithm::Algorithm;
use crate::archiver::Archiver;
use crate::config::Config;
use crate::error::Result;
use crate::executor::{Measurement, RunExecutor};
use crate::stats_log::StatsLog;
use crate::sweeper::{SweepReport, Sweeper};
use crate::utils::{format, Timer};
use crate::{AlgorithmLatency, CampaignKind, CampaignReport};

/// One scheduled phase of a benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Campaign {
    SingleEvent,
    MultiEvent { rate: u32, duration: Duration },
}

/// Where the scheduler currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignPhase {
    Idle,
    SingleEventRunning,
    SingleEventDone,
    MultiEventRunning { rate: u32 },
    MultiEventDone { rate: u32 },
}

/// Build the campaign queue for `config`: the single-event pass, then one
/// multi-event campaign per configured rate, in order.
pub fn campaign_queue(config: &Config) -> VecDeque<Campaign> {
    let duration = config.duration();
    std::iter::once(Campaign::SingleEvent)
        .chain(
            config
                .benchmark
                .event_rates
                .iter()
                .map(|&rate| Campaign::MultiEvent { rate, duration }),
        )
        .collect()
}

/// The single-event pass always runs, and counts, as exactly one tick
const SINGLE_EVENT_TICKS: u64 = 1;

/// Ticks a campaign performs: `rate × duration`
pub fn target_ticks(rate: u32, duration: Duration) -> u64 {
    (f64::from(rate) * duration.as_secs_f64()).round() as u64
}

/// Spacing between ticks: `1000 / rate` milliseconds, never below 1 ns
pub fn tick_period(rate: u32) -> Duration {
    Duration::from_nanos((1_000_000_000 / u64::from(rate.max(1))).max(1))
}

/// Recurring timer driving a multi-event campaign.
///
/// The first tick fires one period after creation. Late ticks are fired in a
/// burst rather than skipped, so overrunning ticks drift but are never lost.
#[derive(Debug)]
pub struct TickTimer {
    interval: Option<Interval>,
}

impl TickTimer {
    pub fn every(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        Self {
            interval: Some(interval),
        }
    }

    /// Wait for the next tick. Returns `false` at once if cancelled.
    pub async fn tick(&mut self) -> bool {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
                true
            }
            None => false,
        }
    }

    /// Stop further ticks. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if self.interval.take().is_some() {
            tracing::trace!("Tick timer cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.interval.is_none()
    }
}

/// Mutable state of one running multi-event campaign
#[derive(Debug)]
pub struct CampaignState {
    pub target_ticks: u64,
    pub completed_ticks: u64,
    pub timer: TickTimer,
}

impl CampaignState {
    pub fn new(rate: u32, duration: Duration) -> Self {
        Self {
            target_ticks: target_ticks(rate, duration),
            completed_ticks: 0,
            timer: TickTimer::every(tick_period(rate)),
        }
    }

    /// Count a finished tick; `true` once the target is reached
    pub fn record_tick(&mut self) -> bool {
        self.completed_ticks += 1;
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.completed_ticks >= self.target_ticks
    }
}

/// Per-algorithm timings gathered during one campaign
#[derive(Debug, Default)]
struct LatencySamples {
    gzip: Vec<f64>,
    brotli: Vec<f64>,
}

impl LatencySamples {
    fn record(&mut self, measurement: &Measurement) {
        match measurement.algorithm {
            Algorithm::Gzip => self.gzip.push(measurement.elapsed_ms),
            Algorithm::Brotli => self.brotli.push(measurement.elapsed_ms),
        }
    }

    fn summarize(&self) -> Vec<AlgorithmLatency> {
        vec![
            AlgorithmLatency::from_samples(Algorithm::Gzip, &self.gzip),
            AlgorithmLatency::from_samples(Algorithm::Brotli, &self.brotli),
        ]
    }
}

/// Drives campaigns over one shared target directory
pub struct CampaignScheduler<A, W> {
    executor: RunExecutor<A>,
    log: StatsLog<W>,
    sweeper: Sweeper,
    phase: CampaignPhase,
}

impl<A: Archiver, W: AsyncWrite + Unpin> CampaignScheduler<A, W> {
    pub fn new(executor: RunExecutor<A>, log: StatsLog<W>, sweeper: Sweeper) -> Self {
        Self {
            executor,
            log,
            sweeper,
            phase: CampaignPhase::Idle,
        }
    }

    pub fn phase(&self) -> CampaignPhase {
        self.phase
    }

    pub fn into_log(self) -> StatsLog<W> {
        self.log
    }

    /// Run every queued campaign to completion, strictly one after another
    pub async fn run(&mut self, mut queue: VecDeque<Campaign>) -> Result<Vec<CampaignReport>> {
        let mut reports = Vec::with_capacity(queue.len());

        while let Some(campaign) = queue.pop_front() {
            let report = match campaign {
                Campaign::SingleEvent => self.run_single_event().await?,
                Campaign::MultiEvent { rate, duration } => self.run_multi_event(rate, duration).await?,
            };
            reports.push(report);
        }

        Ok(reports)
    }

    /// Archive once per algorithm, log size-aware stats, sweep
    pub async fn run_single_event(&mut self) -> Result<CampaignReport> {
        self.phase = CampaignPhase::SingleEventRunning;
        tracing::info!("Starting single event campaign");

        let started_at = Utc::now();
        let timer = Timer::start();
        self.log.line("Single event compression").await?;

        let mut samples = LatencySamples::default();
        let mut failed_runs = 0;
        let mut measurements = Vec::with_capacity(Algorithm::ALL.len());

        // Both artifacts must be complete before either is stat'ed.
        for algorithm in Algorithm::ALL {
            match self.executor.run_once(algorithm).await {
                Ok(measurement) => {
                    samples.record(&measurement);
                    measurements.push(measurement);
                }
                Err(e) => {
                    failed_runs += 1;
                    tracing::error!("Single event {} run failed: {}", algorithm, e);
                }
            }
        }

        for measurement in &measurements {
            self.log.log_stats(measurement).await?;
        }

        let sweep = self.sweep(None).await;
        self.phase = CampaignPhase::SingleEventDone;
        tracing::info!("Single event campaign finished in {}", format::duration_human(timer.elapsed()));

        Ok(CampaignReport {
            kind: CampaignKind::SingleEvent,
            rate: None,
            target_ticks: SINGLE_EVENT_TICKS,
            completed_ticks: SINGLE_EVENT_TICKS,
            failed_runs,
            latency: samples.summarize(),
            sweep,
            started_at,
            finished_at: Utc::now(),
            elapsed_ms: timer.elapsed_ms(),
        })
    }

    /// Tick at `rate` events per second for `duration`, logging timings only
    pub async fn run_multi_event(&mut self, rate: u32, duration: Duration) -> Result<CampaignReport> {
        self.phase = CampaignPhase::MultiEventRunning { rate };
        tracing::info!("Starting multi event campaign: {} events/s for {:?}", rate, duration);

        let started_at = Utc::now();
        let timer = Timer::start();
        self.log.line("Multiple event compression").await?;
        self.log.line(&format!("\t{} events per second", rate)).await?;

        let mut state = CampaignState::new(rate, duration);
        let mut samples = LatencySamples::default();
        let mut failed_runs = 0;
        let mut sweep = None;

        if state.is_complete() {
            sweep = self.sweep(Some(&mut state.timer)).await;
        }

        while state.timer.tick().await {
            self.log.line(&format!(
                "\t  Event {} of {}",
                state.completed_ticks + 1,
                state.target_ticks
            ))
            .await?;

            for algorithm in Algorithm::ALL {
                match self.executor.run_once(algorithm).await {
                    Ok(measurement) => {
                        samples.record(&measurement);
                        self.log.log_stats(&measurement.time_only()).await?;
                    }
                    Err(e) => {
                        failed_runs += 1;
                        tracing::error!("{} events/s tick {} {} run failed: {}", rate, state.completed_ticks + 1, algorithm, e);
                    }
                }
            }

            if state.record_tick() {
                sweep = self.sweep(Some(&mut state.timer)).await;
            }
        }

        let completed_ticks = state.completed_ticks;
        self.phase = CampaignPhase::MultiEventDone { rate };
        tracing::info!(
            "Multi event campaign at {} events/s finished: {} ticks in {}",
            rate,
            completed_ticks,
            format::duration_human(timer.elapsed())
        );

        Ok(CampaignReport {
            kind: CampaignKind::MultiEvent,
            rate: Some(rate),
            target_ticks: state.target_ticks,
            completed_ticks,
            failed_runs,
            latency: samples.summarize(),
            sweep,
            started_at,
            finished_at: Utc::now(),
            elapsed_ms: timer.elapsed_ms(),
        })
    }

    /// Sweep the target directory; an unreadable directory is reported and skipped
    async fn sweep(&self, timer: Option<&mut TickTimer>) -> Option<SweepReport> {
        match self.sweeper.sweep(timer).await {
            Ok(report) => {
                if !report.is_clean() {
                    tracing::warn!("Sweep left {} entries behind", report.failures.len());
                }
                Some(report)
            }
            Err(e) => {
                tracing::error!(category = e.category(), "Sweep skipped: {}", e);
                None
            }
        }
    }
}
