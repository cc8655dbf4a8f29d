//! Utility modules for archive benchmarks

use std::time::{Duration, Instant};

/// Timer utility for measuring execution time
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time in milliseconds with sub-millisecond precision
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_nanos() as f64 / 1_000_000.0
    }
}

/// Statistical utilities
pub mod stats {
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    pub fn percentile(values: &[f64], p: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let len = sorted.len();
        let index = ((len as f64 - 1.0) * p / 100.0).round() as usize;
        sorted[index.min(len - 1)]
    }

    pub fn max(values: &[f64]) -> f64 {
        values.iter().copied().fold(0.0, f64::max)
    }

    /// Compressed size as a percentage of the uncompressed size
    pub fn compression_ratio(compressed: u64, uncompressed: u64) -> f64 {
        if uncompressed == 0 {
            return 0.0;
        }
        compressed as f64 / uncompressed as f64 * 100.0
    }
}

/// Format utilities
pub mod format {
    use std::time::Duration;

    pub fn duration_human(duration: Duration) -> String {
        let total_secs = duration.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        let millis = duration.subsec_millis();

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else if seconds > 0 {
            format!("{}.{:03}s", seconds, millis)
        } else {
            format!("{}ms", duration.as_millis())
        }
    }

    pub fn bytes_human(bytes: f64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

        if bytes < 1.0 {
            return "0 B".to_string();
        }

        let i = (bytes.log10() / 3.0).floor() as usize;
        let size = bytes / 1000_f64.powi(i as i32);

        if i < UNITS.len() {
            format!("{:.2} {}", size, UNITS[i])
        } else {
            format!("{:.2} PB", bytes / 1000_f64.powi(5))
        }
    }
}
