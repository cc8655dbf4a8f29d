//! Configuration management for archive benchmarks

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Highest accepted events-per-second rate; one tick per nanosecond
pub const MAX_EVENT_RATE: u32 = 1_000_000_000;

/// Main benchmark configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub benchmark: BenchmarkSettings,
    pub paths: PathSettings,
    pub compression: CompressionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// Length of every multi-event campaign
    pub duration_seconds: u64,
    /// Events per second, one campaign per entry, run in order
    pub event_rates: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    /// flate2 level, 0-9
    pub gzip_level: u32,
    /// brotli quality, 0-11
    pub brotli_quality: u32,
    /// brotli window size (log2), 10-24
    pub brotli_window: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            benchmark: BenchmarkSettings::default(),
            paths: PathSettings::default(),
            compression: CompressionSettings::default(),
        }
    }
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            duration_seconds: 60,
            event_rates: vec![10, 50, 100],
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./files"),
            target_dir: PathBuf::from("./compressed"),
            log_path: PathBuf::from("./log.txt"),
        }
    }
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            gzip_level: 6,
            brotli_quality: 11,
            brotli_window: 22,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::ValidationFailed {
            reason: format!("cannot write {}: {}", path.as_ref().display(), e),
        })
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn load_from_env() -> ConfigResult<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `BENCHMARK_*` environment variables
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        if let Ok(duration) = std::env::var("BENCHMARK_DURATION") {
            self.benchmark.duration_seconds = duration.trim().parse().map_err(|_| {
                ConfigError::InvalidValue {
                    field: "BENCHMARK_DURATION".to_string(),
                    value: duration.clone(),
                }
            })?;
        }

        if let Ok(rates) = std::env::var("BENCHMARK_RATES") {
            self.benchmark.event_rates = parse_rates(&rates)?;
        }

        if let Ok(source) = std::env::var("BENCHMARK_SOURCE_DIR") {
            self.paths.source_dir = PathBuf::from(source);
        }

        if let Ok(target) = std::env::var("BENCHMARK_TARGET_DIR") {
            self.paths.target_dir = PathBuf::from(target);
        }

        if let Ok(log) = std::env::var("BENCHMARK_LOG_PATH") {
            self.paths.log_path = PathBuf::from(log);
        }

        Ok(())
    }

    /// Campaign duration as a `Duration`
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.benchmark.duration_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.benchmark.duration_seconds == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "Benchmark duration must be greater than 0".to_string(),
            });
        }

        if self.benchmark.event_rates.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "At least one event rate is required".to_string(),
            });
        }

        if let Some(rate) = self
            .benchmark
            .event_rates
            .iter()
            .find(|rate| **rate == 0 || **rate > MAX_EVENT_RATE)
        {
            return Err(ConfigError::InvalidValue {
                field: "benchmark.event_rates".to_string(),
                value: rate.to_string(),
            });
        }

        if self.compression.gzip_level > 9 {
            return Err(ConfigError::InvalidValue {
                field: "compression.gzip_level".to_string(),
                value: self.compression.gzip_level.to_string(),
            });
        }

        if self.compression.brotli_quality > 11 {
            return Err(ConfigError::InvalidValue {
                field: "compression.brotli_quality".to_string(),
                value: self.compression.brotli_quality.to_string(),
            });
        }

        if !(10..=24).contains(&self.compression.brotli_window) {
            return Err(ConfigError::InvalidValue {
                field: "compression.brotli_window".to_string(),
                value: self.compression.brotli_window.to_string(),
            });
        }

        if self.paths.source_dir == self.paths.target_dir {
            return Err(ConfigError::ValidationFailed {
                reason: "Source and target directories must differ".to_string(),
            });
        }

        Ok(())
    }
}

/// Parse a comma separated list of event rates, e.g. `10,50,100`
pub fn parse_rates(input: &str) -> ConfigResult<Vec<u32>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                field: "event_rates".to_string(),
                value: part.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = Config::default();
        assert_eq!(config.benchmark.duration_seconds, 60);
        assert_eq!(config.benchmark.event_rates, vec![10, 50, 100]);
        assert_eq!(config.duration(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = Config::default();
        config.benchmark.duration_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.benchmark.event_rates = vec![10, 0];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref value, .. }) if value == "0"
        ));

        let mut config = Config::default();
        config.benchmark.event_rates.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_sub_nanosecond_rates() {
        let mut config = Config::default();
        config.benchmark.event_rates = vec![MAX_EVENT_RATE];
        assert!(config.validate().is_ok());

        config.benchmark.event_rates = vec![10, 2_000_000_000];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, ref value })
                if field == "benchmark.event_rates" && value == "2000000000"
        ));
    }

    #[test]
    fn test_validation_rejects_shared_directory() {
        let mut config = Config::default();
        config.paths.target_dir = config.paths.source_dir.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip_and_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("archive_bench.toml");

        let mut config = Config::default();
        config.benchmark.event_rates = vec![2, 4];
        config.save_to_file(&path).unwrap();
        assert_eq!(Config::load_from_file(&path).unwrap(), config);

        std::fs::write(&path, "[benchmark]\nduration_seconds = 5\n").unwrap();
        let partial = Config::load_from_file(&path).unwrap();
        assert_eq!(partial.benchmark.duration_seconds, 5);
        assert_eq!(partial.benchmark.event_rates, vec![10, 50, 100]);
        assert_eq!(partial.compression, CompressionSettings::default());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load_from_file("/nonexistent/archive_bench.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_rates() {
        assert_eq!(parse_rates("10, 50,100").unwrap(), vec![10, 50, 100]);
        assert_eq!(parse_rates("2,").unwrap(), vec![2]);
        assert!(parse_rates("10,fast").is_err());
    }
}
