//! Archive Benchmark Runner
//!
//! Runs the Gzip vs Brotli archiving campaigns and prints a summary report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use archive_benchmarks::{config::parse_rates, run_benchmark, BenchmarkReport, Config};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "archive-bench")]
#[command(about = "Gzip vs Brotli directory archiving benchmark")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "archive_bench.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit diagnostics as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the single-event campaign followed by every rate campaign
    Run {
        /// Duration of each rate campaign in seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Comma separated events-per-second rates, e.g. 10,50,100
        #[arg(short, long)]
        rates: Option<String>,

        /// Directory to archive
        #[arg(long)]
        source: Option<PathBuf>,

        /// Directory receiving the archives
        #[arg(long)]
        target: Option<PathBuf>,

        /// Results log, appended to
        #[arg(long)]
        log: Option<PathBuf>,

        /// Report format
        #[arg(short, long, default_value = "json")]
        output: String,

        /// Report file; stdout when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Validate benchmark configuration
    Validate,
    /// Generate sample configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(&cli)?;

    match &cli.command {
        Commands::Run {
            duration,
            rates,
            source,
            target,
            log,
            output,
            file,
        } => {
            let mut config = load_configuration(&cli)?;
            if let Some(duration) = duration {
                config.benchmark.duration_seconds = *duration;
            }
            if let Some(rates) = rates {
                config.benchmark.event_rates = parse_rates(rates)?;
            }
            if let Some(source) = source {
                config.paths.source_dir = source.clone();
            }
            if let Some(target) = target {
                config.paths.target_dir = target.clone();
            }
            if let Some(log) = log {
                config.paths.log_path = log.clone();
            }
            run_command(config, output, file.as_deref()).await?;
        }
        Commands::Validate => {
            validate_config_command(&cli)?;
        }
        Commands::Config => {
            generate_config_command(&cli)?;
        }
    }

    Ok(())
}

fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("archive_benchmarks={}", level).parse()?)
        .add_directive(format!("archive_bench={}", level).parse()?);

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }

    Ok(())
}

/// Configuration file if present, defaults otherwise, then `BENCHMARK_*` overrides
fn load_configuration(cli: &Cli) -> Result<Config> {
    let mut config = if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        Config::load_from_file(&cli.config)?
    } else {
        info!("Using default configuration");
        Config::default()
    };
    config.apply_env()?;
    Ok(config)
}

async fn run_command(config: Config, output: &str, file: Option<&std::path::Path>) -> Result<()> {
    info!(
        "Running campaigns at {:?} events/s, {} s each",
        config.benchmark.event_rates, config.benchmark.duration_seconds
    );

    let report = run_benchmark(&config)
        .await
        .map_err(|e| {
            error!(category = e.category(), recoverable = e.is_recoverable(), "Benchmark aborted: {}", e);
            e
        })
        .context("benchmark aborted")?;

    for campaign in &report.campaigns {
        let rate = campaign
            .rate
            .map(|rate| format!("{} events/s", rate))
            .unwrap_or_else(|| "single event".to_string());
        for latency in &campaign.latency {
            info!(
                "[{}] {}: {} runs, mean {:.4} ms, p95 {:.4} ms",
                rate, latency.algorithm, latency.runs, latency.latency.mean_ms, latency.latency.p95_ms
            );
        }
    }

    let failed = report.failed_runs();
    if failed > 0 {
        warn!("{} archive runs failed", failed);
    }
    info!("Results appended to {}", config.paths.log_path.display());

    output_report(&report, output, file)
}

fn validate_config_command(cli: &Cli) -> Result<()> {
    info!("Validating configuration file: {}", cli.config.display());

    match Config::load_from_file(&cli.config) {
        Ok(config) => {
            config.validate()?;
            info!("Configuration file is valid");
        }
        Err(e) => {
            warn!("Configuration file is invalid: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

fn generate_config_command(cli: &Cli) -> Result<()> {
    Config::default().save_to_file(&cli.config)?;
    info!("Generated sample configuration: {}", cli.config.display());
    Ok(())
}

fn output_report(report: &BenchmarkReport, format: &str, output_file: Option<&std::path::Path>) -> Result<()> {
    let output = match format {
        "json" => serde_json::to_string_pretty(report)?,
        "csv" => report_to_csv(report),
        _ => return Err(anyhow::anyhow!("Unsupported output format: {}", format)),
    };

    if let Some(file_path) = output_file {
        std::fs::write(file_path, output)?;
        info!("Report written to: {}", file_path.display());
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn report_to_csv(report: &BenchmarkReport) -> String {
    let mut csv = String::new();
    csv.push_str("campaign,rate,completed_ticks,failed_runs,algorithm,runs,mean_ms,p50_ms,p95_ms,p99_ms,max_ms\n");

    for campaign in &report.campaigns {
        for latency in &campaign.latency {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4}\n",
                campaign.kind,
                campaign.rate.map(|rate| rate.to_string()).unwrap_or_default(),
                campaign.completed_ticks,
                campaign.failed_runs,
                latency.algorithm,
                latency.runs,
                latency.latency.mean_ms,
                latency.latency.p50_ms,
                latency.latency.p95_ms,
                latency.latency.p99_ms,
                latency.latency.max_ms,
            ));
        }
    }

    csv
}
