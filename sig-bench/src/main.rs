//! ECDSA vs Dilithium benchmark
//!
//! 1. Load configuration (file, `SIGBENCH_*` environment, CLI overrides)
//! 2. Construct both signature providers
//! 3. Run the trials and measure sign/verify time and peak memory
//! 4. Print the means and write the text report, JSON report and charts

use anyhow::{Context, Result};
use clap::Parser;
use sig_bench::config;
use sig_bench::profiler::TrackingAllocator;
use sig_bench::{BenchConfig, Benchmark};
use std::alloc::System;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

static SYSTEM_ALLOC: System = System;

#[global_allocator]
static GLOBAL: TrackingAllocator<System> = TrackingAllocator::new(&SYSTEM_ALLOC);

/// Compare ECDSA and Dilithium signing and verification cost
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "sigbench.toml")]
    config: PathBuf,

    /// Message file to sign (overrides config file)
    #[arg(short, long)]
    message: Option<PathBuf>,

    /// Number of trials (overrides config file)
    #[arg(short = 'n', long)]
    runs: Option<usize>,

    /// Output directory (overrides config file)
    #[arg(short, long)]
    results_dir: Option<PathBuf>,

    /// Dilithium security level: 2, 3 or 5 (overrides config file)
    #[arg(long)]
    level: Option<u8>,

    /// ECDSA curve: secp256k1 or P-256 (overrides config file)
    #[arg(long)]
    curve: Option<String>,

    /// Skip chart rendering
    #[arg(long, default_value_t = false)]
    no_charts: bool,

    /// Skip the JSON report
    #[arg(long, default_value_t = false)]
    no_json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Initialize logging
    init_logging(&args.log_level)?;

    info!("🚀 Starting sig-bench v{}", env!("CARGO_PKG_VERSION"));
    info!("──────────────────────────────────────────────");

    // 2. Load configuration
    let mut config = load_configuration(&args.config)?;

    // Command line arguments override config file
    if let Some(message) = args.message {
        config.message_path = message;
    }
    if let Some(runs) = args.runs {
        config.num_runs = runs;
    }
    if let Some(results_dir) = args.results_dir {
        config.results_dir = results_dir;
    }
    if let Some(level) = args.level {
        config.dilithium_level = level;
    }
    if let Some(curve) = args.curve {
        config.ecdsa_curve = curve;
    }
    if args.no_charts {
        config.generate_charts = false;
    }
    if args.no_json {
        config.export_json = false;
    }

    log_configuration(&config);

    // 3. Construct providers
    let benchmark = match Benchmark::new(config) {
        Ok(benchmark) => benchmark,
        Err(e) if e.is_startup_failure() => {
            error!("❌ Cannot start benchmark: {}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to set up benchmark"),
    };

    // 4. Run
    let outcome = benchmark.run().context("Benchmark run failed")?;

    if outcome.stats.trials_skipped > 0 {
        warn!(
            "⚠️  {} of {} trials skipped",
            outcome.stats.trials_skipped, outcome.stats.trials_run
        );
    }
    for artifact in &outcome.artifacts {
        info!("   - {}", artifact.display());
    }

    info!("👋 Benchmark finished");
    Ok(())
}

/// Initialize logging system
///
/// Logs go to stderr; stdout carries the results table.
fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => {
            eprintln!("⚠️  Unknown log level: {}, using INFO", log_level);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

/// Load configuration file, falling back to environment and defaults
fn load_configuration(config_path: &Path) -> Result<BenchConfig> {
    info!("📋 Loading configuration: {}", config_path.display());

    if !config_path.exists() {
        warn!("Configuration file does not exist, using environment and defaults");
        return config::load_config_from_env().context("Failed to load configuration");
    }

    config::load_config(config_path).context("Failed to load configuration")
}

fn log_configuration(config: &BenchConfig) {
    info!("🔍 Configuration:");
    info!("   - Runs: {}", config.num_runs);
    info!("   - Message: {}", config.message_path.display());
    info!("   - Results: {}", config.results_path().display());
    info!("   - ECDSA curve: {}", config.ecdsa_curve);
    info!("   - Dilithium level: {}", config.dilithium_level);
    info!(
        "   - Charts: {}",
        if config.generate_charts {
            "Enabled"
        } else {
            "Disabled"
        }
    );
}
