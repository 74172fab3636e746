//! Benchmark driver
//!
//! Wires the providers, the trial loop, the aggregator and the reporters
//! into one run:
//! 1. Construct both signature providers (fatal when unavailable)
//! 2. Read the message file once
//! 3. Create the results directory
//! 4. Run the trial loop
//! 5. Aggregate, print and persist the results

use crate::aggregate::{aggregate, AggregateReport};
use crate::chart;
use crate::config::validate_config;
use crate::error::{BenchError, Result};
use crate::measure::InstrumentedRunner;
use crate::report::{self, RunSummary};
use crate::sampler::{TrialLoop, TrialStats};
use crate::types::{BenchConfig, RunConfig};
use sig_provider::{DilithiumProvider, EcdsaProvider, SignatureProvider};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Results of a finished run
#[derive(Debug, Clone)]
pub struct BenchOutcome {
    pub run: RunConfig,
    pub stats: TrialStats,
    pub report: AggregateReport,
    /// Files written to the results directory
    pub artifacts: Vec<PathBuf>,
}

/// Read the whole message file as raw bytes
pub fn read_message(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        error!("❌ Cannot read message file {}: {}", path.display(), e);
        BenchError::Io(e)
    })
}

/// A configured benchmark with both providers ready
pub struct Benchmark {
    config: BenchConfig,
    classical: Box<dyn SignatureProvider>,
    post_quantum: Box<dyn SignatureProvider>,
}

impl Benchmark {
    /// Validate the configuration and construct the providers
    ///
    /// Fails when the configuration is invalid or either algorithm is not
    /// available. Nothing is written to disk in that case.
    pub fn new(config: BenchConfig) -> Result<Self> {
        validate_config(&config)?;

        let classical = EcdsaProvider::new(&config.ecdsa_curve).map_err(|e| {
            error!("❌ ECDSA provider unavailable: {}", e);
            BenchError::from(e)
        })?;
        let post_quantum = DilithiumProvider::new(config.dilithium_level).map_err(|e| {
            error!("❌ Dilithium provider unavailable: {}", e);
            BenchError::from(e)
        })?;
        if let Some(variant) = post_quantum.variant() {
            let info = DilithiumProvider::algorithm_info(variant);
            info!(
                "   - {}: pk={} bytes, sk={} bytes, sig={} bytes",
                info.name, info.public_key_size, info.secret_key_size, info.signature_size
            );
        }

        Ok(Self::with_providers(
            config,
            Box::new(classical),
            Box::new(post_quantum),
        ))
    }

    /// Build a benchmark around already constructed providers
    pub fn with_providers(
        config: BenchConfig,
        classical: Box<dyn SignatureProvider>,
        post_quantum: Box<dyn SignatureProvider>,
    ) -> Self {
        Self {
            config,
            classical,
            post_quantum,
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn run(&self) -> Result<BenchOutcome> {
        info!(
            "⚙️  {} vs {}, {} runs",
            self.classical.algorithm_name(),
            self.post_quantum.algorithm_name(),
            self.config.num_runs
        );

        let message = read_message(&self.config.message_path)?;
        info!(
            "📄 Message loaded: {} ({} bytes)",
            self.config.message_path.display(),
            message.len()
        );

        fs::create_dir_all(&self.config.results_dir)?;

        let run = RunConfig {
            num_runs: self.config.num_runs,
            message_size: message.len(),
        };

        let mut runner = InstrumentedRunner::new();
        if !runner.tracks_memory() {
            warn!("Tracking allocator not installed, memory figures will be 0");
        }

        let outcome = TrialLoop::new(
            self.classical.as_ref(),
            self.post_quantum.as_ref(),
            &mut runner,
        )
        .run(&message, run.num_runs);
        drop(runner);

        let report = aggregate(&outcome.series);
        let summary = RunSummary {
            run,
            classical_name: self.classical.algorithm_name(),
            post_quantum_name: self.post_quantum.algorithm_name(),
            stats: &outcome.stats,
            report: &report,
        };

        report::print_results(&summary)?;

        let mut artifacts = Vec::new();
        let results_path = self.config.results_path();
        report::save_results_to_file(&summary, &results_path)?;
        artifacts.push(results_path);

        if self.config.export_json {
            report::export_json(&summary, &self.config.results_dir)?;
            artifacts.push(self.config.results_dir.join(report::JSON_REPORT_FILE));
        }

        if self.config.generate_charts {
            artifacts.extend(chart::render_charts(&report, &self.config.results_dir)?);
        }

        Ok(BenchOutcome {
            run,
            stats: outcome.stats,
            report,
            artifacts,
        })
    }
}
