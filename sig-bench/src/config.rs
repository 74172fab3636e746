//! Configuration management
//!
//! Loads and validates the benchmark configuration. Values come from a
//! configuration file (TOML, JSON or YAML) layered under `SIGBENCH_*`
//! environment variables; fields missing from both keep their defaults.

use crate::error::{BenchError, Result};
use crate::types::BenchConfig;
use config::{Config, Environment, File};
use std::path::Path;

/// Environment variable prefix, e.g. `SIGBENCH_NUM_RUNS=10`
pub const ENV_PREFIX: &str = "SIGBENCH";

/// Load the benchmark configuration from a file
///
/// # Parameters
/// - `config_path`: configuration file path (TOML, JSON or YAML)
///
/// # Returns
/// - `Ok(BenchConfig)`: loaded and validated configuration
/// - `Err(BenchError::Config)`: malformed file or invalid values
///
/// # Example
/// ```no_run
/// use sig_bench::config::load_config;
///
/// let config = load_config("sigbench.toml").expect("Failed to load config");
/// println!("Runs: {}", config.num_runs);
/// ```
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<BenchConfig> {
    let config = Config::builder()
        .add_source(File::from(config_path.as_ref()))
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()
        .map_err(|e| BenchError::Config(format!("Failed to load config file: {}", e)))?;

    let bench_config: BenchConfig = config
        .try_deserialize()
        .map_err(|e| BenchError::Config(format!("Failed to parse config: {}", e)))?;

    validate_config(&bench_config)?;

    Ok(bench_config)
}

/// Load the configuration from environment variables only
///
/// Environment variable prefix: `SIGBENCH_`
/// Example: `SIGBENCH_NUM_RUNS`, `SIGBENCH_DILITHIUM_LEVEL`
pub fn load_config_from_env() -> Result<BenchConfig> {
    let config = Config::builder()
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()
        .map_err(|e| BenchError::Config(format!("Failed to load env vars: {}", e)))?;

    let bench_config: BenchConfig = config
        .try_deserialize()
        .map_err(|e| BenchError::Config(format!("Failed to parse env config: {}", e)))?;

    validate_config(&bench_config)?;

    Ok(bench_config)
}

/// Validate the configuration
///
/// Checks:
/// - at least one trial is requested
/// - the report file name is a bare file name
/// - the curve name is not blank
pub fn validate_config(config: &BenchConfig) -> Result<()> {
    if config.num_runs == 0 {
        return Err(BenchError::Config(
            "num_runs must be greater than 0".to_string(),
        ));
    }

    let file_name = Path::new(&config.results_file);
    let is_plain_name = file_name
        .file_name()
        .map_or(false, |name| name == file_name.as_os_str());
    if config.results_file.trim().is_empty() || !is_plain_name {
        return Err(BenchError::Config(format!(
            "results_file must be a plain file name, got {:?}",
            config.results_file
        )));
    }

    if config.ecdsa_curve.trim().is_empty() {
        return Err(BenchError::Config(
            "ecdsa_curve must not be empty".to_string(),
        ));
    }

    Ok(())
}
