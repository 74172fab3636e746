//! Shared data types
//!
//! Types used across the profiler, the trial loop, the aggregator and the reporters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One of the two fixed algorithm slots of the benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmSlot {
    /// Classical elliptic-curve scheme (ECDSA), the baseline
    Classical,
    /// Lattice-based post-quantum scheme (Dilithium)
    PostQuantum,
}

impl AlgorithmSlot {
    pub const ALL: [AlgorithmSlot; 2] = [AlgorithmSlot::Classical, AlgorithmSlot::PostQuantum];

    /// Label used in reports and charts
    pub fn label(self) -> &'static str {
        match self {
            AlgorithmSlot::Classical => "ECDSA",
            AlgorithmSlot::PostQuantum => "Dilithium",
        }
    }

    fn key(self) -> &'static str {
        match self {
            AlgorithmSlot::Classical => "ecdsa",
            AlgorithmSlot::PostQuantum => "dilithium",
        }
    }
}

/// Measured operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Sign,
    Verify,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::Sign, Operation::Verify];

    pub fn label(self) -> &'static str {
        match self {
            Operation::Sign => "Sign",
            Operation::Verify => "Verify",
        }
    }
}

/// Measured quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Wall-clock seconds
    Time,
    /// Peak allocated bytes
    Memory,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Time, Metric::Memory];
}

/// Key of one metric series: `(algorithm, operation, metric)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub algorithm: AlgorithmSlot,
    pub operation: Operation,
    pub metric: Metric,
}

impl SeriesKey {
    pub const fn new(algorithm: AlgorithmSlot, operation: Operation, metric: Metric) -> Self {
        Self {
            algorithm,
            operation,
            metric,
        }
    }

    /// All 8 series keys in report order
    pub fn all() -> Vec<SeriesKey> {
        let mut keys = Vec::with_capacity(8);
        for algorithm in AlgorithmSlot::ALL {
            for operation in Operation::ALL {
                for metric in Metric::ALL {
                    keys.push(SeriesKey::new(algorithm, operation, metric));
                }
            }
        }
        keys
    }
}

impl fmt::Display for SeriesKey {
    /// Stable series name, e.g. `ecdsa_sign_times`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation = match self.operation {
            Operation::Sign => "sign",
            Operation::Verify => "verify",
        };
        let metric = match self.metric {
            Metric::Time => "times",
            Metric::Memory => "mems",
        };
        write!(f, "{}_{}_{}", self.algorithm.key(), operation, metric)
    }
}

/// One instrumented measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Elapsed wall-clock seconds
    pub duration: f64,
    /// Peak bytes allocated during the call
    pub peak_memory: u64,
}

impl Sample {
    pub fn new(elapsed: Duration, peak_memory: usize) -> Self {
        Self {
            duration: elapsed.as_secs_f64(),
            peak_memory: peak_memory as u64,
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Time => self.duration,
            Metric::Memory => self.peak_memory as f64,
        }
    }
}

/// Immutable parameters of one benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of trials
    pub num_runs: usize,
    /// Byte length of the input message
    pub message_size: usize,
}

/// Benchmark configuration
///
/// Loaded from an optional file and `SIGBENCH_*` environment variables,
/// see [`crate::config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Number of trials
    pub num_runs: usize,

    /// Input message file, read once at startup
    pub message_path: PathBuf,

    /// Output directory for reports and charts (created if absent)
    pub results_dir: PathBuf,

    /// Text report file name inside `results_dir`
    pub results_file: String,

    /// Dilithium NIST security level
    pub dilithium_level: u8,

    /// ECDSA named curve
    pub ecdsa_curve: String,

    /// Render the two SVG charts
    pub generate_charts: bool,

    /// Write `results.json` next to the text report
    pub export_json: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            num_runs: 100,
            message_path: PathBuf::from("message.txt"),
            results_dir: PathBuf::from("results"),
            results_file: "results.txt".to_string(),
            dilithium_level: sig_provider::dilithium::DEFAULT_SECURITY_LEVEL,
            ecdsa_curve: sig_provider::ecdsa::DEFAULT_CURVE.to_string(),
            generate_charts: true,
            export_json: true,
        }
    }
}

impl BenchConfig {
    pub fn results_path(&self) -> PathBuf {
        self.results_dir.join(&self.results_file)
    }
}
