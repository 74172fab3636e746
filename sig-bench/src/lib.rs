//! ECDSA vs Dilithium 簽名基準測試
//!
//! Runs repeated sign/verify trials for a classical and a post-quantum
//! signature scheme, measuring wall-clock time and peak heap usage of every
//! operation, and reports the per-operation means.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  Benchmark   │  ← runner: config, providers, artifacts
//! └──────┬───────┘
//!        │
//!   ┌────┴──────┬────────────┬──────────┐
//!   ▼           ▼            ▼          ▼
//! TrialLoop  Aggregator   Reporter    Charts
//!   │
//!   ▼
//! InstrumentedRunner → MemoryProfiler
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sig_bench::{Benchmark, BenchConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BenchConfig {
//!         num_runs: 10,
//!         ..BenchConfig::default()
//!     };
//!     let outcome = Benchmark::new(config)?.run()?;
//!     println!("{} trials skipped", outcome.stats.trials_skipped);
//!     Ok(())
//! }
//! ```
//!
//! Memory figures are only meaningful when the binary installs
//! [`profiler::TrackingAllocator`] as its global allocator.

// 公開模塊
pub mod aggregate; // 均值匯總
pub mod chart; // SVG 圖表
pub mod config;
pub mod error;
pub mod measure;
pub mod profiler; // 追蹤分配器
pub mod report;
pub mod runner;
pub mod sampler;
pub mod types;

// Re-export 常用類型
pub use aggregate::{aggregate, AggregateReport, SeriesSummary};
pub use error::{BenchError, Result};
pub use measure::{InstrumentedRunner, Measured};
pub use runner::{BenchOutcome, Benchmark};
pub use sampler::{MetricSeries, TrialLoop, TrialStats};
pub use types::{AlgorithmSlot, BenchConfig, Metric, Operation, RunConfig, Sample, SeriesKey};
