//! Instrumented operation runner
//!
//! Runs one closure and records its elapsed wall-clock time and the peak
//! heap usage of exactly that call.

use crate::profiler::MemoryProfiler;
use crate::types::Sample;
use std::time::{Duration, Instant};

/// Result of one instrumented call
#[derive(Debug, Clone)]
pub struct Measured<T> {
    /// Return value of the closure, untouched
    pub result: T,
    pub elapsed: Duration,
    /// Peak bytes allocated during the call
    pub peak_memory: usize,
}

impl<T> Measured<T> {
    pub fn sample(&self) -> Sample {
        Sample::new(self.elapsed, self.peak_memory)
    }

    /// Split into the closure's return value and its sample
    pub fn into_parts(self) -> (T, Sample) {
        let sample = self.sample();
        (self.result, sample)
    }
}

/// Measures closures with a profiler it owns for its whole lifetime
pub struct InstrumentedRunner {
    profiler: MemoryProfiler,
}

impl InstrumentedRunner {
    /// Acquire the process-wide profiler
    ///
    /// Blocks while another runner is alive.
    pub fn new() -> Self {
        Self::with_profiler(MemoryProfiler::acquire())
    }

    pub fn with_profiler(profiler: MemoryProfiler) -> Self {
        Self { profiler }
    }

    /// Whether memory numbers are real, see [`MemoryProfiler::allocator_installed`]
    pub fn tracks_memory(&self) -> bool {
        self.profiler.allocator_installed()
    }

    /// Run `operation` once and measure it
    ///
    /// Profiling starts before the first timestamp and the peak is read after
    /// the second one. The profiler is stopped on return and on unwind.
    pub fn measure<T, F>(&mut self, operation: F) -> Measured<T>
    where
        F: FnOnce() -> T,
    {
        let session = self.profiler.start();

        let start = Instant::now();
        let result = operation();
        let elapsed = start.elapsed();

        let peak_memory = session.stop();

        Measured {
            result,
            elapsed,
            peak_memory,
        }
    }
}

impl Default for InstrumentedRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hint::black_box;

    #[test]
    fn test_measure_passes_result_through() {
        let mut runner = InstrumentedRunner::new();
        let measured = runner.measure(|| 21 * 2);

        assert_eq!(measured.result, 42);
        assert!(measured.sample().duration >= 0.0);
    }

    #[test]
    fn test_failing_operation_still_measured() {
        let mut runner = InstrumentedRunner::new();
        let measured = runner.measure(|| -> Result<(), String> {
            let _scratch = black_box(vec![0u8; 4096]);
            Err("backend rejected the key".to_string())
        });

        assert!(measured.result.is_err());
        let sample = measured.sample();
        assert!(sample.duration >= 0.0);
        assert!(sample.peak_memory >= 4096);
    }

    #[test]
    fn test_profiler_left_stopped() {
        let mut runner = InstrumentedRunner::new();
        let _ = runner.measure(|| black_box(vec![0u8; 128]).len());
        assert!(!runner.profiler.is_tracking());

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            runner.measure(|| -> usize { panic!("sign exploded") })
        }));
        assert!(panicked.is_err());
        assert!(!runner.profiler.is_tracking());
    }

    #[test]
    fn test_peak_memory_of_large_allocation() {
        let mut runner = InstrumentedRunner::new();
        let measured = runner.measure(|| {
            let buffer = black_box(vec![7u8; 1 << 20]);
            buffer.iter().map(|&b| b as u64).sum::<u64>()
        });

        assert_eq!(measured.result, 7 * (1 << 20));
        assert!(measured.peak_memory >= 1 << 20);
    }

    #[test]
    fn test_into_parts() {
        let mut runner = InstrumentedRunner::new();
        let (value, sample) = runner.measure(|| "done").into_parts();
        assert_eq!(value, "done");
        assert!(sample.duration >= 0.0);
    }
}
