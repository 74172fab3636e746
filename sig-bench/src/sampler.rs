//! Trial loop
//!
//! Drives `num_runs` independent trials. Every trial generates fresh key
//! pairs for both providers, then signs and verifies the message once per
//! provider, recording one sample per successful measured operation.
//!
//! Per-trial failures never abort the run. A key generation failure skips the
//! whole trial, and a signing failure drops that provider's sign and verify
//! samples for the trial. Every failure is counted in [`TrialStats`].

use crate::measure::InstrumentedRunner;
use crate::types::{AlgorithmSlot, Metric, Operation, Sample, SeriesKey};
use serde::{Deserialize, Serialize};
use sig_provider::{KeyPair, SignatureProvider};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Raw samples keyed by series
///
/// All 8 series exist from construction, so an operation that never succeeds
/// still shows up as an empty series.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    series: BTreeMap<SeriesKey, Vec<f64>>,
}

impl MetricSeries {
    pub fn new() -> Self {
        let series = SeriesKey::all()
            .into_iter()
            .map(|key| (key, Vec::new()))
            .collect();
        Self { series }
    }

    /// Append one sample to the time and memory series of `(algorithm, operation)`
    pub fn record(&mut self, algorithm: AlgorithmSlot, operation: Operation, sample: Sample) {
        for metric in Metric::ALL {
            let key = SeriesKey::new(algorithm, operation, metric);
            self.series
                .entry(key)
                .or_default()
                .push(sample.value(metric));
        }
    }

    pub fn get(&self, key: &SeriesKey) -> &[f64] {
        self.series.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of samples in `key`'s series
    pub fn len(&self, key: &SeriesKey) -> usize {
        self.get(key).len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SeriesKey, &[f64])> {
        self.series.iter().map(|(key, values)| (key, values.as_slice()))
    }
}

impl Default for MetricSeries {
    fn default() -> Self {
        Self::new()
    }
}

/// Failure counters of one algorithm slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStats {
    pub keygen_failures: usize,
    pub sign_failures: usize,
    /// Verifications that completed but returned `false`
    pub verify_rejections: usize,
}

/// Bookkeeping for one run of the trial loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialStats {
    pub trials_run: usize,
    /// Trials skipped because key generation failed
    pub trials_skipped: usize,
    pub classical: SlotStats,
    pub post_quantum: SlotStats,
}

impl TrialStats {
    pub fn slot(&self, slot: AlgorithmSlot) -> &SlotStats {
        match slot {
            AlgorithmSlot::Classical => &self.classical,
            AlgorithmSlot::PostQuantum => &self.post_quantum,
        }
    }

    fn slot_mut(&mut self, slot: AlgorithmSlot) -> &mut SlotStats {
        match slot {
            AlgorithmSlot::Classical => &mut self.classical,
            AlgorithmSlot::PostQuantum => &mut self.post_quantum,
        }
    }

    /// Trials in which both key pairs were generated
    pub fn trials_completed(&self) -> usize {
        self.trials_run - self.trials_skipped
    }
}

/// Output of [`TrialLoop::run`]
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub series: MetricSeries,
    pub stats: TrialStats,
}

/// Runs trials against a classical and a post-quantum provider
pub struct TrialLoop<'a> {
    classical: &'a dyn SignatureProvider,
    post_quantum: &'a dyn SignatureProvider,
    runner: &'a mut InstrumentedRunner,
}

impl<'a> TrialLoop<'a> {
    pub fn new(
        classical: &'a dyn SignatureProvider,
        post_quantum: &'a dyn SignatureProvider,
        runner: &'a mut InstrumentedRunner,
    ) -> Self {
        Self {
            classical,
            post_quantum,
            runner,
        }
    }

    fn provider(&self, slot: AlgorithmSlot) -> &'a dyn SignatureProvider {
        match slot {
            AlgorithmSlot::Classical => self.classical,
            AlgorithmSlot::PostQuantum => self.post_quantum,
        }
    }

    /// Run `num_runs` trials over `message`
    pub fn run(&mut self, message: &[u8], num_runs: usize) -> TrialOutcome {
        let mut series = MetricSeries::new();
        let mut stats = TrialStats::default();

        info!(
            "🔁 Running {} trials: {} vs {} ({} byte message)",
            num_runs,
            self.classical.algorithm_name(),
            self.post_quantum.algorithm_name(),
            message.len()
        );

        for trial in 0..num_runs {
            stats.trials_run += 1;

            // Both key pairs are attempted even when the first one fails.
            let pq_keys = self.generate_keypair(AlgorithmSlot::PostQuantum, &mut stats);
            let classical_keys = self.generate_keypair(AlgorithmSlot::Classical, &mut stats);

            let (classical_keys, pq_keys) = match (classical_keys, pq_keys) {
                (Some(classical), Some(pq)) => (classical, pq),
                _ => {
                    stats.trials_skipped += 1;
                    warn!(trial, "Key generation failed, skipping trial");
                    continue;
                }
            };

            self.sign_and_verify(
                AlgorithmSlot::Classical,
                &classical_keys,
                message,
                &mut series,
                &mut stats,
            );
            self.sign_and_verify(
                AlgorithmSlot::PostQuantum,
                &pq_keys,
                message,
                &mut series,
                &mut stats,
            );

            debug!(trial, "Trial finished");
        }

        info!(
            "✅ Trials done: {} run, {} skipped",
            stats.trials_run, stats.trials_skipped
        );

        TrialOutcome { series, stats }
    }

    fn generate_keypair(&self, slot: AlgorithmSlot, stats: &mut TrialStats) -> Option<KeyPair> {
        let provider = self.provider(slot);
        match provider.generate_keypair() {
            Ok(keypair) => Some(keypair),
            Err(e) => {
                stats.slot_mut(slot).keygen_failures += 1;
                warn!(algorithm = provider.algorithm_name(), error = %e, "Key generation failed");
                None
            }
        }
    }

    fn sign_and_verify(
        &mut self,
        slot: AlgorithmSlot,
        keypair: &KeyPair,
        message: &[u8],
        series: &mut MetricSeries,
        stats: &mut TrialStats,
    ) {
        let provider = self.provider(slot);

        let (signed, sign_sample) = self
            .runner
            .measure(|| provider.sign(message, &keypair.private_key))
            .into_parts();

        let signature = match signed {
            Ok(signature) => signature,
            Err(e) => {
                stats.slot_mut(slot).sign_failures += 1;
                warn!(algorithm = provider.algorithm_name(), error = %e, "Signing failed, no sample recorded");
                return;
            }
        };
        series.record(slot, Operation::Sign, sign_sample);

        let (valid, verify_sample) = self
            .runner
            .measure(|| provider.verify(message, &signature, &keypair.public_key))
            .into_parts();

        // The verify sample counts regardless of the outcome.
        series.record(slot, Operation::Verify, verify_sample);
        if !valid {
            stats.slot_mut(slot).verify_rejections += 1;
            warn!(
                algorithm = provider.algorithm_name(),
                public_key = %keypair.public_key.fingerprint(),
                "Signature did not verify"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sig_provider::{PrivateKey, ProviderError, PublicKey, Result, Signature};
    use std::cell::Cell;

    /// Provider whose failures follow a fixed schedule by call index
    struct ScriptedProvider {
        name: &'static str,
        keygen_fails: Vec<usize>,
        sign_fails: Vec<usize>,
        verify_result: bool,
        keygen_calls: Cell<usize>,
        sign_calls: Cell<usize>,
        verify_calls: Cell<usize>,
    }

    impl ScriptedProvider {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                keygen_fails: Vec::new(),
                sign_fails: Vec::new(),
                verify_result: true,
                keygen_calls: Cell::new(0),
                sign_calls: Cell::new(0),
                verify_calls: Cell::new(0),
            }
        }

        fn failing_keygen(mut self, calls: &[usize]) -> Self {
            self.keygen_fails = calls.to_vec();
            self
        }

        fn failing_sign(mut self, calls: &[usize]) -> Self {
            self.sign_fails = calls.to_vec();
            self
        }

        fn rejecting(mut self) -> Self {
            self.verify_result = false;
            self
        }

        fn bump(counter: &Cell<usize>) -> usize {
            let n = counter.get();
            counter.set(n + 1);
            n
        }
    }

    impl SignatureProvider for ScriptedProvider {
        fn algorithm_name(&self) -> &str {
            self.name
        }

        fn generate_keypair(&self) -> Result<KeyPair> {
            let call = Self::bump(&self.keygen_calls);
            if self.keygen_fails.contains(&call) {
                return Err(ProviderError::KeyGenerationError("scripted".to_string()));
            }
            Ok(KeyPair {
                private_key: PrivateKey::from_bytes(vec![1; 32]),
                public_key: PublicKey::from_bytes(vec![2; 33]),
            })
        }

        fn sign(&self, message: &[u8], _private_key: &PrivateKey) -> Result<Signature> {
            let call = Self::bump(&self.sign_calls);
            if self.sign_fails.contains(&call) {
                return Err(ProviderError::SigningError("scripted".to_string()));
            }
            Ok(Signature::from_bytes(message.to_vec()))
        }

        fn verify(&self, _message: &[u8], _signature: &Signature, _public_key: &PublicKey) -> bool {
            Self::bump(&self.verify_calls);
            self.verify_result
        }
    }

    fn key(algorithm: AlgorithmSlot, operation: Operation, metric: Metric) -> SeriesKey {
        SeriesKey::new(algorithm, operation, metric)
    }

    #[test]
    fn test_new_series_has_all_keys_empty() {
        let series = MetricSeries::new();
        assert_eq!(series.iter().count(), 8);
        assert!(series.iter().all(|(_, values)| values.is_empty()));
    }

    #[test]
    fn test_all_trials_succeed() {
        let classical = ScriptedProvider::new("classical");
        let pq = ScriptedProvider::new("pq");
        let mut runner = InstrumentedRunner::new();

        let outcome = TrialLoop::new(&classical, &pq, &mut runner).run(b"test", 5);

        for key in SeriesKey::all() {
            assert_eq!(outcome.series.len(&key), 5, "{}", key);
        }
        assert_eq!(outcome.stats.trials_run, 5);
        assert_eq!(outcome.stats.trials_skipped, 0);
    }

    #[test]
    fn test_keygen_failure_skips_whole_trial() {
        // pq fails on trials 1 and 3, classical on trial 3 and 4
        let classical = ScriptedProvider::new("classical").failing_keygen(&[3, 4]);
        let pq = ScriptedProvider::new("pq").failing_keygen(&[1, 3]);
        let mut runner = InstrumentedRunner::new();

        let outcome = TrialLoop::new(&classical, &pq, &mut runner).run(b"test", 6);

        assert_eq!(outcome.stats.trials_skipped, 3);
        assert_eq!(outcome.stats.classical.keygen_failures, 2);
        assert_eq!(outcome.stats.post_quantum.keygen_failures, 2);
        for key in SeriesKey::all() {
            assert_eq!(outcome.series.len(&key), 3, "{}", key);
        }

        // Both providers are asked for keys every trial.
        assert_eq!(classical.keygen_calls.get(), 6);
        assert_eq!(pq.keygen_calls.get(), 6);
        assert_eq!(classical.sign_calls.get(), 3);
    }

    #[test]
    fn test_sign_failure_isolated_to_one_provider() {
        let classical = ScriptedProvider::new("classical");
        let pq = ScriptedProvider::new("pq").failing_sign(&[0, 2]);
        let mut runner = InstrumentedRunner::new();

        let outcome = TrialLoop::new(&classical, &pq, &mut runner).run(b"test", 4);

        for operation in Operation::ALL {
            for metric in Metric::ALL {
                assert_eq!(
                    outcome.series.len(&key(AlgorithmSlot::Classical, operation, metric)),
                    4
                );
                assert_eq!(
                    outcome.series.len(&key(AlgorithmSlot::PostQuantum, operation, metric)),
                    2
                );
            }
        }
        assert_eq!(outcome.stats.post_quantum.sign_failures, 2);
        assert_eq!(pq.verify_calls.get(), 2);
    }

    #[test]
    fn test_rejected_verify_still_sampled() {
        let classical = ScriptedProvider::new("classical").rejecting();
        let pq = ScriptedProvider::new("pq");
        let mut runner = InstrumentedRunner::new();

        let outcome = TrialLoop::new(&classical, &pq, &mut runner).run(b"test", 3);

        let verify_times = key(AlgorithmSlot::Classical, Operation::Verify, Metric::Time);
        let sign_times = key(AlgorithmSlot::Classical, Operation::Sign, Metric::Time);
        assert_eq!(outcome.series.len(&verify_times), 3);
        assert_eq!(outcome.series.len(&verify_times), outcome.series.len(&sign_times));
        assert_eq!(outcome.stats.classical.verify_rejections, 3);
        assert_eq!(outcome.stats.post_quantum.verify_rejections, 0);
    }

    #[test]
    fn test_every_keygen_fails() {
        let classical = ScriptedProvider::new("classical");
        let pq = ScriptedProvider::new("pq").failing_keygen(&[0, 1, 2]);
        let mut runner = InstrumentedRunner::new();

        let outcome = TrialLoop::new(&classical, &pq, &mut runner).run(b"test", 3);

        assert_eq!(outcome.stats.trials_completed(), 0);
        assert!(outcome.series.iter().all(|(_, values)| values.is_empty()));
        assert_eq!(classical.sign_calls.get(), 0);
    }

    #[test]
    fn test_samples_are_non_negative() {
        let classical = ScriptedProvider::new("classical");
        let pq = ScriptedProvider::new("pq");
        let mut runner = InstrumentedRunner::new();

        let outcome = TrialLoop::new(&classical, &pq, &mut runner).run(&[0xAB; 256], 2);

        for (_, values) in outcome.series.iter() {
            assert!(values.iter().all(|v| *v >= 0.0));
        }
    }
}
