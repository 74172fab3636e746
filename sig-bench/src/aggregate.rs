//! Mean aggregation of the metric series

use crate::sampler::MetricSeries;
use crate::types::SeriesKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Mean of one series together with the number of samples behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub mean: f64,
    pub count: usize,
}

impl SeriesSummary {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Arithmetic mean; `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Per-series summaries of one run
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    summaries: BTreeMap<SeriesKey, SeriesSummary>,
}

impl AggregateReport {
    /// Summary of `key`; an unknown key reads as an empty series
    pub fn summary(&self, key: &SeriesKey) -> SeriesSummary {
        self.summaries.get(key).copied().unwrap_or(SeriesSummary {
            mean: 0.0,
            count: 0,
        })
    }

    pub fn mean(&self, key: &SeriesKey) -> f64 {
        self.summary(key).mean
    }

    pub fn count(&self, key: &SeriesKey) -> usize {
        self.summary(key).count
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SeriesKey, &SeriesSummary)> {
        self.summaries.iter()
    }

    /// Keys whose mean is the zero placeholder of an empty series
    pub fn empty_series(&self) -> Vec<SeriesKey> {
        self.summaries
            .iter()
            .filter(|(_, summary)| summary.is_empty())
            .map(|(key, _)| *key)
            .collect()
    }
}

/// Reduce every series to its mean and sample count
pub fn aggregate(series: &MetricSeries) -> AggregateReport {
    let summaries: BTreeMap<_, _> = series
        .iter()
        .map(|(key, values)| {
            let summary = SeriesSummary {
                mean: mean(values),
                count: values.len(),
            };
            (*key, summary)
        })
        .collect();

    let report = AggregateReport { summaries };
    for key in report.empty_series() {
        warn!(series = %key, "No samples recorded, reporting mean as 0");
    }
    report
}
