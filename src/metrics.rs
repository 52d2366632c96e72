//! Pipeline timing metrics: histograms for latency points, counters for
//! cache/dedupe/fallback events. Sampled into fixed-capacity rings so memory
//! stays bounded across long listening sessions.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Fixed-capacity ring of samples for one histogram.
struct SampleRing {
    samples: Vec<f64>,
    pos: usize,
    count: usize,
    capacity: usize,
}

impl SampleRing {
    fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            pos: 0,
            count: 0,
            capacity,
        }
    }

    fn push(&mut self, value: f64) {
        self.samples[self.pos] = value;
        self.pos = (self.pos + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples[..self.count].to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let idx = ((p / 100.0) * (self.count as f64 - 1.0)).round() as usize;
        sorted[idx.min(self.count - 1)]
    }
}

/// Histograms and counters for all named pipeline metrics.
pub struct MetricsRegistry {
    histograms: Mutex<HashMap<&'static str, SampleRing>>,
    counters: Mutex<HashMap<&'static str, u64>>,
    ring_capacity: usize,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            histograms: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
            ring_capacity: 1024,
        }
    }

    /// Record a latency sample (milliseconds) for the named metric.
    pub fn record_ms(&self, name: &'static str, value_ms: f64) {
        let mut hists = self.histograms.lock();
        hists
            .entry(name)
            .or_insert_with(|| SampleRing::new(self.ring_capacity))
            .push(value_ms);
    }

    /// Increment a named counter.
    pub fn incr(&self, name: &'static str) {
        let mut counters = self.counters.lock();
        *counters.entry(name).or_insert(0) += 1;
    }

    pub fn counter(&self, name: &str) -> u64 {
        *self.counters.lock().get(name).unwrap_or(&0)
    }

    /// Percentile (0-100) of a histogram, in milliseconds.
    pub fn percentile(&self, name: &str, p: f64) -> f64 {
        self.histograms
            .lock()
            .get(name)
            .map(|ring| ring.percentile(p))
            .unwrap_or(0.0)
    }

    /// Summary of every histogram at p50/p95/p99 plus all counters.
    pub fn summary(&self) -> MetricsSummary {
        let hists = self.histograms.lock();
        let mut latencies = HashMap::new();
        for (&name, ring) in hists.iter() {
            latencies.insert(
                name.to_string(),
                LatencySummary {
                    p50_ms: ring.percentile(50.0),
                    p95_ms: ring.percentile(95.0),
                    p99_ms: ring.percentile(99.0),
                    count: ring.count,
                },
            );
        }
        let counters = self
            .counters
            .lock()
            .iter()
            .map(|(&k, &v)| (k.to_string(), v))
            .collect();
        MetricsSummary { latencies, counters }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LatencySummary {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub count: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub latencies: HashMap<String, LatencySummary>,
    pub counters: HashMap<String, u64>,
}

/// Well-known metric names (constants to avoid typos).
pub mod metric_names {
    pub const PARTIAL_TRANSLATE: &str = "t_partial_translate";
    pub const FINAL_TRANSLATE: &str = "t_final_translate";
    pub const QUEUE_WAIT: &str = "t_queue_wait";
    pub const PROVIDER_CALL: &str = "t_provider_call";
    pub const CACHE_HIT: &str = "n_cache_hit";
    pub const DEDUPE_SKIP: &str = "n_dedupe_skip";
    pub const FALLBACK_USED: &str = "n_fallback_used";
    pub const PARTIAL_DROPPED: &str = "n_partial_dropped";
    pub const FINAL_FAILED: &str = "n_final_failed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_over_samples() {
        let metrics = MetricsRegistry::new();
        for v in 1..=100 {
            metrics.record_ms(metric_names::PROVIDER_CALL, v as f64);
        }
        let p50 = metrics.percentile(metric_names::PROVIDER_CALL, 50.0);
        assert!((40.0..=60.0).contains(&p50));
        let p99 = metrics.percentile(metric_names::PROVIDER_CALL, 99.0);
        assert!(p99 >= 98.0);
    }

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.incr(metric_names::DEDUPE_SKIP);
        metrics.incr(metric_names::DEDUPE_SKIP);
        assert_eq!(metrics.counter(metric_names::DEDUPE_SKIP), 2);
        assert_eq!(metrics.counter(metric_names::CACHE_HIT), 0);
    }

    #[test]
    fn empty_histogram_is_zero() {
        let metrics = MetricsRegistry::new();
        assert_eq!(metrics.percentile("missing", 95.0), 0.0);
    }
}
