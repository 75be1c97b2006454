//! Ingestion metrics.
//!
//! Counters go through the `metrics` facade and are no-ops unless the
//! embedding process installs a recorder.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Reports written, by source (`live` or `historic`).
    pub const RECORDS_WRITTEN_TOTAL: &str = "bwac_records_written_total";

    /// Finished live sessions, by outcome.
    pub const SESSIONS_TOTAL: &str = "bwac_sessions_total";

    /// Token acquisition attempts, by status.
    pub const TOKEN_REQUESTS_TOTAL: &str = "bwac_token_requests_total";

    /// Day buckets closed to make room for a newer day.
    pub const BUCKET_EVICTIONS_TOTAL: &str = "bwac_bucket_evictions_total";
}

pub fn record_written(source: &'static str, count: u64) {
    counter!(names::RECORDS_WRITTEN_TOTAL, "source" => source).increment(count);
}

pub fn record_session(outcome: &'static str) {
    counter!(names::SESSIONS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_token_request(status: &'static str) {
    counter!(names::TOKEN_REQUESTS_TOTAL, "status" => status).increment(1);
}

pub fn record_bucket_eviction() {
    counter!(names::BUCKET_EVICTIONS_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{
        Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
    };
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    struct Total(AtomicU64);

    impl CounterFn for Total {
        fn increment(&self, value: u64) {
            self.0.fetch_add(value, Ordering::Relaxed);
        }

        fn absolute(&self, value: u64) {
            self.0.store(value, Ordering::Relaxed);
        }
    }

    /// Keeps counters keyed by `name{label=value,...}`.
    #[derive(Default)]
    struct CapturingRecorder {
        counters: Mutex<BTreeMap<String, Arc<Total>>>,
    }

    impl CapturingRecorder {
        fn value(&self, key: &str) -> u64 {
            self.counters
                .lock()
                .unwrap()
                .get(key)
                .map(|total| total.0.load(Ordering::Relaxed))
                .unwrap_or(0)
        }
    }

    impl Recorder for CapturingRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            let labels: Vec<String> = key
                .labels()
                .map(|label| format!("{}={}", label.key(), label.value()))
                .collect();
            let name = format!("{}{{{}}}", key.name(), labels.join(","));
            let total = self
                .counters
                .lock()
                .unwrap()
                .entry(name)
                .or_insert_with(|| Arc::new(Total(AtomicU64::new(0))))
                .clone();
            Counter::from_arc(total)
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_counters_carry_labels() {
        let recorder = CapturingRecorder::default();
        metrics::with_local_recorder(&recorder, || {
            record_written("live", 1);
            record_written("live", 2);
            record_written("historic", 5);
            record_session("expired");
            record_session("protocol");
            record_session("protocol");
            record_token_request("error");
            record_bucket_eviction();
        });

        assert_eq!(recorder.value("bwac_records_written_total{source=live}"), 3);
        assert_eq!(recorder.value("bwac_records_written_total{source=historic}"), 5);
        assert_eq!(recorder.value("bwac_sessions_total{outcome=expired}"), 1);
        assert_eq!(recorder.value("bwac_sessions_total{outcome=protocol}"), 2);
        assert_eq!(recorder.value("bwac_token_requests_total{status=error}"), 1);
        assert_eq!(recorder.value("bwac_token_requests_total{status=ok}"), 0);
        assert_eq!(recorder.value("bwac_bucket_evictions_total{}"), 1);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_written("live", 3);
        record_session("expired");
        record_token_request("ok");
        record_bucket_eviction();
    }
}
