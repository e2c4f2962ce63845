//! Filter usage metrics.
//!
//! [`MetricsUsageNotifier`] records every filter success and failure through
//! the `metrics` facade. Installing an exporter is left to the host
//! application; without one the calls are no-ops.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `turnstile_filter_executions_total` | Counter | `filter`, `type`, `status` |
//! | `turnstile_filter_duration_seconds` | Histogram | `filter`, `type` |

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use turnstile_core::Message;
use turnstile_filter::{Filter, FilterExecInfo, UsageNotifier};

/// Counter of filter evaluations by outcome.
pub const FILTER_EXECUTIONS_TOTAL: &str = "turnstile_filter_executions_total";

/// Histogram of filter evaluation time.
pub const FILTER_DURATION_SECONDS: &str = "turnstile_filter_duration_seconds";

/// Registers descriptions for the filter metrics with the installed recorder.
pub fn describe_filter_metrics() {
    describe_counter!(
        FILTER_EXECUTIONS_TOTAL,
        Unit::Count,
        "Filter evaluations that succeeded or failed"
    );
    describe_histogram!(
        FILTER_DURATION_SECONDS,
        Unit::Seconds,
        "Time spent evaluating a filter"
    );
}

/// A usage notifier backed by the `metrics` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsUsageNotifier;

impl MetricsUsageNotifier {
    /// Creates the notifier and describes its metrics.
    #[must_use]
    pub fn new() -> Self {
        describe_filter_metrics();
        Self
    }
}

impl UsageNotifier for MetricsUsageNotifier {
    fn notify(&self, filter: &dyn Filter, _message: &Message, info: &FilterExecInfo) {
        let name = filter.name().to_string();
        let filter_type = filter.filter_type().as_str();

        counter!(
            FILTER_EXECUTIONS_TOTAL,
            "filter" => name.clone(),
            "type" => filter_type,
            "status" => info.status.as_str()
        )
        .increment(1);

        histogram!(
            FILTER_DURATION_SECONDS,
            "filter" => name,
            "type" => filter_type
        )
        .record(info.duration.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{
        Counter, CounterFn, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder,
        SharedString,
    };
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use turnstile_core::{ExecutionStatus, FilterError, SessionContext};
    use turnstile_filter::fixtures::{sample_request, MockFilter};

    /// Captures `name{labels}` for every counter increment and histogram sample.
    #[derive(Default)]
    struct CapturingRecorder {
        samples: Arc<Mutex<Vec<String>>>,
    }

    struct Sample {
        rendered: String,
        samples: Arc<Mutex<Vec<String>>>,
    }

    impl CounterFn for Sample {
        fn increment(&self, value: u64) {
            self.samples
                .lock()
                .unwrap()
                .push(format!("{} +{value}", self.rendered));
        }

        fn absolute(&self, _value: u64) {}
    }

    impl HistogramFn for Sample {
        fn record(&self, _value: f64) {
            self.samples.lock().unwrap().push(self.rendered.clone());
        }
    }

    impl CapturingRecorder {
        fn sample(&self, key: &Key) -> Arc<Sample> {
            let labels: Vec<String> = key
                .labels()
                .map(|l| format!("{}={}", l.key(), l.value()))
                .collect();
            Arc::new(Sample {
                rendered: format!("{}{{{}}}", key.name(), labels.join(",")),
                samples: self.samples.clone(),
            })
        }
    }

    impl Recorder for CapturingRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            Counter::from_arc(self.sample(key))
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::from_arc(self.sample(key))
        }
    }

    #[test]
    fn test_records_counter_and_histogram() {
        let recorder = CapturingRecorder::default();
        let filter = MockFilter::inbound(3);
        let message: Message = sample_request(SessionContext::new()).into();

        metrics::with_local_recorder(&recorder, || {
            let notifier = MetricsUsageNotifier::new();
            notifier.notify(
                &filter,
                &message,
                &FilterExecInfo::new(ExecutionStatus::Success, Duration::from_millis(4)),
            );
            notifier.notify(
                &filter,
                &message,
                &FilterExecInfo::failed(
                    Arc::new(FilterError::failed("boom")),
                    Duration::from_millis(1),
                ),
            );
        });

        let samples = recorder.samples.lock().unwrap().clone();
        assert_eq!(
            samples,
            vec![
                "turnstile_filter_executions_total{filter=pre.Mock3,type=pre,status=SUCCESS} +1",
                "turnstile_filter_duration_seconds{filter=pre.Mock3,type=pre}",
                "turnstile_filter_executions_total{filter=pre.Mock3,type=pre,status=FAILED} +1",
                "turnstile_filter_duration_seconds{filter=pre.Mock3,type=pre}",
            ]
        );
    }

    #[test]
    fn test_notify_without_recorder_does_not_panic() {
        let filter = MockFilter::endpoint("endpoint.Proxy", http::StatusCode::OK);
        let message: Message = sample_request(SessionContext::new()).into();
        MetricsUsageNotifier.notify(
            &filter,
            &message,
            &FilterExecInfo::new(ExecutionStatus::Success, Duration::ZERO),
        );
    }
}
