//! Filter usage notification.
//!
//! After a filter succeeds or fails, the processor hands a
//! [`FilterExecInfo`] to the configured [`UsageNotifier`]. Notifiers are
//! fire-and-forget: the processor ignores anything they do, including
//! panics.

use crate::filter::Filter;
use std::sync::Arc;
use std::time::Duration;
use turnstile_core::{ExecutionStatus, FilterError, Message};

/// The result of one filter evaluation.
#[derive(Debug, Clone)]
pub struct FilterExecInfo {
    /// The outcome.
    pub status: ExecutionStatus,
    /// Time spent evaluating the filter.
    pub duration: Duration,
    /// The failure cause when `status` is [`ExecutionStatus::Failed`].
    pub error: Option<Arc<FilterError>>,
}

impl FilterExecInfo {
    /// Creates a result without an error.
    #[must_use]
    pub const fn new(status: ExecutionStatus, duration: Duration) -> Self {
        Self {
            status,
            duration,
            error: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub const fn failed(error: Arc<FilterError>, duration: Duration) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            duration,
            error: Some(error),
        }
    }

    /// Returns the duration in whole milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Receives per-filter usage events.
///
/// Implementations must return quickly and must not block the calling task.
pub trait UsageNotifier: Send + Sync + 'static {
    /// Called once per filter that succeeded or failed.
    ///
    /// `message` is the filter's output (its input when it failed).
    fn notify(&self, filter: &dyn Filter, message: &Message, info: &FilterExecInfo);
}

/// A notifier that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUsageNotifier;

impl UsageNotifier for NoopUsageNotifier {
    fn notify(&self, _filter: &dyn Filter, _message: &Message, _info: &FilterExecInfo) {}
}

/// A notifier that logs every event at `trace` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUsageNotifier;

impl UsageNotifier for TracingUsageNotifier {
    fn notify(&self, filter: &dyn Filter, message: &Message, info: &FilterExecInfo) {
        tracing::trace!(
            request_id = %message.context().request_id(),
            filter = filter.name(),
            filter_type = %filter.filter_type(),
            status = %info.status,
            duration_ms = info.duration_ms(),
            "filter usage"
        );
    }
}
