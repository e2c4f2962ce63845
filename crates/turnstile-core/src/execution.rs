//! Execution bookkeeping records.
//!
//! These are the per-request audit types stored in the [`SessionContext`]:
//! one [`SummaryEntry`] per evaluated filter and one [`FilterErrorRecord`]
//! per failed filter.
//!
//! [`SessionContext`]: crate::SessionContext

use crate::error::FilterError;
use crate::filter_type::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a single filter evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// `apply_async` completed with a message.
    Success,
    /// `should_filter` returned false.
    Skipped,
    /// The predicate or the filter body failed.
    Failed,
    /// The filter is switched off by configuration.
    Disabled,
}

impl ExecutionStatus {
    /// Returns the upper-case name used in summaries and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Skipped => "SKIPPED",
            Self::Failed => "FAILED",
            Self::Disabled => "DISABLED",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the execution summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    /// The filter name.
    pub filter_name: String,
    /// The recorded outcome.
    pub status: ExecutionStatus,
    /// Elapsed time of the evaluation.
    pub duration: Duration,
}

impl fmt::Display for SummaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}ms",
            self.filter_name,
            self.status,
            self.duration.as_millis()
        )
    }
}

/// Ordered audit trail of every filter evaluated for one request.
///
/// Displays as comma-joined `name:STATUS:Nms` entries.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use turnstile_core::{ExecutionStatus, ExecutionSummary};
///
/// let mut summary = ExecutionSummary::default();
/// summary.push("pre.Auth", ExecutionStatus::Success, Duration::from_millis(3));
/// summary.push("pre.Debug", ExecutionStatus::Skipped, Duration::ZERO);
///
/// assert_eq!(summary.to_string(), "pre.Auth:SUCCESS:3ms, pre.Debug:SKIPPED:0ms");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    entries: Vec<SummaryEntry>,
}

impl ExecutionSummary {
    /// Appends an entry.
    pub fn push(&mut self, filter_name: impl Into<String>, status: ExecutionStatus, duration: Duration) {
        self.entries.push(SummaryEntry {
            filter_name: filter_name.into(),
            status,
            duration,
        });
    }

    /// Returns the entries in evaluation order.
    #[must_use]
    pub fn entries(&self) -> &[SummaryEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no filter has been evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries with the given status.
    pub fn with_status(&self, status: ExecutionStatus) -> impl Iterator<Item = &SummaryEntry> {
        self.entries.iter().filter(move |e| e.status == status)
    }
}

impl fmt::Display for ExecutionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// A recorded filter failure.
#[derive(Debug, Clone)]
pub struct FilterErrorRecord {
    /// The name of the failed filter.
    pub filter_name: String,
    /// The failed filter's type.
    pub filter_type: FilterType,
    /// The failure cause.
    pub cause: Arc<FilterError>,
}

impl FilterErrorRecord {
    /// Returns the failed filter's name.
    #[must_use]
    pub fn filter_name(&self) -> &str {
        &self.filter_name
    }
}

impl fmt::Display for FilterErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.filter_name, self.filter_type, self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_status_names() {
        assert_eq!(ExecutionStatus::Success.to_string(), "SUCCESS");
        assert_eq!(ExecutionStatus::Skipped.to_string(), "SKIPPED");
        assert_eq!(ExecutionStatus::Failed.to_string(), "FAILED");
        assert_eq!(ExecutionStatus::Disabled.to_string(), "DISABLED");
    }

    #[test]
    fn test_empty_summary_displays_empty() {
        let summary = ExecutionSummary::default();
        assert!(summary.is_empty());
        assert_eq!(summary.to_string(), "");
    }

    #[test]
    fn test_with_status() {
        let mut summary = ExecutionSummary::default();
        summary.push("a", ExecutionStatus::Success, Duration::ZERO);
        summary.push("b", ExecutionStatus::Failed, Duration::ZERO);
        summary.push("c", ExecutionStatus::Failed, Duration::ZERO);

        let failed: Vec<_> = summary
            .with_status(ExecutionStatus::Failed)
            .map(|e| e.filter_name.as_str())
            .collect();
        assert_eq!(failed, vec!["b", "c"]);
    }

    #[test]
    fn test_error_record_display() {
        let record = FilterErrorRecord {
            filter_name: "endpoint.Proxy".to_string(),
            filter_type: FilterType::Endpoint,
            cause: Arc::new(FilterError::failed("connect timeout")),
        };
        assert_eq!(
            record.to_string(),
            "endpoint.Proxy (end): filter failed: connect timeout"
        );
    }

    proptest! {
        #[test]
        fn summary_splits_into_one_part_per_entry(
            names in proptest::collection::vec("[a-zA-Z.]{1,12}", 1..20)
        ) {
            let mut summary = ExecutionSummary::default();
            for name in &names {
                summary.push(name.clone(), ExecutionStatus::Success, Duration::from_millis(1));
            }
            prop_assert_eq!(summary.to_string().split(',').count(), names.len());
        }
    }
}
