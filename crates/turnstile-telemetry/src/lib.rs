//! Observability for the Turnstile filter processor.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: per-filter counters and latency histograms via the `metrics` facade
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turnstile_config::ConfigLoader;
//! use turnstile_filter::{FilterProcessor, InMemoryFilterRegistry};
//! use turnstile_telemetry::{init_logging, LogConfig, MetricsUsageNotifier};
//!
//! let config = ConfigLoader::new().with_env_prefix("TURNSTILE").load()?;
//! init_logging(&LogConfig::from(&config.logging))?;
//!
//! let processor = FilterProcessor::builder()
//!     .registry(Arc::new(InMemoryFilterRegistry::new()))
//!     .notifier(Arc::new(MetricsUsageNotifier::new()))
//!     .config(config.processor_config()?)
//!     .build()?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use crate::error::TelemetryError;
pub use crate::logging::{create_env_filter, init_logging, LogConfig};
pub use crate::metrics::{
    describe_filter_metrics, MetricsUsageNotifier, FILTER_DURATION_SECONDS,
    FILTER_EXECUTIONS_TOTAL,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
