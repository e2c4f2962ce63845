//! Error types for filter execution.
//!
//! This module provides the [`FilterError`] type, the failure cause recorded
//! for every filter whose evaluation did not complete successfully.
//!
//! A `FilterError` never escapes the filter processor: it is captured,
//! appended to the session context's error list, and the pipeline continues
//! with the filter's input message. See [`SessionContext::add_filter_error`].
//!
//! [`SessionContext::add_filter_error`]: crate::SessionContext::add_filter_error

use crate::filter_type::FilterType;
use thiserror::Error;

/// Result type alias using [`FilterError`].
pub type FilterResult<T> = Result<T, FilterError>;

/// The cause of a failed filter evaluation.
///
/// # Example
///
/// ```
/// use turnstile_core::FilterError;
///
/// fn check_header(present: bool) -> Result<(), FilterError> {
///     if !present {
///         return Err(FilterError::failed("missing x-api-key header"));
///     }
///     Ok(())
/// }
///
/// assert!(check_header(false).is_err());
/// ```
#[derive(Error, Debug)]
pub enum FilterError {
    /// The filter reported a failure from `should_filter` or `apply_async`.
    #[error("filter failed: {message}")]
    Failed {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The filter panicked while being evaluated or polled.
    #[error("filter panicked: {0}")]
    Panicked(String),

    /// No filter is registered under the requested name.
    #[error("no filter registered under name `{name}`")]
    NotFound {
        /// The name that failed to resolve.
        name: String,
    },

    /// The session has no endpoint and no default endpoint is configured.
    #[error("no endpoint selected for this request")]
    EndpointNotSet,

    /// The named filter exists but cannot act as an endpoint.
    #[error("filter `{name}` has type `{filter_type}` and cannot be used as an endpoint")]
    NotAnEndpoint {
        /// The filter name.
        name: String,
        /// The filter's actual type.
        filter_type: FilterType,
    },
}

impl FilterError {
    /// Creates a failure with a message and no source.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a failure wrapping an underlying error.
    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a not-found error for the given filter name.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Builds a panic error from a `catch_unwind` payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panicked(message)
    }

    /// Returns true if this error came from resolving a filter rather than running one.
    #[must_use]
    pub const fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::EndpointNotSet | Self::NotAnEndpoint { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display() {
        let err = FilterError::failed("upstream refused connection");
        assert_eq!(err.to_string(), "filter failed: upstream refused connection");
    }

    #[test]
    fn test_with_source_keeps_chain() {
        let io = std::io::Error::other("socket closed");
        let err = FilterError::with_source("proxy failed", io);
        let source = std::error::Error::source(&err).expect("source should be set");
        assert_eq!(source.to_string(), "socket closed");
    }

    #[test]
    fn test_from_panic_str_and_string() {
        let str_payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(
            FilterError::from_panic(str_payload.as_ref()).to_string(),
            "filter panicked: boom"
        );

        let string_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(
            FilterError::from_panic(string_payload.as_ref()).to_string(),
            "filter panicked: kaboom"
        );

        let other: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert!(matches!(
            FilterError::from_panic(other.as_ref()),
            FilterError::Panicked(msg) if msg == "unknown panic payload"
        ));
    }

    #[test]
    fn test_resolution_failures() {
        assert!(FilterError::not_found("endpoint.Missing").is_resolution_failure());
        assert!(FilterError::EndpointNotSet.is_resolution_failure());
        assert!(FilterError::NotAnEndpoint {
            name: "pre.Auth".to_string(),
            filter_type: FilterType::Inbound,
        }
        .is_resolution_failure());
        assert!(!FilterError::failed("nope").is_resolution_failure());
        assert!(!FilterError::Panicked("nope".to_string()).is_resolution_failure());
    }
}
