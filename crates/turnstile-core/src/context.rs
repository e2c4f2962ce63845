//! Per-request session context.
//!
//! The [`SessionContext`] is created once when a request enters the gateway
//! and is shared by every message shape (request and response) that flows
//! through the filter stages for that request.

use crate::error::FilterError;
use crate::execution::{ExecutionStatus, ExecutionSummary, FilterErrorRecord};
use crate::filter_type::FilterType;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request easy to
/// correlate.
///
/// # Example
///
/// ```
/// use turnstile_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Mutable state guarded by the context lock.
#[derive(Debug, Default)]
struct ContextState {
    endpoint: Option<String>,
    should_send_error_response: bool,
    debug_routing: bool,
    filter_errors: Vec<FilterErrorRecord>,
    summary: ExecutionSummary,
    routing_debug: Vec<String>,
    attributes: HashMap<String, String>,
}

#[derive(Debug)]
struct ContextInner {
    request_id: RequestId,
    started_at: Instant,
    state: RwLock<ContextState>,
}

/// Per-request state bag shared by every stage of one request.
///
/// `SessionContext` is a handle: cloning it yields another reference to the
/// same underlying state, so a request message and the response built from
/// it observe the same errors, summary and flags.
///
/// The error list and execution summary are append-only. Stages for one
/// request run sequentially so there is a single writer at a time; reads
/// from monitoring code may happen concurrently.
///
/// # Example
///
/// ```
/// use turnstile_core::SessionContext;
///
/// let ctx = SessionContext::new();
/// ctx.set_endpoint("endpoint.Proxy");
///
/// let shared = ctx.clone();
/// assert_eq!(shared.endpoint().as_deref(), Some("endpoint.Proxy"));
/// assert!(!shared.should_send_error_response());
/// ```
#[derive(Debug, Clone)]
pub struct SessionContext {
    inner: Arc<ContextInner>,
}

impl SessionContext {
    /// Creates a fresh context with a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    ///
    /// Useful when the request ID was propagated by an upstream hop.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                request_id,
                started_at: Instant::now(),
                state: RwLock::new(ContextState::default()),
            }),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.inner.request_id
    }

    /// Returns the elapsed time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// Returns true if both handles refer to the same context.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the name of the endpoint filter selected for this request.
    #[must_use]
    pub fn endpoint(&self) -> Option<String> {
        self.inner.state.read().endpoint.clone()
    }

    /// Selects the endpoint filter by name.
    pub fn set_endpoint(&self, name: impl Into<String>) {
        self.inner.state.write().endpoint = Some(name.into());
    }

    /// Returns true if the endpoint stage must run the error endpoint.
    #[must_use]
    pub fn should_send_error_response(&self) -> bool {
        self.inner.state.read().should_send_error_response
    }

    /// Sets whether the endpoint stage must run the error endpoint.
    pub fn set_should_send_error_response(&self, value: bool) {
        self.inner.state.write().should_send_error_response = value;
    }

    /// Returns true if per-filter routing debug lines should be recorded.
    #[must_use]
    pub fn debug_routing(&self) -> bool {
        self.inner.state.read().debug_routing
    }

    /// Enables or disables routing debug for this request.
    pub fn set_debug_routing(&self, value: bool) {
        self.inner.state.write().debug_routing = value;
    }

    /// Appends a routing debug line.
    pub fn add_routing_debug(&self, line: impl Into<String>) {
        self.inner.state.write().routing_debug.push(line.into());
    }

    /// Returns the routing debug lines recorded so far.
    #[must_use]
    pub fn routing_debug(&self) -> Vec<String> {
        self.inner.state.read().routing_debug.clone()
    }

    /// Records a failed filter.
    pub fn add_filter_error(
        &self,
        filter_name: impl Into<String>,
        filter_type: FilterType,
        cause: Arc<FilterError>,
    ) {
        self.inner.state.write().filter_errors.push(FilterErrorRecord {
            filter_name: filter_name.into(),
            filter_type,
            cause,
        });
    }

    /// Returns the recorded filter failures in the order they happened.
    #[must_use]
    pub fn filter_errors(&self) -> Vec<FilterErrorRecord> {
        self.inner.state.read().filter_errors.clone()
    }

    /// Returns true if any filter has failed for this request.
    #[must_use]
    pub fn has_filter_errors(&self) -> bool {
        !self.inner.state.read().filter_errors.is_empty()
    }

    /// Appends an entry to the execution summary.
    pub fn add_filter_execution_summary(
        &self,
        filter_name: impl Into<String>,
        status: ExecutionStatus,
        duration: Duration,
    ) {
        self.inner
            .state
            .write()
            .summary
            .push(filter_name, status, duration);
    }

    /// Returns a snapshot of the execution summary.
    #[must_use]
    pub fn execution_summary(&self) -> ExecutionSummary {
        self.inner.state.read().summary.clone()
    }

    /// Stores a string attribute for later filters.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner
            .state
            .write()
            .attributes
            .insert(key.into(), value.into());
    }

    /// Reads a string attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.state.read().attributes.get(key).cloned()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
