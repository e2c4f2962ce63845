//! Test fixtures for filter development and testing.
//!
//! This module provides configurable filter doubles and a recording usage
//! notifier that can be used in tests across the Turnstile codebase.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use http::StatusCode;
//! use turnstile_filter::fixtures::MockFilter;
//! use turnstile_filter::InMemoryFilterRegistry;
//!
//! let registry = InMemoryFilterRegistry::new();
//! registry.register(MockFilter::inbound(0));
//! registry.register(MockFilter::endpoint("endpoint.Proxy", StatusCode::OK).failing_async("refused"));
//! registry.register(MockFilter::outbound(0).skipping());
//!
//! assert_eq!(registry.len(), 3);
//! ```

use crate::filter::{BoxFuture, Filter};
use crate::notifier::{FilterExecInfo, UsageNotifier};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use turnstile_core::{
    ExecutionStatus, FilterError, FilterResult, FilterType, Message, RequestMessage,
    ResponseMessage, SessionContext,
};

/// Builds the request used throughout the tests: `GET https://localhost:80/somepath`
/// from `127.0.0.1`.
#[must_use]
pub fn sample_request(context: SessionContext) -> RequestMessage {
    RequestMessage::builder(context)
        .method(Method::GET)
        .path("/somepath")
        .client_ip("127.0.0.1")
        .scheme("https")
        .port(80)
        .server_name("localhost")
        .build()
}

/// Header that inbound and outbound mocks append their name to.
pub const TRAIL_HEADER: &str = "x-filter-trail";

/// Returns the filter names recorded in [`TRAIL_HEADER`], oldest first.
#[must_use]
pub fn filter_trail(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(TRAIL_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone)]
enum Predicate {
    Accept,
    Reject,
    Error(String),
    Panic(String),
}

#[derive(Debug, Clone)]
enum Behavior {
    AppendTrail,
    Respond(StatusCode),
    Fail(String),
    FailAfterYield(String),
    Panic(String),
    PanicInFuture(String),
}

/// A configurable filter double.
///
/// Counts how many times its predicate and body were invoked. Counters are
/// shared between clones, so a test may register one clone and assert on
/// another.
#[derive(Debug, Clone)]
pub struct MockFilter {
    name: String,
    filter_type: FilterType,
    order: i32,
    predicate: Predicate,
    behavior: Behavior,
    invocations: Arc<AtomicUsize>,
    predicate_calls: Arc<AtomicUsize>,
}

impl MockFilter {
    fn new(name: String, filter_type: FilterType, order: i32, behavior: Behavior) -> Self {
        Self {
            name,
            filter_type,
            order,
            predicate: Predicate::Accept,
            behavior,
            invocations: Arc::new(AtomicUsize::new(0)),
            predicate_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// An inbound filter named `pre.Mock{order}` that appends its name to the
    /// request's [`TRAIL_HEADER`].
    #[must_use]
    pub fn inbound(order: i32) -> Self {
        Self::new(
            format!("pre.Mock{order}"),
            FilterType::Inbound,
            order,
            Behavior::AppendTrail,
        )
    }

    /// An outbound filter named `post.Mock{order}` that appends its name to the
    /// [`TRAIL_HEADER`] of the message it receives.
    #[must_use]
    pub fn outbound(order: i32) -> Self {
        Self::new(
            format!("post.Mock{order}"),
            FilterType::Outbound,
            order,
            Behavior::AppendTrail,
        )
    }

    /// An endpoint that answers with an empty response of `status`.
    #[must_use]
    pub fn endpoint(name: impl Into<String>, status: StatusCode) -> Self {
        Self::new(name.into(), FilterType::Endpoint, 0, Behavior::Respond(status))
    }

    /// Renames the filter.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Changes the filter type.
    #[must_use]
    pub fn with_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }

    /// Makes `should_filter` return false.
    #[must_use]
    pub fn skipping(mut self) -> Self {
        self.predicate = Predicate::Reject;
        self
    }

    /// Makes `should_filter` return an error.
    #[must_use]
    pub fn predicate_error(mut self, message: impl Into<String>) -> Self {
        self.predicate = Predicate::Error(message.into());
        self
    }

    /// Makes `should_filter` panic.
    #[must_use]
    pub fn panicking_in_predicate(mut self, message: impl Into<String>) -> Self {
        self.predicate = Predicate::Panic(message.into());
        self
    }

    /// Makes `apply_async` return an already-failed future.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.behavior = Behavior::Fail(message.into());
        self
    }

    /// Makes `apply_async` fail after yielding to the runtime once.
    #[must_use]
    pub fn failing_async(mut self, message: impl Into<String>) -> Self {
        self.behavior = Behavior::FailAfterYield(message.into());
        self
    }

    /// Makes `apply_async` panic before returning a future.
    #[must_use]
    pub fn panicking(mut self, message: impl Into<String>) -> Self {
        self.behavior = Behavior::Panic(message.into());
        self
    }

    /// Makes the future returned by `apply_async` panic when polled.
    #[must_use]
    pub fn panicking_in_future(mut self, message: impl Into<String>) -> Self {
        self.behavior = Behavior::PanicInFuture(message.into());
        self
    }

    /// Returns how many times `apply_async` was called.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Returns how many times `should_filter` was called.
    #[must_use]
    pub fn predicate_calls(&self) -> usize {
        self.predicate_calls.load(Ordering::SeqCst)
    }
}

impl Filter for MockFilter {
    fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn should_filter(&self, _message: &Message) -> FilterResult<bool> {
        self.predicate_calls.fetch_add(1, Ordering::SeqCst);
        match &self.predicate {
            Predicate::Accept => Ok(true),
            Predicate::Reject => Ok(false),
            Predicate::Error(message) => Err(FilterError::failed(message.clone())),
            Predicate::Panic(message) => panic!("{message}"),
        }
    }

    fn apply_async(&self, message: Message) -> BoxFuture<'_, FilterResult<Message>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match self.behavior.clone() {
            Behavior::AppendTrail => {
                let name = self.name.clone();
                Box::pin(async move { Ok(append_trail(message, &name)) })
            }
            Behavior::Respond(status) => Box::pin(async move {
                tokio::task::yield_now().await;
                Ok(Message::Response(ResponseMessage::new(
                    message.into_request(),
                    status,
                )))
            }),
            Behavior::Fail(reason) => Box::pin(std::future::ready(Err(FilterError::failed(reason)))),
            Behavior::FailAfterYield(reason) => Box::pin(async move {
                tokio::task::yield_now().await;
                Err(FilterError::failed(reason))
            }),
            Behavior::Panic(reason) => panic!("{reason}"),
            Behavior::PanicInFuture(reason) => Box::pin(panic_after_yield(reason)),
        }
    }
}

fn append_trail(mut message: Message, name: &str) -> Message {
    let headers = match &mut message {
        Message::Request(request) => request.headers_mut(),
        Message::Response(response) => response.headers_mut(),
    };
    if let Ok(value) = HeaderValue::from_str(name) {
        headers.append(TRAIL_HEADER, value);
    }
    message
}

async fn panic_after_yield(reason: String) -> FilterResult<Message> {
    tokio::task::yield_now().await;
    panic!("{reason}")
}

/// A usage notifier that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, ExecutionStatus)>>,
}

impl RecordingNotifier {
    /// Returns the recorded `(filter name, status)` pairs in order.
    #[must_use]
    pub fn events(&self) -> Vec<(String, ExecutionStatus)> {
        self.events.lock().clone()
    }

    /// Returns the recorded statuses in order.
    #[must_use]
    pub fn statuses(&self) -> Vec<ExecutionStatus> {
        self.events.lock().iter().map(|(_, s)| *s).collect()
    }
}

impl UsageNotifier for RecordingNotifier {
    fn notify(&self, filter: &dyn Filter, _message: &Message, info: &FilterExecInfo) {
        self.events
            .lock()
            .push((filter.name().to_string(), info.status));
    }
}
