//! The filter contract.
//!
//! This module defines the [`Filter`] trait that every gateway filter
//! implements. A filter declares its role ([`FilterType`]), a unique name, an
//! ordering priority, a predicate deciding whether it runs, and the
//! asynchronous body that transforms the message.
//!
//! # Example
//!
//! ```
//! use http::HeaderValue;
//! use turnstile_filter::{BoxFuture, Filter};
//! use turnstile_core::{FilterResult, FilterType, Message};
//!
//! struct TagRequest;
//!
//! impl Filter for TagRequest {
//!     fn filter_type(&self) -> FilterType {
//!         FilterType::Inbound
//!     }
//!
//!     fn name(&self) -> &str {
//!         "pre.TagRequest"
//!     }
//!
//!     fn order(&self) -> i32 {
//!         10
//!     }
//!
//!     fn should_filter(&self, message: &Message) -> FilterResult<bool> {
//!         Ok(!message.is_response())
//!     }
//!
//!     fn apply_async(&self, message: Message) -> BoxFuture<'_, FilterResult<Message>> {
//!         Box::pin(async move {
//!             let mut message = message;
//!             if let Message::Request(req) = &mut message {
//!                 req.headers_mut()
//!                     .insert("x-edge", HeaderValue::from_static("turnstile"));
//!             }
//!             Ok(message)
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use turnstile_core::{FilterResult, FilterType, Message};

/// A boxed future, as returned by [`Filter::apply_async`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The contract every gateway filter implements.
///
/// # Invariants
///
/// - [`name`](Self::name) is stable and unique within a registry; it keys the
///   session context's error list and execution summary.
/// - Within one stage, filters run in ascending [`order`](Self::order).
/// - The processor calls [`apply_async`](Self::apply_async) at most once per
///   filter per request, and only after [`should_filter`](Self::should_filter)
///   returned `Ok(true)`.
/// - An error (or a panic) from either method is recorded and the filter's
///   input passes through unchanged; it never fails the request.
pub trait Filter: Send + Sync + 'static {
    /// Returns the role of this filter, which decides the stage that selects it.
    fn filter_type(&self) -> FilterType;

    /// Returns the unique name of this filter.
    fn name(&self) -> &str;

    /// Returns the ordering priority; lower values run first.
    fn order(&self) -> i32;

    /// Decides whether this filter applies to `message`.
    ///
    /// Should be free of side effects. An `Err` is treated exactly like a
    /// failure of [`apply_async`](Self::apply_async).
    fn should_filter(&self, message: &Message) -> FilterResult<bool>;

    /// Runs the filter.
    ///
    /// Returns the message for the next filter: the same message, a modified
    /// one, or (for endpoints) a response built from the request.
    fn apply_async(&self, message: Message) -> BoxFuture<'_, FilterResult<Message>>;
}

impl std::fmt::Debug for dyn Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.name())
            .field("type", &self.filter_type())
            .field("order", &self.order())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_request, MockFilter};
    use http::StatusCode;
    use turnstile_core::SessionContext;

    #[tokio::test]
    async fn test_endpoint_mock_builds_response() {
        let endpoint = MockFilter::endpoint("endpoint.Test", StatusCode::CREATED);
        let request = sample_request(SessionContext::new());

        let output = endpoint.apply_async(request.into()).await.unwrap();
        assert_eq!(output.as_response().unwrap().status(), StatusCode::CREATED);
    }

    #[test]
    fn test_debug_for_trait_object() {
        let filter: std::sync::Arc<dyn Filter> = std::sync::Arc::new(MockFilter::inbound(3));
        let rendered = format!("{filter:?}");
        assert!(rendered.contains("pre.Mock3"));
        assert!(rendered.contains("Inbound"));
    }
}
