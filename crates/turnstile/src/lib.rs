//! # Turnstile
//!
//! **Filter-chain execution engine for HTTP gateways**
//!
//! Turnstile runs every request through three stages of pluggable filters:
//!
//! ```text
//! Request → pre filters → endpoint → post filters → Response
//!                            │
//!              on failure: error endpoint → default error response
//! ```
//!
//! A failing or panicking filter never fails the request. Its error is
//! recorded on the request's [`SessionContext`](prelude::SessionContext) and
//! the chain continues with the filter's input message.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use turnstile::prelude::*;
//!
//! struct Hello;
//!
//! impl Filter for Hello {
//!     fn filter_type(&self) -> FilterType {
//!         FilterType::Endpoint
//!     }
//!
//!     fn name(&self) -> &str {
//!         "endpoint.Hello"
//!     }
//!
//!     fn order(&self) -> i32 {
//!         0
//!     }
//!
//!     fn should_filter(&self, _message: &Message) -> FilterResult<bool> {
//!         Ok(true)
//!     }
//!
//!     fn apply_async(&self, message: Message) -> BoxFuture<'_, FilterResult<Message>> {
//!         Box::pin(async move {
//!             let mut response = ResponseMessage::new(message.into_request(), http::StatusCode::OK);
//!             response.set_body("hello");
//!             Ok(Message::Response(response))
//!         })
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let registry = Arc::new(InMemoryFilterRegistry::new());
//! registry.register(Hello);
//!
//! let processor = FilterProcessor::builder().registry(registry).build().unwrap();
//!
//! let ctx = SessionContext::new();
//! ctx.set_endpoint("endpoint.Hello");
//! let request = RequestMessage::builder(ctx.clone()).path("/greet").build();
//!
//! let output = processor.process(request).await;
//! assert_eq!(output.as_response().unwrap().body().as_ref(), b"hello");
//! assert!(!ctx.has_filter_errors());
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use turnstile_core as core;

// Re-export filter contract and processor
pub use turnstile_filter as filter;

// Re-export configuration
pub use turnstile_config as config;

// Re-export logging and metrics
pub use turnstile_telemetry as telemetry;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use turnstile_core::{
        ExecutionStatus, FilterError, FilterResult, FilterType, Message, RequestId,
        RequestMessage, ResponseMessage, SessionContext,
    };

    pub use turnstile_filter::{
        BoxFuture, Filter, FilterExecInfo, FilterProcessor, FilterRegistry,
        InMemoryFilterRegistry, ProcessorConfig, UsageNotifier,
    };

    pub use turnstile_config::{ConfigLoader, TurnstileConfig};

    pub use turnstile_telemetry::{init_logging, LogConfig, MetricsUsageNotifier};
}
