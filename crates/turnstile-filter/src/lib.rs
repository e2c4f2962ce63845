//! # Turnstile Filter
//!
//! Filter contract, registry and filter processor for the Turnstile gateway.
//!
//! Requests flow through three stages of pluggable filters:
//!
//! ```text
//! Request → pre filters → endpoint → post filters → Response
//! ```
//!
//! | Stage | Filter type | Selection |
//! |-------|-------------|-----------|
//! | Inbound | `pre` | every registered `pre` filter, ascending order |
//! | Endpoint | `end` / `route` | one filter, by the name held in the session context |
//! | Outbound | `post` | every registered `post` filter, ascending order |
//!
//! ## Failure Isolation
//!
//! - A filter that errors or panics is recorded in the session context and
//!   its input message is passed on unchanged
//! - An endpoint that fails is replaced by the error endpoint
//!   (`endpoint.ErrorResponse` by default)
//! - An error endpoint that fails is replaced by a default 500 response
//!
//! The pipeline therefore always yields a response and never returns an error
//! to its caller.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use http::StatusCode;
//! use turnstile_core::SessionContext;
//! use turnstile_filter::fixtures::{sample_request, MockFilter};
//! use turnstile_filter::{FilterProcessor, InMemoryFilterRegistry};
//!
//! # tokio_test::block_on(async {
//! let registry = Arc::new(InMemoryFilterRegistry::new());
//! registry.register(MockFilter::endpoint("endpoint.Proxy", StatusCode::OK).failing("refused"));
//!
//! let processor = FilterProcessor::builder().registry(registry).build().unwrap();
//!
//! let ctx = SessionContext::new();
//! ctx.set_endpoint("endpoint.Proxy");
//! let output = processor.process(sample_request(ctx.clone())).await;
//!
//! // No error endpoint registered: the default error response is sent.
//! assert_eq!(output.as_response().unwrap().status(), StatusCode::INTERNAL_SERVER_ERROR);
//! assert_eq!(ctx.filter_errors().len(), 2);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-filter/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod filter;
pub mod fixtures;
pub mod notifier;
pub mod processor;
pub mod registry;

// Re-export main types at crate root
pub use filter::{BoxFuture, Filter};
pub use notifier::{FilterExecInfo, NoopUsageNotifier, TracingUsageNotifier, UsageNotifier};
pub use processor::{
    FilterProcessor, FilterProcessorBuilder, ProcessorConfig, ProcessorError,
    DEFAULT_ERROR_ENDPOINT, UNRESOLVED_ENDPOINT,
};
pub use registry::{FilterRegistry, InMemoryFilterRegistry};
pub use turnstile_core::{ExecutionStatus, FilterError, FilterResult, FilterType, Message};
