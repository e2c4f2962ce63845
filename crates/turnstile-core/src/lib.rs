//! # Turnstile Core
//!
//! Core types for the Turnstile filter engine.
//!
//! This crate provides the foundational types shared by the filter processor
//! and by filter implementations:
//!
//! - [`Message`] - A request or response flowing through the pipeline
//! - [`SessionContext`] - Per-request state: errors, execution summary, flags
//! - [`FilterType`] - The role a filter plays (pre, route, post, end)
//! - [`FilterError`] - The cause recorded for a failed filter
//! - [`ExecutionStatus`] / [`ExecutionSummary`] - Per-filter outcome bookkeeping

#![doc(html_root_url = "https://docs.rs/turnstile-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod execution;
mod filter_type;
mod message;

pub use context::{RequestId, SessionContext};
pub use error::{FilterError, FilterResult};
pub use execution::{ExecutionStatus, ExecutionSummary, FilterErrorRecord, SummaryEntry};
pub use filter_type::{FilterType, ParseFilterTypeError};
pub use message::{
    Message, MessageKind, QueryParams, RequestMessage, RequestMessageBuilder, ResponseMessage,
};
