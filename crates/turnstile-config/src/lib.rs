//! Typed configuration for Turnstile.
//!
//! Supports:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use turnstile_config::ConfigLoader;
//! use turnstile_filter::{FilterProcessor, InMemoryFilterRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("turnstile.toml")?
//!     .with_env_prefix("TURNSTILE")
//!     .load()?;
//!
//! let processor = FilterProcessor::builder()
//!     .registry(Arc::new(InMemoryFilterRegistry::new()))
//!     .config(config.processor_config()?)
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [processor]
//! error_endpoint = "endpoint.ErrorResponse"
//! default_endpoint = "endpoint.Proxy"
//! default_error_status = 500
//! disabled_filters = ["pre.Debug"]
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `TURNSTILE__PROCESSOR__DEFAULT_ENDPOINT=endpoint.Proxy`
//! - `TURNSTILE__PROCESSOR__DISABLED_FILTERS=pre.Debug,post.Gzip`
//! - `TURNSTILE__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TurnstileConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingSection, ProcessorSection};
