//! Configuration section types.

use serde::{Deserialize, Serialize};
use turnstile_filter::DEFAULT_ERROR_ENDPOINT;

/// Filter processor configuration.
///
/// # Example
///
/// ```toml
/// [processor]
/// error_endpoint = "endpoint.ErrorResponse"
/// default_endpoint = "endpoint.Proxy"
/// default_error_status = 502
/// disabled_filters = ["pre.Debug"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProcessorSection {
    /// Name of the filter run when an error response must be sent.
    #[serde(default = "default_error_endpoint")]
    pub error_endpoint: String,

    /// Endpoint used when a request has none selected.
    #[serde(default)]
    pub default_endpoint: Option<String>,

    /// Status of the response sent when the error endpoint fails too.
    #[serde(default = "default_error_status")]
    pub default_error_status: u16,

    /// Filters that must not run.
    #[serde(default)]
    pub disabled_filters: Vec<String>,
}

impl Default for ProcessorSection {
    fn default() -> Self {
        Self {
            error_endpoint: default_error_endpoint(),
            default_endpoint: None,
            default_error_status: default_error_status(),
            disabled_filters: Vec::new(),
        }
    }
}

fn default_error_endpoint() -> String {
    DEFAULT_ERROR_ENDPOINT.to_string()
}

const fn default_error_status() -> u16 {
    500
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log filter directive, e.g. `info` or `turnstile_filter=debug,info`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_defaults() {
        let section = ProcessorSection::default();
        assert_eq!(section.error_endpoint, "endpoint.ErrorResponse");
        assert_eq!(section.default_error_status, 500);
        assert!(section.default_endpoint.is_none());
        assert!(section.disabled_filters.is_empty());
    }

    #[test]
    fn test_partial_processor_section_fills_defaults() {
        let section: ProcessorSection =
            toml::from_str(r#"default_endpoint = "endpoint.Proxy""#).unwrap();
        assert_eq!(section.default_endpoint.as_deref(), Some("endpoint.Proxy"));
        assert_eq!(section.error_endpoint, "endpoint.ErrorResponse");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<LoggingSection, _> = toml::from_str(r#"colour = "always""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_lowercase() {
        let section: LoggingSection = serde_json::from_str(r#"{"format": "pretty"}"#).unwrap();
        assert_eq!(section.format, LogFormat::Pretty);
        assert!(section.enabled);
        assert_eq!(section.level, "info");
    }
}
