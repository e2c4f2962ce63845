//! Main configuration type.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use turnstile_filter::ProcessorConfig;

use crate::{ConfigError, LogFormat, LoggingSection, ProcessorSection};

/// Complete Turnstile configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use turnstile_config::TurnstileConfig;
///
/// let config = TurnstileConfig::default();
/// assert_eq!(config.processor.error_endpoint, "endpoint.ErrorResponse");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TurnstileConfig {
    /// Filter processor configuration.
    #[serde(default)]
    pub processor: ProcessorSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl TurnstileConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The error endpoint name is empty
    /// - The error endpoint is listed as disabled
    /// - The default error status is outside 100..=599
    /// - The default endpoint is set but empty
    /// - The log level is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let processor = &self.processor;

        if processor.error_endpoint.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "processor.error_endpoint",
                "must not be empty",
            ));
        }

        if processor
            .disabled_filters
            .iter()
            .any(|name| name == &processor.error_endpoint)
        {
            return Err(ConfigError::invalid_value(
                "processor.disabled_filters",
                format!(
                    "error endpoint `{}` must not be disabled",
                    processor.error_endpoint
                ),
            ));
        }

        if !(100..=599).contains(&processor.default_error_status) {
            return Err(ConfigError::invalid_value(
                "processor.default_error_status",
                format!(
                    "{} is not between 100 and 599",
                    processor.default_error_status
                ),
            ));
        }

        if processor
            .default_endpoint
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(ConfigError::invalid_value(
                "processor.default_endpoint",
                "must not be empty when set",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Builds the filter processor settings from the `processor` section.
    pub fn processor_config(&self) -> Result<ProcessorConfig, ConfigError> {
        ProcessorConfig::try_from(self.processor.clone())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty log output at debug level.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON log output at info level.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

impl TryFrom<ProcessorSection> for ProcessorConfig {
    type Error = ConfigError;

    fn try_from(section: ProcessorSection) -> Result<Self, Self::Error> {
        let default_error_status = StatusCode::from_u16(section.default_error_status)
            .map_err(|e| ConfigError::invalid_value("processor.default_error_status", e.to_string()))?;

        Ok(Self {
            error_endpoint: section.error_endpoint,
            default_endpoint: section.default_endpoint,
            default_error_status,
            disabled_filters: section.disabled_filters.into_iter().collect(),
        })
    }
}
