//! The filter processor.
//!
//! [`FilterProcessor`] drives a request through the three filter stages:
//!
//! ```text
//! Request → [pre filters, ascending order] → [endpoint] → [post filters, ascending order] → Response
//!                                                │
//!                                   on failure: error endpoint
//!                                                │
//!                              on failure again: default error response
//! ```
//!
//! Every filter runs through one wrapper, [`FilterProcessor::process_filter`],
//! which evaluates the predicate, runs the filter body, records the outcome
//! in the session context and isolates failures. A failing filter never
//! fails the request: its input message is passed on unchanged.
//!
//! The endpoint stage always resolves to a response. If the selected
//! endpoint does not produce one, the processor sets the context's
//! `should_send_error_response` flag and runs the error endpoint. If that
//! does not produce a response either, a default error response is
//! synthesized.

use crate::filter::{BoxFuture, Filter};
use crate::notifier::{FilterExecInfo, NoopUsageNotifier, UsageNotifier};
use crate::registry::FilterRegistry;
use futures_util::FutureExt;
use http::StatusCode;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use turnstile_core::{
    ExecutionStatus, FilterError, FilterResult, FilterType, Message, RequestMessage,
    ResponseMessage, SessionContext,
};

/// Default name of the error endpoint filter.
pub const DEFAULT_ERROR_ENDPOINT: &str = "endpoint.ErrorResponse";

/// Name recorded when a request reaches the endpoint stage with no endpoint selected.
pub const UNRESOLVED_ENDPOINT: &str = "endpoint.Unresolved";

/// Errors raised while constructing a [`FilterProcessor`].
///
/// These are the only failures the processor surfaces; everything that goes
/// wrong while filters run is recorded on the session context instead.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// No filter registry was supplied.
    #[error("filter processor requires a filter registry")]
    MissingRegistry,

    /// The processor configuration is invalid.
    #[error("invalid processor configuration: {0}")]
    InvalidConfig(String),
}

/// Processor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Name of the filter run when an error response must be sent.
    pub error_endpoint: String,
    /// Endpoint used when the context has none selected.
    pub default_endpoint: Option<String>,
    /// Status of the response synthesized when the error endpoint fails.
    pub default_error_status: StatusCode,
    /// Names of filters that must not run.
    pub disabled_filters: HashSet<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            error_endpoint: DEFAULT_ERROR_ENDPOINT.to_string(),
            default_endpoint: None,
            default_error_status: StatusCode::INTERNAL_SERVER_ERROR,
            disabled_filters: HashSet::new(),
        }
    }
}

impl ProcessorConfig {
    /// Returns true if the named filter is switched off.
    #[must_use]
    pub fn is_disabled(&self, filter_name: &str) -> bool {
        self.disabled_filters.contains(filter_name)
    }

    /// Checks the configuration for values the processor cannot work with.
    pub fn validate(&self) -> Result<(), ProcessorError> {
        if self.error_endpoint.trim().is_empty() {
            return Err(ProcessorError::InvalidConfig(
                "error endpoint name must not be empty".to_string(),
            ));
        }
        if self.is_disabled(&self.error_endpoint) {
            return Err(ProcessorError::InvalidConfig(format!(
                "error endpoint `{}` must not be disabled",
                self.error_endpoint
            )));
        }
        Ok(())
    }
}

/// Why an endpoint name could not be resolved to a usable filter.
#[derive(Debug, Clone, Copy)]
enum Unresolved {
    NotSet,
    NotFound,
    WrongType(FilterType),
}

/// Stand-in for an endpoint that could not be resolved.
///
/// Running it always fails, so resolution failures take the same recording
/// and recovery path as execution failures.
struct UnresolvedEndpoint {
    name: String,
    reason: Unresolved,
}

impl UnresolvedEndpoint {
    fn new(name: impl Into<String>, reason: Unresolved) -> Self {
        Self {
            name: name.into(),
            reason,
        }
    }

    fn error(&self) -> FilterError {
        match self.reason {
            Unresolved::NotSet => FilterError::EndpointNotSet,
            Unresolved::NotFound => FilterError::not_found(&self.name),
            Unresolved::WrongType(filter_type) => FilterError::NotAnEndpoint {
                name: self.name.clone(),
                filter_type,
            },
        }
    }
}

impl Filter for UnresolvedEndpoint {
    fn filter_type(&self) -> FilterType {
        FilterType::Endpoint
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        0
    }

    fn should_filter(&self, _message: &Message) -> FilterResult<bool> {
        Ok(true)
    }

    fn apply_async(&self, _message: Message) -> BoxFuture<'_, FilterResult<Message>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}

/// Runs filter stages over messages.
///
/// The processor is cheap to share: wrap it in an `Arc` and call it from as
/// many request tasks as needed. It holds no per-request state.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use http::StatusCode;
/// use turnstile_core::SessionContext;
/// use turnstile_filter::fixtures::{sample_request, MockFilter};
/// use turnstile_filter::{FilterProcessor, InMemoryFilterRegistry};
///
/// # tokio_test::block_on(async {
/// let registry = InMemoryFilterRegistry::new();
/// registry.register(MockFilter::inbound(0));
/// registry.register(MockFilter::endpoint("endpoint.Hello", StatusCode::OK));
///
/// let processor = FilterProcessor::builder()
///     .registry(Arc::new(registry))
///     .build()
///     .unwrap();
///
/// let ctx = SessionContext::new();
/// ctx.set_endpoint("endpoint.Hello");
/// let output = processor.process(sample_request(ctx.clone())).await;
///
/// assert_eq!(output.as_response().unwrap().status(), StatusCode::OK);
/// assert_eq!(ctx.execution_summary().len(), 2);
/// # });
/// ```
pub struct FilterProcessor {
    registry: Arc<dyn FilterRegistry>,
    notifier: Arc<dyn UsageNotifier>,
    config: ProcessorConfig,
}

impl FilterProcessor {
    /// Creates a processor with the default configuration.
    ///
    /// The default configuration always validates; use [`Self::builder`] to
    /// supply a custom one.
    #[must_use]
    pub fn new(registry: Arc<dyn FilterRegistry>, notifier: Arc<dyn UsageNotifier>) -> Self {
        Self {
            registry,
            notifier,
            config: ProcessorConfig::default(),
        }
    }

    /// Creates a new processor builder.
    #[must_use]
    pub fn builder() -> FilterProcessorBuilder {
        FilterProcessorBuilder::new()
    }

    /// Returns the processor configuration.
    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Runs all three stages for one request.
    pub async fn process(&self, request: RequestMessage) -> Message {
        let message = self.apply_inbound_filters(request.into()).await;
        let response = self.apply_endpoint_filter(message).await;
        self.apply_outbound_filters(response.into()).await
    }

    /// Runs every inbound (`pre`) filter in ascending order.
    pub async fn apply_inbound_filters(&self, message: Message) -> Message {
        self.apply_filters(FilterType::Inbound, message).await
    }

    /// Runs every outbound (`post`) filter in ascending order.
    pub async fn apply_outbound_filters(&self, message: Message) -> Message {
        self.apply_filters(FilterType::Outbound, message).await
    }

    /// Runs the selected endpoint and returns its response.
    ///
    /// Selection: the error endpoint when the context's
    /// `should_send_error_response` flag is set, otherwise the context's
    /// endpoint, otherwise the configured default endpoint.
    ///
    /// If the normal endpoint yields no response, the flag is set and the
    /// error endpoint runs. If the error endpoint yields no response, a
    /// default error response is synthesized. At most two endpoints run, and
    /// the error endpoint runs at most once.
    pub async fn apply_endpoint_filter(&self, message: Message) -> ResponseMessage {
        let ctx = message.context().clone();
        let mut message = message;

        loop {
            let error_pass = ctx.should_send_error_response();
            let endpoint = if error_pass {
                self.resolve_endpoint(Some(&self.config.error_endpoint))
            } else {
                let selected = ctx.endpoint().or_else(|| self.config.default_endpoint.clone());
                self.resolve_endpoint(selected.as_deref())
            };

            message = self.process_filter(message, endpoint.as_ref()).await;

            // The error endpoint never runs twice, even when it was also the
            // selected endpoint.
            let error_endpoint_ran = error_pass || endpoint.name() == self.config.error_endpoint;

            match message.into_response() {
                Ok(response) => return response,
                Err(unchanged) if error_endpoint_ran => {
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        filter = endpoint.name(),
                        status = self.config.default_error_status.as_u16(),
                        "error endpoint produced no response, sending default error response"
                    );
                    return ResponseMessage::default_error(
                        unchanged.into_request(),
                        self.config.default_error_status,
                    );
                }
                Err(unchanged) => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        filter = endpoint.name(),
                        error_endpoint = %self.config.error_endpoint,
                        "endpoint produced no response, switching to error endpoint"
                    );
                    ctx.set_should_send_error_response(true);
                    message = unchanged;
                }
            }
        }
    }

    /// Runs one filter against one message.
    ///
    /// Returns the filter's output on success. When the filter is disabled,
    /// its predicate says no, or anything fails (including a panic), returns
    /// the input message unchanged. The outcome is always recorded in the
    /// message's session context.
    pub async fn process_filter(&self, message: Message, filter: &dyn Filter) -> Message {
        let ctx = message.context().clone();
        let started = Instant::now();

        if self.config.is_disabled(filter.name()) {
            let info = FilterExecInfo::new(ExecutionStatus::Disabled, started.elapsed());
            self.record_filter_completion(&ctx, &message, filter, &info);
            return message;
        }

        let should_filter = panic::catch_unwind(AssertUnwindSafe(|| filter.should_filter(&message)))
            .unwrap_or_else(|payload| Err(FilterError::from_panic(payload.as_ref())));

        match should_filter {
            Ok(true) => {}
            Ok(false) => {
                let info = FilterExecInfo::new(ExecutionStatus::Skipped, started.elapsed());
                self.record_filter_completion(&ctx, &message, filter, &info);
                return message;
            }
            Err(error) => return self.recover(&ctx, message, filter, error, started),
        }

        let input = message.clone();
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| filter.apply_async(message))) {
            Ok(future) => AssertUnwindSafe(future)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(FilterError::from_panic(payload.as_ref()))),
            Err(payload) => Err(FilterError::from_panic(payload.as_ref())),
        };

        match outcome {
            Ok(output) => {
                let info = FilterExecInfo::new(ExecutionStatus::Success, started.elapsed());
                self.record_filter_completion(&ctx, &output, filter, &info);
                output
            }
            Err(error) => self.recover(&ctx, input, filter, error, started),
        }
    }

    async fn apply_filters(&self, filter_type: FilterType, message: Message) -> Message {
        let filters = self.registry.filters_by_type(filter_type);

        let mut message = message;
        for filter in &filters {
            message = self.process_filter(message, filter.as_ref()).await;
        }
        message
    }

    fn resolve_endpoint(&self, name: Option<&str>) -> Arc<dyn Filter> {
        let Some(name) = name else {
            return Arc::new(UnresolvedEndpoint::new(UNRESOLVED_ENDPOINT, Unresolved::NotSet));
        };

        match self.registry.filter_by_name(name) {
            Some(filter) if filter.filter_type().is_endpoint_role() => filter,
            Some(filter) => Arc::new(UnresolvedEndpoint::new(
                name,
                Unresolved::WrongType(filter.filter_type()),
            )),
            None => Arc::new(UnresolvedEndpoint::new(name, Unresolved::NotFound)),
        }
    }

    fn recover(
        &self,
        ctx: &SessionContext,
        input: Message,
        filter: &dyn Filter,
        error: FilterError,
        started: Instant,
    ) -> Message {
        let error = Arc::new(error);
        self.record_filter_error(ctx, filter, &error);
        let info = FilterExecInfo::failed(error, started.elapsed());
        self.record_filter_completion(ctx, &input, filter, &info);
        input
    }

    fn record_filter_error(&self, ctx: &SessionContext, filter: &dyn Filter, error: &Arc<FilterError>) {
        tracing::warn!(
            request_id = %ctx.request_id(),
            filter = filter.name(),
            filter_type = %filter.filter_type(),
            error = %error,
            "filter failed"
        );
        ctx.add_filter_error(filter.name(), filter.filter_type(), error.clone());
    }

    fn record_filter_completion(
        &self,
        ctx: &SessionContext,
        message: &Message,
        filter: &dyn Filter,
        info: &FilterExecInfo,
    ) {
        ctx.add_filter_execution_summary(filter.name(), info.status, info.duration);

        if ctx.debug_routing() {
            ctx.add_routing_debug(format!(
                "Filter {} {} {} {} {}ms",
                filter.filter_type(),
                filter.order(),
                filter.name(),
                info.status,
                info.duration_ms()
            ));
        }

        tracing::debug!(
            request_id = %ctx.request_id(),
            filter = filter.name(),
            filter_type = %filter.filter_type(),
            status = %info.status,
            duration_ms = info.duration_ms(),
            "filter completed"
        );

        if matches!(info.status, ExecutionStatus::Success | ExecutionStatus::Failed) {
            let notified = panic::catch_unwind(AssertUnwindSafe(|| {
                self.notifier.notify(filter, message, info);
            }));
            if notified.is_err() {
                tracing::warn!(filter = filter.name(), "usage notifier panicked; continuing");
            }
        }
    }
}

impl std::fmt::Debug for FilterProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterProcessor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`FilterProcessor`].
///
/// A registry is required. The notifier defaults to [`NoopUsageNotifier`]
/// and the configuration to [`ProcessorConfig::default`].
#[derive(Default)]
pub struct FilterProcessorBuilder {
    registry: Option<Arc<dyn FilterRegistry>>,
    notifier: Option<Arc<dyn UsageNotifier>>,
    config: ProcessorConfig,
}

impl FilterProcessorBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter registry.
    #[must_use]
    pub fn registry(mut self, registry: Arc<dyn FilterRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the usage notifier.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn UsageNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the processor configuration.
    #[must_use]
    pub fn config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the error endpoint name.
    #[must_use]
    pub fn error_endpoint(mut self, name: impl Into<String>) -> Self {
        self.config.error_endpoint = name.into();
        self
    }

    /// Sets the endpoint used when the context selects none.
    #[must_use]
    pub fn default_endpoint(mut self, name: impl Into<String>) -> Self {
        self.config.default_endpoint = Some(name.into());
        self
    }

    /// Switches off a filter by name.
    #[must_use]
    pub fn disable_filter(mut self, name: impl Into<String>) -> Self {
        self.config.disabled_filters.insert(name.into());
        self
    }

    /// Builds the processor.
    pub fn build(self) -> Result<FilterProcessor, ProcessorError> {
        let registry = self.registry.ok_or(ProcessorError::MissingRegistry)?;
        self.config.validate()?;

        Ok(FilterProcessor {
            registry,
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(NoopUsageNotifier)),
            config: self.config,
        })
    }
}
