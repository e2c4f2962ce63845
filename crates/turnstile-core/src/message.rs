//! Messages that flow through the filter pipeline.
//!
//! A [`Message`] is either a [`RequestMessage`] or a [`ResponseMessage`].
//! Inbound filters see requests, the endpoint turns a request into a
//! response, and outbound filters see the response. Both shapes carry the
//! same [`SessionContext`].

use crate::context::SessionContext;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Version};

/// Ordered query parameters of a request.
///
/// Keeps duplicate keys and insertion order, as query strings do.
///
/// # Example
///
/// ```
/// use turnstile_core::QueryParams;
///
/// let params = QueryParams::parse("a=1&b=2&a=3");
/// assert_eq!(params.get("a"), Some("1"));
/// assert_eq!(params.get_all("a"), vec!["1", "3"]);
/// assert_eq!(params.to_query_string(), "a=1&b=2&a=3");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string (without the leading `?`).
    ///
    /// Values are kept as they appear; no percent-decoding is applied.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let pairs = query
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (part.to_string(), String::new()),
            })
            .collect();
        Self { pairs }
    }

    /// Appends a parameter.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for `key` in order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Renders the parameters back into a query string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| if v.is_empty() { k.clone() } else { format!("{k}={v}") })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// An inbound HTTP request as seen by filters.
#[derive(Debug, Clone)]
pub struct RequestMessage {
    context: SessionContext,
    protocol: Version,
    method: Method,
    path: String,
    query: QueryParams,
    headers: HeaderMap,
    client_ip: String,
    scheme: String,
    port: u16,
    server_name: String,
    body: Bytes,
}

impl RequestMessage {
    /// Creates a request builder bound to the given context.
    ///
    /// # Example
    ///
    /// ```
    /// use http::Method;
    /// use turnstile_core::{RequestMessage, SessionContext};
    ///
    /// let request = RequestMessage::builder(SessionContext::new())
    ///     .method(Method::GET)
    ///     .path("/somepath")
    ///     .client_ip("127.0.0.1")
    ///     .scheme("https")
    ///     .port(443)
    ///     .server_name("localhost")
    ///     .build();
    ///
    /// assert_eq!(request.path(), "/somepath");
    /// assert_eq!(request.port(), 443);
    /// ```
    #[must_use]
    pub fn builder(context: SessionContext) -> RequestMessageBuilder {
        RequestMessageBuilder::new(context)
    }

    /// Returns the session context.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Returns the HTTP protocol version.
    #[must_use]
    pub fn protocol(&self) -> Version {
        self.protocol
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replaces the request path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Returns the query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Returns the query parameters for modification.
    pub fn query_mut(&mut self) -> &mut QueryParams {
        &mut self.query
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the client address.
    #[must_use]
    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    /// Returns the request scheme (`http` or `https`).
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the port the request arrived on.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the server name the client addressed.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the request body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }
}

/// Builder for [`RequestMessage`].
#[derive(Debug)]
pub struct RequestMessageBuilder {
    inner: RequestMessage,
}

impl RequestMessageBuilder {
    fn new(context: SessionContext) -> Self {
        Self {
            inner: RequestMessage {
                context,
                protocol: Version::HTTP_11,
                method: Method::GET,
                path: "/".to_string(),
                query: QueryParams::new(),
                headers: HeaderMap::new(),
                client_ip: String::new(),
                scheme: "http".to_string(),
                port: 80,
                server_name: String::new(),
                body: Bytes::new(),
            },
        }
    }

    /// Sets the HTTP protocol version.
    #[must_use]
    pub fn protocol(mut self, protocol: Version) -> Self {
        self.inner.protocol = protocol;
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.inner.method = method;
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.inner.path = path.into();
        self
    }

    /// Sets the query parameters.
    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.inner.query = query;
        self
    }

    /// Sets the headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.inner.headers = headers;
        self
    }

    /// Sets the client address.
    #[must_use]
    pub fn client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.inner.client_ip = client_ip.into();
        self
    }

    /// Sets the scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.inner.scheme = scheme.into();
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.inner.port = port;
        self
    }

    /// Sets the server name.
    #[must_use]
    pub fn server_name(mut self, server_name: impl Into<String>) -> Self {
        self.inner.server_name = server_name.into();
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.inner.body = body.into();
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> RequestMessage {
        self.inner
    }
}

/// A response produced by an endpoint filter.
///
/// Keeps the request it answers, and shares that request's context.
#[derive(Debug, Clone)]
pub struct ResponseMessage {
    context: SessionContext,
    request: RequestMessage,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseMessage {
    /// Creates an empty response with the given status for `request`.
    #[must_use]
    pub fn new(request: RequestMessage, status: StatusCode) -> Self {
        Self {
            context: request.context().clone(),
            request,
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates the fallback response used when no endpoint produced one.
    ///
    /// The body is empty; outbound filters may still decorate it.
    #[must_use]
    pub fn default_error(request: RequestMessage, status: StatusCode) -> Self {
        Self::new(request, status)
    }

    /// Returns the session context.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Returns the request this response answers.
    #[must_use]
    pub fn request(&self) -> &RequestMessage {
        &self.request
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the response body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }
}

/// Which shape a [`Message`] currently has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A request message.
    Request,
    /// A response message.
    Response,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// The unit flowing through the filter pipeline.
#[derive(Debug, Clone)]
pub enum Message {
    /// A request, before the endpoint ran.
    Request(RequestMessage),
    /// A response, produced by the endpoint.
    Response(ResponseMessage),
}

impl Message {
    /// Returns the session context shared by both shapes.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        match self {
            Self::Request(req) => req.context(),
            Self::Response(resp) => resp.context(),
        }
    }

    /// Returns the current shape.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Request(_) => MessageKind::Request,
            Self::Response(_) => MessageKind::Response,
        }
    }

    /// Returns true if this is a response.
    #[must_use]
    pub const fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    /// Returns the request, if this is one.
    #[must_use]
    pub const fn as_request(&self) -> Option<&RequestMessage> {
        match self {
            Self::Request(req) => Some(req),
            Self::Response(_) => None,
        }
    }

    /// Returns the response, if this is one.
    #[must_use]
    pub const fn as_response(&self) -> Option<&ResponseMessage> {
        match self {
            Self::Response(resp) => Some(resp),
            Self::Request(_) => None,
        }
    }

    /// Returns the response for modification, if this is one.
    pub fn as_response_mut(&mut self) -> Option<&mut ResponseMessage> {
        match self {
            Self::Response(resp) => Some(resp),
            Self::Request(_) => None,
        }
    }

    /// Converts into a response, or gives the message back unchanged.
    pub fn into_response(self) -> Result<ResponseMessage, Self> {
        match self {
            Self::Response(resp) => Ok(resp),
            other @ Self::Request(_) => Err(other),
        }
    }

    /// Returns the request this message belongs to.
    ///
    /// For a response, this is the request it answers.
    #[must_use]
    pub const fn request(&self) -> &RequestMessage {
        match self {
            Self::Request(req) => req,
            Self::Response(resp) => &resp.request,
        }
    }

    /// Consumes the message and returns the request it belongs to.
    #[must_use]
    pub fn into_request(self) -> RequestMessage {
        match self {
            Self::Request(req) => req,
            Self::Response(resp) => resp.request,
        }
    }
}

impl From<RequestMessage> for Message {
    fn from(req: RequestMessage) -> Self {
        Self::Request(req)
    }
}

impl From<ResponseMessage> for Message {
    fn from(resp: ResponseMessage) -> Self {
        Self::Response(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RequestMessage {
        RequestMessage::builder(SessionContext::new())
            .method(Method::POST)
            .path("/orders")
            .query(QueryParams::parse("flag&id=7"))
            .client_ip("10.0.0.1")
            .scheme("https")
            .port(8443)
            .server_name("api.example.com")
            .body("payload")
            .build()
    }

    #[test]
    fn test_request_builder_defaults() {
        let req = RequestMessage::builder(SessionContext::new()).build();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.path(), "/");
        assert_eq!(req.protocol(), Version::HTTP_11);
        assert_eq!(req.scheme(), "http");
        assert_eq!(req.port(), 80);
        assert!(req.query().is_empty());
        assert!(req.body().is_empty());
    }

    #[test]
    fn test_query_without_value() {
        let req = request();
        assert_eq!(req.query().get("flag"), Some(""));
        assert_eq!(req.query().get("id"), Some("7"));
        assert_eq!(req.query().to_query_string(), "flag&id=7");
    }

    #[test]
    fn test_response_shares_request_context() {
        let req = request();
        let ctx = req.context().clone();
        let resp = ResponseMessage::new(req, StatusCode::ACCEPTED);

        assert!(resp.context().same_as(&ctx));
        assert_eq!(resp.request().path(), "/orders");
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_default_error_has_empty_body() {
        let resp = ResponseMessage::default_error(request(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.body().is_empty());
    }

    #[test]
    fn test_message_shapes() {
        let req = request();
        let msg = Message::from(req.clone());
        assert_eq!(msg.kind(), MessageKind::Request);
        assert!(!msg.is_response());
        assert!(msg.as_response().is_none());
        let msg = msg.into_response().unwrap_err();
        assert!(msg.as_request().is_some());

        let msg = Message::from(ResponseMessage::new(req, StatusCode::OK));
        assert_eq!(msg.kind(), MessageKind::Response);
        assert_eq!(msg.request().path(), "/orders");
        assert_eq!(msg.into_response().unwrap().status(), StatusCode::OK);
    }

    #[test]
    fn test_mutation_in_place() {
        let mut msg = Message::from(ResponseMessage::new(request(), StatusCode::OK));
        if let Some(resp) = msg.as_response_mut() {
            resp.set_status(StatusCode::NOT_FOUND);
            resp.set_body("missing");
            resp.headers_mut()
                .insert("x-origin", http::HeaderValue::from_static("edge"));
        }
        let resp = msg.as_response().unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.body().as_ref(), b"missing");
        assert_eq!(resp.headers().get("x-origin").unwrap(), "edge");
    }
}
