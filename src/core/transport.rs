//! HTTP Transport
//!
//! HTTP client interface and implementations. Request bodies backed by a
//! temporary file are streamed rather than loaded into memory.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use url::Url;

use crate::error::{
    ConfigurationError, FluentHttpError, FluentResult, NetworkError, ProtocolError, ResponseError,
};
use crate::request::{Headers, HttpMethod, RequestBody, RequestDescriptor};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// HTTP response definition.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, keys lowercased.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> FluentResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ProtocolError::InvalidJson {
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the response, whatever its status.
    async fn send(&self, request: RequestDescriptor) -> FluentResult<HttpResponse>;
}

/// Send `request` and turn a non-2xx status into [`ResponseError`].
pub async fn dispatch<T: HttpTransport + ?Sized>(
    transport: &T,
    request: RequestDescriptor,
) -> FluentResult<HttpResponse> {
    let response = transport.send(request).await?;
    if response.is_success() {
        Ok(response)
    } else {
        Err(ResponseError {
            status: response.status,
            body: response.body,
        }
        .into())
    }
}

/// Transport settings.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Timeout applied when a request sets none.
    pub timeout: Duration,
    /// Largest response body accepted.
    pub max_response_size: usize,
    /// Follow 3xx responses. Streamed bodies cannot be replayed, so this is
    /// off by default and a redirect surfaces as an error.
    pub follow_redirects: bool,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            follow_redirects: false,
            user_agent: format!("fluent-http/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Default reqwest-based HTTP transport.
#[derive(Clone, Debug)]
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl ReqwestHttpTransport {
    /// Create new transport with default settings.
    pub fn new() -> FluentResult<Self> {
        Self::with_config(TransportConfig::default())
    }

    /// Create transport with custom settings.
    pub fn with_config(config: TransportConfig) -> FluentResult<Self> {
        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(redirect)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigurationError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: RequestDescriptor) -> FluentResult<HttpResponse> {
        let RequestDescriptor {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;
        let timeout = timeout.unwrap_or(self.config.timeout);

        debug!(method = method.as_str(), url = %url, "Sending request");

        let mut req_builder = self
            .client
            .request(Self::method(method), url.clone())
            .timeout(timeout);

        for (name, value) in headers.iter() {
            req_builder = req_builder.header(name.as_str(), value);
        }

        // Keeps a temporary body file alive until the exchange is over.
        let _body_guard = body.clone();

        req_builder = match &body {
            RequestBody::Empty => req_builder,
            RequestBody::Bytes(bytes) => req_builder.body(bytes.clone()),
            RequestBody::File(file) => {
                let handle = tokio::fs::File::open(file.path())
                    .await
                    .map_err(NetworkError::BodyUnavailable)?;
                req_builder.body(reqwest::Body::wrap_stream(ReaderStream::new(handle)))
            }
        };

        let response = req_builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();

        if (300..400).contains(&status) {
            let location = response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            return Err(ProtocolError::UnexpectedRedirect { location }.into());
        }

        let mut response_headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                response_headers.insert(key.as_str().to_ascii_lowercase(), v.to_string());
            }
        }

        if let Some(len) = response.content_length() {
            if len > self.config.max_response_size as u64 {
                return Err(ProtocolError::ResponseTooLarge { size: len }.into());
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        if bytes.len() > self.config.max_response_size {
            return Err(ProtocolError::ResponseTooLarge {
                size: bytes.len() as u64,
            }
            .into());
        }

        if (200..300).contains(&status) {
            debug!(status, bytes = bytes.len(), url = %url, "Received response");
        } else {
            warn!(status, url = %url, "Request returned error status");
        }

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body: bytes,
        })
    }
}

fn map_reqwest_error(error: reqwest::Error, timeout: Duration) -> FluentHttpError {
    if error.is_timeout() {
        NetworkError::Timeout { timeout }.into()
    } else {
        NetworkError::ConnectionFailed {
            message: error.to_string(),
        }
        .into()
    }
}

/// Request as seen by [`MockHttpTransport`], body read into memory.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Headers,
    pub body: Bytes,
}

impl RecordedRequest {
    /// Body decoded as form-urlencoded pairs.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(&self.body)
            .into_owned()
            .collect()
    }
}

/// Mock HTTP transport for testing. Queued responses are returned in order.
#[derive(Default)]
pub struct MockHttpTransport {
    responses: std::sync::Mutex<VecDeque<HttpResponse>>,
    request_history: std::sync::Mutex<Vec<RecordedRequest>>,
    default_response: std::sync::Mutex<Option<HttpResponse>>,
    next_error: std::sync::Mutex<Option<NetworkError>>,
}

impl MockHttpTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: HttpResponse) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Queue a JSON response.
    pub fn queue_json_response<T: serde::Serialize>(&self, status: u16, body: &T) -> &Self {
        let mut response = HttpResponse::new(status, serde_json::to_vec(body).unwrap());
        response
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        self.queue_response(response)
    }

    /// Set default response when queue is empty.
    pub fn set_default_response(&self, response: HttpResponse) -> &Self {
        *self.default_response.lock().unwrap() = Some(response);
        self
    }

    /// Fail the next send with `error`.
    pub fn set_next_error(&self, error: NetworkError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.request_history.lock().unwrap().clone()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<RecordedRequest> {
        self.request_history.lock().unwrap().last().cloned()
    }

    /// Clear request history.
    pub fn clear_history(&self) {
        self.request_history.lock().unwrap().clear();
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: RequestDescriptor) -> FluentResult<HttpResponse> {
        let body = request
            .body
            .to_bytes()
            .await
            .map_err(NetworkError::BodyUnavailable)?;

        self.request_history.lock().unwrap().push(RecordedRequest {
            method: request.method,
            url: request.url,
            headers: request.headers,
            body,
        });

        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error.into());
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.default_response.lock().unwrap().clone());

        response.ok_or_else(|| {
            NetworkError::ConnectionFailed {
                message: "No mock response available".to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestBuilder;

    #[tokio::test]
    async fn test_mock_transport_replays_in_order() {
        let transport = MockHttpTransport::new();
        transport
            .queue_json_response(200, &serde_json::json!({"n": 1}))
            .queue_json_response(201, &serde_json::json!({"n": 2}));

        let request = RequestBuilder::get("https://example.com/a").unwrap().build();
        let first = transport.send(request.clone()).await.unwrap();
        let second = transport.send(request).await.unwrap();

        assert_eq!(first.status, 200);
        assert_eq!(second.status, 201);
        assert_eq!(first.header("Content-Type"), Some("application/json"));

        let history = transport.get_requests();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].url.as_str(), "https://example.com/a");
    }

    #[tokio::test]
    async fn test_mock_transport_without_response_fails() {
        let transport = MockHttpTransport::new();
        let request = RequestBuilder::get("https://example.com").unwrap().build();
        let result = transport.send(request).await;
        assert!(matches!(
            result,
            Err(FluentHttpError::Network(NetworkError::ConnectionFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_maps_error_status() {
        let transport = MockHttpTransport::new();
        transport.queue_json_response(
            401,
            &serde_json::json!({"error": "invalid_client"}),
        );

        let request = RequestBuilder::post("https://example.com/token").unwrap().build();
        let error = dispatch(&transport, request).await.unwrap_err();

        match error {
            FluentHttpError::Response(e) => {
                assert_eq!(e.status, 401);
                assert_eq!(e.oauth_error().unwrap().error, "invalid_client");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_records_streamed_body() {
        let transport = MockHttpTransport::new();
        transport.set_default_response(HttpResponse::new(204, Bytes::new()));

        let parts = vec![crate::multipart::FormPart::text("k", "v")];
        let request = RequestBuilder::post("https://example.com/upload")
            .unwrap()
            .multipart(&parts, Some("b".into()))
            .unwrap()
            .build();

        transport.send(request).await.unwrap();
        let recorded = transport.get_last_request().unwrap();
        assert!(recorded.body.starts_with(b"--b\r\n"));
        assert!(recorded.body.ends_with(b"--b--\r\n"));
    }

    #[test]
    fn test_response_json() {
        let response = HttpResponse::new(200, r#"{"a":1}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["a"], 1);

        let bad = HttpResponse::new(200, "not json");
        assert!(matches!(
            bad.json::<serde_json::Value>(),
            Err(FluentHttpError::Protocol(ProtocolError::InvalidJson { .. }))
        ));
    }

    #[test]
    fn test_transport_config_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.follow_redirects);
    }
}
