//! Request Builder
//!
//! Fluent builder for outgoing requests. Each call consumes the builder and
//! returns the updated one; clone it to branch.

use bytes::Bytes;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::body::{RequestBody, StreamedFile, TempBody};
use super::headers::{HeaderName, Headers};
use super::{HttpMethod, RequestDescriptor};
use crate::error::{ConfigurationError, FluentResult, MultipartError, ProtocolError};
use crate::multipart::{Boundary, FormPart, MultipartEncoder};

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const APPLICATION_JSON: &str = "application/json";

/// Fluent request builder.
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    method: HttpMethod,
    url: Url,
    headers: Headers,
    body: RequestBody,
    timeout: Option<Duration>,
    encoder: MultipartEncoder,
    temp_dir: Option<PathBuf>,
}

impl RequestBuilder {
    /// Create a builder for `method` on `url`.
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: RequestBody::Empty,
            timeout: None,
            encoder: MultipartEncoder::default(),
            temp_dir: None,
        }
    }

    /// Parse `url` and create a builder.
    pub fn parse(method: HttpMethod, url: &str) -> FluentResult<Self> {
        let parsed = Url::parse(url).map_err(|e| ConfigurationError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(method, parsed))
    }

    pub fn get(url: &str) -> FluentResult<Self> {
        Self::parse(HttpMethod::Get, url)
    }

    pub fn post(url: &str) -> FluentResult<Self> {
        Self::parse(HttpMethod::Post, url)
    }

    pub fn put(url: &str) -> FluentResult<Self> {
        Self::parse(HttpMethod::Put, url)
    }

    pub fn delete(url: &str) -> FluentResult<Self> {
        Self::parse(HttpMethod::Delete, url)
    }

    /// Append a query pair.
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }

    /// Set a header, replacing any earlier value.
    pub fn header(mut self, name: impl Into<HeaderName>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set `Authorization: Bearer {token}`.
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header(HeaderName::Authorization, format!("Bearer {}", token))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use `encoder` for multipart bodies.
    pub fn encoder(mut self, encoder: MultipartEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Directory for temporary multipart bodies. Defaults to the system
    /// temp directory.
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Raw body with the given content type.
    pub fn body(self, bytes: impl Into<Bytes>, content_type: &str) -> Self {
        let bytes = bytes.into();
        self.with_body(RequestBody::Bytes(bytes), content_type)
    }

    /// JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> FluentResult<Self> {
        let bytes = serde_json::to_vec(value).map_err(|e| ProtocolError::InvalidJson {
            message: e.to_string(),
        })?;
        Ok(self
            .with_body(RequestBody::Bytes(Bytes::from(bytes)), APPLICATION_JSON)
            .header(HeaderName::Accept, APPLICATION_JSON))
    }

    /// form-urlencoded body.
    pub fn form<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.with_body(RequestBody::Bytes(Bytes::from(encoded)), FORM_URLENCODED)
    }

    /// Encode `parts` into a temporary file and stream it as the body.
    ///
    /// The temporary file is removed once the built request has been
    /// dispatched and dropped, whatever the outcome. Encoding runs on the
    /// calling thread; see [`RequestBuilder::multipart_async`].
    pub fn multipart(self, parts: &[FormPart], boundary: Option<Boundary>) -> FluentResult<Self> {
        let boundary = boundary.unwrap_or_else(Boundary::generate);
        let temp = self.fresh_temp_body()?;
        // a failed encode drops `temp`, which removes the partial file
        let len = self.encoder.encode_to_file(temp.path(), parts, &boundary)?;
        Ok(self.with_multipart_file(temp, len, &boundary))
    }

    /// Like [`RequestBuilder::multipart`], encoding on the blocking pool.
    pub async fn multipart_async(
        self,
        parts: Vec<FormPart>,
        boundary: Option<Boundary>,
    ) -> FluentResult<Self> {
        let boundary = boundary.unwrap_or_else(Boundary::generate);
        let encoder = self.encoder.clone();
        let task_boundary = boundary.clone();
        let temp = self.fresh_temp_body()?;

        let (temp, len) = tokio::task::spawn_blocking(move || {
            encoder
                .encode_to_file(temp.path(), &parts, &task_boundary)
                .map(|len| (temp, len))
        })
        .await
        .map_err(|e| MultipartError::TaskFailed {
            message: e.to_string(),
        })??;

        Ok(self.with_multipart_file(temp, len, &boundary))
    }

    /// Encode `parts` in memory. Meant for small bodies.
    pub fn multipart_in_memory(
        self,
        parts: &[FormPart],
        boundary: Option<Boundary>,
    ) -> FluentResult<Self> {
        let boundary = boundary.unwrap_or_else(Boundary::generate);
        let bytes = self.encoder.encode_to_buffer(parts, &boundary)?;
        Ok(self.with_body(RequestBody::Bytes(Bytes::from(bytes)), &boundary.content_type()))
    }

    /// Finish building.
    pub fn build(self) -> RequestDescriptor {
        RequestDescriptor {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
        }
    }

    fn fresh_temp_body(&self) -> Result<TempBody, MultipartError> {
        let parent = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        TempBody::new_in(&parent).map_err(|e| MultipartError::SinkCreationFailed {
            path: parent,
            source: e,
        })
    }

    fn with_multipart_file(self, temp: TempBody, len: u64, boundary: &Boundary) -> Self {
        debug!(
            path = %temp.path().display(),
            bytes = len,
            "Attached multipart body"
        );
        self.with_body(
            RequestBody::File(StreamedFile::new(temp, len)),
            &boundary.content_type(),
        )
    }

    fn with_body(mut self, body: RequestBody, content_type: &str) -> Self {
        self.headers.insert(HeaderName::ContentType, content_type);
        match body.len() {
            Some(len) => self.headers.insert(HeaderName::ContentLength, len.to_string()),
            None => {
                self.headers.remove(HeaderName::ContentLength);
            }
        }
        self.body = body;
        self
    }
}
