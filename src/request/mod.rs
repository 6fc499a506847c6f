//! Requests
//!
//! Outgoing request descriptors and the fluent builder that assembles them.

pub mod body;
pub mod builder;
pub mod headers;

pub use body::{RequestBody, StreamedFile, TempBody};
pub use builder::RequestBuilder;
pub use headers::{HeaderName, Headers};

use std::time::Duration;
use url::Url;

/// HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// A fully assembled request, ready for a transport.
///
/// Consumed by dispatch; a streamed temporary body is released when the
/// descriptor (and every clone of it) is dropped.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Headers,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
}
