//! Error Types
//!
//! Error hierarchy for request construction, multipart encoding, transport,
//! and the OAuth2 token lifecycle.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Root error type.
#[derive(Error, Debug)]
pub enum FluentHttpError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("{0}")]
    Response(#[from] ResponseError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl FluentHttpError {
    /// Stable error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "HTTP_CONFIG",
            Self::Multipart(_) => "HTTP_MULTIPART",
            Self::Network(_) => "HTTP_NETWORK",
            Self::Response(_) => "HTTP_RESPONSE",
            Self::Protocol(_) => "HTTP_PROTOCOL",
            Self::Authorization(_) => "OAUTH2_AUTH",
            Self::Token(_) => "OAUTH2_TOKEN",
            Self::Storage(_) => "OAUTH2_STORAGE",
        }
    }

    /// Check if error requires the user to sign in again.
    pub fn needs_reauth(&self) -> bool {
        match self {
            Self::Token(TokenError::NoToken) => true,
            Self::Token(TokenError::NoRefreshToken) => true,
            Self::Token(TokenError::RefreshTokenExpired) => true,
            Self::Authorization(AuthorizationError::AccessDenied { .. }) => true,
            Self::Response(e) => e
                .oauth_error()
                .map(|r| r.error == "invalid_grant")
                .unwrap_or(false),
            _ => false,
        }
    }

    /// HTTP status of an error-status response, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("No data directory available for token storage")]
    NoDataDirectory,

    #[error("HTTP client could not be created: {message}")]
    ClientBuild { message: String },
}

/// Multipart body construction error.
#[derive(Error, Debug)]
pub enum MultipartError {
    #[error("Destination already exists: {}", .path.display())]
    DestinationExists { path: PathBuf },

    #[error("Could not open {} for writing: {source}", .path.display())]
    SinkCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read part payload: {0}")]
    SourceReadError(#[source] io::Error),

    #[error("Failed to write multipart body: {0}")]
    SinkWriteError(#[source] io::Error),

    #[error("Part {name} could not be encoded: {message}")]
    StringEncodingFailed { name: String, message: String },

    #[error("Encoded {written} bytes but {} holds {on_disk}", .path.display())]
    SizeMismatch {
        path: PathBuf,
        written: u64,
        on_disk: u64,
    },

    #[error("Encoding task failed: {message}")]
    TaskFailed { message: String },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Request body unavailable: {0}")]
    BodyUnavailable(#[source] io::Error),
}

/// Non-2xx response. The body is kept so callers can inspect server detail.
#[derive(Error, Debug, Clone)]
#[error("HTTP {status}: {}", summarize(.body))]
pub struct ResponseError {
    pub status: u16,
    pub body: bytes::Bytes,
}

impl ResponseError {
    /// Body as text, lossily decoded.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// RFC 6749 error object carried in the body, if any.
    pub fn oauth_error(&self) -> Option<OAuth2ErrorResponse> {
        serde_json::from_slice(&self.body).ok()
    }
}

fn summarize(body: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(body);
    if text.len() > MAX {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.into_owned()
    }
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Authorization code missing from callback URL")]
    MissingAuthorizationCode,

    #[error("No pending PKCE code verifier")]
    MissingCodeVerifier,

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: u64 },
}

/// Authorization flow error.
#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Access denied: {error}")]
    AccessDenied {
        error: String,
        error_description: Option<String>,
    },
}

/// Token lifecycle error.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("No token available")]
    NoToken,

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Refresh token expired")]
    RefreshTokenExpired,
}

/// Storage error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("Write failed: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("Delete failed: {0}")]
    DeleteFailed(#[source] io::Error),

    #[error("Stored token could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Token could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Persistence task failed: {message}")]
    TaskFailed { message: String },
}

/// Result type for this crate.
pub type FluentResult<T> = Result<T, FluentHttpError>;

/// OAuth2 error response from provider.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Get user-friendly error message.
pub fn get_user_message(error: &FluentHttpError) -> String {
    match error {
        FluentHttpError::Token(TokenError::NoToken)
        | FluentHttpError::Token(TokenError::NoRefreshToken)
        | FluentHttpError::Token(TokenError::RefreshTokenExpired) => {
            "Your session has expired. Please sign in again.".to_string()
        }
        FluentHttpError::Authorization(AuthorizationError::AccessDenied { .. }) => {
            "Access was denied. Please try signing in again and grant the requested permissions."
                .to_string()
        }
        FluentHttpError::Network(NetworkError::Timeout { .. }) => {
            "The request timed out. Please check your connection and try again.".to_string()
        }
        FluentHttpError::Network(_) => {
            "Could not reach the server. Please check your connection.".to_string()
        }
        FluentHttpError::Response(e) if e.status >= 500 => {
            "The service is temporarily unavailable. Please try again later.".to_string()
        }
        _ => "The request could not be completed. Please try again.".to_string(),
    }
}
