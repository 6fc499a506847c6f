//! Fluent HTTP Integration Module
//!
//! Fluent request building with streaming multipart/form-data uploads, and
//! client-side OAuth2 authentication with persisted tokens.
//!
//! # Features
//!
//! - multipart/form-data encoding (RFC 7578 / RFC 2046) into memory, a file,
//!   or a lazy reader
//! - Request bodies streamed from temporary files that are removed after
//!   dispatch
//! - Authorization Code Flow (RFC 6749 Section 4.1)
//! - Authorization Code with PKCE (RFC 7636)
//! - Client Credentials, Resource Owner Password and Implicit grants
//! - Token Refresh (RFC 6749 Section 6)
//! - Token persistence to a single `token.json` file
//!
//! # Example
//!
//! ```rust,ignore
//! use integrations_fluent_http::{oauth2_config, FormPart, OAuth2Client, RequestBuilder, TokenStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = oauth2_config()
//!         .client_id("my-client-id")
//!         .authorization_endpoint("https://provider.com/authorize")
//!         .token_endpoint("https://provider.com/token")
//!         .build()?;
//!
//!     let client = OAuth2Client::new(config, TokenStore::in_data_dir("my-app")?)?;
//!     client.restore().await?;
//!
//!     let redirect = url::Url::parse("myapp://callback")?;
//!     let auth = client.create_authorization_url_with_pkce(&redirect, &[]).await?;
//!     println!("Open: {}", auth.url);
//!
//!     // ... user signs in, the app receives `callback` ...
//!     # let callback = redirect.clone();
//!     let grant = client
//!         .create_authorization_code_with_pkce_grant(&callback, &redirect)
//!         .await?;
//!     client.authenticate(&grant).await?;
//!
//!     let upload = RequestBuilder::post("https://api.provider.com/photos")?
//!         .multipart(
//!             &[
//!                 FormPart::text("caption", "Sunset"),
//!                 FormPart::image("photo", "sunset.jpg", "image/jpeg", std::path::PathBuf::from("sunset.jpg")),
//!             ],
//!             None,
//!         )?;
//!     let request = client.authorize(upload).await?.build();
//!     integrations_fluent_http::dispatch(client.transport(), request).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `multipart`: parts, boundaries, byte sinks/sources and the encoder
//! - `request`: headers, bodies and the fluent request builder
//! - `core`: HTTP transport and PKCE
//! - `types`: grants, tokens, configuration and callback parameters
//! - `token`: the token store
//! - `builders`: fluent configuration builder
//! - `client`: OAuth2 client tying it together
//! - `error`: error hierarchy

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod multipart;
pub mod request;
pub mod token;
pub mod types;

// Re-export main client
pub use client::OAuth2Client;

// Re-export builders
pub use builders::{oauth2_config, OAuth2ConfigBuilder};

// Re-export errors
pub use error::{
    get_user_message, AuthorizationError, ConfigurationError, FluentHttpError, FluentResult,
    MultipartError, NetworkError, OAuth2ErrorResponse, ProtocolError, ResponseError,
    StorageError, TokenError,
};

// Re-export multipart
pub use multipart::{
    Boundary, ByteSink, ChainedSource, EncoderConfig, FileSink, FileSource, FormPart,
    MemorySink, MultipartEncoder, PartSource, DEFAULT_CHUNK_SIZE,
};

// Re-export requests
pub use request::{
    HeaderName, Headers, HttpMethod, RequestBody, RequestBuilder, RequestDescriptor,
    StreamedFile, TempBody,
};

// Re-export types
pub use types::{
    AuthorizationUrl, CallbackParams, OAuth2Config, OAuth2Grant, OAuth2Token, ResponseType,
    TokenResponse, DEFAULT_SCOPE,
};

// Re-export core components
pub use self::core::{
    dispatch, generate_code_challenge, generate_code_verifier, is_valid_verifier,
    DefaultPkceGenerator, HttpResponse, HttpTransport, MockHttpTransport, MockPkceGenerator,
    PkceGenerator, PkcePair, RecordedRequest, ReqwestHttpTransport, TransportConfig,
};

// Re-export token management
pub use token::{PersistHandle, TokenStore, TOKEN_FILE_NAME};
