//! Configuration Types
//!
//! OAuth2 client configuration.

use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Scope requested when the configuration names none.
pub const DEFAULT_SCOPE: &str = "openid profile email";

/// Default token endpoint timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth2 client configuration.
#[derive(Clone)]
pub struct OAuth2Config {
    /// Client identifier.
    pub client_id: String,
    /// Client secret (for confidential clients).
    pub client_secret: Option<SecretString>,
    /// Authorization endpoint URL.
    pub authorization_endpoint: Url,
    /// Token endpoint URL.
    pub token_endpoint: Url,
    /// Space-separated scopes to request.
    pub scope: String,
    /// Token endpoint timeout.
    pub timeout: Duration,
}

impl OAuth2Config {
    /// Configuration with the default scope and timeout.
    pub fn new(client_id: impl Into<String>, authorization_endpoint: Url, token_endpoint: Url) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            authorization_endpoint,
            token_endpoint,
            scope: DEFAULT_SCOPE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("authorization_endpoint", &self.authorization_endpoint.as_str())
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("scope", &self.scope)
            .field("timeout", &self.timeout)
            .finish()
    }
}
