//! Configuration Builder
//!
//! Fluent builder for OAuth2 configuration.

use secrecy::SecretString;
use std::time::Duration;
use url::Url;

use crate::error::{ConfigurationError, FluentResult};
use crate::types::{OAuth2Config, DEFAULT_SCOPE, DEFAULT_TIMEOUT};

/// OAuth2 configuration builder.
#[derive(Default)]
pub struct OAuth2ConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
    scopes: Vec<String>,
    timeout: Option<Duration>,
}

impl OAuth2ConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set authorization endpoint.
    pub fn authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorization_endpoint = Some(endpoint.into());
        self
    }

    /// Set token endpoint.
    pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(endpoint.into());
        self
    }

    /// Replace the requested scopes with a space-separated list.
    pub fn scope(mut self, scope: impl AsRef<str>) -> Self {
        self.scopes = scope.as_ref().split_whitespace().map(String::from).collect();
        self
    }

    /// Add a scope.
    pub fn add_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Set token endpoint timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the OAuth2 configuration.
    pub fn build(self) -> FluentResult<OAuth2Config> {
        let client_id = self
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| missing("client_id"))?;

        let authorization_endpoint = parse_endpoint(
            self.authorization_endpoint
                .ok_or_else(|| missing("authorization_endpoint"))?,
        )?;

        let token_endpoint =
            parse_endpoint(self.token_endpoint.ok_or_else(|| missing("token_endpoint"))?)?;

        let scope = if self.scopes.is_empty() {
            DEFAULT_SCOPE.to_string()
        } else {
            self.scopes.join(" ")
        };

        Ok(OAuth2Config {
            client_id,
            client_secret: self.client_secret,
            authorization_endpoint,
            token_endpoint,
            scope,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

fn missing(field: &str) -> ConfigurationError {
    ConfigurationError::MissingField {
        field: field.to_string(),
    }
}

fn parse_endpoint(endpoint: String) -> Result<Url, ConfigurationError> {
    let url = Url::parse(&endpoint).map_err(|e| ConfigurationError::InvalidUrl {
        url: endpoint.clone(),
        message: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigurationError::InvalidEndpoint { url: endpoint }),
    }
}

/// Create a new OAuth2 configuration builder.
pub fn oauth2_config() -> OAuth2ConfigBuilder {
    OAuth2ConfigBuilder::new()
}
