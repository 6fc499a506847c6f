//! OAuth2 Client
//!
//! Builds authorization URLs, turns callbacks into grants, exchanges grants
//! at the token endpoint and keeps the result in a [`TokenStore`].

use chrono::Utc;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::{
    dispatch, DefaultPkceGenerator, HttpTransport, PkceGenerator, ReqwestHttpTransport,
    TransportConfig, CODE_CHALLENGE_METHOD,
};
use crate::error::{ConfigurationError, FluentResult, ProtocolError, TokenError};
use crate::request::builder::APPLICATION_JSON;
use crate::request::{HeaderName, HttpMethod, RequestBuilder};
use crate::token::TokenStore;
use crate::types::{
    random_token, AuthorizationUrl, CallbackParams, OAuth2Config, OAuth2Grant, OAuth2Token,
    ResponseType, TokenResponse,
};

/// OAuth2 client for managing OAuth2 flows and token lifecycle.
pub struct OAuth2Client<T: HttpTransport = ReqwestHttpTransport, P: PkceGenerator = DefaultPkceGenerator>
{
    config: OAuth2Config,
    transport: Arc<T>,
    pkce_generator: Arc<P>,
    store: TokenStore,
}

impl OAuth2Client<ReqwestHttpTransport, DefaultPkceGenerator> {
    /// Create a new OAuth2 client with default implementations.
    pub fn new(config: OAuth2Config, store: TokenStore) -> FluentResult<Self> {
        let transport = ReqwestHttpTransport::with_config(TransportConfig {
            timeout: config.timeout,
            ..TransportConfig::default()
        })?;
        Ok(Self::with_components(
            config,
            transport,
            DefaultPkceGenerator::new(),
            store,
        ))
    }
}

impl<T: HttpTransport, P: PkceGenerator> OAuth2Client<T, P> {
    /// Create a client with custom implementations.
    pub fn with_components(
        config: OAuth2Config,
        transport: T,
        pkce_generator: P,
        store: TokenStore,
    ) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            pkce_generator: Arc::new(pkce_generator),
            store,
        }
    }

    /// Get the OAuth2 configuration.
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ========== Authorization URLs ==========

    /// Authorization-code URL.
    ///
    /// `extra` parameters are appended; an extra `scope` or `state` replaces
    /// the default value.
    pub fn create_authorization_url(
        &self,
        redirect_uri: &Url,
        extra: &[(&str, &str)],
    ) -> FluentResult<AuthorizationUrl> {
        self.authorization_url(ResponseType::Code, redirect_uri, &[], extra, None)
    }

    /// Authorization-code URL with a PKCE challenge.
    ///
    /// The verifier is stored before this returns, replacing any earlier
    /// pending verifier.
    pub async fn create_authorization_url_with_pkce(
        &self,
        redirect_uri: &Url,
        extra: &[(&str, &str)],
    ) -> FluentResult<AuthorizationUrl> {
        let pair = self.pkce_generator.generate();
        let url = self.authorization_url(
            ResponseType::Code,
            redirect_uri,
            &[
                ("code_challenge", pair.code_challenge.as_str()),
                ("code_challenge_method", CODE_CHALLENGE_METHOD),
            ],
            extra,
            None,
        )?;

        self.store.store_code_verifier(pair.code_verifier).await;
        debug!("Stored pending PKCE verifier");
        Ok(url)
    }

    /// Implicit-flow URL. Tokens come back in the redirect fragment.
    pub fn create_implicit_authorization_url(
        &self,
        redirect_uri: &Url,
        extra: &[(&str, &str)],
    ) -> FluentResult<AuthorizationUrl> {
        let nonce = random_token();
        self.authorization_url(
            ResponseType::IdTokenToken,
            redirect_uri,
            &[("response_mode", "fragment")],
            extra,
            Some(nonce),
        )
    }

    fn authorization_url(
        &self,
        response_type: ResponseType,
        redirect_uri: &Url,
        flow_params: &[(&str, &str)],
        extra: &[(&str, &str)],
        nonce: Option<String>,
    ) -> FluentResult<AuthorizationUrl> {
        let mut url = self.config.authorization_endpoint.clone();
        if url.cannot_be_a_base() {
            return Err(ConfigurationError::InvalidEndpoint {
                url: url.to_string(),
            }
            .into());
        }

        let lookup = |key: &str| extra.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
        let scope = lookup("scope").unwrap_or(&self.config.scope).to_string();
        let state = lookup("state").map(String::from).unwrap_or_else(random_token);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("response_type", response_type.as_str())
                .append_pair("scope", &scope)
                .append_pair("state", &state);
            if let Some(nonce) = &nonce {
                query.append_pair("nonce", nonce);
            }
            for (key, value) in flow_params {
                query.append_pair(key, value);
            }
            query.append_pair("redirect_uri", redirect_uri.as_str());
            for (key, value) in extra.iter().filter(|(k, _)| *k != "scope" && *k != "state") {
                query.append_pair(key, value);
            }
        }

        debug!(
            response_type = response_type.as_str(),
            endpoint = %self.config.authorization_endpoint,
            "Built authorization URL"
        );

        Ok(AuthorizationUrl { url, state, nonce })
    }

    // ========== Grants ==========

    /// Authorization-code grant from the redirect the user arrived on.
    pub fn create_authorization_code_grant(
        &self,
        callback: &Url,
        redirect_uri: &Url,
    ) -> FluentResult<OAuth2Grant> {
        let params = CallbackParams::from_url(callback);
        let code = params.authorization_code()?;

        Ok(OAuth2Grant::AuthorizationCode {
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            code: code.to_string(),
            redirect_uri: redirect_uri.clone(),
        })
    }

    /// Authorization-code grant carrying the pending PKCE verifier.
    ///
    /// The verifier is consumed only when the callback carries a code.
    pub async fn create_authorization_code_with_pkce_grant(
        &self,
        callback: &Url,
        redirect_uri: &Url,
    ) -> FluentResult<OAuth2Grant> {
        let params = CallbackParams::from_url(callback);
        let code = params.authorization_code()?.to_string();

        let code_verifier = self
            .store
            .take_code_verifier()
            .await
            .ok_or(ProtocolError::MissingCodeVerifier)?;

        Ok(OAuth2Grant::AuthorizationCodePkce {
            client_id: self.config.client_id.clone(),
            code,
            code_verifier,
            redirect_uri: redirect_uri.clone(),
        })
    }

    /// Client-credentials grant. Needs a configured client secret.
    pub fn create_client_credentials_grant(&self, scope: Option<&str>) -> FluentResult<OAuth2Grant> {
        let client_secret =
            self.config
                .client_secret
                .clone()
                .ok_or_else(|| ConfigurationError::MissingField {
                    field: "client_secret".to_string(),
                })?;

        Ok(OAuth2Grant::ClientCredentials {
            client_id: self.config.client_id.clone(),
            client_secret,
            scope: scope.map(String::from),
        })
    }

    /// Resource-owner password grant.
    pub fn create_password_grant(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
        scope: Option<&str>,
    ) -> OAuth2Grant {
        OAuth2Grant::ResourceOwnerPassword {
            username: username.into(),
            password: SecretString::new(password.into()),
            scope: scope.map(String::from),
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
        }
    }

    // ========== Token exchange ==========

    /// Exchange `grant` at the token endpoint and store the token.
    ///
    /// Returns once the token is in memory and written to the token file.
    pub async fn authenticate(&self, grant: &OAuth2Grant) -> FluentResult<OAuth2Token> {
        let token = self.request_token(grant).await?;
        self.store.store(token.clone()).await.wait().await?;
        Ok(token)
    }

    /// Exchange the current refresh token for a new token.
    pub async fn refresh(&self) -> FluentResult<OAuth2Token> {
        let current = self.store.current_token().await.ok_or(TokenError::NoToken)?;
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or(TokenError::NoRefreshToken)?;
        if current.is_refresh_token_expired() {
            return Err(TokenError::RefreshTokenExpired.into());
        }

        let grant = OAuth2Grant::RefreshToken {
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            refresh_token,
        };

        let mut token = self.request_token(&grant).await?;
        if token.refresh_token.is_none() {
            // Server kept the refresh token; its lifetime still runs from
            // the original issue time.
            token.refresh_token = current.refresh_token;
            token.refresh_expires_in = current.refresh_expires_in.map(|secs| {
                secs.saturating_sub((token.created_at - current.created_at).num_seconds())
            });
        }

        self.store.store(token.clone()).await.wait().await?;
        Ok(token)
    }

    /// Current token if still valid, otherwise a refreshed one.
    pub async fn valid_access_token(&self) -> FluentResult<OAuth2Token> {
        match self.store.current_token().await {
            Some(token) if !token.is_access_token_expired() => Ok(token),
            Some(_) => {
                debug!("Access token expired, refreshing");
                self.refresh().await
            }
            None => Err(TokenError::NoToken.into()),
        }
    }

    /// Add the `Authorization` header for a valid token to `builder`.
    pub async fn authorize(&self, builder: RequestBuilder) -> FluentResult<RequestBuilder> {
        let token = self.valid_access_token().await?;
        Ok(builder.header(HeaderName::Authorization, token.authorization_header()))
    }

    /// Store the token delivered in an implicit-flow redirect fragment.
    pub async fn token_from_implicit_callback(&self, callback: &Url) -> FluentResult<OAuth2Token> {
        let response = CallbackParams::from_fragment(callback).token_response()?;
        let token = OAuth2Token::from_response(response, Utc::now());
        self.store.store(token.clone()).await.wait().await?;
        info!("Stored token from implicit callback");
        Ok(token)
    }

    /// Load the persisted token, if any, into memory.
    pub async fn restore(&self) -> FluentResult<Option<OAuth2Token>> {
        self.store.read_from_file().await
    }

    /// Forget the token and delete the token file.
    pub async fn sign_out(&self) -> FluentResult<()> {
        self.store.clear().await
    }

    async fn request_token(&self, grant: &OAuth2Grant) -> FluentResult<OAuth2Token> {
        info!(
            grant_type = grant.grant_type(),
            endpoint = %self.config.token_endpoint,
            "Requesting token"
        );

        let request = RequestBuilder::new(HttpMethod::Post, self.config.token_endpoint.clone())
            .form(grant.form_fields())
            .header(HeaderName::Accept, APPLICATION_JSON)
            .timeout(self.config.timeout)
            .build();

        let response = match dispatch(self.transport.as_ref(), request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(grant_type = grant.grant_type(), error = %e, "Token request failed");
                return Err(e);
            }
        };

        let decoded: TokenResponse = response.json()?;
        let token = OAuth2Token::from_response(decoded, Utc::now());

        info!(
            grant_type = grant.grant_type(),
            expires_in = ?token.expires_in,
            has_refresh_token = token.refresh_token.is_some(),
            "Token obtained"
        );

        Ok(token)
    }
}
