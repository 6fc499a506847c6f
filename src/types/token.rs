//! Token Types
//!
//! Token endpoint responses and the token held by the store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token response from authorization server (snake_case on the wire).
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    #[serde(default)]
    pub session_state: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Access token plus its lifetime, as held in memory and persisted.
///
/// Persisted with camelCase field names. `created_at` is the moment the
/// token response was decoded; expiry is measured from it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl OAuth2Token {
    /// Create a bearer token with no expiry.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in: None,
            refresh_token: None,
            refresh_expires_in: None,
            token_type: default_token_type(),
            session_state: None,
            scope: None,
            created_at: Utc::now(),
        }
    }

    /// Build from a token endpoint response decoded at `created_at`.
    pub fn from_response(response: TokenResponse, created_at: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            expires_in: response.expires_in,
            refresh_token: response.refresh_token,
            refresh_expires_in: response.refresh_expires_in,
            token_type: response.token_type,
            session_state: response.session_state,
            scope: response.scope,
            created_at,
        }
    }

    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>, expires_in: Option<i64>) -> Self {
        self.refresh_token = Some(token.into());
        self.refresh_expires_in = expires_in;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Instant the access token expires, if it expires at all. A lifetime
    /// past the representable range counts as never expiring.
    pub fn access_token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in.and_then(|secs| self.offset_from_created(secs))
    }

    /// Instant the refresh token expires, if it expires at all.
    pub fn refresh_token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.refresh_expires_in
            .and_then(|secs| self.offset_from_created(secs))
    }

    fn offset_from_created(&self, secs: i64) -> Option<DateTime<Utc>> {
        Duration::try_seconds(secs).and_then(|d| self.created_at.checked_add_signed(d))
    }

    pub fn is_access_token_expired(&self) -> bool {
        self.is_access_token_expired_at(Utc::now())
    }

    /// `now > created_at + expires_in`. The boundary instant is not expired.
    pub fn is_access_token_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.access_token_expires_at()
            .map(|exp| now > exp)
            .unwrap_or(false)
    }

    pub fn is_refresh_token_expired(&self) -> bool {
        self.is_refresh_token_expired_at(Utc::now())
    }

    /// Like [`OAuth2Token::is_access_token_expired_at`]. A token without a
    /// refresh token reports it as expired.
    pub fn is_refresh_token_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.refresh_token.is_none() {
            return true;
        }
        self.refresh_token_expires_at()
            .map(|exp| now > exp)
            .unwrap_or(false)
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Granted scopes.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for OAuth2Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("refresh_expires_in", &self.refresh_expires_in)
            .field("scope", &self.scope)
            .field("created_at", &self.created_at)
            .finish()
    }
}
