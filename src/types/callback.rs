//! Callback Types
//!
//! Parameters delivered to the redirect URI, either in the query (code
//! flow) or in the fragment (implicit flow).

use std::collections::HashMap;
use url::Url;

use super::token::TokenResponse;
use crate::error::{AuthorizationError, FluentHttpError, FluentResult, ProtocolError};

/// Callback parameters from authorization redirect.
#[derive(Clone, Debug, Default)]
pub struct CallbackParams {
    /// Authorization code (if success).
    pub code: Option<String>,
    /// State parameter.
    pub state: Option<String>,
    /// Error code (if authorization failed).
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
    /// Error URI.
    pub error_uri: Option<String>,
    /// Every other parameter.
    pub extra: HashMap<String, String>,
}

impl CallbackParams {
    /// Parse callback parameters from the URL query.
    pub fn from_url(url: &Url) -> Self {
        Self::from_pairs(url.query_pairs())
    }

    /// Parse callback parameters from the URL fragment.
    pub fn from_fragment(url: &Url) -> Self {
        let fragment = url.fragment().unwrap_or("");
        Self::from_pairs(url::form_urlencoded::parse(fragment.as_bytes()))
    }

    /// Parse callback parameters from URL string.
    pub fn from_url_str(url_str: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(url_str)?;
        Ok(Self::from_url(&url))
    }

    fn from_pairs<'a>(
        pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    ) -> Self {
        let mut params = Self::default();

        for (key, value) in pairs {
            let value = value.into_owned();
            match key.as_ref() {
                "code" => params.code = Some(value),
                "state" => params.state = Some(value),
                "error" => params.error = Some(value),
                "error_description" => params.error_description = Some(value),
                "error_uri" => params.error_uri = Some(value),
                other => {
                    params.extra.insert(other.to_string(), value);
                }
            }
        }

        params
    }

    /// Check if callback contains an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Check if callback is successful.
    pub fn is_success(&self) -> bool {
        self.code.is_some() && self.error.is_none()
    }

    /// Fail with [`AuthorizationError::AccessDenied`] if the server
    /// reported an error.
    pub fn check_error(&self) -> FluentResult<()> {
        match &self.error {
            Some(error) => Err(AuthorizationError::AccessDenied {
                error: error.clone(),
                error_description: self.error_description.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Authorization code, or the server's error.
    pub fn authorization_code(&self) -> FluentResult<&str> {
        self.check_error()?;
        self.code
            .as_deref()
            .ok_or_else(|| ProtocolError::MissingAuthorizationCode.into())
    }

    /// Token response carried by an implicit-flow fragment.
    pub fn token_response(&self) -> FluentResult<TokenResponse> {
        self.check_error()?;

        let access_token = self
            .extra
            .get("access_token")
            .cloned()
            .ok_or_else(|| ProtocolError::MissingField {
                field: "access_token".to_string(),
            })?;

        let number = |field: &str| -> FluentResult<Option<i64>> {
            self.extra
                .get(field)
                .map(|v| {
                    v.parse::<i64>().map_err(|_| {
                        FluentHttpError::from(ProtocolError::InvalidResponse {
                            message: format!("{} is not a number: {}", field, v),
                        })
                    })
                })
                .transpose()
        };

        Ok(TokenResponse {
            access_token,
            token_type: self
                .extra
                .get("token_type")
                .cloned()
                .unwrap_or_else(|| "Bearer".to_string()),
            expires_in: number("expires_in")?,
            refresh_token: self.extra.get("refresh_token").cloned(),
            refresh_expires_in: number("refresh_expires_in")?,
            session_state: self.extra.get("session_state").cloned(),
            scope: self.extra.get("scope").cloned(),
            extra: HashMap::new(),
        })
    }
}
