//! Authorization Types
//!
//! Authorization-endpoint URLs and the per-request values that go with them.

use rand::distributions::Alphanumeric;
use rand::Rng;
use url::Url;

const STATE_LENGTH: usize = 32;

/// Response type requested from the authorization endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseType {
    /// Authorization code flow.
    Code,
    /// Implicit flow, tokens returned in the fragment.
    IdTokenToken,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::IdTokenToken => "id_token token",
        }
    }
}

/// Result of authorization URL generation.
#[derive(Clone, Debug)]
pub struct AuthorizationUrl {
    /// The authorization URL to send the user to.
    pub url: Url,
    /// State parameter for CSRF validation.
    pub state: String,
    /// Nonce (implicit flow only).
    pub nonce: Option<String>,
}

impl AuthorizationUrl {
    /// Check a callback's `state` against the one sent.
    pub fn state_matches(&self, state: Option<&str>) -> bool {
        state == Some(self.state.as_str())
    }
}

/// Random URL-safe token for `state` and `nonce` values.
pub fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}
