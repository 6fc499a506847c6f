//! PKCE Generator
//!
//! RFC 7636 Proof Key for Code Exchange. Verifiers are 32 bytes from the OS
//! CSPRNG, base64url-encoded without padding (43 characters).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Challenge method sent with the authorization request.
pub const CODE_CHALLENGE_METHOD: &str = "S256";

const VERIFIER_BYTES: usize = 32;

/// Verifier and its S256 challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

/// Generate a fresh code verifier.
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; VERIFIER_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `BASE64URL(SHA256(verifier))`.
pub fn generate_code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// PKCE generator interface (for dependency injection).
pub trait PkceGenerator: Send + Sync {
    /// Generate a verifier and its challenge.
    fn generate(&self) -> PkcePair;
}

/// Default PKCE generator implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPkceGenerator;

impl DefaultPkceGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl PkceGenerator for DefaultPkceGenerator {
    fn generate(&self) -> PkcePair {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);
        PkcePair {
            code_verifier,
            code_challenge,
        }
    }
}

/// Mock PKCE generator for testing.
#[derive(Default)]
pub struct MockPkceGenerator {
    next_verifier: std::sync::Mutex<Option<String>>,
    generate_history: std::sync::Mutex<Vec<PkcePair>>,
}

impl MockPkceGenerator {
    /// Create new mock PKCE generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the next verifier to generate.
    pub fn set_next_verifier(&self, verifier: impl Into<String>) -> &Self {
        *self.next_verifier.lock().unwrap() = Some(verifier.into());
        self
    }

    /// Get generate history.
    pub fn get_generate_history(&self) -> Vec<PkcePair> {
        self.generate_history.lock().unwrap().clone()
    }
}

impl PkceGenerator for MockPkceGenerator {
    fn generate(&self) -> PkcePair {
        let code_verifier = self
            .next_verifier
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(generate_code_verifier);

        let pair = PkcePair {
            code_challenge: generate_code_challenge(&code_verifier),
            code_verifier,
        };

        self.generate_history.lock().unwrap().push(pair.clone());
        pair
    }
}

/// Validate PKCE verifier format.
pub fn is_valid_verifier(verifier: &str) -> bool {
    // RFC 7636: 43-128 unreserved characters
    (43..=128).contains(&verifier.len())
        && verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
}
