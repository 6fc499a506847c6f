//! Multipart boundary token.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

const GENERATED_PREFIX: &str = "FluentHttpBoundary";
const GENERATED_RANDOM_LEN: usize = 24;

/// Delimiter shared by every part of one encoding operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Use a caller-supplied boundary as is.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a random boundary.
    pub fn generate() -> Self {
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_RANDOM_LEN)
            .map(char::from)
            .collect();
        Self(format!("{}{}", GENERATED_PREFIX, random))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Content-Type` header value for a body delimited by this boundary.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.0)
    }

    /// Closing delimiter line.
    pub(crate) fn closing(&self) -> String {
        format!("--{}--\r\n", self.0)
    }
}

impl Default for Boundary {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Boundary {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Boundary {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
