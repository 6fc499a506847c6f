//! Request Headers
//!
//! Header names are compared case-insensitively, as on the wire.

use std::fmt;

/// Header field name: well-known fields plus a custom variant.
#[derive(Clone, Debug)]
pub enum HeaderName {
    Accept,
    Authorization,
    ContentLength,
    ContentType,
    UserAgent,
    Custom(String),
}

impl HeaderName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Accept => "Accept",
            Self::Authorization => "Authorization",
            Self::ContentLength => "Content-Length",
            Self::ContentType => "Content-Type",
            Self::UserAgent => "User-Agent",
            Self::Custom(name) => name,
        }
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl Eq for HeaderName {}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for HeaderName {
    fn from(name: &str) -> Self {
        const KNOWN: [HeaderName; 5] = [
            HeaderName::Accept,
            HeaderName::Authorization,
            HeaderName::ContentLength,
            HeaderName::ContentType,
            HeaderName::UserAgent,
        ];
        KNOWN
            .into_iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_else(|| Self::Custom(name.to_string()))
    }
}

impl From<String> for HeaderName {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

/// Ordered header set. Setting a field replaces any earlier value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(HeaderName, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing an existing value for the same name.
    pub fn insert(&mut self, name: impl Into<HeaderName>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: impl Into<HeaderName>) -> Option<&str> {
        let name = name.into();
        self.entries
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn remove(&mut self, name: impl Into<HeaderName>) -> Option<String> {
        let name = name.into();
        let index = self.entries.iter().position(|(existing, _)| *existing == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, name: impl Into<HeaderName>) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &str)> {
        self.entries.iter().map(|(name, value)| (name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
