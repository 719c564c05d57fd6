//! Target endpoint the probe polls

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// A non-empty endpoint URL
///
/// Only emptiness is validated here. A malformed URL is reported by the
/// HTTP client when the request is built, the same way a transport error is.
///
/// # Examples
///
/// ```
/// use domain::value_objects::TargetUrl;
///
/// let url = TargetUrl::new("http://localhost:5000/rolldice").expect("valid url");
/// assert_eq!(url.as_str(), "http://localhost:5000/rolldice");
///
/// assert!(TargetUrl::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetUrl(String);

impl TargetUrl {
    /// Create a target URL, trimming surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingEndpoint` if the trimmed input is empty.
    pub fn new(url: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = url.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::MissingEndpoint);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the URL as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TargetUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TargetUrl {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TargetUrl> for String {
    fn from(url: TargetUrl) -> Self {
        url.0
    }
}

impl std::str::FromStr for TargetUrl {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
