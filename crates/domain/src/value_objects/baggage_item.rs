//! Baggage entry propagated with every probe request

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// A single `key=value` baggage entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaggageItem {
    key: String,
    value: String,
}

impl BaggageItem {
    /// Create a baggage entry
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBaggage` if the key is empty or contains
    /// whitespace, `=` or `,`.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        let value = value.into();
        let key_is_valid = !key.is_empty()
            && !key
                .chars()
                .any(|c| c.is_whitespace() || c == '=' || c == ',' || c == ';');
        if !key_is_valid {
            return Err(DomainError::InvalidBaggage(format!("{key}={value}")));
        }
        Ok(Self { key, value })
    }

    /// Baggage key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Baggage value
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for BaggageItem {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| DomainError::InvalidBaggage(s.to_string()))?;
        Self::new(key.trim(), value.trim())
    }
}

impl fmt::Display for BaggageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value() {
        let item: BaggageItem = "tenant=blue".parse().unwrap();
        assert_eq!(item.key(), "tenant");
        assert_eq!(item.value(), "blue");
    }

    #[test]
    fn value_may_contain_equals() {
        let item: BaggageItem = "expr=a=b".parse().unwrap();
        assert_eq!(item.key(), "expr");
        assert_eq!(item.value(), "a=b");
    }

    #[test]
    fn empty_value_is_allowed() {
        let item: BaggageItem = "flag=".parse().unwrap();
        assert_eq!(item.value(), "");
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = "novalue".parse::<BaggageItem>().unwrap_err();
        assert_eq!(err, DomainError::InvalidBaggage("novalue".to_string()));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!("=value".parse::<BaggageItem>().is_err());
    }

    #[test]
    fn key_with_space_is_rejected() {
        assert!(BaggageItem::new("a b", "c").is_err());
    }

    #[test]
    fn display_format() {
        let item = BaggageItem::new("user", "42").unwrap();
        assert_eq!(item.to_string(), "user=42");
    }
}
