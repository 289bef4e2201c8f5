//! Recipient target module

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Form value of the broadcast sentinel
pub const EVERYONE: &str = "Everyone";

/// Who an upload is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RecipientTarget {
    /// Visible to every client
    #[default]
    Everyone,
    /// Visible only to the client at this address
    Address(String),
}

impl RecipientTarget {
    pub fn address(addr: impl Into<String>) -> Self {
        RecipientTarget::Address(addr.into())
    }

    /// Interpret a form value; missing, blank, or the sentinel mean everyone
    pub fn from_form(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(EVERYONE) => RecipientTarget::Everyone,
            Some(addr) => RecipientTarget::Address(addr.to_string()),
        }
    }

    /// Value sent in the `recipient` multipart field
    pub fn as_form_value(&self) -> &str {
        match self {
            RecipientTarget::Everyone => EVERYONE,
            RecipientTarget::Address(addr) => addr,
        }
    }

    pub fn is_everyone(&self) -> bool {
        matches!(self, RecipientTarget::Everyone)
    }

    /// Whether a client at `addr` may see a file addressed to this target
    pub fn admits(&self, addr: &str) -> bool {
        match self {
            RecipientTarget::Everyone => true,
            RecipientTarget::Address(target) => target == addr,
        }
    }
}

impl fmt::Display for RecipientTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_form_value())
    }
}

impl FromStr for RecipientTarget {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_form(Some(s)))
    }
}

impl Serialize for RecipientTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_form_value())
    }
}

impl<'de> Deserialize<'de> for RecipientTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_form(Some(&value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_form() {
        assert_eq!(RecipientTarget::from_form(None), RecipientTarget::Everyone);
        assert_eq!(RecipientTarget::from_form(Some("")), RecipientTarget::Everyone);
        assert_eq!(RecipientTarget::from_form(Some("Everyone")), RecipientTarget::Everyone);
        assert_eq!(
            RecipientTarget::from_form(Some(" 192.168.1.42 ")),
            RecipientTarget::address("192.168.1.42")
        );
    }

    #[test]
    fn test_form_value() {
        assert_eq!(RecipientTarget::Everyone.as_form_value(), "Everyone");
        assert_eq!(RecipientTarget::address("10.0.0.5").to_string(), "10.0.0.5");
    }

    #[test]
    fn test_admits() {
        assert!(RecipientTarget::Everyone.admits("10.0.0.1"));
        assert!(RecipientTarget::address("10.0.0.1").admits("10.0.0.1"));
        assert!(!RecipientTarget::address("10.0.0.1").admits("10.0.0.2"));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&RecipientTarget::address("10.0.0.9")).unwrap();
        assert_eq!(json, "\"10.0.0.9\"");
        let back: RecipientTarget = serde_json::from_str("\"Everyone\"").unwrap();
        assert!(back.is_everyone());
    }
}
