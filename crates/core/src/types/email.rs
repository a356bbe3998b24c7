//! Customer email for checkout prefill.
//!
//! The address is only handed to the payment provider, which performs its
//! own verification, so the checks here are structural: one `@`, something on
//! both sides, no whitespace, within the SMTP length limit. The domain is
//! lowercased; the local part is kept as typed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest address accepted (RFC 5321 path limit).
const MAX_EMAIL_LEN: usize = 254;

/// Why a string is not an acceptable [`Email`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email cannot contain whitespace")]
    Whitespace,
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    #[error("email must contain exactly one @ symbol")]
    MultipleAtSymbols,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain cannot be empty")]
    EmptyDomain,
}

/// A structurally valid email address.
///
/// Deserializing runs the same checks as [`Email::parse`].
///
/// ```
/// use kebab_core::Email;
///
/// let email = Email::parse("Guest@Kebab.Example").unwrap();
/// assert_eq!(email.as_str(), "Guest@kebab.example");
///
/// assert!(Email::parse("guest@").is_err());
/// assert!(Email::parse("two words@kebab.example").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Check and normalize `input`.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found, in the order the
    /// [`EmailError`] variants are declared.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        if input.is_empty() {
            return Err(EmailError::Empty);
        }
        if input.len() > MAX_EMAIL_LEN {
            return Err(EmailError::TooLong { max: MAX_EMAIL_LEN });
        }
        if input.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let mut parts = input.split('@');
        let local = parts.next().unwrap_or_default();
        let Some(domain) = parts.next() else {
            return Err(EmailError::MissingAtSymbol);
        };
        if parts.next().is_some() {
            return Err(EmailError::MultipleAtSymbols);
        }

        match (local.is_empty(), domain.is_empty()) {
            (true, _) => Err(EmailError::EmptyLocalPart),
            (_, true) => Err(EmailError::EmptyDomain),
            _ => Ok(Self(format!("{local}@{}", domain.to_ascii_lowercase()))),
        }
    }

    /// The normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ordinary_addresses() {
        for input in ["guest@example.com", "first.last+orders@mail.kebab.example", "a@b"] {
            assert_eq!(Email::parse(input).unwrap().as_str(), input);
        }
    }

    #[test]
    fn test_lowercases_domain_only() {
        let email = Email::parse("Ali.Baba@Kebab-House.DE").unwrap();
        assert_eq!(email.as_str(), "Ali.Baba@kebab-house.de");
        assert_eq!(email.domain(), "kebab-house.de");
    }

    #[test]
    fn test_rejections_in_order() {
        let cases = [
            ("", EmailError::Empty),
            (" guest@example.com", EmailError::Whitespace),
            ("guest\t@example.com", EmailError::Whitespace),
            ("guest.example.com", EmailError::MissingAtSymbol),
            ("guest@kitchen@example.com", EmailError::MultipleAtSymbols),
            ("@example.com", EmailError::EmptyLocalPart),
            ("guest@", EmailError::EmptyDomain),
        ];
        for (input, expected) in cases {
            assert_eq!(Email::parse(input), Err(expected), "input: {input:?}");
        }
    }

    #[test]
    fn test_length_limit() {
        let at_limit = format!("{}@example.com", "g".repeat(MAX_EMAIL_LEN - 12));
        assert!(Email::parse(&at_limit).is_ok());

        let over = format!("g{at_limit}");
        assert_eq!(
            Email::parse(&over),
            Err(EmailError::TooLong { max: MAX_EMAIL_LEN })
        );
    }

    #[test]
    fn test_serde_validates() {
        let email: Email = serde_json::from_str("\"guest@Example.com\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"guest@example.com\"");

        assert!(serde_json::from_str::<Email>("\"guest\"").is_err());
    }
}
