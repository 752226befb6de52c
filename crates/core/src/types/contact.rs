//! Contact details: email addresses and mobile numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain part (after @) is empty.
    #[error("email domain cannot be empty")]
    EmptyDomain,
}

/// An email address with structural validation.
///
/// Surrounding whitespace is trimmed before validation; the address must
/// contain a non-empty local part and domain separated by an @ symbol.
///
/// ```
/// use bazaar_core::Email;
///
/// assert!(Email::parse(" buyer@example.in ").is_ok());
/// assert!(Email::parse("no-at-symbol").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first structural problem.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
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

/// Errors that can occur when parsing a [`MobileNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileError {
    /// Country code is not `+` followed by 1-3 digits.
    #[error("invalid country code: {0}")]
    InvalidCountryCode(String),
    /// Local part is not exactly ten digits.
    #[error("mobile number must be exactly {expected} digits")]
    InvalidLength {
        /// Required number of digits.
        expected: usize,
    },
}

/// A mobile number made of a country code and a ten digit local number.
///
/// Serialized as the concatenation (e.g. `+919876543210`), which is also the
/// destination the OTP is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MobileNumber {
    country_code: String,
    local: String,
}

impl MobileNumber {
    /// Required length of the local part.
    pub const LOCAL_DIGITS: usize = 10;

    /// Parse from a country code (`+91`) and a local number (`9876543210`).
    ///
    /// # Errors
    ///
    /// Returns a [`MobileError`] if either part is malformed.
    pub fn parse(country_code: &str, local: &str) -> Result<Self, MobileError> {
        let country_code = country_code.trim();
        let digits = country_code.strip_prefix('+').unwrap_or_default();
        if digits.is_empty() || digits.len() > 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(MobileError::InvalidCountryCode(country_code.to_owned()));
        }

        let local = local.trim();
        if local.len() != Self::LOCAL_DIGITS || !local.chars().all(|c| c.is_ascii_digit()) {
            return Err(MobileError::InvalidLength {
                expected: Self::LOCAL_DIGITS,
            });
        }

        Ok(Self {
            country_code: country_code.to_owned(),
            local: local.to_owned(),
        })
    }

    /// Full number including country code.
    #[must_use]
    pub fn full(&self) -> String {
        format!("{}{}", self.country_code, self.local)
    }

    /// The ten digit local part.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.country_code, self.local)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user+tag@example.co.in").is_ok());
        assert_eq!(
            Email::parse("  a@b.c ").unwrap().as_str(),
            "a@b.c"
        );
    }

    #[test]
    fn test_parse_invalid_emails() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("plain"), Err(EmailError::MissingAtSymbol));
        assert_eq!(Email::parse("@x.com"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("user@"), Err(EmailError::EmptyDomain));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_email_deserialize_validates() {
        let ok: Email = serde_json::from_str("\"user@example.com\"").unwrap();
        assert_eq!(ok.as_str(), "user@example.com");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }

    #[test]
    fn test_mobile_parse() {
        let mobile = MobileNumber::parse("+91", "9876543210").unwrap();
        assert_eq!(mobile.full(), "+919876543210");
        assert_eq!(mobile.local(), "9876543210");
    }

    #[test]
    fn test_mobile_rejects_bad_input() {
        assert!(matches!(
            MobileNumber::parse("+91", "12345"),
            Err(MobileError::InvalidLength { expected: 10 })
        ));
        assert!(matches!(
            MobileNumber::parse("+91", "98765abcde"),
            Err(MobileError::InvalidLength { .. })
        ));
        assert!(matches!(
            MobileNumber::parse("91", "9876543210"),
            Err(MobileError::InvalidCountryCode(_))
        ));
    }
}
