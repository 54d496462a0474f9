//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not start with a + country code prefix.
    #[error("phone number must start with a + country code")]
    MissingCountryCode,
    /// The input contains a character that is not a digit or formatting.
    #[error("phone number contains invalid character '{found}'")]
    InvalidCharacter {
        /// The offending character.
        found: char,
    },
    /// The country code starts with zero.
    #[error("phone number country code cannot start with zero")]
    LeadingZero,
    /// The input has too few digits.
    #[error("phone number must have at least {min} digits")]
    TooShort {
        /// Minimum digit count.
        min: usize,
    },
    /// The input has too many digits.
    #[error("phone number must have at most {max} digits")]
    TooLong {
        /// Maximum digit count (E.164 limit).
        max: usize,
    },
}

/// A phone number in international format.
///
/// Parsing accepts common formatting (spaces, hyphens, dots, parentheses) and
/// normalizes to a bare `+` followed by digits. Whether the number can
/// actually receive a code is the verification backend's job; this type only
/// rejects input that could never be an E.164 number.
///
/// ## Constraints
///
/// - Must start with `+` followed by the country code
/// - 8-15 digits after normalization (E.164 limit)
/// - Country code must not start with zero
///
/// ## Examples
///
/// ```
/// use auric_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+1 (415) 555-0123").unwrap();
/// assert_eq!(phone.as_str(), "+14155550123");
///
/// assert!(PhoneNumber::parse("415-555-0123").is_err()); // no country code
/// assert!(PhoneNumber::parse("+1-800-FLOWERS").is_err()); // letters
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 8;
    /// Maximum number of digits (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `PhoneNumber` from a string, normalizing formatting.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Does not start with `+`
    /// - Contains characters other than digits and formatting
    /// - Has a country code starting with zero
    /// - Has fewer than 8 or more than 15 digits
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let rest = trimmed
            .strip_prefix('+')
            .ok_or(PhoneError::MissingCountryCode)?;

        let mut digits = String::with_capacity(Self::MAX_DIGITS);
        for c in rest.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
            } else if !matches!(c, ' ' | '-' | '.' | '(' | ')') {
                return Err(PhoneError::InvalidCharacter { found: c });
            }
        }

        if digits.starts_with('0') {
            return Err(PhoneError::LeadingZero);
        }

        if digits.len() < Self::MIN_DIGITS {
            return Err(PhoneError::TooShort {
                min: Self::MIN_DIGITS,
            });
        }

        if digits.len() > Self::MAX_DIGITS {
            return Err(PhoneError::TooLong {
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("+{digits}")))
    }

    /// Returns the normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_numbers() {
        assert!(PhoneNumber::parse("+14155550123").is_ok());
        assert!(PhoneNumber::parse("+44 20 7946 0958").is_ok());
        assert!(PhoneNumber::parse("+91-22-2278-3000").is_ok());
        assert!(PhoneNumber::parse("+1 (415) 555-0123").is_ok());
    }

    #[test]
    fn test_parse_normalizes_formatting() {
        let phone = PhoneNumber::parse("+1 (415) 555-0123").unwrap();
        assert_eq!(phone.as_str(), "+14155550123");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(PhoneNumber::parse(""), Err(PhoneError::Empty)));
        assert!(matches!(PhoneNumber::parse("   "), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_missing_country_code() {
        assert!(matches!(
            PhoneNumber::parse("415-555-0123"),
            Err(PhoneError::MissingCountryCode)
        ));
    }

    #[test]
    fn test_parse_invalid_character() {
        assert!(matches!(
            PhoneNumber::parse("+1-800-FLOWERS"),
            Err(PhoneError::InvalidCharacter { found: 'F' })
        ));
    }

    #[test]
    fn test_parse_leading_zero() {
        assert!(matches!(
            PhoneNumber::parse("+04155550123"),
            Err(PhoneError::LeadingZero)
        ));
    }

    #[test]
    fn test_parse_too_short() {
        assert!(matches!(
            PhoneNumber::parse("+1415555"),
            Err(PhoneError::TooShort { .. })
        ));
    }

    #[test]
    fn test_parse_too_long() {
        assert!(matches!(
            PhoneNumber::parse("+1234567890123456"),
            Err(PhoneError::TooLong { .. })
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let phone = PhoneNumber::parse("+14155550123").unwrap();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"+14155550123\"");

        let parsed: PhoneNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, phone);
    }

    #[test]
    fn test_from_str() {
        let phone: PhoneNumber = "+14155550123".parse().unwrap();
        assert_eq!(phone.as_str(), "+14155550123");
    }
}
