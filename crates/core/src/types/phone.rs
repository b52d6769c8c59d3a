//! Ugandan mobile phone numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains something other than digits, spaces, dashes or a leading `+`.
    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// The number does not start with `0`, `256` or `+256`.
    #[error("phone number must start with 0, 256 or +256")]
    UnknownPrefix,
    /// The subscriber part is not a nine digit mobile number starting with 7.
    #[error("phone number must be a Ugandan mobile number (07XX XXX XXX)")]
    NotMobile,
}

/// Mobile network operator, derived from the number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobileNetwork {
    Mtn,
    Airtel,
    Other,
}

/// A Ugandan mobile number, stored in E.164 form (`+2567XXXXXXXX`).
///
/// ## Accepted input
///
/// - National format: `0772 123 456`, `0772-123-456`
/// - International format: `+256 772 123456`, `256772123456`
///
/// ## Examples
///
/// ```
/// use katale_core::{MobileNetwork, PhoneNumber};
///
/// let phone = PhoneNumber::parse("0772 123 456").unwrap();
/// assert_eq!(phone.as_str(), "+256772123456");
/// assert_eq!(phone.network(), MobileNetwork::Mtn);
///
/// assert!(PhoneNumber::parse("0412 123 456").is_err()); // landline
/// assert!(PhoneNumber::parse("077212345").is_err());    // too short
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Uganda country calling code.
    pub const COUNTRY_CODE: &'static str = "256";

    /// Number of digits after the trunk prefix or country code.
    const SUBSCRIBER_DIGITS: usize = 9;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains characters other than
    /// digits and separators, has an unknown prefix, or is not a mobile number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (has_plus, rest) = trimmed
            .strip_prefix('+')
            .map_or((false, trimmed), |rest| (true, rest));

        let mut digits = String::with_capacity(rest.len());
        for ch in rest.chars() {
            match ch {
                '0'..='9' => digits.push(ch),
                ' ' | '-' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        let subscriber = if let Some(local) = digits.strip_prefix(Self::COUNTRY_CODE) {
            local
        } else if has_plus {
            return Err(PhoneError::UnknownPrefix);
        } else if let Some(local) = digits.strip_prefix('0') {
            local
        } else {
            return Err(PhoneError::UnknownPrefix);
        };

        if subscriber.len() != Self::SUBSCRIBER_DIGITS || !subscriber.starts_with('7') {
            return Err(PhoneError::NotMobile);
        }

        Ok(Self(format!("+{}{subscriber}", Self::COUNTRY_CODE)))
    }

    /// Returns `true` if the input is a valid Ugandan mobile number.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Returns the number in E.164 form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number in national form (`07XXXXXXXX`).
    #[must_use]
    pub fn national(&self) -> String {
        format!("0{}", self.subscriber())
    }

    /// Returns the operator that issued the number.
    #[must_use]
    pub fn network(&self) -> MobileNetwork {
        match self.subscriber().get(..2) {
            Some("76" | "77" | "78") => MobileNetwork::Mtn,
            Some("70" | "74" | "75") => MobileNetwork::Airtel,
            _ => MobileNetwork::Other,
        }
    }

    fn subscriber(&self) -> &str {
        // "+256" is four bytes
        self.0.get(4..).unwrap_or_default()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_national_format() {
        let phone = PhoneNumber::parse("0772123456").unwrap();
        assert_eq!(phone.as_str(), "+256772123456");
        assert_eq!(phone.national(), "0772123456");
    }

    #[test]
    fn test_parse_with_separators() {
        assert!(PhoneNumber::parse("0772 123 456").is_ok());
        assert!(PhoneNumber::parse("0772-123-456").is_ok());
        assert!(PhoneNumber::parse(" +256 701 234 567 ").is_ok());
    }

    #[test]
    fn test_parse_international_format() {
        let with_plus = PhoneNumber::parse("+256752000111").unwrap();
        let without_plus = PhoneNumber::parse("256752000111").unwrap();
        assert_eq!(with_plus, without_plus);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
        assert_eq!(PhoneNumber::parse("   "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_parse_invalid_character() {
        assert_eq!(
            PhoneNumber::parse("0772.123.456"),
            Err(PhoneError::InvalidCharacter('.'))
        );
    }

    #[test]
    fn test_parse_foreign_number() {
        assert_eq!(
            PhoneNumber::parse("+254712345678"),
            Err(PhoneError::UnknownPrefix)
        );
        assert_eq!(
            PhoneNumber::parse("772123456"),
            Err(PhoneError::UnknownPrefix)
        );
    }

    #[test]
    fn test_parse_not_mobile() {
        assert_eq!(PhoneNumber::parse("0414123456"), Err(PhoneError::NotMobile));
        assert_eq!(PhoneNumber::parse("07721234567"), Err(PhoneError::NotMobile));
        assert_eq!(PhoneNumber::parse("077212345"), Err(PhoneError::NotMobile));
    }

    #[test]
    fn test_network_detection() {
        assert_eq!(
            PhoneNumber::parse("0772123456").unwrap().network(),
            MobileNetwork::Mtn
        );
        assert_eq!(
            PhoneNumber::parse("0701234567").unwrap().network(),
            MobileNetwork::Airtel
        );
        assert_eq!(
            PhoneNumber::parse("0711234567").unwrap().network(),
            MobileNetwork::Other
        );
    }

    #[test]
    fn test_serde_normalizes_and_validates() {
        let phone: PhoneNumber = serde_json::from_str("\"0772 123 456\"").unwrap();
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"+256772123456\"");
        assert!(serde_json::from_str::<PhoneNumber>("\"12345\"").is_err());
    }
}
