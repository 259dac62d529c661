//! E.164 phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input does not start with `+`.
    #[error("phone number must start with '+'")]
    MissingPlus,
    /// The country code starts with a zero.
    #[error("phone number country code cannot start with 0")]
    LeadingZero,
    /// The input contains something other than digits after the `+`.
    #[error("phone number must contain only digits after '+'")]
    NonDigit,
    /// The input has fewer than 10 or more than 15 digits.
    #[error("phone number must have between 10 and 15 digits")]
    WrongLength,
}

/// An international phone number in E.164 format, e.g. `+5511999998888`.
///
/// A leading `+` followed by 10 to 15 digits, the first of which is non-zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a well-formed E.164 number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let digits = s.strip_prefix('+').ok_or(PhoneError::MissingPlus)?;

        if digits.chars().any(|c| !c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }

        if digits.starts_with('0') {
            return Err(PhoneError::LeadingZero);
        }

        if !(10..=15).contains(&digits.len()) {
            return Err(PhoneError::WrongLength);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice, including the `+`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Phone {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Phone {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Phone {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_phones() {
        assert!(Phone::parse("+5511999998888").is_ok());
        assert!(Phone::parse("+14155552671").is_ok());
        assert!(Phone::parse("+447911123456").is_ok());
    }

    #[test]
    fn test_parse_invalid_phones() {
        assert_eq!(
            Phone::parse("5511999998888"),
            Err(PhoneError::MissingPlus)
        );
        assert_eq!(Phone::parse("+0511999998888"), Err(PhoneError::LeadingZero));
        assert_eq!(Phone::parse("+55 11 99999"), Err(PhoneError::NonDigit));
        assert_eq!(Phone::parse("+551199"), Err(PhoneError::WrongLength));
        assert_eq!(
            Phone::parse("+5511999998888123456"),
            Err(PhoneError::WrongLength)
        );
    }
}
