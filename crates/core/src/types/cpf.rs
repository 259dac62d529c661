//! Brazilian CPF (tax-id) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Cpf`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CpfError {
    /// The input has something other than 11 digits after stripping
    /// punctuation.
    #[error("CPF must contain exactly 11 digits")]
    WrongLength,
    /// All 11 digits are identical (e.g. `111.111.111-11`), which passes the
    /// checksum but is not a valid CPF.
    #[error("invalid CPF: all digits are the same")]
    RepeatedDigits,
    /// One of the two check digits does not match the computed value.
    #[error("invalid CPF: check digit is incorrect")]
    BadCheckDigit,
}

/// A validated Brazilian CPF, stored as its 11 digits without punctuation.
///
/// Accepts formatted (`529.982.247-25`) or bare (`52998224725`) input; both
/// check digits are verified.
///
/// ```
/// use lu_estilo_core::Cpf;
///
/// assert!(Cpf::parse("529.982.247-25").is_ok());
/// assert!(Cpf::parse("529.982.247-26").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cpf(String);

impl Cpf {
    /// Parse a `Cpf` from a string, ignoring `.`, `-` and spaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not contain exactly 11 digits, is a
    /// repeated-digit sequence, or fails the check-digit verification.
    pub fn parse(s: &str) -> Result<Self, CpfError> {
        let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();

        if digits.len() != 11 || s.chars().any(|c| !c.is_ascii_digit() && !".- ".contains(c)) {
            return Err(CpfError::WrongLength);
        }

        if digits.iter().all(|&d| d == digits[0]) {
            return Err(CpfError::RepeatedDigits);
        }

        let first = check_digit(&digits[..9], 10);
        if digits[9] != first {
            return Err(CpfError::BadCheckDigit);
        }

        let second = check_digit(&digits[..10], 11);
        if digits[10] != second {
            return Err(CpfError::BadCheckDigit);
        }

        Ok(Self(
            s.chars().filter(char::is_ascii_digit).collect::<String>(),
        ))
    }

    /// Returns the bare 11-digit CPF as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Compute a CPF verifier digit over `digits` with the given starting weight.
fn check_digit(digits: &[u32], factor: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| d * (factor - u32::try_from(i).unwrap_or(0)))
        .sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Cpf {
    type Err = CpfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cpf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Cpf {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Cpf {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Cpf {
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
    fn test_parse_valid_cpf() {
        // Known-valid CPF (check digits 2 and 5)
        let cpf = Cpf::parse("529.982.247-25").unwrap();
        assert_eq!(cpf.as_str(), "52998224725");

        // Bare digits are accepted too
        assert!(Cpf::parse("52998224725").is_ok());
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(Cpf::parse("1234567890"), Err(CpfError::WrongLength));
        assert_eq!(Cpf::parse("123456789012"), Err(CpfError::WrongLength));
        assert_eq!(Cpf::parse(""), Err(CpfError::WrongLength));
        assert_eq!(Cpf::parse("5299822472x"), Err(CpfError::WrongLength));
    }

    #[test]
    fn test_parse_repeated_digits() {
        assert_eq!(
            Cpf::parse("111.111.111-11"),
            Err(CpfError::RepeatedDigits)
        );
        assert_eq!(Cpf::parse("00000000000"), Err(CpfError::RepeatedDigits));
    }

    #[test]
    fn test_parse_bad_check_digits() {
        // First check digit wrong
        assert_eq!(
            Cpf::parse("529.982.247-35"),
            Err(CpfError::BadCheckDigit)
        );
        // Second check digit wrong
        assert_eq!(
            Cpf::parse("529.982.247-26"),
            Err(CpfError::BadCheckDigit)
        );
    }
}
