//! Menu section name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`SectionName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionNameError {
    /// The input is empty after trimming.
    #[error("section name cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("section name cannot be more than {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The name of a menu section, e.g. "Burgers" or "Midnight Maggi".
///
/// Items reference their section by this name rather than by id, so the name
/// doubles as the join key between sections and items.
///
/// ## Constraints
///
/// - Leading and trailing whitespace is trimmed
/// - Length: 1-50 characters after trimming
///
/// ## Examples
///
/// ```
/// use after10_core::SectionName;
///
/// assert_eq!(SectionName::parse("  Burgers ").unwrap().as_str(), "Burgers");
/// assert!(SectionName::parse("   ").is_err());
/// assert!(SectionName::parse(&"x".repeat(51)).is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct SectionName(String);

impl SectionName {
    /// Maximum length of a section name, in characters.
    pub const MAX_LENGTH: usize = 50;

    /// Parse a `SectionName` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than 50
    /// characters.
    pub fn parse(s: &str) -> Result<Self, SectionNameError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(SectionNameError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(SectionNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the section name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `SectionName` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SectionName {
    type Err = SectionNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SectionName {
    type Error = SectionNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SectionName> for String {
    fn from(name: SectionName) -> Self {
        name.0
    }
}

impl AsRef<str> for SectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for SectionName {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SectionName {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for SectionName {
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
    fn test_parse_trims() {
        let name = SectionName::parse("  Late Night Specials  ").unwrap();
        assert_eq!(name.as_str(), "Late Night Specials");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(SectionName::parse(""), Err(SectionNameError::Empty));
        assert_eq!(SectionName::parse(" \t "), Err(SectionNameError::Empty));
    }

    #[test]
    fn test_parse_length_limit() {
        assert!(SectionName::parse(&"a".repeat(50)).is_ok());
        assert!(matches!(
            SectionName::parse(&"a".repeat(51)),
            Err(SectionNameError::TooLong { max: 50 })
        ));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        assert!(SectionName::parse(&"é".repeat(50)).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<SectionName, _> = serde_json::from_str("\" Rolls \"");
        assert_eq!(ok.unwrap().as_str(), "Rolls");

        let err: Result<SectionName, _> = serde_json::from_str("\"\"");
        assert!(err.is_err());
    }
}
