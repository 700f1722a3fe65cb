//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain a dot.
    #[error("shop domain must contain a dot")]
    MissingDot,
    /// A dot-separated label is empty.
    #[error("shop domain labels cannot be empty")]
    EmptyLabel,
    /// The input contains a character outside `[a-z0-9.-]`.
    #[error("shop domain contains invalid character {character:?}")]
    InvalidCharacter {
        /// The offending character.
        character: char,
    },
}

/// A Shopify shop domain such as `example.myshopify.com`.
///
/// Shop domains arrive on webhook headers and API paths and are the primary
/// key for per-merchant data. This type normalizes them to lowercase and
/// rejects strings that cannot be hostnames, so a raw header value never
/// reaches a query untouched.
///
/// ## Constraints
///
/// - Length: 1-255 characters (RFC 1035 limit)
/// - Must contain at least one dot
/// - Only ASCII letters, digits, hyphens, and dots
/// - No empty dot-separated labels
///
/// ## Examples
///
/// ```
/// use adstem_core::ShopDomain;
///
/// // Valid domains (normalized to lowercase)
/// assert!(ShopDomain::parse("example.myshopify.com").is_ok());
/// assert!(ShopDomain::parse("My-Shop.myshopify.com").is_ok());
///
/// // Invalid domains
/// assert!(ShopDomain::parse("").is_err());            // empty
/// assert!(ShopDomain::parse("no-dot").is_err());      // missing dot
/// assert!(ShopDomain::parse("bad domain.com").is_err()); // whitespace
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a shop domain (RFC 1035).
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `ShopDomain` from a string, normalizing to lowercase.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is longer than 255 characters
    /// - Does not contain a dot
    /// - Contains characters outside `[a-zA-Z0-9.-]`
    /// - Has an empty dot-separated label
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        if s.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(character) = s
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '.' && *c != '-')
        {
            return Err(ShopDomainError::InvalidCharacter { character });
        }

        if !s.contains('.') {
            return Err(ShopDomainError::MissingDot);
        }

        if s.split('.').any(str::is_empty) {
            return Err(ShopDomainError::EmptyLabel);
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Returns the shop domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the shop handle (the first dot-separated label).
    ///
    /// For `example.myshopify.com` this is `example`.
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.split('.').next().unwrap_or("")
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopDomain {
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
    fn test_parse_valid_domains() {
        assert!(ShopDomain::parse("example.myshopify.com").is_ok());
        assert!(ShopDomain::parse("my-shop.myshopify.com").is_ok());
        assert!(ShopDomain::parse("shop123.myshopify.com").is_ok());
        assert!(ShopDomain::parse("custom-domain.co.uk").is_ok());
        assert!(ShopDomain::parse("a.b").is_ok());
    }

    #[test]
    fn test_parse_normalizes_case() {
        let domain = ShopDomain::parse("My-Shop.MyShopify.COM").unwrap();
        assert_eq!(domain.as_str(), "my-shop.myshopify.com");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(ShopDomain::parse(""), Err(ShopDomainError::Empty)));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}.myshopify.com", "a".repeat(250));
        assert!(matches!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_missing_dot() {
        assert!(matches!(
            ShopDomain::parse("no-dot"),
            Err(ShopDomainError::MissingDot)
        ));
    }

    #[test]
    fn test_parse_empty_label() {
        assert!(matches!(
            ShopDomain::parse("example..com"),
            Err(ShopDomainError::EmptyLabel)
        ));
        assert!(matches!(
            ShopDomain::parse(".myshopify.com"),
            Err(ShopDomainError::EmptyLabel)
        ));
        assert!(matches!(
            ShopDomain::parse("example.myshopify.com."),
            Err(ShopDomainError::EmptyLabel)
        ));
    }

    #[test]
    fn test_parse_invalid_characters() {
        assert!(matches!(
            ShopDomain::parse("bad domain.com"),
            Err(ShopDomainError::InvalidCharacter { character: ' ' })
        ));
        assert!(matches!(
            ShopDomain::parse("shop_name.myshopify.com"),
            Err(ShopDomainError::InvalidCharacter { character: '_' })
        ));
        assert!(matches!(
            ShopDomain::parse("https://example.com"),
            Err(ShopDomainError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn test_handle() {
        let domain = ShopDomain::parse("example.myshopify.com").unwrap();
        assert_eq!(domain.handle(), "example");
    }

    #[test]
    fn test_display() {
        let domain = ShopDomain::parse("example.myshopify.com").unwrap();
        assert_eq!(format!("{domain}"), "example.myshopify.com");
    }

    #[test]
    fn test_serde_roundtrip() {
        let domain = ShopDomain::parse("example.myshopify.com").unwrap();
        let json = serde_json::to_string(&domain).unwrap();
        assert_eq!(json, "\"example.myshopify.com\"");

        let parsed: ShopDomain = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, domain);
    }

    #[test]
    fn test_from_str() {
        let domain: ShopDomain = "example.myshopify.com".parse().unwrap();
        assert_eq!(domain.as_str(), "example.myshopify.com");
    }
}
