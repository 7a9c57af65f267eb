//! Identifier Value Objects
//!
//! `AppName` names both applications and their auxiliary services. The same
//! string ends up as a compose project name, a container name prefix, a
//! network alias, and a directory under the host namespace, so the accepted
//! alphabet is the intersection of what all of those allow.

use std::fmt;

/// Maximum identifier length (DNS label limit, also fine for compose).
pub const MAX_NAME_LEN: usize = 63;

/// A validated application or service identifier.
///
/// Lowercase ASCII letters, digits, `-` and `_`; must start with a letter or
/// digit and be at most 63 characters long.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppName(String);

impl AppName {
    /// Parse and validate an identifier.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("must not be empty".to_string());
        }
        if raw.len() > MAX_NAME_LEN {
            return Err(format!("must be at most {} characters", MAX_NAME_LEN));
        }

        let mut chars = raw.chars();
        let first = chars.next().unwrap_or_default();
        if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
            return Err("must start with a lowercase letter or digit".to_string());
        }

        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(format!(
                "contains '{}'; only lowercase letters, digits, '-' and '_' are allowed",
                bad
            ));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AppName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_names() {
        for name in ["api", "web-1", "my_app", "0day"] {
            assert!(AppName::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_uppercase_and_separators() {
        assert!(AppName::parse("Api").is_err());
        assert!(AppName::parse("api/web").is_err());
        assert!(AppName::parse("api.web").is_err());
        assert!(AppName::parse("api web").is_err());
    }

    #[test]
    fn rejects_leading_dash() {
        let err = AppName::parse("-api").unwrap_err();
        assert!(err.contains("start with"));
    }

    #[test]
    fn rejects_empty_and_overlong() {
        assert!(AppName::parse("").is_err());
        assert!(AppName::parse(&"a".repeat(MAX_NAME_LEN)).is_ok());
        assert!(AppName::parse(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn display_round_trips() {
        let name = AppName::parse("api").unwrap();
        assert_eq!(name.to_string(), "api");
        assert_eq!(name.as_str(), "api");
    }
}
