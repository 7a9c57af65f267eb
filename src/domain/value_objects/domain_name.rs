//! Domain Name Value Object

use std::fmt;

/// A syntactically valid public hostname, stored lowercase.
///
/// Used as the key of a routing block, so two spellings that differ only in
/// case must compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainName(String);

impl DomainName {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let host = raw.trim().trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            return Err("must not be empty".to_string());
        }
        if host.len() > 253 {
            return Err("must be at most 253 characters".to_string());
        }
        if host.contains("://") || host.contains('/') {
            return Err("must be a bare hostname without scheme or path".to_string());
        }

        for label in host.split('.') {
            if label.is_empty() {
                return Err("contains an empty label".to_string());
            }
            if label.len() > 63 {
                return Err(format!("label '{}' is longer than 63 characters", label));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(format!("label '{}' starts or ends with '-'", label));
            }
            // `*` is accepted only as a whole leftmost label (wildcard site).
            if label == "*" {
                continue;
            }
            if let Some(bad) = label
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
            {
                return Err(format!("contains invalid character '{}'", bad));
            }
        }

        if host.split('.').skip(1).any(|l| l == "*") {
            return Err("wildcard is only allowed as the first label".to_string());
        }

        Ok(Self(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
