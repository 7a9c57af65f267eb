//! Content Digest Value Object
//!
//! Identifies a packaged build context so deploy reports can tell whether two
//! deploys shipped the same bytes.

use std::fmt;

/// SHA-256 digest with the `sha256:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Prefix for SHA-256 digests
    pub const PREFIX: &'static str = "sha256:";

    /// Compute the digest of a byte slice
    pub fn from_bytes(bytes: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        Self(format!("{}{:x}", Self::PREFIX, Sha256::digest(bytes)))
    }

    /// Compute the digest of a file, streaming its content
    pub fn from_file(path: &std::path::Path) -> std::io::Result<Self> {
        use sha2::{Digest, Sha256};
        let mut file = std::fs::File::open(path)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok(Self(format!("{}{:x}", Self::PREFIX, hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex part without prefix
    pub fn hex(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }

    /// First 12 hex characters, for display
    pub fn short(&self) -> &str {
        let hex = self.hex();
        &hex[..hex.len().min(12)]
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn digest_has_prefix_and_length() {
        let d = ContentDigest::from_bytes(b"hello");
        assert!(d.as_str().starts_with("sha256:"));
        assert_eq!(d.hex().len(), 64);
        assert_eq!(d.short().len(), 12);
    }

    #[test]
    fn file_digest_matches_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ctx.tar.gz");
        std::fs::write(&path, b"archive bytes").unwrap();
        assert_eq!(
            ContentDigest::from_file(&path).unwrap(),
            ContentDigest::from_bytes(b"archive bytes")
        );
    }
}
