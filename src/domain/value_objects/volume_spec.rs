//! Volume mount specification

use std::fmt;

/// A single `source:target[:mode]` volume mount of an auxiliary service.
///
/// A source that does not look like a path (`/…`, `./…`, `../…`, `~…`) is a
/// named volume owned by the application's compose project and gets declared
/// in the manifest's top-level `volumes` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    pub source: String,
    pub target: String,
    pub mode: Option<String>,
}

impl VolumeSpec {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let parts: Vec<&str> = raw.split(':').collect();
        let (source, target, mode) = match parts.as_slice() {
            [source, target] => (*source, *target, None),
            [source, target, mode] => (*source, *target, Some(*mode)),
            _ => return Err(format!("'{}' is not of the form source:target[:mode]", raw)),
        };

        if source.is_empty() {
            return Err(format!("'{}' has an empty source", raw));
        }
        if !target.starts_with('/') {
            return Err(format!("'{}' target must be an absolute container path", raw));
        }
        if let Some(mode) = mode {
            if !matches!(mode, "ro" | "rw" | "z" | "Z" | "cached" | "delegated") {
                return Err(format!("'{}' has unknown mode '{}'", raw, mode));
            }
        }

        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
            mode: mode.map(str::to_string),
        })
    }

    /// True when the source names a compose-managed volume rather than a host path.
    pub fn is_named(&self) -> bool {
        !(self.source.starts_with('/')
            || self.source.starts_with('.')
            || self.source.starts_with('~'))
    }
}

impl fmt::Display for VolumeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.target)?;
        if let Some(mode) = &self.mode {
            write!(f, ":{}", mode)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_volume() {
        let v = VolumeSpec::parse("pgdata:/var/lib/postgresql/data").unwrap();
        assert!(v.is_named());
        assert_eq!(v.source, "pgdata");
        assert_eq!(v.mode, None);
    }

    #[test]
    fn parses_bind_mount_with_mode() {
        let v = VolumeSpec::parse("./init.sql:/docker-entrypoint-initdb.d/init.sql:ro").unwrap();
        assert!(!v.is_named());
        assert_eq!(v.mode.as_deref(), Some("ro"));
        assert_eq!(v.to_string(), "./init.sql:/docker-entrypoint-initdb.d/init.sql:ro");
    }

    #[test]
    fn rejects_relative_target() {
        assert!(VolumeSpec::parse("data:var/lib").is_err());
    }

    #[test]
    fn rejects_missing_target() {
        assert!(VolumeSpec::parse("data").is_err());
        assert!(VolumeSpec::parse("a:/b:ro:x").is_err());
    }
}
