//! Application document schema (`docklift.yml`)
//!
//! The raw, unvalidated shape of the document. [`super::validate`] turns it
//! into domain settings.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::loader::{unknown_key_warnings, ConfigWarning};

/// File name of the application document
pub const DOCUMENT_FILE: &str = "docklift.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    pub vps: VpsSection,
    pub application: ApplicationSection,
}

/// How to reach the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpsSection {
    pub host: String,
    pub user: String,
    pub ssh_key_path: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// ACME contact address for certificate issuance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSection {
    pub name: String,
    pub domain: String,
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, serde_yaml_ng::Value>,
    #[serde(default, skip_serializing_if = "Dependencies::is_empty")]
    pub dependencies: Dependencies,
}

fn default_dockerfile() -> String {
    "./Dockerfile".to_string()
}

fn default_context() -> String {
    ".".to_string()
}

/// One auxiliary service declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencySection {
    pub image: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, serde_yaml_ng::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_yaml_ng::Value>,
}

/// Dependencies in declaration order.
///
/// A plain map would sort them; the order decides startup ordering in the
/// rendered manifest, so it is kept as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependencies(pub Vec<(String, DependencySection)>);

impl Dependencies {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, DependencySection)> {
        self.0.iter()
    }
}

impl Serialize for Dependencies {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, section) in &self.0 {
            map.serialize_entry(name, section)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Dependencies {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DependenciesVisitor;

        impl<'de> Visitor<'de> for DependenciesVisitor {
            type Value = Dependencies;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of dependency name to service declaration")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(Dependencies::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, DependencySection)> = Vec::new();
                while let Some((name, section)) = access.next_entry::<String, DependencySection>()? {
                    if entries.iter().any(|(existing, _)| *existing == name) {
                        return Err(serde::de::Error::custom(format!(
                            "dependency '{name}' is declared twice"
                        )));
                    }
                    entries.push((name, section));
                }
                Ok(Dependencies(entries))
            }
        }

        deserializer.deserialize_map(DependenciesVisitor)
    }
}

const DOCUMENT_KEYS: &[&str] = &[
    "vps",
    "host",
    "user",
    "ssh_key_path",
    "port",
    "email",
    "application",
    "name",
    "domain",
    "dockerfile",
    "context",
    "environment",
    "dependencies",
    "image",
    "volumes",
    "ports",
    "depends_on",
    "extra",
];

impl SettingsDocument {
    /// Parse YAML, collecting unknown keys as warnings.
    pub fn parse_with_warnings(
        content: &str,
        file: &Path,
    ) -> Result<(Self, Vec<ConfigWarning>), serde_yaml_ng::Error> {
        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = serde_yaml_ng::Deserializer::from_str(content);
        let document: SettingsDocument = serde_ignored::deserialize(deserializer, |p| {
            unknown_paths.push(p.to_string());
        })?;
        let warnings = unknown_key_warnings(unknown_paths, file, content, DOCUMENT_KEYS);
        Ok((document, warnings))
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(self)
    }
}
