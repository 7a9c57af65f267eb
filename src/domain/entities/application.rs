//! Application entity - the validated description of one deployable application
//!
//! Produced by settings validation; everything downstream (manifest rendering,
//! deploy, removal) works from this type and never from the raw document.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::value_objects::{AppName, DomainName, VolumeSpec};

/// A dependency container declared alongside the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryService {
    /// Unique within the application; also the compose service name
    pub name: AppName,
    /// Image reference
    pub image: String,
    pub environment: BTreeMap<String, String>,
    /// Mounts, in declaration order
    pub volumes: Vec<VolumeSpec>,
    /// Host port mappings (`host:container`), passed through verbatim
    pub ports: Vec<String>,
    /// Other auxiliary services of the same application this one waits for
    pub depends_on: Vec<AppName>,
    /// Additional service keys merged into the rendered manifest
    pub extra: BTreeMap<String, serde_yaml_ng::Value>,
}

impl AuxiliaryService {
    pub fn new(name: AppName, image: impl Into<String>) -> Self {
        Self {
            name,
            image: image.into(),
            environment: BTreeMap::new(),
            volumes: Vec::new(),
            ports: Vec::new(),
            depends_on: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// One application as the engine converges it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationSpec {
    /// Host-wide namespace key
    pub name: AppName,
    /// Public domain routed to the application
    pub domain: DomainName,
    /// Local build-context root
    pub context: PathBuf,
    /// Build file, relative to the context, `/`-separated
    pub dockerfile: String,
    /// Internal listen port; `None` until allocated
    pub port: Option<u16>,
    pub environment: BTreeMap<String, String>,
    /// Auxiliary services, in declaration order
    pub services: Vec<AuxiliaryService>,
}

impl ApplicationSpec {
    pub fn new(name: AppName, domain: DomainName, context: impl Into<PathBuf>) -> Self {
        Self {
            name,
            domain,
            context: context.into(),
            dockerfile: "Dockerfile".to_string(),
            port: None,
            environment: BTreeMap::new(),
            services: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_service(mut self, service: AuxiliaryService) -> Self {
        self.services.push(service);
        self
    }

    pub fn service(&self, name: &str) -> Option<&AuxiliaryService> {
        self.services.iter().find(|s| s.name.as_str() == name)
    }

    /// Named volumes used by any auxiliary service, first-use order, deduplicated.
    pub fn named_volumes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for volume in self.services.iter().flat_map(|s| s.volumes.iter()) {
            if volume.is_named() && !names.contains(&volume.source.as_str()) {
                names.push(volume.source.as_str());
            }
        }
        names
    }
}
