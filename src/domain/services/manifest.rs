//! Service manifest rendering
//!
//! Turns an `ApplicationSpec` into the compose document the container runtime
//! consumes. Rendering is a pure function: the same application and port give
//! byte-identical output, so an unchanged re-deploy leaves containers alone.
//!
//! Service order is declaration order (auxiliary services first, the
//! application last). Environment maps are sorted by key.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::entities::ApplicationSpec;
use crate::domain::value_objects::{HostLayout, APP_SERVICE};

/// Keys of a service entry the renderer owns; `extra` may not set them.
pub const RESERVED_SERVICE_KEYS: &[&str] = &[
    "build",
    "container_name",
    "depends_on",
    "environment",
    "expose",
    "image",
    "networks",
    "ports",
    "volumes",
];

/// Directory of the staged build context, relative to the manifest.
pub const CONTEXT_DIR: &str = "./context";

const RESTART_POLICY: &str = "unless-stopped";

#[derive(Debug, thiserror::Error)]
#[error("failed to render manifest: {0}")]
pub struct ManifestError(#[from] serde_yaml_ng::Error);

/// Map that serializes its entries in insertion order.
struct Ordered<V>(Vec<(String, V)>);

impl<V: Serialize> Serialize for Ordered<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct Empty {}

#[derive(Serialize)]
struct ExternalNetwork {
    external: bool,
}

#[derive(Serialize)]
struct BuildSection {
    context: String,
    dockerfile: String,
}

#[derive(Serialize)]
struct ServiceEntry<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<BuildSection>,
    container_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    restart: Option<&'static str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    environment: BTreeMap<&'a str, &'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    expose: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    networks: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<&'a str>,
    #[serde(flatten)]
    extra: BTreeMap<&'a str, &'a serde_yaml_ng::Value>,
}

#[derive(Serialize)]
struct ComposeFile<'a> {
    name: String,
    services: Ordered<ServiceEntry<'a>>,
    networks: Ordered<ExternalNetwork>,
    #[serde(skip_serializing_if = "is_empty_ordered")]
    volumes: Ordered<Empty>,
}

fn is_empty_ordered<V>(map: &Ordered<V>) -> bool {
    map.0.is_empty()
}

fn shared_network(layout: &HostLayout) -> Ordered<ExternalNetwork> {
    Ordered(vec![(
        layout.network().to_string(),
        ExternalNetwork { external: true },
    )])
}

/// Render the application's compose manifest.
///
/// The application's environment always carries `PORT` set to `port` unless
/// the application sets `PORT` itself.
pub fn render_manifest(
    spec: &ApplicationSpec,
    port: u16,
    layout: &HostLayout,
) -> Result<String, ManifestError> {
    let app = spec.name.as_str();
    let port_value = port.to_string();
    let mut services: Vec<(String, ServiceEntry<'_>)> = Vec::with_capacity(spec.services.len() + 1);

    for service in &spec.services {
        let restart = (!service.extra.contains_key("restart")).then_some(RESTART_POLICY);
        services.push((
            service.name.to_string(),
            ServiceEntry {
                image: Some(service.image.as_str()),
                build: None,
                container_name: layout.service_container(app, service.name.as_str()),
                restart,
                environment: service
                    .environment
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect(),
                expose: Vec::new(),
                ports: service.ports.iter().map(String::as_str).collect(),
                volumes: service.volumes.iter().map(ToString::to_string).collect(),
                networks: vec![layout.network()],
                depends_on: service.depends_on.iter().map(|d| d.as_str()).collect(),
                extra: service.extra.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            },
        ));
    }

    let mut environment: BTreeMap<&str, &str> = spec
        .environment
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    environment.entry("PORT").or_insert(port_value.as_str());

    services.push((
        APP_SERVICE.to_string(),
        ServiceEntry {
            image: None,
            build: Some(BuildSection {
                context: CONTEXT_DIR.to_string(),
                dockerfile: spec.dockerfile.clone(),
            }),
            container_name: layout.app_container(app),
            restart: Some(RESTART_POLICY),
            environment,
            expose: vec![port_value.clone()],
            ports: Vec::new(),
            volumes: Vec::new(),
            networks: vec![layout.network()],
            depends_on: spec.services.iter().map(|s| s.name.as_str()).collect(),
            extra: BTreeMap::new(),
        },
    ));

    let compose = ComposeFile {
        name: app.to_string(),
        services: Ordered(services),
        networks: shared_network(layout),
        volumes: Ordered(
            spec.named_volumes()
                .into_iter()
                .map(|v| (v.to_string(), Empty {}))
                .collect(),
        ),
    };

    Ok(serde_yaml_ng::to_string(&compose)?)
}

/// Proxy ports: HTTP, HTTPS, and HTTP/3 over UDP.
pub const PROXY_PORTS: &[&str] = &["80:80", "443:443", "443:443/udp"];

/// Render the reverse proxy's compose manifest.
///
/// The whole proxy directory is mounted so that replacing the routing
/// document by rename is visible inside the container.
pub fn render_proxy_manifest(layout: &HostLayout, image: &str) -> Result<String, ManifestError> {
    let service = ServiceEntry {
        image: Some(image),
        build: None,
        container_name: layout.proxy_container(),
        restart: Some(RESTART_POLICY),
        environment: BTreeMap::new(),
        expose: Vec::new(),
        ports: PROXY_PORTS.to_vec(),
        volumes: vec![
            format!("{}:/etc/caddy", layout.proxy_dir()),
            "caddy_data:/data".to_string(),
            "caddy_config:/config".to_string(),
        ],
        networks: vec![layout.network()],
        depends_on: Vec::new(),
        extra: BTreeMap::new(),
    };

    let compose = ComposeFile {
        name: layout.proxy_project(),
        services: Ordered(vec![("caddy".to_string(), service)]),
        networks: shared_network(layout),
        volumes: Ordered(vec![
            ("caddy_data".to_string(), Empty {}),
            ("caddy_config".to_string(), Empty {}),
        ]),
    };

    Ok(serde_yaml_ng::to_string(&compose)?)
}
