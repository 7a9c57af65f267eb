//! Host Layout Value Object
//!
//! Names every per-host singleton the engine manages: the base directory, the
//! shared network, the proxy container, and the per-application namespaces.
//! One `HostLayout` is built per session from the engine configuration and
//! passed to every use case; nothing here is process-global.
//!
//! Remote paths are plain `String`s because they are always POSIX paths on the
//! target host, whatever the local platform is.

/// Default on-host root of everything the engine owns.
pub const DEFAULT_BASE_DIR: &str = "/opt/docklift";

/// Default name of the shared container network.
pub const DEFAULT_NETWORK: &str = "docklift";

/// Suffix of the application's own service and container.
pub const APP_SERVICE: &str = "app";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLayout {
    base_dir: String,
    network: String,
}

impl HostLayout {
    pub fn new(base_dir: impl Into<String>, network: impl Into<String>) -> Self {
        let base_dir: String = base_dir.into();
        let trimmed = base_dir.trim_end_matches('/');
        Self {
            base_dir: if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            },
            network: network.into(),
        }
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    // === proxy ===

    pub fn proxy_dir(&self) -> String {
        format!("{}/caddy", self.base_dir)
    }

    pub fn routing_document(&self) -> String {
        format!("{}/Caddyfile", self.proxy_dir())
    }

    pub fn proxy_manifest(&self) -> String {
        format!("{}/docker-compose.yml", self.proxy_dir())
    }

    pub fn proxy_project(&self) -> String {
        format!("{}-proxy", self.network)
    }

    pub fn proxy_container(&self) -> String {
        format!("{}-caddy", self.network)
    }

    /// Path of the routing document as seen from inside the proxy container.
    pub fn proxy_routing_document(&self) -> &'static str {
        "/etc/caddy/Caddyfile"
    }

    // === host lock ===

    pub fn lock_dir(&self) -> String {
        format!("{}/.lock", self.base_dir)
    }

    pub fn lock_owner_file(&self) -> String {
        format!("{}/owner", self.lock_dir())
    }

    // === applications ===

    pub fn apps_dir(&self) -> String {
        format!("{}/apps", self.base_dir)
    }

    pub fn app_dir(&self, app: &str) -> String {
        format!("{}/{}", self.apps_dir(), app)
    }

    pub fn app_context_dir(&self, app: &str) -> String {
        format!("{}/context", self.app_dir(app))
    }

    pub fn app_staging_dir(&self, app: &str) -> String {
        format!("{}/context.new", self.app_dir(app))
    }

    pub fn app_archive(&self, app: &str) -> String {
        format!("{}/context.tar.gz", self.app_dir(app))
    }

    pub fn app_manifest(&self, app: &str) -> String {
        format!("{}/docker-compose.yml", self.app_dir(app))
    }

    /// Container name of an application's own service.
    pub fn app_container(&self, app: &str) -> String {
        self.service_container(app, APP_SERVICE)
    }

    /// Container name of any service belonging to an application.
    pub fn service_container(&self, app: &str, service: &str) -> String {
        format!("{}-{}", app, service)
    }

    /// Address the proxy forwards to for an application.
    pub fn upstream(&self, app: &str, port: u16) -> String {
        format!("{}:{}", self.app_container(app), port)
    }
}

impl Default for HostLayout {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIR, DEFAULT_NETWORK)
    }
}
