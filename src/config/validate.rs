//! Application document validation
//!
//! Every problem in a document is collected and reported together; nothing
//! is partially accepted.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::domain::entities::{ApplicationSpec, AuxiliaryService, HostTarget, Settings};
use crate::domain::services::RESERVED_SERVICE_KEYS;
use crate::domain::value_objects::{AppName, DomainName, VolumeSpec, APP_SERVICE};

use super::document::{DependencySection, SettingsDocument};

/// All problems found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a document; relative paths resolve against `document_dir`.
pub fn validate(
    document: &SettingsDocument,
    document_dir: &Path,
) -> Result<Settings, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let host = validate_host(document, document_dir, &mut errors);
    let application = validate_application(document, document_dir, &mut errors);

    match (host, application) {
        (Some(host), Some(application)) if errors.is_empty() => Ok(Settings { host, application }),
        _ => Err(errors),
    }
}

fn validate_host(
    document: &SettingsDocument,
    document_dir: &Path,
    errors: &mut ValidationErrors,
) -> Option<HostTarget> {
    let vps = &document.vps;
    let address = vps.host.trim();
    if address.is_empty() || address.chars().any(char::is_whitespace) {
        errors.push(format!("vps.host: '{}' is not a host name or address", vps.host));
    }
    let user = vps.user.trim();
    if user.is_empty() || user.chars().any(char::is_whitespace) {
        errors.push(format!("vps.user: '{}' is not a valid user name", vps.user));
    }
    if vps.port == 0 {
        errors.push("vps.port: must be between 1 and 65535");
    }
    if let Some(email) = &vps.email {
        if !is_plausible_email(email) {
            errors.push(format!("vps.email: '{}' is not an email address", email));
        }
    }

    let key_path = resolve(&expand_tilde(&vps.ssh_key_path), document_dir);
    if !key_path.is_file() {
        errors.push(format!("vps.ssh_key_path: SSH key not found at {}", vps.ssh_key_path));
    }

    Some(HostTarget {
        address: address.to_string(),
        user: user.to_string(),
        key_path,
        port: vps.port,
        acme_email: vps.email.clone(),
    })
}

fn validate_application(
    document: &SettingsDocument,
    document_dir: &Path,
    errors: &mut ValidationErrors,
) -> Option<ApplicationSpec> {
    let app = &document.application;

    let name = AppName::parse(&app.name)
        .map_err(|e| errors.push(format!("application.name: '{}' {}", app.name, e)))
        .ok();
    let domain = DomainName::parse(&app.domain)
        .map_err(|e| errors.push(format!("application.domain: '{}' {}", app.domain, e)))
        .ok();

    if app.port == Some(0) {
        errors.push("application.port: must be between 1 and 65535");
    }

    let context = resolve(&expand_tilde(&app.context), document_dir);
    let context_ok = context.is_dir();
    if !context_ok {
        errors.push(format!(
            "application.context: directory {} does not exist",
            context.display()
        ));
    }

    let dockerfile = normalize_relative(&app.dockerfile);
    match &dockerfile {
        None => errors.push(format!(
            "application.dockerfile: '{}' must be a relative path inside the build context",
            app.dockerfile
        )),
        Some(relative) if context_ok && !context.join(relative).is_file() => {
            errors.push(format!(
                "application.dockerfile: {} not found in {}",
                relative,
                context.display()
            ))
        }
        Some(_) => {}
    }

    let environment = validate_environment("application.environment", &app.environment, errors);

    let mut services = Vec::new();
    for (service_name, section) in app.dependencies.iter() {
        if let Some(service) = validate_dependency(service_name, section, document, errors) {
            services.push(service);
        }
    }

    let mut spec = ApplicationSpec::new(name?, domain?, context);
    spec.dockerfile = dockerfile?;
    spec.port = app.port;
    spec.environment = environment;
    spec.services = services;
    Some(spec)
}

fn validate_dependency(
    raw_name: &str,
    section: &DependencySection,
    document: &SettingsDocument,
    errors: &mut ValidationErrors,
) -> Option<AuxiliaryService> {
    let field = format!("application.dependencies.{raw_name}");
    let before = errors.len();

    let name = match AppName::parse(raw_name) {
        Ok(name) if name.as_str() == APP_SERVICE => {
            errors.push(format!("{field}: the name '{APP_SERVICE}' is reserved for the application"));
            None
        }
        Ok(name) => Some(name),
        Err(e) => {
            errors.push(format!("{field}: '{raw_name}' {e}"));
            None
        }
    };

    if section.image.trim().is_empty() {
        errors.push(format!("{field}.image: must not be empty"));
    }

    let environment = validate_environment(&format!("{field}.environment"), &section.environment, errors);

    let mut volumes = Vec::new();
    for raw in &section.volumes {
        match VolumeSpec::parse(raw) {
            Ok(volume) => volumes.push(volume),
            Err(e) => errors.push(format!("{field}.volumes: {e}")),
        }
    }

    for port in &section.ports {
        if port.trim().is_empty() {
            errors.push(format!("{field}.ports: empty port mapping"));
        }
    }

    let mut depends_on = Vec::new();
    for dependency in &section.depends_on {
        if dependency == raw_name {
            errors.push(format!("{field}.depends_on: a service cannot depend on itself"));
            continue;
        }
        let declared = document
            .application
            .dependencies
            .iter()
            .any(|(other, _)| other == dependency);
        if !declared {
            errors.push(format!("{field}.depends_on: '{dependency}' is not a declared dependency"));
            continue;
        }
        if let Ok(dependency) = AppName::parse(dependency) {
            depends_on.push(dependency);
        }
    }

    for key in section.extra.keys() {
        if RESERVED_SERVICE_KEYS.contains(&key.as_str()) {
            errors.push(format!("{field}.extra: '{key}' is managed by docklift and cannot be overridden"));
        }
    }

    if errors.len() > before {
        return None;
    }

    let mut service = AuxiliaryService::new(name?, section.image.trim());
    service.environment = environment;
    service.volumes = volumes;
    service.ports = section.ports.iter().map(|p| p.trim().to_string()).collect();
    service.depends_on = depends_on;
    service.extra = section.extra.clone();
    Some(service)
}

fn validate_environment(
    field: &str,
    raw: &BTreeMap<String, serde_yaml_ng::Value>,
    errors: &mut ValidationErrors,
) -> BTreeMap<String, String> {
    let mut environment = BTreeMap::new();
    for (key, value) in raw {
        if !is_env_key(key) {
            errors.push(format!("{field}: '{key}' is not a valid variable name"));
            continue;
        }
        match scalar_to_string(value) {
            Some(value) => {
                environment.insert(key.clone(), value);
            }
            None => errors.push(format!("{field}.{key}: value must be a string, number or boolean")),
        }
    }
    environment
}

fn scalar_to_string(value: &serde_yaml_ng::Value) -> Option<String> {
    use serde_yaml_ng::Value;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn is_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Characters that would change the meaning of the routing document's
/// global options block, where the address is written verbatim.
const CADDYFILE_SPECIAL: &[char] = &['{', '}', '"', '\'', '`', '#', '\\'];

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !email
                    .chars()
                    .any(|c| c.is_whitespace() || CADDYFILE_SPECIAL.contains(&c))
        }
        None => false,
    }
}

/// `./Dockerfile` and `Dockerfile` are the same file; anything absolute or
/// climbing out of the context is rejected.
fn normalize_relative(raw: &str) -> Option<String> {
    let path = Path::new(raw.trim());
    let mut parts: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

fn resolve(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
