//! Host command builder
//!
//! Every shell command the engine sends to the target host is spelled here,
//! so use cases read as a sequence of intents and tests can assert on exact
//! command text. Arguments are quoted only when they contain characters that
//! are not shell-safe.

/// Quote a single shell word.
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '%' | '+' | '=' | ',')
        });
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

// === container runtime ===

pub const RUNTIME_BINARY: &str = "docker";

/// Install the runtime through the distribution-agnostic convenience script.
pub fn install_runtime() -> String {
    "curl -fsSL https://get.docker.com | sh".to_string()
}

pub fn runtime_info() -> String {
    "docker info --format '{{.ServerVersion}}'".to_string()
}

pub fn compose_version() -> String {
    "docker compose version".to_string()
}

pub fn network_inspect(network: &str) -> String {
    format!("docker network inspect {}", quote(network))
}

pub fn network_create(network: &str) -> String {
    format!("docker network create {}", quote(network))
}

pub fn container_running(container: &str) -> String {
    format!(
        "docker inspect --format '{{{{.State.Running}}}}' {}",
        quote(container)
    )
}

/// `docker compose` scoped to one project and manifest.
pub fn compose(project: &str, manifest: &str, args: &str) -> String {
    format!(
        "docker compose -p {} -f {} {}",
        quote(project),
        quote(manifest),
        args
    )
}

/// `docker compose` scoped to a project only, for when the manifest is gone.
pub fn compose_project(project: &str, args: &str) -> String {
    format!("docker compose -p {} {}", quote(project), args)
}

pub fn compose_ps(project: &str) -> String {
    compose_project(
        project,
        "ps --all --format '{{.Name}}\t{{.State}}\t{{.Status}}'",
    )
}

// === files ===

pub fn make_dir(path: &str) -> String {
    format!("mkdir -p {}", quote(path))
}

pub fn read_file(path: &str) -> String {
    format!("cat {}", quote(path))
}

pub fn move_file(from: &str, to: &str) -> String {
    format!("mv -f {} {}", quote(from), quote(to))
}

pub fn remove_path(path: &str) -> String {
    format!("rm -rf {}", quote(path))
}

/// Unpack an uploaded archive into a fresh staging directory and swap it in
/// place of the previous context.
pub fn unpack_context(archive: &str, staging: &str, context: &str) -> String {
    format!(
        "rm -rf {staging} && mkdir -p {staging} && tar -xzf {archive} -C {staging} && rm -rf {context} && mv {staging} {context} && rm -f {archive}",
        archive = quote(archive),
        staging = quote(staging),
        context = quote(context),
    )
}

// === proxy ===

pub fn proxy_reload(container: &str, config_path: &str) -> String {
    format!(
        "docker exec {} caddy reload --config {} --adapter caddyfile",
        quote(container),
        quote(config_path)
    )
}

/// One reachability check from inside the shared network. Prints the HTTP
/// status code, `000` when nothing answered.
pub fn probe(network: &str, image: &str, url: &str, timeout_secs: u64) -> String {
    format!(
        "docker run --rm --network {} {} -s -o /dev/null -w '%{{http_code}}' --max-time {} {}",
        quote(network),
        quote(image),
        timeout_secs,
        quote(url)
    )
}

// === host lock ===

/// Atomic `mkdir` of the lock directory followed by recording the owner.
pub fn lock_acquire(base_dir: &str, lock_dir: &str, owner_file: &str, owner: &str) -> String {
    format!(
        "mkdir -p {} && mkdir {} && printf '%s\\n' {} > {}",
        quote(base_dir),
        quote(lock_dir),
        quote(owner),
        quote(owner_file)
    )
}

/// Move an abandoned lock aside and delete it. `mv` of a directory is
/// atomic, so of two runs taking over the same lock only one succeeds.
pub fn lock_take_over(lock_dir: &str, aside: &str) -> String {
    format!(
        "mv {} {} && rm -rf {}",
        quote(lock_dir),
        quote(aside),
        quote(aside)
    )
}
