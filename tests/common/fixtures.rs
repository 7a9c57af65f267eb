//! Test fixtures - application documents used across tests.

#![allow(dead_code)]

/// Minimal valid document; `{key}` and `{port}` lines are filled in by
/// [`document`].
pub fn document(name: &str, key: &str, port: Option<u16>) -> String {
    let port = port
        .map(|p| format!("  port: {}\n", p))
        .unwrap_or_default();
    format!(
        "vps:\n  host: 203.0.113.7\n  user: root\n  ssh_key_path: {key}\napplication:\n  name: {name}\n  domain: {name}.example.com\n{port}"
    )
}

/// A document with an auxiliary database and an unknown key.
pub fn document_with_database(name: &str, key: &str) -> String {
    format!(
        "{}  environment:\n    NODE_ENV: production\n  dependencies:\n    postgres:\n      image: postgres:16\n      volumes:\n        - pgdata:/var/lib/postgresql/data\n  colour: blue\n",
        document(name, key, Some(3000))
    )
}
