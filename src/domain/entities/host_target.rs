//! Host target entity - how to reach the one host a session converges

use std::path::PathBuf;

/// Access parameters for the target host.
///
/// Built once per session from the validated settings and never mutated
/// afterwards; executors take it by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    /// IP address or hostname
    pub address: String,
    /// Login user
    pub user: String,
    /// Private key used for authentication
    pub key_path: PathBuf,
    /// SSH port
    pub port: u16,
    /// Contact address for certificate issuance, if configured
    pub acme_email: Option<String>,
}

impl HostTarget {
    /// `user@address`, the form ssh and scp expect.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.address)
    }

    /// Whether commands need privilege escalation to touch system state.
    pub fn needs_sudo(&self) -> bool {
        self.user != "root"
    }
}
