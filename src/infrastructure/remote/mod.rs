//! Remote host access

mod ssh;

pub use ssh::SshExecutor;
