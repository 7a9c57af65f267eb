//! Build-context packaging

mod archiver;
mod dockerignore;

pub use archiver::ContextArchiver;
pub use dockerignore::{DockerIgnore, DockerIgnoreError, DOCKERIGNORE};
