//! ContextPackager port - turns a local build context into one archive

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::value_objects::ContentDigest;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("build context {} is not a directory", .0.display())]
    MissingContext(PathBuf),

    #[error("failed to walk build context: {0}")]
    Walk(String),

    #[error("failed to write archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archiver failed: {0}")]
    Archiver(String),
}

/// A packed build context ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedContext {
    pub archive: PathBuf,
    pub digest: ContentDigest,
    pub file_count: usize,
    pub bytes: u64,
}

pub trait ContextPackager {
    /// Pack `context` into an archive inside `out_dir`.
    fn package(&self, context: &Path, out_dir: &Path) -> Result<PackagedContext, PackageError>;
}

impl<T: ContextPackager + ?Sized> ContextPackager for &T {
    fn package(&self, context: &Path, out_dir: &Path) -> Result<PackagedContext, PackageError> {
        (**self).package(context, out_dir)
    }
}
