//! Build-context archiver
//!
//! Walks the context with the `ignore` crate (honouring `.gitignore` and the
//! root `.dockerignore`; `.git` is never shipped), then packs the file list
//! with the system `tar` into a gzip archive. The list is NUL-separated so
//! any file name survives.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use ignore::WalkBuilder;

use crate::domain::ports::{ContextPackager, PackageError, PackagedContext};
use crate::domain::value_objects::ContentDigest;

use super::dockerignore::DockerIgnore;

const ARCHIVE_NAME: &str = "context.tar.gz";
const FILE_LIST_NAME: &str = "context.files";

/// Packages build contexts with the system `tar`.
pub struct ContextArchiver {
    tar_program: String,
}

impl ContextArchiver {
    pub fn new() -> Self {
        Self {
            tar_program: "tar".to_string(),
        }
    }

    pub fn with_tar(program: impl Into<String>) -> Self {
        Self {
            tar_program: program.into(),
        }
    }

    /// Files to ship, relative to `context`, sorted.
    pub fn collect_files(context: &Path) -> Result<Vec<PathBuf>, PackageError> {
        if !context.is_dir() {
            return Err(PackageError::MissingContext(context.to_path_buf()));
        }
        let dockerignore =
            DockerIgnore::load(context).map_err(|e| PackageError::Walk(e.to_string()))?;

        let root = context.to_path_buf();
        let walker = WalkBuilder::new(context)
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(false)
            .require_git(false)
            .parents(false)
            .filter_entry(move |entry| {
                if entry.file_name() == ".git" {
                    return false;
                }
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    return true;
                };
                if relative.as_os_str().is_empty() {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !dockerignore.is_ignored(relative, is_dir)
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| PackageError::Walk(e.to_string()))?;
            let is_file = entry
                .file_type()
                .is_some_and(|t| t.is_file() || t.is_symlink());
            if !is_file {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(context) {
                files.push(relative.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Default for ContextArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextPackager for ContextArchiver {
    fn package(&self, context: &Path, out_dir: &Path) -> Result<PackagedContext, PackageError> {
        let files = Self::collect_files(context)?;

        let list_path = out_dir.join(FILE_LIST_NAME);
        let io = |path: &Path| {
            let path = path.to_path_buf();
            move |source| PackageError::Io { path, source }
        };
        let mut list = fs::File::create(&list_path).map_err(io(&list_path))?;
        for file in &files {
            list.write_all(file.to_string_lossy().as_bytes())
                .and_then(|_| list.write_all(b"\0"))
                .map_err(io(&list_path))?;
        }
        list.flush().map_err(io(&list_path))?;

        let archive = out_dir.join(ARCHIVE_NAME);
        let output = Command::new(&self.tar_program)
            .arg("--null")
            .arg("-czf")
            .arg(&archive)
            .arg("-C")
            .arg(context)
            .arg("-T")
            .arg(&list_path)
            .output()
            .map_err(|e| PackageError::Archiver(format!("{}: {}", self.tar_program, e)))?;
        if !output.status.success() {
            return Err(PackageError::Archiver(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let bytes = fs::metadata(&archive).map_err(io(&archive))?.len();
        let digest = ContentDigest::from_file(&archive).map_err(io(&archive))?;

        Ok(PackagedContext {
            archive,
            digest,
            file_count: files.len(),
            bytes,
        })
    }
}
