//! `.dockerignore` patterns
//!
//! Matched with the `ignore` crate's gitignore engine. Docker anchors every
//! pattern at the context root, so `*.log` only matches top-level files and
//! `**/*.log` is needed for any depth; patterns are rewritten accordingly
//! before they reach the matcher.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use thiserror::Error;

/// File name read from the context root
pub const DOCKERIGNORE: &str = ".dockerignore";

/// Maximum file size for `.dockerignore` (64KB)
const MAX_FILE_SIZE: u64 = 65536;

#[derive(Debug, Error)]
pub enum DockerIgnoreError {
    #[error("{} exceeds {}KB ({size} bytes)", path.display(), MAX_FILE_SIZE / 1024)]
    FileTooLarge { path: PathBuf, size: u64 },

    #[error("invalid pattern at {}:{line}: '{pattern}': {message}", path.display())]
    InvalidPattern {
        path: PathBuf,
        line: usize,
        pattern: String,
        message: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Patterns of one context's `.dockerignore`.
#[derive(Debug)]
pub struct DockerIgnore {
    matcher: Gitignore,
    pattern_count: usize,
}

impl DockerIgnore {
    /// Matches nothing.
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
            pattern_count: 0,
        }
    }

    /// Load `<context>/.dockerignore`; a missing file means no patterns.
    pub fn load(context: &Path) -> Result<Self, DockerIgnoreError> {
        let path = context.join(DOCKERIGNORE);
        if !path.is_file() {
            return Ok(Self::empty());
        }

        let io = |source| DockerIgnoreError::Io {
            path: path.clone(),
            source,
        };
        let size = fs::metadata(&path).map_err(io)?.len();
        if size > MAX_FILE_SIZE {
            return Err(DockerIgnoreError::FileTooLarge { path, size });
        }
        let content = fs::read_to_string(&path).map_err(io)?;
        Self::from_content(context, &path, &content)
    }

    pub fn from_content(
        root: &Path,
        source: &Path,
        content: &str,
    ) -> Result<Self, DockerIgnoreError> {
        let mut builder = GitignoreBuilder::new(root);
        let mut pattern_count = 0;

        for (index, line) in content.lines().enumerate() {
            let Some(pattern) = anchor(line) else {
                continue;
            };
            pattern_count += 1;
            builder
                .add_line(Some(source.to_path_buf()), &pattern)
                .map_err(|e| DockerIgnoreError::InvalidPattern {
                    path: source.to_path_buf(),
                    line: index + 1,
                    pattern: line.trim().to_string(),
                    message: e.to_string(),
                })?;
        }

        let matcher = builder
            .build()
            .map_err(|e| DockerIgnoreError::InvalidPattern {
                path: source.to_path_buf(),
                line: 0,
                pattern: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self {
            matcher,
            pattern_count,
        })
    }

    /// Whether `rel_path` (relative to the context root) is excluded.
    pub fn is_ignored(&self, rel_path: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }
}

/// Rewrite one `.dockerignore` line into an equivalent root-anchored
/// gitignore line; `None` for blanks and comments.
fn anchor(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (negate, body) = match trimmed.strip_prefix('!') {
        Some(rest) => ("!", rest.trim()),
        None => ("", trimmed),
    };
    let body = body.trim_start_matches("./").trim_start_matches('/');
    Some(format!("{negate}/{body}"))
}
