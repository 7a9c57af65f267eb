//! YAML Spec Repository
//!
//! Application documents (`docklift.yml`) on the local file system. A
//! workspace is a directory whose immediate subdirectories are application
//! roots; `<workspace>/.docklift.lock` serialises port assignment.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;

use crate::config::{validate, ConfigWarning, SettingsDocument, DOCUMENT_FILE};
use crate::domain::entities::Settings;
use crate::domain::ports::{SpecError, SpecRepository};

/// Lock file name inside a workspace
pub const WORKSPACE_LOCK: &str = ".docklift.lock";

/// Exclusive lock on a workspace; released on drop.
pub struct WorkspaceLock {
    file: fs::File,
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[derive(Default)]
pub struct YamlSpecRepository {
    warnings: Mutex<Vec<ConfigWarning>>,
}

impl YamlSpecRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown-key warnings collected by loads so far.
    pub fn take_warnings(&self) -> Vec<ConfigWarning> {
        self.warnings
            .lock()
            .map(|mut w| std::mem::take(&mut *w))
            .unwrap_or_default()
    }

    fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SpecError {
        let path = path.to_path_buf();
        move |source| SpecError::Io { path, source }
    }

    fn parse(path: &Path, content: &str) -> Result<(SettingsDocument, Vec<ConfigWarning>), SpecError> {
        SettingsDocument::parse_with_warnings(content, path).map_err(|e| SpecError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl SpecRepository for YamlSpecRepository {
    type Guard = WorkspaceLock;

    fn load_document(&self, path: &Path) -> Result<SettingsDocument, SpecError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SpecError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(Self::io_error(path)(e)),
        };
        let (document, warnings) = Self::parse(path, &content)?;
        if let Ok(mut collected) = self.warnings.lock() {
            collected.extend(warnings);
        }
        Ok(document)
    }

    fn load(&self, path: &Path) -> Result<Settings, SpecError> {
        let document = self.load_document(path)?;
        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        validate(&document, root).map_err(|errors| SpecError::Invalid {
            path: path.to_path_buf(),
            errors,
        })
    }

    fn save_document(&self, path: &Path, document: &SettingsDocument) -> Result<(), SpecError> {
        let content = document.to_yaml().map_err(|e| SpecError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(Self::io_error(&dir))?;

        // Write beside the target, then rename over it.
        let mut staged = tempfile::NamedTempFile::new_in(&dir).map_err(Self::io_error(&dir))?;
        staged
            .write_all(content.as_bytes())
            .and_then(|_| staged.flush())
            .map_err(Self::io_error(path))?;
        staged
            .persist(path)
            .map_err(|e| Self::io_error(path)(e.error))?;
        Ok(())
    }

    fn assigned_ports(&self, workspace: &Path, exclude: &str) -> Result<BTreeSet<u16>, SpecError> {
        let mut ports = BTreeSet::new();
        let entries = match fs::read_dir(workspace) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ports),
            Err(e) => return Err(Self::io_error(workspace)(e)),
        };

        for entry in entries {
            let entry = entry.map_err(Self::io_error(workspace))?;
            let candidate = entry.path().join(DOCUMENT_FILE);
            if !candidate.is_file() {
                continue;
            }
            let content = fs::read_to_string(&candidate).map_err(Self::io_error(&candidate))?;
            // A sibling we cannot read could hold any port; refuse to guess.
            let (document, _) = Self::parse(&candidate, &content)?;
            if document.application.name == exclude {
                continue;
            }
            if let Some(port) = document.application.port {
                ports.insert(port);
            }
        }
        Ok(ports)
    }

    fn lock_workspace(&self, workspace: &Path) -> Result<WorkspaceLock, SpecError> {
        fs::create_dir_all(workspace).map_err(Self::io_error(workspace))?;
        let lock_path = workspace.join(WORKSPACE_LOCK);
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(Self::io_error(&lock_path))?;
        file.lock_exclusive().map_err(Self::io_error(&lock_path))?;
        Ok(WorkspaceLock { file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn document(name: &str, port: Option<u16>) -> String {
        let port = port.map(|p| format!("  port: {p}\n")).unwrap_or_default();
        format!(
            "vps:\n  host: 203.0.113.7\n  user: root\n  ssh_key_path: ~/.ssh/id_ed25519\napplication:\n  name: {name}\n  domain: {name}.example.com\n{port}"
        )
    }

    fn put(workspace: &Path, app: &str, content: &str) -> PathBuf {
        let dir = workspace.join(app);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(DOCUMENT_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_document_is_not_found() {
        let dir = tempdir().unwrap();
        let err = YamlSpecRepository::new()
            .load_document(&dir.path().join(DOCUMENT_FILE))
            .unwrap_err();
        assert!(matches!(err, SpecError::NotFound(_)));
    }

    #[test]
    fn assigned_ports_skip_excluded_and_portless() {
        let dir = tempdir().unwrap();
        put(dir.path(), "api", &document("api", Some(3000)));
        put(dir.path(), "web", &document("web", Some(3001)));
        put(dir.path(), "worker", &document("worker", None));
        fs::create_dir_all(dir.path().join("notes")).unwrap();

        let repo = YamlSpecRepository::new();
        let all = repo.assigned_ports(dir.path(), "").unwrap();
        let others = repo.assigned_ports(dir.path(), "api").unwrap();

        assert_eq!(all.into_iter().collect::<Vec<_>>(), vec![3000, 3001]);
        assert_eq!(others.into_iter().collect::<Vec<_>>(), vec![3001]);
    }

    #[test]
    fn unreadable_sibling_blocks_allocation() {
        let dir = tempdir().unwrap();
        put(dir.path(), "broken", "vps: [unterminated");

        let err = YamlSpecRepository::new()
            .assigned_ports(dir.path(), "api")
            .unwrap_err();
        assert!(matches!(err, SpecError::Parse { .. }));
    }

    #[test]
    fn save_then_load_document() {
        let dir = tempdir().unwrap();
        let path = put(dir.path(), "api", &document("api", None));
        let repo = YamlSpecRepository::new();
        let mut doc = repo.load_document(&path).unwrap();
        doc.application.port = Some(3004);

        repo.save_document(&path, &doc).unwrap();

        assert_eq!(repo.load_document(&path).unwrap().application.port, Some(3004));
    }

    #[test]
    fn unknown_keys_are_collected_as_warnings() {
        let dir = tempdir().unwrap();
        let path = put(dir.path(), "api", &format!("{}  colour: blue\n", document("api", None)));
        let repo = YamlSpecRepository::new();

        repo.load_document(&path).unwrap();

        let warnings = repo.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key, "colour");
        assert!(repo.take_warnings().is_empty());
    }

    #[test]
    fn workspace_lock_creates_lock_file() {
        let dir = tempdir().unwrap();
        let repo = YamlSpecRepository::new();
        {
            let _guard = repo.lock_workspace(dir.path()).unwrap();
            assert!(dir.path().join(WORKSPACE_LOCK).is_file());
        }
        // released on drop, so it can be taken again
        let _again = repo.lock_workspace(dir.path()).unwrap();
    }
}
