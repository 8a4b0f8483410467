use crate::session::EditorSession;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Persistence for the editor session between CLI invocations
pub trait SessionStore {
    fn load(&self) -> Result<Option<EditorSession>>;
    fn save(&self, session: &EditorSession) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Session kept as pretty-printed JSON in a single file
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<EditorSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", self.path.display()))?;
        Ok(Some(session))
    }

    fn save(&self, session: &EditorSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Store that never remembers anything
pub struct NoOpSessionStore;

impl SessionStore for NoOpSessionStore {
    fn load(&self) -> Result<Option<EditorSession>> {
        Ok(None)
    }

    fn save(&self, _session: &EditorSession) -> Result<()> {
        Ok(()) // No-op
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_creates_parent_dirs_and_loads_back() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join(".redline").join("session.json"));

        let mut session = EditorSession::new("bob");
        session.load_document("memo", "Hello there");
        store.save(&session).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.username, "bob");
        assert_eq!(loaded.document_name.as_deref(), Some("memo"));
        assert_eq!(loaded.markup(), "Hello there");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let err = FileSessionStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse session file"));
    }

    #[test]
    fn noop_store_forgets() {
        let store = NoOpSessionStore;
        store.save(&EditorSession::new("x")).unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
