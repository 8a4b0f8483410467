//! Login profile - who is using the editor on this machine
//!
//! There is no real authentication: logging in just records a username so
//! uploads, analyses and change logs are attributed to it. The record lives in
//! the user's local data directory and is shared by every session.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Username used when nobody is logged in
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRecord {
    pub username: String,
    pub login_time: DateTime<Utc>,
}

/// Reads and writes the login record
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store at the default location (e.g. ~/.local/share/redline/login.json)
    pub fn new() -> Result<Self> {
        let base = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("Could not determine local data directory"))?;
        Ok(Self::at(base.join("redline").join("login.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn login(&self, username: &str) -> Result<LoginRecord> {
        let username = username.trim();
        if username.is_empty() {
            return Err(anyhow!("Username cannot be empty"));
        }

        let record = LoginRecord {
            username: username.to_string(),
            login_time: Utc::now(),
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&record)?)
            .with_context(|| format!("Failed to write login record: {}", self.path.display()))?;
        Ok(record)
    }

    /// Returns whether anyone was logged in
    pub fn logout(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove login record: {}", self.path.display()))?;
        Ok(true)
    }

    pub fn current(&self) -> Result<Option<LoginRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt login record: {}", self.path.display()))?;
        Ok(Some(record))
    }

    /// Logged-in username, or `anonymous`
    pub fn username(&self) -> String {
        match self.current() {
            Ok(Some(record)) => record.username,
            Ok(None) => ANONYMOUS.to_string(),
            Err(e) => {
                tracing::warn!("Ignoring login record: {e:#}");
                ANONYMOUS.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn login_then_logout() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::at(dir.path().join("redline").join("login.json"));

        assert_eq!(store.username(), ANONYMOUS);

        let record = store.login("  carol ").unwrap();
        assert_eq!(record.username, "carol");
        assert_eq!(store.current().unwrap(), Some(record));
        assert_eq!(store.username(), "carol");

        assert!(store.logout().unwrap());
        assert!(!store.logout().unwrap());
        assert_eq!(store.username(), ANONYMOUS);
    }

    #[test]
    fn blank_username_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::at(dir.path().join("login.json"));
        assert!(store.login("   ").is_err());
        assert!(store.current().unwrap().is_none());
    }

    #[test]
    fn corrupt_record_falls_back_to_anonymous() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("login.json");
        fs::write(&path, "garbage").unwrap();
        let store = ProfileStore::at(&path);
        assert!(store.current().is_err());
        assert_eq!(store.username(), ANONYMOUS);
    }
}
