use crate::types::AuthSession;
use crate::{Result, Top5Error};
use std::fs;
use std::path::{Path, PathBuf};

/// Session persistence for keeping the login across runs.
///
/// The session is stored as JSON. By default it lives in the XDG data
/// directory: `~/.local/share/top5-client/session.json`.
#[derive(Debug, Clone)]
pub struct SessionPersistence {
    path: PathBuf,
}

impl SessionPersistence {
    /// Store the session at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the session in the XDG data directory.
    ///
    /// Returns an error if the data directory cannot be determined.
    pub fn default_location() -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            Top5Error::Storage("Cannot determine XDG data directory".to_string())
        })?;
        Ok(Self::new(data_dir.join("top5-client").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save a session, creating parent directories as needed.
    pub fn save(&self, session: &AuthSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Top5Error::Storage(format!("Failed to create session directory: {e}"))
            })?;
        }

        let session_json = session
            .to_json()
            .map_err(|e| Top5Error::Storage(format!("Failed to serialize session: {e}")))?;

        fs::write(&self.path, session_json)
            .map_err(|e| Top5Error::Storage(format!("Failed to write session file: {e}")))?;

        log::debug!("Session saved to: {}", self.path.display());
        Ok(())
    }

    /// Load the saved session, or `None` if nothing was saved.
    pub fn load(&self) -> Result<Option<AuthSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let session_json = fs::read_to_string(&self.path)
            .map_err(|e| Top5Error::Storage(format!("Failed to read session file: {e}")))?;

        let session = AuthSession::from_json(&session_json)
            .map_err(|e| Top5Error::Storage(format!("Failed to parse session JSON: {e}")))?;

        log::debug!("Session loaded from: {}", self.path.display());
        Ok(Some(session))
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove the saved session, if any.
    pub fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| Top5Error::Storage(format!("Failed to remove session file: {e}")))?;
            log::debug!("Session removed from: {}", self.path.display());
        }
        Ok(())
    }
}
