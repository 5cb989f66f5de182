use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::models::User;

/// The signed-in user. Commands receive it read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }
}

/// Keeps the session on disk between invocations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Option<Session>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        let session = serde_json::from_str(&raw)?;
        Ok(Some(session))
    }

    pub fn establish(&self, user: User) -> Result<Session> {
        let session = Session {
            user,
            established_at: Utc::now(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let body = serde_json::to_string_pretty(&session)?;
        std::fs::write(&self.path, body).map_err(|err| self.io_error(err))?;
        tracing::info!(user_id = %session.user.id, "session established");
        Ok(session)
    }

    /// Returns whether a session was present.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("session cleared");
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::Session {
            path: self.path.display().to_string(),
            source,
        }
    }
}

pub fn require(session: Option<&Session>) -> Result<&Session> {
    session.ok_or_else(|| {
        CatalogError::NotAuthenticated("You must be logged in to continue.".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "marisol.okafor@learnsphere.dev".to_string(),
        }
    }

    #[test]
    fn load_without_file_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn establish_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        let user = user();
        let session = store.establish(user.clone()).unwrap();
        let loaded = store.load().unwrap().expect("session present");
        assert_eq!(loaded, session);
        assert_eq!(loaded.user_id(), user.id);
    }

    #[test]
    fn clear_removes_session_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.establish(user()).unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let store = SessionStore::new(path);
        assert!(matches!(store.load(), Err(CatalogError::SessionFormat(_))));
    }

    #[test]
    fn require_rejects_missing_session() {
        assert!(matches!(require(None), Err(CatalogError::NotAuthenticated(_))));
    }
}
