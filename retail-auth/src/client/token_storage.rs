use crate::common::StoredSession;
use crate::error::AuthError;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Durable home of the session between process runs
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, AuthError>;
    fn save(&self, session: &StoredSession) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Stores the session as JSON in a file readable only by the owner
pub struct FileSessionStorage {
    session_path: PathBuf,
}

impl FileSessionStorage {
    /// Uses `<cache dir>/retail-pos/session.json`
    pub fn new() -> Result<Self, AuthError> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::Configuration("Could not find cache directory".to_string()))?
            .join("retail-pos");
        Self::at(cache_dir.join("session.json"))
    }

    pub fn at(session_path: PathBuf) -> Result<Self, AuthError> {
        if let Some(dir) = session_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    AuthError::SessionStorage(format!("Failed to create session directory: {}", e))
                })?;
            }
        }

        Ok(Self { session_path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.session_path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<StoredSession>, AuthError> {
        if !self.session_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.session_path)
            .map_err(|e| AuthError::SessionStorage(format!("Failed to read session: {}", e)))?;

        let session: StoredSession = serde_json::from_str(&json)?;
        Ok(Some(session))
    }

    fn save(&self, session: &StoredSession) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(session)?;

        fs::write(&self.session_path, json)
            .map_err(|e| AuthError::SessionStorage(format!("Failed to save session: {}", e)))?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.session_path)
                .map_err(|e| {
                    AuthError::SessionStorage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.session_path, perms).map_err(|e| {
                AuthError::SessionStorage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        if self.session_path.exists() {
            fs::remove_file(&self.session_path)
                .map_err(|e| AuthError::SessionStorage(format!("Failed to delete session: {}", e)))?;
        }
        Ok(())
    }
}

/// Keeps the session in memory only; nothing survives a restart
#[derive(Default)]
pub struct MemorySessionStorage {
    session: Mutex<Option<StoredSession>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<StoredSession>>, AuthError> {
        self.session
            .lock()
            .map_err(|_| AuthError::SessionStorage("session storage lock poisoned".to_string()))
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<StoredSession>, AuthError> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), AuthError> {
        *self.slot()? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.slot()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(access: &str) -> StoredSession {
        StoredSession {
            access_token: access.to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: None,
            user: None,
            permissions: Default::default(),
        }
    }

    fn temp_session_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("retail-auth-{}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn test_file_storage_lifecycle() {
        let path = temp_session_path();
        let storage = FileSessionStorage::at(path.clone()).unwrap();

        assert_eq!(storage.load().unwrap(), None);

        storage.save(&stored("a1")).unwrap();
        assert_eq!(storage.load().unwrap(), Some(stored("a1")));

        storage.save(&stored("a2")).unwrap();
        assert_eq!(storage.load().unwrap().unwrap().access_token, "a2");

        storage.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(storage.load().unwrap(), None);

        // Clearing twice is fine
        storage.clear().unwrap();

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_session_path();
        let storage = FileSessionStorage::at(path.clone()).unwrap();
        storage.save(&stored("a1")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let path = temp_session_path();
        let storage = FileSessionStorage::at(path.clone()).unwrap();
        fs::write(&path, "not json").unwrap();

        assert!(matches!(storage.load(), Err(AuthError::Json(_))));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemorySessionStorage::with_session(stored("a1"));
        assert_eq!(storage.load().unwrap(), Some(stored("a1")));

        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }
}
