//! Get-all/set-all persistence for access codes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;

use super::models::AccessCode;

#[async_trait]
pub trait AccessCodeStore: Send + Sync {
    async fn load(&self) -> Result<Vec<AccessCode>, StoreError>;

    /// Replace the stored list
    async fn save(&self, codes: &[AccessCode]) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryAccessCodeStore {
    codes: RwLock<Vec<AccessCode>>,
}

impl InMemoryAccessCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessCodeStore for InMemoryAccessCodeStore {
    async fn load(&self) -> Result<Vec<AccessCode>, StoreError> {
        Ok(self.codes.read().await.clone())
    }

    async fn save(&self, codes: &[AccessCode]) -> Result<(), StoreError> {
        *self.codes.write().await = codes.to_vec();
        Ok(())
    }
}

/// Codes kept in a JSON array on local disk.
///
/// A missing or empty file reads as no codes. Saves go through a
/// temporary file and a rename so a crash never leaves half a list.
pub struct JsonFileAccessCodeStore {
    path: PathBuf,
}

impl JsonFileAccessCodeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl AccessCodeStore for JsonFileAccessCodeStore {
    async fn load(&self) -> Result<Vec<AccessCode>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No access code file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, codes: &[AccessCode]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(codes)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::access_codes::models::StaffRole;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAccessCodeStore::new(dir.path().join("codes.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("codes.json");
        let code = AccessCode::issue(StaffRole::Manager, "gm@wgh.com", Utc::now());

        JsonFileAccessCodeStore::new(&path).save(&[code.clone()]).await.unwrap();

        let reopened = JsonFileAccessCodeStore::new(&path);
        assert_eq!(reopened.load().await.unwrap(), vec![code]);
        assert!(!reopened.temp_path().exists());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"createdBy\""));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileAccessCodeStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
