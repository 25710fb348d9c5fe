//! JSON file store with atomic replace.
//!
//! Both records share one file. Every write is a read-modify-write under a
//! single async mutex, then lands via temp file + rename so a crash never
//! leaves a truncated record behind.

use std::path::PathBuf;

use async_trait::async_trait;
use pingate_core::AuthPolicyState;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StoreResult;
use crate::traits::PolicyStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    state: AuthPolicyState,
    #[serde(default)]
    use_biometry: bool,
}

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_record(&self) -> StoreResult<StoredRecord> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_record(&self, record: &StoredRecord) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for JsonFileStore {
    async fn load_state(&self) -> StoreResult<AuthPolicyState> {
        Ok(self.read_record().await?.state)
    }

    async fn save_state(&self, state: &AuthPolicyState) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_record().await?;
        record.state = state.clone();
        self.write_record(&record).await?;
        tracing::debug!(
            "Saved auth state ({} failures) to {}",
            state.attempts.consecutive_failures,
            self.path.display()
        );
        Ok(())
    }

    async fn biometry_enabled(&self) -> StoreResult<bool> {
        Ok(self.read_record().await?.use_biometry)
    }

    async fn set_biometry_enabled(&self, enabled: bool) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_record().await?;
        record.use_biometry = enabled;
        self.write_record(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        assert_eq!(store.load_state().await.unwrap(), AuthPolicyState::default());
        assert!(!store.biometry_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = JsonFileStore::new(&path);
        let mut state = AuthPolicyState::default();
        state.attempts.increment();
        state.lockout.display_notification = true;
        store.save_state(&state).await.unwrap();
        store.set_biometry_enabled(true).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load_state().await.unwrap(), state);
        assert!(reopened.biometry_enabled().await.unwrap());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn concurrent_writers_keep_both_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("state.json")));

        let mut state = AuthPolicyState::default();
        state.attempts.consecutive_failures = 3;

        let a = {
            let store = store.clone();
            let state = state.clone();
            tokio::spawn(async move { store.save_state(&state).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.set_biometry_enabled(true).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(store.load_state().await.unwrap().attempts.current_count(), 3);
        assert!(store.biometry_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.load_state().await,
            Err(StoreError::Serialization(_))
        ));
    }
}
