//! Filesystem session store
//!
//! One JSON file per session id in a single directory. Expired records are
//! reported as absent and removed on load; [`ExpiredDeletion`] sweeps the ones
//! nobody loads again.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::fs;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};

const FILE_PREFIX: &str = "session_";
const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: Arc<PathBuf>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &Id) -> PathBuf {
        // Id renders as URL-safe base64, which is filename-safe.
        self.dir.join(format!("{FILE_PREFIX}{id}"))
    }

    /// Unique per save, so concurrent saves of one session never share it.
    fn tmp_path_for(&self, id: &Id) -> PathBuf {
        let nonce: u64 = rand::random();
        self.dir
            .join(format!("{FILE_PREFIX}{id}.{nonce:016x}{TMP_SUFFIX}"))
    }

    async fn read_record(path: &Path) -> session_store::Result<Option<Record>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(backend(e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| session_store::Error::Decode(e.to_string()))
    }
}

fn is_expired(record: &Record) -> bool {
    record.expiry_date <= OffsetDateTime::now_utc()
}

fn backend(err: std::io::Error) -> session_store::Error {
    session_store::Error::Backend(err.to_string())
}

#[async_trait]
impl SessionStore for FileStore {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        fs::create_dir_all(self.dir()).await.map_err(backend)?;

        let bytes = serde_json::to_vec(record)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;

        let tmp = self.tmp_path_for(&record.id);
        fs::write(&tmp, bytes).await.map_err(backend)?;
        if let Err(e) = fs::rename(&tmp, self.path_for(&record.id)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(backend(e));
        }

        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let Some(record) = Self::read_record(&self.path_for(session_id)).await? else {
            return Ok(None);
        };

        if is_expired(&record) {
            self.delete(session_id).await?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        match fs::remove_file(self.path_for(session_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(backend(e)),
        }
    }
}

#[async_trait]
impl ExpiredDeletion for FileStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let mut entries = match fs::read_dir(self.dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(backend(e)),
        };

        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await.map_err(backend)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(FILE_PREFIX) || name.ends_with(TMP_SUFFIX) {
                continue;
            }

            // Unreadable records are left for `load` to report.
            let Ok(Some(record)) = Self::read_record(&entry.path()).await else {
                continue;
            };
            if is_expired(&record) {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(backend(e)),
                }
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "expired sessions deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn record(ttl: time::Duration) -> Record {
        let mut data = HashMap::new();
        data.insert("user_id".to_string(), serde_json::json!(7));
        Record {
            id: Id::default(),
            data,
            expiry_date: OffsetDateTime::now_utc() + ttl,
        }
    }

    #[tokio::test]
    async fn save_load_delete() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("sessions"));
        let record = record(time::Duration::hours(1));

        store.save(&record).await.unwrap();
        let loaded = store.load(&record.id).await.unwrap().unwrap();
        assert_eq!(loaded.data.get("user_id"), Some(&serde_json::json!(7)));

        store.delete(&record.id).await.unwrap();
        assert!(store.load(&record.id).await.unwrap().is_none());
        // Deleting twice is fine.
        store.delete(&record.id).await.unwrap();
    }

    #[tokio::test]
    async fn expired_records_are_absent() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let record = record(time::Duration::seconds(-1));

        store.save(&record).await.unwrap();
        assert!(store.load(&record.id).await.unwrap().is_none());
        assert!(!store.path_for(&record.id).exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_of_one_session_all_succeed() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let record = record(time::Duration::hours(1));

        let saves: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let record = record.clone();
                tokio::spawn(async move { store.save(&record).await })
            })
            .collect();
        for save in saves {
            save.await.unwrap().unwrap();
        }

        assert!(store.load(&record.id).await.unwrap().is_some());
        let leftovers = std::fs::read_dir(temp.path())
            .unwrap()
            .filter(|e| {
                let name = e.as_ref().unwrap().file_name();
                name.to_string_lossy().ends_with(TMP_SUFFIX)
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_records() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let live = record(time::Duration::hours(1));
        let stale = record(time::Duration::seconds(-1));
        store.save(&live).await.unwrap();
        store.save(&stale).await.unwrap();

        let corrupt = Id::default();
        std::fs::write(store.path_for(&corrupt), b"not json").unwrap();

        store.delete_expired().await.unwrap();

        assert!(store.path_for(&live.id).exists());
        assert!(!store.path_for(&stale.id).exists());
        assert!(store.path_for(&corrupt).exists());
    }

    #[tokio::test]
    async fn sweep_of_missing_directory_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("never-created"));
        store.delete_expired().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_record_is_a_decode_error() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let id = Id::default();

        std::fs::write(store.path_for(&id), b"not json").unwrap();

        let err = store.load(&id).await.unwrap_err();
        assert!(matches!(err, session_store::Error::Decode(_)));
    }
}
