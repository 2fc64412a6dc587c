//! File-based remote collection
//!
//! Each collection is one JSON array on disk. The data directory plays the
//! role of the remote store: identities are assigned here on create.

use std::fmt::Display;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use gatelog_domain::repository::RemoteCollection;
use gatelog_types::{Error, Record, Result};

/// File name of the vehicle registry collection
pub const REGISTRY_FILE: &str = "registered_vehicles.json";
/// File name of the checkpoint log collection
pub const LOG_FILE: &str = "logs.json";

/// Remote collection persisted as a JSON file
pub struct JsonFileRemote<T> {
    store_path: PathBuf,
    // Serialises read-modify-write cycles of interleaved calls
    lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonFileRemote<T>
where
    T: Record + Serialize + DeserializeOwned,
{
    /// Open the collection `file_name` under `store_dir`, creating the
    /// directory if needed
    pub fn open(store_dir: PathBuf, file_name: &str) -> Result<Self> {
        std::fs::create_dir_all(&store_dir).map_err(|e| {
            Error::RemoteUnavailable(format!(
                "cannot open data directory {}: {}",
                store_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            store_path: store_dir.join(file_name),
            lock: Mutex::new(()),
            _record: PhantomData,
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    fn failed(&self, action: &str, err: impl Display) -> Error {
        Error::RemoteOperationFailed(format!(
            "{} {}: {}",
            action,
            self.store_path.display(),
            err
        ))
    }

    async fn load(&self) -> Result<Vec<T>> {
        match tokio::fs::read(&self.store_path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| self.failed("parse", e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.failed("read", e)),
        }
    }

    /// Write via a temporary sibling file so a failed write never leaves a
    /// truncated collection behind
    async fn persist(&self, records: &[T]) -> Result<()> {
        let content = serde_json::to_vec_pretty(records).map_err(|e| self.failed("encode", e))?;
        let tmp_path = self.store_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .map_err(|e| self.failed("write", e))?;
        tokio::fs::rename(&tmp_path, &self.store_path)
            .await
            .map_err(|e| self.failed("replace", e))?;
        Ok(())
    }
}

impl<T> RemoteCollection<T> for JsonFileRemote<T>
where
    T: Record + Serialize + DeserializeOwned,
{
    async fn fetch_all(&self) -> Result<Vec<T>> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        records.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        Ok(records)
    }

    async fn create(&self, mut record: T) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        record.set_id(Uuid::new_v4().to_string());
        records.insert(0, record.clone());
        self.persist(&records).await?;
        debug!(
            "event=remote_create path={} id={}",
            self.store_path.display(),
            record.id()
        );
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(self.failed("delete", format!("no record with id {}", id)));
        }
        self.persist(&records).await?;
        debug!(
            "event=remote_delete path={} id={}",
            self.store_path.display(),
            id
        );
        Ok(())
    }
}
