//! Local filesystem storage implementation.
//!
//! Each collection is one pretty-printed JSON array at
//! `{root}/{collection}.json`. Writes go to a temp file that is then renamed
//! over the target. Every store opened on the same root directory shares
//! one lock, which serializes read-modify-write cycles within the process.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── courses.json
//! ├── courses_dev.json
//! └── ...
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, OnceLock, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::storage::{DocumentStore, UpsertSummary};

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        Self {
            write_lock: lock_for(&root_dir),
            root_dir,
        }
    }

    /// Get the file path backing a collection.
    fn path(&self, collection: &str) -> PathBuf {
        self.root_dir.join(format!("{collection}.json"))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_collection(&self, collection: &str) -> Result<Vec<Value>> {
        match self.read_bytes(&self.path(collection)).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_collection(&self, collection: &str, docs: &[Value]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(docs)?;
        self.write_bytes(&self.path(collection), &bytes).await
    }
}

/// Write lock for a root directory, shared by every store opened on it.
fn lock_for(root: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

    let key = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}

/// Merge incoming documents into `existing` keyed on `key`.
fn merge_documents(
    existing: &mut Vec<Value>,
    key: &str,
    docs: Vec<Value>,
) -> Result<UpsertSummary> {
    let mut positions: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .filter_map(|(i, doc)| doc.get(key).map(|k| (k.to_string(), i)))
        .collect();

    let mut summary = UpsertSummary::default();
    for doc in docs {
        let fields = match doc {
            Value::Object(fields) => fields,
            other => {
                return Err(AppError::storage(format!(
                    "document is not a JSON object: {other}"
                )));
            }
        };
        let id = fields
            .get(key)
            .map(Value::to_string)
            .ok_or_else(|| AppError::storage(format!("document is missing key '{key}'")))?;

        match positions.get(&id).and_then(|&i| existing.get_mut(i)) {
            Some(Value::Object(current)) => {
                summary.matched += 1;
                let mut changed = false;
                for (field, value) in fields {
                    if current.get(&field) != Some(&value) {
                        current.insert(field, value);
                        changed = true;
                    }
                }
                if changed {
                    summary.modified += 1;
                }
            }
            Some(other) => {
                // A stored non-object under a known key is replaced outright.
                summary.matched += 1;
                summary.modified += 1;
                *other = Value::Object(fields);
            }
            None => {
                summary.upserted += 1;
                positions.insert(id, existing.len());
                existing.push(Value::Object(fields));
            }
        }
    }
    Ok(summary)
}

#[async_trait]
impl DocumentStore for LocalStorage {
    async fn upsert_many(
        &self,
        collection: &str,
        key: &str,
        docs: Vec<Value>,
    ) -> Result<UpsertSummary> {
        if docs.is_empty() {
            return Ok(UpsertSummary::default());
        }

        let _guard = self.write_lock.lock().await;
        let mut existing = self.read_collection(collection).await?;
        let summary = merge_documents(&mut existing, key, docs)?;
        self.write_collection(collection, &existing).await?;

        log::debug!(
            "Upserted into {}: {} matched, {} modified, {} inserted",
            collection,
            summary.matched,
            summary.modified,
            summary.upserted
        );
        Ok(summary)
    }

    async fn replace_all(&self, collection: &str, docs: Vec<Value>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_collection(collection, &docs).await
    }

    async fn load_all(&self, collection: &str) -> Result<Vec<Value>> {
        let docs = self.read_collection(collection).await?;
        if docs.is_empty() {
            log::warn!("Collection {} is empty or missing", collection);
        }
        Ok(docs)
    }
}
