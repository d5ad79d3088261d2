use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentStoreError {
    #[error("Content store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob metadata unreadable: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Content store lock poisoned")]
    LockPoisoned,
}

/// Storage key for one blob: `<documentId>/<sanitized file name>`.
///
/// The document id keeps same-named files apart; the name is only there to
/// make the store browsable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey {
    document_id: String,
    file_name: String,
}

impl BlobKey {
    pub fn new(document_id: &str, original_name: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            file_name: sanitize_file_name(original_name),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.document_id, self.file_name)
    }
}

/// Replace anything outside `[A-Za-z0-9.-]` with `_`, collapse runs of `_`
/// and trim them from both ends.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        "document".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Binary storage for raw document content.
pub trait ContentStore: Send + Sync {
    /// Store `content` under `key` and return an opaque locator.
    fn put(&self, key: &BlobKey, content: &[u8], content_type: &str)
        -> Result<String, ContentStoreError>;
    fn get(&self, key: &BlobKey) -> Result<Vec<u8>, ContentStoreError>;
    /// MIME type recorded by `put`, `None` when the blob is absent.
    fn content_type(&self, key: &BlobKey) -> Result<Option<String>, ContentStoreError>;
    fn exists(&self, key: &BlobKey) -> Result<bool, ContentStoreError>;
    fn remove(&self, key: &BlobKey) -> Result<(), ContentStoreError>;
}

/// Sidecar written next to each filesystem blob.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobMeta {
    content_type: String,
    file_name: String,
    stored_at: DateTime<Utc>,
}

/// Blobs on the local filesystem under a root directory.
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ContentStoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &BlobKey) -> PathBuf {
        self.root.join(key.document_id()).join(key.file_name())
    }

    fn meta_path_for(&self, key: &BlobKey) -> PathBuf {
        self.root
            .join(key.document_id())
            .join(format!("{}.meta", key.file_name()))
    }
}

fn remove_if_present(path: &Path) -> Result<(), ContentStoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl ContentStore for FsContentStore {
    fn put(
        &self,
        key: &BlobKey,
        content: &[u8],
        content_type: &str,
    ) -> Result<String, ContentStoreError> {
        let path = self.path_for(key);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, content)?;

        let meta = BlobMeta {
            content_type: content_type.to_string(),
            file_name: key.file_name().to_string(),
            stored_at: Utc::now(),
        };
        std::fs::write(self.meta_path_for(key), serde_json::to_vec(&meta)?)?;
        tracing::debug!(%key, content_type, bytes = content.len(), "blob written");

        Ok(path.display().to_string())
    }

    fn get(&self, key: &BlobKey) -> Result<Vec<u8>, ContentStoreError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ContentStoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn content_type(&self, key: &BlobKey) -> Result<Option<String>, ContentStoreError> {
        let bytes = match std::fs::read(self.meta_path_for(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: BlobMeta = serde_json::from_slice(&bytes)?;
        Ok(Some(meta.content_type))
    }

    fn exists(&self, key: &BlobKey) -> Result<bool, ContentStoreError> {
        Ok(self.path_for(key).try_exists()?)
    }

    fn remove(&self, key: &BlobKey) -> Result<(), ContentStoreError> {
        let path = self.path_for(key);
        remove_if_present(&path)?;
        remove_if_present(&self.meta_path_for(key))?;
        if let Some(dir) = path.parent() {
            // Only succeeds once the per-document directory is empty.
            let _ = std::fs::remove_dir(dir);
        }
        Ok(())
    }
}

struct StoredBlob {
    content: Vec<u8>,
    content_type: String,
}

/// Process-local store for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryContentStore {
    blobs: Mutex<HashMap<BlobKey, StoredBlob>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentStore for MemoryContentStore {
    fn put(
        &self,
        key: &BlobKey,
        content: &[u8],
        content_type: &str,
    ) -> Result<String, ContentStoreError> {
        let mut blobs = self.blobs.lock().map_err(|_| ContentStoreError::LockPoisoned)?;
        blobs.insert(
            key.clone(),
            StoredBlob {
                content: content.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("memory://{}", key))
    }

    fn get(&self, key: &BlobKey) -> Result<Vec<u8>, ContentStoreError> {
        let blobs = self.blobs.lock().map_err(|_| ContentStoreError::LockPoisoned)?;
        blobs
            .get(key)
            .map(|b| b.content.clone())
            .ok_or_else(|| ContentStoreError::NotFound(key.to_string()))
    }

    fn content_type(&self, key: &BlobKey) -> Result<Option<String>, ContentStoreError> {
        let blobs = self.blobs.lock().map_err(|_| ContentStoreError::LockPoisoned)?;
        Ok(blobs.get(key).map(|b| b.content_type.clone()))
    }

    fn exists(&self, key: &BlobKey) -> Result<bool, ContentStoreError> {
        let blobs = self.blobs.lock().map_err(|_| ContentStoreError::LockPoisoned)?;
        Ok(blobs.contains_key(key))
    }

    fn remove(&self, key: &BlobKey) -> Result<(), ContentStoreError> {
        let mut blobs = self.blobs.lock().map_err(|_| ContentStoreError::LockPoisoned)?;
        blobs.remove(key);
        Ok(())
    }
}
