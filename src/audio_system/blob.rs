/// In-memory blob store
///
/// Uploaded audio lives here under an opaque URL until the guard that
/// created it is dropped. The output resolves URLs back to bytes.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Opaque handle to registered audio bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobUrl(String);

impl BlobUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of live blobs
pub struct BlobStore {
    blobs: Mutex<HashMap<BlobUrl, Arc<Vec<u8>>>>,
    next_id: AtomicU64,
    revoked: AtomicUsize,
}

impl BlobStore {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            revoked: AtomicUsize::new(0),
        }
    }

    /// Register bytes and return the guard that owns the URL
    pub fn create(self: &Arc<Self>, data: Vec<u8>) -> BlobGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = BlobUrl(format!("blob:fudge-judge/{}", id));
        let len = data.len();

        self.blobs.lock().insert(url.clone(), Arc::new(data));
        tracing::debug!("Created {} ({} bytes)", url, len);

        BlobGuard {
            store: Arc::clone(self),
            url,
        }
    }

    /// Look up the bytes behind a URL, if it has not been revoked
    pub fn resolve(&self, url: &BlobUrl) -> Option<Arc<Vec<u8>>> {
        self.blobs.lock().get(url).cloned()
    }

    fn revoke(&self, url: &BlobUrl) {
        if self.blobs.lock().remove(url).is_some() {
            self.revoked.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Revoked {}", url);
        } else {
            tracing::warn!("Revoke of unknown blob {}", url);
        }
    }

    /// Number of blobs currently registered
    pub fn live_count(&self) -> usize {
        self.blobs.lock().len()
    }

    /// Number of blobs released since the store was created
    pub fn revoked_count(&self) -> usize {
        self.revoked.load(Ordering::Relaxed)
    }
}

impl Default for BlobStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Owner of one registered blob; dropping it revokes the URL
pub struct BlobGuard {
    store: Arc<BlobStore>,
    url: BlobUrl,
}

impl BlobGuard {
    pub fn url(&self) -> &BlobUrl {
        &self.url
    }
}

/// Shared view of blob bytes, readable through `io::Cursor` without copying
#[derive(Debug, Clone)]
pub struct SharedBytes(Arc<Vec<u8>>);

impl From<Arc<Vec<u8>>> for SharedBytes {
    fn from(data: Arc<Vec<u8>>) -> Self {
        Self(data)
    }
}

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for BlobGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobGuard").field("url", &self.url).finish()
    }
}

impl Drop for BlobGuard {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}
