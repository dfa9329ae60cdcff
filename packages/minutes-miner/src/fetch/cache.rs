//! On-disk document cache, laid out as `<base>/<group>/<bucket>/<filename>`.
//!
//! A non-empty file at the target path means "already retrieved"; no
//! request is made for it. The existence check and the write happen
//! under one per-path lock, so two workers never download the same path.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::engine::{FetchEngine, FetchTarget};
use crate::error::{FetchFailure, FetchResult};
use crate::traits::delay::Delay;
use crate::traits::transport::Transport;
use crate::types::config::{Bucket, SourceGroup};
use crate::types::document::{CacheKey, CachedDocument};

pub struct DocumentCache {
    base_dir: PathBuf,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl DocumentCache {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            locks: DashMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path a key maps to.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.base_dir
            .join(&key.group_key)
            .join(key.bucket.as_str())
            .join(&key.filename)
    }

    /// Create `<group>/current` and `<group>/archive` for each group.
    pub async fn prepare(&self, groups: &[SourceGroup]) -> std::io::Result<()> {
        for group in groups {
            for bucket in Bucket::ALL {
                tokio::fs::create_dir_all(self.base_dir.join(&group.key).join(bucket.as_str())).await?;
            }
        }
        info!(base_dir = %self.base_dir.display(), groups = groups.len(), "Cache directories ready");
        Ok(())
    }

    /// True if a non-empty file exists at the path.
    pub async fn is_cached(path: &Path) -> bool {
        matches!(tokio::fs::metadata(path).await, Ok(meta) if meta.is_file() && meta.len() > 0)
    }

    /// Return the cached file, downloading it first if absent.
    ///
    /// A write failure is reported as a `FetchFailure` for this document only.
    pub async fn get_or_fetch<T, D>(
        &self,
        engine: &FetchEngine<T, D>,
        key: CacheKey,
        target: &FetchTarget,
    ) -> FetchResult<CachedDocument>
    where
        T: Transport,
        D: Delay,
    {
        let path = self.path_for(&key);
        let lock = Arc::clone(
            &*self
                .locks
                .entry(path.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        let _guard = lock.lock().await;

        if Self::is_cached(&path).await {
            debug!(path = %path.display(), "Cache hit, skipping download");
            return Ok(CachedDocument {
                key,
                path,
                downloaded: false,
            });
        }

        let bytes = engine.fetch(target).await?;

        if let Err(error) = Self::write_atomic(&path, &bytes).await {
            warn!(path = %path.display(), error = %error, "Cache write failed");
            return Err(FetchFailure::cache_write(&target.url, &error));
        }

        info!(path = %path.display(), bytes = bytes.len(), "Downloaded");
        Ok(CachedDocument {
            key,
            path,
            downloaded: true,
        })
    }

    /// Read a cached document's bytes.
    pub async fn read(&self, document: &CachedDocument) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&document.path).await
    }

    /// Write to a sibling `.part` file, then rename into place.
    async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut partial = path.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        tokio::fs::write(&partial, bytes).await?;
        if let Err(error) = tokio::fs::rename(&partial, path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(error);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::delay::NoDelay;
    use crate::testing::MockTransport;
    use crate::types::config::FetchSettings;

    const DOC: &str = "https://county.example.gov/docs/minutes-01-05-2024.pdf";

    fn key() -> CacheKey {
        CacheKey::new("highway", Bucket::Current, "minutes-01-05-2024.pdf")
    }

    #[tokio::test]
    async fn test_second_fetch_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new().with_page(DOC, "%PDF-1.5 bytes");
        let engine = FetchEngine::new(mock.clone(), NoDelay, FetchSettings::default());
        let cache = DocumentCache::new(dir.path());
        let target = FetchTarget::document(DOC);

        let first = cache.get_or_fetch(&engine, key(), &target).await.unwrap();
        let second = cache.get_or_fetch(&engine, key(), &target).await.unwrap();

        assert!(first.downloaded);
        assert!(!second.downloaded);
        assert_eq!(first.path, second.path);
        assert_eq!(mock.count_for(DOC), 1);
        assert_eq!(
            first.path,
            dir.path().join("highway").join("current").join("minutes-01-05-2024.pdf")
        );
        assert_eq!(cache.read(&second).await.unwrap(), b"%PDF-1.5 bytes");
    }

    #[tokio::test]
    async fn test_empty_file_is_not_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DocumentCache::new(dir.path());
        let path = cache.path_for(&key());
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"").await.unwrap();

        let mock = MockTransport::new().with_page(DOC, "%PDF");
        let engine = FetchEngine::new(mock.clone(), NoDelay, FetchSettings::default());

        let doc = cache
            .get_or_fetch(&engine, key(), &FetchTarget::document(DOC))
            .await
            .unwrap();
        assert!(doc.downloaded);
        assert_eq!(mock.count_for(DOC), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_download_once() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new().with_page(DOC, "%PDF");
        let engine = Arc::new(FetchEngine::new(mock.clone(), NoDelay, FetchSettings::default()));
        let cache = Arc::new(DocumentCache::new(dir.path()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = Arc::clone(&engine);
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(&engine, key(), &FetchTarget::document(DOC))
                    .await
                    .unwrap()
                    .downloaded
            }));
        }

        let mut downloads = 0;
        for handle in handles {
            if handle.await.unwrap() {
                downloads += 1;
            }
        }
        assert_eq!(downloads, 1);
        assert_eq!(mock.count_for(DOC), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new().with_status(DOC, 404);
        let engine = FetchEngine::new(mock, NoDelay, FetchSettings::default());
        let cache = DocumentCache::new(dir.path());

        let failure = cache
            .get_or_fetch(&engine, key(), &FetchTarget::document(DOC))
            .await
            .unwrap_err();
        assert_eq!(failure.last_status, Some(404));
        assert!(!DocumentCache::is_cached(&cache.path_for(&key())).await);
    }
}
