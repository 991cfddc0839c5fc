//! Content cache for crawled pages
//!
//! A crawl cycle's content set is written to a single JSON file together with
//! the time it was written and the base URL it belongs to. Reads honour a
//! time-to-live: an entry older than the TTL, written for another site, or
//! unreadable for any reason is treated as absent so the caller crawls again.

use std::path::{Path, PathBuf};
use std::{io, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use super::ContentSet;

/// Cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Location of the cache file
    pub path: PathBuf,

    /// Maximum age of a cache entry, in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".docs-qa/cache.json"),
            ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    /// Get the TTL as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Persisted form of a content set
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CacheEntry {
    /// Base URL of the site the pages were crawled from
    pub base_url: String,

    /// When the entry was written
    pub written_at: DateTime<Utc>,

    /// The cached pages
    pub pages: ContentSet,
}

impl CacheEntry {
    /// Age of the entry at `now`
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.written_at)
    }
}

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading, writing or removing the cache file failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The cache file is not a valid entry
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CacheError> for crate::error::Error {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Io(e) => crate::error::Error::Io(e),
            CacheError::Json(e) => crate::error::Error::Cache(e.to_string()),
        }
    }
}

type Result<T> = std::result::Result<T, CacheError>;

/// File-backed cache of the content set for one base URL
///
/// Single writer: concurrent processes saving to the same file race and the
/// last save wins.
#[derive(Debug, Clone)]
pub struct ContentCache {
    config: CacheConfig,
    base_url: String,
}

impl ContentCache {
    /// Create a cache for the given base URL
    pub fn new(config: CacheConfig, base_url: impl Into<String>) -> Self {
        Self {
            config,
            base_url: base_url.into(),
        }
    }

    /// Location of the cache file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Load the cached content set if it is still fresh
    pub async fn load(&self) -> Option<ContentSet> {
        self.load_at(Utc::now()).await
    }

    /// Load the cached content set if it is fresh at `now`
    ///
    /// Returns `None` when there is no entry, the entry is for another base
    /// URL, it is at least the TTL old, or it cannot be read.
    #[instrument(skip(self), fields(path = %self.config.path.display()))]
    pub async fn load_at(&self, now: DateTime<Utc>) -> Option<ContentSet> {
        let entry = match self.read_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("No cache entry");
                return None;
            }
            Err(e) => {
                warn!("Ignoring unreadable cache: {}", e);
                return None;
            }
        };

        if entry.base_url != self.base_url {
            debug!(
                "Cache entry is for {}, not {}",
                entry.base_url, self.base_url
            );
            return None;
        }

        let age = entry.age_at(now);
        // An entry stamped in the future (clock skew) counts as fresh
        let expired = age
            .to_std()
            .map(|age| age >= self.config.ttl())
            .unwrap_or(false);
        if expired {
            debug!("Cache entry expired ({}s old)", age.num_seconds());
            return None;
        }

        info!("Loaded {} pages from cache", entry.pages.len());
        Some(entry.pages)
    }

    /// Read the raw cache entry regardless of its age
    ///
    /// A missing file is `Ok(None)`; a corrupt one is an error.
    pub async fn read_entry(&self) -> Result<Option<CacheEntry>> {
        let json = match fs::read_to_string(&self.config.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Save a content set, replacing any previous entry
    pub async fn save(&self, pages: &ContentSet) -> Result<()> {
        self.save_at(pages, Utc::now()).await
    }

    /// Save a content set stamped with the given write time
    #[instrument(skip(self, pages), fields(path = %self.config.path.display(), pages = pages.len()))]
    pub async fn save_at(&self, pages: &ContentSet, written_at: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let entry = CacheEntry {
            base_url: self.base_url.clone(),
            written_at,
            pages: pages.clone(),
        };
        let json = serde_json::to_string_pretty(&entry)?;

        // Write then rename so a reader never sees a half-written file
        let tmp_path = self.config.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &self.config.path).await?;

        info!("Saved {} pages to cache", pages.len());
        Ok(())
    }

    /// Delete the cache entry; a missing entry is not an error
    pub async fn invalidate(&self) -> Result<()> {
        match fs::remove_file(&self.config.path).await {
            Ok(()) => {
                info!("Cache invalidated");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::PageRecord;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const BASE: &str = "https://example.com/docs/";

    fn cache_in(dir: &TempDir) -> ContentCache {
        let config = CacheConfig {
            path: dir.path().join("nested").join("cache.json"),
            ttl_secs: 3600,
        };
        ContentCache::new(config, BASE)
    }

    fn sample_set() -> ContentSet {
        let fetched_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        vec![
            PageRecord {
                url: "https://example.com/docs/".to_string(),
                title: "Home".to_string(),
                content: "Welcome to the \"docs\" · ünïcode & <markup>".to_string(),
                fetched_at,
                error: false,
            },
            PageRecord {
                url: "https://example.com/docs/access".to_string(),
                title: "Data Access".to_string(),
                content: "Apply via the portal".to_string(),
                fetched_at,
                error: false,
            },
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let pages = sample_set();

        cache.save(&pages).await.unwrap();
        let loaded = cache.load().await.unwrap();

        assert_eq!(loaded, pages);
    }

    #[tokio::test]
    async fn test_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        assert!(cache.load().await.is_none());
        assert!(cache.read_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let written = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let ttl = chrono::Duration::seconds(3600);
        let epsilon = chrono::Duration::milliseconds(1);

        cache.save_at(&sample_set(), written).await.unwrap();

        assert!(cache.load_at(written + ttl - epsilon).await.is_some());
        assert!(cache.load_at(written + ttl).await.is_none());
        assert!(cache.load_at(written + ttl + epsilon).await.is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        cache.save(&sample_set()).await.unwrap();
        let smaller: ContentSet = sample_set()
            .iter()
            .filter(|r| r.title == "Home")
            .cloned()
            .collect();
        cache.save(&smaller).await.unwrap();

        assert_eq!(cache.load().await.unwrap(), smaller);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        cache.save(&sample_set()).await.unwrap();
        cache.invalidate().await.unwrap();
        assert!(cache.load().await.is_none());

        // Invalidating again is fine
        cache.invalidate().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        cache.save(&sample_set()).await.unwrap();
        fs::write(cache.path(), "{ not json").await.unwrap();

        assert!(cache.load().await.is_none());
        assert!(matches!(
            cache.read_entry().await,
            Err(CacheError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_other_site_is_absent() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        cache.save(&sample_set()).await.unwrap();

        let other = ContentCache::new(
            CacheConfig {
                path: cache.path().to_path_buf(),
                ttl_secs: 3600,
            },
            "https://other.example.org/",
        );
        assert!(other.load().await.is_none());
    }
}
