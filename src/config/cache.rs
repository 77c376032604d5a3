//! Inheritance cache with modification-time invalidation
//!
//! Memoizes parsed documents and fully resolved configurations keyed by
//! canonical path. A resolution stays fresh only while every document in
//! its chain keeps the modification time recorded at resolve time; a
//! touched ancestor invalidates the whole entry. Purely a performance
//! layer: clients get identical output whether or not the cache is warm.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::document::Document;
use super::error::ConfigError;
use super::{resolve_chain_uncached, ResolvedConfig};

/// Default maximum number of cached resolutions
pub const DEFAULT_CAPACITY: usize = 64;

/// Cache counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Resolutions currently cached
    pub entries: usize,
    /// Fresh-entry lookups served without resolving
    pub hits: u64,
    /// Lookups that triggered a full resolution
    pub misses: u64,
}

/// Shared cache for parsed documents and resolved configurations.
///
/// Explicitly constructed and injected into the facade, so tests isolate
/// themselves with a fresh instance. One coarse mutex serializes access;
/// a miss resolves under the lock, which also makes concurrent misses for
/// the same root mutually exclusive.
pub struct InheritanceCache {
    inner: Mutex<CacheInner>,
}

struct CachedDocument {
    modified_at: DateTime<Utc>,
    document: Arc<Document>,
}

struct CachedResolution {
    config: Arc<ResolvedConfig>,
    /// Modification time of every chain member at resolve time
    snapshots: Vec<(PathBuf, DateTime<Utc>)>,
    last_used: u64,
}

struct CacheInner {
    capacity: usize,
    documents: HashMap<PathBuf, CachedDocument>,
    resolutions: HashMap<PathBuf, CachedResolution>,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl Default for InheritanceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InheritanceCache {
    /// Create a cache with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a cache bounded to `capacity` resolutions, evicted
    /// least-recently-used
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                capacity: capacity.max(1),
                documents: HashMap::new(),
                resolutions: HashMap::new(),
                clock: 0,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Parsed document for `path`, re-read if the file changed on disk
    pub fn document(&self, path: &Path) -> Result<Arc<Document>, ConfigError> {
        self.lock().document(path)
    }

    /// Cached resolution for `root`, or a full resolution stored on miss.
    ///
    /// Errors propagate without inserting anything.
    pub fn get_or_resolve(&self, root: &Path) -> Result<Arc<ResolvedConfig>, ConfigError> {
        let mut inner = self.lock();

        if let Some(config) = inner.fresh_resolution(root) {
            inner.hits += 1;
            return Ok(config);
        }
        inner.misses += 1;

        let resolved = {
            let inner = &mut *inner;
            let mut load = |path: &Path| inner.document(path);
            resolve_chain_uncached(root, &mut load)
        };
        let (config, snapshots) = resolved?;
        inner.insert_resolution(root, Arc::clone(&config), snapshots);
        Ok(config)
    }

    /// Current cache counters
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.resolutions.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheInner {
    fn document(&mut self, path: &Path) -> Result<Arc<Document>, ConfigError> {
        let modified = file_modified(path)?;
        if let Some(entry) = self.documents.get(path) {
            if entry.modified_at == modified {
                return Ok(Arc::clone(&entry.document));
            }
        }

        let document = Arc::new(Document::load(path)?);
        self.documents.insert(
            path.to_path_buf(),
            CachedDocument {
                modified_at: document.modified_at,
                document: Arc::clone(&document),
            },
        );
        Ok(document)
    }

    /// Cached config for `root` if every chain member is unchanged.
    /// A stale entry is dropped; its replacement is inserted after the
    /// re-resolution succeeds.
    fn fresh_resolution(&mut self, root: &Path) -> Option<Arc<ResolvedConfig>> {
        self.clock += 1;
        let clock = self.clock;

        if let Some(entry) = self.resolutions.get_mut(root) {
            let fresh = entry.snapshots.iter().all(|(path, recorded)| {
                matches!(file_modified(path), Ok(current) if current == *recorded)
            });
            if fresh {
                entry.last_used = clock;
                return Some(Arc::clone(&entry.config));
            }
        }
        self.resolutions.remove(root);
        None
    }

    fn insert_resolution(
        &mut self,
        root: &Path,
        config: Arc<ResolvedConfig>,
        snapshots: Vec<(PathBuf, DateTime<Utc>)>,
    ) {
        self.clock += 1;
        self.resolutions.insert(
            root.to_path_buf(),
            CachedResolution {
                config,
                snapshots,
                last_used: self.clock,
            },
        );

        while self.resolutions.len() > self.capacity {
            let oldest = self
                .resolutions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(path, _)| path.clone());
            match oldest {
                Some(path) => {
                    self.resolutions.remove(&path);
                }
                None => break,
            }
        }
    }
}

fn file_modified(path: &Path) -> Result<DateTime<Utc>, ConfigError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::DocumentNotFound(path.to_path_buf()),
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let modified = metadata.modified().map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(DateTime::<Utc>::from(modified))
}
