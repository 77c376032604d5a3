//! Layered configuration inheritance
//!
//! A configuration document may declare parent documents through the
//! reserved `inherit` key. Resolution builds the dependency-ordered chain
//! of ancestors (deduplicating diamonds, rejecting cycles) and folds it
//! left-to-right with per-key merge strategies, tracking which document
//! and strategy produced each final value. Repeated resolution is served
//! from a modification-time validated cache.
//!
//! `ConfigLoader` is the only entry point the rest of the tool calls;
//! documents with no `inherit` declaration load exactly as flat key/value
//! files with none of the chain machinery involved.

mod cache;
mod chain;
mod document;
mod error;
mod merge;
mod path;
mod provenance;
mod value;

pub use cache::{CacheStats, InheritanceCache, DEFAULT_CAPACITY};
pub use chain::{build_chain, Chain};
pub use document::{Document, DocumentField, MergeStrategy, INHERIT_KEY};
pub use error::ConfigError;
pub use merge::{fold_document, merge_chain, MergeOperation};
pub use path::resolve_reference;
pub use provenance::{track_origins, SourceEntry, ValueOrigin};
pub use value::{string_sequence, ConfigValue};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A document that contributed to a resolution, in chain order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSource {
    pub path: PathBuf,
    /// SHA-256 digest of the document's raw bytes
    pub digest: String,
}

/// The final resolved configuration with provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    /// Resolved key/value pairs
    pub values: BTreeMap<String, ConfigValue>,
    /// Per-key contribution history, parallel to `values`
    pub origins: BTreeMap<String, ValueOrigin>,
    /// Contributing documents in chain order
    pub sources: Vec<DocumentSource>,
}

impl ResolvedConfig {
    /// Get a resolved value
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Get a resolved value as a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Get a resolved value as a boolean
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// Get a resolved value as an integer
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_integer())
    }

    /// Contribution history for a resolved key
    pub fn origin(&self, key: &str) -> Option<&ValueOrigin> {
        self.origins.get(key)
    }

    /// Serialize to pretty JSON for display
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Entry point for configuration loading.
///
/// Owns the injectable cache; construct one per process (or per test)
/// and share it across lookups.
pub struct ConfigLoader {
    cache: InheritanceCache,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader with a fresh default cache
    pub fn new() -> Self {
        Self {
            cache: InheritanceCache::new(),
        }
    }

    /// Create a loader around an explicitly constructed cache
    pub fn with_cache(cache: InheritanceCache) -> Self {
        Self { cache }
    }

    /// The underlying cache, for diagnostics
    pub fn cache(&self) -> &InheritanceCache {
        &self.cache
    }

    /// Load the configuration rooted at `root`, resolving inheritance.
    ///
    /// A document with no `inherit` declaration resolves directly from
    /// its own fields; otherwise the cached chain pipeline runs.
    pub fn load(&self, root: &Path) -> Result<Arc<ResolvedConfig>, ConfigError> {
        let root = canonical_root(root)?;
        let document = self.cache.document(&root)?;
        if !document.has_parents() {
            return Ok(Arc::new(resolve_flat(&document)?));
        }
        self.cache.get_or_resolve(&root)
    }

    /// One resolved value with its source chain, for display commands.
    ///
    /// Returns `Ok(None)` when the key is not set in the resolved
    /// configuration.
    pub fn value_with_source(
        &self,
        root: &Path,
        key: &str,
    ) -> Result<Option<(ConfigValue, ValueOrigin)>, ConfigError> {
        let resolved = self.load(root)?;
        let value = match resolved.get(key) {
            Some(value) => value.clone(),
            None => return Ok(None),
        };
        let origin = match resolved.origin(key) {
            Some(origin) => origin.clone(),
            None => return Ok(None),
        };
        Ok(Some((value, origin)))
    }
}

/// Absolutize and normalize the requested root so canonical paths compare
/// reliably across mixed absolute and relative references
fn canonical_root(root: &Path) -> Result<PathBuf, ConfigError> {
    if root.is_absolute() {
        return Ok(path::normalize(root));
    }
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io {
        path: root.to_path_buf(),
        source: e,
    })?;
    Ok(path::normalize(&cwd.join(root)))
}

/// Full chain resolution, bypassing the resolution cache.
///
/// `load` supplies documents (typically through the parsed-document
/// memo). Returns the config plus the mtime snapshot of every chain
/// member, which the cache records for freshness checks.
pub(crate) fn resolve_chain_uncached<L>(
    root: &Path,
    load: &mut L,
) -> Result<(Arc<ResolvedConfig>, Vec<(PathBuf, DateTime<Utc>)>), ConfigError>
where
    L: FnMut(&Path) -> Result<Arc<Document>, ConfigError>,
{
    let chain = build_chain(root, load)?;
    let (values, operations) = merge_chain(&chain)?;
    let origins = track_origins(&operations);
    let snapshots = chain
        .documents
        .iter()
        .map(|d| (d.path.clone(), d.modified_at))
        .collect();
    let sources = chain
        .documents
        .iter()
        .map(|d| DocumentSource {
            path: d.path.clone(),
            digest: d.digest.clone(),
        })
        .collect();
    Ok((
        Arc::new(ResolvedConfig {
            values,
            origins,
            sources,
        }),
        snapshots,
    ))
}

/// Resolve a document with no inheritance declaration: its own fields,
/// no chain machinery
fn resolve_flat(document: &Document) -> Result<ResolvedConfig, ConfigError> {
    let mut values = BTreeMap::new();
    let mut operations = Vec::new();
    fold_document(&mut values, document, 0, &mut operations)?;
    let origins = track_origins(&operations);
    Ok(ResolvedConfig {
        values,
        origins,
        sources: vec![DocumentSource {
            path: document.path.clone(),
            digest: document.digest.clone(),
        }],
    })
}
