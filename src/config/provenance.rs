//! Source tracking for resolved values
//!
//! Mirrors what the merge fold already decided, for diagnostic display
//! only. No merge logic lives here and nothing here can alter a resolved
//! value.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::document::MergeStrategy;
use super::merge::MergeOperation;

/// One contribution to a key's final value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Document the contribution came from
    pub document: PathBuf,
    /// Strategy that was applied
    pub strategy: MergeStrategy,
}

/// The recorded contributions for one resolved key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueOrigin {
    /// Contributions in application order
    pub entries: Vec<SourceEntry>,
    /// Chain position of the deepest contributing document
    pub chain_depth: usize,
}

/// Accumulate per-key contributions from the fold log
pub fn track_origins(operations: &[MergeOperation]) -> BTreeMap<String, ValueOrigin> {
    let mut origins: BTreeMap<String, ValueOrigin> = BTreeMap::new();
    for operation in operations {
        let origin = origins
            .entry(operation.key.clone())
            .or_insert_with(|| ValueOrigin {
                entries: Vec::new(),
                chain_depth: 0,
            });
        origin.entries.push(SourceEntry {
            document: operation.source.clone(),
            strategy: operation.strategy,
        });
        origin.chain_depth = operation.chain_index;
    }
    origins
}
