//! Merge strategy application
//!
//! Folds a chain of documents into the accumulated configuration,
//! left-to-right, applying each key's strategy:
//! - Override: assign (last wins)
//! - Append/Prepend: sequence concatenation around the accumulated value
//! - Replace: assign a fresh sequence, discarding accumulated state
//! - DefaultIfUnset: assign only when no earlier document set the key
//!
//! Every applied strategy is logged as a `MergeOperation` for provenance.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::chain::Chain;
use super::document::{Document, DocumentField, MergeStrategy};
use super::error::ConfigError;
use super::value::ConfigValue;

/// One strategy application in the fold log
#[derive(Debug, Clone)]
pub struct MergeOperation {
    /// Key without its strategy prefix
    pub key: String,
    pub strategy: MergeStrategy,
    /// Document that contributed this operation
    pub source: PathBuf,
    /// Position of the source document in the chain
    pub chain_index: usize,
    /// Value of the key after this operation
    pub value: ConfigValue,
}

/// Fold every document of the chain into a resolved value map
pub fn merge_chain(
    chain: &Chain,
) -> Result<(BTreeMap<String, ConfigValue>, Vec<MergeOperation>), ConfigError> {
    let mut values = BTreeMap::new();
    let mut operations = Vec::new();
    for (index, document) in chain.documents.iter().enumerate() {
        fold_document(&mut values, document, index, &mut operations)?;
    }
    Ok((values, operations))
}

/// Fold one document into the accumulated values.
///
/// An ignored `DefaultIfUnset` fold leaves the key untouched and records
/// no operation.
pub fn fold_document(
    values: &mut BTreeMap<String, ConfigValue>,
    document: &Document,
    chain_index: usize,
    operations: &mut Vec<MergeOperation>,
) -> Result<(), ConfigError> {
    for field in &document.fields {
        let resulting = match field.strategy {
            MergeStrategy::Override => field.value.clone(),
            MergeStrategy::Append | MergeStrategy::Prepend => {
                let next = expect_sequence(document, field)?.to_vec();
                let existing = match values.get(&field.key) {
                    Some(ConfigValue::Sequence(items)) => items.clone(),
                    Some(other) => {
                        return Err(accumulated_mismatch(document, field, other));
                    }
                    None => Vec::new(),
                };
                let merged = if field.strategy == MergeStrategy::Append {
                    let mut merged = existing;
                    merged.extend(next);
                    merged
                } else {
                    let mut merged = next;
                    merged.extend(existing);
                    merged
                };
                ConfigValue::Sequence(merged)
            }
            MergeStrategy::Replace => {
                // Discards the accumulated value whatever its type
                expect_sequence(document, field)?;
                field.value.clone()
            }
            MergeStrategy::DefaultIfUnset => {
                if values.contains_key(&field.key) {
                    continue;
                }
                field.value.clone()
            }
        };

        values.insert(field.key.clone(), resulting.clone());
        operations.push(MergeOperation {
            key: field.key.clone(),
            strategy: field.strategy,
            source: document.path.clone(),
            chain_index,
            value: resulting,
        });
    }
    Ok(())
}

fn expect_sequence<'a>(
    document: &Document,
    field: &'a DocumentField,
) -> Result<&'a [ConfigValue], ConfigError> {
    field
        .value
        .as_sequence()
        .ok_or_else(|| ConfigError::TypeMismatch {
            path: document.path.clone(),
            key: field.key.clone(),
            strategy: field.strategy,
            found: field.value.type_name(),
        })
}

fn accumulated_mismatch(
    document: &Document,
    field: &DocumentField,
    accumulated: &ConfigValue,
) -> ConfigError {
    ConfigError::TypeMismatch {
        path: document.path.clone(),
        key: field.key.clone(),
        strategy: field.strategy,
        found: accumulated.type_name(),
    }
}
