//! Document loading and merge-prefix parsing
//!
//! A document is one YAML configuration file, loaded into an ordered list
//! of fields plus the declared parent references. Merge semantics are not
//! interpreted here; each key only records which strategy its prefix
//! selected. Documents are immutable once loaded and re-created whenever
//! the underlying file changes.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ConfigError;
use super::value::ConfigValue;

/// Reserved key naming parent documents
pub const INHERIT_KEY: &str = "inherit";

/// How a key combines with the accumulated ancestor value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// No prefix: assign unconditionally
    Override,
    /// `+`: accumulated sequence followed by this document's sequence
    Append,
    /// `^`: this document's sequence followed by the accumulated sequence
    Prepend,
    /// `!`: this document's sequence, discarding any accumulated value
    Replace,
    /// `=`: assign only if no earlier document set the key
    DefaultIfUnset,
}

impl MergeStrategy {
    /// The strategy selected by a prefix character, if it is reserved
    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            '+' => Some(MergeStrategy::Append),
            '^' => Some(MergeStrategy::Prepend),
            '!' => Some(MergeStrategy::Replace),
            '=' => Some(MergeStrategy::DefaultIfUnset),
            _ => None,
        }
    }

    /// String form used in provenance display
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Override => "override",
            MergeStrategy::Append => "append",
            MergeStrategy::Prepend => "prepend",
            MergeStrategy::Replace => "replace",
            MergeStrategy::DefaultIfUnset => "default_if_unset",
        }
    }

    /// Whether this strategy only operates on sequences
    pub fn requires_sequence(&self) -> bool {
        matches!(
            self,
            MergeStrategy::Append | MergeStrategy::Prepend | MergeStrategy::Replace
        )
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One key of a document with its prefix already stripped
#[derive(Debug, Clone)]
pub struct DocumentField {
    /// Key name without the strategy prefix
    pub key: String,
    /// Strategy the prefix selected (Override when unprefixed)
    pub strategy: MergeStrategy,
    /// Raw value as written in this document
    pub value: ConfigValue,
}

/// One configuration file as loaded
#[derive(Debug, Clone)]
pub struct Document {
    /// Canonical path this document was loaded from
    pub path: PathBuf,
    /// SHA-256 digest of the raw file bytes
    pub digest: String,
    /// Modification time captured at load, used for cache invalidation
    pub modified_at: DateTime<Utc>,
    /// Parent references exactly as declared, in order
    pub parents: Vec<String>,
    /// Fields in document order
    pub fields: Vec<DocumentField>,
}

impl Document {
    /// Load and parse the configuration file at `path`.
    ///
    /// Fails with `DocumentNotFound` if the file is missing,
    /// `MalformedDocument` if it cannot be parsed into the value model,
    /// and `InvalidMergePrefix` if a key carries an unknown prefix.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::DocumentNotFound(path.to_path_buf()),
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let metadata = fs::metadata(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let modified = metadata.modified().map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes).map_err(|e| ConfigError::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!("invalid UTF-8: {}", e),
        })?;

        let root: serde_yaml::Value =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::MalformedDocument {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mapping = match root {
            // An empty file is a valid document with no fields
            serde_yaml::Value::Null => serde_yaml::Mapping::new(),
            serde_yaml::Value::Mapping(m) => m,
            other => {
                return Err(ConfigError::MalformedDocument {
                    path: path.to_path_buf(),
                    reason: format!(
                        "top level must be a mapping, got {}",
                        yaml_type_name(&other)
                    ),
                })
            }
        };

        let mut parents = Vec::new();
        let mut fields: Vec<DocumentField> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (raw_key, raw_value) in mapping {
            let key_name = match raw_key {
                serde_yaml::Value::String(s) => s,
                other => {
                    return Err(ConfigError::MalformedDocument {
                        path: path.to_path_buf(),
                        reason: format!("keys must be strings, got {}", yaml_type_name(&other)),
                    })
                }
            };

            if key_name == INHERIT_KEY {
                parents = parse_inherit(path, raw_value)?;
                continue;
            }

            let (key, strategy) = split_prefix(path, &key_name)?;

            if key == INHERIT_KEY {
                return Err(ConfigError::MalformedDocument {
                    path: path.to_path_buf(),
                    reason: format!("'{}' cannot carry a merge prefix", INHERIT_KEY),
                });
            }
            if !seen.insert(key.clone()) {
                return Err(ConfigError::MalformedDocument {
                    path: path.to_path_buf(),
                    reason: format!("duplicate key '{}' after prefix stripping", key),
                });
            }

            let value = convert_value(path, &key, raw_value)?;
            fields.push(DocumentField {
                key,
                strategy,
                value,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            digest,
            modified_at: DateTime::<Utc>::from(modified),
            parents,
            fields,
        })
    }

    /// Directory containing this document; parent references resolve
    /// relative to it
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Whether this document declares any parents
    pub fn has_parents(&self) -> bool {
        !self.parents.is_empty()
    }
}

/// Split a decorated key into its name and strategy.
///
/// The reserved prefixes are `+ ^ ! =`. Any other leading punctuation is
/// an unknown prefix; a field whose literal name starts with a reserved
/// character cannot be expressed, which is a documented limitation.
fn split_prefix(path: &Path, key_name: &str) -> Result<(String, MergeStrategy), ConfigError> {
    let mut chars = key_name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => {
            return Err(ConfigError::MalformedDocument {
                path: path.to_path_buf(),
                reason: "empty key name".to_string(),
            })
        }
    };

    if let Some(strategy) = MergeStrategy::from_prefix(first) {
        let rest: String = chars.collect();
        if rest.is_empty() {
            return Err(ConfigError::MalformedDocument {
                path: path.to_path_buf(),
                reason: format!("key '{}' is only a merge prefix", key_name),
            });
        }
        return Ok((rest, strategy));
    }

    if first.is_ascii_punctuation() && first != '_' {
        return Err(ConfigError::InvalidMergePrefix {
            path: path.to_path_buf(),
            key: chars.collect(),
            prefix: first,
        });
    }

    Ok((key_name.to_string(), MergeStrategy::Override))
}

/// Parse the `inherit` key: a single string or an ordered list of strings
fn parse_inherit(path: &Path, value: serde_yaml::Value) -> Result<Vec<String>, ConfigError> {
    match value {
        serde_yaml::Value::String(s) => Ok(vec![s]),
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                serde_yaml::Value::String(s) => Ok(s),
                other => Err(ConfigError::MalformedDocument {
                    path: path.to_path_buf(),
                    reason: format!(
                        "'{}' entries must be strings, got {}",
                        INHERIT_KEY,
                        yaml_type_name(&other)
                    ),
                }),
            })
            .collect(),
        other => Err(ConfigError::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!(
                "'{}' must be a string or list of strings, got {}",
                INHERIT_KEY,
                yaml_type_name(&other)
            ),
        }),
    }
}

/// Convert a YAML value into the closed value model
fn convert_value(
    path: &Path,
    key: &str,
    value: serde_yaml::Value,
) -> Result<ConfigValue, ConfigError> {
    match value {
        serde_yaml::Value::Bool(b) => Ok(ConfigValue::Bool(b)),
        serde_yaml::Value::String(s) => Ok(ConfigValue::String(s)),
        serde_yaml::Value::Number(n) => n.as_i64().map(ConfigValue::Integer).ok_or_else(|| {
            ConfigError::MalformedDocument {
                path: path.to_path_buf(),
                reason: format!("key '{}': only integer numbers are supported", key),
            }
        }),
        serde_yaml::Value::Sequence(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for item in items {
                let element = convert_value(path, key, item)?;
                if element.is_sequence() {
                    return Err(ConfigError::MalformedDocument {
                        path: path.to_path_buf(),
                        reason: format!("key '{}': sequences may only contain scalars", key),
                    });
                }
                converted.push(element);
            }
            Ok(ConfigValue::Sequence(converted))
        }
        other => Err(ConfigError::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!(
                "key '{}': unsupported value type {} (expected string, boolean, integer, or sequence)",
                key,
                yaml_type_name(&other)
            ),
        }),
    }
}

fn yaml_type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}
