//! Configuration error types
//!
//! Every failure in the inheritance subsystem is one of these variants.
//! None of them are retried: configuration is deterministic input, so a
//! retry without a changed filesystem reproduces the identical error.

use std::path::PathBuf;

use super::document::MergeStrategy;

/// Errors from configuration loading and inheritance resolution
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The referenced configuration file does not exist
    #[error("configuration file not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// The file exists but could not be parsed into the document model
    #[error("malformed configuration in {}: {reason}", .path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    /// A key starts with a metacharacter outside the reserved prefix set
    #[error("unknown merge prefix '{prefix}' on key '{prefix}{key}' in {}", .path.display())]
    InvalidMergePrefix {
        path: PathBuf,
        key: String,
        prefix: char,
    },

    /// The inheritance graph contains a cycle
    #[error("circular inheritance: {}", format_cycle(.cycle))]
    CircularDependency { cycle: Vec<PathBuf> },

    /// A sequence-only merge strategy was applied to a non-sequence value
    #[error(
        "merge strategy '{strategy}' requires a sequence for key '{key}' in {}, got {found}",
        .path.display()
    )]
    TypeMismatch {
        path: PathBuf,
        key: String,
        strategy: MergeStrategy,
        found: &'static str,
    },

    /// A `~` reference cannot be expanded because HOME is not set
    #[error("cannot expand '{0}': HOME environment variable not set")]
    HomeNotSet(String),

    /// Any other IO failure while reading a document
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn format_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
