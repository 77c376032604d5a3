//! Dirarc - directory archiving and backup tool
//!
//! This crate implements the dirarc configuration subsystem: layered
//! configuration inheritance with per-key merge strategies, provenance
//! tracking, and a modification-time validated cache. The archive
//! pipeline consumes the resolved configuration through `ConfigLoader`.

pub mod config;

pub use config::{
    ConfigError, ConfigLoader, ConfigValue, InheritanceCache, MergeStrategy, ResolvedConfig,
    ValueOrigin,
};
