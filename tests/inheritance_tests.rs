//! Inheritance Resolution Tests
//!
//! End-to-end behavior of the configuration inheritance pipeline over
//! real files: chain ordering, merge strategies, provenance, and the
//! documented failure modes.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use dirarc::config::{string_sequence, ConfigError, ConfigLoader, MergeStrategy};

fn write_doc(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

// =============================================================================
// Merge strategies
// =============================================================================

#[test]
fn test_append_prepend_across_three_generations() {
    let dir = TempDir::new().unwrap();
    write_doc(
        dir.path(),
        "base.yml",
        "exclude_patterns: [\"*.tmp\", \"*.log\"]\n",
    );
    write_doc(
        dir.path(),
        "child.yml",
        "inherit: base.yml\n\"+exclude_patterns\": [\"node_modules/\"]\n",
    );
    let root = write_doc(
        dir.path(),
        "grand.yml",
        "inherit: child.yml\n\"^exclude_patterns\": [\"*.secret\"]\n",
    );

    let loader = ConfigLoader::new();
    let resolved = loader.load(&root).unwrap();

    assert_eq!(
        resolved.get("exclude_patterns"),
        Some(&string_sequence([
            "*.secret",
            "*.tmp",
            "*.log",
            "node_modules/"
        ]))
    );
}

#[test]
fn test_default_if_unset_applies_when_base_is_silent() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "base.yml", "archive_dir_path: /backups\n");
    let root = write_doc(
        dir.path(),
        "child.yml",
        "inherit: base.yml\n\"=verify_on_create\": true\n",
    );

    let loader = ConfigLoader::new();
    let resolved = loader.load(&root).unwrap();
    assert_eq!(resolved.get_bool("verify_on_create"), Some(true));
}

#[test]
fn test_default_if_unset_ignored_when_base_overrides() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "base.yml", "verify_on_create: false\n");
    let root = write_doc(
        dir.path(),
        "child.yml",
        "inherit: base.yml\n\"=verify_on_create\": true\n",
    );

    let loader = ConfigLoader::new();
    let resolved = loader.load(&root).unwrap();
    assert_eq!(resolved.get_bool("verify_on_create"), Some(false));
}

#[test]
fn test_override_always_wins_over_ancestors() {
    let dir = TempDir::new().unwrap();
    write_doc(
        dir.path(),
        "base.yml",
        "archive_dir_path: [\"/old\", \"/older\"]\n",
    );
    let root = write_doc(
        dir.path(),
        "child.yml",
        "inherit: base.yml\narchive_dir_path: /new\n",
    );

    let loader = ConfigLoader::new();
    let resolved = loader.load(&root).unwrap();
    assert_eq!(resolved.get_str("archive_dir_path"), Some("/new"));
}

#[test]
fn test_replace_starts_fresh() {
    let dir = TempDir::new().unwrap();
    write_doc(
        dir.path(),
        "base.yml",
        "exclude_patterns: [\"*.tmp\", \"*.log\"]\n",
    );
    let root = write_doc(
        dir.path(),
        "child.yml",
        "inherit: base.yml\n\"!exclude_patterns\": [\"only/\"]\n",
    );

    let loader = ConfigLoader::new();
    let resolved = loader.load(&root).unwrap();
    assert_eq!(resolved.get("exclude_patterns"), Some(&string_sequence(["only/"])));
}

#[test]
fn test_append_to_scalar_is_a_type_mismatch() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "base.yml", "exclude_patterns: single\n");
    let root = write_doc(
        dir.path(),
        "child.yml",
        "inherit: base.yml\n\"+exclude_patterns\": [\"more/\"]\n",
    );

    let loader = ConfigLoader::new();
    let err = loader.load(&root).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::TypeMismatch {
            strategy: MergeStrategy::Append,
            ..
        }
    ));
}

// =============================================================================
// Chain shape
// =============================================================================

#[test]
fn test_multi_parent_later_listed_wins() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "a.yml", "compression_level: 3\n");
    write_doc(dir.path(), "b.yml", "compression_level: 9\n");
    let root = write_doc(dir.path(), "root.yml", "inherit: [a.yml, b.yml]\n");

    let loader = ConfigLoader::new();
    let resolved = loader.load(&root).unwrap();
    assert_eq!(resolved.get_integer("compression_level"), Some(9));
}

#[test]
fn test_diamond_ancestor_merged_once() {
    let dir = TempDir::new().unwrap();
    write_doc(
        dir.path(),
        "shared.yml",
        "retention_days: 30\nexclude_patterns: [\"*.tmp\"]\n",
    );
    write_doc(
        dir.path(),
        "a.yml",
        "inherit: shared.yml\n\"+exclude_patterns\": [\"a/\"]\n",
    );
    write_doc(
        dir.path(),
        "b.yml",
        "inherit: shared.yml\n\"+exclude_patterns\": [\"b/\"]\n",
    );
    let root = write_doc(dir.path(), "c.yml", "inherit: [a.yml, b.yml]\n");

    let loader = ConfigLoader::new();
    let resolved = loader.load(&root).unwrap();

    // shared.yml contributes exactly once, at its first-discovered spot
    let shared_count = resolved
        .sources
        .iter()
        .filter(|s| s.path.ends_with("shared.yml"))
        .count();
    assert_eq!(shared_count, 1);
    assert_eq!(resolved.sources.len(), 4);

    // Its override fields are visible in the final result
    assert_eq!(resolved.get_integer("retention_days"), Some(30));
    // And its sequence was appended to by both branches, once each
    assert_eq!(
        resolved.get("exclude_patterns"),
        Some(&string_sequence(["*.tmp", "a/", "b/"]))
    );
}

#[test]
fn test_two_document_cycle_reports_ordered_path() {
    let dir = TempDir::new().unwrap();
    let a = write_doc(dir.path(), "a.yml", "inherit: b.yml\n");
    let b = write_doc(dir.path(), "b.yml", "inherit: a.yml\n");

    let loader = ConfigLoader::new();
    let err = loader.load(&a).unwrap_err();
    match err {
        ConfigError::CircularDependency { cycle } => {
            assert_eq!(cycle, vec![a.clone(), b, a]);
        }
        other => panic!("expected CircularDependency, got {:?}", other),
    }
}

#[test]
fn test_three_document_cycle_detected() {
    let dir = TempDir::new().unwrap();
    let a = write_doc(dir.path(), "a.yml", "inherit: b.yml\n");
    write_doc(dir.path(), "b.yml", "inherit: c.yml\n");
    write_doc(dir.path(), "c.yml", "inherit: a.yml\n");

    let loader = ConfigLoader::new();
    let err = loader.load(&a).unwrap_err();
    match err {
        ConfigError::CircularDependency { cycle } => {
            assert_eq!(cycle.len(), 4);
            assert_eq!(cycle.first(), cycle.last());
        }
        other => panic!("expected CircularDependency, got {:?}", other),
    }
}

#[test]
fn test_missing_parent_is_document_not_found() {
    let dir = TempDir::new().unwrap();
    let root = write_doc(dir.path(), "root.yml", "inherit: gone.yml\n");

    let loader = ConfigLoader::new();
    let err = loader.load(&root).unwrap_err();
    match err {
        ConfigError::DocumentNotFound(path) => assert!(path.ends_with("gone.yml")),
        other => panic!("expected DocumentNotFound, got {:?}", other),
    }
}

// =============================================================================
// Backward compatibility
// =============================================================================

#[test]
fn test_flat_document_resolves_to_its_literal_fields() {
    let dir = TempDir::new().unwrap();
    let root = write_doc(
        dir.path(),
        "flat.yml",
        "archive_dir_path: /backups\nmax_archive_count: 10\nverify_on_create: true\nexclude_patterns: [\"*.tmp\"]\n",
    );

    let loader = ConfigLoader::new();
    let resolved = loader.load(&root).unwrap();

    assert_eq!(resolved.values.len(), 4);
    assert_eq!(resolved.get_str("archive_dir_path"), Some("/backups"));
    assert_eq!(resolved.get_integer("max_archive_count"), Some(10));
    assert_eq!(resolved.get_bool("verify_on_create"), Some(true));
    assert_eq!(resolved.get("exclude_patterns"), Some(&string_sequence(["*.tmp"])));
    assert_eq!(resolved.sources.len(), 1);
}

#[test]
fn test_malformed_document_surfaces_parse_error() {
    let dir = TempDir::new().unwrap();
    let root = write_doc(dir.path(), "bad.yml", "key: [unterminated\n");

    let loader = ConfigLoader::new();
    let err = loader.load(&root).unwrap_err();
    assert!(matches!(err, ConfigError::MalformedDocument { .. }));
}

#[test]
fn test_unknown_prefix_is_rejected() {
    let dir = TempDir::new().unwrap();
    let root = write_doc(dir.path(), "bad.yml", "\"*exclude_patterns\": [\"x\"]\n");

    let loader = ConfigLoader::new();
    let err = loader.load(&root).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidMergePrefix { prefix: '*', .. }));
}

// =============================================================================
// Provenance
// =============================================================================

#[test]
fn test_origin_records_every_contribution_in_order() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "base.yml", "exclude_patterns: [\"*.tmp\"]\n");
    write_doc(
        dir.path(),
        "mid.yml",
        "inherit: base.yml\n\"+exclude_patterns\": [\"mid/\"]\n",
    );
    let root = write_doc(
        dir.path(),
        "top.yml",
        "inherit: mid.yml\n\"^exclude_patterns\": [\"top/\"]\n",
    );

    let loader = ConfigLoader::new();
    let (value, origin) = loader
        .value_with_source(&root, "exclude_patterns")
        .unwrap()
        .expect("key should be set");

    assert_eq!(value, string_sequence(["top/", "*.tmp", "mid/"]));
    let strategies: Vec<MergeStrategy> = origin.entries.iter().map(|e| e.strategy).collect();
    assert_eq!(
        strategies,
        vec![
            MergeStrategy::Override,
            MergeStrategy::Append,
            MergeStrategy::Prepend
        ]
    );
    assert!(origin.entries[0].document.ends_with("base.yml"));
    assert!(origin.entries[2].document.ends_with("top.yml"));
    assert_eq!(origin.chain_depth, 2);
}

#[test]
fn test_ignored_default_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "base.yml", "verify_on_create: false\n");
    let root = write_doc(
        dir.path(),
        "child.yml",
        "inherit: base.yml\n\"=verify_on_create\": true\n",
    );

    let loader = ConfigLoader::new();
    let (_, origin) = loader
        .value_with_source(&root, "verify_on_create")
        .unwrap()
        .expect("key should be set");

    assert_eq!(origin.entries.len(), 1);
    assert!(origin.entries[0].document.ends_with("base.yml"));
    assert_eq!(origin.chain_depth, 0);
}

#[test]
fn test_sources_expose_digests_in_chain_order() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "base.yml", "retention_days: 30\n");
    let root = write_doc(dir.path(), "child.yml", "inherit: base.yml\n");

    let loader = ConfigLoader::new();
    let resolved = loader.load(&root).unwrap();

    assert_eq!(resolved.sources.len(), 2);
    assert!(resolved.sources[0].path.ends_with("base.yml"));
    assert!(resolved.sources[1].path.ends_with("child.yml"));
    for source in &resolved.sources {
        assert_eq!(source.digest.len(), 64);
    }
    assert_ne!(resolved.sources[0].digest, resolved.sources[1].digest);
}
