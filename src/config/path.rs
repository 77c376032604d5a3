//! Inheritance reference path resolution
//!
//! Turns a parent reference as written (absolute, relative, or
//! `~`-prefixed) into a canonical path relative to the referencing
//! document's directory. Pure string-to-path work: existence is checked
//! later by the loader, not here.

use std::path::{Component, Path, PathBuf};

use super::error::ConfigError;

/// Resolve a parent reference against the referencing document's directory
pub fn resolve_reference(reference: &str, base_dir: &Path) -> Result<PathBuf, ConfigError> {
    let expanded = expand_home(reference)?;
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    };
    Ok(normalize(&joined))
}

/// Expand `~` and `~/...` via $HOME, the same way worker SSH key paths are
/// expanded elsewhere in the tool
fn expand_home(reference: &str) -> Result<PathBuf, ConfigError> {
    if reference == "~" || reference.starts_with("~/") {
        let home = std::env::var("HOME")
            .map_err(|_| ConfigError::HomeNotSet(reference.to_string()))?;
        if let Some(rest) = reference.strip_prefix("~/") {
            return Ok(PathBuf::from(home).join(rest));
        }
        return Ok(PathBuf::from(home));
    }
    Ok(PathBuf::from(reference))
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Never consults the filesystem, so symlinks are
/// left alone.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().map(|c| c.as_os_str()).collect()
}
