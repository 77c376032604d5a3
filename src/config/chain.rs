//! Inheritance chain construction
//!
//! Builds the dependency-ordered, deduplicated list of documents for one
//! resolution root. Traversal uses an explicit worklist rather than
//! recursion, so pathologically deep chains cannot exhaust the call stack
//! and the cycle path can be reconstructed by walking the open list.
//!
//! Cycle detection is part of the same traversal: a path revisited while
//! still open is a cycle; a path revisited after it finished is diamond
//! inheritance and keeps its first-discovered position.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::document::Document;
use super::error::ConfigError;
use super::path::resolve_reference;

/// Dependency-ordered documents for one resolution root.
///
/// Root-most ancestor first, requested document last. No document appears
/// more than once; every ancestor precedes its descendants.
#[derive(Debug, Clone)]
pub struct Chain {
    pub documents: Vec<Arc<Document>>,
}

impl Chain {
    /// Number of documents in the chain
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Chain paths in merge order, for display
    pub fn paths(&self) -> Vec<&Path> {
        self.documents.iter().map(|d| d.path.as_path()).collect()
    }
}

enum Step {
    Enter(PathBuf),
    Exit(PathBuf),
}

/// Build the inheritance chain rooted at `root`.
///
/// `load` supplies parsed documents by canonical path; the caller decides
/// whether that goes through a cache. Parents are traversed in declared
/// order before their child is appended, so later-listed parents fold
/// later and win ties among unrelated ancestors.
pub fn build_chain<L>(root: &Path, load: &mut L) -> Result<Chain, ConfigError>
where
    L: FnMut(&Path) -> Result<Arc<Document>, ConfigError>,
{
    let mut worklist = vec![Step::Enter(root.to_path_buf())];
    // Documents on the current traversal path, ordered for cycle reports
    let mut open: Vec<PathBuf> = Vec::new();
    let mut open_set: HashSet<PathBuf> = HashSet::new();
    let mut finished: HashSet<PathBuf> = HashSet::new();
    let mut loaded: HashMap<PathBuf, Arc<Document>> = HashMap::new();
    let mut documents: Vec<Arc<Document>> = Vec::new();

    while let Some(step) = worklist.pop() {
        match step {
            Step::Enter(path) => {
                if finished.contains(&path) {
                    // Diamond: already merged at its first position
                    continue;
                }
                if open_set.contains(&path) {
                    let start = open.iter().position(|p| p == &path).unwrap_or(0);
                    let mut cycle: Vec<PathBuf> = open[start..].to_vec();
                    cycle.push(path);
                    return Err(ConfigError::CircularDependency { cycle });
                }

                let document = load(&path)?;
                open.push(path.clone());
                open_set.insert(path.clone());
                worklist.push(Step::Exit(path.clone()));
                // Reversed so the first-declared parent is traversed first
                for reference in document.parents.iter().rev() {
                    let parent = resolve_reference(reference, document.dir())?;
                    worklist.push(Step::Enter(parent));
                }
                loaded.insert(path, document);
            }
            Step::Exit(path) => {
                open.pop();
                open_set.remove(&path);
                if let Some(document) = loaded.remove(&path) {
                    documents.push(document);
                }
                finished.insert(path);
            }
        }
    }

    Ok(Chain { documents })
}
